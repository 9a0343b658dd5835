use std::path::PathBuf;

use serde::Deserialize;

const DEFAULT_CONFIG: &str = include_str!("../config.toml");

#[derive(Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    canvas: CanvasConfig,
    #[serde(default)]
    viewport: ViewportConfig,
    #[serde(default)]
    history: HistoryConfig,
    #[serde(default)]
    bridge: BridgeConfig,
}

#[derive(Deserialize, Default)]
struct CanvasConfig {
    origin_x: Option<f64>,
    origin_y: Option<f64>,
    spacing_x: Option<f64>,
    spacing_y: Option<f64>,
    width: Option<f64>,
    node_width: Option<f64>,
    node_height: Option<f64>,
}

#[derive(Deserialize, Default)]
struct ViewportConfig {
    min_zoom: Option<f64>,
    max_zoom: Option<f64>,
    fit_padding: Option<f64>,
    view_width: Option<f64>,
    view_height: Option<f64>,
}

#[derive(Deserialize, Default)]
struct HistoryConfig {
    max_depth: Option<usize>,
}

#[derive(Deserialize, Default)]
struct BridgeConfig {
    listen: Option<String>,
    message_log: Option<bool>,
}

/// Grid used to place nodes that carry no stored coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridSettings {
    pub origin_x: f64,
    pub origin_y: f64,
    pub spacing_x: f64,
    pub spacing_y: f64,
    pub width: f64,
    pub node_width: f64,
    pub node_height: f64,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            origin_x: 40.0,
            origin_y: 40.0,
            spacing_x: 220.0,
            spacing_y: 140.0,
            width: 1200.0,
            node_width: 160.0,
            node_height: 80.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewportSettings {
    pub min_zoom: f64,
    pub max_zoom: f64,
    pub fit_padding: f64,
    pub view_width: f64,
    pub view_height: f64,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            min_zoom: 0.1,
            max_zoom: 4.0,
            fit_padding: 40.0,
            view_width: 1280.0,
            view_height: 720.0,
        }
    }
}

/// Settings the canvas adapter is built from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CanvasSettings {
    pub grid: GridSettings,
    pub viewport: ViewportSettings,
    pub history_depth: usize,
}

impl Default for CanvasSettings {
    fn default() -> Self {
        Self {
            grid: GridSettings::default(),
            viewport: ViewportSettings::default(),
            history_depth: 100,
        }
    }
}

pub struct Config {
    canvas: CanvasConfig,
    viewport: ViewportConfig,
    history: HistoryConfig,
    bridge: BridgeConfig,
}

impl Config {
    /// Embedded defaults overlaid with the user's config file, if any.
    pub fn load() -> Self {
        let mut config = Self::embedded();
        if let Some(path) = user_config_path() {
            if path.exists() {
                match std::fs::read_to_string(&path) {
                    Ok(contents) => config.apply_overrides(&contents, &path),
                    Err(e) => {
                        log::warn!(target: "config", "could not read config {}: {}", path.display(), e)
                    }
                }
            }
        }
        config
    }

    /// Embedded defaults only.
    pub fn embedded() -> Self {
        let base = toml::from_str::<ConfigFile>(DEFAULT_CONFIG).unwrap_or_else(|e| {
            log::error!(target: "config", "embedded config.toml is invalid: {}", e);
            ConfigFile::default()
        });
        Config {
            canvas: base.canvas,
            viewport: base.viewport,
            history: base.history,
            bridge: base.bridge,
        }
    }

    /// Overlay keys present in `contents`; malformed input is logged and ignored.
    pub fn apply_overrides(&mut self, contents: &str, origin: &std::path::Path) {
        match toml::from_str::<ConfigFile>(contents) {
            Ok(user) => {
                merge_canvas(&mut self.canvas, user.canvas);
                merge_viewport(&mut self.viewport, user.viewport);
                if user.history.max_depth.is_some() {
                    self.history.max_depth = user.history.max_depth;
                }
                if user.bridge.listen.is_some() {
                    self.bridge.listen = user.bridge.listen;
                }
                if user.bridge.message_log.is_some() {
                    self.bridge.message_log = user.bridge.message_log;
                }
            }
            Err(e) => {
                log::warn!(target: "config", "ignoring malformed config {}: {}", origin.display(), e)
            }
        }
    }

    pub fn grid(&self) -> GridSettings {
        let d = GridSettings::default();
        let c = &self.canvas;
        GridSettings {
            origin_x: c.origin_x.unwrap_or(d.origin_x),
            origin_y: c.origin_y.unwrap_or(d.origin_y),
            spacing_x: c.spacing_x.unwrap_or(d.spacing_x).max(1.0),
            spacing_y: c.spacing_y.unwrap_or(d.spacing_y).max(1.0),
            width: c.width.unwrap_or(d.width).max(1.0),
            node_width: c.node_width.unwrap_or(d.node_width),
            node_height: c.node_height.unwrap_or(d.node_height),
        }
    }

    pub fn viewport(&self) -> ViewportSettings {
        let d = ViewportSettings::default();
        let v = &self.viewport;
        let min_zoom = v.min_zoom.unwrap_or(d.min_zoom).max(0.01);
        ViewportSettings {
            min_zoom,
            max_zoom: v.max_zoom.unwrap_or(d.max_zoom).max(min_zoom),
            fit_padding: v.fit_padding.unwrap_or(d.fit_padding).max(0.0),
            view_width: v.view_width.unwrap_or(d.view_width).max(1.0),
            view_height: v.view_height.unwrap_or(d.view_height).max(1.0),
        }
    }

    /// Undo depth (clamped to 1..10000).
    pub fn history_depth(&self) -> usize {
        self.history.max_depth.unwrap_or(100).clamp(1, 10_000)
    }

    pub fn canvas_settings(&self) -> CanvasSettings {
        CanvasSettings {
            grid: self.grid(),
            viewport: self.viewport(),
            history_depth: self.history_depth(),
        }
    }

    pub fn listen_addr(&self) -> String {
        self.bridge
            .listen
            .clone()
            .unwrap_or_else(|| "127.0.0.1:7171".to_string())
    }

    pub fn message_log_enabled(&self) -> bool {
        self.bridge.message_log.unwrap_or(false)
    }
}

pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("stagecraft").join("config.toml"))
}

fn merge_canvas(base: &mut CanvasConfig, user: CanvasConfig) {
    if user.origin_x.is_some() {
        base.origin_x = user.origin_x;
    }
    if user.origin_y.is_some() {
        base.origin_y = user.origin_y;
    }
    if user.spacing_x.is_some() {
        base.spacing_x = user.spacing_x;
    }
    if user.spacing_y.is_some() {
        base.spacing_y = user.spacing_y;
    }
    if user.width.is_some() {
        base.width = user.width;
    }
    if user.node_width.is_some() {
        base.node_width = user.node_width;
    }
    if user.node_height.is_some() {
        base.node_height = user.node_height;
    }
}

fn merge_viewport(base: &mut ViewportConfig, user: ViewportConfig) {
    if user.min_zoom.is_some() {
        base.min_zoom = user.min_zoom;
    }
    if user.max_zoom.is_some() {
        base.max_zoom = user.max_zoom;
    }
    if user.fit_padding.is_some() {
        base.fit_padding = user.fit_padding;
    }
    if user.view_width.is_some() {
        base.view_width = user.view_width;
    }
    if user.view_height.is_some() {
        base.view_height = user.view_height;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn embedded_config_matches_defaults() {
        let config = Config::embedded();
        assert_eq!(config.grid(), GridSettings::default());
        assert_eq!(config.viewport(), ViewportSettings::default());
        assert_eq!(config.history_depth(), 100);
        assert_eq!(config.listen_addr(), "127.0.0.1:7171");
        assert!(!config.message_log_enabled());
    }

    #[test]
    fn user_keys_override_individually() {
        let mut config = Config::embedded();
        config.apply_overrides(
            "[canvas]\nspacing_x = 300.0\n[history]\nmax_depth = 5\n",
            Path::new("test.toml"),
        );
        let grid = config.grid();
        assert_eq!(grid.spacing_x, 300.0);
        assert_eq!(grid.spacing_y, 140.0);
        assert_eq!(config.history_depth(), 5);
    }

    #[test]
    fn malformed_override_is_ignored() {
        let mut config = Config::embedded();
        config.apply_overrides("[canvas\nwidth = ", Path::new("bad.toml"));
        assert_eq!(config.grid().width, 1200.0);
    }

    #[test]
    fn history_depth_is_clamped() {
        let mut config = Config::embedded();
        config.apply_overrides("[history]\nmax_depth = 0\n", Path::new("zero.toml"));
        assert_eq!(config.history_depth(), 1);
    }
}
