use crate::config::ViewportSettings;

/// Axis-aligned extent of the canvas content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }
}

/// Zoom and pan of the diagram view. Screen = canvas * zoom + pan.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    settings: ViewportSettings,
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
    pan_locked: bool,
}

impl Viewport {
    pub fn new(settings: ViewportSettings) -> Self {
        Self {
            settings,
            zoom: 1.0_f64.clamp(settings.min_zoom, settings.max_zoom),
            pan_x: 0.0,
            pan_y: 0.0,
            pan_locked: false,
        }
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn pan(&self) -> (f64, f64) {
        (self.pan_x, self.pan_y)
    }

    pub fn is_pan_locked(&self) -> bool {
        self.pan_locked
    }

    pub fn zoom_to(&mut self, zoom: f64) {
        if zoom.is_finite() {
            self.zoom = zoom.clamp(self.settings.min_zoom, self.settings.max_zoom);
        }
    }

    /// Ignored while the pan lock is on.
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        if self.pan_locked || !dx.is_finite() || !dy.is_finite() {
            return;
        }
        self.pan_x += dx;
        self.pan_y += dy;
    }

    pub fn toggle_pan_lock(&mut self) -> bool {
        self.pan_locked = !self.pan_locked;
        self.pan_locked
    }

    /// Put the content's center at the middle of the view. Resets to the
    /// origin when there is no content.
    pub fn center_on(&mut self, bounds: Option<Bounds>) {
        let (cx, cy) = bounds.map(|b| b.center()).unwrap_or((0.0, 0.0));
        self.pan_x = self.settings.view_width / 2.0 - cx * self.zoom;
        self.pan_y = self.settings.view_height / 2.0 - cy * self.zoom;
    }

    /// Largest zoom that shows all of `bounds` with padding, then center.
    pub fn fit(&mut self, bounds: Option<Bounds>) {
        if let Some(b) = bounds {
            let avail_w = (self.settings.view_width - 2.0 * self.settings.fit_padding).max(1.0);
            let avail_h = (self.settings.view_height - 2.0 * self.settings.fit_padding).max(1.0);
            let zx = if b.width() > 0.0 { avail_w / b.width() } else { self.settings.max_zoom };
            let zy = if b.height() > 0.0 { avail_h / b.height() } else { self.settings.max_zoom };
            self.zoom_to(zx.min(zy));
        }
        self.center_on(bounds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ViewportSettings {
        ViewportSettings {
            min_zoom: 0.5,
            max_zoom: 2.0,
            fit_padding: 0.0,
            view_width: 100.0,
            view_height: 100.0,
        }
    }

    #[test]
    fn zoom_is_clamped() {
        let mut vp = Viewport::new(settings());
        vp.zoom_to(10.0);
        assert_eq!(vp.zoom(), 2.0);
        vp.zoom_to(0.0);
        assert_eq!(vp.zoom(), 0.5);
        vp.zoom_to(f64::NAN);
        assert_eq!(vp.zoom(), 0.5);
    }

    #[test]
    fn pan_lock_blocks_panning() {
        let mut vp = Viewport::new(settings());
        vp.pan_by(5.0, 5.0);
        assert!(vp.toggle_pan_lock());
        vp.pan_by(5.0, 5.0);
        assert_eq!(vp.pan(), (5.0, 5.0));
    }

    #[test]
    fn fit_scales_and_centers() {
        let mut vp = Viewport::new(settings());
        let bounds = Bounds { min_x: 0.0, min_y: 0.0, max_x: 100.0, max_y: 50.0 };
        vp.fit(Some(bounds));
        assert_eq!(vp.zoom(), 1.0);
        assert_eq!(vp.pan(), (0.0, 25.0));
    }
}
