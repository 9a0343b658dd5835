use std::fs::File;
use std::io::BufRead;
use std::path::PathBuf;
use std::sync::mpsc;
use std::time::Duration;

use stagecraft_core::config::Config;
use stagecraft_core::dispatch::local::LocalDispatcher;
use stagecraft_core::dispatch::{apply_window_message, SyncController};
use stagecraft_core::message_log::{default_log_path, MessageLog};
use stagecraft_core::persistence::{IoFeedback, Persistence, ProjectFile};
use stagecraft_net::WindowHost;
use stagecraft_types::{DispatchResult, Dispatcher, SceneAction, StatusLevel, WindowMessage};

const POLL_INTERVAL: Duration = Duration::from_millis(10);

fn init_logging(verbose: bool) {
    use simplelog::*;

    let log_level = if verbose { LevelFilter::Debug } else { LevelFilter::Warn };

    let log_path = dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("stagecraft")
        .join("stagecraft.log");

    if let Some(parent) = log_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let log_file = match File::create(&log_path).or_else(|_| File::create("/tmp/stagecraft.log")) {
        Ok(file) => file,
        Err(e) => {
            eprintln!("stagecraft: cannot create log file: {}", e);
            return;
        }
    };

    if let Err(e) = WriteLogger::init(log_level, Config::default(), log_file) {
        eprintln!("stagecraft: failed to initialize logger: {}", e);
        return;
    }

    log::info!("stagecraft starting (log level: {:?})", log_level);
}

fn arg_value(args: &[String], flag: &str) -> Option<String> {
    args.iter()
        .position(|a| a == flag)
        .and_then(|i| args.get(i + 1).cloned())
}

fn main() -> std::io::Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let verbose = args.iter().any(|a| a == "--verbose" || a == "-v");
    init_logging(verbose);

    let config = Config::load();
    let listen = arg_value(&args, "--listen").unwrap_or_else(|| config.listen_addr());
    let project_path = arg_value(&args, "--project")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("scenes.json"));

    let (io_tx, io_rx) = crossbeam_channel::unbounded::<IoFeedback>();
    let mut project = match ProjectFile::open_or_create(&project_path, io_tx) {
        Ok(project) => project,
        Err(e) => {
            log::error!(target: "persistence", "cannot open {}: {}", project_path.display(), e);
            eprintln!("stagecraft: cannot open {}: {}", project_path.display(), e);
            std::process::exit(1);
        }
    };

    let mut controller = SyncController::new(config.canvas_settings());
    project.request_snapshot();

    let mut host = WindowHost::bind(&listen)?;
    log::info!("listening on {}", listen);

    let mut message_log = if config.message_log_enabled() {
        MessageLog::open(&default_log_path())
    } else {
        None
    };

    let actions = spawn_stdin_reader();

    loop {
        host.accept_connections();

        for (window_id, msg) in host.poll_messages() {
            log::debug!(target: "bridge", "{} sent {}", window_id, msg.kind());
            let result = apply_window_message(&msg, &mut controller);
            if let Some(log) = message_log.as_mut() {
                log.record(&window_id.to_string(), &msg, &result);
            }
            host.relay(window_id, &msg);
            publish(&mut host, result);
        }

        loop {
            match actions.try_recv() {
                Ok(Command::Action(action)) => {
                    let result = LocalDispatcher::new(&mut controller, &mut project).dispatch(&action);
                    publish(&mut host, result);
                }
                Ok(Command::Quit) | Err(mpsc::TryRecvError::Disconnected) => {
                    log::info!("shutting down");
                    host.broadcast_shutdown();
                    return Ok(());
                }
                Err(mpsc::TryRecvError::Empty) => break,
            }
        }

        while let Ok(feedback) = io_rx.try_recv() {
            if let IoFeedback::Snapshot(scenes) = &feedback {
                host.broadcast(&WindowMessage::ProjectReplace { scenes: scenes.clone() });
            }
            let result = controller.handle_io_feedback(feedback);
            publish(&mut host, result);
        }

        std::thread::sleep(POLL_INTERVAL);
    }
}

enum Command {
    Action(SceneAction),
    Quit,
}

/// One JSON `SceneAction` per line on stdin; `quit` or EOF stops the host.
fn spawn_stdin_reader() -> mpsc::Receiver<Command> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            if line == "quit" {
                break;
            }
            match serde_json::from_str::<SceneAction>(line) {
                Ok(action) => {
                    if tx.send(Command::Action(action)).is_err() {
                        return;
                    }
                }
                Err(e) => eprintln!("unrecognized action: {}", e),
            }
        }
        let _ = tx.send(Command::Quit);
    });
    rx
}

/// Push a dispatch outcome to the windows and the operator.
fn publish(host: &mut WindowHost, result: DispatchResult) {
    for msg in &result.outbound {
        host.broadcast(msg);
    }
    for status in &result.status {
        match status.level {
            StatusLevel::Info => log::info!(target: "sync", "{}", status.message),
            StatusLevel::Warning => log::warn!(target: "sync", "{}", status.message),
            StatusLevel::Error => log::error!(target: "sync", "{}", status.message),
        }
        eprintln!("{}", status.message);
    }
    if let Some(confirm) = &result.confirm {
        eprintln!("{} (send \"Confirm\" or \"Decline\")", confirm.prompt());
    }
}
