//! Scene editor side of the window transport.
//!
//! Accepts editor window connections, collects their window messages, and
//! pushes outbound messages back. All state lives on the polling thread;
//! per-window reader threads only forward decoded frames over a channel.

use std::collections::{BTreeMap, HashMap};
use std::io::{self, BufReader, BufWriter};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;

use log::{error, info, warn};

use stagecraft_types::{MessageDirection, WindowMessage};

use crate::framing::{read_frame, write_frame};
use crate::protocol::{ClientFrame, HostFrame, WindowId, WindowRole};

/// A window that completed the Hello handshake.
struct WindowConnection {
    name: String,
    role: WindowRole,
    writer: BufWriter<TcpStream>,
}

impl WindowConnection {
    fn send(&mut self, frame: &HostFrame) -> io::Result<()> {
        write_frame(&mut self.writer, frame)
    }
}

pub struct WindowHost {
    listener: TcpListener,
    windows: BTreeMap<WindowId, WindowConnection>,
    /// Connected sockets still waiting for Hello.
    pending: HashMap<WindowId, BufWriter<TcpStream>>,
    frame_rx: Receiver<(WindowId, ClientFrame)>,
    frame_tx: Sender<(WindowId, ClientFrame)>,
    next_window_id: u64,
}

impl WindowHost {
    pub fn bind(addr: &str) -> io::Result<Self> {
        let listener = TcpListener::bind(addr)?;
        listener.set_nonblocking(true)?;
        let (frame_tx, frame_rx) = mpsc::channel();

        info!(target: "net", "window host listening on {}", listener.local_addr()?);

        Ok(Self {
            listener,
            windows: BTreeMap::new(),
            pending: HashMap::new(),
            frame_rx,
            frame_tx,
            next_window_id: 1,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept every waiting connection. Windows count as connected after Hello.
    pub fn accept_connections(&mut self) {
        loop {
            match self.listener.accept() {
                Ok((stream, addr)) => {
                    let window_id = WindowId(self.next_window_id);
                    self.next_window_id += 1;

                    if let Err(e) = stream.set_nonblocking(false) {
                        error!(target: "net", "failed to configure stream from {}: {}", addr, e);
                        continue;
                    }
                    let read_stream = match stream.try_clone() {
                        Ok(s) => s,
                        Err(e) => {
                            error!(target: "net", "failed to clone stream from {}: {}", addr, e);
                            continue;
                        }
                    };

                    let frame_tx = self.frame_tx.clone();
                    thread::spawn(move || window_reader_thread(window_id, read_stream, frame_tx));
                    self.pending.insert(window_id, BufWriter::new(stream));
                    info!(target: "net", "{} connected from {}, awaiting Hello", window_id, addr);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => {
                    error!(target: "net", "accept error: {}", e);
                    break;
                }
            }
        }
    }

    /// Handle queued frames. Returns the window messages to feed the bridge,
    /// in arrival order.
    pub fn poll_messages(&mut self) -> Vec<(WindowId, WindowMessage)> {
        let mut messages = Vec::new();

        while let Ok((window_id, frame)) = self.frame_rx.try_recv() {
            match frame {
                ClientFrame::Hello { name, role } => self.handle_hello(window_id, name, role),
                ClientFrame::Message(msg) => {
                    let Some(window) = self.windows.get_mut(&window_id) else {
                        warn!(target: "net", "{} sent a message before Hello", window_id);
                        continue;
                    };
                    if window.role == WindowRole::Observer
                        || msg.kind().direction() == MessageDirection::Outbound
                    {
                        let reason = format!("{} is not accepted from {:?} windows", msg.kind(), window.role);
                        warn!(target: "net", "{}: {}", window_id, reason);
                        let _ = window.send(&HostFrame::Error { message: reason });
                        continue;
                    }
                    messages.push((window_id, msg));
                }
                ClientFrame::Ping => {
                    if let Some(window) = self.windows.get_mut(&window_id) {
                        if let Err(e) = window.send(&HostFrame::Pong) {
                            warn!(target: "net", "failed to answer ping from {}: {}", window_id, e);
                        }
                    }
                }
                ClientFrame::Goodbye => {
                    self.pending.remove(&window_id);
                    if let Some(window) = self.windows.remove(&window_id) {
                        info!(target: "net", "{} ({}) disconnected", window_id, window.name);
                    }
                }
            }
        }

        messages
    }

    fn handle_hello(&mut self, window_id: WindowId, name: String, role: WindowRole) {
        let Some(mut writer) = self.pending.remove(&window_id) else {
            warn!(target: "net", "duplicate Hello from {}", window_id);
            return;
        };
        if let Err(e) = write_frame(&mut writer, &HostFrame::Welcome { window_id }) {
            error!(target: "net", "failed to welcome {}: {}", window_id, e);
            return;
        }
        info!(target: "net", "{} is '{}' ({:?})", window_id, name, role);
        self.windows.insert(window_id, WindowConnection { name, role, writer });
    }

    /// Send `msg` to every connected window.
    pub fn broadcast(&mut self, msg: &WindowMessage) {
        self.send_where(&HostFrame::Message(msg.clone()), |_| true);
    }

    /// Forward a window's message to every other window.
    pub fn relay(&mut self, from: WindowId, msg: &WindowMessage) {
        self.send_where(&HostFrame::Message(msg.clone()), |id| id != from);
    }

    pub fn send_to(&mut self, window_id: WindowId, msg: &WindowMessage) -> io::Result<()> {
        let window = self.windows.get_mut(&window_id).ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, format!("{} is not connected", window_id))
        })?;
        let res = window.send(&HostFrame::Message(msg.clone()));
        if res.is_err() {
            self.windows.remove(&window_id);
        }
        res
    }

    pub fn broadcast_shutdown(&mut self) {
        self.send_where(&HostFrame::Shutdown, |_| true);
    }

    pub fn window_count(&self) -> usize {
        self.windows.len()
    }

    pub fn window_name(&self, window_id: WindowId) -> Option<&str> {
        self.windows.get(&window_id).map(|w| w.name.as_str())
    }

    /// Windows that fail to take the frame are dropped.
    fn send_where(&mut self, frame: &HostFrame, include: impl Fn(WindowId) -> bool) {
        let mut dead = Vec::new();
        for (id, window) in self.windows.iter_mut() {
            if !include(*id) {
                continue;
            }
            if let Err(e) = window.send(frame) {
                warn!(target: "net", "failed to send to {}: {}", id, e);
                dead.push(*id);
            }
        }
        for id in dead {
            self.windows.remove(&id);
        }
    }
}

/// Reads frames from one window until it leaves or the socket breaks.
fn window_reader_thread(window_id: WindowId, stream: TcpStream, frame_tx: Sender<(WindowId, ClientFrame)>) {
    let mut reader = BufReader::new(stream);
    loop {
        match read_frame::<_, ClientFrame>(&mut reader) {
            Ok(frame) => {
                let leaving = matches!(frame, ClientFrame::Goodbye);
                if frame_tx.send((window_id, frame)).is_err() || leaving {
                    break;
                }
            }
            Err(e) => {
                if e.kind() != io::ErrorKind::UnexpectedEof {
                    warn!(target: "net", "{} read error: {}", window_id, e);
                }
                let _ = frame_tx.send((window_id, ClientFrame::Goodbye));
                break;
            }
        }
    }
    info!(target: "net", "{} reader thread exiting", window_id);
}
