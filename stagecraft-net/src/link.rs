//! Editor window side of the window transport.

use std::io::{self, BufReader, BufWriter};
use std::net::{Shutdown, TcpStream};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use log::{info, warn};

use stagecraft_types::WindowMessage;

use crate::framing::{read_frame, write_frame};
use crate::protocol::{ClientFrame, HostFrame, WindowId, WindowRole};

/// Connection from an editor window to the scene editor host.
pub struct EditorLink {
    window_id: WindowId,
    writer: BufWriter<TcpStream>,
    frame_rx: Receiver<HostFrame>,
    host_shutdown: bool,
    last_error: Option<String>,
}

impl EditorLink {
    /// Connect and complete the Hello/Welcome handshake.
    pub fn connect(addr: &str, name: &str, role: WindowRole) -> io::Result<Self> {
        let stream = TcpStream::connect(addr)?;
        let read_stream = stream.try_clone()?;
        let mut writer = BufWriter::new(stream);
        let mut reader = BufReader::new(read_stream);

        write_frame(&mut writer, &ClientFrame::Hello { name: name.to_string(), role })?;

        let window_id = match read_frame::<_, HostFrame>(&mut reader)? {
            HostFrame::Welcome { window_id } => window_id,
            HostFrame::Error { message } => {
                return Err(io::Error::new(io::ErrorKind::ConnectionRefused, message))
            }
            _ => {
                return Err(io::Error::new(io::ErrorKind::InvalidData, "expected Welcome frame"));
            }
        };
        info!(target: "net", "connected to {} as {}", addr, window_id);

        let (frame_tx, frame_rx) = mpsc::channel();
        thread::spawn(move || loop {
            match read_frame::<_, HostFrame>(&mut reader) {
                Ok(frame) => {
                    let shutdown = matches!(frame, HostFrame::Shutdown);
                    if frame_tx.send(frame).is_err() || shutdown {
                        break;
                    }
                }
                Err(e) => {
                    if e.kind() != io::ErrorKind::UnexpectedEof {
                        warn!(target: "net", "host read error: {}", e);
                    }
                    let _ = frame_tx.send(HostFrame::Shutdown);
                    break;
                }
            }
        });

        Ok(Self {
            window_id,
            writer,
            frame_rx,
            host_shutdown: false,
            last_error: None,
        })
    }

    pub fn window_id(&self) -> WindowId {
        self.window_id
    }

    pub fn host_shutdown(&self) -> bool {
        self.host_shutdown
    }

    /// Last error frame the host sent, cleared on read.
    pub fn take_error(&mut self) -> Option<String> {
        self.last_error.take()
    }

    pub fn send(&mut self, msg: WindowMessage) -> io::Result<()> {
        write_frame(&mut self.writer, &ClientFrame::Message(msg))
    }

    pub fn ping(&mut self) -> io::Result<()> {
        write_frame(&mut self.writer, &ClientFrame::Ping)
    }

    /// Next window message already received, if any.
    pub fn try_recv(&mut self) -> Option<WindowMessage> {
        loop {
            match self.frame_rx.try_recv() {
                Ok(frame) => {
                    if let Some(msg) = self.absorb(frame) {
                        return Some(msg);
                    }
                }
                Err(TryRecvError::Empty) => return None,
                Err(TryRecvError::Disconnected) => {
                    self.host_shutdown = true;
                    return None;
                }
            }
        }
    }

    /// Wait up to `timeout` for the next window message.
    pub fn recv_timeout(&mut self, timeout: Duration) -> Option<WindowMessage> {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.frame_rx.recv_timeout(remaining) {
                Ok(frame) => {
                    if let Some(msg) = self.absorb(frame) {
                        return Some(msg);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return None,
                Err(RecvTimeoutError::Disconnected) => {
                    self.host_shutdown = true;
                    return None;
                }
            }
        }
    }

    /// Wait for the host to answer a ping.
    pub fn wait_for_pong(&mut self, timeout: Duration) -> bool {
        let deadline = std::time::Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(std::time::Instant::now());
            match self.frame_rx.recv_timeout(remaining) {
                Ok(HostFrame::Pong) => return true,
                Ok(frame) => {
                    let _ = self.absorb(frame);
                }
                Err(_) => return false,
            }
        }
    }

    fn absorb(&mut self, frame: HostFrame) -> Option<WindowMessage> {
        match frame {
            HostFrame::Message(msg) => Some(msg),
            HostFrame::Shutdown => {
                self.host_shutdown = true;
                None
            }
            HostFrame::Error { message } => {
                warn!(target: "net", "host error: {}", message);
                self.last_error = Some(message);
                None
            }
            HostFrame::Pong | HostFrame::Welcome { .. } => None,
        }
    }

    /// Tell the host this window is closing.
    pub fn goodbye(mut self) -> io::Result<()> {
        write_frame(&mut self.writer, &ClientFrame::Goodbye)
    }
}

impl Drop for EditorLink {
    fn drop(&mut self) {
        // wakes the reader thread and lets the host see EOF
        let _ = self.writer.get_ref().shutdown(Shutdown::Both);
    }
}
