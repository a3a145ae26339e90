//! WebSocket transport for the command channel.
//!
//! Each connection attempt owns one link thread. The thread connects, then
//! waits on the outbound queue, sending each frame as soon as it is queued,
//! and checks the socket with a short read between waits so that close frames
//! and socket errors are noticed. `wss://` URLs go through native-tls.
//! Lifecycle changes are reported to the executor through [`LINK_EVENTS`],
//! tagged with the generation the link was opened for.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use std::io::{self, ErrorKind};
use std::net::TcpStream;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender, TryRecvError};
use std::time::Duration;
use tungstenite::stream::MaybeTlsStream;
use tungstenite::{Message, WebSocket};

use super::channel::{CommandTransport, TransportClosed};

/// Longest wait for an outbound frame before the socket is checked again.
/// A queued frame ends the wait at once.
const FRAME_WAIT: Duration = Duration::from_millis(250);

/// Read timeout on the socket while checking for close frames.
const READ_CHECK: Duration = Duration::from_millis(5);

const LINK_EVENT_QUEUE_SIZE: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    Opened(u64),
    Closed(u64, String),
}

pub static LINK_EVENTS: Channel<CriticalSectionRawMutex, LinkEvent, LINK_EVENT_QUEUE_SIZE> = Channel::new();

/// Sending half of a link thread. Dropping it shuts the thread down.
pub struct WsLink {
    outbound: Sender<String>,
}

impl CommandTransport for WsLink {
    fn transmit(&mut self, frame: &str) -> Result<(), TransportClosed> {
        self.outbound
            .send(frame.to_string())
            .map_err(|_| TransportClosed("link thread has exited".to_string()))
    }
}

/// Start connecting to `url` on a new link thread.
///
/// Never fails: when the thread cannot be started, a `Closed` event for
/// `generation` is queued instead.
pub fn open(url: &str, generation: u64) -> WsLink {
    let (outbound, frames) = mpsc::channel();
    let url = url.to_string();

    let spawned = std::thread::Builder::new()
        .name(format!("ws-link-{}", generation))
        .spawn(move || run_link(&url, generation, frames));

    if let Err(e) = spawned {
        log::error!("Failed to start link thread: {}", e);
        report(LinkEvent::Closed(generation, e.to_string()));
    }

    WsLink { outbound }
}

fn report(event: LinkEvent) {
    embassy_futures::block_on(LINK_EVENTS.send(event));
}

fn run_link(url: &str, generation: u64, frames: Receiver<String>) {
    log::info!("Connecting command channel #{} to {}", generation, url);
    let mut socket = match tungstenite::connect(url) {
        Ok((socket, _response)) => socket,
        Err(e) => {
            log::warn!("Command channel #{} failed to connect: {}", generation, e);
            report(LinkEvent::Closed(generation, e.to_string()));
            return;
        }
    };

    if let Err(e) = set_read_timeout(socket.get_ref(), READ_CHECK) {
        report(LinkEvent::Closed(generation, e.to_string()));
        return;
    }

    report(LinkEvent::Opened(generation));

    match pump(&mut socket, &frames) {
        Ok(()) => {
            log::debug!("Command channel #{} released", generation);
            let _ = socket.close(None);
            let _ = socket.flush();
        }
        Err(reason) => {
            log::warn!("Command channel #{} closed: {}", generation, reason);
            report(LinkEvent::Closed(generation, reason));
        }
    }
}

fn set_read_timeout(stream: &MaybeTlsStream<TcpStream>, timeout: Duration) -> io::Result<()> {
    match stream {
        MaybeTlsStream::Plain(tcp) => tcp.set_read_timeout(Some(timeout)),
        MaybeTlsStream::NativeTls(tls) => tls.get_ref().set_read_timeout(Some(timeout)),
        _ => Ok(()),
    }
}

/// Move frames until the socket closes (`Err`) or the owner drops the link (`Ok`).
fn pump(socket: &mut WebSocket<MaybeTlsStream<TcpStream>>, frames: &Receiver<String>) -> Result<(), String> {
    loop {
        match frames.recv_timeout(FRAME_WAIT) {
            Ok(frame) => {
                socket.send(Message::text(frame)).map_err(|e| e.to_string())?;
                loop {
                    match frames.try_recv() {
                        Ok(frame) => socket.send(Message::text(frame)).map_err(|e| e.to_string())?,
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => return Ok(()),
                    }
                }
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => return Ok(()),
        }

        match socket.read() {
            Ok(Message::Close(frame)) => {
                return Err(frame.map(|f| f.reason.as_str().to_string()).unwrap_or_else(|| "closed by device".to_string()));
            }
            // The device never sends anything the dashboard acts on.
            Ok(_) => {}
            Err(tungstenite::Error::Io(e)) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {}
            Err(e) => return Err(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::time::Instant;

    fn next_event() -> LinkEvent {
        embassy_futures::block_on(LINK_EVENTS.receive())
    }

    // All cases share LINK_EVENTS, so they run in one test.
    #[test]
    fn link_reports_lifecycle_and_delivers_frames_in_order() {
        // Nothing listens on this port once the listener is dropped.
        let refused = TcpListener::bind("127.0.0.1:0").unwrap();
        let refused_url = format!("ws://{}/ws", refused.local_addr().unwrap());
        drop(refused);

        let _dead = open(&refused_url, 7);
        assert!(matches!(next_event(), LinkEvent::Closed(7, _)));

        // A secure URL gets as far as the TLS handshake, which the plain listener cuts off.
        let plain = TcpListener::bind("127.0.0.1:0").unwrap();
        let secure_url = format!("wss://{}/ws", plain.local_addr().unwrap());
        let hangup = std::thread::spawn(move || drop(plain.accept().unwrap()));
        let _tls = open(&secure_url, 9);
        match next_event() {
            LinkEvent::Closed(9, reason) => assert!(!reason.contains("not compiled in"), "{}", reason),
            other => panic!("unexpected {:?}", other),
        }
        hangup.join().unwrap();

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("ws://{}/ws", listener.local_addr().unwrap());
        let server = std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut ws = tungstenite::accept(stream).unwrap();
            let mut received = Vec::new();
            while received.len() < 3 {
                if let Message::Text(text) = ws.read().unwrap() {
                    received.push((text.as_str().to_string(), Instant::now()));
                }
            }
            let _ = ws.close(None);
            let _ = ws.flush();
            received
        });

        let mut link = open(&url, 8);
        assert_eq!(next_event(), LinkEvent::Opened(8));
        // Let the link settle into its idle wait before the first frame.
        std::thread::sleep(Duration::from_millis(50));
        let queued_at = Instant::now();
        for frame in ["X+", "Y-", "X+"] {
            link.transmit(frame).unwrap();
        }

        let received = server.join().unwrap();
        let frames: Vec<&str> = received.iter().map(|(text, _)| text.as_str()).collect();
        assert_eq!(frames, vec!["X+", "Y-", "X+"]);
        assert!(received[0].1.duration_since(queued_at) < FRAME_WAIT / 2);
        assert!(matches!(next_event(), LinkEvent::Closed(8, _)));
    }
}
