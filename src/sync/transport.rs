/// Request transport to the capture device
///
/// One call to `exchange` is one attempt: send the request, wait for a single
/// reply up to a fixed timeout, classify it. Retrying is the session's job.

use std::io::ErrorKind;
use std::net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket};
use std::time::{Duration, Instant};

use super::protocol::{Request, ServerReply};
use crate::{Error, Result};

/// Port the capture device listens on by default
pub const DEFAULT_PORT: u16 = 4445;

/// How long one attempt waits for a reply
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Largest reply payload read from the device
const MAX_REPLY_BYTES: usize = 1024;

/// Sends requests and classifies replies
pub trait Transport {
    fn exchange(&mut self, request: &Request) -> Result<ServerReply>;
}

/// UDP transport to a device at a known address
#[derive(Debug, Clone)]
pub struct UdpTransport {
    device: SocketAddr,
    timeout: Duration,
}

impl UdpTransport {
    pub fn new(device: SocketAddr, timeout: Duration) -> Result<Self> {
        if timeout.is_zero() {
            return Err(Error::InvalidConfig("request timeout must be positive".to_string()));
        }
        Ok(Self { device, timeout })
    }

    pub fn device(&self) -> SocketAddr {
        self.device
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    fn bind(&self) -> std::io::Result<UdpSocket> {
        let local: SocketAddr = match self.device {
            SocketAddr::V4(_) => (Ipv4Addr::UNSPECIFIED, 0).into(),
            SocketAddr::V6(_) => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        UdpSocket::bind(local)
    }
}

impl Transport for UdpTransport {
    fn exchange(&mut self, request: &Request) -> Result<ServerReply> {
        // A fresh socket per attempt, so a late reply to an earlier attempt
        // is never read as the answer to this one
        let socket = self.bind()?;
        socket.send_to(&request.to_bytes(), self.device)?;

        let deadline = Instant::now() + self.timeout;
        let mut buf = [0u8; MAX_REPLY_BYTES];
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(ServerReply::Timeout);
            }
            socket.set_read_timeout(Some(remaining))?;

            match socket.recv_from(&mut buf) {
                Ok((n, from)) if from.ip() == self.device.ip() => {
                    let payload = String::from_utf8_lossy(&buf[..n]);
                    tracing::debug!(sequence = request.sequence, reply = %payload, "device replied");
                    return Ok(ServerReply::parse(&payload));
                }
                Ok((_, from)) => {
                    tracing::debug!(%from, "ignoring datagram from unknown peer");
                }
                Err(e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Ok(ServerReply::Timeout);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    /// Loopback responder answering each datagram with `reply(payload)`
    fn responder<F>(count: usize, reply: F) -> (SocketAddr, thread::JoinHandle<Vec<String>>)
    where
        F: Fn(&str) -> Option<String> + Send + 'static,
    {
        let socket = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = socket.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut seen = Vec::new();
            let mut buf = [0u8; 2048];
            for _ in 0..count {
                let (n, from) = socket.recv_from(&mut buf).unwrap();
                let payload = String::from_utf8_lossy(&buf[..n]).to_string();
                if let Some(answer) = reply(&payload) {
                    socket.send_to(answer.as_bytes(), from).unwrap();
                }
                seen.push(payload);
            }
            seen
        });
        (addr, handle)
    }

    #[test]
    fn test_ok_round_trip() {
        let (addr, handle) = responder(1, |payload| {
            let (_, name) = payload.split_once('|').unwrap();
            Some(format!("OK|{}", name))
        });

        let mut transport = UdpTransport::new(addr, Duration::from_secs(5)).unwrap();
        let reply = transport
            .exchange(&Request::new(3, "3__9__a__b.png"))
            .unwrap();

        assert_eq!(reply, ServerReply::Ok("3__9__a__b.png".to_string()));
        assert_eq!(handle.join().unwrap(), vec!["3|3__9__a__b.png".to_string()]);
    }

    #[test]
    fn test_error_reply() {
        let (addr, handle) = responder(1, |_| Some("SEQ_MISMATCH".to_string()));
        let mut transport = UdpTransport::new(addr, Duration::from_secs(5)).unwrap();
        let reply = transport.exchange(&Request::new(1, "x")).unwrap();
        assert_eq!(reply, ServerReply::Error("SEQ_MISMATCH".to_string()));
        handle.join().unwrap();
    }

    #[test]
    fn test_silence_is_timeout() {
        let (addr, handle) = responder(1, |_| None);
        let mut transport = UdpTransport::new(addr, Duration::from_millis(100)).unwrap();
        let reply = transport.exchange(&Request::new(1, "x")).unwrap();
        assert_eq!(reply, ServerReply::Timeout);
        handle.join().unwrap();
    }

    #[test]
    fn test_ignores_reply_from_other_ip() {
        // Binding other loopback addresses is not possible everywhere
        let Ok(stranger) = UdpSocket::bind("127.0.0.2:0") else {
            return;
        };
        let device = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = device.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 2048];
            let (_, from) = device.recv_from(&mut buf).unwrap();
            stranger.send_to(b"OK|forged.png", from).unwrap();
            thread::sleep(Duration::from_millis(50));
            device.send_to(b"OK|real.png", from).unwrap();
        });

        let mut transport = UdpTransport::new(addr, Duration::from_secs(5)).unwrap();
        let reply = transport.exchange(&Request::new(0, "x")).unwrap();
        assert_eq!(reply, ServerReply::Ok("real.png".to_string()));
        handle.join().unwrap();
    }

    #[test]
    fn test_late_reply_not_read_by_retry() {
        let device = UdpSocket::bind("127.0.0.1:0").unwrap();
        let addr = device.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let mut buf = [0u8; 2048];
            let (_, first) = device.recv_from(&mut buf).unwrap();
            let (_, second) = device.recv_from(&mut buf).unwrap();
            // Answer the timed-out attempt only after the retry arrived
            device.send_to(b"OK|stale.png", first).unwrap();
            thread::sleep(Duration::from_millis(50));
            device.send_to(b"OK|fresh.png", second).unwrap();
            (first, second)
        });

        let mut transport = UdpTransport::new(addr, Duration::from_millis(200)).unwrap();
        let request = Request::new(1, "1__5__a.png");
        assert_eq!(transport.exchange(&request).unwrap(), ServerReply::Timeout);

        transport.timeout = Duration::from_secs(5);
        let reply = transport.exchange(&request).unwrap();
        assert_eq!(reply, ServerReply::Ok("fresh.png".to_string()));

        let (first, second) = handle.join().unwrap();
        assert_ne!(first.port(), second.port());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let addr: SocketAddr = "127.0.0.1:4445".parse().unwrap();
        assert!(UdpTransport::new(addr, Duration::ZERO).is_err());
    }
}
