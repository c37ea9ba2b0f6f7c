/// Capture session synchronization
///
/// This module handles:
/// - The datagram wire format between controller and capture device (protocol.rs)
/// - Sending one request and classifying the reply (transport.rs)
/// - The error-escalation state carried across rows (session.rs)
/// - The manual and auto display loops (client.rs)

pub mod client;
pub mod protocol;
pub mod session;
pub mod transport;

pub use client::{
    run_auto, run_manual, CapturedPhoto, SessionMode, SessionOutcome, SessionReport, SkippedRow,
    AUTO_SETTLE,
};
pub use protocol::{Request, ServerReply, SERVER_OK};
pub use session::{Phase, SessionState, Step};
pub use transport::{Transport, UdpTransport, DEFAULT_PORT, DEFAULT_TIMEOUT};
