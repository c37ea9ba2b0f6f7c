/// Auto-mode session state
///
/// The session tolerates one device error at a time: a single bad reply skips
/// the row, a second bad reply with no success or timeout in between means
/// the controller and device have drifted apart and the session stops.

use std::fmt;

use super::protocol::ServerReply;

/// States of the display/transfer loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Display,
    AwaitReply,
    Advance,
    Aborted,
    Done,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::Display => "DISPLAY",
            Phase::AwaitReply => "AWAIT_REPLY",
            Phase::Advance => "ADVANCE",
            Phase::Aborted => "ABORTED",
            Phase::Done => "DONE",
        };
        f.write_str(name)
    }
}

/// What the loop does after a classified reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Photo saved under this filename; move on
    Accept(String),
    /// No reply; resend the identical request
    Retry,
    /// First error; log it and move on without the photo
    Skip(String),
    /// Second consecutive error; stop the session
    Abort(String),
}

impl Step {
    /// Phase the loop enters after this step
    pub fn next_phase(&self) -> Phase {
        match self {
            Step::Accept(_) | Step::Skip(_) => Phase::Advance,
            Step::Retry => Phase::AwaitReply,
            Step::Abort(_) => Phase::Aborted,
        }
    }
}

/// Cursor and escalation flag carried across rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SessionState {
    /// Rows processed so far, accepted or skipped
    pub sequence_cursor: u64,
    /// Set by an error reply, cleared by success or timeout
    pub error_flag: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Classify `reply` against the current state
    pub fn on_reply(self, reply: &ServerReply) -> (SessionState, Step) {
        match reply {
            ServerReply::Ok(saved) => (
                SessionState {
                    error_flag: false,
                    ..self
                },
                Step::Accept(saved.clone()),
            ),
            ServerReply::Timeout => (
                SessionState {
                    error_flag: false,
                    ..self
                },
                Step::Retry,
            ),
            ServerReply::Error(message) if self.error_flag => (self, Step::Abort(message.clone())),
            ServerReply::Error(message) => (
                SessionState {
                    error_flag: true,
                    ..self
                },
                Step::Skip(message.clone()),
            ),
        }
    }

    /// Move the cursor past the current row
    pub fn advance(self) -> SessionState {
        SessionState {
            sequence_cursor: self.sequence_cursor + 1,
            ..self
        }
    }
}
