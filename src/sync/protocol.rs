/// Datagram wire format
///
/// Request (controller -> device): `<sequence>|<filename>`
/// Reply (device -> controller): `OK|<saved filename>` on success, anything
/// else is an error message. No reply at all is a locally observed timeout.

use std::fmt;

/// Success tag at the start of a device reply
pub const SERVER_OK: &str = "OK";

const FIELD_SEPARATOR: char = '|';

/// One request to the capture device
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub sequence: u64,
    pub filename: String,
}

impl Request {
    pub fn new(sequence: u64, filename: impl Into<String>) -> Self {
        Self {
            sequence,
            filename: filename.into(),
        }
    }

    /// Datagram payload
    pub fn to_bytes(&self) -> Vec<u8> {
        self.to_string().into_bytes()
    }
}

impl fmt::Display for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.sequence, FIELD_SEPARATOR, self.filename)
    }
}

/// Classified outcome of one request attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerReply {
    /// Device saved the photo under this filename
    Ok(String),
    /// No reply within the timeout
    Timeout,
    /// Any other reply, carried verbatim
    Error(String),
}

impl ServerReply {
    /// Classify a reply payload received from the device
    pub fn parse(payload: &str) -> Self {
        match payload.split_once(FIELD_SEPARATOR) {
            Some((SERVER_OK, saved)) => ServerReply::Ok(saved.to_string()),
            _ => ServerReply::Error(payload.to_string()),
        }
    }
}
