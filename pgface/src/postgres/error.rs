//! Protocol error
use std::fmt;

use super::FrontendMessage;

/// An error when translating buffer from the client.
#[derive(Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Startup message with unsupported protocol version.
    UnknownVersion {
        version: u32,
    },
    /// Unsupported message type.
    UnknownMessage {
        found: u8,
    },
    /// Message body too short for its message type.
    ///
    /// `msgtype` is [`None`] for the startup message.
    Malformed {
        msgtype: Option<u8>,
    },
}

impl std::error::Error for ProtocolError { }

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProtocolError::UnknownVersion { version } => write!(
                f,
                "Unsupported protocol version {}.{}",
                version >> 16,
                version & 0xffff,
            ),
            ProtocolError::UnknownMessage { found } => {
                write!(f, "Unexpected message type `{}`", char::from(found).escape_default())
            },
            ProtocolError::Malformed { msgtype: Some(msgtype) } => {
                write!(f, "Malformed `{}` message", FrontendMessage::message_name(msgtype))
            },
            ProtocolError::Malformed { msgtype: None } => f.write_str("Malformed startup message"),
        }
    }
}

impl fmt::Debug for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl ProtocolError {
    pub(crate) fn unknown_version(version: u32) -> ProtocolError {
        Self::UnknownVersion { version }
    }

    pub(crate) fn unknown(found: u8) -> ProtocolError {
        Self::UnknownMessage { found }
    }

    pub(crate) fn malformed(msgtype: u8) -> ProtocolError {
        Self::Malformed { msgtype: Some(msgtype) }
    }

    pub(crate) fn malformed_startup() -> ProtocolError {
        Self::Malformed { msgtype: None }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn display() {
        assert_eq!(ProtocolError::unknown_version(0).to_string(), "Unsupported protocol version 0.0");
        assert_eq!(ProtocolError::unknown(b'C').to_string(), "Unexpected message type `C`");
        assert_eq!(ProtocolError::malformed(b'B').to_string(), "Malformed `Bind` message");
    }
}
