//! Postgres Frontend Messages
//!
//! <https://www.postgresql.org/docs/current/protocol-message-formats.html>
use bytes::Bytes;
use std::collections::HashMap;

use super::{Oid, ProtocolError};
use crate::{codec::BufferReader, common::ByteStr};

/// A type that can be decoded from postgres frontend message.
pub trait FrontendProtocol: Sized {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError>;
}

/// Postgres frontend messages after the startup phase.
#[derive(Debug)]
pub enum FrontendMessage {
    PasswordMessage(PasswordMessage),
    Query(Query),
    Terminate(Terminate),
    Parse(Parse),
    Bind(Bind),
    Describe(Describe),
    Execute(Execute),
    Flush(Flush),
    Sync(Sync),
}

macro_rules! match_frontend {
    ($($name:ident,)*) => {
        impl FrontendMessage {
            pub fn msgtype(&self) -> u8 {
                match self {
                    $(Self::$name(_) => $name::MSGTYPE,)*
                }
            }

            /// Get message name from message type.
            ///
            /// Returns `"Unknown"` for unknown message type.
            pub fn message_name(msgtype: u8) -> &'static str {
                match msgtype {
                    $($name::MSGTYPE => stringify!($name),)*
                    _ => "Unknown",
                }
            }
        }
        impl FrontendProtocol for FrontendMessage {
            fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
                let message = match msgtype {
                    $($name::MSGTYPE => Self::$name(<$name as FrontendProtocol>::decode(msgtype, body)?),)*
                    _ => return Err(ProtocolError::unknown(msgtype)),
                };
                Ok(message)
            }
        }
    };
}

match_frontend! {
    PasswordMessage,
    Query,
    Terminate,
    Parse,
    Bind,
    Describe,
    Execute,
    Flush,
    Sync,
}

macro_rules! assert_msgtype {
    ($typ:ident) => {
        debug_assert_eq!(Self::MSGTYPE, $typ, "decoding with wrong message type");
    };
}

/// Unwrap a codec read, or bail with malformed error.
macro_rules! read {
    ($e:expr) => {
        match $e {
            Some(ok) => ok,
            None => return Err(ProtocolError::malformed(Self::MSGTYPE)),
        }
    };
}

/// Read `Int16` item count.
macro_rules! read_count {
    ($r:ident) => {
        read!($r.read_int16().and_then(|e| usize::try_from(e).ok()))
    };
}

/// The startup phase message.
///
/// For historical reasons, the very first message sent by the client has no
/// initial message-type byte, and it starts with a version code instead.
#[derive(Debug)]
pub enum Startup {
    /// Identifies the message as a request to use SSL.
    SslRequest,
    /// Identifies the message as a startup message.
    Startup {
        /// Parameter name and value pairs.
        ///
        /// `user` is required, others are optional, like `database` or `application_name`.
        params: HashMap<ByteStr, ByteStr>,
    },
}

impl Startup {
    /// Protocol version 3.0.
    ///
    /// The most significant 16 bits are the major version number (3 for the protocol described here).
    /// The least significant 16 bits are the minor version number (0 for the protocol described here).
    pub const PROTOCOL_VERSION: u32 = 196_608;

    /// The SSL request code.
    ///
    /// The value is chosen to contain 1234 in the most significant 16 bits, and 5679 in the least
    /// significant 16 bits. (To avoid confusion, this code must not be the same as any protocol version number.)
    pub const SSL_REQUEST_CODE: u32 = 80_877_103;

    pub fn decode(body: Bytes) -> Result<Self, ProtocolError> {
        let mut r = BufferReader::new(body);
        let Some(version) = r.read_int32() else {
            return Err(ProtocolError::malformed_startup());
        };

        match version as u32 {
            Self::SSL_REQUEST_CODE => Ok(Self::SslRequest),
            Self::PROTOCOL_VERSION => Ok(Self::Startup { params: read_params(r) }),
            version => Err(ProtocolError::unknown_version(version)),
        }
    }
}

/// The protocol version number is followed by one or more pairs of parameter
/// name and value strings. A zero byte is required as a terminator after the
/// last name/value pair.
///
/// Reading stops at the terminator or at the end of the buffer, whichever comes first.
fn read_params(mut r: BufferReader) -> HashMap<ByteStr, ByteStr> {
    let mut params = HashMap::new();
    while let Some(key) = r.read_cstring() {
        if key.is_empty() {
            break;
        }
        let value = r.read_cstring().unwrap_or_default();
        params.insert(key, value);
    }
    params
}

/// Identifies the message as a password response.
#[derive(Debug)]
pub struct PasswordMessage {
    /// The password (encrypted, if requested)
    pub password: ByteStr,
}

impl PasswordMessage {
    pub const MSGTYPE: u8 = b'p';
}

impl FrontendProtocol for PasswordMessage {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        let mut r = BufferReader::new(body);
        Ok(Self { password: read!(r.read_cstring()) })
    }
}

/// Identifies the message as a simple query.
#[derive(Debug)]
pub struct Query {
    /// the query string itself
    pub sql: ByteStr,
}

impl Query {
    pub const MSGTYPE: u8 = b'Q';
}

impl FrontendProtocol for Query {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        let mut r = BufferReader::new(body);
        Ok(Self { sql: read!(r.read_cstring()) })
    }
}

/// Identifies the message as a Parse command.
#[derive(Debug)]
pub struct Parse {
    /// prepared statement name (an empty string selects the unnamed prepared statement).
    pub prepare_name: ByteStr,
    /// The query string to be parsed.
    pub sql: ByteStr,
    /// Specifies the object ID of the parameter data type.
    ///
    /// Note that this is not an indication of the number of parameters that might appear in the query string,
    /// only the number that the frontend wants to prespecify types for.
    ///
    /// Placing a zero here is equivalent to leaving the type unspecified.
    pub oids: Vec<Oid>,
}

impl Parse {
    pub const MSGTYPE: u8 = b'P';
}

impl FrontendProtocol for Parse {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        let mut r = BufferReader::new(body);
        let prepare_name = read!(r.read_cstring());
        let sql = read!(r.read_cstring());
        let oids_len = read_count!(r);
        let oids = read!(r.read_int32_list(oids_len));
        Ok(Self {
            prepare_name,
            sql,
            oids: oids.into_iter().map(|oid| oid as Oid).collect(),
        })
    }
}

/// Identifies the message as a Bind command.
#[derive(Debug)]
pub struct Bind {
    /// The name of the destination portal (an empty string selects the unnamed portal).
    pub portal_name: ByteStr,
    /// The name of the source prepared statement (an empty string selects the unnamed prepared statement).
    pub stmt_name: ByteStr,
    /// The parameter format codes.
    ///
    /// This can be empty to indicate that there are no parameters or that the parameters
    /// all use the default format (text); or one, in which case the specified format code
    /// is applied to all parameters; or it can equal the actual number of parameters.
    pub param_formats: Vec<i16>,
    /// The value of the parameters, in the format indicated by the associated format code.
    ///
    /// [`None`] is a NULL parameter value.
    pub params: Vec<Option<Bytes>>,
    /// The result-column format codes, following the same rule as `param_formats`.
    pub result_formats: Vec<i16>,
}

impl Bind {
    pub const MSGTYPE: u8 = b'B';

    /// Read only the portal and statement name, leaving parameter lists undecoded.
    pub fn names(body: Bytes) -> Option<(ByteStr, ByteStr)> {
        let mut r = BufferReader::new(body);
        Some((r.read_cstring()?, r.read_cstring()?))
    }
}

impl FrontendProtocol for Bind {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        let mut r = BufferReader::new(body);
        let portal_name = read!(r.read_cstring());
        let stmt_name = read!(r.read_cstring());

        let param_formats_len = read_count!(r);
        let param_formats = read!(r.read_int16_list(param_formats_len));

        let params_len = read_count!(r);
        let params = read!(r.read_pbytes_list(params_len));

        let result_formats_len = read_count!(r);
        let result_formats = read!(r.read_int16_list(result_formats_len));

        Ok(Self { portal_name, stmt_name, param_formats, params, result_formats })
    }
}

/// Identifies the message as a Describe command.
#[derive(Debug)]
pub struct Describe {
    /// 'S' to describe a prepared statement; or 'P' to describe a portal.
    pub kind: u8,
    /// The name of the prepared statement or portal to describe
    /// (an empty string selects the unnamed prepared statement or portal).
    pub name: ByteStr,
}

impl Describe {
    pub const MSGTYPE: u8 = b'D';
}

impl FrontendProtocol for Describe {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        let mut r = BufferReader::new(body);
        let kind = read!(r.read_byte());
        let name = read!(r.read_cstring());
        Ok(Self { kind, name })
    }
}

/// Identifies the message as a Execute command.
#[derive(Debug)]
pub struct Execute {
    /// The name of the portal to execute (an empty string selects the unnamed portal).
    pub portal_name: ByteStr,
    /// Maximum number of rows to return, if portal contains a query that returns rows
    /// (ignored otherwise). Zero denotes “no limit”.
    pub max_row: i32,
}

impl Execute {
    pub const MSGTYPE: u8 = b'E';
}

impl FrontendProtocol for Execute {
    fn decode(msgtype: u8, body: Bytes) -> Result<Self, ProtocolError> {
        assert_msgtype!(msgtype);
        let mut r = BufferReader::new(body);
        let portal_name = read!(r.read_cstring());
        let max_row = read!(r.read_int32());
        Ok(Self { portal_name, max_row })
    }
}

macro_rules! unit_msg {
    ($(
        $(#[$doc:meta])* struct $name:ident, $ty:literal;
    )*) => {$(
            $(#[$doc])*
            #[derive(Debug)]
            pub struct $name;

            impl $name {
                pub const MSGTYPE: u8 = $ty;
            }

            impl FrontendProtocol for $name {
                fn decode(msgtype: u8, _: Bytes) -> Result<Self, ProtocolError> {
                    assert_msgtype!(msgtype);
                    Ok(Self)
                }
            }
    )*};
}

unit_msg! {
    /// Identifies the message as a termination.
    struct Terminate, b'X';

    /// Identifies the message as a Flush command.
    struct Flush, b'H';

    /// Identifies the message as a Sync command.
    struct Sync, b'S';
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::BufferWriter;

    #[test]
    fn decode_startup() {
        let body = Bytes::from_static(b"\0\x03\0\0user\0bob\0database\0db\0\0");
        let Startup::Startup { params } = Startup::decode(body).unwrap() else {
            panic!("expected startup")
        };
        assert_eq!(params.len(), 2);
        assert_eq!(params["user"], "bob");
        assert_eq!(params["database"], "db");
    }

    #[test]
    fn startup_params_without_terminator() {
        let body = Bytes::from_static(b"\0\x03\0\0user\0bob\0lonely\0");
        let Startup::Startup { params } = Startup::decode(body).unwrap() else {
            panic!("expected startup")
        };
        assert_eq!(params.len(), 2);
        assert_eq!(params["user"], "bob");
        assert_eq!(params["lonely"], "");
    }

    #[test]
    fn startup_params_stop_at_terminator() {
        let body = Bytes::from_static(b"\0\x03\0\0user\0bob\0\0database\0x\0");
        let Startup::Startup { params } = Startup::decode(body).unwrap() else {
            panic!("expected startup")
        };
        assert_eq!(params.len(), 1);
        assert_eq!(params["user"], "bob");

        let body = Bytes::from_static(b"\0\x03\0\0\0user\0bob\0\0");
        let Startup::Startup { params } = Startup::decode(body).unwrap() else {
            panic!("expected startup")
        };
        assert!(params.is_empty());
    }

    #[test]
    fn decode_ssl_request() {
        let body = Bytes::from_static(b"\x04\xd2\x16\x2f");
        assert!(matches!(Startup::decode(body), Ok(Startup::SslRequest)));
    }

    #[test]
    fn decode_unknown_version() {
        let body = Bytes::from_static(b"\0\0\0\0");
        assert_eq!(
            Startup::decode(body).unwrap_err(),
            ProtocolError::UnknownVersion { version: 0 }
        );
        assert_eq!(
            Startup::decode(Bytes::from_static(b"\0\x03")).unwrap_err(),
            ProtocolError::Malformed { msgtype: None }
        );
    }

    #[test]
    fn decode_bind() {
        let mut w = BufferWriter::new();
        w.add_cstring("portal").add_cstring("stmt");
        w.add_int16(1).add_int16(1);
        w.add_int16(2).add_pbytes(Some(b"\0\0\0\x01")).add_pbytes(None);
        w.add_int16(0);
        let body = w.flush_untagged();

        let FrontendMessage::Bind(bind) = FrontendMessage::decode(b'B', body).unwrap() else {
            panic!("expected bind")
        };
        assert_eq!(bind.portal_name, "portal");
        assert_eq!(bind.stmt_name, "stmt");
        assert_eq!(bind.param_formats, [1]);
        assert_eq!(bind.params, [Some(Bytes::from_static(b"\0\0\0\x01")), None]);
        assert!(bind.result_formats.is_empty());
    }

    #[test]
    fn decode_malformed() {
        let mut w = BufferWriter::new();
        w.add_cstring("stmt").add_cstring("SELECT $1").add_int16(2).add_int32(25);
        let err = FrontendMessage::decode(b'P', w.flush_untagged()).unwrap_err();
        assert_eq!(err, ProtocolError::Malformed { msgtype: Some(b'P') });

        w.add_cstring("").add_cstring("").add_int16(-1);
        let err = FrontendMessage::decode(b'P', w.flush_untagged()).unwrap_err();
        assert_eq!(err, ProtocolError::Malformed { msgtype: Some(b'P') });
    }

    #[test]
    fn decode_unknown() {
        let err = FrontendMessage::decode(b'C', Bytes::new()).unwrap_err();
        assert_eq!(err, ProtocolError::UnknownMessage { found: b'C' });
    }

    #[test]
    fn message_name() {
        assert_eq!(FrontendMessage::message_name(b'E'), "Execute");
        assert_eq!(FrontendMessage::message_name(b'z'), "Unknown");
    }
}
