//! Postgres Backend Messages
//!
//! <https://www.postgresql.org/docs/current/protocol-message-formats.html>
use bytes::Bytes;
use std::fmt::Display;

use super::Oid;
use crate::{
    codec::BufferWriter,
    ext::UsizeExt,
    row::{FieldDescriptor, RowValues},
};

/// Encode a backend message and frame it with message type and length.
pub fn write<B: BackendProtocol>(msg: B, w: &mut BufferWriter) -> Bytes {
    msg.encode(w);
    w.flush(B::MSGTYPE)
}

/// A type which can be encoded into postgres backend message.
pub trait BackendProtocol {
    /// Message type.
    const MSGTYPE: u8;

    /// Write the main body of the message.
    ///
    /// Message type and length are written by [`write`].
    fn encode(self, w: &mut BufferWriter);
}

/// Identifies the message as an authentication request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authentication {
    /// Specifies that the authentication was successful.
    Ok,
    /// Specifies that a clear-text password is required.
    CleartextPassword,
}

impl BackendProtocol for Authentication {
    const MSGTYPE: u8 = b'R';

    fn encode(self, w: &mut BufferWriter) {
        w.add_int32(match self {
            Authentication::Ok => 0,
            Authentication::CleartextPassword => 3,
        });
    }
}

/// Identifies the message as cancellation key data.
#[derive(Debug)]
pub struct BackendKeyData {
    /// The process ID of this backend.
    pub process_id: i32,
    /// The secret key of this backend.
    pub secret_key: i32,
}

impl BackendProtocol for BackendKeyData {
    const MSGTYPE: u8 = b'K';

    fn encode(self, w: &mut BufferWriter) {
        w.add_int32(self.process_id).add_int32(self.secret_key);
    }
}

/// Identifies the message as a run-time parameter status report.
#[derive(Debug)]
pub struct ParameterStatus<'a> {
    /// The name of the run-time parameter being reported.
    pub name: &'a str,
    /// The current value of the parameter.
    pub value: &'a str,
}

impl BackendProtocol for ParameterStatus<'_> {
    const MSGTYPE: u8 = b'S';

    fn encode(self, w: &mut BufferWriter) {
        w.add_cstring(self.name).add_cstring(self.value);
    }
}

/// Current backend transaction status indicator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum TransactionStatus {
    /// Not in a transaction block.
    #[default]
    Idle,
    /// In a transaction block.
    InTransaction,
    /// In a failed transaction block, queries will be rejected until block is ended.
    Failed,
}

impl TransactionStatus {
    pub fn as_byte(&self) -> u8 {
        match self {
            TransactionStatus::Idle => b'I',
            TransactionStatus::InTransaction => b'T',
            TransactionStatus::Failed => b'E',
        }
    }
}

/// Identifies the message type. ReadyForQuery is sent whenever the backend is ready for a new query cycle.
#[derive(Debug, Default)]
pub struct ReadyForQuery {
    pub status: TransactionStatus,
}

impl BackendProtocol for ReadyForQuery {
    const MSGTYPE: u8 = b'Z';

    fn encode(self, w: &mut BufferWriter) {
        w.add_byte(self.status.as_byte());
    }
}

/// Map error field name into its field type code.
///
/// Single character name is used as is.
///
/// <https://www.postgresql.org/docs/current/protocol-error-fields.html>
pub fn error_field_code(name: &str) -> Option<u8> {
    if let &[code] = name.as_bytes() {
        return Some(code);
    }
    let code = match name {
        "severity" => b'S',
        "code" => b'C',
        "message" => b'M',
        "detail" => b'D',
        "hint" => b'H',
        "position" => b'P',
        "internal_position" => b'p',
        "internal_query" => b'q',
        "where" => b'W',
        "schema" => b's',
        "table" => b't',
        "column" => b'c',
        "data_type" => b'd',
        "constraint" => b'n',
        "file" => b'F',
        "line" => b'L',
        "routine" => b'R',
        _ => return None,
    };
    Some(code)
}

fn encode_fields<I, K, V>(fields: I, w: &mut BufferWriter)
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Display,
{
    for (name, value) in fields {
        let name = name.as_ref();
        let Some(code) = error_field_code(name) else {
            panic!("unknown error field `{name}`")
        };
        w.add_byte(code).add_cstring(&value.to_string());
    }
    w.add_byte(b'\0');
}

/// Identifies the message as an error.
///
/// Fields are pairs of field name and value, see [`error_field_code`].
///
/// # Panics
///
/// Encoding panics when a field name is unknown.
#[derive(Debug)]
pub struct ErrorResponse<I> {
    pub fields: I,
}

impl<I, K, V> BackendProtocol for ErrorResponse<I>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Display,
{
    const MSGTYPE: u8 = b'E';

    fn encode(self, w: &mut BufferWriter) {
        encode_fields(self.fields, w);
    }
}

/// Identifies the message as a notice.
///
/// Uses the same fields as [`ErrorResponse`].
#[derive(Debug)]
pub struct NoticeResponse<I> {
    pub fields: I,
}

impl<I, K, V> BackendProtocol for NoticeResponse<I>
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: Display,
{
    const MSGTYPE: u8 = b'N';

    fn encode(self, w: &mut BufferWriter) {
        encode_fields(self.fields, w);
    }
}

/// Identifies the message as a row description.
#[derive(Debug)]
pub struct RowDescription<'a> {
    pub fields: &'a [FieldDescriptor],
}

impl BackendProtocol for RowDescription<'_> {
    const MSGTYPE: u8 = b'T';

    fn encode(self, w: &mut BufferWriter) {
        w.add_int16(self.fields.len().to_i16());
        for field in self.fields {
            w.add_cstring(&field.name)
                .add_int32(field.table_id)
                .add_int16(field.column_id)
                .add_int32(field.oid() as i32)
                .add_int16(field.size())
                .add_int32(field.type_modifier)
                .add_int16(field.format.format_code());
        }
    }
}

/// Identifies the message as a data row.
///
/// Each column value is written by the writer of its field type, see [`FieldDescriptor::writer`].
pub struct DataRow<'a, R: ?Sized> {
    pub row: &'a R,
    pub fields: &'a [FieldDescriptor],
}

impl<R: RowValues + ?Sized> BackendProtocol for DataRow<'_, R> {
    const MSGTYPE: u8 = b'D';

    fn encode(self, w: &mut BufferWriter) {
        w.add_int16(self.fields.len().to_i16());
        for (i, field) in self.fields.iter().enumerate() {
            let writer = field.writer();
            writer(self.row.value(i, &field.name), w);
        }
    }
}

/// Identifies the message as a command-completed response.
#[derive(Debug)]
pub struct CommandComplete<'a> {
    /// The command tag, usually a single word that identifies which SQL command was completed.
    pub tag: &'a str,
    /// Object id of the inserted row, only used for `INSERT` tag.
    pub oid: Option<Oid>,
    /// Number of rows affected.
    pub rows: u64,
}

impl BackendProtocol for CommandComplete<'_> {
    const MSGTYPE: u8 = b'C';

    fn encode(self, w: &mut BufferWriter) {
        let mut text = String::with_capacity(self.tag.len() + 16);
        text.push_str(self.tag);
        if self.tag == "INSERT" {
            text.push(' ');
            text.push_str(itoa::Buffer::new().format(self.oid.unwrap_or(0)));
        }
        // row count is never rendered, clients only see the literal suffix
        text.push_str(" rows");
        w.add_cstring(&text);
    }
}

/// Identifies the message as a parameter description.
#[derive(Debug)]
pub struct ParameterDescription<'a> {
    /// Object ID of each parameter data type.
    pub oids: &'a [Oid],
}

impl BackendProtocol for ParameterDescription<'_> {
    const MSGTYPE: u8 = b't';

    fn encode(self, w: &mut BufferWriter) {
        w.add_int16(self.oids.len().to_i16());
        for &oid in self.oids {
            w.add_int32(oid as i32);
        }
    }
}

macro_rules! unit_msg {
    ($(
        $(#[$doc:meta])* struct $name:ident, $ty:literal;
    )*) => {$(
            $(#[$doc])*
            #[derive(Debug)]
            pub struct $name;

            impl BackendProtocol for $name {
                const MSGTYPE: u8 = $ty;

                fn encode(self, _: &mut BufferWriter) { }
            }
    )*};
}

unit_msg! {
    /// Identifies the message as a Parse-complete indicator.
    struct ParseComplete, b'1';

    /// Identifies the message as a Bind-complete indicator.
    struct BindComplete, b'2';

    /// Identifies the message as a Close-complete indicator.
    struct CloseComplete, b'3';

    /// Identifies the message as a no-data indicator.
    struct NoData, b'n';

    /// Identifies the message as a response to an empty query string. (This substitutes for CommandComplete.)
    struct EmptyQueryResponse, b'I';

    /// Identifies the message as a portal-suspended indicator.
    ///
    /// Note this only appears if an Execute message's row-count limit was reached.
    struct PortalSuspended, b's';
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::value::Value;

    fn encode<B: BackendProtocol>(msg: B) -> Bytes {
        write(msg, &mut BufferWriter::new())
    }

    #[test]
    fn authentication() {
        assert_eq!(&encode(Authentication::CleartextPassword)[..], b"R\0\0\0\x08\0\0\0\x03");
        assert_eq!(&encode(Authentication::Ok)[..], b"R\0\0\0\x08\0\0\0\0");
    }

    #[test]
    fn ready_for_query() {
        assert_eq!(&encode(ReadyForQuery::default())[..], b"Z\0\0\0\x05I");
        let status = TransactionStatus::Failed;
        assert_eq!(&encode(ReadyForQuery { status })[..], b"Z\0\0\0\x05E");
    }

    #[test]
    fn error_fields() {
        let fields = [("severity", "ERROR"), ("code", "26000"), ("M", "oops")];
        assert_eq!(
            &encode(ErrorResponse { fields })[..],
            b"E\0\0\0\x19SERROR\0C26000\0Moops\0\0"
        );
        assert_eq!(error_field_code("internal_position"), Some(b'p'));
        assert_eq!(error_field_code("x"), Some(b'x'));
        assert_eq!(error_field_code("unknown"), None);
    }

    #[test]
    #[should_panic]
    fn unmapped_error_field() {
        encode(ErrorResponse { fields: [("unknown", "value")] });
    }

    #[test]
    fn command_complete() {
        let msg = CommandComplete { tag: "INSERT", oid: Some(42), rows: 1 };
        assert_eq!(&encode(msg)[..], b"C\0\0\0\x13INSERT 42 rows\0");
        let msg = CommandComplete { tag: "INSERT", oid: None, rows: 1 };
        assert_eq!(&encode(msg)[..], b"C\0\0\0\x12INSERT 0 rows\0");
        let msg = CommandComplete { tag: "SELECT", oid: None, rows: 3 };
        assert_eq!(&encode(msg)[..], b"C\0\0\0\x10SELECT rows\0");
    }

    #[test]
    fn row_description() {
        let fields = [FieldDescriptor::new("message").type_name("text")];
        assert_eq!(
            &encode(RowDescription { fields: &fields })[..],
            b"T\0\0\0\x20\0\x01message\0\0\0\0\0\0\0\0\0\0\x19\xff\xff\0\0\0\0\0\0"
        );
    }

    #[test]
    fn data_row() {
        let fields = [
            FieldDescriptor::new("message").type_name("text"),
            FieldDescriptor::new("missing"),
        ];
        let row = [Value::from("hi")];
        assert_eq!(
            &encode(DataRow { row: &row[..], fields: &fields })[..],
            b"D\0\0\0\x10\0\x02\0\0\0\x02hi\xff\xff\xff\xff"
        );
    }

    #[test]
    fn unit_messages() {
        assert_eq!(&encode(ParseComplete)[..], b"1\0\0\0\x04");
        assert_eq!(&encode(NoData)[..], b"n\0\0\0\x04");
        assert_eq!(&encode(PortalSuspended)[..], b"s\0\0\0\x04");
    }

    #[test]
    fn parameter_messages() {
        let msg = ParameterStatus { name: "client_encoding", value: "UTF8" };
        assert_eq!(&encode(msg)[..], b"S\0\0\0\x19client_encoding\0UTF8\0");
        let msg = ParameterDescription { oids: &[25, 23] };
        assert_eq!(&encode(msg)[..], b"t\0\0\0\x0e\0\x02\0\0\0\x19\0\0\0\x17");
        let msg = BackendKeyData { process_id: 7, secret_key: -1 };
        assert_eq!(&encode(msg)[..], b"K\0\0\0\x0c\0\0\0\x07\xff\xff\xff\xff");
    }
}
