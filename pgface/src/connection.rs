//! Per client protocol state machine.
//!
//! [`Connection`] does no io. Received bytes are given to [`feed`][Connection::feed],
//! then [`next_event`][Connection::next_event] is called until it returns [`None`].
//! Responses are queued, and taken with [`next_output`][Connection::next_output]
//! to be written to the client.
//!
//! ```
//! use pgface::{Connection, Event};
//!
//! let mut conn = Connection::new();
//! conn.feed(bytes::Bytes::from_static(b"\0\0\0\x12\0\x03\0\0user\0bob\0\0"));
//!
//! while let Some(event) = conn.next_event() {
//!     match event {
//!         Event::Connect(_) => {
//!             conn.send_authentication_ok();
//!             conn.send_ready_for_query(Default::default());
//!         }
//!         _ => {}
//!     }
//! }
//!
//! assert_eq!(&conn.next_output().unwrap()[..], b"R\0\0\0\x08\0\0\0\0");
//! ```
use bytes::Bytes;
use std::{
    collections::{HashMap, VecDeque},
    fmt::Display,
};

use crate::{
    codec::BufferWriter,
    common::{ByteStr, log_warn, span, verbose},
    framer::{Framer, Message},
    postgres::{
        FrontendMessage, FrontendProtocol, Oid, Startup, TransactionStatus,
        backend::{self, *},
        frontend, sqlstate,
    },
    row::{FieldDescriptor, RowValues},
    statement::{Portal, PreparedStatement},
};

mod event;

pub use event::Event;

/// Handshake phase of a [`Connection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for startup message, messages has no message type.
    AwaitingStartup,
    /// Startup message accepted.
    Established,
}

/// Server side state of a single client.
#[derive(Debug)]
pub struct Connection {
    phase: Phase,
    framer: Framer,
    writer: BufferWriter,
    output: VecDeque<Bytes>,
    statements: HashMap<ByteStr, PreparedStatement>,
    portals: HashMap<ByteStr, Portal>,
    ended: bool,
}

impl Default for Connection {
    fn default() -> Self {
        Self::new()
    }
}

impl Connection {
    pub fn new() -> Self {
        Self {
            phase: Phase::AwaitingStartup,
            framer: Framer::new(0, 0),
            writer: BufferWriter::new(),
            output: VecDeque::new(),
            statements: HashMap::new(),
            portals: HashMap::new(),
            ended: false,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Returns statement by name, empty name is the unnamed statement.
    pub fn statement(&self, name: &str) -> Option<&PreparedStatement> {
        self.statements.get(name)
    }

    /// Returns portal by name, empty name is the unnamed portal.
    pub fn portal(&self, name: &str) -> Option<&Portal> {
        self.portals.get(name)
    }

    /// Buffer bytes received from the client.
    pub fn feed(&mut self, chunk: Bytes) {
        verbose!(len = chunk.len(), "feed");
        self.framer.add_chunk(chunk);
    }

    /// Process buffered messages until one produce an [`Event`].
    ///
    /// Returns [`None`] when more bytes is required. Automatic responses, like
    /// `ParseComplete`, are queued while processing.
    pub fn next_event(&mut self) -> Option<Event> {
        while let Some(Message { tag, payload }) = self.framer.read() {
            let event = match (self.phase, tag) {
                (Phase::Established, Some(tag)) => self.dispatch(tag, payload),
                _ => self.startup(payload),
            };
            if event.is_some() {
                return event;
            }
        }
        None
    }

    /// Take the next framed response to be written to the client.
    pub fn next_output(&mut self) -> Option<Bytes> {
        self.output.pop_front()
    }

    pub fn has_output(&self) -> bool {
        !self.output.is_empty()
    }

    /// Request the transport to close the connection after queued responses are written.
    pub fn end(&mut self) {
        self.ended = true;
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    fn startup(&mut self, payload: Bytes) -> Option<Event> {
        match Startup::decode(payload.clone()) {
            Ok(Startup::SslRequest) => {
                verbose!("ssl request declined");
                self.writer.add_byte(b'N');
                let answer = self.writer.flush_untagged();
                self.output.push_back(answer);
                None
            }
            Ok(Startup::Startup { params }) => {
                verbose!(?params, "startup");
                self.framer.set_header_size(1);
                self.phase = Phase::Established;
                Some(Event::Connect(params))
            }
            Err(error) => {
                log_warn!("{error}");
                Some(Event::ProtocolError { error, payload })
            }
        }
    }

    fn dispatch(&mut self, tag: u8, payload: Bytes) -> Option<Event> {
        span!("dispatch", msgtype = %char::from(tag));

        // statement is resolved before the parameter lists are decoded
        if tag == frontend::Bind::MSGTYPE {
            if let Some((_, stmt_name)) = frontend::Bind::names(payload.clone()) {
                if !self.statements.contains_key(&stmt_name) {
                    self.send_unknown_statement();
                    return None;
                }
            }
        }

        let message = match FrontendMessage::decode(tag, payload.clone()) {
            Ok(ok) => ok,
            Err(error) => {
                log_warn!("{error}");
                return Some(Event::ProtocolError { error, payload });
            }
        };

        verbose!(?message, "recv");

        let event = match message {
            FrontendMessage::PasswordMessage(msg) => Event::Password(msg.password),
            FrontendMessage::Query(msg) => Event::Query(msg.sql),
            FrontendMessage::Terminate(_) => Event::Terminate,
            FrontendMessage::Parse(msg) => self.parse(msg),
            FrontendMessage::Bind(msg) => self.bind(msg)?,
            FrontendMessage::Describe(msg) => self.describe(msg)?,
            FrontendMessage::Execute(msg) => {
                let Some(portal) = self.portals.get(&msg.portal_name) else {
                    self.send_unknown(sqlstate::INVALID_SQL_STATEMENT_NAME, "Unknown portal");
                    return None;
                };
                Event::Execute { portal: portal.clone(), max_rows: msg.max_row }
            }
            FrontendMessage::Flush(_) => Event::Flush,
            FrontendMessage::Sync(_) => Event::Sync,
        };

        Some(event)
    }

    fn parse(&mut self, msg: frontend::Parse) -> Event {
        let statement = PreparedStatement {
            name: msg.prepare_name,
            query: msg.sql,
            param_types: msg.oids,
        };
        self.statements.insert(statement.name.clone(), statement.clone());
        self.send_parse_complete();
        Event::Parse(statement)
    }

    fn bind(&mut self, msg: frontend::Bind) -> Option<Event> {
        let Some(statement) = self.statements.get(&msg.stmt_name) else {
            self.send_unknown_statement();
            return None;
        };

        let portal = Portal {
            name: msg.portal_name,
            statement: statement.clone(),
            param_formats: msg.param_formats,
            params: msg.params,
            result_formats: msg.result_formats,
        };
        self.portals.insert(portal.name.clone(), portal.clone());
        self.send_bind_complete();
        Some(Event::Bind(portal))
    }

    fn describe(&mut self, msg: frontend::Describe) -> Option<Event> {
        let event = match msg.kind {
            b'S' => self.statements.get(&msg.name).cloned().map(Event::DescribeStatement),
            b'P' => self.portals.get(&msg.name).cloned().map(Event::DescribePortal),
            _ => {
                log_warn!("unknown describe target `{}`", char::from(msg.kind).escape_default());
                self.send_unknown(sqlstate::PROTOCOL_VIOLATION, "Unknown describe command");
                return None;
            }
        };

        if event.is_none() {
            let message = match msg.kind {
                b'S' => "Unknown prepared statement",
                _ => "Unknown portal",
            };
            self.send_unknown(sqlstate::INVALID_SQL_STATEMENT_NAME, message);
        }

        event
    }

    fn send_unknown_statement(&mut self) {
        self.send_unknown(sqlstate::INVALID_SQL_STATEMENT_NAME, "Unknown prepared statement");
    }

    fn send_unknown(&mut self, code: &str, message: &str) {
        self.send_error_response([("severity", "ERROR"), ("code", code), ("message", message)]);
    }
}

/// Responses.
///
/// All operations only queue the framed message.
impl Connection {
    /// Queue any backend message.
    pub fn send<B: BackendProtocol>(&mut self, msg: B) {
        let buf = backend::write(msg, &mut self.writer);
        verbose!(msgtype = %char::from(B::MSGTYPE), len = buf.len(), "send");
        self.output.push_back(buf);
    }

    pub fn send_authentication_ok(&mut self) {
        self.send(Authentication::Ok);
    }

    pub fn send_authentication_cleartext_password(&mut self) {
        self.send(Authentication::CleartextPassword);
    }

    pub fn send_backend_key_data(&mut self, process_id: i32, secret_key: i32) {
        self.send(BackendKeyData { process_id, secret_key });
    }

    pub fn send_parameter_status(&mut self, name: &str, value: &str) {
        self.send(ParameterStatus { name, value });
    }

    pub fn send_ready_for_query(&mut self, status: TransactionStatus) {
        self.send(ReadyForQuery { status });
    }

    /// Queue `ErrorResponse` from field name and value pairs.
    ///
    /// Field name is either a single character field type, or a name
    /// listed in [`error_field_code`][backend::error_field_code].
    ///
    /// # Panics
    ///
    /// Panics if a field name is unknown.
    pub fn send_error_response<I, K, V>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Display,
    {
        self.send(ErrorResponse { fields });
    }

    /// Queue `NoticeResponse`, uses the same fields as [`send_error_response`][Connection::send_error_response].
    ///
    /// # Panics
    ///
    /// Panics if a field name is unknown.
    pub fn send_notice_response<I, K, V>(&mut self, fields: I)
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Display,
    {
        self.send(NoticeResponse { fields });
    }

    pub fn send_parse_complete(&mut self) {
        self.send(ParseComplete);
    }

    pub fn send_bind_complete(&mut self) {
        self.send(BindComplete);
    }

    pub fn send_close_complete(&mut self) {
        self.send(CloseComplete);
    }

    pub fn send_no_data(&mut self) {
        self.send(NoData);
    }

    pub fn send_empty_query_response(&mut self) {
        self.send(EmptyQueryResponse);
    }

    pub fn send_portal_suspended(&mut self) {
        self.send(PortalSuspended);
    }

    pub fn send_parameter_description(&mut self, oids: &[Oid]) {
        self.send(ParameterDescription { oids });
    }

    pub fn send_row_description(&mut self, fields: &[FieldDescriptor]) {
        self.send(RowDescription { fields });
    }

    /// Queue one `DataRow` per row.
    ///
    /// Values are matched to `fields` by position or by name, depending on the row type.
    pub fn send_data_rows<I>(&mut self, rows: I, fields: &[FieldDescriptor])
    where
        I: IntoIterator,
        I::Item: RowValues,
    {
        for row in rows {
            self.send(DataRow { row: &row, fields });
        }
    }

    /// Queue `CommandComplete`.
    ///
    /// `oid` is only written for `INSERT` tag, the text is always suffixed with ` rows`.
    pub fn send_command_complete(&mut self, tag: &str, oid: Option<Oid>, rows: u64) {
        verbose!(tag, rows, "command complete");
        self.send(CommandComplete { tag, oid, rows });
    }
}
