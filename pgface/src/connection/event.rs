use bytes::Bytes;
use std::{collections::HashMap, io};

use crate::{
    common::ByteStr,
    postgres::ProtocolError,
    statement::{Portal, PreparedStatement},
};

/// An event that requires a response from the server implementation.
///
/// Protocol events are returned by [`Connection::next_event`][super::Connection::next_event],
/// socket events are produced by the transport driver.
#[derive(Debug)]
pub enum Event {
    /// Startup message accepted, contains the startup parameters such as `user` and `database`.
    Connect(HashMap<ByteStr, ByteStr>),
    /// Password response.
    Password(ByteStr),
    /// Simple query.
    Query(ByteStr),
    /// The client is closing the connection.
    Terminate,
    /// A statement is registered, `ParseComplete` is already queued.
    Parse(PreparedStatement),
    /// A portal is registered, `BindComplete` is already queued.
    Bind(Portal),
    DescribeStatement(PreparedStatement),
    DescribePortal(Portal),
    Execute {
        portal: Portal,
        /// Maximum number of rows to return, zero denotes no limit.
        max_rows: i32,
    },
    Flush,
    Sync,
    /// A message that cannot be understood, with its raw payload.
    ProtocolError {
        error: ProtocolError,
        payload: Bytes,
    },
    /// The client has closed its write half.
    SocketEnd,
    SocketError(io::Error),
    /// No bytes received within the configured read timeout.
    SocketTimeout,
    /// The socket is closed, this is the last event of a connection.
    SocketClose,
}
