//! Postgres Frontend and Backend Protocol, from the server side.
//!
//! Docs here mostly quoted from the official postgres documentation.
//!
//! ## Messaging Overview
//!
//! All communication is through a stream of messages. The first byte of a message identifies the message type,
//! and the next four bytes specify the length of the rest of the message (this length count includes itself,
//! but not the message-type byte). The remaining contents of the message are determined by the message type.
//!
//! ```text
//! ┏━━━━┳━━━━━━━━━━━━━━━━━━━┳━━━━━━┓
//! ┃ Ty ┃       Length      ┃ Body ┃
//! ┣━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━┫
//! ┃ u8 ┃        u32        ┃ [u8] ┃
//! ┣━━━━╋━━━━━━━━━━━━━━━━━━━╋━━━━━━┫
//! ┃ 43 ┃ 00 | 00 | 00 | 32 ┃  ..  ┃
//! ┗━━━━┻━━━━━━━━━━━━━━━━━━━┻━━━━━━┛
//! ```
//!
//! For historical reasons, the very first message sent by the client (the startup message)
//! has no initial message-type byte.
//!
//! Here [`frontend`] messages are decoded, and [`backend`] messages are encoded.
//!
//! <https://www.postgresql.org/docs/17/protocol-overview.html>

pub mod pg_type;
mod pg_format;
pub mod sqlstate;

pub mod frontend;
pub mod backend;

mod error;

pub use pg_type::{Oid, PgTypeInfo};
pub use pg_format::PgFormat;

pub use frontend::{FrontendMessage, FrontendProtocol, Startup};
pub use backend::{BackendProtocol, TransactionStatus};
pub use error::ProtocolError;
