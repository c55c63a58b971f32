//! Postgres Wire Protocol Server
//!
//! Impersonate a postgres server to unmodified postgres clients. SQL execution
//! is left to the user, which receives client requests as [`Event`] and responds
//! with the `send_*` methods of [`Connection`].
//!
//! # Examples
//!
//! Serve with the tokio driver:
//!
//! ```no_run
//! use pgface::{Connection, Event, FieldDescriptor, Value, server::Server};
//!
//! # async fn app() -> pgface::Result<()> {
//! let server = Server::bind_env().await?;
//!
//! server.serve(|| |conn: &mut Connection, event: Event| match event {
//!     Event::Connect(_) => {
//!         conn.send_authentication_ok();
//!         conn.send_ready_for_query(Default::default());
//!     }
//!     Event::Query(_) => {
//!         let fields = [FieldDescriptor::new("message").type_name("text")];
//!         conn.send_row_description(&fields);
//!         conn.send_data_rows([[Value::from("hello")]], &fields);
//!         conn.send_command_complete("SELECT", None, 1);
//!         conn.send_ready_for_query(Default::default());
//!     }
//!     Event::Terminate => conn.end(),
//!     _ => {}
//! }).await
//! # }
//! ```
//!
//! Without the driver, [`Connection`] can be used with any transport, see
//! the [`connection`] module.

pub mod common;
mod ext;

// Protocol
pub mod codec;
pub mod framer;
pub mod postgres;

// Formatting
mod value;
pub mod row;
pub mod types;

// Component
mod statement;

// Connection
pub mod connection;

#[cfg(feature = "tokio")]
mod io;
#[cfg(feature = "tokio")]
pub mod server;

mod error;

pub use value::Value;
pub use row::{FieldDescriptor, RowValues};
pub use statement::{PreparedStatement, Portal};
pub use postgres::TransactionStatus;

pub use connection::{Connection, Event, Phase};
pub use error::{Error, ErrorKind, Result};
