//! Tokio server driver.
//!
//! [`Server`] accepts clients and runs one task per client. Each task pipes
//! received bytes into a [`Connection`], hands every [`Event`] to a [`Delegate`],
//! and writes the queued responses back.
//!
//! ```no_run
//! use pgface::{Connection, Event, server::Server};
//!
//! # async fn app() -> pgface::Result<()> {
//! let server = Server::bind_env().await?;
//!
//! server.serve(|| |conn: &mut Connection, event: Event| match event {
//!     Event::Connect(_) => {
//!         conn.send_authentication_ok();
//!         conn.send_ready_for_query(Default::default());
//!     }
//!     Event::Terminate => conn.end(),
//!     _ => {}
//! }).await
//! # }
//! ```
use bytes::BytesMut;
use std::{io, net::SocketAddr, time::Duration};
use tokio::{
    io::AsyncWriteExt,
    net::{TcpListener, TcpStream},
};

use crate::{
    Connection, Event, Result,
    common::{log_warn, verbose},
    io::ReadChunk,
};

mod config;

pub use config::{Config, ParseError};

/// Handle events of a single client.
///
/// Responses are queued by calling `send_*` on the given [`Connection`].
pub trait Delegate: Send + 'static {
    fn event(&mut self, conn: &mut Connection, event: Event);
}

impl<F> Delegate for F
where
    F: FnMut(&mut Connection, Event) + Send + 'static,
{
    fn event(&mut self, conn: &mut Connection, event: Event) {
        self(conn, event)
    }
}

/// Postgres protocol server.
#[derive(Debug)]
pub struct Server {
    listener: TcpListener,
    config: Config,
}

impl Server {
    /// Bind listener with config from environment variable.
    ///
    /// See [`Config::from_env`] for more details on env.
    pub async fn bind_env() -> Result<Server> {
        Self::bind(Config::from_env()).await
    }

    pub async fn bind(config: Config) -> Result<Server> {
        let listener = TcpListener::bind((config.host(), config.port())).await?;
        verbose!(addr = ?listener.local_addr(), "listening");
        Ok(Self { listener, config })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Accept clients forever.
    ///
    /// `make_delegate` is called once per accepted client.
    pub async fn serve<F, D>(self, mut make_delegate: F) -> Result<()>
    where
        F: FnMut() -> D,
        D: Delegate,
    {
        let read_timeout = self.config.read_timeout();
        loop {
            let (socket, _addr) = match self.listener.accept().await {
                Ok(ok) => ok,
                Err(err) => {
                    // accept errors are per client, like the peer resetting before accepted
                    log_warn!("failed to accept client: {err}");
                    continue;
                }
            };
            verbose!(addr = %_addr, "accepted");
            tokio::spawn(drive(socket, make_delegate(), read_timeout));
        }
    }
}

/// Run a single client until the socket closes or the delegate calls [`Connection::end`].
///
/// The last event is always [`Event::SocketClose`].
pub async fn drive<D: Delegate>(mut socket: TcpStream, mut delegate: D, read_timeout: Option<Duration>) {
    let mut conn = Connection::new();
    let mut buf = BytesMut::new();

    loop {
        let read = ReadChunk::new(&mut socket, &mut buf);
        let result = match read_timeout {
            Some(timeout) => match tokio::time::timeout(timeout, read).await {
                Ok(ok) => Some(ok),
                Err(_) => None,
            },
            None => Some(read.await),
        };

        match result {
            Some(Ok(Some(chunk))) => {
                conn.feed(chunk);
                while let Some(event) = conn.next_event() {
                    delegate.event(&mut conn, event);
                }
            }
            Some(Ok(None)) => {
                verbose!("client end");
                delegate.event(&mut conn, Event::SocketEnd);
                conn.end();
            }
            Some(Err(err)) => {
                log_warn!("failed to read from client: {err}");
                delegate.event(&mut conn, Event::SocketError(err));
                break;
            }
            None => delegate.event(&mut conn, Event::SocketTimeout),
        }

        if let Err(err) = write_output(&mut socket, &mut conn).await {
            log_warn!("failed to write to client: {err}");
            delegate.event(&mut conn, Event::SocketError(err));
            break;
        }

        if conn.is_ended() {
            // the client may already be gone
            let _ = socket.shutdown().await;
            break;
        }
    }

    delegate.event(&mut conn, Event::SocketClose);
}

async fn write_output(socket: &mut TcpStream, conn: &mut Connection) -> io::Result<()> {
    while let Some(mut output) = conn.next_output() {
        socket.write_all_buf(&mut output).await?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use tokio::io::AsyncReadExt;

    use super::*;
    use crate::{FieldDescriptor, Value};

    async fn server() -> SocketAddr {
        let config = Config::parse("127.0.0.1:0").unwrap();
        let server = Server::bind(config).await.unwrap();
        let addr = server.local_addr().unwrap();

        tokio::spawn(server.serve(|| |conn: &mut Connection, event: Event| match event {
            Event::Connect(_) => {
                conn.send_authentication_ok();
                conn.send_ready_for_query(Default::default());
            }
            Event::Query(_) => {
                let fields = [FieldDescriptor::new("n").type_name("int4")];
                conn.send_row_description(&fields);
                conn.send_data_rows([[Value::from(1)]], &fields);
                conn.send_command_complete("SELECT", None, 1);
                conn.send_ready_for_query(Default::default());
            }
            Event::Terminate => conn.end(),
            _ => {}
        }));

        addr
    }

    async fn read_exact(socket: &mut TcpStream, len: usize) -> Vec<u8> {
        let mut buf = vec![0; len];
        socket.read_exact(&mut buf).await.unwrap();
        buf
    }

    #[tokio::test]
    async fn serve_client() {
        let addr = server().await;
        let mut socket = TcpStream::connect(addr).await.unwrap();

        socket.write_all(b"\0\0\0\x08\x04\xd2\x16\x2f").await.unwrap();
        assert_eq!(read_exact(&mut socket, 1).await, b"N");

        socket.write_all(b"\0\0\0\x12\0\x03\0\0user\0bob\0\0").await.unwrap();
        assert_eq!(read_exact(&mut socket, 15).await, b"R\0\0\0\x08\0\0\0\0Z\0\0\0\x05I");

        socket.write_all(b"Q\0\0\0\x0dSELECT 1\0").await.unwrap();
        let response = read_exact(&mut socket, 27 + 12 + 17 + 6).await;
        assert_eq!(response[0], b'T');
        assert_eq!(&response[27..39], b"D\0\0\0\x0b\0\x01\0\0\0\x011");
        assert_eq!(&response[56..], b"Z\0\0\0\x05I");

        socket.write_all(b"X\0\0\0\x04").await.unwrap();
        let mut rest = vec![];
        socket.read_to_end(&mut rest).await.unwrap();
        assert!(rest.is_empty());
    }
}
