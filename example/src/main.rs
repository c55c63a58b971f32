use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::{info, warn};
use tracing_subscriber::{
    EnvFilter, layer::SubscriberExt, util::SubscriberInitExt,
};

use pgface::{
    Connection, Event, FieldDescriptor, Result, Value,
    postgres::sqlstate,
    server::{Delegate, Server},
    types::Json,
};

/// Answer every portal with a single row.
struct Demo {
    id: usize,
    fields: Vec<FieldDescriptor>,
}

impl Demo {
    fn new() -> Self {
        static ID: AtomicUsize = AtomicUsize::new(0);
        Self {
            id: ID.fetch_add(1, Ordering::Relaxed),
            fields: vec![
                FieldDescriptor::new("message").type_name("text"),
                FieldDescriptor::new("served_at").type_name("timestamp"),
                FieldDescriptor::new("meta").type_name("json"),
            ],
        }
    }

    fn row(&self) -> [Value; 3] {
        [
            Value::from("foo"),
            Value::from(time::UtcDateTime::now()),
            Value::from(Json(serde_json::json!({ "client": self.id }))),
        ]
    }
}

impl Delegate for Demo {
    fn event(&mut self, conn: &mut Connection, event: Event) {
        let id = self.id;
        match event {
            Event::Connect(params) => {
                info!(id, ?params, "connect");
                conn.send_authentication_cleartext_password();
            }
            Event::Password(_) => {
                info!(id, "password");
                conn.send_authentication_ok();
                conn.send_parameter_status("server_version", "16.0");
                conn.send_parameter_status("client_encoding", "UTF8");
                conn.send_backend_key_data(id as i32, 0);
                conn.send_ready_for_query(Default::default());
            }
            Event::Query(sql) => {
                info!(id, %sql, "query");
                if sql.trim().is_empty() {
                    conn.send_empty_query_response();
                } else {
                    conn.send_error_response([
                        ("severity", "ERROR"),
                        ("code", sqlstate::SYSTEM_ERROR),
                        ("message", "Not Implemented"),
                    ]);
                }
                conn.send_ready_for_query(Default::default());
            }
            Event::Parse(statement) => info!(id, ?statement, "parse"),
            Event::Bind(portal) => info!(id, ?portal, "bind"),
            Event::DescribeStatement(statement) => {
                info!(id, ?statement, "describe statement");
                conn.send_parameter_description(&statement.param_types);
                conn.send_row_description(&self.fields);
            }
            Event::DescribePortal(portal) => {
                info!(id, ?portal, "describe portal");
                conn.send_row_description(&self.fields);
            }
            Event::Execute { portal, max_rows } => {
                info!(id, ?portal, max_rows, "execute");
                conn.send_data_rows([self.row()], &self.fields);
                conn.send_command_complete("SELECT", None, 1);
            }
            Event::Flush => info!(id, "flush"),
            Event::Sync => {
                info!(id, "sync");
                conn.send_ready_for_query(Default::default());
            }
            Event::Terminate => {
                info!(id, "terminate");
                conn.end();
            }
            Event::ProtocolError { error, payload } => {
                warn!(id, %error, len = payload.len(), "protocol error");
                conn.send_error_response([
                    ("severity", "FATAL"),
                    ("code", sqlstate::PROTOCOL_VIOLATION),
                    ("message", &*error.to_string()),
                ]);
                conn.end();
            }
            Event::SocketEnd => info!(id, "socket end"),
            Event::SocketError(err) => warn!(id, %err, "socket error"),
            Event::SocketTimeout => {
                info!(id, "socket timeout");
                conn.end();
            }
            Event::SocketClose => info!(id, "socket close"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::Registry::default()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let server = Server::bind_env().await?;
    info!(addr = %server.local_addr()?, "listening");

    server.serve(Demo::new).await
}
