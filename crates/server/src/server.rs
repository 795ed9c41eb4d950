use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, RwLock};
use tokio_tungstenite::accept_async;
use tokio_tungstenite::tungstenite::Message;

use rail_booking::Store;
use rail_common::config::ServerConfig;
use rail_common::ids::{new_message_id, now_ms};
use rail_protocol::envelope::{error_envelope, new_envelope};
use rail_protocol::{method, Envelope};

use crate::handlers::{dispatch, server_hello};

/// One store per server; every call takes this lock for its whole duration.
pub type SharedStore = Arc<RwLock<Store>>;

pub struct BookingServer {
    config: ServerConfig,
    store: SharedStore,
}

impl BookingServer {
    pub fn new(config: ServerConfig, store: Store) -> Self {
        Self {
            config,
            store: Arc::new(RwLock::new(store)),
        }
    }

    pub async fn run(&self) -> anyhow::Result<()> {
        let listener = TcpListener::bind(&self.config.bind_addr).await?;
        tracing::info!(addr = %listener.local_addr()?, "booking server listening");
        self.serve(listener).await
    }

    pub async fn serve(&self, listener: TcpListener) -> anyhow::Result<()> {
        loop {
            let (stream, addr) = listener.accept().await?;
            let conn_id = uuid::Uuid::new_v4().to_string();
            tracing::info!(conn = %conn_id, %addr, "connection accepted");
            let store = Arc::clone(&self.store);
            tokio::spawn(async move {
                if let Err(err) = handle_connection(stream, store, &conn_id, addr).await {
                    tracing::error!(conn = %conn_id, "connection error: {err}");
                }
            });
        }
    }
}

async fn handle_connection(
    stream: TcpStream,
    store: SharedStore,
    conn_id: &str,
    addr: SocketAddr,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    let (mut ws_write, mut ws_read) = ws_stream.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let writer = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_write.send(msg).await.is_err() {
                break;
            }
        }
    });

    let hello = server_hello(&store).await;
    send_envelope(&tx, &new_envelope(method::HELLO, &new_message_id(), now_ms(), &hello)?)?;

    while let Some(msg) = ws_read.next().await {
        let msg = msg?;
        if msg.is_close() {
            break;
        }
        if !msg.is_text() {
            continue;
        }
        let request: Envelope = match serde_json::from_str(msg.to_text()?) {
            Ok(env) => env,
            Err(err) => {
                tracing::warn!(conn = %conn_id, "undecodable frame: {err}");
                let reply = error_envelope(
                    None,
                    &new_message_id(),
                    now_ms(),
                    "bad_request",
                    &format!("invalid envelope: {err}"),
                )?;
                send_envelope(&tx, &reply)?;
                continue;
            }
        };
        tracing::debug!(conn = %conn_id, request = %request.id, method = %request.message_type, "call");
        let reply = dispatch(&request, &store).await?;
        send_envelope(&tx, &reply)?;
    }

    drop(tx);
    let _ = writer.await;
    tracing::info!(conn = %conn_id, %addr, "connection closed");
    Ok(())
}

fn send_envelope(tx: &mpsc::UnboundedSender<Message>, env: &Envelope) -> anyhow::Result<()> {
    let text = serde_json::to_string(env)?;
    tx.send(Message::Text(text))?;
    Ok(())
}
