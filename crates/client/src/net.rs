use std::borrow::Cow;

use futures_util::{SinkExt, StreamExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::time::{timeout, Duration};
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::protocol::{frame::coding::CloseCode, CloseFrame};
use tokio_tungstenite::tungstenite::Message;
use url::Url;

use rail_common::config::ClientConfig;
use rail_common::ids::{new_message_id, now_ms};
use rail_protocol::envelope::{new_envelope, open_payload};
use rail_protocol::{method, Envelope, ServerError, ServerHello};

/// A call the server answered with `server.error`.
#[derive(Debug, Error)]
#[error("{code}: {message}")]
pub struct CallFailed {
    pub code: String,
    pub message: String,
}

enum OutgoingMessage {
    Envelope(Envelope),
    Close,
}

pub struct Connection {
    outgoing: mpsc::UnboundedSender<OutgoingMessage>,
    incoming: mpsc::UnboundedReceiver<Envelope>,
    reply_timeout: Duration,
    pub hello: ServerHello,
}

impl Connection {
    pub async fn connect(config: &ClientConfig) -> anyhow::Result<Self> {
        let limit = Duration::from_secs(config.connect_timeout_secs);
        let url = Url::parse(&config.server_url)?;
        if !matches!(url.scheme(), "ws" | "wss") {
            anyhow::bail!("server_url must be a ws:// or wss:// url");
        }

        let (ws_stream, _) = timeout(limit, connect_async(url.as_str()))
            .await
            .map_err(|_| anyhow::anyhow!("connect timeout ({}s)", limit.as_secs()))??;
        let (mut ws_write, mut ws_read) = ws_stream.split();

        let hello_msg = timeout(limit, ws_read.next())
            .await
            .map_err(|_| anyhow::anyhow!("timeout waiting for server.hello"))?
            .ok_or_else(|| anyhow::anyhow!("no server hello"))??;
        let hello_env: Envelope = serde_json::from_str(hello_msg.to_text()?)?;
        if hello_env.message_type != method::HELLO {
            anyhow::bail!("expected server.hello, got {}", hello_env.message_type)
        }
        let hello: ServerHello = open_payload(&hello_env)?;
        tracing::debug!(server_version = %hello.server_version, trains = hello.trains.len(), "connected");

        let (out_tx, mut out_rx) = mpsc::unbounded_channel::<OutgoingMessage>();
        let (in_tx, in_rx) = mpsc::unbounded_channel::<Envelope>();

        tokio::spawn(async move {
            while let Some(msg) = out_rx.recv().await {
                match msg {
                    OutgoingMessage::Envelope(env) => {
                        if let Ok(text) = serde_json::to_string(&env) {
                            if ws_write.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                    }
                    OutgoingMessage::Close => {
                        let frame = CloseFrame {
                            code: CloseCode::Normal,
                            reason: Cow::Borrowed("client exit"),
                        };
                        let _ = ws_write.send(Message::Close(Some(frame))).await;
                        break;
                    }
                }
            }
        });

        tokio::spawn(async move {
            while let Some(Ok(msg)) = ws_read.next().await {
                if !msg.is_text() {
                    continue;
                }
                match msg.to_text().map(serde_json::from_str::<Envelope>) {
                    Ok(Ok(env)) => {
                        if in_tx.send(env).is_err() {
                            break;
                        }
                    }
                    _ => tracing::warn!("dropping undecodable frame from server"),
                }
            }
        });

        Ok(Self {
            outgoing: out_tx,
            incoming: in_rx,
            reply_timeout: limit,
            hello,
        })
    }

    /// Sends one call and waits for the envelope that replies to it.
    pub async fn request<Req, Resp>(&mut self, call: &str, payload: &Req) -> anyhow::Result<Resp>
    where
        Req: Serialize,
        Resp: DeserializeOwned,
    {
        let request = new_envelope(call, &new_message_id(), now_ms(), payload)?;
        let request_id = request.id.clone();
        self.outgoing
            .send(OutgoingMessage::Envelope(request))
            .map_err(|_| anyhow::anyhow!("connection closed"))?;

        loop {
            let reply = timeout(self.reply_timeout, self.incoming.recv())
                .await
                .map_err(|_| anyhow::anyhow!("timeout waiting for reply to {call}"))?
                .ok_or_else(|| anyhow::anyhow!("connection closed"))?;
            if reply.reply_to.as_deref() != Some(request_id.as_str()) {
                tracing::debug!(kind = %reply.message_type, "ignoring unrelated envelope");
                continue;
            }
            if reply.message_type == method::ERROR {
                let err: ServerError = open_payload(&reply)?;
                return Err(CallFailed {
                    code: err.code,
                    message: err.message,
                }
                .into());
            }
            return open_payload(&reply);
        }
    }

    pub fn close(&self) {
        let _ = self.outgoing.send(OutgoingMessage::Close);
    }
}

/// Error code of a failed call, if the server produced one.
pub fn error_code(err: &anyhow::Error) -> Option<&str> {
    err.downcast_ref::<CallFailed>().map(|failed| failed.code.as_str())
}
