//! # Block Header Stream
//!
//! `eth_subscribe("newHeads")` over a node WebSocket, forwarded as
//! [`ProviderEvent::NewBlock`] into the provider's event queue.
//!
//! Reconnects with exponential backoff (1s doubling to 60s). A connection only counts as
//! healthy once it delivered a block; after [`MAX_CONNECTION_ATTEMPTS`] consecutive
//! connections that failed or stayed silent, or as soon as the node answers `eth_subscribe`
//! with an error, the stream is abandoned and the polling watcher keeps block height current,
//! only less promptly.

use std::time::Duration;

use async_channel::Sender;
use futures_util::{SinkExt, StreamExt};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info, trace, warn};

use super::wallet::parse_quantity;
use crate::core::service::ProviderEvent;

/// Consecutive failed or silent connections before the stream is abandoned.
pub const MAX_CONNECTION_ATTEMPTS: u32 = 5;
const INITIAL_RECONNECT_DELAY: Duration = Duration::from_secs(1);
const MAX_RECONNECT_DELAY: Duration = Duration::from_secs(60);

/// Spawn the subscription loop for `url`, sending block numbers into `events`.
pub fn spawn_new_heads(url: String, events: Sender<ProviderEvent>) -> JoinHandle<()> {
    tokio::spawn(async move { run_new_heads(&url, events).await })
}

async fn run_new_heads(url: &str, events: Sender<ProviderEvent>) {
    let mut reconnect_delay = INITIAL_RECONNECT_DELAY;
    let mut failed_attempts = 0u32;

    loop {
        if failed_attempts >= MAX_CONNECTION_ATTEMPTS {
            error!(
                url = %url,
                attempts = failed_attempts,
                "newHeads subscription unavailable, relying on polling for block height"
            );
            return;
        }

        match connect_async(url).await {
            Ok((stream, response)) => {
                info!(url = %url, status = ?response.status(), "WebSocket connected");

                match stream_heads(stream, &events).await {
                    StreamEnd::Delivered => {
                        failed_attempts = 0;
                        reconnect_delay = INITIAL_RECONNECT_DELAY;
                    }
                    StreamEnd::Empty => {
                        failed_attempts += 1;
                        warn!(
                            url = %url,
                            attempt = failed_attempts,
                            "WebSocket closed before any block arrived"
                        );
                    }
                    StreamEnd::Rejected(reason) => {
                        error!(
                            url = %url,
                            reason = %reason,
                            "Node rejected eth_subscribe, relying on polling for block height"
                        );
                        return;
                    }
                    StreamEnd::QueueClosed => {
                        debug!("Event queue closed, stopping newHeads stream");
                        return;
                    }
                }
            }
            Err(e) => {
                failed_attempts += 1;
                warn!(
                    url = %url,
                    attempt = failed_attempts,
                    error = %e,
                    "WebSocket connect failed"
                );
            }
        }

        debug!(delay_secs = reconnect_delay.as_secs(), "Reconnecting newHeads stream");
        sleep(reconnect_delay).await;
        reconnect_delay = (reconnect_delay * 2).min(MAX_RECONNECT_DELAY);
    }
}

/// How one connection ended.
enum StreamEnd {
    /// At least one block was forwarded before the connection dropped.
    Delivered,
    /// The connection dropped without delivering a block.
    Empty,
    /// The node answered the subscription with an error.
    Rejected(String),
    QueueClosed,
}

async fn stream_heads(
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
    events: &Sender<ProviderEvent>,
) -> StreamEnd {
    let (mut write, mut read) = stream.split();
    if let Err(e) = write.send(Message::Text(subscribe_request())).await {
        warn!(error = %e, "Failed to send newHeads subscription");
        return StreamEnd::Empty;
    }

    let mut delivered = false;
    while let Some(message) = read.next().await {
        match message {
            Ok(Message::Text(text)) => {
                trace!(len = text.len(), "WebSocket message");
                match parse_message(&text) {
                    HeadMessage::Head(height) => {
                        if events.send(ProviderEvent::NewBlock(height)).await.is_err() {
                            return StreamEnd::QueueClosed;
                        }
                        delivered = true;
                    }
                    HeadMessage::Subscribed(id) => debug!(subscription = %id, "newHeads subscribed"),
                    HeadMessage::Error(reason) => return StreamEnd::Rejected(reason),
                    HeadMessage::Other => {}
                }
            }
            Ok(Message::Close(frame)) => {
                info!(frame = ?frame, "WebSocket closed by server");
                break;
            }
            Ok(_) => {}
            Err(e) => {
                warn!(error = %e, "WebSocket read error");
                break;
            }
        }
    }

    if delivered {
        StreamEnd::Delivered
    } else {
        StreamEnd::Empty
    }
}

fn subscribe_request() -> String {
    json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "eth_subscribe",
        "params": ["newHeads"],
    })
    .to_string()
}

/// A text frame received on the `newHeads` socket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeadMessage {
    /// `eth_subscription` notification carrying a block number.
    Head(u64),
    /// Acknowledgement of `eth_subscribe` with the subscription id.
    Subscribed(String),
    /// JSON-RPC error reply.
    Error(String),
    Other,
}

pub fn parse_message(text: &str) -> HeadMessage {
    let Ok(message) = serde_json::from_str::<Value>(text) else {
        return HeadMessage::Other;
    };

    if let Some(error) = message.get("error") {
        let code = error.get("code").and_then(Value::as_i64).unwrap_or_default();
        let reason = error
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("unknown error");
        return HeadMessage::Error(format!("{}: {}", code, reason));
    }

    if message.get("method").and_then(Value::as_str) == Some("eth_subscription") {
        return message
            .get("params")
            .and_then(|p| p.get("result"))
            .and_then(|r| r.get("number"))
            .and_then(|n| parse_quantity(n).ok())
            .map_or(HeadMessage::Other, HeadMessage::Head);
    }

    match message.get("result").and_then(Value::as_str) {
        Some(id) if message.get("id").is_some() => HeadMessage::Subscribed(id.to_string()),
        _ => HeadMessage::Other,
    }
}
