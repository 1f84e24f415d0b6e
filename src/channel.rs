//! Push-channel collaborator.
//!
//! The client consumes an abstract ordered message channel; the production
//! implementation is a WebSocket connection to `/ws/<resource>` on the
//! backend. Tests inject scripted fakes through the same traits.

use std::future::Future;

use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::warn;

use crate::error::LiveListError;

// ---------------------------------------------------------------------------
// Channel abstraction
// ---------------------------------------------------------------------------

/// One event from the push channel.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelEvent {
    /// A text message, in receive order.
    Message(String),
    /// The channel is gone — closed cleanly or torn down by an error. The
    /// client treats both the same way: reconnect after a fixed delay.
    Closed,
}

/// An open, ordered, at-most-once message channel.
pub trait ListChannel: Send + 'static {
    /// Next event. After `Closed` has been returned the channel yields
    /// nothing further.
    fn next_event(&mut self) -> impl Future<Output = ChannelEvent> + Send;

    /// Explicit close; safe to call in any state.
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Externally supplied channel opener, invoked once per (re)connection
/// attempt with the logical resource path (`/ws/documents`).
pub trait ChannelFactory: Send + Sync + 'static {
    type Channel: ListChannel;

    fn connect(
        &self,
        path: &str,
    ) -> impl Future<Output = Result<Self::Channel, LiveListError>> + Send;
}

// ---------------------------------------------------------------------------
// WebSocket implementation
// ---------------------------------------------------------------------------

/// Factory producing WebSocket channels against a backend base URL.
pub struct WsChannelFactory {
    base_url: String,
}

impl WsChannelFactory {
    /// Accepts `http(s)://` (rewritten to `ws(s)://`), `ws(s)://`, or a bare
    /// `host:port`.
    pub fn new(base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        WsChannelFactory { base_url }
    }

    /// Full WebSocket URL for a resource path.
    pub fn url_for(&self, path: &str) -> String {
        format!("{}{}", ws_base(&self.base_url), path)
    }
}

fn ws_base(base_url: &str) -> String {
    if let Some(rest) = base_url.strip_prefix("https://") {
        format!("wss://{rest}")
    } else if let Some(rest) = base_url.strip_prefix("http://") {
        format!("ws://{rest}")
    } else if base_url.starts_with("ws://") || base_url.starts_with("wss://") {
        base_url.to_string()
    } else {
        format!("ws://{base_url}")
    }
}

impl ChannelFactory for WsChannelFactory {
    type Channel = WsChannel;

    async fn connect(&self, path: &str) -> Result<WsChannel, LiveListError> {
        let url = self.url_for(path);
        let (stream, _response) =
            connect_async(&url).await.map_err(|e| LiveListError::Connect {
                path: url.clone(),
                detail: e.to_string(),
            })?;
        Ok(WsChannel { stream })
    }
}

/// One open WebSocket connection.
pub struct WsChannel {
    stream: WebSocketStream<MaybeTlsStream<tokio::net::TcpStream>>,
}

impl ListChannel for WsChannel {
    async fn next_event(&mut self) -> ChannelEvent {
        loop {
            match self.stream.next().await {
                Some(Ok(WsMessage::Text(text))) => return ChannelEvent::Message(text),
                Some(Ok(WsMessage::Ping(payload))) => {
                    // tungstenite queues the pong itself, but only flushes on
                    // the next send; answer explicitly since we never send.
                    let _ = self.stream.send(WsMessage::Pong(payload)).await;
                }
                Some(Ok(WsMessage::Pong(_)))
                | Some(Ok(WsMessage::Binary(_)))
                | Some(Ok(WsMessage::Frame(_))) => continue,
                Some(Ok(WsMessage::Close(_))) | None => return ChannelEvent::Closed,
                Some(Err(e)) => {
                    warn!(error = %e, "websocket error, treating as closed");
                    return ChannelEvent::Closed;
                }
            }
        }
    }

    async fn close(&mut self) {
        let _ = self.stream.close(None).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_https_base_becomes_wss() {
        let factory = WsChannelFactory::new("https://console.internal");
        assert_eq!(factory.url_for("/ws/models"), "wss://console.internal/ws/models");
    }

    #[test]
    fn test_http_base_becomes_ws() {
        let factory = WsChannelFactory::new("http://localhost:8080");
        assert_eq!(factory.url_for("/ws/projects"), "ws://localhost:8080/ws/projects");
    }

    #[test]
    fn test_ws_base_kept() {
        let factory = WsChannelFactory::new("wss://console.internal");
        assert_eq!(factory.url_for("/ws/documents"), "wss://console.internal/ws/documents");
    }

    #[test]
    fn test_bare_host_defaults_to_ws() {
        let factory = WsChannelFactory::new("localhost:8080");
        assert_eq!(factory.url_for("/ws/documents"), "ws://localhost:8080/ws/documents");
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let factory = WsChannelFactory::new("http://localhost:8080/");
        assert_eq!(factory.url_for("/ws/models"), "ws://localhost:8080/ws/models");
    }
}
