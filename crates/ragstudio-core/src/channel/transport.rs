//! Connection seam of the push channel.
//!
//! The session only talks to a [`Connector`] and the [`Transport`] it
//! returns. [`WsConnector`] is the real implementation on top of
//! tokio-tungstenite; tests substitute scripted ones.

use std::future::Future;

use futures::{SinkExt, StreamExt};
use reqwest::Url;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream};
use tracing::{debug, trace};

use super::{ChannelError, CloseReason};

/// Query parameter carrying the token; the handshake cannot take headers.
pub const TOKEN_QUERY_PARAM: &str = "token";

/// Endpoint streaming status and progress of one pipeline
pub fn pipeline_endpoint(pipeline_id: &str) -> String {
    format!("ws/pipeline/{}", pipeline_id)
}

/// Endpoint streaming progress and results of one benchmark run
pub fn benchmark_endpoint(benchmark_id: &str) -> String {
    format!("ws/benchmark/{}", benchmark_id)
}

/// Build the channel address: the API base with its scheme upgraded
/// (`http` to `ws`, `https` to `wss`), the endpoint path appended and the
/// token as a query parameter.
pub fn channel_url(base: &Url, endpoint: &str, token: &str) -> Result<Url, ChannelError> {
    let endpoint = endpoint.trim_start_matches('/');
    let mut url = base
        .join(endpoint)
        .map_err(|e| ChannelError::InvalidUrl(format!("{}: {}", endpoint, e)))?;

    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => {
            return Err(ChannelError::InvalidUrl(format!(
                "unsupported scheme {}",
                other
            )))
        }
    };
    url.set_scheme(scheme)
        .map_err(|_| ChannelError::InvalidUrl(format!("cannot use scheme {}", scheme)))?;
    url.query_pairs_mut().append_pair(TOKEN_QUERY_PARAM, token);
    Ok(url)
}

/// Inbound frame relevant to the session.
#[derive(Debug, Clone, PartialEq)]
pub enum Inbound {
    Text(String),
    Closed(CloseReason),
}

/// One established connection.
pub trait Transport: Send {
    fn send_text(&mut self, text: String) -> impl Future<Output = Result<(), ChannelError>> + Send;

    /// Next inbound frame; `None` once the stream has ended
    fn next_frame(&mut self) -> impl Future<Output = Option<Result<Inbound, ChannelError>>> + Send;

    /// Close politely; errors are irrelevant at this point
    fn close(&mut self) -> impl Future<Output = ()> + Send;
}

/// Opens transports. Called once per connection attempt.
pub trait Connector: Send + Sync + 'static {
    type Transport: Transport + 'static;

    fn connect(&self, url: &Url) -> impl Future<Output = Result<Self::Transport, ChannelError>> + Send;
}

/// WebSocket connector (rustls with native roots for `wss`).
#[derive(Debug, Clone, Copy, Default)]
pub struct WsConnector;

impl Connector for WsConnector {
    type Transport = WsTransport;

    async fn connect(&self, url: &Url) -> Result<WsTransport, ChannelError> {
        let (stream, response) = tokio_tungstenite::connect_async(url.as_str())
            .await
            .map_err(|e| ChannelError::Connect(e.to_string()))?;
        debug!(status = %response.status(), "WebSocket handshake complete");
        Ok(WsTransport { stream })
    }
}

pub struct WsTransport {
    stream: WebSocketStream<MaybeTlsStream<TcpStream>>,
}

impl Transport for WsTransport {
    async fn send_text(&mut self, text: String) -> Result<(), ChannelError> {
        self.stream
            .send(Message::Text(text.into()))
            .await
            .map_err(|e| ChannelError::Transport(e.to_string()))
    }

    async fn next_frame(&mut self) -> Option<Result<Inbound, ChannelError>> {
        loop {
            match self.stream.next().await? {
                Ok(Message::Text(text)) => return Some(Ok(Inbound::Text(text.to_string()))),
                Ok(Message::Close(frame)) => {
                    let reason = frame
                        .map(|f| CloseReason::new(u16::from(f.code), f.reason.to_string()))
                        .unwrap_or_default();
                    return Some(Ok(Inbound::Closed(reason)));
                }
                Ok(Message::Binary(data)) => {
                    debug!(bytes = data.len(), "Ignoring binary frame");
                }
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) | Ok(Message::Frame(_)) => {
                    trace!("Control frame");
                }
                Err(e) => return Some(Err(ChannelError::Transport(e.to_string()))),
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

    fn base(url: &str) -> Url {
        Url::parse(url).unwrap()
    }

    #[test]
    fn test_http_becomes_ws_with_token() {
        let url = channel_url(
            &base("http://localhost:8000/api/v1/"),
            &pipeline_endpoint("p1"),
            "abc",
        )
        .unwrap();
        assert_eq!(url.as_str(), "ws://localhost:8000/api/v1/ws/pipeline/p1?token=abc");
    }

    #[test]
    fn test_https_becomes_wss() {
        let url = channel_url(
            &base("https://rag.example.com/api/v1/"),
            &benchmark_endpoint("b7"),
            "t",
        )
        .unwrap();
        assert_eq!(url.scheme(), "wss");
        assert_eq!(url.path(), "/api/v1/ws/benchmark/b7");
    }

    #[test]
    fn test_token_is_query_encoded() {
        let url = channel_url(&base("http://h/api/v1/"), "/ws/pipeline/x", "a b&c").unwrap();
        let token = url
            .query_pairs()
            .find(|(k, _)| k == TOKEN_QUERY_PARAM)
            .map(|(_, v)| v.into_owned());
        assert_eq!(token.as_deref(), Some("a b&c"));
    }

    #[test]
    fn test_rejects_unknown_scheme() {
        let err = channel_url(&base("ftp://h/api/v1/"), "ws/pipeline/x", "t").unwrap_err();
        assert!(matches!(err, ChannelError::InvalidUrl(_)));
    }
}
