//! Resilient push channel.
//!
//! A [`ChannelSession`] keeps one WebSocket to a backend push endpoint
//! alive: it reconnects with linear backoff after unexpected closures, gives
//! up after a fixed number of attempts, and stops for good on an explicit
//! disconnect. Events reach the consumer through a [`ChannelHandler`]; an
//! `mpsc::UnboundedSender<ChannelEvent>` works as one.

pub mod messages;
pub mod policy;
pub mod session;
pub mod transport;
mod types;

pub use messages::{benchmark_topic, pipeline_topic, ClientMessage, PushEvent};
pub use policy::ReconnectPolicy;
pub use session::ChannelSession;
pub use transport::{
    benchmark_endpoint, channel_url, pipeline_endpoint, Connector, Inbound, Transport, WsConnector,
};
pub use types::{ChannelError, ChannelEvent, ChannelHandler, ChannelState, CloseReason};
