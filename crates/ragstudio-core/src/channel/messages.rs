//! Push channel payloads.
//!
//! Dispatch hands consumers raw JSON so that new message types never break
//! a session; [`PushEvent::from_value`] gives the typed view on demand.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Server-to-client messages, tagged by `type`.
///
/// Timestamps are naive UTC ISO strings as the backend writes them.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// Greeting sent right after the handshake
    Connection {
        status: String,
        #[serde(default)]
        pipeline_id: Option<String>,
        #[serde(default)]
        benchmark_id: Option<String>,
        #[serde(default)]
        timestamp: Option<String>,
    },
    PipelineStatus {
        pipeline_id: String,
        status: String,
        #[serde(default)]
        message: Option<String>,
        #[serde(default)]
        timestamp: Option<String>,
    },
    PipelineProgress {
        pipeline_id: String,
        progress: f64,
        #[serde(default)]
        stage: Option<String>,
        #[serde(default)]
        timestamp: Option<String>,
    },
    BenchmarkProgress {
        benchmark_id: String,
        current: u64,
        total: u64,
        /// Percent, 0 to 100
        progress: f64,
        #[serde(default)]
        pipeline_id: Option<String>,
        #[serde(default)]
        timestamp: Option<String>,
    },
    BenchmarkResult {
        benchmark_id: String,
        pipeline_id: String,
        #[serde(default)]
        metrics: HashMap<String, Value>,
        #[serde(default)]
        timestamp: Option<String>,
    },
    Pong {
        #[serde(default)]
        timestamp: Option<String>,
    },
    Subscribed {
        topic: String,
    },
    Unsubscribed {
        topic: String,
    },
    Error {
        message: String,
    },
    /// Any type this client does not know yet
    #[serde(other)]
    Unknown,
}

impl PushEvent {
    /// Typed view of a dispatched message. `None` if a known type is malformed.
    pub fn from_value(value: &Value) -> Option<Self> {
        Self::deserialize(value).ok()
    }
}

/// Client-to-server commands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    Ping,
    Subscribe { topic: String },
    Unsubscribe { topic: String },
}

impl ClientMessage {
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

/// Topic name the backend uses for a pipeline's broadcasts
pub fn pipeline_topic(pipeline_id: &str) -> String {
    format!("pipeline_{}", pipeline_id)
}

pub fn benchmark_topic(benchmark_id: &str) -> String {
    format!("benchmark_{}", benchmark_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_benchmark_progress() {
        let event = PushEvent::from_value(&json!({
            "type": "benchmark_progress",
            "benchmark_id": "b1",
            "current": 3,
            "total": 10,
            "progress": 30.0,
            "pipeline_id": null,
            "timestamp": "2024-05-01T10:00:00.123456"
        }))
        .unwrap();
        match event {
            PushEvent::BenchmarkProgress { current, total, pipeline_id, .. } => {
                assert_eq!((current, total), (3, 10));
                assert!(pipeline_id.is_none());
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_unknown_type_is_not_an_error() {
        let event = PushEvent::from_value(&json!({"type": "index_rebuilt", "index": "docs"}));
        assert_eq!(event, Some(PushEvent::Unknown));
    }

    #[test]
    fn test_malformed_known_type() {
        assert_eq!(PushEvent::from_value(&json!({"type": "subscribed"})), None);
    }

    #[test]
    fn test_client_messages() {
        assert_eq!(ClientMessage::Ping.to_value(), json!({"type": "ping"}));
        assert_eq!(
            ClientMessage::Subscribe {
                topic: benchmark_topic("b1")
            }
            .to_value(),
            json!({"type": "subscribe", "topic": "benchmark_b1"})
        );
    }
}
