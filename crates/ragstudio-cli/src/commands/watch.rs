//! Follow live progress over the push channel until interrupted.

use anyhow::Result;
use ragstudio_core::channel::{
    benchmark_endpoint, benchmark_topic, pipeline_endpoint, pipeline_topic, ClientMessage,
    PushEvent,
};
use ragstudio_core::{ApiClient, ChannelEvent, ChannelSession, ChannelSettings};
use serde_json::Value;
use tokio::sync::mpsc;
use tracing::warn;

pub enum Target {
    Pipeline(String),
    Benchmark(String),
}

impl Target {
    fn endpoint(&self) -> String {
        match self {
            Target::Pipeline(id) => pipeline_endpoint(id),
            Target::Benchmark(id) => benchmark_endpoint(id),
        }
    }

    fn topic(&self) -> String {
        match self {
            Target::Pipeline(id) => pipeline_topic(id),
            Target::Benchmark(id) => benchmark_topic(id),
        }
    }
}

pub async fn run(
    api: &ApiClient,
    settings: ChannelSettings,
    target: Target,
    raw: bool,
) -> Result<()> {
    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut session = ChannelSession::websocket(api, target.endpoint(), settings, events_tx);
    session.connect()?;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let outcome = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            event = events.recv() => match event {
                Some(ChannelEvent::Opened) => {
                    let subscribe = ClientMessage::Subscribe { topic: target.topic() };
                    if let Err(e) = session.send_message(&subscribe) {
                        warn!(error = %e, "Failed to subscribe");
                    }
                }
                Some(ChannelEvent::Message(value)) => {
                    if raw {
                        println!("{}", value);
                    } else {
                        print_event(&value);
                    }
                }
                Some(ChannelEvent::StateChanged(state)) => eprintln!("[{}]", state),
                Some(ChannelEvent::Closed(reason)) => eprintln!("[closed: {}]", reason),
                Some(ChannelEvent::Error(message)) => eprintln!("[error: {}]", message),
                Some(ChannelEvent::GaveUp { attempts }) => {
                    break Err(anyhow::anyhow!("Gave up after {} reconnect attempts", attempts));
                }
                None => break Ok(()),
            },
        }
    };

    session.disconnect().await;
    outcome
}

fn print_event(value: &Value) {
    match PushEvent::from_value(value) {
        Some(PushEvent::Connection { status, .. }) => println!("connection {}", status),
        Some(PushEvent::PipelineStatus {
            pipeline_id,
            status,
            message,
            ..
        }) => match message {
            Some(message) => println!("{} {}: {}", pipeline_id, status, message),
            None => println!("{} {}", pipeline_id, status),
        },
        Some(PushEvent::PipelineProgress {
            pipeline_id,
            progress,
            stage,
            ..
        }) => println!(
            "{} {:>5.1}% {}",
            pipeline_id,
            progress,
            stage.unwrap_or_default()
        ),
        Some(PushEvent::BenchmarkProgress {
            current,
            total,
            progress,
            pipeline_id,
            ..
        }) => println!(
            "{}/{} ({:.1}%) {}",
            current,
            total,
            progress,
            pipeline_id.unwrap_or_default()
        ),
        Some(PushEvent::BenchmarkResult {
            pipeline_id,
            metrics,
            ..
        }) => println!("result for {} ({} metrics)", pipeline_id, metrics.len()),
        Some(PushEvent::Subscribed { topic }) => eprintln!("[subscribed to {}]", topic),
        Some(PushEvent::Unsubscribed { topic }) => eprintln!("[unsubscribed from {}]", topic),
        Some(PushEvent::Error { message }) => eprintln!("server error: {}", message),
        Some(PushEvent::Pong { .. }) => {}
        Some(PushEvent::Unknown) | None => println!("{}", value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_routes() {
        let target = Target::Benchmark("b7".into());
        assert_eq!(target.endpoint(), "ws/benchmark/b7");
        assert_eq!(target.topic(), "benchmark_b7");

        let target = Target::Pipeline("p1".into());
        assert_eq!(target.endpoint(), "ws/pipeline/p1");
        assert_eq!(target.topic(), "pipeline_p1");
    }
}
