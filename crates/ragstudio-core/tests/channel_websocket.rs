//! `ChannelSession` over a real WebSocket, served by a local
//! tokio-tungstenite listener.

use std::time::Duration;

use futures::{SinkExt, StreamExt};
use ragstudio_core::auth::{Credential, MemoryCredentialStore};
use ragstudio_core::channel::{
    pipeline_endpoint, pipeline_topic, ChannelEvent, ChannelSession, ChannelState, ClientMessage,
    PushEvent, WsConnector,
};
use ragstudio_core::config::ChannelSettings;
use reqwest::Url;
use serde_json::{json, Value};
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::Message;

const WAIT: Duration = Duration::from_secs(5);

async fn next_message(events: &mut mpsc::UnboundedReceiver<ChannelEvent>) -> Value {
    loop {
        let event = timeout(WAIT, events.recv())
            .await
            .expect("timed out waiting for event")
            .expect("event stream ended");
        if let ChannelEvent::Message(value) = event {
            return value;
        }
    }
}

#[tokio::test]
async fn test_session_round_trip_over_websocket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (uri_tx, uri_rx) = oneshot::channel::<String>();
    let (received_tx, received_rx) = oneshot::channel::<Value>();

    let server = tokio::spawn(async move {
        let (stream, _) = listener.accept().await.unwrap();
        let record_uri = move |req: &Request, resp: Response| -> Result<Response, ErrorResponse> {
            let _ = uri_tx.send(req.uri().to_string());
            Ok(resp)
        };
        let mut ws = tokio_tungstenite::accept_hdr_async(stream, record_uri)
            .await
            .unwrap();

        let greeting = json!({"type": "connection", "status": "connected", "pipeline_id": "p1"});
        ws.send(Message::Text(greeting.to_string().into())).await.unwrap();

        // First client frame is the subscription
        let frame = loop {
            match ws.next().await {
                Some(Ok(Message::Text(text))) => break text.to_string(),
                Some(Ok(_)) => continue,
                other => panic!("client went away: {:?}", other),
            }
        };
        let command: Value = serde_json::from_str(&frame).unwrap();
        let topic = command["topic"].clone();
        let _ = received_tx.send(command);

        let reply = json!({"type": "subscribed", "topic": topic});
        ws.send(Message::Text(reply.to_string().into())).await.unwrap();

        // Run until the client closes
        while let Some(Ok(message)) = ws.next().await {
            if message.is_close() {
                break;
            }
        }
    });

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut session = ChannelSession::new(
        pipeline_endpoint("p1"),
        Url::parse(&format!("http://{}/api/v1/", addr)).unwrap(),
        ChannelSettings::default(),
        MemoryCredentialStore::with_credential(Credential::new("tok-42")).shared(),
        WsConnector,
        events_tx,
    );
    session.connect().unwrap();

    let greeting = next_message(&mut events).await;
    assert!(matches!(
        PushEvent::from_value(&greeting),
        Some(PushEvent::Connection { ref status, .. }) if status == "connected"
    ));
    assert_eq!(session.state(), ChannelState::Open);

    let uri = timeout(WAIT, uri_rx).await.unwrap().unwrap();
    assert_eq!(uri, "/api/v1/ws/pipeline/p1?token=tok-42");

    session
        .send_message(&ClientMessage::Subscribe {
            topic: pipeline_topic("p1"),
        })
        .unwrap();
    let received = timeout(WAIT, received_rx).await.unwrap().unwrap();
    assert_eq!(received, json!({"type": "subscribe", "topic": "pipeline_p1"}));

    let reply = next_message(&mut events).await;
    assert_eq!(
        PushEvent::from_value(&reply),
        Some(PushEvent::Subscribed {
            topic: "pipeline_p1".into()
        })
    );

    session.disconnect().await;
    assert_eq!(session.state(), ChannelState::Disconnected);
    timeout(WAIT, server).await.unwrap().unwrap();
}

#[tokio::test]
async fn test_refused_connection_retries_then_gives_up() {
    // Bind and drop to get a port nobody listens on
    let addr = {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        listener.local_addr().unwrap()
    };

    let (events_tx, mut events) = mpsc::unbounded_channel();
    let mut session = ChannelSession::new(
        pipeline_endpoint("p1"),
        Url::parse(&format!("http://{}/api/v1/", addr)).unwrap(),
        ChannelSettings {
            max_attempts: 2,
            base_delay: Duration::from_millis(50),
            heartbeat_interval: None,
        },
        MemoryCredentialStore::with_credential(Credential::new("t")).shared(),
        WsConnector,
        events_tx,
    );
    session.connect().unwrap();

    let mut saw_error = false;
    loop {
        let event = timeout(WAIT, events.recv()).await.unwrap().unwrap();
        match event {
            ChannelEvent::Error(_) => saw_error = true,
            ChannelEvent::GaveUp { attempts } => {
                assert_eq!(attempts, 2);
                break;
            }
            _ => {}
        }
    }
    assert!(saw_error);
    assert_eq!(session.state(), ChannelState::ClosedGaveUp);
}
