//! End-to-end room workflows over real WebSocket and HTTP connections.

#![allow(clippy::panic)]

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tokio::net::{TcpListener, TcpStream};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use planning_poker::app_state::AppState;
use planning_poker::config::ServerConfig;
use planning_poker::server;

type Client = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

async fn start_server(config: ServerConfig) -> SocketAddr {
    let Ok(listener) = TcpListener::bind("127.0.0.1:0").await else {
        panic!("bind failed");
    };
    let Ok(addr) = listener.local_addr() else {
        panic!("no local addr");
    };
    let state = AppState::new(config);
    tokio::spawn(server::run(listener, state, std::future::pending()));
    addr
}

async fn start_default() -> SocketAddr {
    start_server(ServerConfig::default()).await
}

async fn connect(addr: SocketAddr, room: &str) -> Client {
    let Ok((client, _)) = connect_async(format!("ws://{addr}/ws/{room}")).await else {
        panic!("ws connect failed");
    };
    client
}

async fn send(client: &mut Client, value: Value) {
    if client.send(Message::text(value.to_string())).await.is_err() {
        panic!("ws send failed");
    }
}

/// Next frame that is not a ping/pong.
async fn next_frame(client: &mut Client) -> Message {
    loop {
        let Ok(Some(Ok(msg))) = tokio::time::timeout(RECV_TIMEOUT, client.next()).await else {
            panic!("no frame received");
        };
        if !matches!(msg, Message::Ping(_) | Message::Pong(_)) {
            return msg;
        }
    }
}

async fn next_json(client: &mut Client) -> Value {
    match next_frame(client).await {
        Message::Text(text) => {
            let Ok(value) = serde_json::from_str(text.as_str()) else {
                panic!("frame is not JSON: {text}");
            };
            value
        }
        other => panic!("expected text frame, got {other:?}"),
    }
}

async fn expect_close(client: &mut Client) -> u16 {
    loop {
        match next_frame(client).await {
            Message::Close(Some(frame)) => return u16::from(frame.code),
            Message::Close(None) => panic!("close frame without code"),
            _ => {}
        }
    }
}

/// Connects, joins as `name`, and consumes the three join frames.
async fn join(addr: SocketAddr, room: &str, name: &str) -> Client {
    let mut client = connect(addr, room).await;
    send(&mut client, json!({ "name": name })).await;
    for expected in ["success", "result", "settings"] {
        let frame = next_json(&mut client).await;
        assert_eq!(frame.get("type"), Some(&json!(expected)), "{frame}");
    }
    client
}

#[tokio::test]
async fn join_sends_ack_then_state() {
    let addr = start_default().await;
    let mut alice = connect(addr, "sprint-1").await;
    send(&mut alice, json!({ "name": "alice" })).await;

    assert_eq!(
        next_json(&mut alice).await,
        json!({ "type": "success", "success": "Joined room sprint-1 as alice" })
    );
    assert_eq!(
        next_json(&mut alice).await,
        json!({ "type": "result", "roomID": "sprint-1", "votes": { "alice": "" } })
    );
    assert_eq!(
        next_json(&mut alice).await,
        json!({ "type": "settings", "reveal": false, "votingCard": "Fibonacci" })
    );
}

#[tokio::test]
async fn second_join_is_broadcast_to_first() {
    let addr = start_default().await;
    let mut alice = join(addr, "r", "alice").await;
    let _bob = join(addr, "r", "bob").await;

    let result = next_json(&mut alice).await;
    assert_eq!(result.pointer("/votes/bob"), Some(&json!("")));
    let settings = next_json(&mut alice).await;
    assert_eq!(settings.get("type"), Some(&json!("settings")));
}

#[tokio::test]
async fn duplicate_name_is_rejected_with_4000() {
    let addr = start_default().await;
    let _alice = join(addr, "r", "alice").await;

    let mut impostor = connect(addr, "r").await;
    send(&mut impostor, json!({ "name": "alice" })).await;

    let error = next_json(&mut impostor).await;
    assert_eq!(
        error.get("error"),
        Some(&json!("Someone already joined that room with the same name."))
    );
    assert_eq!(expect_close(&mut impostor).await, 4000);
}

#[tokio::test]
async fn votes_reach_everyone_in_room() {
    let addr = start_default().await;
    let mut alice = join(addr, "r", "alice").await;
    let mut bob = join(addr, "r", "bob").await;
    // alice also saw bob's join broadcast
    next_json(&mut alice).await;
    next_json(&mut alice).await;

    send(&mut bob, json!({ "voter": "bob", "vote": "8" })).await;

    for client in [&mut alice, &mut bob] {
        let frame = next_json(client).await;
        assert_eq!(frame.get("type"), Some(&json!("result")));
        assert_eq!(frame.pointer("/votes/bob"), Some(&json!("8")));
        assert_eq!(frame.pointer("/votes/alice"), Some(&json!("")));
    }
}

#[tokio::test]
async fn reveal_toggle_reaches_both_clients() {
    let addr = start_default().await;
    let mut alice = join(addr, "r", "alice").await;
    let mut bob = join(addr, "r", "bob").await;
    next_json(&mut alice).await;
    next_json(&mut alice).await;

    send(&mut alice, json!({ "command": "RevealVotes" })).await;

    for client in [&mut alice, &mut bob] {
        assert_eq!(
            next_json(client).await,
            json!({ "type": "settings", "reveal": true, "votingCard": "Fibonacci" })
        );
    }
}

#[tokio::test]
async fn invalid_message_keeps_connection_open() {
    let addr = start_default().await;
    let mut alice = join(addr, "r", "alice").await;

    send(&mut alice, json!({ "hello": "world" })).await;
    let error = next_json(&mut alice).await;
    assert_eq!(error.get("error"), Some(&json!("invalid format")));

    send(&mut alice, json!({ "cardChange": "T-Shirt" })).await;
    assert_eq!(
        next_json(&mut alice).await,
        json!({ "type": "settings", "reveal": false, "votingCard": "T-Shirt" })
    );
}

#[tokio::test]
async fn delete_room_closes_everyone_and_forgets_room() {
    let addr = start_default().await;
    let mut alice = join(addr, "doomed", "alice").await;
    let mut bob = join(addr, "doomed", "bob").await;

    send(&mut bob, json!({ "command": "DeleteRoom" })).await;

    assert_eq!(expect_close(&mut alice).await, 1000);
    assert_eq!(expect_close(&mut bob).await, 1000);

    let Ok(response) = reqwest::get(format!("http://{addr}/api/v1/rooms/doomed")).await else {
        panic!("http request failed");
    };
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn bad_handshake_is_rejected() {
    let addr = start_default().await;
    let mut client = connect(addr, "r").await;
    send(&mut client, json!({ "voter": "alice" })).await;

    let error = next_json(&mut client).await;
    assert_eq!(error.get("type"), Some(&json!("error")));
    assert_eq!(expect_close(&mut client).await, 1000);
}

#[tokio::test]
async fn idle_room_is_swept_and_clients_closed() {
    let addr = start_server(ServerConfig {
        room_ttl: Duration::ZERO,
        sweep_interval: Duration::from_millis(200),
        ..ServerConfig::default()
    })
    .await;
    let mut alice = join(addr, "idle", "alice").await;

    assert_eq!(expect_close(&mut alice).await, 1000);
}

#[tokio::test]
async fn health_and_room_listing() {
    let addr = start_default().await;
    let _alice = join(addr, "listed", "alice").await;

    let Ok(response) = reqwest::get(format!("http://{addr}/health")).await else {
        panic!("http request failed");
    };
    assert!(response.status().is_success());
    let Ok(health) = response.json::<Value>().await else {
        panic!("health body is not JSON");
    };
    assert_eq!(health.get("status"), Some(&json!("healthy")));
    assert_eq!(health.get("rooms"), Some(&json!(1)));

    let Ok(response) = reqwest::get(format!("http://{addr}/api/v1/rooms")).await else {
        panic!("http request failed");
    };
    let Ok(list) = response.json::<Value>().await else {
        panic!("room list is not JSON");
    };
    assert_eq!(list.pointer("/data/0/room_id"), Some(&json!("listed")));
    assert_eq!(list.pointer("/data/0/voter_count"), Some(&json!(1)));
}
