// In-process session relay and raw peer helpers for integration tests.
//
// The relay is the thin broadcast server the engine assumes: it assigns
// identities, acks joins, fans `current`/`move`/`leave` out to every
// connected client, and keeps no other state.

use presence_client::interface_adapters::protocol::{
    ClientMessage, RosterEntryDto, ServerMessage,
};

use axum::{
    Router,
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::IntoResponse,
    routing::get,
};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{Mutex, broadcast};
use tokio::time::timeout;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

pub type PeerStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

const RELAY_BROADCAST_CAPACITY: usize = 256;
const RECV_TIMEOUT: Duration = Duration::from_secs(5);

struct RelayState {
    // Fan-out of relay messages to every connected client. Moves carry their
    // sender's id so they are not echoed back to it.
    broadcast_tx: broadcast::Sender<(Option<String>, ServerMessage)>,
    roster: Mutex<Vec<RosterEntryDto>>,
}

/// Boots a relay on an ephemeral port and returns its websocket url.
pub async fn spawn_relay() -> String {
    let (broadcast_tx, _) = broadcast::channel(RELAY_BROADCAST_CAPACITY);
    let state = Arc::new(RelayState {
        broadcast_tx,
        roster: Mutex::new(Vec::new()),
    });

    let app = Router::new().route("/ws", get(ws_handler)).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind ephemeral test port");
    let addr = listener.local_addr().expect("get local addr");

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("relay failed");
    });

    format!("ws://{addr}/ws")
}

async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<RelayState>>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, state))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<RelayState>) {
    // Subscribe before any await so no broadcast is missed.
    let mut relay_rx = state.broadcast_tx.subscribe();
    let mut joined_id: Option<String> = None;

    loop {
        tokio::select! {
            incoming = socket.recv() => {
                match incoming {
                    Some(Ok(Message::Text(text))) => {
                        match serde_json::from_str::<ClientMessage>(&text) {
                            Ok(ClientMessage::Join(payload)) => {
                                let id = uuid::Uuid::new_v4().to_string();
                                joined_id = Some(id.clone());

                                // Identity and ack go to the joining socket
                                // only; the roster is announced to everyone.
                                let identity = ServerMessage::HostPlayerId(id.clone());
                                if send_direct(&mut socket, &identity).await.is_err() {
                                    break;
                                }
                                let ack = ServerMessage::Join(Some(serde_json::json!("ok")));
                                if send_direct(&mut socket, &ack).await.is_err() {
                                    break;
                                }

                                let roster = {
                                    let mut roster = state.roster.lock().await;
                                    roster.push(RosterEntryDto {
                                        id,
                                        name: payload.name,
                                        region: "test".to_string(),
                                        x: payload.x,
                                        y: payload.y,
                                    });
                                    roster.clone()
                                };
                                let _ = state
                                    .broadcast_tx
                                    .send((None, ServerMessage::Current(roster)));
                            }
                            Ok(ClientMessage::Move(dto)) => {
                                let _ = state
                                    .broadcast_tx
                                    .send((joined_id.clone(), ServerMessage::Move(dto)));
                            }
                            Err(_) => {}
                        }
                    }
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Ok(_)) => {}
                    Some(Err(_)) => break,
                }
            }

            relayed = relay_rx.recv() => {
                match relayed {
                    Ok((origin, msg)) => {
                        if origin.is_some() && origin == joined_id {
                            continue;
                        }
                        if send_direct(&mut socket, &msg).await.is_err() {
                            break;
                        }
                    }
                    Err(broadcast::error::RecvError::Lagged(_)) => {}
                    Err(broadcast::error::RecvError::Closed) => break,
                }
            }
        }
    }

    if let Some(id) = joined_id {
        let mut roster = state.roster.lock().await;
        roster.retain(|entry| entry.id != id);
        drop(roster);
        let _ = state.broadcast_tx.send((None, ServerMessage::Leave(id)));
    }
}

async fn send_direct(socket: &mut WebSocket, msg: &ServerMessage) -> Result<(), axum::Error> {
    let text = serde_json::to_string(msg).expect("encode relay message");
    socket.send(Message::Text(text.into())).await
}

/// Connects a raw peer client, bypassing the engine.
pub async fn connect_peer(url: &str) -> PeerStream {
    let (ws, _response) = connect_async(url).await.expect("peer connect");
    ws
}

pub async fn peer_send(ws: &mut PeerStream, msg: &ClientMessage) {
    let text = serde_json::to_string(msg).expect("encode client message");
    ws.send(tokio_tungstenite::tungstenite::Message::Text(text.into()))
        .await
        .expect("peer send");
}

/// Reads the next decoded relay message, skipping control frames.
pub async fn peer_recv(ws: &mut PeerStream) -> ServerMessage {
    loop {
        let frame = timeout(RECV_TIMEOUT, ws.next())
            .await
            .expect("timed out waiting for a relay message")
            .expect("relay stream ended")
            .expect("peer recv error");
        match frame {
            tokio_tungstenite::tungstenite::Message::Text(text) => {
                return serde_json::from_str(&text).expect("decode relay message");
            }
            tokio_tungstenite::tungstenite::Message::Ping(_)
            | tokio_tungstenite::tungstenite::Message::Pong(_) => {}
            other => panic!("unexpected frame: {other:?}"),
        }
    }
}

/// Joins as a raw peer and returns the identity the relay assigned.
pub async fn peer_join(ws: &mut PeerStream, name: &str) -> String {
    use presence_client::interface_adapters::protocol::JoinPayload;

    peer_send(
        ws,
        &ClientMessage::Join(JoinPayload {
            name: name.to_string(),
            x: 0.0,
            y: 0.0,
        }),
    )
    .await;

    loop {
        if let ServerMessage::HostPlayerId(id) = peer_recv(ws).await {
            return id;
        }
    }
}
