// Protocol channel: owns the websocket connection to the session relay and
// is the only component that sends or receives wire messages.

use crate::domain::state::RosterEntry;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage};
use crate::use_cases::types::ChannelEvent;

use futures::SinkExt;
use futures_util::StreamExt;
use futures_util::stream::{SplitSink, SplitStream};
use tokio::net::TcpStream;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, warn};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug)]
pub enum ChannelError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    Connect(tokio_tungstenite::tungstenite::Error),
    Ws(tokio_tungstenite::tungstenite::Error),
    Serialization(serde_json::Error),
}

impl From<serde_json::Error> for ChannelError {
    fn from(e: serde_json::Error) -> Self {
        ChannelError::Serialization(e)
    }
}

/// The single long-lived relay connection.
///
/// Incoming frames are decoded by a background reader task into the typed
/// `ChannelEvent` stream handed to `connect`; the write half stays here so the
/// session loop is the only sender. Connection loss surfaces as a final
/// `Disconnected` event; reconnecting is the owning controller's policy, not
/// ours.
pub struct ProtocolChannel {
    sink: SplitSink<WsStream, Message>,
    reader: JoinHandle<()>,
}

impl ProtocolChannel {
    /// Connects to the relay and starts decoding incoming messages into
    /// `event_tx`.
    pub async fn connect(
        url: &str,
        event_tx: mpsc::Sender<ChannelEvent>,
    ) -> Result<ProtocolChannel, ChannelError> {
        let (ws, _response) = connect_async(url).await.map_err(ChannelError::Connect)?;
        let (sink, stream) = ws.split();

        let reader = tokio::spawn(read_task(stream, event_tx));

        Ok(ProtocolChannel { sink, reader })
    }

    /// Serializes and transmits one outgoing message.
    pub async fn send(&mut self, msg: &ClientMessage) -> Result<(), ChannelError> {
        let txt = serde_json::to_string(msg)?;
        self.sink
            .send(Message::Text(txt.into()))
            .await
            .map_err(ChannelError::Ws)
    }

    /// Closes the connection and stops the reader.
    ///
    /// Must run on every session exit path so the socket is never leaked.
    pub async fn close(mut self) {
        if let Err(e) = self.sink.send(Message::Close(None)).await {
            debug!(error = %e, "close frame send failed");
        }
        let _ = self.sink.close().await;
        self.reader.abort();
    }
}

async fn read_task(mut stream: SplitStream<WsStream>, event_tx: mpsc::Sender<ChannelEvent>) {
    while let Some(incoming) = stream.next().await {
        match incoming {
            Ok(Message::Text(text)) => {
                let event = match decode_event(&text) {
                    Ok(event) => event,
                    Err(e) => {
                        // Drop the frame, report the condition, keep reading.
                        warn!(bytes = text.len(), error = %e, "failed to decode relay message");
                        ChannelEvent::DecodeError {
                            detail: e.to_string(),
                        }
                    }
                };
                if event_tx.send(event).await.is_err() {
                    // Session loop is gone; nothing left to deliver to.
                    return;
                }
            }
            Ok(Message::Binary(_)) => {
                warn!("binary frame ignored; relay speaks JSON text");
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => {}
            Ok(Message::Close(_)) => break,
            Ok(Message::Frame(_)) => {}
            Err(e) => {
                warn!(error = %e, "websocket recv error");
                break;
            }
        }
    }

    let _ = event_tx.send(ChannelEvent::Disconnected).await;
}

/// Maps a decoded wire message onto the typed event surface.
fn decode_event(text: &str) -> Result<ChannelEvent, serde_json::Error> {
    let msg: ServerMessage = serde_json::from_str(text)?;
    Ok(match msg {
        ServerMessage::Join(_) => ChannelEvent::JoinAck,
        ServerMessage::HostPlayerId(id) => ChannelEvent::IdentityAssigned { id },
        ServerMessage::Current(entries) => ChannelEvent::Roster {
            entries: entries.into_iter().map(RosterEntry::from).collect(),
        },
        ServerMessage::Move(dto) => ChannelEvent::PeerMove {
            id: dto.id,
            intent: dto.intent.into(),
            position: dto.position.into(),
        },
        ServerMessage::Leave(id) => ChannelEvent::PeerLeave { id },
    })
}
