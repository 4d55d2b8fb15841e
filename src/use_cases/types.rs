// Use-case level inputs/outputs for the session loop.

use crate::domain::state::{Intent, RosterEntry};
use crate::domain::vector::Vec2;

/// Decoded, tagged protocol events emitted by the protocol channel.
///
/// This is the single event surface between the transport and the session
/// loop; no other component sees raw wire messages.
#[derive(Debug, Clone)]
pub enum ChannelEvent {
    /// The relay accepted the local join request.
    JoinAck,
    /// The relay assigned the local entity's identity.
    IdentityAssigned { id: String },
    /// Roster snapshot naming current participants (may repeat known ids).
    Roster { entries: Vec<RosterEntry> },
    /// A participant reported a new intent and position.
    PeerMove {
        id: String,
        intent: Intent,
        position: Vec2,
    },
    /// A participant left the session.
    PeerLeave { id: String },
    /// A frame failed to decode and was dropped.
    DecodeError { detail: String },
    /// The connection is gone; no further events will follow.
    Disconnected,
}

/// Commands from the owning controller into the session loop.
#[derive(Debug, Clone)]
pub enum SessionCommand {
    Join { name: String },
    Leave,
}

/// Join lifecycle of the local entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinPhase {
    /// Not joined (initial state, or the channel dropped mid-session).
    Disconnected,
    /// Join sent; waiting for the relay to assign our identity.
    AwaitingIdentity,
    /// Identity known; waiting for the join ack.
    AwaitingRosterAck,
    /// Identity assigned and join acked; the loop integrates and transmits.
    Active,
}

/// Lifecycle and error signals surfaced to the owning controller.
///
/// Nothing here is retried internally; reconnect/resend policy lives with the
/// controller.
#[derive(Debug, Clone)]
pub enum SessionNotice {
    /// The join handshake completed; presentation may leave the entry form.
    Joined,
    /// The channel dropped; the registry is kept as last known.
    Disconnected,
    /// A malformed message was dropped.
    ProtocolDecodeError { detail: String },
    /// The relay violated the protocol; the session is torn down.
    ProtocolViolation { detail: String },
}
