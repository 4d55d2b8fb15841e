// The synchronization loop: one task that reconciles local input, relay
// events, and the frame clock against the shared entity registry.
//
// All registry writes happen inside this task, so handlers never observe a
// partially applied update and no locking is needed.

use crate::domain::registry::{EntityRegistry, RegistryError};
use crate::domain::state::{Entity, FrameSnapshot, Intent, PresenceEntry, RenderEntity, RenderHandle};
use crate::domain::systems::movement;
use crate::domain::tuning::movement::MovementTuning;
use crate::interface_adapters::input::{KeyTransition, TransitionKind};
use crate::interface_adapters::net::ProtocolChannel;
use crate::interface_adapters::protocol::{ClientMessage, JoinPayload, MoveDto};
use crate::use_cases::presence::project_presence;
use crate::use_cases::types::{ChannelEvent, JoinPhase, SessionCommand, SessionNotice};

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tracing::{debug, info, warn};

/// Runtime settings for one session loop.
#[derive(Debug, Clone)]
pub struct SessionSettings {
    pub tuning: MovementTuning,
    pub frame_interval: Duration,
}

/// Clonable surface the owning controller and presentation layer talk to.
#[derive(Clone)]
pub struct SessionHandle {
    pub(crate) command_tx: mpsc::Sender<SessionCommand>,
    pub(crate) press_tx: mpsc::Sender<u32>,
    pub(crate) release_tx: mpsc::Sender<u32>,
    pub(crate) presence_rx: watch::Receiver<Vec<PresenceEntry>>,
    pub(crate) frame_tx: broadcast::Sender<FrameSnapshot>,
    pub(crate) notice_tx: broadcast::Sender<SessionNotice>,
}

impl SessionHandle {
    /// Begins the join handshake. A blank name is a local no-op.
    pub async fn join(&self, name: &str) {
        let _ = self
            .command_tx
            .send(SessionCommand::Join {
                name: name.to_string(),
            })
            .await;
    }

    /// Tears the session down: input listeners, frame clock, then channel.
    pub async fn leave(&self) {
        let _ = self.command_tx.send(SessionCommand::Leave).await;
    }

    /// Raw key-down signal from the presentation layer.
    pub fn key_down(&self, code: u32) {
        // Input is latest-wins; a full buffer just drops the oldest signal's slot.
        if self.press_tx.try_send(code).is_err() {
            debug!(code, "press buffer full; dropping key signal");
        }
    }

    /// Raw key-up signal from the presentation layer.
    pub fn key_up(&self, code: u32) {
        if self.release_tx.try_send(code).is_err() {
            debug!(code, "release buffer full; dropping key signal");
        }
    }

    /// Watch of the display-ready participant list.
    pub fn presence(&self) -> watch::Receiver<Vec<PresenceEntry>> {
        self.presence_rx.clone()
    }

    /// Per-frame render positions for the drawing layer.
    pub fn frames(&self) -> broadcast::Receiver<FrameSnapshot> {
        self.frame_tx.subscribe()
    }

    /// Lifecycle and error notices for the owning controller.
    pub fn notices(&self) -> broadcast::Receiver<SessionNotice> {
        self.notice_tx.subscribe()
    }
}

/// Result of applying one channel event to the session state.
#[derive(Debug, Default)]
pub(crate) struct EventOutcome {
    pub notice: Option<SessionNotice>,
    pub presence_changed: bool,
    pub fatal: bool,
}

/// Mutable session state owned by the loop. Pure handlers, no I/O.
pub(crate) struct SessionState {
    registry: EntityRegistry,
    phase: JoinPhase,
    join_acked: bool,
    frame: u64,
    next_handle: u64,
    tuning: MovementTuning,
}

impl SessionState {
    pub(crate) fn new(tuning: MovementTuning) -> Self {
        Self {
            registry: EntityRegistry::new(),
            phase: JoinPhase::Disconnected,
            join_acked: false,
            frame: 0,
            next_handle: 1,
            tuning,
        }
    }

    pub(crate) fn registry(&self) -> &EntityRegistry {
        &self.registry
    }

    pub(crate) fn phase(&self) -> JoinPhase {
        self.phase
    }

    /// Starts the join handshake. Returns the message to transmit, or None
    /// when the name is blank or a handshake is already underway.
    pub(crate) fn handle_join(&mut self, name: &str) -> Option<ClientMessage> {
        if name.trim().is_empty() || self.phase != JoinPhase::Disconnected {
            return None;
        }

        self.phase = JoinPhase::AwaitingIdentity;
        Some(ClientMessage::Join(JoinPayload {
            name: name.to_string(),
            x: 0.0,
            y: 0.0,
        }))
    }

    /// Applies one normalized input transition to the local intent.
    ///
    /// Edge-triggered: returns a move message only when the intent actually
    /// changed, so the outbound rate is bounded by key transitions rather
    /// than the frame rate. A stop clears all four directions.
    pub(crate) fn handle_transition(&mut self, transition: KeyTransition) -> Option<ClientMessage> {
        if self.phase != JoinPhase::Active {
            // Input is still captured pre-join, but never transmitted.
            return None;
        }

        let local_id = self.registry.local_id()?.to_string();
        let entity = self.registry.get_mut(&local_id)?;

        let next = match transition.kind {
            TransitionKind::Start => entity.intent.started(transition.key.direction()),
            TransitionKind::Stop => Intent::IDLE,
        };
        if next == entity.intent {
            return None;
        }

        entity.intent = next;
        Some(ClientMessage::Move(MoveDto {
            id: local_id,
            intent: next.into(),
            // Report where the entity is now, not where the intent will
            // take it.
            position: entity.position.into(),
        }))
    }

    /// Applies one decoded relay event to the registry and join lifecycle.
    pub(crate) fn handle_event(&mut self, event: ChannelEvent) -> EventOutcome {
        let mut outcome = EventOutcome::default();

        match event {
            ChannelEvent::JoinAck => {
                self.join_acked = true;
                self.advance_phase();
                outcome.notice = Some(SessionNotice::Joined);
            }
            ChannelEvent::IdentityAssigned { id } => match self.registry.set_local(&id) {
                Ok(()) => self.advance_phase(),
                Err(RegistryError::LocalAlreadyAssigned { current, attempted }) => {
                    outcome.fatal = true;
                    outcome.notice = Some(SessionNotice::ProtocolViolation {
                        detail: format!(
                            "identity reassigned from {current} to {attempted}"
                        ),
                    });
                }
            },
            ChannelEvent::Roster { entries } => {
                for entry in entries {
                    // Idempotent: a known id keeps its entity and handle.
                    if self.registry.contains(&entry.id) {
                        continue;
                    }
                    let render_handle = self.mint_handle();
                    let display_name = entry.display_name();
                    self.registry.upsert(Entity {
                        id: entry.id,
                        display_name,
                        position: entry.position,
                        intent: Intent::IDLE,
                        is_local: false,
                        render_handle,
                    });
                    outcome.presence_changed = true;
                }
            }
            ChannelEvent::PeerMove {
                id,
                intent,
                position,
            } => {
                // Unknown ids are a leave/move race, not an error.
                if let Some(entity) = self.registry.get_mut(&id) {
                    entity.intent = intent;
                    entity.position = position;
                }
            }
            ChannelEvent::PeerLeave { id } => {
                outcome.presence_changed = self.registry.remove(&id).is_some();
            }
            ChannelEvent::Disconnected => {
                if self.phase != JoinPhase::Disconnected {
                    self.phase = JoinPhase::Disconnected;
                    outcome.notice = Some(SessionNotice::Disconnected);
                }
            }
            ChannelEvent::DecodeError { detail } => {
                outcome.notice = Some(SessionNotice::ProtocolDecodeError { detail });
            }
        }

        outcome
    }

    /// Advances every entity one frame from its stored intent and returns the
    /// render snapshot.
    ///
    /// Runs for local and remote entities alike: remote intents keep being
    /// extrapolated between move messages (dead reckoning). Outside `Active`
    /// the registry is kept as last known and positions freeze.
    pub(crate) fn advance_frame(&mut self) -> FrameSnapshot {
        self.frame += 1;
        let integrate = self.phase == JoinPhase::Active;
        let speed = self.tuning.speed;
        let bounds = self.tuning.bounds();

        let mut entities = Vec::with_capacity(self.registry.len());
        self.registry.for_each_mut(|entity| {
            if integrate && !entity.intent.is_idle() {
                entity.position = movement::advance(entity.position, entity.intent, speed, bounds);
            }
            entities.push(RenderEntity {
                handle: entity.render_handle,
                position: entity.position,
                is_local: entity.is_local,
            });
        });

        FrameSnapshot {
            frame: self.frame,
            entities,
        }
    }

    fn advance_phase(&mut self) {
        let has_identity = self.registry.local_id().is_some();
        self.phase = match (has_identity, self.join_acked) {
            (true, true) => JoinPhase::Active,
            (true, false) => JoinPhase::AwaitingRosterAck,
            _ => self.phase,
        };
    }

    fn mint_handle(&mut self) -> RenderHandle {
        let handle = RenderHandle(self.next_handle);
        self.next_handle += 1;
        handle
    }
}

/// Runs the session loop until the controller leaves, a fatal protocol
/// violation occurs, or the shutdown signal fires.
#[allow(clippy::too_many_arguments)]
pub async fn session_task(
    mut channel: ProtocolChannel,
    mut command_rx: mpsc::Receiver<SessionCommand>,
    mut motion_rx: mpsc::Receiver<KeyTransition>,
    mut event_rx: mpsc::Receiver<ChannelEvent>,
    presence_tx: watch::Sender<Vec<PresenceEntry>>,
    frame_tx: broadcast::Sender<FrameSnapshot>,
    notice_tx: broadcast::Sender<SessionNotice>,
    settings: SessionSettings,
    shutdown: Arc<Notify>,
) {
    let mut state = SessionState::new(settings.tuning);
    let mut frames = tokio::time::interval(settings.frame_interval);
    // The reader closes its side after Disconnected; stop polling it then.
    let mut events_open = true;

    loop {
        let teardown = tokio::select! {
            command = command_rx.recv() => match command {
                Some(SessionCommand::Join { name }) => {
                    match state.handle_join(&name) {
                        Some(msg) => send_or_disconnect(&mut channel, &msg, &mut state, &notice_tx).await,
                        None => false,
                    }
                }
                Some(SessionCommand::Leave) | None => true,
            },

            transition = motion_rx.recv() => match transition {
                Some(transition) => {
                    match state.handle_transition(transition) {
                        Some(msg) => send_or_disconnect(&mut channel, &msg, &mut state, &notice_tx).await,
                        None => false,
                    }
                }
                // Raw input sources are gone; nothing left to synchronize.
                None => true,
            },

            event = event_rx.recv(), if events_open => match event {
                Some(event) => {
                    let outcome = state.handle_event(event);
                    if outcome.presence_changed {
                        let _ = presence_tx.send(project_presence(state.registry()));
                    }
                    if let Some(notice) = outcome.notice {
                        let _ = notice_tx.send(notice);
                    }
                    outcome.fatal
                }
                None => {
                    events_open = false;
                    false
                }
            },

            _ = frames.tick() => {
                let _ = frame_tx.send(state.advance_frame());
                false
            }

            _ = shutdown.notified() => true,
        };

        if teardown {
            break;
        }
    }

    // Release order: input listeners first, then the frame clock, then the
    // channel, so no registry write can land after teardown begins.
    shutdown.notify_waiters();
    drop(motion_rx);
    drop(frames);
    channel.close().await;
    info!("session torn down");
}

/// Sends one message; a failed send marks the channel disconnected instead of
/// killing the loop, keeping the registry as last known for the controller.
async fn send_or_disconnect(
    channel: &mut ProtocolChannel,
    msg: &ClientMessage,
    state: &mut SessionState,
    notice_tx: &broadcast::Sender<SessionNotice>,
) -> bool {
    match channel.send(msg).await {
        Ok(()) => false,
        Err(e) => {
            warn!(error = ?e, "send failed; marking channel disconnected");
            let outcome = state.handle_event(ChannelEvent::Disconnected);
            if let Some(notice) = outcome.notice {
                let _ = notice_tx.send(notice);
            }
            false
        }
    }
}
