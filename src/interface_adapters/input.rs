// Input event normalization: raw key signals in, movement transitions out.
//
// The normalizer is the only component that sees raw key codes. It never
// touches the entity registry; mapping transitions onto the local intent is
// the session loop's job.

use crate::domain::vector::Direction;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::{Notify, mpsc};
use tracing::debug;

// Platform key codes for the recognized movement keys.
const KEY_W: u32 = 87;
const KEY_A: u32 = 65;
const KEY_S: u32 = 83;
const KEY_D: u32 = 68;
const KEY_ARROW_LEFT: u32 = 37;
const KEY_ARROW_UP: u32 = 38;
const KEY_ARROW_RIGHT: u32 = 39;
const KEY_ARROW_DOWN: u32 = 40;

/// A recognized movement key. Everything else is dropped silently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MoveKey {
    W,
    A,
    S,
    D,
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
}

impl MoveKey {
    pub fn from_code(code: u32) -> Option<MoveKey> {
        match code {
            KEY_W => Some(MoveKey::W),
            KEY_A => Some(MoveKey::A),
            KEY_S => Some(MoveKey::S),
            KEY_D => Some(MoveKey::D),
            KEY_ARROW_UP => Some(MoveKey::ArrowUp),
            KEY_ARROW_DOWN => Some(MoveKey::ArrowDown),
            KEY_ARROW_LEFT => Some(MoveKey::ArrowLeft),
            KEY_ARROW_RIGHT => Some(MoveKey::ArrowRight),
            _ => None,
        }
    }

    pub fn direction(self) -> Direction {
        match self {
            MoveKey::W | MoveKey::ArrowUp => Direction::Up,
            MoveKey::S | MoveKey::ArrowDown => Direction::Down,
            MoveKey::A | MoveKey::ArrowLeft => Direction::Left,
            MoveKey::D | MoveKey::ArrowRight => Direction::Right,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransitionKind {
    Start,
    Stop,
}

/// One normalized movement transition: the first press or the final release
/// of a movement key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTransition {
    pub kind: TransitionKind,
    pub key: MoveKey,
}

/// Tracks the held-key set so a held key emits exactly one `Start` and one
/// `Stop`, regardless of how often the platform repeats the press signal.
#[derive(Debug, Default)]
pub struct InputNormalizer {
    held: HashSet<MoveKey>,
}

impl InputNormalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles a raw key-down signal. Returns the transition to forward, or
    /// None for unrecognized keys and auto-repeats of an already held key.
    pub fn press(&mut self, code: u32) -> Option<KeyTransition> {
        let key = MoveKey::from_code(code)?;
        if !self.held.insert(key) {
            return None;
        }
        Some(KeyTransition {
            kind: TransitionKind::Start,
            key,
        })
    }

    /// Handles a raw key-up signal. Returns the transition to forward, or
    /// None for unrecognized keys and keys that were never observed as held.
    pub fn release(&mut self, code: u32) -> Option<KeyTransition> {
        let key = MoveKey::from_code(code)?;
        if !self.held.remove(&key) {
            return None;
        }
        Some(KeyTransition {
            kind: TransitionKind::Stop,
            key,
        })
    }
}

/// Merges the independent press and release signal sources into one ordered
/// transition stream, preserving arrival order. Exits when either raw source
/// or the consumer goes away, or on the shared shutdown signal.
pub async fn normalizer_task(
    mut press_rx: mpsc::Receiver<u32>,
    mut release_rx: mpsc::Receiver<u32>,
    motion_tx: mpsc::Sender<KeyTransition>,
    shutdown: Arc<Notify>,
) {
    let mut normalizer = InputNormalizer::new();

    loop {
        let transition = tokio::select! {
            pressed = press_rx.recv() => {
                match pressed {
                    Some(code) => normalizer.press(code),
                    None => break,
                }
            }
            released = release_rx.recv() => {
                match released {
                    Some(code) => normalizer.release(code),
                    None => break,
                }
            }
            _ = shutdown.notified() => break,
        };

        if let Some(transition) = transition {
            if motion_tx.send(transition).await.is_err() {
                break;
            }
        }
    }

    debug!("input normalizer stopped");
}
