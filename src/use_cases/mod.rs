// Use-case layer: the synchronization loop and its projections.

pub mod presence;
pub mod session;
pub mod types;

pub use session::{SessionHandle, SessionSettings, session_task};
pub use types::{ChannelEvent, JoinPhase, SessionCommand, SessionNotice};
