use std::{env, time::Duration};

// Runtime/client constants (not gameplay tuning).

pub fn session_server_url() -> String {
    env::var("SESSION_SERVER_URL").unwrap_or_else(|_| "ws://127.0.0.1:3000/ws".to_string())
}

/// Display name override from the environment, if set and non-blank.
pub fn player_name() -> Option<String> {
    env::var("PLAYER_NAME")
        .ok()
        .filter(|value| !value.trim().is_empty())
}

pub const COMMAND_CHANNEL_CAPACITY: usize = 16;
pub const RAW_INPUT_CHANNEL_CAPACITY: usize = 256;
pub const MOTION_CHANNEL_CAPACITY: usize = 256;
pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const FRAME_BROADCAST_CAPACITY: usize = 128;
pub const NOTICE_BROADCAST_CAPACITY: usize = 32;

// One advance per display refresh at 60 Hz.
pub const FRAME_INTERVAL: Duration = Duration::from_millis(1000 / 60);
