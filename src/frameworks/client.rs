// Framework bootstrap for the presence client runtime.

use crate::domain::tuning::movement::MovementTuning;
use crate::frameworks::{config, profile};
use crate::interface_adapters::input::normalizer_task;
use crate::interface_adapters::net::{ChannelError, ProtocolChannel};
use crate::use_cases::session::{SessionHandle, SessionSettings, session_task};
use crate::use_cases::types::SessionNotice;

use std::io;
use std::sync::Arc;
use tokio::sync::{Notify, broadcast, mpsc, watch};
use tracing::{info, warn};

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

/// Connects to the session relay and spawns the engine tasks.
///
/// The returned handle is the only surface the presentation layer needs:
/// join/leave, raw key signals in, presence/frames/notices out.
pub async fn connect_session(
    url: &str,
    settings: SessionSettings,
) -> Result<SessionHandle, ChannelError> {
    // Channel wiring for the session loop.
    let (command_tx, command_rx) = mpsc::channel(config::COMMAND_CHANNEL_CAPACITY);
    let (press_tx, press_rx) = mpsc::channel(config::RAW_INPUT_CHANNEL_CAPACITY);
    let (release_tx, release_rx) = mpsc::channel(config::RAW_INPUT_CHANNEL_CAPACITY);
    let (motion_tx, motion_rx) = mpsc::channel(config::MOTION_CHANNEL_CAPACITY);
    let (event_tx, event_rx) = mpsc::channel(config::EVENT_CHANNEL_CAPACITY);
    let (presence_tx, presence_rx) = watch::channel(Vec::new());
    let (frame_tx, _frame_rx) = broadcast::channel(config::FRAME_BROADCAST_CAPACITY);
    let (notice_tx, _notice_rx) = broadcast::channel(config::NOTICE_BROADCAST_CAPACITY);
    let shutdown = Arc::new(Notify::new());

    let channel = ProtocolChannel::connect(url, event_tx).await?;
    info!(%url, "connected to session relay");

    // Merge raw press/release signals into one normalized transition stream.
    tokio::spawn(normalizer_task(
        press_rx,
        release_rx,
        motion_tx,
        shutdown.clone(),
    ));

    // The synchronization loop owns the registry and the channel write half.
    tokio::spawn(session_task(
        channel,
        command_rx,
        motion_rx,
        event_rx,
        presence_tx,
        frame_tx.clone(),
        notice_tx.clone(),
        settings,
        shutdown,
    ));

    Ok(SessionHandle {
        command_tx,
        press_tx,
        release_tx,
        presence_rx,
        frame_tx,
        notice_tx,
    })
}

/// Demo runner: join with the configured name and log the session until
/// ctrl-c or disconnect.
pub async fn run_with_config() -> io::Result<()> {
    init_runtime();

    let url = config::session_server_url();
    let profile_path = profile::profile_path();
    let name = config::player_name()
        .or_else(|| profile::load_last_name(&profile_path))
        .unwrap_or_else(|| "guest".to_string());

    let settings = SessionSettings {
        tuning: MovementTuning::default(),
        frame_interval: config::FRAME_INTERVAL,
    };
    let handle = connect_session(&url, settings)
        .await
        .map_err(|e| io::Error::other(format!("failed to connect to {url}: {e:?}")))?;

    let mut notices = handle.notices();
    let mut presence = handle.presence();
    handle.join(&name).await;

    loop {
        tokio::select! {
            notice = notices.recv() => match notice {
                Ok(SessionNotice::Joined) => {
                    info!(%name, "joined session");
                    if let Err(e) = profile::store_last_name(&profile_path, &name) {
                        warn!(error = %e, "failed to cache display name");
                    }
                }
                Ok(SessionNotice::Disconnected) => {
                    info!("session relay disconnected");
                    break;
                }
                Ok(SessionNotice::ProtocolDecodeError { detail }) => {
                    warn!(%detail, "dropped malformed relay message");
                }
                Ok(SessionNotice::ProtocolViolation { detail }) => {
                    warn!(%detail, "session relay violated the protocol");
                    break;
                }
                Err(broadcast::error::RecvError::Lagged(missed)) => {
                    warn!(missed, "notice stream lagged");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            },

            changed = presence.changed() => match changed {
                Ok(()) => {
                    let names: Vec<String> = presence
                        .borrow()
                        .iter()
                        .map(|entry| entry.display_name.clone())
                        .collect();
                    info!(?names, "presence changed");
                }
                Err(_) => break,
            },

            _ = tokio::signal::ctrl_c() => {
                info!("shutting down");
                break;
            }
        }
    }

    handle.leave().await;
    Ok(())
}
