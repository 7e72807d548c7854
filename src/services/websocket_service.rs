//! Device WebSocket channel: registration, heartbeats, and the presence
//! transitions they drive.

use std::time::{Duration, SystemTime};

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use tokio::{sync::mpsc, task::JoinHandle};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    dto::{
        players::PlayerSummary,
        ws::{DeviceInboundMessage, RegisteredAck},
    },
    services::{presence, sse_events},
    state::{
        DeviceConnection, SharedState,
        fleet::{Player, PlayerStatus},
    },
};

/// How long a freshly accepted socket has to send its `register` frame.
const IDENT_TIMEOUT: Duration = Duration::from_secs(10);

/// Handle the full lifecycle of an individual device WebSocket connection.
pub async fn handle_socket(state: SharedState, socket: WebSocket) {
    let (mut sender, mut receiver) = socket.split();
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<Message>();

    // Dedicated writer task keeps outbound messages flowing even while we await inbound frames.
    let writer_task = tokio::spawn(async move {
        while let Some(message) = outbound_rx.recv().await {
            if sender.send(message).await.is_err() {
                break;
            }
        }
    });

    let initial_message = match tokio::time::timeout(IDENT_TIMEOUT, receiver.next()).await {
        Ok(Some(Ok(Message::Text(text)))) => text,
        Ok(Some(Ok(Message::Close(_)))) => {
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Ok(_))) => {
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(Some(Err(err))) => {
            warn!(error = %err, "websocket receive error");
            finalize(writer_task, outbound_tx).await;
            return;
        }
        Ok(None) | Err(_) => {
            warn!("device socket registration timed out");
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let inbound = match DeviceInboundMessage::from_json_str(&initial_message) {
        Ok(message) => message,
        Err(err) => {
            warn!(error = %err, "failed to parse device message");
            let _ = outbound_tx.send(Message::Close(None));
            finalize(writer_task, outbound_tx).await;
            return;
        }
    };

    let DeviceInboundMessage::Register { cpu_serial, name } = inbound else {
        warn!("first device message was not a registration");
        let _ = outbound_tx.send(Message::Close(None));
        finalize(writer_task, outbound_tx).await;
        return;
    };

    let (player, came_online) = register_device(&state, &cpu_serial, name.as_deref());
    let conn_id = Uuid::new_v4();

    // A reconnecting device replaces its previous entry; the superseded
    // socket's teardown is a no-op thanks to the conn_id check below.
    state.devices().insert(
        cpu_serial.clone(),
        DeviceConnection {
            conn_id,
            player_id: player.id,
            tx: outbound_tx.clone(),
        },
    );

    info!(cpu_serial = %cpu_serial, player_id = %player.id, "device connected");

    let ack = RegisteredAck::new(summarize(&state, &player));
    if send_message_to_device(&outbound_tx, &ack).is_err() {
        info!(cpu_serial = %cpu_serial, "connection closed during registration ack, terminating");
        teardown(&state, &cpu_serial, conn_id);
        finalize(writer_task, outbound_tx).await;
        return;
    }

    if came_online {
        sse_events::broadcast_player_status(&state, summarize(&state, &player));
    }

    while let Some(message) = receiver.next().await {
        match message {
            Ok(Message::Text(text)) => match DeviceInboundMessage::from_json_str(&text) {
                Ok(DeviceInboundMessage::Heartbeat) => {
                    if let Some((player, came_online)) = heartbeat(&state, player.id)
                        && came_online
                    {
                        sse_events::broadcast_player_status(&state, summarize(&state, &player));
                    }
                }
                Ok(DeviceInboundMessage::Register { .. }) => {
                    warn!(cpu_serial = %cpu_serial, "ignoring duplicate registration message");
                }
                Ok(DeviceInboundMessage::Unknown) => {
                    warn!(cpu_serial = %cpu_serial, payload = %text, "ignoring unknown device message");
                }
                Err(err) => {
                    warn!(cpu_serial = %cpu_serial, error = %err, "failed to parse device message");
                }
            },
            Ok(Message::Ping(payload)) => {
                let _ = outbound_tx.send(Message::Pong(payload));
            }
            Ok(Message::Close(frame)) => {
                info!(cpu_serial = %cpu_serial, "device closed");
                let _ = outbound_tx.send(Message::Close(frame));
                break;
            }
            Ok(Message::Binary(_)) => {}
            Ok(Message::Pong(_)) => {}
            Err(err) => {
                warn!(cpu_serial = %cpu_serial, error = %err, "websocket error");
                break;
            }
        }
    }

    teardown(&state, &cpu_serial, conn_id);
    info!(cpu_serial = %cpu_serial, "device disconnected");

    finalize(writer_task, outbound_tx).await;
}

/// Record a device registration: create the player on first contact, or mark
/// a known device online. Returns the record and whether it just came online.
fn register_device(
    state: &SharedState,
    cpu_serial: &str,
    name: Option<&str>,
) -> (Player, bool) {
    let now = SystemTime::now();

    if let Some(existing) = state.fleet().find_by_serial(cpu_serial) {
        return mark_online(state, existing, now);
    }

    let player = Player {
        id: Uuid::new_v4(),
        name: name.unwrap_or("Unknown Player").to_string(),
        cpu_serial: cpu_serial.to_string(),
        device_uuid: Uuid::new_v4().to_string(),
        organization_id: None,
        group_id: None,
        status: PlayerStatus::Online,
        last_seen: Some(now),
        paired_at: None,
        created_at: now,
        pairing_code: None,
        pairing_code_expires_at: None,
    };
    match state.fleet().insert_new_device(player) {
        Ok(created) => (created, true),
        // Another socket registered this serial between lookup and insert.
        Err(existing) => mark_online(state, existing, now),
    }
}

/// Stamp `last_seen` and force the player online, reporting whether that
/// flipped it from offline.
fn mark_online(state: &SharedState, existing: Player, now: SystemTime) -> (Player, bool) {
    let came_online = existing.status == PlayerStatus::Offline;
    let updated = state
        .fleet()
        .update(existing.id, |player| {
            player.status = PlayerStatus::Online;
            player.last_seen = Some(now);
        })
        .unwrap_or(existing);
    (updated, came_online)
}

/// Stamp a heartbeat for the player, returning the updated record and whether
/// the heartbeat flipped it back online.
fn heartbeat(state: &SharedState, player_id: Uuid) -> Option<(Player, bool)> {
    let previous = state.fleet().get(player_id)?.status;
    let updated = state.fleet().update(player_id, |player| {
        player.status = PlayerStatus::Online;
        player.last_seen = Some(SystemTime::now());
    })?;
    Some((updated, previous == PlayerStatus::Offline))
}

/// Drop this connection's registry entry and mark the player offline, unless
/// a newer connection for the same serial has already taken over.
fn teardown(state: &SharedState, cpu_serial: &str, conn_id: Uuid) {
    let removed = state
        .devices()
        .remove_if(cpu_serial, |_, connection| connection.conn_id == conn_id);

    if let Some((_, connection)) = removed
        && let Some(updated) = state.fleet().update(connection.player_id, |player| {
            player.status = PlayerStatus::Offline;
        })
    {
        sse_events::broadcast_player_status(state, summarize(state, &updated));
    }
}

/// Project a player for the wire, carrying its freshly stored status.
fn summarize(state: &SharedState, player: &Player) -> PlayerSummary {
    presence::event_summary(state, player, SystemTime::now())
}

/// Serialize a payload and push it onto the provided WebSocket sender.
///
/// Serialization failures are permanent (a bug in our types) and are logged
/// and swallowed; a closed writer channel is reported so the caller can stop.
fn send_message_to_device<T>(tx: &mpsc::UnboundedSender<Message>, value: &T) -> Result<(), ()>
where
    T: ?Sized + serde::Serialize + std::fmt::Debug,
{
    let payload = match serde_json::to_string(value) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "failed to serialize device message `{value:?}`");
            return Ok(());
        }
    };

    tx.send(Message::Text(payload.into())).map_err(|_| ())
}

/// Ensure the writer task winds down before we return from the socket handler.
async fn finalize(writer_task: JoinHandle<()>, outbound_tx: mpsc::UnboundedSender<Message>) {
    drop(outbound_tx);
    let _ = writer_task.await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::state::AppState;

    #[test]
    fn first_registration_creates_an_online_player() {
        let state = AppState::new(AppConfig::default());
        let (player, came_online) = register_device(&state, "serial-1", Some("Lobby"));

        assert!(came_online);
        assert_eq!(player.name, "Lobby");
        assert_eq!(player.status, PlayerStatus::Online);
        assert!(player.last_seen.is_some());
        assert!(state.fleet().find_by_serial("serial-1").is_some());
    }

    #[test]
    fn re_registration_marks_a_known_device_online() {
        let state = AppState::new(AppConfig::default());
        let (player, _) = register_device(&state, "serial-1", Some("Lobby"));
        state.fleet().update(player.id, |p| p.status = PlayerStatus::Offline);

        let (updated, came_online) = register_device(&state, "serial-1", None);
        assert_eq!(updated.id, player.id);
        assert!(came_online);
        assert_eq!(updated.status, PlayerStatus::Online);
    }

    #[test]
    fn heartbeat_reports_offline_to_online_transition_once() {
        let state = AppState::new(AppConfig::default());
        let (player, _) = register_device(&state, "serial-1", None);
        state.fleet().update(player.id, |p| p.status = PlayerStatus::Offline);

        let (_, first) = heartbeat(&state, player.id).expect("player exists");
        assert!(first);
        let (_, second) = heartbeat(&state, player.id).expect("player exists");
        assert!(!second);
    }

    #[test]
    fn superseded_connection_teardown_keeps_the_player_online() {
        let state = AppState::new(AppConfig::default());
        let (player, _) = register_device(&state, "serial-1", None);
        let (tx, _rx) = mpsc::unbounded_channel();

        let old_conn = Uuid::new_v4();
        let new_conn = Uuid::new_v4();
        state.devices().insert(
            "serial-1".into(),
            DeviceConnection {
                conn_id: new_conn,
                player_id: player.id,
                tx,
            },
        );

        // The stale socket unwinding must not clear the newer connection's claim.
        teardown(&state, "serial-1", old_conn);
        assert!(state.devices().contains_key("serial-1"));
        assert_eq!(
            state.fleet().get(player.id).expect("player exists").status,
            PlayerStatus::Online
        );

        teardown(&state, "serial-1", new_conn);
        assert!(!state.devices().contains_key("serial-1"));
        assert_eq!(
            state.fleet().get(player.id).expect("player exists").status,
            PlayerStatus::Offline
        );
    }
}
