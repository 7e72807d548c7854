use serde::Serialize;
use tracing::warn;
use uuid::Uuid;

use crate::{
    dto::{
        players::PlayerSummary,
        sse::{PairingSuccessEvent, PlayerStatusEvent, ServerEvent},
    },
    state::SharedState,
};

const EVENT_PLAYER_STATUS: &str = "player:status";
const EVENT_PAIRING_SUCCESS: &str = "pairing:success";

/// Broadcast a player's online/offline transition to presence subscribers.
pub fn broadcast_player_status(state: &SharedState, player: PlayerSummary) {
    let payload = PlayerStatusEvent { player };
    send_presence_event(state, EVENT_PLAYER_STATUS, &payload);
}

/// Broadcast that a pairing code has been redeemed.
pub fn broadcast_pairing_success(
    state: &SharedState,
    player_id: Uuid,
    device_uuid: String,
    organization_id: String,
) {
    let payload = PairingSuccessEvent {
        player_id,
        device_uuid,
        organization_id,
    };
    send_presence_event(state, EVENT_PAIRING_SUCCESS, &payload);
}

/// Serialize and broadcast a payload, logging serialization failures.
///
/// A failed broadcast is never surfaced to callers; subscribers recover on
/// the next event or the next manual refresh.
fn send_presence_event<T: Serialize>(state: &SharedState, event: &str, payload: &T) {
    match ServerEvent::json(Some(event.to_string()), payload) {
        Ok(event) => state.presence_hub().broadcast(event),
        Err(err) => warn!(event, error = %err, "failed to serialize presence event"),
    }
}
