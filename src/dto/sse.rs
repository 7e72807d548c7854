use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::players::PlayerSummary;

#[derive(Clone, Debug)]
/// Dispatched payload carried across the presence SSE channel.
pub struct ServerEvent {
    /// SSE event name, if any.
    pub event: Option<String>,
    /// Serialized JSON data field.
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to a presence feed subscriber when it connects.
pub struct Handshake {
    /// Identifier of the stream (`presence`).
    pub stream: String,
    /// Human-readable message confirming the subscription.
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
/// Pushed whenever a player flips between online and offline.
///
/// Consumers treat this as a signal to refresh the player listing; the
/// embedded summary only covers the transitioning player.
pub struct PlayerStatusEvent {
    /// The player that changed status, with its new derived state.
    pub player: PlayerSummary,
}

#[derive(Debug, Serialize, ToSchema)]
/// Pushed after a pairing code has been successfully redeemed.
pub struct PairingSuccessEvent {
    /// Registry id of the newly paired player.
    pub player_id: Uuid,
    /// Device UUID, so the waiting device page can match its own pairing.
    pub device_uuid: String,
    /// Organization the player now belongs to.
    pub organization_id: String,
}
