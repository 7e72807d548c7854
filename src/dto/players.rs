use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{dto::format_system_time, state::fleet::{Player, PlayerStatus}};

/// Player record as exposed to dashboards and the presence feed.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct PlayerSummary {
    /// Stable player identifier.
    pub id: Uuid,
    /// Display name.
    pub name: String,
    /// CPU serial reported by the device.
    pub cpu_serial: String,
    /// Software-generated device UUID.
    pub device_uuid: String,
    /// Optional player group assignment.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    /// Derived online/offline status.
    pub status: PlayerStatus,
    /// RFC 3339 timestamp of the last heartbeat or registration, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_seen: Option<String>,
    /// RFC 3339 timestamp of when the device was paired, if it is.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paired_at: Option<String>,
    /// RFC 3339 creation timestamp.
    pub created_at: String,
    /// Visual escalation applied while the player is offline.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<OfflineAlert>,
}

impl PlayerSummary {
    /// Project a registry record into its API shape, without alert decoration.
    ///
    /// The alert is attached separately by the presence evaluator since it
    /// depends on the organization's threshold and the current clock.
    pub fn from_record(player: &Player) -> Self {
        Self {
            id: player.id,
            name: player.name.clone(),
            cpu_serial: player.cpu_serial.clone(),
            device_uuid: player.device_uuid.clone(),
            group_id: player.group_id.clone(),
            status: player.status,
            last_seen: player.last_seen.map(format_system_time),
            paired_at: player.paired_at.map(format_system_time),
            created_at: format_system_time(player.created_at),
            alert: None,
        }
    }
}

/// Escalation tier shown against a player that has been offline for a while.
///
/// Purely presentational; the online/offline boolean is carried by `status`.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct OfflineAlert {
    /// Zero-based index of the matched escalation stage.
    pub stage: usize,
    /// Border/alert color from the escalation template.
    pub color: String,
    /// Animation hint from the escalation template.
    pub animation: String,
}

/// Fields an operator may change on a player.
///
/// `status` is intentionally absent: presence is derived from heartbeats and
/// the offline threshold, never set by a dashboard.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdatePlayerRequest {
    /// New display name.
    #[validate(length(min = 1, max = 120))]
    pub name: Option<String>,
    /// If not specified, leaves the group assignment unchanged.
    /// If null is specified, removes the player from its group.
    /// If a string is specified, assigns the player to that group.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub group_id: Option<Option<String>>,
}

/// Acknowledgement returned after a player is deleted.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeletePlayerResponse {
    /// Always `true` on success.
    pub success: bool,
}
