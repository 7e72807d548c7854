use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::dto::players::PlayerSummary;

#[derive(Debug, Deserialize, Serialize, ToSchema)]
/// Messages accepted from device WebSocket clients.
#[serde(tag = "type")]
pub enum DeviceInboundMessage {
    /// Initial identification; must be the first frame on the socket.
    #[serde(rename = "register")]
    Register {
        /// CPU serial read from the device hardware.
        cpu_serial: String,
        /// Optional display name for a device registering for the first time.
        #[serde(default)]
        name: Option<String>,
    },
    /// Periodic liveness signal.
    #[serde(rename = "heartbeat")]
    Heartbeat,
    #[serde(other)]
    /// Anything this version of the protocol does not understand.
    Unknown,
}

impl DeviceInboundMessage {
    /// Parse and lightly sanity-check a JSON text frame.
    pub fn from_json_str(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Positive acknowledgement sent to a device after successful registration.
pub struct RegisteredAck {
    /// Message discriminator, always `registered`.
    pub r#type: String,
    /// The player record now tracking this device.
    pub player: PlayerSummary,
}

impl RegisteredAck {
    /// Wrap a player summary in the registration acknowledgement envelope.
    pub fn new(player: PlayerSummary) -> Self {
        Self {
            r#type: "registered".into(),
            player,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn register_frame_parses() {
        let msg = DeviceInboundMessage::from_json_str(
            r#"{"type":"register","cpu_serial":"0000abcd1234","name":"Lobby"}"#,
        )
        .expect("valid frame");
        assert!(matches!(
            msg,
            DeviceInboundMessage::Register { cpu_serial, name: Some(_) } if cpu_serial == "0000abcd1234"
        ));
    }

    #[test]
    fn unknown_frame_types_do_not_error() {
        let msg = DeviceInboundMessage::from_json_str(r#"{"type":"telemetry","cpu":42}"#)
            .expect("tolerated frame");
        assert!(matches!(msg, DeviceInboundMessage::Unknown));
    }
}
