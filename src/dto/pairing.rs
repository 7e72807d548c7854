use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::dto::{
    players::PlayerSummary,
    validation::{normalize_pairing_code, validate_pairing_code},
};

/// Payload a device submits on first boot to obtain a pairing code.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct GenerateCodeRequest {
    /// CPU serial read from the device hardware.
    #[validate(length(min = 1, max = 64))]
    pub cpu_serial: String,
    /// Software-generated device UUID.
    #[validate(length(min = 1, max = 64))]
    pub device_uuid: String,
}

/// Fresh pairing code handed back to the device for display.
#[derive(Debug, Serialize, ToSchema)]
pub struct GenerateCodeResponse {
    /// The 6-character code the operator will type into a dashboard.
    pub pairing_code: String,
    /// RFC 3339 expiry of the code.
    pub expires_at: String,
    /// URL payload for the QR representation of the code.
    pub qr_data: String,
    /// Registry id of the (possibly freshly created) player record.
    pub player_id: Uuid,
}

/// Operator-submitted pairing verification.
#[derive(Debug, Deserialize, ToSchema)]
pub struct VerifyRequest {
    /// The 6-character code shown on the device screen.
    pub pairing_code: String,
    /// Optional name to give the player instead of the generated placeholder.
    #[serde(default)]
    pub device_name: Option<String>,
}

impl Validate for VerifyRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        // Operators copy codes by hand; what must be valid is the
        // normalized form, not the raw keystrokes.
        if let Err(e) = validate_pairing_code(&normalize_pairing_code(&self.pairing_code)) {
            errors.add("pairing_code", e);
        }

        if let Some(name) = &self.device_name
            && (name.is_empty() || name.len() > 120)
        {
            errors.add(
                "device_name",
                validator::ValidationError::new("device_name_length"),
            );
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Result of a successful pairing verification.
#[derive(Debug, Serialize, ToSchema)]
pub struct VerifyResponse {
    /// Always `true`; failures use the error body instead.
    pub success: bool,
    /// The player record, now bound to the organization.
    pub player: PlayerSummary,
}

/// Answer to a device polling for its pairing completion.
#[derive(Debug, Serialize, ToSchema)]
pub struct PairingStatusResponse {
    /// Whether the device has been claimed by an organization.
    pub paired: bool,
    /// Organization the device now belongs to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Registry id of the player.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub player_id: Option<Uuid>,
    /// Display name assigned during pairing.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Outstanding code, present while the device is still unpaired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pairing_code: Option<String>,
    /// Expiry of the outstanding code.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verify_request_rejects_short_codes() {
        let request = VerifyRequest {
            pairing_code: "ABC12".into(),
            device_name: None,
        };
        assert!(request.validate().is_err());
    }

    #[test]
    fn verify_request_accepts_normalized_codes() {
        let request = VerifyRequest {
            pairing_code: "ABC123".into(),
            device_name: Some("Lobby Screen".into()),
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn verify_request_normalizes_before_checking() {
        let request = VerifyRequest {
            pairing_code: " abc-234 ".into(),
            device_name: None,
        };
        assert!(request.validate().is_ok());
    }

    #[test]
    fn verify_request_rejects_empty_device_name() {
        let request = VerifyRequest {
            pairing_code: "ABC123".into(),
            device_name: Some(String::new()),
        };
        assert!(request.validate().is_err());
    }
}
