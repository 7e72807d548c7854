//! Pairing code issuance and redemption.
//!
//! A device obtains a short-lived 6-character code on first boot, displays
//! it, and polls for completion; an operator redeems the code from a
//! dashboard, which binds the device to their organization. Codes are single
//! use: redemption clears the code in the same registry update that binds
//! the device.

use std::time::SystemTime;

use rand::Rng;
use uuid::Uuid;
use validator::Validate;

use crate::{
    context::OrgContext,
    dto::{
        format_system_time,
        pairing::{
            GenerateCodeRequest, GenerateCodeResponse, PairingStatusResponse, VerifyRequest,
            VerifyResponse,
        },
        players::PlayerSummary,
        validation::{PAIRING_CODE_LEN, normalize_pairing_code},
    },
    error::ServiceError,
    services::sse_events,
    state::{
        SharedState,
        fleet::{Player, PlayerStatus},
    },
};

/// Code alphabet with ambiguous characters removed (no `0`, `O`, `I`, `1`).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Draw a fresh 6-character pairing code.
fn generate_pairing_code() -> String {
    let mut rng = rand::rng();
    (0..PAIRING_CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Issue (or refresh) a pairing code for a booting device.
///
/// An unknown device gets a new unpaired registry record; a known unpaired
/// device gets its code regenerated in place; a device that already belongs
/// to an organization is rejected.
pub fn generate_code(
    state: &SharedState,
    payload: GenerateCodeRequest,
) -> Result<GenerateCodeResponse, ServiceError> {
    payload.validate()?;

    let now = SystemTime::now();
    let code = generate_pairing_code();
    let expires_at = now + state.config().pairing_code_ttl();

    let player_id = match state
        .fleet()
        .find_by_device(&payload.cpu_serial, &payload.device_uuid)
    {
        Some(existing) if existing.is_paired() => {
            return Err(ServiceError::Conflict("Device already paired".into()));
        }
        // Known but unpaired: refresh the code and adopt the latest
        // device UUID, which changes when the device re-images.
        Some(existing) => refresh_code(state, existing.id, &code, expires_at, &payload.device_uuid)?,
        None => {
            let candidate = Player {
                id: Uuid::new_v4(),
                name: format!("Device {code}"),
                cpu_serial: payload.cpu_serial.clone(),
                device_uuid: payload.device_uuid.clone(),
                organization_id: None,
                group_id: None,
                status: PlayerStatus::Offline,
                last_seen: None,
                paired_at: None,
                created_at: now,
                pairing_code: Some(code.clone()),
                pairing_code_expires_at: Some(expires_at),
            };
            match state.fleet().insert_new_device(candidate) {
                Ok(created) => created.id,
                Err(existing) if existing.is_paired() => {
                    return Err(ServiceError::Conflict("Device already paired".into()));
                }
                // Lost a boot race; treat it as a regeneration for the
                // record the winning request created.
                Err(existing) => {
                    refresh_code(state, existing.id, &code, expires_at, &payload.device_uuid)?
                }
            }
        }
    };

    Ok(GenerateCodeResponse {
        qr_data: format!("{}?code={code}", state.config().qr_base_url()),
        pairing_code: code,
        expires_at: format_system_time(expires_at),
        player_id,
    })
}

/// Stamp a fresh code onto a known record, re-checking the pairing state
/// under the entry lock in case a verification landed since the lookup.
fn refresh_code(
    state: &SharedState,
    player_id: Uuid,
    code: &str,
    expires_at: SystemTime,
    device_uuid: &str,
) -> Result<Uuid, ServiceError> {
    state
        .fleet()
        .try_update(player_id, |record| {
            if record.is_paired() {
                return Err(ServiceError::Conflict("Device already paired".into()));
            }
            record.pairing_code = Some(code.to_string());
            record.pairing_code_expires_at = Some(expires_at);
            record.device_uuid = device_uuid.to_string();
            Ok(())
        })
        .ok_or_else(|| ServiceError::NotFound("Device not found".into()))?
        .map(|player| player.id)
}

/// Redeem a pairing code on behalf of an operator's organization.
///
/// On success the device is bound to the organization, the code is consumed,
/// and a `pairing:success` event is pushed on the presence feed so both the
/// dashboard and the waiting device page can react.
pub fn verify_code(
    state: &SharedState,
    context: &OrgContext,
    payload: VerifyRequest,
) -> Result<VerifyResponse, ServiceError> {
    payload.validate()?;
    let code = normalize_pairing_code(&payload.pairing_code);

    let player = state
        .fleet()
        .find_by_pairing_code(&code)
        .ok_or_else(|| ServiceError::NotFound("Invalid pairing code".into()))?;

    let now = SystemTime::now();

    // The lookup handed back a stale clone, so every precondition is
    // re-checked under the entry lock. Two racing redemptions of one code
    // would otherwise both bind, and the second would silently overwrite
    // the first organization.
    let updated = state
        .fleet()
        .try_update(player.id, |record| {
            if record.pairing_code.as_deref() != Some(code.as_str()) {
                return Err(ServiceError::NotFound("Invalid pairing code".into()));
            }
            if record.is_paired() {
                return Err(ServiceError::Conflict(
                    "Device already paired to an account".into(),
                ));
            }
            if record
                .pairing_code_expires_at
                .is_none_or(|expiry| expiry < now)
            {
                return Err(ServiceError::Gone("Pairing code expired".into()));
            }

            record.organization_id = Some(context.organization_id.clone());
            record.paired_at = Some(now);
            if let Some(name) = &payload.device_name {
                record.name = name.clone();
            }
            record.pairing_code = None;
            record.pairing_code_expires_at = None;
            Ok(())
        })
        .ok_or_else(|| ServiceError::NotFound("Invalid pairing code".into()))??;

    sse_events::broadcast_pairing_success(
        state,
        updated.id,
        updated.device_uuid.clone(),
        context.organization_id.clone(),
    );

    Ok(VerifyResponse {
        success: true,
        player: PlayerSummary::from_record(&updated),
    })
}

/// Answer a device polling whether its code has been redeemed yet.
pub fn pairing_status(
    state: &SharedState,
    device_uuid: &str,
) -> Result<PairingStatusResponse, ServiceError> {
    let player = state
        .fleet()
        .find_by_device_uuid(device_uuid)
        .ok_or_else(|| ServiceError::NotFound("Device not found".into()))?;

    if player.is_paired() {
        Ok(PairingStatusResponse {
            paired: true,
            organization_id: player.organization_id,
            player_id: Some(player.id),
            name: Some(player.name),
            pairing_code: None,
            expires_at: None,
        })
    } else {
        Ok(PairingStatusResponse {
            paired: false,
            organization_id: None,
            player_id: None,
            name: None,
            pairing_code: player.pairing_code,
            expires_at: player.pairing_code_expires_at.map(format_system_time),
        })
    }
}
