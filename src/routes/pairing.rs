use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    context::OrgContext,
    dto::pairing::{
        GenerateCodeRequest, GenerateCodeResponse, PairingStatusResponse, VerifyRequest,
        VerifyResponse,
    },
    error::AppError,
    services::pairing_service,
    state::SharedState,
};

/// Routes driving the device pairing exchange.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/api/pairing/generate", post(generate_code))
        .route("/api/pairing/verify", post(verify_code))
        .route("/api/pairing/status/{device_uuid}", get(pairing_status))
}

/// Issue a pairing code to a booting device.
#[utoipa::path(
    post,
    path = "/api/pairing/generate",
    tag = "pairing",
    request_body = GenerateCodeRequest,
    responses(
        (status = 200, description = "Code issued", body = GenerateCodeResponse),
        (status = 409, description = "Device already paired")
    )
)]
pub async fn generate_code(
    State(state): State<SharedState>,
    Json(payload): Json<GenerateCodeRequest>,
) -> Result<Json<GenerateCodeResponse>, AppError> {
    let response = pairing_service::generate_code(&state, payload)?;
    Ok(Json(response))
}

/// Redeem a pairing code, binding the device to the caller's organization.
#[utoipa::path(
    post,
    path = "/api/pairing/verify",
    tag = "pairing",
    params(("x-organization-id" = String, Header, description = "Organization redeeming the code")),
    request_body = VerifyRequest,
    responses(
        (status = 200, description = "Device paired", body = VerifyResponse),
        (status = 404, description = "Invalid pairing code"),
        (status = 409, description = "Device already paired to an account"),
        (status = 410, description = "Pairing code expired")
    )
)]
pub async fn verify_code(
    State(state): State<SharedState>,
    context: OrgContext,
    Json(payload): Json<VerifyRequest>,
) -> Result<Json<VerifyResponse>, AppError> {
    let response = pairing_service::verify_code(&state, &context, payload)?;
    Ok(Json(response))
}

/// Let a device poll whether its code has been redeemed.
#[utoipa::path(
    get,
    path = "/api/pairing/status/{device_uuid}",
    tag = "pairing",
    params(("device_uuid" = String, Path, description = "Device UUID reported at code generation")),
    responses(
        (status = 200, description = "Current pairing state", body = PairingStatusResponse),
        (status = 404, description = "Device not found")
    )
)]
pub async fn pairing_status(
    State(state): State<SharedState>,
    Path(device_uuid): Path<String>,
) -> Result<Json<PairingStatusResponse>, AppError> {
    let response = pairing_service::pairing_status(&state, &device_uuid)?;
    Ok(Json(response))
}
