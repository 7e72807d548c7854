use axum::{Json, Router, extract::State, routing::get};

use crate::{
    context::OrgContext,
    dto::settings::{OrganizationSettingsResponse, UpdateSettingsRequest},
    error::AppError,
    services::settings_service,
    state::SharedState,
};

/// Organization presence settings routes.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new().route(
        "/api/organizations/settings",
        get(get_settings).patch(update_settings),
    )
}

/// Read the calling organization's presence settings.
#[utoipa::path(
    get,
    path = "/api/organizations/settings",
    tag = "settings",
    params(("x-organization-id" = String, Header, description = "Calling organization")),
    responses((status = 200, description = "Current settings", body = OrganizationSettingsResponse))
)]
pub async fn get_settings(
    State(state): State<SharedState>,
    context: OrgContext,
) -> Json<OrganizationSettingsResponse> {
    Json(settings_service::get_settings(&state, &context))
}

/// Update the calling organization's offline threshold.
#[utoipa::path(
    patch,
    path = "/api/organizations/settings",
    tag = "settings",
    params(("x-organization-id" = String, Header, description = "Calling organization")),
    request_body = UpdateSettingsRequest,
    responses(
        (status = 200, description = "Settings updated", body = OrganizationSettingsResponse),
        (status = 400, description = "Threshold outside the 1-60 minute range")
    )
)]
pub async fn update_settings(
    State(state): State<SharedState>,
    context: OrgContext,
    Json(payload): Json<UpdateSettingsRequest>,
) -> Result<Json<OrganizationSettingsResponse>, AppError> {
    Ok(Json(settings_service::update_settings(
        &state, &context, payload,
    )?))
}
