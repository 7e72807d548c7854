use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    context::OrgContext,
    dto::players::{DeletePlayerResponse, PlayerSummary, UpdatePlayerRequest},
    error::AppError,
    services::player_service,
    state::SharedState,
};

/// Tenant-scoped player management routes.
pub fn router() -> Router<SharedState> {
    Router::<SharedState>::new()
        .route("/api/players", get(list_players))
        .route(
            "/api/players/{id}",
            get(get_player)
                .patch(update_player)
                .delete(delete_player),
        )
}

/// List the organization's players with derived presence.
#[utoipa::path(
    get,
    path = "/api/players",
    tag = "players",
    params(("x-organization-id" = String, Header, description = "Calling organization")),
    responses((status = 200, description = "Players, newest first", body = [PlayerSummary]))
)]
pub async fn list_players(
    State(state): State<SharedState>,
    context: OrgContext,
) -> Json<Vec<PlayerSummary>> {
    Json(player_service::list_players(&state, &context))
}

/// Fetch a single player.
#[utoipa::path(
    get,
    path = "/api/players/{id}",
    tag = "players",
    params(
        ("x-organization-id" = String, Header, description = "Calling organization"),
        ("id" = Uuid, Path, description = "Player identifier")
    ),
    responses(
        (status = 200, description = "Player found", body = PlayerSummary),
        (status = 404, description = "Player not found")
    )
)]
pub async fn get_player(
    State(state): State<SharedState>,
    context: OrgContext,
    Path(id): Path<Uuid>,
) -> Result<Json<PlayerSummary>, AppError> {
    Ok(Json(player_service::get_player(&state, &context, id)?))
}

/// Update a player's name or group assignment.
#[utoipa::path(
    patch,
    path = "/api/players/{id}",
    tag = "players",
    params(
        ("x-organization-id" = String, Header, description = "Calling organization"),
        ("id" = Uuid, Path, description = "Player identifier")
    ),
    request_body = UpdatePlayerRequest,
    responses(
        (status = 200, description = "Player updated", body = PlayerSummary),
        (status = 404, description = "Player not found")
    )
)]
pub async fn update_player(
    State(state): State<SharedState>,
    context: OrgContext,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlayerRequest>,
) -> Result<Json<PlayerSummary>, AppError> {
    Ok(Json(player_service::update_player(
        &state, &context, id, payload,
    )?))
}

/// Remove a player from the fleet.
#[utoipa::path(
    delete,
    path = "/api/players/{id}",
    tag = "players",
    params(
        ("x-organization-id" = String, Header, description = "Calling organization"),
        ("id" = Uuid, Path, description = "Player identifier")
    ),
    responses(
        (status = 200, description = "Player deleted", body = DeletePlayerResponse),
        (status = 404, description = "Player not found")
    )
)]
pub async fn delete_player(
    State(state): State<SharedState>,
    context: OrgContext,
    Path(id): Path<Uuid>,
) -> Result<Json<DeletePlayerResponse>, AppError> {
    Ok(Json(player_service::delete_player(&state, &context, id)?))
}
