use utoipa::OpenApi;

#[derive(OpenApi)]
/// Aggregated OpenAPI specification for the signage backend.
#[openapi(
    paths(
        crate::routes::health::healthcheck,
        crate::routes::pairing::generate_code,
        crate::routes::pairing::verify_code,
        crate::routes::pairing::pairing_status,
        crate::routes::players::list_players,
        crate::routes::players::get_player,
        crate::routes::players::update_player,
        crate::routes::players::delete_player,
        crate::routes::settings::get_settings,
        crate::routes::settings::update_settings,
        crate::routes::sse::presence_stream,
        crate::routes::websocket::ws_handler,
    ),
    components(
        schemas(
            crate::dto::health::HealthResponse,
            crate::dto::pairing::GenerateCodeRequest,
            crate::dto::pairing::GenerateCodeResponse,
            crate::dto::pairing::VerifyRequest,
            crate::dto::pairing::VerifyResponse,
            crate::dto::pairing::PairingStatusResponse,
            crate::dto::players::PlayerSummary,
            crate::dto::players::OfflineAlert,
            crate::dto::players::UpdatePlayerRequest,
            crate::dto::players::DeletePlayerResponse,
            crate::dto::settings::OrganizationSettingsResponse,
            crate::dto::settings::UpdateSettingsRequest,
            crate::dto::sse::Handshake,
            crate::dto::sse::PlayerStatusEvent,
            crate::dto::sse::PairingSuccessEvent,
            crate::dto::ws::DeviceInboundMessage,
            crate::dto::ws::RegisteredAck,
            crate::state::fleet::PlayerStatus,
            crate::config::EscalationStage,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "pairing", description = "Pairing code issuance and redemption"),
        (name = "players", description = "Tenant-scoped player management"),
        (name = "settings", description = "Organization presence settings"),
        (name = "presence", description = "Server-sent presence feed"),
        (name = "devices", description = "WebSocket operations for signage devices"),
    )
)]
pub struct ApiDoc;
