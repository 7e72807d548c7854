/// OpenAPI documentation generation.
pub mod documentation;
/// Health check service.
pub mod health_service;
/// Pairing code issuance and redemption.
pub mod pairing_service;
/// Tenant-scoped player listing and management.
pub mod player_service;
/// Offline threshold evaluation and presence derivation.
pub mod presence;
/// Per-organization presence settings.
pub mod settings_service;
/// Presence feed event construction and broadcasting.
pub mod sse_events;
/// Server-Sent Events stream plumbing.
pub mod sse_service;
/// Background offline sweeper.
pub mod sweeper;
/// Device WebSocket connection and message handling.
pub mod websocket_service;
