use serde::Serialize;
use utoipa::ToSchema;

/// Simple health response returned by the `/api/health` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status, always "ok" while the process is serving.
    pub status: String,
    /// RFC 3339 timestamp of the response.
    pub timestamp: String,
    /// Number of device sockets currently connected.
    pub connected_devices: usize,
}
