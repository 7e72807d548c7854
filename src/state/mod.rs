pub mod fleet;
pub mod sse;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::config::{AppConfig, DEFAULT_OFFLINE_THRESHOLD_MINUTES};

pub use self::fleet::FleetRegistry;
pub use self::sse::SseHub;

/// Shared handle to the application state.
pub type SharedState = Arc<AppState>;

/// Broadcast channel capacity for the presence feed.
const PRESENCE_HUB_CAPACITY: usize = 64;

#[derive(Clone)]
/// Handle used to push messages to a connected device socket.
pub struct DeviceConnection {
    /// Identifies this particular socket so a superseded connection cannot
    /// clear presence claimed by a newer one for the same serial.
    pub conn_id: Uuid,
    /// Registry id of the player behind this socket.
    pub player_id: Uuid,
    /// Outbound channel feeding the socket's writer task.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Per-organization presence configuration.
#[derive(Debug, Clone, Copy)]
pub struct PresenceConfig {
    /// Minutes of silence after which a player counts as offline.
    pub offline_threshold_minutes: u32,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            offline_threshold_minutes: DEFAULT_OFFLINE_THRESHOLD_MINUTES,
        }
    }
}

/// Central application state storing the fleet registry, live device
/// connections, per-organization settings, and the presence feed hub.
pub struct AppState {
    config: AppConfig,
    fleet: FleetRegistry,
    presence_configs: DashMap<String, PresenceConfig>,
    devices: DashMap<String, DeviceConnection>,
    sse: SseHub,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    pub fn new(config: AppConfig) -> SharedState {
        Arc::new(Self {
            config,
            fleet: FleetRegistry::new(),
            presence_configs: DashMap::new(),
            devices: DashMap::new(),
            sse: SseHub::new(PRESENCE_HUB_CAPACITY),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// The in-memory player registry.
    pub fn fleet(&self) -> &FleetRegistry {
        &self.fleet
    }

    /// Registry of live device sockets keyed by CPU serial.
    pub fn devices(&self) -> &DashMap<String, DeviceConnection> {
        &self.devices
    }

    /// Broadcast hub feeding the presence SSE stream.
    pub fn presence_hub(&self) -> &SseHub {
        &self.sse
    }

    /// Presence configuration for an organization, creating the default entry
    /// on first access.
    pub fn presence_config(&self, organization_id: &str) -> PresenceConfig {
        *self
            .presence_configs
            .entry(organization_id.to_string())
            .or_default()
    }

    /// Replace the presence configuration for an organization.
    pub fn set_presence_config(&self, organization_id: &str, config: PresenceConfig) {
        self.presence_configs
            .insert(organization_id.to_string(), config);
    }
}
