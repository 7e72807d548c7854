use std::time::SystemTime;

use crate::{dto::{format_system_time, health::HealthResponse}, state::SharedState};

/// Build the health payload, including the live device connection count.
pub fn health_status(state: &SharedState) -> HealthResponse {
    HealthResponse {
        status: "ok".into(),
        timestamp: format_system_time(SystemTime::now()),
        connected_devices: state.devices().len(),
    }
}
