use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

/// Presence-related settings of an organization.
#[derive(Debug, Serialize, ToSchema)]
pub struct OrganizationSettingsResponse {
    /// Minutes of silence after which a player counts as offline.
    pub offline_threshold_minutes: u32,
}

/// Partial update of an organization's presence settings.
#[derive(Debug, Deserialize, ToSchema, Validate)]
pub struct UpdateSettingsRequest {
    /// New offline threshold; the dashboard slider allows 1 to 60 minutes.
    #[validate(range(min = 1, max = 60))]
    pub offline_threshold_minutes: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_bounds_are_enforced() {
        assert!(
            UpdateSettingsRequest {
                offline_threshold_minutes: 0
            }
            .validate()
            .is_err()
        );
        assert!(
            UpdateSettingsRequest {
                offline_threshold_minutes: 1
            }
            .validate()
            .is_ok()
        );
        assert!(
            UpdateSettingsRequest {
                offline_threshold_minutes: 60
            }
            .validate()
            .is_ok()
        );
        assert!(
            UpdateSettingsRequest {
                offline_threshold_minutes: 61
            }
            .validate()
            .is_err()
        );
    }
}
