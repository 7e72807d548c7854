//! Per-organization presence settings.

use validator::Validate;

use crate::{
    context::OrgContext,
    dto::settings::{OrganizationSettingsResponse, UpdateSettingsRequest},
    error::ServiceError,
    state::{PresenceConfig, SharedState},
};

/// Return the organization's presence settings, materializing the default
/// entry on first read.
pub fn get_settings(state: &SharedState, context: &OrgContext) -> OrganizationSettingsResponse {
    let config = state.presence_config(&context.organization_id);
    OrganizationSettingsResponse {
        offline_threshold_minutes: config.offline_threshold_minutes,
    }
}

/// Replace the organization's offline threshold.
///
/// The range mirrors the dashboard slider (1 to 60 minutes); values outside
/// it are rejected rather than clamped.
pub fn update_settings(
    state: &SharedState,
    context: &OrgContext,
    payload: UpdateSettingsRequest,
) -> Result<OrganizationSettingsResponse, ServiceError> {
    payload.validate()?;

    state.set_presence_config(
        &context.organization_id,
        PresenceConfig {
            offline_threshold_minutes: payload.offline_threshold_minutes,
        },
    );

    Ok(OrganizationSettingsResponse {
        offline_threshold_minutes: payload.offline_threshold_minutes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{config::AppConfig, state::AppState};

    fn org(id: &str) -> OrgContext {
        OrgContext {
            organization_id: id.to_string(),
        }
    }

    #[test]
    fn first_read_returns_the_default_threshold() {
        let state = AppState::new(AppConfig::default());
        let settings = get_settings(&state, &org("org-1"));
        assert_eq!(settings.offline_threshold_minutes, 5);
    }

    #[test]
    fn update_persists_and_is_organization_scoped() {
        let state = AppState::new(AppConfig::default());
        update_settings(
            &state,
            &org("org-1"),
            UpdateSettingsRequest {
                offline_threshold_minutes: 30,
            },
        )
        .expect("valid threshold");

        assert_eq!(get_settings(&state, &org("org-1")).offline_threshold_minutes, 30);
        assert_eq!(get_settings(&state, &org("org-2")).offline_threshold_minutes, 5);
    }

    #[test]
    fn out_of_range_threshold_is_rejected() {
        let state = AppState::new(AppConfig::default());
        let err = update_settings(
            &state,
            &org("org-1"),
            UpdateSettingsRequest {
                offline_threshold_minutes: 61,
            },
        )
        .expect_err("above the slider maximum");
        assert!(matches!(err, ServiceError::InvalidInput(_)));
        assert_eq!(get_settings(&state, &org("org-1")).offline_threshold_minutes, 5);
    }
}
