//! Tenant-scoped player listing and management.

use std::time::SystemTime;

use uuid::Uuid;
use validator::Validate;

use crate::{
    context::OrgContext,
    dto::players::{DeletePlayerResponse, PlayerSummary, UpdatePlayerRequest},
    error::ServiceError,
    services::presence,
    state::{SharedState, fleet::Player},
};

/// Fetch a player, treating cross-tenant ids the same as unknown ids.
fn scoped_player(
    state: &SharedState,
    context: &OrgContext,
    id: Uuid,
) -> Result<Player, ServiceError> {
    state
        .fleet()
        .get(id)
        .filter(|player| player.organization_id.as_deref() == Some(&context.organization_id))
        .ok_or_else(|| ServiceError::NotFound("Player not found".into()))
}

/// List the organization's players, newest first, with derived status and
/// escalation alerts. This is the baseline fetch behind the presence feed.
pub fn list_players(state: &SharedState, context: &OrgContext) -> Vec<PlayerSummary> {
    let now = SystemTime::now();
    state
        .fleet()
        .list_for_organization(&context.organization_id)
        .iter()
        .map(|player| presence::decorate(state, player, now))
        .collect()
}

/// Fetch a single player by id.
pub fn get_player(
    state: &SharedState,
    context: &OrgContext,
    id: Uuid,
) -> Result<PlayerSummary, ServiceError> {
    let player = scoped_player(state, context, id)?;
    Ok(presence::decorate(state, &player, SystemTime::now()))
}

/// Apply an operator edit to a player's name or group assignment.
pub fn update_player(
    state: &SharedState,
    context: &OrgContext,
    id: Uuid,
    payload: UpdatePlayerRequest,
) -> Result<PlayerSummary, ServiceError> {
    payload.validate()?;
    scoped_player(state, context, id)?;

    let updated = state
        .fleet()
        .update(id, |player| {
            if let Some(name) = &payload.name {
                player.name = name.clone();
            }
            if let Some(group_id) = &payload.group_id {
                player.group_id = group_id.clone();
            }
        })
        .ok_or_else(|| ServiceError::NotFound("Player not found".into()))?;

    Ok(presence::decorate(state, &updated, SystemTime::now()))
}

/// Remove a player from the registry.
pub fn delete_player(
    state: &SharedState,
    context: &OrgContext,
    id: Uuid,
) -> Result<DeletePlayerResponse, ServiceError> {
    scoped_player(state, context, id)?;
    state.fleet().remove(id);
    Ok(DeletePlayerResponse { success: true })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::{
        config::AppConfig,
        state::{AppState, PresenceConfig, fleet::PlayerStatus},
    };

    fn test_state() -> SharedState {
        AppState::new(AppConfig::default())
    }

    fn org(id: &str) -> OrgContext {
        OrgContext {
            organization_id: id.to_string(),
        }
    }

    fn seed_player(state: &SharedState, organization: &str, last_seen_minutes_ago: Option<u64>) -> Uuid {
        let now = SystemTime::now();
        let id = Uuid::new_v4();
        state.fleet().insert(Player {
            id,
            name: "Screen".into(),
            cpu_serial: id.simple().to_string(),
            device_uuid: id.to_string(),
            organization_id: Some(organization.into()),
            group_id: None,
            status: PlayerStatus::Offline,
            last_seen: last_seen_minutes_ago.map(|m| now - Duration::from_secs(m * 60)),
            paired_at: Some(now),
            created_at: now,
            pairing_code: None,
            pairing_code_expires_at: None,
        });
        id
    }

    #[test]
    fn listing_derives_status_from_last_seen() {
        let state = test_state();
        seed_player(&state, "org-1", Some(1));
        seed_player(&state, "org-1", Some(45));

        let listed = list_players(&state, &org("org-1"));
        assert_eq!(listed.len(), 2);

        let online: Vec<_> = listed
            .iter()
            .filter(|p| p.status == PlayerStatus::Online)
            .collect();
        assert_eq!(online.len(), 1);

        let offline = listed
            .iter()
            .find(|p| p.status == PlayerStatus::Offline)
            .expect("one player is offline");
        // 45 minutes of silence sits in the second escalation band.
        assert_eq!(offline.alert.as_ref().expect("alert attached").stage, 1);
    }

    #[test]
    fn listing_honors_the_organization_threshold() {
        let state = test_state();
        seed_player(&state, "org-1", Some(10));
        state.set_presence_config(
            "org-1",
            PresenceConfig {
                offline_threshold_minutes: 30,
            },
        );

        let listed = list_players(&state, &org("org-1"));
        assert_eq!(listed[0].status, PlayerStatus::Online);
    }

    #[test]
    fn cross_tenant_access_behaves_as_not_found() {
        let state = test_state();
        let id = seed_player(&state, "org-1", None);

        let err = get_player(&state, &org("org-2"), id).expect_err("scoped out");
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = delete_player(&state, &org("org-2"), id).expect_err("scoped out");
        assert!(matches!(err, ServiceError::NotFound(_)));
        assert!(state.fleet().get(id).is_some());
    }

    #[test]
    fn update_edits_name_and_clears_group() {
        let state = test_state();
        let id = seed_player(&state, "org-1", None);
        state.fleet().update(id, |player| player.group_id = Some("group-a".into()));

        let updated = update_player(
            &state,
            &org("org-1"),
            id,
            UpdatePlayerRequest {
                name: Some("Lobby".into()),
                group_id: Some(None),
            },
        )
        .expect("update succeeds");

        assert_eq!(updated.name, "Lobby");
        assert!(updated.group_id.is_none());
    }
}
