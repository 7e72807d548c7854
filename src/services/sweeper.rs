//! Background task that applies the offline threshold to the whole fleet.
//!
//! Heartbeats flip players online; silence only becomes visible when someone
//! looks. The sweeper looks on a fixed interval so dashboards receive an
//! offline transition event close to when the threshold is actually crossed,
//! not on the next page load.

use std::time::SystemTime;

use tokio::time::sleep;
use tracing::{debug, info};

use crate::{
    services::{presence, sse_events},
    state::{SharedState, fleet::PlayerStatus},
};

/// Periodically re-evaluate every player against its organization's offline
/// threshold. Runs until the process shuts down.
pub async fn run_offline_sweeper(state: SharedState) {
    let interval = state.config().sweep_interval();
    info!(interval_secs = interval.as_secs(), "offline sweeper started");

    loop {
        sleep(interval).await;
        let flipped = sweep(&state);
        if flipped > 0 {
            debug!(flipped, "sweeper marked players offline");
        }
    }
}

/// One sweeper pass: flip every online player whose silence exceeds its
/// threshold, broadcasting each transition. Returns how many players flipped.
pub fn sweep(state: &SharedState) -> usize {
    let now = SystemTime::now();
    let mut flipped = Vec::new();

    // Collect ids first so registry mutation never runs under an iterator's
    // shard lock.
    for id in state.fleet().ids() {
        let Some(player) = state.fleet().get(id) else {
            continue;
        };
        if player.status != PlayerStatus::Online {
            continue;
        }

        let threshold = presence::threshold_for(state, &player);
        if presence::classify(player.last_seen, threshold, now) == PlayerStatus::Offline
            && let Some(updated) = state
                .fleet()
                .update(id, |player| player.status = PlayerStatus::Offline)
        {
            flipped.push(updated);
        }
    }

    let count = flipped.len();
    for player in flipped {
        sse_events::broadcast_player_status(state, presence::event_summary(state, &player, now));
    }
    count
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        state::{AppState, PresenceConfig, fleet::Player},
    };

    fn online_player(organization: &str, last_seen_minutes_ago: u64) -> Player {
        let now = SystemTime::now();
        let id = Uuid::new_v4();
        Player {
            id,
            name: "Screen".into(),
            cpu_serial: id.simple().to_string(),
            device_uuid: id.to_string(),
            organization_id: Some(organization.into()),
            group_id: None,
            status: PlayerStatus::Online,
            last_seen: Some(now - Duration::from_secs(last_seen_minutes_ago * 60)),
            paired_at: Some(now),
            created_at: now,
            pairing_code: None,
            pairing_code_expires_at: None,
        }
    }

    #[test]
    fn sweep_flips_only_players_past_their_threshold() {
        let state = AppState::new(AppConfig::default());
        let stale = online_player("org-1", 10);
        let fresh = online_player("org-1", 1);
        let stale_id = stale.id;
        let fresh_id = fresh.id;
        state.fleet().insert(stale);
        state.fleet().insert(fresh);

        assert_eq!(sweep(&state), 1);
        assert_eq!(
            state.fleet().get(stale_id).expect("exists").status,
            PlayerStatus::Offline
        );
        assert_eq!(
            state.fleet().get(fresh_id).expect("exists").status,
            PlayerStatus::Online
        );

        // Already-offline players do not flip again.
        assert_eq!(sweep(&state), 0);
    }

    #[test]
    fn sweep_pushes_a_status_event_per_flipped_player() {
        let state = AppState::new(AppConfig::default());
        let mut receiver = state.presence_hub().subscribe();
        state.fleet().insert(online_player("org-1", 10));

        assert_eq!(sweep(&state), 1);

        let event = receiver.try_recv().expect("one event dispatched");
        assert_eq!(event.event.as_deref(), Some("player:status"));
        assert!(event.data.contains("\"offline\""));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn sweep_uses_the_organization_threshold() {
        let state = AppState::new(AppConfig::default());
        state.set_presence_config(
            "org-1",
            PresenceConfig {
                offline_threshold_minutes: 30,
            },
        );
        let player = online_player("org-1", 10);
        let id = player.id;
        state.fleet().insert(player);

        assert_eq!(sweep(&state), 0);
        assert_eq!(
            state.fleet().get(id).expect("exists").status,
            PlayerStatus::Online
        );
    }
}
