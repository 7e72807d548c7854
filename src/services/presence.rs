//! Offline threshold evaluation: deriving a player's presence from its
//! last-seen timestamp and the organization's configured threshold.

use std::time::{Duration, SystemTime};

use crate::{
    config::{AppConfig, DEFAULT_OFFLINE_THRESHOLD_MINUTES},
    dto::players::{OfflineAlert, PlayerSummary},
    state::{SharedState, fleet::{Player, PlayerStatus}},
};

/// Turn a stored threshold setting into a duration, falling back to the
/// default when the value is non-positive.
///
/// Misconfiguration must never flip an entire fleet offline, so a bad value
/// is silently replaced rather than propagated.
pub fn effective_threshold(offline_threshold_minutes: u32) -> Duration {
    let minutes = if offline_threshold_minutes == 0 {
        DEFAULT_OFFLINE_THRESHOLD_MINUTES
    } else {
        offline_threshold_minutes
    };
    Duration::from_secs(u64::from(minutes) * 60)
}

/// Classify a player as online or offline given its last contact.
///
/// A player with no recorded contact at all is offline; otherwise it is
/// online exactly while `now - last_seen <= threshold`.
pub fn classify(
    last_seen: Option<SystemTime>,
    threshold: Duration,
    now: SystemTime,
) -> PlayerStatus {
    match last_seen {
        Some(seen) => match now.duration_since(seen) {
            Ok(elapsed) if elapsed <= threshold => PlayerStatus::Online,
            // A last_seen in the future means clock skew between evaluation
            // sites; treat it as fresh contact.
            Err(_) => PlayerStatus::Online,
            Ok(_) => PlayerStatus::Offline,
        },
        None => PlayerStatus::Offline,
    }
}

/// How long the player has been silent, measured from its last contact or,
/// for a device never heard from, from its creation.
pub fn offline_for(player: &Player, now: SystemTime) -> Duration {
    let reference = player.last_seen.unwrap_or(player.created_at);
    now.duration_since(reference).unwrap_or(Duration::ZERO)
}

/// Build the API summary for a player with freshly derived status and, when
/// offline, the escalation alert for the elapsed silence.
///
/// Listing always re-derives status from `last_seen`, so the most recent
/// signal (heartbeat or sweep) wins over any stale stored value.
pub fn decorate(state: &SharedState, player: &Player, now: SystemTime) -> PlayerSummary {
    let threshold = threshold_for(state, player);
    let status = classify(player.last_seen, threshold, now);

    let mut summary = PlayerSummary::from_record(player);
    summary.status = status;
    if status == PlayerStatus::Offline {
        summary.alert = Some(alert_for(state.config(), offline_for(player, now)));
    }
    summary
}

/// Build the summary embedded in a `player:status` push event.
///
/// Unlike [`decorate`], this carries the status just stored for the
/// transition: a disconnect flips a freshly seen player offline, and
/// re-deriving from `last_seen` would undo that.
pub fn event_summary(state: &SharedState, player: &Player, now: SystemTime) -> PlayerSummary {
    let mut summary = PlayerSummary::from_record(player);
    if player.status == PlayerStatus::Offline {
        summary.alert = Some(alert_for(state.config(), offline_for(player, now)));
    }
    summary
}

/// Resolve the offline threshold applying to a player via its organization's
/// presence configuration; unpaired devices use the default.
pub fn threshold_for(state: &SharedState, player: &Player) -> Duration {
    let minutes = player
        .organization_id
        .as_deref()
        .map(|org| state.presence_config(org).offline_threshold_minutes)
        .unwrap_or(DEFAULT_OFFLINE_THRESHOLD_MINUTES);
    effective_threshold(minutes)
}

/// Map elapsed offline time onto the configured escalation template.
fn alert_for(config: &AppConfig, offline_for: Duration) -> OfflineAlert {
    let (stage, entry) = config.escalation_stage(offline_for);
    OfflineAlert {
        stage,
        color: entry.color.clone(),
        animation: entry.animation.clone(),
    }
}
