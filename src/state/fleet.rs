//! In-memory fleet registry holding every known signage player.

use std::time::SystemTime;

use dashmap::{DashMap, mapref::entry::Entry};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

/// Derived online/offline presence of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum PlayerStatus {
    /// The player has been heard from within its organization's threshold.
    Online,
    /// The player is silent, or has never been heard from.
    Offline,
}

/// A signage player known to the registry, paired or still awaiting pairing.
#[derive(Debug, Clone)]
pub struct Player {
    /// Stable identifier assigned at first contact.
    pub id: Uuid,
    /// Display name; defaults to `Device <code>` until pairing renames it.
    pub name: String,
    /// CPU serial reported by the device hardware.
    pub cpu_serial: String,
    /// Software-generated device UUID, used by the device to poll pairing status.
    pub device_uuid: String,
    /// Owning organization; `None` until the device is paired.
    pub organization_id: Option<String>,
    /// Optional player group assignment.
    pub group_id: Option<String>,
    /// Last presence classification pushed or derived for this player.
    pub status: PlayerStatus,
    /// Timestamp of the most recent registration or heartbeat.
    pub last_seen: Option<SystemTime>,
    /// When the device was bound to its organization.
    pub paired_at: Option<SystemTime>,
    /// When the record was created.
    pub created_at: SystemTime,
    /// Outstanding pairing code, cleared on successful verification.
    pub pairing_code: Option<String>,
    /// Expiry of the outstanding pairing code.
    pub pairing_code_expires_at: Option<SystemTime>,
}

impl Player {
    /// Whether this player has completed the pairing exchange.
    pub fn is_paired(&self) -> bool {
        self.organization_id.is_some() && self.paired_at.is_some()
    }
}

/// Registry of all players, keyed by player id.
///
/// The relational store of the wider platform is an external system; this
/// registry is the authoritative in-process view the pairing and presence
/// services operate on.
#[derive(Default)]
pub struct FleetRegistry {
    players: DashMap<Uuid, Player>,
    /// CPU serial to player id, so admission of a new serial is atomic.
    serial_index: DashMap<String, Uuid>,
}

impl FleetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a freshly created player record.
    pub fn insert(&self, player: Player) {
        let serial = player.cpu_serial.clone();
        let id = player.id;
        self.players.insert(id, player);
        self.serial_index.insert(serial, id);
    }

    /// Insert `player` as a newly discovered device.
    ///
    /// If another record already claims the same CPU serial the insert is
    /// abandoned and the surviving record is returned instead, so concurrent
    /// first contacts for one device converge on a single record.
    pub fn insert_new_device(&self, player: Player) -> Result<Player, Player> {
        match self.serial_index.entry(player.cpu_serial.clone()) {
            Entry::Occupied(mut slot) => match self.get(*slot.get()) {
                Some(existing) => Err(existing),
                // Stale index entry left behind by a raced removal.
                None => {
                    slot.insert(player.id);
                    self.players.insert(player.id, player.clone());
                    Ok(player)
                }
            },
            Entry::Vacant(slot) => {
                self.players.insert(player.id, player.clone());
                slot.insert(player.id);
                Ok(player)
            }
        }
    }

    /// Clone the player with the given id, if known.
    pub fn get(&self, id: Uuid) -> Option<Player> {
        self.players.get(&id).map(|entry| entry.value().clone())
    }

    /// Clone the player matching either the CPU serial or the device UUID.
    pub fn find_by_device(&self, cpu_serial: &str, device_uuid: &str) -> Option<Player> {
        self.players
            .iter()
            .find(|entry| {
                entry.cpu_serial == cpu_serial || entry.device_uuid == device_uuid
            })
            .map(|entry| entry.value().clone())
    }

    /// Clone the player matching the given CPU serial.
    pub fn find_by_serial(&self, cpu_serial: &str) -> Option<Player> {
        self.players
            .iter()
            .find(|entry| entry.cpu_serial == cpu_serial)
            .map(|entry| entry.value().clone())
    }

    /// Clone the player matching the given device UUID.
    pub fn find_by_device_uuid(&self, device_uuid: &str) -> Option<Player> {
        self.players
            .iter()
            .find(|entry| entry.device_uuid == device_uuid)
            .map(|entry| entry.value().clone())
    }

    /// Clone the player holding the given (already normalized) pairing code.
    pub fn find_by_pairing_code(&self, code: &str) -> Option<Player> {
        self.players
            .iter()
            .find(|entry| entry.pairing_code.as_deref() == Some(code))
            .map(|entry| entry.value().clone())
    }

    /// Players belonging to `organization_id`, newest first.
    pub fn list_for_organization(&self, organization_id: &str) -> Vec<Player> {
        let mut players: Vec<Player> = self
            .players
            .iter()
            .filter(|entry| entry.organization_id.as_deref() == Some(organization_id))
            .map(|entry| entry.value().clone())
            .collect();
        players.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        players
    }

    /// Ids of every registered player. Used by the sweeper so mutation never
    /// happens while an iterator holds shard locks.
    pub fn ids(&self) -> Vec<Uuid> {
        self.players.iter().map(|entry| *entry.key()).collect()
    }

    /// Apply `mutate` to the player with the given id, returning the updated clone.
    pub fn update<F>(&self, id: Uuid, mutate: F) -> Option<Player>
    where
        F: FnOnce(&mut Player),
    {
        self.players.get_mut(&id).map(|mut entry| {
            mutate(entry.value_mut());
            entry.value().clone()
        })
    }

    /// Check-and-mutate the player with the given id under its entry lock.
    ///
    /// `mutate` re-checks its preconditions against the live record and
    /// rejects the update by returning an error before touching it; lookups
    /// made outside the lock hand back stale clones.
    pub fn try_update<F, E>(&self, id: Uuid, mutate: F) -> Option<Result<Player, E>>
    where
        F: FnOnce(&mut Player) -> Result<(), E>,
    {
        self.players.get_mut(&id).map(|mut entry| {
            mutate(entry.value_mut()).map(|()| entry.value().clone())
        })
    }

    /// Remove the player with the given id, returning the removed record.
    pub fn remove(&self, id: Uuid) -> Option<Player> {
        self.players.remove(&id).map(|(_, player)| {
            self.serial_index
                .remove_if(&player.cpu_serial, |_, indexed| *indexed == id);
            player
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_player(serial: &str, organization: Option<&str>) -> Player {
        Player {
            id: Uuid::new_v4(),
            name: format!("Player {serial}"),
            cpu_serial: serial.to_string(),
            device_uuid: Uuid::new_v4().to_string(),
            organization_id: organization.map(str::to_string),
            group_id: None,
            status: PlayerStatus::Offline,
            last_seen: None,
            paired_at: organization.map(|_| SystemTime::now()),
            created_at: SystemTime::now(),
            pairing_code: None,
            pairing_code_expires_at: None,
        }
    }

    #[test]
    fn listing_is_scoped_to_the_organization() {
        let registry = FleetRegistry::new();
        registry.insert(sample_player("serial-a", Some("org-1")));
        registry.insert(sample_player("serial-b", Some("org-2")));
        registry.insert(sample_player("serial-c", None));

        let listed = registry.list_for_organization("org-1");
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].cpu_serial, "serial-a");
    }

    #[test]
    fn update_returns_the_mutated_record() {
        let registry = FleetRegistry::new();
        let player = sample_player("serial-a", Some("org-1"));
        let id = player.id;
        registry.insert(player);

        let updated = registry
            .update(id, |player| player.name = "Lobby".into())
            .expect("player exists");
        assert_eq!(updated.name, "Lobby");
        assert_eq!(registry.get(id).expect("still there").name, "Lobby");
    }

    #[test]
    fn admission_keeps_one_record_per_serial() {
        let registry = FleetRegistry::new();
        let first = sample_player("serial-a", None);
        let first_id = first.id;
        registry.insert_new_device(first).expect("first insert wins");

        let second = sample_player("serial-a", None);
        let existing = registry
            .insert_new_device(second)
            .expect_err("duplicate serial is rejected");
        assert_eq!(existing.id, first_id);
        assert_eq!(registry.ids().len(), 1);

        // A removed serial frees the slot for a fresh record.
        registry.remove(first_id);
        let third = sample_player("serial-a", None);
        assert!(registry.insert_new_device(third).is_ok());
    }

    #[test]
    fn try_update_leaves_the_record_untouched_on_rejection() {
        let registry = FleetRegistry::new();
        let player = sample_player("serial-a", None);
        let id = player.id;
        registry.insert(player);

        let rejected: Result<Player, &str> = registry
            .try_update(id, |player| {
                if player.organization_id.is_none() {
                    return Err("unpaired");
                }
                player.name = "Lobby".into();
                Ok(())
            })
            .expect("player exists");
        assert!(rejected.is_err());
        assert_eq!(registry.get(id).expect("still there").name, "Player serial-a");
    }

    #[test]
    fn pairing_code_lookup_ignores_consumed_codes() {
        let registry = FleetRegistry::new();
        let mut player = sample_player("serial-a", None);
        player.pairing_code = Some("ABC234".into());
        let id = player.id;
        registry.insert(player);

        assert!(registry.find_by_pairing_code("ABC234").is_some());
        registry.update(id, |player| player.pairing_code = None);
        assert!(registry.find_by_pairing_code("ABC234").is_none());
    }
}
