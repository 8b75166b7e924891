//! Which creature has which container open, and where.
//!
//! Each creature addresses its open containers through a small private
//! table of positions (`0..max_open`). The same container may sit at
//! different positions for different creatures. The manager keeps both
//! directions of that mapping; the reverse map is the observer registry
//! that decides who hears about a container's content changes.

use std::collections::BTreeMap;

use ironhold_types::{CreatureId, ItemId};
use tracing::debug;

use crate::error::WorldError;

/// Result of opening a container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Opened {
    /// The position the container now occupies for the creature.
    pub slot: u8,
    /// A different container that was closed to make room.
    pub replaced: Option<ItemId>,
}

/// Open-container bookkeeping for every creature.
#[derive(Debug, Clone)]
pub struct ContainerManager {
    max_open: u8,
    open: BTreeMap<CreatureId, BTreeMap<u8, ItemId>>,
    observers: BTreeMap<ItemId, BTreeMap<CreatureId, u8>>,
}

impl ContainerManager {
    /// A manager allowing `max_open` containers per creature.
    pub const fn new(max_open: u8) -> Self {
        Self {
            max_open,
            open: BTreeMap::new(),
            observers: BTreeMap::new(),
        }
    }

    /// Per-creature limit.
    pub const fn max_open(&self) -> u8 {
        self.max_open
    }

    /// Record `container` as open for `creature`.
    ///
    /// With an explicit `slot`, a different container already there is
    /// closed first. Without one, the lowest free position is used.
    ///
    /// # Errors
    ///
    /// Returns [`WorldError::TooManyOpenContainers`] when `slot` is out of
    /// range or no position is free.
    pub fn open_container(
        &mut self,
        creature: CreatureId,
        container: ItemId,
        slot: Option<u8>,
    ) -> Result<Opened, WorldError> {
        if let Some(existing) = self.slot_of(creature, container) {
            if slot.is_none_or(|wanted| wanted == existing) {
                return Ok(Opened {
                    slot: existing,
                    replaced: None,
                });
            }
            self.close_container(creature, existing);
        }
        let too_many = WorldError::TooManyOpenContainers {
            creature,
            limit: self.max_open,
        };
        let table = self.open.entry(creature).or_default();
        let slot = match slot {
            Some(slot) if slot < self.max_open => slot,
            Some(_) => return Err(too_many),
            None => (0..self.max_open)
                .find(|candidate| !table.contains_key(candidate))
                .ok_or(too_many)?,
        };

        let replaced = match table.insert(slot, container) {
            Some(previous) if previous != container => Some(previous),
            _ => None,
        };
        if let Some(previous) = replaced {
            self.unobserve(previous, creature);
        }

        let observers = self.observers.entry(container).or_default();
        if observers.is_empty() {
            debug!(%container, "container subscribed");
        }
        observers.insert(creature, slot);
        Ok(Opened { slot, replaced })
    }

    /// Close whatever `creature` has open at `slot`.
    pub fn close_container(&mut self, creature: CreatureId, slot: u8) -> Option<ItemId> {
        let table = self.open.get_mut(&creature)?;
        let container = table.remove(&slot)?;
        if table.is_empty() {
            self.open.remove(&creature);
        }
        self.unobserve(container, creature);
        Some(container)
    }

    /// Close every container `creature` has open.
    pub fn close_all_for(&mut self, creature: CreatureId) -> Vec<(u8, ItemId)> {
        let Some(table) = self.open.remove(&creature) else {
            return Vec::new();
        };
        for container in table.values() {
            self.unobserve(*container, creature);
        }
        table.into_iter().collect()
    }

    /// Close `container` for everyone observing it.
    pub fn close_everywhere(&mut self, container: ItemId) -> Vec<(CreatureId, u8)> {
        let observers: Vec<(CreatureId, u8)> = self.observers_of(container).collect();
        for (creature, slot) in &observers {
            self.close_container(*creature, *slot);
        }
        observers
    }

    /// The container at `slot` for `creature`.
    pub fn container_at(&self, creature: CreatureId, slot: u8) -> Option<ItemId> {
        self.open.get(&creature)?.get(&slot).copied()
    }

    /// The position of `container` for `creature`.
    pub fn slot_of(&self, creature: CreatureId, container: ItemId) -> Option<u8> {
        self.observers.get(&container)?.get(&creature).copied()
    }

    /// Everything `creature` has open.
    pub fn open_for(&self, creature: CreatureId) -> Vec<(u8, ItemId)> {
        self.open
            .get(&creature)
            .map(|table| table.iter().map(|(slot, id)| (*slot, *id)).collect())
            .unwrap_or_default()
    }

    /// Observers of `container` with their positions.
    pub fn observers_of(&self, container: ItemId) -> impl Iterator<Item = (CreatureId, u8)> + '_ {
        self.observers
            .get(&container)
            .into_iter()
            .flat_map(|observers| observers.iter().map(|(creature, slot)| (*creature, *slot)))
    }

    /// Containers with at least one observer.
    pub fn observed_containers(&self) -> Vec<ItemId> {
        self.observers.keys().copied().collect()
    }

    /// Whether anyone has `container` open.
    pub fn is_observed(&self, container: ItemId) -> bool {
        self.observers.contains_key(&container)
    }

    fn unobserve(&mut self, container: ItemId, creature: CreatureId) {
        if let Some(observers) = self.observers.get_mut(&container) {
            observers.remove(&creature);
            if observers.is_empty() {
                self.observers.remove(&container);
                debug!(%container, "container unsubscribed");
            }
        }
    }
}

impl Default for ContainerManager {
    fn default() -> Self {
        Self::new(16)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn first_free_slot_is_used() {
        let mut manager = ContainerManager::new(2);
        let a = ItemId::new();
        let b = ItemId::new();
        assert_eq!(manager.open_container(CreatureId(1), a, None).unwrap().slot, 0);
        assert_eq!(manager.open_container(CreatureId(1), b, None).unwrap().slot, 1);
        assert!(manager.open_container(CreatureId(1), ItemId::new(), None).is_err());
    }

    #[test]
    fn opening_at_taken_slot_closes_previous() {
        let mut manager = ContainerManager::new(4);
        let a = ItemId::new();
        let b = ItemId::new();
        manager.open_container(CreatureId(1), a, Some(0)).unwrap();
        let opened = manager.open_container(CreatureId(1), b, Some(0)).unwrap();
        assert_eq!(opened.replaced, Some(a));
        assert!(!manager.is_observed(a));
        assert_eq!(manager.container_at(CreatureId(1), 0), Some(b));
    }

    #[test]
    fn same_container_different_positions_per_creature() {
        let mut manager = ContainerManager::new(4);
        let chest = ItemId::new();
        manager.open_container(CreatureId(1), ItemId::new(), None).unwrap();
        manager.open_container(CreatureId(1), chest, None).unwrap();
        manager.open_container(CreatureId(2), chest, None).unwrap();
        assert_eq!(manager.slot_of(CreatureId(1), chest), Some(1));
        assert_eq!(manager.slot_of(CreatureId(2), chest), Some(0));
        assert_eq!(manager.observers_of(chest).count(), 2);
    }

    #[test]
    fn last_observer_unsubscribes() {
        let mut manager = ContainerManager::new(4);
        let chest = ItemId::new();
        manager.open_container(CreatureId(1), chest, None).unwrap();
        manager.open_container(CreatureId(2), chest, None).unwrap();
        manager.close_container(CreatureId(1), 0);
        assert!(manager.is_observed(chest));
        manager.close_all_for(CreatureId(2));
        assert!(!manager.is_observed(chest));
        assert!(manager.open_for(CreatureId(2)).is_empty());
    }

    #[test]
    fn close_everywhere_reports_positions() {
        let mut manager = ContainerManager::new(4);
        let chest = ItemId::new();
        manager.open_container(CreatureId(1), chest, Some(3)).unwrap();
        manager.open_container(CreatureId(2), chest, Some(1)).unwrap();
        let closed = manager.close_everywhere(chest);
        assert_eq!(closed, vec![(CreatureId(1), 3), (CreatureId(2), 1)]);
        assert!(!manager.is_observed(chest));
    }
}
