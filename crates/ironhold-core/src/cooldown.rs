//! Per-actor exhaustion tracking.
//!
//! A [`CooldownLedger`] records, per [`ExhaustionCategory`], the time at
//! which an actor is free again. The [`CooldownBook`] holds one ledger per
//! actor and is shared between the fire loop (which charges it) and
//! producer handles (which read it), behind an [`RwLock`].

use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use ironhold_types::{CreatureId, ExhaustionCategory, GameTime};

/// When one actor becomes free again, per category.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CooldownLedger {
    ready_at: BTreeMap<ExhaustionCategory, GameTime>,
}

impl CooldownLedger {
    /// An empty ledger.
    pub const fn new() -> Self {
        Self {
            ready_at: BTreeMap::new(),
        }
    }

    /// Time left before `category` is free. Zero once `readyAt` is reached
    /// and for categories never charged.
    pub fn remaining(&self, category: ExhaustionCategory, now: GameTime) -> Duration {
        self.ready_at
            .get(&category)
            .map_or(Duration::ZERO, |ready| now.saturating_duration_until(*ready))
    }

    /// Record that `category` is busy until `now + cost`.
    ///
    /// [`ExhaustionCategory::System`] and zero costs are never recorded.
    pub fn charge(&mut self, category: ExhaustionCategory, now: GameTime, cost: Duration) {
        if category == ExhaustionCategory::System || cost.is_zero() {
            return;
        }
        self.ready_at.insert(category, now.saturating_add(cost));
    }

    /// Drop entries that are no longer in the future.
    pub fn prune(&mut self, now: GameTime) {
        self.ready_at.retain(|_, ready| *ready > now);
    }

    /// Whether no category is pending.
    pub fn is_empty(&self) -> bool {
        self.ready_at.is_empty()
    }
}

/// Ledgers for every actor.
#[derive(Debug, Clone, Default)]
pub struct CooldownBook {
    ledgers: BTreeMap<CreatureId, CooldownLedger>,
}

impl CooldownBook {
    /// An empty book.
    pub const fn new() -> Self {
        Self {
            ledgers: BTreeMap::new(),
        }
    }

    /// Remaining cooldown for `actor` in `category`.
    pub fn remaining(&self, actor: CreatureId, category: ExhaustionCategory, now: GameTime) -> Duration {
        self.ledgers
            .get(&actor)
            .map_or(Duration::ZERO, |ledger| ledger.remaining(category, now))
    }

    /// Charge `actor` for `cost` in `category`.
    pub fn charge(&mut self, actor: CreatureId, category: ExhaustionCategory, now: GameTime, cost: Duration) {
        self.ledgers.entry(actor).or_default().charge(category, now, cost);
    }

    /// Remove every stale entry, and ledgers that become empty.
    pub fn prune(&mut self, now: GameTime) {
        self.ledgers.retain(|_, ledger| {
            ledger.prune(now);
            !ledger.is_empty()
        });
    }

    /// Forget an actor entirely.
    pub fn forget(&mut self, actor: CreatureId) {
        self.ledgers.remove(&actor);
    }

    /// Number of actors with a pending cooldown.
    pub fn len(&self) -> usize {
        self.ledgers.len()
    }

    /// Whether no actor has a pending cooldown.
    pub fn is_empty(&self) -> bool {
        self.ledgers.is_empty()
    }
}

/// A [`CooldownBook`] shared between the fire loop and producer handles.
#[derive(Debug, Clone, Default)]
pub struct SharedCooldowns {
    inner: Arc<RwLock<CooldownBook>>,
}

impl SharedCooldowns {
    /// An empty shared book.
    pub fn new() -> Self {
        Self::default()
    }

    /// Remaining cooldown for `actor` in `category`.
    pub fn remaining(&self, actor: CreatureId, category: ExhaustionCategory, now: GameTime) -> Duration {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .remaining(actor, category, now)
    }

    /// Charge `actor` for `cost` in `category`.
    pub fn charge(&self, actor: CreatureId, category: ExhaustionCategory, now: GameTime, cost: Duration) {
        self.inner
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .charge(actor, category, now, cost);
    }

    /// Drop stale entries.
    pub fn prune(&self, now: GameTime) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).prune(now);
    }

    /// Forget an actor.
    pub fn forget(&self, actor: CreatureId) {
        self.inner.write().unwrap_or_else(PoisonError::into_inner).forget(actor);
    }
}
