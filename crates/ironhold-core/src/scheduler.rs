//! The time-ordered operation queue and its fire loop.
//!
//! The [`Scheduler`] owns every pending [`Operation`] and the simulation
//! clock. Producers on other tasks submit through a cloneable
//! [`SchedulerHandle`]; submissions are queued on a channel and accepted by
//! the loop. Firing is sequential: one operation executes at a time against
//! the world, so operations need no locking.
//!
//! # Ordering
//!
//! Operations fire by due time ascending, first-in first-out among equal
//! times. Every heap entry carries a sequence number; expediting or
//! repeating an operation pushes a fresh entry, and the superseded entry
//! is recognised as stale and skipped. Cancelled operations stay queued
//! until their due time and are dropped unexecuted.

use std::cmp::Reverse;
use std::collections::{BTreeMap, BinaryHeap};
use std::time::Duration;

use ironhold_types::{CreatureId, ExhaustionCategory, GameTime, OperationId, OperationKind};
use ironhold_world::World;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::{debug, error};

use crate::clock::{ClockError, GameClock};
use crate::context::{ElevatedOperationContext, OperationContext, Services};
use crate::cooldown::SharedCooldowns;
use crate::operation::{Effect, Operation, OperationBody};

/// Shortest repeat interval; a zero repeat would refire forever at one instant.
const MIN_REPEAT: Duration = Duration::from_millis(1);

/// Errors from submitting through a [`SchedulerHandle`].
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The scheduler has been dropped.
    #[error("scheduler is no longer running")]
    Closed,
}

// ---------------------------------------------------------------------------
// Queue
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Entry {
    fire_at: GameTime,
    seq: u64,
    id: OperationId,
}

#[derive(Debug)]
struct Pending {
    operation: Operation,
    fire_at: GameTime,
    seq: u64,
}

/// Pending operations ordered by due time.
#[derive(Debug, Default)]
pub(crate) struct Queue {
    heap: BinaryHeap<Reverse<Entry>>,
    pending: BTreeMap<OperationId, Pending>,
    next_seq: u64,
}

impl Queue {
    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        seq
    }

    /// Queue `operation` at exactly `fire_at`.
    fn insert(&mut self, operation: Operation, fire_at: GameTime) -> OperationId {
        let id = operation.id();
        let seq = self.take_seq();
        self.heap.push(Reverse(Entry { fire_at, seq, id }));
        self.pending.insert(id, Pending {
            operation,
            fire_at,
            seq,
        });
        id
    }

    /// Queue `operation` after `delay`, stretched to the requestor's
    /// remaining cooldown in the operation's category.
    pub(crate) fn enqueue(
        &mut self,
        operation: Operation,
        delay: Duration,
        now: GameTime,
        cooldowns: &SharedCooldowns,
    ) -> OperationId {
        let header = operation.header();
        let cooldown = header
            .requestor()
            .map_or(Duration::ZERO, |actor| cooldowns.remaining(actor, header.category(), now));
        let fire_at = now.saturating_add(delay.max(cooldown));
        debug!(
            operation = %header.id(),
            kind = %header.kind(),
            fire_at = %fire_at,
            "operation scheduled"
        );
        self.insert(operation, fire_at)
    }

    /// Remove and return the next operation due at or before `now`.
    fn pop_due(&mut self, now: GameTime) -> Option<Operation> {
        while let Some(Reverse(entry)) = self.heap.peek().copied() {
            if entry.fire_at > now {
                return None;
            }
            self.heap.pop();
            let current = self
                .pending
                .get(&entry.id)
                .is_some_and(|pending| pending.seq == entry.seq);
            if current {
                return self.pending.remove(&entry.id).map(|pending| pending.operation);
            }
        }
        None
    }

    /// Due time of the earliest live entry.
    fn next_due(&mut self) -> Option<GameTime> {
        while let Some(Reverse(entry)) = self.heap.peek().copied() {
            let current = self
                .pending
                .get(&entry.id)
                .is_some_and(|pending| pending.seq == entry.seq);
            if current {
                return Some(entry.fire_at);
            }
            self.heap.pop();
        }
        None
    }

    pub(crate) fn cancel(&self, id: OperationId) -> bool {
        self.pending
            .get(&id)
            .is_some_and(|pending| pending.operation.header().cancel())
    }

    /// Cancel `actor`'s pending operations, optionally only of one kind.
    pub(crate) fn cancel_matching(&self, actor: CreatureId, kind: Option<OperationKind>) -> usize {
        self.pending
            .values()
            .map(|pending| pending.operation.header())
            .filter(|header| {
                header.requestor() == Some(actor)
                    && kind.is_none_or(|kind| header.kind() == kind)
                    && !header.is_cancelled()
            })
            .filter(|header| header.cancel())
            .count()
    }

    pub(crate) fn expedite(&mut self, id: OperationId, now: GameTime) -> bool {
        let seq = self.next_seq;
        let Some(pending) = self.pending.get_mut(&id) else {
            return false;
        };
        if pending.operation.header().is_cancelled() {
            return false;
        }
        if pending.fire_at <= now {
            return true;
        }
        pending.fire_at = now;
        pending.seq = seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.heap.push(Reverse(Entry { fire_at: now, seq, id }));
        debug!(operation = %id, "operation expedited");
        true
    }

    pub(crate) fn is_live(&self, id: OperationId) -> bool {
        self.pending
            .get(&id)
            .is_some_and(|pending| !pending.operation.header().is_cancelled())
    }

    pub(crate) fn fire_time(&self, id: OperationId) -> Option<GameTime> {
        self.pending.get(&id).map(|pending| pending.fire_at)
    }

    fn len(&self) -> usize {
        self.pending.len()
    }
}

// ---------------------------------------------------------------------------
// Submissions
// ---------------------------------------------------------------------------

#[derive(Debug)]
enum Command {
    Schedule { operation: Operation, delay: Duration },
    Cancel(OperationId),
    CancelAllFor { actor: CreatureId, kind: OperationKind },
    Expedite(OperationId),
}

/// Cloneable producer-side access to a [`Scheduler`].
#[derive(Debug, Clone)]
pub struct SchedulerHandle {
    sender: UnboundedSender<Command>,
    clock: GameClock,
    cooldowns: SharedCooldowns,
}

impl SchedulerHandle {
    fn send(&self, command: Command) -> Result<(), SchedulerError> {
        if self.sender.send(command).is_err() {
            return Err(SchedulerError::Closed);
        }
        Ok(())
    }

    /// Submit an operation to fire after `delay` (or the requestor's
    /// remaining cooldown, if longer).
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] if the scheduler is gone.
    pub fn submit(&self, operation: Operation, delay: Duration) -> Result<OperationId, SchedulerError> {
        let id = operation.id();
        self.send(Command::Schedule { operation, delay })?;
        Ok(id)
    }

    /// Ask for one operation to be cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] if the scheduler is gone.
    pub fn cancel(&self, id: OperationId) -> Result<(), SchedulerError> {
        self.send(Command::Cancel(id))
    }

    /// Ask for every pending operation of `kind` by `actor` to be cancelled.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] if the scheduler is gone.
    pub fn cancel_all_for(&self, actor: CreatureId, kind: OperationKind) -> Result<(), SchedulerError> {
        self.send(Command::CancelAllFor { actor, kind })
    }

    /// Ask for an operation to fire now.
    ///
    /// # Errors
    ///
    /// Returns [`SchedulerError::Closed`] if the scheduler is gone.
    pub fn expedite(&self, id: OperationId) -> Result<(), SchedulerError> {
        self.send(Command::Expedite(id))
    }

    /// The current simulation time.
    pub fn now(&self) -> GameTime {
        self.clock.now()
    }

    /// Remaining cooldown of `actor` in `category`.
    pub fn remaining_cooldown(&self, actor: CreatureId, category: ExhaustionCategory) -> Duration {
        self.cooldowns.remaining(actor, category, self.clock.now())
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// What happened when one operation fired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FireRecord {
    /// The operation.
    pub id: OperationId,
    /// Its kind.
    pub kind: OperationKind,
    /// Its requestor.
    pub requestor: Option<CreatureId>,
    /// When it fired.
    pub at: GameTime,
    /// The reported effect, or `None` if `execute` returned an error.
    pub effect: Option<Effect>,
    /// Cooldown charged to the requestor.
    pub charged: Duration,
    /// Whether it was queued to fire again.
    pub repeats: bool,
}

/// The operation queue, clock, and cooldown book.
#[derive(Debug)]
pub struct Scheduler {
    clock: GameClock,
    cooldowns: SharedCooldowns,
    queue: Queue,
    receiver: UnboundedReceiver<Command>,
    sender: UnboundedSender<Command>,
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl Scheduler {
    /// A scheduler whose clock starts at zero.
    pub fn new() -> Self {
        Self::starting_at(GameTime::ZERO)
    }

    /// A scheduler whose clock starts at `start`.
    pub fn starting_at(start: GameTime) -> Self {
        let (sender, receiver) = unbounded_channel();
        Self {
            clock: GameClock::starting_at(start),
            cooldowns: SharedCooldowns::new(),
            queue: Queue::default(),
            receiver,
            sender,
        }
    }

    /// A producer handle.
    pub fn handle(&self) -> SchedulerHandle {
        SchedulerHandle {
            sender: self.sender.clone(),
            clock: self.clock.clone(),
            cooldowns: self.cooldowns.clone(),
        }
    }

    /// The simulation clock.
    pub const fn clock(&self) -> &GameClock {
        &self.clock
    }

    /// The cooldown book.
    pub const fn cooldowns(&self) -> &SharedCooldowns {
        &self.cooldowns
    }

    /// The current simulation time.
    pub fn now(&self) -> GameTime {
        self.clock.now()
    }

    /// Move the clock forward without firing anything.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError::Backwards`] if `target` is in the past.
    pub fn advance_to(&self, target: GameTime) -> Result<GameTime, ClockError> {
        self.clock.advance_to(target)
    }

    /// Queue an operation from the loop's own thread.
    pub fn schedule(&mut self, operation: Operation, delay: Duration) -> OperationId {
        self.queue.enqueue(operation, delay, self.clock.now(), &self.cooldowns)
    }

    /// Cancel one pending operation.
    pub fn cancel(&self, id: OperationId) -> bool {
        self.queue.cancel(id)
    }

    /// Cancel every pending cancellable operation of `kind` by `actor`.
    pub fn cancel_all_for(&self, actor: CreatureId, kind: OperationKind) -> usize {
        self.queue.cancel_matching(actor, Some(kind))
    }

    /// Bring an operation's fire time forward to now.
    pub fn expedite(&mut self, id: OperationId) -> bool {
        self.queue.expedite(id, self.clock.now())
    }

    /// Whether `id` is waiting to fire and not cancelled.
    pub fn is_pending(&self, id: OperationId) -> bool {
        self.queue.is_live(id)
    }

    /// When `id` is due.
    pub fn fire_time(&self, id: OperationId) -> Option<GameTime> {
        self.queue.fire_time(id)
    }

    /// Number of queued operations, cancelled ones included.
    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Due time of the earliest queued operation.
    pub fn next_due(&mut self) -> Option<GameTime> {
        self.queue.next_due()
    }

    fn apply(&mut self, command: Command) {
        match command {
            Command::Schedule { operation, delay } => {
                self.schedule(operation, delay);
            }
            Command::Cancel(id) => {
                self.cancel(id);
            }
            Command::CancelAllFor { actor, kind } => {
                self.cancel_all_for(actor, kind);
            }
            Command::Expedite(id) => {
                self.expedite(id);
            }
        }
    }

    /// Apply every submission waiting on the channel. Returns how many.
    pub fn accept_submissions(&mut self) -> usize {
        let mut accepted: usize = 0;
        while let Ok(command) = self.receiver.try_recv() {
            self.apply(command);
            accepted = accepted.saturating_add(1);
        }
        accepted
    }

    /// Wait for the next submission and apply it.
    ///
    /// The clock first moves to `now()`, capped at the next due operation,
    /// so a delay submitted while the loop slept counts from when it
    /// arrived.
    ///
    /// # Errors
    ///
    /// Returns [`ClockError`] only if the clock is corrupted.
    pub async fn wait_for_submission(&mut self, now: impl FnOnce() -> GameTime) -> Result<(), ClockError> {
        if let Some(command) = self.receiver.recv().await {
            let mut arrived = now().max(self.clock.now());
            if let Some(due) = self.next_due() {
                arrived = arrived.min(due.max(self.clock.now()));
            }
            self.clock.advance_to(arrived)?;
            self.apply(command);
        }
        Ok(())
    }

    /// Fire every operation due at the current time, in order.
    ///
    /// Operations scheduled with zero delay during this call fire in the
    /// same call. After each operation the requestor's cooldown is charged
    /// (performed effects only), repeats are re-queued, and the world's
    /// pending changes are reconciled into notifications.
    pub fn fire_due(&mut self, world: &mut World, services: &mut Services) -> Vec<FireRecord> {
        let now = self.clock.now();
        let mut fired = Vec::new();

        while let Some(mut operation) = self.queue.pop_due(now) {
            let (id, kind, requestor) = {
                let header = operation.header();
                (header.id(), header.kind(), header.requestor())
            };
            if operation.header.is_cancelled() {
                debug!(operation = %id, %kind, "skipping cancelled operation");
                continue;
            }

            let ctx = OperationContext::new(now, id, world, &mut self.queue, &self.cooldowns, services);
            let outcome = match &mut operation.body {
                OperationBody::Standard(body) => {
                    let mut ctx = ctx;
                    body.execute(&mut operation.header, &mut ctx)
                }
                OperationBody::Elevated(body) => {
                    let mut ctx = ElevatedOperationContext::new(ctx);
                    body.execute(&mut operation.header, &mut ctx)
                }
            };

            let record = match outcome {
                Ok(result) => {
                    let charged = if result.is_performed() {
                        operation.header.cost()
                    } else {
                        Duration::ZERO
                    };
                    if let Some(actor) = requestor {
                        self.cooldowns
                            .charge(actor, operation.header.category(), now, charged);
                    }
                    let repeats = match result.repeat_after {
                        Some(delay) if !operation.header.is_cancelled() => {
                            self.queue.insert(operation, now.saturating_add(delay.max(MIN_REPEAT)));
                            true
                        }
                        _ => false,
                    };
                    FireRecord {
                        id,
                        kind,
                        requestor,
                        at: now,
                        effect: Some(result.effect),
                        charged,
                        repeats,
                    }
                }
                Err(err) => {
                    error!(operation = %id, %kind, error = %err, "operation failed");
                    FireRecord {
                        id,
                        kind,
                        requestor,
                        at: now,
                        effect: None,
                        charged: Duration::ZERO,
                        repeats: false,
                    }
                }
            };

            services.dispatch_all(world.reconcile());
            fired.push(record);
        }

        if !fired.is_empty() {
            self.cooldowns.prune(now);
        }
        fired
    }
}
