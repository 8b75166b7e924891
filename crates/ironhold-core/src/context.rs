//! Execution contexts handed to operations.
//!
//! [`OperationContext`] is what every operation sees: read access to the
//! world, mutable access to creatures (combat state, facing, health), the
//! scheduler, notifications, path finding, randomness, and rules.
//! [`ElevatedOperationContext`] adds mutable access to the whole world:
//! item creation and deletion, holder transfers, and open containers.

use std::ops::{Deref, DerefMut};
use std::time::Duration;

use ironhold_types::{
    Audience, CreatureId, ExhaustionCategory, GameTime, MessageKind, Notification, OperationId, OperationKind,
    Outbound, Position,
};
use ironhold_world::{Creature, CreatureRegistry, World};
use rand::SeedableRng;
use rand::rngs::SmallRng;

use crate::config::Rules;
use crate::cooldown::SharedCooldowns;
use crate::notify::{BufferedSink, NotificationSink};
use crate::operation::Operation;
use crate::path::{PathFinder, PathResult, StraightLinePathFinder};
use crate::scheduler::Queue;

/// Collaborators owned by the simulation and lent to every execution.
#[derive(Debug)]
pub struct Services {
    /// Where notifications go.
    pub sink: Box<dyn NotificationSink>,
    /// Route finding.
    pub path_finder: Box<dyn PathFinder>,
    /// Randomness for damage rolls and spawn placement.
    pub rng: SmallRng,
    /// Gameplay rules.
    pub rules: Rules,
}

impl Services {
    /// Build services with an rng seeded from `seed`.
    pub fn new(sink: Box<dyn NotificationSink>, path_finder: Box<dyn PathFinder>, seed: u64, rules: Rules) -> Self {
        Self {
            sink,
            path_finder,
            rng: SmallRng::seed_from_u64(seed),
            rules,
        }
    }

    /// Services writing into a [`BufferedSink`], with default rules and a
    /// straight-line path finder. The returned sink shares the buffer.
    pub fn buffered(seed: u64) -> (Self, BufferedSink) {
        let sink = BufferedSink::new();
        let services = Self::new(
            Box::new(sink.clone()),
            Box::new(StraightLinePathFinder::default()),
            seed,
            Rules::default(),
        );
        (services, sink)
    }

    /// Deliver a batch of notifications.
    pub fn dispatch_all(&mut self, notifications: impl IntoIterator<Item = Notification>) {
        for notification in notifications {
            self.sink.dispatch(notification);
        }
    }
}

/// Context for [`StandardOperation`](crate::operation::StandardOperation)s.
#[derive(Debug)]
pub struct OperationContext<'a> {
    now: GameTime,
    current: OperationId,
    world: &'a mut World,
    queue: &'a mut Queue,
    cooldowns: &'a SharedCooldowns,
    services: &'a mut Services,
}

impl<'a> OperationContext<'a> {
    pub(crate) const fn new(
        now: GameTime,
        current: OperationId,
        world: &'a mut World,
        queue: &'a mut Queue,
        cooldowns: &'a SharedCooldowns,
        services: &'a mut Services,
    ) -> Self {
        Self {
            now,
            current,
            world,
            queue,
            cooldowns,
            services,
        }
    }

    /// The simulation time of this firing.
    pub const fn now(&self) -> GameTime {
        self.now
    }

    /// The id of the operation being executed.
    pub const fn current(&self) -> OperationId {
        self.current
    }

    /// Read access to the world.
    pub fn world(&self) -> &World {
        &*self.world
    }

    /// Mutable access to creatures.
    pub fn creatures_mut(&mut self) -> &mut CreatureRegistry {
        self.world.creatures_mut()
    }

    /// Mutable access to one creature.
    pub fn creature_mut(&mut self, id: CreatureId) -> Option<&mut Creature> {
        self.world.creatures_mut().get_mut(id)
    }

    /// Gameplay rules.
    pub fn rules(&self) -> &Rules {
        &self.services.rules
    }

    /// The shared random number generator.
    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.services.rng
    }

    /// Find a route for `creature`.
    pub fn find_path(&self, from: Position, to: Position, creature: CreatureId, target_distance: u16) -> PathResult {
        self.services
            .path_finder
            .find_between(&*self.world, from, to, creature, target_distance)
    }

    // -----------------------------------------------------------------------
    // Notifications
    // -----------------------------------------------------------------------

    /// Send payloads to an audience.
    pub fn notify(&mut self, audience: Audience, payloads: Vec<Outbound>) {
        self.services.sink.dispatch(Notification::new(audience, payloads));
    }

    /// Send a text line to one creature.
    pub fn message(&mut self, to: CreatureId, kind: MessageKind, text: impl Into<String>) {
        self.services.sink.dispatch(Notification::text(to, kind, text));
    }

    /// Send payloads to every player who can see `center`.
    pub fn notify_spectators(&mut self, center: Position, payloads: Vec<Outbound>) {
        let settings = self.world.settings();
        let audience = Audience::Spectators {
            center,
            range_x: settings.view_range_x,
            range_y: settings.view_range_y,
        };
        self.notify(audience, payloads);
    }

    // -----------------------------------------------------------------------
    // Scheduling
    // -----------------------------------------------------------------------

    /// Queue an operation after `delay`, or after the requestor's remaining
    /// cooldown if that is longer.
    pub fn schedule(&mut self, operation: Operation, delay: Duration) -> OperationId {
        self.queue.enqueue(operation, delay, self.now, self.cooldowns)
    }

    /// Cancel one pending operation.
    pub fn cancel(&mut self, id: OperationId) -> bool {
        self.queue.cancel(id)
    }

    /// Cancel every pending cancellable operation of `kind` requested by
    /// `actor`. Returns how many were cancelled.
    pub fn cancel_all_for(&mut self, actor: CreatureId, kind: OperationKind) -> usize {
        self.queue.cancel_matching(actor, Some(kind))
    }

    /// Cancel every pending cancellable operation requested by `actor`.
    pub fn cancel_everything_for(&mut self, actor: CreatureId) -> usize {
        self.queue.cancel_matching(actor, None)
    }

    /// Bring a pending operation's fire time forward to now.
    pub fn expedite(&mut self, id: OperationId) -> bool {
        self.queue.expedite(id, self.now)
    }

    /// Whether `id` is waiting to fire and not cancelled.
    pub fn is_pending(&self, id: OperationId) -> bool {
        self.queue.is_live(id)
    }

    /// When `id` is due, if it is pending.
    pub fn fire_time(&self, id: OperationId) -> Option<GameTime> {
        self.queue.fire_time(id)
    }

    /// Remaining cooldown of `actor` in `category`.
    pub fn remaining_cooldown(&self, actor: CreatureId, category: ExhaustionCategory) -> Duration {
        self.cooldowns.remaining(actor, category, self.now)
    }

    /// Drop an actor's cooldowns.
    pub fn forget_cooldowns(&mut self, actor: CreatureId) {
        self.cooldowns.forget(actor);
    }
}

/// Context for [`ElevatedOperation`](crate::operation::ElevatedOperation)s.
///
/// Dereferences to [`OperationContext`] and adds [`world_mut`](Self::world_mut).
#[derive(Debug)]
pub struct ElevatedOperationContext<'a> {
    inner: OperationContext<'a>,
}

impl<'a> ElevatedOperationContext<'a> {
    pub(crate) const fn new(inner: OperationContext<'a>) -> Self {
        Self { inner }
    }

    /// Mutable access to the whole world.
    pub fn world_mut(&mut self) -> &mut World {
        &mut *self.inner.world
    }
}

impl<'a> Deref for ElevatedOperationContext<'a> {
    type Target = OperationContext<'a>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for ElevatedOperationContext<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.inner
    }
}
