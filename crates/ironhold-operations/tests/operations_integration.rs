//! Integration tests for the `ironhold-operations` crate.
//!
//! Each test builds a small world, drives operations through
//! [`Simulation::step_to`], and checks the world invariants the operations
//! must keep: item conservation, a single tracked strike per attacker,
//! cooldown bookkeeping, and the movement rollback path.

#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::too_many_lines,
    clippy::indexing_slicing
)]

use std::time::Duration;

use ironhold_core::{BufferedSink, Effect, FireRecord, Rules, Services, Simulation};
use ironhold_operations::{
    AutoAttackOrchestrator, CreationArgs, FactoryError, MovedThing, Movement, MovementArgs, OperationFactory, Speech,
};
use ironhold_types::{
    BodySlot, CreatureId, CreatureKind, ExhaustionCategory, GameTime, ItemId, ItemTypeId, Location, OperationKind,
    Outbound, Position, SpeechType,
};
use ironhold_world::{CreatureRegistry, CreatureTemplate, Holder, ItemCatalog, ItemType, World, WorldSettings};
use rust_decimal::Decimal;

const GRASS: ItemTypeId = ItemTypeId(102);
const COIN: ItemTypeId = ItemTypeId(3031);
const BACKPACK: ItemTypeId = ItemTypeId(1988);
const POUCH: ItemTypeId = ItemTypeId(1993);
const WALL: ItemTypeId = ItemTypeId(1026);

const HOME: Position = Position::new(1, 1, 7);
const BESIDE: Position = Position::new(0, 1, 7);

// =============================================================================
// Helpers
// =============================================================================

fn world() -> World {
    let catalog = ItemCatalog::from_types([
        ItemType {
            ground: true,
            movable: false,
            ..ItemType::simple(GRASS.0, "grass")
        },
        ItemType {
            cumulative: true,
            ..ItemType::simple(COIN.0, "gold coin")
        },
        ItemType {
            container_capacity: Some(20),
            body_slot: Some(BodySlot::Back),
            ..ItemType::simple(BACKPACK.0, "backpack")
        },
        ItemType {
            container_capacity: Some(1),
            ..ItemType::simple(POUCH.0, "pouch")
        },
        ItemType {
            movable: false,
            blocks_movement: true,
            blocks_throw: true,
            ..ItemType::simple(WALL.0, "stone wall")
        },
    ])
    .unwrap();
    let mut world = World::new(catalog, CreatureRegistry::default(), WorldSettings::default());
    for x in 0..6 {
        for y in 0..4 {
            world.add_tile(Position::new(x, y, 7), GRASS).unwrap();
        }
    }
    world
}

fn simulation_with(world: World) -> (Simulation, BufferedSink) {
    let (services, sink) = Services::buffered(42);
    (Simulation::new(world, services), sink)
}

fn player(world: &mut World, name: &str, at: Position) -> CreatureId {
    world
        .spawn_creature(CreatureKind::Player, &CreatureTemplate::named(name), at)
        .unwrap()
}

fn coins(world: &mut World, amount: u8, holder: Holder, index: Option<u8>) {
    world.spawn_item(COIN, amount, holder, index, GameTime::ZERO).unwrap();
}

fn move_coins(requestor: CreatureId, from: Location, to: Location, amount: u8) -> MovementArgs {
    MovementArgs {
        requestor,
        thing: MovedThing::Item(COIN),
        from,
        from_index: 0,
        from_creature: None,
        to,
        to_creature: None,
        amount,
    }
}

/// Equip a container of `type_id` in `slot` and open it. Returns the
/// container and its open-container slot.
fn worn_container(world: &mut World, hero: CreatureId, type_id: ItemTypeId, slot: BodySlot) -> (ItemId, u8) {
    let container = world
        .spawn_item(type_id, 1, Holder::Body(hero), Some(slot.index()), GameTime::ZERO)
        .unwrap();
    let opened = world.open_container(hero, container, None).unwrap();
    (container, opened.slot)
}

fn stack_amounts(sim: &Simulation, container: ItemId) -> Vec<u8> {
    sim.world()
        .container(container)
        .unwrap()
        .items()
        .iter()
        .map(|item| sim.world().item(*item).unwrap().amount())
        .collect()
}

fn hand_amount(sim: &Simulation, creature: CreatureId, slot: BodySlot) -> Option<u8> {
    let item = sim.world().creature(creature)?.body().get(slot)?;
    sim.world().item(item).map(ironhold_world::Item::amount)
}

fn of_kind(records: &[FireRecord], kind: OperationKind) -> Vec<FireRecord> {
    records.iter().filter(|record| record.kind == kind).cloned().collect()
}

// =============================================================================
// Item movement
// =============================================================================

#[test]
fn tile_stack_merges_into_hand_and_leaves_the_tile_empty() {
    let mut world = world();
    let hero = player(&mut world, "Hero", HOME);
    coins(&mut world, 3, Holder::Body(hero), Some(BodySlot::RightHand.index()));
    coins(&mut world, 5, Holder::Tile(BESIDE), None);
    world.drain_events();
    let (mut sim, _) = simulation_with(world);

    let args = move_coins(hero, Location::Map(BESIDE), Location::Body(BodySlot::RightHand), 5);
    sim.schedule(Movement::new(args).into_operation(Duration::from_millis(200)), Duration::ZERO);
    let records = sim.step_to(GameTime::ZERO).unwrap();

    assert_eq!(records[0].effect, Some(Effect::Performed));
    assert_eq!(hand_amount(&sim, hero, BodySlot::RightHand), Some(8));
    assert!(sim.world().tile(BESIDE).unwrap().item_at(0).is_none());
    assert_eq!(sim.world().total_amount(COIN), 8);
    assert!(sim.world().orphaned_items().is_empty());
}

#[test]
fn overflowing_merge_rolls_the_remainder_back_to_the_source() {
    let mut world = world();
    let hero = player(&mut world, "Hero", HOME);
    coins(&mut world, 99, Holder::Body(hero), Some(BodySlot::Ammo.index()));
    coins(&mut world, 2, Holder::Tile(BESIDE), None);
    world.drain_events();
    let (mut sim, _) = simulation_with(world);

    let args = move_coins(hero, Location::Map(BESIDE), Location::Body(BodySlot::Ammo), 2);
    sim.schedule(Movement::new(args).into_operation(Duration::from_millis(200)), Duration::ZERO);
    sim.step_to(GameTime::ZERO).unwrap();

    assert_eq!(hand_amount(&sim, hero, BodySlot::Ammo), Some(100));
    let left = sim.world().tile(BESIDE).unwrap().item_at(0).unwrap();
    assert_eq!(sim.world().item(left).unwrap().amount(), 1);
    assert_eq!(sim.world().total_amount(COIN), 101);
    assert!(sim.world().orphaned_items().is_empty());
}

#[test]
fn coins_are_conserved_across_a_chain_of_moves() {
    let mut world = world();
    let hero = player(&mut world, "Hero", HOME);
    world
        .spawn_item(BACKPACK, 1, Holder::Body(hero), Some(BodySlot::Back.index()), GameTime::ZERO)
        .unwrap();
    let backpack = world.creature(hero).unwrap().body().get(BodySlot::Back).unwrap();
    let opened = world.open_container(hero, backpack, None).unwrap();
    coins(&mut world, 30, Holder::Tile(BESIDE), None);
    world.drain_events();
    let (mut sim, _) = simulation_with(world);

    let bag = Location::Container {
        slot: opened.slot,
        index: 0,
    };
    let hand = Location::Body(BodySlot::RightHand);
    let steps = [
        move_coins(hero, Location::Map(BESIDE), hand, 10),
        move_coins(hero, hand, bag, 10),
        move_coins(hero, Location::Map(BESIDE), hand, 20),
        move_coins(hero, hand, Location::Map(BESIDE), 5),
        // Nothing lies there: refused.
        move_coins(hero, Location::Map(Position::new(5, 3, 7)), hand, 1),
    ];

    for (second, args) in (1_u64..).zip(steps) {
        sim.schedule(Movement::new(args).into_operation(Duration::from_millis(200)), Duration::ZERO);
        sim.step_to(GameTime::from_millis(second * 1_000)).unwrap();
        assert_eq!(sim.world().total_amount(COIN), 30);
        assert!(sim.world().orphaned_items().is_empty());
    }

    assert_eq!(hand_amount(&sim, hero, BodySlot::RightHand), Some(15));
    let in_bag = sim.world().container(backpack).unwrap().items()[0];
    assert_eq!(sim.world().item(in_bag).unwrap().amount(), 10);
    let on_tile = sim.world().tile(BESIDE).unwrap().item_at(0).unwrap();
    assert_eq!(sim.world().item(on_tile).unwrap().amount(), 5);
}

#[test]
fn overflow_from_a_body_slot_returns_to_that_slot() {
    let mut world = world();
    let hero = player(&mut world, "Hero", HOME);
    coins(&mut world, 10, Holder::Body(hero), Some(BodySlot::Ammo.index()));
    let (pouch, pouch_slot) = worn_container(&mut world, hero, POUCH, BodySlot::LeftHand);
    coins(&mut world, 98, Holder::Container(pouch), None);
    world.drain_events();
    let (mut sim, _) = simulation_with(world);

    let to = Location::Container {
        slot: pouch_slot,
        index: 0,
    };
    let args = move_coins(hero, Location::Body(BodySlot::Ammo), to, 5);
    sim.schedule(Movement::new(args).into_operation(Duration::from_millis(200)), Duration::ZERO);
    sim.step_to(GameTime::ZERO).unwrap();

    assert_eq!(stack_amounts(&sim, pouch), vec![100]);
    assert_eq!(hand_amount(&sim, hero, BodySlot::Ammo), Some(8));
    assert_eq!(hand_amount(&sim, hero, BodySlot::RightHand), None);
    assert_eq!(sim.world().total_amount(COIN), 108);
    assert!(sim.world().orphaned_items().is_empty());
}

#[test]
fn overflow_from_a_container_merges_back_onto_its_stack() {
    let mut world = world();
    let hero = player(&mut world, "Hero", HOME);
    let (backpack, bag_slot) = worn_container(&mut world, hero, BACKPACK, BodySlot::Back);
    coins(&mut world, 10, Holder::Container(backpack), None);
    let (pouch, pouch_slot) = worn_container(&mut world, hero, POUCH, BodySlot::LeftHand);
    coins(&mut world, 98, Holder::Container(pouch), None);
    world.drain_events();
    let (mut sim, _) = simulation_with(world);

    let from = Location::Container {
        slot: bag_slot,
        index: 0,
    };
    let to = Location::Container {
        slot: pouch_slot,
        index: 0,
    };
    sim.schedule(
        Movement::new(move_coins(hero, from, to, 5)).into_operation(Duration::from_millis(200)),
        Duration::ZERO,
    );
    sim.step_to(GameTime::ZERO).unwrap();

    assert_eq!(stack_amounts(&sim, pouch), vec![100]);
    assert_eq!(stack_amounts(&sim, backpack), vec![8]);
    assert_eq!(sim.world().total_amount(COIN), 108);
    assert!(sim.world().orphaned_items().is_empty());
}

#[test]
fn container_stack_feeds_the_map_a_hand_and_another_container() {
    let mut world = world();
    let hero = player(&mut world, "Hero", HOME);
    let (backpack, bag_slot) = worn_container(&mut world, hero, BACKPACK, BodySlot::Back);
    coins(&mut world, 30, Holder::Container(backpack), None);
    let (pouch, pouch_slot) = worn_container(&mut world, hero, POUCH, BodySlot::LeftHand);
    world.drain_events();
    let (mut sim, _) = simulation_with(world);

    let bag = Location::Container {
        slot: bag_slot,
        index: 0,
    };
    let pouch_top = Location::Container {
        slot: pouch_slot,
        index: 0,
    };
    let steps = [
        move_coins(hero, bag, Location::Map(BESIDE), 4),
        move_coins(hero, bag, Location::Body(BodySlot::RightHand), 6),
        move_coins(hero, bag, pouch_top, 7),
    ];
    for (second, args) in (1_u64..).zip(steps) {
        sim.schedule(Movement::new(args).into_operation(Duration::from_millis(200)), Duration::ZERO);
        let records = sim.step_to(GameTime::from_millis(second * 1_000)).unwrap();
        assert_eq!(records.last().unwrap().effect, Some(Effect::Performed));
        assert_eq!(sim.world().total_amount(COIN), 30);
        assert!(sim.world().orphaned_items().is_empty());
    }

    let on_tile = sim.world().tile(BESIDE).unwrap().item_at(0).unwrap();
    assert_eq!(sim.world().item(on_tile).unwrap().amount(), 4);
    assert_eq!(hand_amount(&sim, hero, BodySlot::RightHand), Some(6));
    assert_eq!(stack_amounts(&sim, pouch), vec![7]);
    assert_eq!(stack_amounts(&sim, backpack), vec![13]);
}

// =============================================================================
// Cooldowns
// =============================================================================

#[test]
fn cooldown_shrinks_monotonically_and_reaches_zero_when_ready() {
    let mut world = world();
    let hero = player(&mut world, "Hero", HOME);
    world.drain_events();
    let (mut sim, _) = simulation_with(world);

    let speech = Speech::new(hero, SpeechType::Say, "well met").into_operation(Duration::from_millis(1_000));
    sim.schedule(speech, Duration::ZERO);

    let mut previous = Duration::MAX;
    for at in [0_u64, 1, 250, 500, 999, 1_000, 1_500] {
        sim.step_to(GameTime::from_millis(at)).unwrap();
        let remaining = sim.handle().remaining_cooldown(hero, ExhaustionCategory::Speech);
        assert!(remaining <= previous, "cooldown grew at {at} ms");
        assert_eq!(remaining, Duration::from_millis(1_000_u64.saturating_sub(at)));
        previous = remaining;
    }
    assert_eq!(previous, Duration::ZERO);
    assert_eq!(sim.handle().remaining_cooldown(hero, ExhaustionCategory::Action), Duration::ZERO);
}

#[test]
fn refused_move_charges_nothing() {
    let mut world = world();
    let hero = player(&mut world, "Hero", HOME);
    coins(&mut world, 4, Holder::Tile(Position::new(4, 1, 7)), None);
    world.drain_events();
    let (mut sim, sink) = simulation_with(world);

    let args = move_coins(hero, Location::Map(Position::new(4, 1, 7)), Location::Body(BodySlot::LeftHand), 4);
    sim.schedule(Movement::new(args).into_operation(Duration::from_millis(200)), Duration::ZERO);
    let records = sim.step_to(GameTime::ZERO).unwrap();

    assert_eq!(records[0].effect, Some(Effect::Aborted));
    assert_eq!(records[0].charged, Duration::ZERO);
    assert_eq!(sim.handle().remaining_cooldown(hero, ExhaustionCategory::Action), Duration::ZERO);
    let told: Vec<String> = sink
        .drain()
        .into_iter()
        .flat_map(|note| note.payloads)
        .filter_map(|payload| match payload {
            Outbound::TextMessage { text, .. } => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(told, vec!["You are too far away.".to_owned()]);
}

// =============================================================================
// Combat
// =============================================================================

fn duel(rat_at: Position) -> (Simulation, BufferedSink, CreatureId, CreatureId) {
    let mut world = world();
    let knight = player(&mut world, "Knight", HOME);
    let rat = world
        .spawn_creature(CreatureKind::Monster, &CreatureTemplate::named("Rat"), rat_at)
        .unwrap();
    world.drain_events();
    let (sim, sink) = simulation_with(world);
    (sim, sink, knight, rat)
}

#[test]
fn adjacent_duel_strikes_once_per_round_and_restores_credits() {
    let (mut sim, sink, knight, rat) = duel(Position::new(2, 1, 7));
    assert_eq!(sim.world().creature(knight).unwrap().combatant.attack_speed, Decimal::ONE);
    assert_eq!(Rules::default().combat.round_for(Decimal::ONE), Duration::from_millis(2_000));

    sim.schedule(AutoAttackOrchestrator::new(knight, Some(rat)).into_operation(), Duration::ZERO);
    let first = sim.step_to(GameTime::ZERO).unwrap();
    let strikes = of_kind(&first, OperationKind::AutoAttack);
    assert_eq!(strikes.len(), 1);
    assert_eq!(strikes[0].effect, Some(Effect::Performed));

    let damage: Vec<u32> = sink
        .drain()
        .into_iter()
        .flat_map(|note| note.payloads)
        .filter_map(|payload| match payload {
            Outbound::DamageDealt { amount, .. } => Some(amount),
            _ => None,
        })
        .collect();
    assert_eq!(damage.len(), 1);
    assert!((1..=10).contains(&damage[0]));
    let rat_health = sim.world().creature(rat).unwrap().health;
    assert_eq!(rat_health, 100 - damage[0]);
    assert_eq!(sim.world().creature(knight).unwrap().combatant.attack_credits, 0);
    assert_eq!(sim.world().creature(rat).unwrap().combatant.defense_credits, 0);

    let quiet = sim.step_to(GameTime::from_millis(1_999)).unwrap();
    assert!(quiet.is_empty());

    let second = sim.step_to(GameTime::from_millis(2_000)).unwrap();
    let restores = of_kind(&second, OperationKind::RestoreCombatCredit);
    assert_eq!(restores.len(), 2);
    assert!(restores.iter().all(|record| record.at == GameTime::from_millis(2_000)));
    let strikes = of_kind(&second, OperationKind::AutoAttack);
    assert_eq!(strikes.len(), 1);
    assert_eq!(strikes[0].effect, Some(Effect::Performed));
    assert!(sim.world().creature(rat).unwrap().health < rat_health);
}

#[test]
fn out_of_reach_target_keeps_a_single_tracked_strike() {
    let (mut sim, _, knight, rat) = duel(Position::new(4, 1, 7));
    sim.schedule(AutoAttackOrchestrator::new(knight, Some(rat)).into_operation(), Duration::ZERO);
    let records = sim.step_to(GameTime::from_millis(20_000)).unwrap();

    let cycles: Vec<GameTime> = of_kind(&records, OperationKind::AutoAttackOrchestrator)
        .iter()
        .map(|record| record.at)
        .collect();
    let strikes: Vec<GameTime> = of_kind(&records, OperationKind::AutoAttack)
        .iter()
        .map(|record| record.at)
        .collect();
    assert_eq!(cycles.len(), 11);
    assert_eq!(strikes, cycles);
    assert!(
        of_kind(&records, OperationKind::AutoAttack)
            .iter()
            .all(|record| record.effect == Some(Effect::Aborted) && record.charged == Duration::ZERO)
    );

    let combatant = &sim.world().creature(knight).unwrap().combatant;
    let tracked = combatant.pending_auto_attack.unwrap();
    assert!(sim.scheduler().is_pending(tracked));
    assert_eq!(sim.world().creature(rat).unwrap().health, 100);
}

#[test]
fn target_stepping_into_reach_fires_the_waiting_strike_early() {
    let (mut sim, _, knight, rat) = duel(Position::new(3, 1, 7));
    sim.schedule(AutoAttackOrchestrator::new(knight, Some(rat)).into_operation(), Duration::ZERO);
    sim.step_to(GameTime::ZERO).unwrap();
    let waiting = sim.world().creature(knight).unwrap().combatant.pending_auto_attack.unwrap();
    assert_eq!(sim.scheduler().fire_time(waiting), Some(GameTime::from_millis(4_000)));

    let approach = MovementArgs::step(rat, Position::new(3, 1, 7), Position::new(2, 1, 7));
    sim.schedule(Movement::new(approach).into_operation(Duration::ZERO), Duration::from_millis(500));
    let records = sim.step_to(GameTime::from_millis(500)).unwrap();

    let strikes = of_kind(&records, OperationKind::AutoAttack);
    assert_eq!(strikes.len(), 1);
    assert_eq!(strikes[0].id, waiting);
    assert_eq!(strikes[0].at, GameTime::from_millis(500));
    assert_eq!(strikes[0].effect, Some(Effect::Performed));
    assert!(sim.world().creature(rat).unwrap().health < 100);
}

#[test]
fn target_stepping_into_reach_behind_a_wall_leaves_the_strike_waiting() {
    let mut world = world();
    world
        .spawn_item(WALL, 1, Holder::Tile(Position::new(2, 1, 7)), None, GameTime::ZERO)
        .unwrap();
    let archer = CreatureTemplate {
        attack_range: 3,
        ..CreatureTemplate::named("Archer")
    };
    let archer = world.spawn_creature(CreatureKind::Player, &archer, HOME).unwrap();
    let rat = world
        .spawn_creature(CreatureKind::Monster, &CreatureTemplate::named("Rat"), Position::new(5, 1, 7))
        .unwrap();
    world.drain_events();
    let (mut sim, _) = simulation_with(world);

    sim.schedule(AutoAttackOrchestrator::new(archer, Some(rat)).into_operation(), Duration::ZERO);
    sim.step_to(GameTime::ZERO).unwrap();
    let waiting = sim.world().creature(archer).unwrap().combatant.pending_auto_attack.unwrap();
    let due = sim.scheduler().fire_time(waiting).unwrap();

    let approach = MovementArgs::step(rat, Position::new(5, 1, 7), Position::new(4, 1, 7));
    sim.schedule(Movement::new(approach).into_operation(Duration::ZERO), Duration::from_millis(500));
    let records = sim.step_to(GameTime::from_millis(500)).unwrap();

    assert_eq!(sim.world().creature(rat).unwrap().position, Position::new(4, 1, 7));
    assert!(of_kind(&records, OperationKind::AutoAttack).is_empty());
    assert_eq!(sim.scheduler().fire_time(waiting), Some(due));
    assert_eq!(sim.world().creature(rat).unwrap().health, 100);
}

#[test]
fn killing_blow_removes_the_creature_and_stops_the_attack() {
    let (mut sim, _, knight, rat) = duel(Position::new(2, 1, 7));
    sim.world_mut().creatures_mut().get_mut(rat).unwrap().health = 1;
    sim.schedule(AutoAttackOrchestrator::new(knight, Some(rat)).into_operation(), Duration::ZERO);
    let records = sim.step_to(GameTime::from_millis(4_000)).unwrap();

    assert!(sim.world().creature(rat).is_none());
    assert_eq!(of_kind(&records, OperationKind::Death).len(), 1);
    let combatant = &sim.world().creature(knight).unwrap().combatant;
    assert_eq!(combatant.auto_attack_target, None);
    assert_eq!(combatant.orchestrator, None);
    assert!(
        of_kind(&records, OperationKind::AutoAttackOrchestrator)
            .iter()
            .all(|record| !record.repeats || record.at == GameTime::ZERO)
    );
}

// =============================================================================
// Factory
// =============================================================================

#[test]
fn factory_builds_runnable_operations_and_rejects_mismatches() {
    let mut world = world();
    let hero = player(&mut world, "Hero", HOME);
    world.drain_events();
    let (mut sim, _) = simulation_with(world);
    let factory = OperationFactory::new(Rules::default());

    let mismatch = factory.create(OperationKind::LogOut, CreationArgs::Turn {
        creature: hero,
        direction: ironhold_types::Direction::North,
    });
    assert_eq!(mismatch.unwrap_err(), FactoryError::NotSupported {
        kind: OperationKind::LogOut,
        given: OperationKind::Turn,
    });

    let step = factory
        .create(
            OperationKind::Movement,
            CreationArgs::Movement(MovementArgs::step(hero, HOME, Position::new(2, 1, 7))),
        )
        .unwrap();
    sim.schedule(step, Duration::ZERO);
    let logout = factory
        .create(OperationKind::LogOut, CreationArgs::LogOut { creature: hero })
        .unwrap();
    sim.schedule(logout, Duration::from_secs(1));
    sim.step_to(GameTime::from_millis(1_000)).unwrap();

    assert!(sim.world().creature(hero).is_none());
    assert!(sim.world().is_walkable(Position::new(2, 1, 7)));
}
