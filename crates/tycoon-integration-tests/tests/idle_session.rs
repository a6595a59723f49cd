//! End-to-end sessions over the sample definition.
//!
//! Each test drives the engine only through its public commands and
//! queries, crossing the economy, power, factory and prestige crates in one
//! run.

use tycoon_core::fixed::Fixed64;
use tycoon_factory::line::{BlockReason, SlotPhase};
use tycoon_game::engine::Engine;
use tycoon_game::event::GameEvent;
use tycoon_game::test_utils::*;
use tycoon_power::PowerEvent;
use tycoon_prestige::PrestigeOutcome;

/// Buy `n` levels of `LEMONADE`, topping the bank up first.
fn buy_lemonade_levels(engine: &mut Engine, n: u32) {
    grant_money(engine, dec(1_000_000));
    for _ in 0..n {
        engine.upgrade_business(LEMONADE).unwrap();
    }
}

// ---------------------------------------------------------------------------
// Test 1: From the first stand to the first prestige
// ---------------------------------------------------------------------------
#[test]
fn first_stand_to_first_prestige() {
    let mut engine = sample_engine();
    engine.upgrade_business(LEMONADE).unwrap();
    engine.advance(fixed(600.0));
    assert_eq!(engine.money(), dec(615));

    buy_lemonade_levels(&mut engine, 24);
    let preview = engine.prestige_preview();
    assert_eq!(preview.total_levels, 25);
    assert_eq!(preview.newly_gained, 1);

    assert_eq!(engine.perform_prestige(), PrestigeOutcome::Gained { points: 1 });
    assert_eq!(engine.money(), dec(25));
    assert_eq!(engine.state().business_level(LEMONADE), 0);
    assert_eq!(engine.total_income_per_second(), dec(0));
    assert_eq!(engine.prestige_points(), 1);

    // The unspent point boosts the next run.
    engine.upgrade_business(LEMONADE).unwrap();
    let boosted = engine.income_per_second(LEMONADE).unwrap();
    assert!(boosted > dec(1));
    assert!(boosted < dec_scaled(103, 2));
}

// ---------------------------------------------------------------------------
// Test 2: Spending the point on a skill keeps the bonus
// ---------------------------------------------------------------------------
#[test]
fn spent_point_becomes_skill_bonus() {
    let mut engine = sample_engine();
    buy_lemonade_levels(&mut engine, 25);
    engine.perform_prestige();

    engine.unlock_skill(SHARP_PENCILS).unwrap();
    assert_eq!(engine.prestige_points(), 0);

    grant_money(&mut engine, dec(100));
    engine.upgrade_business(LEMONADE).unwrap();
    // Ten percent is not exact in binary fixed point.
    let income = engine.income_per_second(LEMONADE).unwrap();
    assert!(income > dec_scaled(1099, 3));
    assert!(income <= dec_scaled(11, 1));
}

// ---------------------------------------------------------------------------
// Test 3: Produced plates raise business income
// ---------------------------------------------------------------------------
#[test]
fn factory_output_feeds_income() {
    let (mut engine, _, _) = crafting_engine(100);
    engine.upgrade_business(LEMONADE).unwrap();
    let before = engine.income_per_second(LEMONADE).unwrap();
    assert_eq!(before, dec(1));

    engine.advance(fixed(20.0));
    assert!(engine.component_count(PLATE) >= 5);
    assert!(engine.income_per_second(LEMONADE).unwrap() > before);
}

// ---------------------------------------------------------------------------
// Test 4: Collectors keep a press supplied
// ---------------------------------------------------------------------------
#[test]
fn collectors_supply_the_press() {
    let (mut engine, _, _) = crafting_engine(0);
    engine.purchase_material_collector(SCRAP_PICKER).unwrap();

    engine.advance(fixed(30.0));
    let allocation = engine.power_allocation();
    assert!(!allocation.deficit);
    assert_eq!(allocation.total_output_per_second, fixed(1.0));
    // One plate every two seconds at two materials each drains the
    // picker's full output.
    assert!(engine.component_count(PLATE) >= 10);
    assert!(engine.raw_materials() <= 2);
}

// ---------------------------------------------------------------------------
// Test 5: Prestige keeps the factory but leaves it unpowered
// ---------------------------------------------------------------------------
#[test]
fn prestige_unpowers_the_factory() {
    let (mut engine, _, _) = crafting_engine(100);
    engine.advance(fixed(4.0));
    let plates = engine.component_count(PLATE);
    assert!(plates > 0);

    buy_lemonade_levels(&mut engine, 25);
    assert!(matches!(engine.perform_prestige(), PrestigeOutcome::Gained { .. }));
    engine.drain_events();

    engine.step();
    assert!(engine
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::Power(PowerEvent::Deficit { .. }))));
    assert_eq!(
        engine.slot_view(slot(0, 0)).unwrap().phase,
        SlotPhase::Blocked(BlockReason::PowerDeficit)
    );
    assert_eq!(engine.component_count(PLATE), plates);

    grant_money(&mut engine, dec(100));
    engine.purchase_power_building(SOLAR).unwrap();
    grant_materials(&mut engine, 10);
    engine.step();
    assert!(engine
        .drain_events()
        .iter()
        .any(|e| matches!(e, GameEvent::Power(PowerEvent::Restored { .. }))));
    assert!(!matches!(
        engine.slot_view(slot(0, 0)).unwrap().phase,
        SlotPhase::Blocked(_)
    ));
}

// ---------------------------------------------------------------------------
// Test 6: Advancing equals stepping
// ---------------------------------------------------------------------------
#[test]
fn advance_matches_manual_steps() {
    let (mut a, _, _) = crafting_engine(50);
    let (mut b, _, _) = crafting_engine(50);
    a.upgrade_business(LEMONADE).unwrap();
    b.upgrade_business(LEMONADE).unwrap();

    let result = a.advance(fixed(25.0));
    for _ in 0..25 {
        b.step();
    }
    assert_eq!(result.steps_run, 25);
    assert_eq!(a.save().unwrap(), b.save().unwrap());
    assert_eq!(a.drain_events(), b.drain_events());
}

// ---------------------------------------------------------------------------
// Test 7: Offline catch-up after a reload is capped
// ---------------------------------------------------------------------------
#[test]
fn offline_catch_up_after_reload() {
    let mut engine = sample_engine();
    engine.upgrade_business(LEMONADE).unwrap();
    let bytes = engine.save().unwrap();

    let mut restored = Engine::load(sample_definition(), &bytes).unwrap();
    let result = restored.resume(fixed(10.0 * 3600.0));
    assert_eq!(result.steps_run, 8 * 3600);
    assert_eq!(result.simulated_seconds, fixed(8.0 * 3600.0));
    assert_eq!(result.discarded_seconds, fixed(2.0 * 3600.0));
    assert_eq!(restored.money(), dec(15 + 8 * 3600));
    assert_eq!(restored.state().elapsed_seconds, fixed(8.0 * 3600.0));
}

// ---------------------------------------------------------------------------
// Test 8: Nothing happens while away for zero or negative time
// ---------------------------------------------------------------------------
#[test]
fn no_time_away_is_a_noop() {
    let (mut engine, _, _) = crafting_engine(10);
    let before = engine.save().unwrap();

    let result = engine.resume(Fixed64::ZERO);
    assert_eq!(result.steps_run, 0);
    engine.resume(fixed(-30.0));
    assert_eq!(engine.save().unwrap(), before);
}
