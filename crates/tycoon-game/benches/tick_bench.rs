//! Criterion benchmarks for the tycoon tick pipeline.
//!
//! Two benchmark groups:
//! - `tick`: one step of a fully built factory (every slot crafting, a
//!   dozen collectors competing for power).
//! - `catch_up`: replaying an eight-hour absence on the same factory.

use criterion::{Criterion, criterion_group, criterion_main};
use tycoon_core::fixed::Fixed64;
use tycoon_game::definition::GameDefinition;
use tycoon_game::engine::Engine;
use tycoon_game::test_utils::*;

// ===========================================================================
// Factory builder
// ===========================================================================

/// Every slot holds a plate press with its own worker, and collectors
/// outnumber what the generators can feed.
fn build_busy_factory() -> Engine {
    let mut def: GameDefinition = sample_definition();
    def.settings.lines = 8;
    def.settings.slots_per_line = 8;
    def.factory
        .machines
        .values_mut()
        .for_each(|m| m.cost = tycoon_core::economy::CostCurve::flat(dec(1)));
    def.settings.hire_cost = tycoon_core::economy::CostCurve::flat(dec(1));
    def.power
        .generators
        .values_mut()
        .for_each(|g| g.cost.max_instances = None);

    let mut engine = Engine::new(def);
    grant_money(&mut engine, dec(1_000_000_000));
    for _ in 0..8 {
        engine.purchase_power_building(DIESEL).expect("diesel");
    }
    for _ in 0..12 {
        engine.purchase_material_collector(SCRAP_PICKER).expect("picker");
        engine.purchase_material_collector(ORE_DRILL).expect("drill");
    }
    for line in 0..8 {
        for index in 0..8 {
            let machine = engine.purchase_machine(PRESS).expect("press");
            engine.place_machine(machine, slot(line, index)).expect("place");
            let worker = engine.hire_worker().expect("hire");
            engine.assign_worker(worker, machine).expect("assign");
            engine
                .set_slot_recipe(slot(line, index), Some(PLATE))
                .expect("recipe");
        }
    }
    grant_materials(&mut engine, 1_000_000);
    engine
}

// ===========================================================================
// Benchmarks
// ===========================================================================

fn bench_tick(c: &mut Criterion) {
    let mut engine = build_busy_factory();
    c.bench_function("tick/busy_factory", |b| {
        b.iter(|| {
            engine.step();
            engine.drain_events();
        })
    });
}

fn bench_catch_up(c: &mut Criterion) {
    let mut group = c.benchmark_group("catch_up");
    group.sample_size(10);
    group.bench_function("eight_hours", |b| {
        b.iter_batched(
            build_busy_factory,
            |mut engine| engine.resume(Fixed64::from_num(8 * 60 * 60)),
            criterion::BatchSize::LargeInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_tick, bench_catch_up);
criterion_main!(benches);
