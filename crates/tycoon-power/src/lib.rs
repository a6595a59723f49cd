//! Power grid and allocation scheduler for the idle tycoon simulation.
//!
//! Generators produce power; material collectors and placed factory machines
//! consume it. Machines are a *fixed load*: they draw power whenever they are
//! placed. Collectors are *scheduled*: every tick [`schedule`] picks the
//! subset that fits in what the fixed load leaves over.
//!
//! # Design
//!
//! - [`schedule`] is pure and recomputed from scratch each tick. It keeps no
//!   cross-tick state, so when power is scarce the same cheap collectors win
//!   every time.
//! - Producers are admitted cheapest first. A producer that does not fit is
//!   skipped and the next one is still tried (greedy bin-packing, not
//!   first-fit-stop).
//! - [`PowerGrid`] holds owned counts and the last deficit flag, and emits
//!   [`PowerEvent`]s only on transitions.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tycoon_core::economy::CostCurve;
use tycoon_core::fixed::{Fixed64, Money, Ticks, count_to_fixed};
use tycoon_core::id::{CollectorTypeId, GeneratorTypeId};
use tycoon_core::rejection::{Entity, Rejection};

// ---------------------------------------------------------------------------
// Building specs
// ---------------------------------------------------------------------------

/// A power-producing building type.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSpec {
    pub id: GeneratorTypeId,
    pub name: String,
    /// Power per owned instance, before the power output multiplier.
    pub power_output: Fixed64,
    pub cost: CostCurve,
}

/// A raw-material collector type. Each instance is scheduled separately.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectorSpec {
    pub id: CollectorTypeId,
    pub name: String,
    pub power_consumption: Fixed64,
    /// Raw materials per second while powered.
    pub output_per_second: Fixed64,
    pub cost: CostCurve,
}

/// Static generator and collector definitions.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PowerCatalog {
    pub generators: BTreeMap<GeneratorTypeId, GeneratorSpec>,
    pub collectors: BTreeMap<CollectorTypeId, CollectorSpec>,
}

impl PowerCatalog {
    pub fn generator(&self, id: GeneratorTypeId) -> Result<&GeneratorSpec, Rejection> {
        self.generators
            .get(&id)
            .ok_or(Rejection::Unknown(Entity::Generator(id)))
    }

    pub fn collector(&self, id: CollectorTypeId) -> Result<&CollectorSpec, Rejection> {
        self.collectors
            .get(&id)
            .ok_or(Rejection::Unknown(Entity::Collector(id)))
    }
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// One owned collector instance as seen by the scheduler.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ConsumerKey {
    pub collector: CollectorTypeId,
    /// 0-based index among the owned instances of this type.
    pub instance: u32,
}

/// Input row for [`schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScheduledProducer {
    pub key: ConsumerKey,
    pub power_consumption: Fixed64,
    pub output_per_second: Fixed64,
}

/// Result of one scheduling pass.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PowerAllocation {
    pub active: BTreeSet<ConsumerKey>,
    pub total_output_per_second: Fixed64,
    /// Generation available this tick.
    pub generated: Fixed64,
    /// Fixed load plus the consumption of every active producer.
    pub consumed: Fixed64,
    /// `generated - consumed`. Negative only when the fixed load alone
    /// exceeds generation.
    pub net_power: Fixed64,
    /// The fixed load exceeds generation; dependent crafting is blocked.
    pub deficit: bool,
}

/// Decide which scheduled producers run this tick.
///
/// The budget is `power_generated - fixed_load`. Producers are sorted by
/// consumption ascending (ties by key) and each one is admitted if it still
/// fits. The active set's consumption never exceeds the budget, and no
/// excluded producer could be added without breaking that bound.
pub fn schedule(
    power_generated: Fixed64,
    fixed_load: Fixed64,
    producers: &[ScheduledProducer],
) -> PowerAllocation {
    let generated = power_generated.max(Fixed64::ZERO);
    let fixed_load = fixed_load.max(Fixed64::ZERO);

    if fixed_load > generated {
        return PowerAllocation {
            active: BTreeSet::new(),
            total_output_per_second: Fixed64::ZERO,
            generated,
            consumed: fixed_load,
            net_power: generated - fixed_load,
            deficit: true,
        };
    }

    let budget = generated - fixed_load;
    let mut order: Vec<&ScheduledProducer> = producers.iter().collect();
    order.sort_by_key(|p| (p.power_consumption, p.key));

    let mut running = Fixed64::ZERO;
    let mut output = Fixed64::ZERO;
    let mut active = BTreeSet::new();
    for producer in order {
        let cost = producer.power_consumption.max(Fixed64::ZERO);
        let Some(next) = running.checked_add(cost) else {
            continue;
        };
        if next <= budget {
            running = next;
            output = output.saturating_add(producer.output_per_second);
            active.insert(producer.key);
        }
    }

    let consumed = fixed_load + running;
    PowerAllocation {
        active,
        total_output_per_second: output,
        generated,
        consumed,
        net_power: generated - consumed,
        deficit: false,
    }
}

// ---------------------------------------------------------------------------
// Events
// ---------------------------------------------------------------------------

/// Emitted by [`PowerGrid::tick`] on deficit transitions only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PowerEvent {
    /// The fixed load started exceeding generation.
    Deficit { shortfall: Fixed64, tick: Ticks },
    /// Generation covers the fixed load again.
    Restored { tick: Ticks },
}

// ---------------------------------------------------------------------------
// Grid state
// ---------------------------------------------------------------------------

/// Owned power buildings and the deficit flag from the last tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerGrid {
    pub generators: BTreeMap<GeneratorTypeId, u32>,
    pub collectors: BTreeMap<CollectorTypeId, u32>,
    pub was_deficit: bool,
}

impl PowerGrid {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn generators_owned(&self, id: GeneratorTypeId) -> u32 {
        self.generators.get(&id).copied().unwrap_or(0)
    }

    pub fn collectors_owned(&self, id: CollectorTypeId) -> u32 {
        self.collectors.get(&id).copied().unwrap_or(0)
    }

    /// Price of the next generator of type `id`.
    pub fn generator_price(&self, catalog: &PowerCatalog, id: GeneratorTypeId) -> Result<Money, Rejection> {
        catalog.generator(id)?.cost.price(self.generators_owned(id))
    }

    /// Price of the next collector of type `id`.
    pub fn collector_price(&self, catalog: &PowerCatalog, id: CollectorTypeId) -> Result<Money, Rejection> {
        catalog.collector(id)?.cost.price(self.collectors_owned(id))
    }

    /// Record a purchased generator. The caller has already paid.
    pub fn add_generator(&mut self, id: GeneratorTypeId) {
        *self.generators.entry(id).or_insert(0) += 1;
    }

    /// Record a purchased collector. The caller has already paid.
    pub fn add_collector(&mut self, id: CollectorTypeId) {
        *self.collectors.entry(id).or_insert(0) += 1;
    }

    /// Total generation with the power output multiplier applied.
    pub fn generated(&self, catalog: &PowerCatalog, multiplier: Fixed64) -> Fixed64 {
        self.generators
            .iter()
            .filter_map(|(id, &owned)| catalog.generators.get(id).map(|spec| (spec, owned)))
            .fold(Fixed64::ZERO, |acc, (spec, owned)| {
                acc.saturating_add(
                    count_to_fixed(u64::from(owned))
                        .saturating_mul(spec.power_output)
                        .saturating_mul(multiplier),
                )
            })
    }

    /// One scheduler row per owned collector instance.
    pub fn consumers(&self, catalog: &PowerCatalog) -> Vec<ScheduledProducer> {
        let mut rows = Vec::new();
        for (&id, &owned) in &self.collectors {
            let Some(spec) = catalog.collectors.get(&id) else {
                continue;
            };
            rows.extend((0..owned).map(|instance| ScheduledProducer {
                key: ConsumerKey {
                    collector: id,
                    instance,
                },
                power_consumption: spec.power_consumption,
                output_per_second: spec.output_per_second,
            }));
        }
        rows
    }

    /// Run the scheduler for this tick and report deficit transitions.
    /// Schedule the current buildings against `fixed_load` without touching
    /// the deficit latch.
    pub fn allocate(
        &self,
        catalog: &PowerCatalog,
        power_multiplier: Fixed64,
        fixed_load: Fixed64,
    ) -> PowerAllocation {
        let generated = self.generated(catalog, power_multiplier);
        schedule(generated, fixed_load, &self.consumers(catalog))
    }

    pub fn tick(
        &mut self,
        catalog: &PowerCatalog,
        power_multiplier: Fixed64,
        fixed_load: Fixed64,
        current_tick: Ticks,
    ) -> (PowerAllocation, Vec<PowerEvent>) {
        let allocation = self.allocate(catalog, power_multiplier, fixed_load);

        let mut events = Vec::new();
        if allocation.deficit && !self.was_deficit {
            self.was_deficit = true;
            tracing::info!(
                shortfall = %(allocation.consumed - allocation.generated),
                "power deficit: fixed load exceeds generation"
            );
            events.push(PowerEvent::Deficit {
                shortfall: allocation.consumed - allocation.generated,
                tick: current_tick,
            });
        } else if !allocation.deficit && self.was_deficit {
            self.was_deficit = false;
            tracing::info!("power restored");
            events.push(PowerEvent::Restored { tick: current_tick });
        }

        (allocation, events)
    }

    /// Prestige reset: every generator and collector is sold off.
    pub fn reset(&mut self) {
        self.generators.clear();
        self.collectors.clear();
        self.was_deficit = false;
    }
}

// ===========================================================================
// Tests
// ===========================================================================
