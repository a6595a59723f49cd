//! The engine: owns definition and state, and runs the tick pipeline.
//!
//! Each step runs seven phases in a fixed order:
//!
//! 1. **Effects** -- fold every active bonus into [`ResolvedEffects`].
//! 2. **Income** -- credit business income and flat income.
//! 3. **Power** -- schedule collectors against generation minus the fixed
//!    machine load.
//! 4. **Collect** -- credit raw materials from powered collectors.
//! 5. **Lines** -- advance every production slot.
//! 6. **Workers** -- apply energy once per worker.
//! 7. **Bookkeeping** -- tick counter and elapsed time.
//!
//! Commands (see `command.rs`) run between steps, never inside one.

use std::collections::BTreeSet;

use rust_decimal::Decimal;
use tycoon_core::effect::{Effect, EffectKind, EffectLedger, EffectSource, IncomeScope, ResolvedEffects};
use tycoon_core::fixed::{Fixed64, Money, count_to_fixed, fixed_to_decimal};
use tycoon_core::id::WorkerId;
use tycoon_factory::LineContext;
use tycoon_power::PowerAllocation;

use crate::definition::GameDefinition;
use crate::event::GameEvent;
use crate::state::GameState;

/// Result of an [`Engine::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AdvanceResult {
    pub steps_run: u64,
    /// Game seconds actually simulated.
    pub simulated_seconds: Fixed64,
    /// Seconds dropped by the catch-up cap.
    pub discarded_seconds: Fixed64,
}

pub struct Engine {
    pub(crate) definition: GameDefinition,
    pub(crate) state: GameState,
    pub(crate) events: Vec<GameEvent>,
}

impl Engine {
    /// Start a new game.
    pub fn new(definition: GameDefinition) -> Self {
        let state = GameState::new(&definition);
        Self::from_parts(definition, state)
    }

    /// Wrap an existing state, e.g. one restored from a snapshot.
    pub fn from_parts(definition: GameDefinition, state: GameState) -> Self {
        Self {
            definition,
            state,
            events: Vec::new(),
        }
    }

    pub fn definition(&self) -> &GameDefinition {
        &self.definition
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    /// Take every event emitted since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    // -----------------------------------------------------------------------
    // Effects
    // -----------------------------------------------------------------------

    /// Fold all active bonuses for the current state.
    pub fn resolve_effects(&self) -> ResolvedEffects {
        let def = &self.definition;
        let state = &self.state;
        let mut ledger = EffectLedger::new();

        if state.economy.prestige_points > 0 {
            let percent = count_to_fixed(u64::from(state.economy.prestige_points))
                .saturating_mul(def.settings.prestige_income_percent_per_point);
            ledger.push(
                EffectSource::Prestige,
                Effect::new(EffectKind::IncomePercent(IncomeScope::Global), percent),
            );
        }
        for id in &state.skills {
            if let Some(skill) = def.skills.get(id) {
                ledger.extend(EffectSource::Skill(*id), &skill.effects);
            }
        }
        for (index, level) in def.hq_levels.iter().take(state.hq_level as usize).enumerate() {
            ledger.extend(EffectSource::HqLevel(index as u32 + 1), &level.effects);
        }
        for id in &state.artifacts {
            if let Some(artifact) = def.artifacts.get(id) {
                ledger.extend(EffectSource::Artifact(*id), &artifact.effects);
            }
        }
        state
            .factory
            .push_component_bonuses(&def.factory, &mut ledger);

        ledger.resolve()
    }

    // -----------------------------------------------------------------------
    // Advance
    // -----------------------------------------------------------------------

    /// Run one step of `tick_seconds`.
    pub fn step(&mut self) {
        let dt = self.definition.settings.tick_seconds;
        self.step_internal(dt);
    }

    /// Simulate `elapsed` seconds as whole `tick_seconds` steps plus one
    /// final partial step. Anything past `max_catch_up_seconds` is dropped.
    pub fn advance(&mut self, elapsed: Fixed64) -> AdvanceResult {
        let settings = &self.definition.settings;
        let tick = settings.tick_seconds;
        let cap = settings.max_catch_up_seconds.max(Fixed64::ZERO);
        let elapsed = elapsed.max(Fixed64::ZERO);
        let budget = elapsed.min(cap);

        let mut result = AdvanceResult {
            discarded_seconds: elapsed - budget,
            ..AdvanceResult::default()
        };
        if tick <= Fixed64::ZERO {
            if budget > Fixed64::ZERO {
                self.step_internal(budget);
                result.steps_run = 1;
                result.simulated_seconds = budget;
            }
            return result;
        }

        let mut remaining = budget;
        while remaining >= tick {
            self.step_internal(tick);
            remaining -= tick;
            result.steps_run += 1;
        }
        if remaining > Fixed64::ZERO {
            self.step_internal(remaining);
            result.steps_run += 1;
        }
        result.simulated_seconds = budget;
        result
    }

    /// Replay an absence of `elapsed_seconds`, e.g. after loading a save.
    pub fn resume(&mut self, elapsed_seconds: Fixed64) -> AdvanceResult {
        let result = self.advance(elapsed_seconds);
        tracing::info!(
            steps = result.steps_run,
            simulated = %result.simulated_seconds,
            discarded = %result.discarded_seconds,
            "catch-up replay finished"
        );
        result
    }

    // -----------------------------------------------------------------------
    // Internal: single step
    // -----------------------------------------------------------------------

    fn step_internal(&mut self, dt: Fixed64) {
        // Phase 1: Effects.
        let effects = self.resolve_effects();

        // Phase 2: Income.
        self.phase_income(&effects, dt);

        // Phase 3: Power.
        let allocation = self.phase_power(&effects);

        // Phase 4: Collect.
        let rate = allocation
            .total_output_per_second
            .saturating_mul(effects.material_output);
        self.state.materials.collect(rate, dt);

        // Phase 5: Lines.
        let crafting = self.phase_lines(&effects, allocation.deficit, dt);

        // Phase 6: Workers.
        let worker_events = self.state.factory.tick_workers(
            &crafting,
            dt,
            &self.definition.settings.worker_energy,
            effects.energy_recovery,
        );
        self.events.extend(worker_events.into_iter().map(GameEvent::from));

        // Phase 7: Bookkeeping.
        self.state.last_allocation = allocation;
        self.state.tick += 1;
        self.state.elapsed_seconds = self.state.elapsed_seconds.saturating_add(dt);
    }

    /// Income per second of every business with multipliers, plus flat
    /// income.
    pub(crate) fn income_rate(&self, effects: &ResolvedEffects) -> Money {
        let mut total = Decimal::ZERO;
        for (id, &level) in &self.state.business_levels {
            let Some(business) = self.definition.businesses.get(id) else {
                continue;
            };
            let base = business.income_per_second(level);
            let scaled = base.saturating_mul(fixed_to_decimal(effects.income_multiplier(*id)));
            total = total.saturating_add(scaled);
        }
        total.saturating_add(fixed_to_decimal(effects.flat_income_per_second))
    }

    fn phase_income(&mut self, effects: &ResolvedEffects, dt: Fixed64) {
        let earned = self.income_rate(effects).saturating_mul(fixed_to_decimal(dt));
        self.state.economy.earn(earned);
    }

    fn phase_power(&mut self, effects: &ResolvedEffects) -> PowerAllocation {
        let fixed_load = self.state.factory.fixed_load(&self.definition.factory);
        let (allocation, events) = self.state.power.tick(
            &self.definition.power,
            effects.power_output,
            fixed_load,
            self.state.tick,
        );
        self.events.extend(events.into_iter().map(GameEvent::from));
        allocation
    }

    fn phase_lines(&mut self, effects: &ResolvedEffects, deficit: bool, dt: Fixed64) -> BTreeSet<WorkerId> {
        let ctx = LineContext {
            catalog: &self.definition.factory,
            dt,
            power_deficit: deficit,
            machine_speed: effects.machine_speed,
        };
        let tick = self
            .state
            .factory
            .tick_lines(&ctx, &mut self.state.materials);
        self.events.extend(tick.events.into_iter().map(GameEvent::from));
        tick.crafting
    }
}

// ===========================================================================
// Tests
// ===========================================================================
