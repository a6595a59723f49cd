//! Player commands.
//!
//! Each command checks every precondition against the current state, then
//! applies in full. A rejected command returns its reason and leaves the
//! state untouched, so retrying is always safe.

use tycoon_core::economy::scale_money;
use tycoon_core::fixed::Money;
use tycoon_core::id::{
    ArtifactId, BusinessId, CollectorTypeId, ComponentId, GeneratorTypeId, MachineInstanceId, MachineTypeId,
    MachineUpgradeId, SkillId, SlotRef, WorkerId,
};
use tycoon_core::rejection::{Precondition, Rejection};
use tycoon_factory::line::Warning;
use tycoon_prestige::PrestigeOutcome;

use crate::engine::Engine;
use crate::event::GameEvent;

/// Log a rejection at debug level and pass the result through.
fn logged<T>(command: &'static str, result: Result<T, Rejection>) -> Result<T, Rejection> {
    match &result {
        Ok(_) => tracing::debug!(command, "command applied"),
        Err(reason) => tracing::debug!(command, %reason, "command rejected"),
    }
    result
}

impl Engine {
    // -- economy ------------------------------------------------------------

    /// Current price of the next level of `business`, discounts applied.
    pub fn upgrade_cost(&self, business: BusinessId) -> Result<Money, Rejection> {
        let def = self.definition.business(business)?;
        let level = self.state.business_level(business);
        let effects = self.resolve_effects();
        def.upgrade_cost(level)
            .and_then(|base| scale_money(base, effects.upgrade_cost))
            .ok_or(Rejection::InsufficientFunds {
                needed: Money::MAX,
                available: self.state.economy.money,
            })
    }

    /// Buy one level of `business`. Returns the new level.
    pub fn upgrade_business(&mut self, business: BusinessId) -> Result<u32, Rejection> {
        logged("upgrade_business", self.upgrade_business_inner(business))
    }

    fn upgrade_business_inner(&mut self, business: BusinessId) -> Result<u32, Rejection> {
        let cost = self.upgrade_cost(business)?;
        self.state.economy.try_spend(cost)?;
        let level = self.state.business_levels.entry(business).or_insert(0);
        *level = level.saturating_add(1);
        let level = *level;
        self.state.economy.lifetime_levels = self.state.economy.lifetime_levels.saturating_add(1);
        self.events.push(GameEvent::BusinessUpgraded { business, level });
        Ok(level)
    }

    // -- power --------------------------------------------------------------

    pub fn purchase_power_building(&mut self, generator: GeneratorTypeId) -> Result<(), Rejection> {
        let result = self
            .state
            .power
            .generator_price(&self.definition.power, generator)
            .and_then(|price| self.state.economy.try_spend(price))
            .map(|()| self.state.power.add_generator(generator));
        logged("purchase_power_building", result)
    }

    pub fn purchase_material_collector(&mut self, collector: CollectorTypeId) -> Result<(), Rejection> {
        let result = self
            .state
            .power
            .collector_price(&self.definition.power, collector)
            .and_then(|price| self.state.economy.try_spend(price))
            .map(|()| self.state.power.add_collector(collector));
        logged("purchase_material_collector", result)
    }

    // -- factory ------------------------------------------------------------

    /// Buy a machine into storage. Place it with [`Engine::place_machine`].
    pub fn purchase_machine(&mut self, machine: MachineTypeId) -> Result<MachineInstanceId, Rejection> {
        let result = self
            .state
            .factory
            .machine_price(&self.definition.factory, machine)
            .and_then(|price| self.state.economy.try_spend(price))
            .map(|()| self.state.factory.add_machine(machine));
        logged("purchase_machine", result)
    }

    pub fn place_machine(&mut self, machine: MachineInstanceId, at: SlotRef) -> Result<(), Rejection> {
        logged("place_machine", self.state.factory.place_machine(machine, at))
    }

    pub fn remove_machine(&mut self, at: SlotRef) -> Result<MachineInstanceId, Rejection> {
        logged("remove_machine", self.state.factory.remove_machine(at))
    }

    pub fn purchase_machine_upgrade(
        &mut self,
        machine: MachineInstanceId,
        upgrade: MachineUpgradeId,
    ) -> Result<(), Rejection> {
        let catalog = &self.definition.factory;
        let result = self
            .state
            .factory
            .upgrade_price(catalog, machine, upgrade)
            .and_then(|price| self.state.economy.try_spend(price))
            .map(|()| self.state.factory.apply_upgrade(catalog, machine, upgrade));
        logged("purchase_machine_upgrade", result)
    }

    /// Set or clear a slot's recipe. A saturated recipe is accepted with a
    /// warning the caller should show.
    pub fn set_slot_recipe(&mut self, at: SlotRef, recipe: Option<ComponentId>) -> Result<Option<Warning>, Rejection> {
        let result = self
            .state
            .factory
            .set_recipe(&self.definition.factory, at, recipe);
        if let Ok(Some(warning)) = &result {
            tracing::warn!(?warning, ?at, "recipe accepted with warning");
        }
        logged("set_slot_recipe", result)
    }

    // -- workers ------------------------------------------------------------

    pub fn hire_worker(&mut self) -> Result<WorkerId, Rejection> {
        let settings = &self.definition.settings;
        let owned = self.state.factory.roster.len() as u32;
        let result = settings
            .hire_cost
            .price(owned)
            .and_then(|price| self.state.economy.try_spend(price))
            .map(|()| self.state.factory.hire_worker(&settings.worker_energy));
        logged("hire_worker", result)
    }

    pub fn assign_worker(&mut self, worker: WorkerId, machine: MachineInstanceId) -> Result<(), Rejection> {
        logged("assign_worker", self.state.factory.assign_worker(worker, machine))
    }

    pub fn unassign_worker(&mut self, worker: WorkerId) -> Result<(), Rejection> {
        logged("unassign_worker", self.state.factory.unassign_worker(worker))
    }

    // -- meta progression ---------------------------------------------------

    pub fn unlock_skill(&mut self, skill: SkillId) -> Result<(), Rejection> {
        logged("unlock_skill", self.unlock_skill_inner(skill))
    }

    fn unlock_skill_inner(&mut self, skill: SkillId) -> Result<(), Rejection> {
        let def = self.definition.skill(skill)?;
        if self.state.skills.contains(&skill) {
            return Err(Precondition::AlreadyOwned.into());
        }
        if let Some(missing) = def
            .prerequisites
            .iter()
            .find(|p| !self.state.skills.contains(*p))
        {
            return Err(Precondition::MissingPrerequisite(*missing).into());
        }
        self.state.economy.try_spend_points(def.cost_points)?;
        self.state.skills.insert(skill);
        Ok(())
    }

    /// Buy the next headquarters level. Returns the new level.
    pub fn purchase_hq_upgrade(&mut self) -> Result<u32, Rejection> {
        let result = match self.definition.hq_levels.get(self.state.hq_level as usize) {
            None => Err(Precondition::MaxLevel.into()),
            Some(next) => self.state.economy.try_spend(next.cost).map(|()| {
                self.state.hq_level += 1;
                self.state.hq_level
            }),
        };
        logged("purchase_hq_upgrade", result)
    }

    /// Record an artifact found by an outer system.
    pub fn grant_artifact(&mut self, artifact: ArtifactId) -> Result<(), Rejection> {
        let result = self.definition.artifact(artifact).and_then(|_| {
            if self.state.artifacts.insert(artifact) {
                Ok(())
            } else {
                Err(Precondition::AlreadyOwned.into())
            }
        });
        logged("grant_artifact", result)
    }

    // -- prestige -----------------------------------------------------------

    /// Convert lifetime business levels into prestige points and reset.
    ///
    /// With nothing to gain this is a no-op reported as
    /// [`PrestigeOutcome::NoGain`]. Otherwise money returns to the starting
    /// amount, business levels keep only the retained share, and power
    /// buildings and raw materials are cleared. The factory, workers,
    /// skills, HQ and artifacts are kept.
    pub fn perform_prestige(&mut self) -> PrestigeOutcome {
        let economy = &self.state.economy;
        let points = self
            .definition
            .prestige
            .newly_gained_points(economy.lifetime_levels, economy.prestige_points_earned);
        if points == 0 {
            tracing::warn!(
                lifetime_levels = economy.lifetime_levels,
                "prestige skipped: no points to gain"
            );
            return PrestigeOutcome::NoGain;
        }

        // Q.32 percentage points; at most 100 so the kept level never grows.
        let retention = self.resolve_effects().level_retention_percent.to_bits().max(0) as u128;
        let state = &mut self.state;
        state.economy.award_points(points);
        state.economy.times_prestiged = state.economy.times_prestiged.saturating_add(1);
        state.economy.money = self.definition.settings.starting_money;
        for level in state.business_levels.values_mut() {
            let kept = (u128::from(*level) * retention / 100) >> 32;
            *level = u32::try_from(kept).unwrap_or(*level);
        }
        state.business_levels.retain(|_, level| *level > 0);
        state.power.reset();
        state.materials.reset();

        tracing::info!(
            points,
            times_prestiged = state.economy.times_prestiged,
            "prestige performed"
        );
        self.events.push(GameEvent::Prestiged {
            points,
            times_prestiged: self.state.economy.times_prestiged,
        });
        PrestigeOutcome::Gained { points }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
