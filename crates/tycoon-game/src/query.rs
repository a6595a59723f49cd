//! Read-only views for the presentation layer.

use tycoon_core::fixed::{Fixed64, Money, fixed_to_decimal};
use tycoon_core::id::{BusinessId, ComponentId, MachineInstanceId, SlotRef, WorkerId};
use tycoon_core::rejection::Rejection;
use tycoon_factory::line::{CraftTimer, ProductionSlot, SlotPhase};
use tycoon_factory::worker::WorkerStatus;
use tycoon_power::PowerAllocation;
use tycoon_prestige::PrestigePreview;

use crate::engine::Engine;

/// One production slot as the player sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotView {
    pub at: SlotRef,
    pub phase: SlotPhase,
    pub machine: Option<MachineInstanceId>,
    pub recipe: Option<ComponentId>,
    /// Present while crafting, and while blocked with paused progress.
    pub timer: Option<CraftTimer>,
    /// Completed fraction of the current craft, when there is one.
    pub progress: Option<Fixed64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkerView {
    pub id: WorkerId,
    pub energy: Fixed64,
    pub status: WorkerStatus,
    pub machine: Option<MachineInstanceId>,
}

fn slot_view(at: SlotRef, slot: &ProductionSlot) -> SlotView {
    SlotView {
        at,
        phase: slot.phase(),
        machine: slot.machine,
        recipe: slot.recipe,
        timer: slot.timer,
        progress: slot.timer.map(|t| t.progress()),
    }
}

impl Engine {
    /// Income per second of one business, multipliers applied.
    pub fn income_per_second(&self, business: BusinessId) -> Result<Money, Rejection> {
        let def = self.definition.business(business)?;
        let effects = self.resolve_effects();
        let base = def.income_per_second(self.state.business_level(business));
        Ok(base.saturating_mul(fixed_to_decimal(effects.income_multiplier(business))))
    }

    /// Income per second across all businesses, plus flat income.
    pub fn total_income_per_second(&self) -> Money {
        self.income_rate(&self.resolve_effects())
    }

    pub fn money(&self) -> Money {
        self.state.economy.money
    }

    pub fn prestige_points(&self) -> u32 {
        self.state.economy.prestige_points
    }

    /// Generated minus consumed power for the buildings and placed machines
    /// owned right now. Purchases made since the last tick count.
    pub fn net_power(&self) -> Fixed64 {
        let effects = self.resolve_effects();
        let fixed_load = self.state.factory.fixed_load(&self.definition.factory);
        self.state
            .power
            .allocate(&self.definition.power, effects.power_output, fixed_load)
            .net_power
    }

    /// The allocation the last tick ran with.
    pub fn power_allocation(&self) -> &PowerAllocation {
        &self.state.last_allocation
    }

    pub fn raw_materials(&self) -> u64 {
        self.state.materials.amount
    }

    pub fn component_count(&self, component: ComponentId) -> u64 {
        self.state.factory.components.count(component)
    }

    pub fn slot_view(&self, at: SlotRef) -> Result<SlotView, Rejection> {
        let slot = self.state.factory.slot(at)?;
        Ok(slot_view(at, slot))
    }

    /// Every slot, line by line.
    pub fn slot_views(&self) -> Vec<SlotView> {
        self.state
            .factory
            .slots()
            .map(|(at, slot)| slot_view(at, slot))
            .collect()
    }

    pub fn workers(&self) -> Vec<WorkerView> {
        self.state
            .factory
            .roster
            .iter()
            .map(|(id, w)| WorkerView {
                id,
                energy: w.energy,
                status: w.status,
                machine: w.machine,
            })
            .collect()
    }

    /// What a prestige right now would award.
    pub fn prestige_preview(&self) -> PrestigePreview {
        let economy = &self.state.economy;
        self.definition
            .prestige
            .preview(economy.lifetime_levels, economy.prestige_points_earned)
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use crate::test_utils::*;
    use tycoon_core::fixed::Fixed64;

    // -----------------------------------------------------------------------
    // Test 1: Net power counts purchases made since the last tick
    // -----------------------------------------------------------------------
    #[test]
    fn net_power_tracks_purchases_between_ticks() {
        let (mut engine, _, _) = crafting_engine(0);
        // One panel against one placed press, before any tick has run.
        assert_eq!(engine.net_power(), fixed(40.0));
        assert_eq!(engine.power_allocation().net_power, Fixed64::ZERO);

        engine.purchase_power_building(SOLAR).unwrap();
        let press = engine.purchase_machine(PRESS).unwrap();
        engine.place_machine(press, slot(0, 1)).unwrap();
        assert_eq!(engine.net_power(), fixed(80.0));

        engine.purchase_material_collector(SCRAP_PICKER).unwrap();
        assert_eq!(engine.net_power(), fixed(70.0));

        engine.step();
        assert_eq!(engine.power_allocation().net_power, engine.net_power());
    }

    // -----------------------------------------------------------------------
    // Test 2: Slot views report craft progress
    // -----------------------------------------------------------------------
    #[test]
    fn slot_view_reports_progress() {
        let (mut engine, _, _) = crafting_engine(10);
        assert_eq!(engine.slot_view(slot(0, 0)).unwrap().progress, None);

        engine.step();
        assert_eq!(engine.slot_view(slot(0, 0)).unwrap().progress, Some(fixed(0.5)));

        engine.step();
        assert_eq!(engine.component_count(PLATE), 1);
        assert_eq!(engine.slot_views()[0].progress, None);
    }
}
