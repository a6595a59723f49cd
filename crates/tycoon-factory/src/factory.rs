//! The factory aggregate: machines, lines, produced components, workers.
//!
//! Commands validate fully before touching state. [`Factory::tick_lines`]
//! advances every slot once in line/slot order, re-checking its
//! preconditions each tick, and debits materials only when a craft
//! completes.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tycoon_core::effect::EffectLedger;
use tycoon_core::fixed::{Fixed64, Money};
use tycoon_core::id::{ComponentId, MachineInstanceId, MachineTypeId, MachineUpgradeId, SlotRef, WorkerId};
use tycoon_core::invariant;
use tycoon_core::rejection::{Entity, Precondition, Rejection};

use crate::catalog::{FactoryCatalog, FactoryComponent};
use crate::inventory::{ComponentInventory, MaterialPool};
use crate::line::{BlockReason, CraftTimer, FactoryEvent, ProductionLine, ProductionSlot, Warning};
use crate::machine::MachineInstance;
use crate::worker::{EnergyConfig, Roster, WorkerEvent, WorkerStatus};

/// Per-tick inputs the lines read but never write.
#[derive(Debug, Clone, Copy)]
pub struct LineContext<'a> {
    pub catalog: &'a FactoryCatalog,
    /// Real elapsed seconds.
    pub dt: Fixed64,
    pub power_deficit: bool,
    /// Global machine speed multiplier.
    pub machine_speed: Fixed64,
}

/// Output of [`Factory::tick_lines`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineTick {
    pub events: Vec<FactoryEvent>,
    /// Workers whose slot crafted this tick; fed to the roster.
    pub crafting: BTreeSet<WorkerId>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Factory {
    pub machines: SlotMap<MachineInstanceId, MachineInstance>,
    pub lines: Vec<ProductionLine>,
    pub components: ComponentInventory,
    pub roster: Roster,
}

impl Factory {
    pub fn new(lines: u32, slots_per_line: u32) -> Self {
        Self {
            machines: SlotMap::with_key(),
            lines: (0..lines).map(|_| ProductionLine::new(slots_per_line)).collect(),
            components: ComponentInventory::default(),
            roster: Roster::new(),
        }
    }

    // -- lookups ------------------------------------------------------------

    pub fn slot(&self, at: SlotRef) -> Result<&ProductionSlot, Rejection> {
        self.lines
            .get(at.line.0 as usize)
            .and_then(|l| l.slots.get(at.slot as usize))
            .ok_or(Rejection::Unknown(Entity::Slot(at)))
    }

    fn slot_mut(&mut self, at: SlotRef) -> Result<&mut ProductionSlot, Rejection> {
        self.lines
            .get_mut(at.line.0 as usize)
            .and_then(|l| l.slots.get_mut(at.slot as usize))
            .ok_or(Rejection::Unknown(Entity::Slot(at)))
    }

    /// Every slot with its address, in tick order.
    pub fn slots(&self) -> impl Iterator<Item = (SlotRef, &ProductionSlot)> {
        self.lines.iter().enumerate().flat_map(|(li, line)| {
            line.slots
                .iter()
                .enumerate()
                .map(move |(si, slot)| (SlotRef::new(li as u32, si as u32), slot))
        })
    }

    pub fn machine(&self, id: MachineInstanceId) -> Result<&MachineInstance, Rejection> {
        self.machines
            .get(id)
            .ok_or(Rejection::Unknown(Entity::Machine(id)))
    }

    pub fn machines_of_type(&self, config: MachineTypeId) -> u32 {
        self.machines.values().filter(|m| m.config == config).count() as u32
    }

    /// Power drawn by every placed machine.
    pub fn fixed_load(&self, catalog: &FactoryCatalog) -> Fixed64 {
        self.machines
            .values()
            .filter(|m| m.slot.is_some())
            .filter_map(|m| catalog.machines.get(&m.config))
            .fold(Fixed64::ZERO, |acc, c| acc.saturating_add(c.power_draw))
    }

    /// Record every component bonus, clamped, from total owned counts.
    pub fn push_component_bonuses(&self, catalog: &FactoryCatalog, ledger: &mut EffectLedger) {
        for (id, owned) in self.components.iter() {
            if let Some(FactoryComponent {
                bonus: Some(bonus), ..
            }) = catalog.components.get(&id)
            {
                ledger.push_component(id, bonus, owned);
            }
        }
    }

    // -- machines -----------------------------------------------------------

    /// Price of the next machine of `config`.
    pub fn machine_price(&self, catalog: &FactoryCatalog, config: MachineTypeId) -> Result<Money, Rejection> {
        catalog
            .machine(config)?
            .cost
            .price(self.machines_of_type(config))
    }

    /// Add a bought machine to storage, unplaced. The caller has paid.
    pub fn add_machine(&mut self, config: MachineTypeId) -> MachineInstanceId {
        self.machines.insert(MachineInstance::new(config))
    }

    pub fn place_machine(&mut self, machine: MachineInstanceId, at: SlotRef) -> Result<(), Rejection> {
        if self.machine(machine)?.slot.is_some() {
            return Err(Precondition::MachineAlreadyPlaced.into());
        }
        let slot = self.slot_mut(at)?;
        if slot.machine.is_some() {
            return Err(Precondition::SlotOccupied.into());
        }
        *slot = ProductionSlot {
            machine: Some(machine),
            ..ProductionSlot::default()
        };
        if let Some(m) = self.machines.get_mut(machine) {
            m.slot = Some(at);
        }
        tracing::debug!(?machine, ?at, "machine placed");
        Ok(())
    }

    /// Take the machine out of `at` back into storage. Recipe and progress
    /// are discarded; the worker stays with the machine.
    pub fn remove_machine(&mut self, at: SlotRef) -> Result<MachineInstanceId, Rejection> {
        let slot = self.slot_mut(at)?;
        let Some(machine) = slot.machine else {
            return Err(Precondition::SlotEmpty.into());
        };
        *slot = ProductionSlot::default();
        match self.machines.get_mut(machine) {
            Some(m) => m.slot = None,
            None => invariant::violation("slot referenced a missing machine"),
        }
        tracing::debug!(?machine, ?at, "machine removed");
        Ok(machine)
    }

    /// Validate an upgrade purchase and quote its price.
    pub fn upgrade_price(
        &self,
        catalog: &FactoryCatalog,
        machine: MachineInstanceId,
        upgrade: MachineUpgradeId,
    ) -> Result<Money, Rejection> {
        let instance = self.machine(machine)?;
        let config = catalog.machine(instance.config)?;
        let Some(spec) = config.upgrade(upgrade) else {
            return Err(if catalog.upgrade_exists(upgrade) {
                Precondition::UpgradeNotApplicable.into()
            } else {
                Rejection::Unknown(Entity::MachineUpgrade(upgrade))
            });
        };
        if instance.upgrades.contains(&upgrade) {
            return Err(Precondition::AlreadyOwned.into());
        }
        Ok(spec.cost)
    }

    /// Apply an upgrade already validated by [`Factory::upgrade_price`].
    pub fn apply_upgrade(&mut self, catalog: &FactoryCatalog, machine: MachineInstanceId, upgrade: MachineUpgradeId) {
        if let Some(instance) = self.machines.get_mut(machine)
            && let Some(config) = catalog.machines.get(&instance.config)
        {
            instance.apply_upgrade(config, upgrade);
        }
    }

    // -- recipes ------------------------------------------------------------

    /// Set or clear the recipe of `at`. Changing the recipe discards
    /// progress; setting the same one again keeps it.
    pub fn set_recipe(
        &mut self,
        catalog: &FactoryCatalog,
        at: SlotRef,
        recipe: Option<ComponentId>,
    ) -> Result<Option<Warning>, Rejection> {
        let slot = self.slot(at)?;
        let Some(machine_id) = slot.machine else {
            return Err(Precondition::SlotEmpty.into());
        };

        let mut warning = None;
        if let Some(component_id) = recipe {
            let component = catalog.component(component_id)?;
            let machine = self.machine(machine_id)?;
            let config = catalog.machine(machine.config)?;
            let max = machine.max_tier(config);
            if component.tier > max {
                return Err(Precondition::TierTooHigh {
                    tier: component.tier,
                    max,
                }
                .into());
            }
            if let Some(bonus) = &component.bonus
                && bonus.is_saturated(self.components.count(component_id))
            {
                warning = Some(Warning::SaturatedBonus {
                    component: component_id,
                });
            }
        }

        let slot = self.slot_mut(at)?;
        if slot.recipe != recipe {
            slot.recipe = recipe;
            slot.discard_progress();
            tracing::debug!(?at, ?recipe, "recipe set");
        }
        Ok(warning)
    }

    // -- workers ------------------------------------------------------------

    pub fn hire_worker(&mut self, config: &EnergyConfig) -> WorkerId {
        self.roster.hire(config)
    }

    fn discard_progress_of(&mut self, machine: MachineInstanceId) {
        let Some(at) = self.machines.get(machine).and_then(|m| m.slot) else {
            return;
        };
        if let Ok(slot) = self.slot_mut(at)
            && slot.timer.is_some()
        {
            slot.discard_progress();
            tracing::debug!(?at, "craft abandoned: worker changed");
        }
    }

    /// Put `worker` on `machine`. Crafts on the machine it left and on the
    /// machine it takes over are abandoned.
    pub fn assign_worker(&mut self, worker: WorkerId, machine: MachineInstanceId) -> Result<(), Rejection> {
        self.machine(machine)?;
        let previous = self.roster.get(worker)?.machine;
        if previous == Some(machine) {
            return Ok(());
        }
        self.roster.assign(worker, machine)?;
        if let Some(old) = previous {
            self.discard_progress_of(old);
        }
        self.discard_progress_of(machine);
        tracing::debug!(?worker, ?machine, "worker assigned");
        Ok(())
    }

    pub fn unassign_worker(&mut self, worker: WorkerId) -> Result<(), Rejection> {
        if let Some(machine) = self.roster.unassign(worker)? {
            self.discard_progress_of(machine);
        }
        Ok(())
    }

    // -- tick ---------------------------------------------------------------

    /// Advance every slot by `ctx.dt`.
    pub fn tick_lines(&mut self, ctx: &LineContext<'_>, materials: &mut MaterialPool) -> LineTick {
        let Self {
            machines,
            lines,
            components,
            roster,
        } = self;
        let mut out = LineTick::default();

        for (li, line) in lines.iter_mut().enumerate() {
            for (si, slot) in line.slots.iter_mut().enumerate() {
                let at = SlotRef::new(li as u32, si as u32);
                let (Some(machine_id), Some(recipe_id)) = (slot.machine, slot.recipe) else {
                    continue;
                };
                let Some(machine) = machines.get(machine_id) else {
                    invariant::violation("slot referenced a missing machine");
                    continue;
                };
                let (Some(config), Some(component)) = (
                    ctx.catalog.machines.get(&machine.config),
                    ctx.catalog.components.get(&recipe_id),
                ) else {
                    continue;
                };

                let worker = match check_preconditions(
                    roster,
                    machine_id,
                    ctx.power_deficit,
                    materials,
                    components,
                    component,
                ) {
                    Ok(worker) => worker,
                    Err(reason) => {
                        if slot.blocked != Some(reason) {
                            tracing::debug!(?at, ?reason, "slot blocked");
                            out.events.push(FactoryEvent::SlotBlocked { slot: at, reason });
                        }
                        slot.blocked = Some(reason);
                        continue;
                    }
                };

                if slot.blocked.take().is_some() {
                    out.events.push(FactoryEvent::SlotResumed { slot: at });
                }
                if slot.timer.is_none() {
                    out.events.push(FactoryEvent::CraftStarted {
                        slot: at,
                        component: recipe_id,
                    });
                }
                let timer = slot
                    .timer
                    .get_or_insert_with(|| CraftTimer::start(component.base_production_seconds));
                out.crafting.insert(worker);

                let speed = machine.speed(config, ctx.machine_speed);
                timer.remaining = timer.remaining.saturating_sub(ctx.dt.saturating_mul(speed));
                if timer.remaining <= Fixed64::ZERO {
                    materials.debit(component.raw_material_cost);
                    for input in &component.inputs {
                        components.debit(input.component, input.quantity);
                    }
                    components.add(recipe_id, 1);
                    slot.timer = None;
                    out.events.push(FactoryEvent::ComponentProduced {
                        slot: at,
                        component: recipe_id,
                    });
                }
            }
        }
        out
    }

    /// Apply worker energy for this tick, once per worker.
    pub fn tick_workers(
        &mut self,
        crafting: &BTreeSet<WorkerId>,
        dt: Fixed64,
        config: &EnergyConfig,
        recovery_multiplier: Fixed64,
    ) -> Vec<WorkerEvent> {
        self.roster.tick(crafting, dt, config, recovery_multiplier)
    }
}

/// The worker who will craft, or why the slot cannot.
fn check_preconditions(
    roster: &Roster,
    machine: MachineInstanceId,
    power_deficit: bool,
    materials: &MaterialPool,
    components: &ComponentInventory,
    recipe: &FactoryComponent,
) -> Result<WorkerId, BlockReason> {
    let worker = roster.worker_on(machine).ok_or(BlockReason::NoWorker)?;
    if roster
        .get(worker)
        .map(|w| w.status == WorkerStatus::Resting)
        .unwrap_or(true)
    {
        return Err(BlockReason::WorkerResting);
    }
    if power_deficit {
        return Err(BlockReason::PowerDeficit);
    }
    if !materials.has(recipe.raw_material_cost) {
        return Err(BlockReason::RawMaterials);
    }
    if let Some(missing) = recipe
        .inputs
        .iter()
        .find(|input| !components.has(input.component, input.quantity))
    {
        return Err(BlockReason::MissingInput(missing.component));
    }
    Ok(worker)
}

// ===========================================================================
// Tests
// ===========================================================================
