//! Static factory content: components (recipes) and machine types.

use std::collections::BTreeMap;

use tycoon_core::economy::CostCurve;
use tycoon_core::effect::ComponentBonus;
use tycoon_core::fixed::{Fixed64, Money};
use tycoon_core::id::{ComponentId, MachineTypeId, MachineUpgradeId};
use tycoon_core::rejection::{Entity, Rejection};

/// An input requirement of a component recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecipeInput {
    pub component: ComponentId,
    pub quantity: u64,
}

/// A craftable component. Producing one unit consumes raw materials plus
/// the listed input components.
#[derive(Debug, Clone, PartialEq)]
pub struct FactoryComponent {
    pub id: ComponentId,
    pub name: String,
    pub tier: u32,
    pub inputs: Vec<RecipeInput>,
    pub raw_material_cost: u64,
    /// Seconds per unit at speed 1.
    pub base_production_seconds: Fixed64,
    /// Bonus granted per unit owned.
    pub bonus: Option<ComponentBonus>,
}

/// A one-off improvement to a single machine instance.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineUpgrade {
    pub id: MachineUpgradeId,
    pub name: String,
    pub cost: Money,
    pub speed_percent: Fixed64,
    /// Marks added to the machine, raising its craftable tier.
    pub mark_bonus: u32,
}

/// A machine type that can be bought and placed into a slot.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineConfig {
    pub id: MachineTypeId,
    pub name: String,
    /// Highest tier a mark 1 machine can craft.
    pub base_tier: u32,
    /// Drawn whenever the machine is placed.
    pub power_draw: Fixed64,
    pub base_speed: Fixed64,
    pub cost: CostCurve,
    pub upgrades: Vec<MachineUpgrade>,
}

impl MachineConfig {
    pub fn upgrade(&self, id: MachineUpgradeId) -> Option<&MachineUpgrade> {
        self.upgrades.iter().find(|u| u.id == id)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FactoryCatalog {
    pub components: BTreeMap<ComponentId, FactoryComponent>,
    pub machines: BTreeMap<MachineTypeId, MachineConfig>,
}

impl FactoryCatalog {
    pub fn component(&self, id: ComponentId) -> Result<&FactoryComponent, Rejection> {
        self.components
            .get(&id)
            .ok_or(Rejection::Unknown(Entity::Component(id)))
    }

    pub fn machine(&self, id: MachineTypeId) -> Result<&MachineConfig, Rejection> {
        self.machines
            .get(&id)
            .ok_or(Rejection::Unknown(Entity::MachineType(id)))
    }

    /// True if any machine type offers `id`.
    pub fn upgrade_exists(&self, id: MachineUpgradeId) -> bool {
        self.machines.values().any(|m| m.upgrade(id).is_some())
    }
}
