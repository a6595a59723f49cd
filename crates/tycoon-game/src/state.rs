//! The authoritative mutable game state.
//!
//! One struct owns every mutable counter. Systems receive it by reference
//! from the engine; nothing holds a global.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tycoon_core::economy::PlayerEconomy;
use tycoon_core::fixed::{Fixed64, Ticks};
use tycoon_core::id::{ArtifactId, BusinessId, SkillId};
use tycoon_factory::Factory;
use tycoon_factory::inventory::MaterialPool;
use tycoon_power::{PowerAllocation, PowerGrid};

use crate::definition::GameDefinition;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GameState {
    pub economy: PlayerEconomy,
    /// Missing entries are level 0.
    pub business_levels: BTreeMap<BusinessId, u32>,
    pub power: PowerGrid,
    pub materials: MaterialPool,
    pub factory: Factory,
    pub skills: BTreeSet<SkillId>,
    pub hq_level: u32,
    pub artifacts: BTreeSet<ArtifactId>,
    pub tick: Ticks,
    /// Game seconds simulated since the start.
    pub elapsed_seconds: Fixed64,
    /// Scheduler output of the last tick.
    pub last_allocation: PowerAllocation,
}

impl GameState {
    /// A fresh game for `definition`.
    pub fn new(definition: &GameDefinition) -> Self {
        let settings = &definition.settings;
        Self {
            economy: PlayerEconomy::new(settings.starting_money),
            business_levels: BTreeMap::new(),
            power: PowerGrid::new(),
            materials: MaterialPool::default(),
            factory: Factory::new(settings.lines, settings.slots_per_line),
            skills: BTreeSet::new(),
            hq_level: 0,
            artifacts: BTreeSet::new(),
            tick: 0,
            elapsed_seconds: Fixed64::ZERO,
            last_allocation: PowerAllocation::default(),
        }
    }

    pub fn business_level(&self, id: BusinessId) -> u32 {
        self.business_levels.get(&id).copied().unwrap_or(0)
    }
}
