//! Static game content and simulation settings.
//!
//! A [`GameDefinition`] is plain data: loaded once (see the `tycoon-data`
//! crate) and never mutated by the simulation.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tycoon_core::economy::{Business, CostCurve};
use tycoon_core::effect::Effect;
use tycoon_core::fixed::{Fixed64, Money};
use tycoon_core::id::{ArtifactId, BusinessId, SkillId};
use tycoon_core::rejection::{Entity, Rejection};
use tycoon_factory::catalog::FactoryCatalog;
use tycoon_factory::worker::EnergyConfig;
use tycoon_power::PowerCatalog;
use tycoon_prestige::PrestigeModel;

/// A permanent upgrade bought with prestige points.
#[derive(Debug, Clone, PartialEq)]
pub struct Skill {
    pub id: SkillId,
    pub name: String,
    pub cost_points: u32,
    pub prerequisites: Vec<SkillId>,
    pub effects: Vec<Effect>,
}

/// One headquarters level. Levels are bought in order and their effects
/// stack.
#[derive(Debug, Clone, PartialEq)]
pub struct HqLevel {
    pub cost: Money,
    pub effects: Vec<Effect>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Artifact {
    pub id: ArtifactId,
    pub name: String,
    pub effects: Vec<Effect>,
}

/// Tunables for the tick loop and new games.
#[derive(Debug, Clone, PartialEq)]
pub struct SimSettings {
    /// Seconds of game time per tick.
    pub tick_seconds: Fixed64,
    /// Longest absence replayed on resume.
    pub max_catch_up_seconds: Fixed64,
    pub starting_money: Money,
    /// Global income bonus per unspent prestige point.
    pub prestige_income_percent_per_point: Fixed64,
    pub worker_energy: EnergyConfig,
    /// Price of the Nth worker.
    pub hire_cost: CostCurve,
    pub lines: u32,
    pub slots_per_line: u32,
}

impl Default for SimSettings {
    fn default() -> Self {
        Self {
            tick_seconds: Fixed64::ONE,
            max_catch_up_seconds: Fixed64::from_num(8 * 60 * 60),
            starting_money: Decimal::ZERO,
            prestige_income_percent_per_point: Fixed64::from_num(2),
            worker_energy: EnergyConfig::default(),
            hire_cost: CostCurve {
                base_cost: Decimal::from(100),
                growth: Decimal::new(15, 1),
                max_instances: None,
            },
            lines: 2,
            slots_per_line: 4,
        }
    }
}

/// Everything static about a game.
#[derive(Debug, Clone, PartialEq)]
pub struct GameDefinition {
    pub businesses: BTreeMap<BusinessId, Business>,
    pub power: PowerCatalog,
    pub factory: FactoryCatalog,
    pub skills: BTreeMap<SkillId, Skill>,
    pub hq_levels: Vec<HqLevel>,
    pub artifacts: BTreeMap<ArtifactId, Artifact>,
    pub prestige: PrestigeModel,
    pub settings: SimSettings,
}

impl GameDefinition {
    pub fn business(&self, id: BusinessId) -> Result<&Business, Rejection> {
        self.businesses
            .get(&id)
            .ok_or(Rejection::Unknown(Entity::Business(id)))
    }

    pub fn skill(&self, id: SkillId) -> Result<&Skill, Rejection> {
        self.skills
            .get(&id)
            .ok_or(Rejection::Unknown(Entity::Skill(id)))
    }

    pub fn artifact(&self, id: ArtifactId) -> Result<&Artifact, Rejection> {
        self.artifacts
            .get(&id)
            .ok_or(Rejection::Unknown(Entity::Artifact(id)))
    }
}
