//! Serde structs for the on-disk game file.
//!
//! Everything refers to everything else by name. Rates, durations and
//! percentages are `f64`; money is read as a decimal (a number or a
//! string). The loader turns these into engine types.

use rust_decimal::Decimal;
use serde::Deserialize;

// ===========================================================================
// Top level
// ===========================================================================

/// The whole game file.
#[derive(Debug, Clone, Deserialize)]
pub struct GameData {
    pub businesses: Vec<BusinessData>,
    #[serde(default)]
    pub generators: Vec<GeneratorData>,
    #[serde(default)]
    pub collectors: Vec<CollectorData>,
    #[serde(default)]
    pub components: Vec<ComponentData>,
    #[serde(default)]
    pub machines: Vec<MachineData>,
    #[serde(default)]
    pub skills: Vec<SkillData>,
    #[serde(default)]
    pub hq_levels: Vec<HqLevelData>,
    #[serde(default)]
    pub artifacts: Vec<ArtifactData>,
    /// Stock names usable as effect targets.
    #[serde(default)]
    pub stocks: Vec<String>,
    pub prestige: PrestigeData,
    #[serde(default)]
    pub settings: SettingsData,
}

// ===========================================================================
// Shared pieces
// ===========================================================================

/// `base_cost * growth^owned`.
#[derive(Debug, Clone, Deserialize)]
pub struct CostCurveData {
    pub base_cost: Decimal,
    #[serde(default = "default_growth")]
    pub growth: Decimal,
    #[serde(default)]
    pub max_instances: Option<u32>,
}

fn default_growth() -> Decimal {
    Decimal::ONE
}

/// What an effect modifies.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectTargetData {
    GlobalIncome,
    /// Income of one business, by name.
    BusinessIncome(String),
    FlatIncomePerSecond,
    UpgradeCost,
    MachineSpeed,
    PowerOutput,
    MaterialOutput,
    EnergyRecovery,
    LevelRetention,
    /// Return of one stock, by name.
    StockReturn(String),
}

/// A bonus in percentage points (money per second for flat income).
#[derive(Debug, Clone, Deserialize)]
pub struct EffectData {
    pub target: EffectTargetData,
    pub value: f64,
}

// ===========================================================================
// Economy
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct BusinessData {
    pub name: String,
    pub income_per_level: Decimal,
    pub upgrade_cost: Decimal,
    pub cost_growth: Decimal,
}

// ===========================================================================
// Power
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GeneratorData {
    pub name: String,
    pub power_output: f64,
    pub cost: CostCurveData,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CollectorData {
    pub name: String,
    pub power_consumption: f64,
    pub output_per_second: f64,
    pub cost: CostCurveData,
}

// ===========================================================================
// Factory
// ===========================================================================

/// A craftable component. `inputs` are `(component name, quantity)`.
#[derive(Debug, Clone, Deserialize)]
pub struct ComponentData {
    pub name: String,
    pub tier: u32,
    #[serde(default)]
    pub inputs: Vec<(String, u64)>,
    #[serde(default)]
    pub raw_material_cost: u64,
    pub production_seconds: f64,
    #[serde(default)]
    pub bonus: Option<ComponentBonusData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ComponentBonusData {
    pub target: EffectTargetData,
    pub per_unit: f64,
    #[serde(default)]
    pub max: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MachineData {
    pub name: String,
    pub tier: u32,
    pub power_draw: f64,
    #[serde(default = "default_speed")]
    pub speed: f64,
    pub cost: CostCurveData,
    #[serde(default)]
    pub upgrades: Vec<MachineUpgradeData>,
}

fn default_speed() -> f64 {
    1.0
}

#[derive(Debug, Clone, Deserialize)]
pub struct MachineUpgradeData {
    pub name: String,
    pub cost: Decimal,
    #[serde(default)]
    pub speed_percent: f64,
    #[serde(default)]
    pub mark_bonus: u32,
}

// ===========================================================================
// Meta progression
// ===========================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct SkillData {
    pub name: String,
    pub cost_points: u32,
    #[serde(default)]
    pub requires: Vec<String>,
    pub effects: Vec<EffectData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HqLevelData {
    pub cost: Decimal,
    pub effects: Vec<EffectData>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactData {
    pub name: String,
    pub effects: Vec<EffectData>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PrestigeCurveData {
    Linear { base: u64, increment: u64 },
    Exponential { base: u64, multiplier: f64 },
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrestigeData {
    pub curve: PrestigeCurveData,
    #[serde(default)]
    pub max_points: Option<u32>,
}

// ===========================================================================
// Settings
// ===========================================================================

/// Worker energy tunables. Missing fields keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EnergyData {
    pub max_energy: Option<f64>,
    pub depletion_per_second: Option<f64>,
    pub recovery_per_second: Option<f64>,
}

/// Simulation settings. Missing fields keep their defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SettingsData {
    pub tick_seconds: Option<f64>,
    pub max_catch_up_seconds: Option<f64>,
    pub starting_money: Option<Decimal>,
    pub prestige_income_percent_per_point: Option<f64>,
    pub worker_energy: EnergyData,
    pub hire_cost: Option<CostCurveData>,
    pub lines: Option<u32>,
    pub slots_per_line: Option<u32>,
}
