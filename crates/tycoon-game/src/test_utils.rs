//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tycoon_core::economy::{Business, CostCurve};
use tycoon_core::effect::{ComponentBonus, Effect, EffectKind, IncomeScope};
use tycoon_core::fixed::{Fixed64, Money};
use tycoon_core::id::*;
use tycoon_factory::catalog::{FactoryCatalog, FactoryComponent, MachineConfig, MachineUpgrade, RecipeInput};
use tycoon_power::{CollectorSpec, GeneratorSpec, PowerCatalog};
use tycoon_prestige::{PrestigeCurve, PrestigeModel};

use crate::definition::{Artifact, GameDefinition, HqLevel, SimSettings, Skill};
use crate::engine::Engine;

// ===========================================================================
// Number helpers
// ===========================================================================

pub fn fixed(v: f64) -> Fixed64 {
    Fixed64::from_num(v)
}

pub fn dec(v: i64) -> Money {
    Decimal::from(v)
}

/// `mantissa * 10^-scale`.
pub fn dec_scaled(mantissa: i64, scale: u32) -> Money {
    Decimal::new(mantissa, scale)
}

// ===========================================================================
// Ids used by the sample definition
// ===========================================================================

pub const LEMONADE: BusinessId = BusinessId(0);
pub const NEWSPAPER: BusinessId = BusinessId(1);
pub const CAR_WASH: BusinessId = BusinessId(2);

pub const SOLAR: GeneratorTypeId = GeneratorTypeId(0);
pub const DIESEL: GeneratorTypeId = GeneratorTypeId(1);

pub const SCRAP_PICKER: CollectorTypeId = CollectorTypeId(0);
pub const ORE_DRILL: CollectorTypeId = CollectorTypeId(1);

pub const PLATE: ComponentId = ComponentId(0);
pub const GEAR: ComponentId = ComponentId(1);
pub const CIRCUIT: ComponentId = ComponentId(2);

pub const PRESS: MachineTypeId = MachineTypeId(0);
pub const ASSEMBLER: MachineTypeId = MachineTypeId(1);

pub const LUBRICANT: MachineUpgradeId = MachineUpgradeId(0);
pub const PRESS_MARK_II: MachineUpgradeId = MachineUpgradeId(1);
pub const SERVO: MachineUpgradeId = MachineUpgradeId(2);

pub const SHARP_PENCILS: SkillId = SkillId(0);
pub const BULK_ORDERS: SkillId = SkillId(1);
pub const FAMILY_BUSINESS: SkillId = SkillId(2);

pub const LUCKY_COIN: ArtifactId = ArtifactId(0);
pub const TICKER_TAPE: ArtifactId = ArtifactId(1);

pub fn slot(line: u32, index: u32) -> SlotRef {
    SlotRef::new(line, index)
}

// ===========================================================================
// Sample definition
// ===========================================================================

fn curve(base: i64, growth: Money, max: Option<u32>) -> CostCurve {
    CostCurve {
        base_cost: dec(base),
        growth,
        max_instances: max,
    }
}

fn business(id: BusinessId, name: &str, income: Money, cost: i64) -> (BusinessId, Business) {
    (
        id,
        Business {
            id,
            name: name.to_string(),
            base_income_per_level: income,
            base_upgrade_cost: dec(cost),
            upgrade_cost_growth: dec_scaled(115, 2),
        },
    )
}

fn effect(kind: EffectKind, percent: f64) -> Effect {
    Effect::new(kind, fixed(percent))
}

/// A small but complete game: three businesses, two generators, two
/// collectors, a three-tier recipe chain, skills, HQ levels and artifacts.
pub fn sample_definition() -> GameDefinition {
    let businesses: BTreeMap<_, _> = [
        business(LEMONADE, "Lemonade Stand", dec(1), 10),
        business(NEWSPAPER, "Newspaper Route", dec(6), 60),
        business(CAR_WASH, "Car Wash", dec(40), 720),
    ]
    .into();

    let mut power = PowerCatalog::default();
    power.generators.insert(
        SOLAR,
        GeneratorSpec {
            id: SOLAR,
            name: "Solar Panel".into(),
            power_output: fixed(50.0),
            cost: curve(100, dec_scaled(12, 1), Some(10)),
        },
    );
    power.generators.insert(
        DIESEL,
        GeneratorSpec {
            id: DIESEL,
            name: "Diesel Generator".into(),
            power_output: fixed(120.0),
            cost: curve(500, dec_scaled(13, 1), None),
        },
    );
    power.collectors.insert(
        SCRAP_PICKER,
        CollectorSpec {
            id: SCRAP_PICKER,
            name: "Scrap Picker".into(),
            power_consumption: fixed(10.0),
            output_per_second: fixed(1.0),
            cost: curve(50, dec_scaled(115, 2), None),
        },
    );
    power.collectors.insert(
        ORE_DRILL,
        CollectorSpec {
            id: ORE_DRILL,
            name: "Ore Drill".into(),
            power_consumption: fixed(40.0),
            output_per_second: fixed(5.0),
            cost: curve(400, dec_scaled(12, 1), None),
        },
    );

    let mut factory = FactoryCatalog::default();
    factory.components.insert(
        PLATE,
        FactoryComponent {
            id: PLATE,
            name: "Steel Plate".into(),
            tier: 1,
            inputs: vec![],
            raw_material_cost: 2,
            base_production_seconds: fixed(2.0),
            bonus: Some(ComponentBonus {
                kind: EffectKind::IncomePercent(IncomeScope::Global),
                per_unit_percent: fixed(0.1),
                max_bonus_percent: Some(fixed(5.0)),
            }),
        },
    );
    factory.components.insert(
        GEAR,
        FactoryComponent {
            id: GEAR,
            name: "Gear".into(),
            tier: 2,
            inputs: vec![RecipeInput {
                component: PLATE,
                quantity: 2,
            }],
            raw_material_cost: 1,
            base_production_seconds: fixed(4.0),
            bonus: Some(ComponentBonus {
                kind: EffectKind::MachineSpeedPercent,
                per_unit_percent: fixed(0.5),
                max_bonus_percent: Some(fixed(10.0)),
            }),
        },
    );
    factory.components.insert(
        CIRCUIT,
        FactoryComponent {
            id: CIRCUIT,
            name: "Circuit Board".into(),
            tier: 3,
            inputs: vec![
                RecipeInput {
                    component: GEAR,
                    quantity: 1,
                },
                RecipeInput {
                    component: PLATE,
                    quantity: 1,
                },
            ],
            raw_material_cost: 5,
            base_production_seconds: fixed(8.0),
            bonus: Some(ComponentBonus {
                kind: EffectKind::PowerOutputPercent,
                per_unit_percent: fixed(1.0),
                max_bonus_percent: Some(fixed(20.0)),
            }),
        },
    );
    factory.machines.insert(
        PRESS,
        MachineConfig {
            id: PRESS,
            name: "Press".into(),
            base_tier: 1,
            power_draw: fixed(10.0),
            base_speed: Fixed64::ONE,
            cost: curve(200, dec_scaled(15, 1), None),
            upgrades: vec![
                MachineUpgrade {
                    id: LUBRICANT,
                    name: "Lubricant".into(),
                    cost: dec(150),
                    speed_percent: fixed(25.0),
                    mark_bonus: 0,
                },
                MachineUpgrade {
                    id: PRESS_MARK_II,
                    name: "Mark II Frame".into(),
                    cost: dec(600),
                    speed_percent: Fixed64::ZERO,
                    mark_bonus: 1,
                },
            ],
        },
    );
    factory.machines.insert(
        ASSEMBLER,
        MachineConfig {
            id: ASSEMBLER,
            name: "Assembler".into(),
            base_tier: 2,
            power_draw: fixed(25.0),
            base_speed: Fixed64::ONE,
            cost: curve(1_000, dec_scaled(16, 1), None),
            upgrades: vec![MachineUpgrade {
                id: SERVO,
                name: "Servo Arms".into(),
                cost: dec(800),
                speed_percent: fixed(50.0),
                mark_bonus: 0,
            }],
        },
    );

    let skills: BTreeMap<_, _> = [
        Skill {
            id: SHARP_PENCILS,
            name: "Sharp Pencils".into(),
            cost_points: 1,
            prerequisites: vec![],
            effects: vec![effect(EffectKind::IncomePercent(IncomeScope::Global), 10.0)],
        },
        Skill {
            id: BULK_ORDERS,
            name: "Bulk Orders".into(),
            cost_points: 2,
            prerequisites: vec![SHARP_PENCILS],
            effects: vec![effect(EffectKind::UpgradeCostPercent, -10.0)],
        },
        Skill {
            id: FAMILY_BUSINESS,
            name: "Family Business".into(),
            cost_points: 3,
            prerequisites: vec![SHARP_PENCILS],
            effects: vec![effect(EffectKind::LevelRetentionPercent, 10.0)],
        },
    ]
    .into_iter()
    .map(|s| (s.id, s))
    .collect();

    let hq_levels = vec![
        HqLevel {
            cost: dec(1_000),
            effects: vec![effect(EffectKind::EnergyRecoveryPercent, 25.0)],
        },
        HqLevel {
            cost: dec(10_000),
            effects: vec![effect(EffectKind::MaterialOutputPercent, 20.0)],
        },
        HqLevel {
            cost: dec(100_000),
            effects: vec![effect(EffectKind::IncomePercent(IncomeScope::Global), 25.0)],
        },
    ];

    let artifacts: BTreeMap<_, _> = [
        Artifact {
            id: LUCKY_COIN,
            name: "Lucky Coin".into(),
            effects: vec![effect(EffectKind::IncomePercent(IncomeScope::Business(LEMONADE)), 50.0)],
        },
        Artifact {
            id: TICKER_TAPE,
            name: "Old Ticker Tape".into(),
            effects: vec![effect(EffectKind::StockReturnPercent(StockId(0)), 5.0)],
        },
    ]
    .into_iter()
    .map(|a| (a.id, a))
    .collect();

    let prestige = PrestigeModel::new(
        PrestigeCurve::Linear {
            base: 25,
            increment: 5,
        },
        Some(500),
    )
    .expect("sample prestige curve is valid");

    GameDefinition {
        businesses,
        power,
        factory,
        skills,
        hq_levels,
        artifacts,
        prestige,
        settings: SimSettings {
            starting_money: dec(25),
            ..SimSettings::default()
        },
    }
}

// ===========================================================================
// Engine builders
// ===========================================================================

/// A fresh engine over the sample definition.
pub fn sample_engine() -> Engine {
    Engine::new(sample_definition())
}

/// A sample engine with `money` in the bank.
pub fn funded_engine(money: i64) -> Engine {
    let mut engine = sample_engine();
    engine.state.economy.money = dec(money);
    engine
}

/// A sample engine with one powered press crafting plates in slot (0, 0),
/// a staffed worker, and `materials` raw materials on hand.
pub fn crafting_engine(materials: u64) -> (Engine, MachineInstanceId, WorkerId) {
    crafting_engine_in(sample_definition(), materials)
}

/// [`crafting_engine`] over a caller-tuned definition.
pub fn crafting_engine_in(definition: GameDefinition, materials: u64) -> (Engine, MachineInstanceId, WorkerId) {
    let mut engine = Engine::new(definition);
    engine.state.economy.money = dec(10_000);
    engine.purchase_power_building(SOLAR).expect("solar");
    let machine = engine.purchase_machine(PRESS).expect("press");
    engine.place_machine(machine, slot(0, 0)).expect("place");
    let worker = engine.hire_worker().expect("hire");
    engine.assign_worker(worker, machine).expect("assign");
    engine.set_slot_recipe(slot(0, 0), Some(PLATE)).expect("recipe");
    engine.state.materials.amount = materials;
    (engine, machine, worker)
}

/// Give the engine raw materials directly.
pub fn grant_materials(engine: &mut Engine, amount: u64) {
    engine.state.materials.amount += amount;
}

/// Give the engine money directly.
pub fn grant_money(engine: &mut Engine, amount: Money) {
    engine.state.economy.money += amount;
}
