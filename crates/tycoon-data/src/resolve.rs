//! Name resolution: schema structs to engine types.
//!
//! Ids are handed out in file order, so the same file always yields the
//! same ids. Every name must be unique within its kind and every reference
//! must point at something defined in the file.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use tycoon_core::economy::{Business, CostCurve};
use tycoon_core::effect::{ComponentBonus, Effect, EffectKind, IncomeScope};
use tycoon_core::fixed::Fixed64;
use tycoon_core::id::*;
use tycoon_factory::catalog::{FactoryCatalog, FactoryComponent, MachineConfig, MachineUpgrade, RecipeInput};
use tycoon_factory::worker::EnergyConfig;
use tycoon_game::definition::{Artifact, GameDefinition, HqLevel, SimSettings, Skill};
use tycoon_power::{CollectorSpec, GeneratorSpec, PowerCatalog};
use tycoon_prestige::{PrestigeCurve, PrestigeModel};

use crate::loader::DataLoadError;
use crate::schema::*;

// ===========================================================================
// Name tables
// ===========================================================================

/// Name-to-id table for one kind of entity.
struct Names<'f> {
    kind: &'static str,
    file: &'f Path,
    ids: HashMap<String, u32>,
}

impl<'f> Names<'f> {
    /// Number `names` in order, rejecting duplicates.
    fn build<'n>(
        kind: &'static str,
        file: &'f Path,
        names: impl IntoIterator<Item = &'n String>,
    ) -> Result<Self, DataLoadError> {
        let mut ids = HashMap::new();
        for (index, name) in names.into_iter().enumerate() {
            if ids.insert(name.clone(), index as u32).is_some() {
                return Err(DataLoadError::DuplicateName {
                    file: file.to_path_buf(),
                    name: name.clone(),
                    kind,
                });
            }
        }
        Ok(Self { kind, file, ids })
    }

    fn get(&self, name: &str) -> Result<u32, DataLoadError> {
        self.ids
            .get(name)
            .copied()
            .ok_or_else(|| DataLoadError::UnresolvedRef {
                file: self.file.to_path_buf(),
                name: name.to_string(),
                expected_kind: self.kind,
            })
    }
}

// ===========================================================================
// Number conversion
// ===========================================================================

fn invalid(file: &Path, detail: String) -> DataLoadError {
    DataLoadError::Invalid {
        file: file.to_path_buf(),
        detail,
    }
}

/// Convert an authored number, rejecting NaN and out-of-range values.
fn to_fixed(value: f64, what: &str, file: &Path) -> Result<Fixed64, DataLoadError> {
    if !value.is_finite() {
        return Err(invalid(file, format!("{what} = {value} is not finite")));
    }
    Fixed64::checked_from_num(value).ok_or_else(|| invalid(file, format!("{what} = {value} is not representable")))
}

/// Like [`to_fixed`], additionally rejecting negative values.
fn to_non_negative(value: f64, what: &str, file: &Path) -> Result<Fixed64, DataLoadError> {
    let fixed = to_fixed(value, what, file)?;
    if fixed < Fixed64::ZERO {
        return Err(invalid(file, format!("{what} must not be negative, got {value}")));
    }
    Ok(fixed)
}

fn to_positive(value: f64, what: &str, file: &Path) -> Result<Fixed64, DataLoadError> {
    let fixed = to_fixed(value, what, file)?;
    if fixed <= Fixed64::ZERO {
        return Err(invalid(file, format!("{what} must be positive, got {value}")));
    }
    Ok(fixed)
}

fn cost_curve(data: &CostCurveData, what: &str, file: &Path) -> Result<CostCurve, DataLoadError> {
    if data.base_cost.is_sign_negative() || data.growth.is_sign_negative() {
        return Err(invalid(file, format!("{what}: costs must not be negative")));
    }
    Ok(CostCurve {
        base_cost: data.base_cost,
        growth: data.growth,
        max_instances: data.max_instances,
    })
}

// ===========================================================================
// Resolver
// ===========================================================================

struct Resolver<'f> {
    file: &'f Path,
    businesses: Names<'f>,
    components: Names<'f>,
    stocks: Names<'f>,
}

impl Resolver<'_> {
    fn kind(&self, target: &EffectTargetData) -> Result<EffectKind, DataLoadError> {
        Ok(match target {
            EffectTargetData::GlobalIncome => EffectKind::IncomePercent(IncomeScope::Global),
            EffectTargetData::BusinessIncome(name) => {
                EffectKind::IncomePercent(IncomeScope::Business(BusinessId(self.businesses.get(name)?)))
            }
            EffectTargetData::FlatIncomePerSecond => EffectKind::FlatIncomePerSecond,
            EffectTargetData::UpgradeCost => EffectKind::UpgradeCostPercent,
            EffectTargetData::MachineSpeed => EffectKind::MachineSpeedPercent,
            EffectTargetData::PowerOutput => EffectKind::PowerOutputPercent,
            EffectTargetData::MaterialOutput => EffectKind::MaterialOutputPercent,
            EffectTargetData::EnergyRecovery => EffectKind::EnergyRecoveryPercent,
            EffectTargetData::LevelRetention => EffectKind::LevelRetentionPercent,
            EffectTargetData::StockReturn(name) => EffectKind::StockReturnPercent(StockId(self.stocks.get(name)?)),
        })
    }

    fn effects(&self, data: &[EffectData], owner: &str) -> Result<Vec<Effect>, DataLoadError> {
        data.iter()
            .map(|e| {
                let value = to_fixed(e.value, &format!("{owner} effect"), self.file)?;
                Ok(Effect::new(self.kind(&e.target)?, value))
            })
            .collect()
    }

    fn component(&self, id: u32, data: &ComponentData) -> Result<FactoryComponent, DataLoadError> {
        let inputs = data
            .inputs
            .iter()
            .map(|(name, quantity)| {
                Ok(RecipeInput {
                    component: ComponentId(self.components.get(name)?),
                    quantity: *quantity,
                })
            })
            .collect::<Result<Vec<_>, DataLoadError>>()?;
        let bonus = data
            .bonus
            .as_ref()
            .map(|b| -> Result<ComponentBonus, DataLoadError> {
                Ok(ComponentBonus {
                    kind: self.kind(&b.target)?,
                    per_unit_percent: to_non_negative(b.per_unit, &format!("{} bonus", data.name), self.file)?,
                    max_bonus_percent: b
                        .max
                        .map(|m| to_non_negative(m, &format!("{} bonus cap", data.name), self.file))
                        .transpose()?,
                })
            })
            .transpose()?;
        Ok(FactoryComponent {
            id: ComponentId(id),
            name: data.name.clone(),
            tier: data.tier,
            inputs,
            raw_material_cost: data.raw_material_cost,
            base_production_seconds: to_positive(
                data.production_seconds,
                &format!("{} production_seconds", data.name),
                self.file,
            )?,
            bonus,
        })
    }
}

/// Turn parsed data into a [`GameDefinition`]. `file` labels errors.
pub fn resolve(data: GameData, file: &Path) -> Result<GameDefinition, DataLoadError> {
    let resolver = Resolver {
        file,
        businesses: Names::build("business", file, data.businesses.iter().map(|b| &b.name))?,
        components: Names::build("component", file, data.components.iter().map(|c| &c.name))?,
        stocks: Names::build("stock", file, data.stocks.iter())?,
    };
    Names::build("generator", file, data.generators.iter().map(|g| &g.name))?;
    Names::build("collector", file, data.collectors.iter().map(|c| &c.name))?;
    Names::build("machine", file, data.machines.iter().map(|m| &m.name))?;
    Names::build("artifact", file, data.artifacts.iter().map(|a| &a.name))?;
    Names::build(
        "machine upgrade",
        file,
        data.machines.iter().flat_map(|m| m.upgrades.iter().map(|u| &u.name)),
    )?;
    let skill_names = Names::build("skill", file, data.skills.iter().map(|s| &s.name))?;

    // -- economy -------------------------------------------------------------
    let mut businesses = BTreeMap::new();
    for (index, b) in data.businesses.iter().enumerate() {
        let id = BusinessId(index as u32);
        if b.income_per_level.is_sign_negative() || b.upgrade_cost.is_sign_negative() {
            return Err(invalid(file, format!("business {} has negative money values", b.name)));
        }
        businesses.insert(
            id,
            Business {
                id,
                name: b.name.clone(),
                base_income_per_level: b.income_per_level,
                base_upgrade_cost: b.upgrade_cost,
                upgrade_cost_growth: b.cost_growth,
            },
        );
    }

    // -- power ---------------------------------------------------------------
    let mut power = PowerCatalog::default();
    for (index, g) in data.generators.iter().enumerate() {
        let id = GeneratorTypeId(index as u32);
        power.generators.insert(
            id,
            GeneratorSpec {
                id,
                name: g.name.clone(),
                power_output: to_non_negative(g.power_output, &g.name, file)?,
                cost: cost_curve(&g.cost, &g.name, file)?,
            },
        );
    }
    for (index, c) in data.collectors.iter().enumerate() {
        let id = CollectorTypeId(index as u32);
        power.collectors.insert(
            id,
            CollectorSpec {
                id,
                name: c.name.clone(),
                power_consumption: to_non_negative(c.power_consumption, &c.name, file)?,
                output_per_second: to_non_negative(c.output_per_second, &c.name, file)?,
                cost: cost_curve(&c.cost, &c.name, file)?,
            },
        );
    }

    // -- factory -------------------------------------------------------------
    let mut factory = FactoryCatalog::default();
    for (index, c) in data.components.iter().enumerate() {
        let component = resolver.component(index as u32, c)?;
        factory.components.insert(component.id, component);
    }
    let mut next_upgrade = 0;
    for (index, m) in data.machines.iter().enumerate() {
        let id = MachineTypeId(index as u32);
        let mut upgrades = Vec::with_capacity(m.upgrades.len());
        for u in &m.upgrades {
            upgrades.push(MachineUpgrade {
                id: MachineUpgradeId(next_upgrade),
                name: u.name.clone(),
                cost: u.cost,
                speed_percent: to_fixed(u.speed_percent, &u.name, file)?,
                mark_bonus: u.mark_bonus,
            });
            next_upgrade += 1;
        }
        factory.machines.insert(
            id,
            MachineConfig {
                id,
                name: m.name.clone(),
                base_tier: m.tier,
                power_draw: to_non_negative(m.power_draw, &m.name, file)?,
                base_speed: to_positive(m.speed, &m.name, file)?,
                cost: cost_curve(&m.cost, &m.name, file)?,
                upgrades,
            },
        );
    }

    // -- meta progression ----------------------------------------------------
    let mut skills = BTreeMap::new();
    for (index, s) in data.skills.iter().enumerate() {
        let id = SkillId(index as u32);
        let prerequisites = s
            .requires
            .iter()
            .map(|name| skill_names.get(name).map(SkillId))
            .collect::<Result<Vec<_>, _>>()?;
        skills.insert(
            id,
            Skill {
                id,
                name: s.name.clone(),
                cost_points: s.cost_points,
                prerequisites,
                effects: resolver.effects(&s.effects, &s.name)?,
            },
        );
    }
    let hq_levels = data
        .hq_levels
        .iter()
        .enumerate()
        .map(|(index, h)| {
            Ok(HqLevel {
                cost: h.cost,
                effects: resolver.effects(&h.effects, &format!("HQ level {}", index + 1))?,
            })
        })
        .collect::<Result<Vec<_>, DataLoadError>>()?;
    let mut artifacts = BTreeMap::new();
    for (index, a) in data.artifacts.iter().enumerate() {
        let id = ArtifactId(index as u32);
        artifacts.insert(
            id,
            Artifact {
                id,
                name: a.name.clone(),
                effects: resolver.effects(&a.effects, &a.name)?,
            },
        );
    }

    let curve = match data.prestige.curve {
        PrestigeCurveData::Linear { base, increment } => PrestigeCurve::Linear { base, increment },
        PrestigeCurveData::Exponential { base, multiplier } => PrestigeCurve::Exponential {
            base,
            multiplier: to_fixed(multiplier, "prestige multiplier", file)?,
        },
    };
    let prestige = PrestigeModel::new(curve, data.prestige.max_points).map_err(|e| invalid(file, e.to_string()))?;

    Ok(GameDefinition {
        businesses,
        power,
        factory,
        skills,
        hq_levels,
        artifacts,
        prestige,
        settings: settings(&data.settings, file)?,
    })
}

fn settings(data: &SettingsData, file: &Path) -> Result<SimSettings, DataLoadError> {
    let defaults = SimSettings::default();
    let energy_defaults = defaults.worker_energy.clone();
    let opt = |value: Option<f64>, default: Fixed64, what: &str| -> Result<Fixed64, DataLoadError> {
        value.map_or(Ok(default), |v| to_non_negative(v, what, file))
    };

    let settings = SimSettings {
        tick_seconds: data
            .tick_seconds
            .map_or(Ok(defaults.tick_seconds), |v| to_positive(v, "tick_seconds", file))?,
        max_catch_up_seconds: opt(
            data.max_catch_up_seconds,
            defaults.max_catch_up_seconds,
            "max_catch_up_seconds",
        )?,
        starting_money: data.starting_money.unwrap_or(defaults.starting_money),
        prestige_income_percent_per_point: opt(
            data.prestige_income_percent_per_point,
            defaults.prestige_income_percent_per_point,
            "prestige_income_percent_per_point",
        )?,
        worker_energy: EnergyConfig {
            max_energy: data
                .worker_energy
                .max_energy
                .map_or(Ok(energy_defaults.max_energy), |v| to_positive(v, "max_energy", file))?,
            depletion_per_second: opt(
                data.worker_energy.depletion_per_second,
                energy_defaults.depletion_per_second,
                "depletion_per_second",
            )?,
            recovery_per_second: opt(
                data.worker_energy.recovery_per_second,
                energy_defaults.recovery_per_second,
                "recovery_per_second",
            )?,
        },
        hire_cost: match &data.hire_cost {
            Some(curve) => cost_curve(curve, "hire_cost", file)?,
            None => defaults.hire_cost,
        },
        lines: data.lines.unwrap_or(defaults.lines),
        slots_per_line: data.slots_per_line.unwrap_or(defaults.slots_per_line),
    };
    if settings.starting_money.is_sign_negative() {
        return Err(invalid(file, "starting_money must not be negative".to_string()));
    }
    Ok(settings)
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::{Format, load_definition_str};

    fn load(ron: &str) -> Result<GameDefinition, DataLoadError> {
        load_definition_str(ron, Format::Ron)
    }

    // -----------------------------------------------------------------------
    // Test 1: Names become ids in file order
    // -----------------------------------------------------------------------
    #[test]
    fn ids_follow_file_order() {
        let def = load(
            r#"(
            businesses: [
                (name: "A", income_per_level: 1, upgrade_cost: 1, cost_growth: 1),
                (name: "B", income_per_level: 2, upgrade_cost: 1, cost_growth: 1),
            ],
            components: [
                (name: "Plate", tier: 1, production_seconds: 2.0),
                (name: "Gear", tier: 2, inputs: [("Plate", 2)], production_seconds: 4.0,
                 bonus: Some((target: business_income("B"), per_unit: 1.0, max: Some(10.0)))),
            ],
            prestige: (curve: linear(base: 10, increment: 2)),
        )"#,
        )
        .unwrap();

        assert_eq!(def.businesses[&BusinessId(1)].name, "B");
        let gear = &def.factory.components[&ComponentId(1)];
        assert_eq!(
            gear.inputs,
            vec![RecipeInput {
                component: ComponentId(0),
                quantity: 2
            }]
        );
        let bonus = gear.bonus.as_ref().unwrap();
        assert_eq!(bonus.kind, EffectKind::IncomePercent(IncomeScope::Business(BusinessId(1))));
        assert_eq!(bonus.max_bonus_percent, Some(Fixed64::from_num(10)));
    }

    // -----------------------------------------------------------------------
    // Test 2: Unknown recipe input
    // -----------------------------------------------------------------------
    #[test]
    fn unresolved_component_reference() {
        let result = load(
            r#"(
            businesses: [],
            components: [(name: "Gear", tier: 2, inputs: [("Plate", 2)], production_seconds: 4.0)],
            prestige: (curve: linear(base: 10, increment: 2)),
        )"#,
        );
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { ref name, expected_kind: "component", .. }) if name == "Plate"
        ));
    }

    // -----------------------------------------------------------------------
    // Test 3: Unknown skill prerequisite
    // -----------------------------------------------------------------------
    #[test]
    fn unresolved_skill_prerequisite() {
        let result = load(
            r#"(
            businesses: [],
            skills: [(name: "Second", cost_points: 1, requires: ["First"], effects: [])],
            prestige: (curve: linear(base: 10, increment: 2)),
        )"#,
        );
        assert!(matches!(
            result,
            Err(DataLoadError::UnresolvedRef { expected_kind: "skill", .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Test 4: Duplicate names within a kind
    // -----------------------------------------------------------------------
    #[test]
    fn duplicate_business_name() {
        let result = load(
            r#"(
            businesses: [
                (name: "A", income_per_level: 1, upgrade_cost: 1, cost_growth: 1),
                (name: "A", income_per_level: 2, upgrade_cost: 1, cost_growth: 1),
            ],
            prestige: (curve: linear(base: 10, increment: 2)),
        )"#,
        );
        assert!(matches!(
            result,
            Err(DataLoadError::DuplicateName { ref name, kind: "business", .. }) if name == "A"
        ));
    }

    // -----------------------------------------------------------------------
    // Test 5: Upgrade ids are global across machines
    // -----------------------------------------------------------------------
    #[test]
    fn upgrade_ids_are_global() {
        let def = load(
            r#"(
            businesses: [],
            machines: [
                (name: "Press", tier: 1, power_draw: 10.0, cost: (base_cost: 100),
                 upgrades: [(name: "Oil", cost: 10, speed_percent: 25.0)]),
                (name: "Lathe", tier: 1, power_draw: 12.0, cost: (base_cost: 100, growth: 1.5),
                 upgrades: [(name: "Frame", cost: 50, mark_bonus: 1)]),
            ],
            prestige: (curve: linear(base: 10, increment: 2)),
        )"#,
        )
        .unwrap();
        let lathe = &def.factory.machines[&MachineTypeId(1)];
        assert_eq!(lathe.upgrades[0].id, MachineUpgradeId(1));
        assert_eq!(lathe.upgrades[0].mark_bonus, 1);
        assert_eq!(def.factory.machines[&MachineTypeId(0)].cost.growth, rust_decimal::Decimal::ONE);
    }

    // -----------------------------------------------------------------------
    // Test 6: Invalid numbers are rejected
    // -----------------------------------------------------------------------
    #[test]
    fn invalid_values_rejected() {
        let zero_duration = load(
            r#"(
            businesses: [],
            components: [(name: "Plate", tier: 1, production_seconds: 0.0)],
            prestige: (curve: linear(base: 10, increment: 2)),
        )"#,
        );
        assert!(matches!(zero_duration, Err(DataLoadError::Invalid { .. })));

        let shrinking_curve = load(
            r#"(
            businesses: [],
            prestige: (curve: exponential(base: 10, multiplier: 0.5)),
        )"#,
        );
        assert!(matches!(shrinking_curve, Err(DataLoadError::Invalid { .. })));
    }

    // -----------------------------------------------------------------------
    // Test 7: Settings fall back to defaults field by field
    // -----------------------------------------------------------------------
    #[test]
    fn partial_settings_keep_defaults() {
        let def = load(
            r#"(
            businesses: [],
            prestige: (curve: linear(base: 10, increment: 2)),
            settings: (tick_seconds: Some(0.5), worker_energy: (max_energy: Some(50.0))),
        )"#,
        )
        .unwrap();
        let defaults = SimSettings::default();
        assert_eq!(def.settings.tick_seconds, Fixed64::from_num(0.5));
        assert_eq!(def.settings.worker_energy.max_energy, Fixed64::from_num(50));
        assert_eq!(
            def.settings.worker_energy.recovery_per_second,
            defaults.worker_energy.recovery_per_second
        );
        assert_eq!(def.settings.lines, defaults.lines);
    }

    // -----------------------------------------------------------------------
    // Test 8: Stock targets resolve by name
    // -----------------------------------------------------------------------
    #[test]
    fn stock_targets_resolve() {
        let def = load(
            r#"(
            businesses: [],
            stocks: ["ACME", "Globex"],
            artifacts: [(name: "Ticker", effects: [(target: stock_return("Globex"), value: 5.0)])],
            prestige: (curve: linear(base: 10, increment: 2)),
        )"#,
        )
        .unwrap();
        let ticker = &def.artifacts[&ArtifactId(0)];
        assert_eq!(ticker.effects[0].kind, EffectKind::StockReturnPercent(StockId(1)));
    }
}
