//! Effect ledger: every active bonus folded into one resolved record per tick.
//!
//! Bonuses come from many optional sources (unlocked skills, HQ levels,
//! artifacts, produced factory components, prestige points). Instead of each
//! consumer scanning every source, the tick starts by pushing all active
//! [`Effect`]s into an [`EffectLedger`] and calling [`EffectLedger::resolve`].
//! The resulting [`ResolvedEffects`] is read-only for the rest of the tick.
//!
//! # Folding rules
//!
//! - Entries are sorted by [`EffectSource`] before folding so the result does
//!   not depend on push order.
//! - Percentages of the same [`EffectKind`] are summed.
//! - A summed percentage `p` becomes the multiplier `1 + p / 100`, floored
//!   per kind (costs never drop below 10%, everything else never below 0).
//! - Component bonuses are clamped per component *before* summing, and are
//!   always recomputed from the total owned count.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, count_to_fixed, percent_multiplier};
use crate::id::{ArtifactId, BusinessId, ComponentId, SkillId, StockId};

// ---------------------------------------------------------------------------
// Effect types
// ---------------------------------------------------------------------------

/// Which incomes an income effect applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IncomeScope {
    Global,
    Business(BusinessId),
}

/// What an effect modifies. Values are percentage points unless noted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectKind {
    IncomePercent(IncomeScope),
    /// Money per second added after multipliers (not a percentage).
    FlatIncomePerSecond,
    /// Negative values are discounts on business upgrades.
    UpgradeCostPercent,
    MachineSpeedPercent,
    PowerOutputPercent,
    MaterialOutputPercent,
    EnergyRecoveryPercent,
    /// Share of each business level kept through a prestige reset.
    LevelRetentionPercent,
    StockReturnPercent(StockId),
}

/// A single bonus: a kind and its magnitude.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub value: Fixed64,
}

impl Effect {
    pub fn new(kind: EffectKind, value: Fixed64) -> Self {
        Self { kind, value }
    }
}

/// Where an effect came from. Ordering defines the canonical fold order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EffectSource {
    Prestige,
    Skill(SkillId),
    HqLevel(u32),
    Artifact(ArtifactId),
    Component(ComponentId),
}

// ---------------------------------------------------------------------------
// Component bonus
// ---------------------------------------------------------------------------

/// A per-unit bonus granted by owning a factory component, with an optional
/// saturation cap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentBonus {
    pub kind: EffectKind,
    /// Percentage points granted per unit owned.
    pub per_unit_percent: Fixed64,
    /// Maximum total percentage points this component can contribute.
    pub max_bonus_percent: Option<Fixed64>,
}

impl ComponentBonus {
    fn uncapped(&self, owned: u64) -> Fixed64 {
        count_to_fixed(owned)
            .saturating_mul(self.per_unit_percent)
            .max(Fixed64::ZERO)
    }

    /// `min(owned * per_unit, max_bonus_percent)`.
    pub fn contribution(&self, owned: u64) -> Fixed64 {
        let raw = self.uncapped(owned);
        match self.max_bonus_percent {
            Some(cap) => raw.min(cap),
            None => raw,
        }
    }

    /// True once further units add nothing.
    pub fn is_saturated(&self, owned: u64) -> bool {
        self.max_bonus_percent
            .is_some_and(|cap| self.uncapped(owned) >= cap)
    }
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

/// Collects the active effects for one tick.
#[derive(Debug, Clone, Default)]
pub struct EffectLedger {
    entries: Vec<(EffectSource, Effect)>,
}

impl EffectLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one effect from `source`.
    pub fn push(&mut self, source: EffectSource, effect: Effect) {
        self.entries.push((source, effect));
    }

    /// Record several effects from the same source.
    pub fn extend<'a>(&mut self, source: EffectSource, effects: impl IntoIterator<Item = &'a Effect>) {
        for effect in effects {
            self.push(source, *effect);
        }
    }

    /// Record the clamped bonus of a component given its total owned count.
    /// Nothing is recorded for a zero contribution.
    pub fn push_component(&mut self, component: ComponentId, bonus: &ComponentBonus, owned: u64) {
        let value = bonus.contribution(owned);
        if value > Fixed64::ZERO {
            self.push(
                EffectSource::Component(component),
                Effect::new(bonus.kind, value),
            );
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[(EffectSource, Effect)] {
        &self.entries
    }

    /// Fold all entries into a [`ResolvedEffects`] record.
    pub fn resolve(&self) -> ResolvedEffects {
        let mut sorted: Vec<&(EffectSource, Effect)> = self.entries.iter().collect();
        sorted.sort_by_key(|(source, effect)| (*source, effect.kind));

        let mut sums: BTreeMap<EffectKind, Fixed64> = BTreeMap::new();
        for (_, effect) in sorted {
            let slot = sums.entry(effect.kind).or_insert(Fixed64::ZERO);
            *slot = slot.saturating_add(effect.value);
        }

        let sum = |kind: EffectKind| sums.get(&kind).copied().unwrap_or(Fixed64::ZERO);
        let mut resolved = ResolvedEffects {
            global_income: percent_multiplier(sum(EffectKind::IncomePercent(IncomeScope::Global)), Fixed64::ZERO),
            flat_income_per_second: sum(EffectKind::FlatIncomePerSecond).max(Fixed64::ZERO),
            upgrade_cost: percent_multiplier(sum(EffectKind::UpgradeCostPercent), min_cost_multiplier()),
            machine_speed: percent_multiplier(sum(EffectKind::MachineSpeedPercent), Fixed64::ZERO),
            power_output: percent_multiplier(sum(EffectKind::PowerOutputPercent), Fixed64::ZERO),
            material_output: percent_multiplier(sum(EffectKind::MaterialOutputPercent), Fixed64::ZERO),
            energy_recovery: percent_multiplier(sum(EffectKind::EnergyRecoveryPercent), Fixed64::ZERO),
            level_retention_percent: sum(EffectKind::LevelRetentionPercent)
                .clamp(Fixed64::ZERO, Fixed64::from_num(100)),
            ..ResolvedEffects::default()
        };

        for (kind, value) in &sums {
            match kind {
                EffectKind::IncomePercent(IncomeScope::Business(id)) => {
                    resolved
                        .business_income
                        .insert(*id, percent_multiplier(*value, Fixed64::ZERO));
                }
                EffectKind::StockReturnPercent(id) => {
                    resolved
                        .stock_return
                        .insert(*id, percent_multiplier(*value, Fixed64::ZERO));
                }
                _ => {}
            }
        }

        resolved
    }
}

/// Costs are never discounted below 10% of their base.
fn min_cost_multiplier() -> Fixed64 {
    Fixed64::from_num(1) / Fixed64::from_num(10)
}

// ---------------------------------------------------------------------------
// Resolved record
// ---------------------------------------------------------------------------

/// Multipliers for one tick. Identity (all 1.0, no flat income, no
/// retention) when no effects are active.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedEffects {
    pub global_income: Fixed64,
    pub business_income: BTreeMap<BusinessId, Fixed64>,
    pub flat_income_per_second: Fixed64,
    pub upgrade_cost: Fixed64,
    pub machine_speed: Fixed64,
    pub power_output: Fixed64,
    pub material_output: Fixed64,
    pub energy_recovery: Fixed64,
    /// Percentage points in `[0, 100]`.
    pub level_retention_percent: Fixed64,
    pub stock_return: BTreeMap<StockId, Fixed64>,
}

impl Default for ResolvedEffects {
    fn default() -> Self {
        Self {
            global_income: Fixed64::ONE,
            business_income: BTreeMap::new(),
            flat_income_per_second: Fixed64::ZERO,
            upgrade_cost: Fixed64::ONE,
            machine_speed: Fixed64::ONE,
            power_output: Fixed64::ONE,
            material_output: Fixed64::ONE,
            energy_recovery: Fixed64::ONE,
            level_retention_percent: Fixed64::ZERO,
            stock_return: BTreeMap::new(),
        }
    }
}

impl ResolvedEffects {
    /// Combined income multiplier for one business: global times specific.
    pub fn income_multiplier(&self, business: BusinessId) -> Fixed64 {
        let specific = self
            .business_income
            .get(&business)
            .copied()
            .unwrap_or(Fixed64::ONE);
        self.global_income.saturating_mul(specific)
    }

    pub fn stock_multiplier(&self, stock: StockId) -> Fixed64 {
        self.stock_return.get(&stock).copied().unwrap_or(Fixed64::ONE)
    }
}
