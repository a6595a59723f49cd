//! Owned machine instances.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tycoon_core::fixed::{Fixed64, percent_multiplier};
use tycoon_core::id::{MachineTypeId, MachineUpgradeId, SlotRef};

use crate::catalog::MachineConfig;

/// A purchased machine. It may sit unplaced in storage or occupy one slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MachineInstance {
    pub config: MachineTypeId,
    /// Starts at 1; upgrades with a mark bonus raise it.
    pub mark: u32,
    pub upgrades: BTreeSet<MachineUpgradeId>,
    pub slot: Option<SlotRef>,
}

impl MachineInstance {
    pub fn new(config: MachineTypeId) -> Self {
        Self {
            config,
            mark: 1,
            upgrades: BTreeSet::new(),
            slot: None,
        }
    }

    /// Highest recipe tier this machine can craft.
    pub fn max_tier(&self, config: &MachineConfig) -> u32 {
        config.base_tier.saturating_add(self.mark.saturating_sub(1))
    }

    /// Seconds of craft progress per real second.
    pub fn speed(&self, config: &MachineConfig, global_multiplier: Fixed64) -> Fixed64 {
        let percent = self
            .upgrades
            .iter()
            .filter_map(|id| config.upgrade(*id))
            .fold(Fixed64::ZERO, |acc, u| acc.saturating_add(u.speed_percent));
        config
            .base_speed
            .saturating_mul(percent_multiplier(percent, Fixed64::ZERO))
            .saturating_mul(global_multiplier)
    }

    /// Record a purchased upgrade. Returns false if it was already owned.
    pub fn apply_upgrade(&mut self, config: &MachineConfig, id: MachineUpgradeId) -> bool {
        let Some(upgrade) = config.upgrade(id) else {
            return false;
        };
        if !self.upgrades.insert(id) {
            return false;
        }
        self.mark = self.mark.saturating_add(upgrade.mark_bonus);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::MachineUpgrade;
    use rust_decimal::Decimal;
    use tycoon_core::economy::CostCurve;

    fn press() -> MachineConfig {
        MachineConfig {
            id: MachineTypeId(0),
            name: "Press".into(),
            base_tier: 2,
            power_draw: Fixed64::from_num(10),
            base_speed: Fixed64::ONE,
            cost: CostCurve::flat(Decimal::from(50)),
            upgrades: vec![
                MachineUpgrade {
                    id: MachineUpgradeId(0),
                    name: "Oiled Gears".into(),
                    cost: Decimal::from(20),
                    speed_percent: Fixed64::from_num(50),
                    mark_bonus: 0,
                },
                MachineUpgrade {
                    id: MachineUpgradeId(1),
                    name: "Mark II Frame".into(),
                    cost: Decimal::from(200),
                    speed_percent: Fixed64::ZERO,
                    mark_bonus: 1,
                },
            ],
        }
    }

    #[test]
    fn tier_follows_mark() {
        let cfg = press();
        let mut m = MachineInstance::new(cfg.id);
        assert_eq!(m.max_tier(&cfg), 2);
        assert!(m.apply_upgrade(&cfg, MachineUpgradeId(1)));
        assert_eq!(m.mark, 2);
        assert_eq!(m.max_tier(&cfg), 3);
        assert!(!m.apply_upgrade(&cfg, MachineUpgradeId(1)));
        assert_eq!(m.mark, 2);
    }

    #[test]
    fn speed_combines_upgrades_and_global() {
        let cfg = press();
        let mut m = MachineInstance::new(cfg.id);
        assert_eq!(m.speed(&cfg, Fixed64::ONE), Fixed64::ONE);
        m.apply_upgrade(&cfg, MachineUpgradeId(0));
        assert_eq!(m.speed(&cfg, Fixed64::ONE), Fixed64::from_num(1.5));
        assert_eq!(m.speed(&cfg, Fixed64::from_num(2)), Fixed64::from_num(3));
    }
}
