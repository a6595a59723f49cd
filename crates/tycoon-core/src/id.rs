use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

new_key_type! {
    /// Identifies a purchased factory machine instance.
    pub struct MachineInstanceId;

    /// Identifies a hired worker.
    pub struct WorkerId;
}

/// Identifies a business in the definition. Cheap to copy and compare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct BusinessId(pub u32);

/// Identifies a factory component (recipe output).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ComponentId(pub u32);

/// Identifies a machine configuration (not an owned instance).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineTypeId(pub u32);

/// Identifies a purchasable machine upgrade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct MachineUpgradeId(pub u32);

/// Identifies a power generator building type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GeneratorTypeId(pub u32);

/// Identifies a raw-material collector building type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectorTypeId(pub u32);

/// Identifies a prestige skill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SkillId(pub u32);

/// Identifies an artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ArtifactId(pub u32);

/// Identifies a stock. Stocks are only a modifier target here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct StockId(pub u32);

/// Index of a production line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LineId(pub u32);

/// Address of one slot: line plus position within the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SlotRef {
    pub line: LineId,
    pub slot: u32,
}

impl SlotRef {
    pub fn new(line: u32, slot: u32) -> Self {
        Self {
            line: LineId(line),
            slot,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_order_by_inner_value() {
        assert!(ComponentId(1) < ComponentId(2));
        assert!(SlotRef::new(0, 5) < SlotRef::new(1, 0));
    }

    #[test]
    fn ids_are_hashable() {
        use std::collections::HashMap;
        let mut map = HashMap::new();
        map.insert(BusinessId(0), "lemonade");
        map.insert(BusinessId(1), "bakery");
        assert_eq!(map[&BusinessId(1)], "bakery");
    }
}
