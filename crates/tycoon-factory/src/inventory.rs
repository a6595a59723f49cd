//! The shared raw-material pool and the produced-component inventory.
//!
//! Both are single global counters mutated by several systems in one tick.
//! Callers check availability before debiting; a debit past zero is an
//! invariant violation and clamps.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tycoon_core::fixed::{Fixed64, count_to_fixed};
use tycoon_core::id::ComponentId;
use tycoon_core::invariant::checked_debit;

/// Raw materials with a fractional accumulator for sub-unit collection rates.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MaterialPool {
    pub amount: u64,
    /// Fraction of a unit collected but not yet credited. In `[0, 1)`.
    pub accumulated: Fixed64,
}

impl MaterialPool {
    /// Credit `rate * dt`; whole units land in `amount`, the remainder
    /// carries over. Returns the whole units credited.
    pub fn collect(&mut self, rate_per_second: Fixed64, dt: Fixed64) -> u64 {
        let gained = rate_per_second.saturating_mul(dt).max(Fixed64::ZERO);
        self.accumulated = self.accumulated.saturating_add(gained);
        let whole: u64 = self.accumulated.int().to_num();
        if whole > 0 {
            self.accumulated -= count_to_fixed(whole);
            self.amount = self.amount.saturating_add(whole);
        }
        whole
    }

    pub fn has(&self, amount: u64) -> bool {
        self.amount >= amount
    }

    pub fn debit(&mut self, amount: u64) {
        checked_debit(&mut self.amount, amount, "raw materials went negative");
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Counts of produced components. Missing entries are zero.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentInventory {
    counts: BTreeMap<ComponentId, u64>,
}

impl ComponentInventory {
    pub fn count(&self, id: ComponentId) -> u64 {
        self.counts.get(&id).copied().unwrap_or(0)
    }

    pub fn has(&self, id: ComponentId, quantity: u64) -> bool {
        self.count(id) >= quantity
    }

    pub fn add(&mut self, id: ComponentId, quantity: u64) {
        let slot = self.counts.entry(id).or_insert(0);
        *slot = slot.saturating_add(quantity);
    }

    pub fn debit(&mut self, id: ComponentId, quantity: u64) {
        let slot = self.counts.entry(id).or_insert(0);
        checked_debit(slot, quantity, "component inventory went negative");
    }

    pub fn iter(&self) -> impl Iterator<Item = (ComponentId, u64)> + '_ {
        self.counts.iter().map(|(&id, &n)| (id, n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fractional_rates_accumulate() {
        let mut pool = MaterialPool::default();
        let rate = Fixed64::from_num(0.25);
        let credited: u64 = (0..8).map(|_| pool.collect(rate, Fixed64::ONE)).sum();
        assert_eq!(credited, 2);
        assert_eq!(pool.amount, 2);
        assert_eq!(pool.accumulated, Fixed64::ZERO);

        pool.collect(Fixed64::from_num(1.5), Fixed64::ONE);
        assert_eq!(pool.amount, 3);
        assert_eq!(pool.accumulated, Fixed64::from_num(0.5));
    }

    #[test]
    fn inventory_counts() {
        let mut inv = ComponentInventory::default();
        let gear = ComponentId(1);
        assert_eq!(inv.count(gear), 0);
        inv.add(gear, 3);
        assert!(inv.has(gear, 3));
        assert!(!inv.has(gear, 4));
        inv.debit(gear, 2);
        assert_eq!(inv.count(gear), 1);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "raw materials went negative")]
    fn overdraw_is_a_defect() {
        let mut pool = MaterialPool::default();
        pool.debit(1);
    }
}
