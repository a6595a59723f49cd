//! Businesses, geometric cost curves, and the player's money balance.

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use crate::fixed::{Fixed64, Money, fixed_to_decimal};
use crate::id::BusinessId;
use crate::rejection::{Rejection, Resource};

/// Money is rounded to cents whenever a cost is quoted.
const MONEY_DP: u32 = 2;

// ---------------------------------------------------------------------------
// Geometric growth
// ---------------------------------------------------------------------------

/// `base * growth^exponent` by square-and-multiply. `None` on overflow.
pub fn geometric(base: Money, growth: Money, exponent: u64) -> Option<Money> {
    let mut result = base;
    let mut factor = growth;
    let mut e = exponent;
    while e > 0 {
        if e & 1 == 1 {
            result = result.checked_mul(factor)?;
        }
        e >>= 1;
        if e > 0 {
            factor = factor.checked_mul(factor)?;
        }
    }
    Some(result)
}

/// Round to cents, halves away from zero.
pub fn round_money(amount: Money) -> Money {
    amount.round_dp_with_strategy(MONEY_DP, RoundingStrategy::MidpointAwayFromZero)
}

/// Apply a `Fixed64` multiplier to a money amount and round to cents.
pub fn scale_money(amount: Money, multiplier: Fixed64) -> Option<Money> {
    amount
        .checked_mul(fixed_to_decimal(multiplier))
        .map(round_money)
}

// ---------------------------------------------------------------------------
// Businesses
// ---------------------------------------------------------------------------

/// A business definition. Income and upgrade cost are pure functions of level.
#[derive(Debug, Clone, PartialEq)]
pub struct Business {
    pub id: BusinessId,
    pub name: String,
    pub base_income_per_level: Money,
    pub base_upgrade_cost: Money,
    pub upgrade_cost_growth: Money,
}

impl Business {
    /// Income per second at `level`, before multipliers.
    pub fn income_per_second(&self, level: u32) -> Money {
        self.base_income_per_level.saturating_mul(Decimal::from(level))
    }

    /// Cost of buying level `level + 1`, before discounts.
    /// `None` once the cost no longer fits in a decimal.
    pub fn upgrade_cost(&self, level: u32) -> Option<Money> {
        geometric(self.base_upgrade_cost, self.upgrade_cost_growth, u64::from(level))
            .map(round_money)
    }
}

// ---------------------------------------------------------------------------
// Cost curves for owned instances
// ---------------------------------------------------------------------------

/// Price of the Nth owned instance: `base_cost * growth^(N-1)`.
#[derive(Debug, Clone, PartialEq)]
pub struct CostCurve {
    pub base_cost: Money,
    pub growth: Money,
    pub max_instances: Option<u32>,
}

/// Result of quoting the next instance on a [`CostCurve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quote {
    Price(Money),
    LimitReached(u32),
    /// The price overflowed; it can never be afforded.
    Unaffordable,
}

impl CostCurve {
    /// A flat price with no growth and no limit.
    pub fn flat(cost: Money) -> Self {
        Self {
            base_cost: cost,
            growth: Decimal::ONE,
            max_instances: None,
        }
    }

    /// Quote the next instance given how many are already owned.
    pub fn quote(&self, owned: u32) -> Quote {
        if let Some(limit) = self.max_instances
            && owned >= limit
        {
            return Quote::LimitReached(limit);
        }
        match geometric(self.base_cost, self.growth, u64::from(owned)) {
            Some(price) => Quote::Price(round_money(price)),
            None => Quote::Unaffordable,
        }
    }

    /// Quote as a command result.
    pub fn price(&self, owned: u32) -> Result<Money, Rejection> {
        match self.quote(owned) {
            Quote::Price(p) => Ok(p),
            Quote::LimitReached(limit) => Err(Rejection::LimitReached { limit }),
            Quote::Unaffordable => Err(Rejection::InsufficientFunds {
                needed: Decimal::MAX,
                available: Decimal::ZERO,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Player economy
// ---------------------------------------------------------------------------

/// Serde adapter storing a decimal as its 16-byte canonical form. Works
/// with non-self-describing encoders.
pub mod money_bytes {
    use rust_decimal::Decimal;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(value: &Decimal, serializer: S) -> Result<S::Ok, S::Error> {
        Decimal::serialize(value).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
        let bytes = <[u8; 16]>::deserialize(deserializer)?;
        Ok(Decimal::deserialize(bytes))
    }
}

/// The player's balances. `money` never goes below zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerEconomy {
    #[serde(with = "money_bytes")]
    pub money: Money,
    #[serde(with = "money_bytes")]
    pub lifetime_earnings: Money,
    /// Spendable prestige points.
    pub prestige_points: u32,
    /// Every prestige point ever awarded.
    pub prestige_points_earned: u32,
    pub times_prestiged: u32,
    /// Cumulative business levels bought; survives prestige.
    pub lifetime_levels: u64,
}

impl PlayerEconomy {
    pub fn new(starting_money: Money) -> Self {
        Self {
            money: starting_money.max(Decimal::ZERO),
            lifetime_earnings: Decimal::ZERO,
            prestige_points: 0,
            prestige_points_earned: 0,
            times_prestiged: 0,
            lifetime_levels: 0,
        }
    }

    pub fn can_afford(&self, cost: Money) -> bool {
        self.money >= cost
    }

    /// Deduct `cost`, or reject without mutating.
    pub fn try_spend(&mut self, cost: Money) -> Result<(), Rejection> {
        if !self.can_afford(cost) {
            return Err(Rejection::InsufficientFunds {
                needed: cost,
                available: self.money,
            });
        }
        self.money -= cost;
        Ok(())
    }

    /// Credit earned money. Non-positive amounts are ignored.
    pub fn earn(&mut self, amount: Money) {
        if amount > Decimal::ZERO {
            self.money = self.money.saturating_add(amount);
            self.lifetime_earnings = self.lifetime_earnings.saturating_add(amount);
        }
    }

    /// Deduct prestige points, or reject without mutating.
    pub fn try_spend_points(&mut self, cost: u32) -> Result<(), Rejection> {
        if self.prestige_points < cost {
            return Err(Rejection::InsufficientResource {
                resource: Resource::PrestigePoints,
                needed: u64::from(cost),
                available: u64::from(self.prestige_points),
            });
        }
        self.prestige_points -= cost;
        Ok(())
    }

    /// Award freshly earned prestige points.
    pub fn award_points(&mut self, points: u32) {
        self.prestige_points = self.prestige_points.saturating_add(points);
        self.prestige_points_earned = self.prestige_points_earned.saturating_add(points);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn dec(v: i64) -> Decimal {
        Decimal::from(v)
    }

    fn lemonade() -> Business {
        Business {
            id: BusinessId(0),
            name: "Lemonade Stand".to_string(),
            base_income_per_level: Decimal::new(15, 1),
            base_upgrade_cost: dec(10),
            upgrade_cost_growth: Decimal::new(115, 2),
        }
    }

    #[test]
    fn geometric_matches_repeated_multiplication() {
        let g = Decimal::new(115, 2);
        let mut expected = dec(10);
        for n in 0..12u64 {
            assert_eq!(geometric(dec(10), g, n).unwrap(), expected);
            expected *= g;
        }
    }

    #[test]
    fn geometric_overflow_is_none() {
        assert!(geometric(dec(1_000), dec(1_000), 20).is_none());
    }

    #[test]
    fn business_income_and_cost() {
        let b = lemonade();
        assert_eq!(b.income_per_second(0), Decimal::ZERO);
        assert_eq!(b.income_per_second(4), dec(6));
        assert_eq!(b.upgrade_cost(0).unwrap(), dec(10));
        assert_eq!(b.upgrade_cost(1).unwrap(), Decimal::new(1150, 2));
        assert_eq!(b.upgrade_cost(2).unwrap(), Decimal::new(1323, 2));
    }

    #[test]
    fn cost_curve_quotes_nth_instance() {
        let curve = CostCurve {
            base_cost: dec(100),
            growth: dec(2),
            max_instances: Some(3),
        };
        assert_eq!(curve.quote(0), Quote::Price(dec(100)));
        assert_eq!(curve.quote(2), Quote::Price(dec(400)));
        assert_eq!(curve.quote(3), Quote::LimitReached(3));
        assert_eq!(curve.price(3), Err(Rejection::LimitReached { limit: 3 }));
    }

    #[test]
    fn try_spend_rejects_without_mutation() {
        let mut eco = PlayerEconomy::new(dec(50));
        let err = eco.try_spend(dec(51)).unwrap_err();
        assert_eq!(
            err,
            Rejection::InsufficientFunds {
                needed: dec(51),
                available: dec(50)
            }
        );
        assert_eq!(eco.money, dec(50));
        eco.try_spend(dec(50)).unwrap();
        assert_eq!(eco.money, Decimal::ZERO);
    }

    #[test]
    fn prestige_points_balance_and_total() {
        let mut eco = PlayerEconomy::new(Decimal::ZERO);
        eco.award_points(5);
        eco.try_spend_points(3).unwrap();
        assert_eq!(eco.prestige_points, 2);
        assert_eq!(eco.prestige_points_earned, 5);
        assert!(eco.try_spend_points(3).is_err());
        assert_eq!(eco.prestige_points, 2);
    }

    #[test]
    fn economy_round_trips_through_json() {
        let mut eco = PlayerEconomy::new(Decimal::new(123_456, 2));
        eco.award_points(7);
        let json = serde_json::to_string(&eco).unwrap();
        let back: PlayerEconomy = serde_json::from_str(&json).unwrap();
        assert_eq!(back, eco);
    }

    proptest! {
        #[test]
        fn money_never_negative(start in 0i64..10_000, spends in proptest::collection::vec(0i64..5_000, 0..30)) {
            let mut eco = PlayerEconomy::new(dec(start));
            for s in spends {
                let _ = eco.try_spend(dec(s));
                prop_assert!(eco.money >= Decimal::ZERO);
            }
        }
    }
}
