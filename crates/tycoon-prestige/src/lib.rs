//! Prestige progression for the idle tycoon simulation.
//!
//! Converts the cumulative business-level counter into prestige points with
//! diminishing returns: every additional point costs at least as many
//! additional levels as the previous one.
//!
//! # Contract
//!
//! - [`PrestigeModel::levels_required_for_points`] is strictly increasing and
//!   convex in `n`, and returns `None` past the configured cap.
//! - [`PrestigeModel::cost_of_nth_point`] is the difference of consecutive
//!   requirements, never below one level, or [`PointCost::Capped`].
//! - [`PrestigeModel::points_for_levels`] is the exact integer inverse,
//!   found by monotonic search rather than by inverting a formula: a
//!   binary search on linear curves, a single walk over exponential ones.
//! - [`PrestigeModel::newly_gained_points`] is what a prestige awards.
//!
//! The model is pure. The reset itself lives with the game state, which
//! only runs it on the explicit prestige command.

use std::num::NonZeroU32;

use serde::{Deserialize, Serialize};
use tycoon_core::fixed::Fixed64;

// ---------------------------------------------------------------------------
// Curve shapes
// ---------------------------------------------------------------------------

/// How the level cost of each successive point grows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrestigeCurve {
    /// Point `n` costs `base + increment * (n - 1)` levels.
    Linear { base: u64, increment: u64 },

    /// Point `n` costs `floor(base * multiplier^(n - 1))` levels.
    /// `multiplier` must be at least 1.
    Exponential { base: u64, multiplier: Fixed64 },
}

impl PrestigeCurve {
    /// Level cost of point `n` (1-indexed) ignoring any cap. Never below 1.
    fn point_cost(&self, n: u32) -> u64 {
        debug_assert!(n >= 1);
        let steps = u64::from(n - 1);
        match self {
            PrestigeCurve::Linear { base, increment } => {
                base.saturating_add(increment.saturating_mul(steps)).max(1)
            }
            PrestigeCurve::Exponential { base, multiplier } => ExponentialCosts::new(*base, *multiplier)
                .nth(n as usize - 1)
                .unwrap_or(u64::MAX),
        }
    }
}

/// Costs of points 1, 2, 3, ... on an exponential curve, one multiplication
/// per point.
struct ExponentialCosts {
    /// Current cost in Q.32, widened so the integer part can pass `u64`.
    value: u128,
    multiplier: u128,
}

impl ExponentialCosts {
    fn new(base: u64, multiplier: Fixed64) -> Self {
        Self {
            value: u128::from(base) << 32,
            multiplier: multiplier.to_bits().max(0) as u128,
        }
    }
}

impl Iterator for ExponentialCosts {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        let whole = self.value >> 32;
        let cost = u64::try_from(whole).unwrap_or(u64::MAX).max(1);
        // Past u64 the cost stays saturated.
        if whole <= u128::from(u64::MAX) {
            self.value = self.value.saturating_mul(self.multiplier) >> 32;
        }
        Some(cost)
    }
}

// ---------------------------------------------------------------------------
// Results
// ---------------------------------------------------------------------------

/// The level cost of a single point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointCost {
    /// Additional business levels needed. Always at least 1.
    Levels(u64),
    /// The configured maximum has been reached; no amount of levels buys it.
    Capped,
}

/// Read-only view shown to the player before they prestige.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrestigePreview {
    pub total_levels: u64,
    pub current_points: u32,
    /// Points a prestige right now would award.
    pub newly_gained: u32,
    pub next_point_cost: PointCost,
    /// Levels still missing for one more point, `None` when capped.
    pub levels_to_next_point: Option<u64>,
}

/// What a prestige command did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrestigeOutcome {
    Gained { points: u32 },
    /// Nothing to gain; the reset was not performed.
    NoGain,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum PrestigeError {
    #[error("prestige curve base cost must be at least 1")]
    ZeroBase,
    #[error("exponential multiplier must be at least 1, got {0}")]
    ShrinkingMultiplier(Fixed64),
}

// ---------------------------------------------------------------------------
// Model
// ---------------------------------------------------------------------------

/// A validated prestige curve with an optional hard cap on points.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrestigeModel {
    curve: PrestigeCurve,
    max_points: Option<u32>,
}

impl PrestigeModel {
    /// Validate and build a model. Rejects curves that could produce a
    /// non-positive or shrinking cost.
    pub fn new(curve: PrestigeCurve, max_points: Option<u32>) -> Result<Self, PrestigeError> {
        match &curve {
            PrestigeCurve::Linear { base, .. } | PrestigeCurve::Exponential { base, .. }
                if *base == 0 =>
            {
                return Err(PrestigeError::ZeroBase);
            }
            PrestigeCurve::Exponential { multiplier, .. } if *multiplier < Fixed64::ONE => {
                return Err(PrestigeError::ShrinkingMultiplier(*multiplier));
            }
            _ => {}
        }
        Ok(Self { curve, max_points })
    }

    pub fn curve(&self) -> &PrestigeCurve {
        &self.curve
    }

    pub fn max_points(&self) -> Option<u32> {
        self.max_points
    }

    fn is_capped(&self, n: u32) -> bool {
        self.max_points.is_some_and(|max| n > max)
    }

    /// Additional levels needed for point `n`, or `Capped` past the maximum.
    pub fn cost_of_nth_point(&self, n: NonZeroU32) -> PointCost {
        if self.is_capped(n.get()) {
            PointCost::Capped
        } else {
            PointCost::Levels(self.curve.point_cost(n.get()))
        }
    }

    /// Cumulative levels needed to hold `n` points. `None` when `n` is past
    /// the cap or the requirement does not fit in a `u64`.
    pub fn levels_required_for_points(&self, n: u32) -> Option<u64> {
        if self.is_capped(n) {
            return None;
        }
        match &self.curve {
            PrestigeCurve::Linear { base, increment } => {
                let n = u128::from(n);
                let triangular = n * n.saturating_sub(1) / 2;
                let total = u128::from(*base)
                    .checked_mul(n)?
                    .checked_add(u128::from(*increment).checked_mul(triangular)?)?;
                u64::try_from(total).ok()
            }
            PrestigeCurve::Exponential { base, multiplier } if *multiplier == Fixed64::ONE => {
                (*base).max(1).checked_mul(u64::from(n))
            }
            PrestigeCurve::Exponential { base, multiplier } => ExponentialCosts::new(*base, *multiplier)
                .take(n as usize)
                .try_fold(0u64, |total, cost| total.checked_add(cost)),
        }
    }

    /// Largest `n` with `levels_required_for_points(n) <= total_levels`.
    pub fn points_for_levels(&self, total_levels: u64) -> u32 {
        // Every point costs at least one level, so the answer never exceeds
        // `total_levels`.
        let ceiling = self
            .max_points
            .unwrap_or(u32::MAX)
            .min(u32::try_from(total_levels).unwrap_or(u32::MAX));

        match &self.curve {
            PrestigeCurve::Linear { .. } => self.search_points(total_levels, ceiling),
            PrestigeCurve::Exponential { base, multiplier } if *multiplier == Fixed64::ONE => {
                let whole = total_levels / (*base).max(1);
                u32::try_from(whole).unwrap_or(u32::MAX).min(ceiling)
            }
            PrestigeCurve::Exponential { base, multiplier } => {
                // Costs only grow, so walk them once and stop at the first
                // point that no longer fits.
                let mut total: u64 = 0;
                let mut points: u32 = 0;
                for cost in ExponentialCosts::new(*base, *multiplier) {
                    if points >= ceiling {
                        break;
                    }
                    match total.checked_add(cost) {
                        Some(next) if next <= total_levels => {
                            total = next;
                            points += 1;
                        }
                        _ => break,
                    }
                }
                points
            }
        }
    }

    /// Gallop to an upper bound, then binary search. Each check is O(1) on
    /// a linear curve.
    fn search_points(&self, total_levels: u64, ceiling: u32) -> u32 {
        let affordable = |n: u32| {
            self.levels_required_for_points(n)
                .is_some_and(|required| required <= total_levels)
        };
        let mut lo: u32 = 0;
        let mut hi: u32 = 1;
        while hi <= ceiling && affordable(hi) {
            lo = hi;
            hi = hi.saturating_mul(2);
            if hi == u32::MAX {
                break;
            }
        }
        let mut hi = hi.min(ceiling.saturating_add(1));
        // Invariant: affordable(lo), !affordable(hi) or hi past the ceiling.
        while hi - lo > 1 {
            let mid = lo + (hi - lo) / 2;
            if affordable(mid) {
                lo = mid;
            } else {
                hi = mid;
            }
        }
        if hi <= ceiling && affordable(hi) { hi } else { lo }
    }

    /// Points a prestige would award right now.
    pub fn newly_gained_points(&self, total_levels: u64, current_points: u32) -> u32 {
        self.points_for_levels(total_levels)
            .saturating_sub(current_points)
    }

    pub fn preview(&self, total_levels: u64, current_points: u32) -> PrestigePreview {
        let reachable = self.points_for_levels(total_levels);
        let next = reachable.saturating_add(1);
        let next_point_cost = match NonZeroU32::new(next) {
            Some(n) => self.cost_of_nth_point(n),
            None => PointCost::Capped,
        };
        let levels_to_next_point = self
            .levels_required_for_points(next)
            .map(|required| required.saturating_sub(total_levels));
        PrestigePreview {
            total_levels,
            current_points,
            newly_gained: reachable.saturating_sub(current_points),
            next_point_cost,
            levels_to_next_point,
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
