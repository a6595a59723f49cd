//! Tycoon Core -- shared primitives for the idle tycoon simulation.
//!
//! Every other crate in the workspace builds on these types:
//!
//! - [`fixed`] -- `Fixed64` (Q32.32) for rates, durations, power and energy;
//!   `Money` (decimal) for balances and prices.
//! - [`id`] -- typed ids for definitions and slotmap keys for owned instances.
//! - [`effect`] -- the tagged [`effect::Effect`] type and the
//!   [`effect::EffectLedger`] that folds all active bonuses into one
//!   [`effect::ResolvedEffects`] record per tick.
//! - [`economy`] -- businesses, geometric cost curves, and the player's
//!   balances.
//! - [`rejection`] -- reason codes returned by rejected commands.
//! - [`invariant`] -- reporting for broken invariants (programming defects).

pub mod economy;
pub mod effect;
pub mod fixed;
pub mod id;
pub mod invariant;
pub mod rejection;
