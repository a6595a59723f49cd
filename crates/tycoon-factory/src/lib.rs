//! Tycoon Factory -- production lines, machines and workers.
//!
//! - [`catalog`] -- static component recipes and machine types.
//! - [`machine`] -- owned machine instances: mark, upgrades, speed.
//! - [`inventory`] -- the raw-material pool and produced components.
//! - [`line`] -- slots, their derived phases, and factory events.
//! - [`worker`] -- the worker energy state machine and roster.
//! - [`factory`] -- the aggregate tying them together, with the per-tick
//!   line update.

pub mod catalog;
pub mod factory;
pub mod inventory;
pub mod line;
pub mod machine;
pub mod worker;

pub use factory::{Factory, LineContext, LineTick};
