//! Tycoon Game -- the engine that ties the idle tycoon simulation together.
//!
//! Owns the static [`definition::GameDefinition`] and the mutable
//! [`state::GameState`], and exposes three surfaces:
//!
//! - **Commands** (`command.rs`) -- validated player actions. Each applies
//!   in full or returns a [`tycoon_core::rejection::Rejection`] and leaves
//!   the state untouched.
//! - **Ticks** ([`engine::Engine::step`], [`engine::Engine::advance`]) --
//!   the seven-phase pipeline documented in [`engine`].
//! - **Queries** (`query.rs`) -- read-only views for a presentation layer.
//!
//! # Determinism
//!
//! Every container iterated during a tick is ordered (`BTreeMap`,
//! `BTreeSet`, `SlotMap` in key order, line/slot order) and every rate is
//! `Fixed64` or decimal, so the same definition, command sequence and
//! elapsed times produce byte-identical snapshots.
//!
//! # Persistence
//!
//! [`snapshot`] encodes the state with `bitcode` behind a versioned header.

pub mod command;
pub mod definition;
pub mod engine;
pub mod event;
pub mod query;
pub mod snapshot;
pub mod state;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
