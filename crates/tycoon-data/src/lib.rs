//! Data-driven game content for the tycoon simulation.
//!
//! A game directory holds one `game.ron`, `game.toml` or `game.json`. The
//! file uses human names for every cross-reference and plain numbers for
//! rates; [`load_definition`] resolves it into a
//! [`tycoon_game::definition::GameDefinition`] with typed ids.

pub mod loader;
pub mod resolve;
pub mod schema;

pub use loader::{DataLoadError, Format, load_definition, load_definition_str};
