//! Binary snapshots of [`GameState`] via `bitcode`, with a versioned header.
//!
//! The definition is not stored: a snapshot is loaded against the
//! definition the caller supplies. The byte format is not a
//! compatibility promise; the header only stops a mismatched build from
//! misreading it.

use serde::{Deserialize, Serialize};

use crate::definition::GameDefinition;
use crate::engine::Engine;
use crate::state::GameState;

/// Magic number identifying a tycoon snapshot.
pub const SNAPSHOT_MAGIC: u32 = 0x71C0_0001;

/// Current format version. Increment when breaking the wire format.
pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, thiserror::Error)]
pub enum SnapshotError {
    #[error("bitcode encoding failed: {0}")]
    Encode(String),
    #[error("bitcode decoding failed: {0}")]
    Decode(String),
    #[error("invalid magic number: expected 0x{:08X}, got 0x{:08X}", SNAPSHOT_MAGIC, .0)]
    InvalidMagic(u32),
    #[error("unsupported format version: expected {}, got {}", FORMAT_VERSION, .0)]
    UnsupportedVersion(u32),
    #[error("snapshot from future version {0} (this build supports up to {FORMAT_VERSION})")]
    FutureVersion(u32),
}

/// Prepended to every snapshot so the version can be checked before the
/// state is trusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotHeader {
    pub magic: u32,
    pub version: u32,
    /// Tick count when the snapshot was taken.
    pub tick: u64,
}

impl SnapshotHeader {
    pub fn new(tick: u64) -> Self {
        Self {
            magic: SNAPSHOT_MAGIC,
            version: FORMAT_VERSION,
            tick,
        }
    }

    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.magic != SNAPSHOT_MAGIC {
            return Err(SnapshotError::InvalidMagic(self.magic));
        }
        if self.version > FORMAT_VERSION {
            return Err(SnapshotError::FutureVersion(self.version));
        }
        if self.version < FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        Ok(())
    }
}

#[derive(Deserialize)]
struct Snapshot {
    header: SnapshotHeader,
    state: GameState,
}

/// Borrowing twin of [`Snapshot`]; encodes identically.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    header: SnapshotHeader,
    state: &'a GameState,
}

impl Engine {
    /// Serialize the current state.
    pub fn save(&self) -> Result<Vec<u8>, SnapshotError> {
        let snapshot = SnapshotRef {
            header: SnapshotHeader::new(self.state.tick),
            state: &self.state,
        };
        bitcode::serialize(&snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))
    }

    /// Restore an engine from [`Engine::save`] output. Pending events are
    /// not part of a snapshot.
    pub fn load(definition: GameDefinition, data: &[u8]) -> Result<Self, SnapshotError> {
        let snapshot: Snapshot =
            bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
        snapshot.header.validate()?;
        tracing::info!(tick = snapshot.header.tick, "snapshot loaded");
        Ok(Engine::from_parts(definition, snapshot.state))
    }
}

/// Read only the header of a snapshot.
pub fn read_snapshot_header(data: &[u8]) -> Result<SnapshotHeader, SnapshotError> {
    let snapshot: Snapshot =
        bitcode::deserialize(data).map_err(|e| SnapshotError::Decode(e.to_string()))?;
    Ok(snapshot.header)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::*;
    use proptest::prelude::*;

    // -----------------------------------------------------------------------
    // Test 1: Save and load round-trip to identical bytes
    // -----------------------------------------------------------------------
    #[test]
    fn round_trip_preserves_state() {
        let (mut engine, _, _) = crafting_engine(10);
        engine.upgrade_business(LEMONADE).unwrap();
        engine.purchase_material_collector(SCRAP_PICKER).unwrap();
        for _ in 0..5 {
            engine.step();
        }

        let bytes = engine.save().unwrap();
        let restored = Engine::load(sample_definition(), &bytes).unwrap();
        assert_eq!(restored.state().tick, 5);
        assert_eq!(restored.money(), engine.money());
        assert_eq!(restored.component_count(PLATE), engine.component_count(PLATE));
        assert_eq!(restored.save().unwrap(), bytes);
    }

    // -----------------------------------------------------------------------
    // Test 2: A restored engine continues exactly like the original
    // -----------------------------------------------------------------------
    #[test]
    fn restored_engine_stays_in_lockstep() {
        let (mut engine, _, _) = crafting_engine(20);
        engine.advance(fixed(3.5));
        let mut restored = Engine::load(sample_definition(), &engine.save().unwrap()).unwrap();

        engine.advance(fixed(7.25));
        restored.advance(fixed(7.25));
        assert_eq!(engine.save().unwrap(), restored.save().unwrap());
    }

    // -----------------------------------------------------------------------
    // Test 3: Header checks
    // -----------------------------------------------------------------------
    #[test]
    fn header_validation() {
        assert!(SnapshotHeader::new(3).validate().is_ok());

        let mut bad = SnapshotHeader::new(0);
        bad.magic = 0xDEAD_BEEF;
        assert!(matches!(bad.validate(), Err(SnapshotError::InvalidMagic(0xDEAD_BEEF))));

        let mut future = SnapshotHeader::new(0);
        future.version = FORMAT_VERSION + 1;
        assert!(matches!(future.validate(), Err(SnapshotError::FutureVersion(_))));
    }

    // -----------------------------------------------------------------------
    // Test 4: Garbage input is a decode error
    // -----------------------------------------------------------------------
    #[test]
    fn garbage_fails_to_decode() {
        let result = Engine::load(sample_definition(), &[1, 2, 3]);
        assert!(matches!(result, Err(SnapshotError::Decode(_))));
    }

    // -----------------------------------------------------------------------
    // Test 5: The header can be read without restoring
    // -----------------------------------------------------------------------
    #[test]
    fn header_is_readable_alone() {
        let mut engine = sample_engine();
        engine.advance(fixed(4.0));
        let header = read_snapshot_header(&engine.save().unwrap()).unwrap();
        assert_eq!(header, SnapshotHeader::new(4));
    }

    // -----------------------------------------------------------------------
    // Properties
    // -----------------------------------------------------------------------

    /// Player commands a script can issue.
    #[derive(Debug, Clone)]
    enum Command {
        Step,
        /// Quarter seconds.
        Advance(u32),
        Upgrade(usize),
        BuyGenerator,
        BuyCollector,
        Prestige,
    }

    fn arb_command() -> impl Strategy<Value = Command> {
        prop_oneof![
            4 => Just(Command::Step),
            2 => (1u32..20).prop_map(Command::Advance),
            3 => (0usize..3).prop_map(Command::Upgrade),
            1 => Just(Command::BuyGenerator),
            1 => Just(Command::BuyCollector),
            1 => Just(Command::Prestige),
        ]
    }

    /// Rejected commands are part of the script too.
    fn apply(engine: &mut Engine, command: &Command) {
        match *command {
            Command::Step => engine.step(),
            Command::Advance(quarters) => {
                engine.advance(fixed(f64::from(quarters) / 4.0));
            }
            Command::Upgrade(i) => {
                let _ = engine.upgrade_business([LEMONADE, NEWSPAPER, CAR_WASH][i]);
            }
            Command::BuyGenerator => {
                let _ = engine.purchase_power_building(SOLAR);
            }
            Command::BuyCollector => {
                let _ = engine.purchase_material_collector(SCRAP_PICKER);
            }
            Command::Prestige => {
                engine.perform_prestige();
            }
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(32))]

        /// Two engines fed the same script save identical bytes, and an
        /// engine restored partway through finishes in the same state.
        #[test]
        fn scripts_are_deterministic_across_reloads(
            script in proptest::collection::vec(arb_command(), 1..40),
            cut in any::<proptest::sample::Index>(),
        ) {
            let cut = cut.index(script.len() + 1);
            let (mut a, _, _) = crafting_engine(30);
            let (mut b, _, _) = crafting_engine(30);
            grant_money(&mut a, dec(500));
            grant_money(&mut b, dec(500));

            for command in &script[..cut] {
                apply(&mut a, command);
                apply(&mut b, command);
            }
            let mut restored = Engine::load(sample_definition(), &a.save().unwrap()).unwrap();
            for command in &script[cut..] {
                apply(&mut a, command);
                apply(&mut b, command);
                apply(&mut restored, command);
            }

            let bytes = a.save().unwrap();
            prop_assert_eq!(&b.save().unwrap(), &bytes);
            prop_assert_eq!(&restored.save().unwrap(), &bytes);
        }
    }
}
