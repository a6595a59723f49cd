//! Reason codes for rejected player commands.
//!
//! Every command validates against current state and either applies fully
//! or returns one of these without touching state. None of them are
//! programming errors; see [`crate::invariant`] for those.

use crate::fixed::Money;
use crate::id::*;

/// A countable resource a command can run short of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    PrestigePoints,
    RawMaterials,
    Component(ComponentId),
}

/// An entity a command referred to that does not exist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Business(BusinessId),
    Generator(GeneratorTypeId),
    Collector(CollectorTypeId),
    MachineType(MachineTypeId),
    Machine(MachineInstanceId),
    MachineUpgrade(MachineUpgradeId),
    Component(ComponentId),
    Worker(WorkerId),
    Slot(SlotRef),
    Skill(SkillId),
    Artifact(ArtifactId),
}

/// A specific unmet precondition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum Precondition {
    #[error("slot has no machine")]
    SlotEmpty,
    #[error("slot already holds a machine")]
    SlotOccupied,
    #[error("machine is already placed in a slot")]
    MachineAlreadyPlaced,
    #[error("machine is not placed in any slot")]
    MachineNotPlaced,
    #[error("recipe tier {tier} exceeds machine tier {max}")]
    TierTooHigh { tier: u32, max: u32 },
    #[error("upgrade does not belong to this machine type")]
    UpgradeNotApplicable,
    #[error("already purchased")]
    AlreadyOwned,
    #[error("prerequisite skill {0:?} not unlocked")]
    MissingPrerequisite(SkillId),
    #[error("headquarters is at its maximum level")]
    MaxLevel,
    #[error("worker is resting")]
    WorkerResting,
}

/// Why a command was rejected. State is unchanged whenever one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Rejection {
    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: Money, available: Money },

    #[error("insufficient {resource:?}: need {needed}, have {available}")]
    InsufficientResource {
        resource: Resource,
        needed: u64,
        available: u64,
    },

    #[error("precondition not met: {0}")]
    PreconditionNotMet(#[from] Precondition),

    #[error("unknown {0:?}")]
    Unknown(Entity),

    #[error("limit of {limit} reached")]
    LimitReached { limit: u32 },
}
