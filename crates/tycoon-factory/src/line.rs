//! Production lines and the per-slot crafting state machine.
//!
//! ```text
//! Empty -> MachinePlaced -> RecipeSet -> Crafting -> RecipeSet
//!                                 ^          |
//!                                 +- Blocked +
//! ```
//!
//! The slot stores only what it holds (machine, recipe, timer, last block
//! reason); the phase is derived. A blocked slot keeps its timer so paused
//! progress survives a power dip or a material shortage.

use serde::{Deserialize, Serialize};
use tycoon_core::fixed::Fixed64;
use tycoon_core::id::{ComponentId, MachineInstanceId, SlotRef};

/// Why a slot with a machine and a recipe did not advance this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BlockReason {
    NoWorker,
    WorkerResting,
    PowerDeficit,
    RawMaterials,
    MissingInput(ComponentId),
}

/// Countdown for the craft in progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CraftTimer {
    pub remaining: Fixed64,
    pub total: Fixed64,
}

impl CraftTimer {
    pub fn start(total: Fixed64) -> Self {
        Self {
            remaining: total,
            total,
        }
    }

    /// Completed fraction in `[0, 1]`.
    pub fn progress(&self) -> Fixed64 {
        if self.total <= Fixed64::ZERO {
            return Fixed64::ONE;
        }
        let done = (self.total - self.remaining.max(Fixed64::ZERO)) / self.total;
        done.clamp(Fixed64::ZERO, Fixed64::ONE)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotPhase {
    Empty,
    MachinePlaced,
    RecipeSet,
    Crafting,
    Blocked(BlockReason),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionSlot {
    pub machine: Option<MachineInstanceId>,
    pub recipe: Option<ComponentId>,
    pub timer: Option<CraftTimer>,
    pub blocked: Option<BlockReason>,
}

impl ProductionSlot {
    pub fn phase(&self) -> SlotPhase {
        match (self.machine, self.recipe, self.blocked, self.timer) {
            (None, ..) => SlotPhase::Empty,
            (Some(_), None, ..) => SlotPhase::MachinePlaced,
            (Some(_), Some(_), Some(reason), _) => SlotPhase::Blocked(reason),
            (Some(_), Some(_), None, Some(_)) => SlotPhase::Crafting,
            (Some(_), Some(_), None, None) => SlotPhase::RecipeSet,
        }
    }

    /// Drop any in-progress craft. Spent time is not refunded.
    pub fn discard_progress(&mut self) {
        self.timer = None;
        self.blocked = None;
    }
}

/// A fixed row of slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductionLine {
    pub slots: Vec<ProductionSlot>,
}

impl ProductionLine {
    pub fn new(slots: u32) -> Self {
        Self {
            slots: vec![ProductionSlot::default(); slots as usize],
        }
    }
}

/// Slot transitions emitted during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FactoryEvent {
    CraftStarted { slot: SlotRef, component: ComponentId },
    ComponentProduced { slot: SlotRef, component: ComponentId },
    SlotBlocked { slot: SlotRef, reason: BlockReason },
    SlotResumed { slot: SlotRef },
}

/// Non-fatal notes on an accepted command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Warning {
    /// The recipe's bonus is already at its cap; more units add nothing.
    SaturatedBonus { component: ComponentId },
}
