//! Events produced by ticks and commands, drained by the caller.

use tycoon_core::id::BusinessId;
use tycoon_factory::line::FactoryEvent;
use tycoon_factory::worker::WorkerEvent;
use tycoon_power::PowerEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    Power(PowerEvent),
    Factory(FactoryEvent),
    Worker(WorkerEvent),
    BusinessUpgraded { business: BusinessId, level: u32 },
    Prestiged { points: u32, times_prestiged: u32 },
}

impl From<PowerEvent> for GameEvent {
    fn from(e: PowerEvent) -> Self {
        GameEvent::Power(e)
    }
}

impl From<FactoryEvent> for GameEvent {
    fn from(e: FactoryEvent) -> Self {
        GameEvent::Factory(e)
    }
}

impl From<WorkerEvent> for GameEvent {
    fn from(e: WorkerEvent) -> Self {
        GameEvent::Worker(e)
    }
}
