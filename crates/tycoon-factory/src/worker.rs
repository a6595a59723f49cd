//! Worker energy: who may run a machine, and the rest cycle after exhaustion.
//!
//! A worker is `Idle` with full energy when hired. It becomes `Working` on
//! any tick its machine's slot is crafting and drains energy for the real
//! time elapsed. At zero it is `Resting`: treated as absent by the
//! production preconditions until it has recovered to full and returned to
//! `Idle`. Idle workers do not recover.
//!
//! [`Roster::tick`] applies energy exactly once per worker per tick, no
//! matter how many slots mention it.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use tycoon_core::fixed::Fixed64;
use tycoon_core::id::{MachineInstanceId, WorkerId};
use tycoon_core::invariant;
use tycoon_core::rejection::{Entity, Precondition, Rejection};

/// Energy limits and rates, per second of real elapsed time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnergyConfig {
    pub max_energy: Fixed64,
    pub depletion_per_second: Fixed64,
    /// Before the energy recovery multiplier.
    pub recovery_per_second: Fixed64,
}

impl Default for EnergyConfig {
    fn default() -> Self {
        Self {
            max_energy: Fixed64::from_num(100),
            depletion_per_second: Fixed64::ONE,
            recovery_per_second: Fixed64::from_num(2),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WorkerStatus {
    #[default]
    Idle,
    Working,
    Resting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Worker {
    /// Always within `[0, max_energy]`.
    pub energy: Fixed64,
    pub status: WorkerStatus,
    /// Back-reference to the machine this worker operates.
    pub machine: Option<MachineInstanceId>,
}

/// Status transitions reported by [`Roster::tick`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerEvent {
    Exhausted { worker: WorkerId },
    Recovered { worker: WorkerId },
}

/// All hired workers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Roster {
    workers: SlotMap<WorkerId, Worker>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hire a worker: idle, full energy, unassigned.
    pub fn hire(&mut self, config: &EnergyConfig) -> WorkerId {
        self.workers.insert(Worker {
            energy: config.max_energy,
            status: WorkerStatus::Idle,
            machine: None,
        })
    }

    pub fn len(&self) -> usize {
        self.workers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    pub fn get(&self, id: WorkerId) -> Result<&Worker, Rejection> {
        self.workers
            .get(id)
            .ok_or(Rejection::Unknown(Entity::Worker(id)))
    }

    pub fn iter(&self) -> impl Iterator<Item = (WorkerId, &Worker)> {
        self.workers.iter()
    }

    /// The worker operating `machine`, if any.
    pub fn worker_on(&self, machine: MachineInstanceId) -> Option<WorkerId> {
        let mut found = self
            .workers
            .iter()
            .filter(|(_, w)| w.machine == Some(machine))
            .map(|(id, _)| id);
        let first = found.next();
        if found.next().is_some() {
            invariant::violation("two workers assigned to one machine");
        }
        first
    }

    /// Put `worker` on `machine`. Any earlier machine of this worker and any
    /// other worker on `machine` are vacated first. Returns the worker that
    /// was displaced from `machine`, if any.
    pub fn assign(
        &mut self,
        worker: WorkerId,
        machine: MachineInstanceId,
    ) -> Result<Option<WorkerId>, Rejection> {
        let w = self.get(worker)?;
        if w.status == WorkerStatus::Resting {
            return Err(Precondition::WorkerResting.into());
        }

        let displaced = self.worker_on(machine).filter(|&other| other != worker);
        if let Some(other) = displaced
            && let Some(o) = self.workers.get_mut(other)
        {
            o.machine = None;
            if o.status == WorkerStatus::Working {
                o.status = WorkerStatus::Idle;
            }
        }
        if let Some(w) = self.workers.get_mut(worker) {
            if w.machine != Some(machine) && w.status == WorkerStatus::Working {
                w.status = WorkerStatus::Idle;
            }
            w.machine = Some(machine);
        }
        Ok(displaced)
    }

    /// Take `worker` off its machine. Returns the machine it left.
    pub fn unassign(&mut self, worker: WorkerId) -> Result<Option<MachineInstanceId>, Rejection> {
        let w = self
            .workers
            .get_mut(worker)
            .ok_or(Rejection::Unknown(Entity::Worker(worker)))?;
        let left = w.machine.take();
        if w.status == WorkerStatus::Working {
            w.status = WorkerStatus::Idle;
        }
        Ok(left)
    }

    /// Apply one tick of energy. `crafting` holds the workers whose slot
    /// crafted this tick; `dt` is real elapsed seconds.
    pub fn tick(
        &mut self,
        crafting: &BTreeSet<WorkerId>,
        dt: Fixed64,
        config: &EnergyConfig,
        recovery_multiplier: Fixed64,
    ) -> Vec<WorkerEvent> {
        let mut events = Vec::new();
        for (id, worker) in self.workers.iter_mut() {
            if crafting.contains(&id) {
                if worker.status == WorkerStatus::Resting {
                    invariant::violation("resting worker crafted");
                }
                let spent = config.depletion_per_second.saturating_mul(dt);
                worker.energy = worker.energy.saturating_sub(spent).max(Fixed64::ZERO);
                if worker.energy == Fixed64::ZERO {
                    worker.status = WorkerStatus::Resting;
                    tracing::debug!(?id, "worker exhausted");
                    events.push(WorkerEvent::Exhausted { worker: id });
                } else {
                    worker.status = WorkerStatus::Working;
                }
                continue;
            }

            match worker.status {
                WorkerStatus::Resting => {
                    let gained = config
                        .recovery_per_second
                        .saturating_mul(recovery_multiplier)
                        .saturating_mul(dt);
                    worker.energy = worker.energy.saturating_add(gained).min(config.max_energy);
                    if worker.energy >= config.max_energy {
                        worker.status = WorkerStatus::Idle;
                        tracing::debug!(?id, "worker recovered");
                        events.push(WorkerEvent::Recovered { worker: id });
                    }
                }
                WorkerStatus::Working => worker.status = WorkerStatus::Idle,
                WorkerStatus::Idle => {}
            }
        }
        events
    }
}
