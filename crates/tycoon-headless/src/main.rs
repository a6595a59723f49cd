//! Headless runner: loads a game definition, plays a scripted session with
//! a simple autopilot, checks a save/load round trip and an offline
//! catch-up, and prints KPIs.
//!
//! ```text
//! tycoon-headless [--data DIR] [--minutes N] [--offline-hours H] [--snapshot FILE]
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`).

use std::path::PathBuf;

use anyhow::{Context, Result, ensure};
use clap::Parser;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;
use tycoon_core::fixed::Fixed64;
use tycoon_core::id::{BusinessId, MachineInstanceId};
use tycoon_factory::line::SlotPhase;
use tycoon_game::engine::Engine;
use tycoon_game::event::GameEvent;
use tycoon_power::PowerEvent;

/// Prestige once a reset would award at least this many points.
const PRESTIGE_THRESHOLD: u32 = 3;

/// Most purchases the autopilot makes in one tick.
const MAX_BUYS_PER_TICK: usize = 25;

#[derive(Debug, Parser)]
#[command(name = "tycoon-headless")]
#[command(about = "Plays a scripted idle session against a game definition and prints KPIs")]
#[command(version)]
struct Args {
    /// Directory holding the game definition
    #[arg(long, default_value = "data")]
    data: PathBuf,

    /// Minutes of online play, one tick per second
    #[arg(long, default_value = "120")]
    minutes: u64,

    /// Hours away simulated after the reload
    #[arg(long, default_value = "2")]
    offline_hours: u64,

    /// Write the end-of-session save here
    #[arg(long)]
    snapshot: Option<PathBuf>,
}

// ===========================================================================
// Autopilot
// ===========================================================================

/// Buy the cheapest business level while affordable.
fn buy_businesses(engine: &mut Engine) {
    let ids: Vec<BusinessId> = engine.definition().businesses.keys().copied().collect();
    for _ in 0..MAX_BUYS_PER_TICK {
        let cheapest = ids
            .iter()
            .filter_map(|&id| engine.upgrade_cost(id).ok().map(|cost| (cost, id)))
            .min();
        match cheapest {
            Some((cost, id)) if engine.money() >= cost => {
                let _ = engine.upgrade_business(id);
            }
            _ => break,
        }
    }
}

/// Keep every placed machine powered, with a little headroom for
/// collectors.
fn buy_power(engine: &mut Engine) {
    let headroom = Fixed64::from_num(20);
    if engine.net_power() >= headroom {
        return;
    }
    let generators: Vec<_> = engine.definition().power.generators.keys().copied().collect();
    for id in generators {
        if engine.purchase_power_building(id).is_ok() {
            return;
        }
    }
}

/// Add a collector once raw materials run low.
fn buy_collectors(engine: &mut Engine) {
    if engine.raw_materials() >= 20 {
        return;
    }
    let cheapest = engine
        .definition()
        .power
        .collectors
        .values()
        .min_by_key(|c| c.power_consumption)
        .map(|c| (c.id, c.power_consumption));
    if let Some((id, draw)) = cheapest
        && engine.net_power() >= draw
    {
        let _ = engine.purchase_material_collector(id);
    }
}

/// Fill the next empty slot with the most basic machine, staff it, and
/// point it at the lowest-tier recipe.
fn expand_factory(engine: &mut Engine) {
    let def = engine.definition();
    let cheapest_machine = def.factory.machines.values().min_by_key(|m| (m.base_tier, m.id));
    let Some(machine_type) = cheapest_machine.map(|m| m.id) else {
        return;
    };
    let simplest_recipe = def.factory.components.values().min_by_key(|c| (c.tier, c.id));
    let Some(recipe) = simplest_recipe.map(|c| c.id) else {
        return;
    };
    let Some(empty) = engine
        .slot_views()
        .into_iter()
        .find(|v| v.phase == SlotPhase::Empty)
        .map(|v| v.at)
    else {
        return;
    };

    let Ok(machine) = engine.purchase_machine(machine_type) else {
        return;
    };
    if engine.place_machine(machine, empty).is_err() {
        return;
    }
    let _ = engine.set_slot_recipe(empty, Some(recipe));
    if let Ok(worker) = engine.hire_worker() {
        let _ = engine.assign_worker(worker, machine);
    }
}

/// Put idle unassigned workers on unstaffed machines.
fn staff_machines(engine: &mut Engine) {
    let workers = engine.workers();
    let staffed: Vec<MachineInstanceId> = workers.iter().filter_map(|w| w.machine).collect();
    let unstaffed = engine
        .slot_views()
        .into_iter()
        .filter_map(|v| v.machine)
        .filter(|m| !staffed.contains(m));
    let free = workers.iter().filter(|w| w.machine.is_none()).map(|w| w.id);
    let pairs: Vec<_> = free.zip(unstaffed).collect();
    for (worker, machine) in pairs {
        let _ = engine.assign_worker(worker, machine);
    }
}

/// Spend prestige points on skills in definition order.
fn spend_points(engine: &mut Engine) {
    let skills: Vec<_> = engine
        .definition()
        .skills
        .values()
        .filter(|s| !engine.state().skills.contains(&s.id))
        .map(|s| (s.id, s.cost_points))
        .collect();
    for (id, cost) in skills {
        if engine.prestige_points() >= cost {
            let _ = engine.unlock_skill(id);
        }
    }
}

fn autopilot(engine: &mut Engine) {
    if engine.prestige_preview().newly_gained >= PRESTIGE_THRESHOLD {
        let outcome = engine.perform_prestige();
        info!(?outcome, "prestiged");
        spend_points(engine);
    }
    buy_businesses(engine);
    buy_power(engine);
    buy_collectors(engine);
    expand_factory(engine);
    staff_machines(engine);
}

// ===========================================================================
// Reporting
// ===========================================================================

#[derive(Debug, Default)]
struct EventTally {
    produced: u64,
    blocked: u64,
    exhausted: u64,
    deficits: u64,
    prestiges: u64,
}

impl EventTally {
    fn record(&mut self, events: &[GameEvent]) {
        use tycoon_factory::line::FactoryEvent;
        use tycoon_factory::worker::WorkerEvent;
        use tycoon_game::event::GameEvent as E;

        for event in events {
            match event {
                E::Factory(FactoryEvent::ComponentProduced { .. }) => self.produced += 1,
                E::Factory(FactoryEvent::SlotBlocked { .. }) => self.blocked += 1,
                E::Worker(WorkerEvent::Exhausted { .. }) => self.exhausted += 1,
                E::Power(PowerEvent::Deficit { .. }) => self.deficits += 1,
                E::Prestiged { .. } => self.prestiges += 1,
                _ => {}
            }
        }
    }
}

fn report(label: &str, engine: &Engine) {
    let state = engine.state();
    let components: u64 = state.factory.components.iter().map(|(_, n)| n).sum();
    println!(
        "KPI [{label}] | tick: {} | money: ${} | income/s: ${} | lifetime: ${} | prestige pts: {} (x{}) | net power: {} W | materials: {} | components: {} | workers: {}",
        state.tick,
        engine.money().round_dp(2),
        engine.total_income_per_second().round_dp(2),
        state.economy.lifetime_earnings.round_dp(2),
        engine.prestige_points(),
        state.economy.times_prestiged,
        engine.net_power(),
        engine.raw_materials(),
        components,
        engine.workers().len(),
    );
}

// ===========================================================================
// Main
// ===========================================================================

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let args = Args::parse();
    info!(data = %args.data.display(), minutes = args.minutes, "starting headless session");

    let definition = tycoon_data::load_definition(&args.data)
        .with_context(|| format!("loading game data from {}", args.data.display()))?;
    let mut engine = Engine::new(definition.clone());

    let mut tally = EventTally::default();
    let ticks = args.minutes * 60;
    for tick in 0..ticks {
        autopilot(&mut engine);
        engine.step();
        tally.record(&engine.drain_events());
        if tick % 600 == 0 {
            debug!(tick, money = %engine.money(), "progress");
        }
    }
    report("online", &engine);
    info!(?tally, "session events");

    let bytes = engine.save().context("saving snapshot")?;
    if let Some(path) = &args.snapshot {
        std::fs::write(path, &bytes).with_context(|| format!("writing {}", path.display()))?;
        info!(path = %path.display(), bytes = bytes.len(), "snapshot written");
    }

    let mut restored = Engine::load(definition, &bytes).context("loading snapshot")?;
    ensure!(
        restored.save().context("re-saving snapshot")? == bytes,
        "snapshot round trip changed the state"
    );

    let offline = Fixed64::from_num(args.offline_hours * 60 * 60);
    let result = restored.resume(offline);
    let mut offline_tally = EventTally::default();
    offline_tally.record(&restored.drain_events());
    report("after offline", &restored);
    info!(
        steps = result.steps_run,
        discarded = %result.discarded_seconds,
        tally = ?offline_tally,
        "offline catch-up"
    );

    Ok(())
}

// ===========================================================================
// Tests
// ===========================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    // -----------------------------------------------------------------------
    // Test 1: The command definition is well formed
    // -----------------------------------------------------------------------
    #[test]
    fn command_is_valid() {
        Args::command().debug_assert();
    }

    // -----------------------------------------------------------------------
    // Test 2: Defaults and overrides
    // -----------------------------------------------------------------------
    #[test]
    fn parses_defaults_and_flags() {
        let defaults = Args::try_parse_from(["tycoon-headless"]).unwrap();
        assert_eq!(defaults.data, PathBuf::from("data"));
        assert_eq!(defaults.minutes, 120);
        assert_eq!(defaults.offline_hours, 2);
        assert!(defaults.snapshot.is_none());

        let args = Args::try_parse_from([
            "tycoon-headless",
            "--minutes",
            "5",
            "--offline-hours",
            "8",
            "--snapshot",
            "save.bin",
        ])
        .unwrap();
        assert_eq!(args.minutes, 5);
        assert_eq!(args.offline_hours, 8);
        assert_eq!(args.snapshot, Some(PathBuf::from("save.bin")));

        assert!(Args::try_parse_from(["tycoon-headless", "--minutes", "soon"]).is_err());
    }
}
