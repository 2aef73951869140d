//! Headless driver: seeds a world, runs the tick loop, reports counts.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use wildgrid_core::{
    Entity, EntityType, LogCategory, SettingsPatch, World, WorldConfig, WorldHooks,
};
use wildgrid_events::{EventSettings, EventSystem};

/// Baseline cell count the default seeding densities are tuned for.
const BASELINE_AREA: f32 = 120.0 * 80.0;
/// Most missed ticks the realtime loop will catch up at once.
const MAX_CATCH_UP: u32 = 10;

#[derive(Parser, Debug)]
#[command(name = "wildgrid", about = "Grid ecosystem simulation", version)]
struct Cli {
    /// World width in cells.
    #[arg(long, default_value_t = 120)]
    width: i32,

    /// World height in cells.
    #[arg(long, default_value_t = 80)]
    height: i32,

    /// RNG seed for a reproducible run.
    #[arg(long)]
    seed: Option<u64>,

    /// Run this many ticks flat out and exit; omit for realtime pacing.
    #[arg(long)]
    ticks: Option<u64>,

    /// JSON settings file merged over the defaults.
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Write the effective settings to this path on exit.
    #[arg(long)]
    export_settings: Option<PathBuf>,

    /// Ticks between population reports.
    #[arg(long, default_value_t = 100)]
    report_interval: u64,
}

/// On-disk settings: the runtime knobs plus optional event configuration.
#[derive(Debug, Default, Serialize, Deserialize)]
struct SettingsFile {
    #[serde(flatten)]
    world: SettingsPatch,
    #[serde(default)]
    events: Option<EventSettings>,
}

/// Forwards world callbacks into the log stream.
struct LogHooks;

impl WorldHooks for LogHooks {
    fn on_extinction(&mut self, species: EntityType) {
        warn!(species = species.label(), "population fell below the survival line");
    }

    fn on_log_event(&mut self, message: &str, category: LogCategory) {
        info!(?category, "{message}");
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();
    let cli = Cli::parse();

    let config = WorldConfig {
        world_width: cli.width,
        world_height: cli.height,
        rng_seed: cli.seed,
        ..WorldConfig::default()
    };
    let mut world = World::with_hooks(config, Box::new(LogHooks))?;
    let mut events = EventSystem::new();

    if let Some(path) = &cli.settings {
        apply_settings_file(path, &mut world, &mut events)
            .with_context(|| format!("loading settings from {}", path.display()))?;
    }

    seed_world(&mut world);
    info!(
        width = world.width(),
        height = world.height(),
        entities = world.total_entities(),
        "world seeded"
    );

    match cli.ticks {
        Some(ticks) => run_fixed(&mut world, &mut events, ticks, cli.report_interval),
        None => run_realtime(&mut world, &mut events, cli.report_interval),
    }

    if let Some(path) = &cli.export_settings {
        export_settings_file(path, &world, &events)
            .with_context(|| format!("writing settings to {}", path.display()))?;
        info!(path = %path.display(), "settings exported");
    }
    Ok(())
}

fn apply_settings_file(path: &Path, world: &mut World, events: &mut EventSystem) -> Result<()> {
    let blob = fs::read_to_string(path)?;
    let file: SettingsFile = serde_json::from_str(&blob)?;
    file.world.apply(world.settings_mut());
    if let Some(event_settings) = &file.events {
        events.import_settings(event_settings);
    }
    Ok(())
}

fn export_settings_file(path: &Path, world: &World, events: &EventSystem) -> Result<()> {
    let file = SettingsFile {
        world: patch_from(world),
        events: Some(events.export_settings()),
    };
    fs::write(path, serde_json::to_string_pretty(&file)?)?;
    Ok(())
}

/// A full patch mirroring the world's current settings.
fn patch_from(world: &World) -> SettingsPatch {
    let s = world.settings();
    SettingsPatch {
        human_hunger_rate: Some(s.human_hunger_rate),
        wolf_hunger_rate: Some(s.wolf_hunger_rate),
        cow_hunger_rate: Some(s.cow_hunger_rate),
        human_reproduction_cost: Some(s.human_reproduction_cost),
        wolf_reproduction_cost: Some(s.wolf_reproduction_cost),
        cow_reproduction_cost: Some(s.cow_reproduction_cost),
        human_defense_chance: Some(s.human_defense_chance),
        human_war_chance: Some(s.human_war_chance),
        human_split_chance: Some(s.human_split_chance),
        wolf_hunt_threshold: Some(s.wolf_hunt_threshold),
        berry_regrowth: Some(s.berry_regrowth),
        tick_rate_ms: Some(s.tick_rate_ms),
    }
}

/// Scatter a starting ecosystem, scaled to the world's area.
fn seed_world(world: &mut World) {
    let area = (world.width() as f32) * (world.height() as f32);
    let scale = (area / BASELINE_AREA).clamp(0.25, 4.0);
    let scaled = |n: usize| ((n as f32) * scale).round().max(1.0) as usize;

    // A handful of small lakes.
    for _ in 0..scaled(6) {
        let (cx, cy) = random_cell(world);
        for dy in -3..=3_i32 {
            for dx in -3..=3_i32 {
                if dx * dx + dy * dy > 9 {
                    continue;
                }
                let (x, y) = (cx + dx, cy + dy);
                if world.in_bounds(x, y) && world.get_at(x, y).is_none() {
                    world.add_entity(Entity::water(x, y));
                }
            }
        }
    }
    scatter(world, scaled(150), |w, x, y| {
        let cfg = w.config().clone();
        Entity::tree(x, y, &cfg, w.rng())
    });
    scatter(world, scaled(100), |w, x, y| {
        let cfg = w.config().clone();
        Entity::berry_bush(x, y, &cfg, w.rng())
    });
    scatter(world, scaled(40), |w, x, y| {
        let cfg = w.config().clone();
        Entity::cow(x, y, None, &cfg, w.rng())
    });
    scatter(world, scaled(30), |w, x, y| {
        let cfg = w.config().clone();
        Entity::human(x, y, &cfg, w.rng())
    });
    scatter(world, scaled(10), |w, x, y| {
        let cfg = w.config().clone();
        Entity::wolf(x, y, None, &cfg, w.rng())
    });
}

fn random_cell(world: &mut World) -> (i32, i32) {
    let (w, h) = (world.width(), world.height());
    let x = world.rng().random_range(0..w);
    let y = world.rng().random_range(0..h);
    (x, y)
}

fn scatter(world: &mut World, count: usize, make: impl Fn(&mut World, i32, i32) -> Entity) {
    for _ in 0..count {
        for _ in 0..100 {
            let (x, y) = random_cell(world);
            if world.get_at(x, y).is_some() {
                continue;
            }
            let entity = make(world, x, y);
            world.add_entity(entity);
            break;
        }
    }
}

fn run_fixed(world: &mut World, events: &mut EventSystem, ticks: u64, report_interval: u64) {
    for _ in 0..ticks {
        world.tick();
        events.tick(world);
        if report_interval > 0 && world.tick_count() % report_interval == 0 {
            report(world);
        }
    }
    report(world);
}

/// Realtime pacing: one tick per `tick_rate_ms`, catching up after
/// stalls but discarding any backlog too deep to clear.
fn run_realtime(world: &mut World, events: &mut EventSystem, report_interval: u64) {
    let mut last = Instant::now();
    let mut backlog = Duration::ZERO;
    loop {
        let interval = Duration::from_millis(world.settings().tick_rate_ms.max(1));
        let now = Instant::now();
        backlog += now - last;
        last = now;
        let mut steps = 0;
        while backlog >= interval {
            backlog -= interval;
            world.tick();
            events.tick(world);
            if report_interval > 0 && world.tick_count() % report_interval == 0 {
                report(world);
            }
            steps += 1;
            if steps >= MAX_CATCH_UP {
                if backlog >= interval {
                    warn!(
                        missed = backlog.as_millis() as u64 / interval.as_millis().max(1) as u64,
                        "tick backlog too deep, discarding"
                    );
                    backlog = Duration::ZERO;
                }
                break;
            }
        }
        std::thread::sleep(interval.min(Duration::from_millis(5)));
    }
}

fn report(world: &World) {
    info!(
        tick = world.tick_count(),
        humans = world.count(EntityType::Human),
        wolves = world.count(EntityType::Wolf),
        cows = world.count(EntityType::Cow),
        trees = world.count(EntityType::Tree),
        bushes = world.count(EntityType::BerryBush),
        houses = world.count(EntityType::House),
        total = world.total_entities(),
        "population"
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_world(seed: u64) -> World {
        let config = WorldConfig {
            world_width: 60,
            world_height: 40,
            rng_seed: Some(seed),
            ..WorldConfig::default()
        };
        World::new(config).expect("config is valid")
    }

    #[test]
    fn seeding_places_every_species() {
        let mut world = test_world(21);
        seed_world(&mut world);
        for ty in [
            EntityType::Water,
            EntityType::Tree,
            EntityType::BerryBush,
            EntityType::Cow,
            EntityType::Human,
            EntityType::Wolf,
        ] {
            assert!(world.count(ty) > 0, "no {} seeded", ty.label());
        }
    }

    #[test]
    fn settings_file_round_trips_through_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.json");
        let mut world = test_world(22);
        let mut events = EventSystem::new();
        world.settings_mut().wolf_hunt_threshold = 42.0;
        events.set_chance(0.125);
        export_settings_file(&path, &world, &events).expect("export");

        let mut restored_world = test_world(23);
        let mut restored_events = EventSystem::new();
        apply_settings_file(&path, &mut restored_world, &mut restored_events).expect("import");
        assert_eq!(restored_world.settings().wolf_hunt_threshold, 42.0);
        assert_eq!(restored_events.chance(), 0.125);
    }

    #[test]
    fn partial_settings_file_keeps_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("partial.json");
        fs::write(&path, r#"{"berry_regrowth": 500}"#).expect("write");
        let mut world = test_world(24);
        let mut events = EventSystem::new();
        let before = world.settings().human_hunger_rate;
        apply_settings_file(&path, &mut world, &mut events).expect("import");
        assert_eq!(world.settings().berry_regrowth, 500);
        assert_eq!(world.settings().human_hunger_rate, before);
    }
}
