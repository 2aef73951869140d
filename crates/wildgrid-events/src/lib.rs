//! Random world events: booms, plagues, and natural disasters that
//! reshape the grid between ordinary ticks.

use std::collections::{HashMap, HashSet, VecDeque};

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::info;

use wildgrid_core::{Entity, EntityId, EntityKind, EntityType, LogCategory, World};

/// Default per-tick probability of a random event firing.
const DEFAULT_EVENT_CHANCE: f64 = 0.005;
/// Log lines retained per category.
const LOG_DEPTH: usize = 10;
/// Ticks a visual effect marker lingers on an entity.
const EFFECT_LIFE: u32 = 15;
/// Populations above this are culled in half on the periodic cap check.
const POPULATION_CAP: usize = 1_000;

/// Every event the system can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    PopulationBoon,
    PopulationPlague,
    Meteorite,
    ResourceBoom,
    ResourceBlight,
    TheGreatBloom,
    FlashFlood,
    Drought,
    Earthquake,
    Volcano,
    HeatWave,
    Monsoon,
}

impl EventKind {
    pub const ALL: [EventKind; 12] = [
        EventKind::PopulationBoon,
        EventKind::PopulationPlague,
        EventKind::Meteorite,
        EventKind::ResourceBoom,
        EventKind::ResourceBlight,
        EventKind::TheGreatBloom,
        EventKind::FlashFlood,
        EventKind::Drought,
        EventKind::Earthquake,
        EventKind::Volcano,
        EventKind::HeatWave,
        EventKind::Monsoon,
    ];

    #[must_use]
    pub const fn category(self) -> LogCategory {
        match self {
            EventKind::PopulationBoon | EventKind::PopulationPlague => LogCategory::Population,
            EventKind::ResourceBoom | EventKind::ResourceBlight | EventKind::TheGreatBloom => {
                LogCategory::Resource
            }
            EventKind::Meteorite
            | EventKind::FlashFlood
            | EventKind::Drought
            | EventKind::Earthquake
            | EventKind::Volcano
            | EventKind::HeatWave
            | EventKind::Monsoon => LogCategory::Disaster,
        }
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            EventKind::PopulationBoon => "population boon",
            EventKind::PopulationPlague => "plague",
            EventKind::Meteorite => "meteorite",
            EventKind::ResourceBoom => "resource boom",
            EventKind::ResourceBlight => "blight",
            EventKind::TheGreatBloom => "the great bloom",
            EventKind::FlashFlood => "flash flood",
            EventKind::Drought => "drought",
            EventKind::Earthquake => "earthquake",
            EventKind::Volcano => "volcano",
            EventKind::HeatWave => "heat wave",
            EventKind::Monsoon => "monsoon",
        }
    }

    /// What the survivors mutter after each event.
    const fn thought_lines(self) -> &'static [&'static str] {
        match self {
            EventKind::PopulationBoon => &["Where did all these people come from?", "A blessing!"],
            EventKind::PopulationPlague => &["The sickness takes everyone...", "Cover your mouth!"],
            EventKind::Meteorite => &["The sky is falling!", "What WAS that?!"],
            EventKind::ResourceBoom => &["The land provides!", "So much green..."],
            EventKind::ResourceBlight => &["The crops are dying", "Everything withers"],
            EventKind::TheGreatBloom => &["Berries as far as the eye can see!", "A feast!"],
            EventKind::FlashFlood => &["Head for high ground!", "My house! The water!"],
            EventKind::Drought => &["The lake is gone...", "So dry. So very dry."],
            EventKind::Earthquake => &["The ground moved!", "Where am I?!"],
            EventKind::Volcano => &["FIRE FROM THE SKY!", "Run from the lava!"],
            EventKind::HeatWave => &["Too... hot...", "I can't think in this heat"],
            EventKind::Monsoon => &["Rain for days", "I'm soaked through"],
        }
    }
}

/// Lingering visual marker attached to an affected entity.
#[derive(Debug, Clone, Copy)]
pub struct EffectTimer {
    pub life: u32,
    pub max_life: u32,
}

/// Serializable event configuration for settings files.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventSettings {
    pub chance: f64,
    pub enabled: Vec<EventKind>,
}

/// Triggers random events, enforces population caps, and keeps a short
/// rolling log per category.
pub struct EventSystem {
    chance: f64,
    enabled: HashSet<EventKind>,
    logs: HashMap<LogCategory, VecDeque<String>>,
    effects: HashMap<EntityId, EffectTimer>,
}

impl Default for EventSystem {
    fn default() -> Self {
        Self {
            chance: DEFAULT_EVENT_CHANCE,
            enabled: EventKind::ALL.into_iter().collect(),
            logs: HashMap::new(),
            effects: HashMap::new(),
        }
    }
}

impl EventSystem {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_chance(&mut self, chance: f64) {
        self.chance = chance.clamp(0.0, 1.0);
    }

    #[must_use]
    pub fn chance(&self) -> f64 {
        self.chance
    }

    pub fn toggle(&mut self, kind: EventKind, on: bool) {
        if on {
            self.enabled.insert(kind);
        } else {
            self.enabled.remove(&kind);
        }
    }

    #[must_use]
    pub fn is_enabled(&self, kind: EventKind) -> bool {
        self.enabled.contains(&kind)
    }

    /// Re-enable everything and restore the default chance.
    pub fn reset(&mut self) {
        self.chance = DEFAULT_EVENT_CHANCE;
        self.enabled = EventKind::ALL.into_iter().collect();
    }

    /// Most recent log lines for a category, newest first.
    #[must_use]
    pub fn recent(&self, category: LogCategory) -> Vec<&str> {
        self.logs
            .get(&category)
            .map(|buf| buf.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn effect(&self, id: EntityId) -> Option<EffectTimer> {
        self.effects.get(&id).copied()
    }

    pub fn export_settings(&self) -> EventSettings {
        let mut enabled: Vec<EventKind> = EventKind::ALL
            .into_iter()
            .filter(|k| self.enabled.contains(k))
            .collect();
        enabled.sort_by_key(|k| *k as u8);
        EventSettings {
            chance: self.chance,
            enabled,
        }
    }

    pub fn import_settings(&mut self, settings: &EventSettings) {
        self.set_chance(settings.chance);
        self.enabled = settings.enabled.iter().copied().collect();
    }

    /// Run the event system for one world tick. Call after `World::tick`.
    pub fn tick(&mut self, world: &mut World) {
        let roll = world.rng().random_bool(self.chance);
        if roll {
            let candidates: Vec<EventKind> = EventKind::ALL
                .into_iter()
                .filter(|k| self.enabled.contains(k))
                .collect();
            if !candidates.is_empty() {
                let kind = candidates[world.rng().random_range(0..candidates.len())];
                self.trigger(world, kind);
            }
        }
        if world.tick_count().is_multiple_of(100) {
            self.enforce_population_caps(world);
        }
        self.effects.retain(|_, timer| {
            timer.life = timer.life.saturating_sub(1);
            timer.life > 0
        });
    }

    /// Force a specific event, regardless of the random roll.
    pub fn trigger(&mut self, world: &mut World, kind: EventKind) {
        let outcome = match kind {
            EventKind::PopulationBoon => population_boon(world),
            EventKind::PopulationPlague => population_plague(world),
            EventKind::Meteorite => meteorite(world),
            EventKind::ResourceBoom => resource_boom(world),
            EventKind::ResourceBlight => resource_blight(world),
            EventKind::TheGreatBloom => great_bloom(world),
            EventKind::FlashFlood => flash_flood(world),
            EventKind::Drought => drought(world),
            EventKind::Earthquake => earthquake(world),
            EventKind::Volcano => volcano(world),
            EventKind::HeatWave => heat_wave(world),
            EventKind::Monsoon => monsoon(world),
        };
        info!(event = kind.label(), "world event: {}", outcome.message);
        self.log(kind.category(), outcome.message);
        for id in &outcome.affected {
            self.effects.insert(
                *id,
                EffectTimer {
                    life: EFFECT_LIFE,
                    max_life: EFFECT_LIFE,
                },
            );
        }
        spread_event_thoughts(world, kind, &outcome.affected);
    }

    fn log(&mut self, category: LogCategory, message: String) {
        let buf = self.logs.entry(category).or_default();
        buf.push_front(message);
        while buf.len() > LOG_DEPTH {
            buf.pop_back();
        }
    }

    /// Any species above the hard cap loses half its number, picked at
    /// random. The world has a sense of humor about it.
    fn enforce_population_caps(&mut self, world: &mut World) {
        for ty in EntityType::ALL {
            if world.count(ty) <= POPULATION_CAP {
                continue;
            }
            let mut ids = world.entities_of_type(ty);
            ids.shuffle(world.rng());
            let cull = ids.len() / 2;
            for id in ids.into_iter().take(cull) {
                world.kill(id);
            }
            let message = match ty {
                EntityType::Cow => format!("Burgers for everyone: {cull} cows vanished"),
                EntityType::Wolf => format!("The alpha huffed and {cull} wolves left the valley"),
                EntityType::Human => format!("Half of everything: {cull} humans blinked away"),
                EntityType::BerryBush => format!("Shady business: {cull} berry bushes disappeared"),
                EntityType::Tree => format!("Couldn't see the forest for the trees; {cull} fewer now"),
                EntityType::House => format!("The housing market crashed, literally: {cull} houses"),
                _ => format!("Thinned the {} population by {cull}", ty.label()),
            };
            info!(species = ty.label(), culled = cull, "population cap enforced");
            self.log(LogCategory::Population, message);
        }
    }
}

struct EventOutcome {
    message: String,
    affected: Vec<EntityId>,
}

fn random_cell(world: &mut World) -> (i32, i32) {
    let (w, h) = (world.width(), world.height());
    let x = world.rng().random_range(0..w);
    let y = world.rng().random_range(0..h);
    (x, y)
}

fn within(world: &World, cx: i32, cy: i32, radius: i32) -> Vec<(i32, i32)> {
    let mut cells = Vec::new();
    for dy in -radius..=radius {
        for dx in -radius..=radius {
            if dx * dx + dy * dy > radius * radius {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if world.in_bounds(x, y) {
                cells.push((x, y));
            }
        }
    }
    cells
}

fn random_animal_species(world: &mut World) -> EntityType {
    const SPECIES: [EntityType; 3] = [EntityType::Human, EntityType::Wolf, EntityType::Cow];
    SPECIES[world.rng().random_range(0..SPECIES.len())]
}

fn spawn_of(world: &mut World, ty: EntityType, x: i32, y: i32) -> Option<EntityId> {
    let cfg = world.config().clone();
    let entity = {
        let rng = world.rng();
        match ty {
            EntityType::Human => Entity::human(x, y, &cfg, rng),
            EntityType::Wolf => Entity::wolf(x, y, None, &cfg, rng),
            EntityType::Cow => Entity::cow(x, y, None, &cfg, rng),
            EntityType::Tree => Entity::tree(x, y, &cfg, rng),
            EntityType::BerryBush => Entity::berry_bush(x, y, &cfg, rng),
            EntityType::Lava => Entity::lava(x, y, rng),
            EntityType::Water => Entity::water(x, y),
            _ => return None,
        }
    };
    world.add_entity(entity)
}

fn population_boon(world: &mut World) -> EventOutcome {
    let species = random_animal_species(world);
    let n = world.rng().random_range(5..=10);
    let mut affected = Vec::new();
    for _ in 0..n {
        for _ in 0..20 {
            let (x, y) = random_cell(world);
            if world.get_at(x, y).is_some() {
                continue;
            }
            if let Some(id) = spawn_of(world, species, x, y) {
                affected.push(id);
            }
            break;
        }
    }
    EventOutcome {
        message: format!("A {} boon: {} newcomers appeared", species.label(), affected.len()),
        affected,
    }
}

fn population_plague(world: &mut World) -> EventOutcome {
    let species = random_animal_species(world);
    let ids = world.entities_of_type(species);
    let mut killed = 0;
    let mut affected = Vec::new();
    for id in ids {
        if world.rng().random::<f32>() < 0.3 {
            world.kill(id);
            killed += 1;
        } else {
            affected.push(id);
        }
    }
    EventOutcome {
        message: format!("A plague swept the {}s: {killed} dead", species.label()),
        affected,
    }
}

fn meteorite(world: &mut World) -> EventOutcome {
    let (cx, cy) = random_cell(world);
    let mut killed = 0;
    for (x, y) in within(world, cx, cy, 5) {
        if let Some(id) = world.get_at(x, y) {
            world.kill(id);
            killed += 1;
        }
    }
    // The crater fills with water.
    for (x, y) in within(world, cx, cy, 3) {
        if world.get_at(x, y).is_none() {
            world.add_entity(Entity::water(x, y));
        }
    }
    EventOutcome {
        message: format!("A meteorite struck at ({cx}, {cy}), destroying {killed} things"),
        affected: Vec::new(),
    }
}

fn resource_boom(world: &mut World) -> EventOutcome {
    let n = world.rng().random_range(10..=20);
    let mut planted = 0;
    for _ in 0..n {
        for _ in 0..20 {
            let (x, y) = random_cell(world);
            if world.get_at(x, y).is_some() {
                continue;
            }
            let ty = if world.rng().random_bool(0.5) {
                EntityType::Tree
            } else {
                EntityType::BerryBush
            };
            if spawn_of(world, ty, x, y).is_some() {
                planted += 1;
            }
            break;
        }
    }
    EventOutcome {
        message: format!("The land flourished: {planted} new plants"),
        affected: Vec::new(),
    }
}

fn resource_blight(world: &mut World) -> EventOutcome {
    let mut killed = 0;
    let mut affected = Vec::new();
    for ty in [EntityType::Tree, EntityType::BerryBush] {
        for id in world.entities_of_type(ty) {
            if world.rng().random::<f32>() < 0.4 {
                world.kill(id);
                killed += 1;
            } else {
                affected.push(id);
            }
        }
    }
    EventOutcome {
        message: format!("A blight withered {killed} plants"),
        affected,
    }
}

fn great_bloom(world: &mut World) -> EventOutcome {
    let (cx, cy) = random_cell(world);
    let mut planted = 0;
    for (x, y) in within(world, cx, cy, 6) {
        if world.get_at(x, y).is_some() {
            continue;
        }
        if spawn_of(world, EntityType::BerryBush, x, y).is_some() {
            planted += 1;
        }
    }
    EventOutcome {
        message: format!("The Great Bloom: {planted} berry bushes burst forth at ({cx}, {cy})"),
        affected: Vec::new(),
    }
}

fn flash_flood(world: &mut World) -> EventOutcome {
    let (cx, cy) = random_cell(world);
    let mut drowned = 0;
    for (x, y) in within(world, cx, cy, 8) {
        if let Some(id) = world.get_at(x, y) {
            let is_water = world
                .entity(id)
                .is_some_and(|e| e.entity_type() == EntityType::Water);
            if is_water {
                continue;
            }
            world.kill(id);
            drowned += 1;
        }
        world.add_entity(Entity::water(x, y));
    }
    EventOutcome {
        message: format!("A flash flood drowned the land around ({cx}, {cy}): {drowned} lost"),
        affected: Vec::new(),
    }
}

fn drought(world: &mut World) -> EventOutcome {
    let (cx, cy) = random_cell(world);
    let mut dried = 0;
    for (x, y) in within(world, cx, cy, 10) {
        if let Some(id) = world.get_at(x, y) {
            if world
                .entity(id)
                .is_some_and(|e| e.entity_type() == EntityType::Water)
            {
                world.kill(id);
                dried += 1;
            }
        }
    }
    EventOutcome {
        message: format!("A drought dried up {dried} water tiles near ({cx}, {cy})"),
        affected: Vec::new(),
    }
}

fn earthquake(world: &mut World) -> EventOutcome {
    match world.rng().random_range(0..3) {
        0 => earthquake_block_swap(world),
        1 => earthquake_fault_line(world),
        _ => earthquake_scramble(world),
    }
}

/// Two far-apart blocks of land trade places wholesale.
fn earthquake_block_swap(world: &mut World) -> EventOutcome {
    const BLOCK: i32 = 20;
    let (w, h) = (world.width(), world.height());
    if w <= BLOCK || h <= BLOCK {
        return earthquake_scramble(world);
    }
    let mut regions = None;
    for _ in 0..100 {
        let ax = world.rng().random_range(0..w - BLOCK);
        let ay = world.rng().random_range(0..h - BLOCK);
        let bx = world.rng().random_range(0..w - BLOCK);
        let by = world.rng().random_range(0..h - BLOCK);
        let overlap = (ax - bx).abs() < BLOCK && (ay - by).abs() < BLOCK;
        if !overlap {
            regions = Some(((ax, ay), (bx, by)));
            break;
        }
    }
    let Some(((ax, ay), (bx, by))) = regions else {
        return earthquake_scramble(world);
    };
    for dy in 0..BLOCK {
        for dx in 0..BLOCK {
            let a = world.clear_cell(ax + dx, ay + dy);
            let b = world.clear_cell(bx + dx, by + dy);
            if let Some(id) = a {
                world.occupy_cell(id, bx + dx, by + dy);
            }
            if let Some(id) = b {
                world.occupy_cell(id, ax + dx, ay + dy);
            }
        }
    }
    EventOutcome {
        message: "An earthquake swapped two whole regions of land".to_owned(),
        affected: Vec::new(),
    }
}

/// One row or column of the world shears sideways, wrapping around.
fn earthquake_fault_line(world: &mut World) -> EventOutcome {
    let (w, h) = (world.width(), world.height());
    let shift = world.rng().random_range(10..=25);
    let along_row = world.rng().random_bool(0.5);
    if along_row {
        let y = world.rng().random_range(0..h);
        let moved: Vec<(i32, EntityId)> = (0..w)
            .filter_map(|x| world.clear_cell(x, y).map(|id| (x, id)))
            .collect();
        for (x, id) in moved {
            world.occupy_cell(id, (x + shift).rem_euclid(w), y);
        }
    } else {
        let x = world.rng().random_range(0..w);
        let moved: Vec<(i32, EntityId)> = (0..h)
            .filter_map(|y| world.clear_cell(x, y).map(|id| (y, id)))
            .collect();
        for (y, id) in moved {
            world.occupy_cell(id, x, (y + shift).rem_euclid(h));
        }
    }
    EventOutcome {
        message: format!("A fault line shifted the ground by {shift} cells"),
        affected: Vec::new(),
    }
}

/// Everything near the epicenter lands somewhere else nearby.
fn earthquake_scramble(world: &mut World) -> EventOutcome {
    let (cx, cy) = random_cell(world);
    let affected = scramble_around(world, cx, cy);
    EventOutcome {
        message: format!("An earthquake scrambled the land around ({cx}, {cy})"),
        affected,
    }
}

fn scramble_around(world: &mut World, cx: i32, cy: i32) -> Vec<EntityId> {
    // Empty ground counts as a landing spot too.
    let mut ids = Vec::new();
    let mut spots = Vec::new();
    for (x, y) in within(world, cx, cy, 15) {
        spots.push((x, y));
        if let Some(id) = world.clear_cell(x, y) {
            ids.push(id);
        }
    }
    spots.shuffle(world.rng());
    for (id, (x, y)) in ids.iter().zip(spots.iter()) {
        world.occupy_cell(*id, *x, *y);
    }
    ids
}

fn volcano(world: &mut World) -> EventOutcome {
    if world.rng().random_bool(0.5) {
        volcano_lava_rain(world)
    } else {
        volcano_lava_flow(world)
    }
}

fn volcano_lava_rain(world: &mut World) -> EventOutcome {
    let drops = world.rng().random_range(20..=50);
    let mut landed = 0;
    for _ in 0..drops {
        let (x, y) = random_cell(world);
        if let Some(id) = world.get_at(x, y) {
            if world
                .entity(id)
                .is_some_and(|e| e.entity_type() == EntityType::Lava)
            {
                continue;
            }
            world.kill(id);
        }
        if spawn_of(world, EntityType::Lava, x, y).is_some() {
            landed += 1;
        }
    }
    EventOutcome {
        message: format!("Lava rained from the sky: {landed} cells burn"),
        affected: Vec::new(),
    }
}

/// A jittered river of lava crosses the whole map.
fn volcano_lava_flow(world: &mut World) -> EventOutcome {
    let (w, h) = (world.width(), world.height());
    let mut y = world.rng().random_range(0..h);
    let mut burned = 0;
    for x in 0..w {
        y = (y + world.rng().random_range(-1..=1)).clamp(0, h - 1);
        let mut cells = vec![(x, y)];
        if world.rng().random_bool(0.3) {
            cells.push((x, (y + 1).min(h - 1)));
        }
        for (lx, ly) in cells {
            if let Some(id) = world.get_at(lx, ly) {
                if world
                    .entity(id)
                    .is_some_and(|e| e.entity_type() == EntityType::Lava)
                {
                    continue;
                }
                world.kill(id);
            }
            if spawn_of(world, EntityType::Lava, lx, ly).is_some() {
                burned += 1;
            }
        }
    }
    EventOutcome {
        message: format!("A lava flow carved across the world, burning {burned} cells"),
        affected: Vec::new(),
    }
}

/// Heat tolerance decides who makes it through the wave.
fn heat_wave(world: &mut World) -> EventOutcome {
    let mut dead = 0;
    let mut affected = Vec::new();
    for ty in [EntityType::Human, EntityType::Wolf, EntityType::Cow] {
        for id in world.entities_of_type(ty) {
            let tolerance = creature_tolerance(world, id, true);
            let survival = 0.6 * tolerance;
            if world.rng().random::<f32>() > survival {
                world.kill(id);
                dead += 1;
            } else {
                affected.push(id);
            }
        }
    }
    EventOutcome {
        message: format!("A heat wave scorched the land: {dead} perished"),
        affected,
    }
}

fn monsoon(world: &mut World) -> EventOutcome {
    let (cx, cy) = random_cell(world);
    let mut flooded = 0;
    for (x, y) in within(world, cx, cy, 10) {
        if !world.rng().random_bool(0.3) {
            continue;
        }
        if let Some(id) = world.get_at(x, y) {
            if world
                .entity(id)
                .is_some_and(|e| e.entity_type() == EntityType::Water)
            {
                continue;
            }
            world.kill(id);
        }
        if world.add_entity(Entity::water(x, y)).is_some() {
            flooded += 1;
        }
    }
    // The cold snap that follows tests every creature, soaked or not.
    let mut dead = 0;
    for ty in [EntityType::Human, EntityType::Wolf, EntityType::Cow] {
        for id in world.entities_of_type(ty) {
            let tolerance = creature_tolerance(world, id, false);
            if world.rng().random::<f32>() > 0.6 * tolerance {
                world.kill(id);
                dead += 1;
            }
        }
    }
    EventOutcome {
        message: format!("A monsoon soaked ({cx}, {cy}): {flooded} new pools, {dead} lost to the cold"),
        affected: Vec::new(),
    }
}

/// Heat or cold tolerance for any creature; humans read theirs from the
/// faction registry.
fn creature_tolerance(world: &mut World, id: EntityId, heat: bool) -> f32 {
    let faction = world
        .entity(id)
        .and_then(Entity::faction_id)
        .map(str::to_owned);
    if let Some(name) = faction {
        let traits = world.faction_traits(&name);
        return if heat {
            traits.heat_tolerance
        } else {
            traits.cold_tolerance
        };
    }
    world
        .entity(id)
        .and_then(Entity::animal_traits)
        .map_or(1.0, |t| if heat { t.heat_tolerance } else { t.cold_tolerance })
}

/// Up to five bystanders get a matching thought bubble.
fn spread_event_thoughts(world: &mut World, kind: EventKind, affected: &[EntityId]) {
    let lines = kind.thought_lines();
    let humans: Vec<EntityId> = {
        let from_affected: Vec<EntityId> = affected
            .iter()
            .copied()
            .filter(|&id| {
                world
                    .entity(id)
                    .is_some_and(|e| matches!(e.kind, EntityKind::Human(_)))
            })
            .collect();
        if from_affected.is_empty() {
            world.entities_of_type(EntityType::Human)
        } else {
            from_affected
        }
    };
    for id in humans.into_iter().take(5) {
        let Some(e) = world.entity(id) else { continue };
        let (x, y) = (e.x, e.y);
        let Some(color) = e.color() else { continue };
        let line = lines[world.rng().random_range(0..lines.len())];
        world.add_thought(x, y, line, color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wildgrid_core::WorldConfig;

    fn test_world(seed: u64) -> World {
        let config = WorldConfig {
            world_width: 50,
            world_height: 50,
            max_entities: 10_000,
            rng_seed: Some(seed),
            ..WorldConfig::default()
        };
        World::new(config).expect("config is valid")
    }

    #[test]
    fn disabled_events_never_fire() {
        let mut events = EventSystem::new();
        for kind in EventKind::ALL {
            events.toggle(kind, false);
        }
        events.set_chance(1.0);
        let mut world = test_world(1);
        for _ in 0..50 {
            world.tick();
            events.tick(&mut world);
        }
        assert_eq!(world.total_entities(), 0);
    }

    #[test]
    fn fault_line_preserves_the_entity_set() {
        let mut world = test_world(2);
        let cfg = world.config().clone();
        let mut before = Vec::new();
        for i in 0..30 {
            let tree = Entity::tree(i, 10, &cfg, world.rng());
            let id = world.add_entity(tree).expect("cell free");
            before.push(id);
        }
        earthquake_fault_line(&mut world);
        assert_eq!(world.count(EntityType::Tree), 30);
        for id in before {
            let e = world.entity(id).expect("tree survived");
            assert_eq!(world.get_at(e.x, e.y), Some(id));
        }
    }

    #[test]
    fn scramble_keeps_every_entity_on_the_grid() {
        let mut world = test_world(3);
        let cfg = world.config().clone();
        for i in 0..20 {
            let tree = Entity::tree(20 + (i % 5), 20 + (i / 5), &cfg, world.rng());
            world.add_entity(tree).expect("cell free");
        }
        earthquake_scramble(&mut world);
        assert_eq!(world.count(EntityType::Tree), 20);
        for id in world.entities_of_type(EntityType::Tree) {
            let e = world.entity(id).expect("tree exists");
            assert_eq!(world.get_at(e.x, e.y), Some(id));
        }
    }

    #[test]
    fn scramble_can_drop_entities_on_open_ground() {
        let mut world = test_world(6);
        let cfg = world.config().clone();
        let origin = [(25, 25), (26, 25), (25, 26)];
        for &(x, y) in &origin {
            let tree = Entity::tree(x, y, &cfg, world.rng());
            world.add_entity(tree).expect("cell free");
        }
        scramble_around(&mut world, 25, 25);
        assert_eq!(world.count(EntityType::Tree), 3);
        let mut left_the_cluster = false;
        for id in world.entities_of_type(EntityType::Tree) {
            let e = world.entity(id).expect("tree exists");
            assert_eq!(world.get_at(e.x, e.y), Some(id));
            if !origin.contains(&(e.x, e.y)) {
                left_the_cluster = true;
            }
        }
        assert!(left_the_cluster);
    }

    #[test]
    fn monsoon_floods_occupied_ground_and_chills_the_far_corner() {
        let mut world = test_world(7);
        let cfg = world.config().clone();
        let wolf = {
            let w = Entity::wolf(0, 0, None, &cfg, world.rng());
            world.add_entity(w).expect("cell free")
        };
        if let Some(a) = world.entity_mut(wolf).and_then(Entity::as_animal_mut) {
            a.traits.cold_tolerance = 0.0;
        }
        // Pack the rest of the map so every flooded cell is occupied.
        for y in 0..50 {
            for x in 0..50 {
                if (x, y) == (0, 0) {
                    continue;
                }
                let tree = Entity::tree(x, y, &cfg, world.rng());
                world.add_entity(tree).expect("cell free");
            }
        }
        monsoon(&mut world);
        assert!(world.count(EntityType::Water) > 0);
        assert!(world.entity(wolf).is_some_and(|e| e.marked_for_deletion));
    }

    #[test]
    fn population_caps_cull_half() {
        let mut world = test_world(4);
        let cfg = world.config().clone();
        let mut placed = 0;
        'fill: for y in 0..50 {
            for x in 0..50 {
                if placed == 1_200 {
                    break 'fill;
                }
                let bush = Entity::berry_bush(x, y, &cfg, world.rng());
                world.add_entity(bush).expect("cell free");
                placed += 1;
            }
        }
        let mut events = EventSystem::new();
        events.enforce_population_caps(&mut world);
        world.recalculate_stats();
        assert_eq!(world.count(EntityType::BerryBush), 600);
        assert!(!events.recent(LogCategory::Population).is_empty());
    }

    #[test]
    fn settings_round_trip() {
        let mut events = EventSystem::new();
        events.set_chance(0.25);
        events.toggle(EventKind::Volcano, false);
        events.toggle(EventKind::Meteorite, false);
        let blob = serde_json::to_string(&events.export_settings()).expect("serialize");
        let parsed: EventSettings = serde_json::from_str(&blob).expect("parse");
        let mut restored = EventSystem::new();
        restored.import_settings(&parsed);
        assert_eq!(restored.chance(), 0.25);
        assert!(!restored.is_enabled(EventKind::Volcano));
        assert!(!restored.is_enabled(EventKind::Meteorite));
        assert!(restored.is_enabled(EventKind::Drought));
    }

    #[test]
    fn event_kind_names_serialize_snake_case() {
        let blob = serde_json::to_string(&EventKind::TheGreatBloom).expect("serialize");
        assert_eq!(blob, r#""the_great_bloom""#);
        let blob = serde_json::to_string(&EventKind::PopulationBoon).expect("serialize");
        assert_eq!(blob, r#""population_boon""#);
    }
}
