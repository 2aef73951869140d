//! World state: the entity arena, the occupancy grid, and the tick loop.

use std::collections::BTreeMap;

use rand::{rngs::SmallRng, Rng};
use serde::{Deserialize, Serialize};
use slotmap::SlotMap;
use thiserror::Error;
use tracing::info;

use crate::behavior;
use crate::config::{Settings, WorldConfig};
use crate::entity::{Entity, EntityId, EntityKind, EntityType, Occupant, ReserveSpecies};
use crate::faction;
use crate::genetics::{self, Traits};
use crate::thought::{ThoughtSystem, EASTER_EGG_THOUGHTS, THOUGHT_RULES};

/// How much a cell is worn down by a human stepping off it.
const TERRAIN_WEAR: f32 = 0.02;
/// Terrain decay applied on decay ticks.
const TERRAIN_DECAY: f32 = 0.02;
/// Ticks between terrain decay passes.
const TERRAIN_DECAY_INTERVAL: u64 = 10;

#[derive(Debug, Error)]
pub enum WorldError {
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
}

/// Coarse bucket for log messages surfaced through hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogCategory {
    Population,
    Resource,
    Disaster,
    System,
}

/// Observer callbacks invoked from inside the tick loop. Implementations
/// must be cheap; the world does not buffer around them.
pub trait WorldHooks: Send {
    fn on_extinction(&mut self, _species: EntityType) {}
    fn on_log_event(&mut self, _message: &str, _category: LogCategory) {}
}

/// Default no-op hooks.
pub struct NullHooks;

impl WorldHooks for NullHooks {}

/// The simulation world. One entity per cell; all randomness flows
/// through the world-owned RNG so a seeded run replays exactly.
pub struct World {
    config: WorldConfig,
    settings: Settings,
    width: i32,
    height: i32,
    grid: Vec<Option<EntityId>>,
    /// Path wear per cell in [0, 1]; worn ground speeds humans up.
    terrain: Vec<f32>,
    arena: SlotMap<EntityId, Entity>,
    /// Tick iteration order; rebuilt during the sweep stage.
    order: Vec<EntityId>,
    by_type: [Vec<EntityId>; EntityType::COUNT],
    counts: [usize; EntityType::COUNT],
    /// Faction name to inherited trait vector. Ordered so that
    /// multi-faction passes iterate deterministically.
    faction_registry: BTreeMap<String, Traits>,
    thoughts: ThoughtSystem,
    tick_count: u64,
    rng: SmallRng,
    pending_spawns: Vec<Entity>,
    hooks: Box<dyn WorldHooks>,
}

impl World {
    pub fn new(config: WorldConfig) -> Result<Self, WorldError> {
        Self::with_hooks(config, Box::new(NullHooks))
    }

    pub fn with_hooks(config: WorldConfig, hooks: Box<dyn WorldHooks>) -> Result<Self, WorldError> {
        config.validate()?;
        let width = config.world_width;
        let height = config.world_height;
        let cells = (width as usize) * (height as usize);
        let rng = config.seeded_rng();
        Ok(Self {
            config,
            settings: Settings::default(),
            width,
            height,
            grid: vec![None; cells],
            terrain: vec![0.0; cells],
            arena: SlotMap::with_key(),
            order: Vec::new(),
            by_type: std::array::from_fn(|_| Vec::new()),
            counts: [0; EntityType::COUNT],
            faction_registry: BTreeMap::new(),
            thoughts: ThoughtSystem::default(),
            tick_count: 0,
            rng,
            pending_spawns: Vec::new(),
            hooks,
        })
    }

    fn idx(&self, x: i32, y: i32) -> usize {
        (y as usize) * (self.width as usize) + (x as usize)
    }

    #[must_use]
    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && x < self.width && y >= 0 && y < self.height
    }

    #[must_use]
    pub fn width(&self) -> i32 {
        self.width
    }

    #[must_use]
    pub fn height(&self) -> i32 {
        self.height
    }

    #[must_use]
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    #[must_use]
    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    #[must_use]
    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn settings_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    #[must_use]
    pub fn count(&self, ty: EntityType) -> usize {
        self.counts[ty.index()]
    }

    #[must_use]
    pub fn total_entities(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&Entity> {
        self.arena.get(id)
    }

    pub fn entity_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.arena.get_mut(id)
    }

    /// Live, unmarked entities of one type. Snapshot, safe to iterate
    /// while mutating the world.
    #[must_use]
    pub fn entities_of_type(&self, ty: EntityType) -> Vec<EntityId> {
        self.by_type[ty.index()]
            .iter()
            .copied()
            .filter(|&id| self.arena.get(id).is_some_and(|e| !e.marked_for_deletion))
            .collect()
    }

    /// Occupant of a cell, if any.
    #[must_use]
    pub fn get_at(&self, x: i32, y: i32) -> Option<EntityId> {
        if !self.in_bounds(x, y) {
            return None;
        }
        self.grid[self.idx(x, y)]
    }

    pub fn rng(&mut self) -> &mut SmallRng {
        &mut self.rng
    }

    /// Split borrow for constructors that need the config and the RNG
    /// at the same time.
    pub(crate) fn cfg_and_rng(&mut self) -> (&WorldConfig, &mut SmallRng) {
        (&self.config, &mut self.rng)
    }

    #[must_use]
    pub fn thoughts(&self) -> &ThoughtSystem {
        &self.thoughts
    }

    pub fn add_thought(&mut self, x: i32, y: i32, text: &'static str, color: &'static str) {
        self.thoughts.add(x, y, text, color);
    }

    pub fn log_event(&mut self, message: &str, category: LogCategory) {
        self.hooks.on_log_event(message, category);
    }

    #[must_use]
    pub fn terrain_at(&self, x: i32, y: i32) -> f32 {
        if !self.in_bounds(x, y) {
            return 0.0;
        }
        self.terrain[self.idx(x, y)]
    }

    fn wear_terrain(&mut self, x: i32, y: i32) {
        let idx = self.idx(x, y);
        self.terrain[idx] = (self.terrain[idx] + TERRAIN_WEAR).min(1.0);
    }

    /// Place an entity on the grid. Fails (returning `None`) when the
    /// world is at capacity, the cell is out of bounds, or occupied.
    pub fn add_entity(&mut self, entity: Entity) -> Option<EntityId> {
        if self.arena.len() >= self.config.max_entities {
            return None;
        }
        if !self.in_bounds(entity.x, entity.y) {
            debug_assert!(false, "spawn position out of bounds");
            return None;
        }
        let cell = self.idx(entity.x, entity.y);
        if self.grid[cell].is_some() {
            return None;
        }
        let ty = entity.entity_type();
        let id = self.arena.insert(entity);
        self.grid[cell] = Some(id);
        self.order.push(id);
        self.by_type[ty.index()].push(id);
        self.counts[ty.index()] += 1;
        Some(id)
    }

    /// Queue a spawn for the end of the current tick. Vacancy is
    /// re-checked at flush time; spawns onto cells taken in the
    /// meantime are dropped.
    pub fn queue_spawn(&mut self, entity: Entity) {
        self.pending_spawns.push(entity);
    }

    fn remove_from_grid(&mut self, id: EntityId) {
        let Some(e) = self.arena.get(id) else { return };
        let ty = e.entity_type();
        let cell = self.idx(e.x, e.y);
        if self.grid[cell] == Some(id) {
            self.grid[cell] = None;
        }
        let lane = &mut self.by_type[ty.index()];
        if let Some(pos) = lane.iter().position(|&other| other == id) {
            lane.swap_remove(pos);
        }
    }

    /// Mark an entity dead and free its cell. The slot itself is
    /// reclaimed by the sweep stage at the end of the tick.
    pub fn kill(&mut self, id: EntityId) {
        let Some(e) = self.arena.get_mut(id) else { return };
        if e.marked_for_deletion {
            return;
        }
        e.marked_for_deletion = true;
        self.remove_from_grid(id);
    }

    /// Take an entity off the grid without killing it (entering a house).
    pub fn store_entity(&mut self, id: EntityId) {
        self.remove_from_grid(id);
        if let Some(e) = self.arena.get_mut(id) {
            e.stored = true;
        }
    }

    /// Put a stored entity back on the grid at the given cell.
    pub fn restore_entity(&mut self, id: EntityId, x: i32, y: i32) -> bool {
        if !self.in_bounds(x, y) || self.get_at(x, y).is_some() {
            return false;
        }
        let Some(e) = self.arena.get_mut(id) else {
            return false;
        };
        let ty = e.entity_type();
        e.x = x;
        e.y = y;
        e.stored = false;
        let cell = self.idx(x, y);
        self.grid[cell] = Some(id);
        self.by_type[ty.index()].push(id);
        true
    }

    /// Remove a stored entity outright (death while inside a house).
    pub fn despawn_stored(&mut self, id: EntityId) {
        if let Some(e) = self.arena.remove(id) {
            let lane = e.entity_type().index();
            self.counts[lane] = self.counts[lane].saturating_sub(1);
        }
    }

    /// Detach a cell's occupant from the grid, leaving the entity alive
    /// with stale coordinates. Terrain-rewrite event primitive; pair
    /// with [`World::occupy_cell`].
    pub fn clear_cell(&mut self, x: i32, y: i32) -> Option<EntityId> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let cell = self.idx(x, y);
        self.grid[cell].take()
    }

    /// Re-attach an entity at a cell previously emptied by
    /// [`World::clear_cell`].
    pub fn occupy_cell(&mut self, id: EntityId, x: i32, y: i32) {
        if !self.in_bounds(x, y) {
            return;
        }
        let cell = self.idx(x, y);
        debug_assert!(self.grid[cell].is_none(), "occupy_cell over a full cell");
        if let Some(e) = self.arena.get_mut(id) {
            e.x = x;
            e.y = y;
        }
        self.grid[cell] = Some(id);
    }

    /// Step one cell (or hop over a single blocker) toward `(dx, dy)`.
    /// Humans wear a path into the terrain as they go.
    pub fn move_entity(&mut self, id: EntityId, dx: i32, dy: i32) -> bool {
        let Some(e) = self.arena.get(id) else {
            return false;
        };
        let (ox, oy) = (e.x, e.y);
        let is_human = matches!(e.kind, EntityKind::Human(_));
        let (nx, ny) = (ox + dx, oy + dy);
        if !self.in_bounds(nx, ny) {
            return false;
        }
        if self.get_at(nx, ny).is_none() {
            if is_human {
                self.wear_terrain(ox, oy);
            }
            self.relocate(id, ox, oy, nx, ny);
            return true;
        }
        let (jx, jy) = (ox + dx * 2, oy + dy * 2);
        if self.in_bounds(jx, jy) && self.get_at(jx, jy).is_none() {
            if is_human {
                self.wear_terrain(ox, oy);
            }
            self.relocate(id, ox, oy, jx, jy);
            return true;
        }
        false
    }

    fn relocate(&mut self, id: EntityId, ox: i32, oy: i32, nx: i32, ny: i32) {
        let old = self.idx(ox, oy);
        if self.grid[old] == Some(id) {
            self.grid[old] = None;
        }
        let new = self.idx(nx, ny);
        self.grid[new] = Some(id);
        if let Some(e) = self.arena.get_mut(id) {
            e.x = nx;
            e.y = ny;
        }
    }

    /// Nearest live entity of a type within `max_dist` cells.
    #[must_use]
    pub fn find_nearest(&self, x: i32, y: i32, ty: EntityType, max_dist: f32) -> Option<EntityId> {
        self.find_nearest_where(x, y, ty, max_dist, |_| true)
    }

    /// [`World::find_nearest`] skipping the cell `exclude` stands on,
    /// for same-type searches from an entity's own position.
    #[must_use]
    pub fn find_nearest_excluding(
        &self,
        x: i32,
        y: i32,
        ty: EntityType,
        max_dist: f32,
        exclude: &Entity,
    ) -> Option<EntityId> {
        let (ex, ey) = (exclude.x, exclude.y);
        self.find_nearest_where(x, y, ty, max_dist, move |e| e.x != ex || e.y != ey)
    }

    /// Nearest live entity of a type satisfying `pred`. Sparse types and
    /// wide radii scan the type lane; everything else spirals outward
    /// over the grid. Ties break toward the first candidate found, which
    /// is stable for a fixed world state.
    pub fn find_nearest_where<F>(
        &self,
        x: i32,
        y: i32,
        ty: EntityType,
        max_dist: f32,
        pred: F,
    ) -> Option<EntityId>
    where
        F: Fn(&Entity) -> bool,
    {
        let sparse = matches!(
            ty,
            EntityType::Water | EntityType::House | EntityType::Farm | EntityType::NatureReserve
        );
        if max_dist > 15.0 || sparse {
            return self.find_nearest_by_lane(x, y, ty, max_dist, pred);
        }
        self.find_nearest_by_ring(x, y, ty, max_dist, pred)
    }

    fn find_nearest_by_lane<F>(
        &self,
        x: i32,
        y: i32,
        ty: EntityType,
        max_dist: f32,
        pred: F,
    ) -> Option<EntityId>
    where
        F: Fn(&Entity) -> bool,
    {
        let max_sq = max_dist * max_dist;
        let mut best: Option<(EntityId, f32)> = None;
        for &id in &self.by_type[ty.index()] {
            let Some(e) = self.arena.get(id) else { continue };
            if e.marked_for_deletion {
                continue;
            }
            let dx = e.x - x;
            let dy = e.y - y;
            if dx.abs() as f32 > max_dist || dy.abs() as f32 > max_dist {
                continue;
            }
            let sq = (dx * dx + dy * dy) as f32;
            if sq > max_sq || !pred(e) {
                continue;
            }
            if best.map_or(true, |(_, b)| sq < b) {
                best = Some((id, sq));
            }
        }
        best.map(|(id, _)| id)
    }

    fn find_nearest_by_ring<F>(
        &self,
        x: i32,
        y: i32,
        ty: EntityType,
        max_dist: f32,
        pred: F,
    ) -> Option<EntityId>
    where
        F: Fn(&Entity) -> bool,
    {
        let radius = max_dist.min(50.0).floor() as i32;
        let max_sq = max_dist * max_dist;
        let mut best: Option<(EntityId, f32)> = None;
        let consider = |world: &Self, cx: i32, cy: i32, best: &mut Option<(EntityId, f32)>| {
            let Some(id) = world.get_at(cx, cy) else { return };
            let Some(e) = world.arena.get(id) else { return };
            if e.entity_type() != ty || e.marked_for_deletion || !pred(e) {
                return;
            }
            let dx = cx - x;
            let dy = cy - y;
            let sq = (dx * dx + dy * dy) as f32;
            if sq <= max_sq && best.map_or(true, |(_, b)| sq < b) {
                *best = Some((id, sq));
            }
        };
        consider(self, x, y, &mut best);
        for r in 1..=radius {
            if let Some((_, best_sq)) = best {
                if ((r * r) as f32) > best_sq {
                    break;
                }
            }
            for cx in (x - r)..=(x + r) {
                consider(self, cx, y - r, &mut best);
                consider(self, cx, y + r, &mut best);
            }
            for cy in (y - r + 1)..=(y + r - 1) {
                consider(self, x - r, cy, &mut best);
                consider(self, x + r, cy, &mut best);
            }
        }
        best.map(|(id, _)| id)
    }

    /// Trait vector for a faction, seeding unregistered factions with the
    /// base vector.
    pub fn faction_traits(&mut self, name: &str) -> Traits {
        if let Some(t) = self.faction_registry.get(name) {
            return *t;
        }
        let base = Traits::default();
        self.faction_registry.insert(name.to_owned(), base);
        base
    }

    /// Register a splinter faction whose traits mutate off its parent's.
    pub fn register_faction(&mut self, name: &str, parent: &str) {
        let parent_traits = self.faction_traits(parent);
        let rate = self.config.mutation_rate;
        let limits = self.config.trait_limits;
        let mutated = genetics::mutate(Some(&parent_traits), rate, &limits, &mut self.rng);
        self.faction_registry.insert(name.to_owned(), mutated);
    }

    /// Advance the simulation one tick.
    pub fn tick(&mut self) {
        self.tick_count += 1;
        let snapshot = self.order.clone();
        for id in snapshot {
            let skip = match self.arena.get(id) {
                Some(e) => e.marked_for_deletion || e.stored,
                None => true,
            };
            if skip {
                continue;
            }
            behavior::dispatch(self, id);
        }
        self.stage_sweep();
        self.stage_flush_spawns();
        if self.tick_count % self.config.reseed_interval == 0 {
            self.stage_reseed();
        }
        if self.tick_count % 100 == 0 {
            self.recalculate_stats();
            self.check_faction_overpopulation();
        }
        self.update_thoughts();
        if self.tick_count % TERRAIN_DECAY_INTERVAL == 0 {
            for cell in &mut self.terrain {
                *cell = (*cell - TERRAIN_DECAY).max(0.0);
            }
        }
    }

    fn stage_sweep(&mut self) {
        let doomed_houses: Vec<EntityId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| {
                self.arena.get(id).is_some_and(|e| {
                    e.marked_for_deletion && matches!(e.kind, EntityKind::House(_))
                })
            })
            .collect();
        for id in doomed_houses {
            self.evict_house(id);
        }
        let marked: Vec<EntityId> = self
            .order
            .iter()
            .copied()
            .filter(|&id| self.arena.get(id).is_some_and(|e| e.marked_for_deletion))
            .collect();
        for id in marked {
            if let Some(e) = self.arena.remove(id) {
                let lane = e.entity_type().index();
                self.counts[lane] = self.counts[lane].saturating_sub(1);
            }
        }
        self.order.retain(|id| self.arena.contains_key(*id));
    }

    /// Push a collapsing house's occupants out onto nearby empty cells.
    /// Anyone with nowhere to go dies in the rubble.
    fn evict_house(&mut self, house_id: EntityId) {
        let Some(house) = self.arena.get_mut(house_id) else {
            return;
        };
        let (hx, hy) = (house.x, house.y);
        let occupants: Vec<Occupant> = match &mut house.kind {
            EntityKind::House(state) => std::mem::take(&mut state.occupants),
            _ => return,
        };
        for occ in occupants {
            let mut placed = self.restore_entity(occ.id, hx, hy);
            if !placed {
                'search: for dy in -1..=1 {
                    for dx in -1..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        if self.restore_entity(occ.id, hx + dx, hy + dy) {
                            placed = true;
                            break 'search;
                        }
                    }
                }
            }
            if !placed {
                self.despawn_stored(occ.id);
            }
        }
    }

    fn stage_flush_spawns(&mut self) {
        let pending = std::mem::take(&mut self.pending_spawns);
        for entity in pending {
            let _ = self.add_entity(entity);
        }
    }

    /// Divine intervention: restock collapsed animal populations through
    /// nature reserves and flag human extinction to the host.
    fn stage_reseed(&mut self) {
        if self.count(EntityType::Wolf) < 2 && self.reserve_count(ReserveSpecies::Wolf) < 3 {
            self.spawn_random_reserve(ReserveSpecies::Wolf);
        }
        if self.count(EntityType::Cow) < 2 && self.reserve_count(ReserveSpecies::Cow) < 3 {
            self.spawn_random_reserve(ReserveSpecies::Cow);
        }
        if self.count(EntityType::Human) < self.config.human_spawn_threshold {
            self.hooks.on_extinction(EntityType::Human);
        }
    }

    fn reserve_count(&self, species: ReserveSpecies) -> usize {
        self.by_type[EntityType::NatureReserve.index()]
            .iter()
            .filter(|&&id| {
                self.arena.get(id).is_some_and(|e| {
                    matches!(&e.kind, EntityKind::NatureReserve(r) if r.species == species)
                })
            })
            .count()
    }

    fn spawn_random_reserve(&mut self, species: ReserveSpecies) {
        for _ in 0..50 {
            let x = self.rng.random_range(0..self.width);
            let y = self.rng.random_range(0..self.height);
            if self.get_at(x, y).is_some() {
                continue;
            }
            let reserve = Entity::nature_reserve(x, y, species, &self.config);
            if self.add_entity(reserve).is_some() {
                let label = species.entity_type().label();
                info!(species = label, x, y, "population collapsed, seeding a recovery reserve");
                let msg = format!("A {label} reserve appeared out of nowhere");
                self.hooks.on_log_event(&msg, LogCategory::Population);
            }
            return;
        }
    }

    /// Recount live entities straight from the arena. Stored entities
    /// count; marked ones do not.
    pub fn recalculate_stats(&mut self) {
        self.counts = [0; EntityType::COUNT];
        for e in self.arena.values() {
            if !e.marked_for_deletion {
                self.counts[e.entity_type().index()] += 1;
            }
        }
    }

    fn check_faction_overpopulation(&mut self) {
        let mut per_faction: BTreeMap<String, usize> = BTreeMap::new();
        for &id in &self.by_type[EntityType::Human.index()] {
            if let Some(name) = self.arena.get(id).and_then(Entity::faction_id) {
                *per_faction.entry(name.to_owned()).or_insert(0) += 1;
            }
        }
        let cap = self.config.faction_overpopulation_cap;
        let oversized: Vec<String> = per_faction
            .into_iter()
            .filter(|(_, n)| *n > cap)
            .map(|(name, _)| name)
            .collect();
        for name in oversized {
            self.societal_split(&name);
        }
    }

    /// An oversized faction shatters into two fresh ones.
    fn societal_split(&mut self, parent: &str) {
        let mut members: Vec<EntityId> = self.by_type[EntityType::Human.index()]
            .iter()
            .copied()
            .filter(|&id| self.arena.get(id).and_then(Entity::faction_id) == Some(parent))
            .collect();
        if members.len() < 2 {
            return;
        }
        let first = faction::random_faction(&mut self.rng);
        let second = loop {
            let candidate = faction::random_faction(&mut self.rng);
            if candidate.name != first.name {
                break candidate;
            }
        };
        self.register_faction(&first.name, parent);
        self.register_faction(&second.name, parent);
        for i in (1..members.len()).rev() {
            let j = self.rng.random_range(0..=i);
            members.swap(i, j);
        }
        let mid = members.len() / 2;
        for (slot, &id) in members.iter().enumerate() {
            let target = if slot < mid { &first } else { &second };
            if let Some(h) = self.arena.get_mut(id).and_then(Entity::as_human_mut) {
                h.faction = target.name.clone();
                h.color = target.color;
            }
        }
        info!(
            parent,
            first = %first.name,
            second = %second.name,
            members = members.len(),
            "faction shattered under its own weight"
        );
        let msg = format!(
            "The Great Schism: {parent} split into {} and {}",
            first.name, second.name
        );
        self.hooks.on_log_event(&msg, LogCategory::Population);
        if let Some(&leader) = members.first() {
            if let Some(e) = self.arena.get(leader) {
                self.thoughts
                    .add(e.x, e.y, "We are the true path!", first.color);
            }
        }
        if let Some(&leader) = members.get(mid) {
            if let Some(e) = self.arena.get(leader) {
                self.thoughts.add(e.x, e.y, "A new beginning!", second.color);
            }
        }
    }

    fn update_thoughts(&mut self) {
        self.thoughts.tick();
        if self.thoughts.cooldown() > 0 {
            return;
        }
        let humans = self.by_type[EntityType::Human.index()].clone();
        if humans.is_empty() {
            return;
        }
        for _ in 0..3 {
            let id = humans[self.rng.random_range(0..humans.len())];
            self.try_generate_thought(id);
            if self.thoughts.cooldown() > 0 {
                break;
            }
        }
    }

    fn try_generate_thought(&mut self, id: EntityId) {
        if self.rng.random::<f32>() > 0.05 {
            return;
        }
        let Some(entity) = self.arena.get(id).cloned() else {
            return;
        };
        let Some(color) = entity.color() else { return };
        let (x, y) = (entity.x, entity.y);
        if self.rng.random::<f32>() < 0.05 {
            let text = EASTER_EGG_THOUGHTS[self.rng.random_range(0..EASTER_EGG_THOUGHTS.len())];
            self.thoughts.add(x, y, text, color);
            return;
        }
        let eligible: Vec<_> = THOUGHT_RULES
            .iter()
            .filter(|rule| (rule.condition)(self, &entity))
            .collect();
        let total: u32 = eligible.iter().map(|rule| rule.weight).sum();
        if total == 0 {
            return;
        }
        let mut pick = self.rng.random_range(0..total);
        for rule in eligible {
            if pick < rule.weight {
                let text = rule.templates[self.rng.random_range(0..rule.templates.len())];
                self.thoughts.add(x, y, text, color);
                return;
            }
            pick -= rule.weight;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::Entity;

    fn test_world() -> World {
        let config = WorldConfig {
            world_width: 40,
            world_height: 40,
            rng_seed: Some(7),
            ..WorldConfig::default()
        };
        World::new(config).expect("config is valid")
    }

    #[test]
    fn add_entity_rejects_occupied_cells() {
        let mut world = test_world();
        let tree = Entity::tree(5, 5, world.config(), &mut rand::rng());
        let other = Entity::water(5, 5);
        assert!(world.add_entity(tree).is_some());
        assert!(world.add_entity(other).is_none());
        assert_eq!(world.count(EntityType::Tree), 1);
    }

    #[test]
    fn kill_frees_the_cell_and_sweep_reclaims_the_slot() {
        let mut world = test_world();
        let tree = Entity::tree(3, 3, world.config(), &mut rand::rng());
        let id = world.add_entity(tree).expect("cell free");
        world.kill(id);
        assert!(world.get_at(3, 3).is_none());
        world.stage_sweep();
        assert!(world.entity(id).is_none());
        assert_eq!(world.count(EntityType::Tree), 0);
    }

    #[test]
    fn store_and_restore_round_trip() {
        let mut world = test_world();
        let mut rng = rand::rng();
        let cfg = world.config().clone();
        let human = Entity::human(10, 10, &cfg, &mut rng);
        let id = world.add_entity(human).expect("cell free");
        world.store_entity(id);
        assert!(world.get_at(10, 10).is_none());
        assert!(world.entity(id).is_some_and(|e| e.stored));
        assert_eq!(world.count(EntityType::Human), 1);
        assert!(world.restore_entity(id, 11, 10));
        assert_eq!(world.get_at(11, 10), Some(id));
        assert!(world.entity(id).is_some_and(|e| !e.stored));
    }

    #[test]
    fn move_entity_hops_over_a_single_blocker() {
        let mut world = test_world();
        let mut rng = rand::rng();
        let cfg = world.config().clone();
        let mover = world
            .add_entity(Entity::human(10, 10, &cfg, &mut rng))
            .expect("cell free");
        world
            .add_entity(Entity::tree(11, 10, &cfg, &mut rng))
            .expect("cell free");
        assert!(world.move_entity(mover, 1, 0));
        assert_eq!(world.get_at(12, 10), Some(mover));
        assert!(world.get_at(10, 10).is_none());
    }

    #[test]
    fn find_nearest_prefers_the_closer_candidate() {
        let mut world = test_world();
        let mut rng = rand::rng();
        let cfg = world.config().clone();
        world
            .add_entity(Entity::tree(12, 10, &cfg, &mut rng))
            .expect("cell free");
        let near = world
            .add_entity(Entity::tree(11, 10, &cfg, &mut rng))
            .expect("cell free");
        assert_eq!(world.find_nearest(10, 10, EntityType::Tree, 10.0), Some(near));
        assert_eq!(world.find_nearest(10, 10, EntityType::Wolf, 10.0), None);
    }

    #[test]
    fn queued_spawns_drop_when_the_cell_fills_first() {
        let mut world = test_world();
        let mut rng = rand::rng();
        let cfg = world.config().clone();
        world.queue_spawn(Entity::tree(6, 6, &cfg, &mut rng));
        world
            .add_entity(Entity::water(6, 6))
            .expect("cell free");
        world.stage_flush_spawns();
        assert_eq!(world.count(EntityType::Tree), 0);
        assert_eq!(world.count(EntityType::Water), 1);
    }

    #[test]
    fn oversized_faction_splits_into_two() {
        let config = WorldConfig {
            world_width: 40,
            world_height: 40,
            max_entities: 10_000,
            faction_overpopulation_cap: 300,
            rng_seed: Some(13),
            ..WorldConfig::default()
        };
        let mut world = World::new(config).expect("config is valid");
        let cfg = world.config().clone();
        let mut rng = rand::rng();
        let mut placed = 0;
        'fill: for y in 0..40 {
            for x in 0..40 {
                if placed == 301 {
                    break 'fill;
                }
                let human =
                    Entity::human_in_faction(x, y, faction::founder_red(), &cfg, &mut rng);
                world.add_entity(human).expect("cell free");
                placed += 1;
            }
        }
        world.check_faction_overpopulation();
        let mut factions = std::collections::BTreeSet::new();
        for id in world.entities_of_type(EntityType::Human) {
            if let Some(name) = world.entity(id).and_then(Entity::faction_id) {
                factions.insert(name.to_owned());
            }
        }
        assert_eq!(factions.len(), 2);
        assert!(!factions.contains("RED"));
    }
}
