//! Entity records stored in the world arena.

use rand::Rng;
use serde::{Deserialize, Serialize};
use slotmap::new_key_type;

use crate::config::WorldConfig;
use crate::faction::{self, Faction};
use crate::genetics::{self, Traits};

new_key_type! {
    /// Stable handle for entities backed by a generational slot map.
    pub struct EntityId;
}

/// Fieldless species tag used for counts and type indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    Human,
    Wolf,
    Cow,
    Tree,
    BerryBush,
    Farm,
    Water,
    House,
    Totem,
    NatureReserve,
    Lava,
}

impl EntityType {
    /// Number of distinct entity types.
    pub const COUNT: usize = 11;

    /// Every type, in count-table order.
    pub const ALL: [EntityType; Self::COUNT] = [
        EntityType::Human,
        EntityType::Wolf,
        EntityType::Cow,
        EntityType::Tree,
        EntityType::BerryBush,
        EntityType::Farm,
        EntityType::Water,
        EntityType::House,
        EntityType::Totem,
        EntityType::NatureReserve,
        EntityType::Lava,
    ];

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Human-readable label used in log messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            EntityType::Human => "human",
            EntityType::Wolf => "wolf",
            EntityType::Cow => "cow",
            EntityType::Tree => "tree",
            EntityType::BerryBush => "berry bush",
            EntityType::Farm => "farm",
            EntityType::Water => "water",
            EntityType::House => "house",
            EntityType::Totem => "totem",
            EntityType::NatureReserve => "nature reserve",
            EntityType::Lava => "lava",
        }
    }
}

/// What a human is currently doing; feeds the thought system and the
/// idle check around enemy totems.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Action {
    #[default]
    Idle,
    Fleeing,
    Defending,
    Drinking,
    Hunting,
    Harvesting,
    Culling,
    Planting,
    Conserving,
    Fighting,
    AttackingTotem,
    Building,
    BuildingTotem,
    Gathering,
}

/// Cooldowns for expensive spatial searches that recently came up empty.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct SearchCooldowns {
    pub water: u32,
    pub food: u32,
    pub house_location: u32,
}

/// Mutable per-human state. Trait vectors are faction-level and live in
/// the world registry, never on the human itself.
#[derive(Debug, Clone, Serialize)]
pub struct HumanState {
    pub hunger: f32,
    pub thirst: f32,
    pub wood: u32,
    pub reproduction_cooldown: u32,
    pub action: Action,
    pub faction: String,
    pub color: &'static str,
    pub name: &'static str,
    pub house_target: Option<(i32, i32)>,
    pub conservation_target: Option<(i32, i32)>,
    pub search_cooldowns: SearchCooldowns,
}

/// Mutable per-animal state shared by wolves and cows.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimalState {
    pub hunger: f32,
    pub thirst: f32,
    pub reproduction_cooldown: u32,
    pub traits: Traits,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BushState {
    /// Ticks until the bush can be harvested again; 0 means ripe.
    pub regrow: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FarmState {
    /// Growth counter in 0..=100; harvestable at 100.
    pub growth: u32,
}

/// A stored occupant and how long it has been resting.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Occupant {
    pub id: EntityId,
    pub rest: u32,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct HouseState {
    pub occupants: Vec<Occupant>,
}

#[derive(Debug, Clone, Serialize)]
pub struct TotemState {
    pub faction: String,
    pub color: &'static str,
}

/// Which species a nature reserve restocks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReserveSpecies {
    Wolf,
    Cow,
}

impl ReserveSpecies {
    #[must_use]
    pub const fn entity_type(self) -> EntityType {
        match self {
            ReserveSpecies::Wolf => EntityType::Wolf,
            ReserveSpecies::Cow => EntityType::Cow,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReserveState {
    pub species: ReserveSpecies,
    pub spawned: u32,
}

/// Closed set of species and structures; dispatch is an exhaustive match.
#[derive(Debug, Clone, Serialize)]
pub enum EntityKind {
    Human(HumanState),
    Wolf(AnimalState),
    Cow(AnimalState),
    Tree,
    BerryBush(BushState),
    Farm(FarmState),
    Water,
    House(HouseState),
    Totem(TotemState),
    NatureReserve(ReserveState),
    Lava,
}

impl EntityKind {
    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        match self {
            EntityKind::Human(_) => EntityType::Human,
            EntityKind::Wolf(_) => EntityType::Wolf,
            EntityKind::Cow(_) => EntityType::Cow,
            EntityKind::Tree => EntityType::Tree,
            EntityKind::BerryBush(_) => EntityType::BerryBush,
            EntityKind::Farm(_) => EntityType::Farm,
            EntityKind::Water => EntityType::Water,
            EntityKind::House(_) => EntityType::House,
            EntityKind::Totem(_) => EntityType::Totem,
            EntityKind::NatureReserve(_) => EntityType::NatureReserve,
            EntityKind::Lava => EntityType::Lava,
        }
    }
}

/// One live entity: grid position, lifecycle counters, and species state.
#[derive(Debug, Clone, Serialize)]
pub struct Entity {
    pub x: i32,
    pub y: i32,
    pub age: u32,
    /// Death-by-old-age threshold, usually randomized within a band.
    pub lifespan: u32,
    pub marked_for_deletion: bool,
    /// Alive but off-grid, resting inside a house.
    pub stored: bool,
    pub kind: EntityKind,
}

impl Entity {
    fn new(x: i32, y: i32, lifespan: u32, kind: EntityKind) -> Self {
        Self {
            x,
            y,
            age: 0,
            lifespan,
            marked_for_deletion: false,
            stored: false,
            kind,
        }
    }

    /// A human assigned to one of the two founding factions at random.
    pub fn human(x: i32, y: i32, cfg: &WorldConfig, rng: &mut impl Rng) -> Self {
        let faction = if rng.random::<f32>() > 0.5 {
            faction::founder_red()
        } else {
            faction::founder_blue()
        };
        Self::human_in_faction(x, y, faction, cfg, rng)
    }

    /// A human born into an existing faction.
    pub fn human_in_faction(
        x: i32,
        y: i32,
        faction: Faction,
        cfg: &WorldConfig,
        rng: &mut impl Rng,
    ) -> Self {
        let lifespan = cfg.human_max_age + rng.random_range(0..500);
        let name = faction::random_name(rng);
        Self::new(
            x,
            y,
            lifespan,
            EntityKind::Human(HumanState {
                hunger: 0.0,
                thirst: 0.0,
                wood: 0,
                reproduction_cooldown: 0,
                action: Action::Idle,
                faction: faction.name,
                color: faction.color,
                name,
                house_target: None,
                conservation_target: None,
                search_cooldowns: SearchCooldowns::default(),
            }),
        )
    }

    pub fn wolf(x: i32, y: i32, parent: Option<&Traits>, cfg: &WorldConfig, rng: &mut impl Rng) -> Self {
        let lifespan = cfg.wolf_max_age + rng.random_range(0..300);
        let traits = genetics::mutate(parent, cfg.mutation_rate, &cfg.trait_limits, rng);
        Self::new(
            x,
            y,
            lifespan,
            EntityKind::Wolf(AnimalState {
                hunger: 0.0,
                thirst: 0.0,
                reproduction_cooldown: cfg.wolf_reproduction_cooldown,
                traits,
            }),
        )
    }

    pub fn cow(x: i32, y: i32, parent: Option<&Traits>, cfg: &WorldConfig, rng: &mut impl Rng) -> Self {
        let lifespan = cfg.cow_max_age + rng.random_range(0..500);
        let traits = genetics::mutate(parent, cfg.mutation_rate, &cfg.trait_limits, rng);
        Self::new(
            x,
            y,
            lifespan,
            EntityKind::Cow(AnimalState {
                hunger: 0.0,
                thirst: 0.0,
                reproduction_cooldown: 0,
                traits,
            }),
        )
    }

    pub fn tree(x: i32, y: i32, cfg: &WorldConfig, rng: &mut impl Rng) -> Self {
        let lifespan = cfg.tree_max_age + rng.random_range(0..1_000);
        Self::new(x, y, lifespan, EntityKind::Tree)
    }

    pub fn berry_bush(x: i32, y: i32, cfg: &WorldConfig, rng: &mut impl Rng) -> Self {
        let lifespan = cfg.bush_max_age + rng.random_range(0..500);
        Self::new(x, y, lifespan, EntityKind::BerryBush(BushState::default()))
    }

    pub fn farm(x: i32, y: i32, rng: &mut impl Rng) -> Self {
        let lifespan = 1_000 + rng.random_range(0..500);
        Self::new(x, y, lifespan, EntityKind::Farm(FarmState::default()))
    }

    pub fn water(x: i32, y: i32) -> Self {
        // Water never ages out; the lifespan is unreachable.
        Self::new(x, y, u32::MAX, EntityKind::Water)
    }

    pub fn house(x: i32, y: i32, cfg: &WorldConfig) -> Self {
        Self::new(x, y, cfg.house_lifespan, EntityKind::House(HouseState::default()))
    }

    pub fn totem(x: i32, y: i32, faction: String, color: &'static str, cfg: &WorldConfig) -> Self {
        Self::new(
            x,
            y,
            cfg.totem_lifespan,
            EntityKind::Totem(TotemState { faction, color }),
        )
    }

    pub fn nature_reserve(x: i32, y: i32, species: ReserveSpecies, cfg: &WorldConfig) -> Self {
        Self::new(
            x,
            y,
            cfg.reserve_lifespan,
            EntityKind::NatureReserve(ReserveState { species, spawned: 0 }),
        )
    }

    pub fn lava(x: i32, y: i32, rng: &mut impl Rng) -> Self {
        let lifespan = 50 + rng.random_range(0..50);
        Self::new(x, y, lifespan, EntityKind::Lava)
    }

    #[must_use]
    pub const fn entity_type(&self) -> EntityType {
        self.kind.entity_type()
    }

    /// Faction id for humans and totems.
    #[must_use]
    pub fn faction_id(&self) -> Option<&str> {
        match &self.kind {
            EntityKind::Human(h) => Some(&h.faction),
            EntityKind::Totem(t) => Some(&t.faction),
            _ => None,
        }
    }

    /// Display color for humans and totems (thought bubbles, logs).
    #[must_use]
    pub fn color(&self) -> Option<&'static str> {
        match &self.kind {
            EntityKind::Human(h) => Some(h.color),
            EntityKind::Totem(t) => Some(t.color),
            _ => None,
        }
    }

    /// Trait vector for animals that carry one themselves.
    #[must_use]
    pub fn animal_traits(&self) -> Option<&Traits> {
        match &self.kind {
            EntityKind::Wolf(a) | EntityKind::Cow(a) => Some(&a.traits),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_human(&self) -> Option<&HumanState> {
        match &self.kind {
            EntityKind::Human(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_human_mut(&mut self) -> Option<&mut HumanState> {
        match &mut self.kind {
            EntityKind::Human(h) => Some(h),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_animal(&self) -> Option<&AnimalState> {
        match &self.kind {
            EntityKind::Wolf(a) | EntityKind::Cow(a) => Some(a),
            _ => None,
        }
    }

    pub fn as_animal_mut(&mut self) -> Option<&mut AnimalState> {
        match &mut self.kind {
            EntityKind::Wolf(a) | EntityKind::Cow(a) => Some(a),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_house(&self) -> Option<&HouseState> {
        match &self.kind {
            EntityKind::House(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_house_mut(&mut self) -> Option<&mut HouseState> {
        match &mut self.kind {
            EntityKind::House(h) => Some(h),
            _ => None,
        }
    }
}

impl BushState {
    /// Harvest the bush: yields the configured food value when ripe and
    /// starts the regrow timer, otherwise yields nothing.
    pub fn harvest(&mut self, food_value: f32, regrowth: u32) -> f32 {
        if self.regrow > 0 {
            return 0.0;
        }
        self.regrow = regrowth;
        food_value
    }
}

impl FarmState {
    /// Harvest the farm: yields only at full growth, then resets.
    pub fn harvest(&mut self, food_value: f32) -> f32 {
        if self.growth >= 100 {
            self.growth = 0;
            food_value
        } else {
            0.0
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn type_indices_cover_the_table() {
        for (i, ty) in EntityType::ALL.iter().enumerate() {
            assert_eq!(ty.index(), i);
        }
    }

    #[test]
    fn lifespans_fall_within_species_bands() {
        let cfg = WorldConfig::default();
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..50 {
            let human = Entity::human(0, 0, &cfg, &mut rng);
            assert!(human.lifespan >= cfg.human_max_age);
            assert!(human.lifespan < cfg.human_max_age + 500);
            let wolf = Entity::wolf(0, 0, None, &cfg, &mut rng);
            assert!(wolf.lifespan >= cfg.wolf_max_age);
            assert!(wolf.lifespan < cfg.wolf_max_age + 300);
        }
    }

    #[test]
    fn bush_harvest_starts_regrow_timer() {
        let mut bush = BushState::default();
        assert_eq!(bush.harvest(20.0, 300), 20.0);
        assert_eq!(bush.regrow, 300);
        assert_eq!(bush.harvest(20.0, 300), 0.0);
    }

    #[test]
    fn farm_harvest_requires_full_growth() {
        let mut farm = FarmState { growth: 99 };
        assert_eq!(farm.harvest(50.0), 0.0);
        farm.growth = 100;
        assert_eq!(farm.harvest(50.0), 50.0);
        assert_eq!(farm.growth, 0);
    }
}
