//! Static world configuration and runtime-tunable settings.

use rand::{rngs::SmallRng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::world::WorldError;

/// Inclusive bounds for a single trait component.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitBound {
    pub min: f32,
    pub max: f32,
}

impl TraitBound {
    const fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }
}

/// Per-trait clamp ranges applied after every mutation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TraitLimits {
    pub move_speed: TraitBound,
    pub hunger_rate: TraitBound,
    pub vision_radius: TraitBound,
    pub aggression: TraitBound,
    pub heat_tolerance: TraitBound,
    pub cold_tolerance: TraitBound,
}

impl Default for TraitLimits {
    fn default() -> Self {
        Self {
            move_speed: TraitBound::new(0.2, 3.0),
            hunger_rate: TraitBound::new(0.2, 3.0),
            vision_radius: TraitBound::new(0.2, 3.0),
            aggression: TraitBound::new(0.0, 5.0),
            heat_tolerance: TraitBound::new(0.1, 3.0),
            cold_tolerance: TraitBound::new(0.1, 3.0),
        }
    }
}

/// Static configuration for a world. Validated once at construction;
/// anything a control surface may change at runtime lives in [`Settings`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorldConfig {
    /// Grid width in cells.
    pub world_width: i32,
    /// Grid height in cells.
    pub world_height: i32,
    /// Hard cap on total live entities; spawns beyond it are dropped.
    pub max_entities: usize,
    /// Ticks between divine-intervention reseeding checks.
    pub reseed_interval: u64,
    /// Optional RNG seed for reproducible worlds.
    pub rng_seed: Option<u64>,

    /// Human thirst gained per tick (scaled by metabolism).
    pub human_thirst_rate: f32,
    pub human_max_hunger: f32,
    pub human_max_thirst: f32,
    /// Hunger above which a human snacks even when not starving.
    pub human_low_hunger: f32,
    pub human_low_thirst: f32,
    /// Same-faction neighbors within radius 2 needed to trigger a schism.
    pub human_split_threshold: u32,
    pub human_target_min: usize,
    pub human_target_max: usize,
    pub human_poop_chance: f32,
    pub human_reproduction_cooldown: u32,
    /// Below this population the extinction hook fires on reseed checks.
    pub human_spawn_threshold: usize,
    pub human_max_age: u32,

    pub wolf_thirst_rate: f32,
    pub wolf_max_hunger: f32,
    pub wolf_max_thirst: f32,
    pub wolf_low_thirst: f32,
    pub wolf_reproduction_cooldown: u32,
    pub wolf_poop_chance: f32,
    pub wolf_max_age: u32,

    pub cow_thirst_rate: f32,
    pub cow_max_hunger: f32,
    pub cow_max_thirst: f32,
    pub cow_low_thirst: f32,
    /// Hunger above which a cow grazes.
    pub cow_eat_threshold: f32,
    pub cow_reproduction_cooldown: u32,
    /// Relaxed cooldown while the herd is endangered.
    pub cow_endangered_cooldown: u32,
    pub cow_poop_chance: f32,
    pub cow_max_age: u32,

    /// Hunger restored by harvesting a berry bush.
    pub berry_food_value: f32,
    /// Hunger restored by harvesting a fully grown farm.
    pub farm_food_value: f32,
    pub tree_spread_chance: f32,
    pub bush_spread_chance: f32,
    pub tree_max_age: u32,
    pub bush_max_age: u32,

    pub reserve_lifespan: u32,
    pub reserve_spawn_rate: f32,
    pub reserve_max_animals: u32,

    pub house_lifespan: u32,
    pub house_capacity: usize,

    /// Wood required to raise a totem.
    pub totem_cost: u32,
    pub totem_radius: f32,
    pub totem_lifespan: u32,

    /// Humans plant trees when the count drops below this.
    pub trees_min: usize,
    /// Above this bush count cows enter a reproduction frenzy.
    pub berry_frenzy_threshold: usize,
    pub berry_max_population: usize,
    pub berry_max_neighbors: usize,
    pub berry_neighbor_radius: i32,
    pub wolves_min: usize,
    pub wolves_max: usize,
    /// Above this cow count wolves enter a reproduction frenzy.
    pub wolf_frenzy_threshold: usize,
    pub cows_min: usize,
    pub cows_max: usize,
    pub frenzy_hunger_multiplier: f32,
    pub frenzy_cooldown_modifier: f32,
    /// Minimum distance kept between houses when scoring build spots.
    pub building_min_spacing: f32,
    /// Faction population above which a schism is forced.
    pub faction_overpopulation_cap: usize,

    /// Relative mutation amplitude applied per inherited trait.
    pub mutation_rate: f32,
    pub trait_limits: TraitLimits,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            world_width: 120,
            world_height: 80,
            max_entities: 5_000,
            reseed_interval: 50,
            rng_seed: None,

            human_thirst_rate: 0.05,
            human_max_hunger: 100.0,
            human_max_thirst: 150.0,
            human_low_hunger: 20.0,
            human_low_thirst: 30.0,
            human_split_threshold: 6,
            human_target_min: 200,
            human_target_max: 300,
            human_poop_chance: 0.0005,
            human_reproduction_cooldown: 300,
            human_spawn_threshold: 5,
            human_max_age: 2_000,

            wolf_thirst_rate: 0.06,
            wolf_max_hunger: 100.0,
            wolf_max_thirst: 150.0,
            wolf_low_thirst: 30.0,
            wolf_reproduction_cooldown: 200,
            wolf_poop_chance: 0.0005,
            wolf_max_age: 1_200,

            cow_thirst_rate: 0.04,
            cow_max_hunger: 100.0,
            cow_max_thirst: 150.0,
            cow_low_thirst: 30.0,
            cow_eat_threshold: 30.0,
            cow_reproduction_cooldown: 200,
            cow_endangered_cooldown: 50,
            cow_poop_chance: 0.0005,
            cow_max_age: 1_500,

            berry_food_value: 20.0,
            farm_food_value: 50.0,
            tree_spread_chance: 0.001,
            bush_spread_chance: 0.001,
            tree_max_age: 5_000,
            bush_max_age: 2_000,

            reserve_lifespan: 300,
            reserve_spawn_rate: 0.05,
            reserve_max_animals: 10,

            house_lifespan: 300,
            house_capacity: 2,

            totem_cost: 10,
            totem_radius: 15.0,
            totem_lifespan: 2_000,

            trees_min: 125,
            berry_frenzy_threshold: 600,
            berry_max_population: 1_500,
            berry_max_neighbors: 3,
            berry_neighbor_radius: 3,
            wolves_min: 40,
            wolves_max: 60,
            wolf_frenzy_threshold: 500,
            cows_min: 80,
            cows_max: 120,
            frenzy_hunger_multiplier: 2.0,
            frenzy_cooldown_modifier: 0.25,
            building_min_spacing: 2.0,
            faction_overpopulation_cap: 300,

            mutation_rate: 0.25,
            trait_limits: TraitLimits::default(),
        }
    }
}

impl WorldConfig {
    /// Validates the configuration before a world is built around it.
    pub fn validate(&self) -> Result<(), WorldError> {
        if self.world_width <= 0 || self.world_height <= 0 {
            return Err(WorldError::InvalidConfig(
                "world dimensions must be positive",
            ));
        }
        if self.max_entities == 0 {
            return Err(WorldError::InvalidConfig("max_entities must be non-zero"));
        }
        if self.reseed_interval == 0 {
            return Err(WorldError::InvalidConfig(
                "reseed_interval must be non-zero",
            ));
        }
        if self.human_max_hunger <= 0.0
            || self.human_max_thirst <= 0.0
            || self.wolf_max_hunger <= 0.0
            || self.wolf_max_thirst <= 0.0
            || self.cow_max_hunger <= 0.0
            || self.cow_max_thirst <= 0.0
        {
            return Err(WorldError::InvalidConfig(
                "hunger and thirst caps must be positive",
            ));
        }
        if !(0.0..=1.0).contains(&self.mutation_rate) {
            return Err(WorldError::InvalidConfig(
                "mutation_rate must lie in [0, 1]",
            ));
        }
        let bounds = [
            self.trait_limits.move_speed,
            self.trait_limits.hunger_rate,
            self.trait_limits.vision_radius,
            self.trait_limits.aggression,
            self.trait_limits.heat_tolerance,
            self.trait_limits.cold_tolerance,
        ];
        if bounds.iter().any(|b| b.min > b.max) {
            return Err(WorldError::InvalidConfig(
                "trait limit min cannot exceed max",
            ));
        }
        if self.house_capacity == 0 {
            return Err(WorldError::InvalidConfig("house_capacity must be non-zero"));
        }
        if self.totem_radius <= 0.0 {
            return Err(WorldError::InvalidConfig("totem_radius must be positive"));
        }
        if self.frenzy_cooldown_modifier < 0.0 || self.frenzy_cooldown_modifier > 1.0 {
            return Err(WorldError::InvalidConfig(
                "frenzy_cooldown_modifier must lie in [0, 1]",
            ));
        }
        Ok(())
    }

    /// Returns the configured RNG, seeding from entropy if no seed is set.
    pub(crate) fn seeded_rng(&self) -> SmallRng {
        match self.rng_seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => {
                let seed: u64 = rand::random();
                SmallRng::seed_from_u64(seed)
            }
        }
    }
}

/// Runtime-tunable parameters, mutable between ticks through the control
/// surface. Values take effect on the next read; no validation beyond type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    pub human_hunger_rate: f32,
    pub wolf_hunger_rate: f32,
    pub cow_hunger_rate: f32,
    pub human_reproduction_cost: f32,
    pub wolf_reproduction_cost: f32,
    pub cow_reproduction_cost: f32,
    pub human_defense_chance: f32,
    pub human_war_chance: f32,
    pub human_split_chance: f32,
    pub wolf_hunt_threshold: f32,
    pub berry_regrowth: u32,
    /// Milliseconds per simulation tick for the external driver clock.
    pub tick_rate_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            human_hunger_rate: 0.05,
            wolf_hunger_rate: 0.1,
            cow_hunger_rate: 0.04,
            human_reproduction_cost: 40.0,
            wolf_reproduction_cost: 20.0,
            cow_reproduction_cost: 20.0,
            human_defense_chance: 0.5,
            human_war_chance: 0.05,
            human_split_chance: 0.01,
            wolf_hunt_threshold: 20.0,
            berry_regrowth: 300,
            tick_rate_ms: 100,
        }
    }
}

/// Partial settings blob for import: absent keys keep their prior values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsPatch {
    pub human_hunger_rate: Option<f32>,
    pub wolf_hunger_rate: Option<f32>,
    pub cow_hunger_rate: Option<f32>,
    pub human_reproduction_cost: Option<f32>,
    pub wolf_reproduction_cost: Option<f32>,
    pub cow_reproduction_cost: Option<f32>,
    pub human_defense_chance: Option<f32>,
    pub human_war_chance: Option<f32>,
    pub human_split_chance: Option<f32>,
    pub wolf_hunt_threshold: Option<f32>,
    pub berry_regrowth: Option<u32>,
    pub tick_rate_ms: Option<u64>,
}

impl SettingsPatch {
    /// Merge the patch onto `settings`, leaving unspecified fields alone.
    pub fn apply(&self, settings: &mut Settings) {
        if let Some(v) = self.human_hunger_rate {
            settings.human_hunger_rate = v;
        }
        if let Some(v) = self.wolf_hunger_rate {
            settings.wolf_hunger_rate = v;
        }
        if let Some(v) = self.cow_hunger_rate {
            settings.cow_hunger_rate = v;
        }
        if let Some(v) = self.human_reproduction_cost {
            settings.human_reproduction_cost = v;
        }
        if let Some(v) = self.wolf_reproduction_cost {
            settings.wolf_reproduction_cost = v;
        }
        if let Some(v) = self.cow_reproduction_cost {
            settings.cow_reproduction_cost = v;
        }
        if let Some(v) = self.human_defense_chance {
            settings.human_defense_chance = v;
        }
        if let Some(v) = self.human_war_chance {
            settings.human_war_chance = v;
        }
        if let Some(v) = self.human_split_chance {
            settings.human_split_chance = v;
        }
        if let Some(v) = self.wolf_hunt_threshold {
            settings.wolf_hunt_threshold = v;
        }
        if let Some(v) = self.berry_regrowth {
            settings.berry_regrowth = v;
        }
        if let Some(v) = self.tick_rate_ms {
            settings.tick_rate_ms = v;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_validates() {
        WorldConfig::default().validate().expect("default config");
    }

    #[test]
    fn zero_dimensions_rejected() {
        let config = WorldConfig {
            world_width: 0,
            ..WorldConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn inverted_trait_limits_rejected() {
        let mut config = WorldConfig::default();
        config.trait_limits.aggression = TraitBound::new(5.0, 1.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn partial_patch_keeps_unspecified_fields() {
        let mut settings = Settings::default();
        let before = settings.clone();
        let patch: SettingsPatch =
            serde_json::from_str(r#"{"wolf_hunt_threshold": 35.0, "berry_regrowth": 120}"#)
                .expect("patch parses");
        patch.apply(&mut settings);
        assert_eq!(settings.wolf_hunt_threshold, 35.0);
        assert_eq!(settings.berry_regrowth, 120);
        assert_eq!(settings.human_hunger_rate, before.human_hunger_rate);
        assert_eq!(settings.tick_rate_ms, before.tick_rate_ms);
    }

    #[test]
    fn settings_round_trip_through_json() {
        let settings = Settings::default();
        let blob = serde_json::to_string(&settings).expect("serialize");
        let patch: SettingsPatch = serde_json::from_str(&blob).expect("parse as patch");
        let mut restored = Settings {
            human_hunger_rate: 9.0,
            ..Settings::default()
        };
        patch.apply(&mut restored);
        assert_eq!(restored, settings);
    }
}
