//! Trait inheritance with bounded random mutation.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::TraitLimits;

/// Per-lineage numeric genetics record. Animals carry their own vector;
/// humans share one per faction (see the world's faction registry).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Traits {
    pub move_speed: f32,
    pub hunger_rate: f32,
    pub vision_radius: f32,
    pub aggression: f32,
    pub heat_tolerance: f32,
    pub cold_tolerance: f32,
}

impl Default for Traits {
    fn default() -> Self {
        Self {
            move_speed: 1.0,
            hunger_rate: 1.0,
            vision_radius: 1.0,
            aggression: 1.0,
            heat_tolerance: 1.0,
            cold_tolerance: 1.0,
        }
    }
}

fn mutate_component(value: f32, rate: f32, min: f32, max: f32, rng: &mut impl Rng) -> f32 {
    let change = (rng.random::<f32>() * 2.0 - 1.0) * rate;
    (value * (1.0 + change)).clamp(min, max)
}

/// Derive an offspring trait vector. Without a parent this is an exact copy
/// of the base vector; with a parent every component is scaled by a uniform
/// draw in `[-rate, rate]` and clamped to its configured limits.
pub fn mutate(
    parent: Option<&Traits>,
    rate: f32,
    limits: &TraitLimits,
    rng: &mut impl Rng,
) -> Traits {
    let Some(p) = parent else {
        return Traits::default();
    };
    Traits {
        move_speed: mutate_component(
            p.move_speed,
            rate,
            limits.move_speed.min,
            limits.move_speed.max,
            rng,
        ),
        hunger_rate: mutate_component(
            p.hunger_rate,
            rate,
            limits.hunger_rate.min,
            limits.hunger_rate.max,
            rng,
        ),
        vision_radius: mutate_component(
            p.vision_radius,
            rate,
            limits.vision_radius.min,
            limits.vision_radius.max,
            rng,
        ),
        aggression: mutate_component(
            p.aggression,
            rate,
            limits.aggression.min,
            limits.aggression.max,
            rng,
        ),
        heat_tolerance: mutate_component(
            p.heat_tolerance,
            rate,
            limits.heat_tolerance.min,
            limits.heat_tolerance.max,
            rng,
        ),
        cold_tolerance: mutate_component(
            p.cold_tolerance,
            rate,
            limits.cold_tolerance.min,
            limits.cold_tolerance.max,
            rng,
        ),
    }
}

/// Clamp an existing vector back into its limits without mutating it.
#[must_use]
pub fn validate(traits: &Traits, limits: &TraitLimits) -> Traits {
    Traits {
        move_speed: traits
            .move_speed
            .clamp(limits.move_speed.min, limits.move_speed.max),
        hunger_rate: traits
            .hunger_rate
            .clamp(limits.hunger_rate.min, limits.hunger_rate.max),
        vision_radius: traits
            .vision_radius
            .clamp(limits.vision_radius.min, limits.vision_radius.max),
        aggression: traits
            .aggression
            .clamp(limits.aggression.min, limits.aggression.max),
        heat_tolerance: traits
            .heat_tolerance
            .clamp(limits.heat_tolerance.min, limits.heat_tolerance.max),
        cold_tolerance: traits
            .cold_tolerance
            .clamp(limits.cold_tolerance.min, limits.cold_tolerance.max),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    fn limits() -> TraitLimits {
        TraitLimits::default()
    }

    fn components(t: &Traits) -> [f32; 6] {
        [
            t.move_speed,
            t.hunger_rate,
            t.vision_radius,
            t.aggression,
            t.heat_tolerance,
            t.cold_tolerance,
        ]
    }

    #[test]
    fn no_parent_yields_exact_base_vector() {
        let mut rng = SmallRng::seed_from_u64(1);
        let traits = mutate(None, 0.25, &limits(), &mut rng);
        assert_eq!(traits, Traits::default());
    }

    #[test]
    fn mutation_stays_within_limits() {
        let mut rng = SmallRng::seed_from_u64(7);
        let lim = limits();
        let mut current = Traits::default();
        for _ in 0..500 {
            current = mutate(Some(&current), 0.25, &lim, &mut rng);
            let t = components(&current);
            let lo = [
                lim.move_speed.min,
                lim.hunger_rate.min,
                lim.vision_radius.min,
                lim.aggression.min,
                lim.heat_tolerance.min,
                lim.cold_tolerance.min,
            ];
            let hi = [
                lim.move_speed.max,
                lim.hunger_rate.max,
                lim.vision_radius.max,
                lim.aggression.max,
                lim.heat_tolerance.max,
                lim.cold_tolerance.max,
            ];
            for i in 0..6 {
                assert!(t[i] >= lo[i] && t[i] <= hi[i], "component {i} escaped limits");
            }
        }
    }

    #[test]
    fn trait_at_maximum_clamps_back_to_maximum() {
        let mut rng = SmallRng::seed_from_u64(11);
        let lim = limits();
        let mut parent = Traits::default();
        parent.aggression = lim.aggression.max;
        for _ in 0..100 {
            let child = mutate(Some(&parent), 0.25, &lim, &mut rng);
            assert!(child.aggression <= lim.aggression.max);
        }
    }

    #[test]
    fn validate_clamps_out_of_range_values() {
        let lim = limits();
        let wild = Traits {
            move_speed: 99.0,
            hunger_rate: -5.0,
            vision_radius: 0.0,
            aggression: 100.0,
            heat_tolerance: 0.0,
            cold_tolerance: 7.5,
        };
        let fixed = validate(&wild, &lim);
        assert_eq!(fixed.move_speed, lim.move_speed.max);
        assert_eq!(fixed.hunger_rate, lim.hunger_rate.min);
        assert_eq!(fixed.aggression, lim.aggression.max);
        assert_eq!(fixed.cold_tolerance, lim.cold_tolerance.max);
    }
}
