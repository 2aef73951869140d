//! Per-species tick behaviors, dispatched from the world loop.

mod cow;
mod human;
mod structures;
mod wolf;

use rand::Rng;

use crate::config::{Settings, WorldConfig};
use crate::entity::{Entity, EntityId, EntityType};
use crate::world::World;

pub(crate) fn dispatch(world: &mut World, id: EntityId) {
    let Some(ty) = world.entity(id).map(Entity::entity_type) else {
        return;
    };
    match ty {
        EntityType::Human => human::tick(world, id),
        EntityType::Wolf => wolf::tick(world, id),
        EntityType::Cow => cow::tick(world, id),
        EntityType::Tree => structures::tick_tree(world, id),
        EntityType::BerryBush => structures::tick_bush(world, id),
        EntityType::Farm => structures::tick_farm(world, id),
        EntityType::House => structures::tick_house(world, id),
        EntityType::NatureReserve => structures::tick_reserve(world, id),
        EntityType::Totem | EntityType::Lava => {
            age_and_check(world, id);
        }
        EntityType::Water => {}
    }
}

/// Ages the entity one tick. Returns true when it died of old age.
fn age_and_check(world: &mut World, id: EntityId) -> bool {
    let Some(e) = world.entity_mut(id) else {
        return true;
    };
    e.age += 1;
    if e.age > e.lifespan {
        world.kill(id);
        return true;
    }
    false
}

/// A random single-cell step, never (0, 0).
fn random_step(rng: &mut impl Rng) -> (i32, i32) {
    loop {
        let dx = rng.random_range(-1..=1);
        let dy = rng.random_range(-1..=1);
        if dx != 0 || dy != 0 {
            return (dx, dy);
        }
    }
}

fn wander(world: &mut World, id: EntityId) {
    let (dx, dy) = random_step(world.rng());
    world.move_entity(id, dx, dy);
}

/// Chebyshev adjacency; diagonal neighbors count.
fn adjacent(ax: i32, ay: i32, bx: i32, by: i32) -> bool {
    (ax - bx).abs() <= 1 && (ay - by).abs() <= 1
}

fn distance(ax: i32, ay: i32, bx: i32, by: i32) -> f32 {
    let dx = (ax - bx) as f32;
    let dy = (ay - by) as f32;
    (dx * dx + dy * dy).sqrt()
}

/// Droppings occasionally seed new growth on an empty neighbor cell.
fn try_poop(world: &mut World, id: EntityId, chance: f32) {
    if world.rng().random::<f32>() >= chance {
        return;
    }
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let (dx, dy) = random_step(world.rng());
    let (nx, ny) = (x + dx, y + dy);
    if !world.in_bounds(nx, ny) || world.get_at(nx, ny).is_some() {
        return;
    }
    let (cfg, rng) = world.cfg_and_rng();
    let sprout = if rng.random::<f32>() < 0.9 {
        Entity::berry_bush(nx, ny, cfg, rng)
    } else {
        Entity::tree(nx, ny, cfg, rng)
    };
    world.queue_spawn(sprout);
}

/// One resolved set of reproduction parameters. Frenzy and endangerment
/// adjust the defaults, with the later condition winning where both apply.
struct ReproductionRule {
    hunger_ceiling: f32,
    cooldown: u32,
    cost: f32,
}

impl ReproductionRule {
    fn wolf(frenzy: bool, cfg: &WorldConfig, settings: &Settings) -> Self {
        let cooldown = if frenzy {
            (cfg.wolf_reproduction_cooldown as f32 * cfg.frenzy_cooldown_modifier) as u32
        } else {
            cfg.wolf_reproduction_cooldown
        };
        Self {
            hunger_ceiling: if frenzy { 50.0 } else { 20.0 },
            cooldown,
            cost: if frenzy {
                10.0
            } else {
                settings.wolf_reproduction_cost
            },
        }
    }

    fn cow(frenzy: bool, endangered: bool, cfg: &WorldConfig, settings: &Settings) -> Self {
        let mut cooldown = cfg.cow_reproduction_cooldown;
        if frenzy {
            cooldown = (cooldown as f32 * cfg.frenzy_cooldown_modifier) as u32;
        }
        if endangered {
            cooldown = cfg.cow_endangered_cooldown;
        }
        Self {
            hunger_ceiling: if frenzy || endangered { 50.0 } else { 20.0 },
            cooldown,
            cost: if frenzy {
                5.0
            } else {
                settings.cow_reproduction_cost
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frenzy_shortens_the_wolf_cooldown() {
        let cfg = WorldConfig::default();
        let settings = Settings::default();
        let calm = ReproductionRule::wolf(false, &cfg, &settings);
        let frenzied = ReproductionRule::wolf(true, &cfg, &settings);
        assert!(frenzied.cooldown < calm.cooldown);
        assert!(frenzied.hunger_ceiling > calm.hunger_ceiling);
    }

    #[test]
    fn endangerment_overrides_the_cow_frenzy_cooldown() {
        let cfg = WorldConfig::default();
        let settings = Settings::default();
        let rule = ReproductionRule::cow(true, true, &cfg, &settings);
        assert_eq!(rule.cooldown, cfg.cow_endangered_cooldown);
        assert_eq!(rule.hunger_ceiling, 50.0);
    }

    #[test]
    fn random_step_never_stays_in_place() {
        let mut rng = rand::rng();
        for _ in 0..100 {
            let (dx, dy) = random_step(&mut rng);
            assert!(dx != 0 || dy != 0);
            assert!((-1..=1).contains(&dx) && (-1..=1).contains(&dy));
        }
    }
}
