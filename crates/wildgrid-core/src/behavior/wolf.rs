//! Wolf behavior: drink, hunt, shun the village, breed.

use rand::Rng;

use crate::entity::{AnimalState, Entity, EntityId, EntityType};
use crate::genetics::Traits;
use crate::world::World;

fn with_wolf<R>(world: &mut World, id: EntityId, f: impl FnOnce(&mut AnimalState) -> R) -> Option<R> {
    world.entity_mut(id).and_then(Entity::as_animal_mut).map(f)
}

pub(super) fn tick(world: &mut World, id: EntityId) {
    if super::age_and_check(world, id) {
        return;
    }
    let Some(animal) = world.entity(id).and_then(Entity::as_animal) else {
        return;
    };
    let traits = animal.traits;
    let hunger_gain = world.settings().wolf_hunger_rate * traits.hunger_rate;
    let thirst_gain = world.config().wolf_thirst_rate;
    with_wolf(world, id, |a| {
        a.hunger += hunger_gain;
        a.thirst += thirst_gain;
        a.reproduction_cooldown = a.reproduction_cooldown.saturating_sub(1);
    });
    let poop_chance = world.config().wolf_poop_chance;
    super::try_poop(world, id, poop_chance);

    let cfg = world.config();
    let (max_hunger, max_thirst, low_thirst) =
        (cfg.wolf_max_hunger, cfg.wolf_max_thirst, cfg.wolf_low_thirst);
    let Some(animal) = world.entity(id).and_then(Entity::as_animal) else {
        return;
    };
    let (hunger, thirst, cooldown) = (animal.hunger, animal.thirst, animal.reproduction_cooldown);
    if hunger >= max_hunger || thirst >= max_thirst {
        world.kill(id);
        return;
    }
    if thirst > 70.0 {
        seek_water(world, id, &traits);
        return;
    }
    if hunger > 70.0 {
        hunt(world, id, &traits);
        return;
    }
    if avoid_buildings(world, id, &traits) {
        return;
    }
    if thirst > low_thirst {
        seek_water(world, id, &traits);
        return;
    }
    if hunger > world.settings().wolf_hunt_threshold {
        hunt(world, id, &traits);
        return;
    }
    let frenzy = world.count(EntityType::Cow) > world.config().wolf_frenzy_threshold;
    if frenzy {
        let surcharge =
            world.settings().wolf_hunger_rate * (world.config().frenzy_hunger_multiplier - 1.0);
        with_wolf(world, id, |a| a.hunger += surcharge);
    }
    let (settings, cfg) = (world.settings().clone(), world.config().clone());
    let rule = super::ReproductionRule::wolf(frenzy, &cfg, &settings);
    if cooldown == 0 && hunger < rule.hunger_ceiling {
        reproduce(world, id, &traits, &rule);
    } else {
        super::wander(world, id);
    }
}

/// Wolves keep clear of settled ground; a wolf boxed in while backing
/// away just mills about instead.
fn avoid_buildings(world: &mut World, id: EntityId, traits: &Traits) -> bool {
    let Some(e) = world.entity(id) else { return false };
    let (x, y) = (e.x, e.y);
    let Some(house_id) = world.find_nearest(x, y, EntityType::House, 8.0 * traits.vision_radius)
    else {
        return false;
    };
    let Some(house) = world.entity(house_id) else {
        return false;
    };
    let (dx, dy) = ((x - house.x).signum(), (y - house.y).signum());
    if !world.move_entity(id, dx, dy) {
        super::wander(world, id);
    }
    true
}

fn hunt(world: &mut World, id: EntityId, traits: &Traits) {
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let radius = 20.0 * traits.vision_radius;
    let prey = world
        .find_nearest(x, y, EntityType::Cow, radius)
        .or_else(|| world.find_nearest(x, y, EntityType::Human, radius));
    let Some(prey_id) = prey else {
        super::wander(world, id);
        return;
    };
    let Some(prey) = world.entity(prey_id) else {
        return;
    };
    let (px, py) = (prey.x, prey.y);
    if super::adjacent(x, y, px, py) {
        world.kill(prey_id);
        with_wolf(world, id, |a| a.hunger = 0.0);
    } else {
        move_towards(world, id, px, py, traits);
    }
}

fn seek_water(world: &mut World, id: EntityId, traits: &Traits) {
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let Some(water_id) = world.find_nearest(x, y, EntityType::Water, 999.0) else {
        super::wander(world, id);
        return;
    };
    let Some(water) = world.entity(water_id) else {
        return;
    };
    let (wx, wy) = (water.x, water.y);
    if super::adjacent(x, y, wx, wy) {
        with_wolf(world, id, |a| a.thirst = 0.0);
    } else {
        move_towards(world, id, wx, wy, traits);
    }
}

fn reproduce(world: &mut World, id: EntityId, traits: &Traits, rule: &super::ReproductionRule) {
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let me = (e.x, e.y);
    let mate = world.find_nearest_where(x, y, EntityType::Wolf, 10.0, |other| {
        other.x != me.0 || other.y != me.1
    });
    let Some(mate_id) = mate else {
        super::wander(world, id);
        return;
    };
    let Some(mate) = world.entity(mate_id) else {
        return;
    };
    let (mx, my) = (mate.x, mate.y);
    if !super::adjacent(x, y, mx, my) {
        move_towards(world, id, mx, my, traits);
        return;
    }
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (bx, by) = (x + dx, y + dy);
            if !world.in_bounds(bx, by) || world.get_at(bx, by).is_some() {
                continue;
            }
            let (cfg, rng) = world.cfg_and_rng();
            let pup = Entity::wolf(bx, by, Some(traits), cfg, rng);
            world.queue_spawn(pup);
            with_wolf(world, id, |a| {
                a.reproduction_cooldown = rule.cooldown;
                a.hunger += rule.cost;
            });
            return;
        }
    }
}

fn move_towards(world: &mut World, id: EntityId, tx: i32, ty: i32, traits: &Traits) {
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let speed_chance = traits.move_speed - 1.0;
    let step = if speed_chance > 0.0 && world.rng().random::<f32>() < speed_chance {
        2
    } else {
        1
    };
    world.move_entity(id, (tx - x).signum() * step, (ty - y).signum() * step);
}
