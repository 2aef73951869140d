//! Cow behavior: graze, drink, and multiply when the grass allows.

use rand::Rng;

use crate::entity::{AnimalState, Entity, EntityId, EntityKind, EntityType};
use crate::genetics::Traits;
use crate::world::World;

fn with_cow<R>(world: &mut World, id: EntityId, f: impl FnOnce(&mut AnimalState) -> R) -> Option<R> {
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
    let hunger_gain = world.settings().cow_hunger_rate * traits.hunger_rate;
    let thirst_gain = world.config().cow_thirst_rate;
    with_cow(world, id, |a| {
        a.hunger += hunger_gain;
        a.thirst += thirst_gain;
        a.reproduction_cooldown = a.reproduction_cooldown.saturating_sub(1);
    });
    let poop_chance = world.config().cow_poop_chance;
    super::try_poop(world, id, poop_chance);

    let cfg = world.config();
    let (max_hunger, max_thirst, low_thirst, eat_threshold) = (
        cfg.cow_max_hunger,
        cfg.cow_max_thirst,
        cfg.cow_low_thirst,
        cfg.cow_eat_threshold,
    );
    let endangered = world.count(EntityType::Cow) < world.config().cows_min;
    if endangered {
        // The herd digs deep when it is close to dying out.
        let hunger_relief = world.settings().cow_hunger_rate * 0.5;
        let thirst_relief = world.config().cow_thirst_rate * 0.5;
        with_cow(world, id, |a| {
            a.hunger = (a.hunger - hunger_relief).max(0.0);
            a.thirst = (a.thirst - thirst_relief).max(0.0);
        });
    }
    let Some(animal) = world.entity(id).and_then(Entity::as_animal) else {
        return;
    };
    let (hunger, thirst, cooldown) = (animal.hunger, animal.thirst, animal.reproduction_cooldown);
    if hunger >= max_hunger || thirst >= max_thirst {
        world.kill(id);
        return;
    }
    if thirst > low_thirst {
        seek_water(world, id, &traits);
        return;
    }
    if hunger > eat_threshold {
        seek_food(world, id, &traits);
        return;
    }
    let frenzy = world.count(EntityType::BerryBush) > world.config().berry_frenzy_threshold;
    if frenzy {
        let surcharge =
            world.settings().cow_hunger_rate * (world.config().frenzy_hunger_multiplier - 1.0);
        with_cow(world, id, |a| a.hunger += surcharge);
    }
    let (settings, cfg) = (world.settings().clone(), world.config().clone());
    let rule = super::ReproductionRule::cow(frenzy, endangered, &cfg, &settings);
    if cooldown == 0 && hunger < rule.hunger_ceiling {
        reproduce(world, id, endangered, &traits, &rule);
    } else {
        wander(world, id);
    }
}

fn seek_food(world: &mut World, id: EntityId, traits: &Traits) {
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let radius = 10.0 * traits.vision_radius;
    let bush = world.find_nearest_where(x, y, EntityType::BerryBush, radius, |b| {
        matches!(&b.kind, EntityKind::BerryBush(state) if state.regrow == 0)
    });
    let target = bush.or_else(|| {
        world.find_nearest_where(x, y, EntityType::Farm, radius, |f| {
            matches!(&f.kind, EntityKind::Farm(state) if state.growth >= 100)
        })
    });
    let Some(target_id) = target else {
        wander(world, id);
        return;
    };
    let Some(food) = world.entity(target_id) else {
        return;
    };
    let (fx, fy) = (food.x, food.y);
    if super::adjacent(x, y, fx, fy) {
        let berry_value = world.config().berry_food_value;
        let farm_value = world.config().farm_food_value;
        let regrowth = world.settings().berry_regrowth;
        let gained = match world.entity_mut(target_id).map(|e| &mut e.kind) {
            Some(EntityKind::BerryBush(b)) => b.harvest(berry_value, regrowth),
            Some(EntityKind::Farm(f)) => f.harvest(farm_value),
            _ => 0.0,
        };
        with_cow(world, id, |a| a.hunger = (a.hunger - gained).max(0.0));
    } else {
        move_towards(world, id, fx, fy, traits);
    }
}

fn seek_water(world: &mut World, id: EntityId, traits: &Traits) {
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let Some(water_id) = world.find_nearest(x, y, EntityType::Water, 999.0) else {
        wander(world, id);
        return;
    };
    let Some(water) = world.entity(water_id) else {
        return;
    };
    let (wx, wy) = (water.x, water.y);
    if super::adjacent(x, y, wx, wy) {
        with_cow(world, id, |a| a.thirst = 0.0);
    } else {
        move_towards(world, id, wx, wy, traits);
    }
}

fn reproduce(
    world: &mut World,
    id: EntityId,
    endangered: bool,
    traits: &Traits,
    rule: &super::ReproductionRule,
) {
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let me = (e.x, e.y);
    let radius = if endangered { 100.0 } else { 10.0 };
    let mate = world.find_nearest_where(x, y, EntityType::Cow, radius, |other| {
        other.x != me.0 || other.y != me.1
    });
    let Some(mate_id) = mate else {
        wander(world, id);
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
            let calf = Entity::cow(bx, by, Some(traits), cfg, rng);
            world.queue_spawn(calf);
            with_cow(world, id, |a| {
                a.reproduction_cooldown = rule.cooldown;
                a.hunger += rule.cost;
            });
            return;
        }
    }
}

fn wander(world: &mut World, id: EntityId) {
    let (dx, dy) = super::random_step(world.rng());
    step(world, id, dx, dy);
}

fn move_towards(world: &mut World, id: EntityId, tx: i32, ty: i32, traits: &Traits) {
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let speed_chance = traits.move_speed - 1.0;
    let mult = if speed_chance > 0.0 && world.rng().random::<f32>() < speed_chance {
        2
    } else {
        1
    };
    step(world, id, (tx - x).signum() * mult, (ty - y).signum() * mult);
}

/// Cows never hop over blockers, but they will graze straight through a
/// ripe berry bush standing in the way.
fn step(world: &mut World, id: EntityId, dx: i32, dy: i32) -> bool {
    let Some(e) = world.entity(id) else { return false };
    let (nx, ny) = (e.x + dx, e.y + dy);
    if !world.in_bounds(nx, ny) {
        return false;
    }
    match world.get_at(nx, ny) {
        None => world.move_entity(id, dx, dy),
        Some(blocker) => {
            let is_bush = world
                .entity(blocker)
                .is_some_and(|b| matches!(b.kind, EntityKind::BerryBush(_)));
            if !is_bush {
                return false;
            }
            let berry_value = world.config().berry_food_value;
            world.kill(blocker);
            with_cow(world, id, |a| a.hunger = (a.hunger - berry_value).max(0.0));
            world.move_entity(id, dx, dy)
        }
    }
}
