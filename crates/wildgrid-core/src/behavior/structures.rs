//! Flora and building upkeep: spreading, growth, shelter, restocking.

use rand::Rng;

use crate::entity::{Entity, EntityId, EntityKind, EntityType, ReserveSpecies};
use crate::world::World;

pub(super) fn tick_tree(world: &mut World, id: EntityId) {
    if super::age_and_check(world, id) {
        return;
    }
    let chance = world.config().tree_spread_chance;
    if world.rng().random::<f32>() >= chance {
        return;
    }
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let Some((nx, ny)) = spread_target(world, x, y) else {
        return;
    };
    let (cfg, rng) = world.cfg_and_rng();
    let sapling = Entity::tree(nx, ny, cfg, rng);
    world.queue_spawn(sapling);
}

pub(super) fn tick_bush(world: &mut World, id: EntityId) {
    if super::age_and_check(world, id) {
        return;
    }
    if let Some(e) = world.entity_mut(id) {
        if let EntityKind::BerryBush(state) = &mut e.kind {
            state.regrow = state.regrow.saturating_sub(1);
        }
    }
    let cfg = world.config();
    let (chance, cap, max_neighbors, neighbor_radius) = (
        cfg.bush_spread_chance,
        cfg.berry_max_population,
        cfg.berry_max_neighbors,
        cfg.berry_neighbor_radius,
    );
    if world.count(EntityType::BerryBush) >= cap {
        return;
    }
    if world.rng().random::<f32>() >= chance {
        return;
    }
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    // Bushes choke when packed too tight.
    let mut neighbors = 0;
    for dy in -neighbor_radius..=neighbor_radius {
        for dx in -neighbor_radius..=neighbor_radius {
            if dx == 0 && dy == 0 {
                continue;
            }
            if world
                .get_at(x + dx, y + dy)
                .and_then(|other| world.entity(other))
                .is_some_and(|other| matches!(other.kind, EntityKind::BerryBush(_)))
            {
                neighbors += 1;
            }
        }
    }
    if neighbors > max_neighbors {
        return;
    }
    let Some((nx, ny)) = spread_target(world, x, y) else {
        return;
    };
    let (cfg, rng) = world.cfg_and_rng();
    let sprout = Entity::berry_bush(nx, ny, cfg, rng);
    world.queue_spawn(sprout);
}

/// Plants lean toward water when they scatter seeds. Each axis follows
/// the nearest water source 70% of the time and drifts randomly otherwise.
fn spread_target(world: &mut World, x: i32, y: i32) -> Option<(i32, i32)> {
    let water = world
        .find_nearest(x, y, EntityType::Water, 10.0)
        .and_then(|w| world.entity(w))
        .map(|w| (w.x, w.y));
    let rng = world.rng();
    let mut axis = |here: i32, toward: Option<i32>| -> i32 {
        if let Some(t) = toward {
            if rng.random::<f32>() < 0.7 {
                return (t - here).signum();
            }
        }
        rng.random_range(-1..=1)
    };
    let dx = axis(x, water.map(|(wx, _)| wx));
    let dy = axis(y, water.map(|(_, wy)| wy));
    if dx == 0 && dy == 0 {
        return None;
    }
    let (nx, ny) = (x + dx, y + dy);
    if !world.in_bounds(nx, ny) || world.get_at(nx, ny).is_some() {
        return None;
    }
    Some((nx, ny))
}

pub(super) fn tick_farm(world: &mut World, id: EntityId) {
    if super::age_and_check(world, id) {
        return;
    }
    if let Some(e) = world.entity_mut(id) {
        if let EntityKind::Farm(state) = &mut e.kind {
            if state.growth < 100 {
                state.growth += 1;
            }
        }
    }
}

/// Houses shelter stored humans. Occupants rest, stay a little hungry,
/// and step back outside once recovered (or the moment they get bored).
pub(super) fn tick_house(world: &mut World, id: EntityId) {
    if super::age_and_check(world, id) {
        return;
    }
    let Some(house) = world.entity_mut(id) else { return };
    let (hx, hy) = (house.x, house.y);
    let occupants = match &mut house.kind {
        EntityKind::House(state) => std::mem::take(&mut state.occupants),
        _ => return,
    };
    let rate = world.settings().human_hunger_rate * 0.5;
    let max_hunger = world.config().human_max_hunger;
    let mut remaining = Vec::with_capacity(occupants.len());
    for mut occ in occupants {
        occ.rest += 1;
        let hunger = match world.entity_mut(occ.id).and_then(Entity::as_human_mut) {
            Some(h) => {
                h.hunger += rate;
                h.hunger
            }
            None => continue,
        };
        if hunger >= max_hunger {
            world.despawn_stored(occ.id);
            continue;
        }
        let wants_out = occ.rest > 50 && (hunger > 50.0 || world.rng().random::<f32>() < 0.05);
        if wants_out {
            let mut placed = false;
            'search: for dy in -1..=1 {
                for dx in -1..=1 {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    if world.restore_entity(occ.id, hx + dx, hy + dy) {
                        placed = true;
                        break 'search;
                    }
                }
            }
            if placed {
                continue;
            }
        }
        remaining.push(occ);
    }
    if let Some(state) = world.entity_mut(id).and_then(Entity::as_house_mut) {
        state.occupants = remaining;
    }
}

pub(super) fn tick_reserve(world: &mut World, id: EntityId) {
    if super::age_and_check(world, id) {
        return;
    }
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let (species, spawned) = match &e.kind {
        EntityKind::NatureReserve(r) => (r.species, r.spawned),
        _ => return,
    };
    let cfg = world.config();
    if spawned >= cfg.reserve_max_animals {
        return;
    }
    let rate = cfg.reserve_spawn_rate;
    if world.rng().random::<f32>() >= rate {
        return;
    }
    let (dx, dy) = super::random_step(world.rng());
    let (nx, ny) = (x + dx, y + dy);
    if !world.in_bounds(nx, ny) || world.get_at(nx, ny).is_some() {
        return;
    }
    let (cfg, rng) = world.cfg_and_rng();
    let newborn = match species {
        ReserveSpecies::Wolf => Entity::wolf(nx, ny, None, cfg, rng),
        ReserveSpecies::Cow => Entity::cow(nx, ny, None, cfg, rng),
    };
    world.queue_spawn(newborn);
    if let Some(e) = world.entity_mut(id) {
        if let EntityKind::NatureReserve(r) = &mut e.kind {
            r.spawned += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;
    use crate::entity::Occupant;

    fn test_world() -> World {
        let config = WorldConfig {
            world_width: 30,
            world_height: 30,
            rng_seed: Some(5),
            ..WorldConfig::default()
        };
        World::new(config).expect("config is valid")
    }

    #[test]
    fn farms_grow_to_full_and_stop() {
        let mut world = test_world();
        let farm = world
            .add_entity(Entity::farm(4, 4, &mut rand::rng()))
            .expect("cell free");
        for _ in 0..150 {
            tick_farm(&mut world, farm);
        }
        let growth = match &world.entity(farm).expect("farm alive").kind {
            EntityKind::Farm(f) => f.growth,
            _ => panic!("not a farm"),
        };
        assert_eq!(growth, 100);
    }

    #[test]
    fn starved_occupants_die_inside_the_house() {
        let mut world = test_world();
        let cfg = world.config().clone();
        let mut rng = rand::rng();
        let human_id = world
            .add_entity(Entity::human(10, 10, &cfg, &mut rng))
            .expect("cell free");
        let house_id = world
            .add_entity(Entity::house(12, 10, &cfg))
            .expect("cell free");
        world.store_entity(human_id);
        if let Some(h) = world.entity_mut(human_id).and_then(Entity::as_human_mut) {
            h.hunger = cfg.human_max_hunger + 1.0;
        }
        if let Some(state) = world.entity_mut(house_id).and_then(Entity::as_house_mut) {
            state.occupants.push(Occupant { id: human_id, rest: 0 });
        }
        tick_house(&mut world, house_id);
        assert!(world.entity(human_id).is_none());
        assert!(world
            .entity(house_id)
            .and_then(Entity::as_house)
            .is_some_and(|s| s.occupants.is_empty()));
    }

    #[test]
    fn reserves_stop_spawning_at_their_cap() {
        let mut world = test_world();
        let cfg = world.config().clone();
        let reserve = world
            .add_entity(Entity::nature_reserve(15, 15, ReserveSpecies::Cow, &cfg))
            .expect("cell free");
        if let Some(e) = world.entity_mut(reserve) {
            if let EntityKind::NatureReserve(r) = &mut e.kind {
                r.spawned = cfg.reserve_max_animals;
            }
        }
        for _ in 0..200 {
            tick_reserve(&mut world, reserve);
        }
        assert_eq!(world.count(EntityType::Cow), 0);
    }
}
