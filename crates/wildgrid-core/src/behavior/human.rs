//! Human behavior: survival first, then stewardship, war, and industry.

use rand::Rng;
use tracing::{debug, info};

use crate::entity::{Action, Entity, EntityId, EntityKind, EntityType, HumanState};
use crate::faction::{self, Faction};
use crate::genetics::Traits;
use crate::world::{LogCategory, World};

/// Population-pressure adjustments to reproduction, war, and schisms.
struct DynamicRates {
    reproduction_chance: f32,
    war_chance: f32,
    split_chance: f32,
    /// How far above the target band the population sits, as a ratio.
    over_ratio: f32,
}

fn with_human<R>(world: &mut World, id: EntityId, f: impl FnOnce(&mut HumanState) -> R) -> Option<R> {
    world.entity_mut(id).and_then(Entity::as_human_mut).map(f)
}

fn set_action(world: &mut World, id: EntityId, action: Action) {
    with_human(world, id, |h| h.action = action);
}

pub(super) fn tick(world: &mut World, id: EntityId) {
    if super::age_and_check(world, id) {
        return;
    }
    let Some(human) = world.entity(id).and_then(Entity::as_human) else {
        return;
    };
    let faction = human.faction.clone();
    let traits = world.faction_traits(&faction);

    if handle_totems(world, id, &faction, &traits) {
        return;
    }

    accrue_needs(world, id, &traits);
    let rates = dynamic_rates(world);
    let poop_chance = world.config().human_poop_chance;
    super::try_poop(world, id, poop_chance);

    let cfg = world.config();
    let (max_hunger, max_thirst) = (cfg.human_max_hunger, cfg.human_max_thirst);
    let (low_hunger, low_thirst) = (cfg.human_low_hunger, cfg.human_low_thirst);
    let Some(human) = world.entity(id).and_then(Entity::as_human) else {
        return;
    };
    let (hunger, thirst, cooldown) = (human.hunger, human.thirst, human.reproduction_cooldown);
    if hunger >= max_hunger || thirst >= max_thirst {
        world.kill(id);
        return;
    }
    set_action(world, id, Action::Idle);

    if respond_to_threat(world, id, hunger, &traits) {
        return;
    }
    if thirst > low_thirst {
        seek_water(world, id, &traits);
        return;
    }
    if hunger > 50.0 {
        seek_food(world, id, hunger, &traits);
        return;
    }
    if world.count(EntityType::Human) < 10
        && cooldown == 0
        && hunger < 50.0
        && try_reproduce(world, id, &faction, hunger, &traits)
    {
        return;
    }
    // Stewardship outranks comfort eating.
    if ecosystem_maintenance(world, id, &faction, &traits) {
        return;
    }
    if hunger > low_hunger {
        seek_food(world, id, hunger, &traits);
        return;
    }
    if try_war(world, id, &faction, hunger, &traits, &rates) {
        return;
    }
    if try_split(world, id, &faction, &rates) {
        return;
    }
    if cooldown == 0
        && hunger < low_hunger
        && world.rng().random::<f32>() < rates.reproduction_chance
        && try_reproduce(world, id, &faction, hunger, &traits)
    {
        return;
    }
    if try_work(world, id, &faction, &traits) {
        return;
    }
    super::wander(world, id);
}

/// Friendly totems feed the faithful; enemy totems get torn down.
fn handle_totems(world: &mut World, id: EntityId, faction: &str, traits: &Traits) -> bool {
    let Some(e) = world.entity(id) else { return false };
    let (x, y) = (e.x, e.y);
    let action = e.as_human().map(|h| h.action);
    let name = e.as_human().map_or("", |h| h.name);
    let radius = world.config().totem_radius;
    let Some(totem_id) = world.find_nearest(x, y, EntityType::Totem, radius) else {
        return false;
    };
    let Some(totem) = world.entity(totem_id) else {
        return false;
    };
    let (tx, ty) = (totem.x, totem.y);
    let friendly = totem.faction_id() == Some(faction);
    if friendly {
        if world.rng().random::<f32>() < 0.1 {
            with_human(world, id, |h| h.hunger = (h.hunger - 1.0).max(0.0));
        }
        return false;
    }
    if !matches!(action, Some(Action::Idle) | Some(Action::AttackingTotem)) {
        return false;
    }
    set_action(world, id, Action::AttackingTotem);
    if super::adjacent(x, y, tx, ty) {
        world.kill(totem_id);
        info!(faction, name, x = tx, y = ty, "enemy totem torn down");
        let msg = format!("{name} tore down an enemy totem");
        world.log_event(&msg, LogCategory::Population);
    } else {
        move_towards(world, id, tx, ty, traits);
    }
    true
}

fn accrue_needs(world: &mut World, id: EntityId, traits: &Traits) {
    let hunger_gain = world.settings().human_hunger_rate * traits.hunger_rate;
    let thirst_gain = world.config().human_thirst_rate * traits.hunger_rate;
    with_human(world, id, |h| {
        h.hunger += hunger_gain;
        h.thirst += thirst_gain;
        h.reproduction_cooldown = h.reproduction_cooldown.saturating_sub(1);
    });
}

fn dynamic_rates(world: &World) -> DynamicRates {
    let pop = world.count(EntityType::Human);
    let cfg = world.config();
    let settings = world.settings();
    let mut rates = DynamicRates {
        reproduction_chance: 1.0,
        war_chance: settings.human_war_chance,
        split_chance: settings.human_split_chance,
        over_ratio: 0.0,
    };
    if pop > cfg.human_target_max {
        let over = (pop - cfg.human_target_max) as f32 / cfg.human_target_max as f32;
        rates.over_ratio = over;
        rates.reproduction_chance = (1.0 - over * 2.0).max(0.1);
        rates.war_chance = (settings.human_war_chance + over).min(1.0);
        rates.split_chance = (settings.human_split_chance + over * 0.5).min(1.0);
    } else if pop < cfg.human_target_min {
        rates.war_chance *= 0.5;
        rates.split_chance *= 0.5;
    }
    rates
}

/// Wolves nearby: shelter in a house, stand and fight, or just run.
fn respond_to_threat(world: &mut World, id: EntityId, hunger: f32, traits: &Traits) -> bool {
    let Some(e) = world.entity(id) else { return false };
    let (x, y) = (e.x, e.y);
    let Some(wolf_id) = world.find_nearest(x, y, EntityType::Wolf, 8.0 * traits.vision_radius)
    else {
        return false;
    };
    let capacity = world.config().house_capacity;
    let shelter = world.find_nearest_where(x, y, EntityType::House, 10.0 * traits.vision_radius, |e| {
        e.as_house().is_some_and(|h| h.occupants.len() < capacity)
    });
    if let Some(house_id) = shelter {
        set_action(world, id, Action::Fleeing);
        let Some(house) = world.entity(house_id) else {
            return true;
        };
        let (hx, hy) = (house.x, house.y);
        if super::adjacent(x, y, hx, hy) {
            world.store_entity(id);
            if let Some(state) = world.entity_mut(house_id).and_then(Entity::as_house_mut) {
                state.occupants.push(crate::entity::Occupant { id, rest: 0 });
            }
        } else {
            move_towards(world, id, hx, hy, traits);
        }
        return true;
    }
    let defense_chance = world.settings().human_defense_chance * traits.aggression;
    if hunger < 50.0 && world.rng().random::<f32>() < defense_chance {
        set_action(world, id, Action::Defending);
        let Some(wolf) = world.entity(wolf_id) else {
            return true;
        };
        let (wx, wy) = (wolf.x, wolf.y);
        if super::adjacent(x, y, wx, wy) {
            world.kill(wolf_id);
            with_human(world, id, |h| h.hunger += 10.0);
            debug!(x, y, "wolf slain in self-defense");
        } else {
            move_towards(world, id, wx, wy, traits);
        }
        return true;
    }
    set_action(world, id, Action::Fleeing);
    if let Some(wolf) = world.entity(wolf_id) {
        let (dx, dy) = ((x - wolf.x).signum(), (y - wolf.y).signum());
        world.move_entity(id, dx, dy);
    }
    true
}

fn seek_water(world: &mut World, id: EntityId, traits: &Traits) {
    let pending = with_human(world, id, |h| {
        if h.search_cooldowns.water > 0 {
            h.search_cooldowns.water -= 1;
            true
        } else {
            false
        }
    });
    if pending == Some(true) {
        super::wander(world, id);
        return;
    }
    set_action(world, id, Action::Drinking);
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    if let Some(water_id) = world.find_nearest(x, y, EntityType::Water, 50.0 * traits.vision_radius) {
        let Some(water) = world.entity(water_id) else {
            return;
        };
        let (wx, wy) = (water.x, water.y);
        if super::adjacent(x, y, wx, wy) {
            with_human(world, id, |h| h.thirst = 0.0);
        } else {
            move_towards(world, id, wx, wy, traits);
        }
        return;
    }
    let backoff = 10 + world.rng().random_range(0..10);
    with_human(world, id, |h| h.search_cooldowns.water = backoff);
    super::wander(world, id);
}

fn seek_food(world: &mut World, id: EntityId, hunger: f32, traits: &Traits) {
    let pending = with_human(world, id, |h| {
        if h.search_cooldowns.food > 0 {
            h.search_cooldowns.food -= 1;
            true
        } else {
            false
        }
    });
    if pending == Some(true) {
        super::wander(world, id);
        return;
    }
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let radius = 10.0 * traits.vision_radius;

    // Hunting is off the table while the herd is scarce.
    if world.count(EntityType::Cow) >= world.config().cows_min {
        if let Some(cow_id) = world.find_nearest(x, y, EntityType::Cow, radius) {
            set_action(world, id, Action::Hunting);
            let Some(cow) = world.entity(cow_id) else { return };
            let (cx, cy) = (cow.x, cow.y);
            if super::adjacent(x, y, cx, cy) {
                world.kill(cow_id);
                with_human(world, id, |h| h.hunger = 0.0);
            } else {
                move_towards(world, id, cx, cy, traits);
            }
            return;
        }
    }

    let bush = world.find_nearest_where(x, y, EntityType::BerryBush, radius, |e| {
        matches!(&e.kind, EntityKind::BerryBush(b) if b.regrow == 0)
    });
    let farm = world.find_nearest_where(x, y, EntityType::Farm, radius, |e| {
        matches!(&e.kind, EntityKind::Farm(f) if f.growth >= 100)
    });
    let target = match (bush, farm) {
        (Some(b), Some(f)) => {
            let bd = world
                .entity(b)
                .map_or(f32::MAX, |e| super::distance(x, y, e.x, e.y));
            let fd = world
                .entity(f)
                .map_or(f32::MAX, |e| super::distance(x, y, e.x, e.y));
            Some(if bd <= fd { b } else { f })
        }
        (Some(b), None) => Some(b),
        (None, Some(f)) => Some(f),
        (None, None) => None,
    };
    if let Some(target_id) = target {
        set_action(world, id, Action::Harvesting);
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
            with_human(world, id, |h| h.hunger = (hunger - gained).max(0.0));
        } else {
            move_towards(world, id, fx, fy, traits);
        }
        return;
    }
    let backoff = 10 + world.rng().random_range(0..10);
    with_human(world, id, |h| h.search_cooldowns.food = backoff);
    super::wander(world, id);
}

fn try_reproduce(world: &mut World, id: EntityId, faction: &str, hunger: f32, traits: &Traits) -> bool {
    let Some(e) = world.entity(id) else { return false };
    let (x, y) = (e.x, e.y);
    let me = e.clone();
    let mate = world.find_nearest_where(x, y, EntityType::Human, 5.0, |other| {
        (other.x != me.x || other.y != me.y) && other.faction_id() == Some(faction)
    });
    let Some(mate_id) = mate else { return false };
    let Some(mate) = world.entity(mate_id) else {
        return false;
    };
    let (mx, my) = (mate.x, mate.y);
    if !super::adjacent(x, y, mx, my) {
        move_towards(world, id, mx, my, traits);
        return true;
    }
    let color = me.color().unwrap_or("#ffffff");
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (bx, by) = (x + dx, y + dy);
            if !world.in_bounds(bx, by) || world.get_at(bx, by).is_some() {
                continue;
            }
            let birth_faction = Faction {
                name: faction.to_owned(),
                color,
            };
            let (cfg, rng) = world.cfg_and_rng();
            let baby = Entity::human_in_faction(bx, by, birth_faction, cfg, rng);
            world.queue_spawn(baby);
            let cost = world.settings().human_reproduction_cost;
            let cooldown = world.config().human_reproduction_cooldown;
            with_human(world, id, |h| {
                h.reproduction_cooldown = cooldown;
                h.hunger = hunger + cost;
            });
            return true;
        }
    }
    false
}

/// Keep the wider ecosystem in balance: cull booms, found reserves for
/// busts, and replant thinning forests.
fn ecosystem_maintenance(world: &mut World, id: EntityId, faction: &str, traits: &Traits) -> bool {
    let cfg = world.config();
    let (wolves_max, cows_max, wolves_min, cows_min, trees_min) = (
        cfg.wolves_max,
        cfg.cows_max,
        cfg.wolves_min,
        cfg.cows_min,
        cfg.trees_min,
    );
    let (wolves, cows, trees) = (
        world.count(EntityType::Wolf),
        world.count(EntityType::Cow),
        world.count(EntityType::Tree),
    );
    if wolves > wolves_max {
        return cull(world, id, EntityType::Wolf, traits);
    }
    if cows > cows_max {
        return cull(world, id, EntityType::Cow, traits);
    }
    if wolves < wolves_min {
        return conserve(world, id, crate::entity::ReserveSpecies::Wolf, faction, traits);
    }
    if cows < cows_min {
        return conserve(world, id, crate::entity::ReserveSpecies::Cow, faction, traits);
    }
    if trees < trees_min {
        return plant_tree(world, id);
    }
    false
}

fn cull(world: &mut World, id: EntityId, prey: EntityType, traits: &Traits) -> bool {
    let Some(e) = world.entity(id) else { return false };
    let (x, y) = (e.x, e.y);
    let Some(target_id) = world.find_nearest(x, y, prey, 20.0) else {
        return false;
    };
    set_action(world, id, Action::Culling);
    let Some(target) = world.entity(target_id) else {
        return true;
    };
    let (tx, ty) = (target.x, target.y);
    if super::adjacent(x, y, tx, ty) {
        world.kill(target_id);
        if prey == EntityType::Cow {
            with_human(world, id, |h| h.hunger = 0.0);
        }
    } else {
        move_towards(world, id, tx, ty, traits);
    }
    true
}

fn conserve(
    world: &mut World,
    id: EntityId,
    species: crate::entity::ReserveSpecies,
    faction: &str,
    traits: &Traits,
) -> bool {
    set_action(world, id, Action::Conserving);
    let Some(e) = world.entity(id) else { return false };
    let (x, y) = (e.x, e.y);
    let name = e.as_human().map_or("", |h| h.name);
    let target = e.as_human().and_then(|h| h.conservation_target);
    let target = match target {
        Some(spot) => Some(spot),
        None => {
            let spot = find_conservation_spot(world, x, y);
            with_human(world, id, |h| h.conservation_target = spot);
            spot
        }
    };
    let Some((tx, ty)) = target else { return false };
    if !super::adjacent(x, y, tx, ty) {
        move_towards(world, id, tx, ty, traits);
        return true;
    }
    with_human(world, id, |h| h.conservation_target = None);
    if world.get_at(tx, ty).is_some() {
        return false;
    }
    let cfg = world.config();
    let reserve = Entity::nature_reserve(tx, ty, species, cfg);
    world.queue_spawn(reserve);
    let label = species.entity_type().label();
    info!(faction, name, species = label, x = tx, y = ty, "nature reserve founded");
    let msg = format!("{name} founded a {label} reserve");
    world.log_event(&msg, LogCategory::Population);
    true
}

/// A reserve wants space: empty ground, away from houses, progressively
/// relaxing how far from the village it is willing to look.
fn find_conservation_spot(world: &mut World, x: i32, y: i32) -> Option<(i32, i32)> {
    let spacing = world.config().building_min_spacing;
    for (radius, clearance) in [(15, 8.0_f32), (20, 4.0), (30, 2.0)] {
        for _ in 0..20 {
            let dx = world.rng().random_range(-radius..=radius);
            let dy = world.rng().random_range(-radius..=radius);
            let (cx, cy) = (x + dx, y + dy);
            if !world.in_bounds(cx, cy) || world.get_at(cx, cy).is_some() {
                continue;
            }
            let keep_clear = clearance.max(spacing);
            if world
                .find_nearest(cx, cy, EntityType::House, keep_clear)
                .is_some()
            {
                continue;
            }
            return Some((cx, cy));
        }
    }
    None
}

fn plant_tree(world: &mut World, id: EntityId) -> bool {
    let Some(e) = world.entity(id) else { return false };
    let (x, y) = (e.x, e.y);
    for dy in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let (px, py) = (x + dx, y + dy);
            if !world.in_bounds(px, py) || world.get_at(px, py).is_some() {
                continue;
            }
            set_action(world, id, Action::Planting);
            let (cfg, rng) = world.cfg_and_rng();
            let tree = Entity::tree(px, py, cfg, rng);
            world.queue_spawn(tree);
            return true;
        }
    }
    false
}

fn try_war(
    world: &mut World,
    id: EntityId,
    faction: &str,
    hunger: f32,
    traits: &Traits,
    rates: &DynamicRates,
) -> bool {
    let hunger_ceiling = if rates.over_ratio > 2.0 { 60.0 } else { 40.0 };
    if hunger > hunger_ceiling {
        return false;
    }
    if world.rng().random::<f32>() >= rates.war_chance * traits.aggression {
        return false;
    }
    let Some(e) = world.entity(id) else { return false };
    let (x, y) = (e.x, e.y);
    let radius = (8.0 + rates.over_ratio * 10.0) * traits.vision_radius;
    let enemy = world.find_nearest_where(x, y, EntityType::Human, radius, |other| {
        other.faction_id().is_some_and(|f| f != faction)
    });
    let enemy_totem = world.find_nearest_where(x, y, EntityType::Totem, radius, |other| {
        other.faction_id().is_some_and(|f| f != faction)
    });
    let target = match (enemy, enemy_totem) {
        (Some(a), Some(b)) => {
            let ad = world
                .entity(a)
                .map_or(f32::MAX, |e| super::distance(x, y, e.x, e.y));
            let bd = world
                .entity(b)
                .map_or(f32::MAX, |e| super::distance(x, y, e.x, e.y));
            Some(if ad <= bd { a } else { b })
        }
        (Some(a), None) => Some(a),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    };
    let Some(target_id) = target else { return false };
    set_action(world, id, Action::Fighting);
    let Some(target) = world.entity(target_id) else {
        return true;
    };
    let (tx, ty) = (target.x, target.y);
    let is_totem = target.entity_type() == EntityType::Totem;
    if super::adjacent(x, y, tx, ty) {
        world.kill(target_id);
        let exertion = if is_totem { 10.0 } else { 20.0 };
        with_human(world, id, |h| h.hunger += exertion);
        debug!(faction, x = tx, y = ty, totem = is_totem, "war casualty");
    } else {
        move_towards(world, id, tx, ty, traits);
    }
    true
}

/// A knot of same-faction neighbors may splinter into a new tribe.
fn try_split(world: &mut World, id: EntityId, faction: &str, rates: &DynamicRates) -> bool {
    if world.rng().random::<f32>() >= rates.split_chance {
        return false;
    }
    let Some(e) = world.entity(id) else { return false };
    let (x, y) = (e.x, e.y);
    let mut followers = Vec::new();
    for dy in -2..=2_i32 {
        for dx in -2..=2_i32 {
            if dx == 0 && dy == 0 {
                continue;
            }
            let Some(other_id) = world.get_at(x + dx, y + dy) else {
                continue;
            };
            if world
                .entity(other_id)
                .is_some_and(|o| o.faction_id() == Some(faction))
            {
                followers.push(other_id);
            }
        }
    }
    let pressure_relief = (rates.over_ratio * 2.0).floor() as u32;
    let threshold = world
        .config()
        .human_split_threshold
        .saturating_sub(pressure_relief)
        .max(2);
    if (followers.len() as u32) < threshold {
        return false;
    }
    let splinter = faction::random_faction(world.rng());
    world.register_faction(&splinter.name, faction);
    for member in followers.iter().copied().chain(std::iter::once(id)) {
        if let Some(h) = world.entity_mut(member).and_then(Entity::as_human_mut) {
            h.faction = splinter.name.clone();
            h.color = splinter.color;
        }
    }
    info!(
        parent = faction,
        splinter = %splinter.name,
        members = followers.len() + 1,
        "faction splintered"
    );
    let msg = format!("{} splintered away from {faction}", splinter.name);
    world.log_event(&msg, LogCategory::Population);
    true
}

/// Industry: raise totems, site and build houses, or gather wood.
fn try_work(world: &mut World, id: EntityId, faction: &str, traits: &Traits) -> bool {
    let Some(e) = world.entity(id) else { return false };
    let (x, y) = (e.x, e.y);
    let Some(human) = e.as_human() else { return false };
    let wood = human.wood;
    let house_target = human.house_target;
    let color = human.color;
    let name = human.name;
    let cfg = world.config();
    let totem_cost = cfg.totem_cost;
    let totem_reach = cfg.totem_radius * 1.5;

    let friendly_totem = world
        .find_nearest_where(x, y, EntityType::Totem, totem_reach, |t| {
            t.faction_id() == Some(faction)
        })
        .is_some();

    if wood >= totem_cost && !friendly_totem {
        set_action(world, id, Action::BuildingTotem);
        let (dx, dy) = super::random_step(world.rng());
        let (tx, ty) = (x + dx, y + dy);
        if world.in_bounds(tx, ty) && world.get_at(tx, ty).is_none() {
            let totem = Entity::totem(tx, ty, faction.to_owned(), color, world.config());
            world.queue_spawn(totem);
            with_human(world, id, |h| h.wood -= totem_cost);
            info!(faction, name, x = tx, y = ty, "totem raised");
            let msg = format!("{name} raised a totem for {faction}");
            world.log_event(&msg, LogCategory::Population);
            return true;
        }
    }

    // Save wood for the totem when the faction has none nearby.
    if wood >= 5 && (friendly_totem || wood >= totem_cost) {
        if build_house(world, id, x, y, house_target, traits) {
            return true;
        }
    }

    set_action(world, id, Action::Gathering);
    if let Some(tree_id) = world.find_nearest(x, y, EntityType::Tree, 20.0 * traits.vision_radius) {
        let Some(tree) = world.entity(tree_id) else {
            return true;
        };
        let (tx, ty) = (tree.x, tree.y);
        if super::adjacent(x, y, tx, ty) {
            world.kill(tree_id);
            with_human(world, id, |h| h.wood += 5);
        } else {
            move_towards(world, id, tx, ty, traits);
        }
        return true;
    }
    false
}

fn build_house(
    world: &mut World,
    id: EntityId,
    x: i32,
    y: i32,
    house_target: Option<(i32, i32)>,
    traits: &Traits,
) -> bool {
    set_action(world, id, Action::Building);
    let mut target = house_target;
    if let Some((tx, ty)) = target {
        if world.get_at(tx, ty).is_some() {
            with_human(world, id, |h| h.house_target = None);
            target = None;
        }
    }
    if target.is_none() {
        let waiting = with_human(world, id, |h| {
            if h.search_cooldowns.house_location > 0 {
                h.search_cooldowns.house_location -= 1;
                true
            } else {
                false
            }
        });
        if waiting == Some(true) {
            return false;
        }
        target = find_ideal_house_location(world, x, y);
        if target.is_none() {
            let backoff = 20 + world.rng().random_range(0..20);
            with_human(world, id, |h| h.search_cooldowns.house_location = backoff);
            return false;
        }
        with_human(world, id, |h| h.house_target = target);
    }
    let Some((tx, ty)) = target else { return false };
    if !super::adjacent(x, y, tx, ty) {
        move_towards(world, id, tx, ty, traits);
        return true;
    }
    if world.get_at(tx, ty).is_some() {
        with_human(world, id, |h| h.house_target = None);
        return false;
    }
    let house = Entity::house(tx, ty, world.config());
    world.queue_spawn(house);
    with_human(world, id, |h| {
        h.wood -= 5;
        h.house_target = None;
    });
    true
}

/// Score nearby cells for a house: close to water and food, near other
/// humans, and not crammed against an existing house.
fn find_ideal_house_location(world: &mut World, x: i32, y: i32) -> Option<(i32, i32)> {
    let spacing = world.config().building_min_spacing;
    let mut best: Option<((i32, i32), f32)> = None;
    for _ in 0..50 {
        let dx = world.rng().random_range(-10..=10);
        let dy = world.rng().random_range(-10..=10);
        let (cx, cy) = (x + dx, y + dy);
        if !world.in_bounds(cx, cy) || world.get_at(cx, cy).is_some() {
            continue;
        }
        let mut score = 0.0_f32;
        if let Some(d) = nearest_distance(world, cx, cy, EntityType::Water, 15.0) {
            score += (15.0 - d) * 2.0;
        }
        let food = nearest_distance(world, cx, cy, EntityType::BerryBush, 10.0)
            .or_else(|| nearest_distance(world, cx, cy, EntityType::Farm, 10.0));
        if let Some(d) = food {
            score += 10.0 - d;
        }
        if let Some(d) = nearest_distance(world, cx, cy, EntityType::Human, 10.0) {
            score += (10.0 - d) * 0.5;
        }
        if let Some(d) = nearest_distance(world, cx, cy, EntityType::House, 5.0) {
            if d < spacing {
                score -= 100.0;
            } else {
                score += 20.0;
            }
        }
        if best.is_none_or(|(_, s)| score > s) {
            best = Some(((cx, cy), score));
        }
    }
    best.filter(|(_, score)| *score > 0.0).map(|(spot, _)| spot)
}

fn nearest_distance(world: &World, x: i32, y: i32, ty: EntityType, radius: f32) -> Option<f32> {
    let id = world.find_nearest(x, y, ty, radius)?;
    let e = world.entity(id)?;
    Some(super::distance(x, y, e.x, e.y))
}

/// Fast movers and worn paths both let a human cover two cells a tick.
pub(super) fn move_towards(world: &mut World, id: EntityId, tx: i32, ty: i32, traits: &Traits) {
    let Some(e) = world.entity(id) else { return };
    let (x, y) = (e.x, e.y);
    let mut speed_chance = traits.move_speed - 1.0;
    if world.terrain_at(x, y) > 0.5 {
        speed_chance += 0.5;
    }
    let step = if speed_chance > 0.0 && world.rng().random::<f32>() < speed_chance {
        2
    } else {
        1
    };
    let dx = (tx - x).signum() * step;
    let dy = (ty - y).signum() * step;
    world.move_entity(id, dx, dy);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WorldConfig;

    #[test]
    fn a_peckish_human_plants_before_snacking() {
        let config = WorldConfig {
            world_width: 30,
            world_height: 30,
            rng_seed: Some(11),
            wolves_min: 0,
            cows_min: 0,
            human_poop_chance: 0.0,
            ..WorldConfig::default()
        };
        let mut world = World::new(config).expect("config is valid");
        let cfg = world.config().clone();
        let mut rng = rand::rng();
        let human = world
            .add_entity(Entity::human(10, 10, &cfg, &mut rng))
            .expect("cell free");
        let bush = world
            .add_entity(Entity::berry_bush(11, 10, &cfg, &mut rng))
            .expect("cell free");
        // Enough animals on the map that neither herd counts as dying out.
        for i in 0..10 {
            world
                .add_entity(Entity::wolf(5 + i, 25, None, &cfg, &mut rng))
                .expect("cell free");
            world
                .add_entity(Entity::cow(5 + i, 27, None, &cfg, &mut rng))
                .expect("cell free");
        }
        if let Some(h) = world.entity_mut(human).and_then(Entity::as_human_mut) {
            h.hunger = 30.0;
            h.thirst = 0.0;
            h.reproduction_cooldown = cfg.human_reproduction_cooldown;
        }

        tick(&mut world, human);

        // Mildly hungry but not starving: tree planting wins over the
        // ripe bush next door.
        let state = world.entity(human).and_then(Entity::as_human);
        assert_eq!(state.map(|h| h.action), Some(Action::Planting));
        assert!(state.is_some_and(|h| h.hunger >= 30.0));
        assert!(world.entity(bush).is_some());
    }

    #[test]
    fn totem_raids_are_logged_under_the_raider_name() {
        use std::sync::{Arc, Mutex};

        use crate::world::WorldHooks;

        struct CaptureHooks(Arc<Mutex<Vec<String>>>);
        impl WorldHooks for CaptureHooks {
            fn on_log_event(&mut self, message: &str, _category: LogCategory) {
                if let Ok(mut lines) = self.0.lock() {
                    lines.push(message.to_owned());
                }
            }
        }

        let config = WorldConfig {
            world_width: 30,
            world_height: 30,
            rng_seed: Some(12),
            ..WorldConfig::default()
        };
        let lines = Arc::new(Mutex::new(Vec::new()));
        let mut world = World::with_hooks(config, Box::new(CaptureHooks(Arc::clone(&lines))))
            .expect("config is valid");
        let cfg = world.config().clone();
        let mut rng = rand::rng();
        let human = world
            .add_entity(Entity::human(10, 10, &cfg, &mut rng))
            .expect("cell free");
        let totem = Entity::totem(11, 10, "RIVALS_1".to_owned(), "#8b5cf6", &cfg);
        world.add_entity(totem).expect("cell free");
        let (name, faction) = world
            .entity(human)
            .and_then(Entity::as_human)
            .map(|h| (h.name, h.faction.clone()))
            .expect("human alive");
        let traits = world.faction_traits(&faction);

        assert!(handle_totems(&mut world, human, &faction, &traits));

        let lines = lines.lock().expect("lock is clean");
        assert!(lines.iter().any(|l| l.contains(name)));
    }
}
