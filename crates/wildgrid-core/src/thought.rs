//! Ambient thought bubbles: rule-triggered flavor text above humans.

use crate::entity::{Action, Entity, EntityKind, EntityType};
use crate::world::World;

/// Ticks a bubble stays on screen.
const THOUGHT_LIFE: u32 = 100;
/// Minimum spacing between bubble spawns, in ticks.
const SPAWN_COOLDOWN: u32 = 20;
/// At most this many bubbles at once.
const MAX_ACTIVE: usize = 5;

/// A condition-gated thought with a weight and a pool of lines.
pub struct ThoughtRule {
    pub id: &'static str,
    pub weight: u32,
    pub condition: fn(&World, &Entity) -> bool,
    pub templates: &'static [&'static str],
}

fn hungry(_: &World, e: &Entity) -> bool {
    e.as_human().is_some_and(|h| h.hunger > 80.0)
}

fn thirsty(_: &World, e: &Entity) -> bool {
    e.as_human().is_some_and(|h| h.thirst > 80.0)
}

fn fleeing(_: &World, e: &Entity) -> bool {
    e.as_human().is_some_and(|h| h.action == Action::Fleeing)
}

fn fighting(_: &World, e: &Entity) -> bool {
    e.as_human()
        .is_some_and(|h| matches!(h.action, Action::Fighting | Action::AttackingTotem | Action::Defending))
}

fn building(_: &World, e: &Entity) -> bool {
    e.as_human()
        .is_some_and(|h| matches!(h.action, Action::Building | Action::BuildingTotem))
}

fn crowded(w: &World, e: &Entity) -> bool {
    w.find_nearest_excluding(e.x, e.y, EntityType::Human, 5.0, e).is_some()
}

fn wolf_nearby(w: &World, e: &Entity) -> bool {
    w.find_nearest(e.x, e.y, EntityType::Wolf, 8.0).is_some()
}

fn tree_nearby(w: &World, e: &Entity) -> bool {
    w.find_nearest(e.x, e.y, EntityType::Tree, 3.0).is_some()
}

fn water_nearby(w: &World, e: &Entity) -> bool {
    w.find_nearest(e.x, e.y, EntityType::Water, 4.0).is_some()
}

fn house_nearby(w: &World, e: &Entity) -> bool {
    w.find_nearest(e.x, e.y, EntityType::House, 3.0).is_some()
}

fn farm_nearby(w: &World, e: &Entity) -> bool {
    w.find_nearest(e.x, e.y, EntityType::Farm, 3.0).is_some()
}

fn cow_nearby(w: &World, e: &Entity) -> bool {
    w.find_nearest(e.x, e.y, EntityType::Cow, 5.0).is_some()
}

fn lonely(w: &World, e: &Entity) -> bool {
    matches!(e.kind, EntityKind::Human(_))
        && w.find_nearest_excluding(e.x, e.y, EntityType::Human, 15.0, e).is_none()
}

fn always(_: &World, _: &Entity) -> bool {
    true
}

/// Rule table consulted for every candidate thinker. Weights bias the
/// pick toward urgent states without making calm ones impossible.
pub static THOUGHT_RULES: &[ThoughtRule] = &[
    ThoughtRule {
        id: "hungry",
        weight: 10,
        condition: hungry,
        templates: &["So hungry...", "I need food NOW", "My stomach is eating itself"],
    },
    ThoughtRule {
        id: "thirsty",
        weight: 10,
        condition: thirsty,
        templates: &["Water... water...", "So thirsty", "My throat is sand"],
    },
    ThoughtRule {
        id: "fleeing",
        weight: 8,
        condition: fleeing,
        templates: &["RUN!", "It's right behind me!", "Not today, wolf!"],
    },
    ThoughtRule {
        id: "fighting",
        weight: 8,
        condition: fighting,
        templates: &["For the tribe!", "You picked the wrong village", "To battle!"],
    },
    ThoughtRule {
        id: "building",
        weight: 5,
        condition: building,
        templates: &["Measure twice, cut once", "This will be a fine home", "Brick by brick"],
    },
    ThoughtRule {
        id: "crowded",
        weight: 4,
        condition: crowded,
        templates: &["Bit crowded here", "Personal space, please", "Everyone's here today"],
    },
    ThoughtRule {
        id: "wolf_nearby",
        weight: 6,
        condition: wolf_nearby,
        templates: &["Was that a growl?", "Stay calm... stay calm...", "Nice doggy?"],
    },
    ThoughtRule {
        id: "nature_lover",
        weight: 3,
        condition: tree_nearby,
        templates: &["The forest is beautiful", "I love the smell of pine", "Trees are friends"],
    },
    ThoughtRule {
        id: "water_nearby",
        weight: 4,
        condition: water_nearby,
        templates: &["Lovely view of the lake", "Maybe a quick swim?", "The water sparkles today"],
    },
    ThoughtRule {
        id: "house_nearby",
        weight: 3,
        condition: house_nearby,
        templates: &["Home sweet home", "Nothing beats a roof", "Cozy neighborhood"],
    },
    ThoughtRule {
        id: "farm_nearby",
        weight: 3,
        condition: farm_nearby,
        templates: &["The crops look good", "Harvest season soon", "Honest work"],
    },
    ThoughtRule {
        id: "cow_nearby",
        weight: 4,
        condition: cow_nearby,
        templates: &["Moo to you too", "That cow is judging me", "Dinner on four legs"],
    },
    ThoughtRule {
        id: "lonely",
        weight: 2,
        condition: lonely,
        templates: &["Is anyone out there?", "So quiet...", "I miss the village"],
    },
    ThoughtRule {
        id: "random",
        weight: 1,
        condition: always,
        templates: &[
            "What a day",
            "I wonder what's over the hill",
            "Did I leave the fire burning?",
            "Clouds look like sheep today",
        ],
    },
];

/// Rare meta lines picked instead of a rule-driven thought.
pub static EASTER_EGG_THOUGHTS: &[&str] = &[
    "Am I just a dot on a grid?",
    "I swear the world pauses sometimes",
    "Who keeps moving the trees?",
    "I had the strangest dream about a meteor",
    "The wolves are unionizing, I can feel it",
    "Somewhere, someone is watching us",
    "One day I'll build a house with TWO rooms",
    "What if the berries are farming US?",
    "The totem whispers at night",
    "I refuse to be tick number 4,000",
];

/// A live bubble anchored to a grid cell.
#[derive(Debug, Clone)]
pub struct Thought {
    pub x: i32,
    pub y: i32,
    pub text: &'static str,
    pub life: u32,
    pub max_life: u32,
    pub color: &'static str,
}

/// Active bubbles plus the global spawn cooldown.
#[derive(Default)]
pub struct ThoughtSystem {
    active: Vec<Thought>,
    cooldown: u32,
}

impl ThoughtSystem {
    /// Age bubbles, drop expired ones, and run down the spawn cooldown.
    pub fn tick(&mut self) {
        for t in &mut self.active {
            t.life = t.life.saturating_sub(1);
        }
        self.active.retain(|t| t.life > 0);
        self.cooldown = self.cooldown.saturating_sub(1);
    }

    /// Add a bubble unless the screen is already full.
    pub fn add(&mut self, x: i32, y: i32, text: &'static str, color: &'static str) {
        if self.active.len() >= MAX_ACTIVE {
            return;
        }
        self.active.push(Thought {
            x,
            y,
            text,
            life: THOUGHT_LIFE,
            max_life: THOUGHT_LIFE,
            color,
        });
        self.cooldown = SPAWN_COOLDOWN;
    }

    #[must_use]
    pub fn active(&self) -> &[Thought] {
        &self.active
    }

    #[must_use]
    pub fn cooldown(&self) -> u32 {
        self.cooldown
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bubbles_expire_after_their_life() {
        let mut sys = ThoughtSystem::default();
        sys.add(1, 1, "hi", "#fff");
        for _ in 0..THOUGHT_LIFE {
            sys.tick();
        }
        assert!(sys.active().is_empty());
    }

    #[test]
    fn active_bubbles_are_capped() {
        let mut sys = ThoughtSystem::default();
        for _ in 0..10 {
            sys.add(0, 0, "x", "#fff");
        }
        assert_eq!(sys.active().len(), MAX_ACTIVE);
    }

    #[test]
    fn add_resets_the_spawn_cooldown() {
        let mut sys = ThoughtSystem::default();
        sys.add(0, 0, "x", "#fff");
        assert_eq!(sys.cooldown(), SPAWN_COOLDOWN);
        sys.tick();
        assert_eq!(sys.cooldown(), SPAWN_COOLDOWN - 1);
    }
}
