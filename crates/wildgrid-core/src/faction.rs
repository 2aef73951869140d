//! Faction identity: founding tribes, splinter names, and human names.

use rand::Rng;

/// A faction identity handed to newly created humans and totems.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Faction {
    pub name: String,
    pub color: &'static str,
}

const RED_COLOR: &str = "#ef4444";
const BLUE_COLOR: &str = "#3b82f6";

/// Colors cycled through when new factions splinter off.
const SPLINTER_COLORS: [&str; 6] = [
    "#8b5cf6", "#ec4899", "#f97316", "#14b8a6", "#84cc16", "#6366f1",
];

const SPLINTER_NAMES: [&str; 6] = ["PURPLE", "PINK", "ORANGE", "TEAL", "LIME", "INDIGO"];

/// Given names for humans; purely cosmetic, used in logs and thoughts.
pub const HUMAN_NAMES: [&str; 25] = [
    "Alice", "Bram", "Cleo", "Dara", "Edwin", "Fen", "Greta", "Hugo", "Iris", "Joss", "Kira",
    "Lior", "Mara", "Nils", "Opal", "Piet", "Quinn", "Rhea", "Sven", "Tova", "Ulric", "Vera",
    "Wren", "Yara", "Zane",
];

#[must_use]
pub fn founder_red() -> Faction {
    Faction {
        name: "RED".to_owned(),
        color: RED_COLOR,
    }
}

#[must_use]
pub fn founder_blue() -> Faction {
    Faction {
        name: "BLUE".to_owned(),
        color: BLUE_COLOR,
    }
}

/// A fresh splinter faction with a randomized suffix so repeated schisms
/// in the same palette stay distinguishable.
pub fn random_faction(rng: &mut impl Rng) -> Faction {
    let idx = rng.random_range(0..SPLINTER_NAMES.len());
    let suffix: u32 = rng.random_range(0..1_000);
    Faction {
        name: format!("{}_{suffix}", SPLINTER_NAMES[idx]),
        color: SPLINTER_COLORS[idx],
    }
}

pub fn random_name(rng: &mut impl Rng) -> &'static str {
    HUMAN_NAMES[rng.random_range(0..HUMAN_NAMES.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::SmallRng, SeedableRng};

    #[test]
    fn splinter_name_matches_its_color_slot() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..20 {
            let f = random_faction(&mut rng);
            let base = f.name.split('_').next().unwrap();
            let slot = SPLINTER_NAMES.iter().position(|n| *n == base).unwrap();
            assert_eq!(f.color, SPLINTER_COLORS[slot]);
        }
    }

    #[test]
    fn founders_are_distinct() {
        assert_ne!(founder_red().name, founder_blue().name);
        assert_ne!(founder_red().color, founder_blue().color);
    }
}
