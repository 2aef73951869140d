//! Deterministic grid-ecosystem simulation: humans, wolves, and cows on a
//! discrete world of flora, water, and buildings.
//!
//! The [`World`] owns everything: the entity arena, the occupancy grid,
//! per-faction genetics, and the RNG. One call to [`World::tick`] advances
//! the simulation a step; a seeded configuration replays identically.

mod behavior;
pub mod config;
pub mod entity;
pub mod faction;
pub mod genetics;
pub mod thought;
pub mod world;

pub use config::{Settings, SettingsPatch, TraitBound, TraitLimits, WorldConfig};
pub use entity::{
    Action, AnimalState, Entity, EntityId, EntityKind, EntityType, HumanState, Occupant,
    ReserveSpecies,
};
pub use faction::Faction;
pub use genetics::Traits;
pub use thought::{Thought, ThoughtSystem};
pub use world::{LogCategory, NullHooks, World, WorldError, WorldHooks};
