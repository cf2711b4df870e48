//! Combat decision logic for RTS skirmishes.
//!
//! Agents live in a [`CombatWorld`] arena and are addressed by
//! generation-checked [`AgentId`] handles. On top of it sit the target
//! claim registry ([`claims`]), damage resolution with penetration budgets
//! ([`damage`]) and the death state machine ([`death`]). The remaining
//! modules are the decision layer that exercises them, and
//! [`CombatPlugin`] drives the whole thing from Bevy's fixed timestep.

pub mod agent;
pub mod buffs;
pub mod claims;
pub mod config;
pub mod damage;
pub mod death;
pub mod error;
pub mod perception;
pub mod plugin;
pub mod projectile;
pub mod rng;
pub mod skirmish;
pub mod targeting;
pub mod team;
pub mod watchdog;
pub mod world;

pub use agent::{Agent, AgentId, AgentSpec, AgentStats, LifeState};
pub use buffs::{Buff, StatModifiers};
pub use claims::ClaimPolicy;
pub use config::{CombatTuning, SimulationParams};
pub use damage::{
    ArmorDamageModel, DamageDisposition, DamageEvent, DamageMode, DamageModel, DamageOutcome,
    Impact, RawDamageModel,
};
pub use death::DeathNotice;
pub use error::CombatError;
pub use perception::{Perception, SightPerception};
pub use plugin::{AgentDied, AgentRemoved, CombatPlugin, DamageRequest, SkirmishState};
pub use projectile::{Projectile, ProjectileFate};
pub use rng::SimulationRng;
pub use skirmish::{Skirmish, SkirmishStats, StepReport, Weapon};
pub use team::{accepts_damage_from, on_enemy_team, Affiliated, TeamId};
pub use watchdog::{MoveVerdict, MoveWatchdog};
pub use world::{CombatWorld, TickReport};
