//! Tunable gameplay policy and simulation parameters.
//!
//! Both resources read overrides from the environment so sandboxes and
//! regression runs can be tweaked without recompiling.

use std::time::Duration;

use bevy::prelude::Resource;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CombatError;

const DEFAULT_SEED: u64 = 42;
const DEFAULT_FIXED_DELTA: f64 = 1.0 / 30.0;
const DEFAULT_MAX_ATTACKERS: usize = 3;
const DEFAULT_DEATH_REMOVAL_DELAY: f32 = 2.0;
const DEFAULT_STUCK_ABORT: f32 = 2.0;
const DEFAULT_SENSING_INTERVAL: f32 = 0.2;
const DEFAULT_SIGHT_RADIUS: f32 = 2200.0;
const DEFAULT_PROJECTILE_LIFESPAN: f32 = 3.0;
const DEFAULT_PROJECTILE_RADIUS: f32 = 20.0;

#[derive(Resource, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// How many agents may claim the same target. `None` lifts the cap.
    pub max_attackers: Option<usize>,
    /// Length of the death sequence before a dying agent is removed.
    pub death_removal_delay_secs: f32,
    /// A move decision is abandoned after standing still this long.
    pub stuck_abort_secs: f32,
    pub sensing_interval_secs: f32,
    pub sight_radius: f32,
    pub projectile_lifespan_secs: f32,
    pub projectile_radius: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            max_attackers: Some(DEFAULT_MAX_ATTACKERS),
            death_removal_delay_secs: DEFAULT_DEATH_REMOVAL_DELAY,
            stuck_abort_secs: DEFAULT_STUCK_ABORT,
            sensing_interval_secs: DEFAULT_SENSING_INTERVAL,
            sight_radius: DEFAULT_SIGHT_RADIUS,
            projectile_lifespan_secs: DEFAULT_PROJECTILE_LIFESPAN,
            projectile_radius: DEFAULT_PROJECTILE_RADIUS,
        }
    }
}

impl CombatTuning {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        let max_attackers = match std::env::var("COMBAT_MAX_ATTACKERS") {
            Ok(val) if val.eq_ignore_ascii_case("none") => None,
            Ok(val) => val.parse().ok().or(defaults.max_attackers),
            Err(_) => defaults.max_attackers,
        };
        let tuning = Self {
            max_attackers,
            death_removal_delay_secs: env_f32(
                "COMBAT_DEATH_DELAY",
                defaults.death_removal_delay_secs,
            ),
            stuck_abort_secs: env_f32("COMBAT_STUCK_ABORT", defaults.stuck_abort_secs),
            sensing_interval_secs: env_f32(
                "COMBAT_SENSING_INTERVAL",
                defaults.sensing_interval_secs,
            ),
            sight_radius: env_f32("COMBAT_SIGHT_RADIUS", defaults.sight_radius),
            ..defaults
        };
        tuning.or_defaults()
    }

    /// Keeps `self` if it validates, otherwise logs why and falls back to
    /// the defaults.
    pub fn or_defaults(self) -> Self {
        match self.validate() {
            Ok(()) => self,
            Err(err) => {
                warn!(target: "combat.config", %err, "invalid tuning, using defaults");
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), CombatError> {
        for (field, value) in [
            ("death_removal_delay_secs", self.death_removal_delay_secs),
            ("stuck_abort_secs", self.stuck_abort_secs),
            ("sensing_interval_secs", self.sensing_interval_secs),
            ("sight_radius", self.sight_radius),
            ("projectile_lifespan_secs", self.projectile_lifespan_secs),
            ("projectile_radius", self.projectile_radius),
        ] {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CombatError::InvalidTuning { field, value });
            }
        }
        Ok(())
    }

    pub fn death_removal_delay(&self) -> Duration {
        secs(self.death_removal_delay_secs)
    }

    pub fn stuck_abort(&self) -> Duration {
        secs(self.stuck_abort_secs)
    }

    pub fn sensing_interval(&self) -> Duration {
        secs(self.sensing_interval_secs)
    }

    pub fn projectile_lifespan(&self) -> Duration {
        secs(self.projectile_lifespan_secs)
    }
}

#[derive(Resource, Clone, Debug)]
pub struct SimulationParams {
    pub seed: u64,
    pub fixed_delta: f64,
}

impl SimulationParams {
    pub fn from_env() -> Self {
        let seed = std::env::var("SIMULATION_SEED")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(DEFAULT_SEED);
        let fixed_delta = std::env::var("SIMULATION_FIXED_DT")
            .ok()
            .and_then(|val| val.parse().ok())
            .unwrap_or(DEFAULT_FIXED_DELTA);
        Self { seed, fixed_delta }
    }

    pub fn from_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }
}

impl Default for SimulationParams {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            fixed_delta: DEFAULT_FIXED_DELTA,
        }
    }
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse().ok())
        .unwrap_or(default)
}

// Negative or NaN values collapse to zero.
pub(crate) fn secs(value: f32) -> Duration {
    Duration::try_from_secs_f32(value).unwrap_or_default()
}
