//! Errors raised while setting up combat state.
//!
//! Runtime combat operations (claims, damage, death) never fail; they
//! degrade to "no effect this tick". Only construction can be rejected.

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CombatError {
    #[error("invalid agent stat {field}: {value}")]
    InvalidStats { field: &'static str, value: f32 },

    #[error("invalid tuning value {field}: {value}")]
    InvalidTuning { field: &'static str, value: f32 },
}
