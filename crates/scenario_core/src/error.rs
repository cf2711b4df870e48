use combat_core::CombatError;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("scenario {0:?} defines no units")]
    NoUnits(String),

    #[error("unit group {label:?} has a count of zero")]
    EmptyGroup { label: String },

    #[error("scenario needs at least two combatant teams, found {0}")]
    NotEnoughTeams(usize),

    #[error("tick length must be positive, got {0}")]
    InvalidTick(f32),

    #[error("unit group {label:?}: {source}")]
    Unit {
        label: String,
        #[source]
        source: CombatError,
    },

    #[error(transparent)]
    Combat(#[from] CombatError),
}
