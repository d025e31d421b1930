use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub enum GradeError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad grade point, goal out of range, etc.).
    ConfigValidation(String),
    /// A what-if scenario cannot run with the current config.
    ScenarioUnavailable(String),
}

/// Why a goal projection has no value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoalUndefined {
    MissingRemainingCredits,
    NonPositiveRemainingCredits,
    NonFiniteInput,
}

impl fmt::Display for GoalUndefined {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingRemainingCredits => {
                write!(f, "neither remaining_credits nor total_required_credits is set")
            }
            Self::NonPositiveRemainingCredits => {
                write!(f, "remaining credits must be greater than zero")
            }
            Self::NonFiniteInput => write!(f, "goal inputs must be finite numbers"),
        }
    }
}

impl fmt::Display for GradeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::ScenarioUnavailable(msg) => write!(f, "scenario unavailable: {msg}"),
        }
    }
}

impl std::error::Error for GradeError {}
