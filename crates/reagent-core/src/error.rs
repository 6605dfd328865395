//! Error types for reagent-core

use thiserror::Error;

/// Construction-time validation failures
///
/// Every variant is fatal: it is raised while parameters are declared,
/// reactors are attached, or reactions are assembled, and it aborts startup
/// before any event is processed.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("parameter `{name}` = {value} is outside [{min}, {max}]")]
    OutOfBounds {
        name: String,
        value: String,
        min: String,
        max: String,
    },

    #[error("parameter `{name}` has inverted bounds: min {min} > max {max}")]
    InvalidBounds {
        name: String,
        min: String,
        max: String,
    },

    #[error("parameter `{name}` is already declared on `{owner}`")]
    DuplicateParameter { owner: String, name: String },

    #[error("reaction `{label}` is already registered on `{reactor}`")]
    DuplicateReaction { reactor: String, label: String },

    #[error("a reactor named `{name}` already exists under `{parent}`")]
    DuplicateReactor { parent: String, name: String },

    #[error("timer `{name}` is already declared on `{reactor}`")]
    DuplicateTimer { reactor: String, name: String },

    #[error("output `{name}` is already declared on `{reactor}`")]
    DuplicateOutput { reactor: String, name: String },

    #[error("reaction `{label}` on `{reactor}` references unknown trigger `{trigger}`")]
    UnknownTrigger {
        reactor: String,
        label: String,
        trigger: String,
    },

    #[error("reaction `{label}` on `{reactor}` references unknown output `{output}`")]
    UnknownOutput {
        reactor: String,
        label: String,
        output: String,
    },

    #[error("reaction `{label}` on `{reactor}` has no triggers")]
    NoTriggers { reactor: String, label: String },

    #[error("timer `{name}` on `{reactor}` has a zero period")]
    ZeroPeriod { reactor: String, name: String },

    #[error("reactor name must be non-empty and free of `.`, `[` and `]`: {name:?}")]
    InvalidName { name: String },
}

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    #[error("validation error: {0}")]
    Validation(#[from] ValidationError),

    #[error("Parameter not found: {0}")]
    ParameterNotFound(String),

    #[error("Type error: parameter `{name}` is {got}, expected {expected}")]
    ParameterTypeMismatch {
        name: String,
        expected: &'static str,
        got: &'static str,
    },

    #[error("Reactor not found: {0}")]
    ReactorNotFound(String),

    #[error("Invalid operation: {0}")]
    InvalidPhase(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Reactor limit reached: cannot attach `{0}`")]
    TooManyReactors(String),

    #[error("reaction `{reaction}` failed: {source}")]
    ReactionFailed {
        reaction: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

impl Error {
    /// The validation error behind this error, if any
    pub fn as_validation(&self) -> Option<&ValidationError> {
        match self {
            Error::Validation(err) => Some(err),
            _ => None,
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
