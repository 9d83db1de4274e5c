use thiserror::Error;

use crate::core::types::{DepartureKind, IndividualId};

#[derive(Error, Debug)]
pub enum SimError {
    #[error("missing required config key: {0}")]
    MissingKey(&'static str),

    #[error("invalid value for config key {key}: {reason}")]
    InvalidKey { key: &'static str, reason: String },

    #[error("unknown {kind} implementation: {name:?}")]
    UnknownImplementation { kind: &'static str, name: String },

    #[error("invariant violated: {0}")]
    Invariant(String),

    #[error("hazard model produced invalid {kind:?} waiting time {value} for {individual:?}")]
    HazardSample {
        kind: DepartureKind,
        individual: IndividualId,
        value: f64,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, SimError>;
