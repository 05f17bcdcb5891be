//! Error types for the aura engine.

use std::path::PathBuf;

use thiserror::Error;

use crate::ids::{ActorId, EffectRecordId, EntityId};

/// Errors that abort an evaluation pass
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("token {0} is not on the evaluated scene")]
    UnknownToken(EntityId),

    #[error("token {0} has no actor to hold effects")]
    NoActor(EntityId),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),
}

/// Failures reported by the persistence collaborator
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("effect {effect} not found on actor {actor}")]
    EffectNotFound {
        actor: ActorId,
        effect: EffectRecordId,
    },

    #[error("persistence backend failed: {0}")]
    Backend(String),
}

/// Problems in an authored effect or aura definition
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DefinitionError {
    #[error("effect '{0}' has an empty origin")]
    MissingOrigin(String),

    #[error("macro value {value:?} uses ambiguous placeholder at byte {offset}")]
    AmbiguousPlaceholder { value: String, offset: usize },
}

/// Rule data on an actor that could not be read
#[derive(Debug, Error)]
pub enum RuleError {
    #[error("actor {actor} has an unreadable {field}")]
    Unreadable { actor: ActorId, field: &'static str },
}

/// Errors that can occur while loading settings or definition files
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path:?}: {source}")]
    IoError {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Parse error in {path:?}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Serialize error for {path:?}: {source}")]
    SerializeError {
        path: PathBuf,
        source: toml::ser::Error,
    },

    #[error("Invalid definition in {path:?}: {source}")]
    InvalidDefinition {
        path: PathBuf,
        source: DefinitionError,
    },

    #[error("Failed to load user settings: {0}")]
    Settings(#[from] confy::ConfyError),
}
