//! Aura reconciliation engine for 2D battle maps.
//!
//! Given an event (a token moved, a scene became active, combat changed),
//! works out which aura effects every token should carry and issues the
//! minimal set of create/delete operations against the host's persistence.

pub mod definitions;
pub mod engine;
pub mod error;
pub mod host;
pub mod ids;
pub mod scene;

pub use definitions::{AuraDefinition, EffectChange, EffectDefinition};
pub use engine::{AuraEngine, PassReport, SkipReason, Trigger};
pub use error::{ConfigError, DefinitionError, EngineError, RuleError, StoreError};
pub use host::{AppliedEffectRecord, AuraHost, GrantedEffect};
pub use ids::{ActorId, EffectRecordId, EntityId, SceneId};
pub use scene::{AuraEntry, AuraSource, Scene, Token};
