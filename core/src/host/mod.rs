//! Collaborators the engine consumes from its host platform.
//!
//! Geometry, rules evaluation, session state and persistence all live
//! outside the engine. Each concern is a trait; [`AuraHost`] groups them so
//! the engine can take a single generic host.

mod records;

pub use records::{AppliedEffectRecord, GrantedEffect};

use async_trait::async_trait;
use auras_types::{AuraTargets, Disposition};

use crate::definitions::AuraDefinition;
use crate::error::{RuleError, StoreError};
use crate::ids::{ActorId, EffectRecordId, EntityId, SceneId};
use crate::scene::{Actor, AuraSource, Reach, Template, Token};

/// Actor types that aggregate other actors and never receive auras
const CONTAINER_ACTOR_TYPES: &[&str] = &["vehicle", "group"];

/// Geometry queries against the live map
pub trait SpatialOracle {
    type Shape;

    /// Shape projected by a token or drawing at the given radius
    fn shape_of(&self, source: AuraSource<'_>, radius: f64) -> Self::Shape;

    /// Distance to `target` if it lies inside `shape`, honoring walls and height
    fn contains(
        &self,
        target: &Token,
        source: AuraSource<'_>,
        reach: Reach,
        shape: &Self::Shape,
    ) -> Option<f64>;

    /// Distance to `target` if it lies inside the placed template
    fn contains_template(&self, template: &Template, target: &Token, walls_block: bool)
    -> Option<f64>;
}

/// Who is running the session and what the table is looking at
pub trait Session {
    /// Only the authoritative session mutates effects
    fn is_authority(&self) -> bool;

    fn viewed_scene(&self) -> Option<SceneId>;

    fn combat_started(&self, scene: &SceneId) -> bool;

    /// Token whose turn it is in the active encounter
    fn active_combatant(&self) -> Option<EntityId>;

    /// Show a message to the acting user
    fn notify_warning(&self, message: &str);

    /// Whether granted effects can expire on special-duration hints
    fn supports_special_durations(&self) -> bool {
        false
    }
}

/// Roll-string and custom-check evaluation
pub trait ExpressionEvaluator {
    /// Evaluate a radius expression against the source entity
    fn evaluate_radius(&self, expression: &str, source: AuraSource<'_>) -> f64;

    /// Evaluate a custom boolean check against target and source
    fn custom_check(&self, expression: &str, target: &Token, source: AuraSource<'_>) -> bool;
}

/// Game-system rules consulted by the filter chain
pub trait GameRules {
    fn disposition_admits(
        &self,
        targets: AuraTargets,
        source: Disposition,
        target: Disposition,
    ) -> bool {
        targets.admits(source, target)
    }

    fn receives_auras(&self, actor: &Actor) -> bool {
        !CONTAINER_ACTOR_TYPES.contains(&actor.kind.to_lowercase().as_str())
    }

    /// `types` is the lowercased, comma-separated filter from the aura
    fn matches_actor_type(&self, _target: &Token, actor: &Actor, types: &str) -> bool {
        let kind = actor.kind.to_lowercase();
        types.split(',').map(str::trim).any(|t| t == kind)
    }

    /// System-specific gate (e.g. wildcard/extra rules)
    fn system_filter(&self, _target: &Token, _actor: &Actor, _aura: &AuraDefinition) -> bool {
        true
    }

    /// Lowercased alignment text, None when the system has no alignments
    fn alignment(&self, actor: &Actor) -> Result<Option<String>, RuleError> {
        Ok(actor.alignment.as_ref().map(|a| a.to_lowercase()))
    }
}

/// Effect records and token flags owned by the persistence layer
#[async_trait]
pub trait EffectStore: Send + Sync {
    fn applied_effects(&self, actor: &ActorId) -> Vec<AppliedEffectRecord>;

    async fn create_effect(
        &self,
        actor: &ActorId,
        effect: GrantedEffect,
    ) -> Result<EffectRecordId, StoreError>;

    async fn delete_effect(&self, actor: &ActorId, effect: &EffectRecordId)
    -> Result<(), StoreError>;

    fn token_flag(&self, token: &EntityId, key: &str) -> bool;

    async fn set_token_flag(&self, token: &EntityId, key: &str) -> Result<(), StoreError>;
}

/// Everything the engine needs from its host
pub trait AuraHost: Session + SpatialOracle + ExpressionEvaluator + GameRules + EffectStore {}

impl<T> AuraHost for T where
    T: Session + SpatialOracle + ExpressionEvaluator + GameRules + EffectStore
{
}
