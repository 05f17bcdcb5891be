//! Which tokens a pass re-examines.

use auras_types::EngineSettings;
use serde::Serialize;

use super::Trigger;
use crate::error::EngineError;
use crate::host::Session;
use crate::ids::EntityId;
use crate::scene::{Scene, Token};

pub(crate) const NON_VIEWED_SCENE_WARNING: &str = "An update was called on a non viewed scene, auras will be updated when you return to that scene";

/// Why a pass did no work
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// This session may not mutate effects
    NotAuthority,
    /// Combat-only mode and the scene's encounter has not started
    CombatNotStarted,
    /// The trigger refers to a scene other than the viewed one
    SceneNotViewed,
    /// The moved token rides on another token; the carrier's move handles it
    AttachedToken,
    /// Movement on a scene without registered auras
    NoAuras,
}

#[derive(Debug)]
pub(crate) enum Scope<'s> {
    Skip(SkipReason),
    Tokens {
        tokens: Vec<&'s Token>,
        /// Set when the moved token is itself an aura source
        moved_source: Option<&'s EntityId>,
    },
}

pub(crate) fn resolve<'s, S: Session + ?Sized>(
    session: &S,
    settings: &EngineSettings,
    scene: &'s Scene,
    trigger: &Trigger<'_>,
) -> Result<Scope<'s>, EngineError> {
    if !session.is_authority() {
        return Ok(Scope::Skip(SkipReason::NotAuthority));
    }

    if settings.combat_only && !session.combat_started(trigger.scene_id) {
        tracing::debug!(scene = %trigger.scene_id, "Auras inactive outside combat");
        return Ok(Scope::Skip(SkipReason::CombatNotStarted));
    }

    let viewed = session.viewed_scene();
    if viewed.as_ref() != Some(trigger.scene_id) || &scene.id != trigger.scene_id {
        tracing::warn!(scene = %trigger.scene_id, viewed = ?viewed, "Aura update deferred for non viewed scene");
        session.notify_warning(NON_VIEWED_SCENE_WARNING);
        return Ok(Scope::Skip(SkipReason::SceneNotViewed));
    }

    let Some(moved) = trigger.moved else {
        return Ok(Scope::Tokens {
            tokens: scene.tokens().collect(),
            moved_source: None,
        });
    };

    let token = scene
        .token(moved)
        .ok_or_else(|| EngineError::UnknownToken(moved.clone()))?;

    if scene.is_aura_source(&token.id) {
        Ok(Scope::Tokens {
            tokens: scene.tokens().collect(),
            moved_source: Some(&token.id),
        })
    } else if token.attached_to.is_some() {
        tracing::debug!(token = %token.id, "Attached token movement, deferring to carrier");
        Ok(Scope::Skip(SkipReason::AttachedToken))
    } else {
        Ok(Scope::Tokens {
            tokens: vec![token],
            moved_source: None,
        })
    }
}
