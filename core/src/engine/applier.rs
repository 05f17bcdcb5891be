//! Idempotent grant and best-effort revocation of engine-managed effects.

use auras_types::EngineSettings;

use crate::definitions::EffectDefinition;
use crate::error::EngineError;
use crate::host::{AuraHost, GrantedEffect};
use crate::ids::{ActorId, EffectRecordId, EntityId};
use crate::scene::{Scene, Token};

/// What [`EffectApplier::apply`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    Granted(EffectRecordId),
    /// An engine-managed instance with this origin and name already exists
    AlreadyApplied,
    /// An unmanaged effect with this origin and name has identical changes
    IdenticalPresent,
    /// Once-per-target aura already granted to this token before
    AlreadyGrantedOnce,
    /// An effect with the same icon is already on the actor
    DuplicateArtwork,
}

pub struct EffectApplier<'a, H: AuraHost> {
    host: &'a H,
    settings: &'a EngineSettings,
    scene: &'a Scene,
}

impl<'a, H: AuraHost> EffectApplier<'a, H> {
    pub fn new(host: &'a H, settings: &'a EngineSettings, scene: &'a Scene) -> Self {
        Self {
            host,
            settings,
            scene,
        }
    }

    fn target(&self, id: &EntityId) -> Result<(&'a Token, &'a ActorId), EngineError> {
        let token = self
            .scene
            .token(id)
            .ok_or_else(|| EngineError::UnknownToken(id.clone()))?;
        let actor = token
            .actor
            .as_ref()
            .ok_or_else(|| EngineError::NoActor(id.clone()))?;
        Ok((token, actor))
    }

    /// Grant `effect` to the target token's actor. Persistence errors propagate.
    pub async fn apply(
        &self,
        target: &EntityId,
        effect: &EffectDefinition,
    ) -> Result<ApplyOutcome, EngineError> {
        let (token, actor) = self.target(target)?;
        let name = effect.effective_name();

        let duplicate = self
            .host
            .applied_effects(actor)
            .into_iter()
            .find(|e| e.matches(&effect.origin, name));
        if let Some(existing) = duplicate {
            if existing.managed {
                return Ok(ApplyOutcome::AlreadyApplied);
            }
            if existing.changes == effect.changes {
                return Ok(ApplyOutcome::IdenticalPresent);
            }
            self.remove(target, &effect.origin).await?;
        }

        let once_key = effect.aura.only_once.then(|| effect.once_key());
        if let Some(key) = &once_key
            && self.host.token_flag(&token.id, key)
        {
            return Ok(ApplyOutcome::AlreadyGrantedOnce);
        }

        let forward_duration =
            self.settings.special_durations && self.host.supports_special_durations();
        let granted = GrantedEffect::for_target(effect, &token.id, forward_duration)?;

        if let Some(img) = &granted.img
            && self
                .host
                .applied_effects(actor)
                .iter()
                .any(|e| e.img.as_ref() == Some(img))
        {
            tracing::debug!(effect = %granted.name, token = %token.name, "Effect with same icon already present");
            return Ok(ApplyOutcome::DuplicateArtwork);
        }

        let id = self.host.create_effect(actor, granted).await?;
        // flag only after the record exists
        if let Some(key) = &once_key {
            self.host.set_token_flag(&token.id, key).await?;
        }
        tracing::debug!(effect = %name, token = %token.name, "Applied aura effect");
        Ok(ApplyOutcome::Granted(id))
    }

    /// Delete every engine-managed effect with `origin` from the target's actor.
    ///
    /// Each deletion is independent: failures are logged and skipped.
    /// Returns the number of records deleted.
    pub async fn remove(&self, target: &EntityId, origin: &str) -> Result<usize, EngineError> {
        let (token, actor) = self.target(target)?;
        let mut removed = 0;

        for record in self.host.applied_effects(actor) {
            if record.origin != origin || !record.managed {
                continue;
            }
            match self.host.delete_effect(actor, &record.id).await {
                Ok(()) => {
                    removed += 1;
                    tracing::debug!(effect = %record.name, origin, token = %token.name, "Removed aura effect");
                }
                Err(e) => {
                    tracing::error!(effect = %record.id, token = %token.name, error = %e, "Failed to remove aura effect");
                }
            }
        }

        Ok(removed)
    }
}
