//! Per-token candidate evaluation
//!
//! Walks the auras registered on the scene, runs each through the filter
//! chain and the spatial oracle, and records grant/revoke decisions for
//! the token being evaluated.

use std::cell::OnceCell;

use auras_types::EngineSettings;

use super::decisions::{DecisionMap, ReconciliationKey};
use crate::host::{AppliedEffectRecord, AuraHost};
use crate::ids::EntityId;
use crate::scene::{Actor, AuraEntry, AuraSource, Reach, Scene, Token};

/// Evaluates tokens against the auras of one scene snapshot
pub struct CandidateEvaluator<'a, H: AuraHost> {
    host: &'a H,
    settings: &'a EngineSettings,
    scene: &'a Scene,
}

impl<'a, H: AuraHost> CandidateEvaluator<'a, H> {
    pub fn new(host: &'a H, settings: &'a EngineSettings, scene: &'a Scene) -> Self {
        Self {
            host,
            settings,
            scene,
        }
    }

    /// Fold [`evaluate`](Self::evaluate) over several tokens into one map
    pub fn update_all_tokens<'t>(
        &self,
        map: &mut DecisionMap,
        tokens: impl IntoIterator<Item = &'t Token>,
        restrict_to: Option<&EntityId>,
    ) {
        for token in tokens {
            self.evaluate(map, token, restrict_to);
        }
    }

    /// Record decisions for one token.
    ///
    /// With `restrict_to` set (an aura source moved), only that source's
    /// auras and their namesakes are examined, except for the moved source
    /// itself, which is tested against everything.
    pub fn evaluate(&self, map: &mut DecisionMap, token: &Token, restrict_to: Option<&EntityId>) {
        if token.container.is_some() {
            return;
        }
        let Some(actor) = token.actor.as_ref().and_then(|id| self.scene.actor(id)) else {
            return;
        };
        if !self.host.receives_auras(actor) {
            return;
        }

        let candidates: Vec<&AuraEntry> = match restrict_to {
            Some(source) if source != &token.id => self.scene.auras_owned_by(source),
            _ => self.scene.auras().iter().collect(),
        };

        let alignment = OnceCell::new();
        let applied = OnceCell::new();

        for entry in candidates {
            let Some(source) = self.scene.resolve_source(entry) else {
                tracing::debug!(source = %entry.source.id, kind = ?entry.source.kind, "Aura source no longer on scene");
                continue;
            };

            if !self.passes_filters(entry, source, token, actor, &alignment) {
                continue;
            }

            let aura = &entry.effect.aura;
            let effect_name = entry.effect.effective_name();
            let key =
                ReconciliationKey::new(&entry.effect.origin, &token.id, source.id(), effect_name);

            let in_range = !aura.paused
                && self.in_range(entry, source, token)
                && aura
                    .custom_check()
                    .is_none_or(|check| self.host.custom_check(check, token, source));

            if in_range {
                map.grant(key, &entry.effect);
            } else if !map.is_granted(&key) {
                let records: &Vec<AppliedEffectRecord> =
                    applied.get_or_init(|| self.host.applied_effects(&actor.id));
                if records
                    .iter()
                    .any(|e| e.matches(&entry.effect.origin, effect_name))
                {
                    map.revoke(key, &entry.effect);
                }
            }
        }
    }

    /// Short-circuiting filter chain; every failure is a hard skip
    fn passes_filters(
        &self,
        entry: &AuraEntry,
        source: AuraSource<'_>,
        target: &Token,
        actor: &Actor,
        alignment: &OnceCell<Option<String>>,
    ) -> bool {
        let aura = &entry.effect.aura;

        if source.id() == &target.id {
            return false;
        }

        if let Some(source_disposition) = source.disposition(entry.caster_disposition)
            && !self
                .host
                .disposition_admits(aura.targets, source_disposition, target.disposition)
        {
            return false;
        }

        if let Some(types) = aura.actor_type_filter()
            && !self.host.matches_actor_type(target, actor, &types)
        {
            return false;
        }

        if aura.hostile && self.host.active_combatant().as_ref() != Some(&target.id) {
            return false;
        }

        if !self.host.system_filter(target, actor, aura) {
            return false;
        }

        if let Some(required) = aura.required_alignment() {
            let resolved = alignment.get_or_init(|| match self.host.alignment(actor) {
                Ok(alignment) => alignment,
                Err(e) => {
                    tracing::error!(token = %target.id, error = %e, "Token has an unreadable alignment");
                    None
                }
            });
            if !resolved.as_deref().is_some_and(|a| a.contains(&required)) {
                return false;
            }
        }

        true
    }

    fn in_range(&self, entry: &AuraEntry, source: AuraSource<'_>, target: &Token) -> bool {
        let aura = &entry.effect.aura;
        let radius = match source {
            AuraSource::Template(_) => 0.0,
            _ => self.host.evaluate_radius(&aura.radius, source),
        };
        let reach = Reach {
            walls_block: aura.walls_block.resolve(self.settings.walls_block),
            height: aura.height,
            radius,
        };
        source.containment_test(self.host, target, reach).is_some()
    }
}
