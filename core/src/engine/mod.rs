//! Aura decision engine
//!
//! One pass runs in four stages:
//!
//! ```text
//! Trigger ──► scope::resolve ──► CandidateEvaluator ──► DecisionMap::reconcile ──► EffectApplier
//!             (which tokens)     (grant/revoke per       (collapse conflicts)       (create/delete
//!                                 source→target)                                    effect records)
//! ```
//!
//! Passes are awaited sequentially by the host. Nothing stops a second
//! trigger from starting a pass before an earlier pass's writes have
//! landed; the applier's idempotence checks absorb most such overlap.

mod applier;
mod decisions;
mod evaluator;
mod scope;

#[cfg(test)]
pub(crate) mod test_host;

pub use applier::{ApplyOutcome, EffectApplier};
pub use decisions::{Decision, DecisionMap, ReconciliationKey};
pub use evaluator::CandidateEvaluator;
pub use scope::SkipReason;

use std::time::Instant;

use auras_types::EngineSettings;
use serde::Serialize;

use crate::error::EngineError;
use crate::host::AuraHost;
use crate::ids::{EntityId, SceneId};
use crate::scene::Scene;

/// What started a pass
#[derive(Debug, Clone, Copy)]
pub struct Trigger<'a> {
    /// Token whose movement caused the pass (None = full rescan)
    pub moved: Option<&'a EntityId>,
    /// Free-text label for diagnostics
    pub label: &'a str,
    pub scene_id: &'a SceneId,
}

impl<'a> Trigger<'a> {
    pub fn rescan(label: &'a str, scene_id: &'a SceneId) -> Self {
        Self {
            moved: None,
            label,
            scene_id,
        }
    }

    pub fn movement(moved: &'a EntityId, scene_id: &'a SceneId) -> Self {
        Self {
            moved: Some(moved),
            label: "movement update",
            scene_id,
        }
    }
}

/// Summary of one pass
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    pub skipped: Option<SkipReason>,
    /// Tokens in scope, in evaluation order
    pub evaluated: Vec<EntityId>,
    /// Decisions left after reconciliation
    pub decisions: usize,
    /// Effect records created
    pub granted: usize,
    /// Effect records deleted
    pub revoked: usize,
}

impl PassReport {
    fn skipped(reason: SkipReason) -> Self {
        Self {
            skipped: Some(reason),
            ..Default::default()
        }
    }
}

/// Entry point the host calls on movement, scene and combat events
pub struct AuraEngine<H: AuraHost> {
    host: H,
    settings: EngineSettings,
}

impl<H: AuraHost> AuraEngine<H> {
    pub fn new(host: H, settings: EngineSettings) -> Self {
        Self { host, settings }
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: EngineSettings) {
        self.settings = settings;
    }

    /// Evaluate `scene` (the viewed scene) and bring effect records in line with it
    pub async fn run(&self, scene: &Scene, trigger: Trigger<'_>) -> Result<PassReport, EngineError> {
        tracing::debug!(label = trigger.label, scene = %trigger.scene_id, moved = ?trigger.moved, "Aura pass requested");
        let started = self.settings.debug.then(Instant::now);

        let (tokens, moved_source) =
            match scope::resolve(&self.host, &self.settings, scene, &trigger)? {
                scope::Scope::Skip(reason) => {
                    tracing::debug!(?reason, "Aura pass skipped");
                    return Ok(PassReport::skipped(reason));
                }
                scope::Scope::Tokens {
                    tokens,
                    moved_source,
                } => (tokens, moved_source),
            };

        let mut report = PassReport {
            evaluated: tokens.iter().map(|t| t.id.clone()).collect(),
            ..Default::default()
        };

        let mut decisions = DecisionMap::new();
        CandidateEvaluator::new(&self.host, &self.settings, scene).update_all_tokens(
            &mut decisions,
            tokens,
            moved_source,
        );

        if let Some(started) = started {
            tracing::info!(elapsed_ms = started.elapsed().as_secs_f64() * 1000.0, "Find auras finished");
        }

        decisions.reconcile();
        tracing::debug!(?decisions, "Aura decision map");
        report.decisions = decisions.len();

        let applier = EffectApplier::new(&self.host, &self.settings, scene);
        for (_, decision) in decisions {
            if decision.should_apply {
                if let ApplyOutcome::Granted(_) =
                    applier.apply(&decision.target, &decision.effect).await?
                {
                    report.granted += 1;
                }
            } else {
                report.revoked += applier
                    .remove(&decision.target, &decision.effect.origin)
                    .await?;
            }
        }

        if let Some(started) = started {
            tracing::info!(elapsed_ms = started.elapsed().as_secs_f64() * 1000.0, granted = report.granted, revoked = report.revoked, "Aura pass finished");
        }

        Ok(report)
    }

    /// Movement hook: skips scenes without auras before running a pass
    pub async fn movement_update(
        &self,
        scene: &Scene,
        moved: &EntityId,
        token_scene: &SceneId,
    ) -> Result<PassReport, EngineError> {
        if token_scene == &scene.id && scene.auras().is_empty() {
            return Ok(PassReport::skipped(SkipReason::NoAuras));
        }
        tracing::debug!(token = %moved, "Movement, running aura pass");
        self.run(scene, Trigger::movement(moved, token_scene)).await
    }
}
