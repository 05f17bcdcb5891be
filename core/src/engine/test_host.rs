//! In-memory host used by engine tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use auras_types::Disposition;

use crate::definitions::{EffectChange, EffectDefinition};
use crate::error::{RuleError, StoreError};
use crate::host::{
    AppliedEffectRecord, EffectStore, ExpressionEvaluator, GameRules, GrantedEffect, Session,
    SpatialOracle,
};
use crate::ids::{ActorId, EffectRecordId, EntityId, SceneId};
use crate::scene::{Actor, AuraSource, Point, Reach, Template, Token};

pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Aura effect with a numeric radius and one change per value
pub(crate) fn aura_effect(name: &str, origin: &str, radius: f64, values: &[&str]) -> EffectDefinition {
    let mut def = EffectDefinition::new(name, origin);
    def.aura.radius = radius.to_string();
    def.aura.targets = auras_types::AuraTargets::All;
    for value in values {
        def.changes
            .push(EffectChange::new("system.bonuses.abilities.save", *value));
    }
    def
}

pub(crate) fn managed_record(id: &str, name: &str, origin: &str) -> AppliedEffectRecord {
    AppliedEffectRecord {
        id: EffectRecordId::from(id),
        name: name.to_string(),
        origin: origin.to_string(),
        img: None,
        changes: Vec::new(),
        managed: true,
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Circle {
    center: Point,
    elevation: f64,
    radius: f64,
}

#[derive(Default)]
struct StoreState {
    effects: HashMap<ActorId, Vec<AppliedEffectRecord>>,
    flags: HashSet<(EntityId, String)>,
    next_id: u64,
    failing_deletes: HashSet<EffectRecordId>,
    fail_creates: bool,
    created: usize,
}

pub(crate) struct TestHost {
    pub authority: bool,
    pub viewed: Option<SceneId>,
    pub combat_started: bool,
    pub combatant: Option<EntityId>,
    pub special_durations: bool,
    pub unreadable_alignment: bool,
    /// (source, target) pairs with a wall between them
    pub walls: Vec<(EntityId, EntityId)>,
    warnings: Mutex<Vec<String>>,
    store: Mutex<StoreState>,
}

impl TestHost {
    pub fn new(viewed: &SceneId) -> Self {
        init_tracing();
        Self {
            authority: true,
            viewed: Some(viewed.clone()),
            combat_started: false,
            combatant: None,
            special_durations: false,
            unreadable_alignment: false,
            walls: Vec::new(),
            warnings: Mutex::new(Vec::new()),
            store: Mutex::new(StoreState::default()),
        }
    }

    pub fn warnings(&self) -> Vec<String> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn effects(&self, actor: &str) -> Vec<AppliedEffectRecord> {
        self.applied_effects(&ActorId::from(actor))
    }

    /// Total effect records ever created
    pub fn created(&self) -> usize {
        self.store.lock().unwrap().created
    }

    pub fn seed_effect(&self, actor: &str, record: AppliedEffectRecord) {
        self.store
            .lock()
            .unwrap()
            .effects
            .entry(ActorId::from(actor))
            .or_default()
            .push(record);
    }

    pub fn fail_delete(&self, id: &str) {
        self.store
            .lock()
            .unwrap()
            .failing_deletes
            .insert(EffectRecordId::from(id));
    }

    pub fn fail_creates(&self, fail: bool) {
        self.store.lock().unwrap().fail_creates = fail;
    }

    fn blocked(&self, source: &EntityId, target: &EntityId) -> bool {
        self.walls
            .iter()
            .any(|(s, t)| s == source && t == target)
    }
}

impl Session for TestHost {
    fn is_authority(&self) -> bool {
        self.authority
    }

    fn viewed_scene(&self) -> Option<SceneId> {
        self.viewed.clone()
    }

    fn combat_started(&self, _scene: &SceneId) -> bool {
        self.combat_started
    }

    fn active_combatant(&self) -> Option<EntityId> {
        self.combatant.clone()
    }

    fn notify_warning(&self, message: &str) {
        self.warnings.lock().unwrap().push(message.to_string());
    }

    fn supports_special_durations(&self) -> bool {
        self.special_durations
    }
}

impl SpatialOracle for TestHost {
    type Shape = Circle;

    fn shape_of(&self, source: AuraSource<'_>, radius: f64) -> Circle {
        match source {
            AuraSource::Token(token) => Circle {
                center: token.position,
                elevation: token.elevation,
                radius,
            },
            AuraSource::Drawing(drawing) => Circle {
                center: drawing.position,
                elevation: 0.0,
                radius: radius.max(drawing.width.max(drawing.height) / 2.0),
            },
            AuraSource::Template(template) => Circle {
                center: template.position,
                elevation: 0.0,
                radius: template.distance,
            },
        }
    }

    fn contains(
        &self,
        target: &Token,
        source: AuraSource<'_>,
        reach: Reach,
        shape: &Circle,
    ) -> Option<f64> {
        if reach.walls_block && self.blocked(source.id(), &target.id) {
            return None;
        }
        if reach.height && (target.elevation - shape.elevation).abs() > shape.radius {
            return None;
        }
        let distance = shape.center.distance(&target.position);
        (distance <= shape.radius).then_some(distance)
    }

    fn contains_template(
        &self,
        template: &Template,
        target: &Token,
        walls_block: bool,
    ) -> Option<f64> {
        if walls_block && self.blocked(&template.id, &target.id) {
            return None;
        }
        let distance = template.position.distance(&target.position);
        (distance <= template.distance).then_some(distance)
    }
}

impl ExpressionEvaluator for TestHost {
    fn evaluate_radius(&self, expression: &str, _source: AuraSource<'_>) -> f64 {
        expression.trim().parse().unwrap_or(0.0)
    }

    fn custom_check(&self, expression: &str, target: &Token, _source: AuraSource<'_>) -> bool {
        match expression {
            "false" => false,
            "target.friendly" => target.disposition == Disposition::Friendly,
            _ => true,
        }
    }
}

impl GameRules for TestHost {
    fn alignment(&self, actor: &Actor) -> Result<Option<String>, RuleError> {
        if self.unreadable_alignment {
            return Err(RuleError::Unreadable {
                actor: actor.id.clone(),
                field: "alignment",
            });
        }
        Ok(actor.alignment.as_ref().map(|a| a.to_lowercase()))
    }
}

#[async_trait]
impl EffectStore for TestHost {
    fn applied_effects(&self, actor: &ActorId) -> Vec<AppliedEffectRecord> {
        self.store
            .lock()
            .unwrap()
            .effects
            .get(actor)
            .cloned()
            .unwrap_or_default()
    }

    async fn create_effect(
        &self,
        actor: &ActorId,
        effect: GrantedEffect,
    ) -> Result<EffectRecordId, StoreError> {
        let mut store = self.store.lock().unwrap();
        if store.fail_creates {
            return Err(StoreError::Backend("create rejected".to_string()));
        }
        store.next_id += 1;
        store.created += 1;
        let id = EffectRecordId(format!("fx{}", store.next_id));
        store
            .effects
            .entry(actor.clone())
            .or_default()
            .push(effect.into_record(id.clone()));
        Ok(id)
    }

    async fn delete_effect(
        &self,
        actor: &ActorId,
        effect: &EffectRecordId,
    ) -> Result<(), StoreError> {
        let mut store = self.store.lock().unwrap();
        if store.failing_deletes.contains(effect) {
            return Err(StoreError::Backend("delete rejected".to_string()));
        }
        let records = store.effects.entry(actor.clone()).or_default();
        let before = records.len();
        records.retain(|r| &r.id != effect);
        if records.len() == before {
            return Err(StoreError::EffectNotFound {
                actor: actor.clone(),
                effect: effect.clone(),
            });
        }
        Ok(())
    }

    fn token_flag(&self, token: &EntityId, key: &str) -> bool {
        self.store
            .lock()
            .unwrap()
            .flags
            .contains(&(token.clone(), key.to_string()))
    }

    async fn set_token_flag(&self, token: &EntityId, key: &str) -> Result<(), StoreError> {
        self.store
            .lock()
            .unwrap()
            .flags
            .insert((token.clone(), key.to_string()));
        Ok(())
    }
}
