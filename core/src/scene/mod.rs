//! Read-only snapshot of the viewed scene for one evaluation pass.
//!
//! The host builds a [`Scene`] from its live map state; the engine never
//! holds on to it between passes.

mod index;
mod source;

pub use index::{AuraEntry, AuraIndex, SourceRef};
pub use source::{AuraSource, EntityKind, Reach};

use auras_types::Disposition;
use hashbrown::HashMap;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::DefinitionError;
use crate::ids::{ActorId, EntityId, SceneId};

/// Map position in grid units
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// A token placed on the scene
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub id: EntityId,
    pub name: String,
    /// Actor whose sheet holds this token's effects
    pub actor: Option<ActorId>,
    pub disposition: Disposition,
    pub position: Point,
    #[serde(default)]
    pub elevation: f64,
    /// Token this one is carried along with; its movement is handled by the carrier
    #[serde(default)]
    pub attached_to: Option<EntityId>,
    /// Container entity holding this token; contained tokens never receive auras
    #[serde(default)]
    pub container: Option<EntityId>,
}

impl Token {
    pub fn new(id: impl Into<EntityId>, actor: Option<ActorId>, disposition: Disposition) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            actor,
            disposition,
            position: Point::default(),
            elevation: 0.0,
            attached_to: None,
            container: None,
        }
    }

    pub fn at(mut self, x: f64, y: f64) -> Self {
        self.position = Point::new(x, y);
        self
    }
}

/// A measured area template
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Template {
    pub id: EntityId,
    pub position: Point,
    /// Template size in grid units
    pub distance: f64,
}

/// A freehand or shape drawing used as an aura region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Drawing {
    pub id: EntityId,
    pub position: Point,
    pub width: f64,
    pub height: f64,
}

/// The character sheet behind one or more tokens
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Actor {
    pub id: ActorId,
    pub name: String,
    /// System actor type, e.g. "character", "npc", "vehicle"
    pub kind: String,
    #[serde(default)]
    pub alignment: Option<String>,
}

impl Actor {
    pub fn new(id: impl Into<ActorId>, kind: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            name: id.to_string(),
            id,
            kind: kind.into(),
            alignment: None,
        }
    }
}

/// Everything one evaluation pass reads about the viewed scene
#[derive(Debug, Clone)]
pub struct Scene {
    pub id: SceneId,
    tokens: IndexMap<EntityId, Token>,
    templates: HashMap<EntityId, Template>,
    drawings: HashMap<EntityId, Drawing>,
    actors: HashMap<ActorId, Actor>,
    auras: AuraIndex,
}

impl Scene {
    pub fn new(id: impl Into<SceneId>) -> Self {
        Self {
            id: id.into(),
            tokens: IndexMap::new(),
            templates: HashMap::new(),
            drawings: HashMap::new(),
            actors: HashMap::new(),
            auras: AuraIndex::default(),
        }
    }

    // --- Population ---

    pub fn add_token(&mut self, token: Token) {
        self.tokens.insert(token.id.clone(), token);
    }

    pub fn add_template(&mut self, template: Template) {
        self.templates.insert(template.id.clone(), template);
    }

    pub fn add_drawing(&mut self, drawing: Drawing) {
        self.drawings.insert(drawing.id.clone(), drawing);
    }

    pub fn add_actor(&mut self, actor: Actor) {
        self.actors.insert(actor.id.clone(), actor);
    }

    /// Register an aura projected by an entity on this scene
    pub fn register_aura(&mut self, entry: AuraEntry) -> Result<(), DefinitionError> {
        self.auras.register(entry)
    }

    /// Mutable access for hosts updating positions between passes
    pub fn token_mut(&mut self, id: &EntityId) -> Option<&mut Token> {
        self.tokens.get_mut(id)
    }

    // --- Accessors ---

    pub fn token(&self, id: &EntityId) -> Option<&Token> {
        self.tokens.get(id)
    }

    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.tokens.values()
    }

    pub fn template(&self, id: &EntityId) -> Option<&Template> {
        self.templates.get(id)
    }

    pub fn drawing(&self, id: &EntityId) -> Option<&Drawing> {
        self.drawings.get(id)
    }

    pub fn actor(&self, id: &ActorId) -> Option<&Actor> {
        self.actors.get(id)
    }

    pub fn auras(&self) -> &AuraIndex {
        &self.auras
    }

    /// Tokens on this scene representing the given actor, in placement order
    pub fn tokens_for_actor<'s, 'a>(
        &'s self,
        actor: &'a ActorId,
    ) -> impl Iterator<Item = &'s Token> + use<'s, 'a> {
        self.tokens
            .values()
            .filter(move |t| t.actor.as_ref() == Some(actor))
    }

    /// Whether `entry` is projected by the token `id`.
    ///
    /// Linked entries belong to the first token of their actor, whatever id
    /// they were registered under.
    pub fn projects_from(&self, entry: &AuraEntry, id: &EntityId) -> bool {
        match &entry.linked_actor {
            Some(actor) => {
                entry.source.kind == EntityKind::Token
                    && self
                        .tokens_for_actor(actor)
                        .next()
                        .is_some_and(|t| &t.id == id)
            }
            None => &entry.source.id == id,
        }
    }

    /// Whether the token projects at least one aura
    pub fn is_aura_source(&self, id: &EntityId) -> bool {
        self.auras
            .iter()
            .any(|e| e.source.kind == EntityKind::Token && self.projects_from(e, id))
    }

    /// Auras projected by `source`, plus their namesakes from other sources
    pub fn auras_owned_by(&self, source: &EntityId) -> Vec<&AuraEntry> {
        self.auras
            .owned_with_namesakes(|entry| self.projects_from(entry, source))
    }

    /// Resolve the live entity projecting an aura entry
    pub fn resolve_source(&self, entry: &AuraEntry) -> Option<AuraSource<'_>> {
        match entry.source.kind {
            EntityKind::Token => {
                let token = match &entry.linked_actor {
                    Some(actor) => {
                        let mut tokens = self.tokens_for_actor(actor);
                        let first = tokens.next();
                        if tokens.next().is_some() {
                            tracing::error!(actor = %actor, "Duplicate linked tokens detected, defaulting to first token");
                        }
                        first
                    }
                    None => self.token(&entry.source.id),
                };
                token.map(AuraSource::Token)
            }
            EntityKind::Template => self.template(&entry.source.id).map(AuraSource::Template),
            EntityKind::Drawing => self.drawing(&entry.source.id).map(AuraSource::Drawing),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::EffectDefinition;

    fn paladin_scene() -> Scene {
        let mut scene = Scene::new("s1");
        for name in ["pal-a", "pal-b"] {
            let actor = Some(ActorId::from("paladin"));
            scene.add_token(Token::new(name, actor, Disposition::Friendly));
        }
        scene.add_token(Token::new("fighter", None, Disposition::Friendly));
        scene
            .register_aura(
                AuraEntry::token("pal-stale", EffectDefinition::new("Protected", "o1"))
                    .linked_to("paladin"),
            )
            .unwrap();
        scene
            .register_aura(AuraEntry::token(
                "fighter",
                EffectDefinition::new("Protected", "o2"),
            ))
            .unwrap();
        scene
    }

    #[test]
    fn test_linked_aura_belongs_to_first_actor_token() {
        let scene = paladin_scene();
        assert!(scene.is_aura_source(&EntityId::from("pal-a")));
        assert!(!scene.is_aura_source(&EntityId::from("pal-b")));
        assert!(!scene.is_aura_source(&EntityId::from("pal-stale")));
        assert!(scene.is_aura_source(&EntityId::from("fighter")));
    }

    #[test]
    fn test_auras_owned_by_linked_source_include_namesakes() {
        let scene = paladin_scene();
        let origins: Vec<&str> = scene
            .auras_owned_by(&EntityId::from("pal-a"))
            .iter()
            .map(|e| e.effect.origin.as_str())
            .collect();
        assert_eq!(origins, vec!["o1", "o2"]);
    }

    #[test]
    fn test_template_entries_never_make_a_token_source() {
        let mut scene = Scene::new("s1");
        scene
            .register_aura(AuraEntry::template(
                "t1",
                None,
                EffectDefinition::new("Fog", "o1"),
            ))
            .unwrap();
        assert!(!scene.is_aura_source(&EntityId::from("t1")));
    }
}
