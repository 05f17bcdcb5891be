//! Per-scene registry of projected auras.

use auras_types::Disposition;

use super::source::EntityKind;
use crate::definitions::EffectDefinition;
use crate::error::DefinitionError;
use crate::ids::{ActorId, EntityId};

/// The entity an aura entry was registered against
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceRef {
    pub kind: EntityKind,
    pub id: EntityId,
}

/// One aura projected by one entity
#[derive(Debug, Clone, PartialEq)]
pub struct AuraEntry {
    pub source: SourceRef,
    /// Linked actor; the live source is the first of its tokens on the scene
    pub linked_actor: Option<ActorId>,
    /// Disposition of the caster who placed a template
    pub caster_disposition: Option<Disposition>,
    pub effect: EffectDefinition,
}

impl AuraEntry {
    pub fn token(id: impl Into<EntityId>, effect: EffectDefinition) -> Self {
        Self::new(EntityKind::Token, id.into(), effect)
    }

    pub fn template(
        id: impl Into<EntityId>,
        caster_disposition: Option<Disposition>,
        effect: EffectDefinition,
    ) -> Self {
        Self {
            caster_disposition,
            ..Self::new(EntityKind::Template, id.into(), effect)
        }
    }

    pub fn drawing(id: impl Into<EntityId>, effect: EffectDefinition) -> Self {
        Self::new(EntityKind::Drawing, id.into(), effect)
    }

    fn new(kind: EntityKind, id: EntityId, effect: EffectDefinition) -> Self {
        Self {
            source: SourceRef { kind, id },
            linked_actor: None,
            caster_disposition: None,
            effect,
        }
    }

    pub fn linked_to(mut self, actor: impl Into<ActorId>) -> Self {
        self.linked_actor = Some(actor.into());
        self
    }

    pub fn effect_name(&self) -> &str {
        self.effect.effective_name()
    }
}

/// All auras registered on one scene, in registration order
#[derive(Debug, Clone, Default)]
pub struct AuraIndex {
    entries: Vec<AuraEntry>,
}

impl AuraIndex {
    /// Validate and add an entry
    pub fn register(&mut self, entry: AuraEntry) -> Result<(), DefinitionError> {
        entry.effect.validate()?;
        self.entries.push(entry);
        Ok(())
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &AuraEntry> {
        self.entries.iter()
    }

    /// Entries accepted by `owns`, plus every other entry sharing a name with one of them
    pub fn owned_with_namesakes(&self, owns: impl Fn(&AuraEntry) -> bool) -> Vec<&AuraEntry> {
        let (owned, others): (Vec<&AuraEntry>, Vec<&AuraEntry>) =
            self.entries.iter().partition(|e| owns(e));
        let namesakes = others
            .into_iter()
            .filter(|e| owned.iter().any(|o| o.effect_name() == e.effect_name()));
        owned.iter().copied().chain(namesakes).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::definitions::EffectChange;

    fn bless(origin: &str, value: &str) -> EffectDefinition {
        let mut def = EffectDefinition::new("Bless", origin);
        def.changes.push(EffectChange::new("system.bonus", value));
        def
    }

    #[test]
    fn test_owned_with_namesakes() {
        let mut index = AuraIndex::default();
        index.register(AuraEntry::token("a", bless("o1", "1"))).unwrap();
        index.register(AuraEntry::token("b", bless("o2", "2"))).unwrap();
        index
            .register(AuraEntry::token("c", EffectDefinition::new("Haste", "o3")))
            .unwrap();

        let picked: Vec<&str> = index
            .owned_with_namesakes(|e| e.source.id == EntityId::from("a"))
            .iter()
            .map(|e| e.effect.origin.as_str())
            .collect();
        assert_eq!(picked, vec!["o1", "o2"]);
    }

    #[test]
    fn test_register_rejects_missing_origin() {
        let mut index = AuraIndex::default();
        let err = index
            .register(AuraEntry::token("a", EffectDefinition::new("Bless", " ")))
            .unwrap_err();
        assert_eq!(err, DefinitionError::MissingOrigin("Bless".to_string()));
        assert!(index.is_empty());
    }
}
