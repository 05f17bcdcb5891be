//! Effect records as the persistence layer sees them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::definitions::{EffectChange, EffectDefinition, MacroTemplate};
use crate::error::DefinitionError;
use crate::ids::{EffectRecordId, EntityId};

/// An effect already present on an actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppliedEffectRecord {
    pub id: EffectRecordId,
    pub name: String,
    pub origin: String,
    #[serde(default)]
    pub img: Option<String>,
    #[serde(default)]
    pub changes: Vec<EffectChange>,
    /// Created by this engine
    #[serde(default)]
    pub managed: bool,
}

impl AppliedEffectRecord {
    pub fn matches(&self, origin: &str, name: &str) -> bool {
        self.origin == origin && self.name == name
    }
}

/// Payload written when an aura is granted. Carries no aura configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GrantedEffect {
    pub name: String,
    pub origin: String,
    pub img: Option<String>,
    pub changes: Vec<EffectChange>,
    pub special_duration: Vec<String>,
    pub flags: BTreeMap<String, serde_json::Value>,
    /// Engine-managed marker
    pub managed: bool,
}

impl GrantedEffect {
    /// Build the payload for `target`, substituting macro placeholders
    pub fn for_target(
        effect: &EffectDefinition,
        target: &EntityId,
        forward_duration: bool,
    ) -> Result<Self, DefinitionError> {
        let mut changes = effect.changes.clone();
        if effect.aura.is_macro {
            for change in changes.iter_mut().filter(|c| c.is_macro()) {
                change.value = MacroTemplate::parse(&change.value)?.render(target);
            }
        }

        let mut special_duration = effect.special_duration.clone();
        if forward_duration && let Some(time) = effect.aura.special_duration() {
            special_duration.push(time.to_string());
        }

        Ok(Self {
            name: effect.effective_name().to_string(),
            origin: effect.origin.clone(),
            img: effect.img.clone(),
            changes,
            special_duration,
            flags: effect.flags.clone(),
            managed: true,
        })
    }

    pub fn into_record(self, id: EffectRecordId) -> AppliedEffectRecord {
        AppliedEffectRecord {
            id,
            name: self.name,
            origin: self.origin,
            img: self.img,
            changes: self.changes,
            managed: self.managed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn macro_effect() -> EffectDefinition {
        let mut def = EffectDefinition::new("Spirit Guardians", "Actor.cleric.Item.sg");
        def.aura.is_macro = true;
        def.aura.name_override = Some("Guarded".to_string());
        def.aura.radius = "15".to_string();
        def.aura.time = Some("turnStart".to_string());
        def.changes.push(EffectChange::new("macro.execute", "SpiritGuardians @token"));
        def.changes.push(EffectChange::new("system.speed", "@token"));
        def.flags
            .insert("core".to_string(), serde_json::json!({ "statusId": "guarded" }));
        def
    }

    #[test]
    fn test_for_target_substitutes_only_macro_keys() {
        let granted =
            GrantedEffect::for_target(&macro_effect(), &EntityId::from("tok9"), true).unwrap();
        assert_eq!(granted.changes[0].value, "SpiritGuardians tok9");
        assert_eq!(granted.changes[1].value, "@token");
    }

    #[test]
    fn test_for_target_uses_override_and_keeps_foreign_flags() {
        let granted =
            GrantedEffect::for_target(&macro_effect(), &EntityId::from("tok9"), true).unwrap();
        assert_eq!(granted.name, "Guarded");
        assert!(granted.managed);
        assert_eq!(granted.flags["core"]["statusId"], "guarded");
        assert_eq!(granted.special_duration, vec!["turnStart".to_string()]);
    }

    #[test]
    fn test_duration_hint_not_forwarded_when_disabled() {
        let mut effect = macro_effect();
        let granted = GrantedEffect::for_target(&effect, &EntityId::from("t"), false).unwrap();
        assert!(granted.special_duration.is_empty());

        effect.aura.time = Some("None".to_string());
        let granted = GrantedEffect::for_target(&effect, &EntityId::from("t"), true).unwrap();
        assert!(granted.special_duration.is_empty());
    }
}
