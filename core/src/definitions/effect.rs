//! Effect and aura definition types
//!
//! Definitions are immutable inputs to an evaluation pass. They are cloned
//! into decisions and never mutated in place.

use std::collections::BTreeMap;

use auras_types::{AuraTargets, WallsBlock};
use serde::{Deserialize, Serialize};

use super::macros::MacroTemplate;
use crate::error::DefinitionError;

/// Change keys in this namespace are macro invocations with placeholder arguments
pub const MACRO_KEY_PREFIX: &str = "macro.";

// ═══════════════════════════════════════════════════════════════════════════
// Changes
// ═══════════════════════════════════════════════════════════════════════════

/// How a change combines with the actor's existing value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeMode {
    Custom,
    Multiply,
    #[default]
    Add,
    Downgrade,
    Upgrade,
    Override,
}

/// One attribute change carried by an effect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectChange {
    /// Attribute path, e.g. `system.bonuses.abilities.save`
    pub key: String,

    #[serde(default)]
    pub mode: ChangeMode,

    pub value: String,

    #[serde(default)]
    pub priority: Option<i32>,
}

impl EffectChange {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            mode: ChangeMode::Add,
            value: value.into(),
            priority: None,
        }
    }

    /// Leading integer of the value (`"+2"` is 2, `"1d4"` is 1, `"abc"` is None)
    pub fn numeric_value(&self) -> Option<i64> {
        let trimmed = self.value.trim_start();
        let (sign, digits) = match trimmed.as_bytes().first() {
            Some(b'-') => (-1, &trimmed[1..]),
            Some(b'+') => (1, &trimmed[1..]),
            _ => (1, trimmed),
        };
        let end = digits
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(digits.len());
        digits[..end].parse::<i64>().ok().map(|n| sign * n)
    }

    pub fn is_macro(&self) -> bool {
        self.key.starts_with(MACRO_KEY_PREFIX)
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Aura Configuration
// ═══════════════════════════════════════════════════════════════════════════

/// Aura configuration authored on an effect. Never copied onto granted effects.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AuraDefinition {
    /// Marks the effect as an aura projected by its host entity
    #[serde(default)]
    pub is_aura: bool,

    // ─── Geometry ───────────────────────────────────────────────────────────
    /// Radius expression, evaluated against the source
    #[serde(default)]
    pub radius: String,

    /// Honor the vertical extent of the aura
    #[serde(default)]
    pub height: bool,

    #[serde(default)]
    pub walls_block: WallsBlock,

    // ─── Filtering ──────────────────────────────────────────────────────────
    /// Disposition relationship the target must have with the source
    #[serde(default)]
    pub targets: AuraTargets,

    /// Comma-separated actor types (empty = any)
    #[serde(default, rename = "type")]
    pub actor_types: String,

    /// Required alignment substring (empty or "any" = no requirement)
    #[serde(default)]
    pub alignment: String,

    /// Only affect the combatant whose turn it is
    #[serde(default)]
    pub hostile: bool,

    /// Boolean expression evaluated against target and source
    #[serde(default)]
    pub custom_check: String,

    /// Restrict to wildcard actors (systems with wildcard rules only)
    #[serde(default)]
    pub wildcard: bool,

    /// Restrict to extras (systems with wildcard rules only)
    #[serde(default)]
    pub extra: bool,

    // ─── Behavior ───────────────────────────────────────────────────────────
    /// Display name for the granted effect
    #[serde(default)]
    pub name_override: Option<String>,

    /// Treat as out of range regardless of geometry
    #[serde(default)]
    pub paused: bool,

    /// Grant at most once per target token
    #[serde(default)]
    pub only_once: bool,

    /// Changes in the `macro.` namespace carry placeholder arguments
    #[serde(default)]
    pub is_macro: bool,

    /// Expiry hint forwarded to the granted effect (e.g. "turnEnd")
    #[serde(default)]
    pub time: Option<String>,
}

impl AuraDefinition {
    /// Lowercased alignment requirement, None when anything goes
    pub fn required_alignment(&self) -> Option<String> {
        let alignment = self.alignment.trim().to_lowercase();
        (!alignment.is_empty() && alignment != "any").then_some(alignment)
    }

    /// Lowercased actor type filter, None when unset
    pub fn actor_type_filter(&self) -> Option<String> {
        let types = self.actor_types.trim().to_lowercase();
        (!types.is_empty()).then_some(types)
    }

    pub fn custom_check(&self) -> Option<&str> {
        let check = self.custom_check.trim();
        (!check.is_empty()).then_some(check)
    }

    pub fn name_override(&self) -> Option<&str> {
        self.name_override
            .as_deref()
            .filter(|name| !name.trim().is_empty())
    }

    /// Expiry hint, ignoring the explicit "None" marker
    pub fn special_duration(&self) -> Option<&str> {
        self.time.as_deref().filter(|t| *t != "None" && !t.is_empty())
    }
}

// ═══════════════════════════════════════════════════════════════════════════
// Effect Definitions
// ═══════════════════════════════════════════════════════════════════════════

/// An effect a source can grant, together with its aura configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// Authored display name
    pub name: String,

    /// Stable identifier tying granted instances back to their source
    pub origin: String,

    /// Icon path
    #[serde(default)]
    pub img: Option<String>,

    #[serde(default)]
    pub changes: Vec<EffectChange>,

    #[serde(default)]
    pub aura: AuraDefinition,

    #[serde(default)]
    pub special_duration: Vec<String>,

    /// Flags owned by other modules, carried onto granted effects verbatim
    #[serde(default)]
    pub flags: BTreeMap<String, serde_json::Value>,
}

impl EffectDefinition {
    pub fn new(name: impl Into<String>, origin: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            origin: origin.into(),
            img: None,
            changes: Vec::new(),
            aura: AuraDefinition {
                is_aura: true,
                ..Default::default()
            },
            special_duration: Vec::new(),
            flags: BTreeMap::new(),
        }
    }

    /// Name the effect is granted under (override or authored)
    pub fn effective_name(&self) -> &str {
        self.aura.name_override().unwrap_or(&self.name)
    }

    /// Token flag key recording a once-per-target grant
    pub fn once_key(&self) -> String {
        self.origin.replace('.', "")
    }

    /// Authoring-time checks: origin present and macro arguments well formed
    pub fn validate(&self) -> Result<(), DefinitionError> {
        if self.origin.trim().is_empty() {
            return Err(DefinitionError::MissingOrigin(self.name.clone()));
        }
        if self.aura.is_macro {
            for change in self.changes.iter().filter(|c| c.is_macro()) {
                MacroTemplate::parse(&change.value)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_value_leading_integer() {
        assert_eq!(EffectChange::new("a", "+2").numeric_value(), Some(2));
        assert_eq!(EffectChange::new("a", "-3").numeric_value(), Some(-3));
        assert_eq!(EffectChange::new("a", "1d4").numeric_value(), Some(1));
        assert_eq!(EffectChange::new("a", " 10").numeric_value(), Some(10));
        assert_eq!(EffectChange::new("a", "abc").numeric_value(), None);
        assert_eq!(EffectChange::new("a", "").numeric_value(), None);
    }

    #[test]
    fn test_effective_name_ignores_blank_override() {
        let mut def = EffectDefinition::new("Bless", "Actor.abc.Item.def");
        assert_eq!(def.effective_name(), "Bless");
        def.aura.name_override = Some("   ".to_string());
        assert_eq!(def.effective_name(), "Bless");
        def.aura.name_override = Some("Blessed".to_string());
        assert_eq!(def.effective_name(), "Blessed");
    }

    #[test]
    fn test_once_key_strips_dots() {
        let def = EffectDefinition::new("Bless", "Actor.abc.Item.def");
        assert_eq!(def.once_key(), "ActorabcItemdef");
    }

    #[test]
    fn test_alignment_any_is_no_requirement() {
        let mut aura = AuraDefinition::default();
        assert_eq!(aura.required_alignment(), None);
        aura.alignment = "Any".to_string();
        assert_eq!(aura.required_alignment(), None);
        aura.alignment = "Good".to_string();
        assert_eq!(aura.required_alignment().as_deref(), Some("good"));
    }

    #[test]
    fn test_validate_rejects_ambiguous_macro_placeholder() {
        let mut def = EffectDefinition::new("Zone", "Scene.x.Template.y");
        def.aura.is_macro = true;
        def.changes.push(EffectChange::new("macro.execute", "Burn @tokens"));
        assert!(matches!(
            def.validate(),
            Err(DefinitionError::AmbiguousPlaceholder { .. })
        ));

        def.changes[0].value = "Burn @token".to_string();
        assert!(def.validate().is_ok());
    }
}
