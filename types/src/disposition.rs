//! Faction classification of map entities and the aura target filter.

use serde::{Deserialize, Serialize};

/// Allegiance of a token (or of the caster that placed a template).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    /// Hidden from players; never counts as an ally or an enemy
    Secret,
    Hostile,
    #[default]
    Neutral,
    Friendly,
}

impl Disposition {
    /// Numeric value as stored by most virtual tabletops
    pub fn value(self) -> i8 {
        match self {
            Self::Secret => -2,
            Self::Hostile => -1,
            Self::Neutral => 0,
            Self::Friendly => 1,
        }
    }
}

/// Which targets an aura affects, relative to the source's disposition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuraTargets {
    /// Targets sharing the source's disposition
    #[default]
    Allies,
    /// Targets of the opposing disposition
    Enemies,
    /// Everyone, regardless of disposition
    All,
}

impl AuraTargets {
    /// Compare the live relationship between source and target against this filter.
    ///
    /// Neutral sources treat neutral targets as allies and never have enemies.
    /// Secret entities are only matched by [`AuraTargets::All`].
    pub fn admits(self, source: Disposition, target: Disposition) -> bool {
        match self {
            Self::All => true,
            _ if source == Disposition::Secret || target == Disposition::Secret => false,
            Self::Allies => source == target,
            Self::Enemies => source.value() * target.value() == -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_always_admits() {
        assert!(AuraTargets::All.admits(Disposition::Secret, Disposition::Friendly));
        assert!(AuraTargets::All.admits(Disposition::Hostile, Disposition::Friendly));
    }

    #[test]
    fn test_allies_and_enemies() {
        use Disposition::*;
        assert!(AuraTargets::Allies.admits(Friendly, Friendly));
        assert!(!AuraTargets::Allies.admits(Friendly, Hostile));
        assert!(AuraTargets::Enemies.admits(Hostile, Friendly));
        assert!(AuraTargets::Enemies.admits(Friendly, Hostile));
        assert!(!AuraTargets::Enemies.admits(Neutral, Hostile));
        assert!(!AuraTargets::Allies.admits(Secret, Secret));
    }

    #[test]
    fn test_parse_targets_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            aura: AuraTargets,
        }
        let parsed: Wrapper = toml::from_str(r#"aura = "enemies""#).unwrap();
        assert_eq!(parsed.aura, AuraTargets::Enemies);
    }
}
