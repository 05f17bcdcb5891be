//! Engine configuration
//!
//! Mirrors the module settings a game master toggles at the table.

use serde::{Deserialize, Serialize};

/// Whether walls stop an aura from reaching a target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WallsBlock {
    /// Use [`EngineSettings::walls_block`]
    #[default]
    System,
    #[serde(alias = "true")]
    Always,
    #[serde(alias = "false")]
    Never,
}

impl WallsBlock {
    /// Resolve against the global default
    pub fn resolve(self, system_default: bool) -> bool {
        match self {
            Self::System => system_default,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// Global engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Only evaluate auras while the scene's combat encounter is running
    #[serde(default)]
    pub combat_only: bool,

    /// Default for auras configured with [`WallsBlock::System`]
    #[serde(default)]
    pub walls_block: bool,

    /// Emit timing and decision-map traces
    #[serde(default)]
    pub debug: bool,

    /// Forward an aura's expiry hint into the granted effect's special durations
    #[serde(default = "default_true")]
    pub special_durations: bool,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            combat_only: false,
            walls_block: false,
            debug: false,
            special_durations: true,
        }
    }
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_defaults_from_empty_toml() {
        let settings: EngineSettings = toml::from_str("").unwrap();
        assert_eq!(settings, EngineSettings::default());
        assert!(settings.special_durations);
    }

    #[test]
    fn test_walls_block_accepts_legacy_strings() {
        #[derive(Deserialize)]
        struct Wrapper {
            walls: WallsBlock,
        }
        let parsed: Wrapper = toml::from_str(r#"walls = "true""#).unwrap();
        assert_eq!(parsed.walls, WallsBlock::Always);
        let parsed: Wrapper = toml::from_str(r#"walls = "false""#).unwrap();
        assert_eq!(parsed.walls, WallsBlock::Never);
        assert!(WallsBlock::System.resolve(true));
        assert!(!WallsBlock::Never.resolve(true));
    }
}
