//! Configuration loading for effect definitions and engine settings
//!
//! Definitions are loaded from TOML files in two locations:
//! - **Builtin**: Shipped with the application (read-only)
//! - **Custom**: User-created definitions (editable)
//!
//! Definitions are keyed by origin; custom files override builtin ones.
//! Every definition is validated when it is loaded.
//!
//! The library does not know which map entity projects a definition. Hosts
//! pick the source for each entry of [`DefinitionLibrary::auras`] and pass it
//! to [`Scene::register_aura`](crate::scene::Scene::register_aura) as an
//! [`AuraEntry`](crate::scene::AuraEntry).

use std::fs;
use std::path::{Path, PathBuf};

use auras_types::EngineSettings;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::effect::EffectDefinition;
use crate::error::ConfigError;

const APP_NAME: &str = "auras";

/// Root structure for definition files
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DefinitionConfig {
    #[serde(default, rename = "effect")]
    pub effects: Vec<EffectDefinition>,
}

/// Loaded definitions, keyed by origin in load order
#[derive(Debug, Clone, Default)]
pub struct DefinitionLibrary {
    effects: IndexMap<String, EffectDefinition>,
}

impl DefinitionLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add definitions from a config, returns origins that replaced an earlier definition
    pub fn add_config(&mut self, config: DefinitionConfig) -> Vec<String> {
        let mut duplicates = Vec::new();
        for effect in config.effects {
            if self.effects.contains_key(&effect.origin) {
                duplicates.push(effect.origin.clone());
            }
            self.effects.insert(effect.origin.clone(), effect);
        }
        duplicates
    }

    pub fn get(&self, origin: &str) -> Option<&EffectDefinition> {
        self.effects.get(origin)
    }

    pub fn iter(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.effects.values()
    }

    /// Definitions marked as auras, in load order
    pub fn auras(&self) -> impl Iterator<Item = &EffectDefinition> {
        self.effects.values().filter(|e| e.aura.is_aura)
    }

    pub fn len(&self) -> usize {
        self.effects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.effects.is_empty()
    }
}

/// Load definitions from builtin and custom config directories
///
/// Builtin definitions are loaded first, then custom definitions.
/// Custom definitions with the same origin override builtins.
pub fn load_definitions(
    builtin_dir: Option<&Path>,
    custom_dir: Option<&Path>,
) -> Result<DefinitionLibrary, ConfigError> {
    let mut library = DefinitionLibrary::new();

    if let Some(dir) = builtin_dir
        && dir.exists()
    {
        load_directory(&mut library, dir, "builtin")?;
    }

    if let Some(dir) = custom_dir
        && dir.exists()
    {
        load_directory(&mut library, dir, "custom")?;
    }

    Ok(library)
}

/// Load all TOML files from a directory. Bad files are logged and skipped.
fn load_directory(
    library: &mut DefinitionLibrary,
    dir: &Path,
    source: &str,
) -> Result<(), ConfigError> {
    let entries = fs::read_dir(dir).map_err(|e| ConfigError::IoError {
        path: dir.to_path_buf(),
        source: e,
    })?;

    let mut paths: Vec<PathBuf> = entries
        .flatten()
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();

    for path in paths {
        match load_file(&path) {
            Ok(config) => {
                let duplicates = library.add_config(config);
                if !duplicates.is_empty() {
                    tracing::warn!(source, file = ?path.file_name(), ?duplicates, "Duplicate definition origins");
                }
            }
            Err(e) => {
                tracing::error!(source, file = ?path.file_name(), error = %e, "Failed to load definitions");
            }
        }
    }

    Ok(())
}

/// Load and validate a single TOML definition file
pub fn load_file(path: &Path) -> Result<DefinitionConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    let config: DefinitionConfig =
        toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })?;

    for effect in &config.effects {
        effect
            .validate()
            .map_err(|e| ConfigError::InvalidDefinition {
                path: path.to_path_buf(),
                source: e,
            })?;
    }

    Ok(config)
}

/// Save a config to a TOML file
pub fn save_file(path: &Path, config: &DefinitionConfig) -> Result<(), ConfigError> {
    let contents = toml::to_string_pretty(config).map_err(|e| ConfigError::SerializeError {
        path: path.to_path_buf(),
        source: e,
    })?;

    fs::write(path, contents).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Get the default builtin definitions directory
pub fn default_builtin_dir() -> Option<PathBuf> {
    std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|p| p.join("definitions").join("builtin")))
}

/// Get the default custom definitions directory
pub fn default_custom_dir() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join(APP_NAME).join("definitions"))
}

/// Load engine settings from an explicit TOML file
pub fn load_settings(path: &Path) -> Result<EngineSettings, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|e| ConfigError::IoError {
        path: path.to_path_buf(),
        source: e,
    })?;

    toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: path.to_path_buf(),
        source: e,
    })
}

/// Load engine settings from the user's config directory, creating defaults on first use
pub fn load_user_settings() -> Result<EngineSettings, ConfigError> {
    Ok(confy::load(APP_NAME, "engine")?)
}
