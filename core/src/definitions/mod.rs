//! Effect and aura definitions
//!
//! This module provides:
//! - **Effects**: the payload an aura grants (name, origin, changes)
//! - **Auras**: the geometric and filter configuration authored on an effect
//! - **Macro templates**: placeholder substitution for `macro.` changes
//! - **Config loading**: TOML files for builtin and custom definitions
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                EffectDefinition (authored on a source)           │
//! │  "Aura of Protection: +3 saves, allies within @abilities.cha"   │
//! └─────────────────────────────────────────────────────────────────┘
//!                              │
//!                   evaluation pass decides
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │               GrantedEffect (engine-managed record)              │
//! │  "Fighter has Aura of Protection from Paladin's origin"         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod effect;
mod macros;

pub use config::{
    DefinitionConfig, DefinitionLibrary, default_builtin_dir, default_custom_dir,
    load_definitions, load_file, load_settings, load_user_settings, save_file,
};
pub use effect::{AuraDefinition, ChangeMode, EffectChange, EffectDefinition, MACRO_KEY_PREFIX};
pub use macros::{MacroTemplate, Segment};
