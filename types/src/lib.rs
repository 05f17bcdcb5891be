//! Shared configuration types for the aura engine.
//!
//! These are plain serde types with no engine logic, so hosts can read and
//! write them (settings files, authored aura definitions) without depending
//! on the core crate.

pub mod disposition;
pub mod settings;

pub use disposition::{AuraTargets, Disposition};
pub use settings::{EngineSettings, WallsBlock};
