// src/config/mod.rs

//! Configuration loading and validation for jobdispatch.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate pool bounds and durations (`validate.rs`).
//! - Parse the small duration syntax used by the config (`duration.rs`).

pub mod duration;
pub mod loader;
pub mod model;
pub mod validate;

pub use duration::parse_duration;
pub use loader::{load_and_validate, load_from_path};
pub use model::{
    ConfigFile, DispatchSettings, ExecutorSection, LoggingSection, ProducerSection,
    RawConfigFile, RawDispatchSection,
};
