//! Configuration module
//!
//! User preferences the engine consults. Hosts own where they are stored;
//! `Settings::from_json_sanitized` accepts whatever they load.

mod settings;

pub use settings::*;
