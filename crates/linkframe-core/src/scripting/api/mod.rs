//! # API Module
//!
//! Aggregates all Rhai API sub-modules and provides a single registration point.
//!
//! ## Sub-modules
//! - **lifecycle**: Project loading, inspection and export
//! - **visibility**: Visibility toggles and overrides
//! - **links**: Linking, sync modes and animation edits

pub mod lifecycle;
pub mod links;
pub mod visibility;

use rhai::Engine;

/// Register all API functions with the Rhai engine.
pub fn register_all(engine: &mut Engine) {
    lifecycle::register(engine);
    visibility::register(engine);
    links::register(engine);
}
