//! # Scripting Module
//!
//! Rhai scripting API bindings for batch link edits.
//!
//! ## Responsibilities
//! - **Engine Setup**: Registers the `Project` type and its functions with Rhai.
//! - **Loading**: `load_project` from project JSON.
//! - **Visibility**: `toggle_visibility`, `set_visibility`, overrides.
//! - **Links**: `link_layer`, `unlink_layer`, `auto_link`, sync modes, animations.
//!
//! ## Pattern
//! All bindings follow: `engine.register_fn("name", |project, ...| { ... })`.
//! Operations return whether they applied; notices accumulate on the handle.
//!
//! ## Module Structure
//! - `types`: `ProjectHandle`
//! - `utils`: Parsing helpers (sync modes, animation kinds, easing)
//! - `api/`: Sub-modules for lifecycle, visibility and links

mod api;
pub mod types;
pub mod utils;

pub use types::{ProjectHandle, ProjectState};

use rhai::Engine;

/// Registers the linking API into the provided Rhai `Engine`.
pub fn register_rhai_api(engine: &mut Engine) {
    api::register_all(engine);
}
