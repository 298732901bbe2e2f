//! # Visibility API
//!
//! Visibility edits and queries for Rhai scripts.
//!
//! ## Responsibilities
//! - **Edits**: `toggle_visibility`, `set_visibility`, `toggle_override`
//! - **Queries**: `is_visible`, `is_hidden`, `is_overridden`, `visible_layer_count`

use rhai::Engine;

use super::super::types::ProjectHandle;

/// Register visibility-related Rhai functions.
pub fn register(engine: &mut Engine) {
    engine.register_fn(
        "toggle_visibility",
        |project: &mut ProjectHandle, frame_id: &str, layer_id: &str| {
            project.run(|session, frames| session.toggle_visibility(frames, frame_id, layer_id))
        },
    );

    engine.register_fn(
        "set_visibility",
        |project: &mut ProjectHandle, frame_id: &str, layer_id: &str, visible: bool| {
            project.run(|session, frames| session.set_visibility(frames, frame_id, layer_id, visible))
        },
    );

    engine.register_fn(
        "toggle_override",
        |project: &mut ProjectHandle, frame_id: &str, layer_id: &str| {
            project.run(|session, frames| session.toggle_override(frames, frame_id, layer_id))
        },
    );

    // Unknown frames or layers read as not visible.
    engine.register_fn(
        "is_visible",
        |project: &mut ProjectHandle, frame_id: &str, layer_id: &str| {
            let state = project.lock();
            state
                .session
                .effective_visibility(&state.frames, frame_id, layer_id)
                .unwrap_or(false)
        },
    );

    engine.register_fn(
        "is_hidden",
        |project: &mut ProjectHandle, frame_id: &str, layer_id: &str| {
            let state = project.lock();
            state
                .frames
                .iter()
                .find(|f| f.id == frame_id)
                .is_some_and(|f| f.is_hidden(layer_id))
        },
    );

    engine.register_fn(
        "is_overridden",
        |project: &mut ProjectHandle, frame_id: &str, layer_id: &str| {
            let state = project.lock();
            state
                .frames
                .iter()
                .find(|f| f.id == frame_id)
                .is_some_and(|f| f.is_overridden(layer_id))
        },
    );

    engine.register_fn(
        "visible_layer_count",
        |project: &mut ProjectHandle, frame_id: &str| {
            let state = project.lock();
            state
                .frames
                .iter()
                .find(|f| f.id == frame_id)
                .map_or(-1, |f| f.visible_layer_count as i64)
        },
    );
}
