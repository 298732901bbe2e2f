//! # Links API
//!
//! Link-group management and animation edits for Rhai scripts.
//!
//! ## Responsibilities
//! - **Linking**: `link_layer`, `unlink_layer`, `auto_link`, `linked_layers`
//! - **Sync Modes**: `set_sync_mode`
//! - **Animations**: `add_animation`, `clear_animations`, `toggle_animation_override`

use linkframe_data::model::Animation;
use rhai::{Array, Dynamic, Engine, EvalAltResult};

use super::super::types::ProjectHandle;
use super::super::utils::{parse_animation_kind, parse_easing, parse_sync_mode};

/// Register link-related Rhai functions.
pub fn register(engine: &mut Engine) {
    engine.register_fn(
        "link_layer",
        |project: &mut ProjectHandle, frame_id: &str, layer_id: &str| {
            project.run(|session, frames| session.link_layer(frames, frame_id, layer_id))
        },
    );

    engine.register_fn(
        "unlink_layer",
        |project: &mut ProjectHandle, frame_id: &str, layer_id: &str| {
            project.run(|session, frames| session.unlink_layer(frames, frame_id, layer_id))
        },
    );

    engine.register_fn("auto_link", |project: &mut ProjectHandle| {
        project.run(|session, frames| session.auto_link(frames))
    });

    engine.register_fn(
        "linked_layers",
        |project: &mut ProjectHandle, layer_id: &str| -> Array {
            project
                .lock()
                .session
                .registry()
                .get_linked_layers(layer_id)
                .into_iter()
                .map(Dynamic::from)
                .collect()
        },
    );

    engine.register_fn(
        "set_sync_mode",
        |project: &mut ProjectHandle, layer_id: &str, mode: &str| -> Result<bool, Box<EvalAltResult>> {
            let mode = parse_sync_mode(mode).ok_or_else(|| format!("Unknown sync mode: {}", mode))?;
            Ok(project.run(|session, frames| session.set_sync_mode(frames, layer_id, mode)))
        },
    );

    engine.register_fn(
        "add_animation",
        |project: &mut ProjectHandle,
         frame_id: &str,
         layer_id: &str,
         kind: &str,
         duration: f64,
         easing: &str|
         -> Result<bool, Box<EvalAltResult>> {
            let kind = parse_animation_kind(kind).ok_or_else(|| format!("Unknown animation type: {}", kind))?;
            let mut animation = Animation::new(kind, duration);
            animation.easing = parse_easing(easing);

            Ok(project.run(|session, frames| {
                let mut list = frames
                    .iter()
                    .find(|f| f.id == frame_id)
                    .and_then(|f| f.find_layer(layer_id))
                    .map(|l| l.animations.clone())
                    .unwrap_or_default();
                list.push(animation);
                session.update_animations(frames, frame_id, layer_id, list)
            }))
        },
    );

    engine.register_fn(
        "clear_animations",
        |project: &mut ProjectHandle, frame_id: &str, layer_id: &str| {
            project.run(|session, frames| session.update_animations(frames, frame_id, layer_id, Vec::new()))
        },
    );

    engine.register_fn(
        "toggle_animation_override",
        |project: &mut ProjectHandle, frame_id: &str, layer_id: &str, animation_id: &str| {
            project.run(|session, frames| session.toggle_animation_override(frames, frame_id, layer_id, animation_id))
        },
    );

    engine.register_fn(
        "animation_ids",
        |project: &mut ProjectHandle, frame_id: &str, layer_id: &str| -> Array {
            let state = project.lock();
            state
                .frames
                .iter()
                .find(|f| f.id == frame_id)
                .and_then(|f| f.find_layer(layer_id))
                .map(|l| {
                    l.animations
                        .iter()
                        .filter_map(|a| a.id.clone())
                        .map(Dynamic::from)
                        .collect()
                })
                .unwrap_or_default()
        },
    );
}
