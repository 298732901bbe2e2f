//! # Animation Module
//!
//! Propagates a layer's animation list to the other members of its link group.
//!
//! ## Sync modes
//! - **Full**: a member's list becomes the source's non-overridden entries
//!   plus the member's own overridden entries, which always win locally.
//! - **Partial**: source entries are upserted by id into the member, except
//!   those the member overrides. Entries absent from the source are kept.
//! - **Independent**: no propagation.
//!
//! Override tracking is keyed by animation id, so ids are assigned lazily
//! before any merge.

use crate::errors::SyncError;
use crate::lookup;
use crate::notice::Notice;
use crate::registry::LinkRegistry;
use linkframe_data::model::{Animation, Frame, SyncMode};
use std::collections::HashSet;
use tracing::{debug, warn};
use uuid::Uuid;

/// Gives every animation without an id one that is unique within the list.
pub fn ensure_animation_ids(animations: &mut [Animation]) {
    let mut taken: HashSet<String> = animations.iter().filter_map(|a| a.id.clone()).collect();
    for anim in animations.iter_mut().filter(|a| a.id.is_none()) {
        let id = loop {
            let candidate = format!("anim-{}", Uuid::new_v4().simple());
            if taken.insert(candidate.clone()) {
                break candidate;
            }
        };
        anim.id = Some(id);
    }
}

fn is_local(anim: &Animation, overrides: &[String]) -> bool {
    anim.is_overridden
        || anim
            .id
            .as_ref()
            .is_some_and(|id| overrides.iter().any(|o| o == id))
}

/// Full-mode merge of `source` into `target`.
pub fn merge_full(source: &[Animation], target: &[Animation], target_overrides: &[String]) -> Vec<Animation> {
    let locals: Vec<&Animation> = target
        .iter()
        .filter(|a| is_local(a, target_overrides))
        .collect();
    let mut emitted: HashSet<&str> = HashSet::new();
    let mut merged = Vec::with_capacity(source.len() + locals.len());

    for anim in source.iter().filter(|a| !a.is_overridden) {
        let id = anim.id.as_deref().unwrap_or_default();
        if let Some(local) = locals.iter().find(|l| l.id.as_deref() == Some(id)) {
            emitted.insert(id);
            merged.push((*local).clone());
        } else if !target_overrides.iter().any(|o| o == id) {
            merged.push(anim.clone());
        }
    }
    for local in locals {
        if !local.id.as_deref().is_some_and(|id| emitted.contains(id)) {
            merged.push(local.clone());
        }
    }
    merged
}

/// Partial-mode merge of `source` into `target`.
pub fn merge_partial(source: &[Animation], target: &[Animation], target_overrides: &[String]) -> Vec<Animation> {
    let mut merged = target.to_vec();
    for anim in source.iter().filter(|a| !a.is_overridden) {
        let Some(id) = anim.id.as_deref() else {
            continue;
        };
        if target_overrides.iter().any(|o| o == id) {
            continue;
        }
        match merged.iter_mut().find(|a| a.id.as_deref() == Some(id)) {
            Some(existing) if existing.is_overridden => {}
            Some(existing) => *existing = anim.clone(),
            None => merged.push(anim.clone()),
        }
    }
    merged
}

/// Merges `source` into one target layer's list under `mode`.
pub fn merge(mode: SyncMode, source: &[Animation], target: &[Animation], target_overrides: &[String]) -> Vec<Animation> {
    match mode {
        SyncMode::Full => merge_full(source, target, target_overrides),
        SyncMode::Partial => merge_partial(source, target, target_overrides),
        SyncMode::Independent => target.to_vec(),
    }
}

/// Pulls `source` into one layer of `frame` under `mode`, assigning ids first.
pub(crate) fn pull_animations(
    frame: &mut Frame,
    layer_id: &str,
    source: &[Animation],
    mode: SyncMode,
) -> Result<(), SyncError> {
    let layer = lookup::layer_mut(frame, layer_id)?;
    ensure_animation_ids(&mut layer.animations);
    let overrides = layer
        .linked_layer
        .as_ref()
        .map(|info| info.overrides.clone())
        .unwrap_or_default();
    layer.animations = merge(mode, source, &layer.animations, &overrides);
    Ok(())
}

/// Pushes the source layer's animations to every other member of its group.
/// Returns the number of members updated.
pub(crate) fn sync_animations(
    frames: &mut [Frame],
    registry: &LinkRegistry,
    source_frame_id: &str,
    source_layer_id: &str,
    notices: &mut Vec<Notice>,
) -> Result<usize, SyncError> {
    let source_idx = lookup::frame_index(frames, source_frame_id)?;
    let source_layer = lookup::layer_mut(&mut frames[source_idx], source_layer_id)?;
    ensure_animation_ids(&mut source_layer.animations);
    let source = source_layer.animations.clone();

    let Some(group) = registry.group_of(source_layer_id) else {
        debug!(layer = source_layer_id, "Unlinked layer, animation edit stays local");
        return Ok(0);
    };
    let mode = source_layer
        .linked_layer
        .as_ref()
        .map(|info| info.sync_mode)
        .unwrap_or(group.sync_mode);
    if mode == SyncMode::Independent {
        debug!(group = %group.id, "Independent group, animation edit stays local");
        return Ok(0);
    }

    let mut updated = 0;
    for (frame_id, layer_id) in group.peers_of(source_layer_id) {
        let Some(frame) = frames.iter_mut().find(|f| f.id == frame_id) else {
            warn!(group = %group.id, frame = frame_id, "Linked frame missing, skipping");
            notices.push(Notice::warning(format!("Linked frame {} not found", frame_id)));
            continue;
        };
        if frame.is_overridden(layer_id) || frame.is_detached(layer_id) {
            debug!(frame = frame_id, layer = layer_id, "Override blocks animation sync");
            continue;
        }
        pull_animations(frame, layer_id, &source, mode)?;
        updated += 1;
    }
    Ok(updated)
}
