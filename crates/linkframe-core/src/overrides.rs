//! # Overrides Module
//!
//! Per-frame, per-layer override flags that suppress inbound sync.
//!
//! Enabling an override is a pure flag flip. Disabling one resyncs the layer
//! immediately from a "truth" peer in another frame with the same frame
//! number: a non-overridden member of the layer's group when it is linked,
//! otherwise the first non-overridden equivalent layer.

use crate::animation::pull_animations;
use crate::config::SyncConfig;
use crate::errors::SyncError;
use crate::lookup;
use crate::registry::LinkRegistry;
use crate::visibility::{effective_visibility, resolve_targets, write_visibility};
use linkframe_data::model::{Frame, SyncMode};
use tracing::debug;

/// Flips the override flag for `layer_id` in `frame`. Returns the new state.
pub fn toggle_override(frame: &mut Frame, layer_id: &str) -> bool {
    let overridden = !frame.is_overridden(layer_id);
    frame.set_overridden(layer_id, overridden);
    overridden
}

/// The peer a re-enabled layer is pulled from, as `(frame_idx, layer_id)`.
///
/// A linked layer only ever pulls from its own group's members. The matcher
/// chain is consulted for unlinked layers alone.
pub(crate) fn truth_peer(
    frames: &[Frame],
    registry: &LinkRegistry,
    config: &SyncConfig,
    frame_idx: usize,
    layer_id: &str,
) -> Result<Option<(usize, String)>, SyncError> {
    let frame_number = frames[frame_idx].context().frame_number;

    if let Some(group) = registry.group_of(layer_id) {
        let peer = frames.iter().enumerate().find_map(|(idx, peer)| {
            let member = group.member_in(&peer.id)?;
            let usable = idx != frame_idx
                && member != layer_id
                && peer.context().frame_number == frame_number
                && peer.find_layer(member).is_some()
                && !peer.is_overridden(member)
                && !peer.is_detached(member);
            usable.then(|| (idx, member.to_string()))
        });
        return Ok(peer);
    }

    let peer = resolve_targets(frames, registry, config, frame_idx, layer_id)?
        .into_iter()
        .filter(|t| !t.layer_match.is_low_confidence())
        .find(|t| {
            let peer = &frames[t.frame_idx];
            peer.context().frame_number == frame_number && !peer.is_overridden(&t.layer_match.layer_id)
        })
        .map(|t| (t.frame_idx, t.layer_match.layer_id));
    Ok(peer)
}

/// Toggles the override and, when it turns off, pulls visibility and
/// animations from the truth peer. Returns the new override state.
pub(crate) fn toggle_override_with_resync(
    frames: &mut [Frame],
    registry: &LinkRegistry,
    config: &SyncConfig,
    frame_id: &str,
    layer_id: &str,
) -> Result<bool, SyncError> {
    let frame_idx = lookup::frame_index(frames, frame_id)?;
    let name = lookup::layer(&frames[frame_idx], layer_id)?.name.clone();

    let overridden = toggle_override(&mut frames[frame_idx], layer_id);
    if overridden {
        return Ok(true);
    }

    let Some((peer_idx, peer_layer)) = truth_peer(frames, registry, config, frame_idx, layer_id)? else {
        debug!(frame = frame_id, layer = layer_id, "No truth peer to resync from");
        return Ok(false);
    };
    let Some(visible) = effective_visibility(&frames[peer_idx], &peer_layer, config) else {
        return Ok(false);
    };
    debug!(frame = frame_id, layer = layer_id, peer = %frames[peer_idx].id, visible, "Resyncing after override removal");

    let frame = &mut frames[frame_idx];
    write_visibility(frame, layer_id, &name, visible, config);
    frame.recompute_visible_count();

    if let Some(group) = registry.group_of(layer_id) {
        if group.sync_mode != SyncMode::Independent && group.frames.contains_key(&frames[peer_idx].id) {
            let source = lookup::layer(&frames[peer_idx], &peer_layer)?.animations.clone();
            pull_animations(&mut frames[frame_idx], layer_id, &source, group.sync_mode)?;
        }
    }
    Ok(false)
}
