//! # Visibility Module
//!
//! Propagates one layer's visibility change to its equivalents in other frames.
//!
//! ## Rules
//! - A frame's `hiddenLayers` set is the source of truth; every write updates
//!   the set and the layer's `visible` cache together.
//! - Background-class layers store the inverse of the visibility intent in the
//!   hidden set. [`effective_visibility`] undoes that for readers.
//! - A target with an active override is skipped.
//! - Touched frames get their `visibleLayerCount` recomputed.
//! - The first successful sync links the source and its targets.

use crate::config::SyncConfig;
use crate::errors::SyncError;
use crate::lookup;
use crate::matcher::{find_equivalent, LayerMatch, MatchConfidence, MatchSource, MatchStrategy};
use crate::notice::Notice;
use crate::registry::LinkRegistry;
use linkframe_data::model::Frame;
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// A resolved sync target.
#[derive(Debug, Clone)]
pub(crate) struct Target {
    pub frame_idx: usize,
    pub layer_match: LayerMatch,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VisibilityReport {
    /// `(frame_id, layer_id)` of every target written with a validated match.
    pub synced: Vec<(String, String)>,
    /// Targets skipped because of an active override.
    pub blocked: usize,
    /// Targets written from an unvalidated id translation.
    pub low_confidence: usize,
    pub group_id: Option<String>,
}

/// The externally observable visibility of a layer, or `None` if it is absent.
pub fn effective_visibility(frame: &Frame, layer_id: &str, config: &SyncConfig) -> Option<bool> {
    let layer = frame.find_layer(layer_id)?;
    let hidden = frame.is_hidden(layer_id);
    Some(if config.is_background(&layer.name) {
        hidden
    } else {
        !hidden
    })
}

/// Writes a visibility intent for one layer. `fallback_name` decides the
/// inversion when the layer is not in the tree.
pub(crate) fn write_visibility(
    frame: &mut Frame,
    layer_id: &str,
    fallback_name: &str,
    make_visible: bool,
    config: &SyncConfig,
) -> bool {
    let hidden = match frame.find_layer(layer_id) {
        Some(layer) => config.hidden_marker(&layer.name, make_visible),
        None => config.hidden_marker(fallback_name, make_visible),
    };
    frame.set_hidden(layer_id, hidden)
}

/// Resolves the equivalent layer in every in-scope frame.
///
/// Group membership wins over the matcher chain. Frames without a match and
/// detached targets are left out.
pub(crate) fn resolve_targets(
    frames: &[Frame],
    registry: &LinkRegistry,
    config: &SyncConfig,
    source_idx: usize,
    source_layer_id: &str,
) -> Result<Vec<Target>, SyncError> {
    let source_frame = &frames[source_idx];
    let source_layer = lookup::layer(source_frame, source_layer_id)?;
    let ctx = source_frame.context();
    let source = MatchSource {
        layer_id: source_layer_id,
        name: &source_layer.name,
        frame_id: &source_frame.id,
        context: &ctx,
        index: source_frame.layer_index(source_layer_id),
    };
    let group = registry.group_of(source_layer_id);

    let mut targets = Vec::new();
    for (idx, frame) in frames.iter().enumerate() {
        if idx == source_idx || !config.in_scope(&ctx, &frame.context()) {
            continue;
        }
        lookup::ensure_unique_ids(frame)?;

        let member = group.and_then(|g| g.member_in(&frame.id));
        let layer_match = match member {
            Some(id) if frame.find_layer(id).is_some() => LayerMatch {
                layer_id: id.to_string(),
                strategy: MatchStrategy::Linked,
                confidence: MatchConfidence::High,
            },
            stale => {
                if let Some(id) = stale {
                    warn!(frame = %frame.id, layer = id, "Group member missing from frame, falling back to matcher");
                }
                match find_equivalent(&source, frame) {
                    Some(m) => m,
                    None => {
                        debug!(frame = %frame.id, layer = source_layer_id, "No equivalent layer, skipping frame");
                        continue;
                    }
                }
            }
        };
        if frame.is_detached(&layer_match.layer_id) {
            continue;
        }
        targets.push(Target {
            frame_idx: idx,
            layer_match,
        });
    }
    Ok(targets)
}

/// Sets a layer's visibility and mirrors it onto every equivalent layer.
pub(crate) fn sync_visibility(
    frames: &mut [Frame],
    registry: &mut LinkRegistry,
    config: &SyncConfig,
    source_frame_id: &str,
    source_layer_id: &str,
    make_visible: bool,
    notices: &mut Vec<Notice>,
) -> Result<VisibilityReport, SyncError> {
    let source_idx = lookup::frame_index(frames, source_frame_id)?;
    let name = lookup::layer(&frames[source_idx], source_layer_id)?.name.clone();
    let source_ctx = frames[source_idx].context();

    write_visibility(&mut frames[source_idx], source_layer_id, &name, make_visible, config);
    let mut report = VisibilityReport::default();

    if frames[source_idx].is_detached(source_layer_id) || source_ctx.mode() != config.mode {
        debug!(layer = source_layer_id, "Local-only visibility change");
        frames[source_idx].recompute_visible_count();
        report.group_id = registry.group_of(source_layer_id).map(|g| g.id.clone());
        return Ok(report);
    }

    let targets = resolve_targets(frames, registry, config, source_idx, source_layer_id)?;
    let mut touched = BTreeSet::from([source_idx]);

    for Target {
        frame_idx,
        layer_match,
    } in targets
    {
        let frame = &mut frames[frame_idx];
        if frame.is_overridden(&layer_match.layer_id) {
            debug!(frame = %frame.id, layer = %layer_match.layer_id, "Override blocks visibility sync");
            report.blocked += 1;
            continue;
        }
        if layer_match.is_low_confidence() {
            warn!(frame = %frame.id, layer = %layer_match.layer_id, "Visibility synced through an unvalidated id pattern");
            notices.push(Notice::warning(format!(
                "Low-confidence match for '{}' in frame {}",
                name, frame.id
            )));
            report.low_confidence += 1;
        }
        // A low-confidence id may be absent from the tree; its hidden-set entry
        // persists until toggled back and the layer is never linked.
        write_visibility(frame, &layer_match.layer_id, &name, make_visible, config);
        touched.insert(frame_idx);
        if !layer_match.is_low_confidence() {
            report
                .synced
                .push((frame.id.clone(), layer_match.layer_id.clone()));
        }
    }

    for idx in touched {
        frames[idx].recompute_visible_count();
    }

    report.group_id = link_synced(frames, registry, config, source_idx, source_layer_id, &name, &report.synced)?;
    Ok(report)
}

/// Creates or extends the source's link group with the synced targets and
/// writes link metadata. A source with no group and no targets stays unlinked.
pub(crate) fn link_synced(
    frames: &mut [Frame],
    registry: &mut LinkRegistry,
    config: &SyncConfig,
    source_idx: usize,
    source_layer_id: &str,
    name: &str,
    synced: &[(String, String)],
) -> Result<Option<String>, SyncError> {
    let existing = registry.group_of(source_layer_id).map(|g| g.id.clone());
    let group_id = match existing {
        Some(group_id) => group_id,
        None if synced.is_empty() => return Ok(None),
        None => match registry.create_group(
            name,
            source_layer_id,
            &frames[source_idx],
            config.mode,
            config.default_sync_mode,
        ) {
            Ok(group_id) => group_id,
            Err(e) => {
                debug!(layer = source_layer_id, "Not linking synced source: {}", e);
                return Ok(None);
            }
        },
    };

    for (frame_id, layer_id) in synced {
        if registry.group_of(layer_id).is_some() {
            continue;
        }
        if let Err(e) = registry.add_layer_to_group(&group_id, layer_id, frame_id) {
            debug!(layer = %layer_id, "Not linking synced layer: {}", e);
        }
    }

    if let Some(group) = registry.group(&group_id) {
        group.write_metadata(frames);
    }
    Ok(Some(group_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkframe_data::build_frame_id;
    use linkframe_data::model::{Layer, LayerKind};

    fn frame(ad: &str, n: u32, layers: &[(&str, &str)]) -> Frame {
        Frame::new(
            build_frame_id(ad, n),
            layers
                .iter()
                .map(|(id, name)| Layer::new(*id, *name, LayerKind::Text))
                .collect(),
        )
    }

    fn fixture() -> Vec<Frame> {
        vec![
            frame("frame-1", 1, &[("h1", "Headline"), ("bg1", "Background")]),
            frame("frame-2", 1, &[("h2", "Headline"), ("bg2", "Background")]),
            frame("frame-1", 2, &[("h3", "Headline")]),
            frame("frame-2", 2, &[("h4", "Headline")]),
        ]
    }

    #[test]
    fn hides_matched_layer_in_same_frame_number_only() {
        let mut frames = fixture();
        let mut reg = LinkRegistry::new();
        let config = SyncConfig::default();
        let mut notices = Vec::new();

        let report = sync_visibility(&mut frames, &mut reg, &config, "gif-frame-frame-1-1", "h1", false, &mut notices)
            .unwrap();
        assert_eq!(report.synced, vec![("gif-frame-frame-2-1".to_string(), "h2".to_string())]);
        assert!(frames[1].is_hidden("h2"));
        assert_eq!(frames[1].visible_layer_count, 1);
        assert!(!frames[2].is_hidden("h3"));
        assert!(!frames[3].is_hidden("h4"));
        assert!(reg.are_linked("h1", "h2"));
        assert!(frames[0].layers[0].locked);
        assert!(frames[0].layers[0].linked_layer.as_ref().unwrap().is_main);
        assert!(!frames[1].layers[0].linked_layer.as_ref().unwrap().is_main);
    }

    #[test]
    fn background_layers_store_inverted_marker() {
        let mut frames = fixture();
        let mut reg = LinkRegistry::new();
        let config = SyncConfig::default();
        let mut notices = Vec::new();

        sync_visibility(&mut frames, &mut reg, &config, "gif-frame-frame-1-1", "bg1", true, &mut notices).unwrap();
        assert!(frames[0].is_hidden("bg1"));
        assert!(frames[1].is_hidden("bg2"));
        assert_eq!(effective_visibility(&frames[0], "bg1", &config), Some(true));
        assert_eq!(effective_visibility(&frames[1], "bg2", &config), Some(true));
        assert!(!frames[1].find_layer("bg2").unwrap().visible);
    }

    #[test]
    fn overridden_target_is_left_alone() {
        let mut frames = fixture();
        frames[1].set_overridden("h2", true);
        let mut reg = LinkRegistry::new();
        let mut notices = Vec::new();

        let report = sync_visibility(
            &mut frames,
            &mut reg,
            &SyncConfig::default(),
            "gif-frame-frame-1-1",
            "h1",
            false,
            &mut notices,
        )
        .unwrap();
        assert_eq!(report.blocked, 1);
        assert!(!frames[1].is_hidden("h2"));
        assert_eq!(report.group_id, None);
        assert!(!frames[0].layers[0].locked);
    }

    #[test]
    fn low_confidence_match_is_reported() {
        let mut frames = vec![
            frame("frame-1", 1, &[("layer-frame-1-cta", "Shop Now")]),
            frame("frame-2", 1, &[("other", "Logo")]),
        ];
        let mut reg = LinkRegistry::new();
        let mut notices = Vec::new();

        let report = sync_visibility(
            &mut frames,
            &mut reg,
            &SyncConfig::default(),
            "gif-frame-frame-1-1",
            "layer-frame-1-cta",
            false,
            &mut notices,
        )
        .unwrap();
        assert_eq!(report.low_confidence, 1);
        assert_eq!(notices.len(), 1);
        assert!(frames[1].is_hidden("layer-frame-2-cta"));
        assert_eq!(frames[1].visible_layer_count, 1);
        assert!(reg.is_empty());
    }

    #[test]
    fn same_named_sibling_toggles_without_joining_the_group() {
        let mut frames = vec![
            frame("a", 1, &[("l1", "Logo"), ("l1b", "Logo")]),
            frame("b", 1, &[("l2", "Logo")]),
        ];
        let mut reg = LinkRegistry::new();
        let config = SyncConfig::default();
        let mut notices = Vec::new();

        sync_visibility(&mut frames, &mut reg, &config, "gif-frame-a-1", "l1", false, &mut notices).unwrap();
        assert!(reg.are_linked("l1", "l2"));

        let report =
            sync_visibility(&mut frames, &mut reg, &config, "gif-frame-a-1", "l1b", false, &mut notices).unwrap();
        assert!(frames[0].is_hidden("l1b"));
        assert_eq!(frames[0].visible_layer_count, 0);
        assert_eq!(report.group_id, None);
        assert!(reg.group_of("l1b").is_none());
        assert!(!frames[0].find_layer("l1b").unwrap().locked);
        assert!(notices.is_empty());
    }

    #[test]
    fn duplicate_ids_abort_the_pass() {
        let mut frames = fixture();
        frames[1].layers.push(Layer::new("h2", "Copy", LayerKind::Text));
        let mut reg = LinkRegistry::new();
        let mut notices = Vec::new();
        let err = sync_visibility(
            &mut frames,
            &mut reg,
            &SyncConfig::default(),
            "gif-frame-frame-1-1",
            "h1",
            false,
            &mut notices,
        )
        .unwrap_err();
        assert!(matches!(err, SyncError::DuplicateLayerId { .. }));
    }
}
