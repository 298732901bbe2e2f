use crate::animation::{ensure_animation_ids, pull_animations, sync_animations};
use crate::config::SyncConfig;
use crate::errors::SyncError;
use crate::lookup;
use crate::notice::{Notice, SyncOutcome};
use crate::overrides::{toggle_override_with_resync, truth_peer};
use crate::registry::LinkRegistry;
use crate::visibility::{effective_visibility, resolve_targets, sync_visibility, write_visibility};
use linkframe_data::model::{Animation, Frame, SyncMode};
use tracing::{debug, error, info, instrument, warn};

/// The linking engine for one editor session.
///
/// Owns the link registry and the sync policy. Every operation takes the
/// current frame collection by reference and returns a fresh one; on failure
/// the returned collection equals the input and the registry is unchanged.
#[derive(Debug, Clone, Default)]
pub struct LinkSession {
    registry: LinkRegistry,
    config: SyncConfig,
}

impl LinkSession {
    /// Creates a session with an empty registry. Call [`LinkSession::reset`]
    /// with the loaded frames before editing.
    pub fn new(config: SyncConfig) -> Self {
        Self {
            registry: LinkRegistry::new(),
            config,
        }
    }

    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    pub fn registry(&self) -> &LinkRegistry {
        &self.registry
    }

    /// Rebuilds the registry wholesale from `frames`.
    ///
    /// Also repairs visibility caches and counts, and rewrites link metadata
    /// so every group has exactly one main member and `locked` mirrors
    /// membership.
    #[instrument(level = "debug", skip_all, fields(frames = frames.len()))]
    pub fn reset(&mut self, frames: &[Frame]) -> SyncOutcome {
        let mut working = frames.to_vec();
        for frame in &mut working {
            frame.repair();
        }
        self.registry = LinkRegistry::rebuild_from_frames(&working);

        let registry = &self.registry;
        for frame in &mut working {
            let frame_id = frame.id.clone();
            frame.for_each_layer_mut(|layer| {
                if !registry.is_member_in(&frame_id, &layer.id) {
                    layer.linked_layer = None;
                    layer.locked = false;
                }
            });
        }
        for group in self.registry.groups() {
            group.write_metadata(&mut working);
        }

        info!(groups = self.registry.len(), "Link registry rebuilt");
        SyncOutcome {
            frames: working,
            notices: vec![Notice::info(format!("Loaded {} link groups", self.registry.len()))],
            applied: true,
        }
    }

    /// The externally observable visibility of a layer.
    pub fn effective_visibility(&self, frames: &[Frame], frame_id: &str, layer_id: &str) -> Option<bool> {
        let frame = frames.iter().find(|f| f.id == frame_id)?;
        effective_visibility(frame, layer_id, &self.config)
    }

    /// Flips a layer's effective visibility and syncs it to equivalent layers.
    #[instrument(level = "debug", skip(self, frames))]
    pub fn toggle_visibility(&mut self, frames: &[Frame], frame_id: &str, layer_id: &str) -> SyncOutcome {
        self.run("toggle visibility", frames, |frames, registry, config, notices| {
            let idx = lookup::frame_index(frames, frame_id)?;
            lookup::layer(&frames[idx], layer_id)?;
            let visible = effective_visibility(&frames[idx], layer_id, config).unwrap_or(true);
            apply_visibility(frames, registry, config, frame_id, layer_id, !visible, notices)
        })
    }

    /// Sets a layer's effective visibility and syncs it to equivalent layers.
    #[instrument(level = "debug", skip(self, frames))]
    pub fn set_visibility(&mut self, frames: &[Frame], frame_id: &str, layer_id: &str, visible: bool) -> SyncOutcome {
        self.run("set visibility", frames, |frames, registry, config, notices| {
            apply_visibility(frames, registry, config, frame_id, layer_id, visible, notices)
        })
    }

    /// Links a layer with its equivalents in the other in-scope frames and
    /// aligns their visibility to it. Re-attaches a detached layer.
    #[instrument(level = "debug", skip(self, frames))]
    pub fn link_layer(&mut self, frames: &[Frame], frame_id: &str, layer_id: &str) -> SyncOutcome {
        self.run("link layer", frames, |frames, registry, config, notices| {
            let idx = lookup::frame_index(frames, frame_id)?;
            let name = lookup::layer(&frames[idx], layer_id)?.name.clone();
            if frames[idx].context().mode() != config.mode {
                return Err(SyncError::ModeConflict {
                    layer_id: layer_id.to_string(),
                    mode: config.mode,
                });
            }
            frames[idx].detached_layers.remove(layer_id);

            let existing = registry.group_of(layer_id).map(|g| g.id.clone());
            let group_id = match existing {
                Some(group_id) => group_id,
                None => registry.create_group(&name, layer_id, &frames[idx], config.mode, config.default_sync_mode)?,
            };
            let visible = effective_visibility(&frames[idx], layer_id, config).unwrap_or(true);

            for target in resolve_targets(frames, registry, config, idx, layer_id)? {
                if target.layer_match.is_low_confidence() {
                    continue;
                }
                let target_id = target.layer_match.layer_id;
                let current = registry.group_of(&target_id).map(|g| g.id == group_id);
                let joined = match current {
                    Some(same_group) => same_group,
                    None => registry
                        .add_layer_to_group(&group_id, &target_id, &frames[target.frame_idx].id)
                        .map_err(|e| debug!(layer = %target_id, "Not linking: {}", e))
                        .is_ok(),
                };
                let frame = &mut frames[target.frame_idx];
                if joined && !frame.is_overridden(&target_id) {
                    write_visibility(frame, &target_id, &name, visible, config);
                    frame.recompute_visible_count();
                }
            }

            let Some(group) = registry.group(&group_id) else {
                return Err(SyncError::GroupNotFound(layer_id.to_string()));
            };
            group.write_metadata(frames);
            info!(group = %group_id, members = group.members.len(), "Layer linked");
            notices.push(Notice::info(format!(
                "Linked '{}' across {} layers",
                name,
                group.members.len()
            )));
            Ok(())
        })
    }

    /// Removes a layer from its group and detaches it from future syncs.
    #[instrument(level = "debug", skip(self, frames))]
    pub fn unlink_layer(&mut self, frames: &[Frame], frame_id: &str, layer_id: &str) -> SyncOutcome {
        self.run("unlink layer", frames, |frames, registry, _config, notices| {
            let idx = lookup::frame_index(frames, frame_id)?;
            let name = lookup::layer(&frames[idx], layer_id)?.name.clone();
            let group_id = registry
                .group_of(layer_id)
                .map(|g| g.id.clone())
                .ok_or_else(|| SyncError::GroupNotFound(layer_id.to_string()))?;

            registry.remove_layer(layer_id);
            let frame = &mut frames[idx];
            if let Some(layer) = frame.find_layer_mut(layer_id) {
                layer.linked_layer = None;
                layer.locked = false;
            }
            frame.detached_layers.insert(layer_id.to_string());

            if let Some(group) = registry.group(&group_id) {
                group.write_metadata(frames);
            }
            info!(group = %group_id, layer = layer_id, "Layer unlinked");
            notices.push(Notice::info(format!("Unlinked '{}'", name)));
            Ok(())
        })
    }

    /// Sets the animation sync mode of the layer's whole group.
    #[instrument(level = "debug", skip(self, frames))]
    pub fn set_sync_mode(&mut self, frames: &[Frame], layer_id: &str, mode: SyncMode) -> SyncOutcome {
        self.run("set sync mode", frames, |frames, registry, _config, notices| {
            let group_id = registry
                .group_of(layer_id)
                .map(|g| g.id.clone())
                .ok_or_else(|| SyncError::GroupNotFound(layer_id.to_string()))?;
            registry.set_sync_mode(&group_id, mode);
            if let Some(group) = registry.group(&group_id) {
                group.write_metadata(frames);
                notices.push(Notice::info(format!("'{}' now syncs {:?}", group.name, mode)));
            }
            Ok(())
        })
    }

    /// Toggles the override on a layer in one frame. Turning it off resyncs
    /// the layer from a non-overridden peer.
    #[instrument(level = "debug", skip(self, frames))]
    pub fn toggle_override(&mut self, frames: &[Frame], frame_id: &str, layer_id: &str) -> SyncOutcome {
        self.run("toggle override", frames, |frames, registry, config, notices| {
            let overridden = toggle_override_with_resync(frames, registry, config, frame_id, layer_id)?;
            let state = if overridden { "enabled" } else { "disabled" };
            info!(frame = frame_id, layer = layer_id, overridden, "Override toggled");
            notices.push(Notice::info(format!("Override {} for {}", state, layer_id)));
            Ok(())
        })
    }

    /// Replaces a layer's animation list and syncs it through its group.
    #[instrument(level = "debug", skip(self, frames, animations))]
    pub fn update_animations(
        &mut self,
        frames: &[Frame],
        frame_id: &str,
        layer_id: &str,
        animations: Vec<Animation>,
    ) -> SyncOutcome {
        self.run("update animations", frames, |frames, registry, _config, notices| {
            let idx = lookup::frame_index(frames, frame_id)?;
            let layer = lookup::layer_mut(&mut frames[idx], layer_id)?;
            layer.animations = animations;
            ensure_animation_ids(&mut layer.animations);

            let updated = sync_animations(frames, registry, frame_id, layer_id, notices)?;
            if updated > 0 {
                info!(layer = layer_id, updated, "Animations synced");
                notices.push(Notice::info(format!("Synced animations to {} linked layers", updated)));
            }
            Ok(())
        })
    }

    /// Flips one animation entry's override on a layer. Turning it off pulls
    /// the layer's animations from a non-overridden peer.
    #[instrument(level = "debug", skip(self, frames))]
    pub fn toggle_animation_override(
        &mut self,
        frames: &[Frame],
        frame_id: &str,
        layer_id: &str,
        animation_id: &str,
    ) -> SyncOutcome {
        self.run("toggle animation override", frames, |frames, registry, config, notices| {
            let idx = lookup::frame_index(frames, frame_id)?;
            let layer = lookup::layer_mut(&mut frames[idx], layer_id)?;
            let anim = layer
                .animations
                .iter_mut()
                .find(|a| a.id.as_deref() == Some(animation_id))
                .ok_or_else(|| SyncError::AnimationNotFound {
                    layer_id: layer_id.to_string(),
                    animation_id: animation_id.to_string(),
                })?;
            anim.is_overridden = !anim.is_overridden;
            let overridden = anim.is_overridden;
            if let Some(info) = layer.linked_layer.as_mut() {
                info.overrides.retain(|id| id != animation_id);
                if overridden {
                    info.overrides.push(animation_id.to_string());
                }
            }

            if !overridden {
                if let Some(group) = registry.group_of(layer_id) {
                    if group.sync_mode != SyncMode::Independent {
                        if let Some((peer_idx, peer_layer)) = truth_peer(frames, registry, config, idx, layer_id)? {
                            let source = lookup::layer(&frames[peer_idx], &peer_layer)?.animations.clone();
                            pull_animations(&mut frames[idx], layer_id, &source, group.sync_mode)?;
                        }
                    }
                }
            }
            let state = if overridden { "enabled" } else { "disabled" };
            notices.push(Notice::info(format!("Animation override {} for {}", state, animation_id)));
            Ok(())
        })
    }

    /// Links same-named layers across ad sizes for the session's mode.
    #[instrument(level = "debug", skip_all)]
    pub fn auto_link(&mut self, frames: &[Frame]) -> SyncOutcome {
        self.run("auto-link", frames, |frames, registry, config, notices| {
            let touched = registry.auto_link(frames, config.mode, config.default_sync_mode);
            for group_id in &touched {
                if let Some(group) = registry.group(group_id) {
                    group.write_metadata(frames);
                }
            }
            info!(groups = touched.len(), "Auto-link complete");
            notices.push(Notice::info(format!("Auto-linked {} layer groups", touched.len())));
            Ok(())
        })
    }

    /// Runs one pass on copies of the frames and registry, committing both
    /// only on success.
    fn run<F>(&mut self, action: &str, frames: &[Frame], pass: F) -> SyncOutcome
    where
        F: FnOnce(&mut Vec<Frame>, &mut LinkRegistry, &SyncConfig, &mut Vec<Notice>) -> Result<(), SyncError>,
    {
        let mut working = frames.to_vec();
        let mut registry = self.registry.clone();
        let mut notices = Vec::new();

        match pass(&mut working, &mut registry, &self.config, &mut notices) {
            Ok(()) => {
                self.registry = registry;
                SyncOutcome {
                    frames: working,
                    notices,
                    applied: true,
                }
            }
            Err(e) => {
                let notice = if e.is_not_found() {
                    warn!(action, "Nothing to do: {}", e);
                    Notice::warning(format!("Cannot {}: {}", action, e))
                } else {
                    error!(action, "Aborted, input left unchanged: {}", e);
                    Notice::error(format!("Failed to {}: {}", action, e))
                };
                SyncOutcome {
                    frames: frames.to_vec(),
                    notices: vec![notice],
                    applied: false,
                }
            }
        }
    }
}

fn apply_visibility(
    frames: &mut [Frame],
    registry: &mut LinkRegistry,
    config: &SyncConfig,
    frame_id: &str,
    layer_id: &str,
    visible: bool,
    notices: &mut Vec<Notice>,
) -> Result<(), SyncError> {
    let report = sync_visibility(frames, registry, config, frame_id, layer_id, visible, notices)?;
    if !report.synced.is_empty() {
        info!(layer = layer_id, visible, synced = report.synced.len(), "Visibility synced");
        notices.push(Notice::info(format!(
            "Synced visibility to {} linked layers",
            report.synced.len()
        )));
    }
    Ok(())
}
