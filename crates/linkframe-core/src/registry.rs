//! # Registry Module
//!
//! Link-group lifecycle and membership.
//!
//! ## Responsibilities
//! - **Groups**: creation with deterministic ids, membership, main designation.
//! - **Partitioning**: `animation` and `gif` groups never share a layer.
//! - **Auto-linking**: same-named layers across ad sizes, per frame-number bucket.
//! - **Rebuild**: the registry is a derived index over `linkedLayer` metadata
//!   and can be reconstructed from frames at any time.
//!
//! Layer ids are assumed unique across the whole frame collection.

use crate::errors::SyncError;
use linkframe_data::model::{Frame, FrameContext, LinkMode, LinkedLayerInfo, SyncMode};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use tracing::{debug, warn};

/// A set of layers, one per frame, treated as the same layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkGroup {
    pub id: String,
    /// The shared layer name.
    pub name: String,
    pub mode: LinkMode,
    pub members: BTreeSet<String>,
    /// Frame id to the member layer in that frame.
    pub frames: BTreeMap<String, String>,
    pub main_layer_id: String,
    pub sync_mode: SyncMode,
}

impl LinkGroup {
    /// Member layers other than `layer_id`, with their frames.
    pub fn peers_of<'a>(&'a self, layer_id: &'a str) -> impl Iterator<Item = (&'a str, &'a str)> + 'a {
        self.frames
            .iter()
            .filter(move |(_, l)| l.as_str() != layer_id)
            .map(|(f, l)| (f.as_str(), l.as_str()))
    }

    pub fn member_in(&self, frame_id: &str) -> Option<&str> {
        self.frames.get(frame_id).map(String::as_str)
    }

    /// Writes `linkedLayer` and `locked` onto every member found in `frames`.
    ///
    /// Per-layer animation overrides survive when the layer stays in this
    /// group. Returns the number of members missing from `frames`.
    pub fn write_metadata(&self, frames: &mut [Frame]) -> usize {
        let mut stale = 0;
        for (frame_id, layer_id) in &self.frames {
            let layer = frames
                .iter_mut()
                .find(|f| &f.id == frame_id)
                .and_then(|f| f.find_layer_mut(layer_id));
            let Some(layer) = layer else {
                warn!(group = %self.id, frame = %frame_id, layer = %layer_id, "Stale link group member");
                stale += 1;
                continue;
            };
            let overrides = layer
                .linked_layer
                .take()
                .filter(|info| info.group_id == self.id)
                .map(|info| info.overrides)
                .unwrap_or_default();
            layer.linked_layer = Some(LinkedLayerInfo {
                group_id: self.id.clone(),
                sync_mode: self.sync_mode,
                is_main: *layer_id == self.main_layer_id,
                overrides,
            });
            layer.locked = true;
        }
        stale
    }
}

/// Derives the id of the group for `name` in a given mode and bucket.
///
/// Re-deriving for the same lower-cased name always yields the same id, so
/// independent auto-link passes converge on one group.
pub fn group_id_for(name: &str, mode: LinkMode, bucket: Option<u32>) -> String {
    let mut hasher = Sha256::new();
    hasher.update(name.trim().to_lowercase().as_bytes());
    hasher.update(b"#");
    match bucket {
        Some(n) => hasher.update(n.to_string().as_bytes()),
        None => hasher.update(b"timeline"),
    }
    let digest = hasher.finalize();
    let hex: String = digest[..8].iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}-link-{}", mode, hex)
}

#[derive(Debug, Clone, Default)]
pub struct LinkRegistry {
    groups: BTreeMap<String, LinkGroup>,
    /// Layer id to group id.
    layer_index: HashMap<String, String>,
}

impl LinkRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reconstructs every group from the `linkedLayer` metadata in `frames`.
    ///
    /// The first member flagged `isMain` becomes main; a group without one
    /// promotes its first-seen member.
    pub fn rebuild_from_frames(frames: &[Frame]) -> Self {
        let mut registry = Self::new();
        let mut main_claimed: HashSet<String> = HashSet::new();

        for frame in frames {
            let ctx = frame.context();
            for layer in frame.flatten() {
                let Some(info) = &layer.linked_layer else {
                    continue;
                };
                if frame.is_detached(&layer.id) || registry.layer_index.contains_key(&layer.id) {
                    continue;
                }
                let group = registry
                    .groups
                    .entry(info.group_id.clone())
                    .or_insert_with(|| LinkGroup {
                        id: info.group_id.clone(),
                        name: layer.name.clone(),
                        mode: ctx.mode(),
                        members: BTreeSet::new(),
                        frames: BTreeMap::new(),
                        main_layer_id: layer.id.clone(),
                        sync_mode: info.sync_mode,
                    });
                if group.mode != ctx.mode() {
                    warn!(layer = %layer.id, group = %group.id, "Skipping cross-mode link metadata");
                    continue;
                }
                if group.frames.contains_key(&frame.id) {
                    warn!(layer = %layer.id, group = %group.id, "Skipping second member in one frame");
                    continue;
                }
                group.members.insert(layer.id.clone());
                group.frames.insert(frame.id.clone(), layer.id.clone());
                if info.is_main && main_claimed.insert(group.id.clone()) {
                    group.main_layer_id = layer.id.clone();
                    group.sync_mode = info.sync_mode;
                }
                registry
                    .layer_index
                    .insert(layer.id.clone(), info.group_id.clone());
            }
        }
        registry.debug_check();
        registry
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn groups(&self) -> impl Iterator<Item = &LinkGroup> {
        self.groups.values()
    }

    pub fn group(&self, group_id: &str) -> Option<&LinkGroup> {
        self.groups.get(group_id)
    }

    pub fn group_of(&self, layer_id: &str) -> Option<&LinkGroup> {
        self.layer_index
            .get(layer_id)
            .and_then(|gid| self.groups.get(gid))
    }

    /// Whether `layer_id` is the group member recorded for `frame_id`.
    pub fn is_member_in(&self, frame_id: &str, layer_id: &str) -> bool {
        self.group_of(layer_id)
            .is_some_and(|g| g.member_in(frame_id) == Some(layer_id))
    }

    /// Creates the group for `name`, or returns the existing one with that
    /// derived id. The main layer joins as a member either way.
    pub fn create_group(
        &mut self,
        name: &str,
        main_layer_id: &str,
        main_frame: &Frame,
        mode: LinkMode,
        sync_mode: SyncMode,
    ) -> Result<String, SyncError> {
        let ctx = main_frame.context();
        if ctx.mode() != mode {
            return Err(SyncError::ModeConflict {
                layer_id: main_layer_id.to_string(),
                mode,
            });
        }
        let group_id = group_id_for(name, mode, ctx.frame_number);
        if !self.groups.contains_key(&group_id) {
            debug!(group = %group_id, name, "Creating link group");
            self.groups.insert(
                group_id.clone(),
                LinkGroup {
                    id: group_id.clone(),
                    name: name.to_string(),
                    mode,
                    members: BTreeSet::new(),
                    frames: BTreeMap::new(),
                    main_layer_id: main_layer_id.to_string(),
                    sync_mode,
                },
            );
        }
        if let Err(e) = self.add_layer_to_group(&group_id, main_layer_id, &main_frame.id) {
            self.drop_if_empty(&group_id);
            return Err(e);
        }
        Ok(group_id)
    }

    /// Adds a layer to a group. Adding a present member is a no-op.
    pub fn add_layer_to_group(
        &mut self,
        group_id: &str,
        layer_id: &str,
        frame_id: &str,
    ) -> Result<(), SyncError> {
        let mode = self
            .groups
            .get(group_id)
            .map(|g| g.mode)
            .ok_or_else(|| SyncError::GroupNotFound(layer_id.to_string()))?;

        if let Some(existing) = self.layer_index.get(layer_id) {
            if existing == group_id {
                return Ok(());
            }
            return match self.groups.get(existing) {
                Some(other) if other.mode != mode => Err(SyncError::ModeConflict {
                    layer_id: layer_id.to_string(),
                    mode,
                }),
                _ => Err(SyncError::AlreadyLinked {
                    layer_id: layer_id.to_string(),
                    group_id: existing.clone(),
                }),
            };
        }
        let frame_mode = match linkframe_data::parse_frame_id(frame_id) {
            Some(_) => LinkMode::Gif,
            None => LinkMode::Animation,
        };
        if frame_mode != mode {
            return Err(SyncError::ModeConflict {
                layer_id: layer_id.to_string(),
                mode,
            });
        }
        let Some(group) = self.groups.get_mut(group_id) else {
            return Err(SyncError::GroupNotFound(layer_id.to_string()));
        };
        if group.frames.contains_key(frame_id) {
            return Err(SyncError::FrameOccupied {
                group_id: group_id.to_string(),
                frame_id: frame_id.to_string(),
            });
        }

        group.members.insert(layer_id.to_string());
        group
            .frames
            .insert(frame_id.to_string(), layer_id.to_string());
        if group.members.len() == 1 || !group.members.contains(&group.main_layer_id) {
            group.main_layer_id = layer_id.to_string();
        }
        self.layer_index
            .insert(layer_id.to_string(), group_id.to_string());
        self.debug_check();
        Ok(())
    }

    /// Removes a layer from its group. Returns false if it was not linked.
    ///
    /// A removed main is replaced by the first remaining member; an empty
    /// group is deleted.
    pub fn remove_layer(&mut self, layer_id: &str) -> bool {
        let Some(group_id) = self.layer_index.remove(layer_id) else {
            return false;
        };
        if let Some(group) = self.groups.get_mut(&group_id) {
            group.members.remove(layer_id);
            group.frames.retain(|_, l| l != layer_id);
            if group.main_layer_id == layer_id {
                if let Some(next) = group.members.iter().next() {
                    debug!(group = %group_id, main = %next, "Promoting new main layer");
                    group.main_layer_id = next.clone();
                }
            }
        }
        self.drop_if_empty(&group_id);
        self.debug_check();
        true
    }

    /// All other members of the layer's group, or empty if unlinked.
    pub fn get_linked_layers(&self, layer_id: &str) -> Vec<String> {
        self.group_of(layer_id)
            .map(|g| {
                g.members
                    .iter()
                    .filter(|m| m.as_str() != layer_id)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn are_linked(&self, a: &str, b: &str) -> bool {
        a != b
            && matches!(
                (self.layer_index.get(a), self.layer_index.get(b)),
                (Some(ga), Some(gb)) if ga == gb
            )
    }

    pub fn set_main(&mut self, group_id: &str, layer_id: &str) -> bool {
        match self.groups.get_mut(group_id) {
            Some(g) if g.members.contains(layer_id) => {
                g.main_layer_id = layer_id.to_string();
                true
            }
            _ => false,
        }
    }

    pub fn set_sync_mode(&mut self, group_id: &str, sync_mode: SyncMode) -> bool {
        match self.groups.get_mut(group_id) {
            Some(g) => {
                g.sync_mode = sync_mode;
                true
            }
            None => false,
        }
    }

    /// Links same-named layers across ad sizes, one group per frame-number
    /// bucket. Returns the ids of every group created or extended.
    ///
    /// Only the first layer of a name per ad size and bucket takes part, so
    /// same-context name collisions are never linked. The first-seen layer
    /// of a new group becomes its main.
    pub fn auto_link(&mut self, frames: &[Frame], mode: LinkMode, sync_mode: SyncMode) -> Vec<String> {
        struct Candidate<'a> {
            frame: &'a Frame,
            layer_id: &'a str,
            name: &'a str,
        }

        let mut buckets: BTreeMap<(String, Option<u32>), Vec<Candidate<'_>>> = BTreeMap::new();
        let mut seen: HashSet<(String, Option<u32>, String)> = HashSet::new();

        for frame in frames {
            let FrameContext {
                ad_size_id,
                frame_number,
            } = frame.context();
            if frame.context().mode() != mode {
                continue;
            }
            for layer in frame.flatten() {
                let name = layer.name.trim();
                if name.is_empty() || frame.is_detached(&layer.id) {
                    continue;
                }
                let key = name.to_lowercase();
                if !seen.insert((key.clone(), frame_number, ad_size_id.clone())) {
                    continue;
                }
                buckets
                    .entry((key, frame_number))
                    .or_default()
                    .push(Candidate {
                        frame,
                        layer_id: &layer.id,
                        name,
                    });
            }
        }

        let mut touched = Vec::new();
        for ((key, _), candidates) in buckets {
            if candidates.len() < 2 {
                continue;
            }
            let mut group_id: Option<String> = None;
            for candidate in &candidates {
                let result = match group_id.clone() {
                    Some(gid) => self.add_layer_to_group(&gid, candidate.layer_id, &candidate.frame.id),
                    None => self
                        .create_group(candidate.name, candidate.layer_id, candidate.frame, mode, sync_mode)
                        .map(|gid| {
                            group_id = Some(gid);
                        }),
                };
                if let Err(e) = result {
                    debug!(layer = candidate.layer_id, name = %key, "Auto-link skipped layer: {}", e);
                }
            }
            if let Some(gid) = group_id {
                touched.push(gid);
            }
        }
        touched
    }

    fn drop_if_empty(&mut self, group_id: &str) {
        if self.groups.get(group_id).is_some_and(|g| g.members.is_empty()) {
            debug!(group = %group_id, "Deleting empty link group");
            self.groups.remove(group_id);
        }
    }

    fn debug_check(&self) {
        debug_assert!(
            self.groups
                .values()
                .all(|g| !g.members.is_empty() && g.members.contains(&g.main_layer_id)),
            "every link group has exactly one main member"
        );
    }
}
