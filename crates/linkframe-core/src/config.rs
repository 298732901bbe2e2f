//! # Config Module
//!
//! Session-wide sync policy.
//!
//! ## Responsibilities
//! - **Partition**: which link mode (`animation` or `gif`) the session edits.
//! - **Scope**: which frames receive a visibility sync.
//! - **Background classification**: the name patterns that mark a layer as
//!   background-class, with inverted hidden-set semantics.

use linkframe_data::model::{FrameContext, LinkMode, SyncMode};
use serde::{Deserialize, Serialize};

/// Which frames a sync pass may touch.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FrameScope {
    /// Only frames sharing the source's frame number.
    #[default]
    SameFrameNumber,
    /// Every frame of the session's mode.
    AllFrames,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub mode: LinkMode,
    pub scope: FrameScope,
    /// Skip frames that share the source frame's ad size.
    pub cross_ad_size_only: bool,
    /// Case-insensitive substrings marking a background-class layer.
    pub background_patterns: Vec<String>,
    /// Sync mode given to newly created link groups.
    pub default_sync_mode: SyncMode,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            mode: LinkMode::Gif,
            scope: FrameScope::SameFrameNumber,
            cross_ad_size_only: true,
            background_patterns: ["background", "bg", "backdrop", "back layer", "bkgd"]
                .into_iter()
                .map(String::from)
                .collect(),
            default_sync_mode: SyncMode::Full,
        }
    }
}

impl SyncConfig {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn with_mode(mut self, mode: LinkMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn is_background(&self, layer_name: &str) -> bool {
        let name = layer_name.to_lowercase();
        self.background_patterns
            .iter()
            .any(|p| !p.is_empty() && name.contains(&p.to_lowercase()))
    }

    /// The raw hidden-set value that realizes a visibility intent.
    ///
    /// Background-class layers store the inverse of the intent.
    pub fn hidden_marker(&self, layer_name: &str, make_visible: bool) -> bool {
        if self.is_background(layer_name) {
            make_visible
        } else {
            !make_visible
        }
    }

    /// Whether a frame in `target` context receives syncs from `source`.
    pub fn in_scope(&self, source: &FrameContext, target: &FrameContext) -> bool {
        if target.mode() != source.mode() {
            return false;
        }
        if self.scope == FrameScope::SameFrameNumber && target.frame_number != source.frame_number {
            return false;
        }
        !(self.cross_ad_size_only && target.ad_size_id == source.ad_size_id)
    }
}
