use linkframe_data::model::LinkMode;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SyncError {
    #[error("Frame not found: {0}")]
    FrameNotFound(String),
    #[error("Layer {layer_id} not found in frame {frame_id}")]
    LayerNotFound { frame_id: String, layer_id: String },
    #[error("Layer {0} is not linked")]
    GroupNotFound(String),
    #[error("Animation {animation_id} not found on layer {layer_id}")]
    AnimationNotFound {
        layer_id: String,
        animation_id: String,
    },
    #[error("Layer {layer_id} cannot join a {mode} link group")]
    ModeConflict { layer_id: String, mode: LinkMode },
    #[error("Layer {layer_id} is already linked to group {group_id}")]
    AlreadyLinked { layer_id: String, group_id: String },
    #[error("Group {group_id} already has a member in frame {frame_id}")]
    FrameOccupied { group_id: String, frame_id: String },
    #[error("Layer id {layer_id} occurs more than once in frame {frame_id}")]
    DuplicateLayerId { frame_id: String, layer_id: String },
}

impl SyncError {
    /// Missing frames, layers, groups or animations. Surfaced as warnings.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            SyncError::FrameNotFound(_)
                | SyncError::LayerNotFound { .. }
                | SyncError::GroupNotFound(_)
                | SyncError::AnimationNotFound { .. }
        )
    }
}
