use crate::errors::SyncError;
use linkframe_data::model::{Frame, Layer};

pub(crate) fn frame_index(frames: &[Frame], frame_id: &str) -> Result<usize, SyncError> {
    frames
        .iter()
        .position(|f| f.id == frame_id)
        .ok_or_else(|| SyncError::FrameNotFound(frame_id.to_string()))
}

/// Checks the frame's tree for duplicate ids before any write.
pub(crate) fn ensure_unique_ids(frame: &Frame) -> Result<(), SyncError> {
    match frame.duplicate_layer_id() {
        Some(dup) => Err(SyncError::DuplicateLayerId {
            frame_id: frame.id.clone(),
            layer_id: dup.to_string(),
        }),
        None => Ok(()),
    }
}

pub(crate) fn layer<'a>(frame: &'a Frame, layer_id: &str) -> Result<&'a Layer, SyncError> {
    ensure_unique_ids(frame)?;
    frame
        .find_layer(layer_id)
        .ok_or_else(|| SyncError::LayerNotFound {
            frame_id: frame.id.clone(),
            layer_id: layer_id.to_string(),
        })
}

pub(crate) fn layer_mut<'a>(frame: &'a mut Frame, layer_id: &str) -> Result<&'a mut Layer, SyncError> {
    ensure_unique_ids(frame)?;
    let frame_id = frame.id.clone();
    frame
        .find_layer_mut(layer_id)
        .ok_or_else(|| SyncError::LayerNotFound {
            frame_id,
            layer_id: layer_id.to_string(),
        })
}
