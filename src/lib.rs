//! # Linkframe
//!
//! `linkframe` links equivalent layers across the ad-size variants of an
//! animation project and keeps their visibility and animations in step.
//!
//! This crate re-exports the workspace members:
//!
//! *   [`data`]: the serde model of projects, frames, layers and animations.
//! *   [`engine`]: the registry, matcher, sync passes and the [`LinkSession`] facade.

pub use linkframe_core as engine;
pub use linkframe_data as data;

pub use linkframe_core::{LinkSession, Notice, NoticeLevel, SyncConfig, SyncError, SyncOutcome};
pub use linkframe_data::model::{Frame, Layer, Project};
