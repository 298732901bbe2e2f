//! # Linkframe Core
//!
//! `linkframe-core` keeps equivalent layers in step across the frames of a
//! multi-size ad project.
//!
//! A project holds one set of frames per ad size. Layers that represent the
//! same element (the "Headline" of the 300x250 and of the 728x90 creative)
//! form a link group; toggling visibility or editing animations on one member
//! propagates to the others unless a per-frame override blocks it.
//!
//! ## Core Features
//!
//! *   **Frame addressing**: GIF frame ids carry the ad size and frame number.
//! *   **Layer matching**: linked membership, exact name, role, position and id pattern, in that order.
//! *   **Link registry**: deterministic group ids, one main member per group, rebuildable from frame metadata.
//! *   **Visibility sync**: background layers use an inverted hidden marker.
//! *   **Animation sync**: `full`, `partial` and `independent` modes with per-entry overrides.
//! *   **Scripting**: Rhai bindings for batch edits.
//!
//! ## Usage
//!
//! The entry point is [`LinkSession`]. Every operation takes the current
//! frames and returns a [`SyncOutcome`] holding a fresh frame collection and
//! any notices for the user.
//!
//! ```rust,no_run
//! use linkframe_core::{LinkSession, SyncConfig};
//! use linkframe_data::model::Frame;
//!
//! let frames: Vec<Frame> = Vec::new();
//! let mut session = LinkSession::new(SyncConfig::default());
//! let loaded = session.reset(&frames);
//! let outcome = session.toggle_visibility(&loaded.frames, "gif-frame-300x250-1", "headline");
//! for notice in &outcome.notices {
//!     println!("{}", notice);
//! }
//! ```

/// Animation list merging and propagation.
pub mod animation;

/// Sync policy: mode, scope and background patterns.
pub mod config;

pub mod errors;

/// Equivalent-layer matching across frames.
pub mod matcher;

/// User-facing messages produced by a sync pass.
pub mod notice;

/// Per-frame override flags.
pub mod overrides;

/// Link groups and their membership.
pub mod registry;

/// Rhai scripting API bindings.
pub mod scripting;

/// The all-or-nothing editing facade.
pub mod session;

/// Visibility propagation.
pub mod visibility;

mod lookup;

pub use config::{FrameScope, SyncConfig};
pub use errors::SyncError;
pub use notice::{Notice, NoticeLevel, SyncOutcome};
pub use registry::{LinkGroup, LinkRegistry};
pub use session::LinkSession;
