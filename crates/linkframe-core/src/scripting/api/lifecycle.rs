//! # Lifecycle API
//!
//! Project loading and inspection for Rhai scripts.
//!
//! ## Responsibilities
//! - **Loading**: `load_project` from JSON, optionally with a sync config
//! - **Inspection**: `frame_ids`, `notices`, `group_count`
//! - **Export**: `to_json`

use crate::config::SyncConfig;
use crate::session::LinkSession;
use linkframe_data::model::Project;
use rhai::{Array, Dynamic, Engine, EvalAltResult};

use super::super::types::ProjectHandle;

/// Without an explicit config, the session edits the project's own mode.
fn load(json: &str, config: Option<SyncConfig>) -> Result<ProjectHandle, Box<EvalAltResult>> {
    let project: Project =
        serde_json::from_str(json).map_err(|e| format!("Failed to parse project: {}", e))?;
    let config = config.unwrap_or_else(|| SyncConfig::default().with_mode(project.mode));
    Ok(ProjectHandle::new(LinkSession::new(config), &project.frames))
}

/// Register lifecycle-related Rhai functions.
pub fn register(engine: &mut Engine) {
    engine.register_type_with_name::<ProjectHandle>("Project");

    // Overload 1: default config
    engine.register_fn("load_project", |json: &str| load(json, None));

    // Overload 2: config JSON
    engine.register_fn(
        "load_project",
        |json: &str, config: &str| -> Result<ProjectHandle, Box<EvalAltResult>> {
            let config = SyncConfig::from_json(config).map_err(|e| format!("Invalid sync config: {}", e))?;
            load(json, Some(config))
        },
    );

    engine.register_fn("frame_ids", |project: &mut ProjectHandle| -> Array {
        project
            .lock()
            .frames
            .iter()
            .map(|f| Dynamic::from(f.id.clone()))
            .collect()
    });

    engine.register_fn("group_count", |project: &mut ProjectHandle| {
        project.lock().session.registry().len() as i64
    });

    engine.register_fn("notices", |project: &mut ProjectHandle| -> Array {
        project
            .lock()
            .notices
            .iter()
            .map(|n| Dynamic::from(n.to_string()))
            .collect()
    });

    engine.register_fn(
        "to_json",
        |project: &mut ProjectHandle| -> Result<String, Box<EvalAltResult>> {
            let state = project.lock();
            serde_json::to_string_pretty(&state.frames)
                .map_err(|e| format!("Failed to serialize frames: {}", e).into())
        },
    );
}
