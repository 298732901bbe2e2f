//! # Scripting Utilities
//!
//! Parsing helpers for Rhai script bindings.
//!
//! ## Responsibilities
//! - **Sync Modes**: `parse_sync_mode`, rejecting unknown names
//! - **Animation Parsing**: `parse_animation_kind`, `parse_easing`

use linkframe_data::model::{AnimationKind, EasingType, SyncMode};

pub fn parse_sync_mode(mode: &str) -> Option<SyncMode> {
    match mode.to_lowercase().as_str() {
        "full" => Some(SyncMode::Full),
        "partial" => Some(SyncMode::Partial),
        "independent" => Some(SyncMode::Independent),
        _ => None,
    }
}

pub fn parse_animation_kind(kind: &str) -> Option<AnimationKind> {
    match kind.to_lowercase().as_str() {
        "fade" => Some(AnimationKind::Fade),
        "slide" => Some(AnimationKind::Slide),
        "scale" => Some(AnimationKind::Scale),
        "rotate" => Some(AnimationKind::Rotate),
        "bounce" => Some(AnimationKind::Bounce),
        "pulse" => Some(AnimationKind::Pulse),
        "custom" => Some(AnimationKind::Custom),
        _ => None,
    }
}

/// Parse an easing name. Unknown names fall back to linear.
pub fn parse_easing(ease: &str) -> EasingType {
    match ease {
        "linear" => EasingType::Linear,
        "ease_in" => EasingType::EaseIn,
        "ease_out" => EasingType::EaseOut,
        "ease_in_out" => EasingType::EaseInOut,
        "bounce_out" => EasingType::BounceOut,
        _ => EasingType::Linear,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sync_modes_parse_case_insensitively() {
        assert_eq!(parse_sync_mode("Partial"), Some(SyncMode::Partial));
        assert_eq!(parse_sync_mode("none"), None);
    }

    #[test]
    fn unknown_easing_is_linear() {
        assert_eq!(parse_easing("ease_out"), EasingType::EaseOut);
        assert_eq!(parse_easing("wobble"), EasingType::Linear);
    }
}
