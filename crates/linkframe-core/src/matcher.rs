//! # Matcher Module
//!
//! Resolves the layer in another frame that represents "the same" layer.
//!
//! Strategies are tried in order and the first success wins:
//! 1. exact name, case-insensitive, searched through containers
//! 2. role, the lower-cased first word of the name
//! 3. position in the flattened tree, only when the target has no layer names
//! 4. id translation for `layer-<context>-<suffix>` ids
//!
//! A translated id that does not exist in the target comes back with
//! [`MatchConfidence::Low`]; callers must report it.

use linkframe_data::model::{Frame, FrameContext, Layer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchStrategy {
    /// Resolved through link-group membership rather than the chain.
    Linked,
    ExactName,
    Role,
    Position,
    IdPattern,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchConfidence {
    High,
    /// Pattern-only guess not present in the target's layer set.
    Low,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LayerMatch {
    pub layer_id: String,
    pub strategy: MatchStrategy,
    pub confidence: MatchConfidence,
}

impl LayerMatch {
    fn high(layer: &Layer, strategy: MatchStrategy) -> Self {
        Self {
            layer_id: layer.id.clone(),
            strategy,
            confidence: MatchConfidence::High,
        }
    }

    pub fn is_low_confidence(&self) -> bool {
        self.confidence == MatchConfidence::Low
    }
}

/// The layer being matched, described in its own frame.
#[derive(Debug, Clone, Copy)]
pub struct MatchSource<'a> {
    pub layer_id: &'a str,
    pub name: &'a str,
    pub frame_id: &'a str,
    pub context: &'a FrameContext,
    /// Position in the source frame's flattened tree.
    pub index: Option<usize>,
}

/// First word of a layer name, lower-cased. `"Background Layer"` -> `"background"`.
pub fn role_of(name: &str) -> Option<String> {
    name.split_whitespace().next().map(str::to_lowercase)
}

/// Finds the best equivalent of `source` in `target`, or `None` to skip the frame.
pub fn find_equivalent(source: &MatchSource<'_>, target: &Frame) -> Option<LayerMatch> {
    let candidates: Vec<&Layer> = target
        .flatten()
        .into_iter()
        .filter(|l| !target.is_detached(&l.id))
        .collect();

    let name = source.name.trim();
    if !name.is_empty() {
        let wanted = name.to_lowercase();
        if let Some(layer) = candidates
            .iter()
            .find(|l| l.name.trim().to_lowercase() == wanted)
        {
            return Some(LayerMatch::high(layer, MatchStrategy::ExactName));
        }

        if let Some(role) = role_of(name) {
            if let Some(layer) = candidates
                .iter()
                .find(|l| role_of(&l.name).as_deref() == Some(role.as_str()))
            {
                return Some(LayerMatch::high(layer, MatchStrategy::Role));
            }
        }
    }

    let names_unavailable =
        !candidates.is_empty() && candidates.iter().all(|l| l.name.trim().is_empty());
    if names_unavailable {
        if let Some(layer) = source.index.and_then(|i| candidates.get(i)) {
            return Some(LayerMatch::high(layer, MatchStrategy::Position));
        }
    }

    translate_id(source, target).map(|layer_id| {
        let confidence = if candidates.iter().any(|l| l.id == layer_id) {
            MatchConfidence::High
        } else {
            MatchConfidence::Low
        };
        LayerMatch {
            layer_id,
            strategy: MatchStrategy::IdPattern,
            confidence,
        }
    })
}

/// Swaps the context segment of a `layer-<context>-<suffix>` id.
///
/// The context is the source's ad-size id, or failing that its frame id.
fn translate_id(source: &MatchSource<'_>, target: &Frame) -> Option<String> {
    let target_ctx = target.context();
    let pairs = [
        (source.context.ad_size_id.as_str(), target_ctx.ad_size_id.as_str()),
        (source.frame_id, target.id.as_str()),
    ];
    pairs.iter().find_map(|(from, to)| {
        let suffix = source.layer_id.strip_prefix(&format!("layer-{}-", from))?;
        if suffix.is_empty() {
            return None;
        }
        Some(format!("layer-{}-{}", to, suffix))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use linkframe_data::model::LayerKind;

    fn frame(id: &str, layers: Vec<Layer>) -> Frame {
        Frame::new(id, layers)
    }

    fn text(id: &str, name: &str) -> Layer {
        Layer::new(id, name, LayerKind::Text)
    }

    fn source<'a>(layer_id: &'a str, name: &'a str, ctx: &'a FrameContext) -> MatchSource<'a> {
        MatchSource {
            layer_id,
            name,
            frame_id: "gif-frame-frame-1-1",
            context: ctx,
            index: Some(0),
        }
    }

    fn ctx() -> FrameContext {
        FrameContext {
            ad_size_id: "frame-1".into(),
            frame_number: Some(1),
        }
    }

    #[test]
    fn exact_name_searches_containers() {
        let target = frame(
            "gif-frame-frame-2-1",
            vec![Layer::new(
                "grp",
                "Copy",
                LayerKind::Group {
                    children: vec![text("h2", "HEADLINE")],
                },
            )],
        );
        let c = ctx();
        let m = find_equivalent(&source("h1", "Headline", &c), &target).unwrap();
        assert_eq!(m.layer_id, "h2");
        assert_eq!(m.strategy, MatchStrategy::ExactName);
    }

    #[test]
    fn role_match_when_names_differ() {
        let target = frame(
            "gif-frame-frame-2-1",
            vec![text("x", "Logo"), text("bg2", "background image")],
        );
        let c = ctx();
        let m = find_equivalent(&source("bg1", "Background Layer", &c), &target).unwrap();
        assert_eq!(m.layer_id, "bg2");
        assert_eq!(m.strategy, MatchStrategy::Role);
    }

    #[test]
    fn position_only_without_target_names() {
        let unnamed = frame("gif-frame-frame-2-1", vec![text("a", ""), text("b", " ")]);
        let c = ctx();
        let mut src = source("h1", "Headline", &c);
        src.index = Some(1);
        let m = find_equivalent(&src, &unnamed).unwrap();
        assert_eq!(m.layer_id, "b");
        assert_eq!(m.strategy, MatchStrategy::Position);

        let named = frame("gif-frame-frame-2-1", vec![text("a", "Logo"), text("b", "")]);
        assert_eq!(find_equivalent(&src, &named), None);
    }

    #[test]
    fn id_pattern_is_validated_against_target() {
        let c = ctx();
        let src = source("layer-frame-1-cta", "Shop", &c);

        let with_layer = frame(
            "gif-frame-frame-2-1",
            vec![text("layer-frame-2-cta", "Button")],
        );
        let m = find_equivalent(&src, &with_layer).unwrap();
        assert_eq!(m.strategy, MatchStrategy::IdPattern);
        assert_eq!(m.confidence, MatchConfidence::High);

        let without = frame("gif-frame-frame-2-1", vec![text("other", "Button")]);
        let m = find_equivalent(&src, &without).unwrap();
        assert_eq!(m.layer_id, "layer-frame-2-cta");
        assert!(m.is_low_confidence());
    }

    #[test]
    fn detached_layers_are_not_candidates() {
        let mut target = frame("gif-frame-frame-2-1", vec![text("h2", "Headline")]);
        target.detached_layers.insert("h2".into());
        let c = ctx();
        assert_eq!(find_equivalent(&source("h1", "Headline", &c), &target), None);
    }
}
