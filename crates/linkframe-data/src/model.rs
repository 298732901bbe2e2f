use crate::frame_id::{parse_frame_id, FrameAddress};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    #[serde(default)]
    pub ad_sizes: Vec<AdSize>,
    #[serde(default)]
    pub frames: Vec<Frame>,
    #[serde(default)]
    pub mode: LinkMode,
}

/// A creative dimension variant, e.g. 300x250.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdSize {
    pub id: String,
    pub width: u32,
    pub height: u32,
}

/// Which link partition a frame or group belongs to.
///
/// A layer linked in one mode is never linked in the other.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkMode {
    /// Timeline editing, one frame per ad size.
    Animation,
    /// GIF frame editing, frames addressed by `gif-frame-<adSize>-<n>`.
    #[default]
    Gif,
}

impl fmt::Display for LinkMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinkMode::Animation => write!(f, "animation"),
            LinkMode::Gif => write!(f, "gif"),
        }
    }
}

/// How a link group propagates animation edits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SyncMode {
    #[default]
    Full,
    Partial,
    Independent,
}

/// Link metadata carried by a linked layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkedLayerInfo {
    pub group_id: String,
    #[serde(default)]
    pub sync_mode: SyncMode,
    #[serde(default)]
    pub is_main: bool,
    /// Animation ids excluded from inbound sync.
    #[serde(default)]
    pub overrides: Vec<String>,
}

/// Supported easing functions for animations.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EasingType {
    #[default]
    Linear,
    EaseIn,
    EaseOut,
    EaseInOut,
    BounceOut,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnimationKind {
    Fade,
    Slide,
    Scale,
    Rotate,
    Bounce,
    Pulse,
    Custom,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
    In,
    Out,
}

/// A `from`/`to` pair for opacity and scale animations.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub from: f64,
    pub to: f64,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// One animation entry on a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Animation {
    /// Assigned lazily on first sync; unique within the owning layer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "type")]
    pub kind: AnimationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<f64>,
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default)]
    pub delay: f64,
    #[serde(default)]
    pub easing: EasingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opacity: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scale: Option<Bounds>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rotation: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom: Option<serde_json::Value>,
    /// Excludes this entry from inbound sync on its layer.
    #[serde(default)]
    pub is_overridden: bool,
}

fn default_duration() -> f64 {
    1.0
}

impl Animation {
    pub fn new(kind: AnimationKind, duration: f64) -> Self {
        Self {
            id: None,
            kind,
            start_time: None,
            duration,
            delay: 0.0,
            easing: EasingType::Linear,
            direction: None,
            opacity: None,
            scale: None,
            rotation: None,
            position: None,
            custom: None,
            is_overridden: false,
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

/// The type tag of a layer. Container variants own their children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerKind {
    Text,
    Rectangle,
    Image,
    Button,
    Vector,
    Group {
        #[serde(default)]
        children: Vec<Layer>,
    },
    Frame {
        #[serde(default)]
        children: Vec<Layer>,
    },
}

impl LayerKind {
    pub fn is_container(&self) -> bool {
        matches!(self, LayerKind::Group { .. } | LayerKind::Frame { .. })
    }

    pub fn children(&self) -> &[Layer] {
        match self {
            LayerKind::Group { children } | LayerKind::Frame { children } => children,
            _ => &[],
        }
    }

    pub fn children_mut(&mut self) -> Option<&mut Vec<Layer>> {
        match self {
            LayerKind::Group { children } | LayerKind::Frame { children } => Some(children),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Layer {
    pub id: String,
    /// Not unique within a frame, but the cross-frame matching key.
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub kind: LayerKind,
    /// Cache of the owning frame's hidden set. See [`Frame::set_hidden`].
    #[serde(default = "default_true")]
    pub visible: bool,
    /// True iff the layer participates in a link group.
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub animations: Vec<Animation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_layer: Option<LinkedLayerInfo>,
}

fn default_true() -> bool {
    true
}

impl Layer {
    pub fn new(id: impl Into<String>, name: impl Into<String>, kind: LayerKind) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            kind,
            visible: true,
            locked: false,
            animations: Vec::new(),
            linked_layer: None,
        }
    }

    pub fn children(&self) -> &[Layer] {
        self.kind.children()
    }

    pub fn is_linked(&self) -> bool {
        self.linked_layer.is_some()
    }

    /// Visits this layer and its descendants depth-first, parents first.
    pub fn walk<'a>(&'a self, out: &mut Vec<&'a Layer>) {
        out.push(self);
        for child in self.children() {
            child.walk(out);
        }
    }

    fn find_mut(&mut self, id: &str) -> Option<&mut Layer> {
        if self.id == id {
            return Some(self);
        }
        self.kind
            .children_mut()?
            .iter_mut()
            .find_map(|child| child.find_mut(id))
    }

    fn for_each_mut(&mut self, f: &mut dyn FnMut(&mut Layer)) {
        f(self);
        if let Some(children) = self.kind.children_mut() {
            for child in children {
                child.for_each_mut(f);
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameOverrides {
    #[serde(default)]
    pub layer_visibility: BTreeMap<String, LayerOverride>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerOverride {
    #[serde(default)]
    pub overridden: bool,
}

/// Where a frame sits: its ad size and, for GIF frames, its sequence bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FrameContext {
    pub ad_size_id: String,
    /// `None` for animation-mode frames, which form a single timeline bucket.
    pub frame_number: Option<u32>,
}

impl FrameContext {
    pub fn mode(&self) -> LinkMode {
        match self.frame_number {
            Some(_) => LinkMode::Gif,
            None => LinkMode::Animation,
        }
    }
}

/// One position in a frame sequence for one ad size.
///
/// `hidden_layers` is the source of truth for visibility; each layer's
/// `visible` flag and `visible_layer_count` are derived from it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Frame {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub width: u32,
    #[serde(default)]
    pub height: u32,
    /// Ad-size context of animation-mode frames, whose ids carry none.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ad_size_id: Option<String>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub hidden_layers: BTreeSet<String>,
    #[serde(default)]
    pub overrides: FrameOverrides,
    #[serde(default)]
    pub visible_layer_count: usize,
    /// Layers explicitly unlinked; they neither drive nor receive sync.
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub detached_layers: BTreeSet<String>,
}

impl Frame {
    pub fn new(id: impl Into<String>, layers: Vec<Layer>) -> Self {
        let mut frame = Self {
            id: id.into(),
            layers,
            ..Default::default()
        };
        frame.repair();
        frame
    }

    pub fn address(&self) -> Option<FrameAddress> {
        parse_frame_id(&self.id)
    }

    pub fn context(&self) -> FrameContext {
        match self.address() {
            Some(addr) => FrameContext {
                ad_size_id: addr.ad_size_id,
                frame_number: Some(addr.frame_number),
            },
            None => FrameContext {
                ad_size_id: self.ad_size_id.clone().unwrap_or_else(|| self.id.clone()),
                frame_number: None,
            },
        }
    }

    /// All layers, depth-first with parents before children.
    pub fn flatten(&self) -> Vec<&Layer> {
        let mut out = Vec::new();
        for layer in &self.layers {
            layer.walk(&mut out);
        }
        out
    }

    pub fn find_layer(&self, id: &str) -> Option<&Layer> {
        self.flatten().into_iter().find(|l| l.id == id)
    }

    pub fn find_layer_mut(&mut self, id: &str) -> Option<&mut Layer> {
        self.layers.iter_mut().find_map(|l| l.find_mut(id))
    }

    /// Position of a layer in [`Frame::flatten`] order.
    pub fn layer_index(&self, id: &str) -> Option<usize> {
        self.flatten().iter().position(|l| l.id == id)
    }

    pub fn for_each_layer_mut(&mut self, mut f: impl FnMut(&mut Layer)) {
        for layer in &mut self.layers {
            layer.for_each_mut(&mut f);
        }
    }

    /// The first layer id that occurs more than once in the tree.
    pub fn duplicate_layer_id(&self) -> Option<&str> {
        let mut seen = BTreeSet::new();
        self.flatten()
            .into_iter()
            .find(|l| !seen.insert(l.id.as_str()))
            .map(|l| l.id.as_str())
    }

    pub fn is_hidden(&self, layer_id: &str) -> bool {
        self.hidden_layers.contains(layer_id)
    }

    /// Writes a layer's hidden state to the hidden set and the layer's
    /// `visible` cache together. Returns whether the layer exists in the tree.
    pub fn set_hidden(&mut self, layer_id: &str, hidden: bool) -> bool {
        if hidden {
            self.hidden_layers.insert(layer_id.to_string());
        } else {
            self.hidden_layers.remove(layer_id);
        }
        match self.find_layer_mut(layer_id) {
            Some(layer) => {
                layer.visible = !hidden;
                true
            }
            None => false,
        }
    }

    pub fn count_visible_layers(&self) -> usize {
        self.flatten()
            .into_iter()
            .filter(|l| !self.hidden_layers.contains(&l.id))
            .count()
    }

    pub fn recompute_visible_count(&mut self) {
        self.visible_layer_count = self.count_visible_layers();
    }

    /// Re-derives every `visible` cache and the visible count from the hidden set.
    pub fn repair(&mut self) {
        let hidden = std::mem::take(&mut self.hidden_layers);
        self.for_each_layer_mut(|layer| layer.visible = !hidden.contains(&layer.id));
        self.hidden_layers = hidden;
        self.recompute_visible_count();
    }

    pub fn is_overridden(&self, layer_id: &str) -> bool {
        self.overrides
            .layer_visibility
            .get(layer_id)
            .is_some_and(|o| o.overridden)
    }

    pub fn set_overridden(&mut self, layer_id: &str, overridden: bool) {
        self.overrides
            .layer_visibility
            .entry(layer_id.to_string())
            .or_default()
            .overridden = overridden;
    }

    pub fn is_detached(&self, layer_id: &str) -> bool {
        self.detached_layers.contains(layer_id)
    }
}
