// linkframe-data: Serde structs for frames, layers and ad sizes
pub mod frame_id;
pub mod model;

pub use frame_id::{build_frame_id, parse_frame_id, FrameAddress, GIF_FRAME_PREFIX};

#[cfg(test)]
mod tests {
    use super::model::*;
    use serde_json::json;

    #[test]
    fn test_deserialize_minimal_frame() {
        let data = json!({
            "id": "gif-frame-frame-1-1",
            "layers": []
        });
        let frame: Frame = serde_json::from_value(data).unwrap();
        assert_eq!(frame.visible_layer_count, 0);
        assert!(frame.hidden_layers.is_empty());
        assert_eq!(frame.context().frame_number, Some(1));
    }

    #[test]
    fn test_deserialize_layer_tree() {
        let data = json!({
            "id": "gif-frame-frame-2-1",
            "name": "728x90 / 1",
            "width": 728,
            "height": 90,
            "hiddenLayers": ["cta"],
            "overrides": { "layerVisibility": { "h2": { "overridden": true } } },
            "layers": [
                { "id": "h2", "name": "Headline", "type": "text" },
                {
                    "id": "g1", "name": "Buttons", "type": "group",
                    "children": [
                        { "id": "cta", "name": "CTA", "type": "button", "visible": false }
                    ]
                }
            ]
        });
        let mut frame: Frame = serde_json::from_value(data).unwrap();
        assert!(frame.is_overridden("h2"));
        assert!(frame.layers[1].kind.is_container());
        assert_eq!(frame.flatten().len(), 3);
        assert_eq!(frame.layer_index("cta"), Some(2));

        frame.repair();
        assert_eq!(frame.visible_layer_count, 2);
    }

    #[test]
    fn test_set_hidden_keeps_cache_in_step() {
        let mut frame = Frame::new(
            "gif-frame-a-1",
            vec![Layer::new(
                "root",
                "Root",
                LayerKind::Frame {
                    children: vec![Layer::new("logo", "Logo", LayerKind::Image)],
                },
            )],
        );
        assert_eq!(frame.visible_layer_count, 2);

        assert!(frame.set_hidden("logo", true));
        frame.recompute_visible_count();
        assert!(!frame.find_layer("logo").unwrap().visible);
        assert_eq!(frame.visible_layer_count, 1);

        assert!(!frame.set_hidden("ghost", true));
        assert!(frame.is_hidden("ghost"));
    }

    #[test]
    fn test_animation_defaults() {
        let data = json!({ "type": "fade", "opacity": { "from": 0.0, "to": 1.0 } });
        let anim: Animation = serde_json::from_value(data).unwrap();
        assert_eq!(anim.id, None);
        assert_eq!(anim.duration, 1.0);
        assert_eq!(anim.easing, EasingType::Linear);
        assert!(!anim.is_overridden);
    }

    #[test]
    fn test_animation_mode_context() {
        let mut frame = Frame::new("timeline-main", vec![]);
        frame.ad_size_id = Some("300x250".into());
        let ctx = frame.context();
        assert_eq!(ctx.ad_size_id, "300x250");
        assert_eq!(ctx.mode(), LinkMode::Animation);
    }
}
