use linkframe_data::model::{Project, SyncMode};

const PROJECT: &str = r#"{
    "adSizes": [
        { "id": "frame-1", "width": 300, "height": 250 },
        { "id": "frame-2", "width": 728, "height": 90 }
    ],
    "mode": "gif",
    "frames": [
        {
            "id": "gif-frame-frame-1-1",
            "name": "300x250 / 1",
            "width": 300,
            "height": 250,
            "hiddenLayers": [],
            "visibleLayerCount": 1,
            "layers": [
                {
                    "id": "h1",
                    "name": "Headline",
                    "type": "text",
                    "visible": true,
                    "locked": true,
                    "animations": [
                        {
                            "id": "anim-1",
                            "type": "slide",
                            "startTime": 0.5,
                            "duration": 0.8,
                            "delay": 0.1,
                            "easing": "ease_out",
                            "direction": "left",
                            "position": { "x": -40.0, "y": 0.0 },
                            "custom": { "stagger": 2 },
                            "isOverridden": false
                        }
                    ],
                    "linkedLayer": {
                        "groupId": "gif-link-0011223344556677",
                        "syncMode": "partial",
                        "isMain": true,
                        "overrides": ["anim-9"]
                    }
                }
            ]
        }
    ]
}"#;

#[test]
fn project_survives_persistence_round_trip() {
    let project: Project = serde_json::from_str(PROJECT).expect("project should parse");
    let info = project.frames[0].layers[0]
        .linked_layer
        .as_ref()
        .expect("layer should be linked");
    assert_eq!(info.sync_mode, SyncMode::Partial);
    assert_eq!(info.overrides, vec!["anim-9".to_string()]);

    let text = serde_json::to_string(&project).unwrap();
    let again: Project = serde_json::from_str(&text).unwrap();
    assert_eq!(project, again);
}
