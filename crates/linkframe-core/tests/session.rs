//! Session Operation Tests
//!
//! Exercises link management and animation sync through the `LinkSession`
//! facade, the way the editor drives it.

use linkframe_core::{LinkSession, NoticeLevel, SyncConfig};
use linkframe_data::build_frame_id;
use linkframe_data::model::{Animation, AnimationKind, Frame, Layer, LayerKind, LinkedLayerInfo, SyncMode};

fn frame(ad: &str, n: u32, layers: &[(&str, &str)]) -> Frame {
    Frame::new(
        build_frame_id(ad, n),
        layers
            .iter()
            .map(|(id, name)| Layer::new(*id, *name, LayerKind::Text))
            .collect(),
    )
}

fn headline_frames() -> Vec<Frame> {
    vec![
        frame("300x250", 1, &[("h1", "Headline")]),
        frame("728x90", 1, &[("h2", "Headline")]),
        frame("160x600", 1, &[("h3", "Headline")]),
    ]
}

fn layer<'a>(frames: &'a [Frame], frame_idx: usize, id: &str) -> &'a Layer {
    frames[frame_idx].find_layer(id).unwrap()
}

fn anim_ids(frames: &[Frame], frame_idx: usize, id: &str) -> Vec<String> {
    layer(frames, frame_idx, id)
        .animations
        .iter()
        .filter_map(|a| a.id.clone())
        .collect()
}

fn mains(frames: &[Frame]) -> usize {
    frames
        .iter()
        .flat_map(|f| f.flatten())
        .filter(|l| l.linked_layer.as_ref().is_some_and(|i| i.is_main))
        .count()
}

#[test]
fn link_aligns_visibility_and_locks_members() {
    let mut frames = headline_frames();
    frames[1].set_hidden("h2", true);

    let mut session = LinkSession::new(SyncConfig::default());
    let loaded = session.reset(&frames);
    let out = session.link_layer(&loaded.frames, "gif-frame-300x250-1", "h1");

    assert!(out.applied);
    assert!(session.registry().are_linked("h1", "h2"));
    assert!(session.registry().are_linked("h1", "h3"));
    assert!(!out.frames[1].is_hidden("h2"));
    assert_eq!(out.frames[1].visible_layer_count, 1);
    assert!(layer(&out.frames, 1, "h2").locked);
    assert!(layer(&out.frames, 0, "h1").linked_layer.as_ref().unwrap().is_main);
    assert_eq!(mains(&out.frames), 1);
    assert_eq!(out.notices[0].level, NoticeLevel::Info);
}

#[test]
fn unlinked_layer_is_detached_from_sync() {
    let mut session = LinkSession::new(SyncConfig::default());
    let loaded = session.reset(&headline_frames());
    let linked = session.link_layer(&loaded.frames, "gif-frame-300x250-1", "h1");

    let out = session.unlink_layer(&linked.frames, "gif-frame-728x90-1", "h2");
    assert!(out.applied);
    let h2 = layer(&out.frames, 1, "h2");
    assert!(h2.linked_layer.is_none());
    assert!(!h2.locked);
    assert!(out.frames[1].is_detached("h2"));
    assert!(!session.registry().are_linked("h1", "h2"));

    // Sync from the group skips the detached layer.
    let hidden = session.toggle_visibility(&out.frames, "gif-frame-300x250-1", "h1");
    assert!(hidden.frames[0].is_hidden("h1"));
    assert!(hidden.frames[2].is_hidden("h3"));
    assert!(!hidden.frames[1].is_hidden("h2"));

    // And the detached layer's own edits stay local.
    let local = session.toggle_visibility(&hidden.frames, "gif-frame-728x90-1", "h2");
    assert!(local.frames[1].is_hidden("h2"));
    let local = session.toggle_visibility(&local.frames, "gif-frame-728x90-1", "h2");
    assert!(!local.frames[1].is_hidden("h2"));
    assert!(local.frames[0].is_hidden("h1"));
    assert!(local.frames[2].is_hidden("h3"));

    // Relinking rejoins the same group and aligns peers to the relinked layer.
    let relinked = session.link_layer(&local.frames, "gif-frame-728x90-1", "h2");
    assert!(relinked.applied);
    assert!(!relinked.frames[1].is_detached("h2"));
    assert!(session.registry().are_linked("h1", "h2"));
    assert!(!relinked.frames[0].is_hidden("h1"));
    assert!(!relinked.frames[2].is_hidden("h3"));
    assert_eq!(mains(&relinked.frames), 1);
}

#[test]
fn unlinking_the_main_promotes_another_member() {
    let mut session = LinkSession::new(SyncConfig::default());
    let loaded = session.reset(&headline_frames());
    let linked = session.link_layer(&loaded.frames, "gif-frame-300x250-1", "h1");

    let out = session.unlink_layer(&linked.frames, "gif-frame-300x250-1", "h1");
    assert!(layer(&out.frames, 1, "h2").linked_layer.as_ref().unwrap().is_main);
    assert!(!layer(&out.frames, 2, "h3").linked_layer.as_ref().unwrap().is_main);
    assert_eq!(mains(&out.frames), 1);
}

#[test]
fn unlinking_an_unlinked_layer_warns() {
    let mut session = LinkSession::new(SyncConfig::default());
    let loaded = session.reset(&headline_frames());
    let out = session.unlink_layer(&loaded.frames, "gif-frame-300x250-1", "h1");

    assert!(!out.applied);
    assert_eq!(out.frames, loaded.frames);
    assert_eq!(out.notices.len(), 1);
    assert_eq!(out.notices[0].level, NoticeLevel::Warning);
}

#[test]
fn sync_mode_is_written_to_every_member() {
    let mut session = LinkSession::new(SyncConfig::default());
    let loaded = session.reset(&headline_frames());
    let linked = session.auto_link(&loaded.frames);
    assert_eq!(session.registry().len(), 1);

    let out = session.set_sync_mode(&linked.frames, "h3", SyncMode::Partial);
    assert!(out.applied);
    for (idx, id) in [(0, "h1"), (1, "h2"), (2, "h3")] {
        let info = layer(&out.frames, idx, id).linked_layer.as_ref().unwrap();
        assert_eq!(info.sync_mode, SyncMode::Partial);
    }
}

#[test]
fn full_sync_respects_animation_overrides() {
    let mut session = LinkSession::new(SyncConfig::default());
    let loaded = session.reset(&headline_frames());
    let linked = session.auto_link(&loaded.frames);

    let fade = Animation::new(AnimationKind::Fade, 0.5).with_id("f1");
    let out = session.update_animations(&linked.frames, "gif-frame-300x250-1", "h1", vec![fade]);
    assert_eq!(anim_ids(&out.frames, 1, "h2"), vec!["f1"]);
    assert_eq!(anim_ids(&out.frames, 2, "h3"), vec!["f1"]);

    let out = session.toggle_animation_override(&out.frames, "gif-frame-728x90-1", "h2", "f1");
    assert!(out.applied);
    let info = layer(&out.frames, 1, "h2").linked_layer.as_ref().unwrap();
    assert_eq!(info.overrides, vec!["f1".to_string()]);

    let slide = Animation::new(AnimationKind::Slide, 1.0).with_id("s1");
    let out = session.update_animations(&out.frames, "gif-frame-300x250-1", "h1", vec![slide]);
    assert_eq!(anim_ids(&out.frames, 1, "h2"), vec!["s1", "f1"]);
    assert_eq!(anim_ids(&out.frames, 2, "h3"), vec!["s1"]);

    // Dropping the override pulls the peer's list back in.
    let out = session.toggle_animation_override(&out.frames, "gif-frame-728x90-1", "h2", "f1");
    assert_eq!(anim_ids(&out.frames, 1, "h2"), vec!["s1"]);
    assert!(layer(&out.frames, 1, "h2")
        .linked_layer
        .as_ref()
        .unwrap()
        .overrides
        .is_empty());
}

#[test]
fn animation_override_release_ignores_unlinked_namesakes() {
    let mut session = LinkSession::new(SyncConfig::default());
    let loaded = session.reset(&headline_frames()[..2]);
    let linked = session.auto_link(&loaded.frames);
    let grp = Animation::new(AnimationKind::Fade, 0.5).with_id("grp");
    let out = session.update_animations(&linked.frames, "gif-frame-300x250-1", "h1", vec![grp]);
    assert_eq!(anim_ids(&out.frames, 1, "h2"), vec!["grp"]);

    let mut stranger = frame("160x600", 1, &[("h3", "Headline")]);
    stranger.layers[0].animations = vec![Animation::new(AnimationKind::Pulse, 1.0).with_id("stranger")];
    let mut frames = out.frames;
    frames.insert(0, stranger);

    let out = session.toggle_animation_override(&frames, "gif-frame-728x90-1", "h2", "grp");
    let out = session.toggle_animation_override(&out.frames, "gif-frame-728x90-1", "h2", "grp");
    assert!(out.applied);
    assert_eq!(anim_ids(&out.frames, 2, "h2"), vec!["grp"]);
    assert_eq!(anim_ids(&out.frames, 0, "h3"), vec!["stranger"]);
    assert!(session.registry().group_of("h3").is_none());
}

#[test]
fn override_release_resyncs_visibility_from_a_group_member() {
    let mut session = LinkSession::new(SyncConfig::default());
    let loaded = session.reset(&headline_frames()[..2]);
    let linked = session.auto_link(&loaded.frames);
    let hidden = session.toggle_visibility(&linked.frames, "gif-frame-300x250-1", "h1");
    let overridden = session.toggle_override(&hidden.frames, "gif-frame-728x90-1", "h2");

    let mut frames = overridden.frames;
    frames.insert(0, frame("160x600", 1, &[("h3", "Headline")]));
    let out = session.toggle_override(&frames, "gif-frame-728x90-1", "h2");

    assert!(out.applied);
    assert!(out.frames[2].is_hidden("h2"));
    assert!(!out.frames[0].is_hidden("h3"));
}

#[test]
fn independent_groups_keep_animations_local() {
    let config = SyncConfig {
        default_sync_mode: SyncMode::Independent,
        ..Default::default()
    };
    let mut session = LinkSession::new(config);
    let loaded = session.reset(&headline_frames());
    let linked = session.auto_link(&loaded.frames);

    let pulse = Animation::new(AnimationKind::Pulse, 2.0);
    let out = session.update_animations(&linked.frames, "gif-frame-300x250-1", "h1", vec![pulse]);
    assert!(out.applied);
    assert_eq!(anim_ids(&out.frames, 0, "h1").len(), 1);
    assert!(anim_ids(&out.frames, 1, "h2").is_empty());
}

#[test]
fn unknown_animation_override_is_a_warning() {
    let mut session = LinkSession::new(SyncConfig::default());
    let loaded = session.reset(&headline_frames());
    let out = session.toggle_animation_override(&loaded.frames, "gif-frame-300x250-1", "h1", "missing");
    assert!(!out.applied);
    assert_eq!(out.notices[0].level, NoticeLevel::Warning);
}

#[test]
fn linking_outside_the_session_mode_is_an_error() {
    let mut timeline = Frame::new("timeline-300x250", vec![Layer::new("t1", "Headline", LayerKind::Text)]);
    timeline.ad_size_id = Some("300x250".into());
    let frames = vec![timeline, frame("728x90", 1, &[("h2", "Headline")])];

    let mut session = LinkSession::new(SyncConfig::default());
    let loaded = session.reset(&frames);
    let out = session.link_layer(&loaded.frames, "timeline-300x250", "t1");

    assert!(!out.applied);
    assert!(out.has_errors());
    assert_eq!(out.frames, loaded.frames);
    assert!(session.registry().is_empty());
}

#[test]
fn reset_normalizes_link_metadata() {
    let mut frames = headline_frames();
    for f in frames.iter_mut() {
        for l in f.layers.iter_mut() {
            l.linked_layer = Some(LinkedLayerInfo {
                group_id: "gif-link-legacy".into(),
                sync_mode: SyncMode::Full,
                is_main: true,
                overrides: vec![],
            });
        }
    }
    frames[2].detached_layers.insert("h3".into());
    frames[0].hidden_layers.insert("h1".into());

    let mut session = LinkSession::new(SyncConfig::default());
    let out = session.reset(&frames);

    assert_eq!(mains(&out.frames), 1);
    assert!(layer(&out.frames, 0, "h1").linked_layer.as_ref().unwrap().is_main);
    assert!(layer(&out.frames, 2, "h3").linked_layer.is_none());
    assert!(!layer(&out.frames, 2, "h3").locked);
    assert!(!layer(&out.frames, 0, "h1").visible);
    assert_eq!(out.frames[0].visible_layer_count, 0);
    assert_eq!(session.registry().get_linked_layers("h1"), vec!["h2".to_string()]);
}
