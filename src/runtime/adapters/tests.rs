use serde_json::json;

use super::*;
use crate::host::ComponentManager;
use crate::runtime::testing::SharedBuf;

#[test]
fn launcher_and_menu_become_frames() {
    let buf = SharedBuf::default();
    let outbox = Outbox::new(Box::new(buf.clone()));

    outbox.set_actions(&["quit".to_string()]);
    outbox.set_tooltip("Song by Band");
    outbox.set_menu("playback", "_Control", &["play".to_string()]);

    assert_eq!(
        buf.messages(),
        vec![
            json!({"type": "launcher", "actions": ["quit"]}),
            json!({"type": "launcher", "tooltip": "Song by Band"}),
            json!({"type": "menu", "id": "playback", "label": "_Control", "actions": ["play"]}),
        ]
    );
}

#[test]
fn activations_are_queued_in_order() {
    let table = ActionTable::new();
    table.activate("next-song", None);
    table.activate("seek", Some(json!(5)));

    assert_eq!(table.pop().map(|a| a.name), Some("next-song".to_string()));
    assert_eq!(
        table.pop(),
        Some(Activation {
            name: "seek".to_string(),
            param: Some(json!(5)),
        })
    );
    assert_eq!(table.pop(), None);
}

#[test]
fn actions_default_to_enabled() {
    let table = ActionTable::new();
    assert!(table.is_enabled("play"));
    table.set_enabled("play", false);
    assert!(!table.is_enabled("play"));
}

#[test]
fn re_adding_an_action_replaces_its_spec() {
    let table = ActionTable::new();
    table.add_action(ActionSpec::new("playback", "play", "Play"));
    table.add_action(ActionSpec::new("playback", "play", "Play!").icon("media-playback-start"));
    let spec = table.spec("play").unwrap();
    assert_eq!(spec.label, "Play!");
    assert_eq!(table.specs.borrow().len(), 1);
}

#[test]
fn component_set_tracks_loaded_and_active() {
    let components = ComponentSet::new(["notifications"]);
    assert!(components.is_component_loaded("notifications"));
    assert!(!components.is_component_loaded("lyrics"));

    components.set_loaded("lyrics", true);
    components.set_loaded("notifications", false);
    assert!(components.is_component_loaded("lyrics"));
    assert!(!components.is_component_loaded("notifications"));

    components.toggle_component_active("mpris", true);
    assert!(components.is_active("mpris"));
    components.toggle_component_active("mpris", false);
    assert!(!components.is_active("mpris"));
}

#[test]
fn script_hooks_announce_the_web_worker() {
    let buf = SharedBuf::default();
    let mut hooks = ScriptHooks::new(Rc::new(Outbox::new(Box::new(buf.clone()))));
    let meta = WebAppMeta {
        id: "test".into(),
        name: "Test".into(),
        home_url: "about:blank".into(),
        allowed_uri: None,
    };
    hooks.init_web_worker(&meta);
    assert_eq!(buf.messages(), vec![json!({"type": "init-web-worker", "id": "test"})]);
}
