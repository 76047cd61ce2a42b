use std::io::Cursor;
use std::sync::mpsc;

use serde_json::{Value, json};

use super::*;
use crate::config::{ConfigStore, RUN_IN_BACKGROUND, TomlStore};
use crate::host::ComponentManager;
use crate::host::testing::Recorder;
use crate::player::{Capability, PlayerOptions, TrackUpdate};
use crate::runtime::adapters::ScriptHooks;
use crate::runtime::testing::SharedBuf;
use crate::webapp::{WebApp, WebAppMeta};

struct Harness {
    bridge: Bridge,
    out: SharedBuf,
    store: Rc<TomlStore>,
    components: Rc<ComponentSet>,
}

fn harness() -> Harness {
    let recorder = Recorder::new();
    let store = Rc::new(TomlStore::in_memory());
    let out = SharedBuf::default();
    let outbox = Rc::new(Outbox::new(Box::new(out.clone())));
    let actions = Rc::new(ActionTable::new());
    let components = Rc::new(ComponentSet::new(["notifications"]));

    let mut host = recorder.collaborators(store.clone());
    host.actions = actions.clone();
    host.launcher = outbox.clone();
    host.menu = outbox.clone();
    host.components = components.clone();

    let meta = WebAppMeta {
        id: "test".into(),
        name: "Test".into(),
        home_url: "https://music.example/".into(),
        allowed_uri: Some("^https://music\\.example/".into()),
    };
    let web_app = WebApp::new(
        meta,
        store.clone(),
        Box::new(ScriptHooks::new(outbox.clone())),
    )
    .unwrap();
    let mut session = Session::new(host, PlayerOptions::default());
    session.attach_web_app(web_app).unwrap();

    Harness {
        bridge: Bridge::new(session, outbox, actions, components.clone()),
        out,
        store,
        components,
    }
}

fn of_type(messages: &[Value], kind: &str) -> Vec<Value> {
    messages
        .iter()
        .filter(|m| m["type"] == kind)
        .cloned()
        .collect()
}

fn frame(json: &str) -> Vec<u8> {
    let mut out = (json.len() as u32).to_ne_bytes().to_vec();
    out.extend_from_slice(json.as_bytes());
    out
}

#[test]
fn start_announces_worker_and_publishes_launcher_and_menu() {
    let h = harness();
    assert_eq!(h.bridge.start(), Flow::Continue);

    let messages = h.out.messages();
    assert_eq!(
        of_type(&messages, "init-web-worker"),
        vec![json!({"type": "init-web-worker", "id": "test"})]
    );
    assert!(messages.contains(&json!({"type": "launcher", "actions": ["quit"]})));
    assert_eq!(of_type(&messages, "menu").len(), 1);
}

#[test]
fn media_key_is_delivered_as_action() {
    let h = harness();
    h.bridge.handle_script(ScriptMessage::MediaKey { key: "Next".into() });
    assert_eq!(
        of_type(&h.out.messages(), "action-activated"),
        vec![json!({"type": "action-activated", "name": "next-song"})]
    );
}

#[test]
fn disabled_action_is_not_delivered() {
    let h = harness();
    h.bridge.handle_script(ScriptMessage::SetCapability {
        capability: Capability::CanGoNext,
        value: false,
    });
    h.bridge.handle_control(ControlCmd::Next);
    assert!(of_type(&h.out.messages(), "action-activated").is_empty());
}

#[test]
fn mpris_seek_carries_the_position() {
    let h = harness();
    h.bridge.handle_script(ScriptMessage::SetCapability {
        capability: Capability::CanSeek,
        value: true,
    });
    h.bridge.handle_control(ControlCmd::Seek(5_000_000));
    assert_eq!(
        of_type(&h.out.messages(), "action-activated"),
        vec![json!({"type": "action-activated", "name": "seek", "param": 5_000_000})]
    );
}

#[test]
fn page_and_navigation_requests_are_answered() {
    let h = harness();
    h.bridge.handle_script(ScriptMessage::HomePageRequest);
    h.bridge.handle_script(ScriptMessage::NavigationRequest {
        url: "https://elsewhere.example/".into(),
    });
    h.bridge.handle_script(ScriptMessage::UriChanged {
        uri: "https://music.example/album/1".into(),
    });
    h.bridge.handle_script(ScriptMessage::LastPageRequest);

    assert_eq!(
        h.out.messages(),
        vec![
            json!({"type": "home-page", "url": "https://music.example/"}),
            json!({"type": "navigation", "url": "https://elsewhere.example/", "approved": false}),
            json!({"type": "last-page", "url": "https://music.example/album/1"}),
        ]
    );
}

#[test]
fn malformed_length_is_reported_and_bridge_continues() {
    let h = harness();
    let flow = h.bridge.handle_script(ScriptMessage::SetTrack(TrackUpdate {
        title: Some("Song".into()),
        length: Some(TimeValue::Text("1:2:3:4".into())),
        ..TrackUpdate::default()
    }));
    assert_eq!(flow, Flow::Continue);
    assert_eq!(of_type(&h.out.messages(), "error").len(), 1);
    assert_eq!(h.bridge.session().player().borrow().track().title, None);
}

#[test]
fn quit_is_withheld_while_running_in_background() {
    let h = harness();
    h.store
        .set(RUN_IN_BACKGROUND, toml::Value::String("always".into()))
        .unwrap();
    assert_eq!(h.bridge.handle_script(ScriptMessage::Quit), Flow::Continue);
    assert_eq!(
        of_type(&h.out.messages(), "quit"),
        vec![json!({"type": "quit", "approved": false})]
    );

    h.bridge.handle_script(ScriptMessage::SetPreference {
        key: RUN_IN_BACKGROUND.into(),
        value: "never".into(),
    });
    assert_eq!(h.store.get_str(RUN_IN_BACKGROUND).as_deref(), Some("never"));
    assert_eq!(h.bridge.handle_control(ControlCmd::Quit), Flow::Quit);
}

#[test]
fn quit_action_from_launcher_stops_the_bridge() {
    let h = harness();
    let flow = h.bridge.handle_script(ScriptMessage::ActivateAction {
        name: "quit".into(),
        param: None,
    });
    assert_eq!(flow, Flow::Quit);
}

#[test]
fn component_messages_update_the_component_set() {
    let h = harness();
    h.bridge.handle_script(ScriptMessage::ComponentUnloaded {
        id: "notifications".into(),
    });
    assert!(!h.components.is_component_loaded("notifications"));
    h.bridge.handle_script(ScriptMessage::ComponentLoaded {
        id: "lyrics".into(),
    });
    assert!(h.components.is_component_loaded("lyrics"));
    assert!(h.components.is_active("lyrics"));
}

#[test]
fn preferences_form_is_sent_back() {
    let h = harness();
    h.bridge.handle_script(ScriptMessage::PreferencesForm);
    let forms = of_type(&h.out.messages(), "preferences-form");
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["form"]["entries"].as_array().map(Vec::len), Some(4));
}

#[test]
fn reader_forwards_frames_and_decode_errors_then_closes() {
    let mut bytes = frame(r#"{"type":"home-page-request"}"#);
    bytes.extend(frame(r#"{"type":"nope"}"#));
    let (tx, rx) = mpsc::channel();
    spawn_reader(Cursor::new(bytes), tx);

    assert!(matches!(
        rx.recv().unwrap(),
        Inbound::Message(Ok(ScriptMessage::HomePageRequest))
    ));
    assert!(matches!(
        rx.recv().unwrap(),
        Inbound::Message(Err(ProtocolError::Json(_)))
    ));
    assert!(matches!(rx.recv().unwrap(), Inbound::Closed));
}

#[test]
fn run_returns_when_the_script_disconnects() {
    let h = harness();
    let (tx, inbound) = mpsc::channel();
    let (_control_tx, control_rx) = mpsc::channel();
    let (_artwork_tx, artwork_rx) = mpsc::channel();
    tx.send(Inbound::Message(Ok(ScriptMessage::HomePageRequest)))
        .unwrap();
    tx.send(Inbound::Closed).unwrap();

    run(&h.bridge, &inbound, &control_rx, &artwork_rx);
    assert_eq!(of_type(&h.out.messages(), "home-page").len(), 1);
}
