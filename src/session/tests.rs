use super::*;
use crate::config::{ConfigStore, LAST_URI, RUN_IN_BACKGROUND, TomlStore};
use crate::host::testing::{Call, Recorder};
use crate::player::PlaybackState;
use crate::webapp::{DefaultHooks, WebAppMeta};

fn session() -> (Session, Rc<Recorder>, Rc<TomlStore>) {
    let recorder = Recorder::new();
    let store = Rc::new(TomlStore::in_memory());
    let session = Session::new(recorder.collaborators(store.clone()), PlayerOptions::default());
    (session, recorder, store)
}

fn web_app(store: Rc<TomlStore>) -> WebApp {
    let meta = WebAppMeta {
        id: "test".into(),
        name: "Test".into(),
        home_url: "https://home.example/".into(),
        allowed_uri: Some("^https://home\\.example/".into()),
    };
    WebApp::new(meta, store, Box::new(DefaultHooks)).unwrap()
}

#[test]
fn second_web_app_is_rejected() {
    let (mut session, _, store) = session();
    assert!(session.attach_web_app(web_app(store.clone())).is_ok());
    assert_eq!(
        session.attach_web_app(web_app(store)),
        Err(SessionError::WebAppAlreadyAttached)
    );
}

#[test]
fn page_requests_are_answered_by_the_web_app() {
    let (mut session, _, store) = session();
    assert_eq!(session.home_page(), None);
    assert!(!session.navigation_allowed("https://home.example/x"));

    session.attach_web_app(web_app(store.clone())).unwrap();
    assert_eq!(session.home_page().as_deref(), Some("https://home.example/"));
    assert!(session.navigation_allowed("https://home.example/x"));
    assert!(!session.navigation_allowed("https://evil.example/"));

    session.uri_changed("https://home.example/y");
    assert_eq!(session.last_page().as_deref(), Some("https://home.example/y"));
    assert!(store.get(LAST_URI).is_some());
}

#[test]
fn quit_request_goes_through_the_player() {
    let (session, _, store) = session();
    store
        .set(RUN_IN_BACKGROUND, toml::Value::String("playing".into()))
        .unwrap();
    assert!(session.request_quit());

    session
        .player()
        .borrow_mut()
        .set_playback_state(PlaybackState::Playing);
    assert!(!session.request_quit());
}

#[test]
fn init_signals_reach_player_and_form_is_collected() {
    let (mut session, recorder, store) = session();
    session.attach_web_app(web_app(store)).unwrap();

    session.init_app_runner();
    session.init_web_worker();
    assert!(recorder.count(|c| matches!(c, Call::AddAction(_))) > 0);

    let form = session.preferences_form();
    assert_eq!(form.entries.len(), 4);
}

#[test]
fn media_keys_are_forwarded_as_activations() {
    let (session, recorder, _) = session();
    session.media_key_pressed(&MediaKey::Next);
    assert_eq!(
        recorder.calls(),
        vec![Call::Activate("next-song".into(), None)]
    );
}
