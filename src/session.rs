//! Session: owns the signal bus, the player controller and the web-app shell
//! for the lifetime of the hosting process.

use std::cell::RefCell;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::bus::{
    EventBus, NavigationRequest, PreferencesForm, QuitRequest, Signal, UrlRequest,
};
use crate::host::{ActionParam, Collaborators};
use crate::player::{MediaKey, MediaPlayer, PlayerOptions};
use crate::webapp::WebApp;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("a web app is already attached to this session")]
    WebAppAlreadyAttached,
}

pub struct Session {
    bus: EventBus,
    host: Collaborators,
    player: Rc<RefCell<MediaPlayer>>,
    web_app: Option<Rc<RefCell<WebApp>>>,
}

impl Session {
    pub fn new(host: Collaborators, options: PlayerOptions) -> Self {
        let player = Rc::new(RefCell::new(MediaPlayer::new(host.clone(), options)));
        let mut bus = EventBus::new();
        bus.subscribe(player.clone());
        Self {
            bus,
            host,
            player,
            web_app: None,
        }
    }

    /// Attach the web-app shell. A session has at most one.
    pub fn attach_web_app(&mut self, web_app: WebApp) -> Result<(), SessionError> {
        if self.web_app.is_some() {
            return Err(SessionError::WebAppAlreadyAttached);
        }
        debug!(id = %web_app.meta().id, "web app attached");
        let web_app = Rc::new(RefCell::new(web_app));
        self.bus.subscribe(web_app.clone());
        self.web_app = Some(web_app);
        Ok(())
    }

    pub fn host(&self) -> &Collaborators {
        &self.host
    }

    pub fn player(&self) -> &Rc<RefCell<MediaPlayer>> {
        &self.player
    }

    pub fn emit(&self, signal: &mut Signal<'_>) -> usize {
        self.bus.emit(signal)
    }

    pub fn init_app_runner(&self) {
        self.emit(&mut Signal::InitAppRunner);
    }

    pub fn init_web_worker(&self) {
        self.emit(&mut Signal::InitWebWorker);
    }

    pub fn action_activated(&self, name: &str, param: Option<&ActionParam>) {
        self.emit(&mut Signal::ActionActivated { name, param });
    }

    pub fn media_key_pressed(&self, key: &MediaKey) {
        self.emit(&mut Signal::MediaKeyPressed(key));
    }

    /// True when the application may quit now.
    pub fn request_quit(&self) -> bool {
        let mut request = QuitRequest::default();
        self.emit(&mut Signal::QuitRequest(&mut request));
        request.approved
    }

    pub fn component_loaded(&self, id: &str) {
        self.emit(&mut Signal::ComponentLoaded(id));
    }

    pub fn component_unloaded(&self, id: &str) {
        self.emit(&mut Signal::ComponentUnloaded(id));
    }

    pub fn preferences_form(&self) -> PreferencesForm {
        let mut form = PreferencesForm::default();
        self.emit(&mut Signal::PreferencesForm(&mut form));
        form
    }

    pub fn home_page(&self) -> Option<String> {
        let mut request = UrlRequest::default();
        self.emit(&mut Signal::HomePageRequest(&mut request));
        request.url
    }

    pub fn last_page(&self) -> Option<String> {
        let mut request = UrlRequest::default();
        self.emit(&mut Signal::LastPageRequest(&mut request));
        request.url
    }

    /// Unanswered requests (no web app attached) are refused.
    pub fn navigation_allowed(&self, url: &str) -> bool {
        let mut request = NavigationRequest::new(url);
        self.emit(&mut Signal::NavigationRequest(&mut request));
        request.approved
    }

    pub fn uri_changed(&self, uri: &str) {
        self.emit(&mut Signal::UriChanged(uri));
    }
}

#[cfg(test)]
mod tests;
