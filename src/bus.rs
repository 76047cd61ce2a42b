//! Typed signal bus.
//!
//! Components implement [`Subscriber`] and register for the signal kinds they
//! care about. Signals that expect an answer (quit, navigation, page
//! requests, preferences) carry a mutable request the subscribers fill in.
//! Dispatch is synchronous and single-threaded.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use serde::Serialize;
use tracing::{error, trace};

use crate::host::ActionParam;
use crate::player::MediaKey;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuitRequest {
    pub approved: bool,
}

impl Default for QuitRequest {
    fn default() -> Self {
        Self { approved: true }
    }
}

/// Home-page or last-page request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UrlRequest {
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavigationRequest {
    pub url: String,
    pub approved: bool,
}

impl NavigationRequest {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            approved: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FormEntry {
    Label {
        text: String,
    },
    Option {
        key: String,
        value: String,
        label: String,
    },
}

/// Preferences dialog content collected from subscribers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PreferencesForm {
    pub values: BTreeMap<String, String>,
    pub entries: Vec<FormEntry>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SignalKind {
    InitAppRunner,
    InitWebWorker,
    ActionActivated,
    MediaKeyPressed,
    QuitRequest,
    ComponentLoaded,
    ComponentUnloaded,
    PreferencesForm,
    HomePageRequest,
    LastPageRequest,
    NavigationRequest,
    UriChanged,
}

#[derive(Debug)]
pub enum Signal<'a> {
    InitAppRunner,
    InitWebWorker,
    ActionActivated {
        name: &'a str,
        param: Option<&'a ActionParam>,
    },
    MediaKeyPressed(&'a MediaKey),
    QuitRequest(&'a mut QuitRequest),
    ComponentLoaded(&'a str),
    ComponentUnloaded(&'a str),
    PreferencesForm(&'a mut PreferencesForm),
    HomePageRequest(&'a mut UrlRequest),
    LastPageRequest(&'a mut UrlRequest),
    NavigationRequest(&'a mut NavigationRequest),
    UriChanged(&'a str),
}

impl Signal<'_> {
    pub fn kind(&self) -> SignalKind {
        match self {
            Signal::InitAppRunner => SignalKind::InitAppRunner,
            Signal::InitWebWorker => SignalKind::InitWebWorker,
            Signal::ActionActivated { .. } => SignalKind::ActionActivated,
            Signal::MediaKeyPressed(_) => SignalKind::MediaKeyPressed,
            Signal::QuitRequest(_) => SignalKind::QuitRequest,
            Signal::ComponentLoaded(_) => SignalKind::ComponentLoaded,
            Signal::ComponentUnloaded(_) => SignalKind::ComponentUnloaded,
            Signal::PreferencesForm(_) => SignalKind::PreferencesForm,
            Signal::HomePageRequest(_) => SignalKind::HomePageRequest,
            Signal::LastPageRequest(_) => SignalKind::LastPageRequest,
            Signal::NavigationRequest(_) => SignalKind::NavigationRequest,
            Signal::UriChanged(_) => SignalKind::UriChanged,
        }
    }
}

pub trait Subscriber {
    /// Signal kinds this subscriber wants.
    fn signals(&self) -> &'static [SignalKind];

    fn on_signal(&mut self, signal: &mut Signal<'_>);
}

pub type SharedSubscriber = Rc<RefCell<dyn Subscriber>>;

#[derive(Default)]
pub struct EventBus {
    subscribers: Vec<(SignalKind, SharedSubscriber)>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `subscriber` for every kind it lists. Delivery follows
    /// registration order.
    pub fn subscribe(&mut self, subscriber: SharedSubscriber) {
        let kinds = match subscriber.try_borrow() {
            Ok(s) => s.signals(),
            Err(_) => {
                error!("subscriber is busy, cannot register it");
                return;
            }
        };
        for kind in kinds {
            self.subscribers.push((*kind, subscriber.clone()));
        }
    }

    /// Deliver `signal` to its subscribers. Returns how many handled it.
    pub fn emit(&self, signal: &mut Signal<'_>) -> usize {
        let kind = signal.kind();
        let mut delivered = 0;
        for (_, subscriber) in self.subscribers.iter().filter(|(k, _)| *k == kind) {
            match subscriber.try_borrow_mut() {
                Ok(mut s) => {
                    s.on_signal(signal);
                    delivered += 1;
                }
                Err(_) => error!(?kind, "re-entrant signal dispatch skipped"),
            }
        }
        trace!(?kind, delivered, "signal dispatched");
        delivered
    }
}
