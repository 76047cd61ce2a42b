//! Web app integration shell: page lifecycle hooks and navigation policy.

use std::rc::Rc;

use regex::Regex;
use thiserror::Error;
use toml::Value;
use tracing::{debug, warn};

use crate::bus::{NavigationRequest, Signal, SignalKind, Subscriber, UrlRequest};
use crate::config::{ConfigStore, LAST_URI, WebAppSettings};

#[derive(Debug, Error)]
pub enum ShellError {
    #[error("invalid allowed_uri pattern {pattern:?}: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Static description of the integrated web app.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WebAppMeta {
    pub id: String,
    pub name: String,
    pub home_url: String,
    pub allowed_uri: Option<String>,
}

impl From<&WebAppSettings> for WebAppMeta {
    fn from(s: &WebAppSettings) -> Self {
        Self {
            id: s.id.clone(),
            name: s.name.clone(),
            home_url: s.home_url.clone(),
            allowed_uri: s.allowed_uri.clone(),
        }
    }
}

/// Per-site customisation points. Both default to doing nothing.
pub trait WebAppHooks {
    fn init_app_runner(&mut self, _meta: &WebAppMeta) {}

    /// Called when the page side starts; integrate the page from here.
    fn init_web_worker(&mut self, _meta: &WebAppMeta) {}
}

/// Hooks for integrations that only need the default behaviour.
#[derive(Debug, Default)]
pub struct DefaultHooks;

impl WebAppHooks for DefaultHooks {}

pub struct WebApp {
    meta: WebAppMeta,
    allowed_uri: Option<Regex>,
    config: Rc<dyn ConfigStore>,
    hooks: Box<dyn WebAppHooks>,
}

impl WebApp {
    pub fn new(
        meta: WebAppMeta,
        config: Rc<dyn ConfigStore>,
        hooks: Box<dyn WebAppHooks>,
    ) -> Result<Self, ShellError> {
        let allowed_uri = match &meta.allowed_uri {
            Some(pattern) => Some(Regex::new(pattern).map_err(|source| {
                ShellError::InvalidPattern {
                    pattern: pattern.clone(),
                    source,
                }
            })?),
            None => None,
        };
        Ok(Self {
            meta,
            allowed_uri,
            config,
            hooks,
        })
    }

    pub fn meta(&self) -> &WebAppMeta {
        &self.meta
    }

    pub fn home_url(&self) -> &str {
        &self.meta.home_url
    }

    pub fn last_url(&self) -> Option<String> {
        self.config.get_str(LAST_URI).filter(|s| !s.is_empty())
    }

    /// Everything is allowed without a pattern.
    pub fn is_navigation_allowed(&self, url: &str) -> bool {
        match &self.allowed_uri {
            Some(pattern) => pattern.is_match(url),
            None => true,
        }
    }

    fn on_home_page_request(&self, request: &mut UrlRequest) {
        request.url = Some(self.meta.home_url.clone());
    }

    fn on_last_page_request(&self, request: &mut UrlRequest) {
        request.url = self.last_url();
    }

    fn on_navigation_request(&self, request: &mut NavigationRequest) {
        request.approved = self.is_navigation_allowed(&request.url);
        if !request.approved {
            debug!(url = %request.url, "navigation outside the web app");
        }
    }

    fn on_uri_changed(&self, uri: &str) {
        if let Err(e) = self.config.set(LAST_URI, Value::String(uri.to_string())) {
            warn!(error = %e, "failed to persist last visited page");
        }
    }
}

impl Subscriber for WebApp {
    fn signals(&self) -> &'static [SignalKind] {
        &[
            SignalKind::HomePageRequest,
            SignalKind::LastPageRequest,
            SignalKind::NavigationRequest,
            SignalKind::UriChanged,
            SignalKind::InitAppRunner,
            SignalKind::InitWebWorker,
        ]
    }

    fn on_signal(&mut self, signal: &mut Signal<'_>) {
        match signal {
            Signal::HomePageRequest(request) => self.on_home_page_request(request),
            Signal::LastPageRequest(request) => self.on_last_page_request(request),
            Signal::NavigationRequest(request) => self.on_navigation_request(request),
            Signal::UriChanged(uri) => self.on_uri_changed(uri),
            Signal::InitAppRunner => self.hooks.init_app_runner(&self.meta),
            Signal::InitWebWorker => self.hooks.init_web_worker(&self.meta),
            _ => {}
        }
    }
}
