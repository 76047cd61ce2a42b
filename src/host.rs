//! Collaborator interfaces.
//!
//! The player controller and the web-app shell never talk to the outside
//! world directly. Everything they need (the host IPC channel, the action
//! registry, launcher and menu integration, notifications, artwork downloads,
//! component management and the persisted config) is reached through the
//! traits below, bundled in [`Collaborators`].

use std::path::PathBuf;
use std::rc::Rc;

use crate::artwork::{ArtworkRequest, ArtworkRequestId};
use crate::config::ConfigStore;

mod message;

pub use message::*;

#[cfg(test)]
pub(crate) mod testing;

/// Parameter carried by a stateful action (seek target, volume, ...).
pub type ActionParam = serde_json::Value;

/// One-way calls to the host process.
pub trait HostChannel {
    fn call(&self, message: HostMessage);
}

/// Description of an action registered with the host.
#[derive(Debug, Clone, PartialEq)]
pub struct ActionSpec {
    pub group: String,
    pub scope: String,
    pub name: String,
    pub label: String,
    pub icon: Option<String>,
    /// Initial parameter for stateful actions.
    pub state: Option<ActionParam>,
}

impl ActionSpec {
    pub fn new(group: &str, name: &str, label: &str) -> Self {
        Self {
            group: group.to_string(),
            scope: "win".to_string(),
            name: name.to_string(),
            label: label.to_string(),
            icon: None,
            state: None,
        }
    }

    pub fn icon(mut self, icon: &str) -> Self {
        self.icon = Some(icon.to_string());
        self
    }

    pub fn state(mut self, state: ActionParam) -> Self {
        self.state = Some(state);
        self
    }
}

/// Host-side action registry.
///
/// `activate` must not dispatch synchronously back into the caller; the
/// runtime queues activations and delivers them after the current handler.
pub trait ActionRegistry {
    fn add_action(&self, spec: ActionSpec);
    fn set_enabled(&self, name: &str, enabled: bool);
    fn activate(&self, name: &str, param: Option<ActionParam>);
}

/// Launcher / taskbar integration.
pub trait Launcher {
    fn set_actions(&self, actions: &[String]);
    fn set_tooltip(&self, tooltip: &str);
}

pub trait MenuBar {
    fn set_menu(&self, id: &str, label: &str, actions: &[String]);
}

/// Content of the playback notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationContent {
    pub title: String,
    pub message: String,
    /// Themed icon used when no artwork image is available.
    pub icon_name: Option<String>,
    pub image: Option<PathBuf>,
}

pub trait Notification {
    fn update(&mut self, content: NotificationContent);
    fn set_actions(&mut self, actions: &[String]);
    fn show(&mut self);
}

pub trait NotificationService {
    fn named_notification(
        &self,
        name: &str,
        resident: bool,
        category: &str,
    ) -> Box<dyn Notification>;

    /// Whether notifications stay on screen until dismissed.
    fn persistence_supported(&self) -> bool;
}

/// Downloads artwork. Completion is reported back through
/// `MediaPlayer::on_artwork_downloaded`.
pub trait ArtworkFetcher {
    fn fetch(&self, request: ArtworkRequest);
    fn cancel(&self, id: ArtworkRequestId);
}

pub trait ComponentManager {
    fn is_component_loaded(&self, id: &str) -> bool;
    fn toggle_component_active(&self, id: &str, active: bool);
}

/// Every collaborator a session needs.
#[derive(Clone)]
pub struct Collaborators {
    pub ipc: Rc<dyn HostChannel>,
    pub actions: Rc<dyn ActionRegistry>,
    pub launcher: Rc<dyn Launcher>,
    pub menu: Rc<dyn MenuBar>,
    pub notifications: Rc<dyn NotificationService>,
    pub artwork: Rc<dyn ArtworkFetcher>,
    pub components: Rc<dyn ComponentManager>,
    pub config: Rc<dyn ConfigStore>,
}
