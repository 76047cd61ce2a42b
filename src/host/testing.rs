//! Recording fakes of every collaborator.

use std::cell::{Cell, RefCell};
use std::collections::HashSet;
use std::rc::Rc;

use super::*;
use crate::config::TomlStore;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Ipc(HostMessage),
    AddAction(String),
    SetEnabled(String, bool),
    Activate(String, Option<ActionParam>),
    LauncherActions(Vec<String>),
    Tooltip(String),
    Menu(String, Vec<String>),
    NotificationCreated(String),
    NotificationUpdated(NotificationContent),
    NotificationActions(Vec<String>),
    NotificationShown,
    Fetch(ArtworkRequest),
    CancelFetch(ArtworkRequestId),
    ComponentActive(String, bool),
}

type CallLog = Rc<RefCell<Vec<Call>>>;

#[derive(Default)]
pub struct Recorder {
    log: CallLog,
    pub loaded: RefCell<HashSet<String>>,
    pub persistence: Cell<bool>,
}

impl Recorder {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn collaborators(self: &Rc<Self>, config: Rc<TomlStore>) -> Collaborators {
        Collaborators {
            ipc: self.clone(),
            actions: self.clone(),
            launcher: self.clone(),
            menu: self.clone(),
            notifications: self.clone(),
            artwork: self.clone(),
            components: self.clone(),
            config,
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.borrow().clone()
    }

    pub fn clear(&self) {
        self.log.borrow_mut().clear();
    }

    pub fn ipc(&self) -> Vec<HostMessage> {
        self.log
            .borrow()
            .iter()
            .filter_map(|c| match c {
                Call::Ipc(m) => Some(m.clone()),
                _ => None,
            })
            .collect()
    }

    pub fn track_infos(&self) -> Vec<TrackInfo> {
        self.ipc()
            .into_iter()
            .filter_map(|m| match m {
                HostMessage::SetTrackInfo(info) => Some(info),
                _ => None,
            })
            .collect()
    }

    pub fn count(&self, pred: impl Fn(&Call) -> bool) -> usize {
        self.log.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Last enabled state set for `action`.
    pub fn enabled(&self, action: &str) -> Option<bool> {
        self.log.borrow().iter().rev().find_map(|c| match c {
            Call::SetEnabled(name, enabled) if name == action => Some(*enabled),
            _ => None,
        })
    }

    pub fn last_launcher_actions(&self) -> Option<Vec<String>> {
        self.log.borrow().iter().rev().find_map(|c| match c {
            Call::LauncherActions(a) => Some(a.clone()),
            _ => None,
        })
    }

    pub fn last_tooltip(&self) -> Option<String> {
        self.log.borrow().iter().rev().find_map(|c| match c {
            Call::Tooltip(t) => Some(t.clone()),
            _ => None,
        })
    }

    fn push(&self, call: Call) {
        self.log.borrow_mut().push(call);
    }
}

impl HostChannel for Recorder {
    fn call(&self, message: HostMessage) {
        self.push(Call::Ipc(message));
    }
}

impl ActionRegistry for Recorder {
    fn add_action(&self, spec: ActionSpec) {
        self.push(Call::AddAction(spec.name));
    }

    fn set_enabled(&self, name: &str, enabled: bool) {
        self.push(Call::SetEnabled(name.to_string(), enabled));
    }

    fn activate(&self, name: &str, param: Option<ActionParam>) {
        self.push(Call::Activate(name.to_string(), param));
    }
}

impl Launcher for Recorder {
    fn set_actions(&self, actions: &[String]) {
        self.push(Call::LauncherActions(actions.to_vec()));
    }

    fn set_tooltip(&self, tooltip: &str) {
        self.push(Call::Tooltip(tooltip.to_string()));
    }
}

impl MenuBar for Recorder {
    fn set_menu(&self, id: &str, _label: &str, actions: &[String]) {
        self.push(Call::Menu(id.to_string(), actions.to_vec()));
    }
}

struct RecordedNotification {
    log: CallLog,
}

impl Notification for RecordedNotification {
    fn update(&mut self, content: NotificationContent) {
        self.log.borrow_mut().push(Call::NotificationUpdated(content));
    }

    fn set_actions(&mut self, actions: &[String]) {
        self.log
            .borrow_mut()
            .push(Call::NotificationActions(actions.to_vec()));
    }

    fn show(&mut self) {
        self.log.borrow_mut().push(Call::NotificationShown);
    }
}

impl NotificationService for Recorder {
    fn named_notification(
        &self,
        name: &str,
        _resident: bool,
        _category: &str,
    ) -> Box<dyn Notification> {
        self.push(Call::NotificationCreated(name.to_string()));
        Box::new(RecordedNotification {
            log: self.log.clone(),
        })
    }

    fn persistence_supported(&self) -> bool {
        self.persistence.get()
    }
}

impl ArtworkFetcher for Recorder {
    fn fetch(&self, request: ArtworkRequest) {
        self.push(Call::Fetch(request));
    }

    fn cancel(&self, id: ArtworkRequestId) {
        self.push(Call::CancelFetch(id));
    }
}

impl ComponentManager for Recorder {
    fn is_component_loaded(&self, id: &str) -> bool {
        self.loaded.borrow().contains(id)
    }

    fn toggle_component_active(&self, id: &str, active: bool) {
        self.push(Call::ComponentActive(id.to_string(), active));
    }
}
