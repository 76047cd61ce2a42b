//! Runtime-side implementations of the collaborator traits.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};
use std::io::Write;
use std::rc::Rc;

use tracing::{debug, error, info};

use super::protocol::{BridgeMessage, write_message};
use crate::host::{ActionParam, ActionRegistry, ActionSpec, ComponentManager, Launcher, MenuBar};
use crate::webapp::{WebAppHooks, WebAppMeta};

/// Frame writer towards the integration script.
pub struct Outbox {
    writer: RefCell<Box<dyn Write>>,
}

impl Outbox {
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self {
            writer: RefCell::new(writer),
        }
    }

    pub fn send(&self, message: &BridgeMessage) {
        let mut writer = self.writer.borrow_mut();
        if let Err(e) = write_message(&mut *writer, message) {
            error!(error = %e, "failed to write message to the script");
        }
    }
}

impl Launcher for Outbox {
    fn set_actions(&self, actions: &[String]) {
        self.send(&BridgeMessage::Launcher {
            actions: Some(actions.to_vec()),
            tooltip: None,
        });
    }

    fn set_tooltip(&self, tooltip: &str) {
        self.send(&BridgeMessage::Launcher {
            actions: None,
            tooltip: Some(tooltip.to_string()),
        });
    }
}

impl MenuBar for Outbox {
    fn set_menu(&self, id: &str, label: &str, actions: &[String]) {
        self.send(&BridgeMessage::Menu {
            id: id.to_string(),
            label: label.to_string(),
            actions: actions.to_vec(),
        });
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Activation {
    pub name: String,
    pub param: Option<ActionParam>,
}

/// Registered actions with their enabled state, plus a queue of pending
/// activations delivered by the event loop once the current handler returns.
#[derive(Debug, Default)]
pub struct ActionTable {
    specs: RefCell<Vec<ActionSpec>>,
    enabled: RefCell<HashMap<String, bool>>,
    queue: RefCell<VecDeque<Activation>>,
}

impl ActionTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions start enabled until told otherwise.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.borrow().get(name).copied().unwrap_or(true)
    }

    pub fn spec(&self, name: &str) -> Option<ActionSpec> {
        self.specs.borrow().iter().find(|s| s.name == name).cloned()
    }

    pub fn pop(&self) -> Option<Activation> {
        self.queue.borrow_mut().pop_front()
    }
}

impl ActionRegistry for ActionTable {
    fn add_action(&self, spec: ActionSpec) {
        let mut specs = self.specs.borrow_mut();
        match specs.iter_mut().find(|s| s.name == spec.name) {
            Some(existing) => *existing = spec,
            None => specs.push(spec),
        }
    }

    fn set_enabled(&self, name: &str, enabled: bool) {
        self.enabled.borrow_mut().insert(name.to_string(), enabled);
    }

    fn activate(&self, name: &str, param: Option<ActionParam>) {
        self.queue.borrow_mut().push_back(Activation {
            name: name.to_string(),
            param,
        });
    }
}

/// Components reported by the script plus those provided by the bridge.
#[derive(Debug, Default)]
pub struct ComponentSet {
    loaded: RefCell<HashSet<String>>,
    active: RefCell<HashSet<String>>,
}

impl ComponentSet {
    pub fn new<I, S>(loaded: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            loaded: RefCell::new(loaded.into_iter().map(Into::into).collect()),
            active: RefCell::default(),
        }
    }

    pub fn set_loaded(&self, id: &str, loaded: bool) {
        let mut set = self.loaded.borrow_mut();
        if loaded {
            set.insert(id.to_string());
        } else {
            set.remove(id);
        }
    }

    pub fn is_active(&self, id: &str) -> bool {
        self.active.borrow().contains(id)
    }
}

impl ComponentManager for ComponentSet {
    fn is_component_loaded(&self, id: &str) -> bool {
        self.loaded.borrow().contains(id)
    }

    fn toggle_component_active(&self, id: &str, active: bool) {
        let changed = if active {
            self.active.borrow_mut().insert(id.to_string())
        } else {
            self.active.borrow_mut().remove(id)
        };
        if changed {
            info!(component = id, active, "component toggled");
        }
    }
}

/// Tells the script to integrate the page once the web worker starts.
pub struct ScriptHooks {
    outbox: Rc<Outbox>,
}

impl ScriptHooks {
    pub fn new(outbox: Rc<Outbox>) -> Self {
        Self { outbox }
    }
}

impl WebAppHooks for ScriptHooks {
    fn init_web_worker(&mut self, meta: &WebAppMeta) {
        debug!(id = %meta.id, "web worker starting");
        self.outbox.send(&BridgeMessage::InitWebWorker {
            id: meta.id.clone(),
        });
    }
}

#[cfg(test)]
mod tests;
