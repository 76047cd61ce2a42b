//! Desktop notifications over the `org.freedesktop.Notifications` D-Bus API.

use std::collections::HashMap;

use tracing::{debug, warn};
use zbus::blocking::Connection;
use zvariant::Value;

use crate::host::{Notification, NotificationContent, NotificationService};

const DESTINATION: &str = "org.freedesktop.Notifications";
const PATH: &str = "/org/freedesktop/Notifications";
const INTERFACE: &str = "org.freedesktop.Notifications";

/// Server-default expiry.
const EXPIRE_DEFAULT: i32 = -1;

pub struct DesktopNotifications {
    connection: Connection,
    app_name: String,
}

impl DesktopNotifications {
    pub fn connect(app_name: &str) -> zbus::Result<Self> {
        Ok(Self {
            connection: Connection::session()?,
            app_name: app_name.to_string(),
        })
    }

    /// Capabilities advertised by the notification server.
    pub fn capabilities(&self) -> zbus::Result<Vec<String>> {
        let reply = self.connection.call_method(
            Some(DESTINATION),
            PATH,
            Some(INTERFACE),
            "GetCapabilities",
            &(),
        )?;
        let body = reply.body();
        body.deserialize::<Vec<String>>()
    }
}

impl NotificationService for DesktopNotifications {
    fn named_notification(
        &self,
        name: &str,
        resident: bool,
        category: &str,
    ) -> Box<dyn Notification> {
        debug!(name, resident, category, "creating notification");
        Box::new(DesktopNotification {
            connection: self.connection.clone(),
            app_name: self.app_name.clone(),
            resident,
            category: category.to_string(),
            content: None,
            actions: Vec::new(),
            id: 0,
        })
    }

    fn persistence_supported(&self) -> bool {
        match self.capabilities() {
            Ok(caps) => caps.iter().any(|c| c == "persistence"),
            Err(e) => {
                warn!(error = %e, "cannot query notification capabilities");
                false
            }
        }
    }
}

/// One named notification; repeated `show` calls replace the previous bubble.
pub struct DesktopNotification {
    connection: Connection,
    app_name: String,
    resident: bool,
    category: String,
    content: Option<NotificationContent>,
    actions: Vec<String>,
    id: u32,
}

fn notification_hints<'a>(
    resident: bool,
    category: &'a str,
    content: &'a NotificationContent,
) -> HashMap<&'static str, Value<'a>> {
    let mut hints = HashMap::new();
    hints.insert("category", Value::from(category));
    hints.insert("resident", Value::from(resident));
    if let Some(image) = content.image.as_ref().and_then(|p| p.to_str()) {
        hints.insert("image-path", Value::from(image));
    }
    hints.insert("action-icons", Value::from(true));
    hints
}

/// Flatten action names into the `[key, label, key, label, ...]` form.
fn action_pairs(actions: &[String]) -> Vec<&str> {
    actions
        .iter()
        .flat_map(|a| [a.as_str(), a.as_str()])
        .collect()
}

impl Notification for DesktopNotification {
    fn update(&mut self, content: NotificationContent) {
        self.content = Some(content);
    }

    fn set_actions(&mut self, actions: &[String]) {
        self.actions = actions.to_vec();
    }

    fn show(&mut self) {
        let Some(content) = self.content.as_ref() else {
            return;
        };
        let icon = content.icon_name.as_deref().unwrap_or("");
        let body = (
            self.app_name.as_str(),
            self.id,
            icon,
            content.title.as_str(),
            content.message.as_str(),
            action_pairs(&self.actions),
            notification_hints(self.resident, &self.category, content),
            EXPIRE_DEFAULT,
        );
        let reply = self.connection.call_method(
            Some(DESTINATION),
            PATH,
            Some(INTERFACE),
            "Notify",
            &body,
        );
        match reply.and_then(|r| r.body().deserialize::<u32>()) {
            Ok(id) => self.id = id,
            Err(e) => warn!(error = %e, "failed to show notification"),
        }
    }
}

/// Used when notifications are disabled or no session bus is reachable.
pub struct NoNotifications;

struct SilentNotification;

impl Notification for SilentNotification {
    fn update(&mut self, _content: NotificationContent) {}

    fn set_actions(&mut self, _actions: &[String]) {}

    fn show(&mut self) {}
}

impl NotificationService for NoNotifications {
    fn named_notification(
        &self,
        _name: &str,
        _resident: bool,
        _category: &str,
    ) -> Box<dyn Notification> {
        Box::new(SilentNotification)
    }

    fn persistence_supported(&self) -> bool {
        false
    }
}
