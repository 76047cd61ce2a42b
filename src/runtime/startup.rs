use std::path::Path;
use std::rc::Rc;

use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::{self, TomlStore};
use crate::host::NotificationService;
use crate::notify::{DesktopNotifications, NoNotifications};

/// Install the stderr subscriber. `RUST_LOG` overrides `default_level`;
/// stdout is reserved for protocol frames.
pub fn init_tracing(default_level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
        .ok();
}

/// Open the persisted store, or keep state in memory when there is no
/// usable location.
pub fn open_store(settings: &config::Settings) -> Result<TomlStore, config::StoreError> {
    match settings.state_path() {
        Some(path) => {
            let store = TomlStore::open(&path)?;
            info!(path = %path.display(), "using state file");
            Ok(store)
        }
        None => {
            warn!("no state directory, preferences will not be saved");
            Ok(TomlStore::in_memory())
        }
    }
}

pub fn prepare_artwork_dir(dir: &Path) {
    if let Err(e) = std::fs::create_dir_all(dir) {
        warn!(dir = %dir.display(), error = %e, "cannot create artwork cache");
    }
}

pub fn notification_service(settings: &config::Settings) -> Rc<dyn NotificationService> {
    if !settings.notifications.enabled {
        return Rc::new(NoNotifications);
    }
    match DesktopNotifications::connect(&settings.web_app.name) {
        Ok(service) => Rc::new(service),
        Err(e) => {
            warn!(error = %e, "notifications unavailable");
            Rc::new(NoNotifications)
        }
    }
}
