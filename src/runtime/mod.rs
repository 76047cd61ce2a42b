//! Process runtime: wires the session to stdin/stdout, the session bus and
//! the artwork downloader, then runs the event loop.

use std::rc::Rc;
use std::sync::mpsc;

use tracing::info;

use crate::artwork::{ArtworkResult, HttpArtworkFetcher};
use crate::host::{Collaborators, HostChannel};
use crate::mpris::{self, ControlCmd, MprisHandle};
use crate::player::{COMPONENT_NOTIFICATIONS, PlayerOptions};
use crate::session::Session;
use crate::webapp::{WebApp, WebAppMeta};

mod adapters;
mod event_loop;
mod protocol;
mod settings;
mod startup;
#[cfg(test)]
mod testing;

pub use adapters::{ActionTable, Activation, ComponentSet, Outbox, ScriptHooks};
pub use event_loop::{Bridge, Flow, Inbound};
pub use protocol::{BridgeMessage, ProtocolError, ScriptMessage};

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let settings = settings::load_settings();
    startup::init_tracing(&settings.log.level);
    info!(id = %settings.web_app.id, "starting bridge");

    let store = Rc::new(startup::open_store(&settings)?);

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let (artwork_tx, artwork_rx) = mpsc::channel::<ArtworkResult>();
    let (inbound_tx, inbound_rx) = mpsc::channel::<Inbound>();

    let ipc: Rc<dyn HostChannel> = if settings.mpris.enabled {
        Rc::new(mpris::spawn_mpris(
            &settings.web_app.name,
            &settings.web_app.id,
            control_tx,
        ))
    } else {
        Rc::new(MprisHandle::detached(&settings.web_app.name))
    };

    let artwork_dir = settings.artwork_dir();
    startup::prepare_artwork_dir(&artwork_dir);

    let outbox = Rc::new(Outbox::new(Box::new(std::io::stdout())));
    let actions = Rc::new(ActionTable::new());
    let mut loaded = vec!["mpris"];
    if settings.notifications.enabled {
        loaded.push(COMPONENT_NOTIFICATIONS);
    }
    let components = Rc::new(ComponentSet::new(loaded));

    let host = Collaborators {
        ipc,
        actions: actions.clone(),
        launcher: outbox.clone(),
        menu: outbox.clone(),
        notifications: startup::notification_service(&settings),
        artwork: Rc::new(HttpArtworkFetcher::new(artwork_dir, artwork_tx)),
        components: components.clone(),
        config: store.clone(),
    };
    let options = PlayerOptions {
        app_name: settings.web_app.name.clone(),
        app_icon: settings.web_app.icon.clone(),
        notification_category: settings.notifications.category.clone(),
    };

    let mut session = Session::new(host, options);
    let web_app = WebApp::new(
        WebAppMeta::from(&settings.web_app),
        store,
        Box::new(ScriptHooks::new(outbox.clone())),
    )?;
    session.attach_web_app(web_app)?;

    event_loop::spawn_reader(std::io::stdin(), inbound_tx);
    let bridge = Bridge::new(session, outbox, actions, components);
    event_loop::run(&bridge, &inbound_rx, &control_rx, &artwork_rx);

    info!("bridge stopped");
    Ok(())
}
