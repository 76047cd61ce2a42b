use std::io::Read;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

use serde_json::json;
use tracing::{debug, info, warn};

use super::adapters::{ActionTable, ComponentSet, Outbox};
use super::protocol::{self, BridgeMessage, ProtocolError, ScriptMessage};
use crate::artwork::ArtworkResult;
use crate::host::ActionRegistry;
use crate::mpris::ControlCmd;
use crate::player::{MediaKey, PlayerAction, QUIT_ACTION};
use crate::session::Session;
use crate::time::TimeValue;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Input from the stdin reader thread.
#[derive(Debug)]
pub enum Inbound {
    Message(Result<ScriptMessage, ProtocolError>),
    Closed,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Read frames from `reader` on a helper thread until the stream ends.
pub fn spawn_reader<R: Read + Send + 'static>(mut reader: R, tx: Sender<Inbound>) {
    std::thread::spawn(move || {
        loop {
            match protocol::read_frame(&mut reader) {
                Ok(Some(frame)) => {
                    if tx.send(Inbound::Message(protocol::decode(&frame))).is_err() {
                        return;
                    }
                }
                Ok(None) => break,
                Err(e) => {
                    let _ = tx.send(Inbound::Message(Err(e)));
                    break;
                }
            }
        }
        let _ = tx.send(Inbound::Closed);
    });
}

/// Routes script messages, MPRIS commands and artwork completions into the
/// session, and delivers queued action activations.
pub struct Bridge {
    session: Session,
    outbox: Rc<Outbox>,
    actions: Rc<ActionTable>,
    components: Rc<ComponentSet>,
}

impl Bridge {
    pub fn new(
        session: Session,
        outbox: Rc<Outbox>,
        actions: Rc<ActionTable>,
        components: Rc<ComponentSet>,
    ) -> Self {
        Self {
            session,
            outbox,
            actions,
            components,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Run the start-up handlers.
    pub fn start(&self) -> Flow {
        self.session.init_app_runner();
        self.session.init_web_worker();
        self.drain_actions()
    }

    pub fn handle_script(&self, message: ScriptMessage) -> Flow {
        debug!(?message, "script message");
        let player = self.session.player();
        match message {
            ScriptMessage::SetTrack(update) => {
                if let Err(e) = player.borrow_mut().set_track(update) {
                    self.report(&e);
                }
            }
            ScriptMessage::SetTrackPosition { position } => {
                let position = position.unwrap_or(TimeValue::Micros(0));
                if let Err(e) = player.borrow_mut().set_track_position(position) {
                    self.report(&e);
                }
            }
            ScriptMessage::UpdateVolume { volume } => player.borrow_mut().update_volume(volume),
            ScriptMessage::SetPlaybackState { state } => {
                player.borrow_mut().set_playback_state(state)
            }
            ScriptMessage::SetCapability { capability, value } => {
                player.borrow_mut().set_capability(capability, value)
            }
            ScriptMessage::AddExtraActions { actions } => {
                player.borrow_mut().add_extra_actions(actions)
            }
            ScriptMessage::UriChanged { uri } => self.session.uri_changed(&uri),
            ScriptMessage::NavigationRequest { url } => {
                let approved = self.session.navigation_allowed(&url);
                self.outbox.send(&BridgeMessage::Navigation { url, approved });
            }
            ScriptMessage::HomePageRequest => self.outbox.send(&BridgeMessage::HomePage {
                url: self.session.home_page(),
            }),
            ScriptMessage::LastPageRequest => self.outbox.send(&BridgeMessage::LastPage {
                url: self.session.last_page(),
            }),
            ScriptMessage::MediaKey { key } => {
                self.session.media_key_pressed(&MediaKey::from_name(&key))
            }
            ScriptMessage::ActivateAction { name, param } => self.actions.activate(&name, param),
            ScriptMessage::PreferencesForm => self.outbox.send(&BridgeMessage::PreferencesForm {
                form: self.session.preferences_form(),
            }),
            ScriptMessage::SetPreference { key, value } => {
                let config = &self.session.host().config;
                if let Err(e) = config.set(&key, toml::Value::String(value)) {
                    self.report(&e);
                }
            }
            ScriptMessage::ComponentLoaded { id } => {
                self.components.set_loaded(&id, true);
                self.session.component_loaded(&id);
            }
            ScriptMessage::ComponentUnloaded { id } => {
                self.components.set_loaded(&id, false);
                self.session.component_unloaded(&id);
            }
            ScriptMessage::Quit => {
                if self.quit() == Flow::Quit {
                    return Flow::Quit;
                }
            }
        }
        self.drain_actions()
    }

    pub fn handle_control(&self, cmd: ControlCmd) -> Flow {
        debug!(?cmd, "MPRIS command");
        let (action, param) = match cmd {
            ControlCmd::Quit => return self.quit(),
            ControlCmd::Play => (PlayerAction::Play, None),
            ControlCmd::Pause => (PlayerAction::Pause, None),
            ControlCmd::PlayPause => (PlayerAction::TogglePlay, None),
            ControlCmd::Stop => (PlayerAction::Stop, None),
            ControlCmd::Next => (PlayerAction::NextSong, None),
            ControlCmd::Prev => (PlayerAction::PrevSong, None),
            ControlCmd::Seek(position) => (PlayerAction::Seek, Some(json!(position))),
            ControlCmd::SetVolume(volume) => (PlayerAction::ChangeVolume, Some(json!(volume))),
        };
        self.actions.activate(action.as_str(), param);
        self.drain_actions()
    }

    pub fn handle_artwork(&self, result: ArtworkResult) {
        self.session
            .player()
            .borrow_mut()
            .on_artwork_downloaded(result);
    }

    /// Report a failure back to the script without stopping the bridge.
    pub fn report(&self, error: &dyn std::error::Error) {
        warn!(error = %error, "request failed");
        self.outbox.send(&BridgeMessage::Error {
            message: error.to_string(),
        });
    }

    /// Deliver queued activations, including those queued while delivering.
    pub fn drain_actions(&self) -> Flow {
        while let Some(activation) = self.actions.pop() {
            if activation.name == QUIT_ACTION {
                if self.quit() == Flow::Quit {
                    return Flow::Quit;
                }
                continue;
            }
            if !self.actions.is_enabled(&activation.name) {
                debug!(action = %activation.name, "ignoring disabled action");
                continue;
            }
            self.outbox.send(&BridgeMessage::ActionActivated {
                name: activation.name.clone(),
                param: activation.param.clone(),
            });
            self.session
                .action_activated(&activation.name, activation.param.as_ref());
        }
        Flow::Continue
    }

    fn quit(&self) -> Flow {
        let approved = self.session.request_quit();
        self.outbox.send(&BridgeMessage::Quit { approved });
        if approved {
            Flow::Quit
        } else {
            info!("quit withheld, keeping playback running in background");
            Flow::Continue
        }
    }
}

/// Main loop. Returns when the script disconnects or a quit is approved.
pub fn run(
    bridge: &Bridge,
    inbound: &Receiver<Inbound>,
    control_rx: &Receiver<ControlCmd>,
    artwork_rx: &Receiver<ArtworkResult>,
) {
    if bridge.start() == Flow::Quit {
        return;
    }
    loop {
        match inbound.recv_timeout(POLL_INTERVAL) {
            Ok(Inbound::Message(Ok(message))) => {
                if bridge.handle_script(message) == Flow::Quit {
                    return;
                }
            }
            Ok(Inbound::Message(Err(e))) => bridge.report(&e),
            Ok(Inbound::Closed) | Err(RecvTimeoutError::Disconnected) => {
                info!("script disconnected");
                return;
            }
            Err(RecvTimeoutError::Timeout) => {}
        }

        while let Ok(cmd) = control_rx.try_recv() {
            if bridge.handle_control(cmd) == Flow::Quit {
                return;
            }
        }

        while let Ok(result) = artwork_rx.try_recv() {
            bridge.handle_artwork(result);
        }
    }
}

#[cfg(test)]
mod tests;
