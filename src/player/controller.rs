use std::path::{Path, PathBuf};

use serde_json::json;
use tracing::{debug, info, warn};

use super::actions::{
    ExtraActions, MediaKey, NOTIFICATION_ACTIONS, PlayerAction, QUIT_ACTION, playback_actions,
    primary_actions,
};
use super::model::{
    Capabilities, Capability, PlaybackState, TrackField, TrackState, TrackUpdate,
};
use crate::artwork::{ArtworkIds, ArtworkRequest, ArtworkResult, PendingArtwork};
use crate::bus::{FormEntry, PreferencesForm, QuitRequest, Signal, SignalKind, Subscriber};
use crate::config::{BackgroundRunPreference, RUN_IN_BACKGROUND, migrate_store};
use crate::host::{
    ActionParam, ActionSpec, Collaborators, HostMessage, Notification, NotificationContent,
    TrackInfo,
};
use crate::time::{TimeError, TimeValue};

/// Component providing desktop notifications.
pub const COMPONENT_NOTIFICATIONS: &str = "notifications";
/// Components switched on when the app runner starts.
pub const COMPONENTS_TO_ACTIVATE: [&str; 4] = ["mpris", "lyrics", "mediakeys", "scrobbler"];

const ACTION_GROUP: &str = "playback";
const MENU_ID: &str = "playback";
const MENU_LABEL: &str = "_Control";
const NOTIFICATION_NAME: &str = "mediaplayer";

/// Presentation details the player needs from the web app.
#[derive(Debug, Clone)]
pub struct PlayerOptions {
    /// Launcher tooltip when nothing is playing.
    pub app_name: String,
    /// Icon for notifications without artwork.
    pub app_icon: String,
    pub notification_category: String,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            app_name: "Web Player".to_string(),
            app_icon: "audio-x-generic".to_string(),
            notification_category: "x-gnome.music".to_string(),
        }
    }
}

/// Media player controller for one session.
pub struct MediaPlayer {
    host: Collaborators,
    options: PlayerOptions,
    app_runner: bool,

    track: TrackState,
    state: PlaybackState,
    caps: Capabilities,
    position: u64,
    volume: f64,
    extras: ExtraActions,

    artwork_file: Option<PathBuf>,
    artwork_ids: ArtworkIds,
    pending_artwork: Option<PendingArtwork>,

    notification: Option<Box<dyn Notification>>,
}

impl MediaPlayer {
    pub fn new(host: Collaborators, options: PlayerOptions) -> Self {
        Self {
            host,
            options,
            app_runner: false,
            track: TrackState::default(),
            state: PlaybackState::Unknown,
            caps: Capabilities::default(),
            position: 0,
            volume: 1.0,
            extras: ExtraActions::default(),
            artwork_file: None,
            artwork_ids: ArtworkIds::default(),
            pending_artwork: None,
            notification: None,
        }
    }

    pub fn track(&self) -> &TrackState {
        &self.track
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.state
    }

    pub fn capabilities(&self) -> &Capabilities {
        &self.caps
    }

    /// Microseconds.
    pub fn position(&self) -> u64 {
        self.position
    }

    pub fn volume(&self) -> f64 {
        self.volume
    }

    pub fn artwork_file(&self) -> Option<&Path> {
        self.artwork_file.as_deref()
    }

    pub fn extra_actions(&self) -> &[String] {
        self.extras.as_slice()
    }

    /// Ordered launcher actions for the current state.
    pub fn primary_actions(&self) -> Vec<String> {
        primary_actions(self.state, &self.extras)
    }

    /// Set info about the current track. Identical info is a no-op.
    ///
    /// A new artwork URL starts a download; the notification and tooltip are
    /// refreshed when it completes (see [`MediaPlayer::on_artwork_downloaded`]).
    pub fn set_track(&mut self, update: TrackUpdate) -> Result<(), TimeError> {
        let track = update.into_state()?;
        let changes = track.diff(&self.track);
        if changes.is_empty() {
            return Ok(());
        }
        debug!(changed = ?changes.fields(), "track changed");
        self.track = track;

        if self.track.artwork_url().is_none() {
            self.artwork_file = None;
            self.cancel_pending_artwork();
        }

        let artwork_url = self.track.artwork_url().map(str::to_string);
        match artwork_url {
            Some(url) if changes.contains(TrackField::ArtLocation) => {
                self.artwork_file = None;
                self.cancel_pending_artwork();
                let id = self.artwork_ids.next_id();
                debug!(%id, %url, "requesting artwork");
                self.pending_artwork = Some(PendingArtwork { id, changes });
                self.host.artwork.fetch(ArtworkRequest { id, url });
                self.send_devel_info();
            }
            _ => self.update_track_info(),
        }
        Ok(())
    }

    /// Completion of an artwork download. Results for superseded requests
    /// are dropped.
    pub fn on_artwork_downloaded(&mut self, result: ArtworkResult) {
        let pending = match self.pending_artwork.take() {
            Some(p) if p.id == result.id => p,
            other => {
                debug!(id = %result.id, "ignoring stale artwork result");
                self.pending_artwork = other;
                return;
            }
        };

        match result.outcome {
            Ok(path) => self.artwork_file = Some(path),
            Err(e) => {
                self.artwork_file = None;
                warn!(id = %result.id, error = %e, "Artwork download failed");
            }
        }
        debug!(changed = ?pending.changes.fields(), "artwork resolved");
        self.update_track_info();
    }

    /// Current position, as display string or microseconds.
    pub fn set_track_position(&mut self, position: TimeValue) -> Result<(), TimeError> {
        let position = position.to_micros()?.unwrap_or(0);
        if self.position != position {
            self.position = position;
            self.host.ipc.call(HostMessage::SetTrackPosition(position));
        }
        Ok(())
    }

    /// Current volume `0.0..=1.0`. Not clamped here.
    pub fn update_volume(&mut self, volume: f64) {
        let volume = if volume.is_nan() { 0.0 } else { volume };
        if self.volume != volume {
            self.volume = volume;
            self.host.ipc.call(HostMessage::UpdateVolume(volume));
        }
    }

    pub fn set_playback_state(&mut self, state: PlaybackState) {
        if self.state != state {
            self.state = state;
            self.set_action_enabled(
                PlayerAction::PlaybackNotification,
                state != PlaybackState::Unknown,
            );
            self.publish_primary_actions();
            self.update_track_info();
        }
    }

    pub fn set_capability(&mut self, capability: Capability, value: bool) {
        match capability {
            Capability::CanGoNext => self.set_can_go_next(value),
            Capability::CanGoPrev => self.set_can_go_prev(value),
            Capability::CanPlay => self.set_can_play(value),
            Capability::CanPause => self.set_can_pause(value),
            Capability::CanRate => self.set_can_rate(value),
            Capability::CanSeek => self.set_can_seek(value),
            Capability::CanChangeVolume => self.set_can_change_volume(value),
        }
    }

    pub fn set_can_go_next(&mut self, value: bool) {
        if replace_flag(&mut self.caps.can_go_next, value) {
            self.set_action_enabled(PlayerAction::NextSong, value);
            self.set_flag("can-go-next", value);
            self.show_notification();
            self.send_devel_info();
        }
    }

    pub fn set_can_go_prev(&mut self, value: bool) {
        if replace_flag(&mut self.caps.can_go_prev, value) {
            self.set_action_enabled(PlayerAction::PrevSong, value);
            self.set_flag("can-go-previous", value);
            self.show_notification();
            self.send_devel_info();
        }
    }

    pub fn set_can_play(&mut self, value: bool) {
        if replace_flag(&mut self.caps.can_play, value) {
            self.set_action_enabled(PlayerAction::Play, value);
            self.set_action_enabled(PlayerAction::TogglePlay, self.caps.can_toggle_play());
            self.set_flag("can-play", value);
            self.show_notification();
            self.send_devel_info();
        }
    }

    pub fn set_can_pause(&mut self, value: bool) {
        if replace_flag(&mut self.caps.can_pause, value) {
            self.set_action_enabled(PlayerAction::Pause, value);
            self.set_action_enabled(PlayerAction::Stop, value);
            self.set_action_enabled(PlayerAction::TogglePlay, self.caps.can_toggle_play());
            self.set_flag("can-pause", value);
            self.set_flag("can-stop", value);
            self.show_notification();
            self.send_devel_info();
        }
    }

    /// Rating has no local action; the host decides how to expose it.
    pub fn set_can_rate(&mut self, value: bool) {
        if replace_flag(&mut self.caps.can_rate, value) {
            self.set_flag("can-rate", value);
        }
    }

    pub fn set_can_seek(&mut self, value: bool) {
        if replace_flag(&mut self.caps.can_seek, value) {
            self.set_action_enabled(PlayerAction::Seek, value);
            self.set_flag("can-seek", value);
        }
    }

    pub fn set_can_change_volume(&mut self, value: bool) {
        if replace_flag(&mut self.caps.can_change_volume, value) {
            self.set_action_enabled(PlayerAction::ChangeVolume, value);
            self.set_flag("can-change-volume", value);
        }
    }

    /// Add integration-specific actions (rating, thumbs up, ...).
    /// Names already present are ignored.
    pub fn add_extra_actions<I, S>(&mut self, actions: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        if self.extras.merge(actions) {
            self.update_menu();
            self.publish_primary_actions();
        }
    }

    fn init_app_runner(&mut self) {
        self.app_runner = true;
        self.host.launcher.set_actions(&[QUIT_ACTION.to_string()]);

        for spec in [
            ActionSpec::new(ACTION_GROUP, PlayerAction::Play.as_str(), "Play")
                .icon("media-playback-start"),
            ActionSpec::new(ACTION_GROUP, PlayerAction::Pause.as_str(), "Pause")
                .icon("media-playback-pause"),
            ActionSpec::new(ACTION_GROUP, PlayerAction::TogglePlay.as_str(), "Toggle play/pause"),
            ActionSpec::new(ACTION_GROUP, PlayerAction::Stop.as_str(), "Stop")
                .icon("media-playback-stop"),
            ActionSpec::new(ACTION_GROUP, PlayerAction::PrevSong.as_str(), "Previous song")
                .icon("media-skip-backward"),
            ActionSpec::new(ACTION_GROUP, PlayerAction::NextSong.as_str(), "Next song")
                .icon("media-skip-forward"),
            ActionSpec::new(ACTION_GROUP, PlayerAction::Seek.as_str(), "Seek").state(json!(0)),
            ActionSpec::new(ACTION_GROUP, PlayerAction::ChangeVolume.as_str(), "Change volume")
                .state(json!(-1.0)),
            ActionSpec::new(
                ACTION_GROUP,
                PlayerAction::PlaybackNotification.as_str(),
                "Show playback notification",
            ),
        ] {
            self.host.actions.add_action(spec);
        }

        let loaded = self
            .host
            .components
            .is_component_loaded(COMPONENT_NOTIFICATIONS);
        self.toggle_notifications(loaded);
        for id in COMPONENTS_TO_ACTIVATE {
            self.host.components.toggle_component_active(id, true);
        }

        if let Err(e) = migrate_store(self.host.config.as_ref()) {
            warn!(error = %e, "config migration failed");
        }

        self.update_menu();
    }

    fn init_web_worker(&mut self) {
        self.track = TrackState::default();
        self.artwork_file = None;
        self.cancel_pending_artwork();
        self.state = PlaybackState::Unknown;
        self.set_action_enabled(PlayerAction::PlaybackNotification, false);
        self.publish_primary_actions();
        self.update_track_info();

        let loaded = self
            .host
            .components
            .is_component_loaded(COMPONENT_NOTIFICATIONS);
        self.toggle_notifications(loaded);
    }

    fn on_action_activated(&mut self, name: &str, _param: Option<&ActionParam>) {
        if name == PlayerAction::PlaybackNotification.as_str() {
            if let Some(notification) = self.notification.as_mut() {
                notification.show();
            }
        }
    }

    fn on_media_key(&self, key: &MediaKey) {
        match key.action() {
            Some(action) => self.host.actions.activate(action.as_str(), None),
            None => info!(?key, "Unknown media key"),
        }
    }

    /// Withhold approval when the app should keep running in background.
    fn on_quit_request(&self, request: &mut QuitRequest) {
        let keep_running = match BackgroundRunPreference::load(self.host.config.as_ref()) {
            BackgroundRunPreference::Always => true,
            BackgroundRunPreference::WhilePlaying => self.state == PlaybackState::Playing,
            BackgroundRunPreference::Never => false,
        };
        if keep_running {
            request.approved = false;
        }
    }

    fn on_preferences_form(&self, form: &mut PreferencesForm) {
        let current = BackgroundRunPreference::load(self.host.config.as_ref());
        form.values
            .insert(RUN_IN_BACKGROUND.to_string(), current.as_str().to_string());
        form.entries.push(FormEntry::Label {
            text: "Run in background when window is closed".to_string(),
        });
        for option in BackgroundRunPreference::ALL {
            form.entries.push(FormEntry::Option {
                key: RUN_IN_BACKGROUND.to_string(),
                value: option.as_str().to_string(),
                label: option.label().to_string(),
            });
        }
    }

    fn on_component_loaded(&mut self, id: &str) {
        if id == COMPONENT_NOTIFICATIONS {
            self.toggle_notifications(true);
        }
        if COMPONENTS_TO_ACTIVATE.contains(&id) {
            self.host.components.toggle_component_active(id, true);
        }
    }

    fn on_component_unloaded(&mut self, id: &str) {
        if id == COMPONENT_NOTIFICATIONS {
            self.toggle_notifications(false);
        }
    }

    fn cancel_pending_artwork(&mut self) {
        if let Some(pending) = self.pending_artwork.take() {
            debug!(id = %pending.id, "cancelling artwork request");
            self.host.artwork.cancel(pending.id);
        }
    }

    fn set_action_enabled(&self, action: PlayerAction, enabled: bool) {
        self.host.actions.set_enabled(action.as_str(), enabled);
    }

    fn set_flag(&self, name: &'static str, value: bool) {
        self.host.ipc.call(HostMessage::SetFlag { name, value });
    }

    fn publish_primary_actions(&self) {
        self.host.launcher.set_actions(&self.primary_actions());
    }

    fn update_menu(&self) {
        self.host
            .menu
            .set_menu(MENU_ID, MENU_LABEL, &playback_actions(&self.extras));
    }

    fn track_info(&self) -> TrackInfo {
        let rating = match self.track.rating {
            Some(r) if r.is_nan() || r < 0.0 => 0.0,
            Some(r) => r.min(1.0),
            None => 0.0,
        };
        TrackInfo {
            title: non_empty(&self.track.title),
            artist: non_empty(&self.track.artist),
            album: non_empty(&self.track.album),
            rating,
            length: self.track.length.unwrap_or(0),
            artwork_location: non_empty(&self.track.art_location),
            artwork_file: self
                .artwork_file
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
            playback_actions: playback_actions(&self.extras),
            state: self.state,
        }
    }

    fn send_devel_info(&self) {
        self.host.ipc.call(HostMessage::SetTrackInfo(self.track_info()));
    }

    fn update_track_info(&mut self) {
        self.send_devel_info();
        match non_empty(&self.track.title) {
            Some(title) => {
                self.update_notification();
                let tooltip = match non_empty(&self.track.artist) {
                    Some(artist) => format!("{title} by {artist}"),
                    None => title,
                };
                self.host.launcher.set_tooltip(&tooltip);
            }
            None => self.host.launcher.set_tooltip(&self.options.app_name),
        }
    }

    fn notification_content(&self) -> Option<NotificationContent> {
        let title = non_empty(&self.track.title)?;
        let artist = non_empty(&self.track.artist);
        let album = non_empty(&self.track.album);
        let message = match (artist, album) {
            (None, None) => "by unknown artist".to_string(),
            (None, Some(album)) => format!("from {album}"),
            (Some(artist), None) => format!("by {artist}"),
            (Some(artist), Some(album)) => format!("by {artist} from {album}"),
        };
        Some(NotificationContent {
            title,
            message,
            icon_name: match self.artwork_file {
                Some(_) => None,
                None => Some(self.options.app_icon.clone()),
            },
            image: self.artwork_file.clone(),
        })
    }

    fn update_notification(&mut self) {
        if self.notification.is_none() {
            return;
        }
        if let Some(content) = self.notification_content() {
            if let Some(notification) = self.notification.as_mut() {
                notification.update(content);
            }
            self.show_notification();
        }
    }

    /// Show when playing, or when the backend keeps notifications around.
    /// The backend is asked each time since its capabilities can change.
    fn show_notification(&mut self) {
        let Some(notification) = self.notification.as_mut() else {
            return;
        };
        if self.state == PlaybackState::Playing
            || self.host.notifications.persistence_supported()
        {
            notification.show();
        }
    }

    fn toggle_notifications(&mut self, enabled: bool) {
        if !enabled {
            if self.notification.take().is_some() {
                debug!("notifications disabled");
            }
            return;
        }

        let notifications = self.host.notifications.clone();
        let mut notification = notifications.named_notification(
            NOTIFICATION_NAME,
            true,
            &self.options.notification_category,
        );
        if self.app_runner {
            let actions: Vec<String> = NOTIFICATION_ACTIONS
                .iter()
                .map(|a| a.as_str().to_string())
                .collect();
            notification.set_actions(&actions);
            self.notification = Some(notification);
        } else {
            self.notification = Some(notification);
            self.update_notification();
        }
    }
}

impl Subscriber for MediaPlayer {
    fn signals(&self) -> &'static [SignalKind] {
        &[
            SignalKind::InitAppRunner,
            SignalKind::InitWebWorker,
            SignalKind::ActionActivated,
            SignalKind::MediaKeyPressed,
            SignalKind::QuitRequest,
            SignalKind::ComponentLoaded,
            SignalKind::ComponentUnloaded,
            SignalKind::PreferencesForm,
        ]
    }

    fn on_signal(&mut self, signal: &mut Signal<'_>) {
        match signal {
            Signal::InitAppRunner => self.init_app_runner(),
            Signal::InitWebWorker => self.init_web_worker(),
            Signal::ActionActivated { name, param } => self.on_action_activated(name, *param),
            Signal::MediaKeyPressed(key) => self.on_media_key(key),
            Signal::QuitRequest(request) => self.on_quit_request(request),
            Signal::ComponentLoaded(id) => self.on_component_loaded(id),
            Signal::ComponentUnloaded(id) => self.on_component_unloaded(id),
            Signal::PreferencesForm(form) => self.on_preferences_form(form),
            _ => {}
        }
    }
}

/// Store `value` if it differs. Returns true on change.
fn replace_flag(slot: &mut Option<bool>, value: bool) -> bool {
    if *slot == Some(value) {
        return false;
    }
    *slot = Some(value);
    true
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_deref().filter(|s| !s.is_empty()).map(str::to_string)
}

