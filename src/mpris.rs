use std::collections::HashMap;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_io::{Timer, block_on};
use tracing::{debug, error, warn};
use zbus::object_server::SignalEmitter;
use zbus::{Connection, interface};
use zvariant::{ObjectPath, OwnedObjectPath, OwnedValue, Value};

use crate::host::{HostChannel, HostMessage, TrackInfo};
use crate::player::PlaybackState;

const OBJECT_PATH: &str = "/org/mpris/MediaPlayer2";
const NO_TRACK: &str = "/org/mpris/MediaPlayer2/TrackList/NoTrack";

/// Requests coming from MPRIS clients.
#[derive(Clone, Debug, PartialEq)]
pub enum ControlCmd {
    Quit,
    Play,
    Pause,
    PlayPause,
    Stop,
    Next,
    Prev,
    /// Absolute position in microseconds.
    Seek(u64),
    SetVolume(f64),
}

#[derive(Debug, Default)]
struct Flags {
    can_go_next: bool,
    can_go_previous: bool,
    can_play: bool,
    can_pause: bool,
    can_seek: bool,
    can_change_volume: bool,
}

#[derive(Debug)]
struct SharedState {
    identity: String,
    playback: PlaybackState,
    title: Option<String>,
    artist: Vec<String>,
    album: Option<String>,
    art_url: Option<String>,
    length_micros: Option<u64>,
    track_id: Option<OwnedObjectPath>,
    track_serial: u64,
    position: u64,
    volume: f64,
    flags: Flags,
}

impl Default for SharedState {
    fn default() -> Self {
        Self {
            identity: String::new(),
            playback: PlaybackState::Unknown,
            title: None,
            artist: Vec::new(),
            album: None,
            art_url: None,
            length_micros: None,
            track_id: None,
            track_serial: 0,
            position: 0,
            volume: 1.0,
            flags: Flags::default(),
        }
    }
}

impl SharedState {
    fn apply(&mut self, message: &HostMessage) {
        match message {
            HostMessage::SetTrackPosition(position) => self.position = *position,
            HostMessage::UpdateVolume(volume) => self.volume = *volume,
            HostMessage::SetFlag { name, value } => {
                let slot = match *name {
                    "can-go-next" => &mut self.flags.can_go_next,
                    "can-go-previous" => &mut self.flags.can_go_previous,
                    "can-play" => &mut self.flags.can_play,
                    "can-pause" => &mut self.flags.can_pause,
                    "can-seek" => &mut self.flags.can_seek,
                    "can-change-volume" => &mut self.flags.can_change_volume,
                    _ => return,
                };
                *slot = *value;
            }
            HostMessage::SetTrackInfo(info) => self.set_track(info),
        }
    }

    fn set_track(&mut self, info: &TrackInfo) {
        let artist: Vec<String> = info.artist.iter().cloned().collect();
        let same_track =
            self.title == info.title && self.artist == artist && self.album == info.album;
        if !same_track {
            self.track_serial += 1;
        }

        self.playback = info.state;
        self.title = info.title.clone();
        self.artist = artist;
        self.album = info.album.clone();
        self.length_micros = (info.length > 0).then_some(info.length);
        self.art_url = match (&info.artwork_file, &info.artwork_location) {
            (Some(file), _) => Some(format!("file://{file}")),
            (None, Some(location)) => Some(location.clone()),
            (None, None) => None,
        };
        self.track_id = match info.title {
            Some(_) => ObjectPath::try_from(format!(
                "/org/tunebridge/track/{}",
                self.track_serial
            ))
            .ok()
            .map(OwnedObjectPath::from),
            None => None,
        };
    }

    fn playback_status(&self) -> &'static str {
        match self.playback {
            PlaybackState::Unknown => "Stopped",
            PlaybackState::Playing => "Playing",
            PlaybackState::Paused => "Paused",
        }
    }

    fn metadata(&self) -> HashMap<String, OwnedValue> {
        let mut map = HashMap::new();
        let track_id = match &self.track_id {
            Some(id) => id.clone().into_inner(),
            None => ObjectPath::from_static_str_unchecked(NO_TRACK),
        };
        insert(&mut map, "mpris:trackid", Value::from(track_id));
        if let Some(title) = &self.title {
            insert(&mut map, "xesam:title", Value::from(title.clone()));
        }
        if !self.artist.is_empty() {
            insert(&mut map, "xesam:artist", Value::from(self.artist.clone()));
        }
        if let Some(album) = &self.album {
            insert(&mut map, "xesam:album", Value::from(album.clone()));
        }
        if let Some(url) = &self.art_url {
            insert(&mut map, "mpris:artUrl", Value::from(url.clone()));
        }
        if let Some(length) = self.length_micros {
            let length = i64::try_from(length).unwrap_or(i64::MAX);
            insert(&mut map, "mpris:length", Value::from(length));
        }
        map
    }
}

fn insert(map: &mut HashMap<String, OwnedValue>, key: &str, value: Value<'_>) {
    match OwnedValue::try_from(value) {
        Ok(v) => {
            map.insert(key.to_string(), v);
        }
        Err(e) => warn!(key, error = %e, "MPRIS: cannot convert metadata value"),
    }
}

/// Host channel that mirrors player state onto the MPRIS service.
pub struct MprisHandle {
    state: Arc<Mutex<SharedState>>,
    notify: Sender<()>,
}

impl MprisHandle {
    /// Handle without a D-Bus service behind it.
    pub fn detached(identity: &str) -> Self {
        let (notify, _) = mpsc::channel();
        Self {
            state: Arc::new(Mutex::new(SharedState {
                identity: identity.to_string(),
                ..SharedState::default()
            })),
            notify,
        }
    }
}

impl HostChannel for MprisHandle {
    fn call(&self, message: HostMessage) {
        debug!(path = message.path(), payload = %message.payload(), "host message");
        if let Ok(mut s) = self.state.lock() {
            s.apply(&message);
        }
        let _ = self.notify.send(());
    }
}

struct RootIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

#[interface(name = "org.mpris.MediaPlayer2")]
impl RootIface {
    fn raise(&self) {
        // The browser owns the window.
    }

    fn quit(&self) {
        let _ = self.tx.send(ControlCmd::Quit);
    }

    #[zbus(property)]
    fn can_quit(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_raise(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn has_track_list(&self) -> bool {
        false
    }

    #[zbus(property)]
    fn identity(&self) -> String {
        self.state
            .lock()
            .map(|s| s.identity.clone())
            .unwrap_or_default()
    }

    #[zbus(property)]
    fn supported_uri_schemes(&self) -> Vec<String> {
        vec![]
    }

    #[zbus(property)]
    fn supported_mime_types(&self) -> Vec<String> {
        vec![]
    }
}

struct PlayerIface {
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
}

impl PlayerIface {
    fn read<T>(&self, default: T, f: impl FnOnce(&SharedState) -> T) -> T {
        match self.state.lock() {
            Ok(s) => f(&s),
            Err(_) => default,
        }
    }

    fn send(&self, cmd: ControlCmd) {
        let _ = self.tx.send(cmd);
    }
}

#[interface(name = "org.mpris.MediaPlayer2.Player")]
impl PlayerIface {
    fn next(&self) {
        self.send(ControlCmd::Next);
    }

    fn previous(&self) {
        self.send(ControlCmd::Prev);
    }

    fn play(&self) {
        self.send(ControlCmd::Play);
    }

    fn pause(&self) {
        self.send(ControlCmd::Pause);
    }

    fn play_pause(&self) {
        self.send(ControlCmd::PlayPause);
    }

    fn stop(&self) {
        self.send(ControlCmd::Stop);
    }

    /// Relative seek, offset in microseconds.
    fn seek(&self, offset: i64) {
        let (position, can_seek) = self.read((0, false), |s| (s.position, s.flags.can_seek));
        if can_seek {
            let target = (position as i64).saturating_add(offset).max(0);
            self.send(ControlCmd::Seek(target as u64));
        }
    }

    fn set_position(&self, track_id: ObjectPath<'_>, position: i64) {
        let current = self.read(None, |s| s.track_id.clone());
        let matches = current.as_ref().is_some_and(|id| id.as_str() == track_id.as_str());
        if matches && position >= 0 {
            self.send(ControlCmd::Seek(position as u64));
        }
    }

    #[zbus(property)]
    fn playback_status(&self) -> &str {
        self.read("Stopped", |s| s.playback_status())
    }

    #[zbus(property)]
    fn rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn minimum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn maximum_rate(&self) -> f64 {
        1.0
    }

    #[zbus(property)]
    fn position(&self) -> i64 {
        self.read(0, |s| i64::try_from(s.position).unwrap_or(i64::MAX))
    }

    #[zbus(property)]
    fn volume(&self) -> f64 {
        self.read(1.0, |s| s.volume)
    }

    #[zbus(property)]
    fn set_volume(&mut self, volume: f64) {
        if self.read(false, |s| s.flags.can_change_volume) {
            self.send(ControlCmd::SetVolume(volume.clamp(0.0, 1.0)));
        }
    }

    #[zbus(property)]
    fn can_control(&self) -> bool {
        true
    }

    #[zbus(property)]
    fn can_play(&self) -> bool {
        self.read(false, |s| s.flags.can_play)
    }

    #[zbus(property)]
    fn can_pause(&self) -> bool {
        self.read(false, |s| s.flags.can_pause)
    }

    #[zbus(property)]
    fn can_go_next(&self) -> bool {
        self.read(false, |s| s.flags.can_go_next)
    }

    #[zbus(property)]
    fn can_go_previous(&self) -> bool {
        self.read(false, |s| s.flags.can_go_previous)
    }

    #[zbus(property)]
    fn can_seek(&self) -> bool {
        self.read(false, |s| s.flags.can_seek)
    }

    #[zbus(property)]
    fn metadata(&self) -> HashMap<String, OwnedValue> {
        self.read(HashMap::new(), |s| s.metadata())
    }
}

/// Export the MPRIS service as `org.mpris.MediaPlayer2.<bus_suffix>` on a
/// background thread.
pub fn spawn_mpris(identity: &str, bus_suffix: &str, tx: Sender<ControlCmd>) -> MprisHandle {
    let state = Arc::new(Mutex::new(SharedState {
        identity: identity.to_string(),
        ..SharedState::default()
    }));
    let (notify, notify_rx) = mpsc::channel();
    let bus_name = format!("org.mpris.MediaPlayer2.{bus_suffix}");

    let state_for_thread = state.clone();
    std::thread::spawn(move || {
        block_on(async move {
            if let Err(e) = serve(&bus_name, tx, state_for_thread, notify_rx).await {
                error!(error = %e, "MPRIS service stopped");
            }
        });
    });

    MprisHandle { state, notify }
}

async fn serve(
    bus_name: &str,
    tx: Sender<ControlCmd>,
    state: Arc<Mutex<SharedState>>,
    notify_rx: Receiver<()>,
) -> zbus::Result<()> {
    let connection = Connection::session().await?;
    connection.request_name(bus_name).await?;

    let object_server = connection.object_server();
    object_server
        .at(
            OBJECT_PATH,
            RootIface {
                tx: tx.clone(),
                state: state.clone(),
            },
        )
        .await?;
    object_server
        .at(OBJECT_PATH, PlayerIface { tx, state })
        .await?;
    debug!(bus_name, "MPRIS service exported");

    let player = object_server
        .interface::<_, PlayerIface>(OBJECT_PATH)
        .await?;
    loop {
        Timer::after(Duration::from_millis(200)).await;
        let mut changed = false;
        while notify_rx.try_recv().is_ok() {
            changed = true;
        }
        if changed {
            emit_changes(&*player.get().await, player.signal_emitter()).await;
        }
    }
}

async fn emit_changes(iface: &PlayerIface, emitter: &SignalEmitter<'_>) {
    let results = [
        iface.playback_status_changed(emitter).await,
        iface.metadata_changed(emitter).await,
        iface.volume_changed(emitter).await,
        iface.can_play_changed(emitter).await,
        iface.can_pause_changed(emitter).await,
        iface.can_go_next_changed(emitter).await,
        iface.can_go_previous_changed(emitter).await,
        iface.can_seek_changed(emitter).await,
    ];
    for result in results {
        if let Err(e) = result {
            warn!(error = %e, "MPRIS: failed to emit PropertiesChanged");
        }
    }
}
