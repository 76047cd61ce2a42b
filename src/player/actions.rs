//! Action identifiers and the ordered action lists derived from player state.

use super::model::PlaybackState;

pub const QUIT_ACTION: &str = "quit";

/// Base media player actions.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlayerAction {
    Play,
    TogglePlay,
    Pause,
    Stop,
    PrevSong,
    NextSong,
    PlaybackNotification,
    /// Parameter: target position in microseconds.
    Seek,
    /// Parameter: target volume `0.0..=1.0`.
    ChangeVolume,
}

impl PlayerAction {
    pub fn as_str(self) -> &'static str {
        match self {
            PlayerAction::Play => "play",
            PlayerAction::TogglePlay => "toggle-play",
            PlayerAction::Pause => "pause",
            PlayerAction::Stop => "stop",
            PlayerAction::PrevSong => "prev-song",
            PlayerAction::NextSong => "next-song",
            PlayerAction::PlaybackNotification => "playback-notification",
            PlayerAction::Seek => "seek",
            PlayerAction::ChangeVolume => "change-volume",
        }
    }
}

/// Transport actions listed in menus and in the track-info report.
pub const BASE_ACTIONS: [PlayerAction; 5] = [
    PlayerAction::TogglePlay,
    PlayerAction::Play,
    PlayerAction::Pause,
    PlayerAction::PrevSong,
    PlayerAction::NextSong,
];

/// Actions offered on the playback notification.
pub const NOTIFICATION_ACTIONS: [PlayerAction; 4] = [
    PlayerAction::PrevSong,
    PlayerAction::Play,
    PlayerAction::Pause,
    PlayerAction::NextSong,
];

/// Integration-supplied actions, kept in insertion order without duplicates.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExtraActions(Vec<String>);

impl ExtraActions {
    /// Append unseen names. Returns true if anything was added.
    pub fn merge<I, S>(&mut self, names: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let before = self.0.len();
        for name in names {
            let name = name.as_ref();
            if !self.0.iter().any(|existing| existing == name) {
                self.0.push(name.to_string());
            }
        }
        self.0.len() != before
    }

    pub fn as_slice(&self) -> &[String] {
        &self.0
    }
}

/// Base actions followed by the extras.
pub fn playback_actions(extras: &ExtraActions) -> Vec<String> {
    BASE_ACTIONS
        .iter()
        .map(|a| a.as_str().to_string())
        .chain(extras.as_slice().iter().cloned())
        .collect()
}

/// Launcher action list: play or pause, prev, next, extras, quit.
pub fn primary_actions(state: PlaybackState, extras: &ExtraActions) -> Vec<String> {
    let toggle = if state == PlaybackState::Playing {
        PlayerAction::Pause
    } else {
        PlayerAction::Play
    };

    [toggle, PlayerAction::PrevSong, PlayerAction::NextSong]
        .iter()
        .map(|a| a.as_str().to_string())
        .chain(extras.as_slice().iter().cloned())
        .chain(std::iter::once(QUIT_ACTION.to_string()))
        .collect()
}

/// Media keys delivered by the host's key-capture service.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MediaKey {
    Play,
    Pause,
    Stop,
    Next,
    Prev,
    Other(String),
}

impl MediaKey {
    pub fn from_name(name: &str) -> Self {
        match name {
            "Play" | "play" => MediaKey::Play,
            "Pause" | "pause" => MediaKey::Pause,
            "Stop" | "stop" => MediaKey::Stop,
            "Next" | "next" => MediaKey::Next,
            "Previous" | "Prev" | "previous" | "prev" => MediaKey::Prev,
            other => MediaKey::Other(other.to_string()),
        }
    }

    /// Action triggered by this key, if any.
    pub fn action(&self) -> Option<PlayerAction> {
        match self {
            MediaKey::Play | MediaKey::Pause => Some(PlayerAction::TogglePlay),
            MediaKey::Stop => Some(PlayerAction::Stop),
            MediaKey::Next => Some(PlayerAction::NextSong),
            MediaKey::Prev => Some(PlayerAction::PrevSong),
            MediaKey::Other(_) => None,
        }
    }
}
