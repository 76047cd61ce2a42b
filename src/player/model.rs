//! Player state types: `TrackState`, its change-set, `PlaybackState` and
//! capability flags.

use serde::{Deserialize, Serialize};

use crate::time::{TimeError, TimeValue};

/// Playback state reported by the integration.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    #[default]
    Unknown,
    Paused,
    Playing,
}

impl PlaybackState {
    pub fn as_str(self) -> &'static str {
        match self {
            PlaybackState::Unknown => "unknown",
            PlaybackState::Paused => "paused",
            PlaybackState::Playing => "playing",
        }
    }
}

/// Track fields tracked by the change-set.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TrackField {
    Title,
    Artist,
    Album,
    ArtLocation,
    Rating,
    Length,
}

/// Fields that differ between two track snapshots, in declaration order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet(Vec<TrackField>);

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, field: TrackField) -> bool {
        self.0.contains(&field)
    }

    pub fn fields(&self) -> &[TrackField] {
        &self.0
    }
}

/// Stored track metadata. `None` means unset, which is distinct from an
/// empty string.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TrackState {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub art_location: Option<String>,
    /// `0.0..=1.0` when set.
    pub rating: Option<f64>,
    /// Microseconds.
    pub length: Option<u64>,
}

impl TrackState {
    /// Field-by-field comparison against `previous`.
    pub fn diff(&self, previous: &TrackState) -> ChangeSet {
        let mut changed = Vec::new();
        if self.title != previous.title {
            changed.push(TrackField::Title);
        }
        if self.artist != previous.artist {
            changed.push(TrackField::Artist);
        }
        if self.album != previous.album {
            changed.push(TrackField::Album);
        }
        if self.art_location != previous.art_location {
            changed.push(TrackField::ArtLocation);
        }
        if self.rating != previous.rating {
            changed.push(TrackField::Rating);
        }
        if self.length != previous.length {
            changed.push(TrackField::Length);
        }
        ChangeSet(changed)
    }

    /// Artwork URL, treating an empty string as absent.
    pub fn artwork_url(&self) -> Option<&str> {
        self.art_location.as_deref().filter(|s| !s.is_empty())
    }
}

/// Track record as reported by an integration script.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TrackUpdate {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    pub art_location: Option<String>,
    pub rating: Option<f64>,
    pub length: Option<TimeValue>,
}

impl TrackUpdate {
    /// Resolve the reported length and build the stored state.
    pub fn into_state(self) -> Result<TrackState, TimeError> {
        let length = match &self.length {
            Some(value) => value.to_micros()?,
            None => None,
        };
        Ok(TrackState {
            title: self.title,
            artist: self.artist,
            album: self.album,
            art_location: self.art_location,
            rating: self.rating,
            length,
        })
    }
}

/// Capability flags. Each one is unset until the integration reports it.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Capabilities {
    pub can_go_next: Option<bool>,
    pub can_go_prev: Option<bool>,
    pub can_play: Option<bool>,
    pub can_pause: Option<bool>,
    pub can_rate: Option<bool>,
    pub can_seek: Option<bool>,
    pub can_change_volume: Option<bool>,
}

impl Capabilities {
    /// Toggle-play is usable when either play or pause is.
    pub fn can_toggle_play(&self) -> bool {
        self.can_play.unwrap_or(false) || self.can_pause.unwrap_or(false)
    }
}

/// Capability names used by integration scripts.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Capability {
    CanGoNext,
    #[serde(alias = "can-go-previous")]
    CanGoPrev,
    CanPlay,
    CanPause,
    CanRate,
    CanSeek,
    CanChangeVolume,
}
