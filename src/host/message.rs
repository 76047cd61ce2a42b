use serde::Serialize;
use serde_json::{Value, json};

use crate::player::PlaybackState;

const SET_TRACK_POSITION: &str = "/nuvola/mediaplayer/set-track-position";
const UPDATE_VOLUME: &str = "/nuvola/mediaplayer/update-volume";
const SET_FLAG: &str = "/nuvola/mediaplayer/set-flag";
const SET_TRACK_INFO: &str = "/nuvola/mediaplayer/set-track-info";

/// Track info record reported to the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackInfo {
    pub title: Option<String>,
    pub artist: Option<String>,
    pub album: Option<String>,
    /// Clamped to `0.0..=1.0`.
    pub rating: f64,
    /// Microseconds, 0 when unknown.
    pub length: u64,
    pub artwork_location: Option<String>,
    pub artwork_file: Option<String>,
    pub playback_actions: Vec<String>,
    pub state: PlaybackState,
}

/// One-way notification sent to the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostMessage {
    SetTrackPosition(u64),
    UpdateVolume(f64),
    SetFlag { name: &'static str, value: bool },
    SetTrackInfo(TrackInfo),
}

impl HostMessage {
    pub fn path(&self) -> &'static str {
        match self {
            HostMessage::SetTrackPosition(_) => SET_TRACK_POSITION,
            HostMessage::UpdateVolume(_) => UPDATE_VOLUME,
            HostMessage::SetFlag { .. } => SET_FLAG,
            HostMessage::SetTrackInfo(_) => SET_TRACK_INFO,
        }
    }

    /// Positional payload as sent over the wire.
    pub fn payload(&self) -> Value {
        match self {
            HostMessage::SetTrackPosition(position) => json!([position]),
            HostMessage::UpdateVolume(volume) => json!([volume]),
            HostMessage::SetFlag { name, value } => json!([name, value]),
            HostMessage::SetTrackInfo(info) => serde_json::to_value(info).unwrap_or(Value::Null),
        }
    }
}
