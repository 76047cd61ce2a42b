//! Native-messaging wire format shared with the browser-side script.
//!
//! Every frame is a 4-byte length in native byte order followed by that many
//! bytes of UTF-8 JSON. Messages are objects tagged by their `"type"` field.

use std::io::{self, Read, Write};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::bus::PreferencesForm;
use crate::player::{Capability, PlaybackState, TrackUpdate};
use crate::time::TimeValue;

/// Frames above this size are rejected without being read.
pub const MAX_FRAME_LEN: usize = 16 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("stream error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed message: {0}")]
    Json(#[from] serde_json::Error),
    #[error("frame of {0} bytes exceeds the limit")]
    FrameTooLarge(usize),
}

/// Messages from the integration script.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ScriptMessage {
    SetTrack(TrackUpdate),
    SetTrackPosition {
        #[serde(default)]
        position: Option<TimeValue>,
    },
    UpdateVolume {
        volume: f64,
    },
    SetPlaybackState {
        state: PlaybackState,
    },
    SetCapability {
        capability: Capability,
        value: bool,
    },
    AddExtraActions {
        actions: Vec<String>,
    },
    UriChanged {
        uri: String,
    },
    NavigationRequest {
        url: String,
    },
    HomePageRequest,
    LastPageRequest,
    MediaKey {
        key: String,
    },
    ActivateAction {
        name: String,
        #[serde(default)]
        param: Option<Value>,
    },
    PreferencesForm,
    SetPreference {
        key: String,
        value: String,
    },
    ComponentLoaded {
        id: String,
    },
    ComponentUnloaded {
        id: String,
    },
    Quit,
}

/// Messages to the integration script.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum BridgeMessage {
    InitWebWorker {
        id: String,
    },
    ActionActivated {
        name: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        param: Option<Value>,
    },
    HomePage {
        url: Option<String>,
    },
    LastPage {
        url: Option<String>,
    },
    Navigation {
        url: String,
        approved: bool,
    },
    PreferencesForm {
        form: PreferencesForm,
    },
    Launcher {
        #[serde(skip_serializing_if = "Option::is_none")]
        actions: Option<Vec<String>>,
        #[serde(skip_serializing_if = "Option::is_none")]
        tooltip: Option<String>,
    },
    Menu {
        id: String,
        label: String,
        actions: Vec<String>,
    },
    Quit {
        approved: bool,
    },
    Error {
        message: String,
    },
}

/// Read one frame. `Ok(None)` on a clean end of stream.
pub fn read_frame<R: Read>(reader: &mut R) -> Result<Option<Vec<u8>>, ProtocolError> {
    let mut len = [0u8; 4];
    let mut filled = 0;
    while filled < len.len() {
        match reader.read(&mut len[filled..]) {
            Ok(0) if filled == 0 => return Ok(None),
            Ok(0) => {
                return Err(ProtocolError::Io(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!("stream ended after {filled} of 4 header bytes"),
                )));
            }
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    let len = u32::from_ne_bytes(len) as usize;
    if len > MAX_FRAME_LEN {
        return Err(ProtocolError::FrameTooLarge(len));
    }
    let mut buf = vec![0u8; len];
    reader.read_exact(&mut buf)?;
    Ok(Some(buf))
}

pub fn decode(frame: &[u8]) -> Result<ScriptMessage, ProtocolError> {
    Ok(serde_json::from_slice(frame)?)
}

pub fn write_message<W: Write>(writer: &mut W, message: &BridgeMessage) -> Result<(), ProtocolError> {
    let body = serde_json::to_vec(message)?;
    let len = u32::try_from(body.len()).map_err(|_| ProtocolError::FrameTooLarge(body.len()))?;
    writer.write_all(&len.to_ne_bytes())?;
    writer.write_all(&body)?;
    writer.flush()?;
    Ok(())
}
