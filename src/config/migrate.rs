use std::str::FromStr;

use toml::Value;
use tracing::{info, warn};

use super::store::{ConfigStore, StoreError};

/// Run-in-background preference.
pub const RUN_IN_BACKGROUND: &str = "player.run_in_background";
/// Deprecated boolean predecessor of [`RUN_IN_BACKGROUND`].
pub const BACKGROUND_PLAYBACK: &str = "player.background_playback";
/// Last page visited in the web app.
pub const LAST_URI: &str = "web_app.last_uri";
/// Store schema version.
pub const CONFIG_VERSION: &str = "config.version";

/// Current store schema version.
pub const CURRENT_VERSION: i64 = 2;

/// Whether the app keeps running when its window is closed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BackgroundRunPreference {
    Always,
    WhilePlaying,
    Never,
}

impl BackgroundRunPreference {
    pub const ALL: [BackgroundRunPreference; 3] = [
        BackgroundRunPreference::Always,
        BackgroundRunPreference::WhilePlaying,
        BackgroundRunPreference::Never,
    ];

    /// Stored value.
    pub fn as_str(self) -> &'static str {
        match self {
            BackgroundRunPreference::Always => "always",
            BackgroundRunPreference::WhilePlaying => "playing",
            BackgroundRunPreference::Never => "never",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            BackgroundRunPreference::Always => "Always",
            BackgroundRunPreference::WhilePlaying => "When song is playing",
            BackgroundRunPreference::Never => "Never",
        }
    }

    /// Value seeded from the deprecated boolean key.
    pub fn from_legacy(background_playback: bool) -> Self {
        if background_playback {
            BackgroundRunPreference::WhilePlaying
        } else {
            BackgroundRunPreference::Never
        }
    }

    /// Read the preference, falling back to the migrated default.
    pub fn load(store: &dyn ConfigStore) -> Self {
        store
            .get_str(RUN_IN_BACKGROUND)
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(|| {
                Self::from_legacy(store.get_bool(BACKGROUND_PLAYBACK).unwrap_or(true))
            })
    }
}

impl FromStr for BackgroundRunPreference {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "always" => Ok(BackgroundRunPreference::Always),
            "playing" | "while-playing" | "while_playing" => {
                Ok(BackgroundRunPreference::WhilePlaying)
            }
            "never" => Ok(BackgroundRunPreference::Never),
            other => Err(format!("unknown background preference {other:?}")),
        }
    }
}

/// Bring the store up to [`CURRENT_VERSION`].
///
/// Version 1 stored a boolean `player.background_playback` (default true).
/// Version 2 stores `player.run_in_background` only. Running this again on
/// a migrated store changes nothing.
pub fn migrate_store(store: &dyn ConfigStore) -> Result<(), StoreError> {
    let version = store
        .get(CONFIG_VERSION)
        .and_then(|v| v.as_integer())
        .unwrap_or(1);
    if version >= CURRENT_VERSION {
        return Ok(());
    }

    let current = store
        .get_str(RUN_IN_BACKGROUND)
        .and_then(|s| s.parse::<BackgroundRunPreference>().ok());
    match current {
        Some(pref) => {
            // Normalise accepted aliases to the stored spelling.
            store.set(RUN_IN_BACKGROUND, Value::String(pref.as_str().to_string()))?;
        }
        None => {
            if store.get(RUN_IN_BACKGROUND).is_some() {
                warn!(key = RUN_IN_BACKGROUND, "discarding unrecognised value");
            }
            let legacy = store.get_bool(BACKGROUND_PLAYBACK).unwrap_or(true);
            let pref = BackgroundRunPreference::from_legacy(legacy);
            info!(
                legacy,
                migrated = pref.as_str(),
                "migrating background playback preference"
            );
            store.set(RUN_IN_BACKGROUND, Value::String(pref.as_str().to_string()))?;
        }
    }
    store.remove(BACKGROUND_PLAYBACK)?;
    store.set(CONFIG_VERSION, Value::Integer(CURRENT_VERSION))?;
    Ok(())
}
