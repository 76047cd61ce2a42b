use std::path::PathBuf;

use serde::Deserialize;

/// Top-level bridge settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/tunebridge/config.toml` or `~/.config/tunebridge/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `TUNEBRIDGE__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub web_app: WebAppSettings,
    pub log: LogSettings,
    pub storage: StorageSettings,
    pub mpris: MprisSettings,
    pub notifications: NotificationSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebAppSettings {
    /// Identifier used for the MPRIS bus name and notification app name.
    pub id: String,
    /// Human readable name, used as the launcher tooltip when idle.
    pub name: String,
    /// Page loaded on a home-page request.
    pub home_url: String,
    /// Regular expression a URL must match to be navigated to in-app.
    /// Unset allows every URL.
    pub allowed_uri: Option<String>,
    /// Themed icon shown on notifications without artwork.
    pub icon: String,
}

impl Default for WebAppSettings {
    fn default() -> Self {
        Self {
            id: "webplayer".to_string(),
            name: "Web Player".to_string(),
            home_url: "about:blank".to_string(),
            allowed_uri: None,
            icon: "audio-x-generic".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// Default filter directive; `RUST_LOG` overrides it.
    pub level: String,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Persisted key/value store. Defaults to
    /// `$XDG_DATA_HOME/tunebridge/<web_app.id>.toml`.
    pub state_path: Option<PathBuf>,
    /// Artwork download cache. Defaults to
    /// `$XDG_CACHE_HOME/tunebridge/<web_app.id>/artwork`.
    pub artwork_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct MprisSettings {
    /// Expose the player on the session bus.
    pub enabled: bool,
}

impl Default for MprisSettings {
    fn default() -> Self {
        Self { enabled: true }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NotificationSettings {
    /// Use the freedesktop notification service when available.
    pub enabled: bool,
    /// Desktop notification category hint.
    pub category: String,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            category: "x-gnome.music".to_string(),
        }
    }
}
