use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` tries environment variables first (prefix `TUNEBRIDGE__`), then an
/// optional config file and falls back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("TUNEBRIDGE")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        if self.web_app.id.trim().is_empty() {
            return Err("web_app.id must not be empty".to_string());
        }
        if self
            .web_app
            .id
            .chars()
            .any(|c| !(c.is_ascii_alphanumeric() || c == '_'))
        {
            return Err("web_app.id may only contain ASCII letters, digits and '_'".to_string());
        }
        if let Some(pattern) = &self.web_app.allowed_uri {
            if let Err(e) = regex::Regex::new(pattern) {
                return Err(format!("web_app.allowed_uri is not a valid pattern: {e}"));
            }
        }
        Ok(())
    }

    /// Store path, falling back to the XDG data directory.
    pub fn state_path(&self) -> Option<PathBuf> {
        self.storage.state_path.clone().or_else(|| {
            xdg_dir("XDG_DATA_HOME", &[".local", "share"])
                .map(|d| d.join("tunebridge").join(format!("{}.toml", self.web_app.id)))
        })
    }

    /// Artwork cache, falling back to the XDG cache directory.
    pub fn artwork_dir(&self) -> PathBuf {
        self.storage.artwork_dir.clone().unwrap_or_else(|| {
            xdg_dir("XDG_CACHE_HOME", &[".cache"])
                .unwrap_or_else(env::temp_dir)
                .join("tunebridge")
                .join(&self.web_app.id)
                .join("artwork")
        })
    }
}

/// Resolve the config path from `TUNEBRIDGE_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("TUNEBRIDGE_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/tunebridge/config.toml`
/// or `~/.config/tunebridge/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", &[".config"]).map(|d| d.join("tunebridge").join("config.toml"))
}

fn xdg_dir(var: &str, home_fallback: &[&str]) -> Option<PathBuf> {
    if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else {
        env::var_os("HOME").map(|home| {
            home_fallback
                .iter()
                .fold(PathBuf::from(home), |p, part| p.join(part))
        })
    }
}
