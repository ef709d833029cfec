use std::{env, path::PathBuf};

use super::schema::Settings;

/// Configuration loading helpers.
///
/// `Settings::load` reads an optional config file, then applies environment
/// variables (prefix `MYMUSIC__`) on top, falling back to struct defaults.
impl Settings {
    /// Load settings from environment and optional config file.
    pub fn load() -> Result<Self, ::config::ConfigError> {
        let config_path = resolve_config_path();

        let mut builder = ::config::Config::builder();

        if let Some(path) = &config_path {
            builder = builder.add_source(::config::File::from(path.as_path()).required(false));
        }

        builder = builder.add_source(
            ::config::Environment::with_prefix("MYMUSIC")
                .separator("__")
                .try_parsing(true),
        );

        let cfg = builder.build()?;
        let settings: Settings = cfg.try_deserialize()?;
        Ok(settings)
    }

    /// Perform basic validation checks on loaded settings.
    pub fn validate(&self) -> Result<(), String> {
        let c = &self.controls;
        if !(c.seek_seconds.is_finite() && c.seek_seconds > 0.0) {
            return Err("controls.seek_seconds must be > 0".to_string());
        }
        if !(c.volume_step > 0.0 && c.volume_step <= 1.0) {
            return Err("controls.volume_step must be in (0, 1]".to_string());
        }
        if !(c.restart_threshold_seconds.is_finite() && c.restart_threshold_seconds >= 0.0) {
            return Err("controls.restart_threshold_seconds must be >= 0".to_string());
        }
        if self.storage.max_playlists == Some(0) {
            return Err("storage.max_playlists must be >= 1 when set".to_string());
        }
        Ok(())
    }

    /// Store file from settings, or the XDG data default.
    pub fn store_path(&self) -> Option<PathBuf> {
        self.storage
            .path
            .clone()
            .or_else(|| {
                xdg_dir("XDG_DATA_HOME", &[".local", "share"]).map(|d| d.join("store.json"))
            })
    }

    /// Log directory from settings, or the XDG state default.
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.logging
            .dir
            .clone()
            .or_else(|| xdg_dir("XDG_STATE_HOME", &[".local", "state"]))
    }
}

/// Resolve the config path from `MYMUSIC_CONFIG_PATH` or XDG defaults.
pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(p) = env::var_os("MYMUSIC_CONFIG_PATH") {
        let p = PathBuf::from(p);
        return Some(p);
    }
    default_config_path()
}

/// Compute the default config path under `$XDG_CONFIG_HOME/mymusic/config.toml`
/// or `~/.config/mymusic/config.toml` when `XDG_CONFIG_HOME` is not set.
pub fn default_config_path() -> Option<PathBuf> {
    xdg_dir("XDG_CONFIG_HOME", &[".config"]).map(|d| d.join("config.toml"))
}

/// `$<var>/mymusic`, or `$HOME/<fallback...>/mymusic` when `var` is unset.
fn xdg_dir(var: &str, home_fallback: &[&str]) -> Option<PathBuf> {
    let base = if let Some(xdg) = env::var_os(var) {
        Some(PathBuf::from(xdg))
    } else if let Some(home) = env::var_os("HOME") {
        let mut p = PathBuf::from(home);
        p.extend(home_fallback);
        Some(p)
    } else {
        None
    };

    base.map(|d| d.join("mymusic"))
}
