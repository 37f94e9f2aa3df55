use std::{fs, path::Path, time::Duration};

use serde::Deserialize;
use shared::domain::ProjectId;
use url::Url;

use crate::{error::SettingsError, input::KeyBindings, review::SessionOptions};

pub const DEFAULT_SETTINGS_FILE: &str = "screener.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewSettings {
    pub server_url: String,
    pub project_id: Option<String>,
    pub keyboard_shortcuts: bool,
    pub undo_banner: bool,
    pub undo_window_secs: u64,
    pub request_timeout_secs: Option<u64>,
    pub key_bindings: KeyBindings,
}

impl Default for ReviewSettings {
    fn default() -> Self {
        Self {
            server_url: "http://127.0.0.1:5000".into(),
            project_id: None,
            keyboard_shortcuts: true,
            undo_banner: true,
            undo_window_secs: 5,
            request_timeout_secs: None,
            key_bindings: KeyBindings::default(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileSettings {
    server_url: Option<String>,
    project_id: Option<String>,
    keyboard_shortcuts: Option<bool>,
    undo_banner: Option<bool>,
    undo_window_secs: Option<u64>,
    request_timeout_secs: Option<u64>,
    key_relevant: Option<char>,
    key_irrelevant: Option<char>,
    key_undo: Option<char>,
}

/// Defaults, then the settings file, then `APP__*` environment variables.
///
/// An explicit `path` must exist; the default `screener.toml` is optional.
pub fn load_settings(path: Option<&Path>) -> Result<ReviewSettings, SettingsError> {
    let mut settings = ReviewSettings::default();

    match path {
        Some(path) => settings.apply_file(path)?,
        None => {
            let default_path = Path::new(DEFAULT_SETTINGS_FILE);
            if default_path.exists() {
                settings.apply_file(default_path)?;
            }
        }
    }

    settings.apply_env(|key| std::env::var(key).ok())?;
    Ok(settings)
}

impl ReviewSettings {
    pub fn apply_file(&mut self, path: &Path) -> Result<(), SettingsError> {
        let raw = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.display().to_string(),
            source,
        })?;
        self.apply_toml(&raw).map_err(|source| SettingsError::Parse {
            path: path.display().to_string(),
            source,
        })
    }

    fn apply_toml(&mut self, raw: &str) -> Result<(), toml::de::Error> {
        let file_cfg: FileSettings = toml::from_str(raw)?;
        if let Some(v) = file_cfg.server_url {
            self.server_url = v;
        }
        if let Some(v) = file_cfg.project_id {
            self.project_id = Some(v);
        }
        if let Some(v) = file_cfg.keyboard_shortcuts {
            self.keyboard_shortcuts = v;
        }
        if let Some(v) = file_cfg.undo_banner {
            self.undo_banner = v;
        }
        if let Some(v) = file_cfg.undo_window_secs {
            self.undo_window_secs = v;
        }
        if let Some(v) = file_cfg.request_timeout_secs {
            self.request_timeout_secs = Some(v);
        }
        if let Some(v) = file_cfg.key_relevant {
            self.key_bindings.relevant = v;
        }
        if let Some(v) = file_cfg.key_irrelevant {
            self.key_bindings.irrelevant = v;
        }
        if let Some(v) = file_cfg.key_undo {
            self.key_bindings.undo = v;
        }
        Ok(())
    }

    pub fn apply_env(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), SettingsError> {
        if let Some(v) = lookup("SCREENER_SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("APP__SERVER_URL") {
            self.server_url = v;
        }
        if let Some(v) = lookup("APP__PROJECT_ID") {
            self.project_id = Some(v);
        }
        if let Some(v) = lookup("APP__KEYBOARD_SHORTCUTS") {
            self.keyboard_shortcuts = parse_flag("APP__KEYBOARD_SHORTCUTS", &v)?;
        }
        if let Some(v) = lookup("APP__UNDO_BANNER") {
            self.undo_banner = parse_flag("APP__UNDO_BANNER", &v)?;
        }
        if let Some(v) = lookup("APP__UNDO_WINDOW_SECS") {
            self.undo_window_secs = parse_secs("APP__UNDO_WINDOW_SECS", &v)?;
        }
        if let Some(v) = lookup("APP__REQUEST_TIMEOUT_SECS") {
            self.request_timeout_secs = Some(parse_secs("APP__REQUEST_TIMEOUT_SECS", &v)?);
        }
        if let Some(v) = lookup("APP__KEY_RELEVANT") {
            self.key_bindings.relevant = parse_key("APP__KEY_RELEVANT", &v)?;
        }
        if let Some(v) = lookup("APP__KEY_IRRELEVANT") {
            self.key_bindings.irrelevant = parse_key("APP__KEY_IRRELEVANT", &v)?;
        }
        if let Some(v) = lookup("APP__KEY_UNDO") {
            self.key_bindings.undo = parse_key("APP__KEY_UNDO", &v)?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), SettingsError> {
        let url = Url::parse(&self.server_url).map_err(|err| SettingsError::InvalidServerUrl {
            url: self.server_url.clone(),
            reason: err.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(SettingsError::InvalidServerUrl {
                url: self.server_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        self.key_bindings.validate()
    }

    pub fn project(&self) -> Result<ProjectId, SettingsError> {
        self.project_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(ProjectId::new)
            .ok_or(SettingsError::MissingProject)
    }

    pub fn session_options(&self) -> SessionOptions {
        SessionOptions {
            undo_banner: self.undo_banner,
        }
    }

    pub fn undo_window(&self) -> Duration {
        Duration::from_secs(self.undo_window_secs)
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
    }
}

fn parse_flag(key: &'static str, value: &str) -> Result<bool, SettingsError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(SettingsError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

fn parse_secs(key: &'static str, value: &str) -> Result<u64, SettingsError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|_| SettingsError::InvalidValue {
            key,
            value: value.to_string(),
        })
}

fn parse_key(key: &'static str, value: &str) -> Result<char, SettingsError> {
    let mut chars = value.trim().chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(SettingsError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
