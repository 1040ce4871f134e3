use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bookmark_source::BrowserKind;
use crate::navigation::OpenMode;

pub const CONFIG_ENV_VAR: &str = "MARKFIND_CONFIG";
pub const HOME_ENV_VAR: &str = "MARKFIND_HOME";

pub const DEFAULT_DISPLAY_LIMIT: usize = 100;
pub const DEFAULT_PAGE_SIZE: usize = 5;
pub const DEFAULT_PATH_SEPARATOR: &str = " / ";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },
    #[error("failed to serialize config: {0}")]
    Serialize(String),
    #[error("{0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub display_limit: usize,
    pub page_size: usize,
    pub path_separator: String,
    pub stripped_roots: Vec<String>,
    pub open_mode: OpenMode,
    pub browser: BrowserKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bookmarks_path: Option<PathBuf>,
    pub log_level: String,
    #[serde(skip)]
    pub config_path: PathBuf,
    /// Intent name (`move-next`, `open-random`, ...) to chord strings such as `Ctrl+J`.
    pub keymap: BTreeMap<String, Vec<String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            display_limit: DEFAULT_DISPLAY_LIMIT,
            page_size: DEFAULT_PAGE_SIZE,
            path_separator: DEFAULT_PATH_SEPARATOR.to_string(),
            stripped_roots: crate::corpus::default_stripped_roots(),
            open_mode: OpenMode::ReplaceCurrent,
            browser: BrowserKind::Chromium,
            bookmarks_path: None,
            log_level: "info".to_string(),
            config_path: stable_app_data_dir().join("config.json"),
            keymap: BTreeMap::new(),
        }
    }
}

pub fn stable_app_data_dir() -> PathBuf {
    if let Some(home) = std::env::var_os(HOME_ENV_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(home);
    }

    let base = if cfg!(target_os = "windows") {
        std::env::var_os("APPDATA").map(PathBuf::from)
    } else {
        std::env::var_os("XDG_CONFIG_HOME")
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
            .or_else(|| std::env::var_os("HOME").map(|home| PathBuf::from(home).join(".config")))
    };

    base.unwrap_or_else(std::env::temp_dir).join("markfind")
}

pub fn resolve_config_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    if let Some(path) = std::env::var_os(CONFIG_ENV_VAR).filter(|v| !v.is_empty()) {
        return PathBuf::from(path);
    }
    stable_app_data_dir().join("config.json")
}

/// Loads the config file, falling back to defaults when it does not exist yet.
pub fn load(explicit: Option<&Path>) -> Result<Config, ConfigError> {
    let path = resolve_config_path(explicit);
    if !path.exists() {
        let cfg = Config {
            config_path: path,
            ..Config::default()
        };
        validate(&cfg)?;
        return Ok(cfg);
    }

    let raw = fs::read_to_string(&path).map_err(|source| ConfigError::Io {
        path: path.clone(),
        source,
    })?;
    let mut cfg = parse(&raw, &path)?;
    cfg.config_path = path;
    validate(&cfg)?;
    Ok(cfg)
}

pub fn parse(raw: &str, path: &Path) -> Result<Config, ConfigError> {
    let parsed = if is_toml(path) {
        toml::from_str::<Config>(raw).map_err(|e| e.to_string())
    } else {
        json5::from_str::<Config>(raw).map_err(|e| e.to_string())
    };
    parsed.map_err(|message| ConfigError::Parse {
        path: path.to_path_buf(),
        message,
    })
}

pub fn save(cfg: &Config) -> Result<(), ConfigError> {
    if let Some(parent) = cfg.config_path.parent() {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let body = if is_toml(&cfg.config_path) {
        toml::to_string_pretty(cfg).map_err(|e| ConfigError::Serialize(e.to_string()))?
    } else {
        serde_json::to_string_pretty(cfg).map_err(|e| ConfigError::Serialize(e.to_string()))?
    };

    fs::write(&cfg.config_path, body).map_err(|source| ConfigError::Io {
        path: cfg.config_path.clone(),
        source,
    })
}

pub fn validate(cfg: &Config) -> Result<(), ConfigError> {
    if !(1..=1000).contains(&cfg.display_limit) {
        return Err(ConfigError::Invalid(
            "display_limit must be between 1 and 1000".into(),
        ));
    }

    if !(1..=100).contains(&cfg.page_size) {
        return Err(ConfigError::Invalid(
            "page_size must be between 1 and 100".into(),
        ));
    }

    if cfg.path_separator.is_empty() {
        return Err(ConfigError::Invalid("path_separator is required".into()));
    }

    if cfg.config_path.as_os_str().is_empty() {
        return Err(ConfigError::Invalid("config_path is required".into()));
    }

    for (intent, chords) in &cfg.keymap {
        crate::intent::Intent::parse(intent).ok_or_else(|| {
            ConfigError::Invalid(format!("unknown intent '{intent}' in keymap"))
        })?;
        for chord in chords {
            crate::intent::KeyChord::parse(chord)
                .map_err(|e| ConfigError::Invalid(format!("keymap '{intent}': {e}")))?;
        }
    }

    Ok(())
}

fn is_toml(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case("toml"))
        .unwrap_or(false)
}
