use crate::data::span::DateOrder;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub allow_self_signed_cert: bool,
    #[serde(default = "default_time_entry_days")]
    pub time_entry_days: i64,
    #[serde(default = "default_true")]
    pub match_issue_id: bool,
    #[serde(default)]
    pub match_project_name: bool,
    #[serde(default)]
    pub month_first_dates: bool,
}

fn default_time_entry_days() -> i64 {
    7
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_url: String::new(),
            api_key: String::new(),
            allow_self_signed_cert: false,
            time_entry_days: default_time_entry_days(),
            match_issue_id: true,
            match_project_name: false,
            month_first_dates: false,
        }
    }
}

impl Config {
    pub fn has_server(&self) -> bool {
        !self.server_url.is_empty()
    }

    pub fn is_logged_in(&self) -> bool {
        !self.api_key.is_empty()
    }

    pub fn date_order(&self) -> DateOrder {
        if self.month_first_dates {
            DateOrder::MonthFirst
        } else {
            DateOrder::DayFirst
        }
    }

    /// Server URL without a trailing slash, for building links
    pub fn base_url(&self) -> &str {
        self.server_url.trim_end_matches('/')
    }
}

// =============================================================================
// Paths
// =============================================================================

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "redmine-launcher")
        .context("Could not determine config directory")
}

pub fn config_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().to_path_buf())
}

pub fn default_config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join("config.toml"))
}

pub fn default_cache_path() -> Result<PathBuf> {
    Ok(project_dirs()?.cache_dir().join("cache.json"))
}

// =============================================================================
// Load / Save
// =============================================================================

pub fn load(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config from {}", path.display()))?;

    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config from {}", path.display()))?;

    Ok(config)
}

/// Load the config, starting from defaults when it is missing or unreadable
pub fn load_or_default(path: &Path) -> Config {
    if !path.exists() {
        tracing::debug!("No config at {}, using defaults", path.display());
        return Config::default();
    }

    match load(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::warn!("Error loading config: {:#}", e);
            Config::default()
        }
    }
}

pub fn save(path: &Path, config: &Config) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let content = toml::to_string_pretty(config).context("Failed to serialize config")?;
    std::fs::write(path, content)
        .with_context(|| format!("Failed to write config to {}", path.display()))?;

    // The file holds the API key
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))?;
    }

    Ok(())
}

// =============================================================================
// Option registry
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionKind {
    Bool,
    Integer,
    Text,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Text(String),
}

impl OptionValue {
    pub fn kind(&self) -> OptionKind {
        match self {
            Self::Bool(_) => OptionKind::Bool,
            Self::Integer(_) => OptionKind::Integer,
            Self::Text(_) => OptionKind::Text,
        }
    }
}

impl std::fmt::Display for OptionValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{}", b),
            Self::Integer(i) => write!(f, "{}", i),
            Self::Text(s) => write!(f, "{}", s),
        }
    }
}

/// A user-editable config field
pub struct OptionDef {
    pub key: &'static str,
    pub description: &'static str,
    pub kind: OptionKind,
    pub get: fn(&Config) -> OptionValue,
    /// Returns false when the value has the wrong kind
    pub set: fn(&mut Config, OptionValue) -> bool,
}

impl OptionDef {
    pub fn apply(&self, config: &mut Config, value: OptionValue) -> Result<()> {
        let kind = value.kind();
        if kind != self.kind || !(self.set)(config, value) {
            anyhow::bail!(
                "Option {} expects a {:?} value, got {:?}",
                self.key,
                self.kind,
                kind
            );
        }
        Ok(())
    }
}

impl std::fmt::Debug for OptionDef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OptionDef")
            .field("key", &self.key)
            .field("kind", &self.kind)
            .finish()
    }
}

pub static OPTIONS: &[OptionDef] = &[
    OptionDef {
        key: "match_issue_id",
        description: "Match issue numbers when searching issues",
        kind: OptionKind::Bool,
        get: |c| OptionValue::Bool(c.match_issue_id),
        set: |c, v| match v {
            OptionValue::Bool(b) => {
                c.match_issue_id = b;
                true
            }
            _ => false,
        },
    },
    OptionDef {
        key: "match_project_name",
        description: "Match project names when searching issues",
        kind: OptionKind::Bool,
        get: |c| OptionValue::Bool(c.match_project_name),
        set: |c, v| match v {
            OptionValue::Bool(b) => {
                c.match_project_name = b;
                true
            }
            _ => false,
        },
    },
    OptionDef {
        key: "month_first_dates",
        description: "Read slash dates as month/day instead of day/month",
        kind: OptionKind::Bool,
        get: |c| OptionValue::Bool(c.month_first_dates),
        set: |c, v| match v {
            OptionValue::Bool(b) => {
                c.month_first_dates = b;
                true
            }
            _ => false,
        },
    },
    OptionDef {
        key: "allow_self_signed_cert",
        description: "Accept self-signed server certificates",
        kind: OptionKind::Bool,
        get: |c| OptionValue::Bool(c.allow_self_signed_cert),
        set: |c, v| match v {
            OptionValue::Bool(b) => {
                c.allow_self_signed_cert = b;
                true
            }
            _ => false,
        },
    },
    OptionDef {
        key: "time_entry_days",
        description: "Days of time entries to keep in the cache",
        kind: OptionKind::Integer,
        get: |c| OptionValue::Integer(c.time_entry_days),
        set: |c, v| match v {
            OptionValue::Integer(i) if i > 0 => {
                c.time_entry_days = i;
                true
            }
            _ => false,
        },
    },
    OptionDef {
        key: "server_url",
        description: "Redmine server address (change with the server command)",
        kind: OptionKind::Text,
        get: |c| OptionValue::Text(c.server_url.clone()),
        set: |c, v| match v {
            OptionValue::Text(s) => {
                c.server_url = s;
                true
            }
            _ => false,
        },
    },
];

pub fn find_option(key: &str) -> Option<&'static OptionDef> {
    OPTIONS.iter().find(|o| o.key == key)
}
