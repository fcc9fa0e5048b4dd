//! Query surface consumed by the launcher: commands that turn typed text
//! into ranked result items, and the actions those items carry.

pub mod actions;
pub mod issues;
pub mod options;
pub mod projects;
pub mod search;
pub mod server;
pub mod session;
pub mod status;
pub mod timesheet;

use crate::config::{self, Config};
use crate::data::dates;
use crate::integrations::cache::CacheStore;
use crate::integrations::redmine::RemoteClient;
use actions::Action;
use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use search::FuzzySearch;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

// =============================================================================
// Result items
// =============================================================================

/// Whether selecting an item lists more items or performs an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Items,
    Do,
}

/// What the launcher feeds back when an item is selected
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemArg {
    pub keyword: String,
    pub mode: Mode,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub data: String,
}

impl ItemArg {
    /// Perform `action` when selected
    pub fn action(keyword: &str, action: &Action) -> Self {
        Self {
            keyword: keyword.to_string(),
            mode: Mode::Do,
            data: action.encode(),
        }
    }

    /// Re-list `keyword` with the given state payload
    pub fn items<S: Serialize>(keyword: &str, state: &S) -> Self {
        Self {
            keyword: keyword.to_string(),
            mode: Mode::Items,
            data: serde_json::to_string(state).unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Icon {
    /// Issue assigned to the current user
    Mine,
    Error,
    Checked,
    Unchecked,
}

/// Alternate action offered with a modifier key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemMod {
    pub subtitle: String,
    pub arg: ItemArg,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Item {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    pub title: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub subtitle: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub autocomplete: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<Icon>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub arg: Option<ItemArg>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt: Option<ItemMod>,
}

impl Item {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    pub fn subtitle(mut self, subtitle: impl Into<String>) -> Self {
        self.subtitle = subtitle.into();
        self
    }

    pub fn autocomplete(mut self, text: impl Into<String>) -> Self {
        self.autocomplete = Some(text.into());
        self
    }

    pub fn uid(mut self, uid: impl Into<String>) -> Self {
        self.uid = Some(uid.into());
        self
    }

    pub fn icon(mut self, icon: Icon) -> Self {
        self.icon = Some(icon);
        self
    }

    pub fn arg(mut self, arg: ItemArg) -> Self {
        self.arg = Some(arg);
        self
    }

    pub fn alt(mut self, subtitle: impl Into<String>, arg: ItemArg) -> Self {
        self.alt = Some(ItemMod {
            subtitle: subtitle.into(),
            arg,
        });
        self
    }

    /// An item that reports a failure inline
    pub fn error(title: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::new(title).subtitle(format!("{:#}", err)).icon(Icon::Error)
    }

    /// Selectable items carry an argument
    pub fn is_valid(&self) -> bool {
        self.arg.is_some()
    }
}

/// Decode an item state payload, falling back to the default state
pub(crate) fn decode_state<S: for<'de> Deserialize<'de> + Default>(data: &str, what: &str) -> S {
    if data.trim().is_empty() {
        return S::default();
    }
    match serde_json::from_str(data) {
        Ok(state) => state,
        Err(e) => {
            tracing::warn!("Invalid {} state {:?}: {}", what, data, e);
            S::default()
        }
    }
}

// =============================================================================
// Commands
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Issues,
    Projects,
    Timesheet,
    Status,
    Sync,
    Options,
    Server,
    Login,
    Logout,
}

impl Command {
    pub fn all() -> impl Iterator<Item = Self> {
        [
            Self::Issues,
            Self::Projects,
            Self::Timesheet,
            Self::Status,
            Self::Sync,
            Self::Options,
            Self::Server,
            Self::Login,
            Self::Logout,
        ]
        .into_iter()
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Self::Issues => "issues",
            Self::Projects => "projects",
            Self::Timesheet => "timesheet",
            Self::Status => "status",
            Self::Sync => "sync",
            Self::Options => "options",
            Self::Server => "server",
            Self::Login => "login",
            Self::Logout => "logout",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Issues => "List your open issues",
            Self::Projects => "List the projects you're working on",
            Self::Timesheet => "Generate a timesheet",
            Self::Status => "Show your assigned issues",
            Self::Sync => "Sync with your Redmine server",
            Self::Options => "Set options",
            Self::Server => "Address of your Redmine server",
            Self::Login => "Login to your Redmine server",
            Self::Logout => "Logout of your Redmine server",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        Self::all().find(|c| c.keyword() == keyword)
    }

    pub fn is_enabled(&self, config: &Config) -> bool {
        match self {
            Self::Server => true,
            Self::Login => config.has_server() && !config.is_logged_in(),
            _ => config.is_logged_in(),
        }
    }
}

// =============================================================================
// Workflow
// =============================================================================

type Opener = Box<dyn Fn(&str) -> Result<()> + Send + Sync>;

/// Everything one invocation works with: config, cache and the remote client.
pub struct Workflow {
    pub config: Config,
    config_path: Option<PathBuf>,
    pub store: CacheStore,
    client: Arc<dyn RemoteClient>,
    opener: Opener,
    today: NaiveDate,
}

impl Workflow {
    pub fn new(config: Config, store: CacheStore, client: Arc<dyn RemoteClient>) -> Self {
        Self {
            config,
            config_path: None,
            store,
            client,
            opener: Box::new(crate::util::open_url),
            today: dates::today(),
        }
    }

    /// Persist config changes to `path`
    pub fn with_config_path(mut self, path: PathBuf) -> Self {
        self.config_path = Some(path);
        self
    }

    /// Replace the platform URL opener
    pub fn with_opener<F>(mut self, opener: F) -> Self
    where
        F: Fn(&str) -> Result<()> + Send + Sync + 'static,
    {
        self.opener = Box::new(opener);
        self
    }

    /// Fix the date relative dates and spans are computed against
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn client(&self) -> &dyn RemoteClient {
        self.client.as_ref()
    }

    pub fn base_url(&self) -> &str {
        self.config.base_url()
    }

    /// Refresh the cache if it is stale. A failure is returned for display;
    /// the caller keeps answering from the cached data.
    pub async fn check_refresh(&mut self) -> Option<anyhow::Error> {
        crate::integrations::check_refresh(
            Arc::clone(&self.client),
            &mut self.store,
            self.config.time_entry_days,
            Utc::now(),
        )
        .await
        .err()
    }

    pub async fn refresh(&mut self) -> Result<()> {
        crate::integrations::refresh(
            Arc::clone(&self.client),
            &mut self.store,
            self.config.time_entry_days,
        )
        .await
    }

    pub fn open(&self, url: &str) -> Result<()> {
        (self.opener)(url)
    }

    /// Replace the config and write it out. Write failures are logged only.
    pub fn set_config(&mut self, config: Config) {
        self.config = config;
        if let Some(path) = &self.config_path {
            if let Err(e) = config::save(path, &self.config) {
                tracing::warn!("Error saving config: {:#}", e);
            }
        }
    }

    /// Enabled commands whose keyword matches `arg`
    pub fn menu(&self, arg: &str) -> Vec<Item> {
        let mut search = FuzzySearch::new();
        Command::all()
            .filter(|c| c.is_enabled(&self.config) && search.matches(c.keyword(), arg))
            .map(|c| {
                Item::new(c.keyword())
                    .subtitle(c.description())
                    .autocomplete(format!("{} ", c.keyword()))
            })
            .collect()
    }

    /// List results for a command
    pub async fn items(&mut self, keyword: &str, arg: &str, data: &str) -> Result<Vec<Item>> {
        let command = self.enabled_command(keyword)?;
        tracing::debug!("{} items with arg={:?} data={:?}", keyword, arg, data);

        match command {
            Command::Issues => issues::items(self, arg, data).await,
            Command::Projects => projects::items(self, arg).await,
            Command::Timesheet => timesheet::items(self, arg, data).await,
            Command::Status => status::items(self).await,
            Command::Sync => Ok(session::sync_items()),
            Command::Options => options::items(self, arg),
            Command::Server => Ok(server::items(self, arg)),
            Command::Login => Ok(session::login_items()),
            Command::Logout => Ok(session::logout_items()),
        }
    }

    /// Perform the action bound to a selected item
    pub async fn run(&mut self, keyword: &str, data: &str) -> Result<String> {
        self.enabled_command(keyword)?;
        let action = Action::decode(data).context("Invalid action payload")?;
        actions::dispatch(self, action).await
    }

    fn enabled_command(&self, keyword: &str) -> Result<Command> {
        let command = Command::from_keyword(keyword)
            .with_context(|| format!("Unknown command {}", keyword))?;
        if !command.is_enabled(&self.config) {
            anyhow::bail!("Command {} is not available", keyword);
        }
        Ok(command)
    }
}
