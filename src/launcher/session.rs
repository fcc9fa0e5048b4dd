//! Login, logout and forced sync.

use super::actions::Action;
use super::{Item, ItemArg, Workflow};
use crate::integrations::redmine::{RedmineClient, RemoteClient};
use anyhow::{Context, Result};

/// Log in with a username and password and keep the account's API key.
/// The server address is saved only once the login succeeds.
pub async fn login(
    wf: &mut Workflow,
    server_url: &str,
    username: &str,
    password: &str,
) -> Result<String> {
    let client = RedmineClient::with_credentials(
        server_url,
        username,
        password,
        wf.config.allow_self_signed_cert,
    )
    .context("Failed to create Redmine client")?;

    login_with(wf, server_url, &client).await
}

/// Login against an already authenticated client
pub async fn login_with(
    wf: &mut Workflow,
    server_url: &str,
    client: &dyn RemoteClient,
) -> Result<String> {
    let user = client.get_user().await.context("Login failed")?;
    if user.api_key.is_empty() {
        anyhow::bail!("Login failed: the server returned no API key for {}", user.login);
    }

    let mut config = wf.config.clone();
    config.server_url = server_url.trim_end_matches('/').to_string();
    config.api_key = user.api_key;
    wf.set_config(config);

    tracing::info!("Logged in as {}", user.login);
    Ok(format!("Logged in as {}", user.login))
}

pub fn logout(wf: &mut Workflow) {
    let mut config = wf.config.clone();
    config.api_key.clear();
    wf.set_config(config);
    tracing::info!("Logged out");
}

pub fn login_items() -> Vec<Item> {
    vec![Item::new("Login to Redmine")
        .subtitle("Run `redmine-launcher login` in a terminal to enter your credentials")]
}

pub fn logout_items() -> Vec<Item> {
    vec![Item::new("Logout")
        .subtitle("Forget your API key")
        .arg(ItemArg::action("logout", &Action::Logout))]
}

pub fn sync_items() -> Vec<Item> {
    vec![Item::new("Sync")
        .subtitle("Refresh cached data from Redmine")
        .arg(ItemArg::action("sync", &Action::Sync))]
}
