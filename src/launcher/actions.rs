//! Mutations bound to result items, decoded from the item payload and
//! executed one at a time.

use super::Workflow;
use crate::config::{self, OptionValue};
use crate::data::IssueUpdate;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    /// Hand a URL to the platform opener
    Open { url: String },
    UpdateIssue { id: u64, update: IssueUpdate },
    ChangeServer { url: String },
    SetOption { key: String, value: OptionValue },
    Logout,
    Sync,
}

impl Action {
    pub fn open(url: impl Into<String>) -> Self {
        Self::Open { url: url.into() }
    }

    pub fn decode(data: &str) -> Result<Self> {
        serde_json::from_str(data).with_context(|| format!("Unable to decode action {:?}", data))
    }

    pub fn encode(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

/// Execute one action and return the status message to show
pub async fn dispatch(wf: &mut Workflow, action: Action) -> Result<String> {
    tracing::debug!("Dispatching {:?}", action);

    match action {
        Action::Open { url } => {
            wf.open(&url)?;
            Ok(String::new())
        }
        Action::UpdateIssue { id, update } => update_issue(wf, id, &update).await,
        Action::ChangeServer { url } => {
            let mut config = wf.config.clone();
            config.server_url = url;
            wf.set_config(config);
            Ok(format!("Using server at {}", wf.config.server_url))
        }
        Action::SetOption { key, value } => {
            let option =
                config::find_option(&key).with_context(|| format!("Unknown option {}", key))?;
            let mut config = wf.config.clone();
            option.apply(&mut config, value)?;
            wf.set_config(config);
            Ok("Updated options".to_string())
        }
        Action::Logout => {
            super::session::logout(wf);
            Ok("Logout successful!".to_string())
        }
        Action::Sync => {
            wf.refresh().await?;
            Ok("Synchronized!".to_string())
        }
    }
}

/// Send the update, then re-read the issue so the cache holds the server's
/// view of it. Nothing is patched unless both calls succeed.
async fn update_issue(wf: &mut Workflow, id: u64, update: &IssueUpdate) -> Result<String> {
    wf.client()
        .update_issue(id, update)
        .await
        .with_context(|| format!("Error updating issue {}", id))?;

    let issue = wf
        .client()
        .get_issue(id)
        .await
        .with_context(|| format!("Error reloading issue {}", id))?;

    wf.store.patch_issue(issue);
    tracing::info!("Updated issue {}", id);
    Ok(format!("Updated issue {}", id))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_wire_format() {
        let action = Action::UpdateIssue {
            id: 12,
            update: IssueUpdate::status(3),
        };
        let json: serde_json::Value = serde_json::from_str(&action.encode()).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "action": "update_issue",
                "id": 12,
                "update": { "status_id": 3 }
            })
        );
    }

    #[test]
    fn test_decode_option_values() {
        let action = Action::decode(r#"{"action":"set_option","key":"k","value":true}"#).unwrap();
        assert_eq!(
            action,
            Action::SetOption {
                key: "k".to_string(),
                value: OptionValue::Bool(true)
            }
        );

        let action = Action::decode(r#"{"action":"set_option","key":"k","value":14}"#).unwrap();
        assert!(matches!(
            action,
            Action::SetOption {
                value: OptionValue::Integer(14),
                ..
            }
        ));
    }

    #[test]
    fn test_decode_rejects_unknown_action() {
        assert!(Action::decode(r#"{"action":"explode"}"#).is_err());
        assert!(Action::decode("").is_err());
    }
}
