//! Small helpers shared across modules.

use anyhow::{Context, Result};
use tokio::sync::mpsc;

/// Send a value through a channel, logging if the receiver is gone.
///
/// A refresh that already failed drops its receiver while other fetches are
/// still running; their results end up here and are discarded.
pub async fn send_or_log<T>(tx: &mpsc::Sender<T>, value: T, context: &str) {
    if tx.send(value).await.is_err() {
        tracing::debug!("Discarding {}: receiver closed", context);
    }
}

#[cfg(target_os = "macos")]
const OPENER: &str = "open";
#[cfg(not(target_os = "macos"))]
const OPENER: &str = "xdg-open";

/// Hand a URL to the platform opener without waiting for it
pub fn open_url(url: &str) -> Result<()> {
    tracing::debug!("Opening URL {}", url);
    std::process::Command::new(OPENER)
        .arg(url)
        .spawn()
        .with_context(|| format!("Failed to run {} {}", OPENER, url))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_value_reaches_open_receiver() {
        let (tx, mut rx) = mpsc::channel(2);
        send_or_log(&tx, "issues", "issues").await;
        send_or_log(&tx, "projects", "projects").await;
        assert_eq!(rx.recv().await, Some("issues"));
        assert_eq!(rx.recv().await, Some("projects"));
    }

    #[tokio::test]
    async fn test_straggler_after_receiver_dropped() {
        let (tx, rx) = mpsc::channel::<u64>(1);
        drop(rx);
        send_or_log(&tx, 7, "late fetch").await;
        assert!(tx.is_closed());
    }
}
