use anyhow::{Context, Result};
use async_trait::async_trait;
use prwatch::Desktop;
use tokio::process::Command;
use tracing::debug;

/// Program and arguments showing a desktop notification on `os`.
fn notification_command(os: &str, title: &str, body: &str) -> Option<(&'static str, Vec<String>)> {
    match os {
        "macos" => {
            let script = format!(
                "display notification \"{}\" with title \"{}\"",
                escape_applescript(body),
                escape_applescript(title)
            );
            Some(("osascript", vec!["-e".to_string(), script]))
        }
        "linux" | "freebsd" | "openbsd" | "netbsd" => Some((
            "notify-send",
            vec!["--app-name=prwatch".to_string(), title.to_string(), body.to_string()],
        )),
        _ => None,
    }
}

fn escape_applescript(text: &str) -> String {
    text.replace('\\', "\\\\").replace('"', "\\\"")
}

/// [`Desktop`] using the platform notifier and the default browser.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemDesktop;

#[async_trait]
impl Desktop for SystemDesktop {
    async fn notify(&self, title: &str, body: &str) -> Result<()> {
        let (program, args) = notification_command(std::env::consts::OS, title, body)
            .with_context(|| {
                format!(
                    "Desktop notifications are not supported on {}",
                    std::env::consts::OS
                )
            })?;

        debug!("running {program} {args:?}");
        let status = Command::new(program)
            .args(&args)
            .status()
            .await
            .with_context(|| format!("Failed to run {program}"))?;

        if !status.success() {
            anyhow::bail!("{} exited with {}", program, status);
        }
        Ok(())
    }

    async fn open_url(&self, url: &str) -> Result<()> {
        let target = url.to_string();
        tokio::task::spawn_blocking(move || webbrowser::open(&target))
            .await
            .context("Browser launcher task failed")?
            .with_context(|| format!("Failed to open browser for URL: {}", url))
    }
}
