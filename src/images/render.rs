//! Rendered-DOM fallback for script-built galleries

use async_trait::async_trait;
use std::io::ErrorKind;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use url::Url;

#[derive(Debug, Error)]
pub enum RenderError {
    /// No renderer can run here; callers treat this as "no extra images"
    #[error("Renderer unavailable: {0}")]
    Unavailable(String),

    #[error("Rendering failed: {0}")]
    Failed(String),

    #[error("Rendering timed out after {0:?}")]
    Timeout(Duration),
}

/// Produces the DOM of a page after its scripts ran
#[async_trait]
pub trait PageRenderer: Send + Sync {
    async fn render(&self, url: &Url) -> Result<String, RenderError>;
}

/// Chromium-family browser driven through `--headless --dump-dom`
#[derive(Debug, Clone)]
pub struct HeadlessBrowser {
    binary: String,
    user_agent: String,
    timeout: Duration,
}

impl HeadlessBrowser {
    pub fn new(binary: impl Into<String>, user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            user_agent: user_agent.into(),
            timeout,
        }
    }
}

#[async_trait]
impl PageRenderer for HeadlessBrowser {
    async fn render(&self, url: &Url) -> Result<String, RenderError> {
        tracing::info!("Using headless browser to extract images from {}", url);

        let mut command = Command::new(&self.binary);
        command
            .arg("--headless")
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg(format!("--user-agent={}", self.user_agent))
            .arg("--dump-dom")
            .arg(url.as_str())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Err(_) => return Err(RenderError::Timeout(self.timeout)),
            Ok(Err(e)) if e.kind() == ErrorKind::NotFound || e.kind() == ErrorKind::PermissionDenied => {
                return Err(RenderError::Unavailable(format!("{}: {}", self.binary, e)))
            }
            Ok(Err(e)) => return Err(RenderError::Failed(e.to_string())),
            Ok(Ok(output)) => output,
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RenderError::Failed(format!(
                "{} exited with {}: {}",
                self.binary,
                output.status,
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
