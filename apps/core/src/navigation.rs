use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenMode {
    /// Navigate the current view to the target.
    #[default]
    ReplaceCurrent,
    /// Open the target in a new tab or window, leaving the current view alone.
    NewContext,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenRequest {
    pub url: String,
    pub mode: OpenMode,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("empty url")]
    EmptyUrl,
    #[error("failed to open {url}: {message}")]
    LaunchFailed { url: String, message: String },
}

/// Where open requests end up: the OS browser handler, a UI adapter, or a test log.
pub trait NavigationSink {
    fn open(&mut self, request: &OpenRequest) -> Result<(), LaunchError>;
}

/// Hands URLs to the platform's default handler.
#[derive(Debug, Default)]
pub struct SystemOpener;

impl NavigationSink for SystemOpener {
    fn open(&mut self, request: &OpenRequest) -> Result<(), LaunchError> {
        launch_url(&request.url, request.mode)
    }
}

/// Keeps every request instead of launching it.
#[derive(Debug, Default)]
pub struct RecordingSink {
    requests: Vec<OpenRequest>,
}

impl RecordingSink {
    pub fn requests(&self) -> &[OpenRequest] {
        &self.requests
    }

    pub fn take(&mut self) -> Vec<OpenRequest> {
        std::mem::take(&mut self.requests)
    }
}

impl NavigationSink for RecordingSink {
    fn open(&mut self, request: &OpenRequest) -> Result<(), LaunchError> {
        validate_url(&request.url)?;
        self.requests.push(request.clone());
        Ok(())
    }
}

pub fn validate_url(url: &str) -> Result<&str, LaunchError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(LaunchError::EmptyUrl);
    }
    Ok(trimmed)
}

pub fn launch_url(url: &str, mode: OpenMode) -> Result<(), LaunchError> {
    launch_with(url, mode, |target| open::that_detached(target))
}

/// The URL reaches `opener` as a single argument; the `open` crate handles
/// shell quoting per platform.
fn launch_with<F>(url: &str, mode: OpenMode, opener: F) -> Result<(), LaunchError>
where
    F: FnOnce(&str) -> std::io::Result<()>,
{
    let target = validate_url(url)?;
    tracing::debug!(url = target, ?mode, "handing url to system opener");
    opener(target).map_err(|error| LaunchError::LaunchFailed {
        url: target.to_string(),
        message: error.to_string(),
    })
}

/// Favicon lookup URL for adapters that show site icons next to rows.
pub fn favicon_url(url: &str) -> String {
    format!("https://www.google.com/s2/favicons?domain={}", url.trim())
}
