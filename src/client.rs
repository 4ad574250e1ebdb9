use crate::options::user_agent;
use serde::Deserialize;
use std::fs::File;
use std::io;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DISPLAY_ENDPOINT: &str = "https://usetrmnl.com/api/display";
pub const DEFAULT_FILENAME: &str = "display.jpg";
pub const DEFAULT_REFRESH_SECS: u64 = 60;
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("status code {0}")]
    Status(u16),
    #[error(transparent)]
    Transport(#[from] Box<ureq::Transport>),
    #[error("error parsing JSON: {0}")]
    Json(#[source] io::Error),
    #[error("error saving image: {0}")]
    Io(#[from] io::Error),
}

impl From<ureq::Error> for ClientError {
    fn from(err: ureq::Error) -> Self {
        match err {
            ureq::Error::Status(code, _) => ClientError::Status(code),
            ureq::Error::Transport(transport) => ClientError::Transport(Box::new(transport)),
        }
    }
}

/// What `/api/display` tells the device to show next. Every field is optional.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct DisplayResponse {
    pub image_url: String,
    pub filename: String,
    pub refresh_rate: i64,
}

impl DisplayResponse {
    /// Sleep before the next cycle. Non-positive rates fall back to 60 seconds.
    pub fn refresh_interval(&self) -> Duration {
        match u64::try_from(self.refresh_rate) {
            Ok(secs) if secs > 0 => Duration::from_secs(secs),
            _ => Duration::from_secs(DEFAULT_REFRESH_SECS),
        }
    }

    /// Name for the downloaded file inside the working directory.
    ///
    /// Only the final path component of the server's name is used.
    pub fn target_filename(&self) -> &str {
        Path::new(&self.filename)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_FILENAME)
    }
}

/// The remote side of a refresh cycle.
pub trait DisplayService {
    fn fetch_display(&self) -> Result<DisplayResponse, ClientError>;

    /// Download `url` into `dest`, replacing any previous file. Returns bytes written.
    fn download_image(&self, url: &str, dest: &Path) -> Result<u64, ClientError>;
}

pub struct TrmnlClient {
    agent: ureq::Agent,
    endpoint: String,
    api_key: String,
}

impl TrmnlClient {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self::with_endpoint(api_key, DISPLAY_ENDPOINT)
    }

    pub fn with_endpoint(api_key: impl Into<String>, endpoint: impl Into<String>) -> Self {
        let agent = ureq::AgentBuilder::new()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(&user_agent())
            .build();
        Self {
            agent,
            endpoint: endpoint.into(),
            api_key: api_key.into(),
        }
    }
}

impl DisplayService for TrmnlClient {
    fn fetch_display(&self) -> Result<DisplayResponse, ClientError> {
        let response = self
            .agent
            .get(&self.endpoint)
            .set("access-token", &self.api_key)
            .call()?;
        if response.status() != 200 {
            return Err(ClientError::Status(response.status()));
        }
        let instruction: DisplayResponse = response.into_json().map_err(ClientError::Json)?;
        debug!("Display response: {:?}", instruction);
        Ok(instruction)
    }

    fn download_image(&self, url: &str, dest: &Path) -> Result<u64, ClientError> {
        let response = self.agent.get(url).call()?;
        let mut out = File::create(dest)?;
        let written = io::copy(&mut response.into_reader(), &mut out)?;
        debug!("Downloaded {} bytes to {}", written, dest.display());
        Ok(written)
    }
}
