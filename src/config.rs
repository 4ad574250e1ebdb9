use serde::{Deserialize, Serialize};
use std::fs::{self, DirBuilder, OpenOptions};
use std::io::{self, Write};
use std::os::unix::fs::{DirBuilderExt, OpenOptionsExt, PermissionsExt};
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

pub const CONFIG_DIR_NAME: &str = ".trmnl";
pub const CONFIG_FILE_NAME: &str = "config.json";
pub const API_KEY_ENV: &str = "TRMNL_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not determine home directory")]
    NoHomeDir,
    #[error("error creating config directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("error writing config file: {0}")]
    Write(#[from] io::Error),
    #[error("error saving config: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(rename = "APIKey", default)]
    pub api_key: String,
}

/// `config.json` inside a per-user directory.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    dir: PathBuf,
}

impl ConfigStore {
    /// `~/.trmnl`, created if missing.
    pub fn in_home() -> Result<Self, ConfigError> {
        let home = dirs::home_dir().ok_or(ConfigError::NoHomeDir)?;
        Self::create(home.join(CONFIG_DIR_NAME))
    }

    pub fn create(dir: PathBuf) -> Result<Self, ConfigError> {
        DirBuilder::new()
            .recursive(true)
            .mode(0o755)
            .create(&dir)
            .map_err(|source| ConfigError::CreateDir {
                path: dir.clone(),
                source,
            })?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> PathBuf {
        self.dir.join(CONFIG_FILE_NAME)
    }

    /// Missing or unreadable files yield an empty config.
    pub fn load(&self) -> Config {
        let path = self.path();
        let Ok(data) = fs::read(&path) else {
            return Config::default();
        };
        match serde_json::from_slice(&data) {
            Ok(config) => config,
            Err(err) => {
                warn!("Ignoring malformed {}: {err}", path.display());
                Config::default()
            }
        }
    }

    /// Write the config readable by the owner only.
    pub fn save(&self, config: &Config) -> Result<(), ConfigError> {
        let path = self.path();
        let data = serde_json::to_vec_pretty(config)?;
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(&path)?;
        // mode() only applies on creation
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
        file.write_all(&data)?;
        Ok(())
    }
}

/// Config file first, then the environment, then ask the operator.
///
/// A key obtained from the prompt is saved back; failing to save is logged
/// and otherwise ignored.
pub fn resolve_api_key<F>(store: &ConfigStore, env_key: Option<String>, prompt: F) -> io::Result<String>
where
    F: FnOnce() -> io::Result<String>,
{
    let mut config = store.load();
    if !config.api_key.is_empty() {
        return Ok(config.api_key);
    }
    if let Some(key) = env_key.filter(|key| !key.is_empty()) {
        return Ok(key);
    }

    config.api_key = prompt()?.trim().to_string();
    if config.api_key.is_empty() {
        warn!("No TRMNL API Key given, display requests will be rejected");
        return Ok(config.api_key);
    }
    match store.save(&config) {
        Ok(()) => info!("Saved API Key to {}", store.path().display()),
        Err(err) => error!("{err}"),
    }
    Ok(config.api_key)
}

/// Interactive prompt on stdin.
pub fn prompt_api_key() -> io::Result<String> {
    println!("TRMNL API Key not found.");
    print!("Please enter your TRMNL API Key: ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}

pub fn api_key_from_env() -> Option<String> {
    std::env::var(API_KEY_ENV).ok()
}
