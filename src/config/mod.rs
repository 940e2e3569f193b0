//! Client configuration.
//!
//! Settings are layered with the following priority (highest first):
//! 1. CLI arguments
//! 2. Environment variables (via clap `env` attributes)
//! 3. TOML config file (`$XDG_CONFIG_HOME/taskdeck/config.toml` or
//!    `--config`)
//! 4. Compiled defaults
//!
//! A config file looks like:
//!
//! ```toml
//! log_level = "debug"
//!
//! [service]
//! api_url = "https://tasks.example.com/api/"
//! storage_url = "https://tasks.example.com/storage/"
//! token = "secret"
//! timeout_secs = 10
//!
//! [session]
//! user = "alice"
//! ```

use camino::{Utf8Path, Utf8PathBuf};
use reqwest::Url;
use serde::Deserialize;
use std::{fmt, io, time::Duration};
use thiserror::Error;

use crate::files::read_text;
use crate::identity::domain::{IdentityDomainError, UserId};

/// Directory name under the platform config directory.
pub const APP_DIR: &str = "taskdeck";
/// Config file name inside [`APP_DIR`].
pub const CONFIG_FILE_NAME: &str = "config.toml";
/// Task API used when nothing else is configured.
pub const DEFAULT_API_URL: &str = "http://localhost:3000/api/";
/// Storage gateway used when nothing else is configured.
pub const DEFAULT_STORAGE_URL: &str = "http://localhost:3000/storage/";
/// Request timeout used when nothing else is configured.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
/// Log filter used when nothing else is configured.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// Errors raised while loading client configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file could not be read.
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        /// Path that was attempted.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        source: io::Error,
    },

    /// The config file is not valid TOML for this schema.
    #[error("failed to parse config file {path}: {source}")]
    ParseToml {
        /// Path that was parsed.
        path: Utf8PathBuf,
        /// Parser error.
        source: Box<toml::de::Error>,
    },

    /// A service URL did not parse.
    #[error("invalid {setting} '{value}': {reason}")]
    InvalidUrl {
        /// Setting name.
        setting: &'static str,
        /// Rejected value.
        value: String,
        /// Parser message.
        reason: String,
    },

    /// The request timeout is zero, which would fail every request.
    #[error("timeout_secs must be at least 1")]
    ZeroTimeout,

    /// The configured user name is blank.
    #[error("invalid session user: {0}")]
    InvalidUser(#[source] IdentityDomainError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    log_level: Option<String>,
    service: ServiceFileConfig,
    session: SessionFileConfig,
}

/// `[service]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ServiceFileConfig {
    api_url: Option<String>,
    storage_url: Option<String>,
    token: Option<String>,
    timeout_secs: Option<u64>,
}

/// `[session]` section.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SessionFileConfig {
    user: Option<String>,
}

/// Global CLI arguments shared by every command.
#[derive(clap::Args, Debug, Default, Clone)]
pub struct ClientCliArgs {
    /// Path to the config file (default: `$XDG_CONFIG_HOME/taskdeck/config.toml`).
    #[arg(long, global = true)]
    pub config: Option<Utf8PathBuf>,

    /// Base URL of the task API.
    #[arg(long, global = true, env = "TASKDECK_API_URL")]
    pub api_url: Option<String>,

    /// Base URL of the storage gateway.
    #[arg(long, global = true, env = "TASKDECK_STORAGE_URL")]
    pub storage_url: Option<String>,

    /// Bearer token sent to both services.
    #[arg(long, global = true, env = "TASKDECK_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Signed-in user; namespaces attachment keys.
    #[arg(long, global = true, env = "TASKDECK_USER")]
    pub user: Option<String>,

    /// Request timeout in seconds.
    #[arg(long, global = true, env = "TASKDECK_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Log filter (trace, debug, info, warn, error).
    #[arg(long, global = true, env = "TASKDECK_LOG")]
    pub log_level: Option<String>,
}

/// Fully resolved client configuration.
#[derive(Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Task API base URL.
    pub api_url: Url,
    /// Storage gateway base URL.
    pub storage_url: Url,
    /// Bearer token for both services.
    pub token: Option<String>,
    /// Signed-in user, if configured.
    pub user: Option<UserId>,
    /// Per-request timeout.
    pub request_timeout: Duration,
    /// Log filter string.
    pub log_level: String,
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url.as_str())
            .field("storage_url", &self.storage_url.as_str())
            .field("token", &self.token.as_ref().map(|_| "***"))
            .field("user", &self.user)
            .field("request_timeout", &self.request_timeout)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl ClientConfig {
    /// Loads configuration by merging CLI args, env vars and a TOML file.
    ///
    /// An explicit `--config` file must exist. The default file is optional
    /// and treated as empty when missing.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when a file cannot be read or parsed, or a
    /// resolved value is invalid.
    pub fn load(cli: &ClientCliArgs) -> Result<Self, ConfigError> {
        let file = load_config_file(cli.config.as_deref())?;
        Self::resolve(cli, &file)
    }

    /// Loads configuration from CLI args and a TOML document, ignoring the
    /// file system.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when the document does not parse or a
    /// resolved value is invalid.
    pub fn from_toml(cli: &ClientCliArgs, toml_source: &str) -> Result<Self, ConfigError> {
        let file = parse_config(Utf8Path::new("<inline>"), toml_source)?;
        Self::resolve(cli, &file)
    }

    /// Priority: CLI > file > default.
    fn resolve(cli: &ClientCliArgs, file: &ConfigFile) -> Result<Self, ConfigError> {
        let api_url = pick(
            cli.api_url.as_deref(),
            file.service.api_url.as_deref(),
            DEFAULT_API_URL,
        );
        let storage_url = pick(
            cli.storage_url.as_deref(),
            file.service.storage_url.as_deref(),
            DEFAULT_STORAGE_URL,
        );
        let user = cli
            .user
            .as_ref()
            .or(file.session.user.as_ref())
            .map(|name| UserId::new(name.as_str()))
            .transpose()
            .map_err(ConfigError::InvalidUser)?;
        let timeout_secs = cli
            .timeout_secs
            .or(file.service.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::ZeroTimeout);
        }

        Ok(Self {
            api_url: parse_base_url("api_url", api_url)?,
            storage_url: parse_base_url("storage_url", storage_url)?,
            token: cli
                .token
                .clone()
                .or_else(|| file.service.token.clone())
                .filter(|token| !token.trim().is_empty()),
            user,
            request_timeout: Duration::from_secs(timeout_secs),
            log_level: pick(
                cli.log_level.as_deref(),
                file.log_level.as_deref(),
                DEFAULT_LOG_LEVEL,
            )
            .to_owned(),
        })
    }
}

fn pick<'a>(cli: Option<&'a str>, file: Option<&'a str>, default: &'a str) -> &'a str {
    cli.or(file).unwrap_or(default)
}

/// Parses a base URL, adding the trailing slash that relative endpoint
/// resolution relies on.
fn parse_base_url(setting: &'static str, value: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        setting,
        value: value.to_owned(),
        reason,
    };
    let mut url = Url::parse(value).map_err(|err| invalid(err.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(invalid("URL cannot carry a path".to_owned()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_config(path: &Utf8Path, contents: &str) -> Result<ConfigFile, ConfigError> {
    toml::from_str(contents).map_err(|source| ConfigError::ParseToml {
        path: path.to_owned(),
        source: Box::new(source),
    })
}

/// Returns `$XDG_CONFIG_HOME/taskdeck/config.toml` (or the platform
/// equivalent) when the config directory is known and valid UTF-8.
#[must_use]
pub fn default_config_path() -> Option<Utf8PathBuf> {
    let config_dir = Utf8PathBuf::from_path_buf(dirs::config_dir()?).ok()?;
    Some(config_dir.join(APP_DIR).join(CONFIG_FILE_NAME))
}

fn load_config_file(explicit_path: Option<&Utf8Path>) -> Result<ConfigFile, ConfigError> {
    if let Some(path) = explicit_path {
        let contents = read_text(path).map_err(|source| ConfigError::ReadFile {
            path: path.to_owned(),
            source,
        })?;
        return parse_config(path, &contents);
    }

    let Some(path) = default_config_path() else {
        return Ok(ConfigFile::default());
    };
    match read_text(&path) {
        Ok(contents) => parse_config(&path, &contents),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(ConfigFile::default()),
        Err(source) => Err(ConfigError::ReadFile { path, source }),
    }
}
