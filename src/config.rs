//! Runtime settings.
//!
//! Read from the TOML file named by `ROSTER_CONFIG` when that variable is set,
//! otherwise from `ROSTER_*` environment variables. Every field has a default
//! except the token secret.
//!
//! ```toml
//! [server]
//! addr = "0.0.0.0:3000"
//! max_body_bytes = 12582912
//!
//! [api]
//! prefix = "/api"
//!
//! [upload]
//! dir = "public/uploads"
//! base_path = "http://localhost:3000"
//! strip_prefix_len = 7
//!
//! [auth]
//! jwt_secret = "..."
//! token_ttl_secs = 3600
//!
//! [logging]
//! level = "info"
//! json = false
//! ```

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Deserialize;
use thiserror::Error;

pub const CONFIG_FILE_VAR: &str = "ROSTER_CONFIG";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting `{0}`")]
    Missing(&'static str),

    #[error("environment variable {var} has invalid value `{value}`: {reason}")]
    EnvVarInvalid { var: String, value: String, reason: String },

    #[error("cannot read config file {path}: {source}")]
    File { path: String, source: std::io::Error },

    #[error("invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid setting: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    pub api: ApiSettings,
    pub upload: UploadSettings,
    pub auth: AuthSettings,
    pub logging: LogSettings,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub addr: SocketAddr,
    /// Request bodies longer than this are answered with 413 unread.
    pub max_body_bytes: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
            max_body_bytes: crate::server::DEFAULT_MAX_BODY_BYTES,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct ApiSettings {
    /// Prepended to every entity controller path. Empty or `/`-led.
    pub prefix: String,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self { prefix: "/api".into() }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct UploadSettings {
    pub dir: PathBuf,
    /// Public base URL that uploaded file paths are reported under.
    pub base_path: String,
    /// Characters dropped from the front of a stored path before it is
    /// joined to `base_path` (`"public/"` by default).
    pub strip_prefix_len: usize,
}

impl Default for UploadSettings {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("public/uploads"),
            base_path: "http://localhost:3000".into(),
            strip_prefix_len: "public/".len(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct AuthSettings {
    pub jwt_secret: String,
    pub token_ttl_secs: u64,
    /// When both are set, an `admin` account is created at startup.
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            jwt_secret: String::new(),
            token_ttl_secs: 3600,
            admin_username: None,
            admin_password: None,
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct LogSettings {
    /// `EnvFilter` directive; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub json: bool,
}

impl Default for LogSettings {
    fn default() -> Self {
        Self { level: "info".into(), json: false }
    }
}

impl Settings {
    pub fn load() -> Result<Self, ConfigError> {
        match env::var(CONFIG_FILE_VAR) {
            Ok(path) => Self::from_toml_file(path),
            Err(_) => Self::from_env(),
        }
    }

    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::File {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let settings: Self = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build settings from `ROSTER_*` variables as returned by `lookup`.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let settings = Self {
            server: ServerSettings {
                addr: parse_var(&lookup, "ROSTER_ADDR", defaults.server.addr)?,
                max_body_bytes: parse_var(&lookup, "ROSTER_MAX_BODY_BYTES", defaults.server.max_body_bytes)?,
            },
            api: ApiSettings {
                prefix: lookup("ROSTER_API_PREFIX").unwrap_or(defaults.api.prefix),
            },
            upload: UploadSettings {
                dir: lookup("ROSTER_UPLOAD_DIR").map(PathBuf::from).unwrap_or(defaults.upload.dir),
                base_path: lookup("ROSTER_UPLOAD_BASE_PATH").unwrap_or(defaults.upload.base_path),
                strip_prefix_len: parse_var(
                    &lookup,
                    "ROSTER_UPLOAD_STRIP_PREFIX_LEN",
                    defaults.upload.strip_prefix_len,
                )?,
            },
            auth: AuthSettings {
                jwt_secret: lookup("ROSTER_JWT_SECRET").unwrap_or_default(),
                token_ttl_secs: parse_var(&lookup, "ROSTER_TOKEN_TTL_SECS", defaults.auth.token_ttl_secs)?,
                admin_username: lookup("ROSTER_ADMIN_USERNAME"),
                admin_password: lookup("ROSTER_ADMIN_PASSWORD"),
            },
            logging: LogSettings {
                level: lookup("ROSTER_LOG_LEVEL").unwrap_or(defaults.logging.level),
                json: parse_var(&lookup, "ROSTER_LOG_JSON", defaults.logging.json)?,
            },
        };
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.auth.jwt_secret.is_empty() {
            return Err(ConfigError::Missing("auth.jwt_secret"));
        }
        if self.server.max_body_bytes == 0 {
            return Err(ConfigError::Invalid("server.max_body_bytes must be positive".into()));
        }
        if self.auth.token_ttl_secs == 0 {
            return Err(ConfigError::Invalid("auth.token_ttl_secs must be positive".into()));
        }
        let prefix = &self.api.prefix;
        if !prefix.is_empty() && (!prefix.starts_with('/') || prefix.ends_with('/')) {
            return Err(ConfigError::Invalid(format!(
                "api.prefix `{prefix}` must start with `/` and not end with one"
            )));
        }
        if self.auth.admin_username.is_some() != self.auth.admin_password.is_some() {
            return Err(ConfigError::Invalid(
                "auth.admin_username and auth.admin_password must be set together".into(),
            ));
        }
        Ok(())
    }
}

fn parse_var<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(name) {
        Some(value) => value.parse().map_err(|e: T::Err| ConfigError::EnvVarInvalid {
            var: name.to_owned(),
            reason: e.to_string(),
            value,
        }),
        None => Ok(default),
    }
}
