//! Process configuration read from the environment.
//!
//! | Variable | Meaning | Default |
//! |---|---|---|
//! | `BOILER_DB_PATH` | SQLite file | unset |
//! | `BOILER_LOG_LEVEL` | trace/debug/info/warn/error | build-mode default |
//! | `BOILER_LOG_DIR` | absolute log directory; unset disables file logs | unset |
//! | `BOILER_DEFAULT_LIMIT` | row bound for unbounded list calls | 100 |

use crate::logging::{default_log_level, LogLevel};
use crate::model::filter::FILTER_DEFAULT_LIMIT;
use figment::providers::Env;
use figment::Figment;
use serde::Deserialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

pub const ENV_PREFIX: &str = "BOILER_";

#[derive(Debug)]
pub enum ConfigError {
    /// A variable is present but cannot be read as its field type.
    Load(Box<figment::Error>),
    RelativeLogDir(PathBuf),
    InvalidLimit(u32),
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Load(err) => write!(f, "invalid configuration: {err}"),
            Self::RelativeLogDir(path) => write!(
                f,
                "{ENV_PREFIX}LOG_DIR must be an absolute path, got `{}`",
                path.display()
            ),
            Self::InvalidLimit(value) => {
                write!(f, "{ENV_PREFIX}DEFAULT_LIMIT must be a positive integer, got `{value}`")
            }
        }
    }
}

impl Error for ConfigError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Load(err) => Some(err.as_ref()),
            _ => None,
        }
    }
}

impl From<figment::Error> for ConfigError {
    fn from(value: figment::Error) -> Self {
        Self::Load(Box::new(value))
    }
}

/// Runtime settings shared by the binaries.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    pub db_path: Option<PathBuf>,
    pub log_level: LogLevel,
    pub log_dir: Option<PathBuf>,
    pub default_limit: u32,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            log_level: default_log_level(),
            log_dir: None,
            default_limit: FILTER_DEFAULT_LIMIT,
        }
    }
}

impl CoreConfig {
    /// Provider chain: built-in defaults, then `BOILER_*` variables.
    pub fn figment() -> Figment {
        Figment::new().merge(Env::prefixed(ENV_PREFIX))
    }

    /// Reads configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Extracts and validates configuration from any provider chain.
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.validate()
    }

    fn validate(mut self) -> Result<Self, ConfigError> {
        // Exported-but-empty variables count as unset.
        self.db_path = self.db_path.filter(|path| !path.as_os_str().is_empty());
        self.log_dir = self.log_dir.filter(|path| !path.as_os_str().is_empty());

        if let Some(dir) = self.log_dir.as_ref() {
            if !dir.is_absolute() {
                return Err(ConfigError::RelativeLogDir(dir.clone()));
            }
        }
        if self.default_limit == 0 {
            return Err(ConfigError::InvalidLimit(self.default_limit));
        }
        Ok(self)
    }
}
