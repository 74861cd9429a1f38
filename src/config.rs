//! Runtime configuration.
//!
//! Configuration is layered with the `config` crate: an optional file first,
//! then `TYPEBUS_*` environment variables. Nested keys are separated by a
//! double underscore:
//!
//! | Variable                         | Field                   |
//! |----------------------------------|-------------------------|
//! | `TYPEBUS_CLOCK__KIND`            | `clock.kind`            |
//! | `TYPEBUS_CLOCK__UNCERTAINTY_MS`  | `clock.uncertainty_ms`  |
//! | `TYPEBUS_SYSLOG__ENABLED`        | `syslog.enabled`        |
//! | `TYPEBUS_SYSLOG__TAG`            | `syslog.tag`            |
//! | `TYPEBUS_SYSLOG__SOCKET`         | `syslog.socket`         |
//!
//! An empty `TYPEBUS_SYSLOG__TAG` falls back to the program name.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use config::builder::DefaultState;
use config::{ConfigBuilder, ConfigError, Environment, File, FileFormat};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Prefix of every configuration environment variable.
pub const ENV_PREFIX: &str = "TYPEBUS";

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Clock selection.
    pub clock: ClockConfig,
    /// Syslog forwarding.
    pub syslog: SyslogConfig,
}

impl Config {
    /// Parses configuration from JSON. Missing fields take their defaults.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::MalformedConfig` if the document does not
    /// parse, `ValidationError::UnknownClock` for an unknown clock kind and
    /// `ValidationError::InvalidConfig` for values of the wrong type.
    pub fn from_json(json: &str) -> Result<Self, ValidationError> {
        Self::build(config::Config::builder().add_source(File::from_str(json, FileFormat::Json)))
    }

    /// Loads `file` (format taken from its extension) when given, then
    /// applies the process environment on top.
    ///
    /// # Errors
    ///
    /// Same as [`Config::from_json`]; a missing file is `MalformedConfig`.
    pub fn load(file: Option<&Path>) -> Result<Self, ValidationError> {
        let mut builder = config::Config::builder();
        if let Some(path) = file {
            builder = builder.add_source(File::from(path));
        }
        Self::build(builder.add_source(environment()))
    }

    /// Default configuration overridden by the process environment.
    ///
    /// # Errors
    ///
    /// See [`Config::from_json`].
    pub fn from_env() -> Result<Self, ValidationError> {
        Self::load(None)
    }

    /// Default configuration overridden by `vars` instead of the process
    /// environment. Keys use the same `TYPEBUS_*` names.
    ///
    /// # Errors
    ///
    /// See [`Config::from_json`].
    pub fn from_vars<I, K, V>(vars: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let vars: config::Map<String, String> = vars
            .into_iter()
            .map(|(key, value)| (key.into(), value.into()))
            .collect();
        Self::build(config::Config::builder().add_source(environment().source(Some(vars))))
    }

    fn build(builder: ConfigBuilder<DefaultState>) -> Result<Self, ValidationError> {
        let settings = builder.build().map_err(config_error)?;
        if let Ok(kind) = settings.get_string("clock.kind") {
            kind.parse::<ClockKind>()?;
        }
        let mut config: Self = settings.try_deserialize().map_err(config_error)?;
        if config.syslog.tag.as_deref() == Some("") {
            config.syslog.tag = None;
        }
        Ok(config)
    }
}

fn environment() -> Environment {
    Environment::with_prefix(ENV_PREFIX)
        .prefix_separator("_")
        .separator("__")
}

fn config_error(err: ConfigError) -> ValidationError {
    match err {
        ConfigError::Type {
            key, unexpected, ..
        } => ValidationError::InvalidConfig {
            key: key.unwrap_or_default(),
            value: unexpected.to_string(),
        },
        other => ValidationError::MalformedConfig {
            message: other.to_string(),
        },
    }
}

/// Which [`Clock`](crate::Clock) implementation to build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ClockKind {
    /// Wall clock with a fixed uncertainty.
    #[default]
    System,
    /// Manually driven clock for tests.
    Manual,
}

impl ClockKind {
    /// Canonical name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::Manual => "manual",
        }
    }
}

impl FromStr for ClockKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "system" | "time" => Ok(Self::System),
            "manual" | "test" => Ok(Self::Manual),
            _ => Err(ValidationError::UnknownClock {
                name: s.to_string(),
            }),
        }
    }
}

impl TryFrom<String> for ClockKind {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ClockKind> for String {
    fn from(kind: ClockKind) -> Self {
        kind.as_str().to_string()
    }
}

impl fmt::Display for ClockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Clock configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClockConfig {
    /// Clock implementation.
    pub kind: ClockKind,
    /// Assumed uncertainty of the local clock, in milliseconds.
    pub uncertainty_ms: u64,
}

impl Default for ClockConfig {
    fn default() -> Self {
        Self {
            kind: ClockKind::System,
            uncertainty_ms: 10,
        }
    }
}

/// Syslog configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyslogConfig {
    /// Connect to the syslog daemon. When false, messages are logged locally.
    pub enabled: bool,
    /// Tag for every message. Defaults to the program name.
    pub tag: Option<String>,
    /// Path of the syslog datagram socket.
    pub socket: PathBuf,
}

impl Default for SyslogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            tag: None,
            socket: PathBuf::from("/dev/log"),
        }
    }
}
