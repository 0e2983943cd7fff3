use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::str::FromStr;

use camino::Utf8Path;
use camino::Utf8PathBuf;
use nix::unistd::Uid;
use serde::Deserialize;

/// Where the launcher configuration lives.
///
/// The path is fixed at build time: the binary is meant to be installed setuid-root,
/// so the caller must never be able to point it to a file of their choosing.
pub const DEFAULT_CONFIG_PATH: &str = "/etc/celerymon/celerymon.toml";

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read the launcher config file '{path}': {source}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Toml syntax error in the launcher config file '{path}': {reason}")]
    InvalidSyntax { path: Utf8PathBuf, reason: String },

    #[error("The launcher config file '{path}' must be a regular file owned by uid {expected_owner} and not writable by group or others")]
    InsecurePermissions {
        path: Utf8PathBuf,
        expected_owner: u32,
    },

    #[error("Invalid log level: {name:?}, supported levels are trace, debug, info, warn and error")]
    InvalidLogLevel { name: String },
}

/// What to do when the process cannot become root.
#[derive(Deserialize, Debug, Default, Clone, Copy, Eq, PartialEq)]
#[serde(rename_all = "kebab-case")]
pub enum PrivilegePolicy {
    /// Log a warning and run the script with the current identity.
    #[default]
    Warn,
    /// Refuse to run the script.
    FailClosed,
}

#[derive(Deserialize, Debug, Default, Clone, Eq, PartialEq)]
#[serde(default, deny_unknown_fields, rename_all = "kebab-case")]
pub struct LauncherConfig {
    /// When set, the script must resolve (symlinks included) to a file inside this directory.
    pub trusted_dir: Option<Utf8PathBuf>,

    pub on_privilege_failure: PrivilegePolicy,

    /// Reject script directories which don't end with `/` instead of only warning.
    pub require_trailing_separator: bool,

    pub log: LogConfig,
}

#[derive(Deserialize, Debug, Default, Clone, Eq, PartialEq)]
#[serde(default, deny_unknown_fields)]
pub struct LogConfig {
    pub level: Option<String>,
}

impl LauncherConfig {
    /// Load the configuration, falling back to defaults when the file doesn't exist.
    ///
    /// The file has to be owned by root and not writable by anyone else.
    pub fn load(path: &Utf8Path) -> Result<Self, ConfigError> {
        Self::load_owned_by(path, Uid::from_raw(0))
    }

    pub(crate) fn load_owned_by(path: &Utf8Path, owner: Uid) -> Result<Self, ConfigError> {
        let metadata = match fs::metadata(path) {
            Ok(metadata) => metadata,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_owned(),
                    source,
                })
            }
        };

        if !metadata.is_file() || metadata.uid() != owner.as_raw() || metadata.mode() & 0o022 != 0
        {
            return Err(ConfigError::InsecurePermissions {
                path: path.to_owned(),
                expected_owner: owner.as_raw(),
            });
        }

        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_owned(),
            source,
        })?;

        let config: LauncherConfig =
            toml::from_str(&contents).map_err(|e| ConfigError::InvalidSyntax {
                path: path.to_owned(),
                reason: e.to_string(),
            })?;
        config.log_level()?;
        Ok(config)
    }

    /// The log level set in the `[log]` table, if any.
    pub fn log_level(&self) -> Result<Option<tracing::Level>, ConfigError> {
        match &self.log.level {
            Some(name) => tracing::Level::from_str(&name.to_uppercase())
                .map(Some)
                .map_err(|_| ConfigError::InvalidLogLevel { name: name.clone() }),
            None => Ok(None),
        }
    }
}
