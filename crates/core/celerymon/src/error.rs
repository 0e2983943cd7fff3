use std::path::PathBuf;
use std::process::ExitCode;

use nix::errno::Errno;

use crate::config::ConfigError;

/// Exit status used for usage and configuration errors.
pub const EXIT_USAGE: u8 = 1;

#[derive(thiserror::Error, Debug)]
pub enum LaunchError {
    #[error("{message}")]
    Usage { message: String },

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Script directory {dir:?} must end with a path separator")]
    MissingSeparator { dir: PathBuf },

    #[error("Failed to assume root privileges: {errno} (errno {})", errno_number(.errno))]
    PrivilegeAssertion { errno: Errno },

    #[error("Failed to resolve script path {path:?}: {source}")]
    TargetResolution {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Script {resolved:?} is outside the trusted directory {trusted_dir:?}")]
    UntrustedTarget {
        resolved: PathBuf,
        trusted_dir: PathBuf,
    },

    #[error("Error occurred attempting to invoke script {path:?}: {errno} (errno {})", errno_number(.errno))]
    Exec { path: PathBuf, errno: Errno },
}

impl LaunchError {
    /// The status the launcher exits with when this error ends the run.
    ///
    /// OS failures are reported with their raw errno, everything else with [`EXIT_USAGE`].
    pub fn exit_code(&self) -> u8 {
        match self {
            LaunchError::Usage { .. }
            | LaunchError::Config(_)
            | LaunchError::MissingSeparator { .. }
            | LaunchError::UntrustedTarget { .. } => EXIT_USAGE,
            LaunchError::PrivilegeAssertion { errno } | LaunchError::Exec { errno, .. } => {
                errno_exit_code(*errno as i32)
            }
            LaunchError::TargetResolution { source, .. } => {
                source.raw_os_error().map_or(EXIT_USAGE, errno_exit_code)
            }
        }
    }

    /// Print the error on stderr and turn it into the process exit status.
    pub fn report(&self) -> ExitCode {
        match self {
            LaunchError::Usage { message } => eprintln!("{message}"),
            err => eprintln!("celerymon: {err}"),
        }
        ExitCode::from(self.exit_code())
    }
}

fn errno_number(errno: &Errno) -> i32 {
    *errno as i32
}

fn errno_exit_code(raw: i32) -> u8 {
    u8::try_from(raw)
        .ok()
        .filter(|code| *code != 0)
        .unwrap_or(u8::MAX)
}
