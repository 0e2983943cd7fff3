//! A setuid-root launcher replacing itself with the `celerymon.sh` script.
//!
//! The launcher asserts root identity then `execv`s the script, forwarding at most one
//! caller-supplied argument, the worker prefix. Nothing runs after a successful launch:
//! the script takes over the process.

use std::convert::Infallible;
use std::ffi::OsString;

use camino::Utf8Path;

pub mod cli;
pub mod config;
pub mod error;
pub mod exec;
pub mod launcher;
pub mod logging;
pub mod privilege;
pub mod target;

pub use crate::cli::Args;
pub use crate::cli::Invocation;
pub use crate::config::LauncherConfig;
pub use crate::config::DEFAULT_CONFIG_PATH;
pub use crate::error::LaunchError;
pub use crate::launcher::LaunchRequest;
pub use crate::launcher::Launcher;
pub use crate::target::FIXED_SCRIPT_PATH;
pub use crate::target::SCRIPT_NAME;

/// Run the parameterized launcher: `celerymon <path-of-celerymon.sh/> [worker-prefix]`.
pub fn run(args: Args) -> Result<Infallible, LaunchError> {
    let config = LauncherConfig::load(Utf8Path::new(DEFAULT_CONFIG_PATH))?;
    logging::log_init(&args.log_args, &config);

    let operands = args.operands();
    if !operands.ignored.is_empty() {
        tracing::warn!(ignored = ?operands.ignored, "Only the worker prefix is passed to the script");
    }

    Launcher::new(config).launch(LaunchRequest::InDirectory {
        script_dir: operands.script_dir,
        worker_prefix: operands.worker_prefix,
    })
}

/// Run the fixed-path launcher, which always starts [`FIXED_SCRIPT_PATH`] without arguments.
pub fn run_fixed(ignored: Vec<OsString>) -> Result<Infallible, LaunchError> {
    let config = LauncherConfig::load(Utf8Path::new(DEFAULT_CONFIG_PATH))?;
    logging::log_init(&cli::LogConfigArgs::default(), &config);

    if !ignored.is_empty() {
        tracing::warn!(?ignored, "The fixed-path launcher takes no arguments");
    }

    Launcher::new(config).launch(LaunchRequest::Fixed)
}
