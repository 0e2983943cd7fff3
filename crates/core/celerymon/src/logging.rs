use std::io::IsTerminal;

use crate::cli::LogConfigArgs;
use crate::config::LauncherConfig;

const DEFAULT_MAX_LEVEL: tracing::Level = tracing::Level::INFO;

/// Configures and enables logging on stderr, stdout being left to the script.
///
/// 1. `--log-level` wins, then `--debug`
/// 2. Otherwise the `[log]` table of the launcher config is used
/// 3. Otherwise only `error!`, `warn!` and `info!` are reported
///
/// `RUST_LOG` is ignored: the launcher usually runs setuid-root on behalf of another user.
pub fn log_init(flags: &LogConfigArgs, config: &LauncherConfig) {
    let log_level = max_level(flags, config);

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal() && yansi::Condition::no_color())
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .with_max_level(log_level)
        .init();
}

fn max_level(flags: &LogConfigArgs, config: &LauncherConfig) -> tracing::Level {
    flags
        .log_level
        .or(flags.debug.then_some(tracing::Level::DEBUG))
        .or_else(|| config.log_level().ok().flatten())
        .unwrap_or(DEFAULT_MAX_LEVEL)
}
