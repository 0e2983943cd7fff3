use std::ffi::OsString;
use std::io::Write;
use std::process::ExitCode;

use clap::error::ErrorKind;
use clap::CommandFactory;
use clap::Parser;

use crate::error::LaunchError;

const PATH_NOTE: &str = "   Path note: the trailing slash must be included.";

/// Run `celerymon.sh` from the given directory as root.
///
/// To be installed setuid-root. The process is replaced by the script, which receives the
/// worker prefix as its sole argument.
///
/// Options are only recognised before the directory: whatever follows it goes to the script
/// untouched, even when it looks like an option of the launcher.
#[derive(Debug, Clone, PartialEq, Eq, Parser)]
#[command(
    name = "celerymon",
    about,
    version,
    long_about = None,
    override_usage = "celerymon [OPTIONS] <path-of-celerymon.sh/> [worker-prefix]"
)]
pub struct Args {
    /// Directory holding `celerymon.sh`, trailing slash included, then the worker prefix
    /// passed unchanged to the script. Further arguments are ignored.
    #[arg(
        value_name = "path-of-celerymon.sh/",
        required = true,
        num_args = 1..,
        trailing_var_arg = true,
        allow_hyphen_values = true
    )]
    operands: Vec<OsString>,

    #[command(flatten)]
    pub log_args: LogConfigArgs,
}

/// The positional arguments, split the way the launcher uses them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Operands {
    pub script_dir: OsString,
    pub worker_prefix: Option<OsString>,
    /// Accepted but not forwarded.
    pub ignored: Vec<OsString>,
}

impl Args {
    pub fn operands(&self) -> Operands {
        let mut operands = self.operands.iter().cloned();
        Operands {
            script_dir: operands.next().unwrap_or_default(),
            worker_prefix: operands.next(),
            ignored: operands.collect(),
        }
    }
}

#[derive(clap::Args, Debug, Default, Clone, PartialEq, Eq)]
pub struct LogConfigArgs {
    /// Turn-on the DEBUG log level.
    ///
    /// If off only reports ERROR, WARN, and INFO, unless set in the launcher config file.
    #[arg(long)]
    pub debug: bool,

    /// Configures the logging level.
    ///
    /// One of error/warn/info/debug/trace. Takes precedence over the `--debug` flag.
    #[arg(long)]
    pub log_level: Option<tracing::Level>,
}

/// What the command line asked for.
#[derive(Debug)]
pub enum Invocation {
    Launch(Args),
    /// `--help` or `--version`, to be printed on stdout.
    Informational(clap::Error),
}

impl Args {
    /// Parse the arguments, turning every parsing failure into a usage error.
    pub fn try_parse_invocation<I, T>(itr: I) -> Result<Invocation, LaunchError>
    where
        I: IntoIterator<Item = T>,
        T: Into<OsString> + Clone,
    {
        match Args::try_parse_from(itr) {
            Ok(args) => Ok(Invocation::Launch(args)),
            Err(err) if !err.use_stderr() => Ok(Invocation::Informational(err)),
            Err(err) => Err(usage_error(&err)),
        }
    }
}

/// Print `--help` or `--version` output, failing when it can't be written.
pub fn print_informational(info: &clap::Error, out: &mut impl Write) -> ExitCode {
    match write!(out, "{}", info.render()).and_then(|()| out.flush()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn usage_error(err: &clap::Error) -> LaunchError {
    let message = match err.kind() {
        ErrorKind::MissingRequiredArgument => {
            format!("{}\n{PATH_NOTE}", Args::command().render_usage())
        }
        _ => format!("{}{PATH_NOTE}", err.render()),
    };
    LaunchError::Usage { message }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EXIT_USAGE;
    use test_case::test_case;

    fn launch_args(argv: &[&str]) -> Args {
        match Args::try_parse_invocation(argv.iter().copied()).unwrap() {
            Invocation::Launch(args) => args,
            other => panic!("expected a launch, got {other:?}"),
        }
    }

    fn informational(argv: &[&str]) -> clap::Error {
        match Args::try_parse_invocation(argv.iter().copied()).unwrap() {
            Invocation::Informational(info) => info,
            other => panic!("expected help or version, got {other:?}"),
        }
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _buf: &[u8]) -> std::io::Result<usize> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Err(std::io::ErrorKind::BrokenPipe.into())
        }
    }

    #[test]
    fn cli_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn missing_directory_is_a_usage_error() {
        let err = Args::try_parse_invocation(["celerymon"]).unwrap_err();

        let message = err.to_string();
        assert!(message.contains("Usage: celerymon"), "{message}");
        assert!(message.contains("<path-of-celerymon.sh/>"), "{message}");
        assert!(message.contains("[worker-prefix]"), "{message}");
        assert!(message.contains("trailing slash"), "{message}");
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn options_without_directory_are_a_usage_error() {
        let err = Args::try_parse_invocation(["celerymon", "--debug"]).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);

        let err = Args::try_parse_invocation(["celerymon", "--"]).unwrap_err();
        assert_eq!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn missing_log_level_value_is_a_usage_error() {
        let err = Args::try_parse_invocation(["celerymon", "--log-level"]).unwrap_err();

        assert_eq!(err.exit_code(), EXIT_USAGE);
    }

    #[test]
    fn directory_only() {
        let operands = launch_args(&["celerymon", "/opt/tools/"]).operands();

        assert_eq!(operands.script_dir, "/opt/tools/");
        assert_eq!(operands.worker_prefix, None);
        assert!(operands.ignored.is_empty());
    }

    #[test]
    fn directory_and_worker_prefix() {
        let operands = launch_args(&["celerymon", "/opt/tools/", "workerA"]).operands();

        assert_eq!(operands.script_dir, "/opt/tools/");
        assert_eq!(operands.worker_prefix, Some("workerA".into()));
    }

    #[test_case("-w1")]
    #[test_case("--debug")]
    #[test_case("--log-level")]
    #[test_case("--help")]
    #[test_case("-h")]
    #[test_case("--version")]
    #[test_case("-V")]
    #[test_case("--")]
    fn worker_prefix_is_never_parsed_as_an_option(prefix: &str) {
        let args = launch_args(&["celerymon", "/opt/tools/", prefix]);

        let operands = args.operands();
        assert_eq!(operands.script_dir, "/opt/tools/");
        assert_eq!(operands.worker_prefix, Some(prefix.into()));
        assert!(operands.ignored.is_empty());
        assert_eq!(args.log_args, LogConfigArgs::default());
    }

    #[test_case("-dir/")]
    #[test_case("--tools/")]
    fn directory_may_start_with_a_hyphen(dir: &str) {
        let operands = launch_args(&["celerymon", dir, "workerA"]).operands();

        assert_eq!(operands.script_dir, dir);
        assert_eq!(operands.worker_prefix, Some("workerA".into()));
    }

    #[test]
    fn directory_after_double_dash() {
        let operands = launch_args(&["celerymon", "--", "-h", "--debug"]).operands();

        assert_eq!(operands.script_dir, "-h");
        assert_eq!(operands.worker_prefix, Some("--debug".into()));
    }

    #[test]
    fn extra_arguments_are_collected_apart() {
        let operands =
            launch_args(&["celerymon", "/opt/tools/", "workerA", "extra", "--debug"]).operands();

        assert_eq!(operands.worker_prefix, Some("workerA".into()));
        assert_eq!(
            operands.ignored,
            vec![OsString::from("extra"), OsString::from("--debug")]
        );
    }

    #[test]
    fn log_flags_before_the_directory() {
        let args = launch_args(&["celerymon", "--log-level", "trace", "/opt/tools/"]);

        assert_eq!(args.log_args.log_level, Some(tracing::Level::TRACE));
        assert!(!args.log_args.debug);
        assert_eq!(args.operands().script_dir, "/opt/tools/");

        let args = launch_args(&["celerymon", "--debug", "/opt/tools/", "workerA"]);
        assert!(args.log_args.debug);
        assert_eq!(args.operands().worker_prefix, Some("workerA".into()));
    }

    #[test]
    fn help_is_informational() {
        let info = informational(&["celerymon", "--help"]);

        let mut out = Vec::new();
        let status = print_informational(&info, &mut out);

        assert_eq!(status, ExitCode::SUCCESS);
        let help = String::from_utf8(out).unwrap();
        assert!(help.contains("<path-of-celerymon.sh/>"), "{help}");
        assert!(help.contains("worker-prefix"), "{help}");
    }

    #[test]
    fn failing_to_print_help_is_an_error() {
        let info = informational(&["celerymon", "--version"]);

        let status = print_informational(&info, &mut BrokenPipe);

        assert_eq!(status, ExitCode::FAILURE);
    }
}
