//! Fixed-path variant of the launcher: takes no arguments and always runs `/tmp/celerymon.sh`.

use std::process::ExitCode;

fn main() -> ExitCode {
    match celerymon::run_fixed(std::env::args_os().skip(1).collect()) {
        Ok(never) => match never {},
        Err(err) => err.report(),
    }
}
