use std::process::ExitCode;

use celerymon::cli::print_informational;
use celerymon::Args;
use celerymon::Invocation;

fn main() -> ExitCode {
    let args = match Args::try_parse_invocation(std::env::args_os()) {
        Ok(Invocation::Launch(args)) => args,
        Ok(Invocation::Informational(info)) => {
            return print_informational(&info, &mut std::io::stdout().lock());
        }
        Err(err) => return err.report(),
    };

    match celerymon::run(args) {
        Ok(never) => match never {},
        Err(err) => err.report(),
    }
}
