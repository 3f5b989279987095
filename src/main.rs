use clap::Parser;
use morphflow::cli::{self, Args};
use morphflow::core::error::{AppError, DefaultErrorReporter, ErrorReporter};
use morphflow::logging;
use std::process::ExitCode;

fn main() -> ExitCode {
    let args = Args::parse();

    let _guard = match logging::init(&args.command) {
        Ok(guard) => Some(guard),
        Err(err) => {
            DefaultErrorReporter.report_warning("logging disabled", Some(format!("{:#}", err)));
            None
        }
    };

    match cli::run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => match err.downcast_ref::<AppError>() {
            Some(app_error) => {
                DefaultErrorReporter.report_error(app_error);
                ExitCode::from(app_error.exit_code())
            }
            None => {
                eprintln!("[ERROR] {:#}", err);
                ExitCode::FAILURE
            }
        },
    }
}
