//! `provision` binary entry point.
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use provision_cli::cli::{Cli, Command};
use provision_cli::commands;
use provision_cli::error::{CommandError, ProvisionError};
use provision_cli::exec::CancelToken;
use provision_cli::logging::{Logger, init_subscriber};

/// Exit code for a run stopped by Ctrl-C.
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    let name = match &args.command {
        Command::Install(_) => "install",
        Command::List(_) => "list",
        Command::Exec(_) => "exec",
        Command::Version => {
            commands::version::run();
            return ExitCode::SUCCESS;
        }
    };
    init_subscriber(args.verbose, name);
    let log = Arc::new(Logger::new(name));

    let cancel = CancelToken::new();
    let handler_token = cancel.clone();
    if let Err(e) = ctrlc::set_handler(move || handler_token.cancel()) {
        log.warn(&format!("cannot install interrupt handler: {e}"));
    }

    let result = match &args.command {
        Command::Install(opts) => commands::install::run(&args.global, opts, &log, &cancel),
        Command::List(opts) => commands::list::run(&args.global, opts, &log),
        Command::Exec(opts) => commands::exec::run(opts, &log, &cancel),
        Command::Version => Ok(()),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::from(exit_code(&e))
        }
    }
}

/// Map an error to the process exit code: 130 for interrupts, 1 otherwise.
fn exit_code(err: &anyhow::Error) -> u8 {
    if let Some(e) = err.downcast_ref::<ProvisionError>() {
        return u8::try_from(e.exit_code()).unwrap_or(1);
    }
    let interrupted = err
        .chain()
        .filter_map(|e| e.downcast_ref::<CommandError>())
        .any(CommandError::is_interrupted);
    if interrupted { EXIT_INTERRUPTED } else { 1 }
}
