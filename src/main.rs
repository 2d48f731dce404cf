mod cli;
mod commands;
mod config;
mod progress;
mod ui;

use anyhow::Result;
use clap::{CommandFactory, Parser};
use clap_complete::generate;
use cli::{Cli, Command};
use reconcile::{Aborted, CancelToken, ErrorCategory};
use std::io;
use std::process::ExitCode;

/// Global context for the application
pub struct Context {
    pub verbose: u8,
    pub quiet: bool,
    pub config_path: Option<String>,
    pub overrides: config::Overrides,
    pub cancel: CancelToken,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    let log_level = match cli.verbose {
        0 => log::LevelFilter::Warn,
        1 => log::LevelFilter::Info,
        2 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(if cli.quiet {
            log::LevelFilter::Error
        } else {
            log_level
        })
        .format_timestamp(None)
        .init();

    let ctx = Context {
        verbose: cli.verbose,
        quiet: cli.quiet,
        config_path: cli.config,
        overrides: config::Overrides {
            context: cli.context,
            server: cli.server,
            token: cli.token,
        },
        cancel: CancelToken::new(),
    };
    interrupt::install(&ctx.cancel);

    match dispatch(&ctx, cli.command) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            ui::error(&format!("{e:#}"));
            if let Some(category) = category_of(&e) {
                ui::dim(category.advice());
            }
            ExitCode::FAILURE
        }
    }
}

fn dispatch(ctx: &Context, command: Command) -> Result<()> {
    log::trace!("verbosity {}", ctx.verbose);

    match command {
        Command::Pull(args) => commands::pull::run(ctx, args),
        Command::Push(args) => commands::push::run(ctx, args),
        Command::Kinds => commands::kinds::run(ctx),
        Command::Config(cmd) => commands::config::run(ctx, cmd),
        Command::Completions { shell } => {
            let mut cmd = Cli::command();
            generate(shell, &mut cmd, "dashsync", &mut io::stdout());
            Ok(())
        }
    }
}

fn category_of(err: &anyhow::Error) -> Option<ErrorCategory> {
    if let Some(aborted) = err.downcast_ref::<Aborted>() {
        return Some(aborted.error.category());
    }
    err.downcast_ref::<reconcile::Error>().map(reconcile::Error::category)
}

/// Ctrl-C cancels in-flight work once; a second Ctrl-C kills the process.
#[cfg(unix)]
mod interrupt {
    use reconcile::CancelToken;
    use std::sync::OnceLock;

    static TOKEN: OnceLock<CancelToken> = OnceLock::new();

    extern "C" fn on_sigint(_: libc::c_int) {
        if let Some(token) = TOKEN.get() {
            token.cancel();
        }
        // SAFETY: restoring the default disposition is async-signal-safe
        unsafe {
            libc::signal(libc::SIGINT, libc::SIG_DFL);
        }
    }

    pub fn install(token: &CancelToken) {
        if TOKEN.set(token.clone()).is_err() {
            return;
        }
        // SAFETY: the handler only touches an atomic flag and the signal table
        unsafe {
            libc::signal(libc::SIGINT, on_sigint as extern "C" fn(libc::c_int) as libc::sighandler_t);
        }
    }
}

#[cfg(not(unix))]
mod interrupt {
    pub fn install(_token: &reconcile::CancelToken) {}
}
