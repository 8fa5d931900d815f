mod cli;
mod commands;
mod error;
mod output;

use std::path::Path;

use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::cli::{Cli, Command, GlobalOpts};
use crate::error::CliError;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(err) = run(cli).await {
        let code = err.exit_code();
        eprintln!("{:?}", miette::Report::new(err));
        std::process::exit(code);
    }
}

/// Install the stderr layer and, when `log_dir` is given, the rolling
/// `process.log` (info and up) and `error.log` (errors only) files.
///
/// The returned guards flush the file writers on drop.
fn init_tracing(global: &GlobalOpts, log_dir: Option<&Path>) -> Vec<WorkerGuard> {
    let level = match (global.quiet, global.verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        (false, _) => "trace",
    };

    let mut layers: Vec<Box<dyn Layer<Registry> + Send + Sync>> = vec![
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
            )
            .boxed(),
    ];
    let mut guards = Vec::new();

    if let Some(dir) = log_dir {
        match std::fs::create_dir_all(dir) {
            Ok(()) => {
                for (name, level) in [
                    ("process.log", LevelFilter::INFO),
                    ("error.log", LevelFilter::ERROR),
                ] {
                    let appender = tracing_appender::rolling::daily(dir, name);
                    let (writer, guard) = tracing_appender::non_blocking(appender);
                    guards.push(guard);
                    layers.push(
                        fmt::layer()
                            .with_writer(writer)
                            .with_ansi(false)
                            .with_target(true)
                            .with_filter(level)
                            .boxed(),
                    );
                }
            }
            Err(e) => eprintln!("warning: cannot create log directory {}: {e}", dir.display()),
        }
    }

    tracing_subscriber::registry().with(layers).init();
    guards
}

async fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::Completions(args) => {
            use clap::CommandFactory;
            use clap_complete::generate;

            let mut cmd = Cli::command();
            generate(args.shell, &mut cmd, "panfleet", &mut std::io::stdout());
            Ok(())
        }

        Command::Reconcile(ref args) => {
            let _guards = init_tracing(&cli.global, None);
            let settings = commands::load_settings(&cli.global)?;
            commands::reconcile::handle(args, &settings, &cli.global)
        }

        Command::Collect(args) => {
            let settings = commands::load_settings(&cli.global)?;
            let _guards = init_tracing(&cli.global, Some(&settings.log_dir));
            tracing::debug!(?settings, "settings loaded");
            commands::collect::handle(args, settings, &cli.global).await
        }
    }
}
