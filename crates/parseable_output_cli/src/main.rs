mod decode;
mod replay;

use clap::{Parser, Subcommand};
use thiserror::Error;

#[derive(Debug, Parser)]
#[command(name = "parseable-output")]
#[command(about = "Inspect and produce parseable job-status streams")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Split a framed status stream into messages and print them.
    Decode(decode::Args),
    /// Emit the frames described by a JSON job script on stdout.
    Replay(replay::Args),
}

#[derive(Debug, Error)]
enum Error {
    #[error(transparent)]
    Decode(#[from] decode::Error),
    #[error(transparent)]
    Replay(#[from] replay::Error),
}

fn main() -> Result<(), Error> {
    // stdout carries protocol output, so diagnostics go to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Decode(args) => decode::run(args)?,
        Command::Replay(args) => replay::run(args)?,
    }
    Ok(())
}
