use std::{
    fs::File,
    io::{self, BufRead, BufReader, Write},
    path::PathBuf,
};

use clap::ValueEnum;
use parseable_output::{FrameReader, Message, ReaderConfig, ReaderLimits};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// Status stream to read (defaults to stdin).
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// How to print each decoded message.
    #[arg(long, value_enum, default_value_t = Format::Summary)]
    pub format: Format,

    /// Reject frames whose declared length exceeds this many bytes.
    #[arg(long)]
    pub max_frame_bytes: Option<usize>,
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, ValueEnum)]
pub enum Format {
    /// One human-readable line per message.
    Summary,
    /// The frame document itself, one per line (JSONL).
    Json,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to open {path:?}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("failed to encode JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{count} invalid frame(s) in status stream")]
    InvalidFrames { count: usize },
}

pub fn run(args: Args) -> Result<(), Error> {
    let input: Box<dyn BufRead> = match args.input.as_ref() {
        Some(path) => {
            let file = File::open(path).map_err(|source| Error::Open {
                path: path.clone(),
                source,
            })?;
            Box::new(BufReader::new(file))
        }
        None => Box::new(BufReader::new(io::stdin())),
    };

    let mut limits = ReaderLimits::default();
    if let Some(max) = args.max_frame_bytes {
        limits.max_frame_bytes = max;
    }
    let config = ReaderConfig {
        limits,
        capture_raw: args.format == Format::Json,
    };

    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut invalid = 0usize;
    for record in FrameReader::with_config(input, config) {
        match record.outcome {
            Ok(message) => {
                debug!(frame = record.frame_number, kind = %message.kind(), "decoded frame");
                match args.format {
                    Format::Summary => writeln!(out, "{}", summarize(&message))?,
                    Format::Json => {
                        let document = match record.raw {
                            Some(raw) => raw,
                            None => serde_json::to_string(&message)?,
                        };
                        writeln!(out, "{document}")?;
                    }
                }
            }
            Err(err) => {
                invalid += 1;
                eprintln!("frame {}: {err}", record.frame_number);
            }
        }
    }
    out.flush()?;

    if invalid > 0 {
        return Err(Error::InvalidFrames { count: invalid });
    }
    Ok(())
}

fn summarize(message: &Message) -> String {
    match message {
        Message::Began(m) => format!(
            "began {} pid={} inputs={} outputs={}",
            m.name,
            m.pid,
            m.inputs.len(),
            m.outputs.len()
        ),
        Message::Finished(m) => format!(
            "finished {} pid={} exit-status={}",
            m.name, m.pid, m.exit_status
        ),
        Message::Signalled(m) => match m.signal {
            Some(signal) => format!(
                "signalled {} pid={} signal={} error-message={:?}",
                m.name, m.pid, signal, m.error_message
            ),
            None => format!(
                "signalled {} pid={} error-message={:?}",
                m.name, m.pid, m.error_message
            ),
        },
        Message::Skipped(m) => format!(
            "skipped {} inputs={} outputs={}",
            m.name,
            m.inputs.len(),
            m.outputs.len()
        ),
    }
}
