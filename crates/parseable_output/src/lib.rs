#![forbid(unsafe_code)]
//! Machine-readable job-status stream for build drivers.
//!
//! A driver reports each job's lifecycle (`began`, `finished`, `signalled`,
//! `skipped`) as a compact JSON document. Documents are framed on a single
//! output stream as:
//!
//! ```text
//! <decimal byte length>\n
//! <document>\n
//! ```
//!
//! so a consumer can split the stream without relying on the document format.
//!
//! - [`Job`] is the read-only view of a planned job; [`JobDescription`] is an
//!   owned implementation.
//! - [`Message`] is the closed set of lifecycle events.
//! - [`Emitter`] serializes frames onto a shared stream.
//! - [`FrameReader`] recovers messages on the consuming side.
//!
//! # Features
//!
//! - `tokio`: adds `AsyncEmitter`, the same framing over
//!   `tokio::io::AsyncWrite`. Its tests only build with the feature enabled,
//!   so run `cargo test -p parseable_output --features tokio` (or
//!   `--all-features`) to cover them.

mod catalog;
mod config;
mod emitter;
mod encode;
mod error;
mod job;
mod message;
mod payload;
mod reader;

pub use catalog::FileType;
pub use config::{EmitterConfig, ReaderConfig, ReaderLimits};
pub use emitter::Emitter;
pub use encode::{decode_document, encode_frame, write_frame, EncodedMessage};
pub use error::{EmitError, FrameError, FrameRecord};
pub use job::{
    render_command_line, InputSource, Job, JobDescription, JobDescriptionBuilder, JobInput,
    JobOutput,
};
pub use message::{Began, Finished, Message, MessageKind, ProcessId, Signalled, Skipped};
pub use payload::{collect_inputs, collect_outputs, CommandPayload, OutputEntry};
pub use reader::FrameReader;

#[cfg(feature = "tokio")]
pub use emitter::AsyncEmitter;
