use thiserror::Error;

use crate::message::Message;

/// Failure to put a frame on the status stream.
#[derive(Debug, Error)]
pub enum EmitError {
    #[error("failed to encode {kind} message: {source}")]
    Encode {
        kind: &'static str,
        source: serde_json::Error,
    },
    #[error("failed writing status frame: {0}")]
    Io(#[from] std::io::Error),
}

/// Failure to recover one frame from a status stream.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("I/O error while reading status stream: {0}")]
    Io(std::io::Error),
    #[error("invalid length prefix: {line:?}")]
    InvalidLength { line: String },
    #[error("frame too large (declared_bytes={declared_bytes}, max_frame_bytes={max_frame_bytes})")]
    FrameTooLarge {
        declared_bytes: usize,
        max_frame_bytes: usize,
    },
    #[error("stream ended inside a frame (declared_bytes={declared_bytes}, read_bytes={read_bytes})")]
    Truncated {
        declared_bytes: usize,
        read_bytes: usize,
    },
    #[error("frame is not followed by a newline (found byte 0x{found:02x})")]
    MissingNewline { found: u8 },
    #[error("invalid UTF-8 in frame document")]
    InvalidUtf8,
    #[error("failed to decode frame document: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FrameError {
    /// Whether the reader can continue with the next frame after this error.
    pub fn is_recoverable(&self) -> bool {
        matches!(self, FrameError::InvalidUtf8 | FrameError::Decode(_))
    }
}

/// Outcome of reading one frame.
#[derive(Debug)]
pub struct FrameRecord {
    /// 1-based position of the frame in the stream.
    pub frame_number: usize,
    /// The document text, when raw capture is enabled and the frame was valid UTF-8.
    pub raw: Option<String>,
    pub outcome: Result<Message, FrameError>,
}
