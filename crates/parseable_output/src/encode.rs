use std::io::{self, Write};

use crate::error::{EmitError, FrameError};
use crate::message::Message;

/// A message rendered to its compact JSON document, ready to be framed.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct EncodedMessage {
    document: String,
}

impl EncodedMessage {
    pub fn encode(message: &Message) -> Result<Self, EmitError> {
        let document = serde_json::to_string(message).map_err(|source| EmitError::Encode {
            kind: message.kind().as_str(),
            source,
        })?;
        Ok(Self { document })
    }

    pub fn document(&self) -> &str {
        &self.document
    }

    /// Exact UTF-8 byte length; the value written as the length prefix.
    pub fn byte_len(&self) -> usize {
        self.document.len()
    }

    /// The complete frame: length line, document, trailing newline.
    pub fn to_frame_bytes(&self) -> Vec<u8> {
        let mut frame = Vec::with_capacity(self.byte_len() + 24);
        frame.extend_from_slice(self.byte_len().to_string().as_bytes());
        frame.push(b'\n');
        frame.extend_from_slice(self.document.as_bytes());
        frame.push(b'\n');
        frame
    }

    pub fn into_document(self) -> String {
        self.document
    }
}

/// Writes `document` as one frame. The caller is responsible for holding
/// whatever lock serializes access to `writer`.
pub fn write_frame<W: Write + ?Sized>(writer: &mut W, document: &str) -> io::Result<()> {
    writer.write_all(document.len().to_string().as_bytes())?;
    writer.write_all(b"\n")?;
    writer.write_all(document.as_bytes())?;
    writer.write_all(b"\n")
}

pub fn encode_frame(message: &Message) -> Result<Vec<u8>, EmitError> {
    EncodedMessage::encode(message).map(|encoded| encoded.to_frame_bytes())
}

pub fn decode_document(document: &str) -> Result<Message, FrameError> {
    serde_json::from_str(document).map_err(FrameError::Decode)
}
