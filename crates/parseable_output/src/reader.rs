use std::io::{BufRead, ErrorKind, Read};

use crate::config::{ReaderConfig, ReaderLimits};
use crate::encode::decode_document;
use crate::error::{FrameError, FrameRecord};
use crate::message::Message;

const INITIAL_BODY_CAPACITY: usize = 64 * 1024;

/// Splits a status stream back into messages.
///
/// Malformed documents are reported and skipped. Framing errors (bad length
/// line, oversized or truncated frame, I/O failure) end iteration, since the
/// next frame boundary can no longer be trusted.
pub struct FrameReader<R: BufRead> {
    reader: R,
    config: ReaderConfig,
    frame_number: usize,
    done: bool,
}

impl<R: BufRead> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_config(reader, ReaderConfig::default())
    }

    pub fn with_config(reader: R, config: ReaderConfig) -> Self {
        Self {
            reader,
            config,
            frame_number: 0,
            done: false,
        }
    }

    pub fn limits(&self) -> ReaderLimits {
        self.config.limits
    }

    pub fn into_inner(self) -> R {
        self.reader
    }

    fn record(
        &mut self,
        raw: Option<String>,
        outcome: Result<Message, FrameError>,
    ) -> FrameRecord {
        self.frame_number += 1;
        if matches!(&outcome, Err(err) if !err.is_recoverable()) {
            self.done = true;
        }
        FrameRecord {
            frame_number: self.frame_number,
            raw,
            outcome,
        }
    }

    /// Reads the next non-blank length line. `Ok(None)` at a clean end of stream.
    fn read_length(&mut self) -> Result<Option<usize>, FrameError> {
        let max_line = self.config.limits.max_length_line_bytes;
        loop {
            let mut line = Vec::new();
            let read = (&mut self.reader)
                .take((max_line as u64).saturating_add(1))
                .read_until(b'\n', &mut line)
                .map_err(FrameError::Io)?;
            if read == 0 {
                return Ok(None);
            }

            let terminated = line.last() == Some(&b'\n');
            if terminated {
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
            }
            let text = String::from_utf8_lossy(&line).into_owned();

            if !terminated {
                if line.len() > max_line {
                    return Err(FrameError::InvalidLength { line: text });
                }
                if text.trim().is_empty() {
                    return Ok(None);
                }
                // A length line cut off by end of stream.
                return match text.parse::<usize>() {
                    Ok(declared_bytes) => Err(FrameError::Truncated {
                        declared_bytes,
                        read_bytes: 0,
                    }),
                    Err(_) => Err(FrameError::InvalidLength { line: text }),
                };
            }
            if text.trim().is_empty() {
                continue;
            }
            if !text.bytes().all(|b| b.is_ascii_digit()) {
                return Err(FrameError::InvalidLength { line: text });
            }
            return text
                .parse::<usize>()
                .map(Some)
                .map_err(|_| FrameError::InvalidLength { line: text });
        }
    }

    fn read_body(&mut self, declared_bytes: usize) -> Result<Vec<u8>, FrameError> {
        // The declared length is untrusted; grow as bytes actually arrive.
        let mut body = Vec::with_capacity(declared_bytes.min(INITIAL_BODY_CAPACITY));
        let read_bytes = (&mut self.reader)
            .take(declared_bytes as u64)
            .read_to_end(&mut body)
            .map_err(FrameError::Io)?;
        if read_bytes < declared_bytes {
            return Err(FrameError::Truncated {
                declared_bytes,
                read_bytes,
            });
        }

        let mut terminator = [0u8; 1];
        match self.reader.read_exact(&mut terminator) {
            Ok(()) if terminator[0] == b'\n' => Ok(body),
            Ok(()) => Err(FrameError::MissingNewline {
                found: terminator[0],
            }),
            Err(err) if err.kind() == ErrorKind::UnexpectedEof => Err(FrameError::Truncated {
                declared_bytes,
                read_bytes,
            }),
            Err(err) => Err(FrameError::Io(err)),
        }
    }
}

impl<R: BufRead> Iterator for FrameReader<R> {
    type Item = FrameRecord;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let declared_bytes = match self.read_length() {
            Ok(Some(len)) => len,
            Ok(None) => {
                self.done = true;
                return None;
            }
            Err(err) => return Some(self.record(None, Err(err))),
        };

        let max_frame_bytes = self.config.limits.max_frame_bytes;
        if declared_bytes > max_frame_bytes {
            return Some(self.record(
                None,
                Err(FrameError::FrameTooLarge {
                    declared_bytes,
                    max_frame_bytes,
                }),
            ));
        }

        let body = match self.read_body(declared_bytes) {
            Ok(body) => body,
            Err(err) => return Some(self.record(None, Err(err))),
        };
        let Ok(document) = String::from_utf8(body) else {
            return Some(self.record(None, Err(FrameError::InvalidUtf8)));
        };

        let outcome = decode_document(&document);
        let raw = self.config.capture_raw.then_some(document);
        Some(self.record(raw, outcome))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::catalog::FileType;
    use crate::encode::encode_frame;
    use crate::job::JobDescription;

    fn sample_frames() -> (Vec<Message>, Vec<u8>) {
        let job = JobDescription::builder("CompileJob", "swift")
            .input_file("a.swift")
            .primary_output(FileType::Object, "a.o")
            .build();
        let messages = vec![
            Message::began(&job, 1),
            Message::finished(&job, 1, "a.swift:1:1: warning: unused\n", 0),
            Message::skipped(&job),
        ];
        let mut bytes = Vec::new();
        for message in &messages {
            bytes.extend(encode_frame(message).unwrap());
        }
        (messages, bytes)
    }

    #[test]
    fn recovers_messages_in_order() {
        let (messages, bytes) = sample_frames();
        let records: Vec<_> = FrameReader::new(Cursor::new(bytes)).collect();
        assert_eq!(records.len(), 3);
        for (index, (record, expected)) in records.iter().zip(&messages).enumerate() {
            assert_eq!(record.frame_number, index + 1);
            assert_eq!(record.outcome.as_ref().unwrap(), expected);
            assert!(record.raw.is_none());
        }
    }

    #[test]
    fn captures_raw_document_when_configured() {
        let (messages, bytes) = sample_frames();
        let config = ReaderConfig {
            capture_raw: true,
            ..ReaderConfig::default()
        };
        let first = FrameReader::with_config(Cursor::new(bytes), config)
            .next()
            .unwrap();
        let expected = serde_json::to_string(&messages[0]).unwrap();
        assert_eq!(first.raw.as_deref(), Some(expected.as_str()));
    }

    #[test]
    fn blank_lines_between_frames_are_skipped() {
        let (messages, bytes) = sample_frames();
        let mut padded = b"\n\r\n".to_vec();
        padded.extend(bytes);
        padded.extend(b"\n");
        let records: Vec<_> = FrameReader::new(Cursor::new(padded)).collect();
        assert_eq!(records.len(), messages.len());
        assert!(records.iter().all(|record| record.outcome.is_ok()));
    }

    #[test]
    fn truncated_frame_ends_iteration() {
        let (_, mut bytes) = sample_frames();
        bytes.truncate(bytes.len() - 10);
        let records: Vec<_> = FrameReader::new(Cursor::new(bytes)).collect();
        assert_eq!(records.len(), 3);
        assert!(records[0].outcome.is_ok());
        assert!(records[1].outcome.is_ok());
        assert!(matches!(
            records[2].outcome,
            Err(FrameError::Truncated { .. })
        ));
    }

    #[test]
    fn oversized_frame_is_rejected_without_reading_it() {
        let (_, bytes) = sample_frames();
        let config = ReaderConfig {
            limits: ReaderLimits {
                max_frame_bytes: 8,
                ..ReaderLimits::default()
            },
            capture_raw: false,
        };
        let records: Vec<_> = FrameReader::with_config(Cursor::new(bytes), config).collect();
        assert_eq!(records.len(), 1);
        assert!(matches!(
            records[0].outcome,
            Err(FrameError::FrameTooLarge {
                max_frame_bytes: 8,
                ..
            })
        ));
    }

    #[test]
    fn non_numeric_length_is_invalid() {
        let records: Vec<_> = FrameReader::new(Cursor::new(b"abc\n{}\n".to_vec())).collect();
        assert_eq!(records.len(), 1);
        assert!(matches!(
            &records[0].outcome,
            Err(FrameError::InvalidLength { line }) if line == "abc"
        ));
    }

    #[test]
    fn wrong_length_is_detected_by_missing_newline() {
        let document = r#"{"kind":"skipped","name":"A","command":"a"}"#;
        let stream = format!("{}\n{}\n", document.len() - 1, document);
        let records: Vec<_> = FrameReader::new(Cursor::new(stream.into_bytes())).collect();
        assert_eq!(records.len(), 1);
        assert!(matches!(
            records[0].outcome,
            Err(FrameError::MissingNewline { found: b'}' })
        ));
    }

    #[test]
    fn huge_declared_length_is_truncated_not_allocated() {
        let config = ReaderConfig {
            limits: ReaderLimits {
                max_frame_bytes: usize::MAX,
                max_length_line_bytes: usize::MAX,
            },
            capture_raw: false,
        };
        let stream = format!("{}\n{{}}\n", usize::MAX);
        let records: Vec<_> =
            FrameReader::with_config(Cursor::new(stream.into_bytes()), config).collect();
        assert_eq!(records.len(), 1);
        assert!(matches!(
            records[0].outcome,
            Err(FrameError::Truncated {
                declared_bytes: usize::MAX,
                read_bytes: 3,
            })
        ));
    }

    #[test]
    fn invalid_utf8_document_is_skipped() {
        let records: Vec<_> =
            FrameReader::new(Cursor::new(b"2\n\xff\xfe\n7\n{\"a\":1}\n".to_vec())).collect();
        assert_eq!(records.len(), 2);
        assert!(matches!(records[0].outcome, Err(FrameError::InvalidUtf8)));
        assert!(records[0].raw.is_none());
        assert!(matches!(records[1].outcome, Err(FrameError::Decode(_))));
        assert_eq!(records[1].frame_number, 2);
    }

    #[test]
    fn overlong_length_line_is_invalid() {
        let mut stream = "1".repeat(40).into_bytes();
        stream.extend(b"\n{}\n");
        let records: Vec<_> = FrameReader::new(Cursor::new(stream)).collect();
        assert_eq!(records.len(), 1);
        assert!(matches!(
            &records[0].outcome,
            Err(FrameError::InvalidLength { line }) if line.len() == 33
        ));
    }

    #[test]
    fn unterminated_length_line_at_end_is_truncated() {
        let (_, mut bytes) = sample_frames();
        bytes.extend(b"12");
        let records: Vec<_> = FrameReader::new(Cursor::new(bytes)).collect();
        assert_eq!(records.len(), 4);
        assert!(records[..3].iter().all(|record| record.outcome.is_ok()));
        assert!(matches!(
            records[3].outcome,
            Err(FrameError::Truncated {
                declared_bytes: 12,
                read_bytes: 0,
            })
        ));
    }

    #[test]
    fn bad_length_prefix_stops_the_reader() {
        let (_, bytes) = sample_frames();
        let mut stream = b"-5\n{}\n".to_vec();
        stream.extend(bytes);
        let mut reader = FrameReader::new(Cursor::new(stream));
        let first = reader.next().unwrap();
        assert!(matches!(
            &first.outcome,
            Err(FrameError::InvalidLength { line }) if line == "-5"
        ));
        assert!(reader.next().is_none());
    }

    #[test]
    fn undecodable_document_is_skipped() {
        let (messages, bytes) = sample_frames();
        let mut stream = b"7\n{\"a\":1}\n".to_vec();
        stream.extend(bytes);
        let records: Vec<_> = FrameReader::new(Cursor::new(stream)).collect();
        assert_eq!(records.len(), messages.len() + 1);
        assert!(matches!(records[0].outcome, Err(FrameError::Decode(_))));
        assert!(records[1..].iter().all(|record| record.outcome.is_ok()));
    }
}
