use std::io::Write;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::config::EmitterConfig;
use crate::encode::{write_frame, EncodedMessage};
use crate::error::EmitError;
use crate::job::Job;
use crate::message::{Message, ProcessId};

/// Handle to a shared status stream.
///
/// Every frame is written while holding the stream lock, so concurrent
/// callers never interleave bytes. Encoding happens before the lock is taken.
pub struct Emitter<W> {
    stream: Mutex<W>,
    config: EmitterConfig,
}

impl<W: Write> Emitter<W> {
    pub fn new(stream: W) -> Self {
        Self::with_config(stream, EmitterConfig::default())
    }

    pub fn with_config(stream: W, config: EmitterConfig) -> Self {
        Self {
            stream: Mutex::new(stream),
            config,
        }
    }

    pub fn config(&self) -> EmitterConfig {
        self.config
    }

    pub fn emit(&self, message: &Message) -> Result<(), EmitError> {
        let encoded = EncodedMessage::encode(message)?;
        self.emit_encoded(message, &encoded)
    }

    pub fn emit_began<J: Job + ?Sized>(&self, job: &J, pid: ProcessId) -> Result<(), EmitError> {
        self.emit(&Message::began(job, pid))
    }

    pub fn emit_finished<J: Job + ?Sized>(
        &self,
        job: &J,
        pid: ProcessId,
        exit_status: i32,
        output: &str,
    ) -> Result<(), EmitError> {
        self.emit(&Message::finished(job, pid, output, exit_status))
    }

    pub fn emit_signalled<J: Job + ?Sized>(
        &self,
        job: &J,
        pid: ProcessId,
        error_message: &str,
        output: &str,
    ) -> Result<(), EmitError> {
        self.emit(&Message::signalled(job, pid, output, error_message))
    }

    pub fn emit_skipped<J: Job + ?Sized>(&self, job: &J) -> Result<(), EmitError> {
        self.emit(&Message::skipped(job))
    }

    /// Returns the underlying stream, even if an emitting thread panicked.
    pub fn into_inner(self) -> W {
        self.stream
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn emit_encoded(&self, message: &Message, encoded: &EncodedMessage) -> Result<(), EmitError> {
        let mut stream = self.lock();
        write_frame(&mut *stream, encoded.document())?;
        if self.config.flush_each_frame {
            stream.flush()?;
        }
        drop(stream);

        debug!(
            kind = message.kind().as_str(),
            name = message.name(),
            bytes = encoded.byte_len(),
            "emitted status frame"
        );
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, W> {
        self.stream.lock().unwrap_or_else(|poisoned| {
            warn!("status stream lock was poisoned; the stream may hold a truncated frame");
            poisoned.into_inner()
        })
    }
}

#[cfg(feature = "tokio")]
mod tokio_emit {
    use tokio::io::{AsyncWrite, AsyncWriteExt};
    use tokio::sync::Mutex;
    use tracing::debug;

    use crate::config::EmitterConfig;
    use crate::encode::EncodedMessage;
    use crate::error::EmitError;
    use crate::job::Job;
    use crate::message::{Message, ProcessId};

    /// Async counterpart of [`crate::Emitter`] with the same framing.
    pub struct AsyncEmitter<W> {
        stream: Mutex<W>,
        config: EmitterConfig,
    }

    impl<W: AsyncWrite + Unpin> AsyncEmitter<W> {
        pub fn new(stream: W) -> Self {
            Self::with_config(stream, EmitterConfig::default())
        }

        pub fn with_config(stream: W, config: EmitterConfig) -> Self {
            Self {
                stream: Mutex::new(stream),
                config,
            }
        }

        pub async fn emit(&self, message: &Message) -> Result<(), EmitError> {
            let encoded = EncodedMessage::encode(message)?;
            let frame = encoded.to_frame_bytes();

            let mut stream = self.stream.lock().await;
            stream.write_all(&frame).await?;
            if self.config.flush_each_frame {
                stream.flush().await?;
            }
            drop(stream);

            debug!(
                kind = message.kind().as_str(),
                name = message.name(),
                bytes = encoded.byte_len(),
                "emitted status frame"
            );
            Ok(())
        }

        pub async fn emit_began<J: Job + ?Sized>(
            &self,
            job: &J,
            pid: ProcessId,
        ) -> Result<(), EmitError> {
            let message = Message::began(job, pid);
            self.emit(&message).await
        }

        pub async fn emit_finished<J: Job + ?Sized>(
            &self,
            job: &J,
            pid: ProcessId,
            exit_status: i32,
            output: &str,
        ) -> Result<(), EmitError> {
            let message = Message::finished(job, pid, output, exit_status);
            self.emit(&message).await
        }

        pub async fn emit_signalled<J: Job + ?Sized>(
            &self,
            job: &J,
            pid: ProcessId,
            error_message: &str,
            output: &str,
        ) -> Result<(), EmitError> {
            let message = Message::signalled(job, pid, output, error_message);
            self.emit(&message).await
        }

        pub async fn emit_skipped<J: Job + ?Sized>(&self, job: &J) -> Result<(), EmitError> {
            let message = Message::skipped(job);
            self.emit(&message).await
        }

        pub fn into_inner(self) -> W {
            self.stream.into_inner()
        }
    }

}

#[cfg(feature = "tokio")]
pub use tokio_emit::AsyncEmitter;
