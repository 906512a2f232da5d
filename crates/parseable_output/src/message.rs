use std::fmt;

use serde::{Deserialize, Serialize};

use crate::job::Job;
use crate::payload::{CommandPayload, OutputEntry};

/// Process identifier reported by the task queue.
pub type ProcessId = i64;

/// One job-lifecycle notification.
///
/// Serializes with `kind` first, then the variant's fields in declaration
/// order; that order is the wire contract.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Message {
    Began(Began),
    Finished(Finished),
    Signalled(Signalled),
    Skipped(Skipped),
}

/// The job's process was started.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Began {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<OutputEntry>,
    pub pid: ProcessId,
}

/// The job's process exited normally.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Finished {
    pub name: String,
    pub pid: ProcessId,
    #[serde(default)]
    pub output: String,
    #[serde(rename = "exit-status")]
    pub exit_status: i32,
}

/// The job's process was terminated by a signal.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Signalled {
    pub name: String,
    pub pid: ProcessId,
    #[serde(default)]
    pub output: String,
    #[serde(rename = "error-message", default)]
    pub error_message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signal: Option<i32>,
}

/// The job was not run, typically because its outputs were up to date.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Skipped {
    pub name: String,
    pub command: String,
    #[serde(default)]
    pub inputs: Vec<String>,
    #[serde(default)]
    pub outputs: Vec<OutputEntry>,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum MessageKind {
    Began,
    Finished,
    Signalled,
    Skipped,
}

impl MessageKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            MessageKind::Began => "began",
            MessageKind::Finished => "finished",
            MessageKind::Signalled => "signalled",
            MessageKind::Skipped => "skipped",
        }
    }
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Message {
    pub fn began<J: Job + ?Sized>(job: &J, pid: ProcessId) -> Self {
        let CommandPayload {
            command,
            inputs,
            outputs,
        } = CommandPayload::extract(job);
        Message::Began(Began {
            name: job.class_name().to_string(),
            command,
            inputs,
            outputs,
            pid,
        })
    }

    pub fn finished<J: Job + ?Sized>(
        job: &J,
        pid: ProcessId,
        output: impl Into<String>,
        exit_status: i32,
    ) -> Self {
        Message::Finished(Finished {
            name: job.class_name().to_string(),
            pid,
            output: output.into(),
            exit_status,
        })
    }

    pub fn signalled<J: Job + ?Sized>(
        job: &J,
        pid: ProcessId,
        output: impl Into<String>,
        error_message: impl Into<String>,
    ) -> Self {
        Message::Signalled(Signalled {
            name: job.class_name().to_string(),
            pid,
            output: output.into(),
            error_message: error_message.into(),
            signal: None,
        })
    }

    pub fn skipped<J: Job + ?Sized>(job: &J) -> Self {
        let CommandPayload {
            command,
            inputs,
            outputs,
        } = CommandPayload::extract(job);
        Message::Skipped(Skipped {
            name: job.class_name().to_string(),
            command,
            inputs,
            outputs,
        })
    }

    /// Attaches the terminating signal number to a `signalled` message; other
    /// kinds are returned unchanged.
    pub fn with_signal(mut self, signal: i32) -> Self {
        if let Message::Signalled(signalled) = &mut self {
            signalled.signal = Some(signal);
        }
        self
    }

    pub fn kind(&self) -> MessageKind {
        match self {
            Message::Began(_) => MessageKind::Began,
            Message::Finished(_) => MessageKind::Finished,
            Message::Signalled(_) => MessageKind::Signalled,
            Message::Skipped(_) => MessageKind::Skipped,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Message::Began(m) => &m.name,
            Message::Finished(m) => &m.name,
            Message::Signalled(m) => &m.name,
            Message::Skipped(m) => &m.name,
        }
    }

    /// `None` for `skipped`, which never ran.
    pub fn pid(&self) -> Option<ProcessId> {
        match self {
            Message::Began(m) => Some(m.pid),
            Message::Finished(m) => Some(m.pid),
            Message::Signalled(m) => Some(m.pid),
            Message::Skipped(_) => None,
        }
    }
}
