use std::{collections::BTreeMap, sync::Arc};

use serde::{Deserialize, Serialize};

use crate::catalog::FileType;

/// Read-only view of a planned job, supplied by the driver's planning layer.
pub trait Job {
    /// Identifier of the kind of job (e.g. `CompileJob`); becomes the message `name`.
    fn class_name(&self) -> &str;

    /// Input producers in declaration order.
    fn inputs(&self) -> Vec<InputSource<'_>>;

    fn output(&self) -> &JobOutput;

    /// Shell-representable rendering of the full invocation.
    fn command_line(&self) -> String;
}

/// One declared input of a job.
#[derive(Clone, Copy)]
pub enum InputSource<'a> {
    /// A literal file named on the command line.
    File(&'a str),
    /// Another job whose primary output feeds this one.
    Job(&'a dyn Job),
}

/// The files a job is expected to produce.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct JobOutput {
    pub primary_type: FileType,
    #[serde(default)]
    pub primary_path: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub additional: BTreeMap<FileType, String>,
}

impl JobOutput {
    pub fn new(primary_type: FileType, primary_path: impl Into<String>) -> Self {
        Self {
            primary_type,
            primary_path: primary_path.into(),
            additional: BTreeMap::new(),
        }
    }

    pub fn nothing() -> Self {
        Self::default()
    }

    /// Records an auxiliary output. Empty paths are not stored.
    pub fn with_additional(mut self, ty: FileType, path: impl Into<String>) -> Self {
        self.insert_additional(ty, path);
        self
    }

    pub fn insert_additional(&mut self, ty: FileType, path: impl Into<String>) {
        let path = path.into();
        if path.is_empty() {
            self.additional.remove(&ty);
        } else {
            self.additional.insert(ty, path);
        }
    }

    pub fn additional_for(&self, ty: FileType) -> Option<&str> {
        self.additional
            .get(&ty)
            .map(String::as_str)
            .filter(|path| !path.is_empty())
    }
}

/// Input of an owned [`JobDescription`].
#[derive(Clone, Debug)]
pub enum JobInput {
    File(String),
    Job(Arc<JobDescription>),
}

/// Owned [`Job`] implementation for drivers that don't keep their own job graph
/// types around, and for tests.
#[derive(Clone, Debug)]
pub struct JobDescription {
    class_name: String,
    program: String,
    arguments: Vec<String>,
    inputs: Vec<JobInput>,
    output: JobOutput,
}

impl JobDescription {
    pub fn builder(
        class_name: impl Into<String>,
        program: impl Into<String>,
    ) -> JobDescriptionBuilder {
        JobDescriptionBuilder {
            job: JobDescription {
                class_name: class_name.into(),
                program: program.into(),
                arguments: Vec::new(),
                inputs: Vec::new(),
                output: JobOutput::nothing(),
            },
        }
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn job_inputs(&self) -> &[JobInput] {
        &self.inputs
    }
}

impl Job for JobDescription {
    fn class_name(&self) -> &str {
        &self.class_name
    }

    fn inputs(&self) -> Vec<InputSource<'_>> {
        self.inputs
            .iter()
            .map(|input| match input {
                JobInput::File(path) => InputSource::File(path.as_str()),
                JobInput::Job(job) => InputSource::Job(&**job),
            })
            .collect()
    }

    fn output(&self) -> &JobOutput {
        &self.output
    }

    fn command_line(&self) -> String {
        render_command_line(&self.program, &self.arguments)
    }
}

#[derive(Clone, Debug)]
pub struct JobDescriptionBuilder {
    job: JobDescription,
}

impl JobDescriptionBuilder {
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.job.arguments.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.job.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn input_file(mut self, path: impl Into<String>) -> Self {
        self.job.inputs.push(JobInput::File(path.into()));
        self
    }

    pub fn input_job(mut self, job: Arc<JobDescription>) -> Self {
        self.job.inputs.push(JobInput::Job(job));
        self
    }

    pub fn primary_output(mut self, ty: FileType, path: impl Into<String>) -> Self {
        self.job.output.primary_type = ty;
        self.job.output.primary_path = path.into();
        self
    }

    pub fn additional_output(mut self, ty: FileType, path: impl Into<String>) -> Self {
        self.job.output.insert_additional(ty, path);
        self
    }

    pub fn output(mut self, output: JobOutput) -> Self {
        self.job.output = output;
        self
    }

    pub fn build(self) -> JobDescription {
        self.job
    }
}

/// Renders `program` and `arguments` as a single POSIX shell command line.
pub fn render_command_line<S: AsRef<str>>(program: &str, arguments: &[S]) -> String {
    let mut line = shell_quote(program);
    for arg in arguments {
        line.push(' ');
        line.push_str(&shell_quote(arg.as_ref()));
    }
    line
}

fn shell_quote(word: &str) -> String {
    if word.is_empty() {
        return "''".to_string();
    }
    if word.chars().all(is_shell_safe) {
        return word.to_string();
    }
    let mut quoted = String::with_capacity(word.len() + 2);
    quoted.push('\'');
    for ch in word.chars() {
        if ch == '\'' {
            quoted.push_str("'\\''");
        } else {
            quoted.push(ch);
        }
    }
    quoted.push('\'');
    quoted
}

fn is_shell_safe(ch: char) -> bool {
    ch.is_ascii_alphanumeric()
        || matches!(
            ch,
            '_' | '@' | '%' | '+' | '=' | ':' | ',' | '.' | '/' | '-'
        )
}
