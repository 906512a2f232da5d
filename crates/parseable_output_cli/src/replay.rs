use std::{fs, io, path::PathBuf, sync::Arc};

use parseable_output::{EmitError, Emitter, JobDescription, JobOutput, Message, ProcessId};
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, clap::Args)]
pub struct Args {
    /// JSON script listing jobs and the lifecycle steps to report for them.
    #[arg(long)]
    pub script: PathBuf,
}

#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read script {path:?}: {source}")]
    Read { path: PathBuf, source: io::Error },
    #[error("failed to parse script: {0}")]
    Json(#[from] serde_json::Error),
    #[error("job {job} takes its input from job {input}, which is not defined before it")]
    ForwardReference { job: usize, input: usize },
    #[error("step {step} refers to unknown job {job}")]
    UnknownJob { step: usize, job: usize },
    #[error(transparent)]
    Emit(#[from] EmitError),
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct Script {
    jobs: Vec<ScriptJob>,
    #[serde(default)]
    steps: Vec<Step>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct ScriptJob {
    kind: String,
    program: String,
    #[serde(default)]
    arguments: Vec<String>,
    #[serde(default)]
    inputs: Vec<ScriptInput>,
    #[serde(default)]
    output: JobOutput,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
enum ScriptInput {
    File(String),
    Job(usize),
}

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
enum Step {
    Began {
        job: usize,
        pid: ProcessId,
    },
    Finished {
        job: usize,
        pid: ProcessId,
        #[serde(default)]
        exit_status: i32,
        #[serde(default)]
        output: String,
    },
    Signalled {
        job: usize,
        pid: ProcessId,
        #[serde(default)]
        error_message: String,
        #[serde(default)]
        output: String,
        #[serde(default)]
        signal: Option<i32>,
    },
    Skipped {
        job: usize,
    },
}

impl Step {
    fn job(&self) -> usize {
        match self {
            Step::Began { job, .. }
            | Step::Finished { job, .. }
            | Step::Signalled { job, .. }
            | Step::Skipped { job } => *job,
        }
    }
}

pub fn run(args: Args) -> Result<(), Error> {
    let text = fs::read_to_string(&args.script).map_err(|source| Error::Read {
        path: args.script.clone(),
        source,
    })?;
    let script: Script = serde_json::from_str(&text)?;
    let jobs = build_jobs(script.jobs)?;
    debug!(jobs = jobs.len(), steps = script.steps.len(), "replaying script");

    let emitter = Emitter::new(io::stdout());
    for (index, step) in script.steps.iter().enumerate() {
        let message = step_message(&jobs, index, step)?;
        emitter.emit(&message)?;
    }
    Ok(())
}

fn build_jobs(jobs: Vec<ScriptJob>) -> Result<Vec<Arc<JobDescription>>, Error> {
    let mut built: Vec<Arc<JobDescription>> = Vec::with_capacity(jobs.len());
    for (index, job) in jobs.into_iter().enumerate() {
        let mut builder = JobDescription::builder(job.kind, job.program)
            .args(job.arguments)
            .output(job.output);
        for input in job.inputs {
            builder = match input {
                ScriptInput::File(path) => builder.input_file(path),
                ScriptInput::Job(producer) => {
                    let Some(producer) = built.get(producer) else {
                        return Err(Error::ForwardReference {
                            job: index,
                            input: producer,
                        });
                    };
                    builder.input_job(Arc::clone(producer))
                }
            };
        }
        built.push(Arc::new(builder.build()));
    }
    Ok(built)
}

fn step_message(
    jobs: &[Arc<JobDescription>],
    index: usize,
    step: &Step,
) -> Result<Message, Error> {
    let job = jobs.get(step.job()).ok_or(Error::UnknownJob {
        step: index,
        job: step.job(),
    })?;
    let job = job.as_ref();
    Ok(match step {
        Step::Began { pid, .. } => Message::began(job, *pid),
        Step::Finished {
            pid,
            exit_status,
            output,
            ..
        } => Message::finished(job, *pid, output.as_str(), *exit_status),
        Step::Signalled {
            pid,
            error_message,
            output,
            signal,
            ..
        } => {
            let message = Message::signalled(job, *pid, output.as_str(), error_message.as_str());
            match signal {
                Some(signal) => message.with_signal(*signal),
                None => message,
            }
        }
        Step::Skipped { .. } => Message::skipped(job),
    })
}
