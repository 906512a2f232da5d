use serde::{Deserialize, Serialize};

use crate::catalog::FileType;
use crate::job::{InputSource, Job};

/// One produced artifact as it appears in `outputs`.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct OutputEntry {
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub path: String,
}

impl OutputEntry {
    pub fn new(file_type: FileType, path: impl Into<String>) -> Self {
        Self {
            file_type,
            path: path.into(),
        }
    }
}

/// Command line, inputs and outputs shared by `began` and `skipped` messages.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct CommandPayload {
    pub command: String,
    pub inputs: Vec<String>,
    pub outputs: Vec<OutputEntry>,
}

impl CommandPayload {
    pub fn extract<J: Job + ?Sized>(job: &J) -> Self {
        Self {
            command: job.command_line(),
            inputs: collect_inputs(job),
            outputs: collect_outputs(job),
        }
    }
}

/// Input paths in declaration order. A job reference contributes that job's
/// primary output path.
pub fn collect_inputs<J: Job + ?Sized>(job: &J) -> Vec<String> {
    job.inputs()
        .into_iter()
        .map(|input| match input {
            InputSource::File(path) => path.to_string(),
            InputSource::Job(producer) => producer.output().primary_path.clone(),
        })
        .collect()
}

/// The primary output (unless it is `nothing`) followed by every non-empty
/// auxiliary output in catalog order.
pub fn collect_outputs<J: Job + ?Sized>(job: &J) -> Vec<OutputEntry> {
    let output = job.output();
    let mut outputs = Vec::with_capacity(1 + output.additional.len());
    if !output.primary_type.is_nothing() {
        outputs.push(OutputEntry::new(
            output.primary_type,
            output.primary_path.as_str(),
        ));
    }
    outputs.extend(FileType::all().filter_map(|ty| {
        output
            .additional_for(ty)
            .map(|path| OutputEntry::new(ty, path))
    }));
    outputs
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::job::{JobDescription, JobOutput};

    #[test]
    fn primary_output_comes_first_then_catalog_order() {
        let job = JobDescription::builder("CompileJob", "swift")
            .primary_output(FileType::Object, "main.o")
            .additional_output(FileType::SwiftDeps, "main.swiftdeps")
            .additional_output(FileType::Dependencies, "main.d")
            .additional_output(FileType::SwiftModule, "main~partial.swiftmodule")
            .build();

        let outputs = collect_outputs(&job);
        assert_eq!(
            outputs,
            vec![
                OutputEntry::new(FileType::Object, "main.o"),
                OutputEntry::new(FileType::Dependencies, "main.d"),
                OutputEntry::new(FileType::SwiftModule, "main~partial.swiftmodule"),
                OutputEntry::new(FileType::SwiftDeps, "main.swiftdeps"),
            ]
        );
    }

    #[test]
    fn nothing_primary_is_omitted() {
        let job = JobDescription::builder("GenerateDSYMJob", "dsymutil")
            .output(JobOutput::nothing().with_additional(FileType::DSym, "a.out.dSYM"))
            .build();

        assert_eq!(
            collect_outputs(&job),
            vec![OutputEntry::new(FileType::DSym, "a.out.dSYM")]
        );
    }

    #[test]
    fn auxiliary_output_of_primary_type_is_still_listed() {
        let job = JobDescription::builder("MergeModuleJob", "swift")
            .primary_output(FileType::SwiftModule, "App.swiftmodule")
            .additional_output(FileType::SwiftModule, "App-copy.swiftmodule")
            .build();

        let outputs = collect_outputs(&job);
        assert_eq!(outputs.len(), 2);
        assert_eq!(outputs[0].path, "App.swiftmodule");
        assert_eq!(outputs[1].path, "App-copy.swiftmodule");
    }

    #[test]
    fn job_references_resolve_to_primary_output_in_order() {
        let compile_a = Arc::new(
            JobDescription::builder("CompileJob", "swift")
                .input_file("a.swift")
                .primary_output(FileType::Object, "a.o")
                .build(),
        );
        let compile_b = Arc::new(
            JobDescription::builder("CompileJob", "swift")
                .input_file("b.swift")
                .primary_output(FileType::Object, "b.o")
                .build(),
        );
        let link = JobDescription::builder("LinkJob", "ld")
            .input_job(Arc::clone(&compile_a))
            .input_file("libextra.a")
            .input_job(compile_b)
            .input_job(compile_a)
            .primary_output(FileType::Image, "app")
            .build();

        assert_eq!(
            collect_inputs(&link),
            vec!["a.o", "libextra.a", "b.o", "a.o"]
        );
    }

    #[test]
    fn empty_job_yields_empty_lists() {
        let job = JobDescription::builder("InterpretJob", "swift").build();
        let payload = CommandPayload::extract(&job);
        assert_eq!(payload.command, "swift");
        assert!(payload.inputs.is_empty());
        assert!(payload.outputs.is_empty());
    }
}
