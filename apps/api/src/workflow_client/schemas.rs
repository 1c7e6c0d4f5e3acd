/// Workflow catalog: webhook paths, timeouts and declared input schemas.
use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::WorkflowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WorkflowId {
    ResumeOptimization,
    CoverLetter,
    JobAnalysis,
    KeywordExtraction,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    StringArray,
}

#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

const fn required(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind, required: true }
}

const fn optional(name: &'static str, kind: FieldKind) -> FieldSpec {
    FieldSpec { name, kind, required: false }
}

const RESUME_OPTIMIZATION_FIELDS: &[FieldSpec] = &[
    required("resumeText", FieldKind::String),
    required("jobDescription", FieldKind::String),
    optional("targetRole", FieldKind::String),
    optional("optimizationLevel", FieldKind::String),
    optional("keywords", FieldKind::StringArray),
];

const COVER_LETTER_FIELDS: &[FieldSpec] = &[
    required("resumeText", FieldKind::String),
    required("jobDescription", FieldKind::String),
    optional("companyName", FieldKind::String),
    optional("highlights", FieldKind::StringArray),
];

const JOB_ANALYSIS_FIELDS: &[FieldSpec] = &[
    required("jobDescription", FieldKind::String),
    optional("companyName", FieldKind::String),
];

const KEYWORD_EXTRACTION_FIELDS: &[FieldSpec] = &[
    required("text", FieldKind::String),
    optional("industry", FieldKind::String),
];

impl WorkflowId {
    pub const ALL: [WorkflowId; 4] = [
        WorkflowId::ResumeOptimization,
        WorkflowId::CoverLetter,
        WorkflowId::JobAnalysis,
        WorkflowId::KeywordExtraction,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowId::ResumeOptimization => "resume-optimization",
            WorkflowId::CoverLetter => "cover-letter",
            WorkflowId::JobAnalysis => "job-analysis",
            WorkflowId::KeywordExtraction => "keyword-extraction",
        }
    }

    pub fn path(&self) -> String {
        format!("/webhook/{}", self.as_str())
    }

    pub fn timeout(&self) -> Duration {
        match self {
            WorkflowId::ResumeOptimization => Duration::from_secs(45),
            WorkflowId::CoverLetter => Duration::from_secs(30),
            WorkflowId::JobAnalysis | WorkflowId::KeywordExtraction => Duration::from_secs(20),
        }
    }

    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            WorkflowId::ResumeOptimization => RESUME_OPTIMIZATION_FIELDS,
            WorkflowId::CoverLetter => COVER_LETTER_FIELDS,
            WorkflowId::JobAnalysis => JOB_ANALYSIS_FIELDS,
            WorkflowId::KeywordExtraction => KEYWORD_EXTRACTION_FIELDS,
        }
    }
}

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Checks `input` against the workflow's declared fields. Required strings
/// must also be non-blank; unknown fields are passed through untouched.
pub fn validate_input(workflow: WorkflowId, input: &Value) -> Result<(), WorkflowError> {
    let object = input
        .as_object()
        .ok_or_else(|| WorkflowError::Schema(format!("{workflow}: input must be a JSON object")))?;

    for field in workflow.fields() {
        match object.get(field.name) {
            None | Some(Value::Null) if field.required => {
                return Err(WorkflowError::Schema(format!(
                    "{workflow}: missing required field '{}'",
                    field.name
                )));
            }
            None | Some(Value::Null) => {}
            Some(value) => check_kind(workflow, field, value)?,
        }
    }
    Ok(())
}

fn check_kind(workflow: WorkflowId, field: &FieldSpec, value: &Value) -> Result<(), WorkflowError> {
    let ok = match field.kind {
        FieldKind::String => value
            .as_str()
            .is_some_and(|s| !field.required || !s.trim().is_empty()),
        FieldKind::StringArray => value
            .as_array()
            .is_some_and(|items| items.iter().all(Value::is_string)),
    };
    if ok {
        Ok(())
    } else {
        Err(WorkflowError::Schema(format!(
            "{workflow}: field '{}' must be {}",
            field.name,
            match field.kind {
                FieldKind::String => "a non-empty string",
                FieldKind::StringArray => "an array of strings",
            }
        )))
    }
}
