//! Output of the extraction stage: a loosely-typed JSON object that is fed
//! verbatim to the resume prompt and consulted directly by the
//! cover-letter-only path.

use serde_json::{Map, Value};

use crate::models::resume::ResumeResponse;
use crate::validation::hints::{MAX_INTRO_LENGTH, MAX_JOB_TITLE_LENGTH, MAX_NAME_LENGTH};
use crate::validation::text::clean_text;

const NAME_KEYS: &[&str] = &["name", "candidate_name", "full_name"];
const JOB_TITLE_KEYS: &[&str] = &[
    "job_title",
    "desired_job_title",
    "current_job_title",
    "title",
    "role",
];
const SUMMARY_KEYS: &[&str] = &[
    "summary",
    "candidate_introduction",
    "professional_summary",
    "profile",
];
const NESTED_KEYS: &[&str] = &["candidate", "candidate_info", "personal_info"];

#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedPayload(Map<String, Value>);

impl ExtractedPayload {
    pub fn new(fields: Map<String, Value>) -> Self {
        Self(fields)
    }

    pub fn name(&self) -> Option<String> {
        self.lookup(NAME_KEYS, MAX_NAME_LENGTH)
    }

    pub fn job_title(&self) -> Option<String> {
        self.lookup(JOB_TITLE_KEYS, MAX_JOB_TITLE_LENGTH)
    }

    pub fn summary(&self) -> Option<String> {
        self.lookup(SUMMARY_KEYS, MAX_INTRO_LENGTH)
    }

    /// Pretty-printed JSON for embedding in the resume prompt.
    pub fn to_pretty_json(&self) -> String {
        serde_json::to_string_pretty(&self.0).unwrap_or_default()
    }

    /// First non-blank string under any of `keys`, at the top level or inside
    /// a nested candidate object.
    fn lookup(&self, keys: &[&str], max_len: usize) -> Option<String> {
        let nested = NESTED_KEYS
            .iter()
            .filter_map(|k| self.0.get(*k).and_then(Value::as_object));

        std::iter::once(&self.0)
            .chain(nested)
            .flat_map(|object| keys.iter().filter_map(move |k| object.get(*k)))
            .filter_map(Value::as_str)
            .map(|s| clean_text(s, max_len))
            .find(|s| !s.is_empty())
    }
}

/// Candidate facts the cover-letter prompt needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoverLetterInputs {
    pub candidate_name: String,
    pub job_title: String,
    pub summary: String,
}

impl CoverLetterInputs {
    pub fn from_resume(resume: &ResumeResponse) -> Self {
        Self {
            candidate_name: resume.name.clone(),
            job_title: resume.job_title.clone(),
            summary: resume.candidate_introduction.clone(),
        }
    }

    pub fn from_extracted(extracted: &ExtractedPayload) -> Self {
        Self {
            candidate_name: extracted.name().unwrap_or_default(),
            job_title: extracted.job_title().unwrap_or_default(),
            summary: extracted.summary().unwrap_or_default(),
        }
    }
}
