//! Sanitize-then-validate layer shared by the request and response sides.
//!
//! Model output goes through `sanitizer::sanitize` (structural cleanup against
//! `hints`) and then `validator` (strict, pure, first-failure-wins) before any
//! typed record leaves the pipeline.

use std::fmt;

use thiserror::Error;

pub mod hints;
pub mod sanitizer;
pub mod text;
pub mod validator;

/// The rule a field broke. Carried in `ValidationError` for API messages and tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rule {
    Required,
    NonEmpty,
    Type { expected: &'static str },
    Pattern(&'static str),
    OneOf(&'static [&'static str]),
    MinItems(usize),
    MinLength(usize),
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rule::Required => f.write_str("field is required"),
            Rule::NonEmpty => f.write_str("must not be empty"),
            Rule::Type { expected } => write!(f, "expected {expected}"),
            Rule::Pattern(pattern) => write!(f, "must match {pattern}"),
            Rule::OneOf(allowed) => write!(f, "must be one of {}", allowed.join(", ")),
            Rule::MinItems(min) => write!(f, "must contain at least {min} item(s)"),
            Rule::MinLength(min) => write!(f, "must be at least {min} characters long"),
        }
    }
}

/// First validation failure found, with the offending field path
/// (`experiences[0].end_date`).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{path}: {rule}")]
pub struct ValidationError {
    pub path: String,
    pub rule: Rule,
}

impl ValidationError {
    pub fn new(path: impl Into<String>, rule: Rule) -> Self {
        Self {
            path: path.into(),
            rule,
        }
    }
}
