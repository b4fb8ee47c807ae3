use std::fmt;

use serde::{Deserialize, Serialize};

use crate::validation::{Rule, ValidationError};

/// Output language for every generated artifact.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "pt-BR")]
    PtBr,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Language::PtBr => "pt-BR",
            Language::EnUs => "en-US",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Writing register requested by the candidate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tone {
    #[default]
    Profissional,
    Neutro,
    Criativo,
}

impl Tone {
    pub fn as_str(&self) -> &'static str {
        match self {
            Tone::Profissional => "profissional",
            Tone::Neutro => "neutro",
            Tone::Criativo => "criativo",
        }
    }
}

/// Download format the browser renders. Only docx exists today.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    #[default]
    Docx,
}

/// Request body shared by all three generation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateRequest {
    pub candidate_text: String,
    pub job_text: String,
    #[serde(default)]
    pub language: Language,
    #[serde(default)]
    pub tone: Tone,
    #[serde(default)]
    pub format: Format,
}

impl GenerateRequest {
    /// Rejects requests the pipeline must never see. Runs before any LLM call.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.candidate_text.trim().is_empty() {
            return Err(ValidationError::new("candidate_text", Rule::NonEmpty));
        }
        if self.job_text.trim().is_empty() {
            return Err(ValidationError::new("job_text", Rule::NonEmpty));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_request_defaults_format_language_and_tone() {
        let request: GenerateRequest =
            serde_json::from_str(r#"{"candidate_text": "a", "job_text": "b"}"#).unwrap();
        assert_eq!(request.format, Format::Docx);
        assert_eq!(request.language, Language::PtBr);
        assert_eq!(request.tone, Tone::Profissional);
    }

    #[test]
    fn test_language_uses_bcp47_codes_on_the_wire() {
        let request: GenerateRequest = serde_json::from_str(
            r#"{"candidate_text": "a", "job_text": "b", "language": "en-US", "tone": "neutro"}"#,
        )
        .unwrap();
        assert_eq!(request.language, Language::EnUs);
        assert_eq!(request.tone, Tone::Neutro);
        assert_eq!(serde_json::to_string(&Language::PtBr).unwrap(), r#""pt-BR""#);
    }

    #[test]
    fn test_unknown_format_is_rejected() {
        let result: Result<GenerateRequest, _> = serde_json::from_str(
            r#"{"candidate_text": "a", "job_text": "b", "format": "pdf"}"#,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_blank_job_text() {
        let request = GenerateRequest {
            candidate_text: "Backend engineer".to_string(),
            job_text: "   ".to_string(),
            language: Language::default(),
            tone: Tone::default(),
            format: Format::default(),
        };
        let err = request.validate().unwrap_err();
        assert_eq!(err.path, "job_text");
        assert_eq!(err.rule, Rule::NonEmpty);
    }

    #[test]
    fn test_validate_checks_candidate_text_first() {
        let request = GenerateRequest {
            candidate_text: String::new(),
            job_text: String::new(),
            language: Language::default(),
            tone: Tone::default(),
            format: Format::default(),
        };
        assert_eq!(request.validate().unwrap_err().path, "candidate_text");
    }
}
