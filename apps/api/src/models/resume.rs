use serde::{Deserialize, Serialize};

/// Literal accepted in `Experience.end_date` for an ongoing position.
pub const CURRENT_POSITION: &str = "Atual";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Experience {
    pub company: String,
    pub role: String,
    /// `YYYY-MM`
    pub start_date: String,
    /// `YYYY-MM` or exactly `Atual`
    pub end_date: String,
    pub location: String,
    pub bullets: Vec<String>,
    #[serde(default)]
    pub tech_stack: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Education {
    pub institution: String,
    pub degree: String,
    pub start_date: String,
    pub end_date: String,
}

/// CEFR level, plus `Nativo` for native speakers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LanguageLevel {
    A2,
    B1,
    B2,
    C1,
    C2,
    Nativo,
}

impl LanguageLevel {
    pub const NAMES: &'static [&'static str] = &["A2", "B1", "B2", "C1", "C2", "Nativo"];

    /// Exact, case-sensitive lookup. Case folding is the sanitizer's job.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "A2" => Some(LanguageLevel::A2),
            "B1" => Some(LanguageLevel::B1),
            "B2" => Some(LanguageLevel::B2),
            "C1" => Some(LanguageLevel::C1),
            "C2" => Some(LanguageLevel::C2),
            "Nativo" => Some(LanguageLevel::Nativo),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageProficiency {
    pub name: String,
    pub level: LanguageLevel,
}

/// Every field is optional, but at least one is set; an all-blank block is
/// reported as `contact_information: null`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContactInformation {
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
}

impl ContactInformation {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.phone.is_none() && self.location.is_none()
    }
}

/// Portfolio, LinkedIn, GitHub and similar.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExternalLink {
    pub label: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResumeResponse {
    pub name: String,
    pub job_title: String,
    pub candidate_introduction: String,
    #[serde(default)]
    pub contact_information: Option<ContactInformation>,
    pub experiences: Vec<Experience>,
    #[serde(default)]
    pub education: Vec<Education>,
    #[serde(default)]
    pub languages: Vec<LanguageProficiency>,
    #[serde(default)]
    pub external_links: Vec<ExternalLink>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoverLetterResponse {
    pub greeting: String,
    pub body: String,
    pub signature: String,
}

/// Soft word-count target for the cover letter body. Prompt guidance only.
pub const COVER_BODY_TARGET_WORDS: (usize, usize) = (150, 220);
/// Slack applied around the target before the pipeline logs a warning.
pub const COVER_BODY_TOLERANCE: f64 = 0.2;

impl CoverLetterResponse {
    pub fn body_word_count(&self) -> usize {
        self.body.split_whitespace().count()
    }

    /// True when the body lands within the target range widened by the tolerance.
    pub fn body_within_target(&self) -> bool {
        let (min, max) = COVER_BODY_TARGET_WORDS;
        let words = self.body_word_count() as f64;
        words >= min as f64 * (1.0 - COVER_BODY_TOLERANCE)
            && words <= max as f64 * (1.0 + COVER_BODY_TOLERANCE)
    }
}

/// Combined payload returned by `POST /v1/generate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub resume: ResumeResponse,
    pub cover_letter: CoverLetterResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn letter_with_words(count: usize) -> CoverLetterResponse {
        CoverLetterResponse {
            greeting: "Dear Hiring Manager,".to_string(),
            body: vec!["word"; count].join(" "),
            signature: "Sincerely,\nAlice".to_string(),
        }
    }

    #[test]
    fn test_language_level_lookup_is_case_sensitive() {
        assert_eq!(LanguageLevel::from_name("Nativo"), Some(LanguageLevel::Nativo));
        assert_eq!(LanguageLevel::from_name("c1"), None);
        assert_eq!(LanguageLevel::NAMES.len(), 6);
    }

    #[test]
    fn test_language_level_serializes_as_its_name() {
        let json = serde_json::to_string(&LanguageLevel::C1).unwrap();
        assert_eq!(json, r#""C1""#);
    }

    #[test]
    fn test_body_within_target_applies_tolerance() {
        assert!(letter_with_words(180).body_within_target());
        assert!(letter_with_words(125).body_within_target());
        assert!(letter_with_words(260).body_within_target());
        assert!(!letter_with_words(100).body_within_target());
        assert!(!letter_with_words(300).body_within_target());
    }

    #[test]
    fn test_optional_resume_sections_default_to_empty() {
        let json = r#"{
            "name": "Alice",
            "job_title": "Engineer",
            "candidate_introduction": "Builds things.",
            "experiences": []
        }"#;
        let resume: ResumeResponse = serde_json::from_str(json).unwrap();
        assert!(resume.education.is_empty());
        assert!(resume.languages.is_empty());
        assert!(resume.external_links.is_empty());
        assert_eq!(resume.contact_information, None);
    }

    #[test]
    fn test_missing_contact_serializes_as_null() {
        let resume = ResumeResponse {
            name: "Alice".to_string(),
            job_title: "Engineer".to_string(),
            candidate_introduction: "Builds things.".to_string(),
            contact_information: None,
            experiences: vec![],
            education: vec![],
            languages: vec![],
            external_links: vec![],
        };
        let json = serde_json::to_value(&resume).unwrap();
        assert!(json["contact_information"].is_null());
        assert_eq!(json["external_links"], serde_json::json!([]));
        assert!(ContactInformation::default().is_empty());
    }
}
