//! Strict schema validation of sanitized model output.
//!
//! Pure and deterministic: walks the JSON once, returns the first failure with
//! its field path. No I/O, no retries.

use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Value};

use crate::models::resume::{
    ContactInformation, CoverLetterResponse, Education, Experience, ExternalLink, LanguageLevel,
    LanguageProficiency, ResumeResponse, CURRENT_POSITION,
};
use crate::validation::{Rule, ValidationError};

pub const DATE_PATTERN: &str = "^[0-9]{4}-[0-9]{2}$";
const DATE_OR_CURRENT_PATTERN: &str = "^[0-9]{4}-[0-9]{2}$ or \"Atual\"";
/// Shorter bodies are treated as an empty/hallucinated letter.
pub const MIN_COVER_BODY_CHARS: usize = 50;

static DATE: Lazy<Regex> = Lazy::new(|| Regex::new(DATE_PATTERN).expect("valid regex"));

/// Values used when the sanitizer marked greeting or signature as missing.
#[derive(Debug, Clone, PartialEq)]
pub struct CoverLetterDefaults {
    pub greeting: String,
    pub signature: String,
}

pub fn validate_resume(value: &Value) -> Result<ResumeResponse, ValidationError> {
    let fields = Fields::root(value)?;

    Ok(ResumeResponse {
        name: fields.text("name")?,
        job_title: fields.text("job_title")?,
        candidate_introduction: fields.text("candidate_introduction")?,
        contact_information: fields
            .optional_object("contact_information", validate_contact)?
            .filter(|contact| !contact.is_empty()),
        experiences: fields.object_list("experiences", 1, validate_experience)?,
        education: fields.object_list("education", 0, validate_education)?,
        languages: fields.object_list("languages", 0, validate_language)?,
        external_links: fields.object_list("external_links", 0, validate_link)?,
    })
}

pub fn validate_cover_letter(
    value: &Value,
    defaults: &CoverLetterDefaults,
) -> Result<CoverLetterResponse, ValidationError> {
    let fields = Fields::root(value)?;

    let greeting = fields.text_or("greeting", &defaults.greeting)?;
    let body = fields.text("body")?;
    if body.trim().chars().count() < MIN_COVER_BODY_CHARS {
        return Err(ValidationError::new(
            fields.at("body"),
            Rule::MinLength(MIN_COVER_BODY_CHARS),
        ));
    }
    let signature = fields.text_or("signature", &defaults.signature)?;

    Ok(CoverLetterResponse {
        greeting,
        body,
        signature,
    })
}

fn validate_contact(fields: Fields<'_>) -> Result<ContactInformation, ValidationError> {
    Ok(ContactInformation {
        email: fields.optional_text("email")?,
        phone: fields.optional_text("phone")?,
        location: fields.optional_text("location")?,
    })
}

fn validate_link(fields: Fields<'_>) -> Result<ExternalLink, ValidationError> {
    Ok(ExternalLink {
        label: fields.text("label")?,
        url: fields.text("url")?,
    })
}

fn validate_experience(fields: Fields<'_>) -> Result<Experience, ValidationError> {
    Ok(Experience {
        company: fields.text("company")?,
        role: fields.text("role")?,
        start_date: fields.date("start_date", false)?,
        end_date: fields.date("end_date", true)?,
        location: fields.text("location")?,
        bullets: fields.text_list("bullets", 1)?,
        tech_stack: fields.text_list("tech_stack", 0)?,
    })
}

fn validate_education(fields: Fields<'_>) -> Result<Education, ValidationError> {
    Ok(Education {
        institution: fields.text("institution")?,
        degree: fields.text("degree")?,
        start_date: fields.date("start_date", false)?,
        end_date: fields.date("end_date", false)?,
    })
}

fn validate_language(fields: Fields<'_>) -> Result<LanguageProficiency, ValidationError> {
    Ok(LanguageProficiency {
        name: fields.text("name")?,
        level: fields.level("level")?,
    })
}

/// Read-only view of one JSON object plus the path that led to it.
struct Fields<'a> {
    map: &'a Map<String, Value>,
    path: String,
}

impl<'a> Fields<'a> {
    fn root(value: &'a Value) -> Result<Self, ValidationError> {
        Self::new(value, String::new())
    }

    fn new(value: &'a Value, path: String) -> Result<Self, ValidationError> {
        match value {
            Value::Object(map) => Ok(Self { map, path }),
            _ => Err(ValidationError::new(
                if path.is_empty() { "$".to_string() } else { path },
                Rule::Type { expected: "object" },
            )),
        }
    }

    fn at(&self, field: &str) -> String {
        if self.path.is_empty() {
            field.to_string()
        } else {
            format!("{}.{field}", self.path)
        }
    }

    /// Null counts as missing.
    fn get(&self, field: &str) -> Option<&'a Value> {
        self.map.get(field).filter(|v| !v.is_null())
    }

    fn text(&self, field: &str) -> Result<String, ValidationError> {
        match self.get(field) {
            None => Err(ValidationError::new(self.at(field), Rule::Required)),
            Some(value) => non_empty_string(value, self.at(field)),
        }
    }

    fn optional_text(&self, field: &str) -> Result<Option<String>, ValidationError> {
        self.get(field)
            .map(|value| non_empty_string(value, self.at(field)))
            .transpose()
    }

    fn text_or(&self, field: &str, default: &str) -> Result<String, ValidationError> {
        match self.get(field) {
            None => non_empty_string(&Value::String(default.to_string()), self.at(field)),
            Some(value) => non_empty_string(value, self.at(field)),
        }
    }

    fn date(&self, field: &str, allow_current: bool) -> Result<String, ValidationError> {
        let value = self.text(field)?;
        if allow_current && value == CURRENT_POSITION {
            return Ok(value);
        }
        if DATE.is_match(&value) {
            return Ok(value);
        }
        let pattern = if allow_current {
            DATE_OR_CURRENT_PATTERN
        } else {
            DATE_PATTERN
        };
        Err(ValidationError::new(self.at(field), Rule::Pattern(pattern)))
    }

    fn level(&self, field: &str) -> Result<LanguageLevel, ValidationError> {
        let value = self.text(field)?;
        LanguageLevel::from_name(&value)
            .ok_or_else(|| ValidationError::new(self.at(field), Rule::OneOf(LanguageLevel::NAMES)))
    }

    fn array(&self, field: &str, min_items: usize) -> Result<&'a Vec<Value>, ValidationError> {
        let items = match self.get(field) {
            None if min_items == 0 => return Ok(&EMPTY),
            None => return Err(ValidationError::new(self.at(field), Rule::Required)),
            Some(Value::Array(items)) => items,
            Some(_) => {
                return Err(ValidationError::new(
                    self.at(field),
                    Rule::Type { expected: "array" },
                ))
            }
        };
        if items.len() < min_items {
            return Err(ValidationError::new(
                self.at(field),
                Rule::MinItems(min_items),
            ));
        }
        Ok(items)
    }

    fn text_list(&self, field: &str, min_items: usize) -> Result<Vec<String>, ValidationError> {
        self.array(field, min_items)?
            .iter()
            .enumerate()
            .map(|(i, item)| non_empty_string(item, format!("{}[{i}]", self.at(field))))
            .collect()
    }

    fn optional_object<T>(
        &self,
        field: &str,
        validate: impl FnOnce(Fields<'a>) -> Result<T, ValidationError>,
    ) -> Result<Option<T>, ValidationError> {
        self.get(field)
            .map(|value| Fields::new(value, self.at(field)).and_then(validate))
            .transpose()
    }

    fn object_list<T>(
        &self,
        field: &str,
        min_items: usize,
        validate: impl Fn(Fields<'a>) -> Result<T, ValidationError>,
    ) -> Result<Vec<T>, ValidationError> {
        self.array(field, min_items)?
            .iter()
            .enumerate()
            .map(|(i, item)| {
                let nested = Fields::new(item, format!("{}[{i}]", self.at(field)))?;
                validate(nested)
            })
            .collect()
    }
}

static EMPTY: Vec<Value> = Vec::new();

fn non_empty_string(value: &Value, path: String) -> Result<String, ValidationError> {
    match value {
        Value::String(s) if s.trim().is_empty() => Err(ValidationError::new(path, Rule::NonEmpty)),
        Value::String(s) => Ok(s.clone()),
        _ => Err(ValidationError::new(
            path,
            Rule::Type { expected: "string" },
        )),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn valid_resume() -> ResumeResponse {
        ResumeResponse {
            name: "João Silva".to_string(),
            job_title: "Engenheiro de Software".to_string(),
            candidate_introduction: "Profissional experiente em sistemas distribuídos."
                .to_string(),
            contact_information: Some(ContactInformation {
                email: Some("joao@example.com".to_string()),
                phone: None,
                location: Some("São Paulo, Brasil".to_string()),
            }),
            experiences: vec![Experience {
                company: "Tech Company".to_string(),
                role: "Senior Software Engineer".to_string(),
                start_date: "2020-01".to_string(),
                end_date: "Atual".to_string(),
                location: "São Paulo, Brasil".to_string(),
                bullets: vec!["Liderou equipe de 5 desenvolvedores".to_string()],
                tech_stack: vec!["Rust".to_string(), "Kubernetes".to_string()],
            }],
            education: vec![Education {
                institution: "Universidade de São Paulo".to_string(),
                degree: "Bacharelado em Ciência da Computação".to_string(),
                start_date: "2015-03".to_string(),
                end_date: "2019-12".to_string(),
            }],
            languages: vec![LanguageProficiency {
                name: "Inglês".to_string(),
                level: LanguageLevel::C1,
            }],
            external_links: vec![ExternalLink {
                label: "GitHub".to_string(),
                url: "https://github.com/joaosilva".to_string(),
            }],
        }
    }

    fn resume_with_experience(overrides: Value) -> Value {
        let mut value = serde_json::to_value(valid_resume()).unwrap();
        let exp = value["experiences"][0].as_object_mut().unwrap();
        for (k, v) in overrides.as_object().unwrap() {
            exp.insert(k.clone(), v.clone());
        }
        value
    }

    fn defaults() -> CoverLetterDefaults {
        CoverLetterDefaults {
            greeting: "Dear Hiring Manager,".to_string(),
            signature: "Sincerely,\nAlice".to_string(),
        }
    }

    #[test]
    fn test_valid_resume_round_trips_unchanged() {
        let resume = valid_resume();
        let value = serde_json::to_value(&resume).unwrap();
        assert_eq!(validate_resume(&value).unwrap(), resume);
    }

    #[test]
    fn test_end_date_atual_is_accepted() {
        let value = resume_with_experience(json!({"end_date": "Atual"}));
        assert!(validate_resume(&value).is_ok());
    }

    #[test]
    fn test_end_date_lowercase_atual_is_rejected() {
        let value = resume_with_experience(json!({"end_date": "atual"}));
        let err = validate_resume(&value).unwrap_err();
        assert_eq!(err.path, "experiences[0].end_date");
        assert!(matches!(err.rule, Rule::Pattern(_)));
    }

    #[test]
    fn test_start_date_rejects_non_iso_forms() {
        for start_date in ["202201", "January 2022", "2022/13", "22-01", "Atual"] {
            let value = resume_with_experience(json!({ "start_date": start_date }));
            let err = validate_resume(&value).unwrap_err();
            assert_eq!(err.path, "experiences[0].start_date", "{start_date}");
        }
    }

    #[test]
    fn test_end_date_rejects_partial_forms() {
        for end_date in ["2023", "Jun 2023", "2023/00"] {
            let value = resume_with_experience(json!({ "end_date": end_date }));
            assert!(validate_resume(&value).is_err(), "{end_date} should fail");
        }
    }

    #[test]
    fn test_education_dates_do_not_accept_atual() {
        let mut value = serde_json::to_value(valid_resume()).unwrap();
        value["education"][0]["end_date"] = json!("Atual");
        let err = validate_resume(&value).unwrap_err();
        assert_eq!(err.path, "education[0].end_date");
        assert_eq!(err.rule, Rule::Pattern(DATE_PATTERN));
    }

    #[test]
    fn test_bullets_require_at_least_one_item() {
        let value = resume_with_experience(json!({"bullets": []}));
        let err = validate_resume(&value).unwrap_err();
        assert_eq!(err.path, "experiences[0].bullets");
        assert_eq!(err.rule, Rule::MinItems(1));
    }

    #[test]
    fn test_blank_bullet_reports_its_index() {
        let value = resume_with_experience(json!({"bullets": ["Effective communicator", ""]}));
        let err = validate_resume(&value).unwrap_err();
        assert_eq!(err.path, "experiences[0].bullets[1]");
        assert_eq!(err.rule, Rule::NonEmpty);
    }

    #[test]
    fn test_experiences_must_not_be_empty() {
        let mut value = serde_json::to_value(valid_resume()).unwrap();
        value["experiences"] = json!([]);
        let err = validate_resume(&value).unwrap_err();
        assert_eq!(err.path, "experiences");
        assert_eq!(err.rule, Rule::MinItems(1));
    }

    #[test]
    fn test_missing_required_field_is_reported_first() {
        let mut value = serde_json::to_value(valid_resume()).unwrap();
        value.as_object_mut().unwrap().remove("job_title");
        value["experiences"] = json!([]);
        let err = validate_resume(&value).unwrap_err();
        assert_eq!(err.path, "job_title");
        assert_eq!(err.rule, Rule::Required);
    }

    #[test]
    fn test_optional_lists_may_be_absent() {
        let mut value = serde_json::to_value(valid_resume()).unwrap();
        let obj = value.as_object_mut().unwrap();
        obj.remove("education");
        obj.remove("languages");
        obj.remove("external_links");
        let resume = validate_resume(&value).unwrap();
        assert!(resume.education.is_empty());
        assert!(resume.languages.is_empty());
        assert!(resume.external_links.is_empty());
    }

    #[test]
    fn test_contact_information_is_optional() {
        let mut value = serde_json::to_value(valid_resume()).unwrap();
        value["contact_information"] = Value::Null;
        assert_eq!(validate_resume(&value).unwrap().contact_information, None);

        value.as_object_mut().unwrap().remove("contact_information");
        assert_eq!(validate_resume(&value).unwrap().contact_information, None);

        value["contact_information"] = json!({});
        assert_eq!(validate_resume(&value).unwrap().contact_information, None);
    }

    #[test]
    fn test_contact_information_must_be_an_object() {
        let mut value = serde_json::to_value(valid_resume()).unwrap();
        value["contact_information"] = json!("alice@example.com");
        let err = validate_resume(&value).unwrap_err();
        assert_eq!(err.path, "contact_information");
        assert_eq!(err.rule, Rule::Type { expected: "object" });
    }

    #[test]
    fn test_external_link_requires_url() {
        let mut value = serde_json::to_value(valid_resume()).unwrap();
        value["external_links"] = json!([{"label": "Portfolio"}]);
        let err = validate_resume(&value).unwrap_err();
        assert_eq!(err.path, "external_links[0].url");
        assert_eq!(err.rule, Rule::Required);
    }

    #[test]
    fn test_unknown_language_level_is_rejected() {
        let mut value = serde_json::to_value(valid_resume()).unwrap();
        value["languages"][0]["level"] = json!("fluent");
        let err = validate_resume(&value).unwrap_err();
        assert_eq!(err.path, "languages[0].level");
        assert_eq!(err.rule, Rule::OneOf(LanguageLevel::NAMES));
    }

    #[test]
    fn test_wrong_types_are_reported() {
        let mut value = serde_json::to_value(valid_resume()).unwrap();
        value["experiences"] = json!("not a list");
        let err = validate_resume(&value).unwrap_err();
        assert_eq!(err.rule, Rule::Type { expected: "array" });

        let err = validate_resume(&json!(["nope"])).unwrap_err();
        assert_eq!(err.path, "$");
    }

    #[test]
    fn test_cover_letter_applies_defaults_for_missing_lines() {
        let value = json!({
            "body": "This is a detailed cover letter body that well exceeds fifty characters."
        });
        let letter = validate_cover_letter(&value, &defaults()).unwrap();
        assert_eq!(letter.greeting, "Dear Hiring Manager,");
        assert_eq!(letter.signature, "Sincerely,\nAlice");
    }

    #[test]
    fn test_cover_letter_keeps_model_greeting() {
        let value = json!({
            "greeting": "Hello Acme team,",
            "body": "This is a detailed cover letter body that well exceeds fifty characters.",
            "signature": "Best,\nAlice"
        });
        let letter = validate_cover_letter(&value, &defaults()).unwrap();
        assert_eq!(letter.greeting, "Hello Acme team,");
        assert_eq!(letter.signature, "Best,\nAlice");
    }

    #[test]
    fn test_cover_letter_rejects_short_body() {
        let value = json!({"body": "Too short."});
        let err = validate_cover_letter(&value, &defaults()).unwrap_err();
        assert_eq!(err.path, "body");
        assert_eq!(err.rule, Rule::MinLength(MIN_COVER_BODY_CHARS));
    }

    #[test]
    fn test_cover_letter_requires_body() {
        let err = validate_cover_letter(&json!({"greeting": "Hi"}), &defaults()).unwrap_err();
        assert_eq!(err.path, "body");
        assert_eq!(err.rule, Rule::Required);
    }
}
