//! Prompt Template Renderer: fills the stage templates with request data.

use crate::generation::extraction::{CoverLetterInputs, ExtractedPayload};
use crate::generation::prompts::{
    COVER_LETTER_SYSTEM, COVER_LETTER_USER, EXTRACT_SYSTEM, EXTRACT_USER, RESUME_SYSTEM,
    RESUME_USER,
};
use crate::generation::tone::tone_guide;
use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_SYSTEM};
use crate::llm_client::PromptPayload;
use crate::models::request::GenerateRequest;
use crate::models::resume::COVER_BODY_TARGET_WORDS;

/// Sampling temperature per stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageTemperatures {
    pub extract: f32,
    pub resume: f32,
    pub cover_letter: f32,
}

impl Default for StageTemperatures {
    fn default() -> Self {
        Self {
            extract: 0.3,
            resume: 0.5,
            cover_letter: 0.7,
        }
    }
}

/// Replaces every `{key}` that has a value in `vars`, scanning the template
/// once. Substituted text is never rescanned, so user input containing
/// `{...}` comes through verbatim. Unknown placeholders are left as-is.
pub fn render_template(template: &str, vars: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];

        let replacement = after.find('}').and_then(|close| {
            let key = &after[..close];
            vars.iter()
                .find(|(name, _)| *name == key)
                .map(|(_, value)| (*value, close))
        });

        match replacement {
            Some((value, close)) => {
                out.push_str(value);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

pub fn extraction_prompt(request: &GenerateRequest, temperature: f32) -> PromptPayload {
    PromptPayload {
        system: render_template(
            EXTRACT_SYSTEM,
            &[
                ("grounding", GROUNDING_INSTRUCTION),
                ("json_only", JSON_ONLY_SYSTEM),
            ],
        ),
        user: render_template(
            EXTRACT_USER,
            &[
                ("language", request.language.code()),
                ("candidate_text", request.candidate_text.as_str()),
                ("job_text", request.job_text.as_str()),
            ],
        ),
        temperature,
    }
}

pub fn resume_prompt(
    request: &GenerateRequest,
    extracted: &ExtractedPayload,
    temperature: f32,
) -> PromptPayload {
    let extracted_json = extracted.to_pretty_json();
    PromptPayload {
        system: render_template(
            RESUME_SYSTEM,
            &[
                ("tone_instruction", tone_guide(request.tone).resume),
                ("grounding", GROUNDING_INSTRUCTION),
                ("json_only", JSON_ONLY_SYSTEM),
            ],
        ),
        user: render_template(
            RESUME_USER,
            &[
                ("language", request.language.code()),
                ("extracted_json", extracted_json.as_str()),
                ("job_text", request.job_text.as_str()),
            ],
        ),
        temperature,
    }
}

pub fn cover_letter_prompt(
    request: &GenerateRequest,
    inputs: &CoverLetterInputs,
    temperature: f32,
) -> PromptPayload {
    let (min_words, max_words) = COVER_BODY_TARGET_WORDS;
    let (min_words, max_words) = (min_words.to_string(), max_words.to_string());
    PromptPayload {
        system: render_template(
            COVER_LETTER_SYSTEM,
            &[
                ("tone_instruction", tone_guide(request.tone).cover_letter),
                ("min_words", min_words.as_str()),
                ("max_words", max_words.as_str()),
                ("json_only", JSON_ONLY_SYSTEM),
            ],
        ),
        user: render_template(
            COVER_LETTER_USER,
            &[
                ("language", request.language.code()),
                ("candidate_name", inputs.candidate_name.as_str()),
                ("job_title", inputs.job_title.as_str()),
                ("candidate_summary", inputs.summary.as_str()),
                ("job_text", request.job_text.as_str()),
            ],
        ),
        temperature,
    }
}
