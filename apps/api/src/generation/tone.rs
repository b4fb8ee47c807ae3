//! Tone and language calibration for the generation prompts, plus the
//! per-language greeting/signature used when the model leaves them out.

use crate::models::request::{Language, Tone};
use crate::validation::validator::CoverLetterDefaults;

/// Phrasing instructions for one requested tone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ToneGuide {
    pub resume: &'static str,
    pub cover_letter: &'static str,
}

pub fn tone_guide(tone: Tone) -> ToneGuide {
    match tone {
        Tone::Profissional => ToneGuide {
            resume: "Use a formal, professional tone with industry-standard terminology.",
            cover_letter: "Use a formal, professional tone appropriate for corporate settings.",
        },
        Tone::Neutro => ToneGuide {
            resume: "Use a neutral, straightforward tone without embellishments.",
            cover_letter: "Use a neutral, straightforward tone without excessive formality.",
        },
        Tone::Criativo => ToneGuide {
            resume: "Use a creative, engaging tone that highlights personality.",
            cover_letter:
                "Use a warm, engaging tone that shows personality while remaining professional.",
        },
    }
}

pub fn default_greeting(language: Language) -> &'static str {
    match language {
        Language::PtBr => "Prezado(a) Recrutador(a),",
        Language::EnUs => "Dear Hiring Manager,",
    }
}

/// Closing line followed by the candidate name on its own line.
/// Without a name only the closing line is returned.
pub fn default_signature(language: Language, candidate_name: &str) -> String {
    let closing = match language {
        Language::PtBr => "Atenciosamente,",
        Language::EnUs => "Sincerely,",
    };
    let name = candidate_name.trim();
    if name.is_empty() {
        closing.to_string()
    } else {
        format!("{closing}\n{name}")
    }
}

pub fn cover_letter_defaults(language: Language, candidate_name: &str) -> CoverLetterDefaults {
    CoverLetterDefaults {
        greeting: default_greeting(language).to_string(),
        signature: default_signature(language, candidate_name),
    }
}
