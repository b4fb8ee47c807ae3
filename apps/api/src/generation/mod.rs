// Generation pipeline: extract -> generate_resume -> generate_cover_letter.
// Each stage renders a prompt, calls the model through llm_client, then
// sanitizes and validates the output before the next stage sees it.

use std::fmt;

use serde::Serialize;

pub mod extraction;
pub mod handlers;
pub mod pipeline;
pub mod prompts;
pub mod templates;
pub mod tone;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Extract,
    GenerateResume,
    GenerateCoverLetter,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Extract => "extract",
            Stage::GenerateResume => "generate_resume",
            Stage::GenerateCoverLetter => "generate_cover_letter",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
