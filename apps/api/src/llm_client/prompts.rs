// Shared prompt fragments.
// Each stage's own prompt text lives in generation/prompts.rs.
// This file contains cross-cutting fragments appended to every system prompt.

/// System prompt fragment that enforces JSON-only output.
pub const JSON_ONLY_SYSTEM: &str = "You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Instruction against invented content.
pub const GROUNDING_INSTRUCTION: &str = "\
    Use ONLY information present in the candidate text. \
    Do NOT invent employers, dates, degrees, certifications or metrics. \
    If a detail is not in the source, omit it.";
