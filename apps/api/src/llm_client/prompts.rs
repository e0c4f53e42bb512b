// Cross-cutting prompt fragments shared by the task prompts.
// Each module that talks to an LLM keeps its own prompts.rs alongside it.

/// Appended to every generation prompt whose reply is parsed as JSON.
pub const JSON_ONLY_INSTRUCTION: &str = "\
    You MUST respond with a single valid JSON object only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Keeps generated documents factual.
pub const GROUNDING_INSTRUCTION: &str = "\
    CRITICAL: Use only facts present in the candidate material provided. \
    Do NOT invent employers, dates, degrees, metrics or skills. \
    If the material does not support a claim, omit it.";
