// Prompt for the diagnostic reasoning service.

/// Diagnostic prompt. Replace `{task}` and `{error}` before sending.
///
/// The reply is matched verbatim (after trim + lowercase) against the phrase
/// table in `decision.rs`; keep the two lists in sync.
pub const DIAGNOSTIC_PROMPT_TEMPLATE: &str = r#"You are the recovery controller for a document-generation service.
A call to the text-generation backend used by the task "{task}" has failed.

ERROR:
{error}

Choose exactly ONE remediation from this list:
- switch connector   → move the task to the next backend provider in its fallback order
- switch config      → use the alternate endpoint, API token AND model of the current provider
- switch model       → use the alternate model of the current provider
- switch token       → use the alternate API token of the current provider
- switch url         → use the alternate endpoint URL of the current provider
- retry after delay  → wait and try again unchanged (transient errors, rate limits, timeouts)

Guidance:
- 401/403, "invalid api key", "unauthorized" → switch token
- "model not found", "does not exist", unsupported model → switch model
- DNS failures, connection refused, 404 on the endpoint → switch url
- 429, 503, timeouts → retry after delay
- provider outage or repeated 5xx → switch connector

Respond with the remediation phrase ONLY, exactly as written above, with no punctuation or explanation."#;
