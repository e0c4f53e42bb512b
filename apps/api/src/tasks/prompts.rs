// Prompt templates for the application tasks.
// Reuses cross-cutting fragments from llm_client::prompts.

use crate::llm_client::prompts::{GROUNDING_INSTRUCTION, JSON_ONLY_INSTRUCTION};

/// Resume tailoring. Replace `{position}`, `{job_description}` and
/// `{resume_latex_code}` before sending.
pub const RESUME_PROMPT_TEMPLATE: &str = r#"You are an expert technical recruiter and LaTeX typesetter.
Rewrite the candidate's resume so it targets the position "{position}".

JOB DESCRIPTION:
{job_description}

CURRENT RESUME (LaTeX source):
{resume_latex_code}

Rules:
- Keep the document class, preamble and overall layout of the original.
- Reorder and reword existing bullets to surface the experience most relevant to the job.
- The result must be a complete LaTeX document that compiles with pdflatex.

Return a JSON object with this EXACT schema:
{"latex_code": "<the complete LaTeX document>"}"#;

/// Cover letter. Replace `{position}`, `{company}`, `{job_description}` and
/// `{resume_text}` before sending.
pub const COVER_LETTER_PROMPT_TEMPLATE: &str = r#"You are an experienced career coach writing a one-page cover letter.
The candidate is applying for "{position}" at {company}.

JOB DESCRIPTION:
{job_description}

CANDIDATE RESUME (plain text):
{resume_text}

Rules:
- Three to four short paragraphs, addressed to the hiring team at {company}.
- Connect two or three concrete achievements from the resume to the job requirements.
- The result must be a complete LaTeX document that compiles with pdflatex.

Return a JSON object with this EXACT schema:
{"latex_code": "<the complete LaTeX document>"}"#;

/// Application email. Replace `{position}`, `{company}`, `{job_description}`
/// and `{resume_text}` before sending.
pub const EMAIL_PROMPT_TEMPLATE: &str = r#"Write a concise job application email for the position "{position}" at {company}.
The resume is attached to the email; do not paste it.

JOB DESCRIPTION:
{job_description}

CANDIDATE RESUME (plain text):
{resume_text}

Rules:
- At most 150 words, professional and specific to the role.
- Body as simple HTML (<p>, <br>, <strong> only), signed with the candidate's name from the resume.

Return a JSON object with this EXACT schema:
{"email_subject": "<subject line>", "html_code": "<html body>"}"#;

fn finish(prompt: String) -> String {
    format!("{prompt}\n\n{GROUNDING_INSTRUCTION}\n{JSON_ONLY_INSTRUCTION}")
}

pub fn resume_prompt(position: &str, job_description: &str, resume_latex: &str) -> String {
    finish(
        RESUME_PROMPT_TEMPLATE
            .replace("{position}", position)
            .replace("{job_description}", job_description)
            .replace("{resume_latex_code}", resume_latex),
    )
}

pub fn cover_letter_prompt(
    position: &str,
    company: &str,
    job_description: &str,
    resume_text: &str,
) -> String {
    finish(
        COVER_LETTER_PROMPT_TEMPLATE
            .replace("{position}", position)
            .replace("{company}", company)
            .replace("{job_description}", job_description)
            .replace("{resume_text}", resume_text),
    )
}

pub fn email_prompt(
    position: &str,
    company: &str,
    job_description: &str,
    resume_text: &str,
) -> String {
    finish(
        EMAIL_PROMPT_TEMPLATE
            .replace("{position}", position)
            .replace("{company}", company)
            .replace("{job_description}", job_description)
            .replace("{resume_text}", resume_text),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resume_prompt_fills_every_placeholder() {
        let prompt = resume_prompt("Backend Engineer", "Rust, Postgres", "\\section{Experience}");
        assert!(prompt.contains("\"Backend Engineer\""));
        assert!(prompt.contains("Rust, Postgres"));
        assert!(prompt.contains("\\section{Experience}"));
        assert!(!prompt.contains("{position}"));
        assert!(prompt.contains("\"latex_code\""));
        assert!(prompt.ends_with(JSON_ONLY_INSTRUCTION));
    }

    #[test]
    fn test_email_prompt_asks_for_subject_and_html() {
        let prompt = email_prompt("SRE", "Acme", "on-call", "Jane Doe");
        assert!(prompt.contains("at Acme"));
        assert!(prompt.contains("\"email_subject\""));
        assert!(prompt.contains("\"html_code\""));
        assert!(!prompt.contains("{resume_text}"));
    }
}
