//! Prompt construction for resume tailoring.
//!
//! Templates are fixed constants with `{placeholder}` replacement; building a
//! prompt is deterministic and carries no runtime state.

use crate::models::profile::Profile;

/// System prompt — enforces JSON-only output.
pub const RESUME_SYSTEM: &str = "You are an expert resume writer and ATS optimization specialist. \
    Tailor resume content to a specific job posting using only facts from the \
    candidate record. \
    You MUST respond with valid JSON only. \
    Do NOT include any text outside the JSON object. \
    Do NOT use markdown code fences. \
    Do NOT include explanations or apologies.";

/// Tailoring prompt template.
/// Replace: {name}, {contact}, {years}, {experience_block}, {education_block},
///          {posting}, {max_bullets}, {max_skill_categories}
const RESUME_PROMPT_TEMPLATE: &str = r#"Tailor a resume for the candidate below to the target job posting.

CANDIDATE: {name}
CONTACT: {contact}
YEARS OF EXPERIENCE: {years}

WORK HISTORY (source of truth — keep this exact order, one output entry per index):
{experience_block}

EDUCATION:
{education_block}

TARGET JOB POSTING:
{posting}

Return a JSON object with this EXACT schema (no extra fields):
{
  "title": "Professional headline matched to the posting",
  "summary": "3-4 sentence professional summary",
  "skills": {
    "Category Name": ["skill", "skill"]
  },
  "experience": [
    {
      "title": "Role title for work history entry 0",
      "details": ["accomplishment bullet", "accomplishment bullet"]
    }
  ]
}

HARD RULES:
1. `experience` MUST have one entry per work history index, in the same order
2. At most {max_bullets} detail bullets per experience entry
3. At most {max_skill_categories} skill categories, ordered by relevance to the posting
4. Use keywords from the posting naturally where the candidate's record supports them — never invent facts
5. Quantify accomplishments where the record allows
6. Write for ATS parsing: standard section vocabulary, no tables, no special characters"#;

/// Bullet and category budgets for the tailoring prompt. The reduced variant
/// is used for the one-shot re-prompt after a length-truncated response.
#[derive(Debug, Clone)]
pub struct PromptOptions {
    pub max_bullets: usize,
    pub max_skill_categories: usize,
}

impl Default for PromptOptions {
    fn default() -> Self {
        Self {
            max_bullets: 5,
            max_skill_categories: 6,
        }
    }
}

impl PromptOptions {
    pub fn reduced() -> Self {
        Self {
            max_bullets: 3,
            max_skill_categories: 4,
        }
    }
}

/// Renders the tailoring prompt. Idempotent for identical inputs.
pub fn build_resume_prompt(
    profile: &Profile,
    posting: &str,
    years: u32,
    options: &PromptOptions,
) -> String {
    // Advertised figure runs one below the computed total.
    let adjusted_years = years.saturating_sub(1);

    let contact = [
        Some(profile.email.as_str()),
        profile.phone.as_deref(),
        profile.location.as_deref(),
        profile.linkedin.as_deref(),
        profile.website.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(" | ");

    let experience_block = if profile.experience.is_empty() {
        "(none)".to_string()
    } else {
        profile
            .experience
            .iter()
            .enumerate()
            .map(|(i, e)| {
                format!(
                    "{i}. {} — {} ({}) {} to {}",
                    e.company,
                    if e.title.is_empty() { "role unknown" } else { e.title.as_str() },
                    e.location.as_deref().unwrap_or("location unknown"),
                    e.start_date.as_deref().unwrap_or("?"),
                    e.end_date.as_deref().unwrap_or("?"),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let education_block = if profile.education.is_empty() {
        "(none)".to_string()
    } else {
        profile
            .education
            .iter()
            .map(|e| {
                format!(
                    "- {}, {}{}{}",
                    e.degree,
                    e.institution,
                    e.field
                        .as_deref()
                        .map(|f| format!(", {f}"))
                        .unwrap_or_default(),
                    e.graduation_year
                        .as_deref()
                        .map(|y| format!(" ({y})"))
                        .unwrap_or_default(),
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    RESUME_PROMPT_TEMPLATE
        .replace("{name}", &profile.name)
        .replace("{contact}", &contact)
        .replace("{years}", &adjusted_years.to_string())
        .replace("{experience_block}", &experience_block)
        .replace("{education_block}", &education_block)
        .replace("{posting}", posting)
        .replace("{max_bullets}", &options.max_bullets.to_string())
        .replace("{max_skill_categories}", &options.max_skill_categories.to_string())
}
