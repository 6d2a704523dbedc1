//! The tailoring pipeline and its Axum handler.
//!
//! Flow: validate -> profile lookup -> posting classifier gate ->
//! experience years -> prompt -> model invoke (one reduced re-prompt on
//! truncation) -> sanitize -> assemble -> template render -> PDF render.

use axum::{
    extract::State,
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{info, warn};

use crate::errors::AppError;
use crate::generation::assembler::assemble;
use crate::generation::classifier::{classify, Decision};
use crate::generation::experience::years_of_experience;
use crate::generation::prompts::{build_resume_prompt, PromptOptions, RESUME_SYSTEM};
use crate::generation::sanitizer::sanitize;
use crate::llm_client::{
    ChatMessage, InvokeOptions, MessageContent, ModelInvoker, ModelResponse, PromptInput,
};
use crate::models::profile::Profile;
use crate::models::resume::ModelContent;
use crate::state::AppState;

/// Request body for POST /api/v1/resumes. Fields are optional at the serde
/// layer so each missing field gets its own 400 message.
#[derive(Debug, Deserialize)]
pub struct GenerateRequest {
    pub profile: Option<String>,
    pub jd: Option<String>,
    pub company: Option<String>,
    pub role: Option<String>,
}

/// POST /api/v1/resumes
///
/// Produces a tailored resume PDF for a stored profile and a job posting.
/// Returns the document as a single complete attachment response.
pub async fn handle_generate(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Response, AppError> {
    let profile_id = require_field(request.profile, "profile")?;
    let jd = require_field(request.jd, "jd")?;
    let company = require_field(request.company, "company")?;
    let role = require_field(request.role, "role")?;

    let profile = state
        .profiles
        .load(&profile_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("profile '{profile_id}' not found")))?;

    let classification = classify(&jd);
    if let Decision::Reject(reason) = classification.decision {
        info!("posting rejected for profile {profile_id}: {reason}");
        return Err(AppError::Rejected(reason));
    }

    let years = years_of_experience(&profile.experience, Utc::now());
    info!("tailoring resume for {profile_id}: {years} years of experience");

    let content = generate_content(state.llm.as_ref(), &profile, &jd, years).await?;

    let render_data = assemble(&profile, content);
    // The sanitizer guarantees the model-sourced fields; the experience list
    // comes from the profile and must be checked here.
    if render_data.experience.is_empty() {
        return Err(AppError::Incomplete(
            "profile has no work history entries to render".to_string(),
        ));
    }
    let markup = state.templates.render(&render_data)?;
    let pdf = state.pdf.render(&markup).await?;

    let filename = format!(
        "{}_{}_{}.pdf",
        sanitize_component(&render_data.name),
        sanitize_component(&company),
        sanitize_component(&role),
    );
    info!("generated {filename} ({} bytes)", pdf.len());

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        pdf,
    )
        .into_response())
}

/// Runs the model call and sanitization, with the one-shot truncation
/// fallback: a length-truncated response triggers a single re-invocation with
/// a reduced prompt before sanitizing.
async fn generate_content(
    llm: &dyn ModelInvoker,
    profile: &Profile,
    posting: &str,
    years: u32,
) -> Result<ModelContent, AppError> {
    let response = invoke_model(llm, profile, posting, years, &PromptOptions::default()).await?;

    let response = if response.is_truncated() {
        warn!(
            "model output truncated at {} output tokens; re-prompting with reduced budgets",
            response.usage.output_tokens
        );
        invoke_model(llm, profile, posting, years, &PromptOptions::reduced()).await?
    } else {
        response
    };

    Ok(sanitize(&response.text)?)
}

async fn invoke_model(
    llm: &dyn ModelInvoker,
    profile: &Profile,
    posting: &str,
    years: u32,
    options: &PromptOptions,
) -> Result<ModelResponse, AppError> {
    let prompt = build_resume_prompt(profile, posting, years, options);
    let input = PromptInput::Messages(vec![
        ChatMessage {
            role: "system".to_string(),
            content: MessageContent::Text(RESUME_SYSTEM.to_string()),
        },
        ChatMessage {
            role: "user".to_string(),
            content: MessageContent::Text(prompt),
        },
    ]);
    Ok(llm.invoke(input, InvokeOptions::default()).await?)
}

fn require_field(value: Option<String>, name: &str) -> Result<String, AppError> {
    value
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::Validation(format!("missing required field: {name}")))
}

/// Collapses non-alphanumeric runs to a single underscore and strips
/// leading/trailing underscores.
pub fn sanitize_component(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut pending_separator = false;
    for c in raw.chars() {
        if c.is_alphanumeric() {
            if pending_separator && !out.is_empty() {
                out.push('_');
            }
            pending_separator = false;
            out.push(c);
        } else {
            pending_separator = true;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_filename_component_sanitization() {
        assert_eq!(sanitize_component("O'Brien & Co."), "O_Brien_Co");
        assert_eq!(sanitize_component("  Acme  Corp  "), "Acme_Corp");
        assert_eq!(sanitize_component("___"), "");
        assert_eq!(sanitize_component("Plain"), "Plain");
        assert_eq!(sanitize_component("Rust/Backend (Senior)"), "Rust_Backend_Senior");
    }

    #[test]
    fn test_require_field_rejects_missing_and_blank() {
        assert!(require_field(None, "jd").is_err());
        assert!(require_field(Some("   ".to_string()), "jd").is_err());
        assert_eq!(require_field(Some("x".to_string()), "jd").unwrap(), "x");
    }

    #[test]
    fn test_missing_field_error_names_the_field() {
        let err = require_field(None, "company").unwrap_err();
        match err {
            AppError::Validation(message) => {
                assert!(message.contains("company"));
            }
            other => panic!("expected Validation, got {other:?}"),
        }
    }
}
