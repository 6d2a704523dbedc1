//! Structured resume content: what the model must return, and the merged
//! payload handed to the template renderer.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::models::profile::Education;

/// The structured object the language model is instructed to return.
///
/// `experience` is interpreted strictly by position against
/// `Profile.experience` — entry `i` describes the candidate's role `i`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelContent {
    pub title: String,
    pub summary: String,
    /// Category -> ordered skill list. Category order is preserved as emitted.
    pub skills: IndexMap<String, Vec<String>>,
    pub experience: Vec<ExperienceContent>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperienceContent {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub details: Vec<String>,
}

/// Final merge of profile ground truth and model copy, consumed by the
/// template renderer.
#[derive(Debug, Clone, Serialize)]
pub struct RenderData {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub linkedin: Option<String>,
    pub website: Option<String>,
    pub title: String,
    pub summary: String,
    pub skills: IndexMap<String, Vec<String>>,
    pub experience: Vec<RenderedExperience>,
    pub education: Vec<Education>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderedExperience {
    pub company: String,
    pub title: String,
    pub location: Option<String>,
    pub start_date: String,
    pub end_date: String,
    pub details: Vec<String>,
}
