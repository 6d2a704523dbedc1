//! Resume assembler — positional merge of profile ground truth with model copy.

use crate::models::profile::Profile;
use crate::models::resume::{ModelContent, RenderData, RenderedExperience};

const FALLBACK_TITLE: &str = "Professional Experience";

/// Merges `profile.experience[i]` with `content.experience[i]` by position.
///
/// Company, location, and dates always come from the profile. The role title
/// prefers the profile's own, then the model's, then a generic placeholder.
/// A profile entry with no positional model counterpart gets empty details.
pub fn assemble(profile: &Profile, content: ModelContent) -> RenderData {
    let experience = profile
        .experience
        .iter()
        .enumerate()
        .map(|(i, entry)| {
            let model_entry = content.experience.get(i);

            let title = if !entry.title.trim().is_empty() {
                entry.title.clone()
            } else {
                model_entry
                    .and_then(|m| m.title.clone())
                    .filter(|t| !t.trim().is_empty())
                    .unwrap_or_else(|| FALLBACK_TITLE.to_string())
            };

            RenderedExperience {
                company: entry.company.clone(),
                title,
                location: entry.location.clone(),
                start_date: entry.start_date.clone().unwrap_or_default(),
                end_date: entry.end_date.clone().unwrap_or_default(),
                details: model_entry.map(|m| m.details.clone()).unwrap_or_default(),
            }
        })
        .collect();

    RenderData {
        name: profile.name.clone(),
        email: profile.email.clone(),
        phone: profile.phone.clone(),
        location: profile.location.clone(),
        linkedin: profile.linkedin.clone(),
        website: profile.website.clone(),
        title: content.title,
        summary: content.summary,
        skills: content.skills,
        experience,
        education: profile.education.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::profile::Experience;
    use crate::models::resume::ExperienceContent;
    use indexmap::IndexMap;

    fn profile() -> Profile {
        Profile {
            name: "Jordan Smith".to_string(),
            email: "jordan@example.com".to_string(),
            phone: None,
            location: None,
            linkedin: None,
            website: None,
            experience: vec![
                Experience {
                    company: "Acme Corp".to_string(),
                    title: "Staff Engineer".to_string(),
                    location: Some("Remote".to_string()),
                    start_date: Some("01/2015".to_string()),
                    end_date: Some("Present".to_string()),
                },
                Experience {
                    company: "Initech".to_string(),
                    title: "".to_string(),
                    location: None,
                    start_date: Some("06/2012".to_string()),
                    end_date: Some("12/2014".to_string()),
                },
                Experience {
                    company: "Globex".to_string(),
                    title: "".to_string(),
                    location: None,
                    start_date: None,
                    end_date: None,
                },
            ],
            education: vec![],
        }
    }

    fn content() -> ModelContent {
        let mut skills = IndexMap::new();
        skills.insert("Languages".to_string(), vec!["Rust".to_string()]);
        ModelContent {
            title: "Senior Rust Engineer".to_string(),
            summary: "Summary.".to_string(),
            skills,
            experience: vec![
                ExperienceContent {
                    title: Some("Platform Lead".to_string()),
                    details: vec!["Rebuilt the platform".to_string()],
                },
                ExperienceContent {
                    title: Some("Backend Engineer".to_string()),
                    details: vec!["Shipped billing".to_string()],
                },
            ],
        }
    }

    #[test]
    fn test_profile_title_wins_over_model_title() {
        let data = assemble(&profile(), content());
        assert_eq!(data.experience[0].title, "Staff Engineer");
        assert_eq!(data.experience[0].details, vec!["Rebuilt the platform"]);
    }

    #[test]
    fn test_model_title_fills_empty_profile_title() {
        let data = assemble(&profile(), content());
        assert_eq!(data.experience[1].title, "Backend Engineer");
    }

    #[test]
    fn test_placeholder_when_no_title_anywhere() {
        let data = assemble(&profile(), content());
        // Third profile entry has no model counterpart and no own title.
        assert_eq!(data.experience[2].title, FALLBACK_TITLE);
        assert!(data.experience[2].details.is_empty());
    }

    #[test]
    fn test_profile_fields_are_ground_truth() {
        let data = assemble(&profile(), content());
        assert_eq!(data.experience[0].company, "Acme Corp");
        assert_eq!(data.experience[0].start_date, "01/2015");
        assert_eq!(data.experience[0].end_date, "Present");
        assert_eq!(data.experience[0].location.as_deref(), Some("Remote"));
        assert_eq!(data.name, "Jordan Smith");
    }

    #[test]
    fn test_model_identity_fields_carry_over() {
        let data = assemble(&profile(), content());
        assert_eq!(data.title, "Senior Rust Engineer");
        assert_eq!(data.summary, "Summary.");
        assert_eq!(data.skills["Languages"], vec!["Rust"]);
    }
}
