//! Resume markup rendering with a single-owner template cache.
//!
//! The template source is loaded lazily on first use and re-read only when
//! the file's modification time changes. With no file configured, the
//! built-in template is used. Safe to share across requests; constructible
//! directly in tests.

use std::path::PathBuf;
use std::sync::RwLock;
use std::time::SystemTime;

use tracing::{info, warn};

use crate::models::resume::RenderData;
use crate::render::RenderError;

const BUILTIN_TEMPLATE: &str = r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<style>
  body { font-family: Georgia, serif; margin: 0 48px; color: #1a1a1a; }
  h1 { font-size: 24px; margin-bottom: 0; }
  h2 { font-size: 14px; text-transform: uppercase; letter-spacing: 1px;
       border-bottom: 1px solid #888; padding-bottom: 2px; margin-top: 18px; }
  .contact { font-size: 11px; color: #444; margin-bottom: 8px; }
  .headline { font-size: 14px; font-style: italic; margin-top: 2px; }
  .entry-header { display: flex; justify-content: space-between; font-weight: bold; }
  .dates { font-weight: normal; color: #555; }
  ul { margin: 4px 0 10px 18px; padding: 0; }
  li, p, .skill-row { font-size: 12px; line-height: 1.4; }
</style>
</head>
<body>
  <h1>{{name}}</h1>
  <div class="headline">{{title}}</div>
  <div class="contact">{{contact}}</div>
  <h2>Summary</h2>
  <p>{{summary}}</p>
  <h2>Skills</h2>
  {{skills}}
  <h2>Experience</h2>
  {{experience}}
  <h2>Education</h2>
  {{education}}
</body>
</html>
"#;

struct CachedTemplate {
    source: String,
    modified: SystemTime,
}

pub struct TemplateCache {
    path: Option<PathBuf>,
    cached: RwLock<Option<CachedTemplate>>,
}

impl TemplateCache {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            cached: RwLock::new(None),
        }
    }

    /// Returns the template source, re-reading the file only when its
    /// modification time differs from the cached copy.
    fn source(&self) -> String {
        let Some(path) = &self.path else {
            return BUILTIN_TEMPLATE.to_string();
        };

        let modified = match std::fs::metadata(path).and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(e) => {
                warn!(
                    "template file {} unreadable ({e}); using built-in template",
                    path.display()
                );
                return BUILTIN_TEMPLATE.to_string();
            }
        };

        if let Ok(guard) = self.cached.read() {
            if let Some(cached) = guard.as_ref() {
                if cached.modified == modified {
                    return cached.source.clone();
                }
            }
        }

        match std::fs::read_to_string(path) {
            Ok(source) => {
                info!("template loaded from {}", path.display());
                if let Ok(mut guard) = self.cached.write() {
                    *guard = Some(CachedTemplate {
                        source: source.clone(),
                        modified,
                    });
                }
                source
            }
            Err(e) => {
                warn!(
                    "failed to read template {} ({e}); using built-in template",
                    path.display()
                );
                BUILTIN_TEMPLATE.to_string()
            }
        }
    }

    /// Renders `RenderData` into HTML markup.
    pub fn render(&self, data: &RenderData) -> Result<String, RenderError> {
        let contact = [
            Some(data.email.as_str()),
            data.phone.as_deref(),
            data.location.as_deref(),
            data.linkedin.as_deref(),
            data.website.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(escape_html)
        .collect::<Vec<_>>()
        .join(" | ");

        let mut skills = String::new();
        for (category, items) in &data.skills {
            let items = items.iter().map(|s| escape_html(s)).collect::<Vec<_>>();
            skills.push_str(&format!(
                "<div class=\"skill-row\"><strong>{}:</strong> {}</div>\n",
                escape_html(category),
                items.join(", ")
            ));
        }

        let mut experience = String::new();
        for entry in &data.experience {
            let place = match entry.location.as_deref() {
                Some(location) => format!("{}, {}", entry.company, location),
                None => entry.company.clone(),
            };
            experience.push_str(&format!(
                "<div class=\"entry-header\"><span>{} — {}</span><span class=\"dates\">{} – {}</span></div>\n",
                escape_html(&entry.title),
                escape_html(&place),
                escape_html(&entry.start_date),
                escape_html(&entry.end_date),
            ));
            if !entry.details.is_empty() {
                experience.push_str("<ul>\n");
                for detail in &entry.details {
                    experience.push_str(&format!("<li>{}</li>\n", escape_html(detail)));
                }
                experience.push_str("</ul>\n");
            }
        }

        let mut education = String::new();
        for entry in &data.education {
            education.push_str(&format!(
                "<p><strong>{}</strong>, {}{}</p>\n",
                escape_html(&entry.degree),
                escape_html(&entry.institution),
                entry
                    .graduation_year
                    .as_deref()
                    .map(|y| format!(" ({})", escape_html(y)))
                    .unwrap_or_default(),
            ));
        }

        Ok(self
            .source()
            .replace("{{name}}", &escape_html(&data.name))
            .replace("{{title}}", &escape_html(&data.title))
            .replace("{{contact}}", &contact)
            .replace("{{summary}}", &escape_html(&data.summary))
            .replace("{{skills}}", &skills)
            .replace("{{experience}}", &experience)
            .replace("{{education}}", &education))
    }
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
