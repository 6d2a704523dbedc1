//! Response sanitizer — turns unreliable free-text model output into a
//! validated `ModelContent`.
//!
//! Pipeline: refusal check -> artifact stripping -> JSON extraction ->
//! parse with a single repair fallback -> required-field validation.
//! Two parse attempts maximum; on double failure the original parse error is
//! surfaced together with the repair failure.

use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::models::resume::ModelContent;

const REFUSAL_PREFIXES: &[&str] = &["i'm sorry", "i cannot", "i apologize"];

/// Checked longest-first so "here is the json" wins over "here is".
const PREFATORY_PHRASES: &[&str] = &["here is the json", "the json is", "here is", "here's", "this is"];

const REQUIRED_FIELDS: &[&str] = &["title", "summary", "skills", "experience"];

#[derive(Debug, Error)]
pub enum SanitizeError {
    #[error("model refused the request: {0}")]
    Refusal(String),

    #[error("no JSON object found in model output")]
    NoJson,

    #[error("failed to parse model output: {original} (repair attempt also failed: {repair})")]
    Unparseable {
        original: serde_json::Error,
        repair: serde_json::Error,
    },

    #[error("model output missing required fields {missing:?} (fields present: {present:?})")]
    MissingFields {
        missing: Vec<String>,
        present: Vec<String>,
    },

    #[error("model output did not match the expected shape: {0}")]
    Shape(#[from] serde_json::Error),
}

/// Sanitizes raw model output into validated structured content.
/// Pure transform; logging only at stage boundaries.
pub fn sanitize(raw: &str) -> Result<ModelContent, SanitizeError> {
    let trimmed = raw.trim();

    let lower = trimmed.to_lowercase();
    for prefix in REFUSAL_PREFIXES {
        if lower.starts_with(prefix) {
            let excerpt: String = trimmed.chars().take(120).collect();
            return Err(SanitizeError::Refusal(excerpt));
        }
    }

    let cleaned = strip_artifacts(trimmed);
    let json_slice = extract_json(&cleaned)?;

    let value = match serde_json::from_str::<Value>(json_slice) {
        Ok(value) => value,
        Err(original) => {
            debug!("direct parse failed ({original}); attempting repair pass");
            let repaired = escape_inner_quotes(&strip_trailing_commas(json_slice));
            match serde_json::from_str::<Value>(&repaired) {
                Ok(value) => {
                    debug!("repair pass recovered a parseable object");
                    value
                }
                Err(repair) => return Err(SanitizeError::Unparseable { original, repair }),
            }
        }
    };

    validate_required_fields(&value)?;

    Ok(serde_json::from_value(value)?)
}

/// Removes markdown code-fence lines and leading prefatory phrases.
fn strip_artifacts(text: &str) -> String {
    let without_fences = text
        .lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n");

    let mut out = without_fences.trim().to_string();
    loop {
        let lower = out.to_lowercase();
        let Some(phrase) = PREFATORY_PHRASES.iter().find(|p| lower.starts_with(**p)) else {
            break;
        };
        out = out[phrase.len()..]
            .trim_start_matches([':', ' ', '\t', '\n'])
            .to_string();
    }
    out
}

/// Slices from the first `{` to the last `}` inclusive.
fn extract_json(text: &str) -> Result<&str, SanitizeError> {
    let start = text.find('{').ok_or(SanitizeError::NoJson)?;
    let end = text.rfind('}').ok_or(SanitizeError::NoJson)?;
    if end < start {
        return Err(SanitizeError::NoJson);
    }
    Ok(&text[start..=end])
}

/// Drops commas that directly precede a closing bracket. String contents are
/// left untouched.
fn strip_trailing_commas(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len());
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            out.push(c);
            continue;
        }

        match c {
            '"' => {
                in_string = true;
                out.push(c);
            }
            ',' => {
                let mut j = i + 1;
                while j < chars.len() && chars[j].is_whitespace() {
                    j += 1;
                }
                let dangling = j < chars.len() && (chars[j] == '}' || chars[j] == ']');
                if !dangling {
                    out.push(c);
                }
            }
            _ => out.push(c),
        }
    }
    out
}

/// Best-effort single pass over string values: a quote that is not followed
/// (ignoring whitespace) by a structural character is treated as an unescaped
/// inner quote and escaped. Approximate by design — one pass, no loops.
fn escape_inner_quotes(json: &str) -> String {
    let chars: Vec<char> = json.chars().collect();
    let mut out = String::with_capacity(json.len() + 8);
    let mut in_string = false;
    let mut escaped = false;

    for (i, &c) in chars.iter().enumerate() {
        if !in_string {
            if c == '"' {
                in_string = true;
            }
            out.push(c);
            continue;
        }

        if escaped {
            escaped = false;
            out.push(c);
            continue;
        }
        if c == '\\' {
            escaped = true;
            out.push(c);
            continue;
        }
        if c == '"' {
            let mut j = i + 1;
            while j < chars.len() && chars[j].is_whitespace() {
                j += 1;
            }
            let closes = j >= chars.len() || matches!(chars[j], ',' | '}' | ']' | ':');
            if closes {
                in_string = false;
                out.push(c);
            } else {
                out.push('\\');
                out.push('"');
            }
        } else {
            out.push(c);
        }
    }
    out
}

/// Every required field must be present and non-empty. The error names the
/// fields that WERE present so failures are diagnosable from logs alone.
fn validate_required_fields(value: &Value) -> Result<(), SanitizeError> {
    let Some(obj) = value.as_object() else {
        return Err(SanitizeError::MissingFields {
            missing: REQUIRED_FIELDS.iter().map(|f| f.to_string()).collect(),
            present: vec![],
        });
    };

    let missing: Vec<String> = REQUIRED_FIELDS
        .iter()
        .copied()
        .filter(|field| !is_populated(obj.get(*field)))
        .map(str::to_string)
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(SanitizeError::MissingFields {
            missing,
            present: obj.keys().cloned().collect(),
        })
    }
}

fn is_populated(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
        Some(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WELL_FORMED: &str = r#"{
        "title": "Senior Rust Engineer",
        "summary": "Ten years of backend and systems work.",
        "skills": {"Languages": ["Rust", "Go"], "Infrastructure": ["Kubernetes"]},
        "experience": [
            {"title": "Staff Engineer", "details": ["Led platform rewrite"]},
            {"title": "Engineer", "details": ["Built billing pipeline"]}
        ]
    }"#;

    #[test]
    fn test_fenced_and_prefixed_output_round_trips() {
        let wrapped = format!("Here is the JSON:\n```json\n{WELL_FORMED}\n```");
        let content = sanitize(&wrapped).unwrap();
        assert_eq!(content.title, "Senior Rust Engineer");
        assert_eq!(content.experience.len(), 2);
        let expected: ModelContent = serde_json::from_str(WELL_FORMED).unwrap();
        assert_eq!(
            serde_json::to_value(&content).unwrap(),
            serde_json::to_value(&expected).unwrap()
        );
    }

    #[test]
    fn test_bare_fence_markers_are_stripped() {
        let wrapped = format!("```\n{WELL_FORMED}\n```");
        assert!(sanitize(&wrapped).is_ok());
    }

    #[test]
    fn test_trailing_comma_is_repaired() {
        let broken = r#"{
            "title": "Engineer",
            "summary": "Summary.",
            "skills": {"Languages": ["Rust",]},
            "experience": [{"title": "Engineer", "details": ["Did work"]}],
        }"#;
        let content = sanitize(broken).unwrap();
        assert_eq!(content.skills["Languages"], vec!["Rust"]);
    }

    #[test]
    fn test_unescaped_inner_quotes_are_repaired() {
        let broken = r#"{
            "title": "Senior "Rust" Engineer",
            "summary": "Summary.",
            "skills": {"Languages": ["Rust"]},
            "experience": [{"title": "Engineer", "details": ["Did work"]}]
        }"#;
        let content = sanitize(broken).unwrap();
        assert_eq!(content.title, r#"Senior "Rust" Engineer"#);
    }

    #[test]
    fn test_refusal_fails_fast_before_any_parse() {
        let err = sanitize("I'm sorry, but I can't help with that {\"title\": 1}").unwrap_err();
        assert!(matches!(err, SanitizeError::Refusal(_)));

        let err = sanitize("I cannot produce this resume.").unwrap_err();
        assert!(matches!(err, SanitizeError::Refusal(_)));
    }

    #[test]
    fn test_no_braces_yields_no_json_error() {
        let err = sanitize("The model returned prose with no object at all").unwrap_err();
        assert!(matches!(err, SanitizeError::NoJson));
    }

    #[test]
    fn test_reversed_braces_yield_no_json_error() {
        let err = sanitize("} nothing here {").unwrap_err();
        assert!(matches!(err, SanitizeError::NoJson));
    }

    #[test]
    fn test_unrepairable_output_surfaces_both_errors() {
        let err = sanitize("{ definitely not json at all }").unwrap_err();
        match err {
            SanitizeError::Unparseable { .. } => {}
            other => panic!("expected Unparseable, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_fields_error_names_present_keys() {
        let partial = r#"{"title": "Engineer", "summary": "Something"}"#;
        let err = sanitize(partial).unwrap_err();
        match err {
            SanitizeError::MissingFields { missing, present } => {
                assert_eq!(missing, vec!["skills", "experience"]);
                assert!(present.contains(&"title".to_string()));
                assert!(present.contains(&"summary".to_string()));
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_required_field_counts_as_missing() {
        let hollow = r#"{
            "title": "",
            "summary": "Summary.",
            "skills": {},
            "experience": [{"title": "Engineer", "details": []}]
        }"#;
        let err = sanitize(hollow).unwrap_err();
        match err {
            SanitizeError::MissingFields { missing, .. } => {
                assert_eq!(missing, vec!["title", "skills"]);
            }
            other => panic!("expected MissingFields, got {other:?}"),
        }
    }

    #[test]
    fn test_strip_trailing_commas_leaves_string_contents_alone() {
        let input = r#"{"a": "x,}", "b": [1, 2,]}"#;
        let repaired = strip_trailing_commas(input);
        assert_eq!(repaired, r#"{"a": "x,}", "b": [1, 2]}"#);
    }

    #[test]
    fn test_escape_pass_ignores_already_escaped_quotes() {
        let input = r#"{"a": "he said \"hi\""}"#;
        assert_eq!(escape_inner_quotes(input), input);
    }

    #[test]
    fn test_extract_json_slices_between_outermost_braces() {
        let text = "noise before {\"a\": 1} noise after";
        assert_eq!(extract_json(text).unwrap(), "{\"a\": 1}");
    }
}
