//! Posting classifier — keyword gate applied before any model call.
//!
//! Classifies a job posting by work arrangement and seniority signals and
//! decides whether to proceed. Matching is case-insensitive substring search;
//! precedence is strict: hybrid preempts everything, remote vetoes onsite,
//! and entry-level/internship only fire when exactly one of them matches.

use serde::Serialize;
use tracing::debug;

const HYBRID_PHRASES: &[&str] = &[
    "hybrid",
    "days in office",
    "days per week in office",
    "days in the office",
    "split between home and office",
];

const ONSITE_PHRASES: &[&str] = &[
    "on-site",
    "onsite",
    "on site",
    "in-office",
    "in office",
    "in person",
    "in-person",
    "must relocate",
    "relocation required",
    "local candidates",
];

const REMOTE_PHRASES: &[&str] = &[
    "remote",
    "work from home",
    "work-from-home",
    "100% remote",
    "fully remote",
    "distributed team",
    "work from anywhere",
];

const ENTRY_LEVEL_PHRASES: &[&str] = &[
    "entry level",
    "entry-level",
    "junior role",
    "junior position",
    "junior engineer",
    "early career",
    "new grad",
    "recent graduate",
];

const INTERNSHIP_PHRASES: &[&str] = &[
    "internship",
    "intern role",
    "intern position",
    "summer intern",
    "fall intern",
    "spring intern",
];

/// Why a posting was rejected. Serialized as the `locationType` field of the
/// rejection response body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RejectionReason {
    #[serde(rename = "hybrid")]
    Hybrid,
    #[serde(rename = "onsite")]
    Onsite,
    #[serde(rename = "entry-level")]
    EntryLevel,
}

impl RejectionReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectionReason::Hybrid => "hybrid",
            RejectionReason::Onsite => "onsite",
            RejectionReason::EntryLevel => "entry-level",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            RejectionReason::Hybrid => "This position requires a hybrid work arrangement",
            RejectionReason::Onsite => "This position requires on-site work",
            RejectionReason::EntryLevel => {
                "This position is for entry-level or intern candidates"
            }
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Proceed,
    Reject(RejectionReason),
}

#[derive(Debug, Clone)]
pub struct Classification {
    pub is_hybrid: bool,
    pub is_onsite: bool,
    pub is_remote: bool,
    pub is_entry_level: bool,
    pub is_intern: bool,
    pub decision: Decision,
}

fn matches_any(haystack: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| haystack.contains(p))
}

/// Classifies a posting. Pure; never fails — always returns a classification.
pub fn classify(posting: &str) -> Classification {
    let folded = posting.to_lowercase();

    let is_hybrid = matches_any(&folded, HYBRID_PHRASES);
    let is_onsite = matches_any(&folded, ONSITE_PHRASES);
    let is_remote = matches_any(&folded, REMOTE_PHRASES);
    let is_entry_level = matches_any(&folded, ENTRY_LEVEL_PHRASES);
    let is_intern = matches_any(&folded, INTERNSHIP_PHRASES);

    let decision = if is_hybrid {
        Decision::Reject(RejectionReason::Hybrid)
    } else if is_onsite && !is_remote {
        Decision::Reject(RejectionReason::Onsite)
    } else if is_entry_level ^ is_intern {
        // When both seniority signals match, neither fires.
        Decision::Reject(RejectionReason::EntryLevel)
    } else {
        Decision::Proceed
    };

    debug!(
        "classified posting: hybrid={is_hybrid} onsite={is_onsite} remote={is_remote} \
         entry_level={is_entry_level} intern={is_intern} decision={decision:?}"
    );

    Classification {
        is_hybrid,
        is_onsite,
        is_remote,
        is_entry_level,
        is_intern,
        decision,
    }
}
