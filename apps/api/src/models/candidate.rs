//! Candidate records as handed over by the screening collaborator.
//!
//! The wire shape (`CandidateWire`) is lenient: the collaborator's scoring step is an
//! LLM call and occasionally returns nulls, numeric strings, or drops fields entirely.
//! `Candidate::from_wire` turns it into the strict record every other module works with.
//! One malformed record never blocks the rest of the batch.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use tracing::warn;

/// Name shown when the collaborator could not extract one.
pub const UNKNOWN_NAME: &str = "Unknown";

// ────────────────────────────────────────────────────────────────────────────
// Identifier
// ────────────────────────────────────────────────────────────────────────────

/// Opaque, session-unique candidate identifier (the collaborator's `resume_id`).
///
/// The collaborator issues integers; the engine never does arithmetic on them, so both
/// JSON numbers and strings are accepted and held as text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct CandidateId(String);

impl CandidateId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.trim().to_string())),
            _ => None,
        }
    }
}

impl fmt::Display for CandidateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for CandidateId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        Self::from_value(&value)
            .ok_or_else(|| de::Error::custom("candidate id must be a number or non-empty string"))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Recommendation
// ────────────────────────────────────────────────────────────────────────────

/// Screening verdict. Closed set plus an explicit fallback for anything the
/// collaborator emits outside it ("Needs Review", "Needs Manual Review", typos).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Recommendation {
    HighlyRecommended,
    Recommended,
    Maybe,
    NotRecommended,
    /// Carries the raw label so it can still be displayed.
    Unranked(String),
}

impl Recommendation {
    pub fn parse(raw: &str) -> Self {
        let normalized = raw.trim().to_ascii_lowercase();
        match normalized.as_str() {
            "highly recommended" => Recommendation::HighlyRecommended,
            "recommended" => Recommendation::Recommended,
            "maybe" => Recommendation::Maybe,
            "not recommended" => Recommendation::NotRecommended,
            _ => Recommendation::Unranked(raw.trim().to_string()),
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Recommendation::HighlyRecommended => "Highly Recommended",
            Recommendation::Recommended => "Recommended",
            Recommendation::Maybe => "Maybe",
            Recommendation::NotRecommended => "Not Recommended",
            Recommendation::Unranked(raw) if raw.is_empty() => "Unranked",
            Recommendation::Unranked(raw) => raw,
        }
    }
}

impl Default for Recommendation {
    fn default() -> Self {
        Recommendation::Unranked(String::new())
    }
}

impl Serialize for Recommendation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for Recommendation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = Option::<String>::deserialize(deserializer)?;
        Ok(raw.map(|r| Recommendation::parse(&r)).unwrap_or_default())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Strict in-memory record
// ────────────────────────────────────────────────────────────────────────────

/// One screened applicant. Immutable once loaded into a session.
///
/// Scores are stored exactly as received (finite, but possibly outside 0..=10).
/// Only visual bar widths are clamped, see `bar_fraction`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Candidate {
    #[serde(rename = "resume_id")]
    pub id: CandidateId,
    #[serde(rename = "candidate_name")]
    pub name: String,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(rename = "filename")]
    pub source_filename: String,
    pub overall_score: f64,
    pub skills_score: f64,
    pub experience_score: f64,
    pub education_score: f64,
    pub recommendation: Recommendation,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub skills: Vec<String>,
    pub strengths: Vec<String>,
    pub gaps: Vec<String>,
    pub justification: String,
}

/// Fraction of a 0–10 score bar to fill. Clamped; never used for stored or reported values.
pub fn bar_fraction(score: f64) -> f64 {
    if score.is_finite() {
        (score / 10.0).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Wire shape
// ────────────────────────────────────────────────────────────────────────────

/// A candidate exactly as the collaborator serialized it. Everything is optional and
/// untyped, so one malformed field never rejects the whole batch.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CandidateWire {
    pub resume_id: Option<Value>,
    pub candidate_name: Option<Value>,
    pub email: Option<Value>,
    pub phone: Option<Value>,
    pub filename: Option<Value>,
    pub skills: Option<Value>,
    pub overall_score: Option<Value>,
    pub skills_score: Option<Value>,
    pub experience_score: Option<Value>,
    pub education_score: Option<Value>,
    pub recommendation: Option<Value>,
    pub strengths: Option<Value>,
    pub gaps: Option<Value>,
    pub justification: Option<Value>,
}

/// Upstream `/match` response consumed at session start.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MatchResult {
    #[serde(default)]
    pub job_description: String,
    #[serde(default)]
    pub shortlisted_candidates: Vec<CandidateWire>,
    #[serde(default)]
    pub total_candidates: Option<usize>,
    #[serde(default)]
    pub processing_time: Option<String>,
}

impl Candidate {
    /// Builds a strict record from the wire shape.
    ///
    /// Returns `None` only when the record has no usable `resume_id`: such a record
    /// could never be reconciled with the collaborator's store.
    pub fn from_wire(wire: CandidateWire) -> Option<Self> {
        let Some(id) = wire.resume_id.as_ref().and_then(CandidateId::from_value) else {
            warn!(
                candidate_name = wire
                    .candidate_name
                    .as_ref()
                    .and_then(serde_json::Value::as_str)
                    .unwrap_or(""),
                "dropping candidate without a usable resume_id"
            );
            return None;
        };

        let name = text_field(&id, "candidate_name", wire.candidate_name)
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| UNKNOWN_NAME.to_string());

        Some(Candidate {
            overall_score: coerce_score(&id, "overall_score", wire.overall_score.as_ref()),
            skills_score: coerce_score(&id, "skills_score", wire.skills_score.as_ref()),
            experience_score: coerce_score(&id, "experience_score", wire.experience_score.as_ref()),
            education_score: coerce_score(&id, "education_score", wire.education_score.as_ref()),
            recommendation: text_field(&id, "recommendation", wire.recommendation)
                .map(|r| Recommendation::parse(&r))
                .unwrap_or_default(),
            name,
            email: text_field(&id, "email", wire.email).unwrap_or_default(),
            phone: text_field(&id, "phone", wire.phone).filter(|p| !p.trim().is_empty()),
            source_filename: text_field(&id, "filename", wire.filename).unwrap_or_default(),
            skills: text_list(wire.skills),
            strengths: text_list(wire.strengths),
            gaps: text_list(wire.gaps),
            justification: text_field(&id, "justification", wire.justification)
                .unwrap_or_default(),
            id,
        })
    }
}

/// Strings pass through and numbers are stringified. Null or missing is `None`;
/// any other shape is `None` with a warning.
fn text_field(id: &CandidateId, field: &'static str, value: Option<Value>) -> Option<String> {
    match value {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        Some(_) => {
            warn!(candidate_id = %id, field, "malformed text field, ignoring");
            None
        }
    }
}

/// Missing, null, non-numeric and non-finite scores become 0. Numeric strings parse.
fn coerce_score(id: &CandidateId, field: &'static str, value: Option<&Value>) -> f64 {
    let parsed = match value {
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(v) if v.is_finite() => v,
        _ => {
            warn!(candidate_id = %id, field, "missing or malformed score, defaulting to 0");
            0.0
        }
    }
}

fn text_list(value: Option<Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
