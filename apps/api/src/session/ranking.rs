//! Ranking Engine: pure ordering and aggregate statistics over a candidate slice.
//!
//! Nothing here mutates or allocates beyond the returned values; the session calls
//! these on every read, so re-sorting never touches the stored insertion order.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::models::candidate::{Candidate, Recommendation};

/// Numeric field the operator ranks by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    #[serde(alias = "overall_score")]
    Overall,
    #[serde(alias = "skills_score")]
    Skills,
    #[serde(alias = "experience_score")]
    Experience,
}

impl SortKey {
    pub fn score_of(self, candidate: &Candidate) -> f64 {
        match self {
            SortKey::Overall => candidate.overall_score,
            SortKey::Skills => candidate.skills_score,
            SortKey::Experience => candidate.experience_score,
        }
    }
}

/// Stable descending sort by `key`. Ties keep their insertion order.
///
/// Scores are finite by construction (`Candidate::from_wire`), so `partial_cmp`
/// is a total order here.
pub fn rank(candidates: &[Candidate], key: SortKey) -> Vec<&Candidate> {
    let mut ranked: Vec<&Candidate> = candidates.iter().collect();
    ranked.sort_by(|a, b| {
        key.score_of(b)
            .partial_cmp(&key.score_of(a))
            .unwrap_or(Ordering::Equal)
    });
    ranked
}

/// Ordinal badge for the top three positions of the *current* ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBadge {
    Gold,
    Silver,
    Bronze,
}

impl RankBadge {
    /// `position` is zero-based in ranked order.
    pub fn for_position(position: usize) -> Option<Self> {
        match position {
            0 => Some(RankBadge::Gold),
            1 => Some(RankBadge::Silver),
            2 => Some(RankBadge::Bronze),
            _ => None,
        }
    }
}

/// Aggregates over the current (possibly reduced) collection.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stats {
    pub total: usize,
    pub highly_recommended_count: usize,
    pub recommended_count: usize,
    /// 0 for an empty collection.
    pub mean_overall_score: f64,
}

pub fn aggregate(candidates: &[Candidate]) -> Stats {
    let total = candidates.len();
    let count_of = |wanted: &Recommendation| {
        candidates
            .iter()
            .filter(|c| &c.recommendation == wanted)
            .count()
    };

    let mean_overall_score = if total == 0 {
        0.0
    } else {
        candidates.iter().map(|c| c.overall_score).sum::<f64>() / total as f64
    };

    Stats {
        total,
        highly_recommended_count: count_of(&Recommendation::HighlyRecommended),
        recommended_count: count_of(&Recommendation::Recommended),
        mean_overall_score,
    }
}
