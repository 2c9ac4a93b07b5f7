//! Collection Manager: sole owner of the active Session Collection.
//!
//! # Reconciliation
//! Local state changes only after the collaborator acknowledges a deletion. There is
//! no optimistic removal: a rejected, failed, or timed-out call leaves the collection
//! exactly as it was.
//!
//! # Single flight
//! One `pending_delete` slot guards the whole session. While it is occupied every
//! further delete (single or bulk), reload, or reset is refused before any network
//! call is made. Sorting, expanding, and reading stay available throughout.
//!
//! # Run to completion
//! The remote call and the local reconcile step run in a spawned task, so a caller
//! that goes away (e.g. an HTTP client disconnecting) cannot cancel a deletion midway
//! or leave the slot occupied.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::collaborator::{CollaboratorError, ScreeningBackend};
use crate::models::candidate::{bar_fraction, Candidate, CandidateId, MatchResult};
use crate::session::ranking::{aggregate, rank, RankBadge, SortKey, Stats};

#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no screening results are loaded")]
    NoActiveSession,

    #[error("a deletion is already in progress ({0})")]
    DeleteInFlight(PendingDelete),

    #[error(transparent)]
    Remote(#[from] CollaboratorError),

    #[error("deletion task failed: {0}")]
    Task(String),
}

/// What the single in-flight slot currently holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "candidate_id", rename_all = "snake_case")]
pub enum PendingDelete {
    One(CandidateId),
    All,
}

impl std::fmt::Display for PendingDelete {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PendingDelete::One(id) => write!(f, "candidate {id}"),
            PendingDelete::All => f.write_str("clear all"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum DeleteOutcome {
    Deleted { remaining: usize },
    /// The id was not in the collection; nothing was sent.
    NotPresent,
}

/// Signal that the session is gone and the shell should return to its initial stage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionReset {
    pub reset: bool,
    pub cleared: usize,
}

// ────────────────────────────────────────────────────────────────────────────
// Session state value object
// ────────────────────────────────────────────────────────────────────────────

/// Everything the results view needs, in one value. Candidates stay in insertion order.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionState {
    pub session_id: Uuid,
    pub job_description: String,
    pub candidates: Vec<Candidate>,
    pub sort_key: SortKey,
    pub expanded_id: Option<CandidateId>,
    pub pending_delete: Option<PendingDelete>,
}

impl SessionState {
    /// Keeps the first record for any repeated id.
    pub fn new(job_description: String, candidates: Vec<Candidate>) -> Self {
        let mut seen = HashSet::new();
        let candidates = candidates
            .into_iter()
            .filter(|c| {
                let fresh = seen.insert(c.id.clone());
                if !fresh {
                    warn!(candidate_id = %c.id, "dropping duplicate candidate id");
                }
                fresh
            })
            .collect();

        Self {
            session_id: Uuid::new_v4(),
            job_description,
            candidates,
            sort_key: SortKey::default(),
            expanded_id: None,
            pending_delete: None,
        }
    }

    pub fn contains(&self, id: &CandidateId) -> bool {
        self.candidates.iter().any(|c| &c.id == id)
    }

    pub fn ranked(&self) -> Vec<&Candidate> {
        rank(&self.candidates, self.sort_key)
    }

    /// Ranked candidates, owned, for composition off the lock.
    pub fn ranked_owned(&self) -> Vec<Candidate> {
        self.ranked().into_iter().cloned().collect()
    }

    pub fn stats(&self) -> Stats {
        aggregate(&self.candidates)
    }

    fn ensure_idle(&self) -> Result<(), SessionError> {
        match &self.pending_delete {
            Some(pending) => Err(SessionError::DeleteInFlight(pending.clone())),
            None => Ok(()),
        }
    }

    pub fn view(&self) -> SessionView {
        let candidates = self
            .ranked()
            .into_iter()
            .enumerate()
            .map(|(position, candidate)| RankedCandidateView {
                rank: position + 1,
                badge: RankBadge::for_position(position),
                bars: ScoreBars::of(candidate),
                expanded: self.expanded_id.as_ref() == Some(&candidate.id),
                delete_pending: self.pending_delete
                    == Some(PendingDelete::One(candidate.id.clone())),
                candidate: candidate.clone(),
            })
            .collect();

        SessionView {
            session_id: self.session_id,
            job_description: self.job_description.clone(),
            sort_key: self.sort_key,
            stats: self.stats(),
            expanded_id: self.expanded_id.clone(),
            pending_delete: self.pending_delete.clone(),
            busy: self.pending_delete.is_some(),
            candidates,
        }
    }
}

/// Read model handed to the Presentation Shell.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub session_id: Uuid,
    pub job_description: String,
    pub sort_key: SortKey,
    pub stats: Stats,
    pub expanded_id: Option<CandidateId>,
    pub pending_delete: Option<PendingDelete>,
    /// Any deletion outstanding; all delete controls should be disabled.
    pub busy: bool,
    pub candidates: Vec<RankedCandidateView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedCandidateView {
    pub rank: usize,
    pub badge: Option<RankBadge>,
    #[serde(flatten)]
    pub candidate: Candidate,
    pub bars: ScoreBars,
    pub expanded: bool,
    pub delete_pending: bool,
}

/// Clamped 0..=1 fill fractions for score bars.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBars {
    pub overall: f64,
    pub skills: f64,
    pub experience: f64,
    pub education: f64,
}

impl ScoreBars {
    fn of(candidate: &Candidate) -> Self {
        Self {
            overall: bar_fraction(candidate.overall_score),
            skills: bar_fraction(candidate.skills_score),
            experience: bar_fraction(candidate.experience_score),
            education: bar_fraction(candidate.education_score),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Manager
// ────────────────────────────────────────────────────────────────────────────

/// Cheap to clone; clones share the same session.
#[derive(Clone)]
pub struct CollectionManager {
    backend: Arc<dyn ScreeningBackend>,
    /// `None` until results are loaded, and again after a reset or clear-all.
    state: Arc<Mutex<Option<SessionState>>>,
}

impl CollectionManager {
    pub fn new(backend: Arc<dyn ScreeningBackend>) -> Self {
        Self {
            backend,
            state: Arc::new(Mutex::new(None)),
        }
    }

    /// The guarded value is plain data that every critical section leaves consistent,
    /// so a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, Option<SessionState>> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_active<T>(
        &self,
        f: impl FnOnce(&mut SessionState) -> Result<T, SessionError>,
    ) -> Result<T, SessionError> {
        let mut slot = self.lock();
        let state = slot.as_mut().ok_or(SessionError::NoActiveSession)?;
        f(state)
    }

    /// Runs `f` against the current state without mutating it.
    pub fn read<T>(&self, f: impl FnOnce(&SessionState) -> T) -> Result<T, SessionError> {
        self.with_active(|state| Ok(f(state)))
    }

    pub fn snapshot(&self) -> Result<SessionView, SessionError> {
        self.read(SessionState::view)
    }

    /// Starts a new session from a match result, replacing any previous one.
    pub fn load_initial(&self, result: MatchResult) -> Result<SessionView, SessionError> {
        let received = result.shortlisted_candidates.len();
        let reported_total = result.total_candidates;
        let candidates: Vec<Candidate> = result
            .shortlisted_candidates
            .into_iter()
            .filter_map(Candidate::from_wire)
            .collect();

        let mut slot = self.lock();
        if let Some(previous) = slot.as_ref() {
            previous.ensure_idle()?;
        }
        let state = SessionState::new(result.job_description, candidates);
        info!(
            session_id = %state.session_id,
            received,
            reported_total = ?reported_total,
            loaded = state.candidates.len(),
            "session loaded"
        );
        let view = state.view();
        *slot = Some(state);
        Ok(view)
    }

    /// Asks the collaborator to score its stored resumes, then loads the result.
    pub async fn load_from_match(&self, job_description: &str) -> Result<SessionView, SessionError> {
        let pending = self.lock().as_ref().and_then(|s| s.pending_delete.clone());
        if let Some(pending) = pending {
            return Err(SessionError::DeleteInFlight(pending));
        }
        let result = self.backend.match_resumes(job_description).await?;
        self.load_initial(result)
    }

    pub fn set_sort_key(&self, key: SortKey) -> Result<(), SessionError> {
        self.with_active(|state| {
            state.sort_key = key;
            Ok(())
        })
    }

    pub fn set_expanded(&self, id: Option<CandidateId>) -> Result<(), SessionError> {
        self.with_active(|state| {
            state.expanded_id = id;
            Ok(())
        })
    }

    /// Expands `id`, or collapses it if it is already the expanded card.
    pub fn toggle_expanded(&self, id: CandidateId) -> Result<Option<CandidateId>, SessionError> {
        self.with_active(|state| {
            state.expanded_id = if state.expanded_id.as_ref() == Some(&id) {
                None
            } else {
                Some(id)
            };
            Ok(state.expanded_id.clone())
        })
    }

    /// Discards the local session (operator starts a new run). No remote call.
    pub fn reset(&self) -> Result<(), SessionError> {
        let mut slot = self.lock();
        if let Some(state) = slot.as_ref() {
            state.ensure_idle()?;
            info!(session_id = %state.session_id, "session reset");
        }
        *slot = None;
        Ok(())
    }

    /// Deletes one candidate remotely, then locally on acknowledgment.
    pub async fn delete_one(&self, id: CandidateId) -> Result<DeleteOutcome, SessionError> {
        let claimed = self.with_active(|state| {
            state.ensure_idle()?;
            if !state.contains(&id) {
                return Ok(false);
            }
            state.pending_delete = Some(PendingDelete::One(id.clone()));
            Ok(true)
        })?;
        if !claimed {
            debug!(candidate_id = %id, "delete requested for absent candidate");
            return Ok(DeleteOutcome::NotPresent);
        }

        let manager = self.clone();
        let task = tokio::spawn(async move {
            let result = manager.backend.delete_resume(&id).await;
            manager.finish_delete_one(&id, result)
        });
        self.join(task).await
    }

    fn finish_delete_one(
        &self,
        id: &CandidateId,
        result: Result<(), CollaboratorError>,
    ) -> Result<DeleteOutcome, SessionError> {
        let mut slot = self.lock();
        let Some(state) = slot.as_mut() else {
            return result.map(|_| DeleteOutcome::Deleted { remaining: 0 }).map_err(Into::into);
        };
        state.pending_delete = None;

        match result {
            Ok(()) => {
                state.candidates.retain(|c| &c.id != id);
                if state.expanded_id.as_ref() == Some(id) {
                    state.expanded_id = None;
                }
                let remaining = state.candidates.len();
                info!(candidate_id = %id, remaining, "candidate deleted");
                Ok(DeleteOutcome::Deleted { remaining })
            }
            Err(e) => {
                warn!(candidate_id = %id, error = %e, "delete failed; candidate kept");
                Err(SessionError::Remote(e))
            }
        }
    }

    /// Clears the collaborator's store, then the whole session on acknowledgment.
    ///
    /// Callers must have obtained explicit confirmation first; this does not prompt.
    pub async fn delete_all(&self) -> Result<SessionReset, SessionError> {
        self.with_active(|state| {
            state.ensure_idle()?;
            state.pending_delete = Some(PendingDelete::All);
            Ok(())
        })?;

        let manager = self.clone();
        let task = tokio::spawn(async move {
            let result = manager.backend.delete_all_resumes().await;
            manager.finish_delete_all(result)
        });
        self.join(task).await
    }

    fn finish_delete_all(
        &self,
        result: Result<(), CollaboratorError>,
    ) -> Result<SessionReset, SessionError> {
        let mut slot = self.lock();
        match result {
            Ok(()) => {
                let cleared = slot.take().map(|s| s.candidates.len()).unwrap_or(0);
                info!(cleared, "all candidates cleared; session reset");
                Ok(SessionReset {
                    reset: true,
                    cleared,
                })
            }
            Err(e) => {
                if let Some(state) = slot.as_mut() {
                    state.pending_delete = None;
                }
                warn!(error = %e, "clear-all failed; session kept");
                Err(SessionError::Remote(e))
            }
        }
    }

    /// Awaits a deletion task. A panicked task still frees the slot.
    async fn join<T>(
        &self,
        task: tokio::task::JoinHandle<Result<T, SessionError>>,
    ) -> Result<T, SessionError> {
        match task.await {
            Ok(result) => result,
            Err(e) => {
                if let Some(state) = self.lock().as_mut() {
                    state.pending_delete = None;
                }
                Err(SessionError::Task(e.to_string()))
            }
        }
    }
}
