use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::models::candidate::{CandidateId, MatchResult};
use crate::report::{compose, export, ReportDocument};
use crate::routes::extract::{AppJson, AppQuery};
use crate::session::{DeleteOutcome, SessionReset, SessionView, SortKey};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct MatchRequest {
    pub job_description: String,
}

#[derive(Deserialize)]
pub struct SortRequest {
    pub sort_key: SortKey,
}

#[derive(Deserialize)]
pub struct ExpandRequest {
    pub candidate_id: Option<CandidateId>,
}

#[derive(Deserialize)]
pub struct ConfirmQuery {
    #[serde(default)]
    pub confirm: bool,
}

#[derive(Serialize)]
pub struct ExpandedResponse {
    pub expanded_id: Option<CandidateId>,
}

#[derive(Serialize)]
pub struct DeleteResponse {
    pub deleted_id: CandidateId,
    #[serde(flatten)]
    pub outcome: DeleteOutcome,
}

/// POST /api/v1/session
pub async fn handle_load(
    State(state): State<AppState>,
    AppJson(result): AppJson<MatchResult>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let view = state.manager.load_initial(result)?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// POST /api/v1/session/match
pub async fn handle_match(
    State(state): State<AppState>,
    AppJson(req): AppJson<MatchRequest>,
) -> Result<(StatusCode, Json<SessionView>), AppError> {
    let job_description = req.job_description.trim();
    if job_description.is_empty() {
        return Err(AppError::Validation(
            "job_description must not be empty".to_string(),
        ));
    }
    let view = state.manager.load_from_match(job_description).await?;
    Ok((StatusCode::CREATED, Json(view)))
}

/// GET /api/v1/session
pub async fn handle_get_session(
    State(state): State<AppState>,
) -> Result<Json<SessionView>, AppError> {
    Ok(Json(state.manager.snapshot()?))
}

/// PUT /api/v1/session/sort
pub async fn handle_set_sort(
    State(state): State<AppState>,
    AppJson(req): AppJson<SortRequest>,
) -> Result<Json<SessionView>, AppError> {
    state.manager.set_sort_key(req.sort_key)?;
    Ok(Json(state.manager.snapshot()?))
}

/// PUT /api/v1/session/expanded
pub async fn handle_set_expanded(
    State(state): State<AppState>,
    AppJson(req): AppJson<ExpandRequest>,
) -> Result<Json<ExpandedResponse>, AppError> {
    state.manager.set_expanded(req.candidate_id.clone())?;
    Ok(Json(ExpandedResponse {
        expanded_id: req.candidate_id,
    }))
}

/// POST /api/v1/session/candidates/:id/toggle
pub async fn handle_toggle_expanded(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ExpandedResponse>, AppError> {
    let expanded_id = state.manager.toggle_expanded(CandidateId::new(id))?;
    Ok(Json(ExpandedResponse { expanded_id }))
}

/// DELETE /api/v1/session/candidates/:id
pub async fn handle_delete_one(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<DeleteResponse>, AppError> {
    let id = CandidateId::new(id);
    let outcome = state.manager.delete_one(id.clone()).await?;
    Ok(Json(DeleteResponse {
        deleted_id: id,
        outcome,
    }))
}

/// DELETE /api/v1/session/candidates?confirm=true
pub async fn handle_delete_all(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ConfirmQuery>,
) -> Result<Json<SessionReset>, AppError> {
    if !query.confirm {
        return Err(AppError::Validation(
            "clearing all candidates requires confirm=true".to_string(),
        ));
    }
    Ok(Json(state.manager.delete_all().await?))
}

/// DELETE /api/v1/session
pub async fn handle_reset(State(state): State<AppState>) -> Result<StatusCode, AppError> {
    state.manager.reset()?;
    Ok(StatusCode::NO_CONTENT)
}

/// Composes the report from a snapshot of the ranked collection. Layout is CPU-bound,
/// so it runs on the blocking pool.
async fn build_report(state: &AppState) -> Result<ReportDocument, AppError> {
    let (ranked, job_description) = state
        .manager
        .read(|s| (s.ranked_owned(), s.job_description.clone()))?;
    let layout = state.layout.clone();
    let today = chrono::Local::now().date_naive();

    tokio::task::spawn_blocking(move || compose(&ranked, &job_description, today, &layout))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("report composition failed: {e}")))
}

/// GET /api/v1/session/report
pub async fn handle_report(
    State(state): State<AppState>,
) -> Result<Json<ReportDocument>, AppError> {
    Ok(Json(build_report(&state).await?))
}

/// GET /api/v1/session/export
pub async fn handle_export(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let artifact = export(&build_report(&state).await?);
    let headers = [
        (header::CONTENT_TYPE, artifact.content_type.to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", artifact.filename),
        ),
    ];
    Ok((headers, artifact.body))
}
