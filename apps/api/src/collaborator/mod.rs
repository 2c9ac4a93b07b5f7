/// Screening collaborator client: the only module that talks to the resume service.
///
/// ARCHITECTURAL RULE: session code depends on the `ScreeningBackend` trait, never on
/// reqwest directly, so reconciliation logic can be exercised against in-memory fakes.
///
/// Endpoints consumed:
/// - `DELETE /resumes/{id}`  → any 2xx acknowledges, otherwise `{ detail }` may explain
/// - `DELETE /resumes`       → bulk clear
/// - `POST   /match`         → form field `job_description`, returns the shortlist
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::models::candidate::{CandidateId, MatchResult};

#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("collaborator rejected the request (status {status}){}", detail_suffix(.detail))]
    Rejected { status: u16, detail: Option<String> },

    #[error("collaborator did not answer within {0:?}")]
    Timeout(Duration),

    #[error("could not decode collaborator response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("invalid collaborator base URL '{0}'")]
    InvalidBaseUrl(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {d}"))
        .unwrap_or_default()
}

/// Remote store of resumes and their match results.
#[async_trait]
pub trait ScreeningBackend: Send + Sync {
    async fn delete_resume(&self, id: &CandidateId) -> Result<(), CollaboratorError>;

    async fn delete_all_resumes(&self) -> Result<(), CollaboratorError>;

    async fn match_resumes(&self, job_description: &str) -> Result<MatchResult, CollaboratorError>;
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    detail: Option<Value>,
}

/// Acknowledgment bodies are informational only; a bare 2xx is enough.
#[derive(Debug, Deserialize)]
struct DeleteAck {
    message: Option<String>,
    remaining: Option<u64>,
}

/// reqwest-backed `ScreeningBackend`.
#[derive(Clone)]
pub struct HttpScreeningBackend {
    client: Client,
    base_url: Url,
    timeout: Duration,
    match_timeout: Duration,
}

impl HttpScreeningBackend {
    /// `timeout` bounds the delete calls; `match_timeout` bounds `/match`, which runs
    /// LLM scoring upstream and is much slower.
    pub fn new(
        base_url: &str,
        timeout: Duration,
        match_timeout: Duration,
    ) -> Result<Self, CollaboratorError> {
        let base_url = Url::parse(base_url)
            .ok()
            .filter(|u| !u.cannot_be_a_base())
            .ok_or_else(|| CollaboratorError::InvalidBaseUrl(base_url.to_string()))?;

        Ok(Self {
            client: Client::builder().timeout(timeout).build()?,
            base_url,
            timeout,
            match_timeout,
        })
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, CollaboratorError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| CollaboratorError::InvalidBaseUrl(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn classify(&self, err: reqwest::Error, limit: Duration) -> CollaboratorError {
        if err.is_timeout() {
            CollaboratorError::Timeout(limit)
        } else {
            CollaboratorError::Http(err)
        }
    }

    /// Turns any non-2xx into `Rejected`, pulling `detail` out of the body when present.
    async fn check_status(response: Response) -> Result<Response, CollaboratorError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.detail)
            .map(|d| match d {
                Value::String(s) => s,
                other => other.to_string(),
            });
        warn!(status = status.as_u16(), ?detail, "collaborator rejected request");

        Err(CollaboratorError::Rejected {
            status: status.as_u16(),
            detail,
        })
    }

    async fn delete(&self, url: Url) -> Result<(), CollaboratorError> {
        let response = self
            .client
            .delete(url.clone())
            .send()
            .await
            .map_err(|e| self.classify(e, self.timeout))?;
        let response = Self::check_status(response).await?;

        // The body is optional; a timeout while draining it still counts as acknowledged.
        let body = response.text().await.unwrap_or_default();
        if let Ok(ack) = serde_json::from_str::<DeleteAck>(&body) {
            debug!(%url, message = ?ack.message, remaining = ?ack.remaining, "delete acknowledged");
        }
        Ok(())
    }
}

#[async_trait]
impl ScreeningBackend for HttpScreeningBackend {
    async fn delete_resume(&self, id: &CandidateId) -> Result<(), CollaboratorError> {
        let url = self.endpoint(&["resumes", id.as_str()])?;
        self.delete(url).await
    }

    async fn delete_all_resumes(&self) -> Result<(), CollaboratorError> {
        let url = self.endpoint(&["resumes"])?;
        self.delete(url).await
    }

    async fn match_resumes(&self, job_description: &str) -> Result<MatchResult, CollaboratorError> {
        let url = self.endpoint(&["match"])?;
        let response = self
            .client
            .post(url)
            .timeout(self.match_timeout)
            .form(&[("job_description", job_description)])
            .send()
            .await
            .map_err(|e| self.classify(e, self.match_timeout))?;
        let response = Self::check_status(response).await?;

        let body = response
            .text()
            .await
            .map_err(|e| self.classify(e, self.match_timeout))?;
        let result: MatchResult = serde_json::from_str(&body)?;

        info!(
            candidates = result.shortlisted_candidates.len(),
            processing_time = result.processing_time.as_deref().unwrap_or("?"),
            "match results received"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        extract::Path,
        http::StatusCode,
        routing::{delete, post},
        Form, Json, Router,
    };
    use serde_json::json;
    use std::collections::HashMap;

    /// Serves `router` on an ephemeral local port and returns its base URL.
    async fn serve(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind ephemeral port");
        let addr = listener.local_addr().expect("local addr");
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("test server runs");
        });
        format!("http://{addr}")
    }

    fn backend(base: &str) -> HttpScreeningBackend {
        HttpScreeningBackend::new(base, Duration::from_secs(5), Duration::from_secs(5))
            .expect("valid base url")
    }

    #[tokio::test]
    async fn test_delete_resume_acknowledged() {
        let router = Router::new().route(
            "/resumes/:id",
            delete(|Path(id): Path<String>| async move {
                Json(json!({ "message": "Resume deleted successfully", "deleted_id": id, "remaining": 2 }))
            }),
        );
        let base = serve(router).await;

        backend(&base)
            .delete_resume(&CandidateId::new("42"))
            .await
            .expect("2xx is success");
    }

    #[tokio::test]
    async fn test_delete_resume_rejection_carries_detail() {
        let router = Router::new().route(
            "/resumes/:id",
            delete(|| async {
                (
                    StatusCode::NOT_FOUND,
                    Json(json!({ "detail": "Resume not found" })),
                )
            }),
        );
        let base = serve(router).await;

        let err = backend(&base)
            .delete_resume(&CandidateId::new("9"))
            .await
            .expect_err("404 is a failure");
        match err {
            CollaboratorError::Rejected { status, detail } => {
                assert_eq!(status, 404);
                assert_eq!(detail.as_deref(), Some("Resume not found"));
            }
            other => panic!("expected Rejected, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_delete_all_rejection_without_body() {
        let router = Router::new().route(
            "/resumes",
            delete(|| async { StatusCode::INTERNAL_SERVER_ERROR }),
        );
        let base = serve(router).await;

        let err = backend(&base)
            .delete_all_resumes()
            .await
            .expect_err("500 is a failure");
        assert!(matches!(
            err,
            CollaboratorError::Rejected {
                status: 500,
                detail: None
            }
        ));
    }

    #[tokio::test]
    async fn test_slow_collaborator_times_out() {
        let router = Router::new().route(
            "/resumes",
            delete(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                StatusCode::OK
            }),
        );
        let base = serve(router).await;
        let backend = HttpScreeningBackend::new(
            &base,
            Duration::from_millis(100),
            Duration::from_millis(100),
        )
        .expect("valid base url");

        let err = backend.delete_all_resumes().await.expect_err("times out");
        assert!(matches!(err, CollaboratorError::Timeout(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_unreachable_collaborator_is_failure() {
        // Bind then drop to get a port nothing listens on.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("addr");
        drop(listener);

        let err = backend(&format!("http://{addr}"))
            .delete_resume(&CandidateId::new("1"))
            .await
            .expect_err("connection refused");
        assert!(matches!(err, CollaboratorError::Http(_)), "got {err:?}");
    }

    #[tokio::test]
    async fn test_match_posts_form_and_decodes() {
        let router = Router::new().route(
            "/match",
            post(|Form(form): Form<HashMap<String, String>>| async move {
                let jd = form.get("job_description").cloned().unwrap_or_default();
                Json(json!({
                    "total_candidates": 1,
                    "job_description": jd,
                    "processing_time": "1.20s",
                    "shortlisted_candidates": [{
                        "resume_id": 1,
                        "candidate_name": "Linus",
                        "overall_score": 9.1,
                        "recommendation": "Highly Recommended"
                    }]
                }))
            }),
        );
        let base = serve(router).await;

        let result = backend(&base)
            .match_resumes("Kernel hacker")
            .await
            .expect("decodes");
        assert_eq!(result.job_description, "Kernel hacker");
        assert_eq!(result.shortlisted_candidates.len(), 1);
    }

    #[test]
    fn test_endpoint_joins_segments() {
        let backend = backend("http://localhost:8000/api/");
        let url = backend
            .endpoint(&["resumes", "12"])
            .expect("joins");
        assert_eq!(url.as_str(), "http://localhost:8000/api/resumes/12");
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        assert!(matches!(
            HttpScreeningBackend::new("not a url", Duration::from_secs(1), Duration::from_secs(1)),
            Err(CollaboratorError::InvalidBaseUrl(_))
        ));
    }
}
