use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use tracing::error;

use super::admin::AdminError;
use super::answers::AnswerEntry;
use super::catalog::CatalogError;
use super::pipeline::PipelineError;
use super::service::{AssessmentService, ServiceError};
use super::sessions::SessionError;
use super::submission::{SubmissionId, UserMeta};

pub const ADMIN_EMAIL_HEADER: &str = "x-admin-email";

#[derive(Debug, Clone, Deserialize)]
pub struct AnswersPayload {
    pub answers: Vec<AnswerEntry>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AdminQuery {
    #[serde(default)]
    pub format: Option<String>,
}

/// Router exposing the questionnaire flow and the admin listing.
pub fn assessment_router(service: Arc<AssessmentService>) -> Router {
    Router::new()
        .route("/api/v1/catalog", get(catalog_handler))
        .route("/api/v1/assessments", post(begin_handler))
        .route("/api/v1/assessments/:submission_id", get(status_handler))
        .route(
            "/api/v1/assessments/:submission_id/payment",
            post(verify_payment_handler),
        )
        .route(
            "/api/v1/assessments/:submission_id/questions",
            get(questions_handler),
        )
        .route(
            "/api/v1/assessments/:submission_id/answers",
            post(answers_handler),
        )
        .route(
            "/api/v1/assessments/:submission_id/report.pdf",
            get(document_handler),
        )
        .route("/api/v1/admin/submissions", get(admin_handler))
        .with_state(service)
}

pub(crate) async fn catalog_handler(State(service): State<Arc<AssessmentService>>) -> Response {
    let summary = service.pipeline().catalog().summary();
    (StatusCode::OK, Json(json!({ "domains": summary }))).into_response()
}

pub(crate) async fn begin_handler(
    State(service): State<Arc<AssessmentService>>,
    Json(user): Json<UserMeta>,
) -> Response {
    match run_blocking(move || service.begin(user)).await {
        Ok(view) => (StatusCode::CREATED, Json(view)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn status_handler(
    State(service): State<Arc<AssessmentService>>,
    Path(submission_id): Path<String>,
) -> Response {
    match service.status(&SubmissionId(submission_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn verify_payment_handler(
    State(service): State<Arc<AssessmentService>>,
    Path(submission_id): Path<String>,
) -> Response {
    let id = SubmissionId(submission_id);
    match run_blocking(move || service.verify_payment(&id)).await {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn questions_handler(
    State(service): State<Arc<AssessmentService>>,
    Path(submission_id): Path<String>,
) -> Response {
    match service.questionnaire(&SubmissionId(submission_id)) {
        Ok(view) => (StatusCode::OK, Json(view)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn answers_handler(
    State(service): State<Arc<AssessmentService>>,
    Path(submission_id): Path<String>,
    Json(payload): Json<AnswersPayload>,
) -> Response {
    let id = SubmissionId(submission_id);
    match run_blocking(move || service.submit_answers(&id, payload.answers)).await {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(response) => response,
    }
}

pub(crate) async fn document_handler(
    State(service): State<Arc<AssessmentService>>,
    Path(submission_id): Path<String>,
) -> Response {
    match service.document(&SubmissionId(submission_id)) {
        Ok(bytes) => {
            let disposition = format!(
                "attachment; filename=\"{}\"",
                service.pipeline().settings().attachment_name
            );
            (
                StatusCode::OK,
                [
                    (header::CONTENT_TYPE, "application/pdf".to_string()),
                    (header::CONTENT_DISPOSITION, disposition),
                ],
                bytes,
            )
                .into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn admin_handler(
    State(service): State<Arc<AssessmentService>>,
    headers: HeaderMap,
    Query(query): Query<AdminQuery>,
) -> Response {
    let admin_email = headers
        .get(ADMIN_EMAIL_HEADER)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let wants_csv = query
        .format
        .as_deref()
        .is_some_and(|format| format.eq_ignore_ascii_case("csv"));

    if wants_csv {
        return match run_blocking(move || service.admin_csv(&admin_email)).await {
            Ok(csv) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/csv; charset=utf-8")],
                csv,
            )
                .into_response(),
            Err(response) => response,
        };
    }

    match run_blocking(move || service.admin_records(&admin_email)).await {
        Ok(records) => {
            let total = records.len();
            (
                StatusCode::OK,
                Json(json!({ "total": total, "submissions": records })),
            )
                .into_response()
        }
        Err(response) => response,
    }
}

async fn run_blocking<T, F>(work: F) -> Result<T, Response>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    match tokio::task::spawn_blocking(work).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(error_response(err)),
        Err(join_error) => {
            error!(error = %join_error, "assessment worker task failed");
            let payload = json!({ "error": "internal error" });
            Err((StatusCode::INTERNAL_SERVER_ERROR, Json(payload)).into_response())
        }
    }
}

pub(crate) fn status_for(err: &ServiceError) -> StatusCode {
    match err {
        ServiceError::Pipeline(PipelineError::MissingEmail)
        | ServiceError::Pipeline(PipelineError::Answers(_))
        | ServiceError::Pipeline(PipelineError::Catalog(
            CatalogError::UnknownDomain(_) | CatalogError::UnknownTier { .. },
        )) => StatusCode::UNPROCESSABLE_ENTITY,
        ServiceError::Pipeline(PipelineError::PaymentPending) => StatusCode::PAYMENT_REQUIRED,
        ServiceError::Pipeline(PipelineError::AlreadyCompleted(_))
        | ServiceError::Session(SessionError::Busy(_)) => StatusCode::CONFLICT,
        ServiceError::Pipeline(PipelineError::PaymentLink(_))
        | ServiceError::Admin(AdminError::Store(_)) => StatusCode::BAD_GATEWAY,
        ServiceError::Session(SessionError::NotFound(_)) | ServiceError::DocumentUnavailable(_) => {
            StatusCode::NOT_FOUND
        }
        ServiceError::Admin(AdminError::Forbidden) => StatusCode::FORBIDDEN,
        ServiceError::Pipeline(PipelineError::Catalog(_))
        | ServiceError::Pipeline(PipelineError::Scoring(_))
        | ServiceError::Admin(AdminError::Csv(_))
        | ServiceError::Admin(AdminError::Export(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn error_response(err: ServiceError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, "assessment request failed");
    }
    let payload = json!({ "error": err.to_string() });
    (status, Json(payload)).into_response()
}
