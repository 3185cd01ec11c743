use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::classifier::cutoff;
use super::domain::{Document, DocumentId, NewDocument};
use super::registry::DocumentRegistry;
use super::service::{DocumentService, DocumentServiceError};

/// Router builder exposing the registry, expiry queries, and reminder dispatch.
pub fn document_router<R>(service: Arc<DocumentService<R>>) -> Router
where
    R: DocumentRegistry + 'static,
{
    Router::new()
        .route(
            "/api/v1/documents",
            get(list_handler::<R>).post(create_handler::<R>),
        )
        .route("/api/v1/documents/:document_id", delete(delete_handler::<R>))
        .route("/api/v1/documents/expiring", get(expiring_handler::<R>))
        .route("/api/v1/documents/overview", get(overview_handler::<R>))
        .route("/api/v1/reminders", post(reminders_handler::<R>))
        .with_state(service)
}

#[derive(Debug, Default, Deserialize)]
pub struct ExpiringQuery {
    pub within: Option<u32>,
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct TodayQuery {
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReminderRequest {
    #[serde(default)]
    pub today: Option<NaiveDate>,
}

#[derive(Debug, Serialize)]
pub struct ExpiringResponse {
    pub today: NaiveDate,
    pub within_days: u32,
    pub cutoff: NaiveDate,
    pub documents: Vec<Document>,
}

fn resolve_today(today: Option<NaiveDate>) -> NaiveDate {
    today.unwrap_or_else(|| Local::now().date_naive())
}

pub(crate) async fn list_handler<R>(State(service): State<Arc<DocumentService<R>>>) -> Response
where
    R: DocumentRegistry + 'static,
{
    match service.documents() {
        Ok(documents) => (StatusCode::OK, axum::Json(documents)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn create_handler<R>(
    State(service): State<Arc<DocumentService<R>>>,
    axum::Json(document): axum::Json<NewDocument>,
) -> Response
where
    R: DocumentRegistry + 'static,
{
    match service.register(document) {
        Ok(stored) => (StatusCode::CREATED, axum::Json(stored)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn delete_handler<R>(
    State(service): State<Arc<DocumentService<R>>>,
    Path(document_id): Path<i64>,
) -> Response
where
    R: DocumentRegistry + 'static,
{
    match service.remove(DocumentId(document_id)) {
        Ok(_) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn expiring_handler<R>(
    State(service): State<Arc<DocumentService<R>>>,
    Query(query): Query<ExpiringQuery>,
) -> Response
where
    R: DocumentRegistry + 'static,
{
    let today = resolve_today(query.today);
    let within_days = query.within.unwrap_or(service.approaching_days());

    match service.expiring_within(today, within_days) {
        Ok(documents) => {
            let payload = ExpiringResponse {
                today,
                within_days,
                cutoff: cutoff(today, within_days),
                documents,
            };
            (StatusCode::OK, axum::Json(payload)).into_response()
        }
        Err(err) => error_response(err),
    }
}

pub(crate) async fn overview_handler<R>(
    State(service): State<Arc<DocumentService<R>>>,
    Query(query): Query<TodayQuery>,
) -> Response
where
    R: DocumentRegistry + 'static,
{
    match service.overview(resolve_today(query.today)) {
        Ok(overview) => (StatusCode::OK, axum::Json(overview)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reminders_handler<R>(
    State(service): State<Arc<DocumentService<R>>>,
    request: Option<axum::Json<ReminderRequest>>,
) -> Response
where
    R: DocumentRegistry + 'static,
{
    let today = resolve_today(request.and_then(|axum::Json(request)| request.today));

    // SMTP sends block; keep them off the async workers.
    let result = tokio::task::spawn_blocking(move || service.dispatch_reminders(today)).await;

    match result {
        Ok(Ok(report)) => (StatusCode::OK, axum::Json(report)).into_response(),
        Ok(Err(err)) => error_response(err),
        Err(join_error) => {
            error!(error = %join_error, "reminder dispatch task failed");
            let payload = json!({ "error": "reminder dispatch failed" });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}

fn error_response(err: DocumentServiceError) -> Response {
    let status = match &err {
        DocumentServiceError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
        DocumentServiceError::RemindersDisabled => StatusCode::SERVICE_UNAVAILABLE,
        DocumentServiceError::Registry(_) => {
            error!(error = %err, "document registry failure");
            StatusCode::INTERNAL_SERVER_ERROR
        }
    };

    let payload = json!({ "error": err.to_string() });
    (status, axum::Json(payload)).into_response()
}
