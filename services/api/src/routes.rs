use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use expiry_reminder::workflows::documents::{document_router, DocumentRegistry, DocumentService};
use serde_json::json;
use std::sync::Arc;

pub(crate) fn with_document_routes<R>(service: Arc<DocumentService<R>>) -> axum::Router
where
    R: DocumentRegistry + 'static,
{
    document_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::Request;
    use expiry_reminder::workflows::documents::{NewDocument, SqliteDocumentRegistry};
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::AtomicBool;
    use tower::ServiceExt;

    fn test_state(ready: bool) -> AppState {
        let recorder = PrometheusBuilder::new().build_recorder();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(recorder.handle()),
        }
    }

    fn test_app(ready: bool) -> (tempfile::TempDir, axum::Router) {
        let dir = tempfile::tempdir().expect("tempdir");
        let registry = SqliteDocumentRegistry::open(dir.path().join("documents.db"))
            .expect("registry opens");
        registry_seed(&registry);
        let service = Arc::new(DocumentService::new(Arc::new(registry), 7));
        let app = with_document_routes(service).layer(Extension(test_state(ready)));
        (dir, app)
    }

    fn registry_seed(registry: &SqliteDocumentRegistry) {
        registry
            .add(NewDocument {
                name: "Passport".to_string(),
                expiry_date: chrono::NaiveDate::from_ymd_opt(2025, 6, 14).expect("valid"),
                file_path: Some("passport.pdf".to_string()),
                recipient_email: None,
            })
            .expect("seed");
    }

    async fn get(app: axum::Router, uri: &str) -> axum::response::Response {
        app.oneshot(
            Request::builder()
                .uri(uri)
                .body(Body::empty())
                .expect("request builds"),
        )
        .await
        .expect("router responds")
    }

    #[tokio::test]
    async fn health_and_readiness_report_status() {
        let (_dir, app) = test_app(false);
        assert_eq!(get(app.clone(), "/health").await.status(), StatusCode::OK);
        assert_eq!(
            get(app, "/ready").await.status(),
            StatusCode::SERVICE_UNAVAILABLE
        );

        let (_dir, app) = test_app(true);
        assert_eq!(get(app, "/ready").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn document_routes_are_mounted_alongside_probes() {
        let (_dir, app) = test_app(true);
        let response = get(app, "/api/v1/documents/expiring?within=0&today=2025-06-15").await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
            .await
            .expect("read body");
        let payload: serde_json::Value = serde_json::from_slice(&body).expect("json payload");
        assert_eq!(payload["documents"][0]["name"], json!("Passport"));
    }

    #[tokio::test]
    async fn metrics_endpoint_serves_prometheus_text() {
        let (_dir, app) = test_app(true);
        let response = get(app, "/metrics").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response
                .headers()
                .get(header::CONTENT_TYPE)
                .and_then(|value| value.to_str().ok()),
            Some("text/plain; version=0.0.4")
        );
    }
}
