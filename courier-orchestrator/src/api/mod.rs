//! API Module
//!
//! HTTP API layer for the orchestrator, versioned under `/api/v1`.
//! Each submodule handles endpoints for a specific domain.

pub mod error;
pub mod execution;
pub mod health;
pub mod package;
pub mod template;
pub mod variables;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Upper bound on an uploaded package
const MAX_PACKAGE_SIZE: usize = 512 * 1024 * 1024;

/// Create the main API router with all endpoints
pub fn create_router(state: AppState) -> Router {
    let api = Router::new()
        // Execution endpoints
        .route(
            "/executions",
            get(execution::list_executions).post(execution::create_execution),
        )
        .route(
            "/executions/{id}",
            get(execution::get_execution).put(execution::report_step),
        )
        .route(
            "/executions/{tenant}/{environment}/check",
            get(execution::check),
        )
        // Template endpoints
        .route(
            "/templates",
            get(template::list_templates).post(template::create_template),
        )
        .route(
            "/templates/{id}",
            get(template::get_template)
                .put(template::update_template)
                .delete(template::delete_template),
        )
        // Variable set endpoints
        .route("/variables", post(variables::create_variable_set))
        .route(
            "/variables/{id}",
            get(variables::get_variable_set)
                .put(variables::update_variable_set)
                .delete(variables::delete_variable_set),
        )
        .route(
            "/variables/{tenant}/{environment}",
            get(variables::find_by_instance),
        )
        // Package endpoints
        .route(
            "/packages",
            get(package::list_packages)
                .post(package::upload_package)
                .layer(DefaultBodyLimit::max(MAX_PACKAGE_SIZE)),
        )
        .route("/packages/{file_name}", get(package::get_package));

    Router::new()
        .route("/health", get(health::health_check))
        .route("/infrastructure/health", get(health::health_check))
        .nest("/api/v1", api)
        // Add state and middleware
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::queue::QueueRegistry;
    use crate::state::DispatchSettings;
    use crate::storage::FileSystemStorage;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use std::time::Duration;
    use tower::ServiceExt;

    async fn test_router(dir: &std::path::Path) -> Router {
        let state = AppState::new(
            test_pool().await,
            QueueRegistry::new(dir.join("queues")),
            FileSystemStorage::new(dir.join("blobs")),
            DispatchSettings {
                retry_backoff: Duration::ZERO,
                ..DispatchSettings::default()
            },
        );
        create_router(state)
    }

    async fn send(router: &Router, request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null);
        (status, json)
    }

    fn json_request(method: &str, uri: &str, body: serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn step_state(step_id: i32) -> serde_json::Value {
        serde_json::json!({
            "step_id": step_id,
            "step_name": "run",
            "executor": "agent-1",
            "success": true,
            "log": ["done"],
            "reported_at": "2024-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path()).await;

        for path in ["/health", "/infrastructure/health"] {
            let response = router.clone().oneshot(get_request(path)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK, "{}", path);
        }
    }

    #[tokio::test]
    async fn test_execution_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path()).await;

        let create = serde_json::json!({
            "template_id": 1,
            "instance": { "tenant": "Some", "environment": "Prod" },
            "variable_overrides": { "ExecutionVariable": "EV" }
        });
        let (status, id) = send(&router, json_request("POST", "/api/v1/executions", create)).await;
        assert_eq!(status, StatusCode::OK);
        let id = id.as_i64().unwrap();

        let (status, checked) = send(
            &router,
            get_request("/api/v1/executions/Some/Prod/check?timeout=0"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(checked.as_i64(), Some(id));

        let (status, body) = send(
            &router,
            get_request("/api/v1/executions/Some/Prod/check?timeout=0"),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert!(body["error"].as_str().is_some());

        let (status, _) = send(
            &router,
            json_request(
                "PUT",
                &format!("/api/v1/executions/{}?result=Successed", id),
                step_state(1),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, execution) =
            send(&router, get_request(&format!("/api/v1/executions/{}", id))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(execution["state"], "Successed");
        assert_eq!(execution["steps_states"][0]["log"][0], "done");

        let (status, _) = send(
            &router,
            json_request("PUT", &format!("/api/v1/executions/{}", id), step_state(2)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_report_rejects_non_final_result() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path()).await;

        let create = serde_json::json!({
            "template_id": 1,
            "instance": { "tenant": "Some", "environment": "Prod" }
        });
        let (_, id) = send(&router, json_request("POST", "/api/v1/executions", create)).await;

        let (status, _) = send(
            &router,
            json_request(
                "PUT",
                &format!("/api/v1/executions/{}?result=Declined", id),
                step_state(1),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_unknown_execution_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path()).await;

        let (status, body) = send(&router, get_request("/api/v1/executions/99")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Execution 99 not found");
    }

    #[tokio::test]
    async fn test_template_with_unknown_step_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path()).await;

        let template = serde_json::json!({
            "name": "bad",
            "steps": [{ "order": 1, "name": "x", "type": "Bash", "command": "ls" }]
        });
        let (status, _) = send(&router, json_request("POST", "/api/v1/templates", template)).await;
        assert!(status.is_client_error());
    }

    #[tokio::test]
    async fn test_package_upload_and_latest() {
        let dir = tempfile::tempdir().unwrap();
        let router = test_router(dir.path()).await;

        for version in ["1.0.1", "1.0.10", "1.0.2"] {
            let boundary = "courier-boundary";
            let body = format!(
                "--{b}\r\nContent-Disposition: form-data; name=\"version\"\r\n\r\n{v}\r\n\
                 --{b}\r\nContent-Disposition: form-data; name=\"body\"; filename=\"app.zip\"\r\n\
                 Content-Type: application/zip\r\n\r\nbody-{v}\r\n--{b}--\r\n",
                b = boundary,
                v = version
            );
            let request = Request::builder()
                .method("POST")
                .uri("/api/v1/packages")
                .header(
                    "content-type",
                    format!("multipart/form-data; boundary={}", boundary),
                )
                .body(Body::from(body))
                .unwrap();

            let (status, id) = send(&router, request).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(id, format!("app.zip:{}", version));
        }

        let (status, package) = send(&router, get_request("/api/v1/packages/app.zip")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(package["version"], "1.0.10");
        assert_eq!(package["content_type"], "application/zip");

        let decoded: courier_core::domain::package::Package =
            serde_json::from_value(package).unwrap();
        assert_eq!(decoded.body, Some(b"body-1.0.10".to_vec()));

        let (status, list) = send(&router, get_request("/api/v1/packages")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(list.as_array().map(Vec::len), Some(3));
    }
}
