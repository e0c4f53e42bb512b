pub mod health;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::connectors::handlers as connectors;
use crate::state::AppState;
use crate::tasks::handlers as tasks;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Tasks API
        .route("/api/v1/tasks/resume", post(tasks::handle_resume))
        .route("/api/v1/tasks/cover-letter", post(tasks::handle_cover_letter))
        .route("/api/v1/tasks/email", post(tasks::handle_email))
        // Connectors API
        .route(
            "/api/v1/connectors",
            get(connectors::handle_list_connectors).delete(connectors::handle_clear),
        )
        .route(
            "/api/v1/connectors/:task",
            delete(connectors::handle_invalidate),
        )
        .route(
            "/api/v1/connectors/:task/reload",
            post(connectors::handle_reload),
        )
        .route(
            "/api/v1/connectors/:task/recover",
            post(connectors::handle_recover),
        )
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::*;
    use crate::tasks::test_support::test_state;

    const ENV: &[(&str, &str)] = &[
        ("RESUME_AGENT_CONNECTOR", "openai"),
        ("COVER_LETTER_AGENT_CONNECTOR", "huggingface"),
        ("OPENAI_CON_API_TOKEN", "sk"),
        ("OPENAI_CON_MODEL", "gpt-4o"),
        ("OPENAI_CON_MODEL_ALT", "gpt-4o-mini"),
        ("HUGGINGFACE_CON_TOKEN", "hf"),
        ("HUGGINGFACE_CON_MODEL", "mistralai/Mistral-7B-Instruct-v0.3"),
        ("CONNECTOR_PRECEDENCE", "openai,huggingface"),
    ];

    async fn send(app: Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(value) => Body::from(value.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_health() {
        let dir = tempfile::tempdir().unwrap();
        let t = test_state(ENV, "{}", None, dir.path());
        let (status, body) = send(build_router(t.state), "GET", "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_reload_then_list_connectors() {
        let dir = tempfile::tempdir().unwrap();
        let t = test_state(ENV, "{}", Some("switch model"), dir.path());
        let app = build_router(t.state.clone());

        let (status, body) = send(app.clone(), "POST", "/api/v1/connectors/cover-letter/reload", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["task"], "cover_letter");
        assert_eq!(body["backend"], "huggingface");

        let (status, body) = send(app, "GET", "/api/v1/connectors", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["decision_engine"], true);
        assert_eq!(body["connectors"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_connectors_is_ordered_by_task() {
        let dir = tempfile::tempdir().unwrap();
        let t = test_state(ENV, "{}", None, dir.path());
        let app = build_router(t.state.clone());

        send(app.clone(), "POST", "/api/v1/connectors/resume/reload", None).await;
        send(app.clone(), "POST", "/api/v1/connectors/cover-letter/reload", None).await;

        let (status, body) = send(app, "GET", "/api/v1/connectors", None).await;
        assert_eq!(status, StatusCode::OK);
        let tasks: Vec<&str> = body["connectors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|c| c["task"].as_str().unwrap())
            .collect();
        assert_eq!(tasks, vec!["cover_letter", "resume"]);
    }

    #[tokio::test]
    async fn test_invalidate_then_clear() {
        let dir = tempfile::tempdir().unwrap();
        let t = test_state(ENV, "{}", None, dir.path());
        let app = build_router(t.state.clone());

        let (status, _) = send(app.clone(), "POST", "/api/v1/connectors/resume/reload", None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(app.clone(), "DELETE", "/api/v1/connectors/resume", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(t.state.cache.handle("resume").is_none());

        let (status, _) = send(app.clone(), "DELETE", "/api/v1/connectors/resume", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        send(app.clone(), "POST", "/api/v1/connectors/resume/reload", None).await;
        let (status, _) = send(app, "DELETE", "/api/v1/connectors", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(t.state.cache.snapshot().is_empty());
    }

    #[tokio::test]
    async fn test_reload_without_backend_is_unprocessable() {
        let dir = tempfile::tempdir().unwrap();
        let t = test_state(ENV, "{}", None, dir.path());
        let (status, body) =
            send(build_router(t.state), "POST", "/api/v1/connectors/email/reload", None).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "CONNECTOR_ERROR");
    }

    #[tokio::test]
    async fn test_manual_recover_rotates_backend() {
        let dir = tempfile::tempdir().unwrap();
        let t = test_state(ENV, "{}", None, dir.path());
        let app = build_router(t.state.clone());

        let (status, body) = send(
            app,
            "POST",
            "/api/v1/connectors/resume/recover",
            Some(json!({ "action": "Switch Connector" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["action"], "RotateBackend");
        assert_eq!(body["connector"]["backend"], "huggingface");
        let handle = t.state.cache.handle("resume").unwrap();
        assert_eq!(handle.spec.canonical_name, "huggingface");
    }

    #[tokio::test]
    async fn test_manual_recover_rejects_unknown_phrase() {
        let dir = tempfile::tempdir().unwrap();
        let t = test_state(ENV, "{}", None, dir.path());
        let (status, body) = send(
            build_router(t.state),
            "POST",
            "/api/v1/connectors/resume/recover",
            Some(json!({ "action": "reboot the server" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_failed_task_returns_fail_outcome() {
        let dir = tempfile::tempdir().unwrap();
        let t = test_state(ENV, "{}", None, dir.path());
        let missing = dir.path().join("missing.tex");

        let (status, body) = send(
            build_router(t.state),
            "POST",
            "/api/v1/tasks/resume",
            Some(json!({
                "resume_file": missing,
                "job_role": "Backend Engineer",
                "job_description": "Rust"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["status"], "fail");
        assert!(body["payload"].is_null());
        assert!(body["error_message"]
            .as_str()
            .unwrap()
            .starts_with("Input file not found"));
    }

    #[tokio::test]
    async fn test_successful_task_returns_payload() {
        let dir = tempfile::tempdir().unwrap();
        let tex = dir.path().join("resume.tex");
        std::fs::write(&tex, "\\documentclass{article}").unwrap();
        let t = test_state(ENV, r#"{"latex_code": "\\documentclass{article}"}"#, None, dir.path());

        let (status, body) = send(
            build_router(t.state),
            "POST",
            "/api/v1/tasks/resume",
            Some(json!({
                "resume_file": tex,
                "job_role": "Backend Engineer",
                "job_description": "Rust"
            })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "success");
        assert!(body["payload"].as_str().unwrap().ends_with(".pdf"));
    }

    #[tokio::test]
    async fn test_blank_job_role_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let t = test_state(ENV, "{}", None, dir.path());
        let (status, _) = send(
            build_router(t.state),
            "POST",
            "/api/v1/tasks/resume",
            Some(json!({
                "resume_file": "resume.tex",
                "job_role": "  ",
                "job_description": "Rust"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
