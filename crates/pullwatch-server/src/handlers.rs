use axum::{extract::State, http::StatusCode, response::Json};
use pullwatch_core::{query_gpus, GpuReport};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    pub message: String,
    pub status: String,
}

impl Message {
    fn new(message: &str, status: &str) -> Self {
        Self {
            message: message.to_string(),
            status: status.to_string(),
        }
    }
}

pub async fn home() -> Json<Message> {
    Json(Message::new("Hello World", "success"))
}

pub async fn not_found() -> (StatusCode, Json<Message>) {
    (
        StatusCode::NOT_FOUND,
        Json(Message::new("Route not found", "error")),
    )
}

/// Always 200: tool and parse failures come back as `{"error": ...}`.
pub async fn gpu_status(State(state): State<AppState>) -> Json<GpuReport> {
    let runner = state.runner.clone();
    let report = match tokio::task::spawn_blocking(move || query_gpus(runner.as_ref())).await {
        Ok(report) => report,
        Err(e) => {
            tracing::error!("GPU query task failed: {}", e);
            GpuReport::error(e.to_string())
        }
    };
    Json(report)
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::path::Path;
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use pullwatch_core::{CommandOutput, CommandRunner};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{router, AppState};

    struct FakeSmi {
        code: i32,
        stdout: &'static str,
    }

    impl CommandRunner for FakeSmi {
        fn run(&self, program: &str, _: &[&str], _: Option<&Path>) -> io::Result<CommandOutput> {
            assert_eq!(program, "nvidia-smi");
            Ok(CommandOutput {
                code: Some(self.code),
                stdout: self.stdout.to_string(),
                stderr: String::new(),
            })
        }
    }

    struct MissingTool;

    impl CommandRunner for MissingTool {
        fn run(&self, _: &str, _: &[&str], _: Option<&Path>) -> io::Result<CommandOutput> {
            Err(io::Error::new(io::ErrorKind::NotFound, "No such file or directory"))
        }
    }

    fn app(runner: impl CommandRunner + 'static) -> axum::Router {
        router(AppState::new(Arc::new(runner)))
    }

    async fn get(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let response = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_home() {
        let (status, body) = get(app(MissingTool), "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Hello World", "status": "success"}));
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let (status, body) = get(app(MissingTool), "/does-not-exist").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"message": "Route not found", "status": "error"}));
    }

    #[tokio::test]
    async fn test_gpu_samples() {
        let runner = FakeSmi {
            code: 0,
            stdout: "RTX X, 100, 8192, 60, 10\n",
        };
        let (status, body) = get(app(runner), "/gpu").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"gpus": [{
                "name": "RTX X",
                "memory_used": 100.0,
                "memory_total": 8192.0,
                "temperature": 60.0,
                "utilization": 10.0
            }]})
        );
    }

    #[tokio::test]
    async fn test_gpu_tool_error() {
        let runner = FakeSmi {
            code: 9,
            stdout: "",
        };
        let (status, body) = get(app(runner), "/gpu").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "No NVIDIA GPU found"}));
    }

    #[tokio::test]
    async fn test_gpu_tool_missing() {
        let (status, body) = get(app(MissingTool), "/gpu").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"error": "No NVIDIA GPU found"}));
    }

    #[tokio::test]
    async fn test_gpu_malformed_output() {
        let runner = FakeSmi {
            code: 0,
            stdout: "RTX X, lots, 8192, 60, 10\n",
        };
        let (status, body) = get(app(runner), "/gpu").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body["error"].as_str().unwrap().contains("memory.used"));
        assert!(body.get("gpus").is_none());
    }
}
