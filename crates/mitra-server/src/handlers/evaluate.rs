//! Evaluation streaming handler.

use std::sync::Arc;

use axum::body::Body;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::header;
use axum::response::{IntoResponse, Response};
use axum::Json;
use futures::StreamExt;
use mitra_core::{EvalError, EvaluationRequest};
use tracing::{error, info};

use crate::error::AppError;
use crate::ServerState;

/// Logs totals for one response body once it is finished or dropped.
struct BodyStats {
    model: String,
    chunks: usize,
    bytes: usize,
    failed: bool,
}

impl BodyStats {
    fn record(&mut self, piece: &Result<String, EvalError>) {
        match piece {
            Ok(text) => {
                self.chunks += 1;
                self.bytes += text.len();
            }
            Err(e) => {
                error!("Generation failed mid-stream: {}", e);
                self.failed = true;
            }
        }
    }
}

impl Drop for BodyStats {
    fn drop(&mut self) {
        info!(
            model = %self.model,
            chunks = self.chunks,
            bytes = self.bytes,
            failed = self.failed,
            "Evaluation stream closed"
        );
    }
}

/// Builds the rubric prompt and streams the generated evaluation as plain text.
pub async fn evaluate(
    State(state): State<Arc<ServerState>>,
    payload: Result<Json<EvaluationRequest>, JsonRejection>,
) -> Result<Response, AppError> {
    let generator = state.generator.clone().ok_or(AppError::MissingApiKey)?;
    let Json(request) = payload?;

    info!(
        "Evaluating answer: exam={}, phase={}, paper={}, marks={}, answer_len={}",
        request.config.exam,
        request.config.phase,
        request.config.paper,
        request.config.marks,
        request.answer.len()
    );

    let prompt = state.template.build(&request.config, &request.answer);
    let pieces = generator.generate_stream(&prompt).await.map_err(|e| {
        error!("Failed to start generation: {}", e);
        AppError::from(e)
    })?;

    let mut stats = BodyStats {
        model: generator.model().to_string(),
        chunks: 0,
        bytes: 0,
        failed: false,
    };
    // The stream owns the stats, so they are logged when the body is done.
    let body = pieces.map(move |piece| {
        stats.record(&piece);
        piece
    });

    Ok((
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (header::X_CONTENT_TYPE_OPTIONS, "nosniff"),
        ],
        Body::from_stream(body),
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::http::{Method, Request, StatusCode};
    use mitra_core::EvaluationConfig;
    use mitra_llm::{PromptTemplate, TextGenerator, TextStream};
    use tower::ServiceExt;
    use tracing_subscriber::fmt::MakeWriter;

    /// Collects formatted log output for assertions.
    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(logs.clone())
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .finish();
        let guard = tracing::subscriber::set_default(subscriber);
        (logs, guard)
    }

    struct FakeGenerator {
        pieces: Vec<Result<String, EvalError>>,
        start_error: Option<EvalError>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeGenerator {
        fn streaming(pieces: Vec<Result<String, EvalError>>) -> Self {
            Self { pieces, start_error: None, prompts: Mutex::new(Vec::new()) }
        }

        fn failing(error: EvalError) -> Self {
            Self { pieces: Vec::new(), start_error: Some(error), prompts: Mutex::new(Vec::new()) }
        }
    }

    #[async_trait]
    impl TextGenerator for FakeGenerator {
        fn model(&self) -> &str {
            "fake"
        }

        async fn generate_stream(&self, prompt: &str) -> Result<TextStream, EvalError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            if let Some(e) = &self.start_error {
                return Err(e.clone());
            }
            Ok(Box::pin(futures::stream::iter(self.pieces.clone())))
        }
    }

    fn state(generator: Option<Arc<FakeGenerator>>) -> Arc<ServerState> {
        Arc::new(ServerState {
            template: PromptTemplate::new("{exam}/{paper}/{marks}: {answer}"),
            generator: generator.map(|g| g as Arc<dyn TextGenerator>),
        })
    }

    fn request_body() -> String {
        let config = EvaluationConfig {
            exam: "UPSC".into(),
            phase: "Mains".into(),
            paper: "GS-2".into(),
            question: "Discuss federalism.".into(),
            ..Default::default()
        };
        serde_json::to_string(&EvaluationRequest::new(config, "Federalism is...")).unwrap()
    }

    fn post(body: impl Into<Body>) -> Request<Body> {
        Request::builder()
            .method(Method::POST)
            .uri("/api/evaluate")
            .header(header::CONTENT_TYPE, "application/json")
            .body(body.into())
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_streams_generated_text() {
        let generator = Arc::new(FakeGenerator::streaming(vec![
            Ok("## Score\n".into()),
            Ok("**7**/10".into()),
        ]));
        let app = crate::build_router(state(Some(generator.clone())));

        let response = app.oneshot(post(request_body())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "text/plain; charset=utf-8");
        assert_eq!(response.headers()[header::X_CONTENT_TYPE_OPTIONS], "nosniff");
        assert_eq!(body_text(response).await, "## Score\n**7**/10");
        assert_eq!(
            generator.prompts.lock().unwrap().as_slice(),
            ["UPSC/GS-2/10: Federalism is...".to_string()]
        );
    }

    #[tokio::test]
    async fn test_missing_api_key_is_json_error() {
        let app = crate::build_router(state(None));

        let response = app.oneshot(post(request_body())).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body, serde_json::json!({"error": "API_KEY environment variable is not set."}));
    }

    #[tokio::test]
    async fn test_malformed_json_is_bad_request() {
        let generator = Arc::new(FakeGenerator::streaming(Vec::new()));
        let app = crate::build_router(state(Some(generator.clone())));

        let response = app.oneshot(post("{\"config\": ")).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert!(body["error"].is_string());
        assert!(generator.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_generation_start_failure_is_internal_error() {
        let generator = Arc::new(FakeGenerator::failing(EvalError::Llm("quota exceeded".into())));
        let app = crate::build_router(state(Some(generator)));

        let response = app.oneshot(post(request_body())).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(body["error"], "LLM request failed: quota exceeded");
    }

    #[tokio::test]
    async fn test_mid_stream_failure_aborts_body() {
        let generator = Arc::new(FakeGenerator::streaming(vec![
            Ok("partial".into()),
            Err(EvalError::Llm("connection reset".into())),
        ]));
        let app = crate::build_router(state(Some(generator)));

        let response = app.oneshot(post(request_body())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX).await.is_err());
    }

    #[tokio::test]
    async fn test_wrong_method_is_rejected() {
        let app = crate::build_router(state(None));
        let request = Request::builder()
            .method(Method::GET)
            .uri("/api/evaluate")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn test_health() {
        let app = crate::build_router(state(None));
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_text(response).await, "OK");
    }

    #[tokio::test]
    async fn test_body_stats_logged_after_streaming() {
        let (logs, _guard) = capture_logs();
        let generator = Arc::new(FakeGenerator::streaming(vec![
            Ok("## Score\n".into()),
            Ok("**7**/10".into()),
        ]));
        let app = crate::build_router(state(Some(generator)));

        let response = app.oneshot(post(request_body())).await.unwrap();
        assert!(!logs.contents().contains("Evaluation stream closed"));

        assert_eq!(body_text(response).await, "## Score\n**7**/10");
        let output = logs.contents();
        assert!(output.contains("Evaluation stream closed"), "{output}");
        assert!(output.contains("chunks=2"), "{output}");
        assert!(output.contains("bytes=17"), "{output}");
        assert!(output.contains("failed=false"), "{output}");
    }

    #[tokio::test]
    async fn test_body_stats_record_mid_stream_failure() {
        let (logs, _guard) = capture_logs();
        let generator = Arc::new(FakeGenerator::streaming(vec![
            Ok("partial".into()),
            Err(EvalError::Llm("connection reset".into())),
        ]));
        let app = crate::build_router(state(Some(generator)));

        let response = app.oneshot(post(request_body())).await.unwrap();
        assert!(axum::body::to_bytes(response.into_body(), usize::MAX).await.is_err());

        let output = logs.contents();
        assert!(output.contains("chunks=1"), "{output}");
        assert!(output.contains("bytes=7"), "{output}");
        assert!(output.contains("failed=true"), "{output}");
    }
}
