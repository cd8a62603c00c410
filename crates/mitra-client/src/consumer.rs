//! Evaluation stream consumer.

use std::fmt::Display;
use std::pin::Pin;

use futures::{Stream, StreamExt};
use mitra_config::ClientConfig;
use mitra_core::{EvalError, EvaluationRequest};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::decoder::Utf8Decoder;

/// Decoded text chunks in arrival order. Ends after the first error.
pub type ChunkStream = Pin<Box<dyn Stream<Item = Result<String, EvalError>> + Send>>;

#[derive(Deserialize)]
struct ErrorBody {
    error: Option<String>,
}

/// Runs a closure exactly once when dropped.
struct OnDrop<F: FnOnce()>(Option<F>);

impl<F: FnOnce()> Drop for OnDrop<F> {
    fn drop(&mut self) {
        if let Some(f) = self.0.take() {
            f();
        }
    }
}

/// HTTP client for the evaluation endpoint.
#[derive(Debug, Clone)]
pub struct EvaluationClient {
    http: reqwest::Client,
    endpoint: String,
}

impl EvaluationClient {
    pub fn new(config: &ClientConfig) -> Result<Self, EvalError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.connect_timeout {
            builder = builder.connect_timeout(timeout);
        }
        let http = builder.build().map_err(|e| EvalError::Transport(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.clone(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Streams one evaluation through three callbacks.
    ///
    /// `on_chunk` gets each decoded piece in order. `on_error` is called at
    /// most once, after which `on_chunk` is never called again. `on_done` is
    /// called exactly once on every path, including when this future is
    /// dropped mid-stream because the session was abandoned.
    pub async fn run<C, E, D>(&self, request: &EvaluationRequest, mut on_chunk: C, on_error: E, on_done: D)
    where
        C: FnMut(&str),
        E: FnOnce(EvalError),
        D: FnOnce(),
    {
        let _done = OnDrop(Some(on_done));

        let outcome = async {
            let mut chunks = self.stream(request).await?;
            while let Some(chunk) = chunks.next().await {
                on_chunk(&chunk?);
            }
            Ok::<(), EvalError>(())
        }
        .await;

        if let Err(e) = outcome {
            warn!("Evaluation stream failed: {}", e);
            on_error(e);
        }
    }

    /// Issues the request and returns the decoded body as a lazy stream.
    ///
    /// Non-success statuses and connection failures are returned here; read
    /// and decoding failures arrive as the stream's final item.
    pub async fn stream(&self, request: &EvaluationRequest) -> Result<ChunkStream, EvalError> {
        info!(
            "Submitting evaluation: exam={}, paper={}, answer_len={}",
            request.config.exam,
            request.config.paper,
            request.answer.len()
        );

        let response = self
            .http
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| EvalError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await.unwrap_or_default();
            return Err(server_error(status.as_u16(), &body));
        }

        Ok(decode_body(response.bytes_stream()))
    }
}

/// Builds the error for a non-success response, preferring the server's own message.
pub(crate) fn server_error(status: u16, body: &[u8]) -> EvalError {
    let message = serde_json::from_slice::<ErrorBody>(body)
        .ok()
        .and_then(|b| b.error)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("Server responded with status {status}"));

    EvalError::Server { status, message }
}

struct BodyState<S> {
    body: Pin<Box<S>>,
    decoder: Utf8Decoder,
    received: usize,
    done: bool,
}

/// Decodes a byte stream into text chunks, one chunk per byte piece.
pub(crate) fn decode_body<S, B, E>(body: S) -> ChunkStream
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: Display + Send + 'static,
{
    let state = BodyState {
        body: Box::pin(body),
        decoder: Utf8Decoder::new(),
        received: 0,
        done: false,
    };

    let chunks = futures::stream::unfold(state, |mut state| async move {
        if state.done {
            return None;
        }

        match state.body.next().await {
            Some(Ok(bytes)) => {
                let bytes = bytes.as_ref();
                state.received += bytes.len();
                let chunk = state.decoder.decode(bytes);
                state.done = chunk.is_err();
                Some((chunk, state))
            }
            Some(Err(e)) => {
                state.done = true;
                Some((Err(EvalError::Transport(e.to_string())), state))
            }
            None => {
                state.done = true;
                let end = match state.received {
                    0 => Err(EvalError::EmptyBody),
                    _ => state.decoder.finish(),
                };
                debug!("Evaluation body finished after {} bytes", state.received);
                match end {
                    Ok(()) => None,
                    Err(e) => Some((Err(e), state)),
                }
            }
        }
    });

    Box::pin(chunks)
}
