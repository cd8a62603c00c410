//! # answer-mitra
//!
//! Streams an LLM evaluation of an exam answer and renders the growing text
//! as structured markdown while it arrives.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Mutex;
//! use mitra::prelude::*;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let client = EvaluationClient::new(&ClientConfig::from_env()?)?;
//! let config = EvaluationConfig {
//!     exam: "UPSC".into(),
//!     phase: normalize_phase("Descriptive Paper").into(),
//!     paper: "GS-2".into(),
//!     question: "Discuss cooperative federalism.".into(),
//!     ..Default::default()
//! };
//! let request = EvaluationRequest::new(config, "Federalism in India...");
//! request.validate()?;
//!
//! let slot = Mutex::new(SessionSlot::new());
//! client
//!     .run_session(&slot, request, |session| {
//!         for node in session.document() {
//!             println!("{}", node.plain_text());
//!         }
//!     })
//!     .await;
//! # Ok(())
//! # }
//! ```
//!
//! ## Crates
//!
//! - [`core`] — request types, validation and errors
//! - [`config`] — environment-driven client and server configuration
//! - [`render`] — incremental markdown renderer
//! - [`llm`] — prompt construction and the Gemini streaming client
//! - [`client`] — stream consumer and session model

pub use mitra_client as client;
pub use mitra_config as config;
pub use mitra_core as core;
pub use mitra_llm as llm;
pub use mitra_render as render;

/// Commonly used types.
pub mod prelude {
    pub use mitra_client::{EvaluationClient, Session, SessionId, SessionSlot, SessionStatus};
    pub use mitra_config::ClientConfig;
    pub use mitra_core::{normalize_phase, EvalError, EvaluationConfig, EvaluationRequest, ValidationError};
    pub use mitra_render::{render, DocumentNode, IncrementalRenderer, InlineSpan, ListKind};
}
