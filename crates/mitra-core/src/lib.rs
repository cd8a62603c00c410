//! Core domain types and error definitions for answer-mitra.
//!
//! This crate provides the types shared by the client, the server and the
//! LLM layer:
//!
//! - [`EvaluationConfig`] and [`EvaluationRequest`] — what the user submits
//! - [`ValidationError`] — pre-flight form checks
//! - [`EvalError`] — failures of an evaluation stream
//!
//! # Example
//!
//! ```rust
//! use mitra_core::{EvaluationConfig, EvaluationRequest};
//!
//! let config = EvaluationConfig {
//!     exam: "UPSC".to_string(),
//!     phase: "Mains".to_string(),
//!     paper: "GS-2".to_string(),
//!     section: String::new(),
//!     question: "Discuss cooperative federalism.".to_string(),
//!     marks: 10,
//!     word_limit: 150,
//! };
//!
//! let request = EvaluationRequest::new(config, "Federalism in India...");
//! assert!(request.validate().is_ok());
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur while requesting or consuming an evaluation stream.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EvalError {
    /// Network failure before or during the response.
    #[error("Network request failed: {0}")]
    Transport(String),

    /// Non-success status from the evaluation endpoint. Displays the message verbatim.
    #[error("{message}")]
    Server { status: u16, message: String },

    /// A success response that carried no body bytes.
    #[error("The response body is empty.")]
    EmptyBody,

    /// Response bytes were not valid UTF-8.
    #[error("Failed to decode response text: {0}")]
    Decoding(String),

    /// LLM provider request failed.
    #[error("LLM request failed: {0}")]
    Llm(String),
}

/// Caller-side form validation failures. These never reach the stream consumer.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Please fill in the {0}.")]
    MissingField(&'static str),

    #[error("{0} must be greater than zero.")]
    NotPositive(&'static str),
}

/// Exam and paper settings for one evaluation.
///
/// Serialises with the field names the evaluation endpoint expects
/// (`wordLimit` is camel-cased on the wire).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EvaluationConfig {
    pub exam: String,
    pub phase: String,
    pub paper: String,
    #[serde(default)]
    pub section: String,
    pub question: String,
    pub marks: u32,
    pub word_limit: u32,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            exam: String::new(),
            phase: String::new(),
            paper: String::new(),
            section: String::new(),
            question: String::new(),
            marks: 10,
            word_limit: 150,
        }
    }
}

/// Immutable snapshot of one submission: the config plus the answer text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRequest {
    pub config: EvaluationConfig,
    pub answer: String,
}

impl EvaluationRequest {
    pub fn new(config: EvaluationConfig, answer: impl Into<String>) -> Self {
        Self { config, answer: answer.into() }
    }

    /// Checks the fields the form marks as required.
    ///
    /// Whitespace-only text counts as missing.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.config.question.trim().is_empty() {
            return Err(ValidationError::MissingField("Question/Topic"));
        }
        if self.config.paper.trim().is_empty() {
            return Err(ValidationError::MissingField("Paper Name"));
        }
        if self.answer.trim().is_empty() {
            return Err(ValidationError::MissingField("Answer"));
        }
        if self.config.marks == 0 {
            return Err(ValidationError::NotPositive("Marks Allotted"));
        }
        if self.config.word_limit == 0 {
            return Err(ValidationError::NotPositive("Word Limit"));
        }
        Ok(())
    }
}

/// Maps a paper-type label from the form onto the phase name the rubric uses.
///
/// Unknown labels pass through unchanged.
pub fn normalize_phase(paper_type: &str) -> &str {
    match paper_type {
        "Descriptive Paper" | "Case Study" => "Mains",
        "Essay" => "Essay",
        "Optional Subject" => "Optional",
        other => other,
    }
}
