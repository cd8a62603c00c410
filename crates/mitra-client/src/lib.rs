//! Client side of answer-mitra: consumes the streamed evaluation body.
//!
//! - [`EvaluationClient`] — posts a request and delivers decoded chunks through callbacks
//! - [`Utf8Decoder`] — boundary-safe byte to text decoding
//! - [`SessionSlot`] — holds the active session and discards updates from superseded ones

mod consumer;
mod decoder;
mod session;

pub use consumer::{ChunkStream, EvaluationClient};
pub use decoder::Utf8Decoder;
pub use session::{Session, SessionId, SessionSlot, SessionStatus};
