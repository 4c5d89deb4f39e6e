//! Session Driver
//!
//! One driver per connected client. It turns inbound messages into replies:
//! - Image payloads are decoded, classified, and folded into the statistics
//! - Reports are rendered every N classified frames, on request, and on close
//! - `ping` keepalives are answered with `pong`

pub mod config;
pub mod driver;
pub mod message;
pub mod schedule;

pub use config::SessionConfig;
pub use driver::{SessionDriver, SessionState};
pub use message::{InboundMessage, OutboundMessage};
pub use schedule::ReportSchedule;

use emotion_detect::DetectError;
use frame_intake::FrameError;
use report::ReportError;
use thiserror::Error;

/// Session error types.
///
/// The display text of the frame and classification variants is what the
/// client sees after `error:`.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("image decode failed: {0}")]
    Frame(#[from] FrameError),

    #[error("emotion recognition failed: {0}")]
    Classification(#[from] DetectError),

    #[error("emotion recognition failed: timed out after {timeout_ms} ms")]
    ClassificationTimeout { timeout_ms: u64 },

    #[error("{0}")]
    Report(#[from] ReportError),

    #[error("worker task failed: {0}")]
    Worker(String),

    #[error("payload of {size} bytes exceeds limit of {limit} bytes")]
    PayloadTooLarge { size: usize, limit: usize },

    #[error("session is closed")]
    Closed,
}
