//! Per-connection session state machine

use emotion_detect::{Classification, EmotionClassifier};
use emotion_stats::SessionStats;
use frame_intake::{decode_payload, Frame, ImagePayload};
use report::ReportRenderer;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::message::{InboundMessage, OutboundMessage};
use crate::schedule::ReportSchedule;
use crate::{SessionConfig, SessionError};

/// Lifecycle of a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// Connected, nothing received yet
    Open,
    Receiving,
    /// Final report attempted; all input is rejected
    Closed,
}

/// Drives one client session.
///
/// Messages are handled one at a time. Classification and rendering run on
/// blocking workers and are awaited, so the statistics never change while a
/// report is being written. A classification that timed out keeps its worker
/// slot until the classifier returns; at most one classifier call per session
/// is running at any time.
pub struct SessionDriver {
    id: Uuid,
    config: SessionConfig,
    classifier: Arc<dyn EmotionClassifier>,
    renderer: Arc<ReportRenderer>,
    /// Held by the running classifier call, including abandoned ones
    classify_slot: Arc<Semaphore>,
    stats: SessionStats,
    schedule: ReportSchedule,
    frames_received: u64,
    state: SessionState,
}

impl SessionDriver {
    pub fn new(
        config: SessionConfig,
        classifier: Arc<dyn EmotionClassifier>,
        renderer: Arc<ReportRenderer>,
    ) -> Self {
        let id = Uuid::new_v4();
        info!("Session {} opened (classifier: {})", id, classifier.name());
        Self {
            id,
            schedule: ReportSchedule::new(config.report_interval),
            config,
            classifier,
            renderer,
            classify_slot: Arc::new(Semaphore::new(1)),
            stats: SessionStats::new(),
            frames_received: 0,
            state: SessionState::Open,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Image messages received, including ones that failed to decode
    pub fn frames_received(&self) -> u64 {
        self.frames_received
    }

    pub fn stats(&self) -> &SessionStats {
        &self.stats
    }

    /// Handle a text message
    pub async fn handle_text(&mut self, text: &str) -> Result<Vec<OutboundMessage>, SessionError> {
        self.handle(InboundMessage::parse(text)).await
    }

    /// Handle a binary message
    pub async fn handle_binary(
        &mut self,
        bytes: Vec<u8>,
    ) -> Result<Vec<OutboundMessage>, SessionError> {
        self.handle(InboundMessage::binary(bytes)).await
    }

    /// Handle one inbound message and return the replies in send order.
    ///
    /// Per-message failures become error replies; only a closed session
    /// returns `Err`.
    pub async fn handle(
        &mut self,
        message: InboundMessage,
    ) -> Result<Vec<OutboundMessage>, SessionError> {
        if self.state == SessionState::Closed {
            return Err(SessionError::Closed);
        }
        self.state = SessionState::Receiving;

        let replies = match message {
            InboundMessage::Image(payload) => self.handle_image(payload).await,
            InboundMessage::GenerateReport => match self.render().await {
                Ok(path) => vec![OutboundMessage::ReportGenerated(path)],
                Err(e) => vec![OutboundMessage::ReportError(e.to_string())],
            },
            InboundMessage::Ping => vec![OutboundMessage::Pong],
            InboundMessage::Unrecognized(text) => {
                debug!(
                    "Session {}: ignoring unrecognized message ({} bytes)",
                    self.id,
                    text.len()
                );
                Vec::new()
            }
        };
        Ok(replies)
    }

    async fn handle_image(&mut self, payload: ImagePayload) -> Vec<OutboundMessage> {
        self.frames_received += 1;
        let n = self.frames_received;
        metrics::counter!("emotion_frames_received_total").increment(1);

        if payload.len() > self.config.max_payload_bytes {
            let e = SessionError::PayloadTooLarge {
                size: payload.len(),
                limit: self.config.max_payload_bytes,
            };
            warn!("Session {}: frame {} rejected: {}", self.id, n, e);
            return vec![OutboundMessage::Error(e.to_string())];
        }

        let frame = match decode_payload(&payload, &self.config.intake, n) {
            Ok(frame) => frame,
            Err(e) => {
                let e = SessionError::from(e);
                warn!("Session {}: frame {}: {}", self.id, n, e);
                return vec![OutboundMessage::Error(e.to_string())];
            }
        };

        let result = match self.classify(frame).await {
            Ok(Classification::Emotion { label, confidence }) => {
                debug!(
                    "Session {}: frame {} classified as {} ({:.2})",
                    self.id, n, label, confidence
                );
                if self.stats.update(&label).is_some() {
                    metrics::counter!("emotion_frames_classified_total").increment(1);
                    if self.schedule.record() {
                        self.periodic_render().await;
                    }
                } else {
                    debug!("Session {}: label {:?} is not tracked", self.id, label);
                }
                OutboundMessage::Emotion(label)
            }
            Ok(Classification::NoFace) => OutboundMessage::NoFace,
            Err(e) => {
                error!("Session {}: frame {}: {}", self.id, n, e);
                OutboundMessage::Error(e.to_string())
            }
        };

        vec![OutboundMessage::Frame(n), result]
    }

    /// Classify on a blocking worker. The timeout covers waiting for the
    /// slot as well as the call itself.
    async fn classify(&self, frame: Frame) -> Result<Classification, SessionError> {
        let classifier = Arc::clone(&self.classifier);
        let slot = Arc::clone(&self.classify_slot);
        let task = async move {
            let permit = slot
                .acquire_owned()
                .await
                .map_err(|e| SessionError::Worker(e.to_string()))?;
            tokio::task::spawn_blocking(move || {
                let _permit = permit;
                classifier.classify(&frame)
            })
            .await
            .map_err(|e| SessionError::Worker(e.to_string()))
        };

        match tokio::time::timeout(self.config.classify_timeout(), task).await {
            Err(_) => {
                warn!(
                    "Session {}: classification timed out after {} ms, worker left to finish",
                    self.id, self.config.classify_timeout_ms
                );
                metrics::counter!("emotion_classification_timeouts_total").increment(1);
                Err(SessionError::ClassificationTimeout {
                    timeout_ms: self.config.classify_timeout_ms,
                })
            }
            Ok(Err(e)) => Err(e),
            Ok(Ok(result)) => Ok(result?),
        }
    }

    /// Render a report from a snapshot of the current statistics
    async fn render(&self) -> Result<PathBuf, SessionError> {
        let snapshot = self.stats.snapshot();
        let renderer = Arc::clone(&self.renderer);
        let result = tokio::task::spawn_blocking(move || renderer.render(&snapshot))
            .await
            .map_err(|e| SessionError::Worker(e.to_string()))
            .and_then(|rendered| rendered.map_err(SessionError::from));

        match &result {
            Ok(path) => {
                metrics::counter!("emotion_reports_generated_total").increment(1);
                info!("Session {}: report written to {}", self.id, path.display());
            }
            Err(e) => {
                metrics::counter!("emotion_report_failures_total").increment(1);
                error!("Session {}: report generation failed: {}", self.id, e);
            }
        }
        result
    }

    async fn periodic_render(&self) {
        debug!(
            "Session {}: periodic report after {} classified frames",
            self.id,
            self.schedule.counted()
        );
        // Logged inside render; the session carries on either way.
        let _ = self.render().await;
    }

    /// Final best-effort render. Later calls and messages are rejected.
    ///
    /// Returns the report path when the render succeeded.
    pub async fn close(&mut self) -> Option<PathBuf> {
        if self.state == SessionState::Closed {
            return None;
        }
        self.state = SessionState::Closed;
        info!(
            "Session {} closing after {} frames ({} classified)",
            self.id,
            self.frames_received,
            self.stats.total_frames()
        );
        self.render().await.ok()
    }
}
