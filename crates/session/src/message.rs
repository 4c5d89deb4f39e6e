//! Wire messages
//!
//! Plain text frames in both directions; binary frames carry raw encoded
//! images.

use frame_intake::ImagePayload;
use std::fmt;
use std::path::PathBuf;

const REPORT_REQUEST: &str = "generate_report";
const PING: &str = "ping";
const IMAGE_PREFIX: &str = "data:image";

/// Message received from a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundMessage {
    Image(ImagePayload),
    GenerateReport,
    Ping,
    /// Anything else; logged and otherwise ignored
    Unrecognized(String),
}

impl InboundMessage {
    /// Classify a text message
    pub fn parse(text: &str) -> Self {
        if text.starts_with(IMAGE_PREFIX) {
            InboundMessage::Image(ImagePayload::DataUrl(text.to_string()))
        } else if text == REPORT_REQUEST {
            InboundMessage::GenerateReport
        } else if text == PING {
            InboundMessage::Ping
        } else {
            InboundMessage::Unrecognized(text.to_string())
        }
    }

    /// Wrap a binary message as an encoded image
    pub fn binary(bytes: Vec<u8>) -> Self {
        InboundMessage::Image(ImagePayload::Raw(bytes))
    }
}

/// Message sent back to a client
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OutboundMessage {
    /// Sequence number of a received image, sent before its result
    Frame(u64),
    /// Label reported by the classifier
    Emotion(String),
    NoFace,
    Error(String),
    Pong,
    ReportGenerated(PathBuf),
    ReportError(String),
}

impl fmt::Display for OutboundMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutboundMessage::Frame(n) => write!(f, "frame:{}", n),
            OutboundMessage::Emotion(label) => f.write_str(label),
            OutboundMessage::NoFace => f.write_str("no face detected"),
            OutboundMessage::Error(reason) => write!(f, "error:{}", reason),
            OutboundMessage::Pong => f.write_str("pong"),
            OutboundMessage::ReportGenerated(path) => {
                write!(f, "report_generated:{}", path.display())
            }
            OutboundMessage::ReportError(reason) => write!(f, "report_error:{}", reason),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_text_messages() {
        assert_eq!(InboundMessage::parse("ping"), InboundMessage::Ping);
        assert_eq!(
            InboundMessage::parse("generate_report"),
            InboundMessage::GenerateReport
        );
        assert!(matches!(
            InboundMessage::parse("data:image/jpeg;base64,AAAA"),
            InboundMessage::Image(ImagePayload::DataUrl(_))
        ));
    }

    #[test]
    fn test_near_misses_are_unrecognized() {
        for text in ["PING", "ping ", "generate_report\n", "data:text/plain,hi", ""] {
            assert_eq!(
                InboundMessage::parse(text),
                InboundMessage::Unrecognized(text.to_string())
            );
        }
    }

    #[test]
    fn test_binary_is_raw_image() {
        assert_eq!(
            InboundMessage::binary(vec![1, 2, 3]),
            InboundMessage::Image(ImagePayload::Raw(vec![1, 2, 3]))
        );
    }

    #[test]
    fn test_outbound_text() {
        assert_eq!(OutboundMessage::Frame(12).to_string(), "frame:12");
        assert_eq!(OutboundMessage::Emotion("fear".into()).to_string(), "fear");
        assert_eq!(OutboundMessage::NoFace.to_string(), "no face detected");
        assert_eq!(OutboundMessage::Error("boom".into()).to_string(), "error:boom");
        assert_eq!(OutboundMessage::Pong.to_string(), "pong");
        assert_eq!(
            OutboundMessage::ReportGenerated(PathBuf::from("reports/a.pdf")).to_string(),
            "report_generated:reports/a.pdf"
        );
        assert_eq!(
            OutboundMessage::ReportError("disk full".into()).to_string(),
            "report_error:disk full"
        );
    }
}
