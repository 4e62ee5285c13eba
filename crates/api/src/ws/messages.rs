//! JSON messages exchanged on `/ws/detect`.

use axum::extract::ws::Message;
use roadsign_core::detection::{DetectionBox, DetectionSummary};
use serde::{Deserialize, Serialize};

/// The only inbound message type that triggers work.
pub const DETECT_FRAME: &str = "detect_frame";

/// Inbound envelope. Fields other than `type` and `image` are ignored.
#[derive(Debug, Deserialize)]
pub struct ClientMessage {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub image: Option<String>,
}

/// Outbound events, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    ConnectionEstablished {
        message: String,
        authenticated: bool,
        username: Option<String>,
    },
    DetectionResult {
        detections: Vec<DetectionBox>,
        processing_time: f64,
        detections_count: usize,
        confidence_avg: f64,
        saved: bool,
    },
    Error {
        message: String,
    },
}

impl ServerEvent {
    pub fn connection_established(username: Option<String>) -> Self {
        ServerEvent::ConnectionEstablished {
            message: "Connected to traffic sign detection service".to_string(),
            authenticated: username.is_some(),
            username,
        }
    }

    pub fn detection_result(summary: DetectionSummary, saved: bool) -> Self {
        ServerEvent::DetectionResult {
            detections: summary.detections,
            processing_time: summary.processing_time,
            detections_count: summary.detections_count,
            confidence_avg: summary.confidence_avg,
            saved,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        ServerEvent::Error {
            message: message.into(),
        }
    }

    pub fn to_message(&self) -> Result<Message, serde_json::Error> {
        let json = serde_json::to_string(self)?;
        Ok(Message::Text(json.into()))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn events_are_tagged_in_snake_case() {
        let value = serde_json::to_value(ServerEvent::connection_established(None)).unwrap();
        assert_eq!(value["type"], "connection_established");
        assert_eq!(value["authenticated"], false);
        assert!(value["username"].is_null());

        let value = serde_json::to_value(ServerEvent::error("bad frame")).unwrap();
        assert_eq!(value, json!({"type": "error", "message": "bad frame"}));
    }

    #[test]
    fn empty_result_serializes_zeroes() {
        let summary = DetectionSummary::from_boxes(Vec::new(), 0.5);
        let value = serde_json::to_value(ServerEvent::detection_result(summary, false)).unwrap();
        assert_eq!(
            value,
            json!({
                "type": "detection_result",
                "detections": [],
                "processing_time": 0.5,
                "detections_count": 0,
                "confidence_avg": 0.0,
                "saved": false,
            })
        );
    }

    #[test]
    fn client_message_tolerates_missing_image_and_extra_fields() {
        let msg: ClientMessage =
            serde_json::from_str(r#"{"type": "detect_frame", "frame_id": 3}"#).unwrap();
        assert_eq!(msg.kind, DETECT_FRAME);
        assert!(msg.image.is_none());

        assert!(serde_json::from_str::<ClientMessage>(r#"{"image": "x"}"#).is_err());
    }
}
