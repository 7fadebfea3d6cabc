//! Wire types for the push channel.  Every frame is a flat JSON object with a
//! `type` discriminator; unknown extra fields are ignored on decode.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{ChatMessage, TicketStatus};

// ---------------------------------------------------------------------------
// Inbound events (server -> client)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct NewMessageEvent {
    pub ticket_id: String,
    pub message: ChatMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MessageDeletedEvent {
    pub ticket_id: String,
    pub message_timestamp: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TicketStatusUpdatedEvent {
    pub ticket_id: String,
    pub new_status: TicketStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RoomJoinedEvent {
    pub ticket_id: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ErrorMessageEvent {
    #[serde(alias = "detail", alias = "error")]
    pub message: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ActionSuccessEvent {
    #[serde(default)]
    pub detail: Option<String>,
}

// ---------------------------------------------------------------------------
// Outbound frames (client -> server)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct JoinTicketRoomFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub message_id: String,
    pub ticket_id: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SendMessageFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub message_id: String,
    pub ticket_id: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteMessageFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub message_id: String,
    pub ticket_id: String,
    pub message_timestamp: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct UpdateTicketStatusFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub message_id: String,
    pub ticket_id: String,
    pub new_status: TicketStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct DeleteTicketFrame {
    #[serde(rename = "type")]
    pub frame_type: &'static str,
    pub message_id: String,
    pub ticket_id: String,
}

/// Builders for outbound frames.  Each frame carries a fresh uuid so the
/// backend can correlate `action_success` / `error_message` replies.
pub mod builders {
    use super::*;
    use crate::constants::*;

    fn frame_id() -> String {
        Uuid::new_v4().to_string()
    }

    pub fn join_ticket_room(ticket_id: &str) -> JoinTicketRoomFrame {
        JoinTicketRoomFrame {
            frame_type: FRAME_JOIN_TICKET_ROOM,
            message_id: frame_id(),
            ticket_id: ticket_id.to_string(),
        }
    }

    pub fn send_message(ticket_id: &str, text: &str) -> SendMessageFrame {
        SendMessageFrame {
            frame_type: FRAME_SEND_MESSAGE,
            message_id: frame_id(),
            ticket_id: ticket_id.to_string(),
            text: text.to_string(),
        }
    }

    pub fn delete_message(ticket_id: &str, message_timestamp: &str) -> DeleteMessageFrame {
        DeleteMessageFrame {
            frame_type: FRAME_DELETE_MESSAGE,
            message_id: frame_id(),
            ticket_id: ticket_id.to_string(),
            message_timestamp: message_timestamp.to_string(),
        }
    }

    pub fn update_ticket_status(ticket_id: &str, new_status: TicketStatus) -> UpdateTicketStatusFrame {
        UpdateTicketStatusFrame {
            frame_type: FRAME_UPDATE_TICKET_STATUS,
            message_id: frame_id(),
            ticket_id: ticket_id.to_string(),
            new_status,
        }
    }

    pub fn delete_ticket(ticket_id: &str) -> DeleteTicketFrame {
        DeleteTicketFrame {
            frame_type: FRAME_DELETE_TICKET,
            message_id: frame_id(),
            ticket_id: ticket_id.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn new_message_event_decodes_flat_frame() {
        let raw = serde_json::json!({
            "type": "new_message",
            "ticket_id": "t-1",
            "message": {
                "timestamp": "1700000000000",
                "sender_username": "alice",
                "text": "hello"
            }
        });
        let ev: NewMessageEvent = serde_json::from_value(raw).unwrap();
        assert_eq!(ev.ticket_id, "t-1");
        assert_eq!(ev.message.sender_id, None);
        assert_eq!(ev.message.text, "hello");
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn error_event_accepts_detail_alias() {
        let ev: ErrorMessageEvent =
            serde_json::from_str(r#"{"type":"error_message","detail":"nope"}"#).unwrap();
        assert_eq!(ev.message, "nope");
    }
}
