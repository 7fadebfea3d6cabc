//! Decodes pushed frames into [`Message`]s and installs the default handler
//! set on the channel registry.  Decoding is pure; only the installed
//! closures touch the global dispatcher.

use serde_json::Value;

use crate::constants::*;
use crate::messages::Message;
use crate::network::channel::HandlerRegistry;
use crate::network::events::*;
use crate::state::dispatch_global_message;

/// Decode one pushed frame into the message the state machine understands.
/// Returns `None` for frames that carry no state change (`room_joined`) or
/// that fail to decode; decode failures are the caller's to log.
pub fn parse_event(event_name: &str, payload: &Value) -> Result<Option<Message>, serde_json::Error> {
    let msg = match event_name {
        EV_NEW_MESSAGE => {
            let ev: NewMessageEvent = serde_json::from_value(payload.clone())?;
            Some(Message::ReceiveNewMessage {
                ticket_id: ev.ticket_id,
                message: ev.message,
            })
        }
        EV_MESSAGE_DELETED => {
            let ev: MessageDeletedEvent = serde_json::from_value(payload.clone())?;
            Some(Message::ReceiveMessageDeleted {
                ticket_id: ev.ticket_id,
                message_timestamp: ev.message_timestamp,
            })
        }
        EV_TICKET_STATUS_UPDATED => {
            let ev: TicketStatusUpdatedEvent = serde_json::from_value(payload.clone())?;
            Some(Message::ReceiveTicketStatus {
                ticket_id: ev.ticket_id,
                new_status: ev.new_status,
            })
        }
        EV_TICKET_LIST_UPDATED => Some(Message::ReceiveTicketListChanged),
        EV_ACTION_SUCCESS => {
            let ev: ActionSuccessEvent = serde_json::from_value(payload.clone())?;
            Some(Message::ReceiveActionSuccess { detail: ev.detail })
        }
        EV_ERROR_MESSAGE => {
            let ev: ErrorMessageEvent = serde_json::from_value(payload.clone())?;
            Some(Message::ReceiveChannelError { message: ev.message })
        }
        EV_ROOM_JOINED => {
            // Acknowledgement only; nothing in the state changes.
            let ev: RoomJoinedEvent = serde_json::from_value(payload.clone())?;
            crate::debug_log!("Joined ticket room {}", ev.ticket_id);
            None
        }
        _ => None,
    };
    Ok(msg)
}

fn handle(event_name: &'static str, payload: Value) {
    match parse_event(event_name, &payload) {
        Ok(Some(msg)) => dispatch_global_message(msg),
        Ok(None) => {}
        Err(e) => {
            web_sys::console::error_1(
                &format!("Failed to decode '{}' frame: {}", event_name, e).into(),
            );
        }
    }
}

/// Install one handler per known event name.  Registration replaces by name,
/// so calling this again on reconnect leaves exactly one handler each.
pub fn register_default_handlers(registry: &mut HandlerRegistry) {
    const EVENTS: [&str; 7] = [
        EV_NEW_MESSAGE,
        EV_ROOM_JOINED,
        EV_ERROR_MESSAGE,
        EV_MESSAGE_DELETED,
        EV_TICKET_STATUS_UPDATED,
        EV_TICKET_LIST_UPDATED,
        EV_ACTION_SUCCESS,
    ];
    for event_name in EVENTS {
        registry.register(event_name, move |payload| handle(event_name, payload));
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::models::TicketStatus;

    #[test]
    fn new_message_frame_decodes() {
        let payload = serde_json::json!({
            "type": "new_message",
            "ticket_id": "t-1",
            "message": {
                "timestamp": "1700000000000",
                "sender_id": "u-9",
                "sender_username": "alice",
                "text": "hi"
            }
        });
        match parse_event(EV_NEW_MESSAGE, &payload).unwrap() {
            Some(Message::ReceiveNewMessage { ticket_id, message }) => {
                assert_eq!(ticket_id, "t-1");
                assert_eq!(message.sender_id.as_deref(), Some("u-9"));
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn status_update_frame_decodes() {
        let payload = serde_json::json!({
            "type": "ticket_status_updated",
            "ticket_id": "t-2",
            "new_status": "closed"
        });
        match parse_event(EV_TICKET_STATUS_UPDATED, &payload).unwrap() {
            Some(Message::ReceiveTicketStatus { ticket_id, new_status }) => {
                assert_eq!(ticket_id, "t-2");
                assert_eq!(new_status, TicketStatus::Closed);
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn list_update_carries_no_payload() {
        let payload = serde_json::json!({"type": "ticket_list_updated"});
        assert!(matches!(
            parse_event(EV_TICKET_LIST_UPDATED, &payload).unwrap(),
            Some(Message::ReceiveTicketListChanged)
        ));
    }

    #[test]
    fn action_success_detail_is_optional() {
        let payload = serde_json::json!({"type": "action_success"});
        match parse_event(EV_ACTION_SUCCESS, &payload).unwrap() {
            Some(Message::ReceiveActionSuccess { detail }) => assert_eq!(detail, None),
            other => panic!("unexpected: {:?}", other),
        }

        let payload = serde_json::json!({"type": "action_success", "detail": "Ticket closed"});
        match parse_event(EV_ACTION_SUCCESS, &payload).unwrap() {
            Some(Message::ReceiveActionSuccess { detail }) => {
                assert_eq!(detail.as_deref(), Some("Ticket closed"))
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn error_frame_accepts_alternate_keys() {
        let payload = serde_json::json!({"type": "error_message", "error": "denied"});
        match parse_event(EV_ERROR_MESSAGE, &payload).unwrap() {
            Some(Message::ReceiveChannelError { message }) => assert_eq!(message, "denied"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn malformed_frame_is_an_error_not_a_panic() {
        let payload = serde_json::json!({"type": "new_message", "ticket_id": 7});
        assert!(parse_event(EV_NEW_MESSAGE, &payload).is_err());
    }

    #[test]
    fn unknown_event_name_maps_to_nothing() {
        let payload = serde_json::json!({"type": "heartbeat"});
        assert!(parse_event("heartbeat", &payload).unwrap().is_none());
    }
}
