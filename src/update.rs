//! Pure update step plus the effect runner.
//!
//! `update` applies a `Message` to the application state and returns the DOM
//! effects the change requires.  It never touches `web_sys`, which keeps the
//! reconciliation rules testable off-browser; `run_effects` executes the
//! returned effects against the page.

use crate::messages::Message;
use crate::models::{ChatMessage, TicketStatus};
use crate::router::Route;
use crate::state::AppState;
use crate::toast::ToastKind;

/// DOM side effects produced by `update`.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    AppendChatMessage(ChatMessage),
    RemoveChatMessage { timestamp: String },
    RefreshTicketList,
    /// Patch the cached status attribute on a matching ticket-list row if one
    /// is present in the page, independent of which view is active.
    UpdateTicketRowStatus {
        ticket_id: String,
        status: TicketStatus,
    },
    ShowToast { kind: ToastKind, text: String },
    Redirect { fragment: String },
    RenderHeader,
}

pub fn update(state: &mut AppState, msg: Message) -> Vec<Effect> {
    match msg {
        Message::SessionReplaced(session) => {
            state.session = session;
            vec![Effect::RenderHeader]
        }

        Message::SiteConfigReplaced(config) => {
            state.site_config = config;
            vec![Effect::RenderHeader]
        }

        Message::ReceiveNewMessage { ticket_id, mut message } => {
            // Self-authored messages sometimes arrive without a sender id;
            // backfill it from the session when the username matches.
            if message.sender_id.is_none()
                && state.session.username.as_deref() == Some(message.sender_username.as_str())
            {
                message.sender_id = state.session.user_id.clone();
            }

            // Only relevant when the ticket is the one on screen; anything
            // else is dropped silently (no cross-ticket notification).
            // While the detail fetch is still in flight the cache is empty
            // and the DOM belongs to the previous view, so the message is
            // dropped too: appending there would be lost on the rebuild.
            if state.displayed_ticket_id() == Some(ticket_id.as_str()) {
                if let Some(ticket) = state.current_ticket.as_mut() {
                    ticket.messages.push(message.clone());
                    vec![Effect::AppendChatMessage(message)]
                } else {
                    Vec::new()
                }
            } else {
                Vec::new()
            }
        }

        Message::ReceiveMessageDeleted { ticket_id, message_timestamp } => {
            if state.displayed_ticket_id() != Some(ticket_id.as_str()) {
                return Vec::new();
            }
            if let Some(ticket) = state.current_ticket.as_mut() {
                // First match only; the timestamp key is not guaranteed
                // unique within a clock tick.
                if let Some(pos) = ticket
                    .messages
                    .iter()
                    .position(|m| m.timestamp == message_timestamp)
                {
                    ticket.messages.remove(pos);
                }
            }
            vec![Effect::RemoveChatMessage {
                timestamp: message_timestamp,
            }]
        }

        Message::ReceiveTicketStatus { ticket_id, new_status } => {
            let mut effects = Vec::new();
            match state.nav.route {
                Route::Tickets => effects.push(Effect::RefreshTicketList),
                Route::TicketDetail => {
                    if state.displayed_ticket_id() == Some(ticket_id.as_str()) {
                        if let Some(ticket) = state.current_ticket.as_mut() {
                            ticket.status = new_status;
                        }
                        effects.push(Effect::ShowToast {
                            kind: ToastKind::Info,
                            text: format!("Ticket status changed to {}", new_status.as_str()),
                        });
                    }
                }
                _ => {}
            }
            // Row patch happens regardless of the active view.
            effects.push(Effect::UpdateTicketRowStatus {
                ticket_id,
                status: new_status,
            });
            effects
        }

        Message::ReceiveTicketListChanged => match state.nav.route {
            Route::Tickets => vec![Effect::RefreshTicketList],
            // The signal carries no ticket id, so a detail view must assume
            // its own ticket may be the one removed.
            Route::TicketDetail => vec![
                Effect::ShowToast {
                    kind: ToastKind::Warning,
                    text: "This ticket may have been removed".to_string(),
                },
                Effect::Redirect {
                    fragment: format!("#{}", crate::constants::ROUTE_TICKETS),
                },
            ],
            _ => Vec::new(),
        },

        Message::ReceiveActionSuccess { detail } => vec![Effect::ShowToast {
            kind: ToastKind::Success,
            text: detail.unwrap_or_else(|| "Action completed".to_string()),
        }],

        Message::ReceiveChannelError { message } => vec![Effect::ShowToast {
            kind: ToastKind::Error,
            text: message,
        }],
    }
}

/// Execute effects against the DOM.  Called by `dispatch_global_message`
/// after the state borrow has been released.
pub fn run_effects(effects: Vec<Effect>) {
    let document = match web_sys::window().and_then(|w| w.document()) {
        Some(d) => d,
        None => return,
    };

    for effect in effects {
        match effect {
            Effect::AppendChatMessage(message) => {
                crate::components::chat_view::append_message(&document, &message);
            }
            Effect::RemoveChatMessage { timestamp } => {
                crate::components::chat_view::remove_message(&document, &timestamp);
            }
            Effect::RefreshTicketList => {
                crate::pages::tickets::load(&document);
            }
            Effect::UpdateTicketRowStatus { ticket_id, status } => {
                crate::pages::tickets::patch_row_status(&document, &ticket_id, status);
            }
            Effect::ShowToast { kind, text } => {
                crate::toast::show(&text, kind);
            }
            Effect::Redirect { fragment } => {
                if let Some(window) = web_sys::window() {
                    let _ = window.location().set_hash(&fragment);
                }
            }
            Effect::RenderHeader => {
                if let Err(e) = crate::components::site_header::render(&document) {
                    web_sys::console::warn_1(&format!("Header render failed: {:?}", e).into());
                }
            }
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use crate::models::{Session, Ticket};
    use std::collections::HashMap;

    fn msg(ts: &str, user: &str) -> ChatMessage {
        ChatMessage {
            timestamp: ts.to_string(),
            sender_id: None,
            sender_username: user.to_string(),
            text: "hi".to_string(),
        }
    }

    fn ticket(id: &str) -> Ticket {
        Ticket {
            id: id.to_string(),
            subject: "subject".to_string(),
            status: TicketStatus::Open,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            owner_username: "alice".to_string(),
            messages: Vec::new(),
        }
    }

    fn state_on_ticket(id: &str) -> AppState {
        let mut state = AppState::new();
        let mut params = HashMap::new();
        params.insert("id".to_string(), id.to_string());
        state.nav.record(Route::TicketDetail, params);
        state.current_ticket = Some(ticket(id));
        state
    }

    #[test]
    fn new_message_for_displayed_ticket_appends() {
        let mut state = state_on_ticket("t-1");
        let effects = update(
            &mut state,
            Message::ReceiveNewMessage {
                ticket_id: "t-1".to_string(),
                message: msg("100", "alice"),
            },
        );
        assert_eq!(effects.len(), 1);
        assert!(matches!(effects[0], Effect::AppendChatMessage(_)));
        assert_eq!(state.current_ticket.as_ref().unwrap().messages.len(), 1);
    }

    #[test]
    fn new_message_during_inflight_detail_fetch_is_dropped() {
        // Navigated to the detail view but the ticket fetch has not landed
        // yet: the cache is empty and the chat container still belongs to
        // the previous view, so nothing may be appended.
        let mut state = state_on_ticket("t-1");
        state.current_ticket = None;
        let effects = update(
            &mut state,
            Message::ReceiveNewMessage {
                ticket_id: "t-1".to_string(),
                message: msg("100", "alice"),
            },
        );
        assert!(effects.is_empty());
        assert!(state.current_ticket.is_none());
    }

    #[test]
    fn new_message_for_other_ticket_is_dropped() {
        let mut state = state_on_ticket("t-1");
        let effects = update(
            &mut state,
            Message::ReceiveNewMessage {
                ticket_id: "t-2".to_string(),
                message: msg("100", "alice"),
            },
        );
        assert!(effects.is_empty());
        assert!(state.current_ticket.as_ref().unwrap().messages.is_empty());
    }

    #[test]
    fn self_message_without_sender_id_gets_backfilled() {
        let mut state = state_on_ticket("t-1");
        state.session = Session {
            logged_in: true,
            user_id: Some("u-9".to_string()),
            username: Some("alice".to_string()),
            ..Session::logged_out()
        };
        let effects = update(
            &mut state,
            Message::ReceiveNewMessage {
                ticket_id: "t-1".to_string(),
                message: msg("100", "alice"),
            },
        );
        match &effects[0] {
            Effect::AppendChatMessage(m) => assert_eq!(m.sender_id.as_deref(), Some("u-9")),
            other => panic!("unexpected effect: {:?}", other),
        }
    }

    #[test]
    fn foreign_message_keeps_missing_sender_id() {
        let mut state = state_on_ticket("t-1");
        state.session.username = Some("alice".to_string());
        state.session.user_id = Some("u-9".to_string());
        let effects = update(
            &mut state,
            Message::ReceiveNewMessage {
                ticket_id: "t-1".to_string(),
                message: msg("100", "bob"),
            },
        );
        match &effects[0] {
            Effect::AppendChatMessage(m) => assert_eq!(m.sender_id, None),
            other => panic!("unexpected effect: {:?}", other),
        }
    }

    #[test]
    fn duplicate_timestamps_both_append() {
        // Documents the non-uniqueness of the timestamp key rather than
        // asserting correctness of it.
        let mut state = state_on_ticket("t-1");
        for _ in 0..2 {
            update(
                &mut state,
                Message::ReceiveNewMessage {
                    ticket_id: "t-1".to_string(),
                    message: msg("100", "alice"),
                },
            );
        }
        assert_eq!(state.current_ticket.as_ref().unwrap().messages.len(), 2);
    }

    #[test]
    fn message_deleted_for_other_ticket_is_noop() {
        let mut state = state_on_ticket("t-1");
        state.current_ticket.as_mut().unwrap().messages.push(msg("100", "alice"));
        let effects = update(
            &mut state,
            Message::ReceiveMessageDeleted {
                ticket_id: "t-2".to_string(),
                message_timestamp: "100".to_string(),
            },
        );
        assert!(effects.is_empty());
        assert_eq!(state.current_ticket.as_ref().unwrap().messages.len(), 1);
    }

    #[test]
    fn message_deleted_removes_first_match_only() {
        let mut state = state_on_ticket("t-1");
        let t = state.current_ticket.as_mut().unwrap();
        t.messages.push(msg("100", "alice"));
        t.messages.push(msg("100", "alice"));
        let effects = update(
            &mut state,
            Message::ReceiveMessageDeleted {
                ticket_id: "t-1".to_string(),
                message_timestamp: "100".to_string(),
            },
        );
        assert_eq!(
            effects,
            vec![Effect::RemoveChatMessage { timestamp: "100".to_string() }]
        );
        assert_eq!(state.current_ticket.as_ref().unwrap().messages.len(), 1);
    }

    #[test]
    fn status_change_on_list_view_refreshes_and_patches_row() {
        let mut state = AppState::new();
        state.nav.record(Route::Tickets, HashMap::new());
        let effects = update(
            &mut state,
            Message::ReceiveTicketStatus {
                ticket_id: "t-1".to_string(),
                new_status: TicketStatus::Closed,
            },
        );
        assert!(effects.contains(&Effect::RefreshTicketList));
        assert!(effects.contains(&Effect::UpdateTicketRowStatus {
            ticket_id: "t-1".to_string(),
            status: TicketStatus::Closed,
        }));
    }

    #[test]
    fn status_change_on_matching_detail_shows_toast_and_updates_cache() {
        let mut state = state_on_ticket("t-1");
        let effects = update(
            &mut state,
            Message::ReceiveTicketStatus {
                ticket_id: "t-1".to_string(),
                new_status: TicketStatus::Closed,
            },
        );
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::ShowToast { kind: ToastKind::Info, .. })));
        assert_eq!(
            state.current_ticket.as_ref().unwrap().status,
            TicketStatus::Closed
        );
    }

    #[test]
    fn status_change_elsewhere_only_patches_row() {
        let mut state = AppState::new();
        state.nav.record(Route::Home, HashMap::new());
        let effects = update(
            &mut state,
            Message::ReceiveTicketStatus {
                ticket_id: "t-1".to_string(),
                new_status: TicketStatus::Open,
            },
        );
        assert_eq!(
            effects,
            vec![Effect::UpdateTicketRowStatus {
                ticket_id: "t-1".to_string(),
                status: TicketStatus::Open,
            }]
        );
    }

    #[test]
    fn list_changed_on_detail_warns_and_redirects() {
        let mut state = state_on_ticket("t-1");
        let effects = update(&mut state, Message::ReceiveTicketListChanged);
        assert!(effects
            .iter()
            .any(|e| matches!(e, Effect::ShowToast { kind: ToastKind::Warning, .. })));
        assert!(effects.contains(&Effect::Redirect {
            fragment: "#tickets".to_string()
        }));
    }

    #[test]
    fn list_changed_on_unrelated_view_is_noop() {
        let mut state = AppState::new();
        state.nav.record(Route::Products, HashMap::new());
        assert!(update(&mut state, Message::ReceiveTicketListChanged).is_empty());
    }
}
