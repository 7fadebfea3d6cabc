//! Message enum: the single seam through which realtime events and
//! bootstrap results reach the application state.

use crate::models::{ChatMessage, Session, SiteConfig, TicketStatus};

#[derive(Debug, Clone)]
pub enum Message {
    /// Identity check finished; the session is replaced wholesale.
    SessionReplaced(Session),
    /// Site configuration loaded (or fallback applied).
    SiteConfigReplaced(SiteConfig),

    // ---- pushed events -------------------------------------------------
    ReceiveNewMessage {
        ticket_id: String,
        message: ChatMessage,
    },
    ReceiveMessageDeleted {
        ticket_id: String,
        message_timestamp: String,
    },
    ReceiveTicketStatus {
        ticket_id: String,
        new_status: TicketStatus,
    },
    /// Generic add/remove signal; carries no payload beyond its arrival.
    ReceiveTicketListChanged,
    ReceiveActionSuccess {
        detail: Option<String>,
    },
    ReceiveChannelError {
        message: String,
    },
}
