//! Data model shared between the REST client, the push channel and the views.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Moderator,
    Admin,
}

/// Replaced wholesale on every identity check; cleared to the logged-out
/// default on logout or on any check failure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub logged_in: bool,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub avatar_ref: Option<String>,
    #[serde(default)]
    pub is_moderator: bool,
    #[serde(default)]
    pub roles: Vec<Role>,
}

impl Session {
    pub fn logged_out() -> Self {
        Self {
            logged_in: false,
            user_id: None,
            username: None,
            avatar_ref: None,
            is_moderator: false,
            roles: Vec::new(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::logged_out()
    }
}

// ---------------------------------------------------------------------------
// Site configuration
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeaderLink {
    pub name: String,
    pub href: String,
    #[serde(default)]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SiteConfig {
    pub title: String,
    #[serde(default)]
    pub icon_url: String,
    #[serde(default)]
    pub header_links: Vec<HeaderLink>,
}

// ---------------------------------------------------------------------------
// Tickets & chat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::Closed => "closed",
        }
    }
}

/// `timestamp` is the identity key within a ticket, both for DOM correlation
/// and server-side deletion addressing.  The backend does not guarantee
/// uniqueness for two messages produced within the same clock tick; we
/// preserve that behaviour rather than inventing a dedup scheme.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub timestamp: String,
    #[serde(default)]
    pub sender_id: Option<String>,
    pub sender_username: String,
    pub text: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    pub id: String,
    pub subject: String,
    pub status: TicketStatus,
    pub created_at: String,
    pub owner_username: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
}

/// Row shape returned by the ticket list endpoint (no embedded messages).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TicketSummary {
    pub id: String,
    pub subject: String,
    pub status: TicketStatus,
    pub created_at: String,
    pub owner_username: String,
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price_cents: i64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub device_type: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn session_deserializes_partial_payload() {
        // The identity endpoint may omit optional fields entirely.
        let s: Session =
            serde_json::from_str(r#"{"logged_in": true, "username": "alice"}"#).unwrap();
        assert!(s.logged_in);
        assert_eq!(s.username.as_deref(), Some("alice"));
        assert!(!s.is_moderator);
        assert!(s.roles.is_empty());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn ticket_status_round_trips_lowercase() {
        let t: TicketStatus = serde_json::from_str("\"closed\"").unwrap();
        assert_eq!(t, TicketStatus::Closed);
        assert_eq!(serde_json::to_string(&TicketStatus::Open).unwrap(), "\"open\"");
    }
}
