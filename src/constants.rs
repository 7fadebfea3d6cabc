//! Route names, section ids, push-event names and timing constants shared
//! across the crate.

use crate::models::{HeaderLink, SiteConfig};

// ---------------------------------------------------------------------------
// Routes & sections
// ---------------------------------------------------------------------------

pub const ROUTE_HOME: &str = "home";
pub const ROUTE_PRODUCTS: &str = "products";
pub const ROUTE_TICKETS: &str = "tickets";
pub const ROUTE_DASHBOARD: &str = "dashboard";
pub const ROUTE_TICKET_DETAIL: &str = "ticketDetail";
pub const ROUTE_PRODUCT_DETAIL: &str = "productDetail";

pub const SECTION_HOME: &str = "section-home";
pub const SECTION_PRODUCTS: &str = "section-products";
pub const SECTION_TICKETS: &str = "section-tickets";
pub const SECTION_DASHBOARD: &str = "section-dashboard";
pub const SECTION_TICKET_DETAIL: &str = "section-ticket-detail";
pub const SECTION_PRODUCT_DETAIL: &str = "section-product-detail";

// ---------------------------------------------------------------------------
// Push-channel event vocabulary (server -> client)
// ---------------------------------------------------------------------------

pub const EV_NEW_MESSAGE: &str = "new_message";
pub const EV_ROOM_JOINED: &str = "room_joined";
pub const EV_ERROR_MESSAGE: &str = "error_message";
pub const EV_MESSAGE_DELETED: &str = "message_deleted";
pub const EV_TICKET_STATUS_UPDATED: &str = "ticket_status_updated";
pub const EV_TICKET_LIST_UPDATED: &str = "ticket_list_updated";
pub const EV_ACTION_SUCCESS: &str = "action_success";

// Client -> server frame types.
pub const FRAME_JOIN_TICKET_ROOM: &str = "join_ticket_room";
pub const FRAME_SEND_MESSAGE: &str = "send_message";
pub const FRAME_DELETE_MESSAGE: &str = "delete_message";
pub const FRAME_UPDATE_TICKET_STATUS: &str = "update_ticket_status";
pub const FRAME_DELETE_TICKET: &str = "delete_ticket";

// ---------------------------------------------------------------------------
// Timings
// ---------------------------------------------------------------------------

/// How long a toast stays on screen before fading out.
pub const TOAST_DISMISS_MS: i32 = 4000;

/// Delay before a failed detail view redirects back to its list view.
pub const ERROR_REDIRECT_DELAY_MS: u32 = 2500;

/// Reconnection policy for the push channel.  After `WS_MAX_RECONNECT_ATTEMPTS`
/// failed attempts the client goes quiet until the next navigation calls
/// `ensure_connected` again.
pub const WS_INITIAL_BACKOFF_MS: u32 = 1000;
pub const WS_MAX_BACKOFF_MS: u32 = 30000;
pub const WS_MAX_RECONNECT_ATTEMPTS: u32 = 5;

/// Sentinel on a product element's `data-category` attribute that marks it
/// as firmware-capable hardware.
pub const HARDWARE_CATEGORY_SENTINEL: &str = "hardware";

// ---------------------------------------------------------------------------
// Fallback site configuration
// ---------------------------------------------------------------------------

lazy_static::lazy_static! {
    /// Applied whenever the config load fails so the page never renders
    /// without a header.
    pub static ref FALLBACK_SITE_CONFIG: SiteConfig = SiteConfig {
        title: "Storefront".to_string(),
        icon_url: "/favicon.ico".to_string(),
        header_links: vec![
            HeaderLink { name: "Products".to_string(), href: "#products".to_string(), target: None },
            HeaderLink { name: "Support".to_string(), href: "#tickets".to_string(), target: None },
        ],
    };
}
