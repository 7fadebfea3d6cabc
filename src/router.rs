//! Fragment router.
//!
//! Resolves the URL fragment into a route, enforces access control, extracts
//! parameters, drives the push-channel connect/disconnect policy and flips
//! page-section visibility.  The parsing helpers are pure so the grammar and
//! the guard rules can be tested off-browser.

use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::Document;

use crate::constants::*;
use crate::network::channel;
use crate::state::APP_STATE;
use crate::{pages, toast};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Home,
    Products,
    Tickets,
    Dashboard,
    TicketDetail,
    ProductDetail,
}

impl Route {
    /// Unknown names fall back to `Home`.
    pub fn from_name(name: &str) -> Self {
        match name {
            ROUTE_HOME => Route::Home,
            ROUTE_PRODUCTS => Route::Products,
            ROUTE_TICKETS => Route::Tickets,
            ROUTE_DASHBOARD => Route::Dashboard,
            ROUTE_TICKET_DETAIL => Route::TicketDetail,
            ROUTE_PRODUCT_DETAIL => Route::ProductDetail,
            _ => Route::Home,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Route::Home => ROUTE_HOME,
            Route::Products => ROUTE_PRODUCTS,
            Route::Tickets => ROUTE_TICKETS,
            Route::Dashboard => ROUTE_DASHBOARD,
            Route::TicketDetail => ROUTE_TICKET_DETAIL,
            Route::ProductDetail => ROUTE_PRODUCT_DETAIL,
        }
    }

    pub fn section_id(&self) -> &'static str {
        match self {
            Route::Home => SECTION_HOME,
            Route::Products => SECTION_PRODUCTS,
            Route::Tickets => SECTION_TICKETS,
            Route::Dashboard => SECTION_DASHBOARD,
            Route::TicketDetail => SECTION_TICKET_DETAIL,
            Route::ProductDetail => SECTION_PRODUCT_DETAIL,
        }
    }

    /// Routes that require a logged-in session and a completed bootstrap.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard | Route::Tickets | Route::TicketDetail)
    }

    /// Routes that keep the push channel open.  `Dashboard` is protected but
    /// not ticket-related; only the ticket views hold the channel.
    pub fn is_ticket_related(&self) -> bool {
        matches!(self, Route::Tickets | Route::TicketDetail)
    }

    pub fn requires_id(&self) -> bool {
        matches!(self, Route::TicketDetail | Route::ProductDetail)
    }

    /// List view a detail route falls back to when its id is missing.
    pub fn list_fallback(&self) -> Route {
        match self {
            Route::TicketDetail => Route::Tickets,
            Route::ProductDetail => Route::Products,
            other => *other,
        }
    }
}

// ---------------------------------------------------------------------------
// Fragment grammar: `#<routeName>[?key=value[&key=value...]]`
// ---------------------------------------------------------------------------

/// Split a raw fragment into `(route_name, query)`.  Strips the leading `#`
/// and any leading slashes; an empty name defaults to `home`.
pub fn parse_fragment(raw: &str) -> (String, String) {
    let trimmed = raw.strip_prefix('#').unwrap_or(raw);
    let trimmed = trimmed.trim_start_matches('/');
    let (name, query) = match trimmed.split_once('?') {
        Some((n, q)) => (n, q),
        None => (trimmed, ""),
    };
    let name = if name.is_empty() { ROUTE_HOME } else { name };
    (name.to_string(), query.to_string())
}

pub fn parse_query(query: &str) -> HashMap<String, String> {
    let mut params = HashMap::new();
    for pair in query.split('&') {
        if pair.is_empty() {
            continue;
        }
        match pair.split_once('=') {
            Some((k, v)) if !k.is_empty() => {
                params.insert(k.to_string(), v.to_string());
            }
            _ => {}
        }
    }
    params
}

/// Full resolution of a fragment string to `(route, params)`.
pub fn resolve(fragment: &str) -> (Route, HashMap<String, String>) {
    let (name, query) = parse_fragment(fragment);
    (Route::from_name(&name), parse_query(&query))
}

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// What the push channel should do when a route is shown.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelPlan {
    /// Hold the connection open, joining the given room if any.
    Connect { join: Option<String> },
    Disconnect,
}

/// Outcome of the access and parameter checks for one fragment change.
/// Pure data so the rules can be tested off-browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardOutcome {
    /// Bootstrap still running; wait for the sequencer to re-run the router.
    Defer,
    /// Protected route without a session: warn, then rewrite to `#home`
    /// (or render home in place when the fragment already targets it).
    DenyToHome { rewrite: bool },
    /// Detail route without an `id` parameter: warn and rewrite to the list.
    MissingId { fallback: Route },
    /// Show the route.  `skip_data_load` is the ticket-detail idempotence
    /// rule: re-entering the detail view for the ticket already loaded only
    /// re-confirms room membership.
    Show {
        channel: ChannelPlan,
        skip_data_load: bool,
    },
}

/// Decide what a fragment change does, given the route, its raw name, the
/// parsed params and a snapshot of the session and cache state.
pub fn guard(
    route: Route,
    name: &str,
    params: &HashMap<String, String>,
    flags_ready: bool,
    logged_in: bool,
    loaded_ticket_id: Option<&str>,
) -> GuardOutcome {
    if route.is_protected() && !flags_ready {
        return GuardOutcome::Defer;
    }
    if route.is_protected() && !logged_in {
        return GuardOutcome::DenyToHome {
            rewrite: name != ROUTE_HOME,
        };
    }
    if route.requires_id() && !params.contains_key("id") {
        return GuardOutcome::MissingId {
            fallback: route.list_fallback(),
        };
    }

    let skip_data_load = route == Route::TicketDetail
        && params.get("id").map(|s| s.as_str()) == loaded_ticket_id;

    // Channel policy: ticket views hold the connection (detail also joins
    // its room); navigating anywhere else tears it down.
    let channel = if route.is_ticket_related() {
        let join = if route == Route::TicketDetail {
            params.get("id").cloned()
        } else {
            None
        };
        ChannelPlan::Connect { join }
    } else {
        ChannelPlan::Disconnect
    };

    GuardOutcome::Show {
        channel,
        skip_data_load,
    }
}

// ---------------------------------------------------------------------------
// Handler
// ---------------------------------------------------------------------------

/// React to the current URL fragment.  Re-entrant via fragment rewrites: a
/// redirect sets the hash, which fires `hashchange`, which calls this again.
pub fn handle_fragment_change(document: &Document) -> Result<(), JsValue> {
    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let hash = window.location().hash().unwrap_or_default();
    let (name, query) = parse_fragment(&hash);
    let route = Route::from_name(&name);
    let params = parse_query(&query);

    let (flags_ready, logged_in, loaded_ticket_id) = APP_STATE.with(|s| {
        let state = s.borrow();
        (
            state.bootstrap.ready(),
            state.session.logged_in,
            state.current_ticket.as_ref().map(|t| t.id.clone()),
        )
    });

    match guard(
        route,
        &name,
        &params,
        flags_ready,
        logged_in,
        loaded_ticket_id.as_deref(),
    ) {
        GuardOutcome::Defer => {
            crate::debug_log!("Router: deferring '{}' until bootstrap completes", name);
            Ok(())
        }
        GuardOutcome::DenyToHome { rewrite } => {
            toast::error("Please sign in to view this page");
            if rewrite {
                // Rewriting the fragment re-triggers this handler for home.
                window.location().set_hash(&format!("#{}", ROUTE_HOME))?;
                return Ok(());
            }
            // Already targeting home: render it directly to avoid a rewrite loop.
            activate(document, Route::Home, HashMap::new(), false)
        }
        GuardOutcome::MissingId { fallback } => {
            match route {
                Route::ProductDetail => toast::error("Invalid product link"),
                Route::TicketDetail => toast::error("Invalid ticket link"),
                _ => {}
            }
            window
                .location()
                .set_hash(&format!("#{}", fallback.name()))?;
            Ok(())
        }
        GuardOutcome::Show {
            channel: plan,
            skip_data_load,
        } => {
            match plan {
                ChannelPlan::Connect { join } => channel::ensure_connected(join),
                ChannelPlan::Disconnect => channel::disconnect(),
            }
            activate(document, route, params, skip_data_load)
        }
    }
}

/// Record the navigation, flip section visibility and kick off the route's
/// data load (unless suppressed by the ticket-detail idempotence rule).
fn activate(
    document: &Document,
    route: Route,
    params: HashMap<String, String>,
    skip_data_load: bool,
) -> Result<(), JsValue> {
    let generation = APP_STATE.with(|s| {
        let mut state = s.borrow_mut();
        // The detail cache is per-entry: drop it on any transition except a
        // detail re-entry for the same id.
        if route != Route::TicketDetail || !skip_data_load {
            state.current_ticket = None;
        }
        state.nav.record(route, params.clone());
        state.nav.generation
    });

    pages::show_section(document, route.section_id())?;

    if !skip_data_load {
        pages::load_route(document, route, &params, generation);
    }
    Ok(())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn empty_fragment_defaults_to_home() {
        assert_eq!(resolve("").0, Route::Home);
        assert_eq!(resolve("#").0, Route::Home);
        assert_eq!(resolve("#/").0, Route::Home);
    }

    #[test]
    fn leading_slashes_are_stripped() {
        assert_eq!(resolve("#/tickets").0, Route::Tickets);
        assert_eq!(resolve("#//products").0, Route::Products);
    }

    #[test]
    fn unknown_route_names_fall_back_to_home() {
        assert_eq!(resolve("#checkout").0, Route::Home);
        assert_eq!(resolve("#TICKETS").0, Route::Home); // names are case-sensitive
    }

    #[test]
    fn query_params_are_extracted() {
        let (route, params) = resolve("#ticketDetail?id=abc123");
        assert_eq!(route, Route::TicketDetail);
        assert_eq!(params.get("id").map(|s| s.as_str()), Some("abc123"));
    }

    #[test]
    fn multiple_query_pairs_parse() {
        let params = parse_query("id=1&from=list&empty");
        assert_eq!(params.get("id").map(|s| s.as_str()), Some("1"));
        assert_eq!(params.get("from").map(|s| s.as_str()), Some("list"));
        assert!(!params.contains_key("empty"));
    }

    #[test]
    fn detail_routes_require_id() {
        assert!(Route::TicketDetail.requires_id());
        assert!(Route::ProductDetail.requires_id());
        assert!(!Route::Tickets.requires_id());
    }

    #[test]
    fn list_fallbacks() {
        assert_eq!(Route::TicketDetail.list_fallback(), Route::Tickets);
        assert_eq!(Route::ProductDetail.list_fallback(), Route::Products);
    }

    #[test]
    fn protected_and_ticket_related_sets() {
        assert!(Route::Dashboard.is_protected());
        assert!(Route::Tickets.is_protected());
        assert!(Route::TicketDetail.is_protected());
        assert!(!Route::Home.is_protected());
        assert!(!Route::Products.is_protected());

        assert!(Route::Tickets.is_ticket_related());
        assert!(Route::TicketDetail.is_ticket_related());
        assert!(!Route::Dashboard.is_ticket_related());
    }

    fn guard_fragment(
        fragment: &str,
        flags_ready: bool,
        logged_in: bool,
        loaded_ticket_id: Option<&str>,
    ) -> GuardOutcome {
        let (name, query) = parse_fragment(fragment);
        let route = Route::from_name(&name);
        let params = parse_query(&query);
        guard(route, &name, &params, flags_ready, logged_in, loaded_ticket_id)
    }

    #[test]
    fn protected_routes_defer_until_bootstrap_completes() {
        for fragment in ["#tickets", "#dashboard", "#ticketDetail?id=t1"] {
            assert_eq!(guard_fragment(fragment, false, false, None), GuardOutcome::Defer);
        }
        // Public routes render before the bootstrap finishes.
        assert!(matches!(
            guard_fragment("#products", false, false, None),
            GuardOutcome::Show { .. }
        ));
    }

    #[test]
    fn protected_routes_redirect_home_when_logged_out() {
        for fragment in ["#tickets", "#dashboard"] {
            assert_eq!(
                guard_fragment(fragment, true, false, None),
                GuardOutcome::DenyToHome { rewrite: true }
            );
        }
        // Home itself is public; a logged-out user still lands there.
        assert!(matches!(
            guard_fragment("#home", true, false, None),
            GuardOutcome::Show { .. }
        ));
    }

    #[test]
    fn ticket_detail_while_logged_out_never_reaches_the_channel() {
        // The denial decides everything: no Show outcome means no room join
        // and no data load for the denied fragment.
        let outcome = guard_fragment("#ticketDetail?id=abc123", true, false, None);
        assert_eq!(outcome, GuardOutcome::DenyToHome { rewrite: true });
    }

    #[test]
    fn detail_routes_without_an_id_fall_back_to_their_list() {
        assert_eq!(
            guard_fragment("#productDetail", true, false, None),
            GuardOutcome::MissingId { fallback: Route::Products }
        );
        assert_eq!(
            guard_fragment("#ticketDetail", true, true, None),
            GuardOutcome::MissingId { fallback: Route::Tickets }
        );
    }

    #[test]
    fn reentering_the_loaded_ticket_skips_the_data_load() {
        // Same id as the cached ticket: membership re-confirmed, one load total.
        assert_eq!(
            guard_fragment("#ticketDetail?id=abc123", true, true, Some("abc123")),
            GuardOutcome::Show {
                channel: ChannelPlan::Connect { join: Some("abc123".into()) },
                skip_data_load: true,
            }
        );
        // A different id (or an empty cache) loads again.
        assert_eq!(
            guard_fragment("#ticketDetail?id=abc123", true, true, Some("other")),
            GuardOutcome::Show {
                channel: ChannelPlan::Connect { join: Some("abc123".into()) },
                skip_data_load: false,
            }
        );
        assert_eq!(
            guard_fragment("#ticketDetail?id=abc123", true, true, None),
            GuardOutcome::Show {
                channel: ChannelPlan::Connect { join: Some("abc123".into()) },
                skip_data_load: false,
            }
        );
    }

    #[test]
    fn channel_plan_follows_the_route() {
        assert_eq!(
            guard_fragment("#tickets", true, true, None),
            GuardOutcome::Show {
                channel: ChannelPlan::Connect { join: None },
                skip_data_load: false,
            }
        );
        assert_eq!(
            guard_fragment("#dashboard", true, true, None),
            GuardOutcome::Show {
                channel: ChannelPlan::Disconnect,
                skip_data_load: false,
            }
        );
    }

    proptest! {
        #[test]
        fn unrecognized_names_always_resolve_to_home(name in "[a-zA-Z0-9_-]{1,24}") {
            prop_assume!(![
                ROUTE_HOME, ROUTE_PRODUCTS, ROUTE_TICKETS,
                ROUTE_DASHBOARD, ROUTE_TICKET_DETAIL, ROUTE_PRODUCT_DETAIL,
            ].contains(&name.as_str()));
            let (route, _) = resolve(&format!("#{}", name));
            prop_assert_eq!(route, Route::Home);
        }

        #[test]
        fn parsing_never_panics(raw in "\\PC{0,64}") {
            let _ = resolve(&raw);
        }
    }
}
