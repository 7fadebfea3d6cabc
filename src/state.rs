//! Global application state.
//!
//! Every singleton the engine mutates (session, site config, bootstrap
//! flags, navigation state, the cached ticket) lives inside one explicit
//! `AppState` struct.  Logic functions take `&AppState` / `&mut AppState`,
//! so only the thin wasm glue touches the `thread_local` cell.

use std::cell::RefCell;
use std::collections::HashMap;

use crate::messages::Message;
use crate::models::{Session, SiteConfig, Ticket};
use crate::router::Route;
use crate::update::update;

/// Monotonic per-phase completion flags.  Only an explicit logout resets
/// them (forcing a fresh bootstrap on the next load).
#[derive(Debug, Clone, Default)]
pub struct BootstrapFlags {
    pub identity_check_done: bool,
    pub config_load_done: bool,
}

impl BootstrapFlags {
    pub fn ready(&self) -> bool {
        self.identity_check_done && self.config_load_done
    }
}

/// Exactly one route is current at a time.  `generation` increases on every
/// recorded navigation; in-flight data loads capture it at start and discard
/// their response if it has advanced by completion time.
#[derive(Debug, Clone)]
pub struct NavigationState {
    pub route: Route,
    pub params: HashMap<String, String>,
    pub section_id: &'static str,
    pub generation: u64,
}

impl NavigationState {
    fn new() -> Self {
        Self {
            route: Route::Home,
            params: HashMap::new(),
            section_id: Route::Home.section_id(),
            generation: 0,
        }
    }

    pub fn record(&mut self, route: Route, params: HashMap<String, String>) {
        self.route = route;
        self.section_id = route.section_id();
        self.params = params;
        self.generation += 1;
    }
}

pub struct AppState {
    pub session: Session,
    pub site_config: SiteConfig,
    pub bootstrap: BootstrapFlags,
    pub nav: NavigationState,
    /// Read-mostly cache of the ticket currently displayed; discarded on
    /// navigation away, never kept across detail entries.
    pub current_ticket: Option<Ticket>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            session: Session::logged_out(),
            site_config: crate::constants::FALLBACK_SITE_CONFIG.clone(),
            bootstrap: BootstrapFlags::default(),
            nav: NavigationState::new(),
            current_ticket: None,
        }
    }

    /// Ticket id of the detail view currently on screen, if any.
    pub fn displayed_ticket_id(&self) -> Option<&str> {
        if self.nav.route == Route::TicketDetail {
            self.nav.params.get("id").map(|s| s.as_str())
        } else {
            None
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    pub static APP_STATE: RefCell<AppState> = RefCell::new(AppState::new());
}

/// Run the pure update step under the state borrow, then execute the
/// resulting DOM effects after the borrow has been dropped.  Keeping the two
/// phases apart is what prevents nested-borrow panics when an effect (e.g. a
/// list refresh) reads the state again.
pub fn dispatch_global_message(msg: Message) {
    let effects = APP_STATE.with(|state_ref| {
        let mut state = state_ref.borrow_mut();
        update(&mut state, msg)
    });
    crate::update::run_effects(effects);
}

/// Current navigation generation; captured by route data loads for the
/// stale-response guard.
pub fn nav_generation() -> u64 {
    APP_STATE.with(|s| s.borrow().nav.generation)
}

/// True when a data load started at `generation` is still the most recent
/// navigation and may apply its response.
pub fn generation_current(generation: u64) -> bool {
    nav_generation() == generation
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn generation_advances_on_every_record() {
        let mut state = AppState::new();
        assert_eq!(state.nav.generation, 0);
        state.nav.record(Route::Products, HashMap::new());
        state.nav.record(Route::Home, HashMap::new());
        assert_eq!(state.nav.generation, 2);
    }

    #[test]
    fn stale_generation_is_detected() {
        // Simulates a fetch completing after a superseding navigation.
        let mut state = AppState::new();
        state.nav.record(Route::Tickets, HashMap::new());
        let captured = state.nav.generation;
        state.nav.record(Route::Home, HashMap::new());
        assert_ne!(captured, state.nav.generation);
    }

    #[test]
    fn displayed_ticket_id_requires_detail_route() {
        let mut state = AppState::new();
        let mut params = HashMap::new();
        params.insert("id".to_string(), "abc123".to_string());
        state.nav.record(Route::TicketDetail, params.clone());
        assert_eq!(state.displayed_ticket_id(), Some("abc123"));

        state.nav.record(Route::Tickets, params);
        assert_eq!(state.displayed_ticket_id(), None);
    }

    #[test]
    fn bootstrap_flags_ready_only_when_both_set() {
        let mut flags = BootstrapFlags::default();
        assert!(!flags.ready());
        flags.identity_check_done = true;
        assert!(!flags.ready());
        flags.config_load_done = true;
        assert!(flags.ready());
    }
}
