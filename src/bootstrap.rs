//! Bootstrap sequencer: one run per page load.
//!
//! Phase 1 checks identity, phase 2 loads the site configuration, phase 3
//! re-runs the router so navigations deferred behind the completion flags
//! can proceed.  The phases are strictly sequential; each failure degrades
//! to a safe default and still sets its completion flag, so the router is
//! never deferred forever.

use web_sys::Document;

use crate::messages::Message;
use crate::models::Session;
use crate::network::ApiClient;
use crate::state::{dispatch_global_message, APP_STATE};
use crate::{router, toast};

pub async fn run(document: Document) {
    // Phase 1: identity.  A transport failure degrades to logged-out.
    match ApiClient::fetch_current_user().await {
        Ok(Some(session)) => {
            crate::debug_log!(
                "Bootstrap: signed in as {}",
                session.username.as_deref().unwrap_or("?")
            );
            dispatch_global_message(Message::SessionReplaced(session));
        }
        Ok(None) => {
            dispatch_global_message(Message::SessionReplaced(Session::logged_out()));
        }
        Err(e) => {
            web_sys::console::error_1(&format!("Identity check failed: {:?}", e).into());
            toast::error("Could not verify sign-in status");
            dispatch_global_message(Message::SessionReplaced(Session::logged_out()));
        }
    }
    APP_STATE.with(|s| s.borrow_mut().bootstrap.identity_check_done = true);

    // Phase 2: site configuration, starting only after phase 1 finished.
    // Failures fall back to the built-in default config.
    match ApiClient::fetch_site_config().await {
        Ok(config) => {
            dispatch_global_message(Message::SiteConfigReplaced(config));
        }
        Err(e) => {
            web_sys::console::warn_1(&format!("Site config load failed: {:?}", e).into());
            dispatch_global_message(Message::SiteConfigReplaced(
                crate::constants::FALLBACK_SITE_CONFIG.clone(),
            ));
        }
    }
    APP_STATE.with(|s| s.borrow_mut().bootstrap.config_load_done = true);

    // Phase 3: initial navigation.  Both flags are set now, so a protected
    // fragment that was deferred during the load proceeds (or is rejected
    // by the login guard).
    if let Err(e) = router::handle_fragment_change(&document) {
        web_sys::console::error_1(&format!("Initial navigation failed: {:?}", e).into());
    }
}
