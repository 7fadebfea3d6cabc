//! Utility helpers shared across the WASM frontend.

use wasm_bindgen::JsValue;

/// Log out: best-effort notify the backend, clear the in-memory session and
/// reset the bootstrap flags so the next page load runs a fresh bootstrap.
///
/// The logout endpoint is best-effort by contract; a failed request must not
/// keep the user logged in locally.
pub fn logout() -> Result<(), JsValue> {
    crate::state::APP_STATE.with(|state_ref| {
        let mut state = state_ref.borrow_mut();
        state.session = crate::models::Session::logged_out();
        state.bootstrap.identity_check_done = false;
        state.bootstrap.config_load_done = false;
    });

    wasm_bindgen_futures::spawn_local(async {
        if let Err(e) = crate::network::ApiClient::logout().await {
            web_sys::console::warn_1(&format!("Logout request failed: {:?}", e).into());
        }
    });

    if let Some(window) = web_sys::window() {
        let _ = window.location().set_hash("#home");
        window.location().reload()?;
    }
    Ok(())
}

/// Console logging that compiles out of release builds.
#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(debug_assertions)]
        {
            web_sys::console::log_1(&format!($($t)*).into());
        }
    }};
}
