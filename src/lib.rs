//! Storefront and support-ticket client.
//!
//! Single-page engine: a fragment router over six page sections, a bootstrap
//! sequencer that gates protected navigation behind identity and config
//! loads, a push channel with per-ticket rooms driving live chat updates,
//! and a context-menu controller for row-level actions.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;

pub mod bootstrap;
pub mod components;
pub mod constants;
pub mod dom_utils;
pub mod messages;
pub mod models;
pub mod network;
pub mod pages;
pub mod router;
pub mod state;
pub mod toast;
pub mod update;
pub mod utils;

#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    components::site_header::render(&document)?;
    pages::ensure_sections(&document)?;

    let doc_for_hash = document.clone();
    let on_hash_change = Closure::wrap(Box::new(move |_: web_sys::Event| {
        if let Err(e) = router::handle_fragment_change(&doc_for_hash) {
            web_sys::console::error_1(&format!("Navigation failed: {:?}", e).into());
        }
    }) as Box<dyn FnMut(web_sys::Event)>);
    window.add_event_listener_with_callback("hashchange", on_hash_change.as_ref().unchecked_ref())?;
    on_hash_change.forget();

    // First pass before the bootstrap: home (and other public targets) may
    // render immediately; protected targets defer until the sequencer
    // re-runs the router.
    router::handle_fragment_change(&document)?;

    spawn_local(bootstrap::run(document));

    Ok(())
}
