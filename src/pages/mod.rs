//! Page sections.  One `<section>` element per route; the router flips their
//! visibility and calls the active page's loader.

pub mod dashboard;
pub mod home;
pub mod product_detail;
pub mod products;
pub mod ticket_detail;
pub mod tickets;

use std::collections::HashMap;

use wasm_bindgen::JsValue;
use web_sys::Document;

use crate::constants::*;
use crate::dom_utils;
use crate::router::Route;

const ALL_SECTIONS: [&str; 6] = [
    SECTION_HOME,
    SECTION_PRODUCTS,
    SECTION_TICKETS,
    SECTION_DASHBOARD,
    SECTION_TICKET_DETAIL,
    SECTION_PRODUCT_DETAIL,
];

/// Create the section containers once at startup, all hidden.
pub fn ensure_sections(document: &Document) -> Result<(), JsValue> {
    let body = document
        .body()
        .ok_or_else(|| JsValue::from_str("no document body"))?;
    for id in ALL_SECTIONS {
        if document.get_element_by_id(id).is_some() {
            continue;
        }
        let section = document.create_element("section")?;
        section.set_id(id);
        section.set_class_name("page-section hidden");
        body.append_child(&section)?;
    }
    Ok(())
}

/// Make exactly one section visible and hide every other.  The hide pass
/// runs first so no two sections are ever visible together.
pub fn show_section(document: &Document, section_id: &str) -> Result<(), JsValue> {
    for id in ALL_SECTIONS {
        if id != section_id {
            if let Some(el) = document.get_element_by_id(id) {
                dom_utils::hide(&el);
            }
        }
    }
    let target = dom_utils::require_el(document, section_id)?;
    dom_utils::show(&target);
    Ok(())
}

/// Kick off the data load for the route that just became active.
/// `generation` was recorded by the router; the async loaders discard their
/// response if a later navigation has advanced it.
pub fn load_route(
    document: &Document,
    route: Route,
    params: &HashMap<String, String>,
    generation: u64,
) {
    match route {
        Route::Home => home::render(document),
        Route::Products => products::load(document, generation),
        Route::Tickets => tickets::load(document),
        Route::Dashboard => dashboard::load(document, generation),
        Route::TicketDetail => {
            // The router guarantees an id is present for detail routes.
            if let Some(id) = params.get("id") {
                ticket_detail::load(document, id.clone(), generation);
            }
        }
        Route::ProductDetail => {
            if let Some(id) = params.get("id") {
                product_detail::load(document, id.clone(), generation);
            }
        }
    }
}
