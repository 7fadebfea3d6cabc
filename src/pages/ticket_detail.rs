//! Ticket detail section: subject, status, live chat thread and reply box.

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::Document;

use crate::components::chat_view;
use crate::constants::{ERROR_REDIRECT_DELAY_MS, ROUTE_TICKETS, SECTION_TICKET_DETAIL};
use crate::dom_utils;
use crate::models::Ticket;
use crate::network::ApiClient;
use crate::state::{self, APP_STATE};
use crate::toast;

pub fn load(document: &Document, ticket_id: String, generation: u64) {
    let document = document.clone();
    spawn_local(async move {
        let result = ApiClient::get_ticket(&ticket_id).await;
        if !state::generation_current(generation) {
            crate::debug_log!("Discarding stale ticket detail response for {}", ticket_id);
            return;
        }
        match result {
            Ok(Some(ticket)) => {
                APP_STATE.with(|s| s.borrow_mut().current_ticket = Some(ticket.clone()));
                if let Err(e) = render(&document, &ticket) {
                    web_sys::console::error_1(
                        &format!("Ticket detail render failed: {:?}", e).into(),
                    );
                }
            }
            Ok(None) => {
                // Gone or not ours: inline message, then back to the list.
                render_missing(&document, "This ticket is unavailable.");
                toast::error("Ticket not found");
                fall_back_to_list(generation).await;
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Ticket detail fetch failed: {:?}", e).into());
                render_missing(&document, "Could not load this ticket.");
                toast::error("Could not load the ticket");
                fall_back_to_list(generation).await;
            }
        }
    });
}

async fn fall_back_to_list(generation: u64) {
    TimeoutFuture::new(ERROR_REDIRECT_DELAY_MS).await;
    // The user may have navigated on their own during the delay.
    if !state::generation_current(generation) {
        return;
    }
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_hash(&format!("#{}", ROUTE_TICKETS));
    }
}

fn render(document: &Document, ticket: &Ticket) -> Result<(), JsValue> {
    let section = dom_utils::require_el(document, SECTION_TICKET_DETAIL)?;
    dom_utils::clear_children(&section);

    let heading = document.create_element("h2")?;
    heading.set_text_content(Some(&ticket.subject));
    section.append_child(&heading)?;

    let status = document.create_element("span")?;
    status.set_class_name("ticket-status");
    status.set_attribute("data-ticket-id", &ticket.id)?;
    status.set_attribute("data-ticket-status", ticket.status.as_str())?;
    status.set_text_content(Some(ticket.status.as_str()));
    section.append_child(&status)?;

    let messages = document.create_element("div")?;
    messages.set_id("chat-messages");
    messages.set_class_name("chat-messages");
    section.append_child(&messages)?;
    chat_view::render_messages(document, ticket)?;

    let send_box = document.create_element("div")?;
    send_box.set_class_name("chat-send-box");
    section.append_child(&send_box)?;
    chat_view::render_send_box(document, &send_box, &ticket.id)?;

    Ok(())
}

fn render_missing(document: &Document, text: &str) {
    if let Some(section) = document.get_element_by_id(SECTION_TICKET_DETAIL) {
        dom_utils::clear_children(&section);
        if let Ok(p) = document.create_element("p") {
            p.set_class_name("inline-error");
            p.set_text_content(Some(text));
            let _ = section.append_child(&p);
        }
    }
}
