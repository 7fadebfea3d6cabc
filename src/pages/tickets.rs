//! Ticket list section plus the new-ticket form.
//!
//! Rows carry `data-ticket-id` / `data-ticket-status` so pushed status
//! changes can patch them in place without a full refresh.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlInputElement, HtmlTextAreaElement, MouseEvent};

use crate::components::context_menu::{self, MenuKind};
use crate::constants::{ROUTE_TICKET_DETAIL, SECTION_TICKETS};
use crate::dom_utils;
use crate::models::{TicketStatus, TicketSummary};
use crate::network::ApiClient;
use crate::state;
use crate::toast;

const LIST_ID: &str = "ticket-list";
const SUBJECT_ID: &str = "new-ticket-subject";
const TEXT_ID: &str = "new-ticket-text";

/// Fetch and render the list.  Captures the navigation generation itself
/// because pushed `ticket_list_updated` events refresh outside the router.
pub fn load(document: &Document) {
    let document = document.clone();
    let generation = state::nav_generation();
    spawn_local(async move {
        let result = ApiClient::get_tickets().await;
        if !state::generation_current(generation) {
            crate::debug_log!("Discarding stale ticket list response");
            return;
        }
        match result {
            Ok(tickets) => {
                if let Err(e) = render(&document, &tickets) {
                    web_sys::console::error_1(&format!("Ticket list render failed: {:?}", e).into());
                }
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Ticket list fetch failed: {:?}", e).into());
                toast::error("Could not load your tickets");
            }
        }
    });
}

/// Patch the status attribute and badge on a matching row, if the row is in
/// the page at all.  Runs regardless of which view is active.
pub fn patch_row_status(document: &Document, ticket_id: &str, status: TicketStatus) {
    let selector = format!("[data-ticket-id=\"{}\"]", ticket_id);
    if let Ok(Some(row)) = document.query_selector(&selector) {
        let _ = row.set_attribute("data-ticket-status", status.as_str());
        if let Ok(Some(badge)) = row.query_selector(".ticket-status") {
            badge.set_text_content(Some(status.as_str()));
        }
    }
}

fn render(document: &Document, tickets: &[TicketSummary]) -> Result<(), JsValue> {
    let section = dom_utils::require_el(document, SECTION_TICKETS)?;
    dom_utils::clear_children(&section);

    let heading = document.create_element("h2")?;
    heading.set_text_content(Some("Support tickets"));
    section.append_child(&heading)?;

    let list = document.create_element("div")?;
    list.set_id(LIST_ID);
    if tickets.is_empty() {
        let empty = document.create_element("p")?;
        empty.set_text_content(Some("No tickets yet."));
        list.append_child(&empty)?;
    }
    for ticket in tickets {
        let row = build_row(document, ticket)?;
        list.append_child(&row)?;
    }
    section.append_child(&list)?;

    render_new_ticket_form(document, &section)?;
    Ok(())
}

fn build_row(document: &Document, ticket: &TicketSummary) -> Result<Element, JsValue> {
    let row = document.create_element("div")?;
    row.set_class_name("ticket-row");
    row.set_attribute("data-ticket-id", &ticket.id)?;
    row.set_attribute("data-ticket-status", ticket.status.as_str())?;

    let subject = document.create_element("span")?;
    subject.set_class_name("ticket-subject");
    subject.set_text_content(Some(&ticket.subject));
    row.append_child(&subject)?;

    let status = document.create_element("span")?;
    status.set_class_name("ticket-status");
    status.set_text_content(Some(ticket.status.as_str()));
    row.append_child(&status)?;

    let owner = document.create_element("span")?;
    owner.set_class_name("ticket-owner");
    owner.set_text_content(Some(&ticket.owner_username));
    row.append_child(&owner)?;

    let ticket_id = ticket.id.clone();
    let on_click = Closure::wrap(Box::new(move |_: MouseEvent| {
        if let Some(window) = web_sys::window() {
            let _ = window
                .location()
                .set_hash(&format!("#{}?id={}", ROUTE_TICKET_DETAIL, ticket_id));
        }
    }) as Box<dyn FnMut(MouseEvent)>);
    row.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let row_for_menu = row.clone();
    let on_context = Closure::wrap(Box::new(move |event: MouseEvent| {
        event.prevent_default();
        if let Err(e) = context_menu::open(MenuKind::Ticket, &row_for_menu, &event) {
            web_sys::console::error_1(&format!("Failed to open ticket menu: {:?}", e).into());
        }
    }) as Box<dyn FnMut(MouseEvent)>);
    row.add_event_listener_with_callback("contextmenu", on_context.as_ref().unchecked_ref())?;
    on_context.forget();

    Ok(row)
}

fn render_new_ticket_form(document: &Document, section: &Element) -> Result<(), JsValue> {
    let form = document.create_element("div")?;
    form.set_class_name("new-ticket-form");

    let subject = document.create_element("input")?;
    subject.set_id(SUBJECT_ID);
    subject.set_attribute("type", "text")?;
    subject.set_attribute("placeholder", "Subject")?;
    form.append_child(&subject)?;

    let text = document.create_element("textarea")?;
    text.set_id(TEXT_ID);
    text.set_attribute("placeholder", "Describe the problem")?;
    form.append_child(&text)?;

    let submit = document.create_element("button")?;
    submit.set_text_content(Some("Open ticket"));
    let on_click = Closure::wrap(Box::new(move |_: MouseEvent| {
        submit_new_ticket();
    }) as Box<dyn FnMut(MouseEvent)>);
    submit.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    form.append_child(&submit)?;

    section.append_child(&form)?;
    Ok(())
}

fn submit_new_ticket() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let subject = document
        .get_element_by_id(SUBJECT_ID)
        .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
        .map(|el| el.value())
        .unwrap_or_default();
    let text = document
        .get_element_by_id(TEXT_ID)
        .and_then(|el| el.dyn_into::<HtmlTextAreaElement>().ok())
        .map(|el| el.value())
        .unwrap_or_default();

    if subject.trim().is_empty() || text.trim().is_empty() {
        toast::info("Subject and description are both required");
        return;
    }

    spawn_local(async move {
        match ApiClient::create_ticket(subject.trim(), text.trim()).await {
            Ok(ticket) => {
                toast::success("Ticket created");
                if let Some(window) = web_sys::window() {
                    let _ = window
                        .location()
                        .set_hash(&format!("#{}?id={}", ROUTE_TICKET_DETAIL, ticket.id));
                }
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Ticket creation failed: {:?}", e).into());
                toast::error("Could not create the ticket");
            }
        }
    });
}
