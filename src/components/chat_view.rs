//! Chat thread for the ticket detail view.  Rows are keyed by their
//! `data-timestamp` attribute, which is how pushed deletions find them.

use chrono::{TimeZone, Utc};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, HtmlInputElement, KeyboardEvent, MouseEvent};

use crate::components::context_menu::{self, MenuKind};
use crate::dom_utils;
use crate::models::{ChatMessage, Ticket};
use crate::network::channel;
use crate::network::events::builders;
use crate::toast;

const MESSAGES_ID: &str = "chat-messages";
const INPUT_ID: &str = "chat-input";
const SEND_ID: &str = "chat-send";

/// Millisecond-epoch timestamps render as a clock time; anything else is
/// shown verbatim.
fn format_timestamp(raw: &str) -> String {
    raw.parse::<i64>()
        .ok()
        .and_then(|ms| Utc.timestamp_millis_opt(ms).single())
        .map(|dt| dt.format("%H:%M").to_string())
        .unwrap_or_else(|| raw.to_string())
}

/// Rebuild the whole thread from the ticket cache.
pub fn render_messages(document: &Document, ticket: &Ticket) -> Result<(), JsValue> {
    let container = dom_utils::require_el(document, MESSAGES_ID)?;
    dom_utils::clear_children(&container);
    for message in &ticket.messages {
        let row = build_row(document, &ticket.id, message)?;
        container.append_child(&row)?;
    }
    Ok(())
}

/// Append one pushed message.  No-op when the thread container is not in the
/// page (the view changed while the event was in flight).
pub fn append_message(document: &Document, message: &ChatMessage) {
    let Some(container) = document.get_element_by_id(MESSAGES_ID) else {
        return;
    };
    let ticket_id = crate::state::APP_STATE
        .with(|s| s.borrow().displayed_ticket_id().map(str::to_string));
    let Some(ticket_id) = ticket_id else { return };
    match build_row(document, &ticket_id, message) {
        Ok(row) => {
            let _ = container.append_child(&row);
        }
        Err(e) => {
            web_sys::console::error_1(&format!("Failed to render message: {:?}", e).into());
        }
    }
}

/// Remove the first row carrying `timestamp`; silent no-op when none exists
/// (already removed, or never rendered).
pub fn remove_message(document: &Document, timestamp: &str) {
    let selector = format!("#{} [data-timestamp=\"{}\"]", MESSAGES_ID, timestamp);
    if let Ok(Some(row)) = document.query_selector(&selector) {
        let _ = row
            .parent_node()
            .map(|parent| parent.remove_child(&row));
    }
}

fn build_row(document: &Document, ticket_id: &str, message: &ChatMessage) -> Result<Element, JsValue> {
    let row = document.create_element("div")?;
    row.set_class_name("chat-message");
    row.set_attribute("data-timestamp", &message.timestamp)?;
    row.set_attribute("data-ticket-id", ticket_id)?;
    if let Some(sender_id) = &message.sender_id {
        row.set_attribute("data-sender-id", sender_id)?;
    }

    let meta = document.create_element("span")?;
    meta.set_class_name("chat-meta");
    meta.set_text_content(Some(&format!(
        "{} {}",
        message.sender_username,
        format_timestamp(&message.timestamp)
    )));
    row.append_child(&meta)?;

    let text = document.create_element("span")?;
    text.set_class_name("chat-text");
    text.set_text_content(Some(&message.text));
    row.append_child(&text)?;

    let row_for_menu = row.clone();
    let on_context = Closure::wrap(Box::new(move |event: MouseEvent| {
        event.prevent_default();
        if let Err(e) = context_menu::open(MenuKind::ChatMessage, &row_for_menu, &event) {
            web_sys::console::error_1(&format!("Failed to open message menu: {:?}", e).into());
        }
    }) as Box<dyn FnMut(MouseEvent)>);
    row.add_event_listener_with_callback("contextmenu", on_context.as_ref().unchecked_ref())?;
    on_context.forget();

    Ok(row)
}

/// Wire the send box for the given ticket.  Rebuilt on every detail entry,
/// so the input and button are recreated rather than re-listened.
pub fn render_send_box(
    document: &Document,
    container: &Element,
    ticket_id: &str,
) -> Result<(), JsValue> {
    let input = document.create_element("input")?;
    input.set_id(INPUT_ID);
    input.set_attribute("type", "text")?;
    input.set_attribute("placeholder", "Write a reply...")?;
    container.append_child(&input)?;

    let button = document.create_element("button")?;
    button.set_id(SEND_ID);
    button.set_text_content(Some("Send"));
    container.append_child(&button)?;

    let ticket_for_click = ticket_id.to_string();
    let on_click = Closure::wrap(Box::new(move |_: MouseEvent| {
        send_current_input(&ticket_for_click);
    }) as Box<dyn FnMut(MouseEvent)>);
    button.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let ticket_for_enter = ticket_id.to_string();
    let on_key = Closure::wrap(Box::new(move |event: KeyboardEvent| {
        if event.key() == "Enter" {
            send_current_input(&ticket_for_enter);
        }
    }) as Box<dyn FnMut(KeyboardEvent)>);
    input.add_event_listener_with_callback("keydown", on_key.as_ref().unchecked_ref())?;
    on_key.forget();

    Ok(())
}

fn send_current_input(ticket_id: &str) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let Some(input) = document.get_element_by_id(INPUT_ID) else {
        return;
    };
    let input: HtmlInputElement = match input.dyn_into() {
        Ok(i) => i,
        Err(_) => return,
    };
    let text = input.value();
    let trimmed = text.trim();
    if trimmed.is_empty() {
        toast::info("Nothing to send");
        return;
    }
    channel::send_frame(&builders::send_message(ticket_id, trimmed));
    input.set_value("");
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn millisecond_timestamps_render_as_clock_time() {
        // 2023-11-14 22:13:20 UTC
        assert_eq!(format_timestamp("1700000000000"), "22:13");
    }

    #[test]
    fn non_numeric_timestamps_pass_through() {
        assert_eq!(format_timestamp("just now"), "just now");
        assert_eq!(format_timestamp(""), "");
    }
}
