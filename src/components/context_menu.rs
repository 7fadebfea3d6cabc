//! Context menu controller.
//!
//! At most one menu is visible at a time; `open` always closes the previous
//! one and rebuilds the payload from scratch, so no field from an earlier
//! menu can leak into the next action handler.  Item visibility, payload
//! extraction and viewport clamping are pure functions; only the thin shell
//! around them touches the DOM.

use std::cell::RefCell;

use gloo_timers::callback::Timeout;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{AddEventListenerOptions, Document, Element, HtmlElement, MouseEvent};

use crate::constants::HARDWARE_CATEGORY_SENTINEL;
use crate::models::{Session, TicketStatus};
use crate::network::channel;
use crate::network::events::builders;
use crate::state::APP_STATE;
use crate::toast;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuKind {
    ChatMessage,
    Ticket,
    Product,
    Order,
}

/// One field set shared by every menu kind; `build_payload` fills only the
/// fields the kind uses and leaves the rest at their cleared default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MenuPayload {
    pub ticket_id: Option<String>,
    pub message_timestamp: Option<String>,
    pub sender_id: Option<String>,
    pub ticket_status: Option<TicketStatus>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub order_id: Option<String>,
    pub device_type: Option<String>,
}

/// Raw `data-*` attributes read off the right-clicked element.
#[derive(Debug, Clone, Default)]
pub struct TargetData {
    pub ticket_id: Option<String>,
    pub message_timestamp: Option<String>,
    pub sender_id: Option<String>,
    pub ticket_status: Option<String>,
    pub product_id: Option<String>,
    pub product_name: Option<String>,
    pub order_id: Option<String>,
    pub device_type: Option<String>,
    pub category: Option<String>,
}

impl TargetData {
    fn from_element(el: &Element) -> Self {
        let Some(html) = el.dyn_ref::<HtmlElement>() else {
            return Self::default();
        };
        let ds = html.dataset();
        Self {
            ticket_id: ds.get("ticketId"),
            message_timestamp: ds.get("messageTimestamp"),
            sender_id: ds.get("senderId"),
            ticket_status: ds.get("ticketStatus"),
            product_id: ds.get("productId"),
            product_name: ds.get("productName"),
            order_id: ds.get("orderId"),
            device_type: ds.get("deviceType"),
            category: ds.get("category"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    DeleteMessage,
    OpenTicket,
    CloseTicket,
    ReopenTicket,
    DeleteTicket,
    ViewProduct,
    RequestFirmware,
    ReportOrderProblem,
}

impl MenuAction {
    pub fn label(&self) -> &'static str {
        match self {
            MenuAction::DeleteMessage => "Delete message",
            MenuAction::OpenTicket => "Open ticket",
            MenuAction::CloseTicket => "Close ticket",
            MenuAction::ReopenTicket => "Reopen ticket",
            MenuAction::DeleteTicket => "Delete ticket",
            MenuAction::ViewProduct => "View product",
            MenuAction::RequestFirmware => "Request firmware package",
            MenuAction::ReportOrderProblem => "Report a problem",
        }
    }
}

/// Preconditions checked before anything renders: the chat-message menu is a
/// moderation surface, the ticket and order menus need an account.
pub fn preconditions_hold(kind: MenuKind, session: &Session) -> bool {
    match kind {
        MenuKind::ChatMessage => session.logged_in && session.is_moderator,
        MenuKind::Ticket | MenuKind::Order => session.logged_in,
        MenuKind::Product => true,
    }
}

/// Copy only the fields this menu kind uses; everything else stays cleared.
pub fn build_payload(kind: MenuKind, data: &TargetData) -> MenuPayload {
    let mut payload = MenuPayload::default();
    match kind {
        MenuKind::ChatMessage => {
            payload.ticket_id = data.ticket_id.clone();
            payload.message_timestamp = data.message_timestamp.clone();
            payload.sender_id = data.sender_id.clone();
        }
        MenuKind::Ticket => {
            payload.ticket_id = data.ticket_id.clone();
            payload.ticket_status = match data.ticket_status.as_deref() {
                Some("open") => Some(TicketStatus::Open),
                Some("closed") => Some(TicketStatus::Closed),
                _ => None,
            };
        }
        MenuKind::Product => {
            payload.product_id = data.product_id.clone();
            payload.product_name = data.product_name.clone();
            payload.device_type = data.device_type.clone();
        }
        MenuKind::Order => {
            payload.order_id = data.order_id.clone();
        }
    }
    payload
}

/// Item visibility is decided here from the payload and the session, never
/// hard-coded per menu instance.
pub fn visible_items(
    kind: MenuKind,
    payload: &MenuPayload,
    session: &Session,
    category: Option<&str>,
) -> Vec<MenuAction> {
    match kind {
        MenuKind::ChatMessage => vec![MenuAction::DeleteMessage],
        MenuKind::Ticket => {
            let mut items = vec![MenuAction::OpenTicket];
            if payload.ticket_status == Some(TicketStatus::Open) {
                items.push(MenuAction::CloseTicket);
            }
            if session.is_moderator && payload.ticket_status == Some(TicketStatus::Closed) {
                items.push(MenuAction::ReopenTicket);
            }
            if session.is_moderator {
                items.push(MenuAction::DeleteTicket);
            }
            items
        }
        MenuKind::Product => {
            let mut items = vec![MenuAction::ViewProduct];
            if category == Some(HARDWARE_CATEGORY_SENTINEL) && payload.device_type.is_some() {
                items.push(MenuAction::RequestFirmware);
            }
            items
        }
        MenuKind::Order => vec![MenuAction::ReportOrderProblem],
    }
}

/// Clamp the menu's top-left corner so its box stays inside the viewport.
/// Overflow right/bottom flips the menu to the other side of the pointer;
/// underflow clamps to the edge.
pub fn clamp_menu_position(
    x: f64,
    y: f64,
    menu_w: f64,
    menu_h: f64,
    viewport_w: f64,
    viewport_h: f64,
) -> (f64, f64) {
    let mut left = x;
    let mut top = y;
    if left + menu_w > viewport_w {
        left = x - menu_w;
    }
    if top + menu_h > viewport_h {
        top = y - menu_h;
    }
    (left.max(0.0), top.max(0.0))
}

// ---------------------------------------------------------------------------
// Dismissal
// ---------------------------------------------------------------------------

/// Explicit subscription pair returned by a successful open: a persistent
/// outside-click listener on the document and a one-shot scroll listener on
/// the window.  Owning them as a value rules out double registration.
struct DismissGuard {
    click: Closure<dyn FnMut(MouseEvent)>,
    scroll: Closure<dyn FnMut()>,
}

impl DismissGuard {
    fn attach(document: &Document, menu_el: Element) -> Result<Self, JsValue> {
        let click = Closure::wrap(Box::new(move |event: MouseEvent| {
            let inside = event
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Node>().ok())
                .map(|node| menu_el.contains(Some(&node)))
                .unwrap_or(false);
            if !inside {
                close();
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        document.add_event_listener_with_callback("click", click.as_ref().unchecked_ref())?;

        let scroll = Closure::wrap(Box::new(move || {
            close();
        }) as Box<dyn FnMut()>);
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let opts = AddEventListenerOptions::new();
        opts.set_once(true);
        window.add_event_listener_with_callback_and_add_event_listener_options(
            "scroll",
            scroll.as_ref().unchecked_ref(),
            &opts,
        )?;

        Ok(Self { click, scroll })
    }

    /// Remove both listeners.  The closures themselves are dropped a tick
    /// later, since `close` may be running inside one of them right now.
    fn dispose(self) {
        if let Some(window) = web_sys::window() {
            if let Some(document) = window.document() {
                let _ = document.remove_event_listener_with_callback(
                    "click",
                    self.click.as_ref().unchecked_ref(),
                );
            }
            // Harmless if the one-shot already fired and auto-removed.
            let _ = window.remove_event_listener_with_callback(
                "scroll",
                self.scroll.as_ref().unchecked_ref(),
            );
        }
        Timeout::new(0, move || drop(self)).forget();
    }
}

// ---------------------------------------------------------------------------
// Controller
// ---------------------------------------------------------------------------

struct ActiveMenu {
    element: Element,
    payload: MenuPayload,
    guard: Option<DismissGuard>,
}

#[derive(Default)]
struct ContextMenuController {
    active: Option<ActiveMenu>,
    /// Bumped on every open/close so a deferred guard attach can tell whether
    /// its menu is still the current one.
    epoch: u64,
}

thread_local! {
    static CONTEXT_MENU: RefCell<ContextMenuController> = RefCell::new(ContextMenuController::default());
}

/// Open a menu for `target` at the pointer position.  Silently does nothing
/// when the menu kind's preconditions fail for the current session.
pub fn open(kind: MenuKind, target: &Element, event: &MouseEvent) -> Result<(), JsValue> {
    close();

    let session = APP_STATE.with(|s| s.borrow().session.clone());
    if !preconditions_hold(kind, &session) {
        return Ok(());
    }

    let data = TargetData::from_element(target);
    let payload = build_payload(kind, &data);
    let items = visible_items(kind, &payload, &session, data.category.as_deref());
    if items.is_empty() {
        return Ok(());
    }

    let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
    let document = window
        .document()
        .ok_or_else(|| JsValue::from_str("no document"))?;

    let menu_el = ensure_menu_root(&document)?;
    ensure_styles(&document);
    crate::dom_utils::clear_children(&menu_el);

    for action in items {
        let item = document.create_element("button")?;
        item.set_class_name("context-menu-item");
        item.set_text_content(Some(action.label()));

        let item_payload = payload.clone();
        let on_click = Closure::wrap(Box::new(move |_: MouseEvent| {
            run_action(action, &item_payload);
            close();
        }) as Box<dyn FnMut(MouseEvent)>);
        item.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();

        menu_el.append_child(&item)?;
    }

    // Render invisibly at the origin first so the box can be measured, then
    // clamp into the viewport.
    menu_el.set_attribute("style", "left:0;top:0;visibility:hidden")?;
    let _ = menu_el.class_list().add_1("open");
    let rect = menu_el.get_bounding_client_rect();
    let viewport_w = window.inner_width()?.as_f64().unwrap_or(0.0);
    let viewport_h = window.inner_height()?.as_f64().unwrap_or(0.0);
    let (left, top) = clamp_menu_position(
        event.client_x() as f64,
        event.client_y() as f64,
        rect.width(),
        rect.height(),
        viewport_w,
        viewport_h,
    );
    menu_el.set_attribute("style", &format!("left:{}px;top:{}px", left, top))?;

    let epoch = CONTEXT_MENU.with(|m| {
        let mut controller = m.borrow_mut();
        controller.epoch += 1;
        controller.active = Some(ActiveMenu {
            element: menu_el.clone(),
            payload,
            guard: None,
        });
        controller.epoch
    });

    // Deferred a tick so the opening click cannot dismiss its own menu.
    Timeout::new(0, move || {
        CONTEXT_MENU.with(|m| {
            let mut controller = m.borrow_mut();
            if controller.epoch != epoch {
                return;
            }
            if let Some(active) = controller.active.as_mut() {
                if let Some(document) = web_sys::window().and_then(|w| w.document()) {
                    match DismissGuard::attach(&document, active.element.clone()) {
                        Ok(guard) => active.guard = Some(guard),
                        Err(e) => web_sys::console::error_1(
                            &format!("Failed to attach menu dismiss listeners: {:?}", e).into(),
                        ),
                    }
                }
            }
        });
    })
    .forget();

    Ok(())
}

/// Hide the menu and drop its dismiss subscriptions.  Safe when nothing is
/// open.
pub fn close() {
    let dismissed = CONTEXT_MENU.with(|m| {
        let mut controller = m.borrow_mut();
        controller.epoch += 1;
        controller.active.take()
    });
    if let Some(active) = dismissed {
        let _ = active.element.class_list().remove_1("open");
        if let Some(guard) = active.guard {
            guard.dispose();
        }
    }
}

fn run_action(action: MenuAction, payload: &MenuPayload) {
    match action {
        MenuAction::DeleteMessage => {
            if let (Some(ticket_id), Some(ts)) =
                (payload.ticket_id.as_deref(), payload.message_timestamp.as_deref())
            {
                channel::send_frame(&builders::delete_message(ticket_id, ts));
            }
        }
        MenuAction::OpenTicket => {
            if let Some(ticket_id) = payload.ticket_id.as_deref() {
                set_hash(&format!("#{}?id={}", crate::constants::ROUTE_TICKET_DETAIL, ticket_id));
            }
        }
        MenuAction::CloseTicket => {
            if let Some(ticket_id) = payload.ticket_id.as_deref() {
                channel::send_frame(&builders::update_ticket_status(
                    ticket_id,
                    TicketStatus::Closed,
                ));
            }
        }
        MenuAction::ReopenTicket => {
            if let Some(ticket_id) = payload.ticket_id.as_deref() {
                channel::send_frame(&builders::update_ticket_status(ticket_id, TicketStatus::Open));
            }
        }
        MenuAction::DeleteTicket => {
            if let Some(ticket_id) = payload.ticket_id.as_deref() {
                channel::send_frame(&builders::delete_ticket(ticket_id));
            }
        }
        MenuAction::ViewProduct => {
            if let Some(product_id) = payload.product_id.as_deref() {
                set_hash(&format!(
                    "#{}?id={}",
                    crate::constants::ROUTE_PRODUCT_DETAIL,
                    product_id
                ));
            }
        }
        MenuAction::RequestFirmware => {
            if let Some(device_type) = payload.device_type.as_deref() {
                toast::info(&format!("Firmware package requested for {}", device_type));
            }
        }
        MenuAction::ReportOrderProblem => {
            if let Some(order_id) = payload.order_id.as_deref() {
                toast::info(&format!("Reference order {} in your new ticket", order_id));
            }
            set_hash(&format!("#{}", crate::constants::ROUTE_TICKETS));
        }
    }
}

fn set_hash(fragment: &str) {
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_hash(fragment);
    }
}

fn ensure_menu_root(document: &Document) -> Result<Element, JsValue> {
    if let Some(el) = document.get_element_by_id("context-menu") {
        return Ok(el);
    }
    let el = document.create_element("div")?;
    el.set_id("context-menu");
    el.set_class_name("context-menu");
    if let Some(body) = document.body() {
        body.append_child(&el)?;
    }
    Ok(el)
}

fn ensure_styles(document: &Document) {
    if document.get_element_by_id("context-menu-styles").is_some() {
        return;
    }
    let css = "
.context-menu{position:fixed;display:none;flex-direction:column;min-width:160px;background:#fff;border:1px solid #d1d5db;border-radius:4px;box-shadow:0 4px 12px rgba(0,0,0,.15);z-index:10000}
.context-menu.open{display:flex}
.context-menu-item{padding:8px 14px;border:none;background:none;text-align:left;cursor:pointer;font:inherit}
.context-menu-item:hover{background:#f3f4f6}
";
    if let Ok(style) = document.create_element("style") {
        style.set_id("context-menu-styles");
        style.set_text_content(Some(css));
        if let Ok(Some(head)) = document.query_selector("head") {
            let _ = head.append_child(&style);
        }
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    fn everything() -> TargetData {
        TargetData {
            ticket_id: Some("t-1".to_string()),
            message_timestamp: Some("100".to_string()),
            sender_id: Some("u-1".to_string()),
            ticket_status: Some("closed".to_string()),
            product_id: Some("p-1".to_string()),
            product_name: Some("Widget".to_string()),
            order_id: Some("o-1".to_string()),
            device_type: Some("gateway-v2".to_string()),
            category: Some("hardware".to_string()),
        }
    }

    fn moderator() -> Session {
        Session {
            logged_in: true,
            is_moderator: true,
            ..Session::logged_out()
        }
    }

    fn customer() -> Session {
        Session {
            logged_in: true,
            ..Session::logged_out()
        }
    }

    #[test]
    fn payload_for_product_menu_clears_ticket_fields() {
        let payload = build_payload(MenuKind::Product, &everything());
        assert_eq!(payload.product_id.as_deref(), Some("p-1"));
        assert_eq!(payload.device_type.as_deref(), Some("gateway-v2"));
        assert_eq!(payload.ticket_id, None);
        assert_eq!(payload.message_timestamp, None);
        assert_eq!(payload.order_id, None);
    }

    #[test]
    fn payload_for_ticket_menu_clears_product_fields() {
        let payload = build_payload(MenuKind::Ticket, &everything());
        assert_eq!(payload.ticket_id.as_deref(), Some("t-1"));
        assert_eq!(payload.ticket_status, Some(TicketStatus::Closed));
        assert_eq!(payload.product_id, None);
        assert_eq!(payload.device_type, None);
        assert_eq!(payload.sender_id, None);
    }

    #[test]
    fn chat_menu_requires_moderator() {
        assert!(preconditions_hold(MenuKind::ChatMessage, &moderator()));
        assert!(!preconditions_hold(MenuKind::ChatMessage, &customer()));
        assert!(!preconditions_hold(
            MenuKind::ChatMessage,
            &Session::logged_out()
        ));
    }

    #[test]
    fn ticket_and_order_menus_require_login() {
        assert!(preconditions_hold(MenuKind::Ticket, &customer()));
        assert!(!preconditions_hold(MenuKind::Ticket, &Session::logged_out()));
        assert!(!preconditions_hold(MenuKind::Order, &Session::logged_out()));
        assert!(preconditions_hold(MenuKind::Product, &Session::logged_out()));
    }

    #[test]
    fn reopen_only_for_moderators_on_closed_tickets() {
        let closed = build_payload(MenuKind::Ticket, &everything());
        let items = visible_items(MenuKind::Ticket, &closed, &moderator(), None);
        assert!(items.contains(&MenuAction::ReopenTicket));
        assert!(!items.contains(&MenuAction::CloseTicket));

        let items = visible_items(MenuKind::Ticket, &closed, &customer(), None);
        assert!(!items.contains(&MenuAction::ReopenTicket));
        assert!(!items.contains(&MenuAction::DeleteTicket));

        let mut open_ticket = closed.clone();
        open_ticket.ticket_status = Some(TicketStatus::Open);
        let items = visible_items(MenuKind::Ticket, &open_ticket, &moderator(), None);
        assert!(items.contains(&MenuAction::CloseTicket));
        assert!(!items.contains(&MenuAction::ReopenTicket));
    }

    #[test]
    fn firmware_item_needs_hardware_category_and_device_type() {
        let payload = build_payload(MenuKind::Product, &everything());
        let session = customer();

        let items = visible_items(MenuKind::Product, &payload, &session, Some("hardware"));
        assert!(items.contains(&MenuAction::RequestFirmware));

        let items = visible_items(MenuKind::Product, &payload, &session, Some("software"));
        assert!(!items.contains(&MenuAction::RequestFirmware));

        let mut no_device = payload.clone();
        no_device.device_type = None;
        let items = visible_items(MenuKind::Product, &no_device, &session, Some("hardware"));
        assert!(!items.contains(&MenuAction::RequestFirmware));
    }

    #[test]
    fn position_is_clamped_and_flipped() {
        // Fits as-is.
        assert_eq!(
            clamp_menu_position(10.0, 20.0, 100.0, 200.0, 1000.0, 800.0),
            (10.0, 20.0)
        );
        // Overflows right: flips left of the pointer.
        assert_eq!(
            clamp_menu_position(950.0, 20.0, 100.0, 200.0, 1000.0, 800.0),
            (850.0, 20.0)
        );
        // Overflows bottom: flips above the pointer.
        assert_eq!(
            clamp_menu_position(10.0, 700.0, 100.0, 200.0, 1000.0, 800.0),
            (10.0, 500.0)
        );
        // Flip would underflow: clamps to the edge.
        assert_eq!(
            clamp_menu_position(50.0, 100.0, 100.0, 200.0, 60.0, 150.0),
            (0.0, 0.0)
        );
    }
}
