//! Push-channel lifecycle manager.
//!
//! Owns the singleton client connection, the handler registry and the
//! per-ticket room membership.  Navigation drives it through three verbs:
//! `ensure_connected` (ticket views), `disconnect` (everything else) and the
//! frame send used by the chat view.  Handlers are keyed by event name, so a
//! reconnect cycle replaces each handler instead of stacking duplicates.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use serde::Serialize;
use serde_json::Value;
use wasm_bindgen::JsValue;

use crate::network::events::builders;
use crate::network::reconciler;
use crate::network::ws_client::{ConnectionState, IWsClient, WsClient};
use crate::toast;

pub type EventHandler = Rc<RefCell<dyn FnMut(Value)>>;

/// Event-name keyed handler table.  Registering under an existing name
/// replaces the previous handler, which is what keeps reconnect cycles
/// idempotent.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: HashMap<String, EventHandler>,
}

impl HandlerRegistry {
    pub fn register<F>(&mut self, event_name: &str, handler: F)
    where
        F: FnMut(Value) + 'static,
    {
        self.handlers
            .insert(event_name.to_string(), Rc::new(RefCell::new(handler)));
    }

    /// Cloned handle so dispatch can run without holding the registry borrow.
    pub fn get(&self, event_name: &str) -> Option<EventHandler> {
        self.handlers.get(event_name).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.handlers.keys().cloned().collect();
        names.sort();
        names
    }
}

/// Singleton lifecycle manager over an [`IWsClient`].
pub struct TicketChannel {
    client: Option<Rc<RefCell<dyn IWsClient>>>,
    registry: Rc<RefCell<HandlerRegistry>>,
    /// Room the channel should be in; shared with the on-connect callback so
    /// a (re)connect can assert membership on its own.
    joined: Rc<RefCell<Option<String>>>,
    /// One interruption toast per connect cycle.
    warned: Rc<Cell<bool>>,
}

impl TicketChannel {
    pub fn new() -> Self {
        Self {
            client: None,
            registry: Rc::new(RefCell::new(HandlerRegistry::default())),
            joined: Rc::new(RefCell::new(None)),
            warned: Rc::new(Cell::new(false)),
        }
    }

    pub fn joined_ticket_id(&self) -> Option<String> {
        self.joined.borrow().clone()
    }

    pub fn registered_event_names(&self) -> Vec<String> {
        self.registry.borrow().names()
    }

    /// Bring the channel up (or keep it up) and put it in the right room.
    /// `join = Some(id)` for the ticket detail view, `None` for the list.
    pub fn ensure_connected(&mut self, join: Option<String>) -> Result<(), JsValue> {
        let state = self
            .client
            .as_ref()
            .map(|c| c.borrow().connection_state());

        match state {
            Some(ConnectionState::Connected) => {
                *self.joined.borrow_mut() = join.clone();
                if let Some(ticket_id) = join {
                    // Repeat joins are server-side no-ops; re-asserting is
                    // how detail re-entry confirms membership.
                    self.send_join(&ticket_id)?;
                }
                Ok(())
            }
            Some(ConnectionState::Connecting) => {
                // The pending on-connect callback reads `joined` and sends
                // the join frame itself.
                *self.joined.borrow_mut() = join;
                Ok(())
            }
            _ => self.connect(join),
        }
    }

    fn connect(&mut self, join: Option<String>) -> Result<(), JsValue> {
        let client: Rc<RefCell<dyn IWsClient>> = Rc::new(RefCell::new(WsClient::new_default()));
        self.attach(client, join)
    }

    /// Wire a client (real or mock), install the default handlers and start
    /// the connection.  Split from `connect` so tests can inject a client.
    pub fn attach(
        &mut self,
        client: Rc<RefCell<dyn IWsClient>>,
        join: Option<String>,
    ) -> Result<(), JsValue> {
        *self.joined.borrow_mut() = join;
        self.warned.set(false);

        {
            let mut registry = self.registry.borrow_mut();
            reconciler::register_default_handlers(&mut registry);
        }

        {
            let mut c = client.borrow_mut();

            let joined = self.joined.clone();
            let warned = self.warned.clone();
            let client_weak = Rc::downgrade(&client);
            c.set_on_connect(Box::new(move || {
                warned.set(false);
                let pending = joined.borrow().clone();
                if let (Some(ticket_id), Some(client_rc)) = (pending, client_weak.upgrade()) {
                    let frame = builders::join_ticket_room(&ticket_id);
                    match serde_json::to_string(&frame) {
                        Ok(json) => {
                            if let Ok(c) = client_rc.try_borrow() {
                                if let Err(e) = c.send_serialized_message(&json) {
                                    web_sys::console::error_1(
                                        &format!("Failed to send room join: {:?}", e).into(),
                                    );
                                }
                            }
                        }
                        Err(e) => {
                            web_sys::console::error_1(
                                &format!("Failed to serialize room join: {}", e).into(),
                            );
                        }
                    }
                }
            }));

            let registry = self.registry.clone();
            c.set_on_message(Box::new(move |value: Value| {
                let event_name = value
                    .get("type")
                    .and_then(|t| t.as_str())
                    .map(str::to_string);
                let Some(name) = event_name else { return };
                // Clone the handler out so dispatch never holds the
                // registry borrow (a handler may re-register).
                let handler = registry.borrow().get(&name);
                match handler {
                    Some(h) => (h.borrow_mut())(value),
                    None => {
                        crate::debug_log!("Push channel: no handler for '{}'", name);
                    }
                }
            }));

            let warned = self.warned.clone();
            c.set_on_disconnect(Box::new(move || {
                if !warned.get() {
                    warned.set(true);
                    toast::warning("Live updates interrupted, reconnecting...");
                }
            }));

            c.connect()?;
        }

        self.client = Some(client);
        Ok(())
    }

    /// Deliberate teardown: leave the room, close the socket, drop the
    /// handle.  Safe to call when already disconnected.
    pub fn disconnect(&mut self) {
        *self.joined.borrow_mut() = None;
        // Suppress the interruption toast for a teardown we asked for.
        self.warned.set(true);
        if let Some(client) = self.client.take() {
            if let Err(e) = client.borrow_mut().close() {
                web_sys::console::error_1(&format!("Error closing push channel: {:?}", e).into());
            }
        }
    }

    fn send_join(&self, ticket_id: &str) -> Result<(), JsValue> {
        let frame = builders::join_ticket_room(ticket_id);
        self.send_serialized(&frame)
    }

    pub fn send_serialized<T: Serialize>(&self, frame: &T) -> Result<(), JsValue> {
        let json =
            serde_json::to_string(frame).map_err(|e| JsValue::from_str(&e.to_string()))?;
        match &self.client {
            Some(c) => c.borrow().send_serialized_message(&json),
            None => Err(JsValue::from_str("Push channel is not initialized")),
        }
    }
}

impl Default for TicketChannel {
    fn default() -> Self {
        Self::new()
    }
}

thread_local! {
    static TICKET_CHANNEL: RefCell<TicketChannel> = RefCell::new(TicketChannel::new());
}

/// Navigation entry point: bring the channel up for a ticket view.
pub fn ensure_connected(join: Option<String>) {
    TICKET_CHANNEL.with(|ch| {
        if let Err(e) = ch.borrow_mut().ensure_connected(join) {
            web_sys::console::error_1(&format!("Push channel connect failed: {:?}", e).into());
            toast::error("Live updates are unavailable");
        }
    });
}

/// Navigation entry point: tear the channel down when leaving ticket views.
pub fn disconnect() {
    TICKET_CHANNEL.with(|ch| ch.borrow_mut().disconnect());
}

/// Send an outbound frame over the live channel.  Errors surface as a toast
/// since every caller is a direct user action.
pub fn send_frame<T: Serialize>(frame: &T) {
    let result = TICKET_CHANNEL.with(|ch| ch.borrow().send_serialized(frame));
    if let Err(e) = result {
        web_sys::console::error_1(&format!("Failed to send frame: {:?}", e).into());
        toast::error("Not connected, action was not sent");
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod registry_tests {
    use super::*;

    #[test]
    fn registering_same_name_replaces_handler() {
        let hits = Rc::new(Cell::new(0));
        let mut registry = HandlerRegistry::default();

        let first_hits = hits.clone();
        registry.register("new_message", move |_| first_hits.set(first_hits.get() + 1));
        let second_hits = hits.clone();
        registry.register("new_message", move |_| {
            second_hits.set(second_hits.get() + 10)
        });

        assert_eq!(registry.len(), 1);

        let handler = registry.get("new_message").unwrap();
        (handler.borrow_mut())(serde_json::json!({}));
        // Only the replacement ran.
        assert_eq!(hits.get(), 10);
    }

    #[test]
    fn unknown_event_has_no_handler() {
        let registry = HandlerRegistry::default();
        assert!(registry.get("nope").is_none());
        assert!(registry.is_empty());
    }

    #[test]
    fn names_are_sorted_and_unique() {
        let mut registry = HandlerRegistry::default();
        registry.register("b", |_| {});
        registry.register("a", |_| {});
        registry.register("a", |_| {});
        assert_eq!(registry.names(), vec!["a".to_string(), "b".to_string()]);
    }
}

#[cfg(test)]
#[cfg(target_arch = "wasm32")]
mod wasm_tests {
    use super::*;
    use std::any::Any;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    /// Scripted client double.  `connect` reports success immediately; the
    /// test fires the open event itself, matching the async reality of a
    /// browser socket.
    struct MockWsClient {
        state: ConnectionState,
        sent: Rc<RefCell<Vec<String>>>,
        on_connect: Rc<RefCell<Option<Box<dyn FnMut()>>>>,
        on_message: Rc<RefCell<Option<Box<dyn FnMut(Value)>>>>,
        on_disconnect: Rc<RefCell<Option<Box<dyn FnMut()>>>>,
    }

    impl MockWsClient {
        fn new(sent: Rc<RefCell<Vec<String>>>) -> Self {
            Self {
                state: ConnectionState::Disconnected,
                sent,
                on_connect: Rc::new(RefCell::new(None)),
                on_message: Rc::new(RefCell::new(None)),
                on_disconnect: Rc::new(RefCell::new(None)),
            }
        }

        fn fire_on_connect(&self) {
            if let Some(cb) = self.on_connect.borrow_mut().as_mut() {
                cb();
            }
        }

        fn fire_on_message(&self, value: Value) {
            if let Some(cb) = self.on_message.borrow_mut().as_mut() {
                cb(value);
            }
        }
    }

    impl IWsClient for MockWsClient {
        fn connect(&mut self) -> Result<(), JsValue> {
            self.state = ConnectionState::Connected;
            Ok(())
        }

        fn send_serialized_message(&self, message_json: &str) -> Result<(), JsValue> {
            self.sent.borrow_mut().push(message_json.to_string());
            Ok(())
        }

        fn connection_state(&self) -> ConnectionState {
            self.state.clone()
        }

        fn close(&mut self) -> Result<(), JsValue> {
            self.state = ConnectionState::Disconnected;
            if let Some(cb) = self.on_disconnect.borrow_mut().as_mut() {
                cb();
            }
            Ok(())
        }

        fn set_on_connect(&mut self, callback: Box<dyn FnMut() + 'static>) {
            *self.on_connect.borrow_mut() = Some(callback);
        }

        fn set_on_message(&mut self, callback: Box<dyn FnMut(Value) + 'static>) {
            *self.on_message.borrow_mut() = Some(callback);
        }

        fn set_on_disconnect(&mut self, callback: Box<dyn FnMut() + 'static>) {
            *self.on_disconnect.borrow_mut() = Some(callback);
        }

        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn expected_event_names() -> Vec<String> {
        use crate::constants::*;
        let mut names: Vec<String> = vec![
            EV_NEW_MESSAGE,
            EV_ROOM_JOINED,
            EV_ERROR_MESSAGE,
            EV_MESSAGE_DELETED,
            EV_TICKET_STATUS_UPDATED,
            EV_TICKET_LIST_UPDATED,
            EV_ACTION_SUCCESS,
        ]
        .into_iter()
        .map(String::from)
        .collect();
        names.sort();
        names
    }

    #[wasm_bindgen_test]
    fn connect_registers_each_handler_exactly_once() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let mut channel = TicketChannel::new();

        let client = Rc::new(RefCell::new(MockWsClient::new(sent.clone())));
        channel.attach(client.clone(), None).unwrap();
        assert_eq!(channel.registered_event_names(), expected_event_names());

        // A second full cycle must not duplicate any registration.
        channel.disconnect();
        let client2 = Rc::new(RefCell::new(MockWsClient::new(sent)));
        channel.attach(client2, None).unwrap();
        assert_eq!(channel.registered_event_names(), expected_event_names());
    }

    #[wasm_bindgen_test]
    fn open_with_pending_room_sends_join_frame() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let mut channel = TicketChannel::new();

        let client = Rc::new(RefCell::new(MockWsClient::new(sent.clone())));
        channel
            .attach(client.clone(), Some("ticket-42".to_string()))
            .unwrap();
        client.borrow().fire_on_connect();

        let frames = sent.borrow();
        assert_eq!(frames.len(), 1);
        let frame: Value = serde_json::from_str(&frames[0]).unwrap();
        assert_eq!(frame["type"], "join_ticket_room");
        assert_eq!(frame["ticket_id"], "ticket-42");
        assert!(frame["message_id"].is_string());
    }

    #[wasm_bindgen_test]
    fn ensure_connected_reasserts_room_when_already_up() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let mut channel = TicketChannel::new();

        let client = Rc::new(RefCell::new(MockWsClient::new(sent.clone())));
        channel.attach(client, None).unwrap();
        assert_eq!(channel.joined_ticket_id(), None);

        channel
            .ensure_connected(Some("ticket-7".to_string()))
            .unwrap();
        assert_eq!(channel.joined_ticket_id(), Some("ticket-7".to_string()));
        assert_eq!(sent.borrow().len(), 1);

        // Re-entering the same detail view re-asserts membership.
        channel
            .ensure_connected(Some("ticket-7".to_string()))
            .unwrap();
        assert_eq!(sent.borrow().len(), 2);

        // Moving to the list view keeps the connection, clears the room.
        channel.ensure_connected(None).unwrap();
        assert_eq!(channel.joined_ticket_id(), None);
        assert_eq!(sent.borrow().len(), 2);
    }

    #[wasm_bindgen_test]
    fn disconnect_clears_room_and_client() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let mut channel = TicketChannel::new();

        let client = Rc::new(RefCell::new(MockWsClient::new(sent)));
        channel
            .attach(client, Some("ticket-9".to_string()))
            .unwrap();
        channel.disconnect();

        assert_eq!(channel.joined_ticket_id(), None);
        // Idempotent on a second call.
        channel.disconnect();
    }

    #[wasm_bindgen_test]
    fn frames_without_handlers_are_ignored() {
        let sent = Rc::new(RefCell::new(Vec::new()));
        let mut channel = TicketChannel::new();

        let client = Rc::new(RefCell::new(MockWsClient::new(sent)));
        channel.attach(client.clone(), None).unwrap();

        // Must not panic or disturb the registry.
        client
            .borrow()
            .fire_on_message(serde_json::json!({"type": "unknown_event"}));
        assert_eq!(channel.registered_event_names(), expected_event_names());
    }
}
