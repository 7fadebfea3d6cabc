use std::any::Any;
use std::cell::{Cell, RefCell};
use std::rc::Rc;

use serde_json::Value;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{MessageEvent, WebSocket};

/// Trait defining the push-channel client interface.  The lifecycle manager
/// and the tests talk to this seam, never to `web_sys::WebSocket` directly.
pub trait IWsClient: Any {
    fn connect(&mut self) -> Result<(), JsValue>;
    fn send_serialized_message(&self, message_json: &str) -> Result<(), JsValue>;
    fn connection_state(&self) -> ConnectionState;
    fn close(&mut self) -> Result<(), JsValue>;
    fn set_on_connect(&mut self, callback: Box<dyn FnMut() + 'static>);
    fn set_on_message(&mut self, callback: Box<dyn FnMut(Value) + 'static>);
    fn set_on_disconnect(&mut self, callback: Box<dyn FnMut() + 'static>);
    fn as_any(&self) -> &dyn Any;
}

/// Current state of the underlying connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected,
    #[allow(dead_code)]
    Error(String),
}

impl std::fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionState::Disconnected => write!(f, "Disconnected"),
            ConnectionState::Connecting => write!(f, "Connecting"),
            ConnectionState::Connected => write!(f, "Connected"),
            ConnectionState::Error(msg) => write!(f, "Error: {}", msg),
        }
    }
}

/// Configuration for the push-channel client.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Reconnection attempts before the client gives up silently.  A later
    /// `ensure_connected` from navigation starts a fresh cycle.
    pub max_reconnect_attempts: u32,
    pub initial_backoff_ms: u32,
    pub max_backoff_ms: u32,
}

impl Default for WsConfig {
    fn default() -> Self {
        let url = super::get_ws_url().unwrap_or_else(|_| {
            // Sane fallback for unit tests where no window/location exists.
            "ws://localhost/placeholder".to_string()
        });
        Self {
            url,
            max_reconnect_attempts: crate::constants::WS_MAX_RECONNECT_ATTEMPTS,
            initial_backoff_ms: crate::constants::WS_INITIAL_BACKOFF_MS,
            max_backoff_ms: crate::constants::WS_MAX_BACKOFF_MS,
        }
    }
}

type OnConnectCallback = Rc<RefCell<dyn FnMut()>>;
type OnMessageCallback = Rc<RefCell<dyn FnMut(Value)>>;
type OnDisconnectCallback = Rc<RefCell<dyn FnMut()>>;

/// Core WebSocket client.  Owns bounded exponential-backoff reconnection;
/// everything above the raw socket (handler registry, room membership) lives
/// in `channel::TicketChannel`.
pub struct WsClient {
    config: WsConfig,
    websocket: Option<WebSocket>,
    state: Rc<RefCell<ConnectionState>>,
    reconnect_attempt: Rc<RefCell<u32>>,
    reconnect_timeout: Rc<RefCell<Option<i32>>>,
    /// Set by an explicit `close()` so the onclose handler does not schedule
    /// a reconnect for a deliberate disconnect.
    manual_close: Rc<Cell<bool>>,

    on_connect_callback: Option<OnConnectCallback>,
    on_message_callback: Option<OnMessageCallback>,
    on_disconnect_callback: Option<OnDisconnectCallback>,
}

impl WsClient {
    pub fn new(config: WsConfig) -> Self {
        Self {
            config,
            websocket: None,
            state: Rc::new(RefCell::new(ConnectionState::Disconnected)),
            reconnect_attempt: Rc::new(RefCell::new(0)),
            reconnect_timeout: Rc::new(RefCell::new(None)),
            manual_close: Rc::new(Cell::new(false)),
            on_connect_callback: None,
            on_message_callback: None,
            on_disconnect_callback: None,
        }
    }

    pub fn new_default() -> Self {
        Self::new(WsConfig::default())
    }

    pub fn set_on_connect<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.on_connect_callback = Some(Rc::new(RefCell::new(callback)));
    }

    pub fn set_on_message<F>(&mut self, callback: F)
    where
        F: FnMut(Value) + 'static,
    {
        self.on_message_callback = Some(Rc::new(RefCell::new(callback)));
    }

    pub fn set_on_disconnect<F>(&mut self, callback: F)
    where
        F: FnMut() + 'static,
    {
        self.on_disconnect_callback = Some(Rc::new(RefCell::new(callback)));
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state.borrow().clone()
    }

    fn get_backoff_ms(&self) -> u32 {
        let attempt = *self.reconnect_attempt.borrow();
        let delay = self.config.initial_backoff_ms * 2_u32.pow(attempt.min(10));
        delay.min(self.config.max_backoff_ms)
    }

    /// Creates the socket and attaches the event handlers.  Used by both
    /// `connect` and the reconnect timer.
    fn establish_connection(&mut self) -> Result<WebSocket, JsValue> {
        let ws = WebSocket::new(&self.config.url)?;

        let state_clone = self.state.clone();
        let reconnect_attempt_clone = self.reconnect_attempt.clone();
        let on_connect_cb_clone = self.on_connect_callback.clone();
        let on_message_cb_clone = self.on_message_callback.clone();
        let on_disconnect_cb_clone = self.on_disconnect_callback.clone();
        let manual_close_clone = self.manual_close.clone();
        let client_clone_for_reconnect = self.clone();
        let config_clone = self.config.clone();

        let onopen_closure = Closure::wrap(Box::new(move |_: web_sys::Event| {
            crate::debug_log!("Push channel connected");
            *state_clone.borrow_mut() = ConnectionState::Connected;
            *reconnect_attempt_clone.borrow_mut() = 0;

            if let Some(callback_rc) = &on_connect_cb_clone {
                (callback_rc.borrow_mut())();
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onopen(Some(onopen_closure.as_ref().unchecked_ref()));
        onopen_closure.forget();

        let onerror_closure = Closure::wrap(Box::new(move |e: web_sys::Event| {
            web_sys::console::error_1(&format!("Push channel error: {:?}", e).into());
            // Errors are followed by close; state transitions happen there.
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onerror(Some(onerror_closure.as_ref().unchecked_ref()));
        onerror_closure.forget();

        let state_clone = self.state.clone();
        let reconnect_attempt_clone = self.reconnect_attempt.clone();
        let onclose_closure = Closure::wrap(Box::new(move |_evt: web_sys::Event| {
            crate::debug_log!("Push channel closed");
            *state_clone.borrow_mut() = ConnectionState::Disconnected;

            if let Some(callback_rc) = &on_disconnect_cb_clone {
                (callback_rc.borrow_mut())();
            }

            if manual_close_clone.get() {
                return;
            }

            let current_attempt = *reconnect_attempt_clone.borrow();
            if current_attempt < config_clone.max_reconnect_attempts {
                *reconnect_attempt_clone.borrow_mut() = current_attempt + 1;
                client_clone_for_reconnect.schedule_reconnect();
            } else {
                // Give up until the next explicit ensure_connected.
                crate::debug_log!("Push channel: max reconnection attempts reached");
            }
        }) as Box<dyn FnMut(web_sys::Event)>);
        ws.set_onclose(Some(onclose_closure.as_ref().unchecked_ref()));
        onclose_closure.forget();

        let onmessage_closure = Closure::wrap(Box::new(move |event: MessageEvent| {
            if let Ok(text) = event.data().dyn_into::<js_sys::JsString>() {
                if let Some(msg_str) = text.as_string() {
                    match serde_json::from_str::<Value>(&msg_str) {
                        Ok(parsed) if parsed.get("type").map_or(false, |t| t.is_string()) => {
                            if let Some(callback_rc) = &on_message_cb_clone {
                                (callback_rc.borrow_mut())(parsed);
                            }
                        }
                        Ok(_) => {
                            web_sys::console::error_1(
                                &format!("Push frame missing 'type': {}", msg_str).into(),
                            );
                        }
                        Err(e) => {
                            web_sys::console::error_1(
                                &format!("Failed to parse push frame as JSON: {}", e).into(),
                            );
                        }
                    }
                }
            } else {
                web_sys::console::warn_1(&"Received non-text push frame".into());
            }
        }) as Box<dyn FnMut(MessageEvent)>);
        ws.set_onmessage(Some(onmessage_closure.as_ref().unchecked_ref()));
        onmessage_closure.forget();

        Ok(ws)
    }

    /// Schedule a reconnection attempt with exponential backoff.
    fn schedule_reconnect(&self) {
        let window = match web_sys::window() {
            Some(w) => w,
            None => return,
        };
        let state_clone = self.state.clone();
        let delay = self.get_backoff_ms();
        let mut client_clone = self.clone();

        let reconnect_callback = Closure::once(Box::new(move || {
            if *state_clone.borrow() != ConnectionState::Disconnected {
                return;
            }
            crate::debug_log!(
                "Push channel: reconnection attempt {}",
                *client_clone.reconnect_attempt.borrow()
            );
            *state_clone.borrow_mut() = ConnectionState::Connecting;

            match client_clone.establish_connection() {
                Ok(ws) => {
                    client_clone.websocket = Some(ws);
                }
                Err(e) => {
                    web_sys::console::error_1(
                        &format!("Failed to create socket during reconnect: {:?}", e).into(),
                    );
                    *state_clone.borrow_mut() = ConnectionState::Disconnected;
                    client_clone.schedule_reconnect();
                }
            }
        }) as Box<dyn FnOnce()>);

        // Store the timeout id so a manual connect() can cancel the pending
        // attempt before the timer fires.
        if let Ok(timeout_id) = window.set_timeout_with_callback_and_timeout_and_arguments_0(
            reconnect_callback.as_ref().unchecked_ref(),
            delay as i32,
        ) {
            *self.reconnect_timeout.borrow_mut() = Some(timeout_id);
        }
        reconnect_callback.forget();
    }

    pub fn connect(&mut self) -> Result<(), JsValue> {
        crate::debug_log!("Initiating push channel connection...");
        *self.reconnect_attempt.borrow_mut() = 0;
        self.manual_close.set(false);
        *self.state.borrow_mut() = ConnectionState::Connecting;

        let ws = self.establish_connection()?;

        if let Some(timeout_id) = self.reconnect_timeout.borrow_mut().take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(timeout_id);
            }
        }

        self.websocket = Some(ws);
        Ok(())
    }

    pub fn send_serialized_message(&self, message_json: &str) -> Result<(), JsValue> {
        if let Some(ws) = &self.websocket {
            if *self.state.borrow() == ConnectionState::Connected {
                ws.send_with_str(message_json)?;
                Ok(())
            } else {
                web_sys::console::warn_1(&"Attempted to send while channel is not connected".into());
                Err(JsValue::from_str("Push channel is not connected"))
            }
        } else {
            Err(JsValue::from_str("Push channel is not initialized"))
        }
    }

    pub fn close(&mut self) -> Result<(), JsValue> {
        crate::debug_log!("Closing push channel...");
        self.manual_close.set(true);
        *self.state.borrow_mut() = ConnectionState::Disconnected;
        if let Some(timeout_id) = self.reconnect_timeout.borrow_mut().take() {
            if let Some(window) = web_sys::window() {
                window.clear_timeout_with_handle(timeout_id);
            }
        }
        if let Some(ws) = self.websocket.take() {
            if let Err(e) = ws.close_with_code(1000) {
                web_sys::console::error_1(&format!("Error sending close command: {:?}", e).into());
            }
        }
        Ok(())
    }
}

impl IWsClient for WsClient {
    fn connect(&mut self) -> Result<(), JsValue> {
        self.connect()
    }

    fn send_serialized_message(&self, message_json: &str) -> Result<(), JsValue> {
        self.send_serialized_message(message_json)
    }

    fn connection_state(&self) -> ConnectionState {
        self.connection_state()
    }

    fn close(&mut self) -> Result<(), JsValue> {
        self.close()
    }

    fn set_on_connect(&mut self, callback: Box<dyn FnMut() + 'static>) {
        self.set_on_connect(callback);
    }

    fn set_on_message(&mut self, callback: Box<dyn FnMut(Value) + 'static>) {
        self.set_on_message(callback);
    }

    fn set_on_disconnect(&mut self, callback: Box<dyn FnMut() + 'static>) {
        self.set_on_disconnect(callback);
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl Clone for WsClient {
    fn clone(&self) -> Self {
        // Clones share state/attempt counters via Rc but never the socket or
        // a pending timer; this is only used to move the client into the
        // reconnect closure.
        Self {
            config: self.config.clone(),
            websocket: None,
            state: self.state.clone(),
            reconnect_attempt: self.reconnect_attempt.clone(),
            reconnect_timeout: self.reconnect_timeout.clone(),
            manual_close: self.manual_close.clone(),
            on_connect_callback: self.on_connect_callback.clone(),
            on_message_callback: self.on_message_callback.clone(),
            on_disconnect_callback: self.on_disconnect_callback.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn test_client_creation() {
        let client = WsClient::new_default();
        assert_eq!(client.connection_state(), ConnectionState::Disconnected);
    }

    #[wasm_bindgen_test]
    fn test_backoff_calculation() {
        let client = WsClient::new_default();

        assert_eq!(*client.reconnect_attempt.borrow(), 0);
        assert_eq!(client.get_backoff_ms(), 1000);

        *client.reconnect_attempt.borrow_mut() = 1;
        assert_eq!(client.get_backoff_ms(), 2000);

        // Capped at the configured maximum.
        *client.reconnect_attempt.borrow_mut() = 10;
        assert_eq!(client.get_backoff_ms(), 30000);
    }
}
