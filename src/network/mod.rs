// Re-export network modules
pub mod api_client;
pub mod channel;
pub mod events;
pub mod reconciler;
pub mod ws_client;

pub use api_client::ApiClient;
pub use ws_client::{ConnectionState, IWsClient, WsClient};

use wasm_bindgen::JsValue;

/// Base URL for REST calls.  In debug builds we talk to the local dev
/// backend; in release the page origin is the API origin.
pub(crate) fn get_api_base_url() -> Result<String, JsValue> {
    #[cfg(debug_assertions)]
    {
        Ok("http://localhost:8080".to_string())
    }
    #[cfg(not(debug_assertions))]
    {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let location = window.location();
        let protocol = location.protocol()?;
        let host = location.host()?;
        Ok(format!("{}//{}", protocol, host))
    }
}

/// Derive the push-channel URL from the API base (`http(s)` -> `ws(s)`).
pub(crate) fn get_ws_url() -> Result<String, JsValue> {
    let base = get_api_base_url()?;
    let ws_base = if base.starts_with("https") {
        base.replacen("https", "wss", 1)
    } else {
        base.replacen("http", "ws", 1)
    };
    Ok(format!("{}/ws", ws_base))
}
