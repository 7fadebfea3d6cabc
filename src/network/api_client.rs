//! REST client.  All calls use ambient cookie credentials; a 401/403 means
//! "not logged in" and is surfaced as an `Ok(None)` where the caller can
//! degrade, never as a hard failure.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Headers, Request, RequestCredentials, RequestInit, RequestMode, Response};

use crate::models::{Product, Session, SiteConfig, Ticket, TicketSummary};

pub struct ApiClient;

impl ApiClient {
    fn api_base_url() -> Result<String, JsValue> {
        super::get_api_base_url()
    }

    // -------------------------------------------------------------------
    // Identity & session
    // -------------------------------------------------------------------

    /// Identity check.  `Ok(None)` means the backend answered but the user is
    /// not logged in (401/403); `Err` is reserved for transport failures.
    pub async fn fetch_current_user() -> Result<Option<Session>, JsValue> {
        let url = format!("{}/api/session", Self::api_base_url()?);
        let (status, body) = Self::fetch_with_status(&url, "GET", None).await?;
        match status {
            200 => {
                let session: Session = serde_json::from_str(&body)
                    .map_err(|e| JsValue::from_str(&format!("Bad session payload: {}", e)))?;
                Ok(Some(session))
            }
            401 | 403 => Ok(None),
            _ => Err(JsValue::from_str(&format!(
                "Identity check failed: {}",
                status
            ))),
        }
    }

    /// Best-effort logout notification.
    pub async fn logout() -> Result<(), JsValue> {
        let url = format!("{}/api/logout", Self::api_base_url()?);
        let _ = Self::fetch_with_status(&url, "POST", None).await?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Site configuration
    // -------------------------------------------------------------------

    pub async fn fetch_site_config() -> Result<SiteConfig, JsValue> {
        let url = format!("{}/api/config", Self::api_base_url()?);
        let body = Self::fetch_json(&url, "GET", None).await?;
        serde_json::from_str(&body)
            .map_err(|e| JsValue::from_str(&format!("Bad config payload: {}", e)))
    }

    pub async fn save_site_config(config: &SiteConfig) -> Result<(), JsValue> {
        let url = format!("{}/api/config", Self::api_base_url()?);
        let payload = serde_json::to_string(config)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))?;
        let _ = Self::fetch_json(&url, "PUT", Some(&payload)).await?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Tickets
    // -------------------------------------------------------------------

    pub async fn get_tickets() -> Result<Vec<TicketSummary>, JsValue> {
        let url = format!("{}/api/tickets", Self::api_base_url()?);
        let body = Self::fetch_json(&url, "GET", None).await?;
        serde_json::from_str(&body)
            .map_err(|e| JsValue::from_str(&format!("Bad ticket list payload: {}", e)))
    }

    /// `Ok(None)` covers not-found and forbidden, which the detail view
    /// renders as an inline error followed by a redirect to the list.
    pub async fn get_ticket(ticket_id: &str) -> Result<Option<Ticket>, JsValue> {
        let url = format!("{}/api/tickets/{}", Self::api_base_url()?, ticket_id);
        let (status, body) = Self::fetch_with_status(&url, "GET", None).await?;
        match status {
            200 => {
                let ticket: Ticket = serde_json::from_str(&body)
                    .map_err(|e| JsValue::from_str(&format!("Bad ticket payload: {}", e)))?;
                Ok(Some(ticket))
            }
            403 | 404 => Ok(None),
            _ => Err(JsValue::from_str(&format!(
                "Ticket fetch failed: {}",
                status
            ))),
        }
    }

    pub async fn create_ticket(subject: &str, text: &str) -> Result<Ticket, JsValue> {
        let url = format!("{}/api/tickets", Self::api_base_url()?);
        let payload = serde_json::json!({ "subject": subject, "text": text }).to_string();
        let body = Self::fetch_json(&url, "POST", Some(&payload)).await?;
        serde_json::from_str(&body)
            .map_err(|e| JsValue::from_str(&format!("Bad ticket payload: {}", e)))
    }

    // -------------------------------------------------------------------
    // Products
    // -------------------------------------------------------------------

    pub async fn get_products() -> Result<Vec<Product>, JsValue> {
        let url = format!("{}/api/products", Self::api_base_url()?);
        let body = Self::fetch_json(&url, "GET", None).await?;
        serde_json::from_str(&body)
            .map_err(|e| JsValue::from_str(&format!("Bad product list payload: {}", e)))
    }

    pub async fn get_product(product_id: &str) -> Result<Option<Product>, JsValue> {
        let url = format!("{}/api/products/{}", Self::api_base_url()?, product_id);
        let (status, body) = Self::fetch_with_status(&url, "GET", None).await?;
        match status {
            200 => {
                let product: Product = serde_json::from_str(&body)
                    .map_err(|e| JsValue::from_str(&format!("Bad product payload: {}", e)))?;
                Ok(Some(product))
            }
            403 | 404 => Ok(None),
            _ => Err(JsValue::from_str(&format!(
                "Product fetch failed: {}",
                status
            ))),
        }
    }

    pub async fn create_product(product_json: &str) -> Result<String, JsValue> {
        let url = format!("{}/api/products", Self::api_base_url()?);
        Self::fetch_json(&url, "POST", Some(product_json)).await
    }

    pub async fn update_product(product_id: &str, product_json: &str) -> Result<String, JsValue> {
        let url = format!("{}/api/products/{}", Self::api_base_url()?, product_id);
        Self::fetch_json(&url, "PUT", Some(product_json)).await
    }

    pub async fn delete_product(product_id: &str) -> Result<(), JsValue> {
        let url = format!("{}/api/products/{}", Self::api_base_url()?, product_id);
        let _ = Self::fetch_json(&url, "DELETE", None).await?;
        Ok(())
    }

    // -------------------------------------------------------------------
    // Fetch helpers
    // -------------------------------------------------------------------

    /// Like `fetch_with_status` but treats any non-2xx as an error.
    pub async fn fetch_json(url: &str, method: &str, body: Option<&str>) -> Result<String, JsValue> {
        let (status, text) = Self::fetch_with_status(url, method, body).await?;
        if (200..300).contains(&status) {
            Ok(text)
        } else {
            Err(JsValue::from_str(&format!(
                "API request failed: {} {}",
                status, text
            )))
        }
    }

    /// Perform a request and return `(status, body-text)`.  The caller decides
    /// which statuses are errors; only transport failures become `Err`.
    async fn fetch_with_status(
        url: &str,
        method: &str,
        body: Option<&str>,
    ) -> Result<(u16, String), JsValue> {
        let opts = RequestInit::new();
        opts.set_method(method);
        opts.set_mode(RequestMode::Cors);
        opts.set_credentials(RequestCredentials::Include);

        let headers = Headers::new()?;
        if let Some(data) = body {
            let js_body = JsValue::from_str(data);
            opts.set_body(&js_body);
            headers.append("Content-Type", "application/json")?;
        }
        opts.set_headers(&headers);

        let request = Request::new_with_str_and_init(url, &opts)?;

        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no global window"))?;
        let resp_value = JsFuture::from(window.fetch_with_request(&request)).await?;
        let resp: Response = resp_value.dyn_into()?;

        let status = resp.status();
        let text = JsFuture::from(resp.text()?).await?;
        Ok((status, text.as_string().unwrap_or_default()))
    }
}
