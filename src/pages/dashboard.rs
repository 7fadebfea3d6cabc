//! Moderator dashboard: edits the site configuration the header renders and
//! manages the product catalog (create, rename or reprice, delete).

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, HtmlInputElement, MouseEvent};

use crate::constants::SECTION_DASHBOARD;
use crate::dom_utils;
use crate::messages::Message;
use crate::models::{Product, SiteConfig};
use crate::network::ApiClient;
use crate::state::{self, dispatch_global_message};
use crate::toast;

const TITLE_ID: &str = "config-title";
const ICON_ID: &str = "config-icon";
const PRODUCT_LIST_ID: &str = "product-admin-list";
const NEW_PRODUCT_NAME_ID: &str = "new-product-name";
const NEW_PRODUCT_PRICE_ID: &str = "new-product-price";

pub fn load(document: &Document, generation: u64) {
    let document = document.clone();
    spawn_local(async move {
        let result = ApiClient::fetch_site_config().await;
        if !state::generation_current(generation) {
            crate::debug_log!("Discarding stale site config response");
            return;
        }
        match result {
            Ok(config) => {
                if let Err(e) = render(&document, &config) {
                    web_sys::console::error_1(&format!("Dashboard render failed: {:?}", e).into());
                }
                load_products(document.clone(), generation);
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Site config fetch failed: {:?}", e).into());
                toast::error("Could not load the site configuration");
            }
        }
    });
}

fn render(document: &Document, config: &SiteConfig) -> Result<(), JsValue> {
    let section = dom_utils::require_el(document, SECTION_DASHBOARD)?;
    dom_utils::clear_children(&section);

    let heading = document.create_element("h2")?;
    heading.set_text_content(Some("Site configuration"));
    section.append_child(&heading)?;

    let title = document.create_element("input")?;
    title.set_id(TITLE_ID);
    title.set_attribute("type", "text")?;
    title.set_attribute("value", &config.title)?;
    section.append_child(&title)?;

    let icon = document.create_element("input")?;
    icon.set_id(ICON_ID);
    icon.set_attribute("type", "text")?;
    icon.set_attribute("value", &config.icon_url)?;
    section.append_child(&icon)?;

    let save = document.create_element("button")?;
    save.set_text_content(Some("Save"));
    let links = config.header_links.clone();
    let on_click = Closure::wrap(Box::new(move |_: MouseEvent| {
        save_config(links.clone());
    }) as Box<dyn FnMut(MouseEvent)>);
    save.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    section.append_child(&save)?;

    render_product_admin(document, &section)?;
    Ok(())
}

fn save_config(header_links: Vec<crate::models::HeaderLink>) {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let read = |id: &str| {
        document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|el| el.value())
            .unwrap_or_default()
    };
    let config = SiteConfig {
        title: read(TITLE_ID),
        icon_url: read(ICON_ID),
        header_links,
    };
    if config.title.trim().is_empty() {
        toast::info("The site title cannot be empty");
        return;
    }

    spawn_local(async move {
        match ApiClient::save_site_config(&config).await {
            Ok(()) => {
                toast::success("Configuration saved");
                dispatch_global_message(Message::SiteConfigReplaced(config));
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Site config save failed: {:?}", e).into());
                toast::error("Could not save the configuration");
            }
        }
    });
}

// ---------------------------------------------------------------------------
// Product management
// ---------------------------------------------------------------------------

fn render_product_admin(document: &Document, section: &Element) -> Result<(), JsValue> {
    let heading = document.create_element("h2")?;
    heading.set_text_content(Some("Products"));
    section.append_child(&heading)?;

    // Filled once the catalog fetch lands.
    let list = document.create_element("div")?;
    list.set_id(PRODUCT_LIST_ID);
    section.append_child(&list)?;

    let form = document.create_element("div")?;
    form.set_class_name("new-product-form");

    let name = document.create_element("input")?;
    name.set_id(NEW_PRODUCT_NAME_ID);
    name.set_attribute("type", "text")?;
    name.set_attribute("placeholder", "Product name")?;
    form.append_child(&name)?;

    let price = document.create_element("input")?;
    price.set_id(NEW_PRODUCT_PRICE_ID);
    price.set_attribute("type", "text")?;
    price.set_attribute("placeholder", "Price (e.g. 19.99)")?;
    form.append_child(&price)?;

    let add = document.create_element("button")?;
    add.set_text_content(Some("Add product"));
    let on_click = Closure::wrap(Box::new(move |_: MouseEvent| {
        submit_new_product();
    }) as Box<dyn FnMut(MouseEvent)>);
    add.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();
    form.append_child(&add)?;

    section.append_child(&form)?;
    Ok(())
}

fn load_products(document: Document, generation: u64) {
    spawn_local(async move {
        let result = ApiClient::get_products().await;
        if !state::generation_current(generation) {
            crate::debug_log!("Discarding stale product admin response");
            return;
        }
        match result {
            Ok(products) => {
                if let Err(e) = render_products(&document, &products) {
                    web_sys::console::error_1(
                        &format!("Product admin render failed: {:?}", e).into(),
                    );
                }
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Product admin fetch failed: {:?}", e).into());
                toast::error("Could not load products for editing");
            }
        }
    });
}

fn render_products(document: &Document, products: &[Product]) -> Result<(), JsValue> {
    // The section may have been navigated away from while the fetch ran.
    let Some(list) = document.get_element_by_id(PRODUCT_LIST_ID) else {
        return Ok(());
    };
    dom_utils::clear_children(&list);

    if products.is_empty() {
        let empty = document.create_element("p")?;
        empty.set_text_content(Some("No products in the catalog."));
        list.append_child(&empty)?;
        return Ok(());
    }

    for product in products {
        let row = build_product_row(document, product)?;
        list.append_child(&row)?;
    }
    Ok(())
}

fn build_product_row(document: &Document, product: &Product) -> Result<Element, JsValue> {
    let row = document.create_element("div")?;
    row.set_class_name("product-admin-row");
    row.set_attribute("data-product-id", &product.id)?;

    let name: HtmlInputElement = document.create_element("input")?.dyn_into()?;
    name.set_attribute("type", "text")?;
    name.set_value(&product.name);
    row.append_child(&name)?;

    let price: HtmlInputElement = document.create_element("input")?.dyn_into()?;
    price.set_attribute("type", "text")?;
    price.set_value(&price_field(product.price_cents));
    row.append_child(&price)?;

    let save = document.create_element("button")?;
    save.set_text_content(Some("Save"));
    let product_for_save = product.clone();
    let name_for_save = name.clone();
    let price_for_save = price.clone();
    let on_save = Closure::wrap(Box::new(move |_: MouseEvent| {
        submit_product_update(&product_for_save, &name_for_save, &price_for_save);
    }) as Box<dyn FnMut(MouseEvent)>);
    save.add_event_listener_with_callback("click", on_save.as_ref().unchecked_ref())?;
    on_save.forget();
    row.append_child(&save)?;

    let delete = document.create_element("button")?;
    delete.set_text_content(Some("Delete"));
    let product_id = product.id.clone();
    let on_delete = Closure::wrap(Box::new(move |_: MouseEvent| {
        submit_product_delete(product_id.clone());
    }) as Box<dyn FnMut(MouseEvent)>);
    delete.add_event_listener_with_callback("click", on_delete.as_ref().unchecked_ref())?;
    on_delete.forget();
    row.append_child(&delete)?;

    Ok(row)
}

fn submit_new_product() {
    let Some(document) = web_sys::window().and_then(|w| w.document()) else {
        return;
    };
    let read = |id: &str| {
        document
            .get_element_by_id(id)
            .and_then(|el| el.dyn_into::<HtmlInputElement>().ok())
            .map(|el| el.value())
            .unwrap_or_default()
    };
    let name = read(NEW_PRODUCT_NAME_ID);
    if name.trim().is_empty() {
        toast::info("The product needs a name");
        return;
    }
    let Some(price_cents) = parse_price_cents(&read(NEW_PRODUCT_PRICE_ID)) else {
        toast::info("Enter a price like 19.99");
        return;
    };

    let payload = product_payload(name.trim(), price_cents, None, None);
    spawn_local(async move {
        match ApiClient::create_product(&payload).await {
            Ok(_) => {
                toast::success("Product created");
                refresh_catalog();
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Product creation failed: {:?}", e).into());
                toast::error("Could not create the product");
            }
        }
    });
}

fn submit_product_update(product: &Product, name: &HtmlInputElement, price: &HtmlInputElement) {
    let name = name.value();
    if name.trim().is_empty() {
        toast::info("The product needs a name");
        return;
    }
    let Some(price_cents) = parse_price_cents(&price.value()) else {
        toast::info("Enter a price like 19.99");
        return;
    };

    let product_id = product.id.clone();
    let payload = product_payload(
        name.trim(),
        price_cents,
        product.category.as_deref(),
        product.device_type.as_deref(),
    );
    spawn_local(async move {
        match ApiClient::update_product(&product_id, &payload).await {
            Ok(_) => {
                toast::success("Product updated");
                refresh_catalog();
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Product update failed: {:?}", e).into());
                toast::error("Could not update the product");
            }
        }
    });
}

fn submit_product_delete(product_id: String) {
    spawn_local(async move {
        match ApiClient::delete_product(&product_id).await {
            Ok(()) => {
                toast::success("Product deleted");
                refresh_catalog();
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Product deletion failed: {:?}", e).into());
                toast::error("Could not delete the product");
            }
        }
    });
}

/// Re-fetch the catalog under the current navigation generation so a user who
/// has since left the dashboard does not get a stale render.
fn refresh_catalog() {
    if let Some(document) = web_sys::window().and_then(|w| w.document()) {
        load_products(document, state::nav_generation());
    }
}

/// Serialize a product body for create/update.  Category and device type are
/// preserved from the existing product on updates; omitted entirely when
/// absent rather than sent as nulls.
fn product_payload(
    name: &str,
    price_cents: i64,
    category: Option<&str>,
    device_type: Option<&str>,
) -> String {
    let mut payload = serde_json::json!({
        "name": name,
        "price_cents": price_cents,
    });
    if let Some(category) = category {
        payload["category"] = category.into();
    }
    if let Some(device_type) = device_type {
        payload["device_type"] = device_type.into();
    }
    payload.to_string()
}

/// Parse a dollars field ("19.99", "$5", "7.5") into cents.  `None` for
/// anything malformed; negative prices never parse.
fn parse_price_cents(raw: &str) -> Option<i64> {
    let raw = raw.trim().trim_start_matches('$').trim();
    if raw.is_empty() || raw.starts_with('-') {
        return None;
    }
    let (dollars, cents) = match raw.split_once('.') {
        Some((d, c)) => (d, c),
        None => (raw, ""),
    };
    let dollars: i64 = if dollars.is_empty() {
        0
    } else {
        dollars.parse().ok()?
    };
    let cents: i64 = match cents.len() {
        0 => 0,
        1 => cents.parse::<i64>().ok()? * 10,
        2 => cents.parse().ok()?,
        _ => return None,
    };
    if cents < 0 {
        return None;
    }
    Some(dollars * 100 + cents)
}

/// Inverse of `parse_price_cents` for prefilling the edit field.
fn price_field(price_cents: i64) -> String {
    format!("{}.{:02}", price_cents / 100, (price_cents % 100).abs())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn prices_parse_to_cents() {
        assert_eq!(parse_price_cents("19.99"), Some(1999));
        assert_eq!(parse_price_cents("$5"), Some(500));
        assert_eq!(parse_price_cents("7.5"), Some(750));
        assert_eq!(parse_price_cents(".25"), Some(25));
        assert_eq!(parse_price_cents(" 1200.00 "), Some(120000));
    }

    #[test]
    fn malformed_prices_do_not_parse() {
        assert_eq!(parse_price_cents(""), None);
        assert_eq!(parse_price_cents("abc"), None);
        assert_eq!(parse_price_cents("1.999"), None);
        assert_eq!(parse_price_cents("-3.00"), None);
        assert_eq!(parse_price_cents("-0.50"), None);
        assert_eq!(parse_price_cents("3.-5"), None);
    }

    #[test]
    fn price_field_round_trips() {
        for cents in [0, 25, 500, 1999, 120000] {
            assert_eq!(parse_price_cents(&price_field(cents)), Some(cents));
        }
    }

    #[test]
    fn product_payload_skips_absent_optionals() {
        let body: serde_json::Value =
            serde_json::from_str(&product_payload("Widget", 1999, None, None)).unwrap();
        assert_eq!(body["name"], "Widget");
        assert_eq!(body["price_cents"], 1999);
        assert!(body.get("category").is_none());
        assert!(body.get("device_type").is_none());
    }

    #[test]
    fn product_payload_preserves_optionals() {
        let body: serde_json::Value =
            serde_json::from_str(&product_payload("Hub", 4999, Some("hardware"), Some("hub")))
                .unwrap();
        assert_eq!(body["category"], "hardware");
        assert_eq!(body["device_type"], "hub");
    }
}
