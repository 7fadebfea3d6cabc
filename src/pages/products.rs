//! Product catalog section.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::spawn_local;
use web_sys::{Document, Element, MouseEvent};

use crate::components::context_menu::{self, MenuKind};
use crate::constants::SECTION_PRODUCTS;
use crate::dom_utils;
use crate::models::Product;
use crate::network::ApiClient;
use crate::state;
use crate::toast;

pub fn load(document: &Document, generation: u64) {
    let document = document.clone();
    spawn_local(async move {
        let result = ApiClient::get_products().await;
        if !state::generation_current(generation) {
            crate::debug_log!("Discarding stale product list response");
            return;
        }
        match result {
            Ok(products) => {
                if let Err(e) = render(&document, &products) {
                    web_sys::console::error_1(&format!("Product render failed: {:?}", e).into());
                }
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Product list fetch failed: {:?}", e).into());
                toast::error("Could not load products");
            }
        }
    });
}

fn render(document: &Document, products: &[Product]) -> Result<(), JsValue> {
    let section = dom_utils::require_el(document, SECTION_PRODUCTS)?;
    dom_utils::clear_children(&section);

    let heading = document.create_element("h2")?;
    heading.set_text_content(Some("Products"));
    section.append_child(&heading)?;

    if products.is_empty() {
        let empty = document.create_element("p")?;
        empty.set_text_content(Some("No products available right now."));
        section.append_child(&empty)?;
        return Ok(());
    }

    let grid = document.create_element("div")?;
    grid.set_class_name("product-grid");
    for product in products {
        let card = build_card(document, product)?;
        grid.append_child(&card)?;
    }
    section.append_child(&grid)?;
    Ok(())
}

fn build_card(document: &Document, product: &Product) -> Result<Element, JsValue> {
    let card = document.create_element("div")?;
    card.set_class_name("product-card");
    card.set_attribute("data-product-id", &product.id)?;
    card.set_attribute("data-product-name", &product.name)?;
    if let Some(category) = &product.category {
        card.set_attribute("data-category", category)?;
    }
    if let Some(device_type) = &product.device_type {
        card.set_attribute("data-device-type", device_type)?;
    }

    let name = document.create_element("h3")?;
    name.set_text_content(Some(&product.name));
    card.append_child(&name)?;

    let price = document.create_element("span")?;
    price.set_class_name("product-price");
    price.set_text_content(Some(&format_price(product.price_cents)));
    card.append_child(&price)?;

    let product_id = product.id.clone();
    let on_click = Closure::wrap(Box::new(move |_: MouseEvent| {
        if let Some(window) = web_sys::window() {
            let _ = window.location().set_hash(&format!(
                "#{}?id={}",
                crate::constants::ROUTE_PRODUCT_DETAIL,
                product_id
            ));
        }
    }) as Box<dyn FnMut(MouseEvent)>);
    card.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
    on_click.forget();

    let card_for_menu = card.clone();
    let on_context = Closure::wrap(Box::new(move |event: MouseEvent| {
        event.prevent_default();
        if let Err(e) = context_menu::open(MenuKind::Product, &card_for_menu, &event) {
            web_sys::console::error_1(&format!("Failed to open product menu: {:?}", e).into());
        }
    }) as Box<dyn FnMut(MouseEvent)>);
    card.add_event_listener_with_callback("contextmenu", on_context.as_ref().unchecked_ref())?;
    on_context.forget();

    Ok(card)
}

fn format_price(price_cents: i64) -> String {
    format!("${}.{:02}", price_cents / 100, (price_cents % 100).abs())
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn prices_format_as_dollars() {
        assert_eq!(format_price(0), "$0.00");
        assert_eq!(format_price(999), "$9.99");
        assert_eq!(format_price(120000), "$1200.00");
        assert_eq!(format_price(105), "$1.05");
    }
}
