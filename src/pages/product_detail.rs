//! Product detail section.

use gloo_timers::future::TimeoutFuture;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::spawn_local;
use web_sys::Document;

use crate::constants::{ERROR_REDIRECT_DELAY_MS, ROUTE_PRODUCTS, SECTION_PRODUCT_DETAIL};
use crate::dom_utils;
use crate::models::Product;
use crate::network::ApiClient;
use crate::state;
use crate::toast;

pub fn load(document: &Document, product_id: String, generation: u64) {
    let document = document.clone();
    spawn_local(async move {
        let result = ApiClient::get_product(&product_id).await;
        if !state::generation_current(generation) {
            crate::debug_log!("Discarding stale product detail response for {}", product_id);
            return;
        }
        match result {
            Ok(Some(product)) => {
                if let Err(e) = render(&document, &product) {
                    web_sys::console::error_1(
                        &format!("Product detail render failed: {:?}", e).into(),
                    );
                }
            }
            Ok(None) => {
                render_missing(&document, "This product is unavailable.");
                toast::error("Product not found");
                fall_back_to_list(generation).await;
            }
            Err(e) => {
                web_sys::console::error_1(&format!("Product detail fetch failed: {:?}", e).into());
                render_missing(&document, "Could not load this product.");
                toast::error("Could not load the product");
                fall_back_to_list(generation).await;
            }
        }
    });
}

async fn fall_back_to_list(generation: u64) {
    TimeoutFuture::new(ERROR_REDIRECT_DELAY_MS).await;
    if !state::generation_current(generation) {
        return;
    }
    if let Some(window) = web_sys::window() {
        let _ = window.location().set_hash(&format!("#{}", ROUTE_PRODUCTS));
    }
}

fn render(document: &Document, product: &Product) -> Result<(), JsValue> {
    let section = dom_utils::require_el(document, SECTION_PRODUCT_DETAIL)?;
    dom_utils::clear_children(&section);

    let heading = document.create_element("h2")?;
    heading.set_text_content(Some(&product.name));
    section.append_child(&heading)?;

    if let Some(image_url) = &product.image_url {
        let img = document.create_element("img")?;
        img.set_attribute("src", image_url)?;
        img.set_attribute("alt", &product.name)?;
        section.append_child(&img)?;
    }

    let description = document.create_element("p")?;
    description.set_text_content(Some(&product.description));
    section.append_child(&description)?;

    let price = document.create_element("span")?;
    price.set_class_name("product-price");
    price.set_text_content(Some(&format!(
        "${}.{:02}",
        product.price_cents / 100,
        (product.price_cents % 100).abs()
    )));
    section.append_child(&price)?;

    let back = document.create_element("a")?;
    back.set_attribute("href", &format!("#{}", ROUTE_PRODUCTS))?;
    back.set_text_content(Some("Back to products"));
    section.append_child(&back)?;

    Ok(())
}

fn render_missing(document: &Document, text: &str) {
    if let Some(section) = document.get_element_by_id(SECTION_PRODUCT_DETAIL) {
        dom_utils::clear_children(&section);
        if let Ok(p) = document.create_element("p") {
            p.set_class_name("inline-error");
            p.set_text_content(Some(text));
            let _ = section.append_child(&p);
        }
    }
}
