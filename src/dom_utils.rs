//! Thin helper layer for repetitive DOM operations so `set_attribute("style",
//! ...)` calls are not sprinkled across the code-base.

use wasm_bindgen::JsValue;
use web_sys::{Document, Element};

/// Make the element visible by toggling CSS classes.
pub fn show(el: &Element) {
    let _ = el.class_list().remove_1("hidden");
    let _ = el.class_list().add_1("visible");
}

/// Hide the element by toggling CSS classes.
pub fn hide(el: &Element) {
    let _ = el.class_list().remove_1("visible");
    let _ = el.class_list().add_1("hidden");
}

/// Fetch an element by id, erroring instead of panicking when it is missing.
pub fn require_el(document: &Document, id: &str) -> Result<Element, JsValue> {
    document
        .get_element_by_id(id)
        .ok_or_else(|| JsValue::from_str(&format!("#{} not found", id)))
}

/// Remove every child of `el`.  Used by the stateless render helpers that
/// rebuild a container from scratch on each refresh.
pub fn clear_children(el: &Element) {
    while let Some(child) = el.first_child() {
        let _ = el.remove_child(&child);
    }
}
