//! Tiny toast / notification helper.
//! Creates a `#toast-root` container once per page and appends toast divs
//! that fade out after a few seconds.  No toast in this crate is fatal or
//! blocking; everything here is fire-and-forget.

use wasm_bindgen::{closure::Closure, JsCast};
use web_sys::{Document, Element, HtmlElement};

use crate::constants::TOAST_DISMISS_MS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToastKind {
    Success,
    Error,
    Info,
    Warning,
}

pub fn success(msg: &str) {
    show(msg, ToastKind::Success);
}

pub fn error(msg: &str) {
    show(msg, ToastKind::Error);
}

pub fn info(msg: &str) {
    show(msg, ToastKind::Info);
}

pub fn warning(msg: &str) {
    show(msg, ToastKind::Warning);
}

pub fn show(message: &str, kind: ToastKind) {
    let window = match web_sys::window() {
        Some(w) => w,
        None => return,
    };
    let document = match window.document() {
        Some(d) => d,
        None => return,
    };

    let root = match ensure_root(&document) {
        Some(el) => el,
        None => return,
    };

    let toast = match document.create_element("div") {
        Ok(el) => el,
        Err(_) => return,
    };
    toast.set_class_name("toast");
    let modifier = match kind {
        ToastKind::Success => "toast-success",
        ToastKind::Error => "toast-error",
        ToastKind::Info => "toast-info",
        ToastKind::Warning => "toast-warning",
    };
    let _ = toast.class_list().add_1(modifier);
    toast.set_text_content(Some(message));

    // Prepend so the newest appears on top.
    let _ = root.prepend_with_node_1(&toast);

    let toast_clone: HtmlElement = toast.unchecked_into();
    let cb = Closure::once_into_js(move || {
        let _ = toast_clone
            .parent_node()
            .map(|p| p.remove_child(&toast_clone));
    });
    let _ = window.set_timeout_with_callback_and_timeout_and_arguments_0(
        cb.as_ref().unchecked_ref(),
        TOAST_DISMISS_MS,
    );

    ensure_styles(&document);
}

fn ensure_root(document: &Document) -> Option<Element> {
    if let Some(el) = document.get_element_by_id("toast-root") {
        return Some(el);
    }
    let root = document.create_element("div").ok()?;
    root.set_id("toast-root");
    root.set_class_name("toast-root");
    if let Some(body) = document.body() {
        let _ = body.append_child(&root);
    }
    Some(root)
}

fn ensure_styles(document: &Document) {
    if document.get_element_by_id("toast-styles").is_some() {
        return;
    }

    let css = "
.toast-root{position:fixed;top:16px;right:16px;display:flex;flex-direction:column;gap:8px;z-index:9999;font-family:Arial,Helvetica,sans-serif}
.toast{padding:10px 16px;border-radius:4px;color:#fff;box-shadow:0 2px 4px rgba(0,0,0,.1);opacity:0;animation:toast-in .2s forwards}
.toast-success{background:#16a34a}
.toast-error{background:#dc2626}
.toast-info{background:#2563eb}
.toast-warning{background:#d97706}
@keyframes toast-in{to{opacity:1}}
";

    if let Ok(style) = document.create_element("style") {
        style.set_id("toast-styles");
        style.set_text_content(Some(css));
        if let Ok(Some(head)) = document.query_selector("head") {
            let _ = head.append_child(&style);
        } else if let Some(body) = document.body() {
            let _ = body.append_child(&style);
        }
    }
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::*;
    use wasm_bindgen_test::*;

    wasm_bindgen_test_configure!(run_in_browser);

    #[wasm_bindgen_test]
    fn show_creates_the_root_and_prepends_the_toast() {
        let document = web_sys::window().unwrap().document().unwrap();

        show("saved", ToastKind::Success);
        let root = document.get_element_by_id("toast-root").unwrap();
        let newest = root.first_element_child().unwrap();
        assert!(newest.class_list().contains("toast"));
        assert!(newest.class_list().contains("toast-success"));

        // A second toast reuses the root and lands on top.
        show("failed", ToastKind::Error);
        let root_again = document.get_element_by_id("toast-root").unwrap();
        assert_eq!(root, root_again);
        let newest = root.first_element_child().unwrap();
        assert!(newest.class_list().contains("toast-error"));
    }
}
