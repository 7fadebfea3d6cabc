//! Site header: title, configured links and the session corner.  Rebuilt
//! wholesale whenever the session or the site configuration is replaced.

use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{Document, Element, MouseEvent};

use crate::dom_utils;
use crate::state::APP_STATE;

const HEADER_ID: &str = "site-header";

pub fn render(document: &Document) -> Result<(), JsValue> {
    let (config, session) = APP_STATE.with(|s| {
        let state = s.borrow();
        (state.site_config.clone(), state.session.clone())
    });

    document.set_title(&config.title);
    set_favicon(document, &config.icon_url)?;

    let header = ensure_header(document)?;
    dom_utils::clear_children(&header);

    let title = document.create_element("a")?;
    title.set_class_name("site-title");
    title.set_attribute("href", "#home")?;
    title.set_text_content(Some(&config.title));
    header.append_child(&title)?;

    let nav = document.create_element("nav")?;
    nav.set_class_name("site-nav");
    for link in &config.header_links {
        let a = document.create_element("a")?;
        a.set_attribute("href", &link.href)?;
        if let Some(target) = &link.target {
            a.set_attribute("target", target)?;
        }
        a.set_text_content(Some(&link.name));
        nav.append_child(&a)?;
    }
    header.append_child(&nav)?;

    let corner = document.create_element("div")?;
    corner.set_class_name("session-corner");
    if session.logged_in {
        let name = document.create_element("span")?;
        name.set_class_name("session-username");
        name.set_text_content(session.username.as_deref());
        corner.append_child(&name)?;

        let logout = document.create_element("button")?;
        logout.set_text_content(Some("Sign out"));
        let on_click = Closure::wrap(Box::new(move |_: MouseEvent| {
            if let Err(e) = crate::utils::logout() {
                web_sys::console::error_1(&format!("Logout failed: {:?}", e).into());
            }
        }) as Box<dyn FnMut(MouseEvent)>);
        logout.add_event_listener_with_callback("click", on_click.as_ref().unchecked_ref())?;
        on_click.forget();
        corner.append_child(&logout)?;
    } else {
        let sign_in = document.create_element("a")?;
        sign_in.set_attribute("href", "/auth/login")?;
        sign_in.set_text_content(Some("Sign in"));
        corner.append_child(&sign_in)?;
    }
    header.append_child(&corner)?;

    Ok(())
}

fn ensure_header(document: &Document) -> Result<Element, JsValue> {
    if let Some(el) = document.get_element_by_id(HEADER_ID) {
        return Ok(el);
    }
    let header = document.create_element("header")?;
    header.set_id(HEADER_ID);
    if let Some(body) = document.body() {
        // Header always sits above the page sections.
        body.prepend_with_node_1(&header)?;
    }
    Ok(header)
}

fn set_favicon(document: &Document, icon_url: &str) -> Result<(), JsValue> {
    if icon_url.is_empty() {
        return Ok(());
    }
    let link = match document.query_selector("link[rel=\"icon\"]")? {
        Some(existing) => existing,
        None => {
            let link = document.create_element("link")?;
            link.set_attribute("rel", "icon")?;
            if let Some(head) = document.query_selector("head")? {
                head.append_child(&link)?;
            }
            link
        }
    };
    link.set_attribute("href", icon_url)
}
