//! Landing section.  Static content, so it may render before the bootstrap
//! finishes; the header catches up when the config arrives.

use web_sys::Document;

use crate::constants::SECTION_HOME;
use crate::dom_utils;
use crate::state::APP_STATE;

pub fn render(document: &Document) {
    let Some(section) = document.get_element_by_id(SECTION_HOME) else {
        return;
    };
    dom_utils::clear_children(&section);

    let title = APP_STATE.with(|s| s.borrow().site_config.title.clone());

    if let Ok(heading) = document.create_element("h1") {
        heading.set_text_content(Some(&format!("Welcome to {}", title)));
        let _ = section.append_child(&heading);
    }
    if let Ok(blurb) = document.create_element("p") {
        blurb.set_text_content(Some(
            "Browse the catalog or open a support ticket to chat with us.",
        ));
        let _ = section.append_child(&blurb);
    }
}
