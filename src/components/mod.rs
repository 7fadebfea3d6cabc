pub mod chat_view;
pub mod context_menu;
pub mod site_header;
