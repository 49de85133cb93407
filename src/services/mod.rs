// WebSession services
// Services provide the page-load machinery: state machine, engine, DNS resolution, page context.

pub mod dns_resolver;
pub mod page_context;
pub mod page_load_engine;
pub mod web_view_state;
