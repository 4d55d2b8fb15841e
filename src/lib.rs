pub mod domain;
pub mod frameworks;
pub mod interface_adapters;
pub mod use_cases;

pub use frameworks::client::{connect_session, run_with_config};
pub use frameworks::config::session_server_url;
