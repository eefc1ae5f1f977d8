pub mod request;
pub mod resolve;
pub mod settings;

pub use request::handle_request_command;
pub use resolve::{handle_match_command, handle_resolve_command};
pub use settings::handle_settings_command;
