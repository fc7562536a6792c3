pub mod command_handler;
pub mod oauth_handler;
pub mod session_handler;
pub mod settings_handler;
pub mod transcript_handler;
