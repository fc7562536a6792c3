pub mod app_state;
pub mod command_routes;
pub mod oauth_routes;
pub mod session_routes;
