pub mod email;
pub mod session_state;
pub mod transcript;
