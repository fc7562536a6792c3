pub mod chat_service;
pub mod command_router;
pub mod gmail_service;
pub mod mail_adapter;
pub mod mail_backend;
pub mod numerals;
pub mod outlook_service;
pub mod setup;
pub mod speech;
pub mod transcript_log;
pub mod voice_loop;
