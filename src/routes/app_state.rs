use std::sync::Arc;
use crate::global_session_manager::GlobalSessionManager;
use crate::services::command_router::CommandRouter;

#[derive(Clone)]
pub struct AppState {
    pub router: Arc<CommandRouter>,
    pub session_manager: GlobalSessionManager,
}
