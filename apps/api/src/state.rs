use rentfold_application::{NotificationService, UserService, WorkflowService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub user_service: UserService,
    pub workflow_service: WorkflowService,
    pub notification_service: NotificationService,
    pub frontend_url: String,
    pub bootstrap_token: String,
}
