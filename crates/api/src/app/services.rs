//! Collaborators shared by the gateway handlers.

use std::sync::Arc;

use taskmanager_observability::MetricsRegistry;
use taskmanager_tasks::TaskService;

use crate::auth_client::AuthClient;

#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<dyn AuthClient>,
    pub tasks: TaskService,
    pub metrics: MetricsRegistry,
}

impl AppServices {
    pub fn new(auth: Arc<dyn AuthClient>, tasks: TaskService, metrics: MetricsRegistry) -> Self {
        Self {
            auth,
            tasks,
            metrics,
        }
    }
}
