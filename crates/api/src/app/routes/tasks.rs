use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, rejection::JsonRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};

use taskmanager_core::TaskId;
use taskmanager_tasks::NewTask;

use crate::app::dto::{TaskEnvelope, TaskList};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::context::PrincipalContext;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_task).get(list_tasks))
        .route("/:id", get(get_task))
}

pub async fn create_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    payload: Result<Json<NewTask>, JsonRejection>,
) -> Response {
    let Json(body) = match payload {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.tasks.create(principal.subject(), body).await {
        Ok(task) => (StatusCode::CREATED, Json(TaskEnvelope { task })).into_response(),
        Err(e) => errors::task_error_to_response(e),
    }
}

pub async fn list_tasks(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    match services.tasks.list(principal.subject()).await {
        Ok(tasks) => Json(TaskList::from(tasks)).into_response(),
        Err(e) => errors::task_error_to_response(e),
    }
}

pub async fn get_task(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    let Ok(id) = id.parse::<TaskId>() else {
        return errors::json_error(StatusCode::NOT_FOUND, "NOT_FOUND", "task not found");
    };

    match services.tasks.get(principal.subject(), id).await {
        Ok(task) => Json(TaskEnvelope { task }).into_response(),
        Err(e) => errors::task_error_to_response(e),
    }
}
