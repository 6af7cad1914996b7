use std::sync::Arc;

use chrono::Utc;

use taskmanager_core::{TaskId, UserId};

use crate::error::{TaskError, TaskResult};
use crate::store::TaskStore;
use crate::task::{NewTask, Task};

/// Owner-scoped task operations.
///
/// Every read is filtered by owner; another owner's task is reported as
/// `NotFound`, never as forbidden.
#[derive(Clone)]
pub struct TaskService {
    store: Arc<dyn TaskStore>,
}

impl TaskService {
    pub fn new(store: Arc<dyn TaskStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, owner: UserId, input: NewTask) -> TaskResult<Task> {
        let input = input.normalized()?;
        let now = Utc::now();
        let task = Task {
            id: TaskId::new(),
            owner,
            title: input.title,
            description: input.description,
            priority: input.priority,
            status: input.status,
            tags: input.tags,
            due_date: input.due_date,
            created_at: now,
            updated_at: now,
        };
        self.store.insert(&task).await?;
        tracing::info!(task_id = %task.id, owner = %owner, "task created");
        Ok(task)
    }

    pub async fn list(&self, owner: UserId) -> TaskResult<Vec<Task>> {
        self.store.list_by_owner(owner).await
    }

    pub async fn get(&self, owner: UserId, id: TaskId) -> TaskResult<Task> {
        let task = self.store.get(id).await?;
        if task.owner != owner {
            tracing::debug!(task_id = %id, "task requested by non-owner");
            return Err(TaskError::NotFound);
        }
        Ok(task)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryTaskStore;
    use crate::task::{Priority, Status};

    fn service() -> TaskService {
        TaskService::new(Arc::new(InMemoryTaskStore::new()))
    }

    #[tokio::test]
    async fn create_assigns_owner_and_defaults() {
        let svc = service();
        let owner = UserId::new();
        let task = svc.create(owner, NewTask::titled("buy milk")).await.unwrap();

        assert_eq!(task.owner, owner);
        assert_eq!(task.title, "buy milk");
        assert_eq!(task.priority, Priority::Medium);
        assert_eq!(task.status, Status::Todo);
        assert_eq!(svc.get(owner, task.id).await.unwrap(), task);
    }

    #[tokio::test]
    async fn empty_title_is_rejected() {
        let err = service().create(UserId::new(), NewTask::titled("")).await.unwrap_err();
        assert!(matches!(err, TaskError::Validation(_)));
    }

    #[tokio::test]
    async fn list_is_owner_scoped_and_newest_first() {
        let svc = service();
        let alice = UserId::new();
        let bob = UserId::new();
        let first = svc.create(alice, NewTask::titled("first")).await.unwrap();
        let second = svc.create(alice, NewTask::titled("second")).await.unwrap();
        svc.create(bob, NewTask::titled("bob's")).await.unwrap();

        let listed = svc.list(alice).await.unwrap();
        assert_eq!(listed.iter().map(|t| t.id).collect::<Vec<_>>(), vec![second.id, first.id]);
        assert!(svc.list(UserId::new()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn other_owners_tasks_are_not_found() {
        let svc = service();
        let alice = UserId::new();
        let task = svc.create(alice, NewTask::titled("private")).await.unwrap();

        assert!(matches!(svc.get(UserId::new(), task.id).await, Err(TaskError::NotFound)));
        assert!(matches!(svc.get(alice, TaskId::new()).await, Err(TaskError::NotFound)));
    }
}
