use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;

use taskmanager_core::{TaskId, UserId};

use crate::error::{TaskError, TaskResult};
use crate::task::Task;

/// Task persistence.
#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert(&self, task: &Task) -> TaskResult<()>;

    /// Tasks owned by `owner`, newest first.
    async fn list_by_owner(&self, owner: UserId) -> TaskResult<Vec<Task>>;

    async fn get(&self, id: TaskId) -> TaskResult<Task>;
}

/// In-memory task store for tests/dev.
#[derive(Debug, Default)]
pub struct InMemoryTaskStore {
    tasks: RwLock<HashMap<TaskId, Task>>,
}

impl InMemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned() -> TaskError {
    TaskError::unavailable("task store lock poisoned")
}

#[async_trait]
impl TaskStore for InMemoryTaskStore {
    async fn insert(&self, task: &Task) -> TaskResult<()> {
        let mut tasks = self.tasks.write().map_err(|_| poisoned())?;
        if tasks.contains_key(&task.id) {
            return Err(TaskError::validation(format!("task {} already exists", task.id)));
        }
        tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn list_by_owner(&self, owner: UserId) -> TaskResult<Vec<Task>> {
        let tasks = self.tasks.read().map_err(|_| poisoned())?;
        let mut owned: Vec<Task> = tasks.values().filter(|t| t.owner == owner).cloned().collect();
        // v7 ids are time-ordered, which breaks ties on equal timestamps.
        owned.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.as_uuid().cmp(a.id.as_uuid()))
        });
        Ok(owned)
    }

    async fn get(&self, id: TaskId) -> TaskResult<Task> {
        let tasks = self.tasks.read().map_err(|_| poisoned())?;
        tasks.get(&id).cloned().ok_or(TaskError::NotFound)
    }
}
