use std::sync::Arc;

use tracing::{debug, info, instrument};

use taskboard_domain::entities::{NewTask, Task, TaskUpdate};
use taskboard_domain::repositories::TaskRepository;
use taskboard_errors::{TaskboardError, TaskboardResult};

use crate::clock::Clock;

/// 单任务增删改查，所有写操作都由服务层盖上 `updated_at`
pub struct TodoService {
    repo: Arc<dyn TaskRepository>,
    clock: Arc<dyn Clock>,
}

impl TodoService {
    pub fn new(repo: Arc<dyn TaskRepository>, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn list(&self) -> TaskboardResult<Vec<Task>> {
        let mut tasks = self.repo.find_all().await?;
        tasks.sort_by_key(|t| t.id);
        Ok(tasks)
    }

    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewTask) -> TaskboardResult<Task> {
        let text = validate_text(&input.text)?;
        let mut task = Task::new(text, self.clock.now());
        if let Some(completed) = input.completed {
            task.completed = completed;
        }
        if let Some(label) = input.label {
            task.label = label;
        }
        if let Some(status) = input.status {
            task.status = status;
        }
        if let Some(priority) = input.priority {
            task.priority = priority;
        }

        let created = self.repo.create(&task).await?;
        info!("创建任务: {}", created.entity_description());
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn toggle(&self, id: i64, completed: bool) -> TaskboardResult<()> {
        if !self
            .repo
            .set_completed(id, completed, self.clock.now())
            .await?
        {
            return Err(TaskboardError::task_not_found(id));
        }
        debug!("任务 {} 完成标记设为 {}", id, completed);
        Ok(())
    }

    /// 覆盖内容、标签、状态与优先级；`completed` 只由 `toggle` 修改
    #[instrument(skip(self, update))]
    pub async fn update(&self, id: i64, update: TaskUpdate) -> TaskboardResult<Task> {
        let update = TaskUpdate {
            text: validate_text(&update.text)?,
            ..update
        };

        let task = self
            .repo
            .update(id, &update, self.clock.now())
            .await?
            .ok_or_else(|| TaskboardError::task_not_found(id))?;

        info!("更新任务: {}", task.entity_description());
        Ok(task)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> TaskboardResult<()> {
        if !self.repo.delete(id).await? {
            return Err(TaskboardError::task_not_found(id));
        }
        info!("删除任务 {}", id);
        Ok(())
    }
}

fn validate_text(text: &str) -> TaskboardResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(TaskboardError::invalid_argument("任务内容不能为空"));
    }
    Ok(trimmed.to_string())
}
