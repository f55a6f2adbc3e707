use crate::fsutil::{read_optional, write_atomic};
use crate::{Error, Result};
use repopulse_core::NotificationTask;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct TasksFile {
    #[serde(default)]
    tasks: Vec<serde_json::Value>,
}

/// Persistent list of notification tasks
#[derive(Debug, Clone)]
pub struct TaskStore {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<NotificationTask>> {
        let _guard = self.lock.lock().await;
        Ok(self.read().await?.tasks)
    }

    pub async fn get(&self, id: &str) -> Result<NotificationTask> {
        self.list()
            .await?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))
    }

    pub async fn insert(&self, task: NotificationTask) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut loaded = self.read().await?;
        loaded.tasks.retain(|t| t.id != task.id);
        loaded.tasks.push(task);
        self.write(&loaded).await
    }

    /// Replace an existing task; fails if the id is unknown
    pub async fn update(&self, task: NotificationTask) -> Result<()> {
        let _guard = self.lock.lock().await;
        let mut loaded = self.read().await?;
        let slot = loaded
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or_else(|| Error::TaskNotFound(task.id.clone()))?;
        *slot = task;
        self.write(&loaded).await
    }

    pub async fn remove(&self, id: &str) -> Result<NotificationTask> {
        let _guard = self.lock.lock().await;
        let mut loaded = self.read().await?;
        let position = loaded
            .tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::TaskNotFound(id.to_string()))?;
        let removed = loaded.tasks.remove(position);
        self.write(&loaded).await?;
        Ok(removed)
    }

    async fn read(&self) -> Result<Loaded> {
        let Some(content) = read_optional(&self.path).await? else {
            return Ok(Loaded::default());
        };
        let file: TasksFile = serde_json::from_str(&content)?;

        let mut loaded = Loaded::default();
        for value in file.tasks {
            match serde_json::from_value::<NotificationTask>(value.clone()) {
                Ok(task) => loaded.tasks.push(task),
                Err(e) => {
                    warn!(path = %self.path.display(), "Ignoring invalid task record: {}", e);
                    loaded.unreadable.push(value);
                }
            }
        }

        debug!(
            count = loaded.tasks.len(),
            unreadable = loaded.unreadable.len(),
            "Loaded notification tasks"
        );
        Ok(loaded)
    }

    /// Unreadable records are written back untouched after the valid ones
    async fn write(&self, loaded: &Loaded) -> Result<()> {
        let mut records = loaded
            .tasks
            .iter()
            .map(serde_json::to_value)
            .collect::<std::result::Result<Vec<_>, _>>()?;
        records.extend(loaded.unreadable.iter().cloned());

        let file = TasksFile { tasks: records };
        write_atomic(&self.path, &serde_json::to_vec_pretty(&file)?).await
    }
}

/// Contents of the task file, split by whether each record parsed
#[derive(Default)]
struct Loaded {
    tasks: Vec<NotificationTask>,
    unreadable: Vec<serde_json::Value>,
}
