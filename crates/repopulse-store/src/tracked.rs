use crate::fsutil::{read_optional, write_atomic};
use crate::Result;
use repopulse_core::TrackedRepository;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct TrackedFile {
    #[serde(default)]
    repositories: Vec<serde_json::Value>,
}

/// The user's followed repositories, kept in a single JSON file that is
/// rewritten wholesale on every change.
#[derive(Debug, Clone)]
pub struct TrackedRepoList {
    path: PathBuf,
    lock: Arc<Mutex<()>>,
}

impl TrackedRepoList {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Arc::new(Mutex::new(())),
        }
    }

    pub async fn list(&self) -> Result<Vec<TrackedRepository>> {
        let _guard = self.lock.lock().await;
        self.read().await
    }

    pub async fn contains(&self, full_name: &str) -> Result<bool> {
        Ok(self.list().await?.iter().any(|r| r.full_name == full_name))
    }

    /// Returns `false` when the repository was already tracked
    pub async fn add(&self, repository: TrackedRepository) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut repos = self.read().await?;

        if repos.contains(&repository) {
            return Ok(false);
        }

        info!(repository = %repository, "Tracking repository");
        repos.push(repository);
        self.write(&repos).await?;
        Ok(true)
    }

    /// Returns `false` when the repository was not tracked
    pub async fn remove(&self, full_name: &str) -> Result<bool> {
        let _guard = self.lock.lock().await;
        let mut repos = self.read().await?;

        let before = repos.len();
        repos.retain(|r| r.full_name != full_name);
        if repos.len() == before {
            return Ok(false);
        }

        info!(repository = %full_name, "Untracking repository");
        self.write(&repos).await?;
        Ok(true)
    }

    async fn read(&self) -> Result<Vec<TrackedRepository>> {
        let Some(content) = read_optional(&self.path).await? else {
            return Ok(Vec::new());
        };
        let file: TrackedFile = serde_json::from_str(&content)?;

        let mut repos: Vec<TrackedRepository> = Vec::with_capacity(file.repositories.len());
        for value in file.repositories {
            let parsed = serde_json::from_value::<TrackedRepository>(value.clone())
                .map_err(|e| e.to_string())
                .and_then(|r| TrackedRepository::parse(&r.full_name).map_err(|e| e.to_string()));
            match parsed {
                Ok(repo) if !repos.contains(&repo) => repos.push(repo),
                Ok(_) => {}
                Err(e) => warn!(entry = %value, "Skipping tracked repository entry: {}", e),
            }
        }
        Ok(repos)
    }

    async fn write(&self, repos: &[TrackedRepository]) -> Result<()> {
        let file = serde_json::json!({ "repositories": repos });
        write_atomic(&self.path, &serde_json::to_vec_pretty(&file)?).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn repo(name: &str) -> TrackedRepository {
        TrackedRepository::parse(name).unwrap()
    }

    #[tokio::test]
    async fn test_missing_file_is_empty() {
        let dir = TempDir::new().unwrap();
        let list = TrackedRepoList::new(dir.path().join("tracked_repos.json"));
        assert!(list.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_then_remove_round_trip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracked_repos.json");
        let list = TrackedRepoList::new(&path);

        assert!(list.add(repo("octocat/Hello-World")).await.unwrap());
        assert!(!list.add(repo("octocat/Hello-World")).await.unwrap());
        assert!(list.add(repo("rust-lang/rust")).await.unwrap());
        assert!(list.contains("rust-lang/rust").await.unwrap());

        // A fresh handle sees the persisted file
        let reopened = TrackedRepoList::new(&path);
        assert_eq!(reopened.list().await.unwrap().len(), 2);

        assert!(reopened.remove("octocat/Hello-World").await.unwrap());
        assert!(!reopened.remove("octocat/Hello-World").await.unwrap());
        assert_eq!(
            list.list().await.unwrap(),
            vec![repo("rust-lang/rust")]
        );

        let raw: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(raw["repositories"][0]["full_name"], "rust-lang/rust");
    }

    #[tokio::test]
    async fn test_bad_entries_skipped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tracked_repos.json");
        std::fs::write(
            &path,
            r#"{"repositories":[{"full_name":"a/b"},{"full_name":"nope"},{"name":"x"},{"full_name":"a/b"}]}"#,
        )
        .unwrap();

        let list = TrackedRepoList::new(&path);
        assert_eq!(list.list().await.unwrap(), vec![repo("a/b")]);
    }
}
