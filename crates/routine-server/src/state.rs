use crate::error::AppError;
use routine_core::config::Config;
use routine_core::store::FileStore;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

/// Shared application state passed to all route handlers.
#[derive(Clone)]
pub struct AppState {
    pub root: PathBuf,
    /// Serializes read-modify-write cycles on `.routine/store.json`.
    store_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        Self {
            root,
            store_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Run `f` on a blocking thread with the store and config loaded fresh
    /// from disk. Only one closure touches the store at a time.
    pub async fn with_store<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce(&mut FileStore, &Config) -> anyhow::Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let root = self.root.clone();
        let lock = Arc::clone(&self.store_lock);
        tokio::task::spawn_blocking(move || {
            let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
            let config = Config::load(&root)?;
            let mut store = FileStore::open(&root)?;
            f(&mut store, &config)
        })
        .await
        .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))?
        .map_err(AppError)
    }

    /// Run blocking work that must not hold the store lock, such as a coach
    /// request, on a blocking thread.
    pub async fn without_store<T, F>(&self, f: F) -> Result<T, AppError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        tokio::task::spawn_blocking(f)
            .await
            .map_err(|e| AppError(anyhow::anyhow!("task join error: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_stores_root() {
        let state = AppState::new(PathBuf::from("/tmp/test"));
        assert_eq!(state.root, PathBuf::from("/tmp/test"));
    }

    #[tokio::test]
    async fn with_store_requires_init() {
        let dir = tempfile::TempDir::new().unwrap();
        let state = AppState::new(dir.path().to_path_buf());
        let err = state.with_store(|_, _| Ok(())).await.unwrap_err();
        assert!(err.0.to_string().contains("not initialized"));
    }

    #[tokio::test]
    async fn without_store_runs_while_the_store_is_locked() {
        let state = AppState::new(PathBuf::from("/tmp/test"));
        let held = Arc::clone(&state.store_lock);
        let _guard = held.lock().unwrap();
        let value = tokio::time::timeout(
            std::time::Duration::from_secs(5),
            state.without_store(|| 7),
        )
        .await
        .expect("blocked on the store lock")
        .unwrap();
        assert_eq!(value, 7);
    }
}
