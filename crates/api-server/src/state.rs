//! Application state

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use taskdeck_core::config::{BackendKind, Config};
use taskdeck_core::kanban::KanbanBoard;
use taskdeck_core::preferences::{
    FileStorage, MemoryStorage, PreferenceStorage, PreferenceStore, RootStyle,
};
use taskdeck_core::task::{
    DocumentBackend, FileBackend, HttpBackend, MemoryBackend, Subscription, TaskRepository,
};
use taskdeck_core::Error;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    repository: TaskRepository,
    preferences: PreferenceStore,
    root: Arc<RootStyle>,
    boards: Mutex<HashMap<String, ActiveBoard>>,
    poller: Option<JoinHandle<()>>,
}

/// A user's board with the subscription that keeps it fresh
struct ActiveBoard {
    board: KanbanBoard,
    subscription: Subscription,
    last_used: Instant,
}

impl Drop for AppStateInner {
    fn drop(&mut self) {
        if let Some(poller) = self.poller.take() {
            poller.abort();
        }
    }
}

impl AppState {
    /// Build the backend and preference storage described by `config`
    pub async fn new(config: Config) -> taskdeck_core::Result<Self> {
        let mut poller = None;
        let backend: Arc<dyn DocumentBackend> = match config.backend {
            BackendKind::Memory => Arc::new(MemoryBackend::new()),
            BackendKind::File => Arc::new(FileBackend::new(config.tasks_path()).await?),
            BackendKind::Http => {
                let url = config.backend_url.clone().ok_or_else(|| {
                    Error::validation("TASKDECK_BACKEND_URL", "required for the http backend")
                })?;
                let backend = HttpBackend::new(
                    url,
                    config.backend_token.clone(),
                    config.request_timeout,
                )?;
                poller = Some(backend.spawn_poller(config.poll_interval));
                Arc::new(backend)
            }
        };

        let storage: Arc<dyn PreferenceStorage> = match config.backend {
            BackendKind::Memory => Arc::new(MemoryStorage::new()),
            _ => match FileStorage::open(config.preferences_path()).await {
                Ok(storage) => Arc::new(storage),
                Err(e) => {
                    warn!("Preferences will not persist: {}", e);
                    Arc::new(MemoryStorage::new())
                }
            },
        };

        info!("Using {:?} backend", config.backend);
        Ok(Self::assemble(config, backend, storage, poller).await)
    }

    /// Assemble state from already constructed parts
    pub async fn with_parts(
        config: Config,
        backend: Arc<dyn DocumentBackend>,
        storage: Arc<dyn PreferenceStorage>,
    ) -> Self {
        Self::assemble(config, backend, storage, None).await
    }

    async fn assemble(
        config: Config,
        backend: Arc<dyn DocumentBackend>,
        storage: Arc<dyn PreferenceStorage>,
        poller: Option<JoinHandle<()>>,
    ) -> Self {
        let repository = TaskRepository::new(backend).with_timeout(config.request_timeout);
        let root = Arc::new(RootStyle::new());
        let preferences = PreferenceStore::load(storage, root.clone()).await;

        Self {
            inner: Arc::new(AppStateInner {
                config,
                repository,
                preferences,
                root,
                boards: Mutex::new(HashMap::new()),
                poller,
            }),
        }
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn repository(&self) -> &TaskRepository {
        &self.inner.repository
    }

    pub fn preferences(&self) -> &PreferenceStore {
        &self.inner.preferences
    }

    pub fn root(&self) -> &RootStyle {
        &self.inner.root
    }

    /// The user's board, kept in sync with the backend while in use.
    ///
    /// Boards idle for longer than `board_idle_timeout` are dropped together
    /// with their subscription, as are the least recently used ones once more
    /// than `max_boards` are held.
    pub fn board(&self, user_id: &str) -> KanbanBoard {
        let now = Instant::now();
        let mut boards = self.boards();
        self.evict(&mut boards, now);

        let entry = boards.entry(user_id.to_string()).or_insert_with(|| {
            let board = KanbanBoard::new(self.inner.repository.clone());
            let subscription = board.subscribe(user_id);
            ActiveBoard {
                board,
                subscription,
                last_used: now,
            }
        });
        entry.last_used = now;
        let board = entry.board.clone();

        // Make room for the board just touched
        while boards.len() > self.inner.config.max_boards {
            let Some(oldest) = boards
                .iter()
                .filter(|(id, _)| id.as_str() != user_id)
                .min_by_key(|(_, active)| active.last_used)
                .map(|(id, _)| id.clone())
            else {
                break;
            };
            Self::release(&mut boards, &oldest);
        }
        board
    }

    fn evict(&self, boards: &mut HashMap<String, ActiveBoard>, now: Instant) {
        let idle = self.inner.config.board_idle_timeout;
        let expired: Vec<String> = boards
            .iter()
            .filter(|(_, active)| now.duration_since(active.last_used) >= idle)
            .map(|(id, _)| id.clone())
            .collect();
        for user_id in expired {
            Self::release(boards, &user_id);
        }
    }

    fn release(boards: &mut HashMap<String, ActiveBoard>, user_id: &str) {
        if let Some(active) = boards.remove(user_id) {
            active.subscription.unsubscribe();
            debug!("Released kanban board for {}", user_id);
        }
    }

    fn boards(&self) -> MutexGuard<'_, HashMap<String, ActiveBoard>> {
        self.inner
            .boards
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    #[cfg(test)]
    pub(crate) fn held_boards(&self) -> Vec<String> {
        let mut held: Vec<String> = self.boards().keys().cloned().collect();
        held.sort();
        held
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use taskdeck_core::task::NewTask;

    use super::*;

    async fn state(config: Config) -> AppState {
        AppState::with_parts(
            config,
            Arc::new(MemoryBackend::new()),
            Arc::new(MemoryStorage::new()),
        )
        .await
    }

    #[tokio::test]
    async fn least_recently_used_board_is_released() {
        let state = state(Config {
            max_boards: 2,
            ..Config::default()
        })
        .await;
        let first = state.board("u1");
        state.board("u2");
        state.board("u3");
        assert_eq!(state.held_boards(), vec!["u2", "u3"]);

        // The released board no longer follows the backend
        state
            .repository()
            .create_task("u1", NewTask::new("missed"))
            .await
            .unwrap();
        let kept = state.board("u3");
        state
            .repository()
            .create_task("u3", NewTask::new("seen"))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(first.view().available.is_empty());
        assert_eq!(kept.view().available.len(), 1);
    }

    #[tokio::test]
    async fn idle_boards_are_released() {
        let state = state(Config {
            board_idle_timeout: Duration::from_millis(20),
            ..Config::default()
        })
        .await;
        state.board("u1");
        tokio::time::sleep(Duration::from_millis(40)).await;
        state.board("u2");
        assert_eq!(state.held_boards(), vec!["u2"]);
    }
}
