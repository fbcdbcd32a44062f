use std::sync::Arc;

use storage::github::{GitHubConfig, GitHubFileStore};
use storage::table_store::DEFAULT_COMMIT_MESSAGE;
use storage::{Storage, TableStore};
use tracing::{error, info};

use crate::notify::{Notice, Notifier};
use crate::persistence_service::PersistenceService;
use crate::review_scheduler::ReviewSchedulerService;
use crate::session::StudySession;
use crate::study_cycle_service::StudyCycleService;
use crate::timer_service::{TimerEngine, TimerService};
use crate::Clock;

/// Assembles app-facing services around an optional remote store.
///
/// Without a store the app runs in memory only: sessions open unloaded
/// and saving is refused.
#[derive(Clone)]
pub struct AppServices {
    store: Option<TableStore>,
    notifier: Arc<dyn Notifier>,
    study_cycle: Arc<StudyCycleService>,
    timer: Arc<TimerService>,
    reviews: Arc<ReviewSchedulerService>,
    persistence: Arc<PersistenceService>,
}

impl AppServices {
    #[must_use]
    pub fn new(
        storage: Option<Storage>,
        clock: Clock,
        notifier: Arc<dyn Notifier>,
        engine: TimerEngine,
        commit_message: &str,
    ) -> Self {
        let store = storage.map(|s| TableStore::new(s.files));
        let study_cycle = StudyCycleService::new(Arc::clone(&notifier));
        let timer = Arc::new(TimerService::new(
            engine,
            study_cycle.clone(),
            Arc::clone(&notifier),
        ));
        let reviews = Arc::new(ReviewSchedulerService::new(clock, Arc::clone(&notifier)));
        let persistence = Arc::new(PersistenceService::new(
            store.clone(),
            Arc::clone(&notifier),
            commit_message,
        ));

        Self {
            store,
            notifier,
            study_cycle: Arc::new(study_cycle),
            timer,
            reviews,
            persistence,
        }
    }

    /// Connect to the configured GitHub repository.
    ///
    /// A failed connection is reported once through the notifier and the
    /// services fall back to in-memory only.
    pub async fn connect_github(
        config: GitHubConfig,
        clock: Clock,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        let commit_message = config.commit_message.clone();
        match GitHubFileStore::connect(config).await {
            Ok(files) => {
                info!(repo = %files.config().repo, "remote storage connected");
                let storage = Storage::new(Arc::new(files));
                Self::new(
                    Some(storage),
                    clock,
                    notifier,
                    TimerEngine::default(),
                    &commit_message,
                )
            }
            Err(err) => {
                error!(error = %err, "remote storage unavailable");
                notifier.notify(Notice::error(format!(
                    "Could not connect to the remote repository. \
                     Check your credentials. Error: {err}"
                )));
                Self::offline(clock, notifier)
            }
        }
    }

    #[must_use]
    pub fn offline(clock: Clock, notifier: Arc<dyn Notifier>) -> Self {
        Self::new(
            None,
            clock,
            notifier,
            TimerEngine::default(),
            DEFAULT_COMMIT_MESSAGE,
        )
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.store.is_some()
    }

    /// Open a session: load both tables when connected, otherwise leave
    /// them absent.
    pub async fn open_session(&self) -> StudySession {
        match &self.store {
            Some(store) => StudySession::load(store).await,
            None => StudySession::unloaded(),
        }
    }

    #[must_use]
    pub fn notifier(&self) -> Arc<dyn Notifier> {
        Arc::clone(&self.notifier)
    }

    #[must_use]
    pub fn study_cycle(&self) -> Arc<StudyCycleService> {
        Arc::clone(&self.study_cycle)
    }

    #[must_use]
    pub fn timer(&self) -> Arc<TimerService> {
        Arc::clone(&self.timer)
    }

    #[must_use]
    pub fn reviews(&self) -> Arc<ReviewSchedulerService> {
        Arc::clone(&self.reviews)
    }

    #[must_use]
    pub fn persistence(&self) -> Arc<PersistenceService> {
        Arc::clone(&self.persistence)
    }
}
