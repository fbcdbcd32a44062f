#![forbid(unsafe_code)]

pub mod app_services;
pub mod error;
pub mod notify;
pub mod persistence_service;
pub mod review_scheduler;
pub mod session;
pub mod study_cycle_service;
pub mod timer_service;

pub use study_core::Clock;

pub use app_services::AppServices;
pub use error::{
    PersistenceError, ReviewSchedulerError, SessionError, StudyCycleError, TimerServiceError,
};
pub use notify::{Notice, NoticeLevel, Notifier, RecordingNotifier, TracingNotifier};
pub use persistence_service::{PersistenceService, SaveReport};
pub use review_scheduler::ReviewSchedulerService;
pub use session::{SessionTables, StudySession};
pub use study_cycle_service::StudyCycleService;
pub use timer_service::{
    TimerEngine, TimerHandle, TimerOutcome, TimerService, TimerStatus, TimerUpdate,
};
