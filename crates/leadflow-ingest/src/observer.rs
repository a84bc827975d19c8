//! Callbacks for watching an upload
//!
//! The writer reports progress, stage changes and the final notification to
//! an [`IngestionObserver`]. The CLI drives a progress bar from these; tests
//! record them.

use std::sync::{Mutex, PoisonError};
use tracing::{error, info};

use crate::session::UploadStage;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Success,
    Error,
}

/// User-facing message emitted once per upload
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
}

impl Notification {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
        }
    }
}

/// Receives in-memory progress from the writer. All methods default to no-ops.
pub trait IngestionObserver: Send + Sync {
    /// Called after every committed chunk and whenever the total changes
    fn on_progress(&self, _processed_rows: u64, _total_rows: Option<u64>) {}

    fn on_stage_change(&self, _stage: UploadStage) {}

    fn on_notification(&self, _notification: &Notification) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl IngestionObserver for NoopObserver {}

/// Observer that only logs notifications
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl IngestionObserver for TracingObserver {
    fn on_notification(&self, notification: &Notification) {
        match notification.level {
            NotificationLevel::Success => info!(message = %notification.message, "Upload finished"),
            NotificationLevel::Error => error!(message = %notification.message, "Upload failed"),
        }
    }
}

/// One observed callback
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObservedEvent {
    Progress {
        processed_rows: u64,
        total_rows: Option<u64>,
    },
    Stage(UploadStage),
    Notification(Notification),
}

/// Observer that keeps every callback in order
#[derive(Debug, Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<ObservedEvent>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ObservedEvent> {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stages(&self) -> Vec<UploadStage> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ObservedEvent::Stage(stage) => Some(stage),
                _ => None,
            })
            .collect()
    }

    /// `(processed, total)` pairs in the order they were reported
    pub fn progress(&self) -> Vec<(u64, Option<u64>)> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ObservedEvent::Progress {
                    processed_rows,
                    total_rows,
                } => Some((processed_rows, total_rows)),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<Notification> {
        self.events()
            .into_iter()
            .filter_map(|event| match event {
                ObservedEvent::Notification(notification) => Some(notification),
                _ => None,
            })
            .collect()
    }

    fn push(&self, event: ObservedEvent) {
        self.events
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(event);
    }
}

impl IngestionObserver for RecordingObserver {
    fn on_progress(&self, processed_rows: u64, total_rows: Option<u64>) {
        self.push(ObservedEvent::Progress {
            processed_rows,
            total_rows,
        });
    }

    fn on_stage_change(&self, stage: UploadStage) {
        self.push(ObservedEvent::Stage(stage));
    }

    fn on_notification(&self, notification: &Notification) {
        self.push(ObservedEvent::Notification(notification.clone()));
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_recording_observer_keeps_order() {
        let observer = RecordingObserver::new();
        observer.on_stage_change(UploadStage::Preparing);
        observer.on_progress(500, Some(1200));
        observer.on_notification(&Notification::success("done"));

        assert_eq!(observer.stages(), vec![UploadStage::Preparing]);
        assert_eq!(observer.progress(), vec![(500, Some(1200))]);
        assert_eq!(observer.notifications(), vec![Notification::success("done")]);
        assert_eq!(observer.events().len(), 3);
    }

    #[test]
    fn test_recording_observer_survives_poisoned_lock() {
        let observer = std::sync::Arc::new(RecordingObserver::new());
        observer.on_stage_change(UploadStage::Preparing);

        let poisoner = observer.clone();
        let result = std::thread::spawn(move || {
            let _guard = poisoner.events.lock().unwrap();
            panic!("observer callback panicked");
        })
        .join();
        assert!(result.is_err());
        assert!(observer.events.is_poisoned());

        observer.on_progress(10, None);
        assert_eq!(observer.stages(), vec![UploadStage::Preparing]);
        assert_eq!(observer.progress(), vec![(10, None)]);
    }
}
