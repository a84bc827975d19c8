//! Terminal progress for uploads
//!
//! Shows a bar once the row total is known and a spinner with a running
//! count until then.

use indicatif::{ProgressBar, ProgressStyle};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::observer::{IngestionObserver, Notification};
use crate::session::UploadStage;

/// Create a spinner for uploads whose total is not known yet
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(spinner_style());
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template("{msg}\n{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} rows ({eta})")
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

fn spinner_style() -> ProgressStyle {
    ProgressStyle::default_spinner()
        .template("{spinner:.green} {msg} {pos} rows")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
}

/// Observer that renders the upload on the terminal
pub struct ProgressObserver {
    bar: ProgressBar,
    has_total: AtomicBool,
}

impl ProgressObserver {
    pub fn new(file_name: &str) -> Self {
        Self {
            bar: create_spinner(&format!("Preparing {file_name}")),
            has_total: AtomicBool::new(false),
        }
    }

    pub fn bar(&self) -> &ProgressBar {
        &self.bar
    }
}

impl IngestionObserver for ProgressObserver {
    fn on_progress(&self, processed_rows: u64, total_rows: Option<u64>) {
        if let Some(total) = total_rows {
            if !self.has_total.swap(true, Ordering::Relaxed) {
                self.bar.disable_steady_tick();
                self.bar.set_style(bar_style());
            }
            self.bar.set_length(total);
        }
        self.bar.set_position(processed_rows);
    }

    fn on_stage_change(&self, stage: UploadStage) {
        match stage {
            UploadStage::Uploading => self.bar.set_message("Uploading leads"),
            UploadStage::Success | UploadStage::Error => self.bar.finish_and_clear(),
            UploadStage::Idle | UploadStage::Preparing => {}
        }
    }

    fn on_notification(&self, _notification: &Notification) {
        self.bar.finish_and_clear();
    }
}
