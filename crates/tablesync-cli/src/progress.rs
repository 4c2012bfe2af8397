//! Progress display for sync runs
//!
//! A bar on stderr follows the engine's progress snapshots. It starts as a
//! spinner and switches to a bar once the source row count is known.

use indicatif::{ProgressBar, ProgressStyle};
use tablesync_ingest::ProgressSnapshot;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} rows ({eta})\n{msg}";
const SPINNER_TEMPLATE: &str = "{spinner:.green} [{elapsed_precise}] {pos} rows {msg}";

fn bar_style() -> ProgressStyle {
    ProgressStyle::default_bar()
        .template(BAR_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
}

/// Create a spinner for a run whose total is not known yet
pub fn create_spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::default_spinner()
            .template(SPINNER_TEMPLATE)
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_message(message.to_string());
    pb.enable_steady_tick(std::time::Duration::from_millis(100));
    pb
}

/// Apply one snapshot to the bar
pub fn render(pb: &ProgressBar, snapshot: &ProgressSnapshot) {
    if let Some(total) = snapshot.total {
        if pb.length() != Some(total) {
            pb.set_style(bar_style());
            pb.set_length(total);
        }
    }
    pb.set_position(snapshot.counts.processed);
    pb.set_message(snapshot.status.clone());
}

/// Follow `rx` until the run finishes or the engine goes away
pub fn spawn_observer(mut rx: watch::Receiver<ProgressSnapshot>, visible: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let pb = if visible {
            create_spinner("Starting...")
        } else {
            ProgressBar::hidden()
        };

        while rx.changed().await.is_ok() {
            let snapshot = rx.borrow_and_update().clone();
            render(&pb, &snapshot);
            if snapshot.finished {
                break;
            }
        }
        pb.finish_and_clear();
    })
}
