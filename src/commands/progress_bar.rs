//! Terminal progress display driven by tracker snapshots.

use core::time::Duration;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use issuelens::models::{Phase, ProgressListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

/// Keep the bar hidden for quick runs so short invocations stay quiet.
const VISIBLE_DELAY_MS: u64 = 300;

const TEMPLATE: &str = "{prefix:>12.bold.cyan} [{bar:25}] {msg}";
const TEMPLATE_NO_COLOR: &str = "{prefix:>12} [{bar:25}] {msg}";

/// A progress bar that delays showing itself until a threshold is reached.
#[derive(Debug)]
pub struct ProgressReporter {
    bar: ProgressBar,
    visible: Arc<AtomicBool>,
    visible_after: Instant,
}

impl ProgressReporter {
    #[must_use]
    pub fn new(use_colors: bool) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_draw_target(ProgressDrawTarget::hidden());

        let template = if use_colors { TEMPLATE } else { TEMPLATE_NO_COLOR };
        bar.set_style(
            ProgressStyle::default_bar()
                .template(template)
                .expect("could not create progress bar style")
                .progress_chars("=> "),
        );

        Self {
            bar,
            visible: Arc::new(AtomicBool::new(false)),
            visible_after: Instant::now() + Duration::from_millis(VISIBLE_DELAY_MS),
        }
    }

    /// Listener that mirrors each tracker snapshot onto the bar.
    #[must_use]
    pub fn listener(&self) -> ProgressListener {
        let bar = self.bar.clone();
        let visible = Arc::clone(&self.visible);
        let visible_after = self.visible_after;

        Box::new(move |snapshot| {
            if !visible.load(Ordering::Relaxed) {
                if Instant::now() < visible_after {
                    return;
                }

                visible.store(true, Ordering::Relaxed);
                bar.set_draw_target(ProgressDrawTarget::stderr_with_hz(10));
            }

            bar.set_prefix(phase_label(snapshot.phase));
            if let Some(total) = snapshot.items_total {
                bar.set_length(total);
                bar.set_position(snapshot.items_done);
            }
            bar.set_message(snapshot.message.clone());
        })
    }

    /// Finish and clear the progress indicator.
    pub fn finish(&self) {
        if self.visible.load(Ordering::Relaxed) {
            self.bar.finish_and_clear();
        }
    }
}

const fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Initializing => "Initializing",
        Phase::Validating => "Validating",
        Phase::Fetching => "Fetching",
        Phase::Filtering => "Filtering",
        Phase::RetrievingComments => "Comments",
        Phase::CalculatingMetrics => "Metrics",
        Phase::GeneratingOutput => "Reporting",
        Phase::Completed => "Finished",
    }
}
