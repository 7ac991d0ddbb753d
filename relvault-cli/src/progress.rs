//! indicatif-backed progress sink.

use indicatif::{ProgressBar, ProgressStyle};

use relvault_sync::{ProgressHandle, ProgressSink};

/// Renders one progress bar per download on stderr.
pub struct BarProgress;

struct BarHandle {
    bar: ProgressBar,
}

impl ProgressSink for BarProgress {
    fn start(&self, name: &str, total: Option<u64>) -> Box<dyn ProgressHandle> {
        let bar = match total {
            Some(len) => {
                let bar = ProgressBar::new(len);
                bar.set_style(ProgressStyle::default_bar());
                bar
            }
            None => ProgressBar::new_spinner(),
        };
        bar.set_message(name.to_owned());
        Box::new(BarHandle { bar })
    }
}

impl ProgressHandle for BarHandle {
    fn advance(&mut self, delta: u64) {
        self.bar.inc(delta);
    }

    fn finish(&mut self) {
        self.bar.finish_and_clear();
    }
}
