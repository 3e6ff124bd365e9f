//! Live rendering of a streamed reply

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::Write;
use std::sync::Mutex;
use std::time::Duration;
use talkback_application::ports::progress::ReplyProgressNotifier;

/// Prints reply fragments as they arrive
///
/// Shows a spinner while waiting for the first fragment, then writes each
/// fragment straight to stdout.
pub struct ReplyPrinter {
    show_spinner: bool,
    spinner: Mutex<Option<ProgressBar>>,
    printed: Mutex<bool>,
}

impl ReplyPrinter {
    pub fn new() -> Self {
        Self {
            show_spinner: true,
            spinner: Mutex::new(None),
            printed: Mutex::new(false),
        }
    }

    /// Print fragments only, without a spinner (for `--quiet` and pipes)
    pub fn plain() -> Self {
        Self {
            show_spinner: false,
            ..Self::new()
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn clear_spinner(&self) {
        if let Ok(mut spinner) = self.spinner.lock()
            && let Some(pb) = spinner.take()
        {
            pb.finish_and_clear();
        }
    }
}

impl Default for ReplyPrinter {
    fn default() -> Self {
        Self::new()
    }
}

impl ReplyProgressNotifier for ReplyPrinter {
    fn on_stream_start(&self) {
        if let Ok(mut printed) = self.printed.lock() {
            *printed = false;
        }
        if !self.show_spinner {
            return;
        }

        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_message("Thinking...".dimmed().to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut spinner) = self.spinner.lock() {
            *spinner = Some(pb);
        }
    }

    fn on_fragment(&self, fragment: &str, _content: &str) {
        self.clear_spinner();
        if let Ok(mut printed) = self.printed.lock() {
            if !*printed {
                print!("{} ", "assistant>".cyan().bold());
            }
            *printed = true;
        }
        print!("{}", fragment);
        let _ = std::io::stdout().flush();
    }

    fn on_stream_end(&self) {
        self.clear_spinner();
        if self.printed.lock().map(|p| *p).unwrap_or(false) {
            println!();
        }
    }
}
