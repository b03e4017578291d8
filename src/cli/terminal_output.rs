//! Terminal observer for streamed generation
//!
//! Prints text fragments as they arrive and a line per saved artifact,
//! pausing the spinner while it writes so the two don't interleave.

use crate::artifacts::GeneratedArtifact;
use crate::cli::output::CHECK;
use crate::generation::GenerationObserver;
use console::style;
use indicatif::ProgressBar;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// Observer that displays streamed output in the terminal
pub struct TerminalOutputObserver {
    spinner: ProgressBar,
    show_text: bool,
    mid_line: AtomicBool,
    artifacts: AtomicUsize,
}

impl TerminalOutputObserver {
    /// Create a new terminal observer
    ///
    /// * `spinner` - progress indicator to suspend while printing
    /// * `show_text` - whether to echo text fragments live
    pub fn new(spinner: ProgressBar, show_text: bool) -> Self {
        Self {
            spinner,
            show_text,
            mid_line: AtomicBool::new(false),
            artifacts: AtomicUsize::new(0),
        }
    }

    /// Number of artifacts reported so far
    pub fn artifact_count(&self) -> usize {
        self.artifacts.load(Ordering::SeqCst)
    }

    /// Whether any text was echoed live
    pub fn printed_text(&self) -> bool {
        self.show_text && self.mid_line.load(Ordering::SeqCst)
    }

    fn flush_stdout(&self) {
        let _ = io::stdout().flush();
    }
}

impl GenerationObserver for TerminalOutputObserver {
    fn on_text(&self, text: &str) {
        if !self.show_text {
            return;
        }
        self.spinner.suspend(|| {
            print!("{}", text);
            self.flush_stdout();
        });
        self.mid_line.store(!text.ends_with('\n'), Ordering::SeqCst);
    }

    fn on_artifact(&self, artifact: &GeneratedArtifact) {
        let count = self.artifacts.fetch_add(1, Ordering::SeqCst) + 1;
        let mid_line = self.mid_line.swap(false, Ordering::SeqCst);
        self.spinner.suspend(|| {
            if mid_line && self.show_text {
                println!();
            }
            println!(
                "{}Saved image {} {}",
                CHECK,
                style(count).cyan(),
                style(&artifact.filename).dim()
            );
        });
        self.spinner
            .set_message(format!("{} image(s) saved", count));
    }
}
