//! CLI output formatting

use crate::catalog::WorkflowStep;
use crate::generation::GenerationResult;
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// Create a spinner shown while a generation call is in flight
pub fn create_spinner(message: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let template = ProgressStyle::default_spinner()
        .template("{spinner:.green} [{elapsed_precise}] {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    spinner.set_style(template);
    spinner.set_message(message.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// One line per step: `[N] Title - description`
pub fn format_step(step: &WorkflowStep) -> String {
    format!(
        "[{}] {} - {}",
        style(step.index).cyan(),
        style(&step.title).bold(),
        style(&step.description).dim()
    )
}

/// Human-readable rendering of a generation result
///
/// `text_already_shown` suppresses the text body when it was streamed live.
pub fn format_result(result: &GenerationResult, text_already_shown: bool) -> String {
    if !result.success {
        return format!(
            "{}{} {}",
            CROSS,
            style("Generation failed:").red(),
            result.error.as_deref().unwrap_or("unknown error")
        );
    }

    let mut out = String::new();
    if !text_already_shown && !result.text.is_empty() {
        out.push_str(result.text.trim_end());
        out.push_str("\n\n");
    }

    out.push_str(&format!(
        "{}Generation {} - {} image(s)",
        CHECK,
        style("complete").green(),
        style(result.files.len()).cyan()
    ));
    for path in &result.files {
        out.push_str(&format!("\n  {}", style(path.display()).dim()));
    }
    out
}
