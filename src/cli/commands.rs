//! CLI command definitions

use clap::Args;
use std::path::PathBuf;

/// Run a workflow step
#[derive(Debug, Args, Clone)]
pub struct RunCommand {
    /// Step number from the catalog
    #[arg(long)]
    pub step: u32,

    /// Input image to condition on
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Step definitions file (overrides config)
    #[arg(long)]
    pub prompts: Option<PathBuf>,

    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// Run an ad-hoc prompt
#[derive(Debug, Args, Clone)]
pub struct GenerateCommand {
    /// Prompt text
    #[arg(short, long)]
    pub prompt: String,

    /// Input image to condition on
    #[arg(short, long)]
    pub image: Option<PathBuf>,

    /// Output the result as JSON
    #[arg(long)]
    pub json: bool,
}

/// List workflow steps
#[derive(Debug, Args, Clone)]
pub struct StepsCommand {
    /// Step definitions file (overrides config)
    #[arg(long)]
    pub prompts: Option<PathBuf>,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}

/// Validate a step definition file
#[derive(Debug, Args, Clone)]
pub struct ValidateCommand {
    /// Path to the step definitions (JSON or YAML)
    #[arg(short, long)]
    pub file: PathBuf,

    /// Output in JSON format
    #[arg(long)]
    pub json: bool,
}
