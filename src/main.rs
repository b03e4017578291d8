use robogen::artifacts::{ArtifactStore, DirectoryStore};
use robogen::catalog::StepCatalog;
use robogen::cli::commands::{GenerateCommand, RunCommand, StepsCommand, ValidateCommand};
use robogen::cli::output::*;
use robogen::cli::terminal_output::TerminalOutputObserver;
use robogen::cli::{Cli, Command};
use robogen::config::AppConfig;
use robogen::generation::{
    GeminiBackend, GenerationBackend, GenerationClient, GenerationObserver, GenerationResult,
};
use robogen::workflow::WorkflowService;

use anyhow::{Context, Result};
use indicatif::ProgressBar;
use std::path::Path;
use std::sync::Arc;
use tracing::Level;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::from_args();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.as_str()));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set logging subscriber")?;

    let mut config = AppConfig::load(cli.config.as_deref()).with_env_overrides();
    if let Some(dir) = &cli.output_dir {
        config.output_dir = dir.clone();
    }

    // Execute command
    let success = match &cli.command {
        Command::Run(cmd) => run_step(cmd, &cli, &config).await?,
        Command::Generate(cmd) => run_prompt(cmd, &cli, &config).await?,
        Command::Steps(cmd) => list_steps(cmd, &config)?,
        Command::Validate(cmd) => validate_steps(cmd)?,
    };

    if !success {
        std::process::exit(1);
    }
    Ok(())
}

fn build_client(config: &AppConfig) -> Result<GenerationClient> {
    let backend: Arc<dyn GenerationBackend> = Arc::new(
        GeminiBackend::new(config.gemini_config()?).context("Failed to create generation backend")?,
    );
    let store: Arc<dyn ArtifactStore> = Arc::new(DirectoryStore::new(&config.output_dir)?);

    Ok(GenerationClient::new(backend, store).with_timeout(config.request_timeout_secs))
}

fn load_catalog(override_path: Option<&Path>, config: &AppConfig) -> StepCatalog {
    StepCatalog::load(override_path.unwrap_or(&config.prompts_path))
}

async fn run_step(cmd: &RunCommand, cli: &Cli, config: &AppConfig) -> Result<bool> {
    let catalog = Arc::new(load_catalog(cmd.prompts.as_deref(), config));
    let service = WorkflowService::new(catalog, build_client(config)?);

    let title = service
        .catalog()
        .lookup(cmd.step)
        .map(|s| s.title.clone())
        .unwrap_or_else(|| format!("step {}", cmd.step));
    if !cmd.json {
        println!("{}Running {}", ROCKET, style(&title).bold());
    }

    let progress = Progress::start(cli.stream && !cmd.json, cmd.json);
    let result = service
        .process_step_with_observer(cmd.step, cmd.image.as_deref(), Some(progress.observer()))
        .await;
    let streamed = progress.finish(&result);

    report(&result, streamed, cmd.json)
}

async fn run_prompt(cmd: &GenerateCommand, cli: &Cli, config: &AppConfig) -> Result<bool> {
    let client = build_client(config)?;

    let progress = Progress::start(cli.stream && !cmd.json, cmd.json);
    let result = client
        .generate_with_observer(&cmd.prompt, cmd.image.as_deref(), Some(progress.observer()))
        .await;
    let streamed = progress.finish(&result);

    report(&result, streamed, cmd.json)
}

/// Spinner plus terminal observer for one generation call
struct Progress {
    spinner: ProgressBar,
    observer: TerminalOutputObserver,
    stream: bool,
}

impl Progress {
    fn start(stream: bool, quiet: bool) -> Self {
        let spinner = if quiet {
            ProgressBar::hidden()
        } else {
            create_spinner("Generating...")
        };
        let observer = TerminalOutputObserver::new(spinner.clone(), stream);
        Self {
            spinner,
            observer,
            stream,
        }
    }

    fn observer(&self) -> &dyn GenerationObserver {
        &self.observer
    }

    /// Stop the spinner; returns whether the result text was already streamed
    fn finish(self, result: &GenerationResult) -> bool {
        self.spinner.finish_and_clear();
        let streamed = self.stream && (self.observer.printed_text() || !result.text.is_empty());
        if streamed {
            println!();
        }
        streamed
    }
}

fn report(result: &GenerationResult, streamed: bool, json: bool) -> Result<bool> {
    if json {
        println!("{}", serde_json::to_string_pretty(result)?);
    } else {
        println!("{}", format_result(result, streamed));
    }
    Ok(result.success)
}

fn list_steps(cmd: &StepsCommand, config: &AppConfig) -> Result<bool> {
    let catalog = load_catalog(cmd.prompts.as_deref(), config);

    if cmd.json {
        let steps: Vec<_> = catalog.iter().collect();
        println!("{}", serde_json::to_string_pretty(&steps)?);
        return Ok(true);
    }

    if catalog.is_empty() {
        println!("{}No workflow steps found", WARN);
        return Ok(true);
    }

    println!("{}Workflow steps:", INFO);
    for step in catalog.iter() {
        println!("  {}", format_step(step));
    }
    Ok(true)
}

fn validate_steps(cmd: &ValidateCommand) -> Result<bool> {
    println!("{}Validating step definitions...", INFO);

    match StepCatalog::try_load(&cmd.file) {
        Ok(catalog) => {
            println!("{}Step definitions are valid!", CHECK);
            println!("  Steps: {}", style(catalog.len()).cyan());

            if cmd.json {
                let steps: Vec<_> = catalog.iter().collect();
                println!("\n{}", serde_json::to_string_pretty(&steps)?);
            }
            Ok(true)
        }
        Err(e) => {
            println!("{}Validation failed:", CROSS);
            println!("  {}", style(e).red());
            Ok(false)
        }
    }
}
