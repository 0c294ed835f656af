// Command-line runner: one goal, one start URL, one run.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pagepilot::BrowserManager;
use pagepilot::agent::{Agent, AgentConfig, DecisionPrompt, RunOutcome, build_catalog};
use pagepilot::browser::ChromiumDriver;
use pagepilot::llm::OpenAiDecisionModel;
use pagepilot::page_extractor::HtmlExtractor;
use pagepilot::utils::StdinPrompter;

#[derive(Parser, Debug)]
#[command(name = "pagepilot", version, about = "Drive a browser toward a goal with a tool-calling model")]
struct Cli {
    /// Overall objective for the run
    goal: String,

    /// Page to open before the first cycle
    start_url: String,

    /// Concrete instruction for the model; defaults to the goal
    #[arg(long)]
    task: Option<String>,

    /// YAML config file (falls back to ./config.yaml, then built-in defaults)
    #[arg(short, long, env = "PAGEPILOT_CONFIG")]
    config: Option<PathBuf>,

    /// Override the configured model name
    #[arg(long)]
    model: Option<String>,

    /// Override the configured cycle budget
    #[arg(long)]
    max_cycles: Option<usize>,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Log level used when RUST_LOG is unset
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(cli.log_level.clone())),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = pagepilot::load_yaml_config(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        config.model.model = model;
    }
    if let Some(max_cycles) = cli.max_cycles {
        config.agent.max_cycles = max_cycles;
    }
    if cli.headed {
        config.browser.headless = false;
    }

    let prompt = match &config.agent.prompt_path {
        Some(path) => DecisionPrompt::from_file(path)
            .with_context(|| format!("reading prompt template {}", path.display()))?,
        None => DecisionPrompt::builtin(),
    };

    let model = Arc::new(OpenAiDecisionModel::new(config.model.clone())?);
    let manager = Arc::new(BrowserManager::new(config.browser.clone()));
    let driver = Arc::new(ChromiumDriver::new(Arc::clone(&manager))?);

    let task = cli.task.unwrap_or_else(|| cli.goal.clone());
    let agent_config = AgentConfig::new(cli.goal, task, cli.start_url).with_settings(&config.agent);

    let catalog = build_catalog(
        driver.clone(),
        Arc::new(StdinPrompter::new()),
        config.agent.output_dir.clone(),
        &agent_config.termination,
    )?;

    let extractor = match config.agent.max_text_len {
        Some(max) => HtmlExtractor::new().with_max_text_len(max),
        None => HtmlExtractor::new(),
    };

    let agent = Agent::new(
        agent_config,
        driver,
        Arc::new(extractor),
        model,
        catalog,
        prompt,
    );

    let result = agent.run().await;
    if result.is_err() {
        let state = agent.state();
        let state = state.lock().await;
        warn!(last_url = state.last_url().unwrap_or("none"), "Run failed");
    }

    if let Err(e) = agent.stop().await {
        warn!("Agent processor did not stop cleanly: {}", e);
    }
    if let Err(e) = manager.shutdown().await {
        warn!("Browser shutdown failed: {}", e);
    }

    let report = result?;
    info!(run_id = %report.run_id, cycles = report.history.len(), "Run complete");

    for entry in &report.history.cycles {
        println!(
            "{:>3}. {} ({})",
            entry.cycle,
            entry.outcome.summary(),
            entry.url.as_deref().unwrap_or("unknown page")
        );
    }
    println!("{}", report.outcome);

    match report.outcome {
        RunOutcome::GoalAbandoned { .. } => std::process::exit(2),
        _ => Ok(()),
    }
}
