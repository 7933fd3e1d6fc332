//! purchaseflow CLI entry point.

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use purchaseflow::bootstrap::ModelPuller;
use purchaseflow::config::AdvisorConfig;
use purchaseflow::events::LoggingEventSink;
use purchaseflow::llm::OllamaBackend;
use purchaseflow::observability::{init_tracing, LogFormat, DEFAULT_LOG_LEVEL};
use purchaseflow::pipeline::PurchaseAdvisor;
use purchaseflow::render::render_markdown;
use purchaseflow::state::PurchaseRequest;
use std::io::Write;
use std::sync::Arc;

/// Local-LLM purchase advisor.
#[derive(Parser, Debug)]
#[command(name = "purchaseflow")]
#[command(about = "Ask a local model whether a purchase is worth it")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Ollama server address (overrides PURCHASEFLOW_OLLAMA_URL).
    #[arg(long, global = true)]
    base_url: Option<String>,

    /// Model name (overrides PURCHASEFLOW_MODEL).
    #[arg(short, long, global = true)]
    model: Option<String>,

    /// Sampling temperature (overrides PURCHASEFLOW_TEMPERATURE).
    #[arg(long, global = true)]
    temperature: Option<f32>,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    log_json: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Analyze a purchase.
    Advise(AdviseArgs),

    /// Download the configured model.
    Pull,

    /// Check that the server is reachable and list installed models.
    Check,
}

#[derive(Args, Debug)]
struct AdviseArgs {
    /// What you want to buy.
    #[arg(short, long)]
    product: String,

    /// How much you can spend.
    #[arg(short, long)]
    budget: String,

    /// What it is for.
    #[arg(long, default_value = "")]
    purpose: String,

    /// Features you care about.
    #[arg(long, default_value = "")]
    preferences: String,

    /// Print the full state and run report as JSON.
    #[arg(long)]
    json: bool,
}

impl Cli {
    fn config(&self) -> anyhow::Result<AdvisorConfig> {
        self.config_from(|key| std::env::var(key).ok())
    }

    /// Environment first, then flags; validated once at the end.
    fn config_from<F>(&self, lookup: F) -> anyhow::Result<AdvisorConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = AdvisorConfig::parse_lookup(lookup).context("reading environment")?;
        if let Some(url) = &self.base_url {
            config = config.with_base_url(url.clone());
        }
        if let Some(model) = &self.model {
            config = config.with_model(model.clone());
        }
        if let Some(temperature) = self.temperature {
            config = config.with_temperature(temperature);
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let format = if cli.log_json { LogFormat::Json } else { LogFormat::Pretty };
    init_tracing(format, DEFAULT_LOG_LEVEL);

    let config = cli.config()?;
    match cli.command {
        Commands::Advise(args) => advise(&config, args).await,
        Commands::Pull => pull(&config).await,
        Commands::Check => check(&config).await,
    }
}

async fn advise(config: &AdvisorConfig, args: AdviseArgs) -> anyhow::Result<()> {
    let advisor = PurchaseAdvisor::ollama(config)?
        .with_event_sink(Arc::new(LoggingEventSink::debug()));
    let request = PurchaseRequest::new(args.product, args.budget, args.purpose, args.preferences);
    let run = advisor.run_request(request).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&run)?);
    } else {
        print!("{}", render_markdown(&run.state));
    }
    if advisor.invoker().is_mock() {
        eprintln!(
            "warning: some sections are fallback text; is Ollama running at {} with '{}' pulled?",
            config.base_url, config.model
        );
    }
    Ok(())
}

async fn pull(config: &AdvisorConfig) -> anyhow::Result<()> {
    let puller = ModelPuller::new(OllamaBackend::from_config(config)?);
    println!("Starting download for model: {}", config.model);

    let mut stdout = std::io::stdout();
    puller
        .pull(&config.model, |progress| {
            let _ = write!(stdout, "\r{}", progress.render());
            let _ = stdout.flush();
        })
        .await
        .with_context(|| format!("pulling '{}' from {}", config.model, config.base_url))?;

    println!("\n\nDownload complete.");
    Ok(())
}

async fn check(config: &AdvisorConfig) -> anyhow::Result<()> {
    let backend = OllamaBackend::from_config(config)?;
    let models = backend
        .list_models()
        .await
        .with_context(|| format!("connecting to Ollama at {}", config.base_url))?;

    println!("Connected to {}", config.base_url);
    if models.is_empty() {
        println!("No models installed. Run `purchaseflow pull`.");
    }
    for name in &models {
        let marker = if *name == config.model { "*" } else { " " };
        println!("{marker} {name}");
    }
    if !models.iter().any(|m| *m == config.model) {
        eprintln!("warning: configured model '{}' is not installed", config.model);
    }
    Ok(())
}
