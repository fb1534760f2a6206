//! # AI Research Assistant
//!
//! Command-line shell for the provider adapter: ask a research question,
//! get back an answer, follow-up questions and a confidence score from
//! OpenAI or Gemini.
//!
//! ## Quick Start
//! ```bash
//! export OPENAI_API_KEY=sk-...
//! cargo run -- "How do CRDTs converge?"
//!
//! # Interactive session against Gemini
//! GEMINI_API_KEY=... cargo run -- --provider gemini -i
//! ```

/// Query submission, history and rendering
mod shell;

use anyhow::Result;
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use ai_research_assistant::{Config, Provider};

use crate::shell::{OutputFormat, Shell};

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
/// # Rust Concept: Derive Macros with Clap
///
/// Clap's derive feature lets us define CLI arguments as a struct.
/// Flags override the matching environment variables.
#[derive(Parser, Debug)]
#[command(
    name = "ai-research-assistant",
    version,
    about = "Ask OpenAI or Gemini a research question and get a structured answer",
    long_about = r#"
AI Research Assistant

Sends your question to OpenAI or Gemini and prints:
  1. A synthesized answer
  2. Suggested follow-up questions
  3. The model's confidence in its answer

API keys are read from OPENAI_API_KEY / GEMINI_API_KEY (or a .env file).

EXAMPLES:
  # One question, OpenAI (default provider)
  ai-research-assistant "What are the trade-offs of async Rust?"

  # Gemini with a lower temperature, JSON output
  ai-research-assistant -p gemini -t 0.2 --json "History of the borrow checker"

  # Interactive session
  ai-research-assistant -i
"#
)]
struct Args {
    /// The research question; omit to start an interactive session
    #[arg(value_name = "QUERY")]
    query: Option<String>,

    /// Provider to use (overrides RESEARCH_PROVIDER env var)
    #[arg(short = 'p', long = "provider", env = "RESEARCH_PROVIDER")]
    provider: Option<Provider>,

    /// Model id (overrides RESEARCH_MODEL env var)
    #[arg(short = 'm', long = "model", env = "RESEARCH_MODEL")]
    model: Option<String>,

    /// Sampling temperature between 0.0 and 1.0
    #[arg(short = 't', long = "temperature")]
    temperature: Option<f64>,

    /// Research depth, 1-5 (accepted for future multi-step research)
    #[arg(long = "max-depth")]
    max_depth: Option<u8>,

    /// Research breadth, 1-5 (accepted for future multi-step research)
    #[arg(long = "max-branches")]
    max_branches: Option<u8>,

    /// Keep reading questions from stdin after the first one
    #[arg(short = 'i', long = "interactive", default_value = "false")]
    interactive: bool,

    /// Print results as JSON
    #[arg(long = "json", default_value = "false")]
    json: bool,

    /// Verbose output (debug logging)
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    verbose: bool,
}

impl Args {
    /// Apply command-line overrides on top of the environment.
    fn apply(&self, config: &mut Config) {
        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(model) = self.model.as_ref().filter(|m| !m.trim().is_empty()) {
            config.model = Some(model.clone());
        }
        if let Some(temperature) = self.temperature {
            config.temperature = temperature;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if let Some(branches) = self.max_branches {
            config.max_branches = branches;
        }
    }

    fn format(&self) -> OutputFormat {
        if self.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration from environment/.env file
    let mut config = Config::from_env()?;

    init_logging(&config.log_level, args.verbose)?;

    args.apply(&mut config);
    config.validate()?;

    info!(
        provider = %config.provider,
        model = config.model.as_deref().unwrap_or(config.provider.default_model()),
        temperature = config.temperature,
        "Configuration loaded"
    );

    let mut shell = Shell::new(config, args.format());

    if let Some(query) = args.query.as_deref() {
        if let Err(e) = shell.submit(query).await {
            error!(error = %e, "Research failed");
            eprintln!("\n❌ Research failed: {}", e);

            if !args.interactive {
                // Return the error to set non-zero exit code
                return Err(e);
            }
        }

        if !args.interactive {
            info!("Research completed successfully");
            return Ok(());
        }
    }

    shell.run_interactive().await
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Initialize the tracing subscriber for structured logging.
///
/// Logs go to stderr so `--json` output on stdout stays machine-readable.
fn init_logging(log_level: &str, verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
