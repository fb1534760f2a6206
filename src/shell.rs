//! Terminal shell around the adapter: submits queries, keeps the session
//! history and renders results.

use anyhow::Result;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, error};

use ai_research_assistant::{Config, ProviderRegistry, ResearchHistory, ResearchResult};

const RULE_WIDTH: usize = 60;

/// How results are printed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

/// One interactive or single-shot session.
pub struct Shell {
    config: Config,
    registry: ProviderRegistry,
    history: ResearchHistory,
    format: OutputFormat,
}

impl Shell {
    pub fn new(config: Config, format: OutputFormat) -> Self {
        let registry = config.registry();
        Self {
            config,
            registry,
            history: ResearchHistory::new(),
            format,
        }
    }

    /// Submit one query. On success the result joins the history and the
    /// whole view is printed.
    pub async fn submit(&mut self, query: &str) -> Result<()> {
        let request = self.config.research_config(query)?;
        let result = self.registry.perform_research(&request).await?;

        self.history.push(result);
        println!("{}", self.render()?);
        Ok(())
    }

    /// Read queries from stdin, one per line, until EOF or `exit`.
    pub async fn run_interactive(&mut self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        loop {
            stdout.write_all(b"research> ").await?;
            stdout.flush().await?;

            let Some(line) = lines.next_line().await? else {
                break;
            };
            let query = line.trim();
            match query {
                "" => continue,
                "exit" | "quit" => break,
                _ => {}
            }

            // A failed query is reported and the session continues
            if let Err(e) = self.submit(query).await {
                error!(error = %e, "Research failed");
                eprintln!("\n❌ Research failed: {}\n", e);
            }
        }

        debug!(results = self.history.len(), "Interactive session ended");
        Ok(())
    }

    fn render(&self) -> Result<String> {
        match self.format {
            OutputFormat::Text => Ok(render_history(&self.history)),
            OutputFormat::Json => match self.history.latest() {
                Some(latest) => Ok(serde_json::to_string_pretty(latest)?),
                None => Ok(String::new()),
            },
        }
    }
}

/// Latest result expanded, earlier ones collapsed to one line, newest first.
pub fn render_history(history: &ResearchHistory) -> String {
    let Some(latest) = history.latest() else {
        return String::new();
    };

    let mut out = render_expanded(latest);

    let earlier: Vec<String> = history
        .iter()
        .rev()
        .skip(1)
        .enumerate()
        .map(|(i, result)| render_collapsed(history.len() - 1 - i, result))
        .collect();
    if !earlier.is_empty() {
        out.push_str("\nEarlier queries:\n");
        for line in earlier {
            out.push_str(&line);
            out.push('\n');
        }
    }

    out
}

/// Full view of one result.
pub fn render_expanded(result: &ResearchResult) -> String {
    let rule = "=".repeat(RULE_WIDTH);
    let mut out = format!("\n{}\nRESEARCH RESULTS\n{}\n\n", rule, rule);

    out.push_str(&format!("Query: {}\n", result.query));
    out.push_str(&format!("Confidence: {:.0}%\n\n", result.confidence * 100.0));
    out.push_str(&result.answer);
    out.push('\n');

    if !result.follow_up_questions.is_empty() {
        out.push_str("\nFollow-up questions:\n");
        for (i, question) in result.follow_up_questions.iter().enumerate() {
            out.push_str(&format!("  {}. {}\n", i + 1, question));
        }
    }

    if let Some(sources) = result.sources.as_ref().filter(|s| !s.is_empty()) {
        out.push_str("\nSources:\n");
        for source in sources {
            out.push_str(&format!("  - {}\n", source));
        }
    }

    out.push_str(&format!("\n{}\n", rule));
    out
}

/// One-line summary for the history list. `position` is 1-based.
pub fn render_collapsed(position: usize, result: &ResearchResult) -> String {
    format!(
        "  [{}] {} ({:.0}% confidence)",
        position,
        result.query,
        result.confidence * 100.0
    )
}
