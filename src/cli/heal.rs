use std::path::PathBuf;
use std::sync::Arc;

use action_locator::{
    DefaultSelfHealer, HealError, HealOrchestrator, HealReport, LocatorError, OllamaSuggester,
    StaticPage,
};
use anyhow::{Context, Result};
use clap::Args;
use selfheal_core_types::{Failure, LocatorDescriptor};
use serde_json::json;
use tracing::{debug, info};

use super::context::CliContext;
use super::output::{print_json, OutputFormat};
use super::rules::load_engine;

#[derive(Args, Clone, Debug)]
pub struct HealArgs {
    /// Accessibility snapshot (YAML) of the page at failure time
    #[arg(long, value_name = "FILE")]
    pub snapshot: PathBuf,

    /// DOM dump saved next to the snapshot
    #[arg(long, value_name = "FILE")]
    pub dom: Option<PathBuf>,

    /// Error name reported by the driver
    #[arg(long, default_value = "TimeoutError")]
    pub error_type: String,

    /// Full error message including the call log
    #[arg(long)]
    pub message: String,

    /// Policy document; overrides `rules_path` from the config
    #[arg(long, value_name = "FILE")]
    pub rules: Option<PathBuf>,

    /// Directory for collected artifacts
    #[arg(long, value_name = "DIR")]
    pub artifact_dir: Option<PathBuf>,

    /// Ask the configured suggester when narrowing finds nothing
    #[arg(long)]
    pub suggest: bool,
}

pub async fn cmd_heal(args: HealArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    let config = ctx.config();
    if let Some(path) = ctx.config_path() {
        debug!(config = %path.display(), "healing with file configuration");
    }

    let mut page = StaticPage::from_path(&args.snapshot)
        .await
        .with_context(|| format!("Failed to load snapshot {}", args.snapshot.display()))?;
    if let Some(dom) = &args.dom {
        let html = tokio::fs::read_to_string(dom)
            .await
            .with_context(|| format!("Failed to read DOM dump {}", dom.display()))?;
        page = page.with_dom(html);
    }

    let rules_path = args.rules.as_deref().or(config.rules_path.as_deref());
    let engine = Arc::new(load_engine(rules_path)?);
    let mut orchestrator = HealOrchestrator::new(engine);
    if args.suggest || config.suggester.enabled {
        let suggester = OllamaSuggester::new(config.ollama_config())
            .context("Failed to build suggester client")?;
        info!(model = %config.suggester.model, "suggester enabled");
        orchestrator = orchestrator.with_suggester(Arc::new(suggester));
    }

    let mut settings = config.healer_settings();
    if let Some(dir) = args.artifact_dir {
        settings.artifact_dir = dir;
    }
    let healer = DefaultSelfHealer::new(orchestrator, settings);

    let failure = LocatorError::driver(args.error_type, args.message);
    let diagnosis = healer.diagnose(&page, &failure).await;
    let verdict = healer.gate(&diagnosis.report, failure);

    match output {
        OutputFormat::Json => {
            let verdict_json = match &verdict {
                Ok(locator) => json!({
                    "accepted": true,
                    "locator": locator.to_expression(),
                }),
                Err(err) => json!({
                    "accepted": false,
                    "error": err.to_string(),
                }),
            };
            print_json(&json!({
                "failure": diagnosis.context.failure,
                "artifacts": diagnosis.context.artifacts,
                "report": diagnosis.report,
                "verdict": verdict_json,
            }))?;
        }
        OutputFormat::Human => {
            print_summary(&diagnosis.context.failure, &diagnosis.report, &verdict)
        }
    }

    verdict.map(|_| ()).map_err(anyhow::Error::new)
}

fn print_summary(
    failure: &Failure,
    report: &HealReport,
    verdict: &Result<LocatorDescriptor, HealError>,
) {
    let decision = report.decision();
    println!("Failure:   {} ({})", failure.failure_type, failure.id);
    match &failure.original_locator {
        Some(original) => println!("Original:  {}", original.to_expression()),
        None => println!("Original:  <not recoverable from error>"),
    }
    println!(
        "Decision:  {} [{}] {}",
        decision.decision,
        decision.rule_id.as_deref().unwrap_or("-"),
        decision.explain
    );

    match report {
        HealReport::Declined { .. } => println!("Outcome:   declined by policy"),
        HealReport::Healed(healed) => {
            println!("Outcome:   healed");
            println!(
                "Healed:    {} (rank {}, confidence {})",
                healed.healed_locator, healed.locator_rank, healed.confidence
            );
        }
        HealReport::Unresolved { validations, .. } => {
            println!("Outcome:   unresolved");
            for validation in validations {
                println!(
                    "  {:<60} count={} rank={}",
                    validation.locator, validation.count, validation.locator_rank
                );
            }
        }
    }

    match verdict {
        Ok(locator) => println!("Verdict:   substitute {}", locator.to_expression()),
        Err(HealError::ManualReview { .. }) => println!("Verdict:   manual review required"),
        Err(_) => println!("Verdict:   original failure stands"),
    }
}
