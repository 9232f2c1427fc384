use std::path::Path;

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use selfheal_policy_center::{default_engine, RuleEngine};
use serde_json::json;

use super::context::CliContext;
use super::output::{print_json, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

#[derive(Subcommand, Clone, Debug)]
pub enum RulesCommand {
    /// Load the policy and list rules in evaluation order
    Check(RulesCheckArgs),
}

#[derive(Args, Clone, Debug)]
pub struct RulesCheckArgs {
    /// Policy document; overrides `rules_path` from the config
    #[arg(long, value_name = "FILE")]
    pub rules: Option<std::path::PathBuf>,
}

/// Loads the policy at `path`, or the built-in default policy.
pub fn load_engine(path: Option<&Path>) -> Result<RuleEngine> {
    match path {
        Some(path) => RuleEngine::from_path(path)
            .with_context(|| format!("Failed to load policy {}", path.display())),
        None => default_engine().context("Built-in policy is invalid"),
    }
}

pub fn cmd_rules(args: RulesArgs, ctx: &CliContext, output: OutputFormat) -> Result<()> {
    match args.command {
        RulesCommand::Check(check) => {
            let path = check.rules.as_deref().or(ctx.config().rules_path.as_deref());
            let engine = load_engine(path)?;
            let source = path
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string());

            match output {
                OutputFormat::Json => print_json(&json!({
                    "source": source,
                    "rules": engine.rules(),
                })),
                OutputFormat::Human => {
                    println!("Policy: {} ({} rules)", source, engine.rules().len());
                    for rule in engine.rules() {
                        println!(
                            "{:>5}  {:<32} {:<9} {}",
                            rule.priority,
                            rule.id,
                            rule.action.decision.as_str(),
                            rule.explain
                        );
                    }
                    Ok(())
                }
            }
        }
    }
}
