use super::classify::cmd_classify;
use super::env::CliArgs;
use super::heal::cmd_heal;
use super::parse::cmd_parse;
use super::rules::cmd_rules;
use crate::cli::commands::Commands;
use crate::cli::context::CliContext;
use anyhow::Result;

pub async fn dispatch(cli: &CliArgs, ctx: &CliContext) -> Result<()> {
    match cli.command.clone() {
        Commands::Classify(args) => cmd_classify(args, cli.output),
        Commands::Parse(args) => cmd_parse(args, cli.output),
        Commands::Rules(args) => cmd_rules(args, ctx, cli.output),
        Commands::Heal(args) => cmd_heal(args, ctx, cli.output).await,
    }
}
