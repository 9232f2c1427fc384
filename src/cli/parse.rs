use action_locator::{parse_error_message, parse_locator, score_locator};
use anyhow::{bail, Context, Result};
use clap::Args;
use serde_json::json;

use super::output::{print_json, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ParseArgs {
    /// Locator expression, e.g. page.getByRole('button', { name: 'Save' })
    #[arg(required_unless_present = "from_error", conflicts_with = "from_error")]
    pub expression: Option<String>,

    /// Driver error message containing a "waiting for ..." phrase
    #[arg(long, value_name = "MESSAGE")]
    pub from_error: Option<String>,
}

pub fn cmd_parse(args: ParseArgs, output: OutputFormat) -> Result<()> {
    let mut descriptor = match (&args.expression, &args.from_error) {
        (Some(expression), _) => {
            parse_locator(expression).with_context(|| format!("Cannot parse '{}'", expression))?
        }
        (None, Some(message)) => {
            parse_error_message(message).context("No parseable locator in error message")?
        }
        (None, None) => bail!("Provide an expression or --from-error"),
    };
    let rank = score_locator(&mut descriptor);
    let expression = descriptor.to_expression();

    match output {
        OutputFormat::Json => print_json(&json!({
            "descriptor": descriptor,
            "expression": expression,
            "rank": rank,
        })),
        OutputFormat::Human => {
            println!("Strategy:   {}", descriptor.strategy);
            println!("Value:      {}", descriptor.value);
            if let Some(role) = descriptor.role {
                println!("Role:       {}", role);
            }
            if let Some(landmark) = &descriptor.landmark {
                println!("Landmark:   {}", landmark);
            }
            println!("Exact:      {}", descriptor.exact);
            println!("Rank:       {}", rank);
            println!("Expression: {}", expression);
            Ok(())
        }
    }
}
