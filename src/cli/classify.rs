use action_locator::classify_failure;
use anyhow::Result;
use clap::Args;
use selfheal_core_types::ErrorInfo;
use serde_json::json;

use super::output::{print_json, OutputFormat};

#[derive(Args, Clone, Debug)]
pub struct ClassifyArgs {
    /// Error name reported by the driver, e.g. TimeoutError
    #[arg(long, default_value = "Error")]
    pub error_type: String,

    /// Full error message including the call log
    #[arg(long)]
    pub message: String,
}

pub fn cmd_classify(args: ClassifyArgs, output: OutputFormat) -> Result<()> {
    let error = ErrorInfo::new(args.error_type, args.message);
    let failure_type = classify_failure(&error);

    match output {
        OutputFormat::Json => print_json(&json!({
            "failure_type": failure_type,
            "error": error,
        })),
        OutputFormat::Human => {
            println!("{}", failure_type);
            Ok(())
        }
    }
}
