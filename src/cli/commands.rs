use clap::Subcommand;

use super::classify::ClassifyArgs;
use super::heal::HealArgs;
use super::parse::ParseArgs;
use super::rules::RulesArgs;

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Classify a driver failure
    Classify(ClassifyArgs),

    /// Parse a locator expression or the locator named in an error message
    Parse(ParseArgs),

    /// Inspect the repair policy
    Rules(RulesArgs),

    /// Run the healing pipeline against a recorded accessibility snapshot
    Heal(HealArgs),
}
