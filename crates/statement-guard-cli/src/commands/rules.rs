use clap::Args;
use serde_json::{json, Value};

use super::ConfigArgs;

/// Arguments for printing the active configuration
#[derive(Args)]
pub struct RulesArgs {
    /// Show a single bank rule by name
    #[arg(long)]
    pub bank: Option<String>,

    #[command(flatten)]
    pub config: ConfigArgs,
}

pub fn run_rules(args: RulesArgs) -> Result<Value, Box<dyn std::error::Error>> {
    // Compiling validates the table before it is shown.
    let rules = args.config.compiled_rules()?;
    let source = rules.source();

    if let Some(ref name) = args.bank {
        let bank = source
            .banks
            .iter()
            .find(|b| b.name.eq_ignore_ascii_case(name))
            .ok_or_else(|| format!("No bank rule named '{name}'"))?;
        return Ok(serde_json::to_value(bank)?);
    }

    Ok(json!({
        "profile": args.config.scoring_profile(),
        "editing_tools": source.editing_tools,
        "direction": source.direction,
        "banks": source.banks,
    }))
}
