use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Serialize;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Yaml,
}

/// Print `value` as JSON or YAML. Returns `false` for human output so the
/// caller renders its own text.
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Human => Ok(false),
        OutputFormat::Json => {
            let text = serde_json::to_string_pretty(value).context("Failed to encode JSON output")?;
            println!("{text}");
            Ok(true)
        }
        OutputFormat::Yaml => {
            let text = serde_yaml::to_string(value).context("Failed to encode YAML output")?;
            print!("{text}");
            Ok(true)
        }
    }
}
