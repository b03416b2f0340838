//! # Schemas Subcommand
//!
//! Lists every registered tree schema with its discriminator, variants and
//! declared fields.

use anyhow::{Context, Result};
use clap::Args;

use mkt_schema::SchemaKind;

use crate::validate::OutputFormat;
use crate::EXIT_OK;

/// Arguments for the `mkt schemas` subcommand.
#[derive(Args, Debug)]
pub struct SchemasArgs {
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,
}

/// Execute the schemas subcommand.
pub fn run_schemas(args: &SchemasArgs) -> Result<u8> {
    println!("{}", render(args.format)?);
    Ok(EXIT_OK)
}

/// Describe every schema in the requested format.
pub fn render(format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => {
            let mut lines = Vec::new();
            for kind in SchemaKind::all() {
                lines.push(format!("{kind} (discriminator `{}`)", kind.discriminator()));
                for tag in kind.variants() {
                    lines.push(format!("  {tag}: {}", kind.fields(tag).join(", ")));
                }
            }
            Ok(lines.join("\n"))
        }
        OutputFormat::Json => {
            let schemas: Vec<serde_json::Value> = SchemaKind::all()
                .iter()
                .map(|kind| {
                    let variants: serde_json::Map<String, serde_json::Value> = kind
                        .variants()
                        .iter()
                        .map(|tag| (tag.to_string(), serde_json::json!(kind.fields(tag))))
                        .collect();
                    serde_json::json!({
                        "name": kind.name(),
                        "discriminator": kind.discriminator(),
                        "variants": variants,
                    })
                })
                .collect();
            serde_json::to_string_pretty(&schemas).context("cannot render schema list")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_lists_every_variant() {
        let text = render(OutputFormat::Text).unwrap();
        assert!(text.contains("navigation (discriminator `kind`)"));
        assert!(text.contains("  group: id, label, icon, expanded, children"));
        assert!(text.contains("component (discriminator `type`)"));
        assert!(text.contains("  image: id, src, alt, width, height"));
    }

    #[test]
    fn json_is_machine_readable() {
        let json: serde_json::Value =
            serde_json::from_str(&render(OutputFormat::Json).unwrap()).unwrap();
        assert_eq!(json[0]["name"], "navigation");
        assert_eq!(json[1]["discriminator"], "type");
        assert_eq!(json[1]["variants"]["card"][2], "elevated");
    }
}
