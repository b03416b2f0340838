//! # Validate Subcommand
//!
//! Validates one JSON or YAML document against a tree schema and prints
//! either the outcome (`OK`, or every issue with its path) or, with
//! `--format json`, the `{ "ok": .., "value" | "errors": .. }` envelope.
//!
//! Flags override the options loaded from `--config`.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, ValueEnum};

use mkt_schema::{
    load_document, SchemaKind, SchemaOutcome, UnknownFieldPolicy, ValidatorOptions,
};

use crate::{EXIT_INVALID, EXIT_OK};

/// Output format of the validate subcommand.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Human-readable summary.
    #[default]
    Text,
    /// Machine-readable outcome envelope.
    Json,
}

/// Arguments for the `mkt validate` subcommand.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Document to validate (.json, .yaml or .yml).
    #[arg(value_name = "PATH")]
    pub path: PathBuf,

    /// Schema to validate against: navigation or component.
    #[arg(long)]
    pub schema: SchemaKind,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Drop undeclared fields instead of reporting them.
    #[arg(long)]
    pub strip_unknown: bool,

    /// Require node ids to be unique across the tree.
    #[arg(long)]
    pub unique_ids: bool,

    /// Reject trees deeper than this (the root is depth 0).
    #[arg(long, value_name = "N")]
    pub max_depth: Option<usize>,
}

impl ValidateArgs {
    /// Apply command-line overrides on top of configured options.
    pub fn options(&self, mut options: ValidatorOptions) -> ValidatorOptions {
        if self.strip_unknown {
            options.unknown_fields = UnknownFieldPolicy::Strip;
        }
        if self.unique_ids {
            options.unique_ids = true;
        }
        if self.max_depth.is_some() {
            options.max_depth = self.max_depth;
        }
        options
    }
}

/// Result of one validate run: exit code plus what to print.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub code: u8,
    pub output: String,
}

/// Execute the validate subcommand.
///
/// Returns exit code: 0 on success, 1 on validation failure. Operational
/// errors are returned as `Err` and mapped to 2 by the caller.
pub fn run_validate(args: &ValidateArgs, options: ValidatorOptions) -> Result<u8> {
    let report = check(args, options)?;
    println!("{}", report.output);
    Ok(report.code)
}

/// Validate the document named by `args` without printing.
pub fn check(args: &ValidateArgs, options: ValidatorOptions) -> Result<Report> {
    let options = args.options(options);
    let document = load_document(&args.path)?;

    tracing::info!(
        path = %args.path.display(),
        schema = %args.schema,
        ?options,
        "validating document"
    );

    let outcome = args
        .schema
        .validate(&document, options)
        .with_context(|| format!("cannot render validated {} tree", args.schema))?;

    let code = if outcome.is_valid() { EXIT_OK } else { EXIT_INVALID };
    let output = match args.format {
        OutputFormat::Json => {
            let envelope = outcome.to_json()?;
            serde_json::to_string_pretty(&envelope).context("cannot render outcome")?
        }
        OutputFormat::Text => match &outcome {
            SchemaOutcome::Valid(_) => {
                format!("OK: {} ({})", args.path.display(), args.schema)
            }
            SchemaOutcome::Invalid(issues) => {
                let noun = if issues.len() == 1 { "issue" } else { "issues" };
                format!(
                    "FAIL: {} ({}): {} {noun}\n{issues}",
                    args.path.display(),
                    args.schema,
                    issues.len()
                )
            }
        },
    };

    if let SchemaOutcome::Invalid(issues) = &outcome {
        tracing::warn!(
            path = %args.path.display(),
            issues = issues.len(),
            "document failed validation"
        );
    }

    Ok(Report { code, output })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    fn args(path: &Path, schema: SchemaKind) -> ValidateArgs {
        ValidateArgs {
            path: path.to_path_buf(),
            schema,
            format: OutputFormat::Text,
            strip_unknown: false,
            unique_ids: false,
            max_depth: None,
        }
    }

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn valid_yaml_menu_reports_ok() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "menu.yaml",
            "kind: group\nlabel: Account\nchildren:\n  - kind: link\n    label: Billing\n    href: /billing\n",
        );
        let report = check(&args(&path, SchemaKind::Navigation), ValidatorOptions::default())
            .unwrap();
        assert_eq!(report.code, EXIT_OK);
        assert!(report.output.starts_with("OK: "));
        assert!(report.output.ends_with("(navigation)"));
    }

    #[test]
    fn invalid_document_lists_every_issue() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "page.json",
            r#"{"type": "stack", "children": [{"type": "text"}, {"type": "video"}]}"#,
        );
        let report = check(&args(&path, SchemaKind::Component), ValidatorOptions::default())
            .unwrap();
        assert_eq!(report.code, EXIT_INVALID);
        assert!(report.output.contains(": 2 issues"));
        assert!(report.output.contains("children[0].content: missing required field"));
        assert!(report.output.contains("children[1].type: unrecognized component variant"));
    }

    #[test]
    fn json_format_renders_the_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "text.json", r#"{"type": "text", "content": "Hi", "data-x": 1}"#);
        let mut args = args(&path, SchemaKind::Component);
        args.format = OutputFormat::Json;
        let report = check(&args, ValidatorOptions::default()).unwrap();
        let rendered: serde_json::Value = serde_json::from_str(&report.output).unwrap();
        assert_eq!(rendered["ok"], serde_json::json!(true));
        assert_eq!(rendered["value"]["variant"], serde_json::json!("body"));
        assert_eq!(rendered["value"]["data-x"], serde_json::json!(1));
    }

    #[test]
    fn flags_override_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "menu.json",
            r#"{"kind": "link", "label": "Home", "href": "/", "tooltip": "Start"}"#,
        );
        let report = check(&args(&path, SchemaKind::Navigation), ValidatorOptions::default())
            .unwrap();
        assert_eq!(report.code, EXIT_INVALID);

        let mut strip = args(&path, SchemaKind::Navigation);
        strip.strip_unknown = true;
        strip.max_depth = Some(3);
        let options = strip.options(ValidatorOptions::default());
        assert_eq!(options.unknown_fields, UnknownFieldPolicy::Strip);
        assert_eq!(options.max_depth, Some(3));
        assert_eq!(check(&strip, ValidatorOptions::default()).unwrap().code, EXIT_OK);
    }

    #[test]
    fn unreadable_document_is_an_error() {
        let err = check(
            &args(Path::new("/nonexistent/menu.json"), SchemaKind::Navigation),
            ValidatorOptions::default(),
        )
        .unwrap_err();
        assert!(err.to_string().contains("failed to load document"));
    }
}
