//! `validate` command implementation.

use anyhow::{Context, Result};
use contracts::{CameraSourceConfig, GuardBlueprint, SinkType};
use serde::Serialize;
use tracing::info;

use crate::cli::ValidateArgs;

/// Validation result for JSON output
#[derive(Serialize)]
struct ValidationResult {
    valid: bool,
    config_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warnings: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    summary: Option<ConfigSummary>,
}

#[derive(Serialize)]
struct ConfigSummary {
    version: String,
    critical_m: f64,
    caution_m: f64,
    period_ms: u64,
    sink_type: String,
    max_concurrent: usize,
    profile_segments: usize,
}

/// Execute the `validate` command
pub fn run_validate(args: &ValidateArgs) -> Result<()> {
    info!(config = %args.config.display(), "Validating configuration");

    let result = validate_config(args);

    if args.json {
        let json = serde_json::to_string_pretty(&result)
            .context("Failed to serialize validation result")?;
        println!("{}", json);
    } else {
        print_validation_result(&result);
    }

    if result.valid {
        Ok(())
    } else {
        anyhow::bail!("Configuration validation failed")
    }
}

fn validate_config(args: &ValidateArgs) -> ValidationResult {
    let config_path = args.config.display().to_string();

    if !args.config.exists() {
        return ValidationResult {
            valid: false,
            config_path,
            error: Some(format!("File not found: {}", args.config.display())),
            warnings: None,
            summary: None,
        };
    }

    match config_loader::ConfigLoader::load_from_path(&args.config) {
        Ok(blueprint) => {
            let warnings = collect_warnings(&blueprint);
            ValidationResult {
                valid: true,
                config_path,
                error: None,
                warnings: if warnings.is_empty() {
                    None
                } else {
                    Some(warnings)
                },
                summary: Some(ConfigSummary {
                    version: format!("{:?}", blueprint.version),
                    critical_m: blueprint.zones.critical_m,
                    caution_m: blueprint.zones.caution_m,
                    period_ms: blueprint.sensing.period_ms,
                    sink_type: format!("{:?}", blueprint.upload.sink_type),
                    max_concurrent: blueprint.upload.max_concurrent,
                    profile_segments: blueprint.simulation.profile.len(),
                }),
            }
        }
        Err(e) => ValidationResult {
            valid: false,
            config_path,
            error: Some(e.to_string()),
            warnings: None,
            summary: None,
        },
    }
}

/// Collect configuration warnings (non-fatal issues)
fn collect_warnings(blueprint: &GuardBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.upload.sink_type == SinkType::Log {
        warnings.push("Upload sink is 'log' - records are summarized, not uploaded".to_string());
    }

    if blueprint.zones.debounce_ms == 0 {
        warnings.push("zones.debounce_ms is 0 - every reading commits its zone".to_string());
    }

    if blueprint.zones.debounce_ms >= blueprint.sensing.period_ms {
        warnings.push(format!(
            "zones.debounce_ms ({}) >= sensing.period_ms ({}) - zone changes lag by at least one cycle",
            blueprint.zones.debounce_ms, blueprint.sensing.period_ms
        ));
    }

    if blueprint.simulation.dropout_rate > 0.0 {
        warnings.push(format!(
            "simulation.dropout_rate is {} - some cycles will time out",
            blueprint.simulation.dropout_rate
        ));
    }

    if let CameraSourceConfig::File { ref path } = blueprint.capture.source {
        if !path.exists() {
            warnings.push(format!(
                "capture.source.path '{}' does not exist - every capture will fail",
                path.display()
            ));
        }
    }

    warnings
}

fn print_validation_result(result: &ValidationResult) {
    if result.valid {
        println!("✓ Configuration is valid: {}", result.config_path);

        if let Some(ref summary) = result.summary {
            println!("\n  Version: {}", summary.version);
            println!(
                "  Zones: critical <= {:.2} m, caution < {:.2} m",
                summary.critical_m, summary.caution_m
            );
            println!("  Period: {} ms", summary.period_ms);
            println!(
                "  Sink: {} ({} concurrent)",
                summary.sink_type, summary.max_concurrent
            );
            println!("  Profile segments: {}", summary.profile_segments);
        }

        if let Some(ref warnings) = result.warnings {
            println!("\n⚠ Warnings:");
            for warning in warnings {
                println!("  - {}", warning);
            }
        }
    } else {
        println!("✗ Configuration is invalid: {}", result.config_path);
        if let Some(ref error) = result.error {
            println!("\n  Error: {}", error);
        }
    }
}
