//! `run` command implementation.

use anyhow::{Context, Result};
use contracts::{GuardBlueprint, SinkType};
use monitor::ShutdownToken;
use std::time::Duration;
use tracing::{error, info, warn};

use super::load_blueprint;
use crate::cli::RunArgs;
use crate::pipeline::{Pipeline, PipelineConfig};

/// Execute the `run` command
pub async fn run_guard(args: &RunArgs) -> Result<()> {
    let mut blueprint = match &args.config {
        Some(path) => {
            info!(config = %path.display(), "Loading configuration");
            load_blueprint(path)?
        }
        None => {
            info!("No configuration file given, using built-in defaults");
            GuardBlueprint::default()
        }
    };

    apply_overrides(&mut blueprint, args);
    config_loader::ConfigLoader::validate(&blueprint)
        .context("Configuration invalid after CLI overrides")?;

    info!(
        critical_m = blueprint.zones.critical_m,
        caution_m = blueprint.zones.caution_m,
        period_ms = blueprint.sensing.period_ms,
        sink = %blueprint.upload.name,
        sink_type = ?blueprint.upload.sink_type,
        "Configuration loaded"
    );

    if args.dry_run {
        info!("Dry run mode - configuration is valid, exiting");
        print_config_summary(&blueprint);
        return Ok(());
    }

    let pipeline_config = PipelineConfig {
        blueprint,
        max_cycles: if args.max_cycles == 0 {
            None
        } else {
            Some(args.max_cycles)
        },
        timeout: if args.timeout == 0 {
            None
        } else {
            Some(Duration::from_secs(args.timeout))
        },
        metrics_port: if args.metrics_port == 0 {
            None
        } else {
            Some(args.metrics_port)
        },
        seed: args.seed,
    };

    let shutdown = ShutdownToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        shutdown_signal().await;
        warn!("Received shutdown signal, stopping guard...");
        signal_token.cancel();
    });

    info!("Starting guard...");
    let stats = Pipeline::new(pipeline_config)
        .run(shutdown)
        .await
        .context("Guard execution failed")?;

    info!(
        cycles = stats.monitor.cycles,
        critical_entries = stats.monitor.critical_entries,
        delivered = stats.uploads.delivered,
        duration_secs = stats.duration.as_secs_f64(),
        "Guard completed"
    );
    stats.print_summary();

    info!("Proximity guard finished");
    Ok(())
}

/// CLI flags win over the file
fn apply_overrides(blueprint: &mut GuardBlueprint, args: &RunArgs) {
    if let Some(ref url) = args.url {
        info!(url = %url, "Overriding upload target from CLI");
        blueprint.upload.sink_type = SinkType::Http;
        blueprint
            .upload
            .params
            .insert("url".to_string(), url.clone());
    }
    if let Some(period_ms) = args.period_ms {
        info!(period_ms, "Overriding sensing period from CLI");
        blueprint.sensing.period_ms = period_ms;
    }
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

/// Print configuration summary for dry-run mode
fn print_config_summary(blueprint: &GuardBlueprint) {
    println!("\n=== Configuration Summary ===\n");
    println!("Zones:");
    println!("  Critical: <= {:.2} m", blueprint.zones.critical_m);
    println!("  Caution:  <  {:.2} m", blueprint.zones.caution_m);
    println!("  Debounce: {} ms", blueprint.zones.debounce_ms);

    println!("\nSensing:");
    println!("  Period: {} ms", blueprint.sensing.period_ms);
    println!("  Echo timeout: {} ms", blueprint.sensing.echo_timeout_ms);

    println!("\nCapture:");
    println!(
        "  Camera: {} ({}x{} px, quality {})",
        blueprint.capture.camera_id,
        blueprint.capture.image_size,
        blueprint.capture.image_size,
        blueprint.capture.jpeg_quality
    );

    println!("\nUpload:");
    println!(
        "  - {} ({:?}), {} concurrent",
        blueprint.upload.name, blueprint.upload.sink_type, blueprint.upload.max_concurrent
    );
    for (key, value) in &blueprint.upload.params {
        println!("    {}: {}", key, value);
    }

    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> RunArgs {
        RunArgs {
            config: None,
            url: None,
            period_ms: None,
            max_cycles: 0,
            timeout: 0,
            dry_run: false,
            metrics_port: 0,
            seed: None,
        }
    }

    #[test]
    fn test_no_overrides_keeps_file_values() {
        let mut bp = GuardBlueprint::default();
        apply_overrides(&mut bp, &args());
        assert_eq!(bp.upload.sink_type, SinkType::Log);
        assert_eq!(bp.sensing.period_ms, 1000);
    }

    #[test]
    fn test_url_switches_to_http() {
        let mut bp = GuardBlueprint::default();
        let args = RunArgs {
            url: Some("http://127.0.0.1:8000/upload".to_string()),
            period_ms: Some(200),
            ..args()
        };
        apply_overrides(&mut bp, &args);
        assert_eq!(bp.upload.sink_type, SinkType::Http);
        assert_eq!(
            bp.upload.params.get("url").map(String::as_str),
            Some("http://127.0.0.1:8000/upload")
        );
        assert_eq!(bp.sensing.period_ms, 200);
        assert!(config_loader::ConfigLoader::validate(&bp).is_ok());
    }

    #[tokio::test]
    async fn test_dry_run_with_defaults() {
        let args = RunArgs {
            dry_run: true,
            ..args()
        };
        assert!(run_guard(&args).await.is_ok());
    }
}
