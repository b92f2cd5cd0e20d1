//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::{CameraSourceConfig, GuardBlueprint};
use serde::Serialize;
use std::collections::HashMap;
use tracing::info;

use super::load_blueprint;
use crate::cli::InfoArgs;

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    zones: ZoneInfo,
    sensing: SensingInfo,
    capture: CaptureInfo,
    upload: UploadInfo,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    profile: Vec<SegmentInfo>,
}

#[derive(Serialize)]
struct ZoneInfo {
    critical_m: f64,
    caution_m: f64,
    debounce_ms: u64,
}

#[derive(Serialize)]
struct SensingInfo {
    period_ms: u64,
    echo_timeout_ms: u64,
    speed_of_sound_m_s: f64,
}

#[derive(Serialize)]
struct CaptureInfo {
    camera_id: String,
    source: String,
    image_size: u32,
    jpeg_quality: u8,
}

#[derive(Serialize)]
struct UploadInfo {
    name: String,
    sink_type: String,
    max_concurrent: usize,
    shutdown_grace_ms: u64,
    #[serde(skip_serializing_if = "HashMap::is_empty")]
    params: HashMap<String, String>,
}

#[derive(Serialize)]
struct SegmentInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    distance_m: Option<f64>,
    hold_ms: u64,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    info!(config = %args.config.display(), "Loading configuration info");

    let blueprint = load_blueprint(&args.config)?;

    if args.json {
        let info = build_config_info(&blueprint, args);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, args);
    }

    Ok(())
}

fn describe_source(source: &CameraSourceConfig) -> String {
    match source {
        CameraSourceConfig::Synthetic { width, height } => format!("synthetic {width}x{height}"),
        CameraSourceConfig::File { path } => format!("file {}", path.display()),
    }
}

fn build_config_info(blueprint: &GuardBlueprint, args: &InfoArgs) -> ConfigInfo {
    let profile = if args.profile {
        blueprint
            .simulation
            .profile
            .iter()
            .map(|s| SegmentInfo {
                distance_m: s.distance_m,
                hold_ms: s.hold_ms,
            })
            .collect()
    } else {
        Vec::new()
    };

    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        zones: ZoneInfo {
            critical_m: blueprint.zones.critical_m,
            caution_m: blueprint.zones.caution_m,
            debounce_ms: blueprint.zones.debounce_ms,
        },
        sensing: SensingInfo {
            period_ms: blueprint.sensing.period_ms,
            echo_timeout_ms: blueprint.sensing.echo_timeout_ms,
            speed_of_sound_m_s: blueprint.sensing.speed_of_sound_m_s,
        },
        capture: CaptureInfo {
            camera_id: blueprint.capture.camera_id.clone(),
            source: describe_source(&blueprint.capture.source),
            image_size: blueprint.capture.image_size,
            jpeg_quality: blueprint.capture.jpeg_quality,
        },
        upload: UploadInfo {
            name: blueprint.upload.name.clone(),
            sink_type: format!("{:?}", blueprint.upload.sink_type),
            max_concurrent: blueprint.upload.max_concurrent,
            shutdown_grace_ms: blueprint.upload.shutdown_grace_ms,
            params: blueprint.upload.params.clone(),
        },
        profile,
    }
}

fn print_config_info(blueprint: &GuardBlueprint, args: &InfoArgs) {
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║              Proximity Guard Configuration                   ║");
    println!("╚══════════════════════════════════════════════════════════════╝\n");

    let zones = &blueprint.zones;
    println!("📏 Zones");
    println!("   ├─ Version: {:?}", blueprint.version);
    println!("   ├─ Critical: <= {:.2} m", zones.critical_m);
    println!("   ├─ Caution: < {:.2} m", zones.caution_m);
    println!("   └─ Debounce: {} ms", zones.debounce_ms);

    let sensing = &blueprint.sensing;
    println!("\n📡 Sensing");
    println!("   ├─ Period: {} ms", sensing.period_ms);
    println!("   ├─ Echo timeout: {} ms", sensing.echo_timeout_ms);
    println!("   └─ Speed of sound: {} m/s", sensing.speed_of_sound_m_s);

    let capture = &blueprint.capture;
    println!("\n📷 Capture");
    println!("   ├─ Camera: {}", capture.camera_id);
    println!("   ├─ Source: {}", describe_source(&capture.source));
    println!("   ├─ Warm-up: {} ms", capture.warmup_ms);
    println!(
        "   └─ Output: {}x{} JPEG (quality {})",
        capture.image_size, capture.image_size, capture.jpeg_quality
    );

    let upload = &blueprint.upload;
    println!("\n📤 Upload");
    println!("   ├─ Sink: {} ({:?})", upload.name, upload.sink_type);
    for (key, value) in &upload.params {
        println!("   ├─ {}: {}", key, value);
    }
    println!("   ├─ Max concurrent: {}", upload.max_concurrent);
    println!("   └─ Shutdown grace: {} ms", upload.shutdown_grace_ms);

    let segments = &blueprint.simulation.profile;
    if args.profile {
        println!("\n🔁 Simulated profile ({} segments)", segments.len());
        for (i, segment) in segments.iter().enumerate() {
            let prefix = if i == segments.len() - 1 { "└─" } else { "├─" };
            match segment.distance_m {
                Some(d) => println!("   {} {:.2} m for {} ms", prefix, d, segment.hold_ms),
                None => println!("   {} no echo for {} ms", prefix, segment.hold_ms),
            }
        }
    } else {
        println!("\n🔁 Simulated profile: {} segments", segments.len());
    }

    println!();
}
