//! GuardBlueprint - Config Loader output
//!
//! Describes the complete device configuration: zone thresholds, sensing
//! cadence, actuator patterns, capture settings, upload routing and the
//! simulated distance profile used when no real hardware is bound.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::time::Duration;
use validator::Validate;

/// Config version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete guard configuration blueprint
///
/// Every section is optional in the source file and falls back to the
/// defaults of the original device (30 cm / 60 cm zones, 24-column LCD).
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct GuardBlueprint {
    /// Config version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Zone thresholds and debounce
    #[serde(default)]
    #[validate(nested)]
    pub zones: ZoneConfig,

    /// Sensing cadence and pulse timing
    #[serde(default)]
    #[validate(nested)]
    pub sensing: SensingConfig,

    /// Buzzer tone and caution pattern
    #[serde(default)]
    #[validate(nested)]
    pub buzzer: BuzzerConfig,

    /// Display geometry and notices
    #[serde(default)]
    #[validate(nested)]
    pub display: DisplayConfig,

    /// Camera and image processing
    #[serde(default)]
    #[validate(nested)]
    pub capture: CaptureConfig,

    /// Record delivery
    #[serde(default)]
    #[validate(nested)]
    pub upload: UploadConfig,

    /// Simulated ranger profile
    #[serde(default)]
    #[validate(nested)]
    pub simulation: SimulationConfig,
}

/// Zone thresholds: `d <= critical_m` is critical, `d < caution_m` is caution
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ZoneConfig {
    /// Critical threshold (meters, inclusive)
    #[serde(default = "default_critical_m")]
    #[validate(range(exclusive_min = 0.0))]
    pub critical_m: f64,

    /// Caution threshold (meters, exclusive)
    #[serde(default = "default_caution_m")]
    #[validate(range(exclusive_min = 0.0))]
    pub caution_m: f64,

    /// A candidate zone must persist this long before it commits
    #[serde(default = "default_debounce_ms")]
    #[validate(range(max = 10_000))]
    pub debounce_ms: u64,
}

impl ZoneConfig {
    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ZoneConfig {
    fn default() -> Self {
        Self {
            critical_m: default_critical_m(),
            caution_m: default_caution_m(),
            debounce_ms: default_debounce_ms(),
        }
    }
}

fn default_critical_m() -> f64 {
    0.30
}

fn default_caution_m() -> f64 {
    0.60
}

fn default_debounce_ms() -> u64 {
    100
}

/// Sensing loop cadence and ultrasonic pulse timing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SensingConfig {
    /// Sensing period
    #[serde(default = "default_period_ms")]
    #[validate(range(min = 10, max = 60_000))]
    pub period_ms: u64,

    /// Upper bound on each echo busy-wait
    #[serde(default = "default_echo_timeout_ms")]
    #[validate(range(min = 1, max = 1_000))]
    pub echo_timeout_ms: u64,

    /// Trigger high pulse width
    #[serde(default = "default_trigger_pulse_us")]
    #[validate(range(min = 1, max = 1_000))]
    pub trigger_pulse_us: u32,

    /// Trigger low time before the pulse
    #[serde(default = "default_settle_us")]
    #[validate(range(max = 10_000))]
    pub settle_us: u32,

    /// Speed of sound used for the round-trip conversion
    #[serde(default = "default_speed_of_sound")]
    #[validate(range(exclusive_min = 0.0))]
    pub speed_of_sound_m_s: f64,
}

impl SensingConfig {
    pub fn period(&self) -> Duration {
        Duration::from_millis(self.period_ms)
    }

    pub fn echo_timeout(&self) -> Duration {
        Duration::from_millis(self.echo_timeout_ms)
    }
}

impl Default for SensingConfig {
    fn default() -> Self {
        Self {
            period_ms: default_period_ms(),
            echo_timeout_ms: default_echo_timeout_ms(),
            trigger_pulse_us: default_trigger_pulse_us(),
            settle_us: default_settle_us(),
            speed_of_sound_m_s: default_speed_of_sound(),
        }
    }
}

fn default_period_ms() -> u64 {
    1000
}

fn default_echo_timeout_ms() -> u64 {
    30
}

fn default_trigger_pulse_us() -> u32 {
    10
}

fn default_settle_us() -> u32 {
    2
}

fn default_speed_of_sound() -> f64 {
    343.0
}

/// Buzzer tone and the caution beep pattern
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BuzzerConfig {
    /// Tone frequency
    #[serde(default = "default_frequency_hz")]
    #[validate(range(min = 1, max = 20_000))]
    pub frequency_hz: u32,

    #[serde(default = "default_beep_ms")]
    #[validate(range(min = 1, max = 10_000))]
    pub caution_on_ms: u64,

    #[serde(default = "default_beep_ms")]
    #[validate(range(min = 1, max = 10_000))]
    pub caution_off_ms: u64,

    #[serde(default = "default_caution_repeats")]
    #[validate(range(max = 100))]
    pub caution_repeats: u32,
}

impl Default for BuzzerConfig {
    fn default() -> Self {
        Self {
            frequency_hz: default_frequency_hz(),
            caution_on_ms: default_beep_ms(),
            caution_off_ms: default_beep_ms(),
            caution_repeats: default_caution_repeats(),
        }
    }
}

fn default_frequency_hz() -> u32 {
    2000
}

fn default_beep_ms() -> u64 {
    250
}

fn default_caution_repeats() -> u32 {
    2
}

/// Character display geometry and notice line
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DisplayConfig {
    #[serde(default = "default_columns")]
    #[validate(range(min = 8, max = 80))]
    pub columns: usize,

    #[serde(default = "default_rows")]
    #[validate(range(min = 2, max = 16))]
    pub rows: usize,

    /// Default lifetime of a posted notice
    #[serde(default = "default_notice_ttl_ms")]
    pub notice_ttl_ms: u64,

    /// Notice channel capacity (notices beyond it are dropped)
    #[serde(default = "default_notice_capacity")]
    #[validate(range(min = 1))]
    pub notice_capacity: usize,
}

impl DisplayConfig {
    pub fn notice_ttl(&self) -> Duration {
        Duration::from_millis(self.notice_ttl_ms)
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            columns: default_columns(),
            rows: default_rows(),
            notice_ttl_ms: default_notice_ttl_ms(),
            notice_capacity: default_notice_capacity(),
        }
    }
}

fn default_columns() -> usize {
    24
}

fn default_rows() -> usize {
    4
}

fn default_notice_ttl_ms() -> u64 {
    3000
}

fn default_notice_capacity() -> usize {
    16
}

/// Camera and image processing settings
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CaptureConfig {
    /// Identifier sent as the record's `camera` field
    #[serde(default = "default_camera_id")]
    #[validate(length(min = 1))]
    pub camera_id: String,

    /// Output side length of the square image
    #[serde(default = "default_image_size")]
    #[validate(range(min = 16, max = 4096))]
    pub image_size: u32,

    /// Delay between opening the device and reading the frame
    #[serde(default = "default_warmup_ms")]
    #[validate(range(max = 60_000))]
    pub warmup_ms: u64,

    /// JPEG quality
    #[serde(default = "default_jpeg_quality")]
    #[validate(range(min = 1, max = 100))]
    pub jpeg_quality: u8,

    /// Where frames come from
    #[serde(default)]
    pub source: CameraSourceConfig,
}

impl CaptureConfig {
    pub fn warmup(&self) -> Duration {
        Duration::from_millis(self.warmup_ms)
    }
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            camera_id: default_camera_id(),
            image_size: default_image_size(),
            warmup_ms: default_warmup_ms(),
            jpeg_quality: default_jpeg_quality(),
            source: CameraSourceConfig::default(),
        }
    }
}

fn default_camera_id() -> String {
    "USB".to_string()
}

fn default_image_size() -> u32 {
    256
}

fn default_warmup_ms() -> u64 {
    200
}

fn default_jpeg_quality() -> u8 {
    85
}

/// Camera backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraSourceConfig {
    /// Generated test pattern
    Synthetic { width: u32, height: u32 },
    /// Image file decoded on every read
    File { path: PathBuf },
}

impl Default for CameraSourceConfig {
    fn default() -> Self {
        Self::Synthetic {
            width: 640,
            height: 480,
        }
    }
}

/// Record delivery configuration
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UploadConfig {
    /// Sink name
    #[serde(default = "default_sink_name")]
    #[validate(length(min = 1))]
    pub name: String,

    /// Sink type
    #[serde(default)]
    pub sink_type: SinkType,

    /// Maximum concurrent capture+upload tasks
    #[serde(default = "default_max_concurrent")]
    #[validate(range(min = 1, max = 64))]
    pub max_concurrent: usize,

    /// How long shutdown waits for in-flight uploads
    #[serde(default = "default_shutdown_grace_ms")]
    #[validate(range(max = 600_000))]
    pub shutdown_grace_ms: u64,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl UploadConfig {
    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            name: default_sink_name(),
            sink_type: SinkType::default(),
            max_concurrent: default_max_concurrent(),
            shutdown_grace_ms: default_shutdown_grace_ms(),
            params: HashMap::new(),
        }
    }
}

fn default_sink_name() -> String {
    "collector".to_string()
}

fn default_max_concurrent() -> usize {
    4
}

fn default_shutdown_grace_ms() -> u64 {
    5000
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Log record summaries
    #[default]
    Log,
    /// JSON POST to the collector
    Http,
    /// Newline-delimited JSON over a byte stream
    Stream,
}

/// Scripted distance profile for the simulated ranger
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SimulationConfig {
    /// Segments played in order, looping
    #[serde(default = "default_profile")]
    #[validate(length(min = 1))]
    pub profile: Vec<ProfileSegment>,

    /// Uniform noise amplitude added to every reading (meters)
    #[serde(default)]
    #[validate(range(min = 0.0))]
    pub noise_m: f64,

    /// Probability that a pulse gets no echo
    #[serde(default)]
    #[validate(range(min = 0.0, max = 1.0))]
    pub dropout_rate: f64,

    /// Delay between the trigger falling edge and the echo rising edge
    #[serde(default = "default_echo_latency_us")]
    pub echo_latency_us: u64,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            profile: default_profile(),
            noise_m: 0.0,
            dropout_rate: 0.0,
            echo_latency_us: default_echo_latency_us(),
        }
    }
}

/// One segment of the simulated profile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProfileSegment {
    /// Obstacle distance, `None` = no echo at all
    #[serde(default)]
    pub distance_m: Option<f64>,

    /// How long the segment lasts
    pub hold_ms: u64,
}

fn default_profile() -> Vec<ProfileSegment> {
    [(1.20, 3000), (0.50, 3000), (0.20, 4000), (0.45, 2000), (1.50, 3000)]
        .into_iter()
        .map(|(d, hold_ms)| ProfileSegment {
            distance_m: Some(d),
            hold_ms,
        })
        .collect()
}

fn default_echo_latency_us() -> u64 {
    100
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_uses_defaults() {
        let bp: GuardBlueprint = toml::from_str("").unwrap();
        assert_eq!(bp.zones.critical_m, 0.30);
        assert_eq!(bp.zones.caution_m, 0.60);
        assert_eq!(bp.zones.debounce_ms, 100);
        assert_eq!(bp.capture.image_size, 256);
        assert_eq!(bp.upload.sink_type, SinkType::Log);
        assert!(bp.validate().is_ok());
    }

    #[test]
    fn test_camera_source_tagging() {
        let bp: GuardBlueprint = toml::from_str(
            r#"
[capture.source]
kind = "file"
path = "/tmp/frame.png"
"#,
        )
        .unwrap();
        assert_eq!(
            bp.capture.source,
            CameraSourceConfig::File {
                path: PathBuf::from("/tmp/frame.png")
            }
        );
    }

    #[test]
    fn test_field_range_validation() {
        let mut bp = GuardBlueprint::default();
        bp.capture.jpeg_quality = 0;
        assert!(bp.validate().is_err());
    }

    #[test]
    fn test_profile_segment_without_distance() {
        let seg: ProfileSegment = serde_json::from_str(r#"{"hold_ms": 500}"#).unwrap();
        assert_eq!(seg.distance_m, None);
    }
}
