//! Display frame composition

use contracts::DisplayConfig;

/// Character grid of the display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScreenGeometry {
    pub columns: usize,
    pub rows: usize,
}

impl From<&DisplayConfig> for ScreenGeometry {
    fn from(config: &DisplayConfig) -> Self {
        Self {
            columns: config.columns as usize,
            rows: config.rows as usize,
        }
    }
}

impl Default for ScreenGeometry {
    fn default() -> Self {
        Self::from(&DisplayConfig::default())
    }
}

/// Build the lines shown for one tick
///
/// Zone lines come first, then the latest distance, then the notice. Lines
/// beyond the row count are dropped and every line is cut to the column
/// count (by characters, not bytes).
pub fn compose_frame(
    zone_lines: &[String],
    distance_m: Option<f64>,
    notice: Option<&str>,
    geometry: ScreenGeometry,
) -> Vec<String> {
    let distance_line = match distance_m {
        Some(d) => format!("Distance: {:.2} cm", d * 100.0),
        None => "Distance: --".to_string(),
    };

    zone_lines
        .iter()
        .map(String::as_str)
        .chain(std::iter::once(distance_line.as_str()))
        .chain(notice)
        .take(geometry.rows)
        .map(|line| line.chars().take(geometry.columns).collect())
        .collect()
}
