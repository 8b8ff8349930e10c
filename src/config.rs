//! Post-processor configuration
//!
//! Reads a small TOML file with the knobs that change numerical results:
//! contour sampling density, nodal smoothing, and whether the demagnetizing
//! field of permanent magnets is shifted out of reported H.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Tunable post-processing parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PostConfig {
    /// Midpoint samples per contour segment in line integrals
    pub line_integral_points: usize,
    /// Use patch-smoothed nodal flux density in point queries
    pub smoothing: bool,
    /// Subtract H_c from reported H inside permanent-magnet regions
    pub shift_h: bool,
}

impl Default for PostConfig {
    fn default() -> Self {
        Self {
            line_integral_points: 400,
            smoothing: true,
            shift_h: true,
        }
    }
}

impl PostConfig {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, String> {
        let contents = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;

        toml::from_str(&contents).map_err(|e| format!("Failed to parse config file: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = PostConfig::default();
        assert_eq!(cfg.line_integral_points, 400);
        assert!(cfg.smoothing);
        assert!(cfg.shift_h);
    }

    #[test]
    fn test_partial_toml() {
        let cfg: PostConfig = toml::from_str("line_integral_points = 100").unwrap();
        assert_eq!(cfg.line_integral_points, 100);
        assert!(cfg.smoothing);
    }
}
