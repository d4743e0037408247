//! Analysis configuration
//!
//! Compiled defaults, optionally overridden by a JSON file. Any field left out
//! of the file keeps its default.

use crate::{NRange, Result, ScalingError, DEFAULT_R_MAX, DEFAULT_TARGET_MBPS};
use relay_link_model::ConstantSet;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Sampled in-ring satellite counts
    pub n_range: NRange,
    /// Largest ring count evaluated per search
    pub r_max: u32,
    /// Worst-case throughput the threshold scan looks for (Mbps)
    pub target_mbps: f64,
    pub constants: ConstantSet,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            n_range: NRange::default(),
            r_max: DEFAULT_R_MAX,
            target_mbps: DEFAULT_TARGET_MBPS,
            constants: ConstantSet::default(),
        }
    }
}

impl AnalysisConfig {
    /// Load from a JSON file and validate
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Loading analysis config from {:?}", path);

        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: AnalysisConfig = serde_json::from_reader(reader)?;
        config.validate()?;

        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.n_range.validate()?;
        if self.r_max == 0 {
            return Err(ScalingError::ZeroScanBound);
        }
        if !(self.target_mbps.is_finite() && self.target_mbps >= 0.0) {
            return Err(ScalingError::InvalidTarget(self.target_mbps));
        }
        self.constants.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_load_partial_config() {
        let json = r#"{
            "n_range": {"min": 100, "max": 2000, "step": 50},
            "constants": {"baseline_improvement": 20.0}
        }"#;

        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        let config = AnalysisConfig::load(file.path()).unwrap();
        assert_eq!(config.n_range, NRange { min: 100, max: 2000, step: 50 });
        assert_eq!(config.r_max, DEFAULT_R_MAX);
        assert_eq!(config.target_mbps, DEFAULT_TARGET_MBPS);
        assert_eq!(config.constants.baseline_improvement, 20.0);
        assert_eq!(config.constants.baseline_km, relay_link_model::BASELINE_KM);
    }

    #[test]
    fn test_load_rejects_bad_range() {
        let json = r#"{"n_range": {"min": 0, "max": 100, "step": 10}}"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        assert!(matches!(
            AnalysisConfig::load(file.path()),
            Err(ScalingError::InvalidRange { min: 0, .. })
        ));
    }

    #[test]
    fn test_load_rejects_bad_constants() {
        let json = r#"{"constants": {"baseline_mbps": -5.0}}"#;
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(json.as_bytes()).unwrap();

        assert!(matches!(
            AnalysisConfig::load(file.path()),
            Err(ScalingError::Constants(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            AnalysisConfig::load("/nonexistent/ring-scaling.json"),
            Err(ScalingError::Io(_))
        ));
    }

    #[test]
    fn test_validate_defaults() {
        assert!(AnalysisConfig::default().validate().is_ok());

        let config = AnalysisConfig {
            r_max: 0,
            ..AnalysisConfig::default()
        };
        assert!(matches!(config.validate(), Err(ScalingError::ZeroScanBound)));
    }
}
