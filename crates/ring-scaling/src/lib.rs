//! Relay Ring Scaling Analysis
//!
//! Searches, for each in-ring satellite count N, the ring count R that
//! maximizes worst-case throughput per satellite, then characterizes the
//! optimal-throughput curve with least-squares and closed-form scaling laws.
//!
//! # Pipeline
//!
//! ```text
//! LinkModel ─► RingOptimizer ─► [OptimalResult] ─► ScalingFitter ─► ScalingFits ─► export / report
//!                                                                        ▲
//! ConstantSet ─────────────────► AnalyticalValidator ────────────────────┘ (side-by-side)
//! ```
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Ring search | [`optimizer`] | one [`OptimalResult`] per N |
//! | Fits | [`fitter`] (on [`regression`]) | two linear + two power-law fits |
//! | Closed form | [`analytical`] | α, K and the asymptotic power laws |
//! | Convergence | [`convergence`] | exponent error as N_max grows |
//! | Sinks | [`export`], [`report`] | CSV/JSON tables, console summary |

use relay_link_model::LinkModelError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod analytical;
pub mod config;
pub mod convergence;
pub mod export;
pub mod fitter;
pub mod optimizer;
pub mod pipeline;
pub mod regression;
pub mod report;

pub use analytical::{AnalyticalFits, AnalyticalValidator, FitComparison};
pub use config::AnalysisConfig;
pub use fitter::{ScalingFits, ScalingFitter};
pub use optimizer::{RingOptimizer, RingOptimum};
pub use pipeline::{run_analysis, AnalysisReport};

/// First in-ring satellite count sampled
pub const DEFAULT_N_MIN: u32 = 20;

/// Last in-ring satellite count sampled (inclusive)
pub const DEFAULT_N_MAX: u32 = 5320;

/// Stride between sampled in-ring satellite counts
pub const DEFAULT_N_STEP: u32 = 20;

/// Largest ring count the optimizer will evaluate
pub const DEFAULT_R_MAX: u32 = 999;

/// Worst-case throughput target for the threshold scan, in Mbps
pub const DEFAULT_TARGET_MBPS: f64 = 1000.0;

#[derive(Error, Debug)]
pub enum ScalingError {
    #[error("Invalid N range {min}..={max} step {step}")]
    InvalidRange { min: u32, max: u32, step: u32 },
    #[error("In-ring satellite count must be at least 1")]
    ZeroInRingCount,
    #[error("Ring scan bound must be at least 1")]
    ZeroScanBound,
    #[error("Target throughput must be finite and non-negative: {0}")]
    InvalidTarget(f64),
    #[error("Series length mismatch: {x} x-values, {y} y-values")]
    LengthMismatch { x: usize, y: usize },
    #[error("Degenerate fit: {0}")]
    DegenerateFit(String),
    #[error("Non-positive value {value} at index {index} in {series} (log fit needs > 0)")]
    NonPositiveLogInput {
        series: &'static str,
        index: usize,
        value: f64,
    },
    #[error("Invalid constants: {0}")]
    Constants(#[from] LinkModelError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ScalingError>;

/// Stride-sampled interval of in-ring satellite counts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NRange {
    pub min: u32,
    pub max: u32,
    pub step: u32,
}

impl Default for NRange {
    fn default() -> Self {
        Self {
            min: DEFAULT_N_MIN,
            max: DEFAULT_N_MAX,
            step: DEFAULT_N_STEP,
        }
    }
}

impl NRange {
    pub fn new(min: u32, max: u32, step: u32) -> Result<Self> {
        let range = Self { min, max, step };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<()> {
        if self.min == 0 || self.step == 0 || self.min > self.max {
            return Err(ScalingError::InvalidRange {
                min: self.min,
                max: self.max,
                step: self.step,
            });
        }
        Ok(())
    }

    /// Sampled values in increasing order; `max` is included when the stride lands on it
    pub fn iter(&self) -> impl Iterator<Item = u32> {
        (self.min..=self.max).step_by(self.step.max(1) as usize)
    }

    pub fn len(&self) -> usize {
        if self.min > self.max || self.step == 0 {
            return 0;
        }
        ((self.max - self.min) / self.step) as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Same start and stride with a different upper bound
    pub fn with_max(&self, max: u32) -> Self {
        Self { max, ..*self }
    }
}

/// Optimal ring configuration for one in-ring satellite count
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimalResult {
    /// In-ring satellite count N
    pub n: u32,
    /// Ring count maximizing worst-case Mbps per satellite
    pub r_opt: u32,
    /// N · R_opt
    pub total_sat_count: u64,
    /// Worst-case Mbps per satellite at R_opt
    pub max_mbps_per_sat: f64,
    /// Worst-case total Mbps at R_opt
    pub worst_mbps_at_opt: f64,
    /// Best-case total Mbps at R_opt
    pub best_mbps_at_opt: f64,
    /// Scan reached the ring bound without seeing a decrease
    pub hit_scan_bound: bool,
}

/// Model family of a fitted coefficient pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FitKind {
    /// y = a·x + b
    Linear,
    /// y = a·x^b
    PowerLaw,
}

/// Coefficient pair (a, b) of a linear or power-law model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FitCoefficients {
    pub kind: FitKind,
    pub a: f64,
    pub b: f64,
    /// Coefficient of determination of the underlying linear regression
    /// (in log space for power laws); `None` for closed-form pairs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub r_squared: Option<f64>,
}

impl FitCoefficients {
    pub fn linear(a: f64, b: f64) -> Self {
        Self {
            kind: FitKind::Linear,
            a,
            b,
            r_squared: None,
        }
    }

    pub fn power_law(a: f64, b: f64) -> Self {
        Self {
            kind: FitKind::PowerLaw,
            a,
            b,
            r_squared: None,
        }
    }

    pub fn with_r_squared(mut self, r_squared: f64) -> Self {
        self.r_squared = Some(r_squared);
        self
    }

    /// Evaluate the model at `x`
    pub fn predict(&self, x: f64) -> f64 {
        match self.kind {
            FitKind::Linear => self.a * x + self.b,
            FitKind::PowerLaw => self.a * x.powf(self.b),
        }
    }
}
