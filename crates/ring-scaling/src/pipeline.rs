//! End-to-end batch analysis

use crate::analytical::{AnalyticalFits, AnalyticalValidator, FitComparison};
use crate::fitter::{fitted_series, FittedPoint, ScalingFits, ScalingFitter};
use crate::optimizer::RingOptimizer;
use crate::{AnalysisConfig, OptimalResult, Result};
use relay_link_model::{LinkModel, RelayLinkModel};
use serde::Serialize;
use tracing::info;

/// Everything one analysis run produces
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub config: AnalysisConfig,
    /// Ordered by increasing N
    pub results: Vec<OptimalResult>,
    pub fits: ScalingFits,
    /// Power-law predictions aligned with `results`
    pub fitted: Vec<FittedPoint>,
    pub analytical: AnalyticalFits,
    /// First result whose worst-case throughput exceeds the target
    pub threshold_hit: Option<OptimalResult>,
    /// Searches that reached the ring bound
    pub bound_hits: usize,
}

impl AnalysisReport {
    pub fn comparisons(&self) -> Vec<FitComparison> {
        self.analytical.compare(&self.fits)
    }
}

/// Run search, fits and closed-form derivation for `model`.
///
/// Deterministic: the same model and config always give the same report.
/// Degenerate fits come back as `None` and the result table is kept.
pub fn run_analysis<M: LinkModel>(model: M, config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;

    let optimizer = RingOptimizer::new(model).with_r_max(config.r_max)?;
    let results = optimizer.sweep(&config.n_range)?;

    let fitter = ScalingFitter::new(config.target_mbps)?;
    let fits = fitter.fit(&results)?;
    let fitted = fitted_series(&results, &fits);
    let threshold_hit = fitter.first_exceeding(&results).copied();

    let analytical = AnalyticalValidator::new(&config.constants).derive();
    let bound_hits = results.iter().filter(|r| r.hit_scan_bound).count();

    info!(
        "Analysis complete: {} configurations, {} bound hits",
        results.len(),
        bound_hits
    );

    Ok(AnalysisReport {
        config: *config,
        results,
        fits,
        fitted,
        analytical,
        threshold_hit,
        bound_hits,
    })
}

/// [`run_analysis`] with the physical model built from the config's constants
pub fn run_relay_analysis(config: &AnalysisConfig) -> Result<AnalysisReport> {
    config.validate()?;
    run_analysis(RelayLinkModel::new(&config.constants), config)
}
