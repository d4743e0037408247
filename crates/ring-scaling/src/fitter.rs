//! Scaling-law fits over the optimizer's result table
//!
//! Four independent least-squares fits, all over the full result sequence:
//!
//! | Fit | Model | x | y |
//! |-----|-------|---|---|
//! | 1 | linear | R_opt | Mbps per satellite |
//! | 2 | linear | N | R_opt |
//! | 3 | power law | N·R_opt | worst-case Mbps |
//! | 4 | power law | N·R_opt | best-case Mbps |
//!
//! A fit with fewer than two points or constant x is left empty and the
//! others still run. A non-positive value in a power-law fit is an error.

use crate::regression::{linear_fit, power_law_fit};
use crate::{FitCoefficients, OptimalResult, Result, ScalingError, DEFAULT_TARGET_MBPS};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

pub const LABEL_MBPS_PER_SAT_VS_R_OPT: &str = "Regression mbps_per_sat vs optimal_ring";
pub const LABEL_R_OPT_VS_N: &str = "Regression optimal_ring vs inring";
pub const LABEL_WORST_POWER_LAW: &str = "Fit total_mbps_worst";
pub const LABEL_BEST_POWER_LAW: &str = "Fit total_mbps_best";

/// Empirical fits derived from one sweep; `None` marks a degenerate fit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalingFits {
    /// max_mbps_per_sat = a·R_opt + b
    pub mbps_per_sat_vs_r_opt: Option<FitCoefficients>,
    /// R_opt = a·N + b
    pub r_opt_vs_n: Option<FitCoefficients>,
    /// worst_mbps = a·(N·R_opt)^b
    pub worst_power_law: Option<FitCoefficients>,
    /// best_mbps = a·(N·R_opt)^b
    pub best_power_law: Option<FitCoefficients>,
}

impl ScalingFits {
    /// Fits in export order with their table descriptions
    pub fn labelled(&self) -> [(&'static str, Option<FitCoefficients>); 4] {
        [
            (LABEL_MBPS_PER_SAT_VS_R_OPT, self.mbps_per_sat_vs_r_opt),
            (LABEL_R_OPT_VS_N, self.r_opt_vs_n),
            (LABEL_WORST_POWER_LAW, self.worst_power_law),
            (LABEL_BEST_POWER_LAW, self.best_power_law),
        ]
    }
}

/// Power-law predictions for one result row
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FittedPoint {
    pub fitted_worst: Option<f64>,
    pub fitted_best: Option<f64>,
}

#[derive(Debug, Clone, Copy)]
pub struct ScalingFitter {
    target_mbps: f64,
}

impl Default for ScalingFitter {
    fn default() -> Self {
        Self {
            target_mbps: DEFAULT_TARGET_MBPS,
        }
    }
}

impl ScalingFitter {
    pub fn new(target_mbps: f64) -> Result<Self> {
        if !(target_mbps.is_finite() && target_mbps >= 0.0) {
            return Err(ScalingError::InvalidTarget(target_mbps));
        }
        Ok(Self { target_mbps })
    }

    pub fn target_mbps(&self) -> f64 {
        self.target_mbps
    }

    /// Run all four fits over the full result sequence
    pub fn fit(&self, results: &[OptimalResult]) -> Result<ScalingFits> {
        let n: Vec<f64> = results.iter().map(|r| f64::from(r.n)).collect();
        let r_opt: Vec<f64> = results.iter().map(|r| f64::from(r.r_opt)).collect();
        let per_sat: Vec<f64> = results.iter().map(|r| r.max_mbps_per_sat).collect();
        let sats: Vec<f64> = results.iter().map(|r| r.total_sat_count as f64).collect();
        let worst: Vec<f64> = results.iter().map(|r| r.worst_mbps_at_opt).collect();
        let best: Vec<f64> = results.iter().map(|r| r.best_mbps_at_opt).collect();

        let fits = ScalingFits {
            mbps_per_sat_vs_r_opt: skip_degenerate(
                LABEL_MBPS_PER_SAT_VS_R_OPT,
                linear_fit(&r_opt, &per_sat),
            )?,
            r_opt_vs_n: skip_degenerate(LABEL_R_OPT_VS_N, linear_fit(&n, &r_opt))?,
            worst_power_law: skip_degenerate(LABEL_WORST_POWER_LAW, power_law_fit(&sats, &worst))?,
            best_power_law: skip_degenerate(LABEL_BEST_POWER_LAW, power_law_fit(&sats, &best))?,
        };

        info!("Fitted scaling laws over {} optimal configurations", results.len());
        for (label, fit) in fits.labelled() {
            if let Some(fit) = fit {
                debug!("{}: a={:e} b={:e} r²={:?}", label, fit.a, fit.b, fit.r_squared);
            }
        }

        Ok(fits)
    }

    /// First result whose worst-case throughput exceeds the target.
    ///
    /// A forward scan: relies on worst-case throughput rising with N, which
    /// the physical model gives but nothing here checks.
    pub fn first_exceeding<'a>(&self, results: &'a [OptimalResult]) -> Option<&'a OptimalResult> {
        first_exceeding(results, self.target_mbps)
    }
}

/// Turn a degenerate fit into `None`; every other error still propagates
fn skip_degenerate(
    label: &str,
    fit: Result<FitCoefficients>,
) -> Result<Option<FitCoefficients>> {
    match fit {
        Ok(fit) => Ok(Some(fit)),
        Err(ScalingError::DegenerateFit(reason)) => {
            warn!("{} skipped: {}", label, reason);
            Ok(None)
        }
        Err(e) => Err(e),
    }
}

/// First entry with `worst_mbps_at_opt > target_mbps`, scanning in order
pub fn first_exceeding(results: &[OptimalResult], target_mbps: f64) -> Option<&OptimalResult> {
    results.iter().find(|r| r.worst_mbps_at_opt > target_mbps)
}

/// Evaluate both power-law fits at every row's total satellite count
pub fn fitted_series(results: &[OptimalResult], fits: &ScalingFits) -> Vec<FittedPoint> {
    results
        .iter()
        .map(|r| {
            let sats = r.total_sat_count as f64;
            FittedPoint {
                fitted_worst: fits.worst_power_law.map(|fit| fit.predict(sats)),
                fitted_best: fits.best_power_law.map(|fit| fit.predict(sats)),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimizer::RingOptimizer;
    use crate::{FitKind, NRange};
    use relay_link_model::{ConstantSet, RelayLinkModel};

    fn synthetic(n: u32, r_opt: u32, worst: f64) -> OptimalResult {
        OptimalResult {
            n,
            r_opt,
            total_sat_count: u64::from(n) * u64::from(r_opt),
            max_mbps_per_sat: worst / (f64::from(n) * f64::from(r_opt)),
            worst_mbps_at_opt: worst,
            best_mbps_at_opt: worst * 2.0,
            hit_scan_bound: false,
        }
    }

    fn sweep(range: NRange) -> Vec<OptimalResult> {
        RingOptimizer::new(RelayLinkModel::default()).sweep(&range).unwrap()
    }

    #[test]
    fn test_threshold_scan_returns_first_exceeding() {
        let results: Vec<OptimalResult> = [10.0, 50.0, 200.0, 1500.0]
            .iter()
            .enumerate()
            .map(|(i, &w)| synthetic(20 * (i as u32 + 1), 1, w))
            .collect();

        let hit = ScalingFitter::new(1000.0).unwrap().first_exceeding(&results).unwrap();
        assert_eq!(hit.worst_mbps_at_opt, 1500.0);
        assert_eq!(hit.n, 80);
    }

    #[test]
    fn test_threshold_scan_strictly_greater() {
        let results = vec![synthetic(20, 1, 1000.0), synthetic(40, 1, 1000.5)];
        assert_eq!(first_exceeding(&results, 1000.0).unwrap().n, 40);
        assert!(first_exceeding(&results, 5000.0).is_none());
        assert!(first_exceeding(&[], 1.0).is_none());
    }

    #[test]
    fn test_r_opt_vs_n_recovers_alpha() {
        // Zero-noise data with R_opt = alpha·N exactly
        let alpha = 0.25;
        let results: Vec<OptimalResult> = (1..=40u32)
            .map(|i| {
                let n = 4 * i;
                synthetic(n, (alpha * f64::from(n)) as u32, f64::from(n).powi(3))
            })
            .collect();

        let fits = ScalingFitter::default().fit(&results).unwrap();
        let r_opt_vs_n = fits.r_opt_vs_n.unwrap();
        assert!((r_opt_vs_n.a - alpha).abs() < 1e-12);
        assert!(r_opt_vs_n.b.abs() < 1e-9);
        assert_eq!(r_opt_vs_n.kind, FitKind::Linear);
    }

    #[test]
    fn test_relay_sweep_fits_match_closed_form() {
        let c = ConstantSet::default();
        let results = sweep(NRange::default());
        let fits = ScalingFitter::default().fit(&results).unwrap();
        let worst = fits.worst_power_law.unwrap();
        let best = fits.best_power_law.unwrap();

        let alpha = c.earth_mars_km() / c.mean_ring_circumference_km();
        assert!((fits.r_opt_vs_n.unwrap().a - alpha).abs() / alpha < 1e-3);

        let per_sat_slope = c.link_constant() / (2.0 * c.earth_mars_km().powi(2));
        let per_sat = fits.mbps_per_sat_vs_r_opt.unwrap();
        assert!((per_sat.a - per_sat_slope).abs() / per_sat_slope < 1e-3);

        assert!((worst.b - 1.5).abs() < 0.01);
        assert!((best.b - 1.5).abs() < 0.01);
        assert_eq!(worst.kind, FitKind::PowerLaw);
    }

    #[test]
    fn test_power_law_reconstruction_large_n() {
        let results = sweep(NRange::new(1000, 5320, 20).unwrap());
        let fits = ScalingFitter::default().fit(&results).unwrap();
        let fitted = fitted_series(&results, &fits);

        assert_eq!(fitted.len(), results.len());
        for (row, point) in results.iter().zip(&fitted) {
            let worst_err =
                (point.fitted_worst.unwrap() - row.worst_mbps_at_opt).abs() / row.worst_mbps_at_opt;
            let best_err =
                (point.fitted_best.unwrap() - row.best_mbps_at_opt).abs() / row.best_mbps_at_opt;
            assert!(worst_err < 0.05, "N={} worst err {}", row.n, worst_err);
            assert!(best_err < 0.05, "N={} best err {}", row.n, best_err);
        }
    }

    #[test]
    fn test_threshold_on_relay_sweep() {
        let results = sweep(NRange::default());
        let hit = ScalingFitter::default().first_exceeding(&results).unwrap();
        assert_eq!(hit.n, 700);
        assert_eq!(hit.r_opt, 51);
    }

    #[test]
    fn test_single_point_leaves_every_fit_empty() {
        let results = vec![synthetic(20, 1, 10.0)];
        let fits = ScalingFitter::default().fit(&results).unwrap();
        assert!(fits.labelled().iter().all(|(_, fit)| fit.is_none()));

        let fitted = fitted_series(&results, &fits);
        assert_eq!(fitted[0].fitted_worst, None);
        assert_eq!(fitted[0].fitted_best, None);
    }

    #[test]
    fn test_constant_r_opt_skips_only_first_fit() {
        // N=1..=6 all land on R_opt = 1
        let results = sweep(NRange::new(1, 6, 1).unwrap());
        assert!(results.iter().all(|r| r.r_opt == 1));

        let fits = ScalingFitter::default().fit(&results).unwrap();
        assert!(fits.mbps_per_sat_vs_r_opt.is_none());
        let r_opt_vs_n = fits.r_opt_vs_n.unwrap();
        assert_eq!(r_opt_vs_n.a, 0.0);
        assert_eq!(r_opt_vs_n.b, 1.0);
        assert!(fits.worst_power_law.is_some());
        assert!(fits.best_power_law.is_some());
    }

    #[test]
    fn test_fit_rejects_zero_throughput() {
        let mut results = vec![synthetic(20, 1, 10.0), synthetic(40, 2, 20.0), synthetic(60, 3, 30.0)];
        results[1].worst_mbps_at_opt = 0.0;
        assert!(matches!(
            ScalingFitter::default().fit(&results),
            Err(ScalingError::NonPositiveLogInput { index: 1, .. })
        ));
    }

    #[test]
    fn test_invalid_target() {
        assert!(ScalingFitter::new(f64::NAN).is_err());
        assert!(ScalingFitter::new(-1.0).is_err());
        assert_eq!(ScalingFitter::new(0.0).unwrap().target_mbps(), 0.0);
    }

    #[test]
    fn test_labelled_order() {
        let results = sweep(NRange::new(20, 400, 20).unwrap());
        let fits = ScalingFitter::default().fit(&results).unwrap();
        let labels: Vec<&str> = fits.labelled().iter().map(|(l, _)| *l).collect();
        assert_eq!(
            labels,
            vec![
                LABEL_MBPS_PER_SAT_VS_R_OPT,
                LABEL_R_OPT_VS_N,
                LABEL_WORST_POWER_LAW,
                LABEL_BEST_POWER_LAW
            ]
        );
    }
}
