//! Closed-form scaling laws
//!
//! Setting d(Mbps/sat)/dR = 0 gives `R_opt = α·N` with
//! `α = EM / (2π·D̄)`. Then `S = N·R_opt = α·N²` and substituting back:
//!
//! ```text
//! worst_opt = K·√α / (2·EM²) · S^1.5
//! best_opt  = K·√α / EM²     · S^1.5
//! ```
//!
//! These hold asymptotically; integer R and small N pull the empirical fit
//! away from them.

use crate::{FitCoefficients, ScalingFits};
use relay_link_model::ConstantSet;
use serde::{Deserialize, Serialize};

/// Exponent of both closed-form power laws
pub const ASYMPTOTIC_EXPONENT: f64 = 1.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AnalyticalFits {
    /// α, the proportionality constant R_opt = α·N
    pub alpha: f64,
    /// K = improvement · baseline_mbps · baseline_km²
    pub link_constant: f64,
    pub worst_power_law: FitCoefficients,
    pub best_power_law: FitCoefficients,
    /// max_mbps_per_sat = K/(2·EM²) · R_opt
    pub mbps_per_sat_vs_r_opt: FitCoefficients,
    /// R_opt = α · N
    pub r_opt_vs_n: FitCoefficients,
}

/// Empirical and closed-form coefficients side by side
#[derive(Debug, Clone, Serialize)]
pub struct FitComparison {
    pub label: &'static str,
    pub empirical: FitCoefficients,
    pub analytical: FitCoefficients,
    pub a_rel_error: f64,
    pub b_abs_error: f64,
}

pub struct AnalyticalValidator<'a> {
    constants: &'a ConstantSet,
}

impl<'a> AnalyticalValidator<'a> {
    pub fn new(constants: &'a ConstantSet) -> Self {
        Self { constants }
    }

    pub fn alpha(&self) -> f64 {
        self.constants.earth_mars_km() / self.constants.mean_ring_circumference_km()
    }

    /// Derive every coefficient from the constants alone
    pub fn derive(&self) -> AnalyticalFits {
        let alpha = self.alpha();
        let k = self.constants.link_constant();
        let em_sq = self.constants.earth_mars_km().powi(2);

        AnalyticalFits {
            alpha,
            link_constant: k,
            worst_power_law: FitCoefficients::power_law(
                k * alpha.sqrt() / (2.0 * em_sq),
                ASYMPTOTIC_EXPONENT,
            ),
            best_power_law: FitCoefficients::power_law(k * alpha.sqrt() / em_sq, ASYMPTOTIC_EXPONENT),
            mbps_per_sat_vs_r_opt: FitCoefficients::linear(k / (2.0 * em_sq), 0.0),
            r_opt_vs_n: FitCoefficients::linear(alpha, 0.0),
        }
    }
}

impl AnalyticalFits {
    /// Pair each empirical fit with its closed form. No tolerance is applied;
    /// degenerate empirical fits are left out.
    pub fn compare(&self, empirical: &ScalingFits) -> Vec<FitComparison> {
        let analytical = [
            self.mbps_per_sat_vs_r_opt,
            self.r_opt_vs_n,
            self.worst_power_law,
            self.best_power_law,
        ];

        empirical
            .labelled()
            .into_iter()
            .zip(analytical)
            .filter_map(|((label, empirical), analytical)| {
                empirical.map(|empirical| FitComparison {
                    label,
                    empirical,
                    analytical,
                    a_rel_error: (empirical.a - analytical.a).abs() / analytical.a.abs(),
                    b_abs_error: (empirical.b - analytical.b).abs(),
                })
            })
            .collect()
    }
}
