//! Console summary of an analysis run

use crate::convergence::ConvergencePoint;
use crate::optimizer::UnimodalityViolation;
use crate::pipeline::AnalysisReport;
use crate::{FitCoefficients, OptimalResult};
use tracing::{info, warn};

pub fn banner(title: &str) {
    info!("{}", "=".repeat(60));
    info!("{}", title);
    info!("{}", "=".repeat(60));
}

/// One-line description of a result row
pub fn describe_result(r: &OptimalResult) -> String {
    format!(
        "inring_satcount: {}, optimal_ring_count: {}, satcount_total: {}, max_total_mbps_per_total_satcount: {}, total_mbps_worst: {}, total_mbps_best: {}",
        r.n, r.r_opt, r.total_sat_count, r.max_mbps_per_sat, r.worst_mbps_at_opt, r.best_mbps_at_opt
    )
}

/// Log fits, threshold crossing and closed-form comparison
pub fn log_report(report: &AnalysisReport) {
    let fits = &report.fits;
    let analytical = &report.analytical;

    log_fit("Regression for mbps_per_sat vs optimal_ring", fits.mbps_per_sat_vs_r_opt);
    log_fit("Regression for optimal_ring vs inring", fits.r_opt_vs_n);

    match &report.threshold_hit {
        Some(hit) => info!("{}", describe_result(hit)),
        None => info!(
            "No configuration exceeds {} Mbps worst-case in the sampled range",
            report.config.target_mbps
        ),
    }

    log_fit("Fit for total_mbps_worst", fits.worst_power_law);
    log_fit("Fit for total_mbps_best", fits.best_power_law);
    info!(
        "Analytical Fit for total_mbps_worst: a={}, b={}",
        analytical.worst_power_law.a, analytical.worst_power_law.b
    );
    info!(
        "Analytical Fit for total_mbps_best: a={}, b={}",
        analytical.best_power_law.a, analytical.best_power_law.b
    );

    info!("");
    info!("alpha = {:.9}, K = {:e}", analytical.alpha, analytical.link_constant);
    info!(
        "  {:42} | {:>12} | {:>12} | {:>9} | {:>9}",
        "fit", "a (emp)", "a (closed)", "Δa rel", "Δb abs"
    );
    for cmp in report.comparisons() {
        info!(
            "  {:42} | {:>12.5e} | {:>12.5e} | {:>9.3e} | {:>9.3e}",
            cmp.label, cmp.empirical.a, cmp.analytical.a, cmp.a_rel_error, cmp.b_abs_error
        );
    }

    if report.bound_hits > 0 {
        warn!(
            "{} searches hit the ring bound R={}; their optima are unconfirmed",
            report.bound_hits, report.config.r_max
        );
    }
}

fn log_fit(title: &str, fit: Option<FitCoefficients>) {
    match fit {
        Some(fit) => info!("{}: a={}, b={}", title, fit.a, fit.b),
        None => warn!("{}: not enough variation in the sampled range to fit", title),
    }
}

pub fn log_convergence(points: &[ConvergencePoint]) {
    banner("EXPONENT CONVERGENCE");
    info!(
        "  {:>8} | {:>7} | {:>10} | {:>10} | {:>10} | {:>10}",
        "N_max", "samples", "b_worst", "|Δ| worst", "b_best", "|Δ| best"
    );
    for p in points {
        info!(
            "  {:>8} | {:>7} | {:>10.6} | {:>10.3e} | {:>10.6} | {:>10.3e}",
            p.n_max, p.samples, p.b_worst, p.b_worst_error, p.b_best, p.b_best_error
        );
        if p.bound_hits > 0 {
            warn!("  N_max={}: {} searches hit the ring bound", p.n_max, p.bound_hits);
        }
    }
}

pub fn log_violations(violations: &[UnimodalityViolation]) {
    if violations.is_empty() {
        info!("Early-stop search matches exhaustive scan for every sampled N");
        return;
    }
    warn!(
        "Early-stop search missed the global maximum for {} values of N",
        violations.len()
    );
    for v in violations.iter().take(10) {
        warn!(
            "  N={}: early R={} ({:.6e}) vs global R={} ({:.6e})",
            v.n, v.early_stop_r, v.early_stop_mbps_per_sat, v.global_r, v.global_mbps_per_sat
        );
    }
}
