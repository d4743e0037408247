//! Optimal ring-count search
//!
//! For a fixed in-ring satellite count N, walks R = 1, 2, … and stops at the
//! first ring count whose per-satellite throughput fails to beat the running
//! maximum.
//!
//! # Precondition
//!
//! `mbps_per_sat(N, ·)` must be unimodal in R (rising, then non-increasing).
//! [`relay_link_model::RelayLinkModel`] satisfies this analytically. For other
//! models the early stop can return a local maximum; [`RingOptimizer::verify_unimodal`]
//! compares against an exhaustive scan to catch that.

use crate::{NRange, OptimalResult, Result, ScalingError, DEFAULT_R_MAX};
use relay_link_model::{mbps_per_sat, LinkModel};
use tracing::{debug, info, warn};

/// Outcome of one ring search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RingOptimum {
    pub r_opt: u32,
    pub max_mbps_per_sat: f64,
    /// The scan reached `r_max` while the value was still rising
    pub hit_scan_bound: bool,
}

/// Early-stop search disagreeing with the exhaustive scan for one N
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnimodalityViolation {
    pub n: u32,
    pub early_stop_r: u32,
    pub early_stop_mbps_per_sat: f64,
    pub global_r: u32,
    pub global_mbps_per_sat: f64,
}

pub struct RingOptimizer<M> {
    model: M,
    r_max: u32,
}

impl<M: LinkModel> RingOptimizer<M> {
    pub fn new(model: M) -> Self {
        Self {
            model,
            r_max: DEFAULT_R_MAX,
        }
    }

    /// Override the largest ring count evaluated per search
    pub fn with_r_max(mut self, r_max: u32) -> Result<Self> {
        if r_max == 0 {
            return Err(ScalingError::ZeroScanBound);
        }
        self.r_max = r_max;
        Ok(self)
    }

    pub fn r_max(&self) -> u32 {
        self.r_max
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    /// Find the ring count maximizing worst-case throughput per satellite
    pub fn optimize(&self, n: u32) -> Result<RingOptimum> {
        if n == 0 {
            return Err(ScalingError::ZeroInRingCount);
        }

        let mut best_r = 1;
        let mut best = mbps_per_sat(&self.model, n, 1);

        for r in 2..=self.r_max {
            let value = mbps_per_sat(&self.model, n, r);
            if value > best {
                best = value;
                best_r = r;
            } else {
                return Ok(RingOptimum {
                    r_opt: best_r,
                    max_mbps_per_sat: best,
                    hit_scan_bound: false,
                });
            }
        }

        Ok(RingOptimum {
            r_opt: best_r,
            max_mbps_per_sat: best,
            hit_scan_bound: true,
        })
    }

    /// Scan every R in 1..=r_max; the first global maximum wins ties
    pub fn optimize_exhaustive(&self, n: u32) -> Result<RingOptimum> {
        if n == 0 {
            return Err(ScalingError::ZeroInRingCount);
        }

        let mut best_r = 1;
        let mut best = mbps_per_sat(&self.model, n, 1);
        for r in 2..=self.r_max {
            let value = mbps_per_sat(&self.model, n, r);
            if value > best {
                best = value;
                best_r = r;
            }
        }

        Ok(RingOptimum {
            r_opt: best_r,
            max_mbps_per_sat: best,
            hit_scan_bound: best_r == self.r_max,
        })
    }

    /// Run the search for one N and evaluate both throughput bounds at R_opt
    pub fn evaluate(&self, n: u32) -> Result<OptimalResult> {
        let optimum = self.optimize(n)?;
        let r = optimum.r_opt;

        if optimum.hit_scan_bound {
            debug!(
                "N={}: ring scan hit bound R={} before per-satellite throughput peaked",
                n, self.r_max
            );
        }

        let result = OptimalResult {
            n,
            r_opt: r,
            total_sat_count: u64::from(n) * u64::from(r),
            max_mbps_per_sat: optimum.max_mbps_per_sat,
            worst_mbps_at_opt: self.model.worst_mbps(n, r),
            best_mbps_at_opt: self.model.best_mbps(n, r),
            hit_scan_bound: optimum.hit_scan_bound,
        };

        debug!(
            "N={} R_opt={} sats={} mbps/sat={:.6e} worst={:.6e} best={:.6e}",
            n,
            r,
            result.total_sat_count,
            result.max_mbps_per_sat,
            result.worst_mbps_at_opt,
            result.best_mbps_at_opt
        );

        Ok(result)
    }

    /// One [`OptimalResult`] per sampled N, ordered by increasing N
    pub fn sweep(&self, range: &NRange) -> Result<Vec<OptimalResult>> {
        range.validate()?;
        info!(
            "Searching optimal ring count for N={}..={} step {} (R ≤ {})",
            range.min, range.max, range.step, self.r_max
        );

        let results = range
            .iter()
            .map(|n| self.evaluate(n))
            .collect::<Result<Vec<_>>>()?;

        let bound_hits = results.iter().filter(|r| r.hit_scan_bound).count();
        if bound_hits > 0 {
            warn!(
                "{} of {} searches hit the ring bound R={}; raise r_max to confirm their optima",
                bound_hits,
                results.len(),
                self.r_max
            );
        }
        info!("Computed {} optimal ring configurations", results.len());

        Ok(results)
    }

    /// Compare the early-stop search with an exhaustive scan for every sampled N
    pub fn verify_unimodal(&self, range: &NRange) -> Result<Vec<UnimodalityViolation>> {
        range.validate()?;
        let mut violations = Vec::new();

        for n in range.iter() {
            let early = self.optimize(n)?;
            let global = self.optimize_exhaustive(n)?;
            if global.max_mbps_per_sat > early.max_mbps_per_sat {
                warn!(
                    "N={}: early stop at R={} ({:.6e}) but global maximum at R={} ({:.6e})",
                    n, early.r_opt, early.max_mbps_per_sat, global.r_opt, global.max_mbps_per_sat
                );
                violations.push(UnimodalityViolation {
                    n,
                    early_stop_r: early.r_opt,
                    early_stop_mbps_per_sat: early.max_mbps_per_sat,
                    global_r: global.r_opt,
                    global_mbps_per_sat: global.max_mbps_per_sat,
                });
            }
        }

        info!(
            "Unimodality check over {} values of N: {} violations",
            range.len(),
            violations.len()
        );
        Ok(violations)
    }
}


// ============================================================================
// Property-based Tests
// ============================================================================
