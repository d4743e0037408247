//! Relay Link Model
//!
//! Link-budget throughput for a multi-ring relay constellation spanning the
//! Earth–Mars gap. Each ring sits on a circular heliocentric orbit; traffic
//! hops between neighbouring satellites inside a ring and between rings.
//!
//! # Throughput Model
//!
//! ```text
//! worst(N, R) = K · N³ · R² / ((EM · N)² + (2π · D̄ · R)²)
//! best(N, R)  = K · N  · R² / EM²
//! K           = improvement · baseline_mbps · baseline_km²
//! ```
//!
//! | Symbol | Meaning |
//! |--------|---------|
//! | N      | Satellites per ring (in-ring satcount) |
//! | R      | Number of rings |
//! | EM     | Earth–Mars separation (Mars apoapsis − Earth periapsis) |
//! | D̄      | Mean Sun distance of the two reference orbits |
//!
//! The worst case combines geometric spreading between rings with the angular
//! dilution of satellites around each ring; the best case ignores the latter.

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use thiserror::Error;

/// Earth periapsis distance from the Sun in km
pub const SUN_DIST_EARTH_PERIAPSIS_KM: f64 = 150_000_000.0;

/// Mars apoapsis distance from the Sun in km
pub const SUN_DIST_MARS_APOAPSIS_KM: f64 = 240_000_000.0;

/// Reference link throughput in Mbps at `BASELINE_KM`
pub const BASELINE_MBPS: f64 = 100_000.0;

/// Reference link distance in km
pub const BASELINE_KM: f64 = 3_000.0;

/// Assumed terminal improvement over the reference link
pub const BASELINE_IMPROVEMENT: f64 = 10.0;

#[derive(Error, Debug, PartialEq)]
pub enum LinkModelError {
    #[error("Invalid constant {name}: {value} (must be finite and > 0)")]
    NonPositiveConstant { name: &'static str, value: f64 },
    #[error("Mars apoapsis ({apoapsis_km} km) must lie beyond Earth periapsis ({periapsis_km} km)")]
    InvertedOrbits { periapsis_km: f64, apoapsis_km: f64 },
}

pub type Result<T> = std::result::Result<T, LinkModelError>;

/// Physical constants of the relay network.
///
/// Built once at startup and borrowed by every component; nothing mutates it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConstantSet {
    pub sun_dist_earth_periapsis_km: f64,
    pub sun_dist_mars_apoapsis_km: f64,
    pub baseline_mbps: f64,
    pub baseline_km: f64,
    pub baseline_improvement: f64,
}

impl Default for ConstantSet {
    fn default() -> Self {
        Self {
            sun_dist_earth_periapsis_km: SUN_DIST_EARTH_PERIAPSIS_KM,
            sun_dist_mars_apoapsis_km: SUN_DIST_MARS_APOAPSIS_KM,
            baseline_mbps: BASELINE_MBPS,
            baseline_km: BASELINE_KM,
            baseline_improvement: BASELINE_IMPROVEMENT,
        }
    }
}

impl ConstantSet {
    pub fn new(
        sun_dist_earth_periapsis_km: f64,
        sun_dist_mars_apoapsis_km: f64,
        baseline_mbps: f64,
        baseline_km: f64,
        baseline_improvement: f64,
    ) -> Result<Self> {
        let constants = Self {
            sun_dist_earth_periapsis_km,
            sun_dist_mars_apoapsis_km,
            baseline_mbps,
            baseline_km,
            baseline_improvement,
        };
        constants.validate()?;
        Ok(constants)
    }

    /// Check every constant is positive and the orbits are ordered.
    ///
    /// Deserialized sets bypass [`ConstantSet::new`], so loaders call this.
    pub fn validate(&self) -> Result<()> {
        let fields = [
            ("sun_dist_earth_periapsis_km", self.sun_dist_earth_periapsis_km),
            ("sun_dist_mars_apoapsis_km", self.sun_dist_mars_apoapsis_km),
            ("baseline_mbps", self.baseline_mbps),
            ("baseline_km", self.baseline_km),
            ("baseline_improvement", self.baseline_improvement),
        ];
        for (name, value) in fields {
            if !(value.is_finite() && value > 0.0) {
                return Err(LinkModelError::NonPositiveConstant { name, value });
            }
        }
        if self.sun_dist_mars_apoapsis_km <= self.sun_dist_earth_periapsis_km {
            return Err(LinkModelError::InvertedOrbits {
                periapsis_km: self.sun_dist_earth_periapsis_km,
                apoapsis_km: self.sun_dist_mars_apoapsis_km,
            });
        }
        Ok(())
    }

    /// Mean of the two reference Sun distances (D̄)
    pub fn avg_sun_distance_km(&self) -> f64 {
        (self.sun_dist_earth_periapsis_km + self.sun_dist_mars_apoapsis_km) / 2.0
    }

    /// Earth–Mars baseline separation (EM)
    pub fn earth_mars_km(&self) -> f64 {
        self.sun_dist_mars_apoapsis_km - self.sun_dist_earth_periapsis_km
    }

    /// Aggregate link-budget constant K = improvement · Mbps · km²
    pub fn link_constant(&self) -> f64 {
        self.baseline_improvement * self.baseline_mbps * self.baseline_km.powi(2)
    }

    /// Circumference of the mean ring (2π · D̄)
    pub fn mean_ring_circumference_km(&self) -> f64 {
        2.0 * PI * self.avg_sun_distance_km()
    }
}

/// Total network throughput as a function of ring geometry.
///
/// Implementations must be pure and deterministic. The ring optimizer also
/// relies on a shape precondition: for fixed `n`, [`mbps_per_sat`] must be
/// unimodal in `r` (strictly increasing, then non-increasing). A model that
/// violates this makes the early-stop search return a local maximum.
pub trait LinkModel {
    /// Worst-case total throughput in Mbps (spreading plus angular dilution)
    fn worst_mbps(&self, n: u32, r: u32) -> f64;

    /// Best-case total throughput in Mbps (no angular dilution)
    fn best_mbps(&self, n: u32, r: u32) -> f64;
}

impl<M: LinkModel + ?Sized> LinkModel for &M {
    fn worst_mbps(&self, n: u32, r: u32) -> f64 {
        (**self).worst_mbps(n, r)
    }

    fn best_mbps(&self, n: u32, r: u32) -> f64 {
        (**self).best_mbps(n, r)
    }
}

/// Worst-case throughput divided by the total satellite count N·R
pub fn mbps_per_sat<M: LinkModel + ?Sized>(model: &M, n: u32, r: u32) -> f64 {
    model.worst_mbps(n, r) / (f64::from(n) * f64::from(r))
}

/// The physical relay-ring link model.
///
/// Per-satellite worst-case throughput is
/// `K·N²·R / ((EM·N)² + (2π·D̄·R)²)`, which has the form `R / (a + b·R²)`
/// with `a, b > 0`. Its derivative `(a − b·R²) / (a + b·R²)²` changes sign
/// exactly once, at `R* = EM·N / (2π·D̄)`, so the function is unimodal in R
/// and the early-stop ring search finds the global integer maximum.
#[derive(Debug, Clone, Copy)]
pub struct RelayLinkModel {
    link_constant: f64,
    earth_mars_km: f64,
    ring_circumference_km: f64,
}

impl RelayLinkModel {
    pub fn new(constants: &ConstantSet) -> Self {
        Self {
            link_constant: constants.link_constant(),
            earth_mars_km: constants.earth_mars_km(),
            ring_circumference_km: constants.mean_ring_circumference_km(),
        }
    }

    /// Real-valued ring count maximizing per-satellite throughput for `n`
    pub fn continuous_optimum(&self, n: u32) -> f64 {
        self.earth_mars_km * f64::from(n) / self.ring_circumference_km
    }
}

impl Default for RelayLinkModel {
    fn default() -> Self {
        Self::new(&ConstantSet::default())
    }
}

impl LinkModel for RelayLinkModel {
    fn worst_mbps(&self, n: u32, r: u32) -> f64 {
        let n = f64::from(n);
        let r = f64::from(r);
        let in_ring = self.earth_mars_km * n;
        let cross_ring = self.ring_circumference_km * r;
        self.link_constant * n.powi(3) * r.powi(2) / (in_ring.powi(2) + cross_ring.powi(2))
    }

    fn best_mbps(&self, n: u32, r: u32) -> f64 {
        let n = f64::from(n);
        let r = f64::from(r);
        self.link_constant * n * r.powi(2) / self.earth_mars_km.powi(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derived_constants() {
        let c = ConstantSet::default();
        assert_eq!(c.avg_sun_distance_km(), 195_000_000.0);
        assert_eq!(c.earth_mars_km(), 90_000_000.0);
        assert_eq!(c.link_constant(), 9.0e12);
    }

    #[test]
    fn test_new_rejects_non_positive() {
        let err = ConstantSet::new(150e6, 240e6, 0.0, 3000.0, 10.0).unwrap_err();
        assert_eq!(
            err,
            LinkModelError::NonPositiveConstant { name: "baseline_mbps", value: 0.0 }
        );

        let err = ConstantSet::new(150e6, 240e6, 1e5, f64::NAN, 10.0).unwrap_err();
        assert!(matches!(err, LinkModelError::NonPositiveConstant { name: "baseline_km", .. }));
    }

    #[test]
    fn test_new_rejects_inverted_orbits() {
        let err = ConstantSet::new(240e6, 150e6, 1e5, 3000.0, 10.0).unwrap_err();
        assert!(matches!(err, LinkModelError::InvertedOrbits { .. }));
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let c: ConstantSet = serde_json::from_str(r#"{"baseline_improvement": 20.0}"#).unwrap();
        assert_eq!(c.baseline_improvement, 20.0);
        assert_eq!(c.baseline_mbps, BASELINE_MBPS);
        assert!(c.validate().is_ok());
    }

    #[test]
    fn test_worst_below_best() {
        let model = RelayLinkModel::default();
        for (n, r) in [(20, 1), (20, 2), (700, 51), (5320, 391)] {
            assert!(model.worst_mbps(n, r) < model.best_mbps(n, r));
        }
    }

    #[test]
    fn test_worst_is_half_best_at_continuous_optimum() {
        // At R = alpha·N both denominator terms are equal
        let c = ConstantSet::default();
        let model = RelayLinkModel::new(&c);
        let n = 1000u32;
        let r_star = model.continuous_optimum(n);
        let n_f = f64::from(n);
        let k = c.link_constant();
        let em = c.earth_mars_km();
        let worst = k * n_f.powi(3) * r_star.powi(2) / (2.0 * (em * n_f).powi(2));
        let best = k * n_f * r_star.powi(2) / em.powi(2);
        assert!((worst * 2.0 - best).abs() / best < 1e-12);
    }

    #[test]
    fn test_known_value() {
        // N=700, R=51 crosses 1000 Mbps worst-case
        let model = RelayLinkModel::default();
        let worst = model.worst_mbps(700, 51);
        assert!((worst - 1019.78).abs() < 0.01, "worst = {}", worst);
        assert!(model.worst_mbps(680, 50) < 1000.0);
    }

    #[test]
    fn test_blanket_ref_impl() {
        let model = RelayLinkModel::default();
        let by_ref = &model;
        assert_eq!(by_ref.worst_mbps(40, 3), model.worst_mbps(40, 3));
        assert_eq!(mbps_per_sat(&by_ref, 40, 3), mbps_per_sat(&model, 40, 3));
    }
}

// ============================================================================
// Property-based Tests
// ============================================================================
