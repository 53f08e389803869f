//! Theoretical bounds used to rescale a shortest-vector length into a
//! comparable figure of merit.
//!
//! Every criterion precomputes its bound table at construction, derived
//! from exact expressions: Hermite-style constants come from center
//! densities `delta_t` via `gamma_t = 4 * delta_t^(2/t)`, and the
//! `Gamma`-function factors are evaluated exactly for integer and
//! half-integer arguments. Bounds scale with the lattice determinant
//! through `log_density` (the natural log of the point density), since
//! `d_t* = sqrt(gamma_t) * det^(1/t)` for the L2-based criteria.

use std::f64::consts::PI;
use std::fmt;

use crate::basis::NormType;
use crate::error::{MeritError, Result};

/// Normalization criterion for the figure of merit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormaType {
    /// Best known lattice packing in each dimension.
    BestLat,
    /// Densest laminated lattice in each dimension.
    Laminated,
    /// Rogers-type bound on sphere-packing density.
    Rogers,
    /// Minkowski's bound on the shortest vector under the L2 norm.
    Minkowski,
    /// Minkowski's bound on the shortest vector under the L1 norm.
    MinkL1,
    /// Bound for the P_alpha criterion.
    Palpha,
    /// Trivial normalization when no useful constant is known.
    Generic,
}

impl fmt::Display for NormaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormaType::BestLat => write!(f, "best-lattice"),
            NormaType::Laminated => write!(f, "laminated"),
            NormaType::Rogers => write!(f, "Rogers"),
            NormaType::Minkowski => write!(f, "Minkowski"),
            NormaType::MinkL1 => write!(f, "Minkowski-L1"),
            NormaType::Palpha => write!(f, "P_alpha"),
            NormaType::Generic => write!(f, "generic"),
        }
    }
}

/// Precomputed table of per-dimension bounds for one criterion.
#[derive(Debug, Clone, PartialEq)]
pub struct Normalizer {
    norma: NormaType,
    bounds: Vec<f64>,
    norm: NormType,
}

impl Normalizer {
    /// Builds the bound table for dimensions `1..=max_dim`.
    ///
    /// `alpha` is consumed only by [`NormaType::Palpha`] (where it must be
    /// at least 2) and ignored otherwise. `log_density` is the natural log
    /// of the lattice point density; pass 0 for a unit-density lattice.
    /// Requesting a dimension beyond a table-backed criterion's range fails
    /// here rather than at lookup time.
    pub fn new(norma: NormaType, max_dim: usize, alpha: u32, log_density: f64) -> Result<Self> {
        if max_dim == 0 {
            return Err(MeritError::InvalidParameters(
                "normalizer needs at least dimension 1".to_string(),
            ));
        }
        if norma == NormaType::Palpha && alpha < 2 {
            return Err(MeritError::InvalidParameters(format!(
                "P_alpha bound requires alpha >= 2, got {}",
                alpha
            )));
        }
        let mut bounds = Vec::with_capacity(max_dim + 1);
        bounds.push(f64::NAN);
        for t in 1..=max_dim {
            bounds.push(compute_bound(norma, t, alpha, log_density)?);
        }
        let norm = match norma {
            NormaType::MinkL1 => NormType::L1,
            _ => NormType::L2,
        };
        Ok(Self {
            norma,
            bounds,
            norm,
        })
    }

    pub fn norma(&self) -> NormaType {
        self.norma
    }

    /// The vector norm the bounds apply to.
    pub fn norm(&self) -> NormType {
        self.norm
    }

    pub fn max_dim(&self) -> usize {
        self.bounds.len() - 1
    }

    /// The theoretical bound for `dim`. Dimensions outside the precomputed
    /// table are a configuration error, never a silent default.
    pub fn bound(&self, dim: usize) -> Result<f64> {
        if dim == 0 || dim >= self.bounds.len() {
            return Err(MeritError::MissingNormalizerBound {
                dim,
                norma: self.norma,
            });
        }
        Ok(self.bounds[dim])
    }
}

fn compute_bound(norma: NormaType, t: usize, alpha: u32, log_density: f64) -> Result<f64> {
    let tf = t as f64;
    let det_scale = (-log_density / tf).exp();
    let bound = match norma {
        NormaType::BestLat => {
            let delta = best_center_density(t).ok_or(MeritError::MissingNormalizerBound {
                dim: t,
                norma,
            })?;
            gamma_from_center_density(delta, t).sqrt() * det_scale
        }
        NormaType::Laminated => {
            let delta = laminated_center_density(t).ok_or(MeritError::MissingNormalizerBound {
                dim: t,
                norma,
            })?;
            gamma_from_center_density(delta, t).sqrt() * det_scale
        }
        NormaType::Rogers => {
            gamma_from_center_density(rogers_center_density(t), t).sqrt() * det_scale
        }
        NormaType::Minkowski => {
            // 2 * (det / V_t)^(1/t) with V_t the unit-ball volume
            2.0 * ((ln_gamma_half(t + 2) - 0.5 * tf * PI.ln()) / tf).exp() * det_scale
        }
        NormaType::MinkL1 => (ln_factorial(t) / tf).exp() * det_scale,
        NormaType::Palpha => {
            let base = 1.0 + 2.0 * zeta(alpha);
            (base.powi(t as i32) - 1.0) * (-log_density).exp()
        }
        NormaType::Generic => 1.0,
    };
    Ok(bound)
}

fn gamma_from_center_density(delta: f64, t: usize) -> f64 {
    4.0 * delta.powf(2.0 / t as f64)
}

/// Center density of the densest laminated lattice, as exact expressions.
/// Beyond dimension 24 no value is tabulated.
fn laminated_center_density(t: usize) -> Option<f64> {
    let s2 = std::f64::consts::SQRT_2;
    let s3 = 3f64.sqrt();
    let delta = match t {
        1 => 0.5,
        2 => 1.0 / (2.0 * s3),
        3 => 1.0 / (4.0 * s2),
        4 => 0.125,
        5 => 1.0 / (8.0 * s2),
        6 => 1.0 / (8.0 * s3),
        7 | 8 => 0.0625,
        9 => 1.0 / (16.0 * s2),
        10 => 1.0 / (16.0 * s3),
        11..=13 => 1.0 / (18.0 * s3),
        14 => 1.0 / (16.0 * s3),
        15 => 1.0 / (16.0 * s2),
        // from dimension 16 up to the Leech lattice the density doubles
        // every other dimension
        16..=24 => (2f64).powf((t as f64 - 24.0) / 2.0),
        _ => return None,
    };
    Some(delta)
}

/// Center density of the best known lattice packing. Matches the laminated
/// series except in dimension 12, where the Coxeter-Todd lattice is denser.
fn best_center_density(t: usize) -> Option<f64> {
    match t {
        12 => Some(1.0 / 27.0),
        _ => laminated_center_density(t),
    }
}

/// Rogers-type upper bound on the center density of any sphere packing,
/// `(t/2 + 1) * 2^(-t/2)` divided by the unit-ball volume.
fn rogers_center_density(t: usize) -> f64 {
    let tf = t as f64;
    let ln_delta = (0.5 * tf + 1.0).ln() - 0.5 * tf * 2f64.ln() - 0.5 * tf * PI.ln()
        + ln_gamma_half(t + 2);
    ln_delta.exp()
}

/// `ln Gamma(twice / 2)`, exact for integer and half-integer arguments:
/// `Gamma(n) = (n-1)!` and `Gamma(m + 1/2) = (2m)! sqrt(pi) / (4^m m!)`.
fn ln_gamma_half(twice: usize) -> f64 {
    if twice % 2 == 0 {
        ln_factorial(twice / 2 - 1)
    } else {
        let m = (twice - 1) / 2;
        0.5 * PI.ln() + ln_factorial(2 * m) - m as f64 * 4f64.ln() - ln_factorial(m)
    }
}

fn ln_factorial(n: usize) -> f64 {
    (2..=n).map(|k| (k as f64).ln()).sum()
}

/// Riemann zeta at integer `s >= 2` via Euler-Maclaurin with two
/// correction terms; accurate to well below 1e-12 in this range.
fn zeta(s: u32) -> f64 {
    let s = f64::from(s);
    let n: f64 = 20.0;
    let mut sum = 0.0;
    let mut k: f64 = 1.0;
    while k < n {
        sum += k.powf(-s);
        k += 1.0;
    }
    sum + n.powf(1.0 - s) / (s - 1.0) + 0.5 * n.powf(-s) + s * n.powf(-s - 1.0) / 12.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() <= 1e-12 * b.abs().max(1.0)
    }

    #[test]
    fn best_lattice_reproduces_known_constants() {
        let norma = Normalizer::new(NormaType::BestLat, 24, 0, 0.0).unwrap();
        // gamma_1 = 1, gamma_2 = 2/sqrt(3), gamma_4 = sqrt(2),
        // gamma_8 = 2 (E8), gamma_24 = 4 (Leech)
        assert!(close(norma.bound(1).unwrap().powi(2), 1.0));
        assert!(close(norma.bound(2).unwrap().powi(2), 2.0 / 3f64.sqrt()));
        assert!(close(norma.bound(4).unwrap().powi(2), 2f64.sqrt()));
        assert!(close(norma.bound(8).unwrap().powi(2), 2.0));
        assert!(close(norma.bound(24).unwrap().powi(2), 4.0));
        // Coxeter-Todd in dimension 12: gamma = 4/sqrt(3)
        assert!(close(norma.bound(12).unwrap().powi(2), 4.0 / 3f64.sqrt()));
    }

    #[test]
    fn laminated_differs_from_best_in_dim_12() {
        let best = Normalizer::new(NormaType::BestLat, 24, 0, 0.0).unwrap();
        let lam = Normalizer::new(NormaType::Laminated, 24, 0, 0.0).unwrap();
        assert!(lam.bound(12).unwrap() < best.bound(12).unwrap());
        for t in [1, 2, 8, 16, 24] {
            assert!(close(lam.bound(t).unwrap(), best.bound(t).unwrap()));
        }
    }

    #[test]
    fn rogers_dominates_best_known() {
        let best = Normalizer::new(NormaType::BestLat, 24, 0, 0.0).unwrap();
        let rogers = Normalizer::new(NormaType::Rogers, 24, 0, 0.0).unwrap();
        for t in 1..=24 {
            assert!(rogers.bound(t).unwrap() >= best.bound(t).unwrap());
        }
    }

    #[test]
    fn minkowski_l1_is_factorial_root() {
        let norma = Normalizer::new(NormaType::MinkL1, 6, 0, 0.0).unwrap();
        assert!(close(norma.bound(2).unwrap(), 2f64.sqrt()));
        assert!(close(norma.bound(3).unwrap(), 6f64.powf(1.0 / 3.0)));
        assert_eq!(norma.norm(), NormType::L1);
    }

    #[test]
    fn palpha_bound_at_dim_one() {
        let norma = Normalizer::new(NormaType::Palpha, 4, 2, 0.0).unwrap();
        // (1 + 2 zeta(2)) - 1 = pi^2 / 3
        let expected = PI * PI / 3.0;
        assert!((norma.bound(1).unwrap() - expected).abs() < 1e-9);
        assert!(Normalizer::new(NormaType::Palpha, 4, 1, 0.0).is_err());
        // alpha is ignored for other criteria
        assert!(Normalizer::new(NormaType::BestLat, 4, 0, 0.0).is_ok());
    }

    #[test]
    fn generic_is_trivial_but_bounded() {
        let norma = Normalizer::new(NormaType::Generic, 8, 0, 0.0).unwrap();
        for t in 1..=8 {
            assert_eq!(norma.bound(t).unwrap(), 1.0);
        }
        assert_eq!(
            norma.bound(9),
            Err(MeritError::MissingNormalizerBound {
                dim: 9,
                norma: NormaType::Generic
            })
        );
        assert!(norma.bound(0).is_err());
    }

    #[test]
    fn table_backed_criteria_reject_large_dimensions() {
        assert_eq!(
            Normalizer::new(NormaType::BestLat, 30, 0, 0.0),
            Err(MeritError::MissingNormalizerBound {
                dim: 25,
                norma: NormaType::BestLat
            })
        );
        // formula-backed criteria have no such ceiling
        assert!(Normalizer::new(NormaType::Rogers, 64, 0, 0.0).is_ok());
        assert!(Normalizer::new(NormaType::Minkowski, 64, 0, 0.0).is_ok());
    }

    #[test]
    fn log_density_scales_bounds() {
        let unit = Normalizer::new(NormaType::BestLat, 4, 0, 0.0).unwrap();
        let dense = Normalizer::new(NormaType::BestLat, 4, 0, 2f64.ln()).unwrap();
        for t in 1..=4 {
            let expected = unit.bound(t).unwrap() * (-(2f64.ln()) / t as f64).exp();
            assert!(close(dense.bound(t).unwrap(), expected));
        }
    }

    #[test]
    fn zeta_matches_known_values() {
        assert!((zeta(2) - PI * PI / 6.0).abs() < 1e-10);
        assert!((zeta(4) - PI.powi(4) / 90.0).abs() < 1e-10);
    }
}
