//! Basis reduction: the contract the analysis driver consumes, plus a
//! default LLL reducer with bounded deep insertions.

use log::{debug, trace};
use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive};

use crate::basis::Basis;
use crate::error::{MeritError, Result};

/// Outcome of a reduction run. Non-convergence is an expected result, not
/// an error; the basis may be left reduced but not fully converged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReductionStatus {
    Converged,
    Aborted,
}

/// Contract for basis-reduction algorithms.
///
/// `fact` is the reduction quality factor (closer to 1 demands tighter
/// reduction before a candidate shortest vector is accepted) and
/// `block_size` bounds the algorithm's block granularity. Implementations
/// must be deterministic for fixed inputs and must leave every cached norm
/// in `[0, dim)` fresh on return, converged or not.
pub trait Reducer {
    fn reduce(&mut self, basis: &mut Basis, fact: f64, block_size: usize)
        -> Result<ReductionStatus>;
}

/// Counters collected during one LLL run.
#[derive(Debug, Clone, Default)]
pub struct LllStats {
    pub size_reductions: usize,
    pub swaps: usize,
    pub deep_insertions: usize,
    pub iterations: usize,
}

/// LLL reduction with deep insertions bounded by the `block_size` window.
///
/// Gram-Schmidt data is kept in floating point while every basis update is
/// applied exactly to the integer vectors, so the reduced basis generates
/// the same lattice as the input. Numerical degeneracy (entries whose
/// squares overflow `f64`, or a rank-deficient block) and an exhausted
/// iteration budget both surface as [`ReductionStatus::Aborted`].
#[derive(Debug, Clone)]
pub struct LllReducer {
    max_iterations: usize,
    stats: LllStats,
}

impl LllReducer {
    pub fn new() -> Self {
        Self::with_iteration_budget(100_000)
    }

    pub fn with_iteration_budget(max_iterations: usize) -> Self {
        Self {
            max_iterations,
            stats: LllStats::default(),
        }
    }

    /// Counters from the most recent run.
    pub fn stats(&self) -> &LllStats {
        &self.stats
    }
}

impl Default for LllReducer {
    fn default() -> Self {
        Self::new()
    }
}

impl Reducer for LllReducer {
    fn reduce(
        &mut self,
        basis: &mut Basis,
        fact: f64,
        block_size: usize,
    ) -> Result<ReductionStatus> {
        if !(fact > 0.25 && fact < 1.0) {
            return Err(MeritError::InvalidParameters(format!(
                "reduction factor must lie in (0.25, 1), got {}",
                fact
            )));
        }
        if block_size == 0 {
            return Err(MeritError::InvalidParameters(
                "block size must be at least 1".to_string(),
            ));
        }
        let dim = basis.dim();
        if dim == 0 {
            return Err(MeritError::InvalidParameters(
                "basis has no active vectors".to_string(),
            ));
        }

        self.stats = LllStats::default();
        debug!(
            "LLL: dim {}, factor {}, insertion window {}",
            dim, fact, block_size
        );

        if dim == 1 {
            basis.update_vec_norms();
            return Ok(ReductionStatus::Converged);
        }

        let mut rows = match float_rows(basis, dim)? {
            Some(rows) => rows,
            None => return abort(basis, "entries not representable in f64"),
        };
        let mut mu = vec![vec![0.0; dim]; dim];
        let mut bstar_sq = vec![0.0; dim];
        if !compute_gso(&rows, &mut mu, &mut bstar_sq) {
            return abort(basis, "degenerate orthogonalization");
        }

        let mut k = 1;
        while k < dim {
            self.stats.iterations += 1;
            if self.stats.iterations > self.max_iterations {
                return abort(basis, "iteration budget exhausted");
            }

            // size-reduce vector k against k-1 .. 0
            for j in (0..k).rev() {
                let q = mu[k][j].round();
                if q != 0.0 {
                    let qi = match BigInt::from_f64(q) {
                        Some(qi) => qi,
                        None => return abort(basis, "projection coefficient overflow"),
                    };
                    basis.sub_scaled(k, j, &qi)?;
                    for c in 0..=j {
                        mu[k][c] -= q * mu[j][c];
                    }
                    self.stats.size_reductions += 1;
                }
            }
            // resync row k from the exact integer vector before deciding
            // where it belongs
            if !resync_row(basis, dim, k, &mut rows)? || !compute_gso(&rows, &mut mu, &mut bstar_sq)
            {
                return abort(basis, "degenerate orthogonalization");
            }

            // deep-insertion scan over the allowed window: walk the squared
            // projected length of vector k and stop at the first position
            // where the quality condition fails
            let lo = k.saturating_sub(block_size);
            let mut c = dot(&rows[k], &rows[k]);
            for j in 0..lo {
                c -= mu[k][j] * mu[k][j] * bstar_sq[j];
            }
            if !c.is_finite() {
                return abort(basis, "projected length overflow");
            }
            let mut insert_at = None;
            for i in lo..k {
                if c >= fact * bstar_sq[i] {
                    c -= mu[k][i] * mu[k][i] * bstar_sq[i];
                } else {
                    insert_at = Some(i);
                    break;
                }
            }

            match insert_at {
                None => k += 1,
                Some(i) => {
                    for t in (i..k).rev() {
                        basis.permute(t, t + 1)?;
                    }
                    rows[i..=k].rotate_right(1);
                    if i + 1 == k {
                        self.stats.swaps += 1;
                    } else {
                        self.stats.deep_insertions += 1;
                    }
                    trace!("moved vector {} to position {}", k, i);
                    if !compute_gso(&rows, &mut mu, &mut bstar_sq) {
                        return abort(basis, "degenerate orthogonalization");
                    }
                    k = i.max(1);
                }
            }
        }

        basis.update_vec_norms();
        debug!(
            "LLL converged after {} iterations: {} size reductions, {} swaps, {} deep insertions",
            self.stats.iterations,
            self.stats.size_reductions,
            self.stats.swaps,
            self.stats.deep_insertions
        );
        Ok(ReductionStatus::Converged)
    }
}

/// Aborting still honors the contract: every active norm is left fresh.
fn abort(basis: &mut Basis, reason: &str) -> Result<ReductionStatus> {
    debug!("LLL aborted: {}", reason);
    basis.update_vec_norms();
    Ok(ReductionStatus::Aborted)
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Active block of the basis as `f64` rows; `None` when an entry has no
/// finite representation.
fn float_rows(basis: &Basis, dim: usize) -> Result<Option<Vec<Vec<f64>>>> {
    let mut rows = Vec::with_capacity(dim);
    for i in 0..dim {
        let vec = basis.vector(i)?;
        let mut row = Vec::with_capacity(dim);
        for entry in &vec[..dim] {
            match entry.to_f64() {
                Some(x) if x.is_finite() => row.push(x),
                _ => return Ok(None),
            }
        }
        rows.push(row);
    }
    Ok(Some(rows))
}

fn resync_row(basis: &Basis, dim: usize, k: usize, rows: &mut [Vec<f64>]) -> Result<bool> {
    let vec = basis.vector(k)?;
    for (c, entry) in vec[..dim].iter().enumerate() {
        match entry.to_f64() {
            Some(x) if x.is_finite() => rows[k][c] = x,
            _ => return Ok(false),
        }
    }
    Ok(true)
}

/// Full Gram-Schmidt recomputation. Returns `false` on a non-finite or
/// rank-deficient result.
fn compute_gso(rows: &[Vec<f64>], mu: &mut [Vec<f64>], bstar_sq: &mut [f64]) -> bool {
    let n = rows.len();
    let mut bstar: Vec<Vec<f64>> = Vec::with_capacity(n);
    for i in 0..n {
        let mut v = rows[i].clone();
        mu[i][i] = 1.0;
        for j in 0..i {
            let m = dot(&rows[i], &bstar[j]) / bstar_sq[j];
            if !m.is_finite() {
                return false;
            }
            mu[i][j] = m;
            for c in 0..n {
                v[c] -= m * bstar[j][c];
            }
        }
        bstar_sq[i] = dot(&v, &v);
        if !bstar_sq[i].is_finite() || bstar_sq[i] <= 0.0 {
            return false;
        }
        bstar.push(v);
    }
    true
}
