//! Orchestration of reduction, normalization and weighting into a single
//! figure of merit per test invocation.

use log::debug;
use num_traits::ToPrimitive;
use rayon::prelude::*;

use crate::basis::{Basis, NormType};
use crate::coordinates::Coordinates;
use crate::error::{MeritError, Result};
use crate::normalizer::{NormaType, Normalizer};
use crate::reducer::{Reducer, ReductionStatus};
use crate::weights::Weights;

/// Drives a [`Reducer`] over an owned [`Basis`] and rescales the resulting
/// shortest-vector length by the [`Normalizer`] bound for the active
/// dimension.
///
/// The recorded merit is undefined until a test succeeds and is overwritten
/// by each successful call. A test that returns `Ok(false)` was interrupted
/// by the reducer and left the merit untouched; callers must check the
/// boolean before trusting [`LatticeAnalysis::merit`].
#[derive(Debug)]
pub struct LatticeAnalysis<R: Reducer> {
    basis: Basis,
    reducer: R,
    norma_type: NormaType,
    normalizer: Normalizer,
    merit: Option<f64>,
}

impl<R: Reducer> LatticeAnalysis<R> {
    /// Sets up an analysis for a unit-density lattice. `alpha` is consumed
    /// only by the `Palpha` criterion.
    pub fn new(basis: Basis, reducer: R, norma: NormaType, alpha: u32) -> Result<Self> {
        Self::with_log_density(basis, reducer, norma, alpha, 0.0)
    }

    /// Same, for a lattice of known point density (natural log).
    pub fn with_log_density(
        mut basis: Basis,
        reducer: R,
        norma: NormaType,
        alpha: u32,
        log_density: f64,
    ) -> Result<Self> {
        let normalizer = Normalizer::new(norma, basis.max_dim(), alpha, log_density)?;
        // lengths must be measured in the norm the bounds apply to
        basis.set_norm(normalizer.norm());
        Ok(Self {
            basis,
            reducer,
            norma_type: norma,
            normalizer,
            merit: None,
        })
    }

    /// The merit recorded by the last successful test.
    pub fn merit(&self) -> Option<f64> {
        self.merit
    }

    pub fn basis(&self) -> &Basis {
        &self.basis
    }

    pub fn basis_mut(&mut self) -> &mut Basis {
        &mut self.basis
    }

    pub fn norma_type(&self) -> NormaType {
        self.norma_type
    }

    pub fn normalizer(&self) -> &Normalizer {
        &self.normalizer
    }

    /// Runs one test at the basis's current dimension.
    ///
    /// Returns `Ok(true)` and records the merit on success, `Ok(false)`
    /// when the reducer gave up (the previous merit, if any, is kept).
    pub fn perform_test(&mut self, fact: f64, block_size: usize) -> Result<bool> {
        check_params(fact, block_size)?;
        let dim = self.basis.dim();
        // fail on configuration problems before any reduction work starts
        let bound = self.normalizer.bound(dim)?;

        match self.reducer.reduce(&mut self.basis, fact, block_size)? {
            ReductionStatus::Aborted => {
                debug!("test at dim {} interrupted by the reducer", dim);
                Ok(false)
            }
            ReductionStatus::Converged => {
                let merit = self.raw_shortest_length()? / bound;
                debug!(
                    "test at dim {}: merit {} ({} normalization)",
                    dim, merit, self.norma_type
                );
                self.merit = Some(merit);
                Ok(true)
            }
        }
    }

    /// Runs one test per dimension in `[min_dim, max_dim]` and combines the
    /// normalized values into a weighted minimum, weighting dimension `d`
    /// by the head projection `{1, ..., d}`.
    ///
    /// An interruption at any dimension abandons the whole run with
    /// `Ok(false)`; the previous merit and the basis's original dimension
    /// are restored.
    pub fn perform_weighted_test(
        &mut self,
        weights: &dyn Weights,
        min_dim: usize,
        max_dim: usize,
        fact: f64,
        block_size: usize,
    ) -> Result<bool> {
        check_params(fact, block_size)?;
        if min_dim == 0 || min_dim > max_dim {
            return Err(MeritError::InvalidParameters(format!(
                "empty dimension range [{}, {}]",
                min_dim, max_dim
            )));
        }
        if max_dim > self.basis.max_dim() {
            return Err(MeritError::DimensionOutOfRange {
                index: max_dim,
                max: self.basis.max_dim(),
            });
        }
        // surface configuration errors before reducing anything
        for d in min_dim..=max_dim {
            self.normalizer.bound(d)?;
            weights.weight(&Coordinates::head(d))?;
        }

        let saved_dim = self.basis.dim();
        let outcome = self.weighted_inner(weights, min_dim, max_dim, fact, block_size);
        self.basis.set_dim(saved_dim)?;
        let merit = outcome?;
        match merit {
            Some(m) => {
                self.merit = Some(m);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn weighted_inner(
        &mut self,
        weights: &dyn Weights,
        min_dim: usize,
        max_dim: usize,
        fact: f64,
        block_size: usize,
    ) -> Result<Option<f64>> {
        let mut aggregate = f64::INFINITY;
        for d in min_dim..=max_dim {
            self.basis.set_dim(d)?;
            match self.reducer.reduce(&mut self.basis, fact, block_size)? {
                ReductionStatus::Aborted => {
                    debug!("weighted test interrupted at dim {}", d);
                    return Ok(None);
                }
                ReductionStatus::Converged => {
                    let normalized = self.raw_shortest_length()? / self.normalizer.bound(d)?;
                    let weight = weights.weight(&Coordinates::head(d))?;
                    aggregate = aggregate.min(weight * normalized);
                }
            }
        }
        Ok(Some(aggregate))
    }

    /// Shortest-vector length in the scale the normalizer expects: the
    /// square root of the cached squared length under `L2`, except for the
    /// `Palpha` criterion which is defined on squared lengths.
    fn raw_shortest_length(&self) -> Result<f64> {
        let shortest = self.basis.shortest_vec_norm()?;
        let value = shortest
            .to_f64()
            .filter(|v| v.is_finite())
            .ok_or_else(|| {
                MeritError::InvalidParameters(
                    "shortest-vector length not representable in f64".to_string(),
                )
            })?;
        let raw = match (self.basis.norm_kind(), self.norma_type) {
            (NormType::L2, NormaType::Palpha) => value,
            (NormType::L2, _) => value.sqrt(),
            _ => value,
        };
        Ok(raw)
    }
}

fn check_params(fact: f64, block_size: usize) -> Result<()> {
    if !(fact > 0.0 && fact < 1.0) {
        return Err(MeritError::InvalidParameters(format!(
            "precision factor must lie in (0, 1), got {}",
            fact
        )));
    }
    if block_size == 0 {
        return Err(MeritError::InvalidParameters(
            "block size must be at least 1".to_string(),
        ));
    }
    Ok(())
}

/// Runs `perform_test` on many independent analyses in parallel. Each
/// analysis owns its basis and reducer, which is the only safe unit of
/// parallelism; a single basis is never shared.
pub fn perform_tests_parallel<R>(
    analyses: &mut [LatticeAnalysis<R>],
    fact: f64,
    block_size: usize,
) -> Vec<Result<bool>>
where
    R: Reducer + Send,
{
    analyses
        .par_iter_mut()
        .map(|analysis| analysis.perform_test(fact, block_size))
        .collect()
}
