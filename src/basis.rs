//! Lattice basis with incrementally maintained vector norms.
//!
//! A [`Basis`] owns a square matrix of extended-precision coordinates
//! together with a cached length per vector. Reduction code mutates vectors
//! in place and invalidates the affected cache entries; readers either get a
//! fresh value or an explicit [`MeritError::StaleNormAccess`], never a wrong
//! number. Entries may exceed 2^500, so lengths are accumulated in arbitrary
//! precision rather than floating point.

use std::fmt;

use num_bigint::{BigInt, BigUint};
use num_traits::{One, Zero};

use crate::error::{MeritError, Result};

/// Norm used to measure the length of basis vectors.
///
/// For `X = (x_1, ..., x_t)`:
/// `Sup` is `max |x_i|`, `L1` is `sum |x_i|`, `L2` is the Euclidean norm
/// (cached as the exact squared length), and `Zaremba` is
/// `prod max(1, |x_i|)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NormType {
    Sup,
    L1,
    L2,
    Zaremba,
}

impl fmt::Display for NormType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NormType::Sup => write!(f, "sup"),
            NormType::L1 => write!(f, "L1"),
            NormType::L2 => write!(f, "L2"),
            NormType::Zaremba => write!(f, "Zaremba"),
        }
    }
}

/// Basis of actual dimension `dim`, allocated for `max_dim` vectors of
/// `max_dim` coordinates each.
///
/// Cached lengths live in `norms`; `None` means the entry is stale and must
/// be recomputed before use. Lengths are measured over the first `dim`
/// coordinates of each vector. For [`NormType::L2`] the cache holds the
/// squared length, which keeps it an exact integer.
#[derive(Debug, Clone)]
pub struct Basis {
    vecs: Vec<Vec<BigInt>>,
    norms: Vec<Option<BigUint>>,
    dim: usize,
    max_dim: usize,
    norm: NormType,
}

impl Basis {
    /// Builds an identity basis of actual dimension `dim` and capacity
    /// `max_dim`. All cached norms start stale.
    pub fn new(dim: usize, max_dim: usize, norm: NormType) -> Result<Self> {
        if max_dim == 0 {
            return Err(MeritError::InvalidParameters(
                "basis capacity must be at least 1".to_string(),
            ));
        }
        if dim > max_dim {
            return Err(MeritError::DimensionOutOfRange {
                index: dim,
                max: max_dim,
            });
        }
        let mut vecs = vec![vec![BigInt::zero(); max_dim]; max_dim];
        for (i, row) in vecs.iter_mut().enumerate() {
            row[i] = BigInt::one();
        }
        Ok(Self {
            vecs,
            norms: vec![None; max_dim],
            dim,
            max_dim,
            norm,
        })
    }

    /// Builds a basis from caller-supplied vectors. The matrix must be
    /// square and non-empty; the actual dimension starts at full capacity.
    pub fn from_vectors(vecs: Vec<Vec<BigInt>>, norm: NormType) -> Result<Self> {
        let max_dim = vecs.len();
        if max_dim == 0 {
            return Err(MeritError::InvalidParameters(
                "basis must contain at least one vector".to_string(),
            ));
        }
        for (i, row) in vecs.iter().enumerate() {
            if row.len() != max_dim {
                return Err(MeritError::InvalidParameters(format!(
                    "vector {} has {} coordinates, expected {}",
                    i,
                    row.len(),
                    max_dim
                )));
            }
        }
        Ok(Self {
            vecs,
            norms: vec![None; max_dim],
            dim: max_dim,
            max_dim,
            norm,
        })
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn max_dim(&self) -> usize {
        self.max_dim
    }

    pub fn norm_kind(&self) -> NormType {
        self.norm
    }

    /// Sets the actual dimension. Storage is not resized and cache entries
    /// at or beyond `d` are left untouched.
    pub fn set_dim(&mut self, d: usize) -> Result<()> {
        if d > self.max_dim {
            return Err(MeritError::DimensionOutOfRange {
                index: d,
                max: self.max_dim,
            });
        }
        self.dim = d;
        Ok(())
    }

    /// Switches the norm used for subsequent length computations. Cached
    /// lengths are in the old metric, so every vector becomes stale.
    pub fn set_norm(&mut self, norm: NormType) {
        if self.norm != norm {
            self.norm = norm;
            self.invalidate_norms();
        }
    }

    /// Marks every cached norm stale.
    pub fn invalidate_norms(&mut self) {
        for entry in &mut self.norms {
            *entry = None;
        }
    }

    /// Marks vector `j`'s cached norm stale.
    pub fn invalidate_norm(&mut self, j: usize) -> Result<()> {
        self.check_index(j)?;
        self.norms[j] = None;
        Ok(())
    }

    /// Whether vector `i`'s cached norm must be recomputed before use.
    pub fn is_norm_stale(&self, i: usize) -> Result<bool> {
        self.check_index(i)?;
        Ok(self.norms[i].is_none())
    }

    /// Cached length of vector `i` (squared length under `L2`).
    pub fn vec_norm(&self, i: usize) -> Result<&BigUint> {
        self.check_index(i)?;
        self.norms[i]
            .as_ref()
            .ok_or(MeritError::StaleNormAccess { index: i })
    }

    /// Force-sets vector `i`'s cached length and clears its staleness.
    ///
    /// No consistency check against the vector's actual coordinates is
    /// performed; a caller that sets a value not matching the current norm
    /// kind and contents corrupts every later read.
    pub fn set_vec_norm(&mut self, value: BigUint, i: usize) -> Result<()> {
        self.check_index(i)?;
        self.norms[i] = Some(value);
        Ok(())
    }

    /// Recomputes every cached length in `[0, dim)` under the current norm.
    pub fn update_vec_norms(&mut self) {
        self.update_vec_norms_from(0);
    }

    /// Recomputes cached lengths in `[d, dim)`, leaving earlier entries
    /// untouched. Used after a reduction step that only perturbed a suffix.
    pub fn update_vec_norms_from(&mut self, d: usize) {
        for i in d..self.dim {
            self.norms[i] = Some(compute_norm(&self.vecs[i], self.dim, self.norm));
        }
    }

    /// Recomputes the squared Euclidean length of vector `d`, bypassing the
    /// norm-kind dispatch. Only meaningful while the basis norm is `L2`.
    pub fn update_sq_l2_norm(&mut self, d: usize) -> Result<()> {
        self.check_index(d)?;
        self.norms[d] = Some(sq_l2_norm(&self.vecs[d], self.dim));
        Ok(())
    }

    /// Same as [`Basis::update_sq_l2_norm`] for every index in the
    /// inclusive range `[d1, d2]`.
    pub fn update_sq_l2_norms(&mut self, d1: usize, d2: usize) -> Result<()> {
        if d1 > d2 {
            return Err(MeritError::InvalidParameters(format!(
                "empty update range [{}, {}]",
                d1, d2
            )));
        }
        self.check_index(d2)?;
        for d in d1..=d2 {
            self.norms[d] = Some(sq_l2_norm(&self.vecs[d], self.dim));
        }
        Ok(())
    }

    /// Exchanges vectors `i` and `j` together with their cached norms, as
    /// one indivisible operation.
    pub fn permute(&mut self, i: usize, j: usize) -> Result<()> {
        self.check_index(i)?;
        self.check_index(j)?;
        self.vecs.swap(i, j);
        self.norms.swap(i, j);
        Ok(())
    }

    /// Read access to vector `i`'s coordinates.
    pub fn vector(&self, i: usize) -> Result<&[BigInt]> {
        self.check_index(i)?;
        Ok(&self.vecs[i])
    }

    /// Mutable access to vector `i`'s coordinates. The cached norm is
    /// invalidated before the borrow is handed out, so a mutation can never
    /// leave a fresh cache behind.
    pub fn vector_mut(&mut self, i: usize) -> Result<&mut [BigInt]> {
        self.check_index(i)?;
        self.norms[i] = None;
        Ok(&mut self.vecs[i])
    }

    /// Applies `vector[target] -= factor * vector[source]` and invalidates
    /// the target's cached norm. The operation spans all allocated
    /// coordinates, so raising the dimension afterwards still sees a
    /// consistent generating set.
    pub fn sub_scaled(&mut self, target: usize, source: usize, factor: &BigInt) -> Result<()> {
        self.check_index(target)?;
        self.check_index(source)?;
        if target == source {
            return Err(MeritError::InvalidParameters(
                "row operation with identical source and target".to_string(),
            ));
        }
        self.norms[target] = None;
        for c in 0..self.max_dim {
            let delta = factor * &self.vecs[source][c];
            self.vecs[target][c] -= delta;
        }
        Ok(())
    }

    /// Smallest fresh cached norm over the active vectors. Fails if the
    /// basis is empty or any needed cache entry is stale.
    pub fn shortest_vec_norm(&self) -> Result<BigUint> {
        if self.dim == 0 {
            return Err(MeritError::InvalidParameters(
                "basis has no active vectors".to_string(),
            ));
        }
        let mut shortest: Option<&BigUint> = None;
        for i in 0..self.dim {
            let norm = self.vec_norm(i)?;
            match shortest {
                Some(s) if s <= norm => {}
                _ => shortest = Some(norm),
            }
        }
        // dim >= 1, so the loop assigned at least once
        Ok(shortest.cloned().unwrap_or_default())
    }

    /// Renders vector `i`'s active coordinates as text.
    pub fn vector_string(&self, i: usize) -> Result<String> {
        self.check_index(i)?;
        Ok(self.fmt_vector(i))
    }

    fn fmt_vector(&self, i: usize) -> String {
        let parts: Vec<String> = self.vecs[i][..self.dim]
            .iter()
            .map(|x| x.to_string())
            .collect();
        format!("[{}]", parts.join(" "))
    }

    fn check_index(&self, i: usize) -> Result<()> {
        if i >= self.max_dim {
            return Err(MeritError::DimensionOutOfRange {
                index: i,
                max: self.max_dim,
            });
        }
        Ok(())
    }
}

impl fmt::Display for Basis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "basis (dim {}, capacity {}, norm {})",
            self.dim, self.max_dim, self.norm
        )?;
        for i in 0..self.dim {
            writeln!(f, "  {}", self.fmt_vector(i))?;
        }
        Ok(())
    }
}

/// Length of `vec`'s first `dim` coordinates under `kind`. Squared length
/// for `L2`.
fn compute_norm(vec: &[BigInt], dim: usize, kind: NormType) -> BigUint {
    let coords = vec[..dim].iter();
    match kind {
        NormType::Sup => coords
            .map(|x| x.magnitude())
            .max()
            .cloned()
            .unwrap_or_default(),
        NormType::L1 => coords.fold(BigUint::zero(), |acc, x| acc + x.magnitude()),
        NormType::L2 => sq_l2_norm(vec, dim),
        NormType::Zaremba => {
            let one = BigUint::one();
            coords.fold(BigUint::one(), |acc, x| {
                let m = x.magnitude();
                if *m > one {
                    acc * m
                } else {
                    acc
                }
            })
        }
    }
}

fn sq_l2_norm(vec: &[BigInt], dim: usize) -> BigUint {
    vec[..dim]
        .iter()
        .fold(BigUint::zero(), |acc, x| acc + x.magnitude() * x.magnitude())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn bigs(rows: &[&[i64]]) -> Vec<Vec<BigInt>> {
        rows.iter()
            .map(|r| r.iter().map(|&x| BigInt::from(x)).collect())
            .collect()
    }

    #[test]
    fn identity_norms_after_update() {
        let mut basis = Basis::new(3, 5, NormType::L2).unwrap();
        for i in 0..5 {
            assert!(basis.is_norm_stale(i).unwrap());
        }
        basis.update_vec_norms();
        for i in 0..3 {
            assert!(!basis.is_norm_stale(i).unwrap());
            assert_eq!(*basis.vec_norm(i).unwrap(), BigUint::one());
        }
        // entries beyond dim were never touched
        assert!(basis.is_norm_stale(3).unwrap());
    }

    #[test]
    fn stale_read_is_rejected() {
        let basis = Basis::new(2, 2, NormType::L2).unwrap();
        assert_eq!(
            basis.vec_norm(0),
            Err(MeritError::StaleNormAccess { index: 0 })
        );
    }

    #[test]
    fn set_norm_invalidates_everything() {
        let mut basis = Basis::new(3, 3, NormType::L2).unwrap();
        basis.update_vec_norms();
        basis.set_norm(NormType::L1);
        for i in 0..3 {
            assert!(basis.is_norm_stale(i).unwrap());
        }
        // same kind again is a no-op
        basis.update_vec_norms();
        basis.set_norm(NormType::L1);
        assert!(!basis.is_norm_stale(0).unwrap());
    }

    #[test]
    fn norm_kinds_on_sample_vector() {
        let vecs = bigs(&[&[3, -4, 0], &[1, 0, 0], &[0, 0, 1]]);
        let mut basis = Basis::from_vectors(vecs, NormType::Sup).unwrap();
        basis.update_vec_norms();
        assert_eq!(*basis.vec_norm(0).unwrap(), BigUint::from(4u32));

        basis.set_norm(NormType::L1);
        basis.update_vec_norms();
        assert_eq!(*basis.vec_norm(0).unwrap(), BigUint::from(7u32));

        basis.set_norm(NormType::L2);
        basis.update_vec_norms();
        assert_eq!(*basis.vec_norm(0).unwrap(), BigUint::from(25u32));

        basis.set_norm(NormType::Zaremba);
        basis.update_vec_norms();
        assert_eq!(*basis.vec_norm(0).unwrap(), BigUint::from(12u32));
    }

    #[test]
    fn huge_entries_stay_exact() {
        let big: BigInt = BigInt::from(1u8) << 600;
        let vecs = vec![
            vec![big.clone(), BigInt::zero()],
            vec![BigInt::zero(), BigInt::one()],
        ];
        let mut basis = Basis::from_vectors(vecs, NormType::L2).unwrap();
        basis.update_vec_norms();
        assert_eq!(*basis.vec_norm(0).unwrap(), BigUint::from(1u8) << 1200);
    }

    #[test]
    fn partial_update_leaves_prefix_untouched() {
        let vecs = bigs(&[&[2, 0, 0], &[0, 3, 0], &[0, 0, 4]]);
        let mut basis = Basis::from_vectors(vecs, NormType::L2).unwrap();
        basis.update_vec_norms();
        basis.set_vec_norm(BigUint::from(999u32), 0).unwrap();
        basis.update_vec_norms_from(1);
        assert_eq!(*basis.vec_norm(0).unwrap(), BigUint::from(999u32));
        assert_eq!(*basis.vec_norm(1).unwrap(), BigUint::from(9u32));
        assert_eq!(*basis.vec_norm(2).unwrap(), BigUint::from(16u32));
    }

    #[test]
    fn sq_l2_fast_path_range() {
        let vecs = bigs(&[&[1, 1], &[3, 4]]);
        let mut basis = Basis::from_vectors(vecs, NormType::L2).unwrap();
        basis.update_sq_l2_norms(0, 1).unwrap();
        assert_eq!(*basis.vec_norm(0).unwrap(), BigUint::from(2u32));
        assert_eq!(*basis.vec_norm(1).unwrap(), BigUint::from(25u32));
        assert!(basis.update_sq_l2_norms(1, 0).is_err());
    }

    #[test]
    fn permute_moves_cache_with_vectors() {
        let vecs = bigs(&[&[1, 0], &[3, 4]]);
        let mut basis = Basis::from_vectors(vecs, NormType::L2).unwrap();
        basis.update_sq_l2_norm(0).unwrap();
        basis.permute(0, 1).unwrap();
        // vector [3,4] moved to slot 0 with its stale flag
        assert!(basis.is_norm_stale(0).unwrap());
        assert_eq!(*basis.vec_norm(1).unwrap(), BigUint::from(1u32));
        assert_eq!(*basis.vector(0).unwrap(), [BigInt::from(3), BigInt::from(4)]);
    }

    #[test]
    fn vector_mut_invalidates() {
        let mut basis = Basis::new(2, 2, NormType::L2).unwrap();
        basis.update_vec_norms();
        basis.vector_mut(1).unwrap()[0] = BigInt::from(7);
        assert!(basis.is_norm_stale(1).unwrap());
        assert!(!basis.is_norm_stale(0).unwrap());
    }

    #[test]
    fn sub_scaled_row_operation() {
        let vecs = bigs(&[&[1, 2], &[3, 4]]);
        let mut basis = Basis::from_vectors(vecs, NormType::L2).unwrap();
        basis.update_vec_norms();
        basis.sub_scaled(1, 0, &BigInt::from(3)).unwrap();
        assert_eq!(
            *basis.vector(1).unwrap(),
            [BigInt::from(0), BigInt::from(-2)]
        );
        assert!(basis.is_norm_stale(1).unwrap());
        assert!(basis.sub_scaled(0, 0, &BigInt::one()).is_err());
    }

    #[test]
    fn shortest_norm_needs_fresh_cache() {
        let vecs = bigs(&[&[5, 0], &[0, 2]]);
        let mut basis = Basis::from_vectors(vecs, NormType::L2).unwrap();
        assert!(matches!(
            basis.shortest_vec_norm(),
            Err(MeritError::StaleNormAccess { .. })
        ));
        basis.update_vec_norms();
        assert_eq!(basis.shortest_vec_norm().unwrap(), BigUint::from(4u32));
    }

    #[test]
    fn out_of_range_access_fails() {
        let basis = Basis::new(2, 2, NormType::L2).unwrap();
        assert_eq!(
            basis.is_norm_stale(2),
            Err(MeritError::DimensionOutOfRange { index: 2, max: 2 })
        );
        assert!(Basis::new(3, 2, NormType::L2).is_err());
        assert!(Basis::from_vectors(bigs(&[&[1, 2]]), NormType::L2).is_err());
    }

    #[test]
    fn set_dim_bounds_and_cache() {
        let mut basis = Basis::new(2, 4, NormType::L2).unwrap();
        basis.update_vec_norms();
        basis.set_dim(4).unwrap();
        // the two new slots were never computed
        assert!(basis.is_norm_stale(2).unwrap());
        assert!(basis.is_norm_stale(3).unwrap());
        assert!(basis.set_dim(5).is_err());
    }

    #[test]
    fn display_lists_active_vectors() {
        let vecs = bigs(&[&[1, 0], &[3, 4]]);
        let mut basis = Basis::from_vectors(vecs, NormType::L2).unwrap();
        let text = basis.to_string();
        assert!(text.contains("[1 0]"));
        assert!(text.contains("[3 4]"));
        basis.set_dim(1).unwrap();
        assert!(!basis.to_string().contains("3"));
        assert_eq!(basis.vector_string(0).unwrap(), "[1]");
    }

    proptest! {
        #[test]
        fn permute_is_its_own_inverse(
            entries in proptest::collection::vec(-1000i64..1000, 16),
            i in 0usize..4,
            j in 0usize..4,
            refresh in proptest::collection::vec(proptest::bool::ANY, 4),
        ) {
            let rows: Vec<Vec<BigInt>> = entries
                .chunks(4)
                .map(|c| c.iter().map(|&x| BigInt::from(x)).collect())
                .collect();
            let mut basis = Basis::from_vectors(rows, NormType::L2).unwrap();
            for (k, &fresh) in refresh.iter().enumerate() {
                if fresh {
                    basis.update_sq_l2_norm(k).unwrap();
                }
            }
            let before = basis.clone();
            basis.permute(i, j).unwrap();
            basis.permute(i, j).unwrap();
            for k in 0..4 {
                prop_assert_eq!(basis.vector(k).unwrap(), before.vector(k).unwrap());
                prop_assert_eq!(
                    basis.is_norm_stale(k).unwrap(),
                    before.is_norm_stale(k).unwrap()
                );
                if !basis.is_norm_stale(k).unwrap() {
                    prop_assert_eq!(basis.vec_norm(k).unwrap(), before.vec_norm(k).unwrap());
                }
            }
        }
    }
}
