//! Coordinate projections: finite sets of 1-based dimension indices used as
//! lookup keys into weight functions.

use std::collections::BTreeSet;
use std::fmt;

use crate::error::{MeritError, Result};

/// An immutable set of coordinate indices identifying a sub-lattice
/// projection. Indices are 1-based; index 0 is rejected.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Coordinates {
    indices: BTreeSet<usize>,
}

impl Coordinates {
    pub fn new<I: IntoIterator<Item = usize>>(indices: I) -> Result<Self> {
        let indices: BTreeSet<usize> = indices.into_iter().collect();
        if indices.contains(&0) {
            return Err(MeritError::InvalidParameters(
                "coordinate indices are 1-based".to_string(),
            ));
        }
        Ok(Self { indices })
    }

    /// The empty projection.
    pub fn empty() -> Self {
        Self {
            indices: BTreeSet::new(),
        }
    }

    /// The head projection `{1, ..., d}`.
    pub fn head(d: usize) -> Self {
        Self {
            indices: (1..=d).collect(),
        }
    }

    /// Number of participating coordinates.
    pub fn order(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    pub fn contains(&self, index: usize) -> bool {
        self.indices.contains(&index)
    }

    pub fn iter(&self) -> impl Iterator<Item = usize> + '_ {
        self.indices.iter().copied()
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (k, idx) in self.iter().enumerate() {
            if k > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", idx)?;
        }
        write!(f, "}}")
    }
}
