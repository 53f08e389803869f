//! Structural-quality evaluation of point lattices used for quasi-Monte
//! Carlo integration and pseudorandom-number generation.
//!
//! Given a lattice basis, the crate produces a scalar figure of merit
//! summarizing how uniformly the lattice points fill space: a [`Reducer`]
//! shortens the basis and exposes the shortest-vector length, a
//! [`Normalizer`] rescales that length against a dimension-dependent
//! theoretical bound, and a [`Weights`] function combines per-projection
//! contributions. [`LatticeAnalysis`] ties the three together.
//!
//! ```
//! use latmerit::{Basis, LatticeAnalysis, LllReducer, NormaType, NormType};
//! use num_bigint::BigInt;
//!
//! let vecs = vec![
//!     vec![BigInt::from(1), BigInt::from(12)],
//!     vec![BigInt::from(0), BigInt::from(101)],
//! ];
//! let basis = Basis::from_vectors(vecs, NormType::L2).unwrap();
//! let mut analysis =
//!     LatticeAnalysis::new(basis, LllReducer::new(), NormaType::BestLat, 0).unwrap();
//! if analysis.perform_test(0.999999, 20).unwrap() {
//!     println!("merit: {}", analysis.merit().unwrap());
//! }
//! ```

pub mod analysis;
pub mod basis;
pub mod config;
pub mod coordinates;
pub mod error;
pub mod normalizer;
pub mod reducer;
pub mod weights;

pub use analysis::{perform_tests_parallel, LatticeAnalysis};
pub use basis::{Basis, NormType};
pub use config::{
    build_weights, weights_from_json, OrderDependentConfig, ProductConfig, WeightsConfig,
};
pub use coordinates::Coordinates;
pub use error::{MeritError, Result};
pub use normalizer::{NormaType, Normalizer};
pub use reducer::{LllReducer, LllStats, Reducer, ReductionStatus};
pub use weights::{OrderDependentWeights, PODWeights, ProductWeights, Weights};
