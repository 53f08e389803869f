use thiserror::Error;

use crate::normalizer::NormaType;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum MeritError {
    #[error("norm of vector {index} is stale and must be recomputed before use")]
    StaleNormAccess { index: usize },

    #[error("index {index} out of range for basis of capacity {max}")]
    DimensionOutOfRange { index: usize, max: usize },

    #[error("no {norma} bound precomputed for dimension {dim}")]
    MissingNormalizerBound { dim: usize, norma: NormaType },

    #[error("no weight configured for projection order {order}")]
    MissingWeightEntry { order: usize },

    #[error("malformed configuration: {0}")]
    MalformedConfiguration(String),

    #[error("invalid parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, MeritError>;
