//! Construction of weight functions from structured configuration.
//!
//! Composite weights have mandatory members: a `pod` entry without both its
//! `order-dependent` and `product` members is a construction error, never a
//! default-filled one.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::error::{MeritError, Result};
use crate::weights::{OrderDependentWeights, PODWeights, ProductWeights, Weights};

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OrderDependentConfig {
    /// Weight per projection order.
    #[serde(default)]
    pub weights: BTreeMap<usize, f64>,
    /// Fallback for orders with no entry; omit to make misses an error.
    #[serde(default)]
    pub default: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductConfig {
    /// Weight per coordinate index (1-based).
    #[serde(default)]
    pub weights: BTreeMap<usize, f64>,
    /// Multiplier for coordinates with no entry; defaults to 1.
    #[serde(default)]
    pub default: Option<f64>,
}

/// Structured description of a weight function.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum WeightsConfig {
    OrderDependent(OrderDependentConfig),
    Product(ProductConfig),
    Pod {
        #[serde(rename = "order-dependent")]
        order_dependent: Option<OrderDependentConfig>,
        product: Option<ProductConfig>,
    },
}

pub fn build_order_dependent(config: &OrderDependentConfig) -> Result<OrderDependentWeights> {
    let mut weights = OrderDependentWeights::new();
    for (&order, &w) in &config.weights {
        weights.set_weight_for_order(order, w)?;
    }
    if let Some(d) = config.default {
        weights.set_default_weight(d)?;
    }
    Ok(weights)
}

pub fn build_product(config: &ProductConfig) -> Result<ProductWeights> {
    let mut weights = ProductWeights::new();
    for (&index, &w) in &config.weights {
        weights.set_weight_for_coordinate(index, w)?;
    }
    if let Some(d) = config.default {
        weights.set_default_weight(d)?;
    }
    Ok(weights)
}

/// Builds the weight function a configuration describes.
pub fn build_weights(config: &WeightsConfig) -> Result<Box<dyn Weights>> {
    match config {
        WeightsConfig::OrderDependent(c) => Ok(Box::new(build_order_dependent(c)?)),
        WeightsConfig::Product(c) => Ok(Box::new(build_product(c)?)),
        WeightsConfig::Pod {
            order_dependent,
            product,
        } => {
            let od = order_dependent.as_ref().ok_or_else(|| {
                MeritError::MalformedConfiguration(
                    "pod weights require an `order-dependent` member".to_string(),
                )
            })?;
            let pw = product.as_ref().ok_or_else(|| {
                MeritError::MalformedConfiguration(
                    "pod weights require a `product` member".to_string(),
                )
            })?;
            Ok(Box::new(PODWeights::new(
                build_order_dependent(od)?,
                build_product(pw)?,
            )))
        }
    }
}

/// Parses a JSON weight configuration and builds the weight function.
pub fn weights_from_json(text: &str) -> Result<Box<dyn Weights>> {
    let config: WeightsConfig = serde_json::from_str(text)
        .map_err(|e| MeritError::MalformedConfiguration(e.to_string()))?;
    build_weights(&config)
}
