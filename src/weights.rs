//! Projection weights: map a coordinate projection to a nonnegative
//! importance. Evaluation is pure; repeated calls with an equal projection
//! return the same value.

use std::collections::BTreeMap;
use std::fmt;

use crate::coordinates::Coordinates;
use crate::error::{MeritError, Result};

/// Capability of assigning a nonnegative weight to a projection.
pub trait Weights: fmt::Debug {
    fn weight(&self, projection: &Coordinates) -> Result<f64>;
}

fn check_nonnegative(value: f64, what: &str) -> Result<f64> {
    if !(value >= 0.0) || !value.is_finite() {
        return Err(MeritError::InvalidParameters(format!(
            "{} must be a finite nonnegative value, got {}",
            what, value
        )));
    }
    Ok(value)
}

/// Weights that depend only on the cardinality of the projection.
///
/// Orders with no configured entry fail with
/// [`MeritError::MissingWeightEntry`] unless a default was set; whether a
/// missing order means "zero contribution" or "configuration bug" is the
/// caller's call, so neither is assumed.
#[derive(Debug, Clone, Default)]
pub struct OrderDependentWeights {
    weights: BTreeMap<usize, f64>,
    default_weight: Option<f64>,
}

impl OrderDependentWeights {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_weight_for_order(&mut self, order: usize, weight: f64) -> Result<()> {
        self.weights
            .insert(order, check_nonnegative(weight, "order weight")?);
        Ok(())
    }

    pub fn set_default_weight(&mut self, weight: f64) -> Result<()> {
        self.default_weight = Some(check_nonnegative(weight, "default weight")?);
        Ok(())
    }

    pub fn weight_for_order(&self, order: usize) -> Result<f64> {
        self.weights
            .get(&order)
            .copied()
            .or(self.default_weight)
            .ok_or(MeritError::MissingWeightEntry { order })
    }
}

impl Weights for OrderDependentWeights {
    fn weight(&self, projection: &Coordinates) -> Result<f64> {
        self.weight_for_order(projection.order())
    }
}

impl fmt::Display for OrderDependentWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "OrderDependentWeights({{")?;
        for (k, (order, w)) in self.weights.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", order, w)?;
        }
        write!(f, "}}")?;
        if let Some(d) = self.default_weight {
            write!(f, ", default={}", d)?;
        }
        write!(f, ")")
    }
}

/// Weights that are the product, over the projection's indices, of a
/// per-coordinate weight. Coordinates with no configured entry contribute
/// the default multiplier 1, and the empty projection evaluates to the
/// empty product 1.
#[derive(Debug, Clone)]
pub struct ProductWeights {
    weights: BTreeMap<usize, f64>,
    default_weight: f64,
}

impl ProductWeights {
    pub fn new() -> Self {
        Self {
            weights: BTreeMap::new(),
            default_weight: 1.0,
        }
    }

    pub fn set_weight_for_coordinate(&mut self, index: usize, weight: f64) -> Result<()> {
        if index == 0 {
            return Err(MeritError::InvalidParameters(
                "coordinate indices are 1-based".to_string(),
            ));
        }
        self.weights
            .insert(index, check_nonnegative(weight, "coordinate weight")?);
        Ok(())
    }

    pub fn set_default_weight(&mut self, weight: f64) -> Result<()> {
        self.default_weight = check_nonnegative(weight, "default weight")?;
        Ok(())
    }

    pub fn weight_for_coordinate(&self, index: usize) -> f64 {
        self.weights
            .get(&index)
            .copied()
            .unwrap_or(self.default_weight)
    }
}

impl Default for ProductWeights {
    fn default() -> Self {
        Self::new()
    }
}

impl Weights for ProductWeights {
    fn weight(&self, projection: &Coordinates) -> Result<f64> {
        Ok(projection
            .iter()
            .map(|idx| self.weight_for_coordinate(idx))
            .product())
    }
}

impl fmt::Display for ProductWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ProductWeights({{")?;
        for (k, (idx, w)) in self.weights.iter().enumerate() {
            if k > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}:{}", idx, w)?;
        }
        write!(f, "}}, default={})", self.default_weight)
    }
}

/// Product of an order-dependent weight and a product weight for the same
/// projection. The two sub-weights interact multiplicatively and in no
/// other way.
#[derive(Debug, Clone, Default)]
pub struct PODWeights {
    order_dependent: OrderDependentWeights,
    product: ProductWeights,
}

impl PODWeights {
    pub fn new(order_dependent: OrderDependentWeights, product: ProductWeights) -> Self {
        Self {
            order_dependent,
            product,
        }
    }

    pub fn order_dependent(&self) -> &OrderDependentWeights {
        &self.order_dependent
    }

    pub fn order_dependent_mut(&mut self) -> &mut OrderDependentWeights {
        &mut self.order_dependent
    }

    pub fn product(&self) -> &ProductWeights {
        &self.product
    }

    pub fn product_mut(&mut self) -> &mut ProductWeights {
        &mut self.product
    }
}

impl Weights for PODWeights {
    fn weight(&self, projection: &Coordinates) -> Result<f64> {
        Ok(self.order_dependent.weight(projection)? * self.product.weight(projection)?)
    }
}

impl fmt::Display for PODWeights {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PODWeights({}, {})", self.order_dependent, self.product)
    }
}
