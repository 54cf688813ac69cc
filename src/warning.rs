use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;

/// Non-fatal degenerate-input conditions. The call that raises one still
/// returns a documented fallback value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum Warning {
    #[error("no labeled data in the leaf reached by the point, returning the default {default}")]
    EmptyLeaf { default: f64 },

    #[error("{reason}, using uniform leaf proportions")]
    UniformProportions { reason: UniformReason },

    #[error("only {allocated} of the {requested} requested labels fit in the unlabeled points")]
    BudgetShortfall { requested: usize, allocated: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniformReason {
    NoPoints,
    ZeroVariance,
}

impl Display for UniformReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            UniformReason::NoPoints => write!(f, "the tree holds no points"),
            UniformReason::ZeroVariance => write!(f, "every leaf variance is zero"),
        }
    }
}

/// A value together with the warning raised while computing it, if any.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    pub value: T,
    pub warning: Option<Warning>,
}

impl<T> Outcome<T> {
    pub fn clean(value: T) -> Self {
        Self {
            value,
            warning: None,
        }
    }

    pub fn warned(value: T, warning: Warning) -> Self {
        tracing::warn!(%warning, "degenerate input");
        Self {
            value,
            warning: Some(warning),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.warning.is_none()
    }

    pub fn into_value(self) -> T {
        self.value
    }
}

/// Result of routing a point to a leaf and averaging its labels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prediction {
    LeafMean(f64),
    /// The leaf had no labeled values; carries the tree's default prediction.
    Fallback(f64),
}

impl Prediction {
    pub fn value(&self) -> f64 {
        match *self {
            Prediction::LeafMean(v) | Prediction::Fallback(v) => v,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Prediction::Fallback(_))
    }

    pub fn warning(&self) -> Option<Warning> {
        match *self {
            Prediction::LeafMean(_) => None,
            Prediction::Fallback(default) => Some(Warning::EmptyLeaf { default }),
        }
    }
}
