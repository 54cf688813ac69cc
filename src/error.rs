use thiserror::Error;

/// Invalid-argument failures. A call that returns one of these left the tree untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MondrianError {
    #[error("invalid region: {0}")]
    InvalidRegion(String),

    #[error(
        "the new life time {requested} must be finite and not smaller than the current one {current}; pruning is not supported"
    )]
    LifeTimeDecrease { requested: f64, current: f64 },

    #[error("point has {found} dimensions, tree has {expected}")]
    DimensionMismatch { expected: usize, found: usize },

    #[error("{labeled_indices} labeled indices but {labels} labels")]
    LengthMismatch {
        labeled_indices: usize,
        labels: usize,
    },

    #[error("{labeled} labeled indices given for only {points} points")]
    TooManyLabels { labeled: usize, points: usize },

    #[error("index {index} is out of range for {len} points")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("index {0} is listed as labeled more than once")]
    DuplicateLabeledIndex(usize),

    #[error("point {0} is not unlabeled in its leaf")]
    NotUnlabeled(usize),

    #[error("unknown rounding policy '{0}'")]
    UnknownRoundingPolicy(String),

    #[error(
        "labeling budget {requested} must be above the {labeled} labeled points and at most the {points} points"
    )]
    BudgetOutOfRange {
        requested: usize,
        labeled: usize,
        points: usize,
    },

    #[error("leaf position {position} is out of range for {num_leaves} leaves")]
    LeafOutOfRange { position: usize, num_leaves: usize },

    #[error("requested {requested} points but the leaf has only {available} unlabeled")]
    InsufficientUnlabeled { requested: usize, available: usize },

    #[error("default variance must be finite and non-negative, got {0}")]
    InvalidDefaultVariance(f64),
}

pub type Result<T> = std::result::Result<T, MondrianError>;
