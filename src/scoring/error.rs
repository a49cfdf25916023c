use rust_decimal::Decimal;
use thiserror::Error;

use super::factors::Dimension;

/// Validation failures raised by the scoring engine.
///
/// Every variant is local to the call that produced it. A rejected insert
/// never changes engine state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoringError {
    #[error("unknown control family '{0}'")]
    UnknownFamily(String),

    #[error("invalid family code '{0}': expected 1-8 ASCII letters or digits")]
    InvalidFamilyCode(String),

    #[error("{dimension} rating {value} is out of range (0-{max})")]
    InvalidRating {
        dimension: Dimension,
        value: u8,
        max: u8,
    },

    #[error("implementation percentage {0} is out of range (0-100)")]
    InvalidPercentage(Decimal),

    #[error("invalid implementation status '{0}': use 0-3 or not-implemented, partial, largely, full")]
    InvalidStatus(String),

    #[error("control identifier must not be empty")]
    EmptyControlId,
}
