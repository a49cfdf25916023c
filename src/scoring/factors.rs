use std::fmt;
use std::str::FromStr;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};

use super::error::ScoringError;

/// Highest value on the Protect/Detect/Respond rating scale.
pub const RATING_MAX: u8 = 3;

/// Upper bound of every per-control and aggregate score.
pub const SCORE_MAX: Decimal = Decimal::from_parts(5, 0, 0, false, 0);

const ONE_HUNDRED: Decimal = Decimal::ONE_HUNDRED;

// Protect/Detect/Respond split: 40/30/30.
const PROTECT_WEIGHT: Decimal = Decimal::from_parts(4, 0, 0, false, 1);
const DETECT_WEIGHT: Decimal = Decimal::from_parts(3, 0, 0, false, 1);
const RESPOND_WEIGHT: Decimal = Decimal::from_parts(3, 0, 0, false, 1);

// Status dominates the multiplier; the self-reported percentage adjusts it.
const STATUS_SHARE: Decimal = Decimal::from_parts(7, 0, 0, false, 1);
const PERCENTAGE_SHARE: Decimal = Decimal::from_parts(3, 0, 0, false, 1);

/// One axis of the effectiveness rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    Protect,
    Detect,
    Respond,
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Dimension::Protect => "protect",
            Dimension::Detect => "detect",
            Dimension::Respond => "respond",
        };
        f.write_str(name)
    }
}

/// Rollout state of a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ImplementationStatus {
    NotImplemented,
    Partial,
    Largely,
    Full,
}

impl ImplementationStatus {
    pub const ALL: [ImplementationStatus; 4] = [
        ImplementationStatus::NotImplemented,
        ImplementationStatus::Partial,
        ImplementationStatus::Largely,
        ImplementationStatus::Full,
    ];

    /// Base multiplier before the percentage adjustment.
    pub fn base_multiplier(self) -> Decimal {
        match self {
            ImplementationStatus::NotImplemented => Decimal::ZERO,
            ImplementationStatus::Partial => Decimal::new(4, 1),
            ImplementationStatus::Largely => Decimal::new(7, 1),
            ImplementationStatus::Full => Decimal::ONE,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ImplementationStatus::NotImplemented => "Not Implemented",
            ImplementationStatus::Partial => "Partially Implemented",
            ImplementationStatus::Largely => "Largely Implemented",
            ImplementationStatus::Full => "Fully Implemented",
        }
    }
}

impl fmt::Display for ImplementationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ImplementationStatus {
    type Err = ScoringError;

    /// Accepts the form index (`0`-`3`) or a name such as `partial` or
    /// `not-implemented`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['_', ' '], "-");
        match normalized.as_str() {
            "0" | "not-implemented" | "none" => Ok(ImplementationStatus::NotImplemented),
            "1" | "partial" | "partially-implemented" => Ok(ImplementationStatus::Partial),
            "2" | "largely" | "largely-implemented" => Ok(ImplementationStatus::Largely),
            "3" | "full" | "fully-implemented" => Ok(ImplementationStatus::Full),
            _ => Err(ScoringError::InvalidStatus(s.to_string())),
        }
    }
}

/// Raw effectiveness score on the 0-5 scale.
///
/// Ratings above [`RATING_MAX`] push the result past 5; clamping is left to
/// the caller.
pub fn compute_pdr(protect: u8, detect: u8, respond: u8) -> Decimal {
    let weighted = Decimal::from(protect) * PROTECT_WEIGHT
        + Decimal::from(detect) * DETECT_WEIGHT
        + Decimal::from(respond) * RESPOND_WEIGHT;
    (weighted / Decimal::from(RATING_MAX)) * SCORE_MAX
}

/// Implementation multiplier in `[0, 1]` for percentages in `[0, 100]`.
pub fn implementation_multiplier(status: ImplementationStatus, percentage: Decimal) -> Decimal {
    let adjusted = status.base_multiplier() * STATUS_SHARE + (percentage / ONE_HUNDRED) * PERCENTAGE_SHARE;
    adjusted.min(Decimal::ONE)
}

/// Round to two decimal places, halves away from zero.
///
/// This is the only rounding applied to scores; stored record fields,
/// family summaries and the overall score all go through it.
pub fn round_score(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

pub(crate) fn validate_rating(dimension: Dimension, value: u8) -> Result<u8, ScoringError> {
    if value > RATING_MAX {
        return Err(ScoringError::InvalidRating {
            dimension,
            value,
            max: RATING_MAX,
        });
    }
    Ok(value)
}

pub(crate) fn validate_percentage(percentage: Decimal) -> Result<Decimal, ScoringError> {
    if percentage < Decimal::ZERO || percentage > ONE_HUNDRED {
        return Err(ScoringError::InvalidPercentage(percentage));
    }
    Ok(percentage)
}
