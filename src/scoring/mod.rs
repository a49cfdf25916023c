pub mod catalog;
pub mod engine;
pub mod error;
pub mod factors;
pub mod validation;

pub use catalog::{Catalog, ControlFamily, FamilyCode};
pub use engine::{
    score_control, AssessmentInput, AssessmentRecord, ControlScore, FamilySummary, ScoreEngine,
    ScoreReport,
};
pub use error::ScoringError;
pub use factors::{
    compute_pdr, implementation_multiplier, round_score, Dimension, ImplementationStatus,
    RATING_MAX, SCORE_MAX,
};
pub use validation::validate_catalog;
