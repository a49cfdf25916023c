use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::catalog::{Catalog, FamilyCode};
use super::error::ScoringError;
use super::factors::{
    compute_pdr, implementation_multiplier, round_score, validate_percentage, validate_rating,
    Dimension, ImplementationStatus, SCORE_MAX,
};

/// Raw self-assessment of a single control.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentInput {
    pub family: FamilyCode,
    pub control_id: String,
    pub protect: u8,
    pub detect: u8,
    pub respond: u8,
    pub status: ImplementationStatus,
    pub percentage: Decimal,
}

/// Scored control. Derived fields are fixed when the record is created.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AssessmentRecord {
    #[serde(flatten)]
    pub input: AssessmentInput,
    pub pdr_score: Decimal,
    pub implementation_multiplier: Decimal,
    pub final_score: Decimal,
}

/// Per-control scores before they are stored.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ControlScore {
    pub pdr_score: Decimal,
    pub implementation_multiplier: Decimal,
    pub final_score: Decimal,
}

/// Aggregate for one assessed family.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilySummary {
    pub code: FamilyCode,
    pub name: String,
    pub weight: Decimal,
    pub controls: usize,
    pub average: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreReport {
    pub overall_score: Decimal,
    pub percent: Decimal,
    pub assessments: usize,
    pub families: Vec<FamilySummary>,
}

/// Score a control without recording it. Inputs are validated the same way
/// [`ScoreEngine::add_assessment`] validates them, minus the family lookup.
pub fn score_control(
    protect: u8,
    detect: u8,
    respond: u8,
    status: ImplementationStatus,
    percentage: Decimal,
) -> Result<ControlScore, ScoringError> {
    let protect = validate_rating(Dimension::Protect, protect)?;
    let detect = validate_rating(Dimension::Detect, detect)?;
    let respond = validate_rating(Dimension::Respond, respond)?;
    let percentage = validate_percentage(percentage)?;

    let pdr = compute_pdr(protect, detect, respond);
    let multiplier = implementation_multiplier(status, percentage);
    let final_score = (pdr * multiplier).min(SCORE_MAX).max(Decimal::ZERO);

    Ok(ControlScore {
        pdr_score: round_score(pdr),
        implementation_multiplier: round_score(multiplier),
        final_score: round_score(final_score),
    })
}

/// Accumulates control assessments for one session and aggregates them.
///
/// Records are append-only. Aggregates are computed on read, so they always
/// match the current record set.
#[derive(Debug, Clone)]
pub struct ScoreEngine {
    catalog: Catalog,
    records: Vec<AssessmentRecord>,
}

impl ScoreEngine {
    pub fn new(catalog: Catalog) -> Self {
        Self {
            catalog,
            records: Vec::new(),
        }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Validate, score and append an assessment.
    ///
    /// # Errors
    ///
    /// Fails with `UnknownFamily`, `EmptyControlId`, `InvalidRating` or
    /// `InvalidPercentage`; the engine is untouched on failure.
    pub fn add_assessment(&mut self, input: AssessmentInput) -> Result<AssessmentRecord, ScoringError> {
        self.catalog.get(&input.family)?;
        if input.control_id.trim().is_empty() {
            return Err(ScoringError::EmptyControlId);
        }

        let score = score_control(
            input.protect,
            input.detect,
            input.respond,
            input.status,
            input.percentage,
        )?;

        let record = AssessmentRecord {
            input,
            pdr_score: score.pdr_score,
            implementation_multiplier: score.implementation_multiplier,
            final_score: score.final_score,
        };

        tracing::debug!(
            family = %record.input.family,
            control = %record.input.control_id,
            final_score = %record.final_score,
            "recorded assessment"
        );

        self.records.push(record.clone());
        Ok(record)
    }

    /// Records in insertion order, optionally restricted to one family.
    pub fn list_assessments(&self, family: Option<&FamilyCode>) -> Vec<&AssessmentRecord> {
        self.records
            .iter()
            .filter(|r| family.map_or(true, |f| &r.input.family == f))
            .collect()
    }

    /// Mean final score for a family, or `None` if it has no assessments.
    pub fn family_average(&self, family: &FamilyCode) -> Option<Decimal> {
        let scores: Vec<Decimal> = self
            .records
            .iter()
            .filter(|r| &r.input.family == family)
            .map(|r| r.final_score)
            .collect();

        if scores.is_empty() {
            return None;
        }
        let total: Decimal = scores.iter().sum();
        Some(total / Decimal::from(scores.len()))
    }

    /// Weighted mean of family averages over the assessed families, rounded.
    /// Returns zero when nothing has been assessed.
    pub fn overall_score(&self) -> Decimal {
        let mut weighted_total = Decimal::ZERO;
        let mut total_weight = Decimal::ZERO;

        for family in &self.catalog.families {
            if let Some(average) = self.family_average(&family.code) {
                weighted_total = weighted_total.saturating_add(average.saturating_mul(family.weight));
                total_weight = total_weight.saturating_add(family.weight);
            }
        }

        if total_weight > Decimal::ZERO {
            round_score(weighted_total / total_weight)
        } else {
            Decimal::ZERO
        }
    }

    /// Assessed families in catalog order.
    pub fn family_summaries(&self) -> Vec<FamilySummary> {
        self.catalog
            .families
            .iter()
            .filter_map(|family| {
                let controls = self
                    .records
                    .iter()
                    .filter(|r| r.input.family == family.code)
                    .count();
                self.family_average(&family.code).map(|average| FamilySummary {
                    code: family.code.clone(),
                    name: family.name.clone(),
                    weight: family.weight,
                    controls,
                    average: round_score(average),
                })
            })
            .collect()
    }

    pub fn report(&self) -> ScoreReport {
        let overall_score = self.overall_score();
        let percent = (overall_score / SCORE_MAX * Decimal::ONE_HUNDRED)
            .round_dp_with_strategy(0, rust_decimal::RoundingStrategy::MidpointAwayFromZero);
        ScoreReport {
            overall_score,
            percent,
            assessments: self.records.len(),
            families: self.family_summaries(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn input(family: &str, control: &str, pdr: (u8, u8, u8), status: u8, pct: &str) -> AssessmentInput {
        AssessmentInput {
            family: FamilyCode::parse(family).unwrap(),
            control_id: control.to_string(),
            protect: pdr.0,
            detect: pdr.1,
            respond: pdr.2,
            status: status.to_string().parse().unwrap(),
            percentage: dec(pct),
        }
    }

    fn engine() -> ScoreEngine {
        ScoreEngine::new(Catalog::default())
    }

    #[test]
    fn test_oversized_weight_does_not_panic() {
        let mut catalog = Catalog::default();
        catalog.families[0].weight = Decimal::MAX;
        catalog.families[1].weight = Decimal::MAX;
        let mut engine = ScoreEngine::new(catalog);
        engine.add_assessment(input("AC", "AC-2", (3, 3, 2), 3, "92")).unwrap();
        engine.add_assessment(input("AT", "AT-1", (2, 2, 2), 2, "50")).unwrap();

        let overall = engine.overall_score();
        assert!(overall >= Decimal::ZERO && overall <= SCORE_MAX);
        assert_eq!(engine.catalog().total_weight(), Decimal::MAX);
    }

    #[test]
    fn test_access_control_example() {
        let mut engine = engine();
        let record = engine
            .add_assessment(input("AC", "AC-2", (3, 3, 2), 3, "92"))
            .unwrap();

        assert_eq!(record.pdr_score, dec("4.5"));
        assert_eq!(record.implementation_multiplier, dec("0.98"));
        // 4.5 * 0.976 = 4.392, the unrounded multiplier is used
        assert_eq!(record.final_score, dec("4.39"));
    }

    #[test]
    fn test_comms_protection_example_rounds_half_up() {
        let mut engine = engine();
        let record = engine
            .add_assessment(input("SC", "SC-8", (3, 3, 3), 3, "95"))
            .unwrap();

        assert_eq!(record.pdr_score, dec("5"));
        assert_eq!(record.implementation_multiplier, dec("0.99"));
        // 5.0 * 0.985 = 4.925
        assert_eq!(record.final_score, dec("4.93"));
    }

    #[test]
    fn test_overall_score_weighted_by_assessed_families() {
        let mut engine = engine();
        engine.add_assessment(input("AC", "AC-2", (3, 3, 2), 3, "92")).unwrap();
        engine.add_assessment(input("SC", "SC-8", (3, 3, 3), 3, "95")).unwrap();

        assert_eq!(engine.family_average(&FamilyCode::parse("AC").unwrap()), Some(dec("4.39")));
        assert_eq!(engine.family_average(&FamilyCode::parse("SC").unwrap()), Some(dec("4.93")));
        // (4.39*0.12 + 4.93*0.15) / 0.27
        assert_eq!(engine.overall_score(), dec("4.69"));
    }

    #[test]
    fn test_overall_score_empty_is_zero() {
        assert_eq!(engine().overall_score(), Decimal::ZERO);
        assert_eq!(engine().report().percent, Decimal::ZERO);
    }

    #[test]
    fn test_overall_score_is_stable_between_reads() {
        let mut engine = engine();
        engine.add_assessment(input("IA", "IA-2", (2, 1, 3), 2, "60")).unwrap();
        engine.add_assessment(input("IR", "IR-4", (1, 2, 2), 1, "35.5")).unwrap();
        assert_eq!(engine.overall_score(), engine.overall_score());
    }

    #[test]
    fn test_family_average_absent_for_unassessed_family() {
        let mut engine = engine();
        engine.add_assessment(input("AC", "AC-2", (3, 3, 2), 3, "92")).unwrap();
        assert_eq!(engine.family_average(&FamilyCode::parse("SC").unwrap()), None);
    }

    #[test]
    fn test_family_average_is_mean_of_final_scores() {
        let mut engine = engine();
        engine.add_assessment(input("AC", "AC-2", (3, 3, 3), 3, "100")).unwrap(); // 5.00
        engine.add_assessment(input("AC", "AC-3", (0, 0, 0), 0, "0")).unwrap(); // 0.00
        assert_eq!(engine.family_average(&FamilyCode::parse("AC").unwrap()), Some(dec("2.5")));
    }

    #[test]
    fn test_single_family_overall_equals_family_average() {
        let mut engine = engine();
        engine.add_assessment(input("CM", "CM-2", (3, 3, 3), 3, "100")).unwrap();
        engine.add_assessment(input("CM", "CM-6", (3, 2, 2), 2, "50")).unwrap();
        let average = engine.family_average(&FamilyCode::parse("CM").unwrap()).unwrap();
        assert_eq!(engine.overall_score(), round_score(average));
    }

    #[test]
    fn test_not_implemented_scores_from_percentage_only() {
        let mut engine = engine();
        let record = engine
            .add_assessment(input("CP", "CP-9", (3, 3, 3), 0, "50"))
            .unwrap();
        // multiplier = 0.5 * 0.3 = 0.15
        assert_eq!(record.implementation_multiplier, dec("0.15"));
        assert_eq!(record.final_score, dec("0.75"));
    }

    #[test]
    fn test_final_score_never_exceeds_pdr() {
        let mut engine = engine();
        for status in 0..4u8 {
            let record = engine
                .add_assessment(input("SI", "SI-4", (2, 3, 1), status, "100"))
                .unwrap();
            assert!(record.final_score <= record.pdr_score);
            assert!(record.final_score <= SCORE_MAX);
        }
    }

    #[test]
    fn test_unknown_family_rejected_without_mutation() {
        let mut engine = ScoreEngine::new(Catalog {
            families: Catalog::default().families.into_iter().take(1).collect(),
        });
        engine.add_assessment(input("AC", "AC-2", (3, 3, 2), 3, "92")).unwrap();
        let before = engine.overall_score();

        let err = engine
            .add_assessment(input("SC", "SC-8", (3, 3, 3), 3, "95"))
            .unwrap_err();
        assert_eq!(err, ScoringError::UnknownFamily("SC".to_string()));
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.overall_score(), before);
    }

    #[test]
    fn test_invalid_rating_rejected() {
        let mut engine = engine();
        let err = engine
            .add_assessment(input("AC", "AC-2", (3, 4, 2), 3, "92"))
            .unwrap_err();
        assert!(matches!(
            err,
            ScoringError::InvalidRating { dimension: Dimension::Detect, value: 4, .. }
        ));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_invalid_percentage_rejected() {
        let mut engine = engine();
        let err = engine
            .add_assessment(input("AC", "AC-2", (3, 3, 2), 3, "120"))
            .unwrap_err();
        assert_eq!(err, ScoringError::InvalidPercentage(dec("120")));
        assert!(engine.is_empty());
    }

    #[test]
    fn test_empty_control_id_rejected() {
        let mut engine = engine();
        let err = engine
            .add_assessment(input("AC", "  ", (3, 3, 2), 3, "92"))
            .unwrap_err();
        assert_eq!(err, ScoringError::EmptyControlId);
    }

    #[test]
    fn test_duplicate_control_ids_are_kept() {
        let mut engine = engine();
        engine.add_assessment(input("AC", "AC-2", (3, 3, 3), 3, "100")).unwrap();
        engine.add_assessment(input("AC", "AC-2", (1, 1, 1), 1, "10")).unwrap();
        assert_eq!(engine.list_assessments(None).len(), 2);
    }

    #[test]
    fn test_list_preserves_insertion_order() {
        let mut engine = engine();
        engine.add_assessment(input("SC", "SC-8", (3, 3, 3), 3, "95")).unwrap();
        engine.add_assessment(input("AC", "AC-2", (3, 3, 2), 3, "92")).unwrap();
        engine.add_assessment(input("SC", "SC-7", (2, 2, 2), 2, "70")).unwrap();

        let all: Vec<&str> = engine
            .list_assessments(None)
            .iter()
            .map(|r| r.input.control_id.as_str())
            .collect();
        assert_eq!(all, vec!["SC-8", "AC-2", "SC-7"]);

        let sc = FamilyCode::parse("SC").unwrap();
        let sc_only: Vec<&str> = engine
            .list_assessments(Some(&sc))
            .iter()
            .map(|r| r.input.control_id.as_str())
            .collect();
        assert_eq!(sc_only, vec!["SC-8", "SC-7"]);
    }

    #[test]
    fn test_family_summaries_in_catalog_order() {
        let mut engine = engine();
        engine.add_assessment(input("SC", "SC-8", (3, 3, 3), 3, "95")).unwrap();
        engine.add_assessment(input("AC", "AC-2", (3, 3, 2), 3, "92")).unwrap();
        engine.add_assessment(input("AC", "AC-3", (3, 3, 3), 3, "100")).unwrap();

        let summaries = engine.family_summaries();
        assert_eq!(summaries.len(), 2);
        assert_eq!(summaries[0].code.as_str(), "AC");
        assert_eq!(summaries[0].controls, 2);
        // (4.39 + 5.00) / 2 = 4.695
        assert_eq!(summaries[0].average, dec("4.70"));
        assert_eq!(summaries[1].code.as_str(), "SC");
        assert_eq!(summaries[1].name, "System and Communications Protection");
    }

    #[test]
    fn test_report_percent() {
        let mut engine = engine();
        engine.add_assessment(input("AC", "AC-2", (3, 3, 2), 3, "92")).unwrap();
        engine.add_assessment(input("SC", "SC-8", (3, 3, 3), 3, "95")).unwrap();

        let report = engine.report();
        assert_eq!(report.overall_score, dec("4.69"));
        // 4.69 / 5 = 93.8%
        assert_eq!(report.percent, dec("94"));
        assert_eq!(report.assessments, 2);
    }

    #[test]
    fn test_score_control_preview_matches_engine() {
        let preview = score_control(3, 3, 2, ImplementationStatus::Full, dec("92")).unwrap();
        let mut engine = engine();
        let record = engine.add_assessment(input("AC", "AC-2", (3, 3, 2), 3, "92")).unwrap();
        assert_eq!(preview.final_score, record.final_score);
        assert_eq!(preview.pdr_score, record.pdr_score);
    }
}
