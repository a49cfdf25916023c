use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::error::ScoringError;

const MAX_CODE_LEN: usize = 8;

/// Short family code such as `AC` or `SC`.
///
/// Always uppercase ASCII letters or digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct FamilyCode(String);

impl FamilyCode {
    pub fn parse(s: &str) -> Result<Self, ScoringError> {
        let code = s.trim().to_ascii_uppercase();
        if code.is_empty()
            || code.len() > MAX_CODE_LEN
            || !code.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ScoringError::InvalidFamilyCode(s.to_string()));
        }
        Ok(FamilyCode(code))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for FamilyCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for FamilyCode {
    type Err = ScoringError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FamilyCode::parse(s)
    }
}

impl TryFrom<String> for FamilyCode {
    type Error = ScoringError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        FamilyCode::parse(&value)
    }
}

impl From<FamilyCode> for String {
    fn from(code: FamilyCode) -> Self {
        code.0
    }
}

/// A named group of controls and its weight in the overall score.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ControlFamily {
    pub code: FamilyCode,
    pub name: String,
    pub weight: Decimal,
}

impl ControlFamily {
    fn new(code: &str, name: &str, weight_hundredths: i64) -> Self {
        Self {
            code: FamilyCode(code.to_string()),
            name: name.to_string(),
            weight: Decimal::new(weight_hundredths, 2),
        }
    }
}

/// Family catalog used to weight the overall score.
///
/// Example YAML:
/// ```yaml
/// catalog:
///   families:
///     - { code: AC, name: Access Control, weight: 0.12 }
///     - { code: SC, name: System and Communications Protection, weight: 0.15 }
/// ```
///
/// Weights do not have to sum to 1.0; the overall score divides by the
/// weights of the families that were actually assessed.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Catalog {
    pub families: Vec<ControlFamily>,
}

impl Default for Catalog {
    /// NIST SP 800-53 Rev. 5 families.
    fn default() -> Self {
        Self {
            families: vec![
                ControlFamily::new("AC", "Access Control", 12),
                ControlFamily::new("AT", "Awareness and Training", 2),
                ControlFamily::new("AU", "Audit and Accountability", 8),
                ControlFamily::new("CA", "Assessment, Authorization, and Monitoring", 4),
                ControlFamily::new("CM", "Configuration Management", 7),
                ControlFamily::new("CP", "Contingency Planning", 5),
                ControlFamily::new("IA", "Identification and Authentication", 11),
                ControlFamily::new("IR", "Incident Response", 8),
                ControlFamily::new("MA", "Maintenance", 3),
                ControlFamily::new("MP", "Media Protection", 2),
                ControlFamily::new("PE", "Physical and Environmental Protection", 3),
                ControlFamily::new("PL", "Planning", 2),
                ControlFamily::new("PM", "Program Management", 3),
                ControlFamily::new("PS", "Personnel Security", 2),
                ControlFamily::new("PT", "Privacy Controls", 2),
                ControlFamily::new("RA", "Risk Assessment", 6),
                ControlFamily::new("SA", "System and Services Acquisition", 4),
                ControlFamily::new("SC", "System and Communications Protection", 15),
                ControlFamily::new("SI", "System and Information Integrity", 11),
                ControlFamily::new("SR", "Supply Chain Risk Management", 4),
            ],
        }
    }
}

impl Catalog {
    /// Look up a family by code. The first entry wins if codes repeat.
    pub fn get(&self, code: &FamilyCode) -> Result<&ControlFamily, ScoringError> {
        self.families
            .iter()
            .find(|f| &f.code == code)
            .ok_or_else(|| ScoringError::UnknownFamily(code.to_string()))
    }

    pub fn contains(&self, code: &FamilyCode) -> bool {
        self.get(code).is_ok()
    }

    /// Sum of all family weights, saturating at `Decimal::MAX`.
    pub fn total_weight(&self) -> Decimal {
        self.families
            .iter()
            .fold(Decimal::ZERO, |acc, f| acc.saturating_add(f.weight))
    }
}
