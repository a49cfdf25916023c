use std::collections::HashSet;

use rust_decimal::Decimal;

use super::catalog::Catalog;

/// Largest weight a single family may carry.
pub const MAX_FAMILY_WEIGHT: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Validate the family catalog at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_catalog(catalog: &Catalog) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    if catalog.families.is_empty() {
        errors.push("catalog.families: at least one family is required".to_string());
    }

    let mut seen = HashSet::new();
    for (i, family) in catalog.families.iter().enumerate() {
        if !seen.insert(&family.code) {
            errors.push(format!(
                "catalog.families[{}].code: duplicate family '{}'",
                i, family.code
            ));
        }
        if family.name.trim().is_empty() {
            errors.push(format!("catalog.families[{}].name: must not be empty", i));
        }
        if family.weight <= Decimal::ZERO {
            errors.push(format!(
                "catalog.families[{}].weight: must be positive, got {}",
                i, family.weight
            ));
        } else if family.weight > MAX_FAMILY_WEIGHT {
            errors.push(format!(
                "catalog.families[{}].weight: must be <= {}, got {}",
                i, MAX_FAMILY_WEIGHT, family.weight
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
