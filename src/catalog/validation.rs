//! Semantic checks applied before records reach storage

use crate::error::{BarkeepError, Result};

use super::{Cocktail, Ingredient};

/// Highest allowed alcohol-by-volume percentage
const MAX_ABV: i32 = 100;

/// Check an ingredient, reporting every violation at once
pub fn validate_ingredient(ingredient: &Ingredient) -> Result<()> {
    let mut violations = Vec::new();

    if ingredient.id.trim().is_empty() {
        violations.push("id must not be empty".to_string());
    }
    if ingredient.name.trim().is_empty() {
        violations.push("name must not be empty".to_string());
    }
    if !(0..=MAX_ABV).contains(&ingredient.abv) {
        violations.push(format!(
            "abv must be within 0..={}, got {}",
            MAX_ABV, ingredient.abv
        ));
    }

    finish(violations)
}

/// Check a cocktail, reporting every violation at once
pub fn validate_cocktail(cocktail: &Cocktail) -> Result<()> {
    let mut violations = Vec::new();

    if cocktail.id.trim().is_empty() {
        violations.push("id must not be empty".to_string());
    }
    if cocktail.name.trim().is_empty() {
        violations.push("name must not be empty".to_string());
    }
    if let Some(pos) = cocktail.ingredients.iter().position(|id| id.trim().is_empty()) {
        violations.push(format!("ingredient #{} has an empty id", pos + 1));
    }

    finish(violations)
}

fn finish(violations: Vec<String>) -> Result<()> {
    if violations.is_empty() {
        Ok(())
    } else {
        Err(BarkeepError::Validation(violations))
    }
}
