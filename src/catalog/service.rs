//! Data service
//!
//! The only layer that applies business rules. Wraps a [`CatalogEngine`] and
//! adds validation plus the operations storage does not offer natively.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Result;

use super::record::Record;
use super::validation;
use super::{CatalogEngine, Cocktail, Ingredient};

/// Matches of a composite search
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub ingredients: Vec<Ingredient>,
    pub cocktails: Vec<Cocktail>,
}

/// Catalog operations exposed to the API layer
#[derive(Clone)]
pub struct DataService {
    engine: Arc<dyn CatalogEngine>,
}

impl DataService {
    pub fn new(engine: Arc<dyn CatalogEngine>) -> Self {
        Self { engine }
    }

    pub fn validate_ingredient(&self, ingredient: &Ingredient) -> Result<()> {
        validation::validate_ingredient(ingredient)
    }

    pub fn validate_cocktail(&self, cocktail: &Cocktail) -> Result<()> {
        validation::validate_cocktail(cocktail)
    }

    // =========================================================================
    // Ingredients
    // =========================================================================

    pub fn create_ingredient(&self, ingredient: &Ingredient) -> Result<String> {
        self.engine.create_ingredient(ingredient)
    }

    pub fn update_ingredient(&self, ingredient: &Ingredient) -> Result<()> {
        self.engine.update_ingredient(ingredient)
    }

    pub fn get_ingredient(&self, id: &str) -> Result<Ingredient> {
        self.engine.get_ingredient(id)
    }

    pub fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        self.engine.list_ingredients()
    }

    /// Ingredients whose `name` or `en_name` contains `query`
    ///
    /// Case-sensitive; an empty query matches everything.
    pub fn find_ingredients(&self, query: &str) -> Result<Vec<Ingredient>> {
        Ok(retain_matching(self.engine.list_ingredients()?, query))
    }

    // =========================================================================
    // Cocktails
    // =========================================================================

    pub fn create_cocktail(&self, cocktail: &Cocktail) -> Result<String> {
        self.engine.create_cocktail(cocktail)
    }

    pub fn update_cocktail(&self, cocktail: &Cocktail) -> Result<()> {
        self.engine.update_cocktail(cocktail)
    }

    pub fn get_cocktail(&self, id: &str) -> Result<Cocktail> {
        self.engine.get_cocktail(id)
    }

    pub fn list_cocktails(&self) -> Result<Vec<Cocktail>> {
        self.engine.list_cocktails()
    }

    /// Cocktails whose `name` or `en_name` contains `query`
    pub fn find_cocktails(&self, query: &str) -> Result<Vec<Cocktail>> {
        Ok(retain_matching(self.engine.list_cocktails()?, query))
    }

    /// Ingredients and cocktails matching `query`
    pub fn search(&self, query: &str) -> Result<SearchResult> {
        let ingredients = self.find_ingredients(query)?;
        let cocktails = self.find_cocktails(query)?;

        tracing::debug!(
            "search {:?}: {} ingredients, {} cocktails",
            query,
            ingredients.len(),
            cocktails.len()
        );

        Ok(SearchResult {
            ingredients,
            cocktails,
        })
    }

    /// Close the underlying store
    pub fn close(&self) -> Result<()> {
        self.engine.close()
    }
}

fn retain_matching<R: Record>(mut records: Vec<R>, query: &str) -> Vec<R> {
    records.retain(|record| record.names().iter().any(|name| name.contains(query)));
    records
}
