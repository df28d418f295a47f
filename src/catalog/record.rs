//! Catalog record types

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::error::{BarkeepError, Result};

/// Bucket holding ingredient records
pub const INGREDIENT_BUCKET: &str = "ingredients";

/// Bucket holding cocktail records
pub const COCKTAIL_BUCKET: &str = "cocktail-history";

/// Bucket reserved for user data
pub const USER_BUCKET: &str = "users";

/// Every top-level bucket the catalog expects to exist
pub const TOP_BUCKETS: [&str; 3] = [INGREDIENT_BUCKET, COCKTAIL_BUCKET, USER_BUCKET];

/// A record persisted under its id in a fixed bucket
pub trait Record: Serialize + DeserializeOwned + Send {
    /// Bucket the record type lives in
    const BUCKET: &'static str;

    /// Primary key
    fn id(&self) -> &str;

    /// Localized and English names, for substring search
    fn names(&self) -> [&str; 2];
}

/// A drink component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingredient {
    pub id: String,
    pub name: String,
    pub en_name: String,
    /// Alcohol by volume, percent
    pub abv: i32,
}

impl Ingredient {
    pub fn new(id: impl Into<String>, name: impl Into<String>, en_name: impl Into<String>, abv: i32) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            en_name: en_name.into(),
            abv,
        }
    }
}

impl Record for Ingredient {
    const BUCKET: &'static str = INGREDIENT_BUCKET;

    fn id(&self) -> &str {
        &self.id
    }

    fn names(&self) -> [&str; 2] {
        [&self.name, &self.en_name]
    }
}

/// A mixed drink
///
/// Everything except `id` defaults when missing, so records written by an
/// older schema keep decoding.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cocktail {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub en_name: String,
    /// Ids of the ingredients that go into it
    #[serde(default)]
    pub ingredients: Vec<String>,
}

impl Cocktail {
    pub fn new(id: impl Into<String>, name: impl Into<String>, en_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            en_name: en_name.into(),
            ingredients: Vec::new(),
        }
    }

    /// Add an ingredient id
    pub fn with_ingredient(mut self, ingredient_id: impl Into<String>) -> Self {
        self.ingredients.push(ingredient_id.into());
        self
    }
}

impl Record for Cocktail {
    const BUCKET: &'static str = COCKTAIL_BUCKET;

    fn id(&self) -> &str {
        &self.id
    }

    fn names(&self) -> [&str; 2] {
        [&self.name, &self.en_name]
    }
}

/// Serialize a record for storage
pub(crate) fn encode_record<R: Record>(record: &R) -> Result<Vec<u8>> {
    serde_json::to_vec(record)
        .map_err(|e| BarkeepError::Encode(format!("can't marshal {}/{}: {}", R::BUCKET, record.id(), e)))
}

/// Deserialize a stored record
pub(crate) fn decode_record<R: Record>(key: &[u8], bytes: &[u8]) -> Result<R> {
    serde_json::from_slice(bytes).map_err(|e| {
        BarkeepError::Decode(format!(
            "failed to unmarshal {}/{}: {}",
            R::BUCKET,
            String::from_utf8_lossy(key),
            e
        ))
    })
}
