//! Catalog Module
//!
//! Typed ingredient and cocktail storage on top of the engine.
//!
//! ## Layers
//! - [`CatalogEngine`]: the adapter interface (create / update / get / list)
//! - [`KvCatalog`]: adapter over the embedded [`Database`](crate::Database)
//! - [`MemoryCatalog`]: adapter over plain maps, for tests
//! - [`DataService`]: validation, substring find, composite search
//!
//! Filtering lives only in the service; adapters return whole buckets.

mod kv;
mod memory;
mod record;
mod service;
mod validation;

pub use kv::KvCatalog;
pub use memory::MemoryCatalog;
pub use record::{
    Cocktail, Ingredient, Record, COCKTAIL_BUCKET, INGREDIENT_BUCKET, TOP_BUCKETS, USER_BUCKET,
};
pub use service::{DataService, SearchResult};
pub use validation::{validate_cocktail, validate_ingredient};

use crate::error::Result;

/// Storage operations the data service needs
///
/// `create_*` rejects an id that already exists with `DuplicateKey`;
/// `update_*` overwrites or inserts. `get_*` fails with `NotFound`, and
/// `list_*` returns records in id byte order, failing as a whole if any
/// record cannot be decoded. After `close` everything fails with `Closed`.
pub trait CatalogEngine: Send + Sync {
    fn create_ingredient(&self, ingredient: &Ingredient) -> Result<String>;
    fn update_ingredient(&self, ingredient: &Ingredient) -> Result<()>;
    fn get_ingredient(&self, id: &str) -> Result<Ingredient>;
    fn list_ingredients(&self) -> Result<Vec<Ingredient>>;

    fn create_cocktail(&self, cocktail: &Cocktail) -> Result<String>;
    fn update_cocktail(&self, cocktail: &Cocktail) -> Result<()>;
    fn get_cocktail(&self, id: &str) -> Result<Cocktail>;
    fn list_cocktails(&self) -> Result<Vec<Cocktail>>;

    /// Release the underlying store; idempotent
    fn close(&self) -> Result<()>;
}
