//! In-memory catalog adapter
//!
//! Same contract as [`KvCatalog`](super::KvCatalog) without a file: records
//! are still serialized, so encode/decode behaviour matches.

use std::collections::{BTreeMap, HashMap};

use parking_lot::RwLock;

use crate::error::{BarkeepError, Result};

use super::record::{decode_record, encode_record, Record};
use super::{CatalogEngine, Cocktail, Ingredient, TOP_BUCKETS};

type Buckets = HashMap<&'static str, BTreeMap<String, Vec<u8>>>;

/// [`CatalogEngine`] over maps guarded by one lock
pub struct MemoryCatalog {
    /// `None` once closed
    buckets: RwLock<Option<Buckets>>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        let buckets = TOP_BUCKETS
            .iter()
            .map(|name| (*name, BTreeMap::new()))
            .collect();

        Self {
            buckets: RwLock::new(Some(buckets)),
        }
    }

    /// Store raw bytes under `id`, bypassing encoding
    ///
    /// Lets tests plant malformed records.
    pub fn put_raw(&self, bucket: &str, id: &str, value: Vec<u8>) -> Result<()> {
        let mut guard = self.buckets.write();
        let buckets = guard.as_mut().ok_or(BarkeepError::Closed)?;
        let table = buckets
            .get_mut(bucket)
            .ok_or_else(|| BarkeepError::BucketNotFound(bucket.to_string()))?;
        table.insert(id.to_string(), value);
        Ok(())
    }

    fn create<R: Record>(&self, record: &R) -> Result<String> {
        let value = encode_record(record)?;
        let mut guard = self.buckets.write();
        let table = Self::table_mut::<R>(&mut guard)?;

        if table.contains_key(record.id()) {
            return Err(BarkeepError::DuplicateKey {
                bucket: R::BUCKET.to_string(),
                key: record.id().to_string(),
            });
        }
        table.insert(record.id().to_string(), value);
        Ok(record.id().to_string())
    }

    fn save<R: Record>(&self, record: &R) -> Result<()> {
        let value = encode_record(record)?;
        let mut guard = self.buckets.write();
        Self::table_mut::<R>(&mut guard)?.insert(record.id().to_string(), value);
        Ok(())
    }

    fn load<R: Record>(&self, id: &str) -> Result<R> {
        let guard = self.buckets.read();
        let buckets = guard.as_ref().ok_or(BarkeepError::Closed)?;
        let value = buckets
            .get(R::BUCKET)
            .and_then(|table| table.get(id))
            .ok_or_else(|| BarkeepError::NotFound {
                bucket: R::BUCKET.to_string(),
                key: id.to_string(),
            })?;
        decode_record(id.as_bytes(), value)
    }

    fn load_all<R: Record>(&self) -> Result<Vec<R>> {
        let guard = self.buckets.read();
        let buckets = guard.as_ref().ok_or(BarkeepError::Closed)?;
        match buckets.get(R::BUCKET) {
            Some(table) => table
                .iter()
                .map(|(key, value)| decode_record(key.as_bytes(), value))
                .collect(),
            None => Ok(Vec::new()),
        }
    }

    fn table_mut<'a, R: Record>(
        guard: &'a mut Option<Buckets>,
    ) -> Result<&'a mut BTreeMap<String, Vec<u8>>> {
        let buckets = guard.as_mut().ok_or(BarkeepError::Closed)?;
        Ok(buckets.entry(R::BUCKET).or_default())
    }
}

impl Default for MemoryCatalog {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogEngine for MemoryCatalog {
    fn create_ingredient(&self, ingredient: &Ingredient) -> Result<String> {
        self.create(ingredient)
    }

    fn update_ingredient(&self, ingredient: &Ingredient) -> Result<()> {
        self.save(ingredient)
    }

    fn get_ingredient(&self, id: &str) -> Result<Ingredient> {
        self.load(id)
    }

    fn list_ingredients(&self) -> Result<Vec<Ingredient>> {
        self.load_all()
    }

    fn create_cocktail(&self, cocktail: &Cocktail) -> Result<String> {
        self.create(cocktail)
    }

    fn update_cocktail(&self, cocktail: &Cocktail) -> Result<()> {
        self.save(cocktail)
    }

    fn get_cocktail(&self, id: &str) -> Result<Cocktail> {
        self.load(id)
    }

    fn list_cocktails(&self) -> Result<Vec<Cocktail>> {
        self.load_all()
    }

    fn close(&self) -> Result<()> {
        self.buckets.write().take();
        Ok(())
    }
}
