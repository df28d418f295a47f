//! Catalog adapter over the embedded store
//!
//! Each record type maps to one top-level bucket; values are JSON documents
//! keyed by the record id.

use crate::config::Config;
use crate::engine::Database;
use crate::error::{BarkeepError, Result};

use super::record::{decode_record, encode_record, Record};
use super::{CatalogEngine, Cocktail, Ingredient, TOP_BUCKETS};

/// [`CatalogEngine`] backed by a [`Database`]
///
/// Owns the database; closing the catalog closes the file.
pub struct KvCatalog {
    db: Database,
}

impl KvCatalog {
    /// Open the store at `config.path` and make sure the top-level buckets exist
    pub fn open(config: Config) -> Result<Self> {
        tracing::info!("Opening catalog store at {}", config.path.display());
        Self::new(Database::open(config)?)
    }

    /// Wrap an already open database, creating missing buckets
    pub fn new(db: Database) -> Result<Self> {
        let created = db.update(|tx| {
            for bucket in TOP_BUCKETS {
                tx.create_bucket_if_not_exists(bucket)?;
            }
            Ok(tx.pending_len())
        });

        match created {
            Ok(count) => {
                tracing::debug!("Catalog buckets ready ({} created)", count);
                Ok(Self { db })
            }
            Err(e) => {
                let _ = db.close();
                Err(BarkeepError::Open(format!("failed to create top level buckets: {}", e)))
            }
        }
    }

    /// The underlying database
    pub fn database(&self) -> &Database {
        &self.db
    }

    /// Insert a record, rejecting an id already present
    fn create<R: Record>(&self, record: &R) -> Result<String> {
        let value = encode_record(record)?;
        let key = record.id().as_bytes();

        self.db.update(|tx| {
            let mut bucket = tx.bucket_mut(R::BUCKET)?;
            if bucket.contains_key(key) {
                return Err(BarkeepError::DuplicateKey {
                    bucket: R::BUCKET.to_string(),
                    key: record.id().to_string(),
                });
            }
            bucket.put(key, &value)
        })?;

        tracing::debug!("Created {}/{}", R::BUCKET, record.id());
        Ok(record.id().to_string())
    }

    /// Write a record whether or not its id exists
    fn save<R: Record>(&self, record: &R) -> Result<()> {
        let value = encode_record(record)?;
        self.db
            .update(|tx| tx.put(R::BUCKET, record.id().as_bytes(), &value))?;

        tracing::debug!("Saved {}/{}", R::BUCKET, record.id());
        Ok(())
    }

    fn load<R: Record>(&self, id: &str) -> Result<R> {
        self.db.view(|tx| {
            let bucket = tx.bucket(R::BUCKET)?;
            let value = bucket.get(id.as_bytes()).ok_or_else(|| BarkeepError::NotFound {
                bucket: R::BUCKET.to_string(),
                key: id.to_string(),
            })?;
            decode_record(id.as_bytes(), value)
        })
    }

    fn load_all<R: Record>(&self) -> Result<Vec<R>> {
        self.db.view(|tx| {
            tx.bucket(R::BUCKET)?
                .iter()
                .map(|(key, value)| decode_record(key, value))
                .collect()
        })
    }
}

impl CatalogEngine for KvCatalog {
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
        self.db.close()
    }
}
