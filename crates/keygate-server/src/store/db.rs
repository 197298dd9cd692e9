use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use redb::{Database, TableDefinition};
use serde::{de::DeserializeOwned, Serialize};

use super::keys::APIKEYS;
use super::updates::UPDATES;

/// Handle to the redb database. Cheap to clone; all clones share one database.
#[derive(Clone)]
pub struct Store {
    pub(crate) db: Arc<Database>,
}

impl Store {
    /// Open (or create) the database at `path` and make sure every table exists.
    pub fn open(path: &Path) -> Result<Self> {
        let db = Database::create(path)
            .with_context(|| format!("open redb database at {}", path.display()))?;

        let write_txn = db.begin_write()?;
        {
            write_txn.open_table(APIKEYS)?;
            write_txn.open_table(UPDATES)?;
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }
}

pub(crate) type BytesTable = TableDefinition<'static, &'static str, &'static [u8]>;

pub(crate) fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>> {
    bincode::serde::encode_to_vec(value, bincode::config::standard()).context("bincode encode")
}

pub(crate) fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let (value, _) = bincode::serde::decode_from_slice(bytes, bincode::config::standard())
        .context("bincode decode")?;
    Ok(value)
}
