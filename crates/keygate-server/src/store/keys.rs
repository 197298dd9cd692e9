use anyhow::Result;
use redb::ReadableTable;

use super::db::{decode, encode, BytesTable};
use super::model::ApiKeyRecord;

pub(crate) const APIKEYS: BytesTable = BytesTable::new("apikeys");

#[derive(Debug, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyExists,
}

#[derive(Debug, PartialEq, Eq)]
pub enum ReplaceOutcome {
    Replaced,
    NotFound,
    /// The new key name is held by another record.
    Conflict,
}

#[derive(Debug, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// Carries the quota left after the decrement.
    Decremented(u64),
    NotFound,
    Exhausted,
}

impl super::db::Store {
    /// Insert a new record unless its key is already taken.
    pub fn insert_key(&self, record: &ApiKeyRecord) -> Result<InsertOutcome> {
        let bytes = encode(record)?;

        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(APIKEYS)?;
            if table.get(record.key.as_str())?.is_some() {
                InsertOutcome::AlreadyExists
            } else {
                table.insert(record.key.as_str(), bytes.as_slice())?;
                InsertOutcome::Inserted
            }
        };

        if outcome == InsertOutcome::Inserted {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(outcome)
    }

    /// Replace the record stored under `old_key` with `record`, renaming it
    /// when `record.key` differs. Existence and collision checks run in the
    /// same write transaction as the replacement.
    pub fn replace_key(&self, old_key: &str, record: &ApiKeyRecord) -> Result<ReplaceOutcome> {
        let bytes = encode(record)?;

        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(APIKEYS)?;
            let renamed = old_key != record.key;

            if table.get(old_key)?.is_none() {
                ReplaceOutcome::NotFound
            } else if renamed && table.get(record.key.as_str())?.is_some() {
                ReplaceOutcome::Conflict
            } else {
                if renamed {
                    table.remove(old_key)?;
                }
                table.insert(record.key.as_str(), bytes.as_slice())?;
                ReplaceOutcome::Replaced
            }
        };

        if outcome == ReplaceOutcome::Replaced {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(outcome)
    }

    pub fn get_key(&self, key: &str) -> Result<Option<ApiKeyRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(APIKEYS)?;
        match table.get(key)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }

    /// All records in key order.
    pub fn list_keys(&self) -> Result<Vec<ApiKeyRecord>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(APIKEYS)?;

        let mut records = Vec::new();
        for item in table.iter()? {
            let (_k, v) = item?;
            records.push(decode(v.value())?);
        }
        Ok(records)
    }

    /// Take one unit of quota from `key`. The read, the check, and the write
    /// share one write transaction, so concurrent callers are serialized and
    /// quota never underflows.
    pub fn decrement_quota(&self, key: &str) -> Result<DecrementOutcome> {
        let write_txn = self.db.begin_write()?;
        let outcome = {
            let mut table = write_txn.open_table(APIKEYS)?;
            let current: Option<ApiKeyRecord> = match table.get(key)? {
                Some(guard) => Some(decode(guard.value())?),
                None => None,
            };

            match current {
                None => DecrementOutcome::NotFound,
                Some(record) if !record.has_quota() => DecrementOutcome::Exhausted,
                Some(mut record) => {
                    record.quota -= 1;
                    let bytes = encode(&record)?;
                    table.insert(key, bytes.as_slice())?;
                    DecrementOutcome::Decremented(record.quota)
                }
            }
        };

        if matches!(outcome, DecrementOutcome::Decremented(_)) {
            write_txn.commit()?;
        } else {
            write_txn.abort()?;
        }
        Ok(outcome)
    }
}
