use anyhow::Result;

use super::db::{decode, encode, BytesTable};
use super::model::UpdatePayload;

pub(crate) const UPDATES: BytesTable = BytesTable::new("updates");

const CURRENT: &str = "current";

impl super::db::Store {
    /// Insert or overwrite the singleton update.
    pub fn put_update(&self, update: &UpdatePayload) -> Result<()> {
        let bytes = encode(update)?;

        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(UPDATES)?;
            table.insert(CURRENT, bytes.as_slice())?;
        }
        write_txn.commit()?;
        Ok(())
    }

    pub fn get_update(&self) -> Result<Option<UpdatePayload>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(UPDATES)?;
        match table.get(CURRENT)? {
            Some(guard) => Ok(Some(decode(guard.value())?)),
            None => Ok(None),
        }
    }
}
