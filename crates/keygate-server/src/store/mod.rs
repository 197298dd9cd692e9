pub mod db;
pub mod keys;
pub mod model;
pub mod updates;

pub use db::Store;
pub use keys::{DecrementOutcome, InsertOutcome, ReplaceOutcome};
pub use model::{ApiKeyRecord, Expiry, ExpiryError, KeyStatus, UpdatePayload, DATE_FORMAT};
