//! API key lifecycle: create, edit, list, inspect, and quota consumption.
//!
//! The registry holds no state of its own; every call goes to the [`Store`].

use chrono::{Local, NaiveDateTime};
use serde::Deserialize;
use tracing::debug;

use crate::error::{
    ApiError, ApiResult, INVALID_DATE, INVALID_LIMIT, KEY_EXISTS, KEY_NOT_FOUND, MISSING_FIELDS,
    NEW_KEY_EXISTS,
};
use crate::store::{
    ApiKeyRecord, DecrementOutcome, Expiry, InsertOutcome, KeyStatus, ReplaceOutcome, Store,
};

/// Current local wall-clock time, the reference for expiry checks.
pub fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// `limitup` as sent by clients: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum QuotaInput {
    Number(i64),
    /// Only whole values such as `5.0` are accepted.
    Float(f64),
    Text(String),
}

impl QuotaInput {
    fn is_blank(&self) -> bool {
        matches!(self, QuotaInput::Text(s) if s.is_empty())
    }

    fn to_quota(&self) -> ApiResult<u64> {
        match self {
            QuotaInput::Number(n) => {
                u64::try_from(*n).map_err(|_| ApiError::Validation(INVALID_LIMIT))
            }
            QuotaInput::Float(f)
                if f.fract() == 0.0 && *f >= 0.0 && *f <= u64::MAX as f64 =>
            {
                Ok(*f as u64)
            }
            QuotaInput::Float(_) => Err(ApiError::Validation(INVALID_LIMIT)),
            QuotaInput::Text(s) => s
                .trim()
                .parse::<u64>()
                .map_err(|_| ApiError::Validation(INVALID_LIMIT)),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyDraft {
    pub apikey: Option<String>,
    pub limitup: Option<QuotaInput>,
    pub expired: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KeyEdit {
    pub apikey: Option<String>,
    pub new_apikey: Option<String>,
    pub limitup: Option<QuotaInput>,
    pub expired: Option<String>,
}

/// A record together with its derived status at the time of inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Inspection {
    pub record: ApiKeyRecord,
    pub status: KeyStatus,
}

/// Returns the field's value unless it is missing or empty.
pub(crate) fn present(field: &Option<String>) -> Option<&str> {
    field.as_deref().filter(|s| !s.is_empty())
}

fn present_quota(field: &Option<QuotaInput>) -> Option<&QuotaInput> {
    field.as_ref().filter(|q| !q.is_blank())
}

fn parse_expiry(raw: &str) -> ApiResult<Expiry> {
    raw.parse().map_err(|_| ApiError::Validation(INVALID_DATE))
}

#[derive(Clone)]
pub struct KeyRegistry {
    store: Store,
}

impl KeyRegistry {
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    pub fn create(&self, draft: &KeyDraft) -> ApiResult<ApiKeyRecord> {
        let (Some(key), Some(quota), Some(expiry)) = (
            present(&draft.apikey),
            present_quota(&draft.limitup),
            present(&draft.expired),
        ) else {
            return Err(ApiError::Validation(MISSING_FIELDS));
        };

        let record = ApiKeyRecord {
            key: key.to_owned(),
            expiry: parse_expiry(expiry)?,
            quota: quota.to_quota()?,
        };

        match self.store.insert_key(&record)? {
            InsertOutcome::Inserted => {
                debug!(
                    key = %record.key,
                    quota = record.quota,
                    expiry = %record.expiry,
                    "apikey created"
                );
                Ok(record)
            }
            InsertOutcome::AlreadyExists => Err(ApiError::Conflict(KEY_EXISTS)),
        }
    }

    /// Replace quota and expiry of `apikey`, renaming it to `new_apikey`.
    /// Renaming onto an existing key is a conflict; keeping the same name is not.
    pub fn edit(&self, edit: &KeyEdit) -> ApiResult<ApiKeyRecord> {
        let (Some(key), Some(new_key), Some(quota), Some(expiry)) = (
            present(&edit.apikey),
            present(&edit.new_apikey),
            present_quota(&edit.limitup),
            present(&edit.expired),
        ) else {
            return Err(ApiError::Validation(MISSING_FIELDS));
        };

        let record = ApiKeyRecord {
            key: new_key.to_owned(),
            expiry: parse_expiry(expiry)?,
            quota: quota.to_quota()?,
        };

        match self.store.replace_key(key, &record)? {
            ReplaceOutcome::Replaced => {
                debug!(from = %key, to = %record.key, quota = record.quota, "apikey updated");
                Ok(record)
            }
            ReplaceOutcome::NotFound => Err(ApiError::NotFound(KEY_NOT_FOUND)),
            ReplaceOutcome::Conflict => Err(ApiError::Conflict(NEW_KEY_EXISTS)),
        }
    }

    pub fn list(&self) -> ApiResult<Vec<ApiKeyRecord>> {
        Ok(self.store.list_keys()?)
    }

    pub fn inspect(&self, key: &str) -> ApiResult<Inspection> {
        self.inspect_at(key, now())
    }

    pub fn inspect_at(&self, key: &str, now: NaiveDateTime) -> ApiResult<Inspection> {
        let record = self
            .store
            .get_key(key)?
            .ok_or(ApiError::NotFound(KEY_NOT_FOUND))?;
        let status = record.status(now);
        Ok(Inspection { record, status })
    }

    /// Take one unit of quota and return what is left. Expiry is not checked.
    pub fn consume(&self, key: &str) -> ApiResult<u64> {
        match self.store.decrement_quota(key)? {
            DecrementOutcome::Decremented(left) => {
                debug!(key, left, "apikey quota consumed");
                Ok(left)
            }
            DecrementOutcome::NotFound => Err(ApiError::NotFound(KEY_NOT_FOUND)),
            DecrementOutcome::Exhausted => Err(ApiError::QuotaExhausted),
        }
    }

    /// Succeeds only for a key that exists, is unexpired at `now`, and has
    /// quota left. Does not consume quota.
    pub fn require_valid_at(&self, key: &str, now: NaiveDateTime) -> ApiResult<ApiKeyRecord> {
        let Inspection { record, status } = self.inspect_at(key, now)?;
        if record.is_valid_for_gating(now) {
            return Ok(record);
        }
        match status {
            KeyStatus::Expired => Err(ApiError::Expired),
            KeyStatus::Active => Err(ApiError::QuotaExhausted),
        }
    }
}
