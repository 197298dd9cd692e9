//! The single shared update and the key check guarding reads of it.

use chrono::NaiveDateTime;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ApiError, ApiResult, MISSING_APIKEY, MISSING_FIELDS, NO_UPDATE};
use crate::registry::{now, present, KeyRegistry};
use crate::store::{Store, UpdatePayload};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct UpdateDraft {
    pub pesan: Option<String>,
    pub link: Option<String>,
}

#[derive(Clone)]
pub struct UpdateGate {
    store: Store,
    registry: KeyRegistry,
}

impl UpdateGate {
    pub fn new(store: Store, registry: KeyRegistry) -> Self {
        Self { store, registry }
    }

    /// Replace the current update, creating it on first use.
    pub fn set(&self, draft: &UpdateDraft) -> ApiResult<UpdatePayload> {
        let (Some(message), Some(link)) = (present(&draft.pesan), present(&draft.link)) else {
            return Err(ApiError::Validation(MISSING_FIELDS));
        };

        let update = UpdatePayload {
            message: message.to_owned(),
            link: link.to_owned(),
        };
        self.store.put_update(&update)?;
        debug!(link = %update.link, "update saved");
        Ok(update)
    }

    pub fn get(&self, key: Option<&str>) -> ApiResult<UpdatePayload> {
        self.get_at(key, now())
    }

    /// Return the current update if `key` is known, unexpired at `now`, and
    /// has quota left. Quota is not consumed.
    pub fn get_at(&self, key: Option<&str>, now: NaiveDateTime) -> ApiResult<UpdatePayload> {
        let key = key
            .filter(|k| !k.is_empty())
            .ok_or(ApiError::Validation(MISSING_APIKEY))?;
        self.registry.require_valid_at(key, now)?;
        self.store
            .get_update()?
            .ok_or(ApiError::NotFound(NO_UPDATE))
    }
}
