//! Profile persistence
//!
//! One document per user in the `users` collection, keyed by uid. Identity
//! fields are written once at account creation; the onboarding plan is
//! written as a single patch so the calculated numbers and their inputs
//! never diverge.

use crate::store::{DocKey, DocumentStore, StoreError};
use nutrilens_shared::models::UserProfileData;
use serde_json::{Map, Value};
use std::sync::Arc;

const COLLECTION: &str = "users";

fn key(uid: &str) -> DocKey {
    DocKey::new(COLLECTION, uid)
}

#[derive(Clone)]
pub struct ProfileRepository {
    store: Arc<dyn DocumentStore>,
}

impl ProfileRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn get(&self, uid: &str) -> Result<Option<UserProfileData>, StoreError> {
        match self.store.get(&key(uid)).await? {
            Some(doc) => Ok(Some(serde_json::from_value(doc)?)),
            None => Ok(None),
        }
    }

    /// Create the identity document; an existing profile is returned as-is
    pub async fn create_if_absent(
        &self,
        profile: &UserProfileData,
    ) -> Result<UserProfileData, StoreError> {
        let seed = serde_json::to_value(profile)?;
        let stored = self.store.create_if_absent(&key(&profile.uid), seed).await?;
        Ok(serde_json::from_value(stored)?)
    }

    /// Overwrite the named plan fields in one write
    pub async fn apply_plan(
        &self,
        uid: &str,
        fields: Map<String, Value>,
    ) -> Result<UserProfileData, StoreError> {
        let stored = self.store.patch(&key(uid), fields).await?;
        Ok(serde_json::from_value(stored)?)
    }
}
