//! Row access for billing configurations.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::core::{
    BillingConfiguration, CobranzaError, ConfigurationFields, ConfigurationId, ConfigurationKey,
};

/// Storage for billing configurations.
///
/// Implementations must keep at most one active row per key and report
/// write failures as [`CobranzaError::Persistence`].
#[async_trait]
pub trait ConfigurationStore: Send + Sync {
    /// The active configuration for `key`, if any.
    async fn find_active(
        &self,
        key: &ConfigurationKey,
    ) -> Result<Option<BillingConfiguration>, CobranzaError>;

    /// Insert a new active, persistent configuration for `key`.
    async fn insert(
        &self,
        key: &ConfigurationKey,
        fields: &ConfigurationFields,
    ) -> Result<BillingConfiguration, CobranzaError>;

    /// Overwrite the fields of an active configuration in place.
    async fn update(
        &self,
        id: ConfigurationId,
        fields: &ConfigurationFields,
    ) -> Result<BillingConfiguration, CobranzaError>;

    /// Mark a configuration inactive. Rows are never deleted.
    async fn deactivate(&self, id: ConfigurationId) -> Result<(), CobranzaError>;
}

/// In-memory configuration store.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryConfigurationStore {
    inner: RwLock<Rows>,
}

#[derive(Debug, Default)]
struct Rows {
    rows: Vec<BillingConfiguration>,
    last_id: ConfigurationId,
}

impl InMemoryConfigurationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// All rows, active or not, in insertion order.
    pub fn snapshot(&self) -> Vec<BillingConfiguration> {
        self.inner
            .read()
            .map(|inner| inner.rows.clone())
            .unwrap_or_default()
    }

    fn poisoned() -> CobranzaError {
        CobranzaError::Persistence("configuration store lock poisoned".into())
    }
}

#[async_trait]
impl ConfigurationStore for InMemoryConfigurationStore {
    async fn find_active(
        &self,
        key: &ConfigurationKey,
    ) -> Result<Option<BillingConfiguration>, CobranzaError> {
        let inner = self.inner.read().map_err(|_| Self::poisoned())?;
        Ok(inner
            .rows
            .iter()
            .find(|row| row.active && row.key == *key)
            .cloned())
    }

    async fn insert(
        &self,
        key: &ConfigurationKey,
        fields: &ConfigurationFields,
    ) -> Result<BillingConfiguration, CobranzaError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        if inner.rows.iter().any(|row| row.active && row.key == *key) {
            return Err(CobranzaError::Persistence(format!(
                "an active configuration already exists for {key}"
            )));
        }

        inner.last_id += 1;
        let now = Utc::now();
        let row = BillingConfiguration {
            id: inner.last_id,
            key: *key,
            fields: fields.clone(),
            invoice_only: false,
            active: true,
            created_at: now,
            updated_at: now,
        };
        inner.rows.push(row.clone());
        Ok(row)
    }

    async fn update(
        &self,
        id: ConfigurationId,
        fields: &ConfigurationFields,
    ) -> Result<BillingConfiguration, CobranzaError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        let row = inner
            .rows
            .iter_mut()
            .find(|row| row.id == id && row.active)
            .ok_or_else(|| {
                CobranzaError::Persistence(format!("no active configuration with id {id}"))
            })?;

        row.fields = fields.clone();
        row.updated_at = Utc::now();
        Ok(row.clone())
    }

    async fn deactivate(&self, id: ConfigurationId) -> Result<(), CobranzaError> {
        let mut inner = self.inner.write().map_err(|_| Self::poisoned())?;
        let row = inner
            .rows
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| CobranzaError::Persistence(format!("no configuration with id {id}")))?;

        row.active = false;
        row.updated_at = Utc::now();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn fields() -> ConfigurationFields {
        ConfigurationFields {
            special_base_rate: Some(dec!(3.5)),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn one_active_row_per_key() {
        let store = InMemoryConfigurationStore::new();
        let key = ConfigurationKey::new(1, 2, 3);
        store.insert(&key, &fields()).await.unwrap();

        let err = store.insert(&key, &fields()).await.unwrap_err();
        assert!(matches!(err, CobranzaError::Persistence(_)));
    }

    #[tokio::test]
    async fn deactivated_rows_are_kept() {
        let store = InMemoryConfigurationStore::new();
        let key = ConfigurationKey::new(1, 2, 3);
        let row = store.insert(&key, &fields()).await.unwrap();
        store.deactivate(row.id).await.unwrap();

        assert!(store.find_active(&key).await.unwrap().is_none());
        assert_eq!(store.snapshot().len(), 1);

        // A new active row may follow.
        let next = store.insert(&key, &fields()).await.unwrap();
        assert_eq!(next.id, 2);
    }

    #[tokio::test]
    async fn update_requires_active_row() {
        let store = InMemoryConfigurationStore::new();
        assert!(store.update(99, &fields()).await.is_err());
    }
}
