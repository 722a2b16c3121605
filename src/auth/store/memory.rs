use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;

use super::{CredentialStore, StoreError};
use crate::auth::types::{CredentialRecord, FailureState, NewAccount, ROLE_USER};

/// 测试用内存存储，语义与 PgCredentialStore 的 SQL 一致
#[derive(Default)]
pub struct MemoryStore {
    records: Mutex<HashMap<String, CredentialRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: CredentialRecord) {
        self.records
            .lock()
            .unwrap()
            .insert(record.email.clone(), record);
    }

    pub fn get(&self, email: &str) -> Option<CredentialRecord> {
        self.records.lock().unwrap().get(email).cloned()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self.get(email))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self
            .records
            .lock()
            .unwrap()
            .values()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn create_account(&self, account: &NewAccount) -> Result<CredentialRecord, StoreError> {
        let mut records = self.records.lock().unwrap();
        if records.contains_key(&account.email) {
            return Err(StoreError::Conflict(account.email.clone()));
        }
        let record = CredentialRecord {
            id: account.id.clone(),
            email: account.email.clone(),
            name: account.name.clone(),
            image: None,
            role: ROLE_USER.to_string(),
            password_hash: Some(account.password_hash.clone()),
            failed_attempts: 0,
            locked_at: None,
            created_at: account.created_at,
        };
        records.insert(record.email.clone(), record.clone());
        Ok(record)
    }

    async fn record_failure(
        &self,
        email: &str,
        threshold: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<FailureState>, StoreError> {
        let mut records = self.records.lock().unwrap();
        Ok(records.get_mut(email).map(|record| {
            record.failed_attempts += 1;
            if record.failed_attempts >= threshold {
                record.locked_at = Some(now);
            }
            FailureState {
                failed_attempts: record.failed_attempts,
                locked_at: record.locked_at,
            }
        }))
    }

    async fn reset_attempts(&self, email: &str) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        Ok(match records.get_mut(email) {
            Some(record) => {
                record.failed_attempts = 0;
                record.locked_at = None;
                true
            }
            None => false,
        })
    }

    async fn clear_expired_lock(
        &self,
        email: &str,
        observed: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let mut records = self.records.lock().unwrap();
        Ok(match records.get_mut(email) {
            Some(record) if record.locked_at == Some(observed) => {
                record.failed_attempts = 0;
                record.locked_at = None;
                true
            }
            _ => false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use std::sync::Arc;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store.insert(CredentialRecord {
            id: "u-1".to_string(),
            email: "a@x.com".to_string(),
            name: None,
            image: None,
            role: ROLE_USER.to_string(),
            password_hash: None,
            failed_attempts: 0,
            locked_at: None,
            created_at: t0(),
        });
        store
    }

    #[tokio::test]
    async fn clear_skips_a_lock_stamped_after_observation() {
        let store = seeded();
        let observed = store.record_failure("a@x.com", 1, t0()).await.unwrap().unwrap();
        assert_eq!(observed.locked_at, Some(t0()));

        let restamp = t0() + Duration::minutes(40);
        store.record_failure("a@x.com", 1, restamp).await.unwrap();

        assert!(!store.clear_expired_lock("a@x.com", t0()).await.unwrap());
        let record = store.get("a@x.com").unwrap();
        assert_eq!(record.locked_at, Some(restamp));
        assert_eq!(record.failed_attempts, 2);

        assert!(store.clear_expired_lock("a@x.com", restamp).await.unwrap());
        assert_eq!(store.get("a@x.com").unwrap().locked_at, None);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_increments_never_undercount() {
        let store = Arc::new(seeded());
        let handles: Vec<_> = (0..50)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.record_failure("a@x.com", 100, t0()).await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap().unwrap();
        }
        let record = store.get("a@x.com").unwrap();
        assert_eq!(record.failed_attempts, 50);
        assert_eq!(record.locked_at, None);
    }
}
