use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use super::types::{CredentialRecord, FailureState, NewAccount};

mod postgres;
pub use postgres::PgCredentialStore;

#[cfg(test)]
mod memory;
#[cfg(test)]
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0}")]
    Storage(String),

    #[error("账户已存在: {0}")]
    Conflict(String),
}

/// 账户记录存储，以 email 为键（区分大小写，不做规范化）。
///
/// 每个方法都是单条记录上的原子操作。
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, StoreError>;

    async fn find_by_id(&self, id: &str) -> Result<Option<CredentialRecord>, StoreError>;

    /// 邮箱已被占用时返回 `StoreError::Conflict`
    async fn create_account(&self, account: &NewAccount) -> Result<CredentialRecord, StoreError>;

    /// 失败计数加一；若新计数 >= threshold，在同一次更新中把 locked_at 设为 now，
    /// 否则 locked_at 保持不变。账户不存在时返回 `None`。
    async fn record_failure(
        &self,
        email: &str,
        threshold: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<FailureState>, StoreError>;

    /// failed_attempts 归零、locked_at 置空。返回账户是否存在。
    async fn reset_attempts(&self, email: &str) -> Result<bool, StoreError>;

    /// 仅当 locked_at 仍等于 observed 时才清除锁定并归零计数，
    /// 避免覆盖并发设置的新锁。返回是否实际清除。
    async fn clear_expired_lock(
        &self,
        email: &str,
        observed: DateTime<Utc>,
    ) -> Result<bool, StoreError>;
}
