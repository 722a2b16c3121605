use async_trait::async_trait;
use chrono::{DateTime, Utc};
use log::{debug, error};
use sqlx::PgPool;

use super::{CredentialStore, StoreError};
use crate::auth::types::{CredentialRecord, FailureState, NewAccount};

const RECORD_COLUMNS: &str =
    "id, email, name, image, role, password_hash, failed_attempts, locked_at, created_at";

pub struct PgCredentialStore {
    pool: PgPool,
}

impl PgCredentialStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn storage_error(context: &str, e: sqlx::Error) -> StoreError {
    error!("{}: {}", context, e);
    StoreError::Storage(format!("{}: {}", context, e))
}

#[async_trait]
impl CredentialStore for PgCredentialStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<CredentialRecord>, StoreError> {
        debug!("按邮箱查询账户: {}", email);
        sqlx::query_as::<_, CredentialRecord>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            RECORD_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("查询账户失败", e))
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<CredentialRecord>, StoreError> {
        sqlx::query_as::<_, CredentialRecord>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            RECORD_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("查询账户失败", e))
    }

    async fn create_account(&self, account: &NewAccount) -> Result<CredentialRecord, StoreError> {
        // ON CONFLICT 让“检查是否存在 + 插入”成为一条语句
        let created = sqlx::query_as::<_, CredentialRecord>(&format!(
            r#"
            INSERT INTO users (id, email, name, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (email) DO NOTHING
            RETURNING {}
            "#,
            RECORD_COLUMNS
        ))
        .bind(&account.id)
        .bind(&account.email)
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(account.created_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("创建账户失败", e))?;

        created.ok_or_else(|| StoreError::Conflict(account.email.clone()))
    }

    async fn record_failure(
        &self,
        email: &str,
        threshold: i32,
        now: DateTime<Utc>,
    ) -> Result<Option<FailureState>, StoreError> {
        // SET 中引用的是更新前的值
        let row: Option<(i32, Option<DateTime<Utc>>)> = sqlx::query_as(
            r#"
            UPDATE users
            SET failed_attempts = failed_attempts + 1,
                locked_at = CASE WHEN failed_attempts + 1 >= $2 THEN $3 ELSE locked_at END
            WHERE email = $1
            RETURNING failed_attempts, locked_at
            "#,
        )
        .bind(email)
        .bind(threshold)
        .bind(now)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| storage_error("记录登录失败出错", e))?;

        Ok(row.map(|(failed_attempts, locked_at)| FailureState {
            failed_attempts,
            locked_at,
        }))
    }

    async fn reset_attempts(&self, email: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE users SET failed_attempts = 0, locked_at = NULL WHERE email = $1",
        )
        .bind(email)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("重置登录失败次数出错", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn clear_expired_lock(
        &self,
        email: &str,
        observed: DateTime<Utc>,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET failed_attempts = 0, locked_at = NULL
            WHERE email = $1 AND locked_at = $2
            "#,
        )
        .bind(email)
        .bind(observed)
        .execute(&self.pool)
        .await
        .map_err(|e| storage_error("清除过期锁定出错", e))?;

        Ok(result.rows_affected() > 0)
    }
}
