use chrono::{DateTime, Utc};
use log::{debug, info, warn};
use std::sync::Arc;

use super::clock::{Clock, SystemClock};
use super::error::{AuthError, HashError};
use super::hasher::PasswordHasher;
use super::store::CredentialStore;
use super::types::{Identity, LockStatus};
use crate::config::GateConfig;

/// 凭证闸门：校验邮箱/密码，并维护每个账户的失败计数与锁定时间。
///
/// 所有状态都在 `CredentialStore` 中，闸门本身不持有可变状态。
/// 锁定在窗口内不会因为重复尝试而延长；过期的锁在下一次检查时惰性清除。
///
/// 已知竞态：`authenticate` 中“检查锁定 -> 校验密码 -> 记录结果”整体不是原子的，
/// 两个并发请求可能都通过锁定检查。计数本身由存储层原子递增，不会少算。
pub struct CredentialGate {
    store: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    clock: Arc<dyn Clock>,
    config: GateConfig,
}

impl CredentialGate {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        hasher: Arc<dyn PasswordHasher>,
        config: GateConfig,
    ) -> Self {
        info!(
            "初始化凭证闸门, 阈值: {}, 锁定时长: {} 分钟",
            config.lock_threshold,
            config.lock_duration.num_minutes()
        );
        Self {
            store,
            hasher,
            clock: Arc::new(SystemClock),
            config,
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn lock_expired(&self, locked_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
        now - locked_at >= self.config.lock_duration
    }

    /// 检查账户是否处于锁定窗口内。
    ///
    /// 这是一个可能写入的读操作：若发现锁已过期，会清除 `locked_at`
    /// 并把 `failed_attempts` 归零，然后返回 `false`。
    /// 账户不存在或未锁定时返回 `false`。
    pub async fn check_and_clear_if_expired(&self, email: &str) -> Result<bool, AuthError> {
        debug!("检查账户 {} 的锁定状态", email);
        let locked_at = match self.store.find_by_email(email).await? {
            Some(record) => match record.locked_at {
                Some(t) => t,
                None => return Ok(false),
            },
            None => return Ok(false),
        };

        let now = self.clock.now();
        if self.lock_expired(locked_at, now) {
            if self.store.clear_expired_lock(email, locked_at).await? {
                info!("账户 {} 的锁定已过期，失败次数已重置", email);
                return Ok(false);
            }
            // 读取之后 locked_at 已被并发更新，以最新记录为准
            debug!("账户 {} 的锁定在检查期间被更新", email);
            let current = self
                .store
                .find_by_email(email)
                .await?
                .and_then(|record| record.locked_at);
            return Ok(current.map_or(false, |t| !self.lock_expired(t, now)));
        }

        warn!("账户 {} 处于锁定状态", email);
        Ok(true)
    }

    /// `check_and_clear_if_expired` 的别名，同样可能写入存储
    pub async fn is_locked(&self, email: &str) -> Result<bool, AuthError> {
        self.check_and_clear_if_expired(email).await
    }

    /// 记录一次失败。账户不存在时静默返回，避免暴露账户是否存在。
    pub async fn record_failure(&self, email: &str) -> Result<(), AuthError> {
        let state = self
            .store
            .record_failure(email, self.config.lock_threshold, self.clock.now())
            .await?;

        match state {
            Some(state) if state.failed_attempts >= self.config.lock_threshold => {
                warn!(
                    "账户 {} 连续失败 {} 次，已锁定",
                    email, state.failed_attempts
                );
            }
            Some(state) => {
                warn!(
                    "账户 {} 登录失败，当前失败次数: {}",
                    email, state.failed_attempts
                );
            }
            None => debug!("账户 {} 不存在，忽略失败记录", email),
        }
        Ok(())
    }

    /// 密码校验成功后调用：计数归零并解除锁定
    pub async fn record_success(&self, email: &str) -> Result<(), AuthError> {
        self.store.reset_attempts(email).await?;
        debug!("账户 {} 的登录失败次数已重置", email);
        Ok(())
    }

    /// 管理员手动解锁，效果与 `record_success` 相同。返回账户是否存在。
    pub async fn unlock(&self, email: &str) -> Result<bool, AuthError> {
        let found = self.store.reset_attempts(email).await?;
        if found {
            info!("账户 {} 已被手动解锁", email);
        } else {
            warn!("手动解锁失败，账户 {} 不存在", email);
        }
        Ok(found)
    }

    /// 只读的锁定状态视图，不会清除过期的锁
    pub async fn lock_status(&self, email: &str) -> Result<Option<LockStatus>, AuthError> {
        let now = self.clock.now();
        Ok(self.store.find_by_email(email).await?.map(|record| {
            let locked_until = record
                .locked_at
                .and_then(|t| t.checked_add_signed(self.config.lock_duration));
            LockStatus {
                locked: record
                    .locked_at
                    .map_or(false, |t| !self.lock_expired(t, now)),
                email: record.email,
                failed_attempts: record.failed_attempts,
                locked_at: record.locked_at,
                locked_until,
            }
        }))
    }

    /// 完整的认证流程。锁定优先于密码校验：锁定窗口内即使密码正确也会失败。
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if self.check_and_clear_if_expired(email).await? {
            return Err(AuthError::AccountLocked);
        }

        let record = match self.store.find_by_email(email).await? {
            Some(record) => record,
            None => {
                self.record_failure(email).await?;
                return Err(AuthError::InvalidCredentials);
            }
        };

        let hash = match record.password_hash.clone() {
            Some(hash) => hash,
            None => {
                debug!("账户 {} 没有本地密码", email);
                self.record_failure(email).await?;
                return Err(AuthError::InvalidCredentials);
            }
        };

        let hasher = self.hasher.clone();
        let password = password.to_string();
        let matched = tokio::task::spawn_blocking(move || hasher.verify(&password, &hash))
            .await
            .map_err(|e| HashError::Verify(e.to_string()))??;

        if !matched {
            self.record_failure(email).await?;
            return Err(AuthError::InvalidCredentials);
        }

        self.record_success(email).await?;
        info!("账户 {} 认证成功", email);
        Ok(Identity::from(record))
    }
}
