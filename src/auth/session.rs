use chrono::{DateTime, Duration, Utc};
use log::{debug, info, warn};
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

/// 已登出 token 的黑名单。只保存 token 的 SHA-256 摘要。
pub struct SessionRegistry {
    revoked: Mutex<HashMap<String, DateTime<Utc>>>,
    token_ttl: Duration,
}

fn digest(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

impl SessionRegistry {
    pub fn new(token_ttl: Duration) -> Self {
        info!("初始化会话注册表");
        Self {
            revoked: Mutex::new(HashMap::new()),
            token_ttl,
        }
    }

    fn revoked(&self) -> MutexGuard<'_, HashMap<String, DateTime<Utc>>> {
        self.revoked.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn revoke(&self, token: &str) {
        self.revoke_at(token, Utc::now());
    }

    fn revoke_at(&self, token: &str, at: DateTime<Utc>) {
        self.revoked().insert(digest(token), at);
        info!("Token 已加入黑名单");
    }

    pub fn is_revoked(&self, token: &str) -> bool {
        let revoked = self.revoked().contains_key(&digest(token));
        if revoked {
            warn!("Token 在黑名单中");
        }
        revoked
    }

    /// 超过 token 有效期的条目已无意义，token 本身会因过期被拒绝
    pub fn cleanup_expired(&self) -> usize {
        self.cleanup_expired_at(Utc::now())
    }

    fn cleanup_expired_at(&self, now: DateTime<Utc>) -> usize {
        debug!("清理过期的 token");
        let ttl = self.token_ttl;
        let mut revoked = self.revoked();
        let before = revoked.len();
        revoked.retain(|_, at| now - *at <= ttl);
        let removed = before - revoked.len();
        info!("清理了 {} 个过期的 token", removed);
        removed
    }
}
