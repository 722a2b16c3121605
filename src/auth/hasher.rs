use bcrypt::{hash, verify};
use log::{debug, error};

use super::error::HashError;

/// bcrypt 会静默截断超过 72 个字节的输入
pub const BCRYPT_MAX_BYTES: usize = 72;

/// 单向密码哈希原语。两个方法都是有意的 CPU 密集操作，应放在阻塞线程池中调用。
pub trait PasswordHasher: Send + Sync {
    fn hash(&self, password: &str) -> Result<String, HashError>;

    /// 常量时间比较
    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError>;
}

pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Self {
        Self { cost }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, password: &str) -> Result<String, HashError> {
        debug!("加密密码, cost = {}", self.cost);
        if password.len() > BCRYPT_MAX_BYTES {
            return Err(HashError::Hash(format!(
                "密码超过 {} 个字节",
                BCRYPT_MAX_BYTES
            )));
        }
        hash(password.as_bytes(), self.cost).map_err(|e| {
            error!("密码加密失败: {}", e);
            HashError::Hash(e.to_string())
        })
    }

    fn verify(&self, password: &str, hash: &str) -> Result<bool, HashError> {
        debug!("验证密码");
        // 截断后才会相等的输入一律视为不匹配
        if password.len() > BCRYPT_MAX_BYTES {
            return Ok(false);
        }
        verify(password, hash).map_err(|e| {
            error!("密码验证过程出错: {}", e);
            HashError::Verify(e.to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 最低 cost，避免测试过慢
    const TEST_COST: u32 = 4;

    #[test]
    fn hash_is_not_plaintext_and_verifies() {
        let hasher = BcryptHasher::new(TEST_COST);
        let hashed = hasher.hash("correct horse").unwrap();
        assert_ne!(hashed, "correct horse");
        assert!(hashed.starts_with("$2"));
        assert!(hasher.verify("correct horse", &hashed).unwrap());
        assert!(!hasher.verify("wrong horse", &hashed).unwrap());
    }

    #[test]
    fn malformed_hash_is_an_error() {
        let hasher = BcryptHasher::new(TEST_COST);
        assert!(matches!(
            hasher.verify("anything", "not-a-bcrypt-hash"),
            Err(HashError::Verify(_))
        ));
    }

    #[test]
    fn input_past_72_bytes_never_matches_its_prefix() {
        let hasher = BcryptHasher::new(TEST_COST);
        let prefix = "密".repeat(24);
        assert_eq!(prefix.len(), BCRYPT_MAX_BYTES);
        let hashed = hasher.hash(&prefix).unwrap();
        assert!(hasher.verify(&prefix, &hashed).unwrap());

        let longer = format!("{}BBBBBB", prefix);
        assert!(!hasher.verify(&longer, &hashed).unwrap());
        assert!(matches!(hasher.hash(&longer), Err(HashError::Hash(_))));
    }
}
