use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String, // user id
    pub exp: usize,  // expiration time
    pub email: String,
    pub name: Option<String>,
    pub role: String,
}

pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";

/// users 表中的一行
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CredentialRecord {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: String,
    /// 通过外部身份创建的账户没有本地密码
    pub password_hash: Option<String>,
    pub failed_attempts: i32,
    pub locked_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// 注册时写入的字段，其余字段使用默认值
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// 认证成功后返回给会话层的公开身份，不含任何密码信息
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Identity {
    pub id: String,
    pub email: String,
    pub name: Option<String>,
    pub image: Option<String>,
    pub role: String,
}

impl From<CredentialRecord> for Identity {
    fn from(record: CredentialRecord) -> Self {
        Self {
            id: record.id,
            email: record.email,
            name: record.name,
            image: record.image,
            role: record.role,
        }
    }
}

/// 一次失败记录之后的计数状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FailureState {
    pub failed_attempts: i32,
    pub locked_at: Option<DateTime<Utc>>,
}

/// 管理员查看的锁定状态（只读，不会清除过期锁）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LockStatus {
    pub email: String,
    pub failed_attempts: i32,
    pub locked: bool,
    pub locked_at: Option<DateTime<Utc>>,
    pub locked_until: Option<DateTime<Utc>>,
}
