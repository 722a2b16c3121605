use thiserror::Error;

use super::store::StoreError;

#[derive(Debug, Error)]
pub enum HashError {
    #[error("密码哈希失败: {0}")]
    Hash(String),

    #[error("密码校验失败: {0}")]
    Verify(String),
}

/// 认证流程的错误。
///
/// `AccountLocked` 与 `InvalidCredentials` 是面向最终用户的结果，消息刻意保持笼统；
/// 其余变体属于基础设施故障，由调用方决定如何呈现。
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("账户已被临时锁定，请稍后再试")]
    AccountLocked,

    // 账户不存在与密码错误共用同一消息
    #[error("邮箱或密码错误")]
    InvalidCredentials,

    #[error("存储错误: {0}")]
    Storage(#[from] StoreError),

    #[error(transparent)]
    Hash(#[from] HashError),
}
