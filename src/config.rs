use chrono::Duration;
use log::LevelFilter;
use std::env;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("缺少必需的环境变量: {0}")]
    Missing(&'static str),

    #[error("环境变量 {key} 的值无效: {value}")]
    Invalid { key: &'static str, value: String },
}

/// 账户锁定策略
#[derive(Debug, Clone, PartialEq)]
pub struct GateConfig {
    /// 连续失败多少次后锁定
    pub lock_threshold: i32,
    /// 锁定窗口
    pub lock_duration: Duration,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            lock_threshold: 5,
            lock_duration: Duration::minutes(30),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub port: u16,
    pub db_max_connections: u32,
    pub log_dir: String,
    pub log_level: LevelFilter,
    pub bcrypt_cost: u32,
    pub token_ttl: Duration,
    pub gate: GateConfig,
}

impl AppConfig {
    /// 从进程环境变量加载配置（调用前应先执行 dotenv）
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &'static str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let lock_threshold: i32 = parse_or(&lookup, "MAX_LOGIN_ATTEMPTS", 5)?;
        if lock_threshold < 1 {
            return Err(ConfigError::Invalid {
                key: "MAX_LOGIN_ATTEMPTS",
                value: lock_threshold.to_string(),
            });
        }
        let lock_duration = bounded_duration(
            &lookup,
            "LOCK_DURATION_MINUTES",
            30,
            MAX_LOCK_MINUTES,
            Duration::try_minutes,
        )?;
        let token_ttl = bounded_duration(
            &lookup,
            "TOKEN_TTL_DAYS",
            30,
            MAX_TOKEN_TTL_DAYS,
            Duration::try_days,
        )?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            bind_addr: lookup("BIND_ADDR").unwrap_or_else(|| "0.0.0.0".to_string()),
            port: parse_or(&lookup, "PORT", 8080)?,
            db_max_connections: parse_or(&lookup, "DB_MAX_CONNECTIONS", 5)?,
            log_dir: lookup("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parse_or(&lookup, "LOG_LEVEL", LevelFilter::Debug)?,
            bcrypt_cost: parse_or(&lookup, "BCRYPT_COST", 12)?,
            token_ttl,
            gate: GateConfig {
                lock_threshold,
                lock_duration,
            },
        })
    }
}

/// 锁定窗口上限：一年
const MAX_LOCK_MINUTES: i64 = 365 * 24 * 60;
/// token 有效期上限：十年
const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// 解析 1..=max 范围内的时长；为 0 会让锁定或会话立即失效，同样视为无效
fn bounded_duration<F>(
    lookup: &F,
    key: &'static str,
    default: i64,
    max: i64,
    to_duration: fn(i64) -> Option<Duration>,
) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let amount: i64 = parse_or(lookup, key, default)?;
    if !(1..=max).contains(&amount) {
        return Err(ConfigError::Invalid {
            key,
            value: amount.to_string(),
        });
    }
    to_duration(amount).ok_or(ConfigError::Invalid {
        key,
        value: amount.to_string(),
    })
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            key,
            value: raw,
        }),
        None => Ok(default),
    }
}
