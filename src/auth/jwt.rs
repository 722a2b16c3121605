use crate::auth::types::{Claims, Identity};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use log::{debug, error, info};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("token 过期时间超出可表示范围")]
    Expiry,

    #[error(transparent)]
    Encode(#[from] jsonwebtoken::errors::Error),
}

pub fn validate_token(token: &str, secret: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
    debug!("验证 JWT token");
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

pub fn generate_token(
    identity: &Identity,
    secret: &str,
    ttl: Duration,
) -> Result<String, TokenError> {
    debug!("为用户 {} 生成 JWT token", identity.id);
    let exp = Utc::now()
        .checked_add_signed(ttl)
        .ok_or_else(|| {
            error!("用户 {} 的 token 有效期无效: {}", identity.id, ttl);
            TokenError::Expiry
        })?
        .timestamp() as usize;
    let claims = Claims {
        sub: identity.id.clone(),
        exp,
        email: identity.email.clone(),
        name: identity.name.clone(),
        role: identity.role.clone(),
    };

    match encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    ) {
        Ok(token) => {
            info!("成功为用户 {} 生成 token", identity.id);
            Ok(token)
        }
        Err(e) => {
            error!("为用户 {} 生成 token 失败: {}", identity.id, e);
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> Identity {
        Identity {
            id: "u-1".to_string(),
            email: "a@x.com".to_string(),
            name: Some("Alice".to_string()),
            image: None,
            role: "admin".to_string(),
        }
    }

    #[test]
    fn token_carries_identity_claims() {
        let token = generate_token(&identity(), "s3cret", Duration::days(30)).unwrap();
        let claims = validate_token(&token, "s3cret").unwrap();
        assert_eq!(claims.sub, "u-1");
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.role, "admin");
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_token(&identity(), "s3cret", Duration::days(30)).unwrap();
        assert!(validate_token(&token, "other").is_err());
    }

    #[test]
    fn expired_token_is_rejected() {
        // 超出默认 60 秒的时钟容差
        let token = generate_token(&identity(), "s3cret", Duration::minutes(-5)).unwrap();
        assert!(validate_token(&token, "s3cret").is_err());
    }

    #[test]
    fn unrepresentable_expiry_is_an_error() {
        let result = generate_token(&identity(), "s3cret", Duration::days(100_000_000));
        assert!(matches!(result, Err(TokenError::Expiry)));
    }
}
