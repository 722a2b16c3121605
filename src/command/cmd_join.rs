use super::{CommandHandler, CommandResponse, INTERNAL_ERROR};
use crate::auth::{NewAccount, StoreError, BCRYPT_MAX_BYTES};
use actix_web::{web, HttpResponse};
use chrono::Utc;
use log::{debug, error, info, warn};
use serde_json::json;
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError};

pub struct JoinCommand;

impl JoinCommand {
    pub fn new() -> Self {
        JoinCommand
    }
}

#[derive(Debug, Validate)]
struct JoinRequest {
    #[validate(email(message = "邮箱格式不正确"))]
    email: String,
    #[validate(
        length(min = 8, message = "密码长度不能少于8个字符"),
        custom(function = "password_within_bcrypt_limit")
    )]
    password: String,
    #[validate(length(min = 1, max = 100, message = "名称长度必须在1到100个字符之间"))]
    name: Option<String>,
}

/// bcrypt 只使用前 72 个字节，按字节而非字符计数
fn password_within_bcrypt_limit(password: &str) -> Result<(), ValidationError> {
    if password.len() > BCRYPT_MAX_BYTES {
        return Err(ValidationError::new("password_bytes")
            .with_message(Cow::Borrowed("密码不能超过72个字节")));
    }
    Ok(())
}

impl JoinRequest {
    /// join <email> <password> [--name <名称...>]
    fn parse(args: &[&str]) -> Result<Self, String> {
        if args.len() < 3 {
            return Err("邮箱和密码为必填项".to_string());
        }

        let mut name = None;
        let mut i = 3;
        while i < args.len() {
            match args[i] {
                "--name" => {
                    if i + 1 >= args.len() {
                        return Err("请提供名称".to_string());
                    }
                    // 名称可以包含空格，取剩余全部参数
                    name = Some(args[i + 1..].join(" "));
                    i = args.len();
                }
                other => return Err(format!("未知参数: {}", other)),
            }
        }

        Ok(Self {
            email: args[1].to_string(),
            password: args[2].to_string(),
            name,
        })
    }

    fn first_error(&self) -> Option<String> {
        let errors = self.validate().err()?;
        let message = errors
            .field_errors()
            .values()
            .flat_map(|errs| errs.iter())
            .filter_map(|e| e.message.as_ref().map(|m| m.to_string()))
            .next()
            .unwrap_or_else(|| "参数无效".to_string());
        Some(message)
    }
}

#[async_trait::async_trait]
impl CommandHandler for JoinCommand {
    fn name(&self) -> &'static str {
        "join"
    }

    fn description(&self) -> &'static str {
        "注册新账户，用法：join <email> <password> [--name <名称>]"
    }

    async fn handle(
        &self,
        args: &[&str],
        data: &web::Data<crate::AppState>,
        _token: &str,
    ) -> HttpResponse {
        info!("开始处理注册命令");

        let request = match JoinRequest::parse(args) {
            Ok(request) => request,
            Err(e) => {
                warn!("注册命令参数错误: {}", e);
                return HttpResponse::BadRequest().json(CommandResponse::failure(e));
            }
        };

        if let Some(e) = request.first_error() {
            warn!("注册参数验证失败: {}", e);
            return HttpResponse::BadRequest().json(CommandResponse::failure(e));
        }
        debug!("注册账户: {}", request.email);

        // 哈希是阻塞操作，放到线程池中执行
        let hasher = data.hasher.clone();
        let password = request.password.clone();
        let password_hash = match web::block(move || hasher.hash(&password)).await {
            Ok(Ok(hash)) => hash,
            Ok(Err(e)) => {
                error!("密码加密失败: {}", e);
                return HttpResponse::InternalServerError()
                    .json(CommandResponse::failure(INTERNAL_ERROR));
            }
            Err(e) => {
                error!("密码加密任务失败: {}", e);
                return HttpResponse::InternalServerError()
                    .json(CommandResponse::failure(INTERNAL_ERROR));
            }
        };

        let account = NewAccount {
            id: Uuid::new_v4().to_string(),
            email: request.email,
            name: request.name,
            password_hash,
            created_at: Utc::now(),
        };

        match data.accounts.create_account(&account).await {
            Ok(user) => {
                info!("账户注册成功: {}", user.email);
                HttpResponse::Created().json(CommandResponse::ok(
                    "账户创建成功",
                    Some(json!({
                        "user": {
                            "id": user.id,
                            "name": user.name,
                            "email": user.email,
                            "created_at": user.created_at,
                        }
                    })),
                ))
            }
            Err(StoreError::Conflict(email)) => {
                warn!("邮箱已被使用: {}", email);
                HttpResponse::Conflict().json(CommandResponse::failure("该邮箱已被使用"))
            }
            Err(e) => {
                error!("账户注册失败: {}", e);
                HttpResponse::InternalServerError().json(CommandResponse::failure(INTERNAL_ERROR))
            }
        }
    }
}
