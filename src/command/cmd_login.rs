use super::{CommandHandler, CommandResponse, INTERNAL_ERROR};
use crate::auth::{generate_token, AuthError};
use actix_web::{web, HttpResponse};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde_json::json;

pub struct LoginCommand;

impl LoginCommand {
    pub fn new() -> Self {
        LoginCommand
    }
}

#[async_trait]
impl CommandHandler for LoginCommand {
    fn name(&self) -> &'static str {
        "login"
    }

    fn description(&self) -> &'static str {
        "用户登录，用法：login <email> <password>"
    }

    async fn handle(
        &self,
        args: &[&str],
        data: &web::Data<crate::AppState>,
        _token: &str,
    ) -> HttpResponse {
        info!("开始处理登录命令");

        if args.len() != 3 {
            warn!("登录命令参数数量错误");
            return HttpResponse::BadRequest()
                .json(CommandResponse::failure("邮箱和密码为必填项"));
        }

        let email = args[1];
        let password = args[2];
        debug!("尝试登录账户: {}", email);

        let identity = match data.gate.authenticate(email, password).await {
            Ok(identity) => identity,
            Err(AuthError::AccountLocked) => {
                return HttpResponse::TooManyRequests()
                    .json(CommandResponse::failure(AuthError::AccountLocked.to_string()));
            }
            Err(AuthError::InvalidCredentials) => {
                return HttpResponse::Unauthorized()
                    .json(CommandResponse::failure(AuthError::InvalidCredentials.to_string()));
            }
            Err(e) => {
                error!("认证过程出错: {}", e);
                return HttpResponse::InternalServerError()
                    .json(CommandResponse::failure(INTERNAL_ERROR));
            }
        };

        let token = match generate_token(&identity, &data.jwt_secret, data.token_ttl) {
            Ok(token) => token,
            Err(e) => {
                error!("生成token失败: {}", e);
                return HttpResponse::InternalServerError()
                    .json(CommandResponse::failure(INTERNAL_ERROR));
            }
        };

        info!("账户 {} 登录成功", email);
        HttpResponse::Ok().json(CommandResponse::ok(
            "登录成功",
            Some(json!({
                "token": token,
                "user": identity,
            })),
        ))
    }
}
