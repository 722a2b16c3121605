use super::{authorize_admin, CommandHandler, CommandResponse, INTERNAL_ERROR};
use actix_web::{web, HttpResponse};
use async_trait::async_trait;
use log::{error, info};

pub struct UnlockCommand;

impl UnlockCommand {
    pub fn new() -> Self {
        UnlockCommand
    }
}

#[async_trait]
impl CommandHandler for UnlockCommand {
    fn name(&self) -> &'static str {
        "unlock"
    }

    fn description(&self) -> &'static str {
        "解除账户锁定并清零失败次数（管理员），用法：unlock <email>"
    }

    async fn handle(
        &self,
        args: &[&str],
        data: &web::Data<crate::AppState>,
        token: &str,
    ) -> HttpResponse {
        let admin = match authorize_admin(data, token) {
            Ok(claims) => claims,
            Err(response) => return response,
        };

        let email = match args {
            [_, email] => *email,
            _ => {
                return HttpResponse::BadRequest()
                    .json(CommandResponse::failure("用法：unlock <email>"))
            }
        };

        match data.gate.unlock(email).await {
            Ok(true) => {
                info!("管理员 {} 解锁了账户 {}", admin.email, email);
                HttpResponse::Ok().json(CommandResponse::ok(format!("账户 {} 已解锁", email), None))
            }
            Ok(false) => HttpResponse::NotFound()
                .json(CommandResponse::failure(format!("账户不存在: {}", email))),
            Err(e) => {
                error!("解锁账户失败: {}", e);
                HttpResponse::InternalServerError().json(CommandResponse::failure(INTERNAL_ERROR))
            }
        }
    }
}
