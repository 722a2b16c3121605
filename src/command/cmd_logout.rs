use super::{authorize, CommandHandler, CommandResponse};
use actix_web::{web, HttpResponse};
use async_trait::async_trait;
use log::info;

pub struct LogoutCommand;

impl LogoutCommand {
    pub fn new() -> Self {
        LogoutCommand
    }
}

#[async_trait]
impl CommandHandler for LogoutCommand {
    fn name(&self) -> &'static str {
        "logout"
    }

    fn description(&self) -> &'static str {
        "用户登出，用法：logout"
    }

    async fn handle(
        &self,
        _args: &[&str],
        data: &web::Data<crate::AppState>,
        token: &str,
    ) -> HttpResponse {
        let claims = match authorize(data, token) {
            Ok(claims) => claims,
            Err(response) => return response,
        };

        data.sessions.revoke(token);
        info!("用户 {} 登出成功", claims.email);
        HttpResponse::Ok().json(CommandResponse::ok("登出成功", None))
    }
}
