use super::{authorize, CommandHandler, CommandResponse, INTERNAL_ERROR};
use crate::auth::Identity;
use actix_web::{web, HttpResponse};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde_json::json;

pub struct WhoamiCommand;

impl WhoamiCommand {
    pub fn new() -> Self {
        WhoamiCommand
    }
}

#[async_trait]
impl CommandHandler for WhoamiCommand {
    fn name(&self) -> &'static str {
        "whoami"
    }

    fn description(&self) -> &'static str {
        "显示当前账户信息，用法：whoami"
    }

    async fn handle(
        &self,
        _args: &[&str],
        data: &web::Data<crate::AppState>,
        token: &str,
    ) -> HttpResponse {
        info!("开始处理whoami命令");

        let claims = match authorize(data, token) {
            Ok(claims) => claims,
            Err(response) => return response,
        };

        // 以数据库中的当前记录为准，而不是 token 中的快照
        match data.accounts.find_by_id(&claims.sub).await {
            Ok(Some(record)) => {
                debug!("显示账户信息: {}", record.email);
                let identity = Identity::from(record);
                HttpResponse::Ok().json(CommandResponse::ok(
                    format!(
                        "账户ID: {}\n邮箱: {}\n名称: {}\n角色: {}",
                        identity.id,
                        identity.email,
                        identity.name.as_deref().unwrap_or("-"),
                        identity.role
                    ),
                    Some(json!(identity)),
                ))
            }
            Ok(None) => {
                warn!("token 对应的账户不存在: {}", claims.sub);
                HttpResponse::Unauthorized().json(CommandResponse::failure("账户不存在"))
            }
            Err(e) => {
                error!("查询账户失败: {}", e);
                HttpResponse::InternalServerError().json(CommandResponse::failure(INTERNAL_ERROR))
            }
        }
    }
}
