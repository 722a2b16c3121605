use super::{authorize_admin, CommandHandler, CommandResponse, INTERNAL_ERROR};
use actix_web::{web, HttpResponse};
use async_trait::async_trait;
use log::{debug, error};
use serde_json::json;

pub struct LockStatusCommand;

impl LockStatusCommand {
    pub fn new() -> Self {
        LockStatusCommand
    }
}

#[async_trait]
impl CommandHandler for LockStatusCommand {
    fn name(&self) -> &'static str {
        "lockstatus"
    }

    fn description(&self) -> &'static str {
        "查看账户的失败次数与锁定到期时间（管理员），用法：lockstatus <email>"
    }

    async fn handle(
        &self,
        args: &[&str],
        data: &web::Data<crate::AppState>,
        token: &str,
    ) -> HttpResponse {
        if let Err(response) = authorize_admin(data, token) {
            return response;
        }

        let email = match args {
            [_, email] => *email,
            _ => {
                return HttpResponse::BadRequest()
                    .json(CommandResponse::failure("用法：lockstatus <email>"))
            }
        };
        debug!("查询账户 {} 的锁定状态", email);

        match data.gate.lock_status(email).await {
            Ok(Some(status)) => {
                let message = match status.locked_until {
                    Some(until) if status.locked => format!(
                        "账户已锁定，失败次数: {}，解锁时间: {}",
                        status.failed_attempts,
                        until.format("%Y-%m-%d %H:%M:%S UTC")
                    ),
                    _ => format!("账户未锁定，失败次数: {}", status.failed_attempts),
                };
                HttpResponse::Ok().json(CommandResponse::ok(message, Some(json!(status))))
            }
            Ok(None) => HttpResponse::NotFound()
                .json(CommandResponse::failure(format!("账户不存在: {}", email))),
            Err(e) => {
                error!("查询锁定状态失败: {}", e);
                HttpResponse::InternalServerError().json(CommandResponse::failure(INTERNAL_ERROR))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::command::test_support::*;

    #[actix_web::test]
    async fn reports_failures_and_lock() {
        let h = harness();
        let token = login(&h.data, "admin@x.com").await;

        send(&h.data, "login a@x.com wrong-password", None).await;
        let (status, body) = send(&h.data, "lockstatus a@x.com", Some(&token)).await;
        assert_eq!(status, 200);
        let data = body.data.unwrap();
        assert_eq!(data["failed_attempts"], 1);
        assert_eq!(data["locked"], false);

        for _ in 0..4 {
            send(&h.data, "login a@x.com wrong-password", None).await;
        }
        let (_, body) = send(&h.data, "lockstatus a@x.com", Some(&token)).await;
        let data = body.data.unwrap();
        assert_eq!(data["locked"], true);
        assert!(data["locked_until"].is_string());
    }
}
