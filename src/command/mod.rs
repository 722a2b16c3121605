use actix_web::{web, HttpResponse, Responder};
use async_trait::async_trait;
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

use crate::auth::{validate_token, Claims, ROLE_ADMIN};

mod cmd_help;
mod cmd_join;
mod cmd_lockstatus;
mod cmd_login;
mod cmd_logout;
mod cmd_unlock;
mod cmd_whoami;

// 命令处理器的trait
#[async_trait]
pub trait CommandHandler: Send + Sync {
    fn name(&self) -> &'static str;
    fn description(&self) -> &'static str;
    /// token 仅对需要认证的命令非空
    async fn handle(
        &self,
        args: &[&str],
        data: &web::Data<crate::AppState>,
        token: &str,
    ) -> HttpResponse;
}

// 命令注册器
pub struct CommandRegistry {
    commands: HashMap<String, Box<dyn CommandHandler>>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        let mut registry = CommandRegistry {
            commands: HashMap::new(),
        };

        registry.register(Box::new(cmd_help::HelpCommand::new()));
        registry.register(Box::new(cmd_join::JoinCommand::new()));
        registry.register(Box::new(cmd_login::LoginCommand::new()));
        registry.register(Box::new(cmd_logout::LogoutCommand::new()));
        registry.register(Box::new(cmd_whoami::WhoamiCommand::new()));
        registry.register(Box::new(cmd_unlock::UnlockCommand::new()));
        registry.register(Box::new(cmd_lockstatus::LockStatusCommand::new()));

        info!("命令注册器初始化完成");
        registry
    }

    pub fn register(&mut self, handler: Box<dyn CommandHandler>) {
        let name = handler.name().to_string();
        self.commands.insert(name.clone(), handler);
        debug!("注册命令: {}", name);
    }

    pub fn get_handler(&self, command_name: &str) -> Option<&dyn CommandHandler> {
        self.commands.get(command_name).map(|h| h.as_ref())
    }

    pub fn get_command_description(&self, command_name: &str) -> Option<String> {
        self.commands
            .get(command_name)
            .map(|h| h.description().to_string())
    }

    /// 按名称排序的 (名称, 描述) 列表
    pub fn descriptions(&self) -> Vec<(&str, &'static str)> {
        let mut all: Vec<_> = self
            .commands
            .iter()
            .map(|(name, h)| (name.as_str(), h.description()))
            .collect();
        all.sort();
        all
    }
}

// 命令响应结构体
#[derive(Debug, Serialize, Deserialize)]
pub struct CommandResponse {
    pub success: bool,
    pub message: String,
    pub data: Option<Value>,
}

impl CommandResponse {
    pub fn ok(message: impl Into<String>, data: Option<Value>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

pub(crate) const INTERNAL_ERROR: &str = "服务器内部错误";

/// 校验 token 并检查是否已登出
pub(crate) fn authorize(data: &crate::AppState, token: &str) -> Result<Claims, HttpResponse> {
    if token.is_empty() {
        warn!("未提供认证 token");
        return Err(HttpResponse::Unauthorized().json(CommandResponse::failure("请先登录")));
    }

    let claims = validate_token(token, &data.jwt_secret).map_err(|e| {
        warn!("Token 验证失败: {}", e);
        HttpResponse::Unauthorized().json(CommandResponse::failure("Token 验证失败"))
    })?;

    if data.sessions.is_revoked(token) {
        return Err(HttpResponse::Unauthorized().json(CommandResponse::failure("Token 已失效")));
    }

    Ok(claims)
}

pub(crate) fn authorize_admin(data: &crate::AppState, token: &str) -> Result<Claims, HttpResponse> {
    let claims = authorize(data, token)?;
    if claims.role != ROLE_ADMIN {
        warn!("用户 {} 尝试执行管理员命令", claims.email);
        return Err(HttpResponse::Forbidden().json(CommandResponse::failure("需要管理员权限")));
    }
    Ok(claims)
}

// 处理命令的主函数
pub async fn handle_command(
    cmd: web::Json<Value>,
    data: web::Data<crate::AppState>,
    req: actix_web::HttpRequest,
) -> impl Responder {
    let command = cmd.get("command").and_then(|v| v.as_str()).unwrap_or("");

    // 从 Authorization header 中获取 token
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .unwrap_or("");

    let args: Vec<&str> = command.split_whitespace().collect();
    if args.is_empty() {
        warn!("空命令");
        return HttpResponse::BadRequest().json(CommandResponse::failure("命令不能为空"));
    }
    // 不记录参数，参数中可能包含密码
    info!("收到命令请求: {}", args[0]);

    // 如果命令以 "description" 开头，返回命令描述
    if args[0] == "description" && args.len() > 1 {
        return match data.command_registry.get_command_description(args[1]) {
            Some(description) => HttpResponse::Ok().json(CommandResponse::ok(description, None)),
            None => HttpResponse::BadRequest()
                .json(CommandResponse::failure(format!("未知命令: {}", args[1]))),
        };
    }

    match data.command_registry.get_handler(args[0]) {
        Some(handler) => {
            debug!("执行命令: {}", args[0]);
            let auth_token = if requires_auth(args[0]) { token } else { "" };
            let response = handler.handle(&args, &data, auth_token).await;
            if response.status().is_server_error() {
                error!("命令执行失败: {} - {}", args[0], response.status());
            }
            response
        }
        None => {
            warn!("未知命令: {}", args[0]);
            HttpResponse::BadRequest().json(CommandResponse::failure(format!("未知命令: {}", args[0])))
        }
    }
}

// 判断命令是否需要认证
fn requires_auth(command: &str) -> bool {
    matches!(command, "logout" | "whoami" | "unlock" | "lockstatus")
}


#[cfg(test)]
mod tests {
    use super::test_support::*;

    #[actix_web::test]
    async fn empty_and_unknown_commands_are_rejected() {
        let h = harness();
        let (status, body) = send(&h.data, "   ", None).await;
        assert_eq!(status, 400);
        assert!(!body.success);

        let (status, body) = send(&h.data, "rm -rf", None).await;
        assert_eq!(status, 400);
        assert!(body.message.contains("rm"));
    }

    #[actix_web::test]
    async fn description_returns_usage() {
        let h = harness();
        let (status, body) = send(&h.data, "description login", None).await;
        assert_eq!(status, 200);
        assert!(body.message.contains("login <email> <password>"));
    }

    #[actix_web::test]
    async fn protected_commands_require_a_token() {
        let h = harness();
        for command in ["whoami", "logout", "unlock a@x.com", "lockstatus a@x.com"] {
            let (status, _) = send(&h.data, command, None).await;
            assert_eq!(status, 401, "{}", command);
        }
        let (status, _) = send(&h.data, "whoami", Some("not-a-jwt")).await;
        assert_eq!(status, 401);
    }

    #[actix_web::test]
    async fn help_lists_every_command() {
        let h = harness();
        let (status, body) = send(&h.data, "help", None).await;
        assert_eq!(status, 200);
        for name in ["join", "login", "logout", "whoami", "unlock", "lockstatus"] {
            assert!(body.message.contains(name), "{}", name);
        }
    }
}
