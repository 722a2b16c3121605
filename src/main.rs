mod auth;
mod command;
mod config;
mod db;
mod logger;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use chrono::Duration;
use dotenv::dotenv;
use sqlx::postgres::PgPoolOptions;
use std::io;
use std::path::Path;
use std::sync::Arc;

use auth::{
    BcryptHasher, CredentialGate, CredentialStore, PasswordHasher, PgCredentialStore,
    SessionRegistry,
};
use command::{handle_command, CommandRegistry};
use config::AppConfig;
use log::{error, info};

// 应用状态
pub struct AppState {
    gate: CredentialGate,
    accounts: Arc<dyn CredentialStore>,
    hasher: Arc<dyn PasswordHasher>,
    sessions: SessionRegistry,
    command_registry: CommandRegistry,
    jwt_secret: String,
    token_ttl: Duration,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // 加载 .env
    dotenv().ok();

    let config = AppConfig::from_env()
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, format!("配置错误: {}", e)))?;

    // 初始化日志系统，文件日志不可用时退回到 stderr
    match logger::Logger::init(Path::new(&config.log_dir), config.log_level) {
        Ok(path) => info!("日志写入 {}", path.display()),
        Err(e) => {
            eprintln!("初始化日志系统失败: {}", e);
            env_logger::Builder::new()
                .filter_level(config.log_level)
                .init();
        }
    }

    info!("应用程序启动");

    // 连接数据库
    let pool = PgPoolOptions::new()
        .max_connections(config.db_max_connections)
        .connect(&config.database_url)
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("数据库连接错误: {}", e)))?;

    // 初始化数据库
    db::initialize_db(pool.clone())
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("数据库初始化错误: {}", e)))?;

    let accounts: Arc<dyn CredentialStore> = Arc::new(PgCredentialStore::new(pool));
    let hasher: Arc<dyn PasswordHasher> = Arc::new(BcryptHasher::new(config.bcrypt_cost));

    let app_state = web::Data::new(AppState {
        gate: CredentialGate::new(accounts.clone(), hasher.clone(), config.gate.clone()),
        accounts,
        hasher,
        sessions: SessionRegistry::new(config.token_ttl),
        command_registry: CommandRegistry::new(),
        jwt_secret: config.jwt_secret.clone(),
        token_ttl: config.token_ttl,
    });

    // 定期清理 token 黑名单
    let cleanup_state = app_state.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(3600));
        loop {
            interval.tick().await;
            cleanup_state.sessions.cleanup_expired();
        }
    });

    let bind = (config.bind_addr.clone(), config.port);
    info!("服务器启动在 http://{}:{}", bind.0, bind.1);

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .wrap(
                Cors::default()
                    .allow_any_origin()
                    .allow_any_method()
                    .allow_any_header()
                    .max_age(3600),
            )
            .route("/api/command", web::post().to(handle_command))
    })
    .bind(bind)
    .map_err(|e| {
        error!("绑定地址失败: {}", e);
        e
    })?
    .run()
    .await
}
