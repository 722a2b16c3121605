use crate::auth::StoreError;
use log::{error, info};
use sqlx::PgPool;

pub struct DbInitializer {
    pool: PgPool,
}

impl DbInitializer {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 初始化用户表
    pub async fn init_user_tables(&self) -> Result<(), StoreError> {
        // password_hash 可为空：外部身份创建的账户没有本地密码
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id VARCHAR PRIMARY KEY,
                email VARCHAR UNIQUE NOT NULL,
                name VARCHAR,
                image VARCHAR,
                role VARCHAR NOT NULL DEFAULT 'user' CHECK (role IN ('admin', 'user')),
                password_hash VARCHAR,
                failed_attempts INTEGER NOT NULL DEFAULT 0 CHECK (failed_attempts >= 0),
                locked_at TIMESTAMP WITH TIME ZONE,
                created_at TIMESTAMP WITH TIME ZONE NOT NULL DEFAULT NOW()
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("创建用户表失败: {}", e)))?;

        // 检查是否需要添加列
        let existing_columns: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT column_name::text
            FROM information_schema.columns
            WHERE table_name = 'users'
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreError::Storage(format!("检查用户表列失败: {}", e)))?;

        let migrations = [
            ("name", "ALTER TABLE users ADD COLUMN name VARCHAR"),
            ("image", "ALTER TABLE users ADD COLUMN image VARCHAR"),
            (
                "failed_attempts",
                "ALTER TABLE users ADD COLUMN failed_attempts INTEGER NOT NULL DEFAULT 0",
            ),
            (
                "locked_at",
                "ALTER TABLE users ADD COLUMN locked_at TIMESTAMP WITH TIME ZONE",
            ),
        ];

        for (column, statement) in migrations {
            if !existing_columns.iter().any(|c| c == column) {
                sqlx::query(statement)
                    .execute(&self.pool)
                    .await
                    .map_err(|e| {
                        StoreError::Storage(format!("添加{}列失败: {}", column, e))
                    })?;
                info!("已为用户表添加列: {}", column);
            }
        }

        Ok(())
    }
}

/// 初始化所有数据库表
pub async fn initialize_db(pool: PgPool) -> Result<(), StoreError> {
    info!("开始初始化数据库...");
    let initializer = DbInitializer::new(pool);

    initializer.init_user_tables().await.map_err(|e| {
        error!("用户表初始化失败: {:?}", e);
        e
    })?;

    info!("数据库初始化完成");
    Ok(())
}
