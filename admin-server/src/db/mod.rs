//! Database Module
//!
//! 嵌入式 SurrealDB (RocksDB 存储)，单进程独占。

pub mod bootstrap;
pub mod models;
pub mod repository;

use shared::error::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

/// Embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the embedded database at `path`
    pub async fn new(path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {}", e)))?;

        db.use_ns("cityhop")
            .use_db("admin")
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {}", e)))?;

        define_schema(&db).await?;

        tracing::info!(path = %path, "Database ready");

        Ok(Self { db })
    }

    pub fn db(&self) -> Surreal<Db> {
        self.db.clone()
    }
}

/// 幂等定义表与索引，每次启动执行
async fn define_schema(db: &Surreal<Db>) -> Result<(), AppError> {
    db.query(
        r#"
        DEFINE TABLE IF NOT EXISTS admin SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS admin_email ON TABLE admin COLUMNS email UNIQUE;

        DEFINE TABLE IF NOT EXISTS role SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS role_slug ON TABLE role COLUMNS slug UNIQUE;

        DEFINE TABLE IF NOT EXISTS audit_log SCHEMALESS;
        DEFINE INDEX IF NOT EXISTS audit_log_created_at ON TABLE audit_log COLUMNS created_at;
        "#,
    )
    .await
    .map_err(|e| AppError::database(format!("Failed to define schema: {}", e)))?;
    Ok(())
}
