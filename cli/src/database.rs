use crate::batch::RenderedStatement;
use anyhow::{Context, Result};
use dmlplus::bind::bind_all;
use sqlx::mysql::MySqlPoolOptions;
use sqlx::{MySql, Pool};

/// 目标端 MySQL 连接
pub struct Destination {
    pool: Pool<MySql>,
}

impl Destination {
    /// 连接到目标库，只接受 mysql:// 或 mariadb://
    pub async fn connect(url: &str) -> Result<Self> {
        if !(url.starts_with("mysql://") || url.starts_with("mariadb://")) {
            anyhow::bail!("Unsupported database URL. Supported: mysql://, mariadb://");
        }
        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .connect(url)
            .await
            .context("Failed to connect to MySQL database")?;
        Ok(Self { pool })
    }

    /// 在同一个事务中按顺序执行全部语句，任一语句失败则整体回滚
    pub async fn apply(&self, statements: &[RenderedStatement]) -> Result<u64> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let mut rows_affected = 0;
        for (i, statement) in statements.iter().enumerate() {
            let query = bind_all(sqlx::query(&statement.sql), statement.args.iter().cloned());
            let result = query
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to execute {} #{}", statement.kind, i + 1))?;
            tracing::debug!(
                kind = statement.kind,
                rows = result.rows_affected(),
                "applied statement"
            );
            rows_affected += result.rows_affected();
        }
        tx.commit().await.context("Failed to commit transaction")?;
        Ok(rows_affected)
    }
}
