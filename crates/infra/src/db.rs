//! # PostgreSQL 接続
//!
//! 起動時にプールを一つ作り、全リポジトリで `PgPool` を共有する。
//! スキーマはワークスペース直下の `migrations/` をバイナリに埋め込んで適用する。

use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

/// 接続プールの設定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSettings {
    pub max_connections: u32,
    pub acquire_timeout: Duration,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            acquire_timeout: Duration::from_secs(5),
        }
    }
}

/// 接続プールを作成する
///
/// 最初の接続が確立できなければエラーを返す。
pub async fn create_pool(database_url: &str, settings: PoolSettings) -> Result<PgPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .acquire_timeout(settings.acquire_timeout)
        .connect(database_url)
        .await?;

    tracing::debug!(
        max_connections = settings.max_connections,
        "データベース接続プールを作成"
    );
    Ok(pool)
}

/// 未適用のマイグレーションを適用する
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
