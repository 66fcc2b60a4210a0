use crate::config::DatabaseConfig;
use crate::error::AppResult;
use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection};
use std::time::Duration;

pub type DbPool = DatabaseConnection;

pub async fn create_pool(config: &DatabaseConfig) -> AppResult<DbPool> {
    let mut options = ConnectOptions::new(config.url.clone());
    options
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(5))
        .sqlx_logging(false);

    let pool = Database::connect(options).await?;
    log::info!("Database connected: {:?}", pool.get_database_backend());

    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> AppResult<()> {
    log::info!("Running database migrations...");
    Migrator::up(pool, None).await?;
    log::info!("Migrations completed");
    Ok(())
}

/// 测试用的内存数据库，已执行全部迁移
#[cfg(test)]
pub async fn setup_test_db() -> DbPool {
    let mut options = ConnectOptions::new("sqlite::memory:".to_string());
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);

    let pool = Database::connect(options)
        .await
        .expect("in-memory sqlite should connect");
    run_migrations(&pool)
        .await
        .expect("migrations should apply to a fresh database");
    pool
}
