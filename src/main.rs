use actix_web::{App, HttpServer, middleware::Logger, web};
use anyhow::Context;
use env_logger::{Env, Target};
use std::io::Write; // for env_logger custom formatter
use chrono::Local;  // timestamp in log lines

use booking_admin::{
    config::Config,
    database::{create_pool, run_migrations},
    handlers,
    middlewares::{SessionGuard, create_cors},
    services::*,
    swagger::swagger_config,
    utils::SessionService,
};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format(|buf, record| {
            let ts = Local::now().format("%Y-%m-%dT%H:%M:%S%.3f%:z");
            let level = record.level().as_str().to_ascii_lowercase();
            let msg_json = serde_json::to_string(&format!("{}", record.args()))
                .unwrap_or_else(|_| "\"<invalid utf8>\"".to_string());
            writeln!(
                buf,
                "{{\"timestamp\":\"{}\",\"level\":\"{}\",\"message\":{},\"target\":\"{}\"}}",
                ts,
                level,
                msg_json,
                record.target(),
            )
        })
        .target(Target::Stdout)
        .init();

    // 加载配置
    let config = Config::from_toml()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?;

    if config.uses_default_secret() {
        log::warn!("SECRET_KEY not set. Using the built-in session secret; set SECRET_KEY in production.");
    }
    if config.api.public_read {
        log::warn!("GET /api/bookings is public and exposes customer data without a session");
    }
    if config.api.public_write {
        log::info!("POST /api/add_booking accepts unauthenticated submissions");
    }

    // 创建数据库连接池
    let pool = create_pool(&config.database)
        .await
        .context("Failed to create database connection pool")?;

    // 运行数据库迁移
    run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    // 会话签名服务
    let session_service = SessionService::new(
        &config.session.secret,
        config.session.expires_in,
        &config.session.cookie_name,
    );

    // 创建服务
    let auth_service = AuthService::new(pool.clone(), session_service.clone());
    auth_service
        .ensure_default_admin(&config.admin)
        .await
        .context("Failed to create default admin")?;

    let booking_service = BookingService::new(pool.clone(), config.dashboard.per_page);
    let user_service = UserService::new(pool.clone());

    // 启动HTTP服务器
    log::info!(
        "Starting HTTP server at {}:{}",
        config.server.host,
        config.server.port
    );

    let api_config = config.api;
    let allowed_origins = config.server.allowed_origins.clone();

    HttpServer::new(move || {
        App::new()
            .wrap(SessionGuard::new(session_service.clone(), api_config))
            .wrap(create_cors(&allowed_origins))
            .wrap(Logger::default())
            .app_data(web::Data::new(auth_service.clone()))
            .app_data(web::Data::new(booking_service.clone()))
            .app_data(web::Data::new(user_service.clone()))
            .app_data(web::Data::new(session_service.clone()))
            .configure(swagger_config)
            .configure(handlers::configure)
    })
    .bind((config.server.host.as_str(), config.server.port))?
    .run()
    .await?;

    Ok(())
}
