pub mod api;
pub mod auth;
pub mod dashboard;
pub mod user;

pub use api::api_config;
pub use auth::auth_config;
pub use dashboard::dashboard_config;
pub use user::user_config;

use actix_web::web;

use crate::error::AppError;

/// 请求体、查询参数、路径参数解析失败统一返回 400 VALIDATION_ERROR
pub fn extractor_config(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid JSON body: {err}")).into()
    }))
    .app_data(web::FormConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid form body: {err}")).into()
    }))
    .app_data(web::QueryConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid query string: {err}")).into()
    }))
    .app_data(web::PathConfig::default().error_handler(|err, _req| {
        AppError::ValidationError(format!("Invalid path parameter: {err}")).into()
    }));
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.configure(extractor_config)
        .configure(auth_config)
        .configure(dashboard_config)
        .configure(user_config)
        .configure(api_config);
}
