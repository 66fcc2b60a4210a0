use actix_cors::Cors;

/// 外部站点通过 `/api` 读写预约；未配置来源时允许任意来源
pub fn create_cors(allowed_origins: &[String]) -> Cors {
    let cors = if allowed_origins.is_empty() {
        Cors::default().allowed_origin_fn(|_, _req_head| true)
    } else {
        allowed_origins
            .iter()
            .fold(Cors::default(), |cors, origin| cors.allowed_origin(origin))
    };

    cors.allowed_methods(vec!["GET", "POST", "DELETE", "OPTIONS"])
        .allow_any_header()
        // 后台会话使用 Cookie，需要携带凭据
        .supports_credentials()
        .max_age(3600)
}
