use actix_web::cookie::{Cookie, SameSite, time::Duration};
use actix_web::http::header;
use actix_web::{HttpResponse, ResponseError, Result, web};
use serde_json::json;

use crate::models::*;
use crate::services::AuthService;
use crate::utils::{AuthenticatedAdmin, SessionService};

#[utoipa::path(
    get,
    path = "/",
    tag = "auth",
    responses(
        (status = 200, description = "登录页", body = LoginView),
        (status = 302, description = "已登录，跳转到后台")
    )
)]
pub async fn login_page(admin: Option<AuthenticatedAdmin>) -> Result<HttpResponse> {
    if admin.is_some() {
        return Ok(HttpResponse::Found()
            .insert_header((header::LOCATION, "/dashboard"))
            .finish());
    }

    Ok(HttpResponse::Ok().json(ApiResponse::success(LoginView {
        action: "/".to_string(),
        fields: vec!["username".to_string(), "password".to_string()],
    })))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "auth",
    request_body(content = LoginRequest, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 303, description = "登录成功，写入会话 Cookie 并跳转到后台", body = AuthResponse),
        (status = 401, description = "用户名或密码错误", body = ApiErrorResponse)
    )
)]
pub async fn login(
    auth_service: web::Data<AuthService>,
    session_service: web::Data<SessionService>,
    request: web::Either<web::Form<LoginRequest>, web::Json<LoginRequest>>,
) -> Result<HttpResponse> {
    let request = match request {
        web::Either::Left(form) => form.into_inner(),
        web::Either::Right(json) => json.into_inner(),
    };

    match auth_service.login(request).await {
        Ok(response) => {
            let cookie = Cookie::build(session_service.cookie_name().to_string(), response.token.clone())
                .path("/")
                .http_only(true)
                .same_site(SameSite::Lax)
                .max_age(Duration::seconds(response.expires_in))
                .finish();

            Ok(HttpResponse::SeeOther()
                .insert_header((header::LOCATION, response.redirect_to.clone()))
                .cookie(cookie)
                .json(ApiResponse::success(response)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/logout",
    tag = "auth",
    responses(
        (status = 302, description = "清除会话并跳转到登录页")
    )
)]
pub async fn logout(
    session_service: web::Data<SessionService>,
    admin: Option<AuthenticatedAdmin>,
) -> Result<HttpResponse> {
    if let Some(admin) = admin {
        log::info!("Admin '{}' logged out", admin.username);
    }

    let mut cookie = Cookie::build(session_service.cookie_name().to_string(), "")
        .path("/")
        .finish();
    cookie.make_removal();

    Ok(HttpResponse::Found()
        .insert_header((header::LOCATION, "/"))
        .cookie(cookie)
        .finish())
}

#[utoipa::path(
    get,
    path = "/health",
    tag = "auth",
    responses(
        (status = 200, description = "服务存活")
    )
)]
pub async fn health() -> Result<HttpResponse> {
    Ok(HttpResponse::Ok().json(json!({ "status": "ok" })))
}

pub fn auth_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/", web::get().to(login_page))
        .route("/", web::post().to(login))
        .route("/logout", web::get().to(logout))
        .route("/health", web::get().to(health));
}
