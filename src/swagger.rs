use actix_web::web;
use utoipa::OpenApi;
use utoipa::{
    Modify,
    openapi::security::{ApiKey, ApiKeyValue, Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers;
use crate::models::*;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_cookie",
            SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("admin_session"))),
        );
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login_page,
        handlers::auth::login,
        handlers::auth::logout,
        handlers::auth::health,
        handlers::dashboard::dashboard,
        handlers::dashboard::update_status,
        handlers::user::list_users,
        handlers::user::create_user,
        handlers::user::get_user,
        handlers::user::block_user,
        handlers::user::unblock_user,
        handlers::user::delete_user,
        handlers::api::list_bookings,
        handlers::api::add_booking,
    ),
    components(
        schemas(
            LoginRequest,
            LoginView,
            AdminResponse,
            AuthResponse,
            BookingResponse,
            UpdateStatusRequest,
            CreateBookingRequest,
            DashboardView,
            UserResponse,
            UserSummary,
            UserDetailResponse,
            UserListView,
            CreateUserRequest,
            ApiError,
            ApiErrorResponse,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "auth", description = "Back-office login and session"),
        (name = "dashboard", description = "Booking dashboard"),
        (name = "users", description = "User management"),
        (name = "api", description = "Public booking API"),
    ),
    info(
        title = "Booking Admin API",
        version = "1.0.0",
        description = "Booking back-office REST API documentation"
    )
)]
pub struct ApiDoc;

pub fn swagger_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        SwaggerUi::new("/swagger-ui/{_:.*}").url("/api-docs/openapi.json", ApiDoc::openapi()),
    )
    .route(
        "/swagger-ui",
        web::get().to(|| async {
            actix_web::HttpResponse::Found()
                .append_header(("Location", "/swagger-ui/"))
                .finish()
        }),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_openapi_lists_back_office_routes() {
        let doc = ApiDoc::openapi();
        for path in ["/", "/dashboard", "/update/{booking_id}", "/users/{user_id}", "/api/add_booking"] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("session_cookie"));
    }
}
