use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::models::*;
use crate::services::BookingService;
use crate::utils::AuthenticatedAdmin;

#[utoipa::path(
    get,
    path = "/dashboard",
    tag = "dashboard",
    params(BookingQuery),
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "预约列表", body = DashboardView),
        (status = 302, description = "未登录，跳转到登录页"),
        (status = 400, description = "页码非法", body = ApiErrorResponse)
    )
)]
pub async fn dashboard(
    booking_service: web::Data<BookingService>,
    admin: AuthenticatedAdmin,
    query: web::Query<BookingQuery>,
) -> Result<HttpResponse> {
    let query = query.into_inner();

    match booking_service.list_bookings(&query).await {
        Ok(page) => {
            let view = DashboardView {
                admin: admin.username,
                status_filter: non_blank(query.status.as_deref()).map(str::to_string),
                date_filter: non_blank(query.date.as_deref()).map(str::to_string),
                statuses: KNOWN_STATUSES.iter().map(|s| s.to_string()).collect(),
                items: page.items,
                page: page.page,
                per_page: page.per_page,
                total: page.total,
                total_pages: page.total_pages,
            };
            Ok(HttpResponse::Ok().json(ApiResponse::success(view)))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/update/{booking_id}",
    tag = "dashboard",
    params(
        ("booking_id" = i32, Path, description = "预约 ID")
    ),
    request_body = UpdateStatusRequest,
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "状态已更新", body = BookingResponse),
        (status = 400, description = "状态为空", body = ApiErrorResponse),
        (status = 404, description = "预约不存在", body = ApiErrorResponse)
    )
)]
pub async fn update_status(
    booking_service: web::Data<BookingService>,
    admin: AuthenticatedAdmin,
    path: web::Path<i32>,
    request: web::Either<web::Json<UpdateStatusRequest>, web::Form<UpdateStatusRequest>>,
) -> Result<HttpResponse> {
    let booking_id = path.into_inner();
    let request = match request {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    };

    match booking_service.update_status(booking_id, &request.status).await {
        Ok(booking) => {
            log::info!("Admin '{}' updated booking {booking_id}", admin.username);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
                booking,
                "Booking status updated",
            )))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn dashboard_config(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard", web::get().to(dashboard))
        .route("/update/{booking_id}", web::post().to(update_status));
}
