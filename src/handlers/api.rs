use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::models::*;
use crate::services::BookingService;

#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "api",
    responses(
        (status = 200, description = "全部预约（按 id 倒序，不分页）", body = [BookingResponse]),
        (status = 401, description = "只读接口未开放且未登录", body = ApiErrorResponse)
    )
)]
pub async fn list_bookings(booking_service: web::Data<BookingService>) -> Result<HttpResponse> {
    match booking_service.list_all().await {
        // 外部站点直接消费数组，不包裹 success 信封
        Ok(bookings) => Ok(HttpResponse::Ok().json(bookings)),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/api/add_booking",
    tag = "api",
    request_body = CreateBookingRequest,
    responses(
        (status = 201, description = "预约已创建", body = BookingResponse),
        (status = 400, description = "缺少必填字段或 JSON 格式错误", body = ApiErrorResponse),
        (status = 401, description = "写接口未开放且未登录", body = ApiErrorResponse)
    )
)]
pub async fn add_booking(
    booking_service: web::Data<BookingService>,
    request: web::Json<CreateBookingRequest>,
) -> Result<HttpResponse> {
    match booking_service.create_booking(request.into_inner()).await {
        Ok(booking) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            booking,
            "Booking created successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

pub fn api_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .route("/bookings", web::get().to(list_bookings))
            .route("/add_booking", web::post().to(add_booking)),
    );
}
