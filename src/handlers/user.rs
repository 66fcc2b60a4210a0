use actix_web::{HttpResponse, ResponseError, Result, web};

use crate::models::*;
use crate::services::UserService;
use crate::utils::AuthenticatedAdmin;

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    params(UserSearchQuery),
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "用户列表", body = UserListView),
        (status = 302, description = "未登录，跳转到登录页")
    )
)]
pub async fn list_users(
    user_service: web::Data<UserService>,
    _admin: AuthenticatedAdmin,
    query: web::Query<UserSearchQuery>,
) -> Result<HttpResponse> {
    let search = non_blank(query.search.as_deref()).map(str::to_string);

    match user_service.search_users(search.as_deref()).await {
        Ok(users) => Ok(HttpResponse::Ok().json(ApiResponse::success(UserListView {
            search,
            users,
        }))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    request_body = CreateUserRequest,
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 201, description = "用户已创建", body = UserSummary),
        (status = 400, description = "参数错误或手机号已注册", body = ApiErrorResponse)
    )
)]
pub async fn create_user(
    user_service: web::Data<UserService>,
    _admin: AuthenticatedAdmin,
    request: web::Either<web::Json<CreateUserRequest>, web::Form<CreateUserRequest>>,
) -> Result<HttpResponse> {
    let request = match request {
        web::Either::Left(json) => json.into_inner(),
        web::Either::Right(form) => form.into_inner(),
    };

    match user_service.create_user(request).await {
        Ok(user) => Ok(HttpResponse::Created().json(ApiResponse::success_with_message(
            user,
            "User created successfully",
        ))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    get,
    path = "/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "用户 ID")
    ),
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "用户详情及其预约", body = UserDetailResponse),
        (status = 404, description = "用户不存在", body = ApiErrorResponse)
    )
)]
pub async fn get_user(
    user_service: web::Data<UserService>,
    _admin: AuthenticatedAdmin,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    match user_service.get_user_details(path.into_inner()).await {
        Ok(details) => Ok(HttpResponse::Ok().json(ApiResponse::success(details))),
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/block",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "用户 ID")
    ),
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "用户已封禁", body = UserResponse),
        (status = 404, description = "用户不存在", body = ApiErrorResponse)
    )
)]
pub async fn block_user(
    user_service: web::Data<UserService>,
    admin: AuthenticatedAdmin,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();

    match user_service.block_user(user_id).await {
        Ok(user) => {
            log::info!("Admin '{}' blocked user {user_id}", admin.username);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
                user,
                "User blocked",
            )))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    post,
    path = "/users/{user_id}/unblock",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "用户 ID")
    ),
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "用户已解封", body = UserResponse),
        (status = 404, description = "用户不存在", body = ApiErrorResponse)
    )
)]
pub async fn unblock_user(
    user_service: web::Data<UserService>,
    admin: AuthenticatedAdmin,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();

    match user_service.unblock_user(user_id).await {
        Ok(user) => {
            log::info!("Admin '{}' unblocked user {user_id}", admin.username);
            Ok(HttpResponse::Ok().json(ApiResponse::success_with_message(
                user,
                "User unblocked",
            )))
        }
        Err(e) => Ok(e.error_response()),
    }
}

#[utoipa::path(
    delete,
    path = "/users/{user_id}",
    tag = "users",
    params(
        ("user_id" = i32, Path, description = "用户 ID")
    ),
    security(
        ("session_cookie" = []),
        ("bearer_auth" = [])
    ),
    responses(
        (status = 200, description = "用户已删除，其预约保留但不再关联"),
        (status = 404, description = "用户不存在", body = ApiErrorResponse)
    )
)]
pub async fn delete_user(
    user_service: web::Data<UserService>,
    admin: AuthenticatedAdmin,
    path: web::Path<i32>,
) -> Result<HttpResponse> {
    let user_id = path.into_inner();

    match user_service.delete_user(user_id).await {
        Ok(()) => {
            log::info!("Admin '{}' deleted user {user_id}", admin.username);
            Ok(HttpResponse::Ok().json(ApiResponse::message("User deleted")))
        }
        Err(e) => Ok(e.error_response()),
    }
}

pub fn user_config(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/users")
            .route("", web::get().to(list_users))
            .route("", web::post().to(create_user))
            .route("/{user_id}", web::get().to(get_user))
            .route("/{user_id}", web::delete().to(delete_user))
            .route("/{user_id}/block", web::post().to(block_user))
            .route("/{user_id}/unblock", web::post().to(unblock_user)),
    );
}
