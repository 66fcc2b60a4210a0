use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[schema(example = "admin")]
    pub username: String,
    #[schema(example = "admin123")]
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AdminResponse {
    pub id: i32,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct AuthResponse {
    pub admin: AdminResponse,
    pub token: String,
    pub expires_in: i64,
    pub redirect_to: String,
}

/// 登录页视图模型，模板渲染在系统之外
#[derive(Debug, Serialize, ToSchema)]
pub struct LoginView {
    pub action: String,
    pub fields: Vec<String>,
}
