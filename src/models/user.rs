use crate::entities::user_entity;
use crate::models::BookingResponse;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UserResponse {
    pub id: i32,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub is_blocked: bool,
    pub created_at: DateTime<Utc>,
}

impl From<user_entity::Model> for UserResponse {
    fn from(m: user_entity::Model) -> Self {
        Self {
            id: m.id,
            name: m.name,
            phone: m.phone,
            email: m.email,
            is_blocked: m.is_blocked,
            created_at: m.created_at,
        }
    }
}

/// 用户列表行，预约数在读取时统计
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct UserSummary {
    #[serde(flatten)]
    pub user: UserResponse,
    pub total_bookings: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserDetailResponse {
    pub user: UserResponse,
    pub bookings: Vec<BookingResponse>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct UserSearchQuery {
    /// 在姓名、手机号、邮箱中做不区分大小写的包含匹配
    pub search: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserListView {
    pub search: Option<String>,
    pub users: Vec<UserSummary>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct CreateUserRequest {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "+15550100")]
    pub phone: String,
    #[schema(example = "jane@example.com")]
    pub email: Option<String>,
}
