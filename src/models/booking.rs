use crate::entities::booking_entity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

pub const STATUS_PENDING: &str = "Pending";
pub const STATUS_CONFIRMED: &str = "Confirmed";
pub const STATUS_COMPLETED: &str = "Completed";
pub const STATUS_CANCELLED: &str = "Cancelled";

/// 后台页面展示的常用状态；状态字段本身是自由文本，不做校验
pub const KNOWN_STATUSES: [&str; 4] = [
    STATUS_PENDING,
    STATUS_CONFIRMED,
    STATUS_COMPLETED,
    STATUS_CANCELLED,
];

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, ToSchema)]
pub struct BookingResponse {
    pub id: i32,
    pub user_id: Option<i32>,
    pub customer_name: Option<String>,
    pub service: String,
    #[schema(example = "2025-03-01")]
    pub date: String,
    pub time: Option<String>,
    pub location: Option<String>,
    pub package: Option<String>,
    pub addons: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    #[schema(example = "Pending")]
    pub status: String,
    pub created_at: DateTime<Utc>,
}

impl From<booking_entity::Model> for BookingResponse {
    fn from(m: booking_entity::Model) -> Self {
        Self {
            id: m.id,
            user_id: m.user_id,
            customer_name: m.customer_name,
            service: m.service,
            date: m.date,
            time: m.time,
            location: m.location,
            package: m.package,
            addons: m.addons,
            payment_method: m.payment_method,
            payment_status: m.payment_status,
            status: m.status,
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BookingQuery {
    /// 按状态精确匹配（区分大小写）
    pub status: Option<String>,
    /// 按日期字符串精确匹配
    pub date: Option<String>,
    /// 1 起始页码
    pub page: Option<u64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateStatusRequest {
    #[schema(example = "Confirmed")]
    pub status: String,
}

/// 外部站点提交的预约；缺少必填字段时返回 400 而不是反序列化错误
#[derive(Debug, Default, Clone, Deserialize, ToSchema)]
pub struct CreateBookingRequest {
    #[schema(example = "Jane")]
    pub name: Option<String>,
    #[serde(alias = "service_type")]
    #[schema(example = "Hair")]
    pub service: Option<String>,
    #[schema(example = "2025-03-01")]
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub package: Option<String>,
    pub addons: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub status: Option<String>,
    /// 提供手机号时关联（或创建）对应用户
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DashboardView {
    pub admin: String,
    pub status_filter: Option<String>,
    pub date_filter: Option<String>,
    pub statuses: Vec<String>,
    pub items: Vec<BookingResponse>,
    pub page: u64,
    pub per_page: u64,
    pub total: u64,
    pub total_pages: u64,
}
