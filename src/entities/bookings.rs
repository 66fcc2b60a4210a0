use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "bookings")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// 用户被删除后置空，预约记录保留
    pub user_id: Option<i32>,
    pub customer_name: Option<String>,
    pub service: String,
    /// 自由文本日期，约定为 YYYY-MM-DD
    pub date: String,
    pub time: Option<String>,
    pub location: Option<String>,
    pub package: Option<String>,
    pub addons: Option<String>,
    pub payment_method: Option<String>,
    pub payment_status: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::UserId",
        to = "super::users::Column::Id",
        on_update = "NoAction",
        on_delete = "SetNull"
    )]
    User,
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
