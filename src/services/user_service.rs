use crate::entities::{booking_entity as bookings, user_entity as users};
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::validate_phone;
use chrono::Utc;
use sea_orm::sea_query::{BinOper, Expr, Func, OnConflict, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DatabaseConnection, EntityTrait,
    FromQueryResult, IntoActiveModel, ModelTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::collections::HashMap;

#[derive(Clone)]
pub struct UserService {
    pool: DatabaseConnection,
}

impl UserService {
    pub fn new(pool: DatabaseConnection) -> Self {
        Self { pool }
    }

    /// 搜索用户：姓名、手机号、邮箱任一包含关键字（不区分大小写），按 id 倒序
    pub async fn search_users(&self, search: Option<&str>) -> AppResult<Vec<UserSummary>> {
        let mut select = users::Entity::find();

        if let Some(term) = non_blank(search) {
            let pattern = format!("%{}%", escape_like(term));
            select = select.filter(
                Condition::any()
                    .add(lower_contains(users::Column::Name, &pattern))
                    .add(lower_contains(users::Column::Phone, &pattern))
                    .add(lower_contains(users::Column::Email, &pattern)),
            );
        }

        let models = select
            .order_by_desc(users::Column::Id)
            .all(&self.pool)
            .await?;
        let counts = self.booking_counts().await?;

        Ok(models
            .into_iter()
            .map(|m| {
                let total_bookings = counts.get(&m.id).copied().unwrap_or(0);
                UserSummary {
                    user: UserResponse::from(m),
                    total_bookings,
                }
            })
            .collect())
    }

    pub async fn get_user_details(&self, user_id: i32) -> AppResult<UserDetailResponse> {
        let user = self.find_user(user_id).await?;

        let bookings = user
            .find_related(bookings::Entity)
            .order_by_desc(bookings::Column::Id)
            .all(&self.pool)
            .await?;

        Ok(UserDetailResponse {
            user: UserResponse::from(user),
            bookings: bookings.into_iter().map(BookingResponse::from).collect(),
        })
    }

    pub async fn create_user(&self, request: CreateUserRequest) -> AppResult<UserSummary> {
        let name = request.name.trim();
        if name.is_empty() {
            return Err(AppError::ValidationError("Name is required".to_string()));
        }
        let phone = request.phone.trim();
        validate_phone(phone)?;

        let existing = users::Entity::find()
            .filter(users::Column::Phone.eq(phone))
            .one(&self.pool)
            .await?;
        if existing.is_some() {
            return Err(AppError::ValidationError(
                "Phone number already registered".to_string(),
            ));
        }

        let user = users::ActiveModel {
            name: Set(name.to_string()),
            phone: Set(phone.to_string()),
            email: Set(non_blank(request.email.as_deref()).map(str::to_string)),
            created_at: Set(Utc::now()),
            is_blocked: Set(false),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Created user {} ({})", user.id, user.phone);
        Ok(UserSummary {
            user: UserResponse::from(user),
            total_bookings: 0,
        })
    }

    pub async fn block_user(&self, user_id: i32) -> AppResult<UserResponse> {
        self.set_blocked(user_id, true).await
    }

    pub async fn unblock_user(&self, user_id: i32) -> AppResult<UserResponse> {
        self.set_blocked(user_id, false).await
    }

    /// 删除用户；其预约的 user_id 置空后保留
    pub async fn delete_user(&self, user_id: i32) -> AppResult<()> {
        let txn = self.pool.begin().await?;

        users::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))?;

        let orphaned = bookings::Entity::update_many()
            .col_expr(bookings::Column::UserId, Expr::value(Option::<i32>::None))
            .filter(bookings::Column::UserId.eq(user_id))
            .exec(&txn)
            .await?
            .rows_affected;

        users::Entity::delete_by_id(user_id).exec(&txn).await?;
        txn.commit().await?;

        log::info!("Deleted user {user_id}, detached {orphaned} booking(s)");
        Ok(())
    }

    async fn set_blocked(&self, user_id: i32, blocked: bool) -> AppResult<UserResponse> {
        let user = self.find_user(user_id).await?;
        if user.is_blocked == blocked {
            return Ok(UserResponse::from(user));
        }

        let mut model = user.into_active_model();
        model.is_blocked = Set(blocked);
        let updated = model.update(&self.pool).await?;

        log::info!(
            "User {user_id} {}",
            if blocked { "blocked" } else { "unblocked" }
        );
        Ok(UserResponse::from(updated))
    }

    async fn find_user(&self, user_id: i32) -> AppResult<users::Model> {
        users::Entity::find_by_id(user_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("User {user_id} not found")))
    }

    /// 每个用户的预约数（读取时统计，不落库）
    async fn booking_counts(&self) -> AppResult<HashMap<i32, i64>> {
        #[derive(Debug, FromQueryResult)]
        struct BookingCountRow {
            user_id: Option<i32>,
            count: i64,
        }

        let rows = bookings::Entity::find()
            .select_only()
            .column(bookings::Column::UserId)
            .column_as(Expr::col(bookings::Column::Id).count(), "count")
            .filter(bookings::Column::UserId.is_not_null())
            .group_by(bookings::Column::UserId)
            .into_model::<BookingCountRow>()
            .all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|r| r.user_id.map(|id| (id, r.count)))
            .collect())
    }
}

/// 按手机号查找用户，不存在时创建；供预约接口在同一事务内使用
pub(crate) async fn find_or_create_by_phone<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    phone: &str,
    email: Option<&str>,
) -> AppResult<users::Model> {
    validate_phone(phone)?;

    if let Some(user) = find_by_phone(conn, phone).await? {
        return Ok(user);
    }

    if insert_user_if_absent(conn, name, phone, email).await? == 1 {
        log::info!("Created user for phone {phone} from booking request");
    }

    // 并发请求可能先插入了同一手机号
    find_by_phone(conn, phone)
        .await?
        .ok_or_else(|| AppError::InternalError(format!("User with phone {phone} vanished")))
}

async fn find_by_phone<C: ConnectionTrait>(conn: &C, phone: &str) -> AppResult<Option<users::Model>> {
    Ok(users::Entity::find()
        .filter(users::Column::Phone.eq(phone))
        .one(conn)
        .await?)
}

/// 手机号冲突时不插入，返回受影响行数
async fn insert_user_if_absent<C: ConnectionTrait>(
    conn: &C,
    name: &str,
    phone: &str,
    email: Option<&str>,
) -> AppResult<u64> {
    let model = users::ActiveModel {
        name: Set(name.to_string()),
        phone: Set(phone.to_string()),
        email: Set(email.map(str::to_string)),
        created_at: Set(Utc::now()),
        is_blocked: Set(false),
        ..Default::default()
    };

    let inserted = users::Entity::insert(model)
        .on_conflict(
            OnConflict::column(users::Column::Phone)
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(conn)
        .await?;
    Ok(inserted)
}

/// `LOWER(col) LIKE LOWER(pattern) ESCAPE '\'`，两侧由同一个数据库函数转小写
fn lower_contains(column: users::Column, pattern: &str) -> SimpleExpr {
    let escaped_pattern = SimpleExpr::Binary(
        Box::new(Func::lower(Expr::val(pattern)).into()),
        BinOper::Escape,
        Box::new(SimpleExpr::Constant('\\'.into())),
    );
    Expr::expr(Func::lower(Expr::col(column))).binary(BinOper::Like, escaped_pattern)
}

fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::setup_test_db;

    async fn insert_user(pool: &DatabaseConnection, name: &str, phone: &str, email: Option<&str>) -> users::Model {
        users::ActiveModel {
            name: Set(name.to_string()),
            phone: Set(phone.to_string()),
            email: Set(email.map(str::to_string)),
            created_at: Set(Utc::now()),
            is_blocked: Set(false),
            ..Default::default()
        }
        .insert(pool)
        .await
        .unwrap()
    }

    async fn insert_booking(pool: &DatabaseConnection, user_id: Option<i32>) -> bookings::Model {
        bookings::ActiveModel {
            user_id: Set(user_id),
            service: Set("Hair".to_string()),
            date: Set("2025-03-01".to_string()),
            status: Set(STATUS_PENDING.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(pool)
        .await
        .unwrap()
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("alice"), "alice");
        assert_eq!(escape_like("100%"), "100\\%");
        assert_eq!(escape_like("a_b\\c"), "a\\_b\\\\c");
    }

    #[tokio::test]
    async fn test_search_matches_any_field_case_insensitively() {
        let pool = setup_test_db().await;
        let service = UserService::new(pool.clone());
        let by_email = insert_user(&pool, "Bob", "+15550001", Some("ALICE@x.com")).await;
        let by_name = insert_user(&pool, "Alice Smith", "+15550002", None).await;
        insert_user(&pool, "Carol", "+15550003", Some("carol@x.com")).await;

        let found = service.search_users(Some("alice")).await.unwrap();
        let ids: Vec<i32> = found.iter().map(|s| s.user.id).collect();
        assert_eq!(ids, vec![by_name.id, by_email.id]);

        let by_phone = service.search_users(Some("0003")).await.unwrap();
        assert_eq!(by_phone.len(), 1);
        assert_eq!(by_phone[0].user.name, "Carol");
    }

    #[tokio::test]
    async fn test_search_treats_wildcards_literally() {
        let pool = setup_test_db().await;
        let service = UserService::new(pool.clone());
        insert_user(&pool, "Alice", "+15550001", None).await;

        assert!(service.search_users(Some("%")).await.unwrap().is_empty());
        assert!(service.search_users(Some("_")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_empty_search_returns_all_newest_first_with_counts() {
        let pool = setup_test_db().await;
        let service = UserService::new(pool.clone());
        let first = insert_user(&pool, "Alice", "+15550001", None).await;
        let second = insert_user(&pool, "Bob", "+15550002", None).await;
        insert_booking(&pool, Some(first.id)).await;
        insert_booking(&pool, Some(first.id)).await;
        insert_booking(&pool, None).await;

        for search in [None, Some(""), Some("   ")] {
            let users = service.search_users(search).await.unwrap();
            assert_eq!(users.len(), 2);
            assert_eq!(users[0].user.id, second.id);
            assert_eq!(users[0].total_bookings, 0);
            assert_eq!(users[1].user.id, first.id);
            assert_eq!(users[1].total_bookings, 2);
        }
    }

    #[tokio::test]
    async fn test_user_details_lists_bookings_newest_first() {
        let pool = setup_test_db().await;
        let service = UserService::new(pool.clone());
        let user = insert_user(&pool, "Alice", "+15550001", None).await;
        let older = insert_booking(&pool, Some(user.id)).await;
        let newer = insert_booking(&pool, Some(user.id)).await;
        insert_booking(&pool, None).await;

        let details = service.get_user_details(user.id).await.unwrap();
        assert_eq!(details.user.id, user.id);
        let ids: Vec<i32> = details.bookings.iter().map(|b| b.id).collect();
        assert_eq!(ids, vec![newer.id, older.id]);

        assert!(matches!(
            service.get_user_details(999).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_block_unblock_round_trip() {
        let pool = setup_test_db().await;
        let service = UserService::new(pool.clone());
        let user = insert_user(&pool, "Alice", "+15550001", None).await;

        assert!(service.block_user(user.id).await.unwrap().is_blocked);
        // 重复操作是幂等的
        assert!(service.block_user(user.id).await.unwrap().is_blocked);
        assert!(!service.unblock_user(user.id).await.unwrap().is_blocked);

        let stored = users::Entity::find_by_id(user.id).one(&pool).await.unwrap().unwrap();
        assert!(!stored.is_blocked);

        assert!(matches!(service.block_user(999).await, Err(AppError::NotFound(_))));
        assert!(matches!(service.unblock_user(999).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_delete_user_detaches_bookings() {
        let pool = setup_test_db().await;
        let service = UserService::new(pool.clone());
        let user = insert_user(&pool, "Alice", "+15550001", None).await;
        let booking = insert_booking(&pool, Some(user.id)).await;

        service.delete_user(user.id).await.unwrap();

        assert!(users::Entity::find_by_id(user.id).one(&pool).await.unwrap().is_none());
        let kept = bookings::Entity::find_by_id(booking.id).one(&pool).await.unwrap().unwrap();
        assert_eq!(kept.user_id, None);

        assert!(matches!(service.delete_user(user.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_search_matches_non_ascii_names() {
        let pool = setup_test_db().await;
        let service = UserService::new(pool.clone());
        let user = insert_user(&pool, "Élodie Martin", "+15550001", None).await;
        insert_user(&pool, "Alice", "+15550002", None).await;

        for term in ["Élodie", "Élodie Martin", "MARTIN", "odie"] {
            let found = service.search_users(Some(term)).await.unwrap();
            let ids: Vec<i32> = found.iter().map(|s| s.user.id).collect();
            assert_eq!(ids, vec![user.id], "search {term:?}");
        }
    }

    #[tokio::test]
    async fn test_find_or_create_by_phone_reuses_existing_user() {
        let pool = setup_test_db().await;
        let existing = insert_user(&pool, "Alice", "+15550001", None).await;

        let found = find_or_create_by_phone(&pool, "Someone Else", "+15550001", None)
            .await
            .unwrap();
        assert_eq!(found.id, existing.id);
        assert_eq!(found.name, "Alice");

        let created = find_or_create_by_phone(&pool, "Bob", "+15550002", Some("bob@x.com"))
            .await
            .unwrap();
        assert_ne!(created.id, existing.id);
        assert_eq!(created.email.as_deref(), Some("bob@x.com"));
        assert_eq!(users::Entity::find().all(&pool).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_insert_if_absent_ignores_phone_conflict() {
        let pool = setup_test_db().await;
        let existing = insert_user(&pool, "Alice", "+15550001", None).await;

        // 另一个请求已经插入同一手机号时，不报错也不重复插入
        let inserted = insert_user_if_absent(&pool, "Late", "+15550001", None).await.unwrap();
        assert_eq!(inserted, 0);

        let all = users::Entity::find().all(&pool).await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, existing.id);
        assert_eq!(all[0].name, "Alice");
    }

    #[tokio::test]
    async fn test_find_or_create_by_phone_validates_phone() {
        let pool = setup_test_db().await;

        let result = find_or_create_by_phone(&pool, "Alice", "call me", None).await;
        assert!(matches!(result, Err(AppError::ValidationError(_))));
        assert!(users::Entity::find().all(&pool).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_user_validates_and_rejects_duplicate_phone() {
        let pool = setup_test_db().await;
        let service = UserService::new(pool.clone());

        let created = service
            .create_user(CreateUserRequest {
                name: " Jane ".to_string(),
                phone: "+15550100".to_string(),
                email: Some("".to_string()),
            })
            .await
            .unwrap();
        assert_eq!(created.user.name, "Jane");
        assert_eq!(created.user.email, None);
        assert_eq!(created.total_bookings, 0);

        let duplicate = service
            .create_user(CreateUserRequest {
                name: "Other".to_string(),
                phone: "+15550100".to_string(),
                email: None,
            })
            .await;
        assert!(matches!(duplicate, Err(AppError::ValidationError(_))));

        let bad_phone = service
            .create_user(CreateUserRequest {
                name: "Other".to_string(),
                phone: "call me".to_string(),
                email: None,
            })
            .await;
        assert!(matches!(bad_phone, Err(AppError::ValidationError(_))));
    }
}
