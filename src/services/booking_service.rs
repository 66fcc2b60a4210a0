use crate::entities::booking_entity as bookings;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::services::user_service::find_or_create_by_phone;
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};

#[derive(Clone)]
pub struct BookingService {
    pool: DatabaseConnection,
    per_page: u64,
}

impl BookingService {
    pub fn new(pool: DatabaseConnection, per_page: u64) -> Self {
        Self { pool, per_page }
    }

    /// 后台预约列表：状态/日期精确过滤，按 id 倒序分页
    pub async fn list_bookings(
        &self,
        query: &BookingQuery,
    ) -> AppResult<PaginatedResponse<BookingResponse>> {
        let page = query.page.unwrap_or(1);
        if page < 1 {
            return Err(AppError::ValidationError(
                "Page must be 1 or greater".to_string(),
            ));
        }
        let request = PageRequest::new(page, self.per_page);

        let mut select = bookings::Entity::find();
        if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
            select = select.filter(bookings::Column::Status.eq(status));
        }
        if let Some(date) = query.date.as_deref().filter(|d| !d.is_empty()) {
            select = select.filter(bookings::Column::Date.eq(date));
        }

        let total = select.clone().count(&self.pool).await?;
        if request.is_past_end(total) {
            return Ok(PaginatedResponse::new(Vec::new(), request, total));
        }

        let models = select
            .order_by_desc(bookings::Column::Id)
            .offset(request.offset())
            .limit(request.limit())
            .all(&self.pool)
            .await?;
        let items: Vec<BookingResponse> = models.into_iter().map(BookingResponse::from).collect();

        Ok(PaginatedResponse::new(items, request, total))
    }

    /// 覆盖预约状态（自由文本，仅拒绝空值）
    pub async fn update_status(&self, booking_id: i32, status: &str) -> AppResult<BookingResponse> {
        let status = status.trim();
        if status.is_empty() {
            return Err(AppError::ValidationError("Status is required".to_string()));
        }

        let booking = bookings::Entity::find_by_id(booking_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Booking {booking_id} not found")))?;

        let previous = booking.status.clone();
        let mut model = booking.into_active_model();
        model.status = Set(status.to_string());
        let updated = model.update(&self.pool).await?;

        log::info!("Booking {booking_id} status changed: {previous} -> {status}");
        Ok(BookingResponse::from(updated))
    }

    pub async fn list_all(&self) -> AppResult<Vec<BookingResponse>> {
        let models = bookings::Entity::find()
            .order_by_desc(bookings::Column::Id)
            .all(&self.pool)
            .await?;

        Ok(models.into_iter().map(BookingResponse::from).collect())
    }

    /// 外部站点创建预约：name 与 service 必填，状态默认 Pending，日期默认当天 (UTC)
    pub async fn create_booking(&self, request: CreateBookingRequest) -> AppResult<BookingResponse> {
        let name = non_blank(request.name.as_deref());
        let service = non_blank(request.service.as_deref());

        let mut missing = Vec::new();
        if name.is_none() {
            missing.push("name");
        }
        if service.is_none() {
            missing.push("service");
        }
        let (Some(name), Some(service)) = (name, service) else {
            return Err(AppError::ValidationError(format!(
                "Missing required fields: {}",
                missing.join(", ")
            )));
        };

        let date = non_blank(request.date.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| Utc::now().format("%Y-%m-%d").to_string());
        let status = non_blank(request.status.as_deref()).unwrap_or(STATUS_PENDING);
        let optional = |value: &Option<String>| non_blank(value.as_deref()).map(str::to_string);

        let txn = self.pool.begin().await?;

        let user_id = match non_blank(request.phone.as_deref()) {
            Some(phone) => {
                let email = non_blank(request.email.as_deref());
                Some(find_or_create_by_phone(&txn, name, phone, email).await?.id)
            }
            None => None,
        };

        let booking = bookings::ActiveModel {
            user_id: Set(user_id),
            customer_name: Set(Some(name.to_string())),
            service: Set(service.to_string()),
            date: Set(date),
            time: Set(optional(&request.time)),
            location: Set(optional(&request.location)),
            package: Set(optional(&request.package)),
            addons: Set(optional(&request.addons)),
            payment_method: Set(optional(&request.payment_method)),
            payment_status: Set(optional(&request.payment_status)),
            status: Set(status.to_string()),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        txn.commit().await?;

        log::info!(
            "Created booking {} for '{}' ({}) on {}",
            booking.id,
            name,
            booking.service,
            booking.date
        );
        Ok(BookingResponse::from(booking))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::setup_test_db;
    use crate::entities::user_entity as users;
    use crate::services::UserService;

    async fn seed(pool: &DatabaseConnection, statuses: &[&str], date: &str) -> Vec<bookings::Model> {
        let mut created = Vec::new();
        for status in statuses {
            let model = bookings::ActiveModel {
                customer_name: Set(Some("Jane".to_string())),
                service: Set("Hair".to_string()),
                date: Set(date.to_string()),
                status: Set(status.to_string()),
                created_at: Set(Utc::now()),
                ..Default::default()
            }
            .insert(pool)
            .await
            .unwrap();
            created.push(model);
        }
        created
    }

    fn page(page: u64) -> BookingQuery {
        BookingQuery {
            page: Some(page),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_pagination_sizes_and_order() {
        let pool = setup_test_db().await;
        let service = BookingService::new(pool.clone(), 5);
        let seeded = seed(&pool, &[STATUS_PENDING; 12], "2025-03-01").await;

        // N = 12, P = 5：每页 min(P, max(0, N - (k-1)P)) 条
        for (k, expected) in [(1u64, 5usize), (2, 5), (3, 2), (4, 0), (10, 0)] {
            let result = service.list_bookings(&page(k)).await.unwrap();
            assert_eq!(result.items.len(), expected, "page {k}");
            assert_eq!(result.total, 12);
            assert_eq!(result.total_pages, 3);
        }

        let first = service.list_bookings(&BookingQuery::default()).await.unwrap();
        assert_eq!(first.page, 1);
        assert_eq!(first.items[0].id, seeded.last().unwrap().id);
        assert!(first.items.windows(2).all(|w| w[0].id > w[1].id));
    }

    #[tokio::test]
    async fn test_empty_table_has_zero_pages() {
        let pool = setup_test_db().await;
        let service = BookingService::new(pool, 10);

        let result = service.list_bookings(&BookingQuery::default()).await.unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.total_pages, 0);
    }

    #[tokio::test]
    async fn test_huge_page_returns_empty_slice() {
        let pool = setup_test_db().await;
        let service = BookingService::new(pool.clone(), 5);
        seed(&pool, &[STATUS_PENDING; 3], "2025-03-01").await;

        let result = service.list_bookings(&page(1 << 62)).await.unwrap();
        assert!(result.items.is_empty());
        assert_eq!(result.page, 1 << 62);
        assert_eq!(result.total, 3);
        assert_eq!(result.total_pages, 1);

        let result = service.list_bookings(&page(u64::MAX)).await.unwrap();
        assert!(result.items.is_empty());
    }

    #[tokio::test]
    async fn test_page_zero_is_rejected() {
        let pool = setup_test_db().await;
        let service = BookingService::new(pool, 10);

        assert!(matches!(
            service.list_bookings(&page(0)).await,
            Err(AppError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_status_and_date_filters_are_exact() {
        let pool = setup_test_db().await;
        let service = BookingService::new(pool.clone(), 10);
        seed(&pool, &[STATUS_PENDING, STATUS_CONFIRMED, "confirmed"], "2025-03-01").await;
        seed(&pool, &[STATUS_CONFIRMED], "2025-03-02").await;

        let confirmed = service
            .list_bookings(&BookingQuery {
                status: Some(STATUS_CONFIRMED.to_string()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(confirmed.total, 2);
        assert!(confirmed.items.iter().all(|b| b.status == STATUS_CONFIRMED));

        let confirmed_on_day = service
            .list_bookings(&BookingQuery {
                status: Some(STATUS_CONFIRMED.to_string()),
                date: Some("2025-03-02".to_string()),
                page: None,
            })
            .await
            .unwrap();
        assert_eq!(confirmed_on_day.total, 1);

        let unfiltered = service
            .list_bookings(&BookingQuery {
                status: Some(String::new()),
                date: Some(String::new()),
                page: None,
            })
            .await
            .unwrap();
        assert_eq!(unfiltered.total, 4);
    }

    #[tokio::test]
    async fn test_update_status_touches_only_target_row() {
        let pool = setup_test_db().await;
        let service = BookingService::new(pool.clone(), 10);
        let seeded = seed(&pool, &[STATUS_PENDING, STATUS_PENDING], "2025-03-01").await;
        let target = &seeded[0];

        let updated = service.update_status(target.id, STATUS_COMPLETED).await.unwrap();
        assert_eq!(updated.status, STATUS_COMPLETED);

        let stored = bookings::Entity::find_by_id(target.id).one(&pool).await.unwrap().unwrap();
        assert_eq!(stored.status, STATUS_COMPLETED);
        assert_eq!(stored.service, target.service);
        assert_eq!(stored.date, target.date);
        assert_eq!(stored.customer_name, target.customer_name);

        let other = bookings::Entity::find_by_id(seeded[1].id).one(&pool).await.unwrap().unwrap();
        assert_eq!(other.status, STATUS_PENDING);
    }

    #[tokio::test]
    async fn test_update_status_errors() {
        let pool = setup_test_db().await;
        let service = BookingService::new(pool.clone(), 10);
        let seeded = seed(&pool, &[STATUS_PENDING], "2025-03-01").await;

        assert!(matches!(
            service.update_status(999, STATUS_COMPLETED).await,
            Err(AppError::NotFound(_))
        ));
        assert!(matches!(
            service.update_status(seeded[0].id, "  ").await,
            Err(AppError::ValidationError(_))
        ));
        // 未知状态直接写入
        let custom = service.update_status(seeded[0].id, "No-show").await.unwrap();
        assert_eq!(custom.status, "No-show");
    }

    #[tokio::test]
    async fn test_create_booking_defaults() {
        let pool = setup_test_db().await;
        let service = BookingService::new(pool, 10);

        let booking = service
            .create_booking(CreateBookingRequest {
                name: Some("Jane".to_string()),
                service: Some("Hair".to_string()),
                ..Default::default()
            })
            .await
            .unwrap();

        assert_eq!(booking.status, STATUS_PENDING);
        assert_eq!(booking.date, Utc::now().format("%Y-%m-%d").to_string());
        assert_eq!(booking.customer_name.as_deref(), Some("Jane"));
        assert_eq!(booking.user_id, None);
        let all = service.list_all().await.unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].id, booking.id);
    }

    #[tokio::test]
    async fn test_create_booking_requires_name_and_service() {
        let pool = setup_test_db().await;
        let service = BookingService::new(pool, 10);

        let err = service
            .create_booking(CreateBookingRequest {
                name: Some("  ".to_string()),
                ..Default::default()
            })
            .await
            .unwrap_err();
        match err {
            AppError::ValidationError(msg) => {
                assert_eq!(msg, "Missing required fields: name, service");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(service.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_create_booking_links_user_by_phone() {
        let pool = setup_test_db().await;
        let service = BookingService::new(pool.clone(), 10);
        let request = CreateBookingRequest {
            name: Some("Jane".to_string()),
            service: Some("Hair".to_string()),
            date: Some("2025-04-01".to_string()),
            phone: Some("+15550100".to_string()),
            email: Some("jane@example.com".to_string()),
            ..Default::default()
        };

        let first = service.create_booking(request.clone()).await.unwrap();
        let second = service.create_booking(request).await.unwrap();
        assert!(first.user_id.is_some());
        assert_eq!(first.user_id, second.user_id);
        assert_eq!(second.date, "2025-04-01");
        assert_eq!(users::Entity::find().count(&pool).await.unwrap(), 1);

        let summaries = UserService::new(pool).search_users(None).await.unwrap();
        assert_eq!(summaries[0].total_bookings, 2);
        assert_eq!(summaries[0].user.email.as_deref(), Some("jane@example.com"));
    }
}
