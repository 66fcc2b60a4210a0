use crate::config::{AdminConfig, DEFAULT_ADMIN_PASSWORD};
use crate::entities::admin_entity as admins;
use crate::error::{AppError, AppResult};
use crate::models::*;
use crate::utils::*;
use chrono::Utc;
use std::sync::LazyLock;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};

const INVALID_CREDENTIALS: &str = "Invalid username or password";

// 用户名不存在时也做一次 bcrypt 校验，使响应耗时与密码错误一致
static UNKNOWN_ADMIN_HASH: LazyLock<Option<String>> =
    LazyLock::new(|| hash_password("unknown-admin-placeholder").ok());

#[derive(Clone)]
pub struct AuthService {
    pool: DatabaseConnection,
    session_service: SessionService,
}

impl AuthService {
    pub fn new(pool: DatabaseConnection, session_service: SessionService) -> Self {
        Self {
            pool,
            session_service,
        }
    }

    /// 管理员表为空时创建默认管理员，返回是否新建
    pub async fn ensure_default_admin(&self, config: &AdminConfig) -> AppResult<bool> {
        let existing = admins::Entity::find().count(&self.pool).await?;
        if existing > 0 {
            return Ok(false);
        }

        if config.username.trim().is_empty() || config.password.is_empty() {
            return Err(AppError::ConfigError(
                "Admin username and password must not be empty".to_string(),
            ));
        }
        if config.password == DEFAULT_ADMIN_PASSWORD {
            log::warn!(
                "ADMIN_PASSWORD not set. Using default password '{DEFAULT_ADMIN_PASSWORD}'. Set ADMIN_PASSWORD in production."
            );
        }

        let password_hash = hash_password(&config.password)?;
        admins::ActiveModel {
            username: Set(config.username.trim().to_string()),
            password_hash: Set(password_hash),
            created_at: Set(Utc::now()),
            ..Default::default()
        }
        .insert(&self.pool)
        .await?;

        log::info!("Created default admin account '{}'", config.username.trim());
        Ok(true)
    }

    pub async fn login(&self, request: LoginRequest) -> AppResult<AuthResponse> {
        let Some(admin) = admins::Entity::find()
            .filter(admins::Column::Username.eq(request.username.trim()))
            .one(&self.pool)
            .await?
        else {
            if let Some(hash) = UNKNOWN_ADMIN_HASH.as_deref() {
                let _ = verify_password(&request.password, hash);
            }
            log::warn!("Failed login attempt for '{}'", request.username.trim());
            return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
        };

        let is_valid = if is_password_hash(&admin.password_hash) {
            verify_password(&request.password, &admin.password_hash)?
        } else {
            // 旧数据为明文密码，验证通过后升级为 bcrypt
            admin.password_hash == request.password
        };
        if !is_valid {
            log::warn!("Failed login attempt for '{}'", request.username.trim());
            return Err(AppError::AuthError(INVALID_CREDENTIALS.to_string()));
        }

        let admin = if is_password_hash(&admin.password_hash) {
            admin
        } else {
            let mut model = admin.into_active_model();
            model.password_hash = Set(hash_password(&request.password)?);
            let upgraded = model.update(&self.pool).await?;
            log::info!("Upgraded legacy password storage for admin {}", upgraded.id);
            upgraded
        };

        let token = self.session_service.issue(admin.id, &admin.username)?;
        log::info!("Admin '{}' logged in", admin.username);

        Ok(AuthResponse {
            admin: AdminResponse {
                id: admin.id,
                username: admin.username,
            },
            token,
            expires_in: self.session_service.expires_in(),
            redirect_to: "/dashboard".to_string(),
        })
    }
}
