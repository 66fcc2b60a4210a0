use serde::{Deserialize, Serialize};
use std::env;

pub const DEFAULT_SESSION_SECRET: &str = "change-me-in-production";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    #[serde(default)]
    pub dashboard: DashboardConfig,
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// CORS 允许的来源，为空时允许任意来源
    #[serde(default)]
    pub allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            allowed_origins: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://admin.db?mode=rwc".to_string(),
            max_connections: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub secret: String,
    pub expires_in: i64, // seconds
    pub cookie_name: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            secret: DEFAULT_SESSION_SECRET.to_string(),
            expires_in: 43_200,
            cookie_name: "admin_session".to_string(),
        }
    }
}

/// 首次启动时创建的管理员账号
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            username: "admin".to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardConfig {
    pub per_page: u64,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self { per_page: 10 }
    }
}

/// `/api` 路由的访问策略，默认与旧系统一致（公开）
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ApiConfig {
    pub public_read: bool,
    pub public_write: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            public_read: true,
            public_write: true,
        }
    }
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        // 配置文件不存在时完全依赖环境变量与默认值
        let mut config = match std::fs::read_to_string(&config_path) {
            Ok(config_str) => Self::from_toml_str(&config_str)
                .map_err(|e| format!("Failed to parse config file {config_path}: {e}"))?,
            Err(e) if e.kind() == ErrorKind::NotFound => Config::default(),
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // 环境变量覆盖（即便文件存在时也覆盖）
        config.apply_env_overrides();
        config.normalize();
        config.validate()?;

        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self, toml::de::Error> {
        let mut config: Config = toml::from_str(config_str)?;
        config.normalize();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(v) = env::var("SERVER_HOST") {
            self.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            self.server.port = p;
        }
        if let Ok(v) = env::var("ALLOWED_ORIGINS") {
            self.server.allowed_origins = v
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            self.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            self.database.max_connections = mc;
        }
        if let Ok(v) = env::var("SECRET_KEY") {
            self.session.secret = v;
        }
        if let Ok(v) = env::var("SESSION_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            self.session.expires_in = n;
        }
        if let Ok(v) = env::var("SESSION_COOKIE_NAME") {
            self.session.cookie_name = v;
        }
        if let Ok(v) = env::var("ADMIN_USERNAME") {
            self.admin.username = v;
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            self.admin.password = v;
        }
        if let Ok(v) = env::var("BOOKINGS_PER_PAGE")
            && let Ok(n) = v.parse()
        {
            self.dashboard.per_page = n;
        }
        if let Ok(v) = env::var("API_PUBLIC_READ")
            && let Ok(b) = v.parse()
        {
            self.api.public_read = b;
        }
        if let Ok(v) = env::var("API_PUBLIC_WRITE")
            && let Ok(b) = v.parse()
        {
            self.api.public_write = b;
        }
    }

    fn normalize(&mut self) {
        // Heroku 风格的 postgres:// 连接串
        if let Some(rest) = self.database.url.strip_prefix("postgres://") {
            self.database.url = format!("postgresql://{rest}");
        }
    }

    fn validate(&self) -> Result<(), Box<dyn std::error::Error>> {
        if self.dashboard.per_page == 0 {
            return Err("dashboard.per_page must be greater than 0".into());
        }
        if self.session.expires_in <= 0 {
            return Err("session.expires_in must be greater than 0".into());
        }
        if self.session.cookie_name.trim().is_empty() {
            return Err("session.cookie_name must not be empty".into());
        }
        Ok(())
    }

    pub fn uses_default_secret(&self) -> bool {
        self.session.secret == DEFAULT_SESSION_SECRET
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [dashboard]
            per_page = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.dashboard.per_page, 5);
        assert_eq!(config.database.url, "sqlite://admin.db?mode=rwc");
        assert_eq!(config.admin.username, "admin");
        assert!(config.api.public_read);
        assert!(config.api.public_write);
        assert!(config.uses_default_secret());
    }

    #[test]
    fn test_postgres_scheme_is_normalized() {
        let config = Config::from_toml_str(
            r#"
            [database]
            url = "postgres://u:p@localhost/bookings"
            max_connections = 10
            "#,
        )
        .unwrap();

        assert_eq!(config.database.url, "postgresql://u:p@localhost/bookings");
        assert_eq!(config.database.max_connections, 10);
    }

    #[test]
    fn test_validate_rejects_zero_page_size() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());
        config.dashboard.per_page = 0;
        assert!(config.validate().is_err());
    }
}
