use crate::config::ApiConfig;
use crate::error::AppError;
use crate::utils::{AuthenticatedAdmin, SessionService};
use actix_web::dev::Payload;
use actix_web::http::{Method, header};
use actix_web::{
    Error, FromRequest, HttpMessage, HttpRequest,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RouteAccess {
    /// 无需登录
    Public,
    /// 后台页面，未登录重定向到登录页
    Page,
    /// JSON 接口，未登录返回 401
    Api,
}

// 公开路径配置
struct AccessPolicy {
    exact_paths: Vec<&'static str>,
    prefix_paths: Vec<&'static str>,
    api: ApiConfig,
}

impl AccessPolicy {
    fn new(api: ApiConfig) -> Self {
        Self {
            // 完全匹配的公开路径
            exact_paths: vec!["/", "/logout", "/health", "/swagger-ui", "/api-docs/openapi.json"],
            // 前缀匹配的公开路径
            prefix_paths: vec!["/swagger-ui/", "/api-docs/"],
            api,
        }
    }

    fn classify(&self, method: &Method, path: &str) -> RouteAccess {
        if self.exact_paths.contains(&path)
            || self
                .prefix_paths
                .iter()
                .any(|&prefix| path.starts_with(prefix))
        {
            return RouteAccess::Public;
        }

        if path == "/api" || path.starts_with("/api/") {
            let is_read = method == Method::GET || method == Method::HEAD;
            let public = if is_read {
                self.api.public_read
            } else {
                self.api.public_write
            };
            return if public {
                RouteAccess::Public
            } else {
                RouteAccess::Api
            };
        }

        RouteAccess::Page
    }
}

/// 会话校验中间件：从 cookie 或 Bearer header 读取会话令牌
pub struct SessionGuard {
    session_service: SessionService,
    api: ApiConfig,
}

impl SessionGuard {
    pub fn new(session_service: SessionService, api: ApiConfig) -> Self {
        Self {
            session_service,
            api,
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for SessionGuard
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionGuardService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionGuardService {
            service,
            session_service: self.session_service.clone(),
            policy: AccessPolicy::new(self.api),
        }))
    }
}

pub struct SessionGuardService<S> {
    service: S,
    session_service: SessionService,
    policy: AccessPolicy,
}

impl<S> SessionGuardService<S> {
    fn session_token(&self, req: &ServiceRequest) -> Option<String> {
        if let Some(cookie) = req.request().cookie(self.session_service.cookie_name()) {
            return Some(cookie.value().to_string());
        }

        req.headers()
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::to_string)
    }
}

impl<S, B> Service<ServiceRequest> for SessionGuardService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        // 放行所有 CORS 预检请求
        if req.method() == Method::OPTIONS {
            let fut = self.service.call(req);
            return Box::pin(fut);
        }

        let access = self.policy.classify(req.method(), req.path());
        let session = self
            .session_token(&req)
            .map(|token| self.session_service.verify(&token));

        match (access, session) {
            (_, Some(Ok(admin))) => {
                req.extensions_mut().insert(admin);
                Box::pin(self.service.call(req))
            }
            (RouteAccess::Public, _) => Box::pin(self.service.call(req)),
            (RouteAccess::Page, _) => {
                log::debug!("Unauthenticated request to {}, redirecting", req.path());
                Box::pin(async move { Err(AppError::LoginRequired.into()) })
            }
            (RouteAccess::Api, None) => {
                let error = AppError::AuthError("Missing session token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
            (RouteAccess::Api, Some(Err(_))) => {
                let error = AppError::AuthError("Invalid session token".to_string());
                Box::pin(async move { Err(error.into()) })
            }
        }
    }
}

impl FromRequest for AuthenticatedAdmin {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let admin = req
            .extensions()
            .get::<AuthenticatedAdmin>()
            .cloned()
            .ok_or_else(|| AppError::LoginRequired.into());
        ready(admin)
    }
}
