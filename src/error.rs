use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{
    auth::{
        policy::{AuthzError, DenyReason},
        token::TokenError,
    },
    cache::{operations::sms_code::CodeError, store::KvError},
    database::StoreError,
    utils::{PasswordError, error_codes, error_to_api_response},
};

/// 5xx 响应携带的内部错误细节，由错误日志中间件统一记录
#[derive(Debug, Clone)]
pub struct ErrorDetail(pub String);

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}不存在")]
    NotFound(&'static str),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    RateLimited(String),
    #[error("验证码不匹配，请重新输入")]
    CodeMismatch,
    #[error("验证码失效")]
    CodeExpired,
    #[error("backing store unavailable: {0}")]
    Transient(String),
    #[error("token signing failed: {0}")]
    Signing(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, i32) {
        match self {
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, error_codes::VALIDATION_ERROR),
            AppError::Unauthenticated(_) => (StatusCode::UNAUTHORIZED, error_codes::AUTH_FAILED),
            AppError::Forbidden(_) => (StatusCode::FORBIDDEN, error_codes::PERMISSION_DENIED),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, error_codes::NOT_FOUND),
            AppError::Conflict(_) => (StatusCode::CONFLICT, error_codes::USER_EXISTS),
            AppError::RateLimited(_) => (StatusCode::TOO_MANY_REQUESTS, error_codes::RATE_LIMIT),
            AppError::CodeMismatch => (StatusCode::BAD_REQUEST, error_codes::CODE_MISMATCH),
            AppError::CodeExpired => (StatusCode::BAD_REQUEST, error_codes::CODE_EXPIRED),
            AppError::Transient(_) => (
                StatusCode::SERVICE_UNAVAILABLE,
                error_codes::SERVICE_UNAVAILABLE,
            ),
            AppError::Signing(_) | AppError::Internal(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                error_codes::INTERNAL_ERROR,
            ),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        // 5xx 的细节只进日志，不回给客户端
        let msg = match &self {
            AppError::Transient(_) => "服务暂不可用，请稍后重试".to_string(),
            AppError::Signing(_) | AppError::Internal(_) => "内部服务器错误".to_string(),
            other => other.to_string(),
        };

        let mut response = (status, error_to_api_response::<()>(code, msg)).into_response();
        if status.is_server_error() {
            response
                .extensions_mut()
                .insert(ErrorDetail(self.to_string()));
        }
        response
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::SigningError(e) => AppError::Signing(e),
            TokenError::InvalidConfig(e) => AppError::Internal(e),
            other => AppError::Unauthenticated(format!("无效的认证令牌: {other}")),
        }
    }
}

impl From<PasswordError> for AppError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::EmptyInput => AppError::Validation("密码不能为空".into()),
            other => AppError::Internal(other.to_string()),
        }
    }
}

impl From<KvError> for AppError {
    fn from(err: KvError) -> Self {
        AppError::Transient(err.to_string())
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(field) => AppError::Conflict(format!("{field}已存在")),
            other => AppError::Transient(other.to_string()),
        }
    }
}

impl From<CodeError> for AppError {
    fn from(err: CodeError) -> Self {
        match err {
            CodeError::Mismatch => AppError::CodeMismatch,
            CodeError::Expired => AppError::CodeExpired,
            CodeError::TooManyAttempts => {
                AppError::RateLimited("验证次数过多，请重新获取".into())
            }
            CodeError::Store(e) => e.into(),
        }
    }
}

impl From<AuthzError> for AppError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Denied(reason) => AppError::Forbidden(deny_message(&reason)),
            AuthzError::Lookup(e) => AppError::Internal(format!("检查权限失败: {e}")),
        }
    }
}

fn deny_message(reason: &DenyReason) -> String {
    match reason {
        DenyReason::MissingRole(role) => format!("权限不足，需要 {role} 角色"),
        DenyReason::MissingPermission(perm) => format!("权限不足，需要 {perm} 权限"),
        DenyReason::MissingAnyPermission(perms) => {
            format!("权限不足，需要以下权限之一: {}", perms.join(", "))
        }
        DenyReason::MissingRoleOrPermission { role, permission } => {
            format!("权限不足，需要 {role} 角色或 {permission} 权限")
        }
    }
}
