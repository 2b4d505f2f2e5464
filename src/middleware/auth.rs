use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use thiserror::Error;

use crate::{AppState, error::AppError};

/// 已通过令牌校验的用户 ID，由认证中间件写入请求扩展
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthUserId(pub u64);

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CredentialError {
    #[error("未提供认证令牌")]
    MissingCredential,
    #[error("认证令牌格式错误")]
    MalformedCredential,
}

impl From<CredentialError> for AppError {
    fn from(err: CredentialError) -> Self {
        AppError::Unauthenticated(err.to_string())
    }
}

/// 解析 `Authorization: Bearer <token>`，方案名区分大小写
pub fn bearer_token(header: Option<&str>) -> Result<&str, CredentialError> {
    let header = header.ok_or(CredentialError::MissingCredential)?;
    match header.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim()),
        _ => Err(CredentialError::MalformedCredential),
    }
}

pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let header = match req.headers().get(AUTHORIZATION) {
        Some(value) => Some(
            value
                .to_str()
                .map_err(|_| CredentialError::MalformedCredential)?,
        ),
        None => None,
    };
    let token = bearer_token(header)?;

    let user_id = state.auth.authenticate(token).inspect_err(|e| {
        tracing::debug!(error = %e, path = %req.uri().path(), "token rejected");
    })?;

    req.extensions_mut().insert(AuthUserId(user_id));
    Ok(next.run(req).await)
}
