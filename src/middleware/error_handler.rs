use std::any::Any;

use axum::{
    body::{Body, to_bytes},
    http::{Request, header::CONTENT_LENGTH},
    middleware::Next,
    response::{IntoResponse, Response},
};
use tracing::error;

use crate::error::{AppError, ErrorDetail};

// 错误响应体一般很小，超过部分不记录
const MAX_LOGGED_BODY: usize = 4096;

/// 记录所有 5xx 响应的请求路径、内部错误细节和响应体
///
/// 5xx 只在这里记录一次，`AppError` 本身不写日志。
pub async fn log_errors(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_owned();
    let response = next.run(req).await;

    if !response.status().is_server_error() {
        return response;
    }

    let (mut parts, body) = response.into_parts();
    let detail = parts
        .extensions
        .get::<ErrorDetail>()
        .map(|d| d.0.clone())
        .unwrap_or_default();

    let bytes = match to_bytes(body, MAX_LOGGED_BODY).await {
        Ok(b) => b,
        Err(e) => {
            error!(%method, %path, status = %parts.status, %detail, "failed to read error response body: {e}");
            parts.headers.remove(CONTENT_LENGTH);
            return Response::from_parts(parts, Body::empty());
        }
    };

    error!(
        %method,
        %path,
        status = %parts.status,
        %detail,
        body = %String::from_utf8_lossy(&bytes),
        "server error"
    );

    parts.headers.remove(CONTENT_LENGTH);
    Response::from_parts(parts, Body::from(bytes))
}

/// handler panic 时返回统一的 500 响应体
pub fn panic_response(panic: Box<dyn Any + Send + 'static>) -> Response {
    let msg = if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    };
    AppError::Internal(format!("handler panicked: {msg}")).into_response()
}
