use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};

use crate::{AppState, auth::Policy, error::AppError, models::User};

use super::auth::AuthUserId;

/// 本次请求加载的用户，角色快照在请求内保持不变
#[derive(Debug, Clone)]
pub struct CurrentUser(pub Arc<User>);

/// 路由级授权守卫，携带该路由要求的策略
#[derive(Clone)]
pub struct PolicyGuard {
    state: AppState,
    policy: Arc<Policy>,
}

impl PolicyGuard {
    pub fn new(state: AppState, policy: Policy) -> Self {
        Self {
            state,
            policy: Arc::new(policy),
        }
    }
}

/// 必须位于认证中间件之内
pub async fn authorize(
    State(guard): State<PolicyGuard>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let user = match req.extensions().get::<CurrentUser>() {
        Some(current) => current.0.clone(),
        None => {
            let AuthUserId(user_id) = req
                .extensions()
                .get::<AuthUserId>()
                .copied()
                .ok_or_else(|| AppError::Unauthenticated("未登录".into()))?;

            let user = Arc::new(guard.state.auth.current_user(user_id).await?);
            req.extensions_mut().insert(CurrentUser(user.clone()));
            user
        }
    };

    if let Err(e) = guard.policy.evaluate(&*user) {
        tracing::info!(user_id = user.id, path = %req.uri().path(), error = %e, "access denied");
        return Err(e.into());
    }

    Ok(next.run(req).await)
}
