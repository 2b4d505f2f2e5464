// HTTP 路由
// 公开路由、认证路由和按策略授权的用户管理路由

pub mod auth;
pub mod sms;
pub mod user;
pub mod validate;

use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{MethodRouter, delete, get, post, put},
};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

use crate::{
    AppState,
    auth::Policy,
    middleware::{
        PolicyGuard, RateLimiter, auth_middleware, authorize, log_errors, panic_response,
        rate_limit,
    },
    models::role::{ROLE_ADMIN, perms},
};

/// 给单个路由挂上授权策略，必须在认证中间件之内
fn guarded(
    state: &AppState,
    policy: Policy,
    route: MethodRouter<AppState>,
) -> MethodRouter<AppState> {
    route.route_layer(from_fn_with_state(
        PolicyGuard::new(state.clone(), policy),
        authorize,
    ))
}

pub fn app_router(state: AppState) -> Router {
    let public_routes = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/refresh", post(auth::refresh_token))
        .route("/sms/send", post(sms::send_code))
        .route("/sms/verify", post(sms::verify_code));

    let protected_routes = Router::new()
        .route("/auth/user", get(auth::current_user))
        .route("/auth/change-password", post(auth::change_password))
        .route(
            "/users",
            guarded(
                &state,
                Policy::permission(perms::USER_LIST),
                get(user::list_users),
            )
            .merge(guarded(
                &state,
                Policy::role_or_permission(ROLE_ADMIN, perms::USER_CREATE),
                post(user::create_user),
            )),
        )
        .route(
            "/users/{id}",
            guarded(
                &state,
                Policy::any_permission([perms::USER_LIST, perms::USER_READ]),
                get(user::get_user),
            )
            .merge(guarded(
                &state,
                Policy::role_and_permission(ROLE_ADMIN, perms::USER_UPDATE),
                put(user::update_user),
            ))
            .merge(guarded(
                &state,
                Policy::all_permissions([perms::USER_DELETE, perms::USER_MANAGE]),
                delete(user::delete_user),
            )),
        )
        .route(
            "/admin/users/{id}",
            guarded(&state, Policy::role(ROLE_ADMIN), delete(user::delete_user)),
        )
        // 应用认证中间件
        .route_layer(from_fn_with_state(state.clone(), auth_middleware));

    let router = Router::new().nest(
        &state.config.api_base_uri,
        Router::new().merge(public_routes).merge(protected_routes),
    );

    // 添加 panic 恢复、错误日志、限流和请求日志中间件，最后添加的在最外层
    let rate_limiter = Arc::new(RateLimiter::new(state.kv.clone(), &state.config));
    let router = router
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(from_fn(log_errors))
        .layer(from_fn_with_state(rate_limiter, rate_limit))
        .layer(TraceLayer::new_for_http());

    // 开发环境允许所有来源
    #[cfg(debug_assertions)]
    let router = router.layer(tower_http::cors::CorsLayer::permissive());

    router.with_state(state)
}
