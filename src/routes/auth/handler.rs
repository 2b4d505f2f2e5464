use axum::extract::{Extension, Json, State};

use crate::{
    AppState,
    error::AppError,
    middleware::AuthUserId,
    services::RegisterInput,
    utils::{ApiResponse, success_message, success_to_api_response},
};

use super::model::{
    ChangePasswordRequest, CurrentUserResponse, LoginRequest, LoginResponse, RefreshTokenRequest,
    RefreshTokenResponse, RegisterRequest, RegisterResponse, UserInfo,
};

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterResponse>>, AppError> {
    req.validate()?;

    let user = state
        .auth
        .register(RegisterInput {
            username: req.username,
            password: req.password,
            email: req.email,
            nickname: req.nickname,
        })
        .await?;

    Ok(success_to_api_response(RegisterResponse {
        user_id: user.id,
        username: user.username,
    }))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, AppError> {
    req.validate()?;

    let result = state.auth.login(&req.username, &req.password).await?;
    Ok(success_to_api_response(LoginResponse {
        access_token: result.tokens.access_token,
        refresh_token: result.tokens.refresh_token,
        access_expires_at: result.tokens.access_expires_at,
        refresh_expires_at: result.tokens.refresh_expires_at,
        user: UserInfo::from(&result.user),
    }))
}

#[axum::debug_handler]
pub async fn refresh_token(
    State(state): State<AppState>,
    Json(req): Json<RefreshTokenRequest>,
) -> Result<Json<ApiResponse<RefreshTokenResponse>>, AppError> {
    if req.refresh_token.trim().is_empty() {
        return Err(AppError::Validation("刷新令牌不能为空".into()));
    }

    let access_token = state.auth.refresh_access(req.refresh_token.trim()).await?;
    Ok(success_to_api_response(RefreshTokenResponse { access_token }))
}

#[axum::debug_handler]
pub async fn current_user(
    Extension(AuthUserId(user_id)): Extension<AuthUserId>,
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CurrentUserResponse>>, AppError> {
    let user = state.auth.current_user(user_id).await?;
    Ok(success_to_api_response(CurrentUserResponse {
        user: UserInfo::from(&user),
    }))
}

#[axum::debug_handler]
pub async fn change_password(
    Extension(AuthUserId(user_id)): Extension<AuthUserId>,
    State(state): State<AppState>,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    req.validate()?;

    state
        .auth
        .change_password(user_id, &req.old_password, &req.new_password)
        .await?;
    Ok(success_message("密码修改成功"))
}
