use axum::extract::{Json, State};

use crate::{
    AppState,
    error::AppError,
    utils::{ApiResponse, success_message},
};

use super::model::{SendCodeRequest, VerifyCodeRequest};

#[axum::debug_handler]
pub async fn send_code(
    State(state): State<AppState>,
    Json(req): Json<SendCodeRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let biz = req.validate()?;
    state.sms.send_code(biz, &req.phone).await?;
    Ok(success_message("验证码已发送"))
}

#[axum::debug_handler]
pub async fn verify_code(
    State(state): State<AppState>,
    Json(req): Json<VerifyCodeRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    let biz = req.validate()?;
    state.sms.verify_code(biz, &req.phone, &req.code).await?;
    Ok(success_message("验证成功"))
}
