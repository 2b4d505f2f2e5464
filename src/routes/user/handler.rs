use axum::extract::{Json, Path, Query, State};

use crate::{
    AppState,
    error::AppError,
    routes::auth::model::UserInfo,
    services::{CreateUserInput, UpdateUserInput},
    utils::{ApiResponse, success_message, success_to_api_response},
};

use super::model::{
    CreateUserRequest, CreateUserResponse, ListUsersQuery, UpdateUserRequest, UserListResponse,
};

#[axum::debug_handler]
pub async fn list_users(
    State(state): State<AppState>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<ApiResponse<UserListResponse>>, AppError> {
    let page = state
        .user_service
        .list(query.page, query.page_size, query.search.as_deref())
        .await?;

    Ok(success_to_api_response(UserListResponse {
        list: page.list.iter().map(UserInfo::from).collect(),
        total: page.total,
        page: page.page,
        size: page.size,
    }))
}

#[axum::debug_handler]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<UserInfo>>, AppError> {
    let user = state.user_service.get(id).await?;
    Ok(success_to_api_response(UserInfo::from(&user)))
}

#[axum::debug_handler]
pub async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserRequest>,
) -> Result<Json<ApiResponse<CreateUserResponse>>, AppError> {
    req.validate()?;

    let user = state
        .user_service
        .create(CreateUserInput {
            username: req.username,
            password: req.password,
            email: req.email,
            nickname: req.nickname,
            role_id: req.role_id,
        })
        .await?;

    Ok(success_to_api_response(CreateUserResponse {
        id: user.id,
        username: user.username,
    }))
}

#[axum::debug_handler]
pub async fn update_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
    Json(req): Json<UpdateUserRequest>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    req.validate()?;

    state
        .user_service
        .update(
            id,
            UpdateUserInput {
                nickname: req.nickname,
                email: req.email,
                role_id: req.role_id,
            },
        )
        .await?;
    Ok(success_message("用户更新成功"))
}

#[axum::debug_handler]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.user_service.delete(id).await?;
    Ok(success_message("用户删除成功"))
}
