use serde::{Deserialize, Serialize};

use crate::{error::AppError, routes::auth::model::UserInfo, routes::validate};

#[derive(Debug, Deserialize)]
pub struct ListUsersQuery {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub list: Vec<UserInfo>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

#[derive(Debug, Deserialize)]
pub struct CreateUserRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub nickname: String,
    pub role_id: u64,
}

impl CreateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate::length("用户名", &self.username, 3, 50)?;
        validate::length("密码", &self.password, 6, 20)?;
        validate::email(&self.email)?;
        validate::length("昵称", &self.nickname, 2, 50)?;
        role_id(self.role_id)
    }
}

#[derive(Debug, Serialize)]
pub struct CreateUserResponse {
    pub id: u64,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub nickname: String,
    pub email: String,
    pub role_id: u64,
}

impl UpdateUserRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate::length("昵称", &self.nickname, 2, 50)?;
        validate::email(&self.email)?;
        role_id(self.role_id)
    }
}

fn role_id(id: u64) -> Result<(), AppError> {
    if id == 0 {
        return Err(AppError::Validation("角色ID不能为空".into()));
    }
    Ok(())
}
