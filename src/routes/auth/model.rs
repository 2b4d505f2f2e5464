use serde::{Deserialize, Serialize};

use crate::{
    error::AppError,
    models::{Role, User},
    routes::validate,
};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    pub email: String,
    pub nickname: String,
}

impl RegisterRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate::length("用户名", &self.username, 3, 50)?;
        validate::length("密码", &self.password, 6, 20)?;
        validate::email(&self.email)?;
        validate::length("昵称", &self.nickname, 2, 50)
    }
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub user_id: u64,
    pub username: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate::required("用户名", &self.username)?;
        validate::required("密码", &self.password)
    }
}

#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: i64,
    pub refresh_expires_at: i64,
    pub user: UserInfo,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

#[derive(Debug, Serialize)]
pub struct RefreshTokenResponse {
    pub access_token: String,
}

#[derive(Debug, Deserialize)]
pub struct ChangePasswordRequest {
    pub old_password: String,
    pub new_password: String,
}

impl ChangePasswordRequest {
    pub fn validate(&self) -> Result<(), AppError> {
        validate::required("原密码", &self.old_password)?;
        validate::length("新密码", &self.new_password, 6, 20)
    }
}

#[derive(Debug, Serialize)]
pub struct RoleInfo {
    pub id: u64,
    pub name: String,
    pub code: String,
}

impl From<&Role> for RoleInfo {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id,
            name: role.name.clone(),
            code: role.code.clone(),
        }
    }
}

/// 对外展示的用户信息，不含密码摘要和权限列表
#[derive(Debug, Serialize)]
pub struct UserInfo {
    pub id: u64,
    pub username: String,
    pub nickname: String,
    pub email: String,
    pub role: Option<RoleInfo>,
    pub created_at: chrono::DateTime<chrono::Utc>,
    pub updated_at: chrono::DateTime<chrono::Utc>,
}

impl From<&User> for UserInfo {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            nickname: user.nickname.clone(),
            email: user.email.clone(),
            role: user.role.as_ref().map(RoleInfo::from),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CurrentUserResponse {
    pub user: UserInfo,
}
