use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::{LookupError, PermissionSubject};
use crate::utils::{PasswordError, hash_password, verify_password};

use super::role::Role;

/// 用户状态：1 正常 0 禁用 -1 删除
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "i16", try_from = "i16")]
pub enum UserStatus {
    Active,
    Disabled,
    Deleted,
}

impl From<UserStatus> for i16 {
    fn from(value: UserStatus) -> Self {
        match value {
            UserStatus::Active => 1,
            UserStatus::Disabled => 0,
            UserStatus::Deleted => -1,
        }
    }
}

impl TryFrom<i16> for UserStatus {
    type Error = String;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(UserStatus::Active),
            0 => Ok(UserStatus::Disabled),
            -1 => Ok(UserStatus::Deleted),
            other => Err(format!("unknown user status {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(skip_serializing)]
    pub password: String,
    pub nickname: String,
    pub role_id: u64,
    /// 每个请求加载一次的角色快照
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
    pub status: UserStatus,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 新建用户所需字段，密码已经是摘要
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub nickname: String,
    pub role_id: u64,
    pub status: UserStatus,
}

impl NewUser {
    pub async fn new(
        username: String,
        email: String,
        nickname: String,
        plain_password: &str,
        role_id: u64,
    ) -> Result<Self, PasswordError> {
        Ok(Self {
            username,
            email,
            phone: None,
            password: hash_password(plain_password).await?,
            nickname,
            role_id,
            status: UserStatus::Active,
        })
    }
}

impl User {
    pub async fn set_password(&mut self, plain: &str) -> Result<(), PasswordError> {
        self.password = hash_password(plain).await?;
        Ok(())
    }

    /// 摘要损坏时按不匹配处理并记录日志
    pub async fn check_password(&self, plain: &str) -> bool {
        match verify_password(plain, &self.password).await {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(user_id = self.id, error = %e, "stored password digest is unusable");
                false
            }
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == UserStatus::Active
    }

    pub fn has_permission(&self, permission: &str) -> bool {
        self.role.as_ref().is_some_and(|r| r.has_permission(permission))
    }

    pub fn update_last_login(&mut self) {
        self.last_login = Some(Utc::now());
    }
}

impl PermissionSubject for User {
    fn role_code(&self) -> Option<&str> {
        self.role.as_ref().map(|r| r.code.as_str())
    }

    fn check_permission(&self, permission: &str) -> Result<bool, LookupError> {
        match &self.role {
            Some(role) => Ok(role.has_permission(permission)),
            None => Err(LookupError(format!(
                "role {} of user {} is not loaded",
                self.role_id, self.id
            ))),
        }
    }
}
