// 用户与角色实体
// 定义与数据库表一一对应的行结构

use chrono::{DateTime, Utc};
use sqlx::FromRow;

use crate::database::StoreError;
use crate::models::{Role, User, UserStatus};

/// 角色实体，对应 star_roles 表
#[derive(Debug, Clone, FromRow)]
pub struct RoleEntity {
    pub id: i64,
    pub name: String,
    pub code: String,
    pub description: String,
    /// 权限列表，`*` 表示全部权限
    pub permissions: Vec<String>,
}

/// 用户实体，连同 LEFT JOIN 出来的角色列
#[derive(Debug, Clone, FromRow)]
pub struct UserEntity {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub phone: Option<String>,
    pub password: String,
    pub nickname: String,
    pub role_id: i64,
    /// 状态：1正常 0禁用 -1删除
    pub status: i16,
    pub last_login: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub role_name: Option<String>,
    pub role_code: Option<String>,
    pub role_description: Option<String>,
    pub role_permissions: Option<Vec<String>>,
}

impl From<RoleEntity> for Role {
    fn from(row: RoleEntity) -> Self {
        Role {
            id: row.id as u64,
            name: row.name,
            code: row.code,
            description: row.description,
            permissions: row.permissions.into_iter().collect(),
        }
    }
}

impl TryFrom<UserEntity> for User {
    type Error = StoreError;

    fn try_from(row: UserEntity) -> Result<Self, Self::Error> {
        let status = UserStatus::try_from(row.status).map_err(StoreError::Corrupt)?;

        // 角色引用失效时 role_code 为空，角色保持未加载
        let role = match (row.role_name, row.role_code) {
            (Some(name), Some(code)) => Some(Role {
                id: row.role_id as u64,
                name,
                code,
                description: row.role_description.unwrap_or_default(),
                permissions: row.role_permissions.unwrap_or_default().into_iter().collect(),
            }),
            _ => None,
        };

        Ok(User {
            id: row.id as u64,
            username: row.username,
            email: row.email,
            phone: row.phone,
            password: row.password,
            nickname: row.nickname,
            role_id: row.role_id as u64,
            role,
            status,
            last_login: row.last_login,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}
