use serde::{Deserialize, Serialize};

use crate::auth::Permissions;

// 预定义角色编码，区分大小写
pub const ROLE_SUPERUSER: &str = "superuser";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_USER: &str = "user";
pub const ROLE_GUEST: &str = "guest";

/// 权限常量
pub mod perms {
    pub const USER_VIEW: &str = "user:view";
    pub const USER_CREATE: &str = "user:create";
    pub const USER_EDIT: &str = "user:edit";
    pub const USER_DELETE: &str = "user:delete";
    pub const USER_LIST: &str = "user:list";
    pub const USER_READ: &str = "user:read";
    pub const USER_UPDATE: &str = "user:update";
    pub const USER_MANAGE: &str = "user:manage";

    pub const CONTENT_VIEW: &str = "content:view";
    pub const CONTENT_CREATE: &str = "content:create";
    pub const CONTENT_EDIT: &str = "content:edit";
    pub const CONTENT_DELETE: &str = "content:delete";

    pub const SYSTEM_CONFIG: &str = "system:config";
    pub const SYSTEM_LOG: &str = "system:log";
    pub const SYSTEM_BACKUP: &str = "system:backup";

    pub const ALL: &str = crate::auth::WILDCARD;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: u64,
    pub name: String,
    pub code: String,
    pub description: String,
    pub permissions: Permissions,
}

impl Role {
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.has(permission)
    }

    pub fn add_permission(&mut self, permission: &str) -> bool {
        self.permissions.add(permission)
    }

    pub fn remove_permission(&mut self, permission: &str) -> bool {
        self.permissions.remove(permission)
    }

    /// 按编码取预定义角色
    pub fn predefined(code: &str) -> Option<Role> {
        predefined_roles().into_iter().find(|r| r.code == code)
    }
}

/// 种子角色，id 与迁移脚本保持一致
pub fn predefined_roles() -> Vec<Role> {
    vec![
        Role {
            id: 1,
            name: "超级管理员".into(),
            code: ROLE_SUPERUSER.into(),
            description: "系统最高管理员，拥有所有权限".into(),
            permissions: [perms::ALL].into_iter().collect(),
        },
        Role {
            id: 2,
            name: "管理员".into(),
            code: ROLE_ADMIN.into(),
            description: "系统管理员，拥有所有权限".into(),
            permissions: [perms::ALL].into_iter().collect(),
        },
        Role {
            id: 3,
            name: "普通用户".into(),
            code: ROLE_USER.into(),
            description: "普通用户，拥有基本权限".into(),
            permissions: [
                perms::USER_VIEW,
                perms::USER_EDIT,
                perms::CONTENT_VIEW,
                perms::CONTENT_CREATE,
                perms::CONTENT_EDIT,
            ]
            .into_iter()
            .collect(),
        },
        Role {
            id: 4,
            name: "访客".into(),
            code: ROLE_GUEST.into(),
            description: "访客，仅拥有查看权限".into(),
            permissions: [perms::USER_VIEW, perms::CONTENT_VIEW].into_iter().collect(),
        },
    ]
}
