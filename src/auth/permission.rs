//! 角色权限集合。
//!
//! 存储与传输时权限都是普通字符串，其中 `"*"` 是通配符约定：
//! 持有它的权限集合通过任何权限检查。内存中用 [`Permission::Wildcard`] 显式表示。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 通配符权限的字符串表示
pub const WILDCARD: &str = "*";

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Permission {
    Wildcard,
    Named(String),
}

impl Permission {
    pub fn as_str(&self) -> &str {
        match self {
            Permission::Wildcard => WILDCARD,
            Permission::Named(name) => name,
        }
    }
}

impl From<String> for Permission {
    fn from(value: String) -> Self {
        if value == WILDCARD {
            Permission::Wildcard
        } else {
            Permission::Named(value)
        }
    }
}

impl From<&str> for Permission {
    fn from(value: &str) -> Self {
        Permission::from(value.to_string())
    }
}

impl From<Permission> for String {
    fn from(value: Permission) -> Self {
        match value {
            Permission::Wildcard => WILDCARD.to_string(),
            Permission::Named(name) => name,
        }
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 有序且不重复的权限集合，保持插入顺序
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Permission>", into = "Vec<Permission>")]
pub struct Permissions(Vec<Permission>);

impl Permissions {
    pub fn new() -> Self {
        Self::default()
    }

    /// 权限原样存在，或集合包含通配符
    pub fn has(&self, permission: &str) -> bool {
        self.0
            .iter()
            .any(|p| matches!(p, Permission::Wildcard) || p.as_str() == permission)
    }

    /// 已存在时不做任何事，返回是否新增
    pub fn add(&mut self, permission: impl Into<Permission>) -> bool {
        let permission = permission.into();
        if self.0.contains(&permission) {
            return false;
        }
        self.0.push(permission);
        true
    }

    /// 不存在时不做任何事，返回是否删除
    pub fn remove(&mut self, permission: &str) -> bool {
        match self.0.iter().position(|p| p.as_str() == permission) {
            Some(index) => {
                self.0.remove(index);
                true
            }
            None => false,
        }
    }

    pub fn is_wildcard(&self) -> bool {
        self.0.contains(&Permission::Wildcard)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Permission> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_strings(&self) -> Vec<String> {
        self.0.iter().map(|p| p.as_str().to_string()).collect()
    }
}

impl<P: Into<Permission>> FromIterator<P> for Permissions {
    fn from_iter<I: IntoIterator<Item = P>>(iter: I) -> Self {
        let mut permissions = Permissions::new();
        for p in iter {
            permissions.add(p);
        }
        permissions
    }
}

impl From<Vec<Permission>> for Permissions {
    fn from(value: Vec<Permission>) -> Self {
        value.into_iter().collect()
    }
}

impl From<Permissions> for Vec<Permission> {
    fn from(value: Permissions) -> Self {
        value.0
    }
}
