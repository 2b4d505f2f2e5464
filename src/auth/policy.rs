use thiserror::Error;

/// 授权检查的对象：当前请求已解析出的用户
pub trait PermissionSubject {
    fn role_code(&self) -> Option<&str>;

    /// 权限查询可能失败（例如角色未能加载），失败与“没有该权限”区分开
    fn check_permission(&self, permission: &str) -> Result<bool, LookupError>;
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("permission lookup failed: {0}")]
pub struct LookupError(pub String);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    MissingRole(String),
    MissingPermission(String),
    MissingAnyPermission(Vec<String>),
    MissingRoleOrPermission { role: String, permission: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthzError {
    #[error("access denied: {0:?}")]
    Denied(DenyReason),
    #[error(transparent)]
    Lookup(#[from] LookupError),
}

/// 路由层显式组合的授权条件
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Policy {
    Role(String),
    Permission(String),
    AnyPermission(Vec<String>),
    AllPermissions(Vec<String>),
    RoleAndPermission { role: String, permission: String },
    RoleOrPermission { role: String, permission: String },
}

impl Policy {
    pub fn role(code: impl Into<String>) -> Self {
        Policy::Role(code.into())
    }

    pub fn permission(permission: impl Into<String>) -> Self {
        Policy::Permission(permission.into())
    }

    pub fn any_permission<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Policy::AnyPermission(permissions.into_iter().map(Into::into).collect())
    }

    pub fn all_permissions<I, S>(permissions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Policy::AllPermissions(permissions.into_iter().map(Into::into).collect())
    }

    pub fn role_and_permission(role: impl Into<String>, permission: impl Into<String>) -> Self {
        Policy::RoleAndPermission {
            role: role.into(),
            permission: permission.into(),
        }
    }

    pub fn role_or_permission(role: impl Into<String>, permission: impl Into<String>) -> Self {
        Policy::RoleOrPermission {
            role: role.into(),
            permission: permission.into(),
        }
    }

    /// 纯函数求值，遇到第一个不满足的条件立即返回
    pub fn evaluate<S: PermissionSubject + ?Sized>(&self, subject: &S) -> Result<(), AuthzError> {
        match self {
            Policy::Role(role) => require_role(subject, role),
            Policy::Permission(permission) => require_permission(subject, permission),
            Policy::AnyPermission(permissions) => {
                for permission in permissions {
                    match subject.check_permission(permission) {
                        Ok(true) => return Ok(()),
                        Ok(false) => {}
                        // 只要有一个满足即可，单个查询失败按“不具备”处理
                        Err(e) => {
                            tracing::debug!(%permission, error = %e, "ignoring failed permission lookup");
                        }
                    }
                }
                Err(AuthzError::Denied(DenyReason::MissingAnyPermission(
                    permissions.clone(),
                )))
            }
            Policy::AllPermissions(permissions) => {
                for permission in permissions {
                    require_permission(subject, permission)?;
                }
                Ok(())
            }
            Policy::RoleAndPermission { role, permission } => {
                require_role(subject, role)?;
                require_permission(subject, permission)
            }
            Policy::RoleOrPermission { role, permission } => {
                if subject.role_code() == Some(role.as_str()) {
                    return Ok(());
                }
                if subject.check_permission(permission)? {
                    return Ok(());
                }
                Err(AuthzError::Denied(DenyReason::MissingRoleOrPermission {
                    role: role.clone(),
                    permission: permission.clone(),
                }))
            }
        }
    }
}

/// 对外的授权入口
pub fn authorize<S: PermissionSubject + ?Sized>(
    subject: &S,
    policy: &Policy,
) -> Result<(), AuthzError> {
    policy.evaluate(subject)
}

fn require_role<S: PermissionSubject + ?Sized>(subject: &S, role: &str) -> Result<(), AuthzError> {
    if subject.role_code() == Some(role) {
        Ok(())
    } else {
        Err(AuthzError::Denied(DenyReason::MissingRole(role.to_string())))
    }
}

fn require_permission<S: PermissionSubject + ?Sized>(
    subject: &S,
    permission: &str,
) -> Result<(), AuthzError> {
    if subject.check_permission(permission)? {
        Ok(())
    } else {
        Err(AuthzError::Denied(DenyReason::MissingPermission(
            permission.to_string(),
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::permission::Permissions;

    struct Subject {
        role: Option<&'static str>,
        permissions: Permissions,
        broken: Vec<&'static str>,
    }

    impl Subject {
        fn new(role: &'static str, perms: &[&'static str]) -> Self {
            Self {
                role: Some(role),
                permissions: perms.iter().copied().collect(),
                broken: Vec::new(),
            }
        }

        fn failing_on(mut self, perm: &'static str) -> Self {
            self.broken.push(perm);
            self
        }
    }

    impl PermissionSubject for Subject {
        fn role_code(&self) -> Option<&str> {
            self.role
        }

        fn check_permission(&self, permission: &str) -> Result<bool, LookupError> {
            if self.broken.iter().any(|b| *b == permission) {
                return Err(LookupError(format!("lookup of {permission} failed")));
            }
            Ok(self.permissions.has(permission))
        }
    }

    fn denied(reason: DenyReason) -> Result<(), AuthzError> {
        Err(AuthzError::Denied(reason))
    }

    #[test]
    fn role_codes_are_case_sensitive() {
        let user = Subject::new("admin", &[]);
        assert_eq!(Policy::role("admin").evaluate(&user), Ok(()));
        assert_eq!(
            Policy::role("Admin").evaluate(&user),
            denied(DenyReason::MissingRole("Admin".into()))
        );
    }

    #[test]
    fn all_requires_every_permission_any_requires_one() {
        let user = Subject::new("user", &["a"]);
        assert_eq!(
            Policy::all_permissions(["a", "b"]).evaluate(&user),
            denied(DenyReason::MissingPermission("b".into()))
        );
        assert_eq!(Policy::any_permission(["a", "b"]).evaluate(&user), Ok(()));
        assert_eq!(
            Policy::any_permission(["c", "d"]).evaluate(&user),
            denied(DenyReason::MissingAnyPermission(vec!["c".into(), "d".into()]))
        );
    }

    #[test]
    fn any_swallows_lookup_errors_all_fails_fast() {
        let user = Subject::new("user", &["b"]).failing_on("a");

        assert_eq!(Policy::any_permission(["a", "b"]).evaluate(&user), Ok(()));
        assert!(matches!(
            Policy::all_permissions(["a", "b"]).evaluate(&user),
            Err(AuthzError::Lookup(_))
        ));
    }

    #[test]
    fn role_and_permission_checks_role_first() {
        let guest = Subject::new("guest", &["user:update"]);
        let plain_admin = Subject::new("admin", &["user:view"]);
        let policy = Policy::role_and_permission("admin", "user:update");

        assert_eq!(
            policy.evaluate(&guest),
            denied(DenyReason::MissingRole("admin".into()))
        );
        assert_eq!(
            policy.evaluate(&plain_admin),
            denied(DenyReason::MissingPermission("user:update".into()))
        );
        assert_eq!(
            policy.evaluate(&Subject::new("admin", &["user:update"])),
            Ok(())
        );
    }

    #[test]
    fn role_or_permission_accepts_either() {
        let policy = Policy::role_or_permission("admin", "user:create");

        assert_eq!(policy.evaluate(&Subject::new("admin", &[])), Ok(()));
        assert_eq!(
            policy.evaluate(&Subject::new("user", &["user:create"])),
            Ok(())
        );
        assert_eq!(
            policy.evaluate(&Subject::new("guest", &["user:view"])),
            denied(DenyReason::MissingRoleOrPermission {
                role: "admin".into(),
                permission: "user:create".into(),
            })
        );
    }

    #[test]
    fn wildcard_role_passes_permission_gates() {
        let superuser = Subject::new("superuser", &["*"]);
        assert_eq!(
            authorize(&superuser, &Policy::all_permissions(["user:delete", "user:manage"])),
            Ok(())
        );
    }

    #[test]
    fn roleless_subject_has_no_role() {
        let orphan = Subject {
            role: None,
            permissions: Permissions::new(),
            broken: Vec::new(),
        };
        assert!(Policy::role("guest").evaluate(&orphan).is_err());
    }
}
