use std::sync::Arc;

use serde::Serialize;

use crate::{
    database::UserRepository,
    error::AppError,
    models::{NewUser, User},
};

pub const DEFAULT_PAGE_SIZE: u32 = 10;
pub const MAX_PAGE_SIZE: u32 = 100;

pub struct CreateUserInput {
    pub username: String,
    pub password: String,
    pub email: String,
    pub nickname: String,
    pub role_id: u64,
}

pub struct UpdateUserInput {
    pub nickname: String,
    pub email: String,
    pub role_id: u64,
}

#[derive(Debug, Serialize)]
pub struct UserPage {
    pub list: Vec<User>,
    pub total: u64,
    pub page: u32,
    pub size: u32,
}

/// 用户管理服务
#[derive(Clone)]
pub struct UserService {
    users: Arc<dyn UserRepository>,
}

impl UserService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// 页码从 1 开始，页大小限制在 1..=100
    pub async fn list(
        &self,
        page: Option<u32>,
        page_size: Option<u32>,
        search: Option<&str>,
    ) -> Result<UserPage, AppError> {
        let page = page.unwrap_or(1).max(1);
        let size = page_size.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let search = search.map(str::trim).filter(|s| !s.is_empty());

        let (list, total) = self.users.list(page, size, search).await?;
        Ok(UserPage {
            list,
            total,
            page,
            size,
        })
    }

    pub async fn get(&self, id: u64) -> Result<User, AppError> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(AppError::NotFound("用户"))
    }

    pub async fn create(&self, input: CreateUserInput) -> Result<User, AppError> {
        self.ensure_role(input.role_id).await?;

        if self.users.find_by_username(&input.username).await?.is_some() {
            return Err(AppError::Conflict("用户名已存在".into()));
        }
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("邮箱已存在".into()));
        }

        let new_user = NewUser::new(
            input.username,
            input.email,
            input.nickname,
            &input.password,
            input.role_id,
        )
        .await?;
        Ok(self.users.create(new_user).await?)
    }

    pub async fn update(&self, id: u64, input: UpdateUserInput) -> Result<User, AppError> {
        let mut user = self.get(id).await?;
        self.ensure_role(input.role_id).await?;

        if input.email != user.email {
            if let Some(other) = self.users.find_by_email(&input.email).await? {
                if other.id != id {
                    return Err(AppError::Conflict("邮箱已存在".into()));
                }
            }
        }

        user.nickname = input.nickname;
        user.email = input.email;
        user.role_id = input.role_id;

        let updated = self
            .users
            .update(&user)
            .await?
            .ok_or(AppError::NotFound("用户"))?;
        tracing::info!(user_id = id, role_id = updated.role_id, "user updated");
        Ok(updated)
    }

    pub async fn delete(&self, id: u64) -> Result<(), AppError> {
        if !self.users.soft_delete(id).await? {
            return Err(AppError::NotFound("用户"));
        }
        tracing::info!(user_id = id, "user deleted");
        Ok(())
    }

    pub async fn has_permission(&self, user_id: u64, permission: &str) -> Result<bool, AppError> {
        let user = self.get(user_id).await?;
        Ok(user.has_permission(permission))
    }

    async fn ensure_role(&self, role_id: u64) -> Result<(), AppError> {
        match self.users.find_role_by_id(role_id).await? {
            Some(_) => Ok(()),
            None => Err(AppError::Validation("角色不存在".into())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        database::MemoryUserRepository,
        models::role::{ROLE_GUEST, perms},
    };

    fn service() -> UserService {
        UserService::new(Arc::new(MemoryUserRepository::new()))
    }

    fn input(username: &str, role_id: u64) -> CreateUserInput {
        CreateUserInput {
            username: username.into(),
            password: "password1".into(),
            email: format!("{username}@example.com"),
            nickname: username.into(),
            role_id,
        }
    }

    #[tokio::test]
    async fn create_checks_role_and_uniqueness() {
        let users = service();
        users.create(input("alice", 3)).await.unwrap();

        assert!(matches!(
            users.create(input("alice", 3)).await,
            Err(AppError::Conflict(_))
        ));
        assert!(matches!(
            users.create(input("bob", 42)).await,
            Err(AppError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn update_moves_user_to_another_role() {
        let users = service();
        let alice = users.create(input("alice", 3)).await.unwrap();
        assert!(users.has_permission(alice.id, perms::USER_EDIT).await.unwrap());

        let updated = users
            .update(
                alice.id,
                UpdateUserInput {
                    nickname: "Al".into(),
                    email: "al@example.com".into(),
                    role_id: 4,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.role.unwrap().code, ROLE_GUEST);
        assert!(!users.has_permission(alice.id, perms::USER_EDIT).await.unwrap());
    }

    #[tokio::test]
    async fn update_rejects_email_of_another_user() {
        let users = service();
        let alice = users.create(input("alice", 3)).await.unwrap();
        users.create(input("bob", 3)).await.unwrap();

        let err = users
            .update(
                alice.id,
                UpdateUserInput {
                    nickname: "Alice".into(),
                    email: "bob@example.com".into(),
                    role_id: 3,
                },
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn delete_is_not_repeatable() {
        let users = service();
        let alice = users.create(input("alice", 3)).await.unwrap();

        users.delete(alice.id).await.unwrap();
        assert!(matches!(users.delete(alice.id).await, Err(AppError::NotFound(_))));
        assert!(matches!(users.get(alice.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn list_clamps_paging() {
        let users = service();
        for name in ["alice", "bob", "carol"] {
            users.create(input(name, 3)).await.unwrap();
        }

        let page = users.list(Some(0), Some(500), None).await.unwrap();
        assert_eq!((page.page, page.size, page.total), (1, MAX_PAGE_SIZE, 3));

        let page = users.list(None, None, Some("  car ")).await.unwrap();
        assert_eq!(page.list.len(), 1);
    }
}
