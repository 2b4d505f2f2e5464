use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::database::StoreError;
use crate::models::{NewUser, Role, User, UserStatus, predefined_roles};

use super::user::UserRepository;

#[derive(Default)]
struct Tables {
    next_id: u64,
    users: HashMap<u64, User>,
    roles: Vec<Role>,
}

impl Tables {
    fn live(&self) -> impl Iterator<Item = &User> {
        self.users.values().filter(|u| u.status != UserStatus::Deleted)
    }

    fn check_unique(&self, user_id: u64, username: &str, email: &str) -> Result<(), StoreError> {
        for other in self.live().filter(|u| u.id != user_id) {
            if other.username == username {
                return Err(StoreError::Duplicate("用户名"));
            }
            if other.email == email {
                return Err(StoreError::Duplicate("邮箱"));
            }
        }
        Ok(())
    }

    /// 读取时附带角色快照
    fn hydrate(&self, user: &User) -> User {
        let mut user = user.clone();
        user.role = self.roles.iter().find(|r| r.id == user.role_id).cloned();
        user
    }
}

/// 内存用户存储库，用于开发环境和测试
///
/// 角色表以预定义角色初始化，唯一性约束与数据库一致。
pub struct MemoryUserRepository {
    tables: RwLock<Tables>,
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self::with_roles(predefined_roles())
    }

    pub fn with_roles(roles: Vec<Role>) -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_id: 1,
                users: HashMap::new(),
                roles,
            }),
        }
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> Result<T, StoreError> {
        let tables = self.tables.read().map_err(|_| StoreError::Poisoned)?;
        Ok(f(&tables))
    }

    fn write<T>(
        &self,
        f: impl FnOnce(&mut Tables) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut tables = self.tables.write().map_err(|_| StoreError::Poisoned)?;
        f(&mut tables)
    }
}

#[async_trait]
impl UserRepository for MemoryUserRepository {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        self.read(|t| t.live().find(|u| u.id == id).map(|u| t.hydrate(u)))
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.read(|t| t.live().find(|u| u.username == username).map(|u| t.hydrate(u)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.read(|t| t.live().find(|u| u.email == email).map(|u| t.hydrate(u)))
    }

    async fn create(&self, new_user: NewUser) -> Result<User, StoreError> {
        self.write(|t| {
            t.check_unique(0, &new_user.username, &new_user.email)?;

            let now = Utc::now();
            let id = t.next_id;
            t.next_id += 1;

            let user = User {
                id,
                username: new_user.username,
                email: new_user.email,
                phone: new_user.phone,
                password: new_user.password,
                nickname: new_user.nickname,
                role_id: new_user.role_id,
                role: None,
                status: new_user.status,
                last_login: None,
                created_at: now,
                updated_at: now,
            };
            t.users.insert(id, user.clone());
            tracing::info!(user_id = id, username = %user.username, "created user");
            Ok(t.hydrate(&user))
        })
    }

    async fn update(&self, user: &User) -> Result<Option<User>, StoreError> {
        self.write(|t| {
            let exists = t.live().any(|u| u.id == user.id);
            if !exists {
                return Ok(None);
            }
            t.check_unique(user.id, &user.username, &user.email)?;

            let mut stored = user.clone();
            stored.role = None;
            stored.updated_at = Utc::now();
            t.users.insert(user.id, stored.clone());
            Ok(Some(t.hydrate(&stored)))
        })
    }

    async fn soft_delete(&self, id: u64) -> Result<bool, StoreError> {
        self.write(|t| match t.users.get_mut(&id) {
            Some(user) if user.status != UserStatus::Deleted => {
                user.status = UserStatus::Deleted;
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        })
    }

    async fn list(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
    ) -> Result<(Vec<User>, u64), StoreError> {
        let needle = search.map(str::to_lowercase);
        self.read(|t| {
            let mut matched: Vec<&User> = t
                .live()
                .filter(|u| match &needle {
                    Some(n) => [&u.username, &u.email, &u.nickname]
                        .iter()
                        .any(|field| field.to_lowercase().contains(n.as_str())),
                    None => true,
                })
                .collect();
            matched.sort_by_key(|u| u.id);

            let total = matched.len() as u64;
            let skip = page.saturating_sub(1) as usize * page_size as usize;
            let users: Vec<User> = matched
                .into_iter()
                .skip(skip)
                .take(page_size as usize)
                .map(|u| t.hydrate(u))
                .collect();
            (users, total)
        })
    }

    async fn find_role_by_id(&self, id: u64) -> Result<Option<Role>, StoreError> {
        self.read(|t| t.roles.iter().find(|r| r.id == id).cloned())
    }

    async fn find_role_by_code(&self, code: &str) -> Result<Option<Role>, StoreError> {
        self.read(|t| t.roles.iter().find(|r| r.code == code).cloned())
    }
}
