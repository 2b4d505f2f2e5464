use async_trait::async_trait;
use sqlx::PgPool;

use crate::database::StoreError;
use crate::database::entities::{RoleEntity, UserEntity};
use crate::models::{NewUser, Role, User};

/// 用户存储库接口
///
/// 查询返回 `Ok(None)` 表示不存在，`Err` 只用于真正的存储错误。
/// 已软删除的用户对所有查询不可见。
#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;

    async fn create(&self, user: NewUser) -> Result<User, StoreError>;

    /// 整行更新，用户不存在时返回 `Ok(None)`
    async fn update(&self, user: &User) -> Result<Option<User>, StoreError>;

    /// 软删除，返回是否删除了记录
    async fn soft_delete(&self, id: u64) -> Result<bool, StoreError>;

    /// 分页查询，`page` 从 1 开始；返回当前页与总数
    async fn list(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
    ) -> Result<(Vec<User>, u64), StoreError>;

    async fn find_role_by_id(&self, id: u64) -> Result<Option<Role>, StoreError>;

    async fn find_role_by_code(&self, code: &str) -> Result<Option<Role>, StoreError>;
}

const USER_SELECT: &str = r#"
    SELECT u.id, u.username, u.email, u.phone, u.password, u.nickname, u.role_id,
           u.status, u.last_login, u.created_at, u.updated_at,
           r.name AS role_name, r.code AS role_code,
           r.description AS role_description, r.permissions AS role_permissions
    FROM star_users u
    LEFT JOIN star_roles r ON r.id = u.role_id
"#;

const SEARCH_FILTER: &str = r#"
    WHERE u.deleted_at IS NULL
      AND ($1::TEXT IS NULL
           OR u.username ILIKE $1 ESCAPE '\'
           OR u.email ILIKE $1 ESCAPE '\'
           OR u.nickname ILIKE $1 ESCAPE '\')
"#;

/// 把搜索词转成按字面匹配的 ILIKE 子串模式
fn contains_pattern(search: &str) -> String {
    let mut pattern = String::with_capacity(search.len() + 2);
    pattern.push('%');
    for c in search.chars() {
        if matches!(c, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

/// PostgreSQL 用户存储库实现
#[derive(Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn find_one(&self, filter: &str, value: &str) -> Result<Option<User>, StoreError> {
        let sql = format!("{USER_SELECT} WHERE u.deleted_at IS NULL AND {filter} = $1");
        let row = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(value)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }
}

/// 唯一约束冲突映射为 Duplicate，约束名见迁移脚本
fn map_write_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &err {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some(c) if c.contains("email") => "邮箱",
                _ => "用户名",
            };
            return StoreError::Duplicate(field);
        }
    }
    StoreError::Database(err)
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn find_by_id(&self, id: u64) -> Result<Option<User>, StoreError> {
        let sql = format!("{USER_SELECT} WHERE u.deleted_at IS NULL AND u.id = $1");
        let row = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(id as i64)
            .fetch_optional(&self.pool)
            .await?;

        row.map(User::try_from).transpose()
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>, StoreError> {
        self.find_one("u.username", username).await
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        self.find_one("u.email", email).await
    }

    async fn create(&self, user: NewUser) -> Result<User, StoreError> {
        let (id,): (i64,) = sqlx::query_as(
            r#"
            INSERT INTO star_users (username, email, phone, password, nickname, role_id, status)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password)
        .bind(&user.nickname)
        .bind(user.role_id as i64)
        .bind(i16::from(user.status))
        .fetch_one(&self.pool)
        .await
        .map_err(map_write_error)?;

        tracing::info!(user_id = id, username = %user.username, "created user");

        self.find_by_id(id as u64)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("user {id} missing right after insert")))
    }

    async fn update(&self, user: &User) -> Result<Option<User>, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE star_users
            SET username = $1, email = $2, phone = $3, password = $4, nickname = $5,
                role_id = $6, status = $7, last_login = $8, updated_at = NOW()
            WHERE id = $9 AND deleted_at IS NULL
            "#,
        )
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone)
        .bind(&user.password)
        .bind(&user.nickname)
        .bind(user.role_id as i64)
        .bind(i16::from(user.status))
        .bind(user.last_login)
        .bind(user.id as i64)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.find_by_id(user.id).await
    }

    async fn soft_delete(&self, id: u64) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE star_users
            SET status = -1, deleted_at = NOW(), updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id as i64)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list(
        &self,
        page: u32,
        page_size: u32,
        search: Option<&str>,
    ) -> Result<(Vec<User>, u64), StoreError> {
        let pattern = search.map(contains_pattern);
        let offset = i64::from(page.saturating_sub(1)) * i64::from(page_size);

        let sql = format!("{USER_SELECT} {SEARCH_FILTER} ORDER BY u.id LIMIT $2 OFFSET $3");
        let rows = sqlx::query_as::<_, UserEntity>(&sql)
            .bind(&pattern)
            .bind(i64::from(page_size))
            .bind(offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM star_users u {SEARCH_FILTER}");
        let total: i64 = sqlx::query_scalar(&count_sql)
            .bind(&pattern)
            .fetch_one(&self.pool)
            .await?;

        let users = rows
            .into_iter()
            .map(User::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        Ok((users, total as u64))
    }

    async fn find_role_by_id(&self, id: u64) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query_as::<_, RoleEntity>(
            "SELECT id, name, code, description, permissions FROM star_roles WHERE id = $1",
        )
        .bind(id as i64)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Role::from))
    }

    async fn find_role_by_code(&self, code: &str) -> Result<Option<Role>, StoreError> {
        let row = sqlx::query_as::<_, RoleEntity>(
            "SELECT id, name, code, description, permissions FROM star_roles WHERE code = $1",
        )
        .bind(code)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Role::from))
    }
}
