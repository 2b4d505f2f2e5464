use std::sync::Arc;

use chrono::Utc;

use crate::{
    auth::{TokenPair, TokenService},
    database::UserRepository,
    error::AppError,
    models::{NewUser, User, role::ROLE_USER},
    utils::verify_dummy_password,
};

const BAD_CREDENTIALS: &str = "用户名或密码错误";

pub struct RegisterInput {
    pub username: String,
    pub password: String,
    pub email: String,
    pub nickname: String,
}

#[derive(Debug)]
pub struct LoginResult {
    pub tokens: TokenPair,
    pub user: User,
}

/// 认证服务：注册、登录、令牌刷新与密码修改
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
    tokens: Arc<TokenService>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>, tokens: Arc<TokenService>) -> Self {
        Self { users, tokens }
    }

    pub async fn register(&self, input: RegisterInput) -> Result<User, AppError> {
        if self.users.find_by_username(&input.username).await?.is_some() {
            return Err(AppError::Conflict("用户名已存在".into()));
        }
        if self.users.find_by_email(&input.email).await?.is_some() {
            return Err(AppError::Conflict("邮箱已存在".into()));
        }

        let role = self
            .users
            .find_role_by_code(ROLE_USER)
            .await?
            .ok_or_else(|| AppError::Internal(format!("default role {ROLE_USER} is missing")))?;

        let new_user = NewUser::new(
            input.username,
            input.email,
            input.nickname,
            &input.password,
            role.id,
        )
        .await?;
        // 并发注册由存储层的唯一约束兜底
        let user = self.users.create(new_user).await?;
        tracing::info!(user_id = user.id, "user registered");
        Ok(user)
    }

    /// 用户不存在与密码错误返回同一个错误且耗时相同；密码正确但账号被禁用时才区分
    pub async fn login(&self, username: &str, password: &str) -> Result<LoginResult, AppError> {
        let Some(mut user) = self.users.find_by_username(username).await? else {
            verify_dummy_password(password).await;
            tracing::debug!(username, "login for unknown user");
            return Err(AppError::Unauthenticated(BAD_CREDENTIALS.into()));
        };

        if !user.check_password(password).await {
            tracing::debug!(user_id = user.id, "login with wrong password");
            return Err(AppError::Unauthenticated(BAD_CREDENTIALS.into()));
        }
        if !user.is_active() {
            return Err(AppError::Forbidden("用户已被禁用".into()));
        }

        user.update_last_login();
        let user = self
            .users
            .update(&user)
            .await?
            .ok_or(AppError::NotFound("用户"))?;

        let tokens = self.issue_tokens(user.id)?;
        tracing::info!(user_id = user.id, "user logged in");
        Ok(LoginResult { tokens, user })
    }

    pub fn issue_tokens(&self, user_id: u64) -> Result<TokenPair, AppError> {
        Ok(self.tokens.issue_pair(user_id)?)
    }

    /// 用刷新令牌换取新的访问令牌，刷新令牌本身不轮换
    pub async fn refresh_access(&self, refresh_token: &str) -> Result<String, AppError> {
        self.refresh_access_at(refresh_token, Utc::now().timestamp()).await
    }

    /// 以给定时刻校验令牌并签发访问令牌
    ///
    /// 令牌不区分类型，只按过期时间判断，所以访问令牌在过期之前同样可以用来刷新。
    pub async fn refresh_access_at(
        &self,
        refresh_token: &str,
        now: i64,
    ) -> Result<String, AppError> {
        let claims = self.tokens.verify_at(refresh_token, now).map_err(|e| {
            tracing::debug!(error = %e, "refresh token rejected");
            AppError::Unauthenticated("无效的刷新令牌".into())
        })?;
        let user_id = claims
            .user_id()
            .map_err(|_| AppError::Unauthenticated("无效的刷新令牌".into()))?;

        let user = self.active_user(user_id).await?;
        Ok(self.tokens.issue_access_at(user.id, now)?)
    }

    /// 校验 Bearer 令牌，返回用户 ID，不访问存储
    pub fn authenticate(&self, token: &str) -> Result<u64, AppError> {
        let claims = self.tokens.verify(token)?;
        Ok(claims.user_id()?)
    }

    pub async fn current_user(&self, user_id: u64) -> Result<User, AppError> {
        self.active_user(user_id).await
    }

    pub async fn change_password(
        &self,
        user_id: u64,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let mut user = self.active_user(user_id).await?;

        if !user.check_password(old_password).await {
            return Err(AppError::Validation("原密码错误".into()));
        }
        user.set_password(new_password).await?;

        self.users
            .update(&user)
            .await?
            .ok_or(AppError::NotFound("用户"))?;
        tracing::info!(user_id, "password changed");
        Ok(())
    }

    async fn active_user(&self, user_id: u64) -> Result<User, AppError> {
        let user = self
            .users
            .find_by_id(user_id)
            .await?
            .ok_or_else(|| AppError::Unauthenticated("用户不存在".into()))?;

        if !user.is_active() {
            return Err(AppError::Forbidden("用户已被禁用".into()));
        }
        Ok(user)
    }
}
