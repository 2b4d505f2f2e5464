use std::sync::Arc;

use auth::{TokenError, TokenService};
use cache::{CodeCache, KvStore};
use config::Config;
use database::UserRepository;
use services::{AuthService, SmsSender, SmsService, UserService};

pub mod auth;
pub mod cache;
pub mod config;
pub mod database;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod utils;

pub use routes::app_router;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub kv: Arc<dyn KvStore>,
    pub auth: AuthService,
    pub user_service: UserService,
    pub sms: SmsService,
}

impl AppState {
    /// 组装共享服务；令牌配置无效时失败
    pub fn new(
        config: Config,
        users: Arc<dyn UserRepository>,
        kv: Arc<dyn KvStore>,
        sender: Arc<dyn SmsSender>,
    ) -> Result<Self, TokenError> {
        let tokens = Arc::new(TokenService::new(config.token_config())?);
        // 令牌服务与用户存储只经由服务层访问
        let codes = CodeCache::new(
            kv.clone(),
            config.sms_code_ttl(),
            config.sms_code_max_attempts,
        );

        Ok(Self {
            auth: AuthService::new(users.clone(), tokens),
            user_service: UserService::new(users),
            sms: SmsService::new(codes, sender),
            config: Arc::new(config),
            kv,
        })
    }
}
