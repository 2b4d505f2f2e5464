use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::auth::token::TokenConfig;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variable {0}")]
    Missing(&'static str),
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

/// 缓存后端类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheType {
    Redis,
    Memory,
}

/// 用户存储类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserStoreType {
    Postgres,
    Memory,
}

impl FromStr for CacheType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "redis" => Ok(CacheType::Redis),
            "memory" => Ok(CacheType::Memory),
            _ => Err(()),
        }
    }
}

impl FromStr for UserStoreType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "postgres" => Ok(UserStoreType::Postgres),
            "memory" => Ok(UserStoreType::Memory),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub user_store: UserStoreType,
    pub database_url: Option<String>,
    pub cache_type: CacheType,
    pub redis_url: Option<String>,
    pub jwt_secret: String,
    pub token_issuer: String,
    pub access_token_exp_minutes: u64,
    pub refresh_token_exp_minutes: u64,
    pub sms_code_expiration_secs: u64,
    pub sms_code_max_attempts: u32,
    pub sms_gateway_url: Option<String>,
    pub rate_limit_window_secs: u64,
    pub rate_limit_requests: u32,
    pub server_host: String,
    pub server_port: u16,
    pub api_base_uri: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            user_store: UserStoreType::Postgres,
            database_url: None,
            cache_type: CacheType::Redis,
            redis_url: None,
            jwt_secret: String::new(),
            token_issuer: "account-backend".into(),
            access_token_exp_minutes: 15,
            refresh_token_exp_minutes: 7 * 24 * 60,
            sms_code_expiration_secs: 300,
            sms_code_max_attempts: 3,
            sms_gateway_url: None,
            rate_limit_window_secs: 60,
            rate_limit_requests: 180,
            server_host: "0.0.0.0".into(),
            server_port: 3000,
            api_base_uri: "/api".into(),
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let defaults = Config::default();
        let config = Config {
            user_store: parse_or("USER_STORE", defaults.user_store)?,
            database_url: env::var("DATABASE_URL").ok(),
            cache_type: parse_or("CACHE_TYPE", defaults.cache_type)?,
            redis_url: env::var("REDIS_URL").ok(),
            jwt_secret: env::var("JWT_SECRET").map_err(|_| ConfigError::Missing("JWT_SECRET"))?,
            token_issuer: env::var("TOKEN_ISSUER").unwrap_or(defaults.token_issuer),
            access_token_exp_minutes: parse_or(
                "ACCESS_TOKEN_EXPIRATION",
                defaults.access_token_exp_minutes,
            )?,
            refresh_token_exp_minutes: parse_or(
                "REFRESH_TOKEN_EXPIRATION",
                defaults.refresh_token_exp_minutes,
            )?,
            sms_code_expiration_secs: parse_or(
                "SMS_CODE_EXPIRATION",
                defaults.sms_code_expiration_secs,
            )?,
            sms_code_max_attempts: parse_or("SMS_CODE_MAX_ATTEMPTS", defaults.sms_code_max_attempts)?,
            sms_gateway_url: env::var("SMS_GATEWAY_URL").ok(),
            rate_limit_window_secs: parse_or("RATE_LIMIT_WINDOW", defaults.rate_limit_window_secs)?,
            rate_limit_requests: parse_or("RATE_LIMIT_REQUESTS", defaults.rate_limit_requests)?,
            server_host: env::var("SERVER_HOST").unwrap_or(defaults.server_host),
            server_port: parse_or("SERVER_PORT", defaults.server_port)?,
            api_base_uri: env::var("API_BASE_URI").unwrap_or(defaults.api_base_uri),
        };

        // 按存储类型检查必需的连接串
        if config.user_store == UserStoreType::Postgres && config.database_url.is_none() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        if config.cache_type == CacheType::Redis && config.redis_url.is_none() {
            return Err(ConfigError::Missing("REDIS_URL"));
        }

        Ok(config)
    }

    pub fn access_token_ttl(&self) -> Duration {
        Duration::from_secs(self.access_token_exp_minutes * 60)
    }

    pub fn refresh_token_ttl(&self) -> Duration {
        Duration::from_secs(self.refresh_token_exp_minutes * 60)
    }

    pub fn sms_code_ttl(&self) -> Duration {
        Duration::from_secs(self.sms_code_expiration_secs)
    }

    pub fn rate_limit_window(&self) -> Duration {
        Duration::from_secs(self.rate_limit_window_secs)
    }

    /// 令牌服务所需的配置，由调用方显式注入
    pub fn token_config(&self) -> TokenConfig {
        TokenConfig {
            secret: self.jwt_secret.clone(),
            issuer: self.token_issuer.clone(),
            access_ttl: self.access_token_ttl(),
            refresh_ttl: self.refresh_token_ttl(),
        }
    }
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durations_follow_configured_units() {
        let config = Config {
            access_token_exp_minutes: 10,
            refresh_token_exp_minutes: 60,
            sms_code_expiration_secs: 90,
            ..Config::default()
        };
        assert_eq!(config.access_token_ttl(), Duration::from_secs(600));
        assert_eq!(config.refresh_token_ttl(), Duration::from_secs(3600));
        assert_eq!(config.sms_code_ttl(), Duration::from_secs(90));

        let tokens = config.token_config();
        assert_eq!(tokens.access_ttl, Duration::from_secs(600));
        assert_eq!(tokens.issuer, "account-backend");
    }

    #[test]
    fn backend_names_parse() {
        assert_eq!("redis".parse::<CacheType>(), Ok(CacheType::Redis));
        assert_eq!("memory".parse::<UserStoreType>(), Ok(UserStoreType::Memory));
        assert!("mysql".parse::<UserStoreType>().is_err());
    }
}
