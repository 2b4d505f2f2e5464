use std::time::Duration;

use chrono::Utc;
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 令牌服务配置，构造时注入，不依赖全局状态
#[derive(Debug, Clone)]
pub struct TokenConfig {
    pub secret: String,
    pub issuer: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    #[error("malformed token: {0}")]
    MalformedToken(String),
    #[error("invalid signature")]
    InvalidSignature,
    #[error("issuer mismatch")]
    IssuerMismatch,
    #[error("token expired or not yet valid")]
    Expired,
    #[error("failed to sign token: {0}")]
    SigningError(String),
    #[error("invalid token configuration: {0}")]
    InvalidConfig(String),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::InvalidSignature
            | ErrorKind::InvalidAlgorithm
            | ErrorKind::InvalidAlgorithmName
            | ErrorKind::MissingAlgorithm => TokenError::InvalidSignature,
            ErrorKind::ExpiredSignature | ErrorKind::ImmatureSignature => TokenError::Expired,
            ErrorKind::InvalidIssuer => TokenError::IssuerMismatch,
            _ => TokenError::MalformedToken(err.to_string()),
        }
    }
}

/// 访问令牌与刷新令牌共用同一套声明，只有过期时间不同
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // 用户ID
    pub iss: String,
    pub iat: i64,
    pub nbf: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<u64, TokenError> {
        self.sub
            .parse()
            .map_err(|_| TokenError::MalformedToken(format!("non-numeric subject {:?}", self.sub)))
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    pub access_expires_at: i64,
    pub refresh_expires_at: i64,
}

pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    issuer: String,
    access_ttl: i64,
    refresh_ttl: i64,
}

impl TokenService {
    pub fn new(config: TokenConfig) -> Result<Self, TokenError> {
        if config.secret.is_empty() {
            return Err(TokenError::InvalidConfig("secret must not be empty".into()));
        }
        if config.refresh_ttl <= config.access_ttl {
            return Err(TokenError::InvalidConfig(
                "refresh ttl must be longer than access ttl".into(),
            ));
        }

        // 时间窗口由 verify_at 自己判断，这里只校验算法、签名与签发者
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "nbf", "iss", "sub"]);

        Ok(Self {
            encoding: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding: DecodingKey::from_secret(config.secret.as_bytes()),
            validation,
            issuer: config.issuer,
            access_ttl: config.access_ttl.as_secs() as i64,
            refresh_ttl: config.refresh_ttl.as_secs() as i64,
        })
    }

    pub fn issue_pair(&self, user_id: u64) -> Result<TokenPair, TokenError> {
        self.issue_pair_at(user_id, Utc::now().timestamp())
    }

    /// 两个令牌使用同一个签发时刻
    pub fn issue_pair_at(&self, user_id: u64, now: i64) -> Result<TokenPair, TokenError> {
        Ok(TokenPair {
            access_token: self.issue_access_at(user_id, now)?,
            refresh_token: self.issue_refresh_at(user_id, now)?,
            access_expires_at: now + self.access_ttl,
            refresh_expires_at: now + self.refresh_ttl,
        })
    }

    pub fn issue_access_at(&self, user_id: u64, now: i64) -> Result<String, TokenError> {
        self.sign(user_id, now, self.access_ttl)
    }

    pub fn issue_refresh_at(&self, user_id: u64, now: i64) -> Result<String, TokenError> {
        self.sign(user_id, now, self.refresh_ttl)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        self.verify_at(token, Utc::now().timestamp())
    }

    /// 在给定时刻校验令牌：早于 nbf 或晚于 exp 都视为过期
    pub fn verify_at(&self, token: &str, now: i64) -> Result<Claims, TokenError> {
        let claims = decode::<Claims>(token, &self.decoding, &self.validation)?.claims;
        claims.user_id()?;

        if now > claims.exp || now < claims.nbf {
            return Err(TokenError::Expired);
        }
        Ok(claims)
    }

    fn sign(&self, user_id: u64, now: i64, ttl: i64) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id.to_string(),
            iss: self.issuer.clone(),
            iat: now,
            nbf: now,
            exp: now + ttl,
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::SigningError(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000;

    fn config(secret: &str) -> TokenConfig {
        TokenConfig {
            secret: secret.into(),
            issuer: "account-backend".into(),
            access_ttl: Duration::from_secs(15 * 60),
            refresh_ttl: Duration::from_secs(7 * 24 * 3600),
        }
    }

    fn service() -> TokenService {
        TokenService::new(config("test-secret")).unwrap()
    }

    #[test]
    fn access_token_round_trips_subject() {
        let svc = service();
        let token = svc.issue_access_at(42, NOW).unwrap();
        let claims = svc.verify_at(&token, NOW + 1).unwrap();

        assert_eq!(claims.user_id().unwrap(), 42);
        assert_eq!(claims.iss, "account-backend");
        assert_eq!(claims.nbf, NOW);
        assert_eq!(claims.exp, NOW + 15 * 60);
    }

    #[test]
    fn expiry_window_is_exact() {
        let svc = service();
        let token = svc.issue_access_at(7, NOW).unwrap();
        let exp = NOW + 15 * 60;

        assert!(svc.verify_at(&token, exp).is_ok());
        assert_eq!(svc.verify_at(&token, exp + 1), Err(TokenError::Expired));
        assert_eq!(svc.verify_at(&token, NOW - 1), Err(TokenError::Expired));
    }

    #[test]
    fn tampered_signature_is_rejected() {
        let svc = service();
        let token = svc.issue_access_at(1, NOW).unwrap();

        let sig_start = token.rfind('.').unwrap() + 1;
        let mut bytes = token.into_bytes();
        bytes[sig_start] = if bytes[sig_start] == b'A' { b'B' } else { b'A' };
        let tampered = String::from_utf8(bytes).unwrap();

        assert_eq!(svc.verify_at(&tampered, NOW), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn foreign_secret_is_rejected() {
        let other = TokenService::new(config("another-secret")).unwrap();
        let token = other.issue_access_at(1, NOW).unwrap();
        assert_eq!(service().verify_at(&token, NOW), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn non_mac_algorithm_is_rejected() {
        let svc = service();
        let token = svc.issue_access_at(1, NOW).unwrap();
        let rest = &token[token.find('.').unwrap()..];
        // {"alg":"RS256","typ":"JWT"}
        let forged = format!("eyJhbGciOiJSUzI1NiIsInR5cCI6IkpXVCJ9{rest}");

        assert_eq!(svc.verify_at(&forged, NOW), Err(TokenError::InvalidSignature));
    }

    #[test]
    fn foreign_issuer_is_rejected() {
        let other = TokenService::new(TokenConfig {
            issuer: "someone-else".into(),
            ..config("test-secret")
        })
        .unwrap();
        let token = other.issue_access_at(1, NOW).unwrap();
        assert_eq!(service().verify_at(&token, NOW), Err(TokenError::IssuerMismatch));
    }

    #[test]
    fn garbage_is_malformed() {
        let svc = service();
        assert!(matches!(
            svc.verify_at("not-a-token", NOW),
            Err(TokenError::MalformedToken(_))
        ));
        assert!(matches!(
            svc.verify_at("a.b.c", NOW),
            Err(TokenError::MalformedToken(_))
        ));
    }

    #[test]
    fn refresh_outlives_access() {
        let svc = service();
        let pair = svc.issue_pair_at(9, NOW).unwrap();
        let later = NOW + 3600;

        assert_eq!(pair.access_expires_at, NOW + 15 * 60);
        assert_eq!(pair.refresh_expires_at, NOW + 7 * 24 * 3600);
        assert_eq!(svc.verify_at(&pair.access_token, later), Err(TokenError::Expired));
        assert_eq!(
            svc.verify_at(&pair.refresh_token, later).unwrap().user_id().unwrap(),
            9
        );
    }

    #[test]
    fn config_is_validated() {
        assert!(matches!(
            TokenService::new(config("")),
            Err(TokenError::InvalidConfig(_))
        ));
        let inverted = TokenConfig {
            access_ttl: Duration::from_secs(3600),
            refresh_ttl: Duration::from_secs(60),
            ..config("secret")
        };
        assert!(matches!(
            TokenService::new(inverted),
            Err(TokenError::InvalidConfig(_))
        ));
    }
}
