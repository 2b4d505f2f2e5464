use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

use crate::{cache::CodeCache, error::AppError, models::BizType};

#[derive(Debug, Error)]
pub enum SmsError {
    #[error("sms gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("sms gateway rejected message: {0}")]
    Rejected(String),
}

/// 短信下发通道
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, phone: &str, content: &str) -> Result<(), SmsError>;
}

/// 开发环境使用：只写日志，不真正发送
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, phone: &str, content: &str) -> Result<(), SmsError> {
        tracing::debug!(phone, content, "sms delivered to log");
        Ok(())
    }
}

#[derive(Serialize)]
struct GatewayMessage<'a> {
    phone: &'a str,
    content: &'a str,
}

/// 通过 HTTP 网关发送短信，网关接收 JSON `{phone, content}`
pub struct HttpSmsSender {
    client: reqwest::Client,
    url: String,
}

impl HttpSmsSender {
    pub fn new(url: impl Into<String>) -> Result<Self, SmsError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl SmsSender for HttpSmsSender {
    async fn send(&self, phone: &str, content: &str) -> Result<(), SmsError> {
        let response = self
            .client
            .post(&self.url)
            .json(&GatewayMessage { phone, content })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SmsError::Rejected(format!("{status}: {body}")));
        }
        Ok(())
    }
}

impl From<SmsError> for AppError {
    fn from(err: SmsError) -> Self {
        AppError::Transient(err.to_string())
    }
}

/// 短信验证码服务
#[derive(Clone)]
pub struct SmsService {
    codes: CodeCache,
    sender: Arc<dyn SmsSender>,
}

impl SmsService {
    pub fn new(codes: CodeCache, sender: Arc<dyn SmsSender>) -> Self {
        Self { codes, sender }
    }

    /// 生成并下发验证码；下发失败时撤销已写入的验证码
    pub async fn send_code(&self, biz: BizType, phone: &str) -> Result<(), AppError> {
        let code = self.codes.set(biz, phone).await?;
        let minutes = self.codes.ttl().as_secs().div_ceil(60);
        let content = format!("您的验证码是: {code}, 有效期{minutes}分钟");

        if let Err(e) = self.sender.send(phone, &content).await {
            tracing::error!(%biz, error = %e, "failed to deliver sms code");
            self.codes.remove(biz, phone).await?;
            return Err(e.into());
        }

        tracing::info!(%biz, "sms code sent");
        Ok(())
    }

    pub async fn verify_code(&self, biz: BizType, phone: &str, code: &str) -> Result<(), AppError> {
        self.codes.verify(biz, phone, code).await?;
        tracing::info!(%biz, "sms code verified");
        Ok(())
    }
}
