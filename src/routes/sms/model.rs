use serde::Deserialize;

use crate::{error::AppError, models::BizType, routes::validate};

#[derive(Debug, Deserialize)]
pub struct SendCodeRequest {
    pub biz: String,
    pub phone: String,
}

impl SendCodeRequest {
    /// 业务类型先于一切缓存访问解析
    pub fn validate(&self) -> Result<BizType, AppError> {
        let biz = parse_biz(&self.biz)?;
        validate::phone(&self.phone)?;
        Ok(biz)
    }
}

#[derive(Debug, Deserialize)]
pub struct VerifyCodeRequest {
    pub biz: String,
    pub phone: String,
    pub code: String,
}

impl VerifyCodeRequest {
    pub fn validate(&self) -> Result<BizType, AppError> {
        let biz = parse_biz(&self.biz)?;
        validate::phone(&self.phone)?;
        validate::sms_code(&self.code)?;
        Ok(biz)
    }
}

fn parse_biz(raw: &str) -> Result<BizType, AppError> {
    raw.parse()
        .map_err(|_| AppError::Validation(format!("不支持的业务类型: {raw}")))
}
