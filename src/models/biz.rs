use std::fmt;
use std::str::FromStr;

/// 验证码业务类型，未知类型在进入缓存前即被拒绝
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BizType {
    Login,
    Register,
    ResetPwd,
    ChangePhone,
}

impl BizType {
    pub fn as_str(&self) -> &'static str {
        match self {
            BizType::Login => "login",
            BizType::Register => "register",
            BizType::ResetPwd => "reset_pwd",
            BizType::ChangePhone => "change_phone",
        }
    }
}

impl FromStr for BizType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "login" => Ok(BizType::Login),
            "register" => Ok(BizType::Register),
            "reset_pwd" => Ok(BizType::ResetPwd),
            "change_phone" => Ok(BizType::ChangePhone),
            other => Err(format!("unknown business context {other:?}")),
        }
    }
}

impl fmt::Display for BizType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
