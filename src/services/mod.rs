// 业务服务
// 组合存储库、令牌服务和验证码缓存，供路由层调用

pub mod auth;
pub mod sms;
pub mod user;

pub use auth::{AuthService, LoginResult, RegisterInput};
pub use sms::{HttpSmsSender, LogSmsSender, SmsError, SmsSender, SmsService};
pub use user::{CreateUserInput, UpdateUserInput, UserPage, UserService};
