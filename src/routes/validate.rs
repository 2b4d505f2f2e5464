// 请求参数校验
// 长度按字符计算

use crate::error::AppError;

pub fn length(field: &str, value: &str, min: usize, max: usize) -> Result<(), AppError> {
    let len = value.chars().count();
    if len < min || len > max {
        return Err(AppError::Validation(format!(
            "{field}长度必须在{min}到{max}个字符之间"
        )));
    }
    Ok(())
}

pub fn required(field: &str, value: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::Validation(format!("{field}不能为空")));
    }
    Ok(())
}

pub fn email(value: &str) -> Result<(), AppError> {
    let valid = match value.split_once('@') {
        Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
        None => false,
    };
    if !valid || value.chars().count() > 255 {
        return Err(AppError::Validation("邮箱格式不正确".into()));
    }
    Ok(())
}

pub fn phone(value: &str) -> Result<(), AppError> {
    if value.len() != 11 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::Validation("手机号必须是11位数字".into()));
    }
    Ok(())
}

pub fn sms_code(value: &str) -> Result<(), AppError> {
    if value.len() != 6 || !value.bytes().all(|b| b.is_ascii_digit()) {
        return Err(AppError::Validation("验证码必须是6位数字".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn length_counts_characters() {
        assert!(length("昵称", "张三", 2, 50).is_ok());
        assert!(length("昵称", "张", 2, 50).is_err());
        assert!(length("用户名", &"a".repeat(51), 3, 50).is_err());
    }

    #[test]
    fn email_needs_both_sides() {
        assert!(email("a@b").is_ok());
        assert!(email("@b").is_err());
        assert!(email("ab").is_err());
    }

    #[test]
    fn phone_and_code_are_digit_strings() {
        assert!(phone("13800138000").is_ok());
        assert!(phone("1380013800").is_err());
        assert!(phone("1380013800a").is_err());
        assert!(sms_code("012345").is_ok());
        assert!(sms_code("12345").is_err());
    }
}
