use std::sync::LazyLock;

use bcrypt::{DEFAULT_COST, hash, verify};
use thiserror::Error;
use tokio::task;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must not be empty")]
    EmptyInput,
    #[error("failed to hash password: {0}")]
    Hash(bcrypt::BcryptError),
    #[error("malformed password digest: {0}")]
    MalformedDigest(bcrypt::BcryptError),
    #[error("password task failed: {0}")]
    Task(String),
}

/// 用户不存在时拿来比较的摘要，让登录失败的两条路径耗时一致
static DUMMY_DIGEST: LazyLock<String> =
    LazyLock::new(|| hash_blocking("account-backend-dummy").unwrap_or_default());

fn hash_blocking(password: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::EmptyInput);
    }
    hash(password.as_bytes(), DEFAULT_COST).map_err(PasswordError::Hash)
}

fn verify_blocking(password: &str, digest: &str) -> Result<bool, PasswordError> {
    verify(password.as_bytes(), digest).map_err(PasswordError::MalformedDigest)
}

/// bcrypt 加盐哈希，相同输入每次得到不同摘要
///
/// 计算在阻塞线程池中执行，不占用异步工作线程。
pub async fn hash_password(password: &str) -> Result<String, PasswordError> {
    let password = password.to_owned();
    task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
}

/// 不匹配返回 `Ok(false)`，只有摘要无法解析时才返回错误
pub async fn verify_password(password: &str, digest: &str) -> Result<bool, PasswordError> {
    let password = password.to_owned();
    let digest = digest.to_owned();
    task::spawn_blocking(move || verify_blocking(&password, &digest))
        .await
        .map_err(|e| PasswordError::Task(e.to_string()))?
}

/// 与固定摘要做一次完整校验，结果总是不匹配
pub async fn verify_dummy_password(password: &str) -> bool {
    let password = password.to_owned();
    let outcome = task::spawn_blocking(move || verify_blocking(&password, &DUMMY_DIGEST)).await;
    matches!(outcome, Ok(Ok(true)))
}
