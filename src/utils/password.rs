//! 密码哈希工具模块
//!
//! 使用 Argon2id 算法进行密码哈希和验证

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};

use crate::errors::{FintrackError, Result};

pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// 对密码进行 Argon2id 哈希
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| FintrackError::password_hash(e.to_string()))
}

/// 验证密码是否匹配哈希
///
/// 哈希本身格式损坏时返回错误，密码不匹配时返回 `Ok(false)`
pub fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|e| FintrackError::password_hash(e.to_string()))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// 新密码的长度规则
pub fn validate_new_password(password: &str) -> Result<()> {
    let len = password.chars().count();
    if len < MIN_PASSWORD_LENGTH {
        return Err(FintrackError::validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LENGTH
        )));
    }
    if len > MAX_PASSWORD_LENGTH {
        return Err(FintrackError::validation(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_LENGTH
        )));
    }
    Ok(())
}
