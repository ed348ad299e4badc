pub mod csv_handler;
pub mod money;
pub mod password;
pub mod period;
pub mod validators;

/// 生成字母数字随机串（用于未配置时的 JWT secret 等）
pub fn generate_secure_token(length: usize) -> String {
    use std::iter;

    let chars = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";

    iter::repeat_with(|| chars[rand::random_range(0..chars.len())] as char)
        .take(length)
        .collect()
}
