use bcrypt::{hash, verify, DEFAULT_COST};
use crate::error::{AppError, AppResult};

/// 对密码进行哈希
pub fn hash_password(password: &str) -> AppResult<String> {
    hash(password, DEFAULT_COST)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {}", e)))
}

/// 验证密码
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    verify(password, hash)
        .map_err(|e| AppError::InternalError(format!("Password verification failed: {}", e)))
}

/// 是否为 bcrypt 哈希（$2a$ / $2b$ / $2x$ / $2y$）
pub fn is_password_hash(value: &str) -> bool {
    value.len() == 60
        && matches!(
            value.get(..4),
            Some("$2a$") | Some("$2b$") | Some("$2x$") | Some("$2y$")
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_password() {
        let password = "admin123";
        let hashed = hash_password(password).unwrap();

        assert!(verify_password(password, &hashed).unwrap());
        assert!(!verify_password("WrongPassword", &hashed).unwrap());
    }

    #[test]
    fn test_is_password_hash() {
        let hashed = hash_password("admin123").unwrap();
        assert!(is_password_hash(&hashed));
        assert!(!is_password_hash("admin123"));
        assert!(!is_password_hash(""));
        assert!(!is_password_hash("$2b$short"));
    }
}
