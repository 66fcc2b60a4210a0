use regex::Regex;
use std::sync::LazyLock;
use crate::error::{AppError, AppResult};

static PHONE_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9(][0-9 ()\-]{5,18}[0-9]$").expect("valid phone regex"));

/// 验证手机号格式：可选的 +，数字、空格、括号和连字符，7-20 位，以数字结尾
pub fn validate_phone(phone: &str) -> AppResult<()> {
    if !PHONE_REGEX.is_match(phone) {
        return Err(AppError::ValidationError(
            "Invalid phone number format".to_string(),
        ));
    }

    Ok(())
}
