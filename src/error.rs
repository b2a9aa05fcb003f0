use rust_i18n::t;
use thiserror::Error;

/// 枚举值不在允许范围内
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {kind}: '{value}'")]
pub struct UnknownVariant {
    pub kind: &'static str,
    pub value: String,
}

impl UnknownVariant {
    pub fn new(kind: &'static str, value: &str) -> Self {
        Self {
            kind,
            value: value.to_string(),
        }
    }
}

/// 本地表单校验错误，请求不会发出
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("target URL is empty")]
    EmptyUrl,
    #[error("target URL is not a valid http(s) URL")]
    InvalidUrl,
    #[error("email address is not valid")]
    InvalidEmail,
    #[error("password must be at least 8 characters")]
    PasswordTooShort,
}

impl ValidationError {
    pub fn notification(&self, locale: &str) -> String {
        match self {
            ValidationError::EmptyUrl => t!("scan.errors.empty_url", locale = locale),
            ValidationError::InvalidUrl => t!("scan.errors.invalid_url", locale = locale),
            ValidationError::InvalidEmail => t!("auth.errors.invalid_email", locale = locale),
            ValidationError::PasswordTooShort => t!("auth.errors.password_too_short", locale = locale),
        }
        .to_string()
    }
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("authentication rejected{}", detail_suffix(.detail))]
    Unauthorized { detail: Option<String> },

    #[error("resource not found")]
    NotFound,

    #[error("backend returned HTTP {status}{}", detail_suffix(.detail))]
    Backend { status: u16, detail: Option<String> },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected response body: {0}")]
    Decode(String),

    #[error("local storage failed: {0}")]
    Storage(String),
}

fn detail_suffix(detail: &Option<String>) -> String {
    detail
        .as_deref()
        .map(|d| format!(": {}", d))
        .unwrap_or_default()
}

impl ApiError {
    /// 传输层错误与 5xx 允许自动重试一次；4xx（包括 401）不重试
    pub fn is_retryable(&self) -> bool {
        match self {
            ApiError::Transport(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ApiError::Backend { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// 面向用户的提示文本：优先使用服务端的 detail，否则回退到通用提示
    pub fn notification(&self, locale: &str) -> String {
        match self {
            ApiError::Validation(v) => v.notification(locale),
            ApiError::Unauthorized { .. } => t!("auth.errors.session_expired", locale = locale).to_string(),
            ApiError::NotFound => t!("scan.not_found", locale = locale).to_string(),
            ApiError::Backend { detail: Some(detail), .. } if !detail.trim().is_empty() => detail.clone(),
            ApiError::Transport(_) => t!("common.errors.network", locale = locale).to_string(),
            ApiError::Storage(_) => t!("common.errors.storage", locale = locale).to_string(),
            _ => t!("common.errors.generic", locale = locale).to_string(),
        }
    }
}

/// 解析 FastAPI 风格的错误体：`{"detail": "..."}` 或 `{"detail": [{"msg": "..."}]}`
pub fn extract_detail(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    match value.get("detail")? {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => {
            let messages: Vec<&str> = items
                .iter()
                .filter_map(|item| item.get("msg").and_then(|m| m.as_str()))
                .collect();
            if messages.is_empty() {
                None
            } else {
                Some(messages.join("; "))
            }
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_string_and_list_details() {
        assert_eq!(
            extract_detail(r#"{"detail":"El email ya está registrado"}"#).as_deref(),
            Some("El email ya está registrado")
        );
        assert_eq!(
            extract_detail(r#"{"detail":[{"loc":["body","email"],"msg":"value is not a valid email address"},{"msg":"field required"}]}"#).as_deref(),
            Some("value is not a valid email address; field required")
        );
        assert_eq!(extract_detail("<html>502</html>"), None);
        assert_eq!(extract_detail(r#"{"message":"x"}"#), None);
    }

    #[test]
    fn backend_detail_wins_over_generic_message() {
        let err = ApiError::Backend { status: 400, detail: Some("Error creating scan: boom".to_string()) };
        assert_eq!(err.notification("en"), "Error creating scan: boom");

        let err = ApiError::Backend { status: 500, detail: None };
        assert!(err.is_retryable());
        assert!(!err.notification("en").is_empty());
    }

    #[test]
    fn client_errors_are_not_retried() {
        assert!(!ApiError::Unauthorized { detail: None }.is_retryable());
        assert!(!ApiError::NotFound.is_retryable());
        assert!(!ApiError::Backend { status: 422, detail: None }.is_retryable());
        assert!(!ApiError::Validation(ValidationError::InvalidUrl).is_retryable());
    }
}
