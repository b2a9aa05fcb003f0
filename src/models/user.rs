use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

/// 当前登录用户
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(default, with = "crate::models::timestamp::option")]
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// 用于展示的名称，没有全名时回退到邮箱
    pub fn display_name(&self) -> &str {
        match self.full_name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub full_name: String,
}

/// 登录接口返回的访问令牌
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default)]
    pub expires_in: i64,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_email() {
        let mut user = User {
            id: 7,
            email: "ana@example.com".to_string(),
            full_name: Some("  ".to_string()),
            is_active: None,
            created_at: None,
        };
        assert_eq!(user.display_name(), "ana@example.com");

        user.full_name = Some("Ana Pérez".to_string());
        assert_eq!(user.display_name(), "Ana Pérez");
    }

    #[test]
    fn token_response_defaults_token_type() {
        let token: TokenResponse =
            serde_json::from_str(r#"{"access_token":"abc","expires_in":1800}"#).unwrap();
        assert_eq!(token.token_type, "bearer");
        assert_eq!(token.expires_in, 1800);
    }
}
