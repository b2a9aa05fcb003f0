use crate::error::{ApiError, ValidationError};
use crate::models::{LoginRequest, RegisterRequest, TokenResponse, User};
use crate::services::api::{ApiClient, Bearer};
use lazy_static::lazy_static;
use regex::Regex;
use std::sync::Arc;

pub const MIN_PASSWORD_LEN: usize = 8;

lazy_static! {
    static ref EMAIL_PATTERN: Regex =
        Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email pattern is valid");
}

pub fn validate_credentials(email: &str, password: &str) -> Result<(), ValidationError> {
    if !EMAIL_PATTERN.is_match(email.trim()) {
        return Err(ValidationError::InvalidEmail);
    }
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ValidationError::PasswordTooShort);
    }
    Ok(())
}

/// 注册、登录与当前用户查询
pub struct AuthService {
    api: Arc<ApiClient>,
}

impl AuthService {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// 登录：换取令牌，用该令牌读取当前用户，最后写入会话
    pub async fn login(&self, email: &str, password: &str) -> Result<User, ApiError> {
        let request = LoginRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
        };

        let token: TokenResponse = self
            .api
            .post_json("auth/login", Some(&request), Bearer::None)
            .await?;
        log::debug!(
            "Received {} token valid for {}s",
            token.token_type,
            token.expires_in
        );

        let user: User = self
            .api
            .get_json_as("auth/me", Bearer::Explicit(token.access_token.clone()))
            .await?;

        self.api
            .session()
            .set_auth(user.clone(), token.access_token)
            .map_err(|e| ApiError::Storage(format!("{:#}", e)))?;
        Ok(user)
    }

    /// 注册后使用相同凭证自动登录
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        full_name: &str,
    ) -> Result<User, ApiError> {
        validate_credentials(email, password)?;

        let request = RegisterRequest {
            email: email.trim().to_string(),
            password: password.to_string(),
            full_name: full_name.trim().to_string(),
        };
        let created: User = self
            .api
            .post_json("auth/register", Some(&request), Bearer::None)
            .await?;
        log::info!("Account {} registered", created.email);

        self.login(email, password).await
    }

    pub async fn me(&self) -> Result<User, ApiError> {
        self.api.get_json("auth/me").await
    }

    pub fn logout(&self) -> bool {
        self.api.session().logout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validates_email_and_password_length() {
        assert!(validate_credentials("ana@example.com", "s3cretpass").is_ok());
        assert_eq!(
            validate_credentials("ana.example.com", "s3cretpass"),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            validate_credentials("ana@example.com", "short"),
            Err(ValidationError::PasswordTooShort)
        );
    }
}
