use crate::config::ClientConfig;
use crate::error::{extract_detail, ApiError};
use crate::router::{Navigator, Route};
use crate::services::session::SessionStore;
use reqwest::{Client, Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const USER_AGENT: &str = concat!("securecheck-cli/", env!("CARGO_PKG_VERSION"));
const DEFAULT_RETRY_DELAY: Duration = Duration::from_millis(1000);

/// 请求使用的凭证来源
#[derive(Debug, Clone)]
pub enum Bearer {
    /// 使用会话中的令牌（未登录时不带）
    Session,
    /// 登录流程中，令牌尚未写入会话
    Explicit(String),
    None,
}

/// 共享的请求管线：附加 Bearer 令牌、查询失败时自动重试一次、统一处理 401
pub struct ApiClient {
    client: Client,
    api_base: String,
    session: Arc<SessionStore>,
    navigator: Arc<Navigator>,
    retry_delay: Duration,
}

impl ApiClient {
    pub fn new(
        config: &ClientConfig,
        session: Arc<SessionStore>,
        navigator: Arc<Navigator>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(config.timeout)
            .build()?;

        Ok(Self {
            client,
            api_base: config.api_base(),
            session,
            navigator,
            retry_delay: DEFAULT_RETRY_DELAY,
        })
    }

    pub fn with_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.api_base, path.trim_start_matches('/'))
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self
            .send(Method::GET, path, &[], None, Bearer::Session)
            .await?;
        decode(response).await
    }

    pub async fn get_json_with_query<T: DeserializeOwned, Q: Serialize>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<T, ApiError> {
        let query = to_query_pairs(query)?;
        let response = self
            .send(Method::GET, path, &query, None, Bearer::Session)
            .await?;
        decode(response).await
    }

    pub async fn get_json_as<T: DeserializeOwned>(
        &self,
        path: &str,
        bearer: Bearer,
    ) -> Result<T, ApiError> {
        let response = self.send(Method::GET, path, &[], None, bearer).await?;
        decode(response).await
    }

    pub async fn get_text(&self, path: &str) -> Result<String, ApiError> {
        let response = self
            .send(Method::GET, path, &[], None, Bearer::Session)
            .await?;
        Ok(response.text().await?)
    }

    pub async fn post_json<B: Serialize, T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<&B>,
        bearer: Bearer,
    ) -> Result<T, ApiError> {
        let body = body
            .map(serde_json::to_value)
            .transpose()
            .map_err(|e| ApiError::Decode(e.to_string()))?;
        let response = self.send(Method::POST, path, &[], body, bearer).await?;
        decode(response).await
    }

    pub async fn delete(&self, path: &str) -> Result<(), ApiError> {
        self.send(Method::DELETE, path, &[], None, Bearer::Session)
            .await?;
        Ok(())
    }

    /// 发送请求；GET 遇到传输错误或 5xx 时自动重试一次，写操作从不重放
    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(String, String)],
        body: Option<serde_json::Value>,
        bearer: Bearer,
    ) -> Result<reqwest::Response, ApiError> {
        let token = match bearer {
            Bearer::Session => self.session.token(),
            Bearer::Explicit(token) => Some(token),
            Bearer::None => None,
        };

        let mut attempt = 0;
        loop {
            attempt += 1;
            match self
                .send_once(&method, path, query, body.as_ref(), token.as_deref())
                .await
            {
                Err(e) if attempt == 1 && method == Method::GET && e.is_retryable() => {
                    log::warn!("{} {} failed ({}), retrying once", method, path, e);
                    tokio::time::sleep(self.retry_delay).await;
                }
                result => return result,
            }
        }
    }

    async fn send_once(
        &self,
        method: &Method,
        path: &str,
        query: &[(String, String)],
        body: Option<&serde_json::Value>,
        token: Option<&str>,
    ) -> Result<reqwest::Response, ApiError> {
        let url = self.url(path);
        let mut request = self.client.request(method.clone(), &url);
        if !query.is_empty() {
            request = request.query(query);
        }
        if let Some(token) = token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        log::debug!("{} {}", method, url);
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let detail = extract_detail(&body);

        match status {
            StatusCode::UNAUTHORIZED => {
                if let Some(token) = token {
                    self.handle_rejected_token(token);
                }
                Err(ApiError::Unauthorized { detail })
            }
            StatusCode::NOT_FOUND => Err(ApiError::NotFound),
            _ => {
                log::warn!("{} {} returned {}", method, url, status);
                Err(ApiError::Backend {
                    status: status.as_u16(),
                    detail,
                })
            }
        }
    }

    /// 令牌被拒绝：清空会话并跳回登录页。并发失败时只执行一次
    fn handle_rejected_token(&self, token: &str) {
        if self.session.expire(token) {
            self.navigator.redirect(Route::Login);
        }
    }
}

async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ApiError> {
    let bytes = response.bytes().await?;
    serde_json::from_slice(&bytes).map_err(|e| ApiError::Decode(e.to_string()))
}

fn to_query_pairs<Q: Serialize>(query: &Q) -> Result<Vec<(String, String)>, ApiError> {
    let value = serde_json::to_value(query).map_err(|e| ApiError::Decode(e.to_string()))?;
    let pairs = match value {
        serde_json::Value::Object(map) => map
            .into_iter()
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| {
                let v = match v {
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                (k, v)
            })
            .collect(),
        _ => Vec::new(),
    };
    Ok(pairs)
}
