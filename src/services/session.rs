use crate::models::User;
use crate::services::storage::BlobStorage;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 会话在本地存储中的命名空间
pub const SESSION_NAMESPACE: &str = "auth-storage";

/// 当前会话。`authenticated` 恒等于 `user` 与 `token` 同时存在
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub authenticated: bool,
}

impl Session {
    fn signed_in(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            authenticated: true,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    user: User,
    token: String,
}

pub struct SessionStore {
    state: Mutex<Session>,
    storage: BlobStorage,
}

impl SessionStore {
    /// 创建空会话；调用 `load_from_storage` 恢复上次登录
    pub fn new(storage: BlobStorage) -> Self {
        Self {
            state: Mutex::new(Session::default()),
            storage,
        }
    }

    fn state(&self) -> MutexGuard<'_, Session> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// 恢复持久化的会话，缺失或损坏时保持空会话，不返回错误
    pub fn load_from_storage(&self) -> bool {
        let restored = match self.storage.load::<PersistedSession>(SESSION_NAMESPACE) {
            Ok(Some(persisted)) if !persisted.token.trim().is_empty() => {
                Session::signed_in(persisted.user, persisted.token)
            }
            Ok(_) => Session::default(),
            Err(e) => {
                log::warn!("Ignoring unreadable session file: {:#}", e);
                Session::default()
            }
        };

        let authenticated = restored.authenticated;
        *self.state() = restored;
        if authenticated {
            log::debug!("Session restored from local storage");
        }
        authenticated
    }

    /// 保存登录结果并持久化
    pub fn set_auth(&self, user: User, token: String) -> Result<()> {
        let persisted = PersistedSession {
            user: user.clone(),
            token: token.clone(),
        };

        // 先落盘，写入失败时内存中的会话保持不变
        self.storage.save(SESSION_NAMESPACE, &persisted)?;

        *self.state() = Session::signed_in(user, token);
        log::info!("Session established for {}", persisted.user.email);
        Ok(())
    }

    /// 清空会话并删除持久化副本，返回调用前是否处于登录状态
    pub fn logout(&self) -> bool {
        let was_authenticated = {
            let mut state = self.state();
            let was = state.authenticated;
            *state = Session::default();
            was
        };

        if let Err(e) = self.storage.remove(SESSION_NAMESPACE) {
            log::warn!("Failed to remove persisted session: {:#}", e);
        }

        if was_authenticated {
            log::info!("Session cleared");
        }
        was_authenticated
    }

    /// 服务端拒绝了 `token` 时调用。仅当它仍是当前令牌时才清空会话，
    /// 因此并发失败的多个请求中只有一个会返回 `true`
    pub fn expire(&self, token: &str) -> bool {
        {
            let mut state = self.state();
            if state.token.as_deref() != Some(token) {
                return false;
            }
            *state = Session::default();
        }

        if let Err(e) = self.storage.remove(SESSION_NAMESPACE) {
            log::warn!("Failed to remove persisted session: {:#}", e);
        }
        log::warn!("Access token rejected by the server; session expired");
        true
    }

    pub fn snapshot(&self) -> Session {
        self.state().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.state().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.state().user.clone()
    }

    pub fn is_authenticated(&self) -> bool {
        self.state().authenticated
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn user() -> User {
        User {
            id: 1,
            email: "dev@securecheck.io".to_string(),
            full_name: Some("Dev".to_string()),
            is_active: Some(true),
            created_at: None,
        }
    }

    #[test]
    fn set_auth_survives_restart() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(BlobStorage::new(dir.path()));
        store.set_auth(user(), "tok-123".to_string()).unwrap();

        let fresh = SessionStore::new(BlobStorage::new(dir.path()));
        assert!(!fresh.is_authenticated());
        assert!(fresh.load_from_storage());

        let session = fresh.snapshot();
        assert_eq!(session.user, Some(user()));
        assert_eq!(session.token.as_deref(), Some("tok-123"));
        assert!(session.authenticated);
    }

    #[test]
    fn failed_persist_leaves_session_signed_out() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        std::fs::write(&blocker, "").unwrap();

        let store = SessionStore::new(BlobStorage::new(&blocker));
        assert!(store.set_auth(user(), "tok-123".to_string()).is_err());
        assert!(!store.is_authenticated());
        assert_eq!(store.token(), None);
    }

    #[test]
    fn logout_survives_restart() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(BlobStorage::new(dir.path()));
        store.set_auth(user(), "tok-123".to_string()).unwrap();
        assert!(store.logout());
        assert!(!store.logout());
        assert_eq!(store.snapshot(), Session::default());

        let fresh = SessionStore::new(BlobStorage::new(dir.path()));
        assert!(!fresh.load_from_storage());
        assert_eq!(fresh.snapshot(), Session::default());
    }

    #[test]
    fn malformed_or_token_only_files_leave_store_empty() {
        let dir = tempdir().unwrap();
        let storage = BlobStorage::new(dir.path());

        std::fs::write(storage.path_for(SESSION_NAMESPACE), "{{{").unwrap();
        let store = SessionStore::new(storage.clone());
        assert!(!store.load_from_storage());
        assert_eq!(store.snapshot(), Session::default());

        std::fs::write(storage.path_for(SESSION_NAMESPACE), r#"{"token":"legacy"}"#).unwrap();
        assert!(!store.load_from_storage());
        assert!(store.token().is_none());
    }

    #[test]
    fn expire_only_clears_matching_token_once() {
        let dir = tempdir().unwrap();
        let store = SessionStore::new(BlobStorage::new(dir.path()));
        store.set_auth(user(), "tok-1".to_string()).unwrap();

        assert!(!store.expire("tok-0"));
        assert!(store.is_authenticated());
        assert!(store.expire("tok-1"));
        assert!(!store.expire("tok-1"));
        assert!(!store.is_authenticated());
        assert!(!BlobStorage::new(dir.path()).path_for(SESSION_NAMESPACE).exists());
    }
}
