use crate::commands::AppState;
use crate::error::ApiError;
use crate::models::User;
use crate::router::Route;
use rust_i18n::t;

/// 注册并自动登录，成功后进入仪表盘
pub async fn register(
    state: &AppState,
    email: &str,
    password: &str,
    full_name: &str,
) -> Result<User, String> {
    let user = state
        .auth
        .register(email, password, full_name)
        .await
        .map_err(|e| e.notification(state.locale()))?;
    state.navigator.navigate("/dashboard", true);
    Ok(user)
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<User, String> {
    match state.auth.login(email, password).await {
        Ok(user) => {
            state.navigator.navigate("/dashboard", true);
            Ok(user)
        }
        Err(ApiError::Unauthorized { .. }) => {
            Err(t!("auth.login.error", locale = state.locale()).to_string())
        }
        Err(e) => Err(e.notification(state.locale())),
    }
}

/// 退出登录后回到首页
pub fn logout(state: &AppState) -> Route {
    state.auth.logout();
    state.navigator.navigate("/", false)
}

/// 从服务端刷新当前用户信息
pub async fn current_user(state: &AppState) -> Result<User, String> {
    if !state.session.is_authenticated() {
        return Err(t!("auth.errors.login_required", locale = state.locale()).to_string());
    }
    state
        .auth
        .me()
        .await
        .map_err(|e| e.notification(state.locale()))
}
