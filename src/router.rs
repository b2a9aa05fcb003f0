use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// 客户端可导航的页面
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Register,
    Dashboard,
    Docs,
    ScanDetails(i64),
}

impl Route {
    pub fn parse(path: &str) -> Option<Route> {
        let trimmed = path.trim().trim_end_matches('/');
        let segments: Vec<&str> = trimmed.split('/').filter(|s| !s.is_empty()).collect();

        match segments.as_slice() {
            [] => Some(Route::Landing),
            ["login"] => Some(Route::Login),
            ["register"] => Some(Route::Register),
            ["dashboard"] => Some(Route::Dashboard),
            ["docs"] => Some(Route::Docs),
            ["scans", id] => id.parse().ok().map(Route::ScanDetails),
            _ => None,
        }
    }

    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Dashboard | Route::ScanDetails(_))
    }

    /// 未知路径回到首页，受保护页面在未登录时跳转到登录页
    pub fn resolve(path: &str, authenticated: bool) -> Route {
        match Route::parse(path) {
            Some(route) if route.is_protected() && !authenticated => Route::Login,
            Some(route) => route,
            None => Route::Landing,
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Route::Landing => write!(f, "/"),
            Route::Login => write!(f, "/login"),
            Route::Register => write!(f, "/register"),
            Route::Dashboard => write!(f, "/dashboard"),
            Route::Docs => write!(f, "/docs"),
            Route::ScanDetails(id) => write!(f, "/scans/{}", id),
        }
    }
}

struct NavigatorState {
    current: Route,
    redirects: Vec<Route>,
    /// 由 `redirect` 触发的强制跳转，不含导航守卫的回退
    forced: Vec<Route>,
}

/// 记录当前页面以及被动跳转（如会话失效后跳回登录页）
pub struct Navigator {
    state: Mutex<NavigatorState>,
}

impl Navigator {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(NavigatorState {
                current: Route::Landing,
                redirects: Vec::new(),
                forced: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, NavigatorState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn navigate(&self, path: &str, authenticated: bool) -> Route {
        let route = Route::resolve(path, authenticated);
        let mut state = self.state();
        if Route::parse(path) != Some(route) {
            log::debug!("Navigation to {} redirected to {}", path, route);
            state.redirects.push(route);
        }
        state.current = route;
        route
    }

    pub fn redirect(&self, route: Route) {
        log::info!("Redirecting to {}", route);
        let mut state = self.state();
        state.current = route;
        state.redirects.push(route);
        state.forced.push(route);
    }

    pub fn current(&self) -> Route {
        self.state().current
    }

    pub fn redirects(&self) -> Vec<Route> {
        self.state().redirects.clone()
    }

    pub fn forced_redirects(&self) -> Vec<Route> {
        self.state().forced.clone()
    }
}

impl Default for Navigator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_paths() {
        assert_eq!(Route::parse("/"), Some(Route::Landing));
        assert_eq!(Route::parse("/dashboard/"), Some(Route::Dashboard));
        assert_eq!(Route::parse("/scans/42"), Some(Route::ScanDetails(42)));
        assert_eq!(Route::parse("/scans/abc"), None);
        assert_eq!(Route::parse("/admin"), None);
        assert_eq!(Route::ScanDetails(42).to_string(), "/scans/42");
    }

    #[test]
    fn guards_protected_routes() {
        assert_eq!(Route::resolve("/dashboard", false), Route::Login);
        assert_eq!(Route::resolve("/scans/3", false), Route::Login);
        assert_eq!(Route::resolve("/scans/3", true), Route::ScanDetails(3));
        assert_eq!(Route::resolve("/docs", false), Route::Docs);
        assert_eq!(Route::resolve("/nope", true), Route::Landing);
    }

    #[test]
    fn navigator_records_redirects() {
        let nav = Navigator::new();
        assert_eq!(nav.navigate("/dashboard", true), Route::Dashboard);
        assert!(nav.redirects().is_empty());

        assert_eq!(nav.navigate("/dashboard", false), Route::Login);
        assert!(nav.forced_redirects().is_empty());

        nav.redirect(Route::Login);
        assert_eq!(nav.redirects(), vec![Route::Login, Route::Login]);
        assert_eq!(nav.forced_redirects(), vec![Route::Login]);
        assert_eq!(nav.current(), Route::Login);
    }
}
