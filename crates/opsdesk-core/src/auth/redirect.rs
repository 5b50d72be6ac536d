//! Reaction to a session the server no longer accepts.
//!
//! The `ApiClient` only clears the token store and calls the registered
//! [`SessionListener`]. What "go back to login" means is up to the host:
//! [`LoginRedirect`] covers the usual case of a hard navigation to a fixed
//! login path through a [`Navigator`].

use tracing::{debug, info};

use super::AuthFailureReason;

/// Notified once per invalid-token failure, after the store was cleared.
pub trait SessionListener: Send + Sync {
    fn on_session_invalidated(&self, reason: AuthFailureReason);
}

/// Host-side location and hard navigation.
pub trait Navigator: Send + Sync {
    /// Current location, e.g. `/jobs/12?tab=milestones`.
    fn current_path(&self) -> String;

    /// Full navigation that resets the host's in-app state.
    fn navigate(&self, path: &str);
}

/// Navigates to the login path unless the host is already there.
pub struct LoginRedirect<N> {
    navigator: N,
    login_path: String,
}

impl<N: Navigator> LoginRedirect<N> {
    pub fn new(navigator: N, login_path: impl Into<String>) -> Self {
        Self {
            navigator,
            login_path: login_path.into(),
        }
    }

    pub fn navigator(&self) -> &N {
        &self.navigator
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    /// Query string and trailing slash are ignored: `/login/?next=/jobs`
    /// is the login page.
    pub fn is_login_location(&self, location: &str) -> bool {
        normalize_path(location) == normalize_path(&self.login_path)
    }
}

impl<N: Navigator> SessionListener for LoginRedirect<N> {
    fn on_session_invalidated(&self, reason: AuthFailureReason) {
        let current = self.navigator.current_path();
        if self.is_login_location(&current) {
            debug!(%reason, location = %current, "Already on login page, not redirecting");
            return;
        }
        info!(%reason, from = %current, to = %self.login_path, "Session invalidated, redirecting to login");
        self.navigator.navigate(&self.login_path);
    }
}

fn normalize_path(location: &str) -> &str {
    let path = location
        .split(['?', '#'])
        .next()
        .unwrap_or_default();
    match path.trim_end_matches('/') {
        "" => "/",
        trimmed => trimmed,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct RecordingNavigator {
        location: Mutex<String>,
        visits: Mutex<Vec<String>>,
    }

    impl RecordingNavigator {
        fn at(location: &str) -> Self {
            Self {
                location: Mutex::new(location.to_string()),
                visits: Mutex::new(Vec::new()),
            }
        }

        fn visits(&self) -> Vec<String> {
            self.visits.lock().unwrap().clone()
        }
    }

    impl Navigator for RecordingNavigator {
        fn current_path(&self) -> String {
            self.location.lock().unwrap().clone()
        }

        fn navigate(&self, path: &str) {
            *self.location.lock().unwrap() = path.to_string();
            self.visits.lock().unwrap().push(path.to_string());
        }
    }

    #[test]
    fn test_redirects_once_from_other_page() {
        let redirect = LoginRedirect::new(RecordingNavigator::at("/clients/"), "/login");
        redirect.on_session_invalidated(AuthFailureReason::TokenExpired);
        assert_eq!(redirect.navigator().visits(), vec!["/login".to_string()]);
        assert_eq!(redirect.navigator().current_path(), "/login");

        // A second failure arriving after the navigation finds us on the login page
        redirect.on_session_invalidated(AuthFailureReason::TokenMalformed);
        assert_eq!(redirect.navigator().visits().len(), 1);
    }

    #[test]
    fn test_no_redirect_loop_on_login_page() {
        let redirect = LoginRedirect::new(RecordingNavigator::at("/login"), "/login");
        redirect.on_session_invalidated(AuthFailureReason::TokenMalformed);
        assert!(redirect.navigator().visits().is_empty());
    }

    #[test]
    fn test_login_location_matching() {
        let redirect = LoginRedirect::new(RecordingNavigator::at("/"), "/login");
        assert!(redirect.is_login_location("/login"));
        assert!(redirect.is_login_location("/login/"));
        assert!(redirect.is_login_location("/login?next=/jobs/4"));
        assert!(redirect.is_login_location("/login#form"));
        assert!(!redirect.is_login_location("/login-help"));
        assert!(!redirect.is_login_location("/"));
        assert!(!redirect.is_login_location("/jobs/4"));
    }
}
