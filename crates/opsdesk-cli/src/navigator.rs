use std::sync::Mutex;

use opsdesk_core::Navigator;

/// Terminal stand-in for a browser location.
///
/// Navigating prints a notice and moves the location, so once the first
/// failed request has sent us to the login page the rest stay quiet.
pub struct TerminalNavigator {
    location: Mutex<String>,
}

impl TerminalNavigator {
    pub fn at(location: impl Into<String>) -> Self {
        Self {
            location: Mutex::new(location.into()),
        }
    }
}

impl Navigator for TerminalNavigator {
    fn current_path(&self) -> String {
        self.location
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }

    fn navigate(&self, path: &str) {
        eprintln!("Session expired, run `opsdesk login` to sign in again.");
        *self
            .location
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = path.to_string();
    }
}
