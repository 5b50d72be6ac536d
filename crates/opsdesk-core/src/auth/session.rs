use serde::{Deserialize, Serialize};

/// Tokens issued by a successful login.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionData {
    pub access_token: String,
    pub refresh_token: Option<String>,
}

impl SessionData {
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token,
        }
    }

    /// Short form of the access token for display ("eyJhbG…x9Qk").
    pub fn token_hint(&self) -> String {
        let chars: Vec<char> = self.access_token.chars().collect();
        if chars.len() <= 12 {
            return "*".repeat(chars.len());
        }
        let head: String = chars[..6].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{}…{}", head, tail)
    }
}

/// Whether the client currently holds an access token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

impl SessionState {
    /// The access token alone decides; a leftover refresh token does not count.
    pub fn from_access_token(token: Option<&str>) -> Self {
        match token {
            Some(t) if !t.is_empty() => SessionState::Authenticated,
            _ => SessionState::Anonymous,
        }
    }

    pub fn is_authenticated(self) -> bool {
        matches!(self, SessionState::Authenticated)
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionState::Anonymous => write!(f, "anonymous"),
            SessionState::Authenticated => write!(f, "authenticated"),
        }
    }
}
