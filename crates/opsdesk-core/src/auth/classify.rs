//! Classification of 401 responses.
//!
//! A 401 can mean the stored access token is dead (expired, revoked,
//! malformed) or something that has nothing to do with the session, such
//! as a wrong password at login. Only the former tears the session down,
//! so the decision is made from the error body, not from the status code.

use serde::Deserialize;
use serde_json::Value;

/// Machine-readable code the backend returns for an unusable access token.
pub const TOKEN_NOT_VALID_CODE: &str = "token_not_valid";

/// Lowercase fragments of `detail` that also mean the token is unusable.
pub const TOKEN_NOT_VALID_PHRASES: [&str; 2] = ["token not valid", "token is invalid"];

/// Codes the backend uses for rejected login credentials.
const CREDENTIALS_REJECTED_CODES: [&str; 2] = ["no_active_account", "authentication_failed"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthFailureReason {
    TokenExpired,
    TokenMalformed,
    CredentialsRejected,
    Unknown,
}

impl AuthFailureReason {
    /// Whether the stored session must be discarded.
    pub fn invalidates_session(self) -> bool {
        matches!(
            self,
            AuthFailureReason::TokenExpired | AuthFailureReason::TokenMalformed
        )
    }
}

impl std::fmt::Display for AuthFailureReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthFailureReason::TokenExpired => write!(f, "token expired"),
            AuthFailureReason::TokenMalformed => write!(f, "token not valid"),
            AuthFailureReason::CredentialsRejected => write!(f, "credentials rejected"),
            AuthFailureReason::Unknown => write!(f, "unknown"),
        }
    }
}

/// Per-token message in a SimpleJWT-style error body.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenMessage {
    pub token_class: Option<String>,
    pub token_type: Option<String>,
    pub message: Option<String>,
}

/// Lenient view of an error response body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorBody {
    pub code: Option<String>,
    pub detail: Option<String>,
    pub messages: Vec<TokenMessage>,
}

impl ErrorBody {
    /// Parse a response body. Non-JSON bodies become `detail` verbatim;
    /// non-string `code`/`detail` values are ignored.
    pub fn parse(body: &str) -> Self {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            return Self::default();
        }

        let value: Value = match serde_json::from_str(trimmed) {
            Ok(v) => v,
            Err(_) => {
                return Self {
                    detail: Some(trimmed.to_string()),
                    ..Self::default()
                }
            }
        };

        let Value::Object(map) = value else {
            return Self::default();
        };

        let string_field = |name: &str| map.get(name).and_then(Value::as_str).map(str::to_string);

        let messages = map
            .get("messages")
            .cloned()
            .and_then(|m| serde_json::from_value::<Vec<TokenMessage>>(m).ok())
            .unwrap_or_default();

        Self {
            code: string_field("code"),
            detail: string_field("detail"),
            messages,
        }
    }

    fn mentions_detail(&self, needle: &str) -> bool {
        self.detail
            .as_deref()
            .map(|d| d.to_lowercase().contains(needle))
            .unwrap_or(false)
    }

    /// Whether `detail` or any token message contains `needle` (lowercase).
    fn mentions(&self, needle: &str) -> bool {
        self.mentions_detail(needle)
            || self.messages.iter().any(|m| {
                m.message
                    .as_deref()
                    .map(|msg| msg.to_lowercase().contains(needle))
                    .unwrap_or(false)
            })
    }
}

/// Decides what a 401 error body means.
pub trait ClassifyAuthFailure: Send + Sync {
    fn classify(&self, body: &ErrorBody) -> AuthFailureReason;
}

impl<F> ClassifyAuthFailure for F
where
    F: Fn(&ErrorBody) -> AuthFailureReason + Send + Sync,
{
    fn classify(&self, body: &ErrorBody) -> AuthFailureReason {
        self(body)
    }
}

/// Default classifier: the `token_not_valid` code, or a detail mentioning
/// "token not valid" / "token is invalid" in any letter case.
#[derive(Debug, Clone)]
pub struct TokenNotValidClassifier {
    sentinel: String,
    phrases: Vec<String>,
}

impl TokenNotValidClassifier {
    pub fn new(sentinel: impl Into<String>, phrases: &[&str]) -> Self {
        Self {
            sentinel: sentinel.into(),
            phrases: phrases.iter().map(|p| p.to_lowercase()).collect(),
        }
    }

    fn token_rejected(&self, body: &ErrorBody) -> bool {
        let code_match = body
            .code
            .as_deref()
            .map(|c| c.eq_ignore_ascii_case(&self.sentinel))
            .unwrap_or(false);
        code_match || self.phrases.iter().any(|p| body.mentions_detail(p))
    }
}

impl Default for TokenNotValidClassifier {
    fn default() -> Self {
        Self::new(TOKEN_NOT_VALID_CODE, &TOKEN_NOT_VALID_PHRASES)
    }
}

impl ClassifyAuthFailure for TokenNotValidClassifier {
    fn classify(&self, body: &ErrorBody) -> AuthFailureReason {
        if self.token_rejected(body) {
            return if body.mentions("expired") {
                AuthFailureReason::TokenExpired
            } else {
                AuthFailureReason::TokenMalformed
            };
        }

        let code = body.code.as_deref().unwrap_or_default();
        if CREDENTIALS_REJECTED_CODES
            .iter()
            .any(|c| c.eq_ignore_ascii_case(code))
            || body.mentions_detail("credentials")
        {
            return AuthFailureReason::CredentialsRejected;
        }

        AuthFailureReason::Unknown
    }
}
