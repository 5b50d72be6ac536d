//! Authentication module for managing sessions and tokens.
//!
//! This module provides:
//! - `SessionData` / `SessionState`: the current session and its state
//! - `TokenStore`: durable storage for the access and refresh tokens
//!   (in memory, JSON file, or OS keychain via keyring)
//! - `AuthFailureReason` and the classifier that decides whether a 401
//!   means the stored token is no longer valid
//! - `SessionListener` / `LoginRedirect`: what happens once it isn't
//! - `AuthProvider`: login and logout on top of the `ApiClient`
//!
//! The refresh token is stored but never used to renew a session; an
//! invalidated token always requires a fresh login.

pub mod classify;
pub mod credentials;
pub mod provider;
pub mod redirect;
pub mod session;
pub mod store;

pub use classify::{AuthFailureReason, ClassifyAuthFailure, ErrorBody, TokenNotValidClassifier};
pub use credentials::KeyringTokenStore;
pub use provider::AuthProvider;
pub use redirect::{LoginRedirect, Navigator, SessionListener};
pub use session::{SessionData, SessionState};
pub use store::{FileTokenStore, MemoryTokenStore, TokenKey, TokenStore};
