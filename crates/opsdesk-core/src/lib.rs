//! Core library for opsdesk.
//!
//! Provides the session-aware `ApiClient` for the operations REST API,
//! token storage, auth failure classification, configuration, and typed
//! resource modules (clients, jobs, milestones, billing, documents).

pub mod api;
pub mod auth;
pub mod config;
pub mod models;
pub mod utils;

pub use api::{ApiClient, ApiClientBuilder, ApiError, Resources};
pub use auth::{
    AuthFailureReason, AuthProvider, LoginRedirect, Navigator, SessionData, SessionListener,
    SessionState, TokenStore,
};
pub use config::{Config, ConfigError};
