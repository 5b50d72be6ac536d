//! REST API client module for the operations backend.
//!
//! `ApiClient` dispatches every call: bearer token attachment, error
//! mapping and the invalid-session teardown live there. `Resources`
//! layers typed CRUD for each backend collection on top of it.

pub mod client;
pub mod error;
pub mod pagination;
pub mod resources;

pub use client::{ApiClient, ApiClientBuilder, Payload, RequestOptions};
pub use error::ApiError;
pub use pagination::Page;
pub use resources::{Resource, Resources};
pub use reqwest::Method;
