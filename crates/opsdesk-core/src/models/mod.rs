//! Data models for the operations backend.
//!
//! - `Client`: customers the office works for
//! - `Job`, `Milestone`: work orders and their tracking milestones
//! - `Expense`, `Invoice`, `Receipt`, `LedgerEntry`: billing
//! - `Document`: files attached to jobs
//!
//! Monetary amounts stay decimal strings exactly as the server issues
//! them; see `utils::decimal` for normalization.

pub mod billing;
pub mod client;
pub mod document;
pub mod job;
pub mod status;

pub use billing::{Expense, Invoice, InvoiceStatus, LedgerEntry, Receipt};
pub use client::Client;
pub use document::Document;
pub use job::{sort_milestones, Job, JobStatus, Milestone, MilestoneStatus};
pub use status::{Badge, BadgeTone};
