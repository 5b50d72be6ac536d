//! Typed access to the backend collections.
//!
//! Each model maps to a collection path; item paths are `<PATH><id>/`.
//! Create and update bodies are trimmed before they are sent.

use reqwest::multipart::{Form, Part};
use serde::{de::DeserializeOwned, Serialize};

use crate::models::{
    sort_milestones, Client, Document, Expense, Invoice, Job, LedgerEntry, Milestone, Receipt,
};
use crate::utils::trim_payload;

use super::{ApiClient, ApiError, Page, RequestOptions};

/// A backend collection.
pub trait Resource: Serialize + DeserializeOwned + Send + Sync {
    /// Collection path relative to the API root, with trailing slash.
    const PATH: &'static str;
    /// Singular name used in messages and on the command line.
    const NAME: &'static str;
}

impl Resource for Client {
    const PATH: &'static str = "clients/";
    const NAME: &'static str = "client";
}

impl Resource for Job {
    const PATH: &'static str = "jobs/";
    const NAME: &'static str = "job";
}

impl Resource for Milestone {
    const PATH: &'static str = "milestones/";
    const NAME: &'static str = "milestone";
}

impl Resource for Expense {
    const PATH: &'static str = "expenses/";
    const NAME: &'static str = "expense";
}

impl Resource for Invoice {
    const PATH: &'static str = "invoices/";
    const NAME: &'static str = "invoice";
}

impl Resource for Receipt {
    const PATH: &'static str = "receipts/";
    const NAME: &'static str = "receipt";
}

impl Resource for LedgerEntry {
    const PATH: &'static str = "ledger/";
    const NAME: &'static str = "ledger entry";
}

impl Resource for Document {
    const PATH: &'static str = "documents/";
    const NAME: &'static str = "document";
}

pub fn item_path<R: Resource>(id: i64) -> String {
    format!("{}{}/", R::PATH, id)
}

/// Borrowing wrapper that adds typed CRUD to an [`ApiClient`].
#[derive(Clone, Copy)]
pub struct Resources<'a> {
    api: &'a ApiClient,
}

impl<'a> Resources<'a> {
    pub fn new(api: &'a ApiClient) -> Self {
        Self { api }
    }

    pub async fn list<R: Resource>(&self, options: RequestOptions) -> Result<Page<R>, ApiError> {
        self.api.get_with(R::PATH, options).await
    }

    pub async fn list_page<R: Resource>(&self, page: u32) -> Result<Page<R>, ApiError> {
        self.list(RequestOptions::new().query("page", page)).await
    }

    pub async fn get<R: Resource>(&self, id: i64) -> Result<R, ApiError> {
        self.api.get(&item_path::<R>(id)).await
    }

    pub async fn create<R: Resource>(&self, draft: &R) -> Result<R, ApiError> {
        let body = trimmed(draft)?;
        self.api.post(R::PATH, &body).await
    }

    /// PATCH the given fields of an existing item.
    pub async fn update<R: Resource, B: Serialize + ?Sized>(
        &self,
        id: i64,
        changes: &B,
    ) -> Result<R, ApiError> {
        let body = trimmed(changes)?;
        self.api.patch(&item_path::<R>(id), &body).await
    }

    pub async fn delete<R: Resource>(&self, id: i64) -> Result<(), ApiError> {
        self.api.delete(&item_path::<R>(id)).await
    }

    /// All milestones of a job in display order, following every page of
    /// the listing before sorting.
    pub async fn milestones_for_job(&self, job_id: i64) -> Result<Vec<Milestone>, ApiError> {
        let mut milestones = Vec::new();
        let mut options = RequestOptions::new().query("job", job_id);
        let mut current = 1;

        loop {
            let page: Page<Milestone> = self.list(options).await?;
            let next = page.next_page();
            milestones.extend(page.into_results());

            match next {
                // A link that does not move forward would loop forever
                Some(n) if n > current => {
                    current = n;
                    options = RequestOptions::new().query("job", job_id).query("page", n);
                }
                _ => break,
            }
        }

        sort_milestones(&mut milestones);
        Ok(milestones)
    }

    /// Upload a file to a job as multipart form data.
    pub async fn upload_document(
        &self,
        job_id: i64,
        title: &str,
        file_name: &str,
        bytes: Vec<u8>,
    ) -> Result<Document, ApiError> {
        let title = title.trim();
        if title.is_empty() {
            return Err(ApiError::Validation("Document title is required".to_string()));
        }
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(guess_mime(file_name))
            .map_err(|e| ApiError::InvalidRequest(format!("Invalid file part: {}", e)))?;
        let form = Form::new()
            .text("job", job_id.to_string())
            .text("title", title.to_string())
            .part("file", part);
        self.api.upload(Document::PATH, form).await
    }

    pub async fn download_document(&self, id: i64) -> Result<Vec<u8>, ApiError> {
        self.api
            .download(&format!("{}download/", item_path::<Document>(id)))
            .await
    }
}

fn trimmed<B: Serialize + ?Sized>(body: &B) -> Result<serde_json::Value, ApiError> {
    serde_json::to_value(body)
        .map(trim_payload)
        .map_err(|e| ApiError::InvalidRequest(format!("Failed to serialize body: {}", e)))
}

fn guess_mime(file_name: &str) -> &'static str {
    let extension = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match extension.as_str() {
        "pdf" => "application/pdf",
        "png" => "image/png",
        "jpg" | "jpeg" => "image/jpeg",
        "gif" => "image/gif",
        "txt" => "text/plain",
        "csv" => "text/csv",
        "doc" => "application/msword",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "xlsx" => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        _ => "application/octet-stream",
    }
}
