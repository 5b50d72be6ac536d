use std::io::{self, BufRead, Write};
use std::path::Path;

use anyhow::{bail, Context, Result};
use chrono::Local;
use futures::future::{join_all, LocalBoxFuture};
use futures::FutureExt;
use serde_json::Value;
use tracing::warn;

use opsdesk_core::api::{Method, Resource};
use opsdesk_core::models::{
    Client, Document, Expense, Invoice, Job, LedgerEntry, Milestone, Receipt,
};
use opsdesk_core::{ApiClient, ApiError, AuthProvider, Config, Resources};

use crate::cli::ResourceKind;
use crate::output::Row;

pub async fn login(config: &mut Config, auth: &AuthProvider, username: Option<String>) -> Result<()> {
    let username = match username.or_else(|| config.last_username.clone()) {
        Some(username) => username,
        None => prompt_line("Username: ")?,
    };
    let username = username.trim().to_string();
    if username.is_empty() {
        bail!("A username is required");
    }

    let password = rpassword::prompt_password(format!("Password for {}: ", username))
        .context("Failed to read password")?;

    let session = match auth.login(&username, &password).await {
        // The login page does not redirect, so say what happened here
        Err(e) if e.is_session_invalidated() => {
            bail!("The stored session was rejected and has been cleared. Run `opsdesk login` again.")
        }
        result => result?,
    };

    config.last_username = Some(username.clone());
    if let Err(e) = config.save() {
        warn!(error = %e, "Failed to remember username");
    }

    println!("Logged in as {} (token {})", username, session.token_hint());
    Ok(())
}

pub fn logout(auth: &AuthProvider) -> Result<()> {
    let was_authenticated = auth.is_authenticated();
    auth.logout()?;
    if was_authenticated {
        println!("Logged out");
    } else {
        println!("Not logged in");
    }
    Ok(())
}

pub fn status(config: &Config, auth: &AuthProvider) {
    println!("API:     {}", auth.api().base_url());
    println!("Store:   {:?}", config.token_store);
    match auth.session() {
        Some(session) => println!("Session: {} ({})", auth.state(), session.token_hint()),
        None => println!("Session: {}", auth.state()),
    }
}

pub async fn request(api: &ApiClient, method: &str, path: &str, data: Option<&str>) -> Result<()> {
    let method = Method::from_bytes(method.trim().to_ascii_uppercase().as_bytes())
        .with_context(|| format!("Invalid HTTP method {:?}", method))?;
    let body = data
        .map(serde_json::from_str::<Value>)
        .transpose()
        .context("--data is not valid JSON")?;

    let value = api.request_json(method, path, body).await?;
    if !value.is_null() {
        println!("{}", serde_json::to_string_pretty(&value)?);
    }
    Ok(())
}

pub async fn list(api: &ApiClient, kind: ResourceKind, page: u32) -> Result<()> {
    let resources = Resources::new(api);
    match kind {
        ResourceKind::Clients => print_page::<Client>(resources, kind, page).await,
        ResourceKind::Jobs => print_page::<Job>(resources, kind, page).await,
        ResourceKind::Milestones => print_page::<Milestone>(resources, kind, page).await,
        ResourceKind::Expenses => print_page::<Expense>(resources, kind, page).await,
        ResourceKind::Invoices => print_page::<Invoice>(resources, kind, page).await,
        ResourceKind::Receipts => print_page::<Receipt>(resources, kind, page).await,
        ResourceKind::Ledger => print_page::<LedgerEntry>(resources, kind, page).await,
        ResourceKind::Documents => print_page::<Document>(resources, kind, page).await,
    }
}

async fn print_page<R: Resource + Row>(
    resources: Resources<'_>,
    kind: ResourceKind,
    page: u32,
) -> Result<()> {
    let listing = resources.list_page::<R>(page).await?;
    let today = Local::now().date_naive();

    println!("{} (page {}, {} total)", kind.label(), page, listing.count);
    for item in &listing.results {
        println!("{}", item.row(today));
    }
    if let Some(next) = listing.next_page() {
        println!("More: opsdesk list {} --page {}", kind.arg_name(), next);
    }
    Ok(())
}

pub async fn show(api: &ApiClient, kind: ResourceKind, id: i64) -> Result<()> {
    let resources = Resources::new(api);
    let value = match kind {
        ResourceKind::Clients => fetch_value::<Client>(resources, id).await?,
        ResourceKind::Jobs => fetch_value::<Job>(resources, id).await?,
        ResourceKind::Milestones => fetch_value::<Milestone>(resources, id).await?,
        ResourceKind::Expenses => fetch_value::<Expense>(resources, id).await?,
        ResourceKind::Invoices => fetch_value::<Invoice>(resources, id).await?,
        ResourceKind::Receipts => fetch_value::<Receipt>(resources, id).await?,
        ResourceKind::Ledger => fetch_value::<LedgerEntry>(resources, id).await?,
        ResourceKind::Documents => fetch_value::<Document>(resources, id).await?,
    };
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn fetch_value<R: Resource>(resources: Resources<'_>, id: i64) -> Result<Value> {
    let item = resources
        .get::<R>(id)
        .await
        .with_context(|| format!("Failed to fetch {} {}", R::NAME, id))?;
    Ok(serde_json::to_value(item)?)
}

async fn count<R: Resource>(resources: Resources<'_>) -> Result<u64, ApiError> {
    Ok(resources.list_page::<R>(1).await?.count)
}

/// First page of every resource, fetched concurrently.
pub async fn summary(api: &ApiClient) -> Result<()> {
    let resources = Resources::new(api);
    let futures: Vec<LocalBoxFuture<'_, Result<u64, ApiError>>> = ResourceKind::ALL
        .iter()
        .map(|kind| match kind {
            ResourceKind::Clients => count::<Client>(resources).boxed_local(),
            ResourceKind::Jobs => count::<Job>(resources).boxed_local(),
            ResourceKind::Milestones => count::<Milestone>(resources).boxed_local(),
            ResourceKind::Expenses => count::<Expense>(resources).boxed_local(),
            ResourceKind::Invoices => count::<Invoice>(resources).boxed_local(),
            ResourceKind::Receipts => count::<Receipt>(resources).boxed_local(),
            ResourceKind::Ledger => count::<LedgerEntry>(resources).boxed_local(),
            ResourceKind::Documents => count::<Document>(resources).boxed_local(),
        })
        .collect();

    let results = join_all(futures).await;

    let mut first_error = None;
    for (kind, result) in ResourceKind::ALL.iter().zip(results) {
        match result {
            Ok(n) => println!("{:<16} {:>6}", kind.label(), n),
            Err(e) => {
                warn!(resource = kind.label(), error = %e, "Count failed");
                println!("{:<16} {:>6}", kind.label(), "?");
                first_error.get_or_insert(e);
            }
        }
    }

    match first_error {
        Some(e) => Err(e.into()),
        None => Ok(()),
    }
}

pub async fn upload(api: &ApiClient, job: i64, title: &str, file: &Path) -> Result<()> {
    let bytes =
        std::fs::read(file).with_context(|| format!("Failed to read {}", file.display()))?;
    let file_name = file
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload")
        .to_string();

    let document = Resources::new(api)
        .upload_document(job, title, &file_name, bytes)
        .await?;

    println!(
        "Uploaded {:?} as document {} ({})",
        document.title,
        document.id.map(|i| i.to_string()).unwrap_or_else(|| "?".to_string()),
        document.size_display()
    );
    Ok(())
}

pub async fn download(api: &ApiClient, id: i64, out: &Path) -> Result<()> {
    let bytes = Resources::new(api).download_document(id).await?;
    std::fs::write(out, &bytes).with_context(|| format!("Failed to write {}", out.display()))?;
    println!("Saved {} bytes to {}", bytes.len(), out.display());
    Ok(())
}

fn prompt_line(prompt: &str) -> Result<String> {
    eprint!("{}", prompt);
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read from stdin")?;
    Ok(line.trim().to_string())
}
