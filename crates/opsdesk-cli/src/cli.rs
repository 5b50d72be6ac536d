use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "opsdesk")]
#[command(about = "Command line client for the opsdesk operations API")]
#[command(version)]
pub struct Cli {
    /// Increase verbosity (-v info, -vv debug). RUST_LOG takes precedence.
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Sign in and store the session tokens
    Login {
        /// Defaults to the last username used
        #[arg(short, long)]
        username: Option<String>,
    },

    /// Forget the stored session
    Logout,

    /// Show the configured API and session state
    Status,

    /// Send a raw request and print the JSON response
    Request {
        /// HTTP method (GET, POST, PUT, PATCH, DELETE)
        method: String,
        /// Path relative to the API base URL, e.g. clients/7/
        path: String,
        /// JSON request body
        #[arg(short, long)]
        data: Option<String>,
    },

    /// List one page of a resource
    #[command(alias = "ls")]
    List {
        #[arg(value_enum)]
        resource: ResourceKind,
        #[arg(short, long, default_value = "1")]
        page: u32,
    },

    /// Show a single item as JSON
    Show {
        #[arg(value_enum)]
        resource: ResourceKind,
        id: i64,
    },

    /// Count every resource
    Summary,

    /// Attach a file to a job
    Upload {
        #[arg(long)]
        job: i64,
        #[arg(long)]
        title: String,
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },

    /// Save a document's file
    Download {
        id: i64,
        #[arg(value_name = "OUT")]
        out: PathBuf,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResourceKind {
    Clients,
    Jobs,
    Milestones,
    Expenses,
    Invoices,
    Receipts,
    Ledger,
    Documents,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 8] = [
        ResourceKind::Clients,
        ResourceKind::Jobs,
        ResourceKind::Milestones,
        ResourceKind::Expenses,
        ResourceKind::Invoices,
        ResourceKind::Receipts,
        ResourceKind::Ledger,
        ResourceKind::Documents,
    ];

    /// The value accepted on the command line, e.g. `ledger`.
    pub fn arg_name(self) -> String {
        self.to_possible_value()
            .map(|v| v.get_name().to_string())
            .unwrap_or_default()
    }

    pub fn label(self) -> &'static str {
        match self {
            ResourceKind::Clients => "Clients",
            ResourceKind::Jobs => "Jobs",
            ResourceKind::Milestones => "Milestones",
            ResourceKind::Expenses => "Expenses",
            ResourceKind::Invoices => "Invoices",
            ResourceKind::Receipts => "Receipts",
            ResourceKind::Ledger => "Ledger entries",
            ResourceKind::Documents => "Documents",
        }
    }
}
