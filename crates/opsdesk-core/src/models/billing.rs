use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::status::{Badge, BadgeTone};
use crate::utils::decimal::{decimal_string, option_decimal_string};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Expense {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    #[serde(default)]
    pub job: Option<i64>,
    pub category: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(with = "decimal_string")]
    pub amount: String,
    #[serde(default)]
    pub incurred_on: Option<NaiveDate>,
    #[serde(default)]
    pub vendor: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Draft,
    Sent,
    PartiallyPaid,
    Paid,
    Overdue,
    Void,
    #[serde(other)]
    Unknown,
}

impl InvoiceStatus {
    pub fn badge(self) -> Badge {
        match self {
            InvoiceStatus::Draft => Badge::new("Draft", BadgeTone::Neutral),
            InvoiceStatus::Sent => Badge::new("Sent", BadgeTone::Info),
            InvoiceStatus::PartiallyPaid => Badge::new("Partially Paid", BadgeTone::Warning),
            InvoiceStatus::Paid => Badge::new("Paid", BadgeTone::Success),
            InvoiceStatus::Overdue => Badge::new("Overdue", BadgeTone::Danger),
            InvoiceStatus::Void => Badge::new("Void", BadgeTone::Neutral),
            InvoiceStatus::Unknown => Badge::new("Unknown", BadgeTone::Neutral),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub client: i64,
    #[serde(default)]
    pub job: Option<i64>,
    #[serde(default)]
    pub number: Option<String>,
    #[serde(default)]
    pub status: InvoiceStatus,
    #[serde(default)]
    pub issued_on: Option<NaiveDate>,
    #[serde(default)]
    pub due_on: Option<NaiveDate>,
    #[serde(default, with = "option_decimal_string")]
    pub subtotal: Option<String>,
    #[serde(default, with = "option_decimal_string")]
    pub tax: Option<String>,
    #[serde(with = "decimal_string")]
    pub total: String,
    #[serde(default, with = "option_decimal_string")]
    pub amount_paid: Option<String>,
}

impl Invoice {
    /// Status as shown to the user: a sent invoice past its due date is
    /// overdue even if the server has not flagged it yet.
    pub fn display_status(&self, today: NaiveDate) -> InvoiceStatus {
        match self.status {
            InvoiceStatus::Sent | InvoiceStatus::PartiallyPaid
                if self.due_on.map(|d| d < today).unwrap_or(false) =>
            {
                InvoiceStatus::Overdue
            }
            status => status,
        }
    }
}

/// A payment received against an invoice.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Receipt {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub invoice: i64,
    #[serde(with = "decimal_string")]
    pub amount: String,
    #[serde(default)]
    pub received_on: Option<NaiveDate>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<i64>,
    pub entry_date: NaiveDate,
    pub description: String,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default, with = "option_decimal_string")]
    pub debit: Option<String>,
    #[serde(default, with = "option_decimal_string")]
    pub credit: Option<String>,
    #[serde(default, with = "option_decimal_string")]
    pub balance: Option<String>,
}
