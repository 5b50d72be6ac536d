//! One-line renderings of each resource for `list`.

use chrono::NaiveDate;
use opsdesk_core::models::{
    Client, Document, Expense, Invoice, Job, LedgerEntry, Milestone, Receipt,
};
use opsdesk_core::utils::{format_amount, format_optional, truncate_string};

const TITLE_WIDTH: usize = 32;

pub trait Row {
    fn row(&self, today: NaiveDate) -> String;
}

fn id(id: Option<i64>) -> String {
    id.map(|i| i.to_string()).unwrap_or_else(|| "-".to_string())
}

fn date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%b %d, %Y").to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn amount(value: &Option<String>) -> String {
    value.as_deref().map(format_amount).unwrap_or_else(|| "-".to_string())
}

impl Row for Client {
    fn row(&self, _today: NaiveDate) -> String {
        format!(
            "{:>6}  {:<40}  {}",
            id(self.id),
            truncate_string(&self.display_name(), 40),
            format_optional(&self.email, "-")
        )
    }
}

impl Row for Job {
    fn row(&self, today: NaiveDate) -> String {
        let overdue = if self.is_overdue(today) { " overdue" } else { "" };
        format!(
            "{:>6}  {:<width$}  {:<14} due {}{}",
            id(self.id),
            truncate_string(&self.title, TITLE_WIDTH),
            self.status.badge().to_string(),
            date(self.due_date),
            overdue,
            width = TITLE_WIDTH
        )
    }
}

impl Row for Milestone {
    fn row(&self, _today: NaiveDate) -> String {
        format!(
            "{:>6}  job {:<5} {:<width$}  {:<14} due {}",
            id(self.id),
            self.job,
            truncate_string(&self.title, TITLE_WIDTH),
            self.status.badge().to_string(),
            date(self.due_date),
            width = TITLE_WIDTH
        )
    }
}

impl Row for Expense {
    fn row(&self, _today: NaiveDate) -> String {
        format!(
            "{:>6}  {:<20}  {:>14}  {}",
            id(self.id),
            truncate_string(&self.category, 20),
            format_amount(&self.amount),
            date(self.incurred_on)
        )
    }
}

impl Row for Invoice {
    fn row(&self, today: NaiveDate) -> String {
        format!(
            "{:>6}  {:<12}  {:<16}  {:>14}  due {}",
            id(self.id),
            format_optional(&self.number, "(draft)"),
            self.display_status(today).badge().to_string(),
            format_amount(&self.total),
            date(self.due_on)
        )
    }
}

impl Row for Receipt {
    fn row(&self, _today: NaiveDate) -> String {
        format!(
            "{:>6}  invoice {:<6} {:>14}  {}  {}",
            id(self.id),
            self.invoice,
            format_amount(&self.amount),
            date(self.received_on),
            format_optional(&self.method, "")
        )
    }
}

impl Row for LedgerEntry {
    fn row(&self, _today: NaiveDate) -> String {
        format!(
            "{:>6}  {}  {:<width$}  {:>12}  {:>12}  {:>12}",
            id(self.id),
            self.entry_date,
            truncate_string(&self.description, TITLE_WIDTH),
            amount(&self.debit),
            amount(&self.credit),
            amount(&self.balance),
            width = TITLE_WIDTH
        )
    }
}

impl Row for Document {
    fn row(&self, _today: NaiveDate) -> String {
        format!(
            "{:>6}  {:<width$}  {:>10}  {}",
            id(self.id),
            truncate_string(&self.title, TITLE_WIDTH),
            self.size_display(),
            format_optional(&self.content_type, "-"),
            width = TITLE_WIDTH
        )
    }
}
