//! Core types and data structures for the billing portal

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One invoice record exactly as the billing API returned it.
///
/// Keys are field names, values are loosely typed; nothing about the shape
/// is guaranteed until the record goes through [`crate::normalize_invoice`].
pub type RawInvoice = serde_json::Map<String, serde_json::Value>;

/// Names of the raw record keys the normalizer reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceFields {
    /// Key holding the free-text status label
    pub status: String,
    /// Key holding the amount owed
    pub amount: String,
    /// Key holding the due date (`YYYY-MM-DD`)
    pub due_date: String,
}

impl InvoiceFields {
    /// Key names used by the Navix `fn_areceber` resource
    pub fn navix() -> Self {
        Self {
            status: "status_descricao".to_string(),
            amount: "valor".to_string(),
            due_date: "data_vencimento".to_string(),
        }
    }
}

impl Default for InvoiceFields {
    fn default() -> Self {
        Self {
            status: "status".to_string(),
            amount: "amount".to_string(),
            due_date: "due_date".to_string(),
        }
    }
}

/// Strongly typed invoice produced by the normalizer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Lower-cased status label, empty when the record had none
    pub status: String,
    /// Amount owed, zero when the record's amount could not be read
    pub amount: BigDecimal,
    /// Due date, `None` when absent or malformed
    pub due_date: Option<NaiveDate>,
}

impl Invoice {
    /// Create a new invoice value; the status is lower-cased
    pub fn new(status: &str, amount: BigDecimal, due_date: Option<NaiveDate>) -> Self {
        Self {
            status: status.to_lowercase(),
            amount,
            due_date,
        }
    }

    /// Whether the invoice is past due on `today`.
    ///
    /// An unknown due date is never past due.
    pub fn is_past_due(&self, today: NaiveDate) -> bool {
        self.due_date.is_some_and(|due| due < today)
    }
}

/// Open and overdue totals for one snapshot of invoices
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinancialSummary {
    /// Sum of amounts of open invoices, rounded to 2 decimal places
    pub open_amount: BigDecimal,
    /// Number of open invoices
    pub open_count: usize,
    /// Sum of amounts of open invoices past their due date, rounded to 2 decimal places
    pub overdue_amount: BigDecimal,
    /// Number of open invoices past their due date
    pub overdue_count: usize,
}

impl FinancialSummary {
    /// An all-zero summary
    pub fn empty() -> Self {
        let zero = crate::billing::round_total(&BigDecimal::from(0));
        Self {
            open_amount: zero.clone(),
            open_count: 0,
            overdue_amount: zero,
            overdue_count: 0,
        }
    }

    /// Open amount that is not yet overdue
    pub fn current_amount(&self) -> BigDecimal {
        &self.open_amount - &self.overdue_amount
    }

    /// Whether any open invoice is overdue
    pub fn has_overdue(&self) -> bool {
        self.overdue_count > 0
    }
}

impl Default for FinancialSummary {
    fn default() -> Self {
        Self::empty()
    }
}

/// Customer record from the billing API.
///
/// Only the identifier is interpreted; every other field is kept as returned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Customer {
    /// Build a customer from an upstream record, reading its `id` key
    pub fn from_record(record: serde_json::Map<String, serde_json::Value>) -> Option<Self> {
        let id = record.get("id").and_then(value_as_id)?;
        Some(Self { id, fields: record })
    }

    /// Convenience accessor for a string field
    pub fn field_str(&self, key: &str) -> Option<&str> {
        self.fields.get(key).and_then(|v| v.as_str())
    }
}

/// Contract record from the billing API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: String,
    pub customer_id: Option<String>,
    pub fields: serde_json::Map<String, serde_json::Value>,
}

impl Contract {
    /// Build a contract from an upstream record, reading its `id` and `id_cliente` keys
    pub fn from_record(record: serde_json::Map<String, serde_json::Value>) -> Option<Self> {
        let id = record.get("id").and_then(value_as_id)?;
        let customer_id = record.get("id_cliente").and_then(value_as_id);
        Some(Self {
            id,
            customer_id,
            fields: record,
        })
    }
}

/// Upstream ids arrive as either strings or numbers
fn value_as_id(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        serde_json::Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Free-text note attached to a customer by support staff
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub customer_id: String,
    pub text: String,
    /// Staff member who wrote the note
    pub author: String,
    pub created_at: NaiveDateTime,
}

impl Note {
    /// Create a new note stamped with a fresh id and the current time
    pub fn new(customer_id: String, text: String, author: String) -> Self {
        Self {
            id: Uuid::new_v4(),
            customer_id,
            text,
            author,
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}

/// Everything the portal shows for one customer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOverview {
    pub customer: Customer,
    /// Invoices as fetched, for display next to the summary
    pub invoices: Vec<RawInvoice>,
    pub summary: FinancialSummary,
    /// Notes, newest first
    pub notes: Vec<Note>,
}

/// Errors that can occur in the portal
#[derive(Debug, thiserror::Error)]
pub enum PortalError {
    #[error("Billing upstream unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("Customer not found: {0}")]
    CustomerNotFound(String),
    #[error("Contract not found: {0}")]
    ContractNotFound(String),
    #[error("Note not found: {0}")]
    NoteNotFound(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Result type for portal operations
pub type PortalResult<T> = Result<T, PortalError>;
