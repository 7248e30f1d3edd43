//! # Billing Portal Core
//!
//! Customer billing overview for a telecom support portal: invoice
//! normalization, open/overdue financial summaries, and customer notes.
//!
//! ## Features
//!
//! - **Invoice normalization**: best-effort parsing of loosely typed upstream records
//! - **Financial summaries**: open and overdue counts and totals as of a given date
//! - **Billing source abstraction**: trait-based upstream, with an in-memory backend
//! - **Navix integration**: HTTP billing source (enable the `navix` feature)
//! - **Customer notes**: free-text annotations behind a storage trait
//!
//! ## Quick Start
//!
//! ```rust
//! use billing_portal_core::{FinancialSummary, InvoiceFields, RawInvoice, StatusVocabulary};
//! use chrono::NaiveDate;
//! use serde_json::json;
//!
//! let raws: Vec<RawInvoice> = vec![
//!     json!({"status": "Aberto", "amount": "150.5", "due_date": "2024-01-01"}),
//!     json!({"status": "Pago", "amount": 50, "due_date": "2022-01-01"}),
//! ]
//! .into_iter()
//! .filter_map(|v| v.as_object().cloned())
//! .collect();
//!
//! let summary = FinancialSummary::evaluate(
//!     &raws,
//!     &InvoiceFields::default(),
//!     &StatusVocabulary::default(),
//!     NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
//! );
//! assert_eq!(summary.open_count, 1);
//! assert_eq!(summary.overdue_count, 1);
//! ```

pub mod billing;
pub mod navix;
pub mod portal;
pub mod traits;
pub mod types;
pub mod utils;

// Re-export commonly used types
pub use billing::*;
pub use portal::*;
pub use traits::*;
pub use types::*;
