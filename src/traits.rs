//! Traits for the billing upstream and note storage

use async_trait::async_trait;

use crate::types::*;

/// Source of customer, contract and invoice data
///
/// Implementations talk to the billing system (HTTP, fixtures, in-memory).
/// Any transport, status or decoding failure must be reported as
/// [`PortalError::UpstreamUnavailable`]; returning an empty list instead
/// would make an unreachable upstream look like a customer with no debt.
#[async_trait]
pub trait BillingSource: Send + Sync {
    /// Look up a customer by id
    async fn find_customer(&self, customer_id: &str) -> PortalResult<Option<Customer>>;

    /// List receivable invoices of a customer, optionally restricted to one contract
    async fn list_invoices(
        &self,
        customer_id: &str,
        contract_id: Option<&str>,
    ) -> PortalResult<Vec<RawInvoice>>;

    /// List contracts of a customer
    async fn list_contracts(&self, customer_id: &str) -> PortalResult<Vec<Contract>>;

    /// Get a single contract by id
    async fn get_contract(&self, contract_id: &str) -> PortalResult<Option<Contract>>;
}

/// Storage abstraction for customer notes
#[async_trait]
pub trait NoteStore: Send + Sync {
    /// Save a note
    async fn save_note(&mut self, note: &Note) -> PortalResult<()>;

    /// List the notes of a customer, newest first
    async fn list_notes(&self, customer_id: &str) -> PortalResult<Vec<Note>>;

    /// Delete a note by id
    async fn delete_note(&mut self, note_id: &uuid::Uuid) -> PortalResult<()>;
}

/// Trait for implementing custom note validation rules
pub trait NoteValidator: Send + Sync {
    /// Validate a note before saving
    fn validate_note(&self, note: &Note) -> PortalResult<()>;
}

/// Default note validator: non-empty text and customer id
pub struct DefaultNoteValidator;

impl NoteValidator for DefaultNoteValidator {
    fn validate_note(&self, note: &Note) -> PortalResult<()> {
        if note.customer_id.trim().is_empty() {
            return Err(PortalError::Validation(
                "Customer ID cannot be empty".to_string(),
            ));
        }

        if note.text.trim().is_empty() {
            return Err(PortalError::Validation(
                "Note text cannot be empty".to_string(),
            ));
        }

        Ok(())
    }
}
