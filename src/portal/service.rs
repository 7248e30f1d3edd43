//! Portal orchestrator that ties the billing upstream, summaries and notes together

use chrono::NaiveDate;
use log::{info, warn};

use crate::billing::{summarize, normalize_invoices, StatusVocabulary};
use crate::traits::*;
use crate::types::*;
use crate::utils::validation::{validate_note_text, validate_record_id};

/// Customer lookup and annotation service used by the support portal
pub struct CustomerPortal<B: BillingSource, N: NoteStore> {
    billing: B,
    notes: N,
    validator: Box<dyn NoteValidator>,
    fields: InvoiceFields,
    vocabulary: StatusVocabulary,
}

impl<B: BillingSource, N: NoteStore> CustomerPortal<B, N> {
    /// Create a portal reading Navix-shaped invoice records
    pub fn new(billing: B, notes: N) -> Self {
        Self {
            billing,
            notes,
            validator: Box::new(DefaultNoteValidator),
            fields: InvoiceFields::navix(),
            vocabulary: StatusVocabulary::default(),
        }
    }

    /// Create a portal with a custom note validator
    pub fn with_validator(billing: B, notes: N, validator: Box<dyn NoteValidator>) -> Self {
        Self {
            validator,
            ..Self::new(billing, notes)
        }
    }

    /// Read invoice fields under different key names
    pub fn with_fields(mut self, fields: InvoiceFields) -> Self {
        self.fields = fields;
        self
    }

    /// Count a different set of statuses as open
    pub fn with_vocabulary(mut self, vocabulary: StatusVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    pub fn billing(&self) -> &B {
        &self.billing
    }

    pub fn vocabulary(&self) -> &StatusVocabulary {
        &self.vocabulary
    }

    /// Everything shown on the customer page: record, invoices, summary, notes
    pub async fn customer_overview(
        &self,
        customer_id: &str,
        today: NaiveDate,
    ) -> PortalResult<CustomerOverview> {
        let customer_id = customer_id.trim();
        validate_record_id("Customer", customer_id)?;
        info!("loading overview for customer {}", customer_id);

        let customer = self
            .billing
            .find_customer(customer_id)
            .await
            .inspect_err(|e| warn!("customer lookup {} failed: {}", customer_id, e))?
            .ok_or_else(|| PortalError::CustomerNotFound(customer_id.to_string()))?;

        let invoices = self
            .billing
            .list_invoices(customer_id, None)
            .await
            .inspect_err(|e| warn!("invoice fetch for {} failed: {}", customer_id, e))?;

        let summary = summarize(
            &normalize_invoices(&invoices, &self.fields),
            today,
            &self.vocabulary,
        );
        let notes = self.notes.list_notes(customer_id).await?;

        Ok(CustomerOverview {
            customer,
            invoices,
            summary,
            notes,
        })
    }

    /// Summary of the invoices of one contract
    pub async fn contract_summary(
        &self,
        customer_id: &str,
        contract_id: &str,
        today: NaiveDate,
    ) -> PortalResult<FinancialSummary> {
        validate_record_id("Customer", customer_id)?;
        validate_record_id("Contract", contract_id)?;

        let invoices = self
            .billing
            .list_invoices(customer_id.trim(), Some(contract_id.trim()))
            .await
            .inspect_err(|e| warn!("invoice fetch for contract {} failed: {}", contract_id, e))?;

        Ok(summarize(
            &normalize_invoices(&invoices, &self.fields),
            today,
            &self.vocabulary,
        ))
    }

    /// Contracts of a customer
    pub async fn contracts(&self, customer_id: &str) -> PortalResult<Vec<Contract>> {
        validate_record_id("Customer", customer_id)?;
        self.billing.list_contracts(customer_id.trim()).await
    }

    /// A single contract, erroring if it does not exist
    pub async fn contract(&self, contract_id: &str) -> PortalResult<Contract> {
        validate_record_id("Contract", contract_id)?;
        self.billing
            .get_contract(contract_id.trim())
            .await?
            .ok_or_else(|| PortalError::ContractNotFound(contract_id.trim().to_string()))
    }

    /// Attach a note to a customer
    pub async fn add_note(
        &mut self,
        customer_id: &str,
        author: &str,
        text: &str,
    ) -> PortalResult<Note> {
        validate_note_text(text)?;

        let note = Note::new(
            customer_id.trim().to_string(),
            text.trim().to_string(),
            author.trim().to_string(),
        );
        self.validator.validate_note(&note)?;

        self.notes.save_note(&note).await?;
        info!("note {} saved for customer {}", note.id, note.customer_id);
        Ok(note)
    }

    /// Notes of a customer, newest first
    pub async fn notes(&self, customer_id: &str) -> PortalResult<Vec<Note>> {
        self.notes.list_notes(customer_id.trim()).await
    }

    /// Remove a note
    pub async fn delete_note(&mut self, note_id: &uuid::Uuid) -> PortalResult<()> {
        self.notes.delete_note(note_id).await
    }
}
