//! In-memory billing source and note store for testing

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

use crate::traits::*;
use crate::types::*;

fn poisoned<T>(_: PoisonError<T>) -> PortalError {
    PortalError::Storage("in-memory lock poisoned".to_string())
}

/// Numeric order for numeric ids, as the billing API sorts them
fn compare_ids(a: &str, b: &str) -> std::cmp::Ordering {
    match (a.parse::<u64>(), b.parse::<u64>()) {
        (Ok(a), Ok(b)) => a.cmp(&b),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    }
}

/// In-memory billing source for testing and development
///
/// Clones share the same data, so a test can keep a handle to seed records
/// or toggle an outage after handing the source to a portal.
#[derive(Debug, Clone, Default)]
pub struct MemoryBillingSource {
    customers: Arc<RwLock<HashMap<String, Customer>>>,
    contracts: Arc<RwLock<HashMap<String, Contract>>>,
    /// Invoices keyed by customer id, each tagged with its contract id
    invoices: Arc<RwLock<HashMap<String, Vec<(Option<String>, RawInvoice)>>>>,
    unavailable: Arc<AtomicBool>,
}

impl MemoryBillingSource {
    /// Create an empty billing source
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a customer
    pub fn insert_customer(&self, customer: Customer) -> PortalResult<()> {
        self.customers
            .write()
            .map_err(poisoned)?
            .insert(customer.id.clone(), customer);
        Ok(())
    }

    /// Add or replace a contract
    pub fn insert_contract(&self, contract: Contract) -> PortalResult<()> {
        self.contracts
            .write()
            .map_err(poisoned)?
            .insert(contract.id.clone(), contract);
        Ok(())
    }

    /// Append an invoice for a customer, optionally bound to a contract
    pub fn insert_invoice(
        &self,
        customer_id: &str,
        contract_id: Option<&str>,
        invoice: RawInvoice,
    ) -> PortalResult<()> {
        self.invoices
            .write()
            .map_err(poisoned)?
            .entry(customer_id.to_string())
            .or_default()
            .push((contract_id.map(str::to_string), invoice));
        Ok(())
    }

    /// Simulate the upstream going down (or coming back)
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> PortalResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(PortalError::UpstreamUnavailable(
                "in-memory billing source switched off".to_string(),
            ))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl BillingSource for MemoryBillingSource {
    async fn find_customer(&self, customer_id: &str) -> PortalResult<Option<Customer>> {
        self.check_available()?;
        Ok(self.customers.read().map_err(poisoned)?.get(customer_id).cloned())
    }

    async fn list_invoices(
        &self,
        customer_id: &str,
        contract_id: Option<&str>,
    ) -> PortalResult<Vec<RawInvoice>> {
        self.check_available()?;
        let invoices = self.invoices.read().map_err(poisoned)?;
        Ok(invoices
            .get(customer_id)
            .map(|entries| {
                entries
                    .iter()
                    .filter(|(contract, _)| {
                        contract_id.is_none_or(|wanted| contract.as_deref() == Some(wanted))
                    })
                    .map(|(_, invoice)| invoice.clone())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_contracts(&self, customer_id: &str) -> PortalResult<Vec<Contract>> {
        self.check_available()?;
        let mut contracts: Vec<Contract> = self
            .contracts
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|c| c.customer_id.as_deref() == Some(customer_id))
            .cloned()
            .collect();
        contracts.sort_by(|a, b| compare_ids(&a.id, &b.id));
        Ok(contracts)
    }

    async fn get_contract(&self, contract_id: &str) -> PortalResult<Option<Contract>> {
        self.check_available()?;
        Ok(self.contracts.read().map_err(poisoned)?.get(contract_id).cloned())
    }
}

/// In-memory note store for testing and development
#[derive(Debug, Clone, Default)]
pub struct MemoryNoteStore {
    notes: Arc<RwLock<HashMap<Uuid, Note>>>,
}

impl MemoryNoteStore {
    /// Create an empty note store
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear all notes (useful for testing)
    pub fn clear(&self) -> PortalResult<()> {
        self.notes.write().map_err(poisoned)?.clear();
        Ok(())
    }
}

#[async_trait]
impl NoteStore for MemoryNoteStore {
    async fn save_note(&mut self, note: &Note) -> PortalResult<()> {
        self.notes
            .write()
            .map_err(poisoned)?
            .insert(note.id, note.clone());
        Ok(())
    }

    async fn list_notes(&self, customer_id: &str) -> PortalResult<Vec<Note>> {
        let mut notes: Vec<Note> = self
            .notes
            .read()
            .map_err(poisoned)?
            .values()
            .filter(|note| note.customer_id == customer_id)
            .cloned()
            .collect();
        notes.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(notes)
    }

    async fn delete_note(&mut self, note_id: &Uuid) -> PortalResult<()> {
        if self.notes.write().map_err(poisoned)?.remove(note_id).is_some() {
            Ok(())
        } else {
            Err(PortalError::NoteNotFound(note_id.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> serde_json::Map<String, serde_json::Value> {
        value.as_object().unwrap().clone()
    }

    #[tokio::test]
    async fn test_invoices_filtered_by_contract() {
        let source = MemoryBillingSource::new();
        source
            .insert_invoice("7", Some("100"), record(json!({"valor": "10"})))
            .unwrap();
        source
            .insert_invoice("7", Some("200"), record(json!({"valor": "20"})))
            .unwrap();
        source.insert_invoice("7", None, record(json!({"valor": "30"}))).unwrap();

        assert_eq!(source.list_invoices("7", None).await.unwrap().len(), 3);
        let only_100 = source.list_invoices("7", Some("100")).await.unwrap();
        assert_eq!(only_100.len(), 1);
        assert_eq!(only_100[0]["valor"], json!("10"));
        assert!(source.list_invoices("8", None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_contracts_sorted_by_numeric_id() {
        let source = MemoryBillingSource::new();
        for id in ["100", "55", "9", "ext-1"] {
            let contract = Contract::from_record(record(json!({"id": id, "id_cliente": "7"})));
            source.insert_contract(contract.unwrap()).unwrap();
        }

        let contracts = source.list_contracts("7").await.unwrap();
        let ids: Vec<&str> = contracts.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["9", "55", "100", "ext-1"]);
    }

    #[tokio::test]
    async fn test_outage_is_reported() {
        let source = MemoryBillingSource::new();
        source.set_unavailable(true);

        let err = source.list_invoices("7", None).await.unwrap_err();
        assert!(matches!(err, PortalError::UpstreamUnavailable(_)));

        source.set_unavailable(false);
        assert!(source.find_customer("7").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_notes_newest_first_and_delete() {
        let mut store = MemoryNoteStore::new();
        let mut older = Note::new("7".to_string(), "first".to_string(), "ana".to_string());
        older.created_at -= chrono::Duration::minutes(5);
        let newer = Note::new("7".to_string(), "second".to_string(), "ana".to_string());
        let other = Note::new("8".to_string(), "other".to_string(), "ana".to_string());

        store.save_note(&older).await.unwrap();
        store.save_note(&newer).await.unwrap();
        store.save_note(&other).await.unwrap();

        let notes = store.list_notes("7").await.unwrap();
        let texts: Vec<&str> = notes.iter().map(|n| n.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);

        store.delete_note(&older.id).await.unwrap();
        assert_eq!(store.list_notes("7").await.unwrap().len(), 1);
        assert!(matches!(
            store.delete_note(&older.id).await,
            Err(PortalError::NoteNotFound(_))
        ));
    }
}
