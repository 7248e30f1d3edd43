//! Customer overview walkthrough over the in-memory billing source

use billing_portal_core::{
    utils::{MemoryBillingSource, MemoryNoteStore},
    Customer, CustomerPortal,
};
use serde_json::json;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("📇 Billing Portal Core - Customer Summary\n");

    let billing = MemoryBillingSource::new();
    let customer = json!({"id": "1001", "razao": "Maria Souza"});
    if let Some(customer) = customer.as_object().cloned().and_then(Customer::from_record) {
        billing.insert_customer(customer)?;
    }

    let invoices = [
        json!({"status_descricao": "Aberto", "valor": "150.5", "data_vencimento": "2024-01-01"}),
        json!({"status_descricao": "Atrasado", "valor": 100, "data_vencimento": "2023-01-01"}),
        json!({"status_descricao": "Pago", "valor": 50, "data_vencimento": "2022-01-01"}),
        json!({"status_descricao": "Aberto", "valor": "abc"}),
    ];
    for invoice in invoices.iter().filter_map(|v| v.as_object().cloned()) {
        billing.insert_invoice("1001", None, invoice)?;
    }

    let mut portal = CustomerPortal::new(billing.clone(), MemoryNoteStore::new());
    portal
        .add_note("1001", "suporte", "Cliente solicitou renegociação")
        .await?;

    let today = chrono::Local::now().date_naive();
    let overview = portal.customer_overview("1001", today).await?;

    println!(
        "Customer {} ({})",
        overview.customer.id,
        overview.customer.field_str("razao").unwrap_or("-")
    );
    println!("  Invoices fetched: {}", overview.invoices.len());
    println!(
        "  Open:     {} invoices, {}",
        overview.summary.open_count, overview.summary.open_amount
    );
    println!(
        "  Overdue:  {} invoices, {}",
        overview.summary.overdue_count, overview.summary.overdue_amount
    );
    println!("  Current:  {}", overview.summary.current_amount());
    for note in &overview.notes {
        println!("  📝 [{}] {}: {}", note.created_at, note.author, note.text);
    }
    println!();

    println!("🔌 Simulating an upstream outage:");
    billing.set_unavailable(true);
    match portal.customer_overview("1001", today).await {
        Ok(_) => println!("  unexpected success"),
        Err(e) => println!("  {}", e),
    }

    Ok(())
}
