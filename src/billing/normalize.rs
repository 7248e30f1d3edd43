//! Best-effort conversion of raw invoice records into [`Invoice`] values
//!
//! Every fallback for malformed upstream data lives here. A field that
//! cannot be read degrades to its default (empty status, zero amount,
//! unknown due date) and the rest of the batch is unaffected.

use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use log::debug;
use serde_json::Value;
use std::str::FromStr;

use crate::types::*;

/// Format of due dates in raw records
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Largest number of decimal places accepted in an amount
pub const MAX_AMOUNT_SCALE: i64 = 18;

/// Largest number of significant digits accepted in an amount
pub const MAX_AMOUNT_DIGITS: u64 = 30;

/// Normalize a single raw record. Never fails.
pub fn normalize_invoice(raw: &RawInvoice, fields: &InvoiceFields) -> Invoice {
    Invoice {
        status: parse_status(raw.get(&fields.status)),
        amount: parse_amount(raw.get(&fields.amount)),
        due_date: parse_due_date(raw.get(&fields.due_date)),
    }
}

/// Normalize a batch of raw records, preserving order
pub fn normalize_invoices(raws: &[RawInvoice], fields: &InvoiceFields) -> Vec<Invoice> {
    raws.iter()
        .map(|raw| normalize_invoice(raw, fields))
        .collect()
}

/// Lower-cased status label, or empty
pub fn parse_status(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.to_lowercase(),
        None | Some(Value::Null) => String::new(),
        Some(other) => {
            debug!("ignoring non-text invoice status: {}", other);
            String::new()
        }
    }
}

/// Decimal amount; anything unreadable counts as zero
pub fn parse_amount(value: Option<&Value>) -> BigDecimal {
    let parsed = match value {
        None | Some(Value::Null) => None,
        Some(Value::Number(n)) => BigDecimal::from_str(&n.to_string()).ok(),
        Some(Value::String(s)) => BigDecimal::from_str(s.trim()).ok(),
        Some(_) => None,
    };

    match parsed {
        Some(amount) if within_monetary_range(&amount) => amount,
        Some(amount) => {
            debug!(
                "invoice amount with {} digits at scale {} is out of range, counting as zero",
                amount.digits(),
                amount.as_bigint_and_exponent().1
            );
            BigDecimal::from(0)
        }
        None => {
            if let Some(v) = value {
                debug!("invoice amount {} is not numeric, counting as zero", v);
            }
            BigDecimal::from(0)
        }
    }
}

/// Whether an amount can be summed and rounded at a bounded cost.
///
/// Exponent notation lets a few characters describe a number with millions
/// of digits once aligned to cents.
fn within_monetary_range(amount: &BigDecimal) -> bool {
    let (_, scale) = amount.as_bigint_and_exponent();
    (-MAX_AMOUNT_SCALE..=MAX_AMOUNT_SCALE).contains(&scale)
        && amount.digits() <= MAX_AMOUNT_DIGITS
}

/// Due date in `YYYY-MM-DD`; anything else is unknown
pub fn parse_due_date(value: Option<&Value>) -> Option<NaiveDate> {
    match value {
        Some(Value::String(s)) => match NaiveDate::parse_from_str(s, DUE_DATE_FORMAT) {
            Ok(date) => Some(date),
            Err(e) => {
                debug!("invoice due date {:?} unreadable: {}", s, e);
                None
            }
        },
        None | Some(Value::Null) => None,
        Some(other) => {
            debug!("ignoring non-text invoice due date: {}", other);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn raw(value: serde_json::Value) -> RawInvoice {
        value.as_object().unwrap().clone()
    }

    #[test]
    fn test_normalize_well_formed_record() {
        let invoice = normalize_invoice(
            &raw(json!({"status": "Aberto", "amount": "150.5", "due_date": "2024-01-01"})),
            &InvoiceFields::default(),
        );

        assert_eq!(invoice.status, "aberto");
        assert_eq!(invoice.amount, BigDecimal::from_str("150.5").unwrap());
        assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2024, 1, 1));
    }

    #[test]
    fn test_normalize_uses_navix_keys() {
        let invoice = normalize_invoice(
            &raw(json!({
                "status_descricao": "ATRASADO",
                "valor": 99.9,
                "data_vencimento": "2023-12-31"
            })),
            &InvoiceFields::navix(),
        );

        assert_eq!(invoice.status, "atrasado");
        assert_eq!(invoice.amount, BigDecimal::from_str("99.9").unwrap());
        assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2023, 12, 31));
    }

    #[test]
    fn test_empty_record_degrades_to_defaults() {
        let invoice = normalize_invoice(&RawInvoice::new(), &InvoiceFields::default());

        assert_eq!(invoice.status, "");
        assert_eq!(invoice.amount, BigDecimal::from(0));
        assert_eq!(invoice.due_date, None);
    }

    #[test]
    fn test_amount_fails_open_to_zero() {
        assert_eq!(parse_amount(Some(&json!("abc"))), BigDecimal::from(0));
        assert_eq!(parse_amount(Some(&json!(""))), BigDecimal::from(0));
        assert_eq!(parse_amount(Some(&json!("NaN"))), BigDecimal::from(0));
        assert_eq!(parse_amount(Some(&json!(true))), BigDecimal::from(0));
        assert_eq!(parse_amount(Some(&json!([1, 2]))), BigDecimal::from(0));
        assert_eq!(parse_amount(Some(&json!(null))), BigDecimal::from(0));
        assert_eq!(parse_amount(None), BigDecimal::from(0));
    }

    #[test]
    fn test_amount_accepts_numbers_and_numeric_text() {
        assert_eq!(parse_amount(Some(&json!(100))), BigDecimal::from(100));
        assert_eq!(parse_amount(Some(&json!(" 42 "))), BigDecimal::from(42));
        assert_eq!(parse_amount(Some(&json!("-7.25"))), BigDecimal::from_str("-7.25").unwrap());
        assert_eq!(parse_amount(Some(&json!("1e3"))), BigDecimal::from(1000));
    }

    #[test]
    fn test_extreme_exponents_count_as_zero() {
        assert_eq!(parse_amount(Some(&json!("1e-20000000"))), BigDecimal::from(0));
        assert_eq!(parse_amount(Some(&json!("1e9223372036854775807"))), BigDecimal::from(0));
        assert_eq!(parse_amount(Some(&json!("1e2000000"))), BigDecimal::from(0));
        assert_eq!(parse_amount(Some(&json!(1e300))), BigDecimal::from(0));
        assert_eq!(parse_amount(Some(&json!("9".repeat(40)))), BigDecimal::from(0));
    }

    #[test]
    fn test_ordinary_amounts_stay_in_range() {
        assert_eq!(parse_amount(Some(&json!("1e6"))), BigDecimal::from(1_000_000));
        assert_eq!(
            parse_amount(Some(&json!("0.000000000000000001"))),
            BigDecimal::from_str("0.000000000000000001").unwrap()
        );
        assert_eq!(
            parse_amount(Some(&json!("123456789012.34"))),
            BigDecimal::from_str("123456789012.34").unwrap()
        );
    }

    #[test]
    fn test_due_date_rejects_other_formats() {
        assert_eq!(parse_due_date(Some(&json!("01/02/2024"))), None);
        assert_eq!(parse_due_date(Some(&json!("2024-02-30"))), None);
        assert_eq!(parse_due_date(Some(&json!("2024-02-01 10:00:00"))), None);
        assert_eq!(parse_due_date(Some(&json!(20240201))), None);
        assert_eq!(parse_due_date(Some(&json!("0000-00-00"))), None);
    }

    #[test]
    fn test_non_text_status_is_empty() {
        assert_eq!(parse_status(Some(&json!(3))), "");
        assert_eq!(parse_status(Some(&json!(null))), "");
    }

    #[test]
    fn test_normalize_batch_keeps_order() {
        let raws = vec![
            raw(json!({"status": "Pago"})),
            raw(json!({"status": "Aberto"})),
        ];
        let invoices = normalize_invoices(&raws, &InvoiceFields::default());
        let statuses: Vec<&str> = invoices.iter().map(|i| i.status.as_str()).collect();
        assert_eq!(statuses, vec!["pago", "aberto"]);
    }
}
