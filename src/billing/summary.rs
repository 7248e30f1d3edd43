//! Open/overdue aggregation over normalized invoices

use bigdecimal::{BigDecimal, RoundingMode};
use chrono::NaiveDate;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::billing::normalize::normalize_invoices;
use crate::types::*;

/// Decimal places kept in summary totals
pub const SUMMARY_SCALE: i64 = 2;

/// Rounding applied to summary totals, once, after accumulation
pub const SUMMARY_ROUNDING: RoundingMode = RoundingMode::HalfEven;

/// Status labels that count an invoice as open.
///
/// Labels are stored lower-case; normalized statuses are already lower-case,
/// so membership is a plain lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusVocabulary {
    labels: BTreeSet<String>,
}

impl StatusVocabulary {
    /// Build a vocabulary from arbitrary labels
    pub fn new<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            labels: labels
                .into_iter()
                .map(|l| l.as_ref().to_lowercase())
                .collect(),
        }
    }

    /// Add another open label
    pub fn with_label(mut self, label: &str) -> Self {
        self.labels.insert(label.to_lowercase());
        self
    }

    /// Whether a normalized status counts as open
    pub fn is_open(&self, status: &str) -> bool {
        self.labels.contains(status)
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }
}

impl Default for StatusVocabulary {
    /// `aberto` (open) and `atrasado` (late), as labelled by the billing API
    fn default() -> Self {
        Self::new(["aberto", "atrasado"])
    }
}

/// Fold normalized invoices into a summary evaluated on `today`.
///
/// Pure and infallible: the same invoices and date always give the same
/// summary, and an empty slice gives [`FinancialSummary::empty`].
pub fn summarize(
    invoices: &[Invoice],
    today: NaiveDate,
    vocabulary: &StatusVocabulary,
) -> FinancialSummary {
    let zero = BigDecimal::from(0);
    let (open_amount, open_count, overdue_amount, overdue_count) = invoices
        .iter()
        .filter(|invoice| vocabulary.is_open(&invoice.status))
        .fold(
            (zero.clone(), 0usize, zero, 0usize),
            |(open_amount, open_count, overdue_amount, overdue_count), invoice| {
                if invoice.is_past_due(today) {
                    (
                        open_amount + &invoice.amount,
                        open_count + 1,
                        overdue_amount + &invoice.amount,
                        overdue_count + 1,
                    )
                } else {
                    (
                        open_amount + &invoice.amount,
                        open_count + 1,
                        overdue_amount,
                        overdue_count,
                    )
                }
            },
        );

    let summary = FinancialSummary {
        open_amount: round_total(&open_amount),
        open_count,
        overdue_amount: round_total(&overdue_amount),
        overdue_count,
    };

    debug!(
        "summarized {} invoices as of {}: {} open ({}), {} overdue ({})",
        invoices.len(),
        today,
        summary.open_count,
        summary.open_amount,
        summary.overdue_count,
        summary.overdue_amount
    );

    summary
}

/// Round a total to [`SUMMARY_SCALE`] places with [`SUMMARY_ROUNDING`]
pub fn round_total(amount: &BigDecimal) -> BigDecimal {
    amount.with_scale_round(SUMMARY_SCALE, SUMMARY_ROUNDING)
}

impl FinancialSummary {
    /// Normalize raw records and summarize them as of `today`
    pub fn evaluate(
        raws: &[RawInvoice],
        fields: &InvoiceFields,
        vocabulary: &StatusVocabulary,
        today: NaiveDate,
    ) -> Self {
        summarize(&normalize_invoices(raws, fields), today, vocabulary)
    }

    /// Same as [`FinancialSummary::evaluate`] with today's local date
    pub fn evaluate_now(
        raws: &[RawInvoice],
        fields: &InvoiceFields,
        vocabulary: &StatusVocabulary,
    ) -> Self {
        Self::evaluate(raws, fields, vocabulary, chrono::Local::now().date_naive())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::str::FromStr;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn open(amount: &str, due: Option<NaiveDate>) -> Invoice {
        Invoice::new("aberto", dec(amount), due)
    }

    #[test]
    fn test_empty_input_is_all_zero() {
        let summary = summarize(&[], date(2024, 6, 1), &StatusVocabulary::default());
        assert_eq!(summary, FinancialSummary::empty());
    }

    #[test]
    fn test_reference_scenario() {
        let raws: Vec<RawInvoice> = [
            json!({"status": "Aberto", "amount": "150.5", "due_date": "2024-01-01"}),
            json!({"status": "Atrasado", "amount": 100, "due_date": "2023-01-01"}),
            json!({"status": "Pago", "amount": 50, "due_date": "2022-01-01"}),
        ]
        .iter()
        .map(|v| v.as_object().unwrap().clone())
        .collect();

        let summary = FinancialSummary::evaluate(
            &raws,
            &InvoiceFields::default(),
            &StatusVocabulary::default(),
            date(2024, 6, 1),
        );

        assert_eq!(summary.open_amount, dec("250.5"));
        assert_eq!(summary.open_count, 2);
        assert_eq!(summary.overdue_amount, dec("250.5"));
        assert_eq!(summary.overdue_count, 2);
    }

    #[test]
    fn test_due_today_is_not_overdue() {
        let today = date(2024, 6, 1);
        let invoices = vec![
            open("10", Some(today)),
            open("20", Some(date(2024, 5, 31))),
        ];

        let summary = summarize(&invoices, today, &StatusVocabulary::default());

        assert_eq!(summary.open_count, 2);
        assert_eq!(summary.open_amount, dec("30"));
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.overdue_amount, dec("20"));
    }

    #[test]
    fn test_unknown_due_date_is_open_only() {
        let summary = summarize(
            &[open("75", None)],
            date(2024, 6, 1),
            &StatusVocabulary::default(),
        );

        assert_eq!(summary.open_count, 1);
        assert_eq!(summary.open_amount, dec("75"));
        assert_eq!(summary.overdue_count, 0);
        assert_eq!(summary.overdue_amount, dec("0"));
    }

    #[test]
    fn test_zero_amount_still_counts() {
        let summary = summarize(
            &[open("0", Some(date(2020, 1, 1)))],
            date(2024, 6, 1),
            &StatusVocabulary::default(),
        );
        assert_eq!(summary.open_count, 1);
        assert_eq!(summary.overdue_count, 1);
        assert_eq!(summary.open_amount, dec("0"));
    }

    #[test]
    fn test_rounding_happens_after_accumulation() {
        // Rounding each 0.005 first would give 0.00 or 0.03; the exact sum is 0.015
        let invoices = vec![open("0.005", None), open("0.005", None), open("0.005", None)];
        let summary = summarize(&invoices, date(2024, 6, 1), &StatusVocabulary::default());
        assert_eq!(summary.open_amount, dec("0.02"));
    }

    #[test]
    fn test_rounding_is_half_even() {
        assert_eq!(round_total(&dec("0.125")), dec("0.12"));
        assert_eq!(round_total(&dec("0.135")), dec("0.14"));
        assert_eq!(round_total(&dec("10.004")), dec("10.00"));
    }

    #[test]
    fn test_summarize_is_idempotent() {
        let invoices = vec![
            open("12.345", Some(date(2024, 1, 1))),
            open("7.1", Some(date(2025, 1, 1))),
            Invoice::new("pago", dec("99"), Some(date(2020, 1, 1))),
        ];
        let vocabulary = StatusVocabulary::default();
        let first = summarize(&invoices, date(2024, 6, 1), &vocabulary);
        let second = summarize(&invoices, date(2024, 6, 1), &vocabulary);
        assert_eq!(first, second);
        assert_eq!(first.open_amount.to_string(), second.open_amount.to_string());
    }

    #[test]
    fn test_adding_open_record_never_decreases_totals() {
        let today = date(2024, 6, 1);
        let vocabulary = StatusVocabulary::default();
        let mut invoices = vec![open("40", Some(date(2024, 7, 1)))];
        let before = summarize(&invoices, today, &vocabulary);

        invoices.push(open("0.01", None));
        let after = summarize(&invoices, today, &vocabulary);

        assert!(after.open_count > before.open_count);
        assert!(after.open_amount >= before.open_amount);
        assert!(after.open_count >= after.overdue_count);
    }

    #[test]
    fn test_custom_vocabulary() {
        let vocabulary = StatusVocabulary::default().with_label("Vencido");
        assert!(vocabulary.is_open("vencido"));
        assert!(vocabulary.is_open("aberto"));
        assert!(!vocabulary.is_open("pago"));

        let invoices = vec![Invoice::new("Vencido", dec("5"), Some(date(2024, 1, 1)))];
        let summary = summarize(&invoices, date(2024, 6, 1), &vocabulary);
        assert_eq!(summary.overdue_count, 1);

        let english = StatusVocabulary::new(["open", "overdue"]);
        let summary = summarize(&invoices, date(2024, 6, 1), &english);
        assert_eq!(summary.open_count, 0);
    }
}
