use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;

use crate::error::{DiotError, Result};
use crate::importer::period_of;
use crate::models::RowRecord;

const EXPENSE_TOKENS: &[&str] = &[
    "E",
    "EGRESO",
    "EGRESOS",
    "PAGO",
    "PAGOS",
    "CXP",
    "PROVEEDOR",
    "PROVEEDORES",
    "DR",
];

const CANCELLED_TOKENS: &[&str] = &["cancelado", "cancelada", "canc", "cnl", "anulado", "anulada"];

/// How a bare debit amount is read when a row has neither total nor subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebitMode {
    /// The debit is a VAT-inclusive total.
    Total,
    /// The debit is the VAT amount alone.
    Vat,
}

impl FromStr for DebitMode {
    type Err = DiotError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "total" => Ok(Self::Total),
            "vat" | "iva" => Ok(Self::Vat),
            other => Err(DiotError::Other(format!(
                "Unknown debit mode '{other}': expected 'total' or 'vat'"
            ))),
        }
    }
}

impl fmt::Display for DebitMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Total => write!(f, "total"),
            Self::Vat => write!(f, "vat"),
        }
    }
}

/// A reporting month, always `YYYY-MM`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Period(String);

impl Period {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for Period {
    type Err = DiotError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim();
        let valid = s.len() == 7
            && s.as_bytes()[4] == b'-'
            && NaiveDate::parse_from_str(&format!("{s}-01"), "%Y-%m-%d").is_ok();
        if valid {
            Ok(Self(s.to_string()))
        } else {
            Err(DiotError::InvalidPeriod(s.to_string()))
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

pub fn looks_like_expense(movement_type: &str) -> bool {
    let t = movement_type.trim().to_uppercase();
    EXPENSE_TOKENS.contains(&t.as_str())
}

pub fn is_cancelled(status: &str) -> bool {
    let s = status.trim().to_lowercase();
    CANCELLED_TOKENS.contains(&s.as_str())
}

/// PPD (deferred payment) rows are dated by payment; everything else by invoice.
pub fn governing_date(row: &RowRecord) -> &str {
    if row.payment_method == "PPD" {
        &row.payment_date
    } else {
        &row.invoice_date
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Include,
    NotExpense,
    Cancelled,
    OutOfPeriod,
}

pub struct RowPolicy {
    period: Period,
    has_date_column: bool,
}

impl RowPolicy {
    pub fn new(period: Period, has_date_column: bool) -> Self {
        Self {
            period,
            has_date_column,
        }
    }

    pub fn evaluate(&self, row: &RowRecord) -> Decision {
        let expense_by_debit = row.debit > 0.0 && row.credit == 0.0;
        if !(looks_like_expense(&row.movement_type) || expense_by_debit) {
            return Decision::NotExpense;
        }
        if is_cancelled(&row.status) {
            return Decision::Cancelled;
        }
        if !self.has_date_column {
            // Date-less exports are taken as already filtered to one period.
            return Decision::Include;
        }
        let month = period_of(governing_date(row));
        if month.is_empty() || month == self.period.as_str() {
            Decision::Include
        } else {
            Decision::OutOfPeriod
        }
    }
}

/// Rewrite a row's amounts when only a positive debit carries its value.
pub fn apply_debit_mode(row: &mut RowRecord, mode: DebitMode) {
    if row.total == 0.0 && row.subtotal == 0.0 && row.debit > 0.0 {
        match mode {
            DebitMode::Total => row.total = row.debit,
            DebitMode::Vat => row.vat = row.debit,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn march() -> Period {
        "2024-03".parse().unwrap()
    }

    fn expense(date: &str) -> RowRecord {
        RowRecord {
            vendor_raw: "ACME".into(),
            debit: 100.0,
            invoice_date: date.into(),
            ..Default::default()
        }
    }

    #[test]
    fn test_period_parse() {
        assert_eq!(march().as_str(), "2024-03");
        assert_eq!(" 2024-12 ".parse::<Period>().unwrap().to_string(), "2024-12");
        for bad in ["2024-13", "2024/03", "24-03", "2024-3", "", "march"] {
            assert!(matches!(bad.parse::<Period>(), Err(DiotError::InvalidPeriod(_))), "{bad}");
        }
    }

    #[test]
    fn test_debit_mode_parse() {
        assert_eq!("total".parse::<DebitMode>().unwrap(), DebitMode::Total);
        assert_eq!("VAT".parse::<DebitMode>().unwrap(), DebitMode::Vat);
        assert_eq!("iva".parse::<DebitMode>().unwrap(), DebitMode::Vat);
        assert!("both".parse::<DebitMode>().is_err());
        assert_eq!(DebitMode::Vat.to_string(), "vat");
    }

    #[test]
    fn test_expense_tokens() {
        assert!(looks_like_expense(" egreso "));
        assert!(looks_like_expense("CxP"));
        assert!(looks_like_expense("E"));
        assert!(!looks_like_expense("INGRESO"));
        assert!(!looks_like_expense(""));
    }

    #[test]
    fn test_cancelled_tokens() {
        assert!(is_cancelled("Cancelado"));
        assert!(is_cancelled("  ANULADA "));
        assert!(is_cancelled("cnl"));
        assert!(!is_cancelled("Activo"));
        assert!(!is_cancelled(""));
    }

    #[test]
    fn test_non_expense_excluded() {
        let policy = RowPolicy::new(march(), true);
        let row = RowRecord {
            debit: 100.0,
            credit: 50.0,
            ..Default::default()
        };
        assert_eq!(policy.evaluate(&row), Decision::NotExpense);

        let typed = RowRecord {
            movement_type: "Pago".into(),
            ..Default::default()
        };
        assert_eq!(policy.evaluate(&typed), Decision::Include);
    }

    #[test]
    fn test_cancelled_excluded_even_in_period() {
        let policy = RowPolicy::new(march(), true);
        let mut row = expense("2024-03-15");
        row.status = "Cancelado".into();
        assert_eq!(policy.evaluate(&row), Decision::Cancelled);
    }

    #[test]
    fn test_period_filter() {
        let policy = RowPolicy::new(march(), true);
        assert_eq!(policy.evaluate(&expense("15/03/2024")), Decision::Include);
        assert_eq!(policy.evaluate(&expense("2024-04-01")), Decision::OutOfPeriod);
        assert_eq!(policy.evaluate(&expense("")), Decision::Include);
    }

    #[test]
    fn test_no_date_column_passes() {
        let policy = RowPolicy::new(march(), false);
        assert_eq!(policy.evaluate(&expense("2024-04-01")), Decision::Include);
    }

    #[test]
    fn test_ppd_uses_payment_date() {
        let policy = RowPolicy::new(march(), true);
        let mut row = expense("2024-02-10");
        row.payment_method = "PPD".into();
        row.payment_date = "2024-03-05".into();
        assert_eq!(governing_date(&row), "2024-03-05");
        assert_eq!(policy.evaluate(&row), Decision::Include);

        row.payment_method = "PUE".into();
        assert_eq!(policy.evaluate(&row), Decision::OutOfPeriod);
    }

    #[test]
    fn test_debit_mode_applies_only_without_totals() {
        let mut row = expense("");
        apply_debit_mode(&mut row, DebitMode::Total);
        assert_eq!(row.total, 100.0);

        let mut row = expense("");
        apply_debit_mode(&mut row, DebitMode::Vat);
        assert_eq!(row.vat, 100.0);
        assert_eq!(row.total, 0.0);

        let mut row = expense("");
        row.subtotal = 80.0;
        apply_debit_mode(&mut row, DebitMode::Total);
        assert_eq!(row.total, 0.0);
    }
}
