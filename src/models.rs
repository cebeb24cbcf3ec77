/// One source row after the header mapper has located its logical fields.
/// Text fields are empty and amounts are 0.0 when the column is unmapped.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowRecord {
    pub vendor_raw: String,
    pub rfc: String,
    pub movement_type: String,
    pub status: String,
    pub payment_method: String,
    pub invoice_date: String,
    pub payment_date: String,
    pub debit: f64,
    pub credit: f64,
    pub total: f64,
    pub subtotal: f64,
    pub vat: f64,
    pub base16: f64,
    pub vat16: f64,
    pub base0: f64,
    pub exempt: f64,
}

/// A finalized line of the DIOT extract, one per RFC.
#[derive(Debug, Clone, PartialEq)]
pub struct DiotRecord {
    pub rfc: String,
    pub name: String,
    pub base16: f64,
    pub vat16: f64,
    pub base0: f64,
    pub exempt: f64,
    pub third_party_type: String,
    pub operation_type: String,
}

/// A vendor seen in the source with no catalog entry.
#[derive(Debug, Clone, PartialEq)]
pub struct PendingVendor {
    pub key: String,
    pub name: String,
    pub amount: f64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Totals {
    pub base16: f64,
    pub vat16: f64,
    pub base0: f64,
    pub exempt: f64,
    pub included_rows: usize,
}

/// Row counters for one run. Exclusions are policy outcomes, not errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunStats {
    pub rows_read: usize,
    pub included: usize,
    pub non_expense: usize,
    pub cancelled: usize,
    pub out_of_period: usize,
    pub accumulated_keys: usize,
}
