use crate::error::{DiotError, Result};
use crate::importer::{clean_cell, parse_amount};
use crate::models::RowRecord;

/// Logical columns an accounting export may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    InvoiceDate,
    PaymentDate,
    Vendor,
    Rfc,
    PaymentMethod,
    MovementType,
    Status,
    Debit,
    Credit,
    Total,
    Subtotal,
    Vat,
    Base16,
    Vat16,
    Base0,
    Exempt,
}

impl Field {
    pub const COUNT: usize = 16;

    pub const ALL: [Field; Field::COUNT] = [
        Field::InvoiceDate,
        Field::PaymentDate,
        Field::Vendor,
        Field::Rfc,
        Field::PaymentMethod,
        Field::MovementType,
        Field::Status,
        Field::Debit,
        Field::Credit,
        Field::Total,
        Field::Subtotal,
        Field::Vat,
        Field::Base16,
        Field::Vat16,
        Field::Base0,
        Field::Exempt,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Self::InvoiceDate => "FechaCFDI",
            Self::PaymentDate => "FechaPago",
            Self::Vendor => "Proveedor",
            Self::Rfc => "RFC",
            Self::PaymentMethod => "Metodo",
            Self::MovementType => "Tipo",
            Self::Status => "Estatus",
            Self::Debit => "Debe",
            Self::Credit => "Haber",
            Self::Total => "Total",
            Self::Subtotal => "SubTotal",
            Self::Vat => "IVA",
            Self::Base16 => "Base16",
            Self::Vat16 => "IVA16",
            Self::Base0 => "Base0",
            Self::Exempt => "Exento",
        }
    }

    /// Accepted header spellings, compared against lowercased header text.
    pub fn synonyms(self) -> &'static [&'static str] {
        match self {
            Self::InvoiceDate => &["fechacfdi", "fecha", "fechafactura", "fecha factura"],
            Self::PaymentDate => &["fechapago", "fecha pago"],
            Self::Vendor => &["proveedor", "nombre", "nombreproveedor", "beneficiario", "concepto"],
            Self::Rfc => &["rfc", "rfc proveedor", "rfcproveedor"],
            Self::PaymentMethod => &["metodopago", "metodo", "forma de pago", "forma_pago"],
            Self::MovementType => &["tipo", "movimiento", "naturaleza"],
            Self::Status => &["estatus", "status", "estado"],
            Self::Debit => &["debe"],
            Self::Credit => &["haber"],
            Self::Total => &["total", "importe", "monto", "total facturado", "total comprobante"],
            Self::Subtotal => &["subtotal", "sub total", "base", "gravado", "importe neto"],
            Self::Vat => &["iva", "impuesto", "impuestos trasladados", "iva 16", "iva16%"],
            Self::Base16 => &["base16", "base16%", "base 16", "gravado 16", "tasa 16", "base 16%"],
            Self::Vat16 => &["iva16", "iva 16", "iva 16%"],
            Self::Base0 => &["base0", "base 0", "tasa0", "tasa 0", "0%"],
            Self::Exempt => &["baseexento", "exento", "exento iva", "no gravado"],
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Column {
    pub header: String,
    pub index: usize,
}

/// Logical field -> source column, built once per file from its header row.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnMap {
    columns: [Option<Column>; Field::COUNT],
}

impl ColumnMap {
    /// Map every field to the first header (left to right) matching one of its
    /// synonyms. Unknown headers are ignored; unmatched fields stay unset.
    pub fn build(headers: &[String]) -> Self {
        let lowered: Vec<String> = headers
            .iter()
            .map(|h| clean_cell(h).to_lowercase())
            .collect();
        let columns = std::array::from_fn(|slot| {
            let synonyms = Field::ALL[slot].synonyms();
            lowered
                .iter()
                .position(|h| synonyms.contains(&h.as_str()))
                .map(|index| Column {
                    header: clean_cell(&headers[index]).to_string(),
                    index,
                })
        });
        Self { columns }
    }

    /// Like [`ColumnMap::build`], but a header without a vendor column is fatal.
    pub fn from_headers(headers: &[String]) -> Result<Self> {
        let map = Self::build(headers);
        if !map.is_mapped(Field::Vendor) {
            return Err(DiotError::MissingVendorColumn(headers.join(", ")));
        }
        Ok(map)
    }

    pub fn column(&self, field: Field) -> Option<&Column> {
        self.columns[field.slot()].as_ref()
    }

    pub fn header(&self, field: Field) -> Option<&str> {
        self.column(field).map(|c| c.header.as_str())
    }

    pub fn is_mapped(&self, field: Field) -> bool {
        self.column(field).is_some()
    }

    pub fn has_date_column(&self) -> bool {
        self.is_mapped(Field::InvoiceDate) || self.is_mapped(Field::PaymentDate)
    }

    /// Raw cell for `field`, or "" when the field is unmapped or the row is short.
    pub fn cell<'r>(&self, row: &'r [String], field: Field) -> &'r str {
        self.column(field)
            .and_then(|c| row.get(c.index))
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn extract(&self, row: &[String]) -> RowRecord {
        let text = |field| self.cell(row, field).to_string();
        let amount = |field| parse_amount(self.cell(row, field));
        RowRecord {
            vendor_raw: self.cell(row, Field::Vendor).trim().to_string(),
            rfc: self.cell(row, Field::Rfc).trim().to_uppercase(),
            movement_type: text(Field::MovementType),
            status: text(Field::Status),
            payment_method: self.cell(row, Field::PaymentMethod).trim().to_uppercase(),
            invoice_date: text(Field::InvoiceDate),
            payment_date: text(Field::PaymentDate),
            debit: amount(Field::Debit),
            credit: amount(Field::Credit),
            total: amount(Field::Total),
            subtotal: amount(Field::Subtotal),
            vat: amount(Field::Vat),
            base16: amount(Field::Base16),
            vat16: amount(Field::Vat16),
            base0: amount(Field::Base0),
            exempt: amount(Field::Exempt),
        }
    }

    /// `(label, header)` pairs in field order, for diagnostics.
    pub fn describe(&self) -> Vec<(&'static str, Option<&str>)> {
        Field::ALL
            .iter()
            .map(|&f| (f.label(), self.header(f)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_field_slots_match_all_order() {
        for (i, f) in Field::ALL.iter().enumerate() {
            assert_eq!(f.slot(), i);
        }
    }

    #[test]
    fn test_synonyms_are_case_insensitive() {
        let map = ColumnMap::build(&headers(&["NOMBRE", "Total Facturado", "IVA", "Fecha Pago"]));
        assert_eq!(map.header(Field::Vendor), Some("NOMBRE"));
        assert_eq!(map.header(Field::Total), Some("Total Facturado"));
        assert_eq!(map.header(Field::Vat), Some("IVA"));
        assert_eq!(map.header(Field::PaymentDate), Some("Fecha Pago"));
        assert_eq!(map.header(Field::InvoiceDate), None);
    }

    #[test]
    fn test_first_matching_header_wins() {
        let map = ColumnMap::build(&headers(&["Importe", "Total", "Concepto", "Proveedor"]));
        assert_eq!(map.column(Field::Total).unwrap().index, 0);
        assert_eq!(map.header(Field::Vendor), Some("Concepto"));
    }

    #[test]
    fn test_duplicate_header_reads_first_column() {
        let map = ColumnMap::build(&headers(&["Proveedor", "Total", "Total"]));
        assert_eq!(map.column(Field::Total).unwrap().index, 1);
        assert_eq!(map.cell(&row(&["ACME", "1", "2"]), Field::Total), "1");
    }

    #[test]
    fn test_shared_synonym_maps_both_fields() {
        let map = ColumnMap::build(&headers(&["Proveedor", "IVA 16"]));
        assert_eq!(map.header(Field::Vat), Some("IVA 16"));
        assert_eq!(map.header(Field::Vat16), Some("IVA 16"));
    }

    #[test]
    fn test_unknown_columns_ignored() {
        let map = ColumnMap::build(&headers(&["Poliza", "Proveedor", "Cuenta"]));
        let mapped: Vec<_> = map.describe().into_iter().filter(|(_, h)| h.is_some()).collect();
        assert_eq!(mapped, vec![("Proveedor", Some("Proveedor"))]);
    }

    #[test]
    fn test_missing_vendor_column_is_fatal() {
        let err = ColumnMap::from_headers(&headers(&["Fecha", "Total"])).unwrap_err();
        assert!(matches!(err, DiotError::MissingVendorColumn(_)));
    }

    #[test]
    fn test_has_date_column() {
        assert!(ColumnMap::build(&headers(&["FechaPago"])).has_date_column());
        assert!(!ColumnMap::build(&headers(&["Proveedor", "Debe"])).has_date_column());
    }

    #[test]
    fn test_extract_row_record() {
        let map = ColumnMap::build(&headers(&[
            "Proveedor", "RFC", "Debe", "Haber", "Metodo", "Fecha", "Estatus",
        ]));
        let rec = map.extract(&row(&[
            "  ACME SA ", "acme123456ab1", "$1,160.00", "", " ppd ", "2024-03-15", "Activo",
        ]));
        assert_eq!(rec.vendor_raw, "ACME SA");
        assert_eq!(rec.rfc, "ACME123456AB1");
        assert_eq!(rec.debit, 1160.0);
        assert_eq!(rec.credit, 0.0);
        assert_eq!(rec.payment_method, "PPD");
        assert_eq!(rec.invoice_date, "2024-03-15");
        assert_eq!(rec.status, "Activo");
        assert_eq!(rec.total, 0.0);
    }

    #[test]
    fn test_extract_short_row_reads_blank() {
        let map = ColumnMap::build(&headers(&["Proveedor", "Debe", "Total"]));
        let rec = map.extract(&row(&["ACME"]));
        assert_eq!(rec.vendor_raw, "ACME");
        assert_eq!(rec.debit, 0.0);
        assert_eq!(rec.total, 0.0);
    }
}
