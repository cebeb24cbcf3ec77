use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::fmt::fixed2;
use crate::models::{DiotRecord, PendingVendor};

pub const DIOT_HEADER: [&str; 8] = [
    "RFC",
    "Nombre",
    "Base16",
    "IVA16",
    "Base0",
    "BaseExento",
    "TipoTercero",
    "TipoOperacion",
];

pub const PENDING_HEADER: [&str; 3] = ["ProveedorDetectado", "TotalPeriodo", "RFC"];

pub fn write_diot<W: Write>(out: W, records: &[DiotRecord]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(DIOT_HEADER)?;
    for r in records {
        wtr.write_record([
            r.rfc.as_str(),
            r.name.as_str(),
            fixed2(r.base16).as_str(),
            fixed2(r.vat16).as_str(),
            fixed2(r.base0).as_str(),
            fixed2(r.exempt).as_str(),
            r.third_party_type.as_str(),
            r.operation_type.as_str(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

/// Pending vendors in the given order, with the RFC column left blank for
/// manual completion.
pub fn write_pending<W: Write>(out: W, pending: &[&PendingVendor]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(PENDING_HEADER)?;
    for p in pending {
        wtr.write_record([p.name.as_str(), fixed2(p.amount).as_str(), ""])?;
    }
    wtr.flush()?;
    Ok(())
}

fn create(path: &Path) -> Result<File> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)?;
    }
    Ok(File::create(path)?)
}

pub fn export_diot(path: &Path, records: &[DiotRecord]) -> Result<()> {
    write_diot(create(path)?, records)
}

pub fn export_pending(path: &Path, pending: &[&PendingVendor]) -> Result<()> {
    write_pending(create(path)?, pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(rfc: &str, name: &str) -> DiotRecord {
        DiotRecord {
            rfc: rfc.into(),
            name: name.into(),
            base16: 1000.0,
            vat16: 160.0,
            base0: 0.0,
            exempt: -0.0,
            third_party_type: "04".into(),
            operation_type: "85".into(),
        }
    }

    #[test]
    fn test_write_diot() {
        let mut buf = Vec::new();
        write_diot(&mut buf, &[record("ACME123456AB1", "Compra, papel")]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "RFC,Nombre,Base16,IVA16,Base0,BaseExento,TipoTercero,TipoOperacion");
        assert_eq!(lines[1], "ACME123456AB1,\"Compra, papel\",1000.00,160.00,0.00,0.00,04,85");
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_write_pending_blank_rfc() {
        let a = PendingVendor {
            key: "tienda".into(),
            name: "Tienda".into(),
            amount: 174.0,
        };
        let mut buf = Vec::new();
        write_pending(&mut buf, &[&a]).unwrap();
        let text = String::from_utf8(buf).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines, vec!["ProveedorDetectado,TotalPeriodo,RFC", "Tienda,174.00,"]);
    }

    #[test]
    fn test_export_creates_parent_dirs() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("exports").join("DIOT_2024-03.csv");
        export_diot(&path, &[]).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("RFC,Nombre"));
    }

    #[test]
    fn test_export_unwritable_destination_fails() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        std::fs::write(&blocker, "x").unwrap();
        assert!(export_pending(&blocker.join("pendientes.csv"), &[]).is_err());
    }
}
