use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::catalog::{
    code_label, Catalog, CatalogEntry, CatalogUpdate, Upsert, OPERATION_TYPES, THIRD_PARTY_TYPES,
};
use crate::cli::resolve_catalog_path;
use crate::error::{DiotError, Result};
use crate::vendor::is_rfc_shape;

fn coded(code: &str, codes: &[(&str, &'static str)]) -> String {
    match code_label(codes, code) {
        Some(label) => format!("{code} {label}"),
        None => code.to_string(),
    }
}

fn entry_table(entries: &[&CatalogEntry]) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["RFC", "Nombre legal", "Aliases", "Tercero", "Operacion"]);
    for e in entries {
        let aliases: Vec<&str> = e.aliases.iter().map(String::as_str).collect();
        table.add_row(vec![
            Cell::new(&e.rfc),
            Cell::new(&e.legal_name),
            Cell::new(aliases.join("\n")),
            Cell::new(coded(&e.third_party_type, THIRD_PARTY_TYPES)),
            Cell::new(coded(&e.operation_type, OPERATION_TYPES)),
        ]);
    }
    table
}

pub fn list(catalog: Option<&str>) -> Result<()> {
    let path = resolve_catalog_path(catalog);
    let catalog = Catalog::load(&path);
    if catalog.is_empty() {
        println!("Catalog {} is empty.", path.display());
        return Ok(());
    }
    let entries: Vec<&CatalogEntry> = catalog.entries().iter().collect();
    println!("Catalog ({} vendors)\n{}", catalog.len(), entry_table(&entries));
    Ok(())
}

pub fn add(
    catalog: Option<&str>,
    rfc: &str,
    name: Option<&str>,
    alias: Option<&str>,
    third_party: Option<&str>,
    operation: Option<&str>,
) -> Result<()> {
    let rfc = rfc.trim().to_uppercase();
    if !is_rfc_shape(&rfc) || !(12..=16).contains(&rfc.chars().count()) {
        eprintln!(
            "{} '{rfc}' does not look like an RFC; saving it anyway",
            "Warning:".yellow()
        );
    }

    let path = resolve_catalog_path(catalog);
    let mut catalog = Catalog::load_for_update(&path).map_err(|e| {
        DiotError::Other(format!(
            "catalog {} could not be read ({e}); fix it before adding vendors",
            path.display()
        ))
    })?;
    let outcome = catalog.upsert(CatalogUpdate {
        rfc: &rfc,
        legal_name: name,
        alias,
        third_party_type: third_party,
        operation_type: operation,
    })?;
    catalog.save(&path)?;

    match outcome {
        Upsert::Created => println!("Added {rfc} to {}", path.display()),
        Upsert::Updated => println!("Updated {rfc} in {}", path.display()),
    }
    Ok(())
}

pub fn find(catalog: Option<&str>, name: Option<&str>, rfc: Option<&str>) -> Result<()> {
    if name.is_none() && rfc.is_none() {
        return Err(DiotError::Other("Give --name or --rfc to search for".into()));
    }
    let catalog = Catalog::load(&resolve_catalog_path(catalog));
    match catalog.find(name.unwrap_or(""), rfc.unwrap_or("")) {
        Some(entry) => println!("{}", entry_table(&[entry])),
        None => println!("No catalog match."),
    }
    Ok(())
}
