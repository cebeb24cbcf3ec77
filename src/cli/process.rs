use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, CellAlignment, Table};

use crate::aggregator::{process_file, PendingReview, ProcessOptions, RunOutput};
use crate::catalog::Catalog;
use crate::cli::{resolve_catalog_path, ProcessArgs};
use crate::error::Result;
use crate::exporter::{export_diot, export_pending};
use crate::fmt::money;
use crate::settings::load_settings;

fn amount_cell(val: f64) -> Cell {
    Cell::new(money(val)).set_alignment(CellAlignment::Right)
}

fn print_records(out: &RunOutput) {
    if out.records.is_empty() {
        println!("No identified vendors for this period.");
        return;
    }
    let mut table = Table::new();
    table.set_header(vec![
        "RFC", "Nombre", "Base16", "IVA16", "Base0", "Exento", "Tercero", "Operacion",
    ]);
    for r in &out.records {
        table.add_row(vec![
            Cell::new(&r.rfc),
            Cell::new(&r.name),
            amount_cell(r.base16),
            amount_cell(r.vat16),
            amount_cell(r.base0),
            amount_cell(r.exempt),
            Cell::new(&r.third_party_type),
            Cell::new(&r.operation_type),
        ]);
    }
    let t = &out.totals;
    table.add_row(vec![
        Cell::new("Total".bold()),
        Cell::new(""),
        amount_cell(t.base16),
        amount_cell(t.vat16),
        amount_cell(t.base0),
        amount_cell(t.exempt),
        Cell::new(""),
        Cell::new(""),
    ]);
    println!("DIOT\n{table}");
}

fn print_counts(out: &RunOutput) {
    let s = &out.stats;
    println!(
        "{} {} of {} rows included",
        "Egresos:".bold(),
        s.included.to_string().green(),
        s.rows_read
    );
    if s.non_expense + s.cancelled + s.out_of_period > 0 {
        println!(
            "  skipped: {} not expenses, {} cancelled, {} outside period",
            s.non_expense, s.cancelled, s.out_of_period
        );
    }
}

pub fn run(args: ProcessArgs, trace: bool) -> Result<()> {
    let settings = load_settings();
    let catalog_path = resolve_catalog_path(args.catalog.as_deref());
    let catalog = Catalog::load(&catalog_path);
    tracing::info!(path = %catalog_path.display(), entries = catalog.len(), "catalog loaded");

    let options = ProcessOptions {
        period: args.period.clone(),
        debit_mode: args.debit_mode,
        trace,
    };
    let mut report_progress = |rows: usize| eprintln!("  {rows} rows read...");
    let out = process_file(&args.file, &catalog, &options, Some(&mut report_progress))?;

    print_records(&out);
    print_counts(&out);

    let mut review = PendingReview::new(&out.pending);
    for name in &args.dismiss {
        if !review.acknowledge(name) && review.acknowledge_name(name) == 0 {
            eprintln!("{} no pending vendor named '{name}'", "Warning:".yellow());
        }
    }
    let pending = review.visible();
    if !pending.is_empty() {
        let mut table = Table::new();
        table.set_header(vec!["Proveedor detectado", "Total periodo"]);
        for p in &pending {
            table.add_row(vec![Cell::new(&p.name), amount_cell(p.amount)]);
        }
        println!();
        println!(
            "{}\n{table}",
            format!("Pending vendors ({})", pending.len()).yellow().bold()
        );
        println!("Assign an RFC with `diot catalog add <RFC> --alias <NAME>`.");
    }

    let export_dir = settings.export_dir();
    let default_path = |file_name: String| args.export.then(|| export_dir.join(file_name));
    let diot_path: Option<PathBuf> = args
        .output
        .clone()
        .or_else(|| default_path(format!("DIOT_{}.csv", args.period)));
    let pending_path: Option<PathBuf> = args
        .pending_output
        .clone()
        .or_else(|| default_path("pendientes.csv".to_string()));

    if let Some(path) = diot_path {
        export_diot(&path, &out.records)?;
        println!("Wrote {} records to {}", out.records.len(), path.display());
    }
    if let Some(path) = pending_path {
        export_pending(&path, &pending)?;
        println!("Wrote {} pending vendors to {}", pending.len(), path.display());
    }
    Ok(())
}
