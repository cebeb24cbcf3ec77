use std::collections::{HashMap, HashSet};
use std::path::Path;

use tracing::{debug, info};

use crate::catalog::{Catalog, DEFAULT_OPERATION_TYPE, DEFAULT_THIRD_PARTY_TYPE};
use crate::error::Result;
use crate::header::ColumnMap;
use crate::importer::{is_blank, locate_header, open_source, Row};
use crate::models::{DiotRecord, PendingVendor, RunStats, Totals};
use crate::policy::{apply_debit_mode, DebitMode, Decision, Period, RowPolicy};
use crate::tax::{complete_vat, round2};
use crate::vendor::{is_rfc_shape, split_vendor};

/// Accumulation key for rows with no catalog match and no known RFC.
/// Never part of the exported records.
pub const UNIDENTIFIED_RFC: &str = "SINRFC";

pub const PROGRESS_INTERVAL: usize = 2500;

#[derive(Debug, Clone)]
pub struct ProcessOptions {
    pub period: Period,
    pub debit_mode: DebitMode,
    /// Log the detected layout and run counts at info level.
    pub trace: bool,
}

#[derive(Debug, Clone, Copy, Default)]
struct Amounts {
    base16: f64,
    vat16: f64,
    base0: f64,
    exempt: f64,
}

#[derive(Debug)]
struct Accumulated {
    name: String,
    amounts: Amounts,
    third_party_type: String,
    operation_type: String,
}

#[derive(Debug, Default)]
struct Accumulator {
    by_rfc: HashMap<String, Accumulated>,
}

impl Accumulator {
    fn add(&mut self, rfc: &str, name: &str, codes: (&str, &str), amounts: Amounts) {
        let entry = self
            .by_rfc
            .entry(rfc.to_string())
            .or_insert_with(|| Accumulated {
                name: name.to_string(),
                amounts: Amounts::default(),
                third_party_type: codes.0.to_string(),
                operation_type: codes.1.to_string(),
            });
        entry.amounts.base16 += amounts.base16;
        entry.amounts.vat16 += amounts.vat16;
        entry.amounts.base0 += amounts.base0;
        entry.amounts.exempt += amounts.exempt;
    }

    fn len(&self) -> usize {
        self.by_rfc.len()
    }

    /// Rounded records sorted by RFC, and the totals of those rounded figures.
    fn finish(self, included_rows: usize) -> (Vec<DiotRecord>, Totals) {
        let mut records: Vec<DiotRecord> = self
            .by_rfc
            .into_iter()
            .filter(|(rfc, _)| rfc != UNIDENTIFIED_RFC)
            .map(|(rfc, acc)| DiotRecord {
                rfc,
                name: acc.name,
                base16: round2(acc.amounts.base16),
                vat16: round2(acc.amounts.vat16),
                base0: round2(acc.amounts.base0),
                exempt: round2(acc.amounts.exempt),
                third_party_type: acc.third_party_type,
                operation_type: acc.operation_type,
            })
            .collect();
        records.sort_by(|a, b| a.rfc.cmp(&b.rfc));

        let mut totals = Totals {
            included_rows,
            ..Default::default()
        };
        for r in &records {
            totals.base16 += r.base16;
            totals.vat16 += r.vat16;
            totals.base0 += r.base0;
            totals.exempt += r.exempt;
        }
        (records, totals)
    }
}

/// Vendors with no catalog entry, keyed by grouping key, in first-seen order.
#[derive(Debug, Clone, Default)]
pub struct PendingVendors {
    items: Vec<PendingVendor>,
    index: HashMap<String, usize>,
}

impl PendingVendors {
    /// Add `amount` under `key`. The first name seen for a key is kept.
    pub fn add(&mut self, key: &str, name: &str, amount: f64) {
        match self.index.get(key) {
            Some(&i) => self.items[i].amount += amount,
            None => {
                self.index.insert(key.to_string(), self.items.len());
                self.items.push(PendingVendor {
                    key: key.to_string(),
                    name: name.to_string(),
                    amount,
                });
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&PendingVendor> {
        self.index.get(key).map(|&i| &self.items[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingVendor> {
        self.items.iter()
    }

    /// Sorted by detected name; equal names keep first-seen order.
    pub fn sorted_by_name(&self) -> Vec<&PendingVendor> {
        let mut sorted: Vec<&PendingVendor> = self.items.iter().collect();
        sorted.sort_by(|a, b| a.name.cmp(&b.name));
        sorted
    }
}

/// Acknowledged pending vendors for one review session. The run's pending
/// list itself is never modified.
pub struct PendingReview<'a> {
    pending: &'a PendingVendors,
    acknowledged: HashSet<String>,
}

impl<'a> PendingReview<'a> {
    pub fn new(pending: &'a PendingVendors) -> Self {
        Self {
            pending,
            acknowledged: HashSet::new(),
        }
    }

    /// Returns false when no pending vendor has this key.
    pub fn acknowledge(&mut self, key: &str) -> bool {
        if self.pending.get(key).is_none() {
            return false;
        }
        self.acknowledged.insert(key.to_string());
        true
    }

    /// Acknowledge every pending vendor whose detected name matches, ignoring
    /// case and surrounding space. Returns how many matched.
    pub fn acknowledge_name(&mut self, name: &str) -> usize {
        let wanted = name.trim().to_lowercase();
        let keys: Vec<String> = self
            .pending
            .iter()
            .filter(|p| p.name.trim().to_lowercase() == wanted)
            .map(|p| p.key.clone())
            .collect();
        let matched = keys.len();
        self.acknowledged.extend(keys);
        matched
    }

    pub fn visible(&self) -> Vec<&'a PendingVendor> {
        self.pending
            .sorted_by_name()
            .into_iter()
            .filter(|p| !self.acknowledged.contains(&p.key))
            .collect()
    }
}

#[derive(Debug)]
pub struct RunOutput {
    pub records: Vec<DiotRecord>,
    pub pending: PendingVendors,
    pub totals: Totals,
    pub stats: RunStats,
}

/// Run the pipeline over raw rows: locate and map the header, filter each row,
/// complete its VAT split, resolve the vendor and accumulate per RFC.
///
/// Fails only when no header row exists or it has no vendor column. `progress`
/// is called with the row number every [`PROGRESS_INTERVAL`] rows.
pub fn process<I>(
    rows: I,
    catalog: &Catalog,
    options: &ProcessOptions,
    mut progress: Option<&mut dyn FnMut(usize)>,
) -> Result<RunOutput>
where
    I: IntoIterator<Item = Row>,
{
    let mut rows = rows.into_iter();
    let scan = locate_header(&mut rows)?;
    let columns = ColumnMap::from_headers(&scan.headers)?;

    if options.trace {
        info!(count = scan.headers.len(), headers = ?scan.headers, "header row");
        for (label, header) in columns.describe() {
            info!("  {label}: {}", header.unwrap_or("-"));
        }
        info!(period = %options.period, debit_mode = %options.debit_mode, "run options");
    }

    let policy = RowPolicy::new(options.period.clone(), columns.has_date_column());
    let mut accumulator = Accumulator::default();
    let mut pending = PendingVendors::default();
    let mut stats = RunStats::default();

    for (i, row) in scan.buffered.into_iter().chain(rows).enumerate() {
        let row_number = i + 1;
        if is_blank(&row) {
            continue;
        }
        stats.rows_read += 1;
        if row_number % PROGRESS_INTERVAL == 0 {
            debug!(rows = row_number, "processing");
            if let Some(callback) = progress.as_deref_mut() {
                callback(row_number);
            }
        }

        let mut record = columns.extract(&row);
        match policy.evaluate(&record) {
            Decision::Include => {}
            Decision::NotExpense => {
                stats.non_expense += 1;
                continue;
            }
            Decision::Cancelled => {
                stats.cancelled += 1;
                continue;
            }
            Decision::OutOfPeriod => {
                stats.out_of_period += 1;
                continue;
            }
        }

        apply_debit_mode(&mut record, options.debit_mode);
        let (base16, vat16) = complete_vat(
            record.base16,
            record.vat16,
            record.total,
            record.subtotal,
            record.vat,
        );
        let amounts = Amounts {
            base16,
            vat16,
            base0: record.base0,
            exempt: record.exempt,
        };

        let identity = split_vendor(&record.vendor_raw);
        let known_rfc = if record.rfc.is_empty() {
            identity.rfc.as_str()
        } else {
            record.rfc.as_str()
        };
        let name = if identity.name.is_empty() {
            record.vendor_raw.as_str()
        } else {
            identity.name.as_str()
        };

        match catalog.find(name, known_rfc) {
            Some(entry) => {
                let legal_name = if entry.legal_name.trim().is_empty() {
                    name
                } else {
                    entry.legal_name.as_str()
                };
                let codes = (
                    non_empty_or(&entry.third_party_type, DEFAULT_THIRD_PARTY_TYPE),
                    non_empty_or(&entry.operation_type, DEFAULT_OPERATION_TYPE),
                );
                accumulator.add(&entry.rfc, legal_name, codes, amounts);
            }
            None => {
                if !identity.key.is_empty() {
                    let amount = if record.total != 0.0 {
                        record.total
                    } else {
                        base16 + vat16
                    };
                    pending.add(&identity.key, name, amount);
                }
                let rfc = if is_rfc_shape(known_rfc) {
                    known_rfc
                } else {
                    UNIDENTIFIED_RFC
                };
                let codes = (DEFAULT_THIRD_PARTY_TYPE, DEFAULT_OPERATION_TYPE);
                accumulator.add(rfc, name, codes, amounts);
            }
        }
        stats.included += 1;
    }

    stats.accumulated_keys = accumulator.len();
    if options.trace {
        info!(
            read = stats.rows_read,
            included = stats.included,
            accumulated = stats.accumulated_keys,
            "scan finished"
        );
    }

    let (records, totals) = accumulator.finish(stats.included);
    Ok(RunOutput {
        records,
        pending,
        totals,
        stats,
    })
}

fn non_empty_or<'a>(value: &'a str, default: &'a str) -> &'a str {
    if value.trim().is_empty() {
        default
    } else {
        value
    }
}

/// [`process`] over a CSV or spreadsheet file.
pub fn process_file(
    path: &Path,
    catalog: &Catalog,
    options: &ProcessOptions,
    progress: Option<&mut dyn FnMut(usize)>,
) -> Result<RunOutput> {
    let source = open_source(path)?;
    if options.trace {
        match source.delimiter {
            Some(d) => info!(file = %path.display(), delimiter = ?(d as char), "reading delimited text"),
            None => info!(file = %path.display(), "reading spreadsheet"),
        }
    }
    process(source.rows, catalog, options, progress)
}
