use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use chrono::{Datelike, NaiveDate};

use crate::error::{DiotError, Result};

// ---------------------------------------------------------------------------
// Amounts and dates
// ---------------------------------------------------------------------------

/// Parse a free-form amount. Currency symbols and thousands separators are
/// dropped, `(x)` is negative, and anything unparseable is 0.0.
pub fn parse_amount(raw: &str) -> f64 {
    let s = raw.trim().replace(['$', ','], "");
    let s = match s.strip_prefix('(').and_then(|v| v.strip_suffix(')')) {
        Some(inner) => format!("-{}", inner.trim()),
        None => s,
    };
    s.trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%m/%d/%Y"];

/// Year-month token (`YYYY-MM`) for a date cell. Falls back to the first
/// seven characters when no layout matches, or "" for short input.
pub fn period_of(raw: &str) -> String {
    let s = raw.trim();
    if s.is_empty() {
        return String::new();
    }
    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            // %Y accepts short years; only four-digit years count as a match
            if (1000..=9999).contains(&date.year()) {
                return format!("{:04}-{:02}", date.year(), date.month());
            }
        }
    }
    if s.chars().count() >= 7 {
        s.chars().take(7).collect()
    } else {
        String::new()
    }
}

#[cfg(any(feature = "xlsx", test))]
pub fn excel_serial_to_date(serial: f64) -> String {
    // Excel epoch is 1899-12-30 (accounting for the 1900 leap year bug)
    NaiveDate::from_ymd_opt(1899, 12, 30)
        .zip(chrono::Duration::try_days(serial as i64))
        .and_then(|(base, days)| base.checked_add_signed(days))
        .map(|date| date.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Delimiter sniffing
// ---------------------------------------------------------------------------

const SNIFF_SAMPLE_BYTES: u64 = 4096;
const CANDIDATE_DELIMITERS: &[u8] = b",\t;|";

fn count_unquoted(line: &str, delimiter: char) -> usize {
    let mut quoted = false;
    let mut count = 0;
    for c in line.chars() {
        if c == '"' {
            quoted = !quoted;
        } else if c == delimiter && !quoted {
            count += 1;
        }
    }
    count
}

/// Most frequent non-zero count; ties go to the larger count.
fn modal_count(counts: &[usize]) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize)> = None;
    for &candidate in counts.iter().filter(|&&c| c > 0) {
        let freq = counts.iter().filter(|&&c| c == candidate).count();
        if best.map_or(true, |(count, f)| (freq, candidate) > (f, count)) {
            best = Some((candidate, freq));
        }
    }
    best
}

/// Pick the delimiter among comma, tab, semicolon and pipe whose per-line count
/// is the most consistent across the sample. When no candidate is consistent
/// on at least half the lines, semicolon wins over comma only if it is more
/// frequent.
pub fn sniff_delimiter(sample: &str) -> u8 {
    let mut lines: Vec<&str> = sample.lines().collect();
    // the sample may cut the last line short
    if !sample.ends_with('\n') && lines.len() > 1 {
        lines.pop();
    }
    lines.retain(|l| !l.trim().is_empty());

    let mut best: Option<(u8, usize, usize)> = None;
    for &delimiter in CANDIDATE_DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|l| count_unquoted(l, delimiter as char))
            .collect();
        let Some((mode, freq)) = modal_count(&counts) else {
            continue;
        };
        if freq * 2 < lines.len() {
            continue;
        }
        if best.map_or(true, |(_, f, m)| (freq, mode) > (f, m)) {
            best = Some((delimiter, freq, mode));
        }
    }

    match best {
        Some((delimiter, _, _)) => delimiter,
        None if sample.matches(';').count() > sample.matches(',').count() => b';',
        None => b',',
    }
}

// ---------------------------------------------------------------------------
// Row sources
// ---------------------------------------------------------------------------

pub type Row = Vec<String>;

/// Rows of a source file, read lazily. `delimiter` is `None` for spreadsheets.
pub struct SourceRows {
    pub delimiter: Option<u8>,
    pub rows: Box<dyn Iterator<Item = Row>>,
}

/// Delimited rows with invalid UTF-8 replaced rather than rejected. Records
/// the CSV reader cannot parse are skipped; an I/O error ends the stream.
pub fn csv_rows<R: Read + 'static>(reader: R, delimiter: u8) -> impl Iterator<Item = Row> {
    let rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);
    rdr.into_byte_records()
        .enumerate()
        .map_while(|(i, result)| match result {
            Ok(record) => Some(Some(
                record
                    .iter()
                    .map(|field| String::from_utf8_lossy(field).into_owned())
                    .collect::<Row>(),
            )),
            Err(e) if e.is_io_error() => {
                tracing::warn!(record = i + 1, "stopped reading source: {e}");
                None
            }
            Err(e) => {
                tracing::warn!(record = i + 1, "skipping malformed record: {e}");
                Some(None)
            }
        })
        .flatten()
}

fn is_spreadsheet(file_path: &Path) -> bool {
    file_path.extension().map_or(false, |e| {
        ["xlsx", "xlsm", "xls", "ods"]
            .iter()
            .any(|ext| e.eq_ignore_ascii_case(ext))
    })
}

pub fn open_source(file_path: &Path) -> Result<SourceRows> {
    #[cfg(feature = "xlsx")]
    if is_spreadsheet(file_path) {
        let rows = parse_spreadsheet(file_path)?;
        return Ok(SourceRows {
            delimiter: None,
            rows: Box::new(rows.into_iter()),
        });
    }
    #[cfg(not(feature = "xlsx"))]
    if is_spreadsheet(file_path) {
        tracing::warn!(
            "{} looks like a spreadsheet but xlsx support is disabled; reading as text",
            file_path.display()
        );
    }

    let mut file = File::open(file_path)?;
    let mut sample = Vec::new();
    (&mut file).take(SNIFF_SAMPLE_BYTES).read_to_end(&mut sample)?;
    file.seek(SeekFrom::Start(0))?;
    let delimiter = sniff_delimiter(&String::from_utf8_lossy(&sample));

    Ok(SourceRows {
        delimiter: Some(delimiter),
        rows: Box::new(csv_rows(BufReader::new(file), delimiter)),
    })
}

#[cfg(feature = "xlsx")]
fn cell_text(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::Empty => String::new(),
        Data::String(s) | Data::DateTimeIso(s) => s.clone(),
        Data::Float(f) => f.to_string(),
        Data::Int(i) => i.to_string(),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64()),
        other => other.to_string(),
    }
}

/// Cells of the first worksheet as text rows.
#[cfg(feature = "xlsx")]
fn parse_spreadsheet(file_path: &Path) -> Result<Vec<Row>> {
    use calamine::Reader;

    let mut workbook = calamine::open_workbook_auto(file_path)
        .map_err(|e| DiotError::Spreadsheet(format!("Failed to open {}: {e}", file_path.display())))?;
    let Some(sheet) = workbook.sheet_names().first().cloned() else {
        return Ok(Vec::new());
    };
    let range = workbook
        .worksheet_range(&sheet)
        .map_err(|e| DiotError::Spreadsheet(format!("Failed to read sheet '{sheet}': {e}")))?;
    Ok(range
        .rows()
        .map(|row| row.iter().map(cell_text).collect())
        .collect())
}

// ---------------------------------------------------------------------------
// Header row detection
// ---------------------------------------------------------------------------

const HEADER_SCAN_LIMIT: usize = 50;
const VENDOR_HEADER_TOKENS: &[&str] = &["concepto", "proveedor", "nombre", "nombreproveedor"];
const AMOUNT_HEADER_TOKENS: &[&str] = &[
    "debe", "total", "subtotal", "iva", "haber", "base16", "base 16",
];

pub fn clean_cell(cell: &str) -> &str {
    cell.trim_start_matches('\u{feff}').trim()
}

pub fn is_blank(row: &[String]) -> bool {
    row.iter().all(|c| c.trim().is_empty())
}

fn looks_like_header(row: &[String]) -> bool {
    let cells: Vec<String> = row.iter().map(|c| clean_cell(c).to_lowercase()).collect();
    let has = |tokens: &[&str]| cells.iter().any(|c| tokens.contains(&c.as_str()));
    has(VENDOR_HEADER_TOKENS) && has(AMOUNT_HEADER_TOKENS)
}

/// The header row plus any rows that were buffered after it while scanning.
#[derive(Debug)]
pub struct HeaderScan {
    pub headers: Vec<String>,
    pub buffered: Vec<Row>,
}

/// Scan up to the first 50 rows for one naming both a vendor column and an
/// amount column. Without one, the first non-blank row is the header and the
/// rows read after it are handed back as data.
pub fn locate_header<I: Iterator<Item = Row>>(rows: &mut I) -> Result<HeaderScan> {
    let mut scanned: Vec<Row> = Vec::new();
    for row in rows.by_ref().take(HEADER_SCAN_LIMIT) {
        if looks_like_header(&row) {
            return Ok(HeaderScan {
                headers: row.iter().map(|c| clean_cell(c).to_string()).collect(),
                buffered: Vec::new(),
            });
        }
        scanned.push(row);
    }

    let Some(pos) = scanned.iter().position(|r| !is_blank(r)) else {
        return Err(DiotError::NoHeader);
    };
    let mut rest = scanned.split_off(pos);
    let header_row = rest.remove(0);
    Ok(HeaderScan {
        headers: header_row.iter().map(|c| clean_cell(c).to_string()).collect(),
        buffered: rest,
    })
}
