use crate::error::LoadError;
use crate::types::{Month, MonthYear, RawRow, Record, SalesTable, REQUIRED_COLUMNS};
use crate::util::{
    normalize_category, parse_date_safe, parse_f64_safe, parse_time_safe, parse_u32_safe,
};
use chrono::NaiveDate;
use csv::{ReaderBuilder, StringRecord};
use encoding_rs::Encoding;
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Encoding label used when none is configured. `encoding_rs` maps it to
/// windows-1252, a superset of ISO-8859-1.
pub const DEFAULT_ENCODING: &str = "latin1";

#[derive(Debug, Clone)]
pub struct LoadReport {
    pub total_rows: usize,
    pub date_range: Option<(NaiveDate, NaiveDate)>,
    pub months: Vec<Month>,
    pub decode_errors: bool,
}

pub fn resolve_encoding(label: &str) -> Result<&'static Encoding, LoadError> {
    Encoding::for_label(label.trim().as_bytes())
        .ok_or_else(|| LoadError::UnknownEncoding(label.to_string()))
}

pub fn load_path(
    path: impl AsRef<Path>,
    encoding: &'static Encoding,
) -> Result<(SalesTable, LoadReport), LoadError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    info!(path = %path.display(), encoding = encoding.name(), "loading sales file");
    read_table(file, path.to_path_buf(), encoding)
}

/// Same as `load_path` for an in-memory or streamed source.
pub fn load_reader<R: Read>(
    reader: R,
    encoding: &'static Encoding,
) -> Result<(SalesTable, LoadReport), LoadError> {
    read_table(reader, PathBuf::from("<input>"), encoding)
}

fn read_table<R: Read>(
    mut reader: R,
    origin: PathBuf,
    encoding: &'static Encoding,
) -> Result<(SalesTable, LoadReport), LoadError> {
    let mut bytes = Vec::new();
    reader
        .read_to_end(&mut bytes)
        .map_err(|source| LoadError::Io {
            path: origin.clone(),
            source,
        })?;

    // `decode` sniffs a BOM first, so a UTF-8 file with BOM still decodes
    // correctly under the Latin-1 default.
    let (text, used, decode_errors) = encoding.decode(&bytes);
    if decode_errors {
        warn!(
            origin = %origin.display(),
            encoding = used.name(),
            "input contained bytes invalid for the encoding; replaced"
        );
    }

    let mut rdr = ReaderBuilder::new().from_reader(text.as_bytes());
    let headers = rdr.headers()?.clone();
    check_headers(&headers)?;

    let mut records = Vec::new();
    for result in rdr.records() {
        let row = result?;
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let raw: RawRow = row.deserialize(Some(&headers))?;
        records.push(to_record(raw, line)?);
    }

    let table = SalesTable::new(records);
    let months: BTreeSet<Month> = table.records().iter().map(|r| r.month).collect();
    let report = LoadReport {
        total_rows: table.len(),
        date_range: table.date_range(),
        months: months.into_iter().collect(),
        decode_errors,
    };
    info!(rows = report.total_rows, "sales table loaded");
    debug!(date_range = ?report.date_range, months = ?report.months, "load summary");
    Ok((table, report))
}

fn check_headers(headers: &StringRecord) -> Result<(), LoadError> {
    for required in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == required) {
            return Err(LoadError::MissingColumn(required.to_string()));
        }
    }
    Ok(())
}

fn to_record(row: RawRow, line: u64) -> Result<Record, LoadError> {
    let date = parse_date_safe(row.date.as_deref()).ok_or_else(|| LoadError::InvalidDate {
        line,
        value: row.date.clone().unwrap_or_default(),
    })?;
    let time = parse_time_safe(row.time.as_deref())
        .ok_or_else(|| invalid(line, "Time", row.time.as_deref()))?;

    let unit_price = number(row.unit_price.as_deref(), "Unit price", line)?;
    let quantity = parse_u32_safe(row.quantity.as_deref())
        .ok_or_else(|| invalid(line, "Quantity", row.quantity.as_deref()))?;
    let tax = number(row.tax.as_deref(), "Tax 5%", line)?;
    let total = number(row.total.as_deref(), "Total", line)?;
    let cogs = number(row.cogs.as_deref(), "cogs", line)?;
    let gross_income = number(row.gross_income.as_deref(), "gross income", line)?;
    let rating = number(row.rating.as_deref(), "Rating", line)?;

    if tax < 0.0 {
        return Err(invalid(line, "Tax 5%", row.tax.as_deref()));
    }
    if !(0.0..=10.0).contains(&rating) {
        return Err(invalid(line, "Rating", row.rating.as_deref()));
    }

    Ok(Record {
        branch: normalize_category(row.branch),
        city: normalize_category(row.city),
        customer_type: normalize_category(row.customer_type),
        gender: normalize_category(row.gender),
        product_line: normalize_category(row.product_line),
        payment: normalize_category(row.payment),
        date,
        time,
        unit_price,
        quantity,
        tax,
        total,
        cogs,
        gross_income,
        rating,
        month: Month::of(date),
        period: MonthYear::of(date),
    })
}

fn number(value: Option<&str>, column: &'static str, line: u64) -> Result<f64, LoadError> {
    parse_f64_safe(value).ok_or_else(|| invalid(line, column, value))
}

fn invalid(line: u64, column: &'static str, value: Option<&str>) -> LoadError {
    LoadError::InvalidField {
        line,
        column,
        value: value.unwrap_or_default().to_string(),
    }
}
