use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use polars::prelude::*;
use rayon::prelude::*;
use tracing::{debug, info, instrument};

use crate::dataset::{Dataset, Money, RowId};
use crate::domain::GridError;

pub const REQUIRED_COLUMNS: [&str; 4] = ["id", "item", "qty", "price"];

// Largest price whose cent value still fits in a u64
const MAX_PRICE: f64 = (u64::MAX / 100) as f64;

#[derive(Debug)]
enum FileType {
    CSV,
    PARQUET,
    ARROW,
}

fn detect_file_type(path: &Path) -> Result<FileType, GridError> {
    match path
        .extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_uppercase())
        .as_deref()
    {
        Some("CSV") => Ok(FileType::CSV),
        Some("PARQUET") | Some("PQ") => Ok(FileType::PARQUET),
        Some("ARROW") | Some("IPC") | Some("FEATHER") => Ok(FileType::ARROW),
        _ => Err(GridError::UnknownFileType),
    }
}

fn check_file(path: &Path) -> Result<(), GridError> {
    let metadata = fs::metadata(path).map_err(|e| match e.kind() {
        ErrorKind::NotFound => GridError::FileNotFound,
        ErrorKind::PermissionDenied => GridError::PermissionDenied,
        _ => GridError::IoError(e),
    })?;
    if !metadata.is_file() {
        return Err(GridError::loading_failed("Not a file!"));
    }
    Ok(())
}

fn load_csv(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyCsvReader::new(PlPath::Local(path.into()))
        .with_has_header(true)
        .finish()
}

fn load_parquet(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_parquet(PlPath::Local(path.into()), ScanArgsParquet::default())
}

fn load_arrow(path: &Path) -> Result<LazyFrame, PolarsError> {
    LazyFrame::scan_ipc(
        PlPath::Local(path.into()),
        polars::io::ipc::IpcScanOptions,
        UnifiedScanArgs::default(),
    )
}

/// Reads a column as strings, nulls become `None`.
fn load_column(df: &DataFrame, col_name: &str) -> Result<Vec<Option<String>>, PolarsError> {
    let col = df.column(col_name)?.cast(&DataType::String)?;
    let series = col.str()?;
    Ok(series
        .into_iter()
        .map(|value| value.map(|s| s.trim().to_string()))
        .collect())
}

fn parse_cell<T: std::str::FromStr>(
    value: &Option<String>,
    column: &str,
    line: usize,
) -> Result<T, GridError> {
    value
        .as_deref()
        .and_then(|s| s.parse::<T>().ok())
        .ok_or_else(|| {
            GridError::loading_failed(format!(
                "row {line}: column \"{column}\" has invalid value {value:?}"
            ))
        })
}

/// Loads `id, item, qty, price` from a CSV, Parquet or Arrow file. Other columns are ignored.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_dataset(path: PathBuf) -> Result<Dataset, GridError> {
    check_file(&path)?;
    let frame = match detect_file_type(&path)? {
        FileType::CSV => load_csv(&path)?,
        FileType::PARQUET => load_parquet(&path)?,
        FileType::ARROW => load_arrow(&path)?,
    };

    let start_time = Instant::now();
    let df = Arc::new(frame.collect()?);
    let names = df.get_column_names();
    if let Some(missing) = REQUIRED_COLUMNS
        .iter()
        .find(|&&c| !names.iter().any(|n| n.as_str() == c))
    {
        return Err(GridError::loading_failed(format!(
            "missing column \"{missing}\""
        )));
    }

    // Convert the required columns in parallel, one thread per column.
    let columns: Result<Vec<Vec<Option<String>>>, PolarsError> = REQUIRED_COLUMNS
        .par_iter()
        .map(|name| load_column(&df, name))
        .collect();
    let columns = columns?;
    let (ids, items, qtys, prices) = (&columns[0], &columns[1], &columns[2], &columns[3]);

    let mut tuples = Vec::with_capacity(ids.len());
    for line in 0..ids.len() {
        let id: RowId = parse_cell(&ids[line], "id", line + 1)?;
        let qty: u64 = parse_cell(&qtys[line], "qty", line + 1)?;
        let price: f64 = parse_cell(&prices[line], "price", line + 1)?;
        if !(0.0..=MAX_PRICE).contains(&price) {
            return Err(GridError::InvalidRow {
                id,
                reason: format!("price {price} out of range"),
            });
        }
        let item = items[line].clone().unwrap_or_else(|| "∅".to_string());
        debug!("Row {line}: {id} {item} {qty} {price}");
        tuples.push((id, item, qty, Money::from_f64(price)));
    }

    let dataset = Dataset::from_tuples(tuples)?;
    info!(
        "Loading {} rows took {}ms ...",
        dataset.len(),
        start_time.elapsed().as_millis()
    );
    Ok(dataset)
}
