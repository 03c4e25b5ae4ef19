// CSV decoding and schema projection for the feeds and the population file
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use csv::StringRecord;
use std::collections::HashMap;
use std::path::Path;

use crate::domain::dataset::{Dataset, Granularity, TimeSeriesRecord};
use crate::domain::population::PopulationTable;
use crate::error::BuildError;
use crate::infrastructure::config::FeedSchema;

const POPULATION_NAME_COLUMN: &str = "Territorio";
const POPULATION_VALUE_COLUMN: &str = "Popolazione";

/// A CSV body split into headers and rows, before any schema is applied
#[derive(Debug, Clone)]
pub struct RawTable {
    headers: StringRecord,
    rows: Vec<StringRecord>,
}

impl RawTable {
    fn header_map(&self) -> HashMap<&str, usize> {
        self.headers
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.trim_start_matches('\u{feff}'), idx))
            .collect()
    }
}

pub fn decode_table(body: &str) -> Result<RawTable, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(body.as_bytes());

    let headers = reader.headers()?.clone();
    let rows = reader.records().collect::<Result<Vec<_>, _>>()?;

    Ok(RawTable { headers, rows })
}

/// Calendar date of a feed timestamp, dropping any time of day
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

/// Empty and non-finite cells are missing
fn parse_number(raw: &str) -> Result<Option<f64>, std::num::ParseFloatError> {
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>().map(|v| v.is_finite().then_some(v))
}

/// Keep exactly the schema's columns, converting dates and numbers.
pub fn project(
    feed: &str,
    raw: &RawTable,
    schema: &FeedSchema,
    granularity: Granularity,
) -> Result<Dataset, BuildError> {
    let header_map = raw.header_map();
    let position = |column: &str| {
        header_map.get(column).copied().ok_or_else(|| BuildError::Schema {
            feed: feed.to_string(),
            column: column.to_string(),
        })
    };

    let date_idx = position(schema.date_column.as_str())?;
    let entity_idx = schema
        .entity_column
        .as_deref()
        .map(|c| position(c))
        .transpose()?;
    let label_idx = schema
        .label_columns
        .iter()
        .map(|c| position(c.as_str()).map(|idx| (c.as_str(), idx)))
        .collect::<Result<Vec<_>, _>>()?;
    let numeric_idx = schema
        .numeric_columns
        .iter()
        .map(|c| position(c.as_str()).map(|idx| (c.as_str(), idx)))
        .collect::<Result<Vec<_>, _>>()?;

    let mut records = Vec::with_capacity(raw.rows.len());
    for (row_idx, row) in raw.rows.iter().enumerate() {
        // Header is line 1
        let line = row
            .position()
            .map(|p| p.line())
            .unwrap_or(row_idx as u64 + 2);

        let raw_date = row.get(date_idx).unwrap_or_default();
        let date = parse_date(raw_date).ok_or_else(|| BuildError::InvalidDate {
            feed: feed.to_string(),
            line,
            value: raw_date.to_string(),
        })?;

        let entity = entity_idx.map(|idx| row.get(idx).unwrap_or_default().to_string());
        let mut record = TimeSeriesRecord::new(date, entity);

        for (column, idx) in &label_idx {
            let value = row.get(*idx).unwrap_or_default();
            record.labels.insert(column.to_string(), value.to_string());
        }

        for (column, idx) in &numeric_idx {
            let cell = row.get(*idx).unwrap_or_default();
            let value = parse_number(cell).map_err(|_| BuildError::InvalidCell {
                feed: feed.to_string(),
                line,
                column: column.to_string(),
                value: cell.to_string(),
            })?;
            record.set_value(column, value);
        }

        records.push(record);
    }

    Ok(Dataset::new(granularity, records))
}

/// Read the `Territorio`/`Popolazione` reference table
pub fn read_population(path: &Path) -> Result<PopulationTable, BuildError> {
    let failure = |reason: String| BuildError::Population {
        path: path.to_path_buf(),
        reason,
    };

    let body = std::fs::read_to_string(path).map_err(|e| failure(e.to_string()))?;
    let raw = decode_table(&body).map_err(|e| failure(e.to_string()))?;
    let header_map = raw.header_map();

    let name_idx = *header_map
        .get(POPULATION_NAME_COLUMN)
        .ok_or_else(|| failure(format!("missing column '{}'", POPULATION_NAME_COLUMN)))?;
    let value_idx = *header_map
        .get(POPULATION_VALUE_COLUMN)
        .ok_or_else(|| failure(format!("missing column '{}'", POPULATION_VALUE_COLUMN)))?;

    let mut table = PopulationTable::new();
    for row in &raw.rows {
        let name = row.get(name_idx).unwrap_or_default();
        let value = row.get(value_idx).unwrap_or_default();
        match parse_number(value) {
            Ok(Some(v)) if v >= 0.0 => table.insert(name, v.round() as u64),
            _ => {
                tracing::warn!("Skipping population entry '{}' with value '{}'", name, value);
            }
        }
    }

    if table.is_empty() {
        return Err(failure("no usable population rows".to_string()));
    }

    Ok(table)
}
