// Time series domain models
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Entity level of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Granularity {
    National,
    Regional,
    Provincial,
}

impl Granularity {
    pub const ALL: [Granularity; 3] = [
        Granularity::National,
        Granularity::Regional,
        Granularity::Provincial,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::National => "national",
            Granularity::Regional => "regional",
            Granularity::Provincial => "provincial",
        }
    }

    /// Key used for the feed's cache file
    pub fn source_id(&self) -> &'static str {
        match self {
            Granularity::National => "nazionali",
            Granularity::Regional => "regioni",
            Granularity::Provincial => "province",
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "national" | "nazionali" => Ok(Granularity::National),
            "regional" | "regioni" => Ok(Granularity::Regional),
            "provincial" | "province" => Ok(Granularity::Provincial),
            other => Err(format!("unknown granularity '{}'", other)),
        }
    }
}

/// One row of a feed: a date, an optional entity and its named fields.
/// A `None` value is a missing observation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesRecord {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
    pub values: BTreeMap<String, Option<f64>>,
}

impl TimeSeriesRecord {
    pub fn new(date: NaiveDate, entity: Option<String>) -> Self {
        Self {
            date,
            entity,
            labels: BTreeMap::new(),
            values: BTreeMap::new(),
        }
    }

    #[cfg(test)]
    pub fn with_value(mut self, column: &str, value: Option<f64>) -> Self {
        self.set_value(column, value);
        self
    }

    pub fn value(&self, column: &str) -> Option<f64> {
        self.values.get(column).copied().flatten()
    }

    pub fn set_value(&mut self, column: &str, value: Option<f64>) {
        self.values.insert(column.to_string(), value);
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.values.contains_key(column)
    }
}

/// A named column computed from a dataset, aligned positionally with its records
#[derive(Debug, Clone, PartialEq)]
pub struct DerivedColumn {
    pub name: String,
    pub values: Vec<Option<f64>>,
}

impl DerivedColumn {
    pub fn new(name: impl Into<String>, values: Vec<Option<f64>>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }
}

/// Ordered records of one granularity, kept sorted by (date, entity)
#[derive(Debug, Clone, Serialize)]
pub struct Dataset {
    pub granularity: Granularity,
    records: Vec<TimeSeriesRecord>,
}

impl Dataset {
    pub fn new(granularity: Granularity, mut records: Vec<TimeSeriesRecord>) -> Self {
        records.sort_by(|a, b| a.date.cmp(&b.date).then_with(|| a.entity.cmp(&b.entity)));
        Self {
            granularity,
            records,
        }
    }

    pub fn records(&self) -> &[TimeSeriesRecord] {
        &self.records
    }

    pub fn records_mut(&mut self) -> &mut [TimeSeriesRecord] {
        &mut self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.records.first().map(|r| r.date)
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.records.last().map(|r| r.date)
    }

    /// Values of `column` for every record, in dataset order
    pub fn column(&self, column: &str) -> Vec<Option<f64>> {
        self.records.iter().map(|r| r.value(column)).collect()
    }

    /// Add a derived column as a field of every record.
    /// Columns built from another dataset (length mismatch) are ignored.
    pub fn attach(&mut self, column: DerivedColumn) {
        if column.values.len() != self.records.len() {
            tracing::warn!(
                "Ignoring derived column {} for {} dataset: {} values for {} records",
                column.name,
                self.granularity,
                column.values.len(),
                self.records.len()
            );
            return;
        }

        for (record, value) in self.records.iter_mut().zip(column.values) {
            record.set_value(&column.name, value);
        }
    }

    /// Record indices grouped by entity, each group in chronological order
    pub fn entity_series(&self) -> Vec<Vec<usize>> {
        let mut groups: BTreeMap<Option<&str>, Vec<usize>> = BTreeMap::new();
        for (idx, record) in self.records.iter().enumerate() {
            groups.entry(record.entity.as_deref()).or_default().push(idx);
        }
        groups.into_values().collect()
    }

    /// Number of (date, entity) keys that occur more than once
    pub fn duplicate_keys(&self) -> usize {
        self.records
            .windows(2)
            .filter(|pair| pair[0].date == pair[1].date && pair[0].entity == pair[1].entity)
            .count()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;

    pub fn day(offset: i64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 2, 24).unwrap() + chrono::Duration::days(offset)
    }

    /// National dataset with one column filled from `values`, one record per day
    pub fn national(column: &str, values: &[Option<f64>]) -> Dataset {
        let records = values
            .iter()
            .enumerate()
            .map(|(i, v)| TimeSeriesRecord::new(day(i as i64), None).with_value(column, *v))
            .collect();
        Dataset::new(Granularity::National, records)
    }
}
