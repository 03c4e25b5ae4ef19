// Range query result models
use super::dataset::TimeSeriesRecord;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    pub value: Option<f64>,
}

impl SeriesPoint {
    pub fn new(date: NaiveDate, entity: Option<String>, value: Option<f64>) -> Self {
        Self {
            date,
            entity,
            value,
        }
    }
}

/// Slider bounds for a dataset: offsets run from 0 to `delta_t`
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DatasetBounds {
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub delta_t: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilteredResult {
    /// Offsets after clamping
    pub start_offset: i64,
    pub end_offset: i64,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub records: Vec<TimeSeriesRecord>,
    /// Positives as a percentage of tests, recomputed for the retained records
    pub positivity_overlay: Vec<SeriesPoint>,
    /// Already-derived columns restricted to the same range
    pub derived: BTreeMap<String, Vec<SeriesPoint>>,
}

impl FilteredResult {
    pub fn empty() -> Self {
        Self {
            start_offset: 0,
            end_offset: 0,
            start_date: None,
            end_date: None,
            records: Vec::new(),
            positivity_overlay: Vec::new(),
            derived: BTreeMap::new(),
        }
    }
}
