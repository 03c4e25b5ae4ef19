// Range query engine - Pure range filtering over an immutable dataset
use crate::domain::columns;
use crate::domain::dataset::Dataset;
use crate::domain::kpi::percentage;
use crate::domain::query::{DatasetBounds, FilteredResult, SeriesPoint};
use chrono::Duration;
use std::collections::BTreeMap;

pub fn bounds(dataset: &Dataset) -> Option<DatasetBounds> {
    let first_date = dataset.first_date()?;
    let last_date = dataset.last_date()?;
    Some(DatasetBounds {
        first_date,
        last_date,
        delta_t: (last_date - first_date).num_days(),
    })
}

/// Records between `first_date + start_offset` and `first_date + end_offset`
/// (both inclusive). Offsets are clamped to the dataset's span and swapped
/// if reversed.
pub fn query_range(
    dataset: &Dataset,
    start_offset: i64,
    end_offset: i64,
    pass_through: &[String],
) -> FilteredResult {
    let Some(bounds) = bounds(dataset) else {
        return FilteredResult::empty();
    };

    let mut start = start_offset.clamp(0, bounds.delta_t);
    let mut end = end_offset.clamp(0, bounds.delta_t);
    if start > end {
        std::mem::swap(&mut start, &mut end);
    }

    let start_date = bounds.first_date + Duration::days(start);
    let end_date = bounds.first_date + Duration::days(end);

    let records: Vec<_> = dataset
        .records()
        .iter()
        .filter(|r| r.date >= start_date && r.date <= end_date)
        .cloned()
        .collect();

    let positivity_overlay = records
        .iter()
        .map(|r| {
            SeriesPoint::new(
                r.date,
                r.entity.clone(),
                percentage(r.value(columns::NEW_POSITIVES), r.value(columns::NEW_TESTS)),
            )
        })
        .collect();

    let derived: BTreeMap<String, Vec<SeriesPoint>> = pass_through
        .iter()
        .map(|column| {
            let points = records
                .iter()
                .map(|r| SeriesPoint::new(r.date, r.entity.clone(), r.value(column)))
                .collect();
            (column.clone(), points)
        })
        .collect();

    FilteredResult {
        start_offset: start,
        end_offset: end,
        start_date: Some(start_date),
        end_date: Some(end_date),
        records,
        positivity_overlay,
        derived,
    }
}
