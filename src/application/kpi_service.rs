// KPI aggregator - Fixed indicators from the two latest national records
use crate::domain::columns;
use crate::domain::dataset::{Dataset, TimeSeriesRecord};
use crate::domain::kpi::{percentage, KpiValue, Kpis};

/// The latest and previous records by date
fn latest_two(dataset: &Dataset) -> (Option<&TimeSeriesRecord>, Option<&TimeSeriesRecord>) {
    let mut by_date: Vec<&TimeSeriesRecord> = dataset.records().iter().collect();
    by_date.sort_by(|a, b| b.date.cmp(&a.date));
    (by_date.first().copied(), by_date.get(1).copied())
}

/// Percentage change of `column` between the previous and the latest record
pub fn compute_delta_percentage(dataset: &Dataset, column: &str) -> KpiValue {
    match latest_two(dataset) {
        (Some(latest), Some(previous)) => {
            let change = latest
                .value(column)
                .zip(previous.value(column))
                .map(|(l, p)| l - p);
            KpiValue::new(percentage(change, previous.value(column)))
        }
        _ => KpiValue::missing(),
    }
}

/// New positives as a percentage of new tests on the latest record
pub fn compute_positivity_rate(dataset: &Dataset) -> KpiValue {
    match latest_two(dataset) {
        (Some(latest), _) => KpiValue::new(percentage(
            latest.value(columns::NEW_POSITIVES),
            latest.value(columns::NEW_TESTS),
        )),
        _ => KpiValue::missing(),
    }
}

pub fn compute_kpis(national: &Dataset) -> Kpis {
    let kpis = Kpis {
        as_of: national.last_date(),
        positives_delta: compute_delta_percentage(national, columns::NEW_POSITIVES),
        deaths_delta: compute_delta_percentage(national, columns::NEW_DEATHS),
        positivity_rate: compute_positivity_rate(national),
    };

    tracing::info!(
        "KPIs as of {:?}: positives delta {:?}%, deaths delta {:?}%, positivity {:?}%",
        kpis.as_of,
        kpis.positives_delta.value(),
        kpis.deaths_delta.value(),
        kpis.positivity_rate.value()
    );

    kpis
}
