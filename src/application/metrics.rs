// Derived metrics engine - Corrections, increments, rolling means and rates
//
// All derived columns are computed per entity over its chronological
// sub-series. A missing input never produces a number: it yields a missing
// output, and an increment taken against a missing predecessor is missing too.
use crate::domain::columns;
use crate::domain::dataset::{Dataset, DerivedColumn};
use crate::infrastructure::config::{CorrectionRule, FeedSpec};

/// Blank out known-bad cells. Returns how many cells were corrected.
pub fn apply_corrections(dataset: &mut Dataset, rules: &[CorrectionRule]) -> usize {
    let granularity = dataset.granularity;
    let mut corrected = 0;

    for rule in rules {
        let mut matched = 0;
        for record in dataset.records_mut() {
            let entity_matches = match &rule.entity {
                Some(entity) => record.entity.as_deref() == Some(entity.as_str()),
                None => true,
            };
            if record.date == rule.date && entity_matches && record.has_column(&rule.column) {
                tracing::info!(
                    "Correcting {} {} on {}: {:?} -> missing",
                    granularity,
                    rule.column,
                    rule.date,
                    record.value(&rule.column)
                );
                record.set_value(&rule.column, None);
                matched += 1;
            }
        }

        if matched == 0 {
            tracing::warn!(
                "Correction for {} {} on {} matched no record",
                granularity,
                rule.column,
                rule.date
            );
        }
        corrected += matched;
    }

    corrected
}

/// Day-over-day difference of a cumulative column. The first record of each
/// entity takes its cumulative value as the increment.
pub fn derive_increments(dataset: &Dataset, source: &str, target: &str) -> DerivedColumn {
    let records = dataset.records();
    let mut values = vec![None; records.len()];

    for series in dataset.entity_series() {
        let mut previous: Option<Option<f64>> = None;
        for idx in series {
            let current = records[idx].value(source);
            values[idx] = match previous {
                None => current,
                Some(prev) => current.zip(prev).map(|(c, p)| c - p),
            };
            previous = Some(current);
        }
    }

    DerivedColumn::new(target, values)
}

/// Trailing mean over `window` records. Records before a full window, and
/// windows containing a missing value, are missing.
pub fn derive_rolling_mean(
    dataset: &Dataset,
    source: &str,
    target: &str,
    window: usize,
) -> DerivedColumn {
    let records = dataset.records();
    let mut values = vec![None; records.len()];

    if window > 0 {
        for series in dataset.entity_series() {
            for pos in (window - 1)..series.len() {
                let sum: Option<f64> = series[pos + 1 - window..=pos]
                    .iter()
                    .map(|&idx| records[idx].value(source))
                    .sum();
                values[series[pos]] = sum.map(|s| s / window as f64);
            }
        }
    }

    DerivedColumn::new(target, values)
}

/// `source / popolazione * per`; missing when the population is missing or zero
pub fn derive_per_capita(dataset: &Dataset, source: &str, target: &str, per: f64) -> DerivedColumn {
    let values = dataset
        .records()
        .iter()
        .map(|record| {
            let population = record.value(columns::POPULATION).filter(|p| *p != 0.0)?;
            record.value(source).map(|v| v / population * per)
        })
        .collect();

    DerivedColumn::new(target, values)
}

/// Apply a feed's corrections, then attach its derived columns in order:
/// increments, rolling means, per-capita rates.
pub fn derive_feed(mut dataset: Dataset, spec: &FeedSpec) -> Dataset {
    apply_corrections(&mut dataset, &spec.corrections);

    for inc in &spec.increments {
        let column = derive_increments(&dataset, &inc.source, &inc.target);
        dataset.attach(column);
    }

    for rolling in &spec.rolling {
        let column = derive_rolling_mean(&dataset, &rolling.source, &rolling.target, rolling.window);
        dataset.attach(column);
    }

    for rate in &spec.per_capita {
        let column = derive_per_capita(&dataset, &rate.source, &rate.target, rate.per);
        dataset.attach(column);
    }

    dataset
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::dataset::test_support::{day, national};
    use crate::domain::dataset::{Granularity, TimeSeriesRecord};
    use crate::infrastructure::config::{feed_specs, test_support::app_config};
    use chrono::NaiveDate;

    fn some(values: &[f64]) -> Vec<Option<f64>> {
        values.iter().copied().map(Some).collect()
    }

    #[test]
    fn test_increments_deaths_scenario() {
        let dataset = national(columns::DEATHS, &some(&[10.0, 10.0, 15.0]));

        let increments = derive_increments(&dataset, columns::DEATHS, columns::NEW_DEATHS);

        assert_eq!(increments.name, columns::NEW_DEATHS);
        assert_eq!(increments.values, some(&[10.0, 0.0, 5.0]));
    }

    #[test]
    fn test_increment_after_missing_is_missing() {
        let dataset = national(columns::TESTS, &[Some(100.0), Some(150.0), None, Some(260.0), Some(300.0)]);

        let increments = derive_increments(&dataset, columns::TESTS, columns::NEW_TESTS);

        assert_eq!(
            increments.values,
            vec![Some(100.0), Some(50.0), None, None, Some(40.0)]
        );
    }

    #[test]
    fn test_increments_are_per_entity() {
        let records = vec![
            TimeSeriesRecord::new(day(0), Some("Lazio".to_string())).with_value(columns::DEATHS, Some(3.0)),
            TimeSeriesRecord::new(day(0), Some("Veneto".to_string())).with_value(columns::DEATHS, Some(100.0)),
            TimeSeriesRecord::new(day(1), Some("Lazio".to_string())).with_value(columns::DEATHS, Some(5.0)),
            TimeSeriesRecord::new(day(1), Some("Veneto".to_string())).with_value(columns::DEATHS, Some(104.0)),
        ];
        let dataset = Dataset::new(Granularity::Regional, records);

        let increments = derive_increments(&dataset, columns::DEATHS, columns::NEW_DEATHS);

        assert_eq!(increments.values, some(&[3.0, 100.0, 2.0, 4.0]));
    }

    #[test]
    fn test_rolling_mean_undefined_when_series_shorter_than_window() {
        let dataset = national(columns::NEW_DEATHS, &some(&[10.0, 0.0, 5.0]));

        let rolling = derive_rolling_mean(&dataset, columns::NEW_DEATHS, columns::DEATHS_ROLLING_MEAN, 7);

        assert_eq!(rolling.values, vec![None, None, None]);
    }

    #[test]
    fn test_rolling_mean_trailing_window() {
        let values = some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
        let dataset = national(columns::NEW_DEATHS, &values);

        let rolling = derive_rolling_mean(&dataset, columns::NEW_DEATHS, columns::DEATHS_ROLLING_MEAN, 7);

        assert_eq!(&rolling.values[..6], &[None; 6]);
        assert_eq!(rolling.values[6], Some(4.0));
        assert_eq!(rolling.values[7], Some(5.0));
        assert_eq!(rolling.values[8], Some(6.0));
    }

    #[test]
    fn test_rolling_mean_missing_inside_window() {
        let mut values = some(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0, 10.0]);
        values[2] = None;
        let dataset = national(columns::NEW_DEATHS, &values);

        let rolling = derive_rolling_mean(&dataset, columns::NEW_DEATHS, columns::DEATHS_ROLLING_MEAN, 7);

        // Windows ending at 6, 7 and 8 contain index 2
        assert_eq!(&rolling.values[6..9], &[None, None, None]);
        assert_eq!(rolling.values[9], Some(7.0));
    }

    #[test]
    fn test_rolling_mean_zero_window_is_missing() {
        let dataset = national(columns::NEW_DEATHS, &some(&[1.0, 2.0]));
        let rolling = derive_rolling_mean(&dataset, columns::NEW_DEATHS, columns::DEATHS_ROLLING_MEAN, 0);
        assert_eq!(rolling.values, vec![None, None]);
    }

    #[test]
    fn test_correction_is_keyed_by_date() {
        let anomaly = NaiveDate::from_ymd_opt(2020, 12, 17).unwrap();
        let records = vec![
            TimeSeriesRecord::new(anomaly, None).with_value(columns::TESTS, Some(24_000_000.0)),
            TimeSeriesRecord::new(anomaly.pred_opt().unwrap(), None)
                .with_value(columns::TESTS, Some(24_500_000.0)),
            TimeSeriesRecord::new(anomaly.succ_opt().unwrap(), None)
                .with_value(columns::TESTS, Some(25_000_000.0)),
        ];
        let mut dataset = Dataset::new(Granularity::National, records);
        let rules = vec![CorrectionRule {
            date: anomaly,
            column: columns::TESTS.to_string(),
            entity: None,
        }];

        assert_eq!(apply_corrections(&mut dataset, &rules), 1);
        assert_eq!(
            dataset.column(columns::TESTS),
            vec![Some(24_500_000.0), None, Some(25_000_000.0)]
        );
    }

    #[test]
    fn test_correction_with_unknown_date_changes_nothing() {
        let mut dataset = national(columns::TESTS, &some(&[1.0, 2.0]));
        let rules = vec![CorrectionRule {
            date: NaiveDate::from_ymd_opt(2021, 1, 1).unwrap(),
            column: columns::TESTS.to_string(),
            entity: None,
        }];

        assert_eq!(apply_corrections(&mut dataset, &rules), 0);
        assert_eq!(dataset.column(columns::TESTS), some(&[1.0, 2.0]));
    }

    #[test]
    fn test_per_capita_rate() {
        let records = vec![
            TimeSeriesRecord::new(day(0), Some("Lazio".to_string()))
                .with_value(columns::TOTAL_CASES, Some(500.0))
                .with_value(columns::POPULATION, Some(5_000_000.0)),
            TimeSeriesRecord::new(day(0), Some("Nowhere".to_string()))
                .with_value(columns::TOTAL_CASES, Some(500.0))
                .with_value(columns::POPULATION, None),
            TimeSeriesRecord::new(day(0), Some("Zero".to_string()))
                .with_value(columns::TOTAL_CASES, Some(500.0))
                .with_value(columns::POPULATION, Some(0.0)),
        ];
        let dataset = Dataset::new(Granularity::Regional, records);

        let rate = derive_per_capita(&dataset, columns::TOTAL_CASES, columns::CASES_PER_100K, 100_000.0);

        assert_eq!(rate.values, vec![Some(10.0), None, None]);
    }

    #[test]
    fn test_national_feed_derivation_around_tests_anomaly() {
        let spec = feed_specs(&app_config()).remove(0);
        let start = NaiveDate::from_ymd_opt(2020, 12, 15).unwrap();
        let tests = [100.0, 200.0, 150.0, 400.0, 450.0];
        let deaths = [1.0, 2.0, 4.0, 7.0, 11.0];
        let records = tests
            .iter()
            .zip(deaths)
            .enumerate()
            .map(|(i, (t, d))| {
                TimeSeriesRecord::new(start + chrono::Duration::days(i as i64), None)
                    .with_value(columns::TESTS, Some(*t))
                    .with_value(columns::DEATHS, Some(d))
            })
            .collect();
        let dataset = Dataset::new(Granularity::National, records);

        let derived = derive_feed(dataset, &spec);

        // 2020-12-17 is index 2
        assert_eq!(derived.records()[2].value(columns::TESTS), None);
        assert_eq!(
            derived.column(columns::NEW_TESTS),
            vec![Some(100.0), Some(100.0), None, None, Some(50.0)]
        );
        assert_eq!(
            derived.column(columns::NEW_DEATHS),
            some(&[1.0, 1.0, 2.0, 3.0, 4.0])
        );
        assert_eq!(derived.column(columns::DEATHS_ROLLING_MEAN), vec![None; 5]);
        // Base cumulative deaths untouched
        assert_eq!(derived.column(columns::DEATHS), some(&deaths));
    }
}
