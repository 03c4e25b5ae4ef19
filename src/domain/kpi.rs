// Summary indicator domain models
use chrono::NaiveDate;
use serde::Serialize;

/// `100 * numerator / denominator`, missing when either side is missing
/// or the denominator is zero.
pub fn percentage(numerator: Option<f64>, denominator: Option<f64>) -> Option<f64> {
    match (numerator, denominator) {
        (Some(n), Some(d)) if d != 0.0 => {
            let value = 100.0 * n / d;
            value.is_finite().then_some(value)
        }
        _ => None,
    }
}

/// A percentage KPI; `None` when it cannot be computed
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
#[serde(transparent)]
pub struct KpiValue(Option<f64>);

impl KpiValue {
    pub fn new(value: Option<f64>) -> Self {
        Self(value)
    }

    pub fn missing() -> Self {
        Self(None)
    }

    pub fn value(&self) -> Option<f64> {
        self.0
    }

    #[cfg(test)]
    pub fn is_missing(&self) -> bool {
        self.0.is_none()
    }
}

/// The fixed KPIs shown next to the charts
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Kpis {
    pub as_of: Option<NaiveDate>,
    pub positives_delta: KpiValue,
    pub deaths_delta: KpiValue,
    pub positivity_rate: KpiValue,
}
