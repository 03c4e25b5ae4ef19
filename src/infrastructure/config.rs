use chrono::NaiveDate;
use serde::Deserialize;
use std::path::PathBuf;

use crate::domain::columns;
use crate::domain::dataset::Granularity;

const NATIONAL_URL: &str = "https://raw.githubusercontent.com/pcm-dpc/COVID-19/master/dati-andamento-nazionale/dpc-covid19-ita-andamento-nazionale.csv";
const REGIONAL_URL: &str = "https://raw.githubusercontent.com/pcm-dpc/COVID-19/master/dati-regioni/dpc-covid19-ita-regioni.csv";
const PROVINCIAL_URL: &str = "https://raw.githubusercontent.com/pcm-dpc/COVID-19/master/dati-province/dpc-covid19-ita-province.csv";

/// Population reference entry used for the national feed
pub const NATIONAL_ENTITY: &str = "Italia";

/// Day the national `tamponi` series carries a reporting anomaly
pub const TESTS_ANOMALY_DATE: NaiveDate = NaiveDate::from_ymd_opt(2020, 12, 17).expect("valid calendar date");

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerSettings,
    pub data: DataSettings,
    pub feeds: FeedUrls,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerSettings {
    pub bind_addr: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataSettings {
    pub cache_dir: PathBuf,
    pub population_file: PathBuf,
    pub fetch_timeout_secs: u64,
    pub rolling_window: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedUrls {
    pub national: String,
    pub regional: String,
    pub provincial: String,
}

/// Columns kept from a feed, in output order
#[derive(Debug, Clone, PartialEq)]
pub struct FeedSchema {
    pub date_column: String,
    pub entity_column: Option<String>,
    pub label_columns: Vec<String>,
    pub numeric_columns: Vec<String>,
}

impl FeedSchema {
    /// Every column the source must provide
    pub fn required_columns(&self) -> Vec<&str> {
        let mut required = vec![self.date_column.as_str()];
        required.extend(self.entity_column.as_deref());
        required.extend(self.label_columns.iter().map(String::as_str));
        required.extend(self.numeric_columns.iter().map(String::as_str));
        required
    }
}

/// How a feed's records find their population
#[derive(Debug, Clone, PartialEq)]
pub enum PopulationJoin {
    /// Look up each record's entity name
    Entity,
    /// Single constant entity broadcast to every record
    Fixed(String),
}

/// Overwrite a known-bad cell with a missing value
#[derive(Debug, Clone, PartialEq)]
pub struct CorrectionRule {
    pub date: NaiveDate,
    pub column: String,
    pub entity: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncrementSpec {
    pub source: String,
    pub target: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RollingSpec {
    pub source: String,
    pub target: String,
    pub window: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PerCapitaSpec {
    pub source: String,
    pub target: String,
    pub per: f64,
}

/// Everything the build phase needs to know about one feed
#[derive(Debug, Clone)]
pub struct FeedSpec {
    pub granularity: Granularity,
    pub url: String,
    pub schema: FeedSchema,
    pub population: PopulationJoin,
    pub corrections: Vec<CorrectionRule>,
    pub increments: Vec<IncrementSpec>,
    pub rolling: Vec<RollingSpec>,
    pub per_capita: Vec<PerCapitaSpec>,
    /// Derived columns sliced into range query results
    pub pass_through: Vec<String>,
}

pub fn load_app_config() -> anyhow::Result<AppConfig> {
    let settings = config::Config::builder()
        .set_default("server.bind_addr", "0.0.0.0:8050")?
        .set_default("data.cache_dir", "data")?
        .set_default("data.population_file", "data/pop_cleaned.csv")?
        .set_default("data.fetch_timeout_secs", 30i64)?
        .set_default("data.rolling_window", 7i64)?
        .set_default("feeds.national", NATIONAL_URL)?
        .set_default("feeds.regional", REGIONAL_URL)?
        .set_default("feeds.provincial", PROVINCIAL_URL)?
        .add_source(config::File::with_name("config/covid-trends").required(false))
        .add_source(
            config::Environment::with_prefix("COVID_TRENDS")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    Ok(settings.try_deserialize()?)
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|n| n.to_string()).collect()
}

fn increment(source: &str, target: &str) -> IncrementSpec {
    IncrementSpec {
        source: source.to_string(),
        target: target.to_string(),
    }
}

fn cases_per_100k() -> PerCapitaSpec {
    PerCapitaSpec {
        source: columns::TOTAL_CASES.to_string(),
        target: columns::CASES_PER_100K.to_string(),
        per: 100_000.0,
    }
}

/// Built-in schema and derivations for the three Civil Protection feeds
pub fn feed_specs(config: &AppConfig) -> Vec<FeedSpec> {
    let clinical = [
        columns::HOSPITALIZED_WITH_SYMPTOMS,
        columns::INTENSIVE_CARE,
        columns::TOTAL_HOSPITALIZED,
        columns::HOME_ISOLATION,
        columns::TOTAL_POSITIVE,
        columns::TOTAL_POSITIVE_CHANGE,
        columns::NEW_POSITIVES,
        columns::RECOVERED,
        columns::DEATHS,
        columns::TOTAL_CASES,
        columns::TESTS,
    ];

    let national = FeedSpec {
        granularity: Granularity::National,
        url: config.feeds.national.clone(),
        schema: FeedSchema {
            date_column: columns::DATE.to_string(),
            entity_column: None,
            label_columns: Vec::new(),
            numeric_columns: owned(&clinical),
        },
        population: PopulationJoin::Fixed(NATIONAL_ENTITY.to_string()),
        // Cumulative tests on this date are lower than the day before
        corrections: vec![CorrectionRule {
            date: TESTS_ANOMALY_DATE,
            column: columns::TESTS.to_string(),
            entity: None,
        }],
        increments: vec![
            increment(columns::TESTS, columns::NEW_TESTS),
            increment(columns::DEATHS, columns::NEW_DEATHS),
        ],
        rolling: vec![RollingSpec {
            source: columns::NEW_DEATHS.to_string(),
            target: columns::DEATHS_ROLLING_MEAN.to_string(),
            window: config.data.rolling_window,
        }],
        per_capita: Vec::new(),
        pass_through: owned(&[columns::DEATHS_ROLLING_MEAN, columns::NEW_DEATHS]),
    };

    let mut regional_numeric = owned(&[columns::LAT, columns::LONG]);
    regional_numeric.extend(owned(&clinical));
    let regional = FeedSpec {
        granularity: Granularity::Regional,
        url: config.feeds.regional.clone(),
        schema: FeedSchema {
            date_column: columns::DATE.to_string(),
            entity_column: Some(columns::REGION_NAME.to_string()),
            label_columns: Vec::new(),
            numeric_columns: regional_numeric,
        },
        population: PopulationJoin::Entity,
        corrections: Vec::new(),
        increments: vec![
            increment(columns::TESTS, columns::NEW_TESTS),
            increment(columns::DEATHS, columns::NEW_DEATHS),
        ],
        rolling: Vec::new(),
        per_capita: vec![cases_per_100k()],
        pass_through: owned(&[columns::NEW_DEATHS, columns::CASES_PER_100K]),
    };

    let provincial = FeedSpec {
        granularity: Granularity::Provincial,
        url: config.feeds.provincial.clone(),
        schema: FeedSchema {
            date_column: columns::DATE.to_string(),
            entity_column: Some(columns::PROVINCE_NAME.to_string()),
            label_columns: owned(&[columns::PROVINCE_CODE]),
            numeric_columns: owned(&[columns::LAT, columns::LONG, columns::TOTAL_CASES]),
        },
        population: PopulationJoin::Entity,
        corrections: Vec::new(),
        increments: Vec::new(),
        rolling: Vec::new(),
        per_capita: vec![cases_per_100k()],
        pass_through: owned(&[columns::CASES_PER_100K]),
    };

    vec![national, regional, provincial]
}
