// Column names used by the Civil Protection feeds and the derived fields we add

pub const DATE: &str = "data";

pub const REGION_NAME: &str = "denominazione_regione";
pub const PROVINCE_NAME: &str = "denominazione_provincia";
pub const PROVINCE_CODE: &str = "sigla_provincia";

pub const LAT: &str = "lat";
pub const LONG: &str = "long";
pub const HOSPITALIZED_WITH_SYMPTOMS: &str = "ricoverati_con_sintomi";
pub const INTENSIVE_CARE: &str = "terapia_intensiva";
pub const TOTAL_HOSPITALIZED: &str = "totale_ospedalizzati";
pub const HOME_ISOLATION: &str = "isolamento_domiciliare";
pub const TOTAL_POSITIVE: &str = "totale_positivi";
pub const TOTAL_POSITIVE_CHANGE: &str = "variazione_totale_positivi";
pub const NEW_POSITIVES: &str = "nuovi_positivi";
pub const RECOVERED: &str = "dimessi_guariti";
pub const DEATHS: &str = "deceduti";
pub const TOTAL_CASES: &str = "totale_casi";
pub const TESTS: &str = "tamponi";

pub const POPULATION: &str = "popolazione";
pub const NEW_TESTS: &str = "nuovi_tamponi";
pub const NEW_DEATHS: &str = "nuovi_decessi";
pub const DEATHS_ROLLING_MEAN: &str = "decessi_media_mobile";
pub const CASES_PER_100K: &str = "casi_per_100k";
