// Snapshot service - One-time build phase and the immutable result it serves
use crate::application::kpi_service::compute_kpis;
use crate::application::loader::AcquisitionLoader;
use crate::application::metrics::derive_feed;
use crate::application::range_query::{bounds, query_range};
use crate::application::reference_join::attach_population;
use crate::domain::dataset::{Dataset, Granularity};
use crate::domain::kpi::Kpis;
use crate::domain::population::PopulationTable;
use crate::domain::query::{DatasetBounds, FilteredResult};
use crate::error::BuildError;
use crate::infrastructure::config::FeedSpec;
use std::collections::HashMap;

/// A fully derived feed together with the columns its range queries pass through
#[derive(Debug, Clone)]
pub struct FeedData {
    pub dataset: Dataset,
    pub pass_through: Vec<String>,
}

/// Everything built at startup. Never mutated once built.
#[derive(Debug, Clone)]
pub struct Snapshot {
    feeds: HashMap<Granularity, FeedData>,
    population: PopulationTable,
    kpis: Kpis,
}

impl Snapshot {
    pub fn dataset(&self, granularity: Granularity) -> Option<&Dataset> {
        self.feeds.get(&granularity).map(|f| &f.dataset)
    }

    pub fn kpis(&self) -> &Kpis {
        &self.kpis
    }

    pub fn population(&self) -> &PopulationTable {
        &self.population
    }

    pub fn bounds(&self, granularity: Granularity) -> Option<DatasetBounds> {
        self.dataset(granularity).and_then(bounds)
    }

    /// `None` only when the granularity was not built
    pub fn query_range(
        &self,
        granularity: Granularity,
        start_offset: i64,
        end_offset: i64,
    ) -> Option<FilteredResult> {
        self.feeds
            .get(&granularity)
            .map(|feed| query_range(&feed.dataset, start_offset, end_offset, &feed.pass_through))
    }
}

pub struct SnapshotBuilder {
    loader: AcquisitionLoader,
    population: PopulationTable,
}

impl SnapshotBuilder {
    pub fn new(loader: AcquisitionLoader, population: PopulationTable) -> Self {
        Self { loader, population }
    }

    /// Load, join and derive every feed in order, then compute the KPIs
    /// from the national feed.
    pub async fn build(self, specs: &[FeedSpec]) -> Result<Snapshot, BuildError> {
        let mut feeds = HashMap::new();

        for spec in specs {
            let (dataset, _origin) = self.loader.load(spec).await?;
            let dataset = attach_population(dataset, &self.population, &spec.population);
            let dataset = derive_feed(dataset, spec);

            feeds.insert(
                spec.granularity,
                FeedData {
                    dataset,
                    pass_through: spec.pass_through.clone(),
                },
            );
        }

        let national = feeds
            .get(&Granularity::National)
            .map(|f| &f.dataset)
            .ok_or_else(|| BuildError::UnknownFeed(Granularity::National.source_id().to_string()))?;
        let kpis = compute_kpis(national);

        Ok(Snapshot {
            feeds,
            population: self.population,
            kpis,
        })
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::application::loader::test_support::StubSource;
    use crate::infrastructure::config::{feed_specs, test_support::app_config};
    use crate::infrastructure::feed_cache::FeedCache;
    use std::sync::Arc;

    pub const NATIONAL_CSV: &str = "\
data,stato,ricoverati_con_sintomi,terapia_intensiva,totale_ospedalizzati,isolamento_domiciliare,totale_positivi,variazione_totale_positivi,nuovi_positivi,dimessi_guariti,deceduti,totale_casi,tamponi,note
2020-02-24T18:00:00,ITA,101,26,127,94,221,0,221,1,7,229,4324,
2020-02-25T18:00:00,ITA,114,35,150,162,311,90,93,1,10,322,8623,
2020-02-26T18:00:00,ITA,128,36,164,221,385,74,78,3,12,400,9587,
";

    pub const REGIONAL_CSV: &str = "\
data,stato,codice_regione,denominazione_regione,lat,long,ricoverati_con_sintomi,terapia_intensiva,totale_ospedalizzati,isolamento_domiciliare,totale_positivi,variazione_totale_positivi,nuovi_positivi,dimessi_guariti,deceduti,totale_casi,tamponi
2020-02-24T18:00:00,ITA,12,Lazio,41.89,12.48,1,1,2,0,2,0,2,1,0,3,5
2020-02-24T18:00:00,ITA,5,Veneto,45.43,12.33,12,4,16,16,32,0,32,0,1,33,1010
2020-02-25T18:00:00,ITA,12,Lazio,41.89,12.48,1,1,2,0,2,0,0,1,0,3,21
2020-02-25T18:00:00,ITA,5,Veneto,45.43,12.33,12,4,16,27,43,11,11,0,2,44,1950
";

    pub const PROVINCIAL_CSV: &str = "\
data,stato,codice_regione,denominazione_regione,codice_provincia,denominazione_provincia,sigla_provincia,lat,long,totale_casi
2020-02-24T18:00:00,ITA,12,Lazio,58,Roma,RM,41.89,12.48,3
2020-02-24T18:00:00,ITA,5,Veneto,28,Padova,PD,45.40,11.87,12
2020-02-25T18:00:00,ITA,12,Lazio,58,Roma,RM,41.89,12.48,3
2020-02-25T18:00:00,ITA,5,Veneto,28,Padova,PD,45.40,11.87,17
";

    pub fn population() -> PopulationTable {
        [
            ("Italia", 59_641_488u64),
            ("Lazio", 5_730_399),
            ("Veneto", 4_879_133),
            ("Roma", 4_216_874),
        ]
        .into_iter()
        .collect()
    }

    pub fn stub_source() -> StubSource {
        StubSource::default()
            .with("http://feeds.test/national.csv", NATIONAL_CSV)
            .with("http://feeds.test/regional.csv", REGIONAL_CSV)
            .with("http://feeds.test/provincial.csv", PROVINCIAL_CSV)
    }

    pub async fn snapshot() -> Snapshot {
        let dir = tempfile::tempdir().unwrap();
        let loader = AcquisitionLoader::new(Arc::new(stub_source()), FeedCache::new(dir.path()));
        SnapshotBuilder::new(loader, population())
            .build(&feed_specs(&app_config()))
            .await
            .unwrap()
    }
}
