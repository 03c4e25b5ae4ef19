// Reference join - Attach population figures to each record
use crate::domain::columns;
use crate::domain::dataset::Dataset;
use crate::domain::population::PopulationTable;
use crate::infrastructure::config::PopulationJoin;
use std::collections::BTreeSet;

/// Left join on entity name. Every record keeps its row; unmatched
/// entities get a missing population.
pub fn attach_population(
    mut dataset: Dataset,
    table: &PopulationTable,
    join: &PopulationJoin,
) -> Dataset {
    let mut unmatched = BTreeSet::new();

    match join {
        PopulationJoin::Fixed(name) => {
            let population = table.lookup(name).map(|p| p as f64);
            if population.is_none() {
                unmatched.insert(name.clone());
            }
            for record in dataset.records_mut() {
                record.set_value(columns::POPULATION, population);
            }
        }
        PopulationJoin::Entity => {
            for record in dataset.records_mut() {
                let population = record
                    .entity
                    .as_deref()
                    .and_then(|name| table.lookup(name))
                    .map(|p| p as f64);
                if population.is_none() {
                    unmatched.insert(record.entity.clone().unwrap_or_default());
                }
                record.set_value(columns::POPULATION, population);
            }
        }
    }

    if !unmatched.is_empty() {
        tracing::debug!(
            "No population for {} {} entities: {:?}",
            unmatched.len(),
            dataset.granularity,
            unmatched
        );
    }

    dataset
}
