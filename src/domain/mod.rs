// Domain layer - Time series, population and indicator models
pub mod columns;
pub mod dataset;
pub mod kpi;
pub mod population;
pub mod query;
