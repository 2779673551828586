//! Indicator models: batch enumeration and per-item computation.

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use hazard_common::{BatchItem, DerivedGrid, WindowSpec};
use hazard_sources::{ChunkHint, DatasetGuard, OpenDataset};

use crate::enumerate::enumerate_items;
use crate::error::{ModelError, Result};
use crate::transform::{annualize, IndicatorTransform, WindowAccumulator};

/// Default prefix of every indicator storage path.
pub const DEFAULT_PATH_PREFIX: &str = "chronic_heat/osc/v1";

/// A set of independent work items, each computed to one derived grid.
pub trait BatchTransform: Send + Sync {
    /// Identifier of the indicator this model produces.
    fn id(&self) -> String;

    /// Every item of the batch, in a stable order.
    fn batch_items(&self) -> Vec<BatchItem>;

    /// Compute the grid for one item. Reads only that item's inputs.
    fn process_item(&self, item: &BatchItem, source: &dyn OpenDataset) -> Result<DerivedGrid>;

    /// Storage path of an item's result.
    fn item_path(&self, item: &BatchItem) -> String;
}

/// Storage path for an indicator result: `{prefix}/{indicator}/{gcm}/{scenario}/{year}`.
pub fn indicator_path(prefix: &str, indicator_id: &str, item: &BatchItem) -> String {
    let prefix = prefix.trim_matches('/');
    let tail = format!(
        "{}/{}/{}/{}",
        indicator_id, item.gcm, item.scenario, item.central_year
    );
    if prefix.is_empty() {
        tail
    } else {
        format!("{}/{}", prefix, tail)
    }
}

/// Window-averaged indicator computed over a gcm × scenario × year batch.
#[derive(Debug, Clone)]
pub struct IndicatorModel<T> {
    transform: T,
    window: WindowSpec,
    gcms: Vec<String>,
    scenarios: Vec<String>,
    central_years: Vec<i32>,
    prefix: String,
    chunks: Option<ChunkHint>,
}

impl<T: IndicatorTransform> IndicatorModel<T> {
    pub fn new(
        transform: T,
        window: WindowSpec,
        gcms: Vec<String>,
        scenarios: Vec<String>,
        central_years: Vec<i32>,
    ) -> Self {
        Self {
            transform,
            window,
            gcms,
            scenarios,
            central_years,
            prefix: DEFAULT_PATH_PREFIX.to_string(),
            chunks: None,
        }
    }

    /// Override the storage path prefix.
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Chunking hint passed to every dataset open.
    pub fn with_chunks(mut self, chunks: ChunkHint) -> Self {
        self.chunks = Some(chunks);
        self
    }

    pub fn transform(&self) -> &T {
        &self.transform
    }

    pub fn window(&self) -> WindowSpec {
        self.window
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Annual values for one contributing year, with its coordinates.
    fn process_year(
        &self,
        item: &BatchItem,
        year: i32,
        source: &dyn OpenDataset,
        window: &mut WindowAccumulator,
    ) -> Result<()> {
        // Guards release every opened year when this scope ends, also on error.
        let datasets = self
            .transform
            .quantities()
            .iter()
            .map(|quantity| {
                source.open_dataset_year(&item.gcm, &item.scenario, quantity, year, self.chunks)
            })
            .collect::<std::result::Result<Vec<DatasetGuard<'_>>, _>>()?;

        let grids: Vec<_> = datasets.iter().map(|ds| ds.grid()).collect();
        let first = grids
            .first()
            .ok_or_else(|| ModelError::InvalidConfig("indicator reads no quantities".into()))?;

        let annual = annualize(&self.transform, year, &grids)?;
        window.add_year(year, first.lat(), first.lon(), &annual)?;
        debug!(year, time_len = first.time_len(), "Processed year");
        Ok(())
    }
}

impl<T: IndicatorTransform> BatchTransform for IndicatorModel<T> {
    fn id(&self) -> String {
        self.transform.indicator_id()
    }

    fn batch_items(&self) -> Vec<BatchItem> {
        enumerate_items(&self.gcms, &self.scenarios, &self.central_years)
    }

    #[instrument(skip(self, source), fields(indicator = %self.transform.indicator_id()))]
    fn process_item(&self, item: &BatchItem, source: &dyn OpenDataset) -> Result<DerivedGrid> {
        let mut window = WindowAccumulator::new();
        for year in self.window.years(item.central_year)? {
            self.process_year(item, year, source, &mut window)?;
        }

        let mut attributes = BTreeMap::new();
        attributes.insert("indicator".to_string(), self.transform.indicator_id());
        attributes.insert("units".to_string(), self.transform.units().to_string());
        attributes.insert("gcm".to_string(), item.gcm.clone());
        attributes.insert("scenario".to_string(), item.scenario.clone());
        attributes.insert(
            "window_years".to_string(),
            self.window.window_years.to_string(),
        );

        Ok(window.finish(item.central_year)?.with_attributes(attributes))
    }

    fn item_path(&self, item: &BatchItem) -> String {
        indicator_path(&self.prefix, &self.transform.indicator_id(), item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::DegreeDays;

    fn model() -> IndicatorModel<DegreeDays> {
        IndicatorModel::new(
            DegreeDays::default(),
            WindowSpec::centered(2).unwrap(),
            vec!["NorESM2-MM".into(), "ACCESS-CM2".into()],
            vec!["ssp585".into()],
            vec![2030, 2040],
        )
    }

    #[test]
    fn test_item_path() {
        let item = BatchItem::new("NorESM2-MM", "ssp585", 2030);
        assert_eq!(
            model().item_path(&item),
            "chronic_heat/osc/v1/mean_degree_days_above_32c/NorESM2-MM/ssp585/2030"
        );
        assert_eq!(
            model().with_prefix("/hazard_test/").item_path(&item),
            "hazard_test/mean_degree_days_above_32c/NorESM2-MM/ssp585/2030"
        );
        assert_eq!(
            indicator_path("", "x", &item),
            "x/NorESM2-MM/ssp585/2030"
        );
    }

    #[test]
    fn test_window_past_year_range_fails_item() {
        let source = hazard_sources::MemorySource::new();
        let item = BatchItem::new("NorESM2-MM", "ssp585", i32::MIN);
        assert!(matches!(
            model().process_item(&item, &source),
            Err(ModelError::Grid(_))
        ));
    }

    #[test]
    fn test_batch_items_cardinality_and_distinct_paths() {
        let model = model();
        let items = model.batch_items();
        assert_eq!(items.len(), 4);

        let paths: std::collections::HashSet<_> =
            items.iter().map(|item| model.item_path(item)).collect();
        assert_eq!(paths.len(), items.len());
    }
}
