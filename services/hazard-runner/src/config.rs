//! Runner configuration.
//!
//! Loaded from a YAML file, then overridden from the environment:
//!
//! ```yaml
//! source:
//!   root: /data/cmip6
//! target:
//!   root: /data/hazard
//!   prefix: chronic_heat/osc/v1
//!   store:
//!     chunk_size: 512
//!     compression: blosc_zstd
//! workers: 4
//! models:
//!   - indicator: degree_days
//!     threshold_k: 305.15
//!     window_years: 20
//!     scenarios: [ssp126, ssp585]
//!     central_years: [2030, 2040, 2050]
//!   - indicator: work_loss
//!     intensity: high
//!     window_years: 20
//!     gcms: [NorESM2-MM]
//!     scenarios: [ssp585]
//!     central_years: [2050]
//! ```

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use hazard_common::{WindowAlignment, WindowSpec};
use hazard_models::{
    BatchTransform, DegreeDays, IndicatorModel, IndicatorTransform, WorkIntensity, WorkLoss,
    DEFAULT_PATH_PREFIX,
};
use hazard_sources::{ChunkHint, OpenDataset};
use hazard_store::StoreConfig;

/// Top-level runner configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunnerConfig {
    pub source: SourceConfig,
    pub target: TargetConfig,

    /// Worker threads for item dispatch; 1 runs items in order on the main thread.
    #[serde(default = "default_workers")]
    pub workers: usize,

    #[serde(default)]
    pub models: Vec<ModelConfig>,
}

fn default_workers() -> usize {
    1
}

/// Where yearly input datasets live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub root: PathBuf,
}

/// Where derived grids are written.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub root: PathBuf,

    #[serde(default = "default_prefix")]
    pub prefix: String,

    #[serde(default)]
    pub store: StoreConfig,
}

fn default_prefix() -> String {
    DEFAULT_PATH_PREFIX.to_string()
}

/// Which indicator a model computes, with its indicator-specific settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "indicator", rename_all = "snake_case")]
pub enum IndicatorConfig {
    DegreeDays {
        #[serde(default = "default_threshold_k")]
        threshold_k: f64,
    },
    WorkLoss {
        intensity: WorkIntensity,
    },
}

fn default_threshold_k() -> f64 {
    DegreeDays::DEFAULT_THRESHOLD_K
}

/// One indicator model and the batch it runs over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(flatten)]
    pub indicator: IndicatorConfig,

    pub window_years: u32,

    #[serde(default)]
    pub alignment: WindowAlignment,

    /// GCMs to run; every GCM the source offers when omitted.
    #[serde(default)]
    pub gcms: Option<Vec<String>>,

    pub scenarios: Vec<String>,

    pub central_years: Vec<i32>,

    /// Daily steps fetched per read from the source.
    #[serde(default)]
    pub time_chunk: Option<usize>,
}

impl ModelConfig {
    /// Identifier of the indicator this entry produces.
    pub fn indicator_id(&self) -> String {
        match &self.indicator {
            IndicatorConfig::DegreeDays { threshold_k } => {
                DegreeDays::new(*threshold_k).indicator_id()
            }
            IndicatorConfig::WorkLoss { intensity } => WorkLoss::new(*intensity).indicator_id(),
        }
    }

    fn window(&self) -> Result<WindowSpec> {
        WindowSpec::new(self.window_years, self.alignment)
            .with_context(|| format!("invalid window for model {}", self.indicator_id()))
    }

    /// Build the batch model, resolving omitted GCMs against `source`.
    pub fn build(&self, prefix: &str, source: &dyn OpenDataset) -> Result<Box<dyn BatchTransform>> {
        let window = self.window()?;
        let gcms = match &self.gcms {
            Some(gcms) => gcms.clone(),
            None => source.gcms(),
        };

        let model: Box<dyn BatchTransform> = match &self.indicator {
            IndicatorConfig::DegreeDays { threshold_k } => Box::new(self.configure(
                IndicatorModel::new(
                    DegreeDays::new(*threshold_k),
                    window,
                    gcms,
                    self.scenarios.clone(),
                    self.central_years.clone(),
                ),
                prefix,
            )),
            IndicatorConfig::WorkLoss { intensity } => Box::new(self.configure(
                IndicatorModel::new(
                    WorkLoss::new(*intensity),
                    window,
                    gcms,
                    self.scenarios.clone(),
                    self.central_years.clone(),
                ),
                prefix,
            )),
        };
        Ok(model)
    }

    fn configure<T: IndicatorTransform>(
        &self,
        model: IndicatorModel<T>,
        prefix: &str,
    ) -> IndicatorModel<T> {
        let model = model.with_prefix(prefix);
        match self.time_chunk {
            Some(time) => model.with_chunks(ChunkHint::time_steps(time)),
            None => model,
        }
    }
}

impl RunnerConfig {
    /// Load from a YAML file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_yaml_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.apply_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Override roots and worker count from `HAZARD_SOURCE_ROOT`,
    /// `HAZARD_TARGET_ROOT` and `HAZARD_WORKERS`, and store settings from
    /// their `HAZARD_*` variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(root) = lookup("HAZARD_SOURCE_ROOT") {
            self.source.root = PathBuf::from(root);
        }
        if let Some(root) = lookup("HAZARD_TARGET_ROOT") {
            self.target.root = PathBuf::from(root);
        }
        if let Some(workers) = lookup("HAZARD_WORKERS") {
            self.workers = workers
                .parse()
                .with_context(|| format!("HAZARD_WORKERS is not a number: {}", workers))?;
        }
        self.target.store.apply_overrides(&lookup);
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            bail!("workers must be at least 1");
        }
        if self.source.root.as_os_str().is_empty() {
            bail!("source.root must be set");
        }
        if self.target.root.as_os_str().is_empty() {
            bail!("target.root must be set");
        }
        if let Err(e) = self.target.store.validate() {
            bail!("invalid target.store: {}", e);
        }
        for model in &self.models {
            model.window()?;
            if let IndicatorConfig::DegreeDays { threshold_k } = model.indicator {
                if !threshold_k.is_finite() {
                    bail!("threshold_k must be finite");
                }
            }
            if model.time_chunk == Some(0) {
                bail!("time_chunk must be at least 1 for {}", model.indicator_id());
            }
        }
        Ok(())
    }

    /// Models whose indicator id matches `filter`, or all of them.
    pub fn select_models(&self, filter: Option<&str>) -> Result<Vec<&ModelConfig>> {
        let selected: Vec<_> = self
            .models
            .iter()
            .filter(|m| filter.map_or(true, |id| m.indicator_id() == id))
            .collect();
        if let (Some(id), true) = (filter, selected.is_empty()) {
            let known: Vec<_> = self.models.iter().map(|m| m.indicator_id()).collect();
            bail!("no model '{}' configured (known: {})", id, known.join(", "));
        }
        Ok(selected)
    }
}
