use std::{collections::BTreeMap, sync::Arc};

use futures::future::join_all;
use shared::{
    domain::{FilterField, FilterOption, OptionId},
    error::{ClientError, ClientResult},
    protocol::CatalogEntry,
};
use tracing::{info, warn};

use crate::api::SubsidyApi;

/// Options offered for one filter field. The default "any" option is always first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectControl {
    field: FilterField,
    options: Vec<FilterOption>,
}

impl SelectControl {
    pub fn new(field: FilterField) -> Self {
        Self {
            field,
            options: vec![FilterOption::any()],
        }
    }

    pub fn field(&self) -> FilterField {
        self.field
    }

    pub fn options(&self) -> &[FilterOption] {
        &self.options
    }

    /// Selectable values, without the default option.
    pub fn values(&self) -> impl Iterator<Item = &FilterOption> {
        self.options.iter().filter(|option| !option.is_any())
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values()
            .any(|option| matches!(&option.id, OptionId::Text(text) if text == value))
    }

    /// Replaces every option except the default one. Blank and repeated values
    /// are dropped; response order is kept.
    pub fn populate(&mut self, values: impl IntoIterator<Item = String>) {
        self.options.clear();
        self.options.push(FilterOption::any());
        for value in values {
            let value = value.trim();
            if value.is_empty() || self.contains(value) {
                continue;
            }
            self.options.push(FilterOption::text(value));
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogControls {
    controls: BTreeMap<FilterField, SelectControl>,
}

impl Default for CatalogControls {
    fn default() -> Self {
        Self {
            controls: FilterField::ALL
                .into_iter()
                .map(|field| (field, SelectControl::new(field)))
                .collect(),
        }
    }
}

impl CatalogControls {
    pub fn get(&self, field: FilterField) -> Option<&SelectControl> {
        self.controls.get(&field)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SelectControl> {
        self.controls.values()
    }

    fn control_mut(&mut self, field: FilterField) -> &mut SelectControl {
        self.controls
            .entry(field)
            .or_insert_with(|| SelectControl::new(field))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CatalogLoadReport {
    pub loaded: Vec<FilterField>,
    pub failed: Vec<(FilterField, ClientError)>,
}

impl CatalogLoadReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct CatalogLoader {
    api: Arc<dyn SubsidyApi>,
}

impl CatalogLoader {
    pub fn new(api: Arc<dyn SubsidyApi>) -> Self {
        Self { api }
    }

    /// Requests every category at once and applies each result once all have
    /// settled. A failed category is logged and its control left as it was.
    pub async fn load(&self, controls: &mut CatalogControls) -> CatalogLoadReport {
        let requests = FilterField::ALL.into_iter().map(|field| {
            let api = Arc::clone(&self.api);
            async move { (field, api.filter_values(field).await) }
        });

        let mut report = CatalogLoadReport::default();
        for (field, result) in join_all(requests).await {
            match result {
                Ok(values) => {
                    let control = controls.control_mut(field);
                    control.populate(values);
                    info!(
                        field = field.param_name(),
                        options = control.values().count(),
                        "catalog loaded"
                    );
                    report.loaded.push(field);
                }
                Err(err) => {
                    warn!(field = field.param_name(), error = %err, "catalog load failed");
                    report.failed.push((field, err));
                }
            }
        }
        report
    }

    pub async fn regions(&self) -> ClientResult<Vec<FilterOption>> {
        Ok(entries_to_options(self.api.regions().await?))
    }

    pub async fn areas(&self) -> ClientResult<Vec<FilterOption>> {
        Ok(entries_to_options(self.api.areas().await?))
    }
}

fn entries_to_options(entries: Vec<CatalogEntry>) -> Vec<FilterOption> {
    entries
        .into_iter()
        .map(|entry| FilterOption::numbered(entry.id, entry.nombre))
        .collect()
}

#[cfg(test)]
#[path = "tests/catalog_tests.rs"]
mod tests;
