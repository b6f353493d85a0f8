use std::sync::Arc;

use shared::{domain::FilterSelection, error::ClientResult, protocol::GrantRecord};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    api::{SearchQuery, SubsidyApi},
    config::MAX_SEARCH_LIMIT,
    filters::FilterState,
    inflight::InFlight,
    view::{count_label, GrantCard},
    ClientEvent,
};

pub const EMPTY_RESULTS_MESSAGE: &str =
    "No se encontraron subvenciones con los filtros seleccionados.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchView {
    /// Request in flight; previous results are hidden.
    Loading,
    Empty {
        count_label: String,
        message: String,
    },
    Populated {
        count_label: String,
        cards: Vec<GrantCard>,
    },
    Error {
        message: String,
    },
}

impl SearchView {
    pub fn from_records(records: &[GrantRecord]) -> Self {
        if records.is_empty() {
            return SearchView::Empty {
                count_label: count_label(0),
                message: EMPTY_RESULTS_MESSAGE.to_string(),
            };
        }
        SearchView::Populated {
            count_label: count_label(records.len()),
            cards: records.iter().map(GrantCard::from_record).collect(),
        }
    }

    pub fn count_label(&self) -> Option<&str> {
        match self {
            SearchView::Empty { count_label, .. } | SearchView::Populated { count_label, .. } => {
                Some(count_label.as_str())
            }
            SearchView::Loading | SearchView::Error { .. } => None,
        }
    }

    pub fn cards(&self) -> &[GrantCard] {
        match self {
            SearchView::Populated { cards, .. } => cards.as_slice(),
            _ => &[],
        }
    }

    pub fn render(&self) -> Vec<String> {
        match self {
            SearchView::Loading => vec!["Buscando subvenciones...".to_string()],
            SearchView::Empty {
                count_label,
                message,
            } => vec![count_label.clone(), message.clone()],
            SearchView::Populated { count_label, cards } => {
                let mut lines = vec![count_label.clone()];
                for card in cards {
                    lines.push(String::new());
                    lines.extend(card.render());
                }
                lines
            }
            SearchView::Error { message } => vec![format!("⚠ {message}")],
        }
    }
}

pub struct SearchController {
    api: Arc<dyn SubsidyApi>,
    filters: FilterState,
    limit: u32,
    in_flight: InFlight,
    events: broadcast::Sender<ClientEvent>,
}

impl SearchController {
    pub(crate) fn new(
        api: Arc<dyn SubsidyApi>,
        filters: FilterState,
        limit: u32,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            api,
            filters,
            limit: limit.clamp(1, MAX_SEARCH_LIMIT),
            in_flight: InFlight::default(),
            events,
        }
    }

    pub fn limit(&self) -> u32 {
        self.limit
    }

    pub fn is_searching(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Searches with the current filters. Only `ClientError::InFlight` is
    /// returned as an error; request failures become `SearchView::Error`.
    pub async fn search(&self) -> ClientResult<SearchView> {
        let _guard = self.in_flight.acquire()?;
        let query = SearchQuery::new(self.filters.snapshot(), self.limit);
        Ok(self.run(query).await)
    }

    /// Makes `selection` the active filters, then searches.
    pub async fn apply(&self, selection: FilterSelection) -> ClientResult<SearchView> {
        let _guard = self.in_flight.acquire()?;
        self.filters.replace(selection.clone());
        Ok(self.run(SearchQuery::new(selection, self.limit)).await)
    }

    /// Drops every filter and re-runs an unfiltered search.
    pub async fn clear(&self) -> ClientResult<SearchView> {
        let _guard = self.in_flight.acquire()?;
        self.filters.clear();
        Ok(self
            .run(SearchQuery::new(FilterSelection::new(), self.limit))
            .await)
    }

    async fn run(&self, query: SearchQuery) -> SearchView {
        self.publish(SearchView::Loading);
        debug!(
            filters = query.filters.query_pairs().len(),
            limit = query.limit,
            "searching grants"
        );

        let view = match self.api.search_grants(&query).await {
            Ok(records) => {
                info!(results = records.len(), "search completed");
                SearchView::from_records(&records)
            }
            Err(err) => {
                warn!(error = %err, "search failed");
                SearchView::Error {
                    message: format!("Error al cargar las subvenciones: {err}"),
                }
            }
        };

        self.publish(view.clone());
        view
    }

    fn publish(&self, view: SearchView) {
        // No subscribers is fine.
        let _ = self.events.send(ClientEvent::SearchStateChanged(view));
    }
}

#[cfg(test)]
#[path = "tests/search_tests.rs"]
mod tests;
