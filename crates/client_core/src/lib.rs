use std::sync::Arc;

use shared::{
    domain::{FilterOption, GrantId, SubscriptionId},
    error::{ClientError, ClientResult},
    protocol::{SubscriptionSummary, SubscriptionUpdate},
};
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

pub mod api;
pub mod catalog;
pub mod config;
pub mod confirmation;
pub mod filters;
mod inflight;
pub mod search;
pub mod subscription;
pub mod view;

pub use api::{HttpSubsidyApi, SearchQuery, SubsidyApi};
pub use catalog::{CatalogControls, CatalogLoadReport, CatalogLoader, SelectControl};
pub use config::{load_settings, Settings, SettingsError};
pub use confirmation::{ConfirmationHandler, ConfirmationOutcome};
pub use filters::FilterState;
pub use search::{SearchController, SearchView};
pub use subscription::{SubscriptionController, SubscriptionForm};
pub use view::GrantCard;

pub const CALENDAR_UNAVAILABLE: &str = "No se pudo obtener la URL del calendario";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Success,
    Error,
}

/// One-line outcome shown to the user after a submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusMessage {
    pub kind: StatusKind,
    pub text: String,
}

impl StatusMessage {
    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: StatusKind::Error,
            text: text.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.kind == StatusKind::Success
    }
}

#[derive(Debug, Clone)]
pub enum ClientEvent {
    CatalogsLoaded(CatalogLoadReport),
    SearchStateChanged(SearchView),
    SubscriptionStatus(StatusMessage),
    ConfirmationStatus(StatusMessage),
}

/// What the startup sequence produced.
#[derive(Debug, Clone)]
pub struct StartupReport {
    pub catalogs: CatalogLoadReport,
    pub search: ClientResult<SearchView>,
    pub confirmation: ConfirmationOutcome,
}

/// One client session: API handle, shared filters and the controllers that
/// operate on them.
pub struct SubsidyClient {
    api: Arc<dyn SubsidyApi>,
    filters: FilterState,
    catalog: CatalogLoader,
    controls: Mutex<CatalogControls>,
    search: SearchController,
    subscription: SubscriptionController,
    confirmation: ConfirmationHandler,
    events: broadcast::Sender<ClientEvent>,
}

impl SubsidyClient {
    pub fn new(settings: &Settings) -> Self {
        let base_url = settings.base_url();
        info!(%base_url, "using subvenciones api");
        Self::with_api(
            Arc::new(HttpSubsidyApi::new(base_url)),
            settings.effective_search_limit(),
        )
    }

    pub fn with_api(api: Arc<dyn SubsidyApi>, search_limit: u32) -> Self {
        let (events, _) = broadcast::channel(64);
        let filters = FilterState::new();
        Self {
            catalog: CatalogLoader::new(Arc::clone(&api)),
            controls: Mutex::new(CatalogControls::default()),
            search: SearchController::new(
                Arc::clone(&api),
                filters.clone(),
                search_limit,
                events.clone(),
            ),
            subscription: SubscriptionController::new(
                Arc::clone(&api),
                filters.clone(),
                events.clone(),
            ),
            confirmation: ConfirmationHandler::new(Arc::clone(&api), events.clone()),
            api,
            filters,
            events,
        }
    }

    /// Startup: catalogs, an unfiltered search and the link confirmation run
    /// side by side; none of them waits on another.
    pub async fn start(&self, link: Option<&str>) -> StartupReport {
        let (catalogs, search, confirmation) = tokio::join!(
            self.load_catalogs(),
            self.search.search(),
            self.confirmation.run(link),
        );
        StartupReport {
            catalogs,
            search,
            confirmation,
        }
    }

    pub async fn load_catalogs(&self) -> CatalogLoadReport {
        let mut controls = self.controls.lock().await;
        let report = self.catalog.load(&mut controls).await;
        let _ = self.events.send(ClientEvent::CatalogsLoaded(report.clone()));
        report
    }

    pub async fn controls(&self) -> CatalogControls {
        self.controls.lock().await.clone()
    }

    pub async fn regions(&self) -> ClientResult<Vec<FilterOption>> {
        self.catalog.regions().await
    }

    pub async fn areas(&self) -> ClientResult<Vec<FilterOption>> {
        self.catalog.areas().await
    }

    pub fn search(&self) -> &SearchController {
        &self.search
    }

    pub fn subscription(&self) -> &SubscriptionController {
        &self.subscription
    }

    pub fn confirmation(&self) -> &ConfirmationHandler {
        &self.confirmation
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub async fn grant(&self, id: GrantId) -> ClientResult<GrantCard> {
        let record = self.api.grant(id).await?;
        Ok(GrantCard::detailed(&record))
    }

    /// Public calendar URL. The backend answers `#` plus an `error` when the
    /// calendar cannot be resolved; that becomes `ClientError::Unavailable`.
    pub async fn calendar_url(&self) -> ClientResult<String> {
        let response = self.api.calendar_url().await?;
        if !response.is_available() {
            let message = response
                .error
                .unwrap_or_else(|| CALENDAR_UNAVAILABLE.to_string());
            warn!(%message, "calendar url unavailable");
            return Err(ClientError::Unavailable(message));
        }
        Ok(response.url)
    }

    pub async fn subscription_status(&self, email: &str) -> ClientResult<SubscriptionSummary> {
        let email = email.trim();
        if email.is_empty() {
            return Err(ClientError::validation(subscription::EMAIL_REQUIRED));
        }
        self.api.subscription_status(email).await
    }

    pub async fn update_subscription(
        &self,
        id: SubscriptionId,
        update: &SubscriptionUpdate,
    ) -> StatusMessage {
        if let Err(err) = subscription::validate_update(update) {
            return subscription::failure_message(&err);
        }
        match self.api.update_subscription(id, update).await {
            Ok(response) => {
                info!(subscription_id = id.0, "subscription updated");
                StatusMessage::success(response.message)
            }
            Err(err) => {
                StatusMessage::error(format!("Error al actualizar la suscripción: {err}"))
            }
        }
    }

    pub async fn cancel_subscription(&self, id: SubscriptionId) -> StatusMessage {
        match self.api.cancel_subscription(id).await {
            Ok(response) => {
                info!(subscription_id = id.0, "subscription cancelled");
                StatusMessage::success(response.message)
            }
            Err(err) => StatusMessage::error(format!("Error al cancelar la suscripción: {err}")),
        }
    }

    pub fn subscribe_events(&self) -> broadcast::Receiver<ClientEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
#[path = "tests/fake_api.rs"]
mod fake_api;

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
