use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use shared::{
    domain::{FilterField, FilterSelection, GrantId, SubscriptionId},
    error::{ClientError, ClientResult},
    protocol::{
        CalendarUrlResponse, CatalogEntry, ErrorBody, GrantRecord, MessageResponse,
        SubscriptionRequest, SubscriptionResponse, SubscriptionSummary, SubscriptionUpdate,
    },
};
use tracing::{debug, warn};
use url::Url;

use crate::config::join_url;

/// Parameters of one `/api/subvenciones` listing request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchQuery {
    pub filters: FilterSelection,
    pub limit: u32,
    pub active_only: bool,
}

impl SearchQuery {
    pub fn new(filters: FilterSelection, limit: u32) -> Self {
        Self {
            filters,
            limit,
            active_only: true,
        }
    }

    /// Fixed parameters first, then one pair per selected filter value.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("limit", self.limit.to_string())];
        if self.active_only {
            pairs.push(("activa", "true".to_string()));
        }
        pairs.extend(self.filters.query_pairs());
        pairs
    }
}

/// Remote operations consumed by the controllers.
#[async_trait]
pub trait SubsidyApi: Send + Sync {
    async fn filter_values(&self, field: FilterField) -> ClientResult<Vec<String>>;
    async fn regions(&self) -> ClientResult<Vec<CatalogEntry>>;
    async fn areas(&self) -> ClientResult<Vec<CatalogEntry>>;
    async fn search_grants(&self, query: &SearchQuery) -> ClientResult<Vec<GrantRecord>>;
    async fn grant(&self, id: GrantId) -> ClientResult<GrantRecord>;
    async fn calendar_url(&self) -> ClientResult<CalendarUrlResponse>;
    async fn create_subscription(
        &self,
        request: &SubscriptionRequest,
    ) -> ClientResult<SubscriptionResponse>;
    async fn confirm_subscription(&self, token: &str) -> ClientResult<()>;
    async fn subscription_status(&self, email: &str) -> ClientResult<SubscriptionSummary>;
    async fn update_subscription(
        &self,
        id: SubscriptionId,
        update: &SubscriptionUpdate,
    ) -> ClientResult<MessageResponse>;
    async fn cancel_subscription(&self, id: SubscriptionId) -> ClientResult<MessageResponse>;
}

pub struct HttpSubsidyApi {
    http: Client,
    base_url: String,
}

impl HttpSubsidyApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        join_url(&self.base_url, path)
    }

    /// `path` with `segment` appended as a single percent-encoded path segment.
    fn endpoint_with_segment(&self, path: &str, segment: &str) -> ClientResult<Url> {
        let mut url = Url::parse(&self.endpoint(path))
            .map_err(|err| ClientError::Network(format!("invalid API URL: {err}")))?;
        url.path_segments_mut()
            .map_err(|_| ClientError::Network(format!("invalid API URL: {}", self.base_url)))?
            .pop_if_empty()
            .push(segment);
        Ok(url)
    }

    async fn send_json<T: DeserializeOwned>(&self, request: RequestBuilder) -> ClientResult<T> {
        let response = send(request).await?;
        decode(response).await
    }
}

async fn send(request: RequestBuilder) -> ClientResult<Response> {
    let response = request
        .send()
        .await
        .map_err(network_error)?;

    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    // An unreadable error body still yields the status-only message.
    let detail = response
        .json::<ErrorBody>()
        .await
        .ok()
        .and_then(|body| body.detail);
    debug!(status = status.as_u16(), ?detail, "api request rejected");
    Err(ClientError::Server {
        status: status.as_u16(),
        detail,
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    response.json::<T>().await.map_err(|err| {
        warn!(error = %err, "failed to decode api response");
        ClientError::Network(format!("respuesta no válida del servidor: {err}"))
    })
}

fn network_error(err: reqwest::Error) -> ClientError {
    warn!(error = %err, "api request failed");
    ClientError::Network(format!("no se pudo conectar con el servidor: {err}"))
}

#[async_trait]
impl SubsidyApi for HttpSubsidyApi {
    async fn filter_values(&self, field: FilterField) -> ClientResult<Vec<String>> {
        let url = self.endpoint(&format!(
            "/api/subvenciones/valores/{}",
            field.catalog_segment()
        ));
        self.send_json(self.http.get(url)).await
    }

    async fn regions(&self) -> ClientResult<Vec<CatalogEntry>> {
        self.send_json(self.http.get(self.endpoint("/api/regiones")))
            .await
    }

    async fn areas(&self) -> ClientResult<Vec<CatalogEntry>> {
        self.send_json(self.http.get(self.endpoint("/api/areas"))).await
    }

    async fn search_grants(&self, query: &SearchQuery) -> ClientResult<Vec<GrantRecord>> {
        let request = self
            .http
            .get(self.endpoint("/api/subvenciones"))
            .query(&query.query_pairs());
        self.send_json(request).await
    }

    async fn grant(&self, id: GrantId) -> ClientResult<GrantRecord> {
        let url = self.endpoint(&format!("/api/subvenciones/{}", id.0));
        self.send_json(self.http.get(url)).await
    }

    async fn calendar_url(&self) -> ClientResult<CalendarUrlResponse> {
        self.send_json(self.http.get(self.endpoint("/api/calendar/url")))
            .await
    }

    async fn create_subscription(
        &self,
        request: &SubscriptionRequest,
    ) -> ClientResult<SubscriptionResponse> {
        let request = self
            .http
            .post(self.endpoint("/api/suscripcion/crear"))
            .json(request);
        self.send_json(request).await
    }

    async fn confirm_subscription(&self, token: &str) -> ClientResult<()> {
        let request = self
            .http
            .post(self.endpoint("/api/suscripcion/confirmar"))
            .query(&[("token", token)]);
        send(request).await?;
        Ok(())
    }

    async fn subscription_status(&self, email: &str) -> ClientResult<SubscriptionSummary> {
        let url = self.endpoint_with_segment("/api/suscripcion", email)?;
        self.send_json(self.http.get(url)).await
    }

    async fn update_subscription(
        &self,
        id: SubscriptionId,
        update: &SubscriptionUpdate,
    ) -> ClientResult<MessageResponse> {
        let url = self.endpoint(&format!("/api/suscripcion/{}", id.0));
        self.send_json(self.http.put(url).json(update)).await
    }

    async fn cancel_subscription(&self, id: SubscriptionId) -> ClientResult<MessageResponse> {
        let url = self.endpoint(&format!("/api/suscripcion/{}", id.0));
        self.send_json(self.http.delete(url)).await
    }
}

#[cfg(test)]
#[path = "tests/api_tests.rs"]
mod tests;
