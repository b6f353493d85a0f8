use std::sync::Arc;

use shared::{
    domain::{AreaId, EmailFrequency, FilterSelection, RegionId},
    error::{ClientError, ClientResult},
    protocol::{SubscriptionRequest, SubscriptionResponse, SubscriptionUpdate},
};
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::{
    api::SubsidyApi, filters::FilterState, inflight::InFlight, ClientEvent, StatusMessage,
};

pub const EMAIL_REQUIRED: &str = "El email es obligatorio";
pub const BUDGET_RANGE_INVALID: &str =
    "El presupuesto mínimo no puede ser mayor que el presupuesto máximo";
pub const NO_CHANGES: &str = "No hay cambios que aplicar";

/// User input of the subscription form.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubscriptionForm {
    pub email: String,
    pub nombre: String,
    pub presupuesto_min: Option<f64>,
    pub presupuesto_max: Option<f64>,
    pub regiones: Vec<RegionId>,
    pub areas_tematicas: Vec<AreaId>,
    pub frecuencia_email: EmailFrequency,
}

impl SubscriptionForm {
    pub fn new(email: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            ..Self::default()
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Validates the form and embeds `filters` when any are active.
    pub fn to_request(&self, filters: &FilterSelection) -> ClientResult<SubscriptionRequest> {
        let email = self.email.trim();
        if email.is_empty() {
            return Err(ClientError::validation(EMAIL_REQUIRED));
        }

        let presupuesto_min = positive(self.presupuesto_min);
        let presupuesto_max = positive(self.presupuesto_max);
        if let (Some(min), Some(max)) = (presupuesto_min, presupuesto_max) {
            if min > max {
                return Err(ClientError::validation(BUDGET_RANGE_INVALID));
            }
        }

        let nombre = self.nombre.trim();
        Ok(SubscriptionRequest {
            email: email.to_string(),
            nombre: (!nombre.is_empty()).then(|| nombre.to_string()),
            regiones: non_empty(&self.regiones),
            areas_tematicas: non_empty(&self.areas_tematicas),
            presupuesto_min,
            presupuesto_max,
            notificar_email: true,
            frecuencia_email: self.frecuencia_email,
            activa: true,
            filtros_json: (!filters.is_empty()).then(|| filters.clone()),
        })
    }
}

/// Rejects updates that would change nothing or leave an inverted budget range.
pub fn validate_update(update: &SubscriptionUpdate) -> ClientResult<()> {
    if update.is_empty() {
        return Err(ClientError::validation(NO_CHANGES));
    }
    if let (Some(min), Some(max)) = (update.presupuesto_min, update.presupuesto_max) {
        if min > max {
            return Err(ClientError::validation(BUDGET_RANGE_INVALID));
        }
    }
    Ok(())
}

/// Zero, negative and non-finite amounts mean "no bound".
fn positive(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

fn non_empty<T: Clone>(values: &[T]) -> Option<Vec<T>> {
    (!values.is_empty()).then(|| values.to_vec())
}

pub fn success_message(
    request: &SubscriptionRequest,
    response: &SubscriptionResponse,
) -> StatusMessage {
    let mut text = format!(
        "¡Suscripción creada para {}! Revisa tu email para confirmar.",
        request.email
    );
    match &request.filtros_json {
        Some(filters) => {
            let summary = filters
                .iter()
                .map(|(field, values)| format!("{}: {}", field.label(), values.join(", ")))
                .collect::<Vec<_>>()
                .join("; ");
            text.push_str(&format!(" Filtros aplicados: {summary}."));
        }
        None => text.push_str(" Sin filtros: recibirás avisos de todas las convocatorias."),
    }
    if let Some(url) = response
        .calendar_url
        .as_deref()
        .filter(|url| !url.trim().is_empty())
    {
        text.push_str(&format!("\nVer calendario: {url}"));
    }
    StatusMessage::success(text)
}

pub fn failure_message(err: &ClientError) -> StatusMessage {
    StatusMessage::error(format!("Error: {err}"))
}

pub struct SubscriptionController {
    api: Arc<dyn SubsidyApi>,
    filters: FilterState,
    in_flight: InFlight,
    events: broadcast::Sender<ClientEvent>,
}

impl SubscriptionController {
    pub(crate) fn new(
        api: Arc<dyn SubsidyApi>,
        filters: FilterState,
        events: broadcast::Sender<ClientEvent>,
    ) -> Self {
        Self {
            api,
            filters,
            in_flight: InFlight::default(),
            events,
        }
    }

    pub fn is_submitting(&self) -> bool {
        self.in_flight.is_busy()
    }

    /// Submits `form`. On success the form is reset; on any failure it is left
    /// as the user filled it.
    pub async fn submit(&self, form: &mut SubscriptionForm) -> StatusMessage {
        let status = match self.try_submit(form).await {
            Ok((request, response)) => {
                info!(
                    email = %request.email,
                    filters = request.filtros_json.is_some(),
                    "subscription created"
                );
                form.reset();
                success_message(&request, &response)
            }
            Err(err) => {
                warn!(error = %err, "subscription failed");
                failure_message(&err)
            }
        };
        let _ = self
            .events
            .send(ClientEvent::SubscriptionStatus(status.clone()));
        status
    }

    async fn try_submit(
        &self,
        form: &SubscriptionForm,
    ) -> ClientResult<(SubscriptionRequest, SubscriptionResponse)> {
        let _guard = self.in_flight.acquire()?;
        let request = form.to_request(&self.filters.snapshot())?;
        let response = self.api.create_subscription(&request).await?;
        Ok((request, response))
    }
}

#[cfg(test)]
#[path = "tests/subscription_tests.rs"]
mod tests;
