use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use tokio::sync::broadcast;
use tracing::{info, warn};
use url::{form_urlencoded, Url};

use crate::{api::SubsidyApi, ClientEvent, StatusMessage};

pub const TOKEN_PARAM: &str = "token";
pub const CONFIRMED_MESSAGE: &str =
    "¡Suscripción confirmada! Ya estás recibiendo notificaciones.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    /// The link carried no token; nothing was sent.
    NoToken,
    /// The handler already ran once.
    AlreadyRan,
    Confirmed(StatusMessage),
    Failed(StatusMessage),
}

impl ConfirmationOutcome {
    pub fn status(&self) -> Option<&StatusMessage> {
        match self {
            ConfirmationOutcome::Confirmed(status) | ConfirmationOutcome::Failed(status) => {
                Some(status)
            }
            ConfirmationOutcome::NoToken | ConfirmationOutcome::AlreadyRan => None,
        }
    }
}

/// Reads the `token` query parameter from a full URL or a bare `?a=b` query.
pub fn extract_token(link: &str) -> Option<String> {
    let link = link.trim();
    let token = match Url::parse(link) {
        Ok(url) => find_token(url.query_pairs()),
        Err(_) => {
            let query = link.split_once('?').map_or(link, |(_, query)| query);
            let query = query.split('#').next().unwrap_or_default();
            find_token(form_urlencoded::parse(query.as_bytes()))
        }
    };
    token.filter(|token| !token.trim().is_empty())
}

fn find_token<'a>(
    mut pairs: impl Iterator<Item = (std::borrow::Cow<'a, str>, std::borrow::Cow<'a, str>)>,
) -> Option<String> {
    pairs
        .find(|(key, _)| key == TOKEN_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// One-shot confirmation of a pending subscription.
pub struct ConfirmationHandler {
    api: Arc<dyn SubsidyApi>,
    ran: AtomicBool,
    events: broadcast::Sender<ClientEvent>,
}

impl ConfirmationHandler {
    pub(crate) fn new(api: Arc<dyn SubsidyApi>, events: broadcast::Sender<ClientEvent>) -> Self {
        Self {
            api,
            ran: AtomicBool::new(false),
            events,
        }
    }

    pub fn has_run(&self) -> bool {
        self.ran.load(Ordering::Acquire)
    }

    /// Confirms the token found in `link`, if any.
    pub async fn run(&self, link: Option<&str>) -> ConfirmationOutcome {
        match link.and_then(extract_token) {
            Some(token) => self.confirm(&token).await,
            None => ConfirmationOutcome::NoToken,
        }
    }

    pub async fn confirm(&self, token: &str) -> ConfirmationOutcome {
        if self.ran.swap(true, Ordering::AcqRel) {
            return ConfirmationOutcome::AlreadyRan;
        }

        let outcome = match self.api.confirm_subscription(token).await {
            Ok(()) => {
                info!("subscription confirmed");
                ConfirmationOutcome::Confirmed(StatusMessage::success(CONFIRMED_MESSAGE))
            }
            Err(err) => {
                warn!(error = %err, "subscription confirmation failed");
                ConfirmationOutcome::Failed(StatusMessage::error(format!(
                    "Error al confirmar suscripción: {err}"
                )))
            }
        };

        if let Some(status) = outcome.status() {
            let _ = self
                .events
                .send(ClientEvent::ConfirmationStatus(status.clone()));
        }
        outcome
    }
}

#[cfg(test)]
#[path = "tests/confirmation_tests.rs"]
mod tests;
