use thiserror::Error;

/// Failures surfaced by client operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// A required input is missing or inconsistent; no request was sent.
    #[error("{0}")]
    Validation(String),
    /// The request could not complete.
    #[error("{0}")]
    Network(String),
    /// Non-2xx response, optionally carrying the server's `detail`.
    #[error("{}", server_message(*status, detail.as_deref()))]
    Server { status: u16, detail: Option<String> },
    /// The backend answered but could not provide the resource.
    #[error("{0}")]
    Unavailable(String),
    /// The same form already has a request in flight.
    #[error("ya hay una petición en curso")]
    InFlight,
}

fn server_message(status: u16, detail: Option<&str>) -> String {
    match detail {
        Some(detail) if !detail.trim().is_empty() => detail.to_string(),
        _ => format!("Error HTTP {status}"),
    }
}

impl ClientError {
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Server { status, .. } => Some(*status),
            _ => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_error_displays_detail_verbatim() {
        let err = ClientError::Server {
            status: 400,
            detail: Some("Ya existe una suscripción activa para este email".into()),
        };
        assert_eq!(
            err.to_string(),
            "Ya existe una suscripción activa para este email"
        );
    }

    #[test]
    fn server_error_without_detail_falls_back_to_status() {
        let err = ClientError::Server {
            status: 502,
            detail: None,
        };
        assert_eq!(err.to_string(), "Error HTTP 502");
        assert_eq!(err.status(), Some(502));
    }
}
