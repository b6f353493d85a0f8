use super::*;

use shared::error::ClientError;

use crate::{fake_api::FakeApi, StatusKind};

fn handler(api: FakeApi) -> (ConfirmationHandler, Arc<FakeApi>, broadcast::Receiver<ClientEvent>) {
    let api = Arc::new(api);
    let (tx, rx) = broadcast::channel(8);
    (ConfirmationHandler::new(api.clone(), tx), api, rx)
}

#[test]
fn extracts_token_from_full_and_bare_links() {
    assert_eq!(
        extract_token("https://noti-subvenciones.vercel.app/?token=abc123").as_deref(),
        Some("abc123")
    );
    assert_eq!(
        extract_token("http://localhost:3000/index.html?lang=es&token=xyz#form").as_deref(),
        Some("xyz")
    );
    assert_eq!(extract_token("?token=abc123").as_deref(), Some("abc123"));
    assert_eq!(extract_token("token=a%2Bb").as_deref(), Some("a+b"));
}

#[test]
fn links_without_token_yield_none() {
    for link in [
        "",
        "https://noti-subvenciones.vercel.app/",
        "?lang=es",
        "?token=",
        "abc123",
    ] {
        assert_eq!(extract_token(link), None, "{link}");
    }
}

#[tokio::test]
async fn confirms_token_once_on_success() {
    let (handler, api, mut events) = handler(FakeApi::default());

    let outcome = handler.run(Some("https://example.org/?token=abc123")).await;
    assert_eq!(
        outcome,
        ConfirmationOutcome::Confirmed(StatusMessage::success(CONFIRMED_MESSAGE))
    );
    assert_eq!(
        *api.confirmations.lock().expect("lock"),
        vec!["abc123".to_string()]
    );
    assert!(matches!(
        events.try_recv(),
        Ok(ClientEvent::ConfirmationStatus(status)) if status.is_success()
    ));
}

#[tokio::test]
async fn not_found_reports_server_detail() {
    let (handler, api, _events) = handler(FakeApi::default().with_confirm_result(Err(
        ClientError::Server {
            status: 404,
            detail: Some("Token inválido".into()),
        },
    )));

    let outcome = handler.run(Some("?token=abc123")).await;
    let status = outcome.status().expect("status").clone();
    assert_eq!(status.kind, StatusKind::Error);
    assert!(status.text.contains("Token inválido"));
    assert_eq!(api.confirmations.lock().expect("lock").len(), 1);
}

#[tokio::test]
async fn missing_token_sends_nothing() {
    let (handler, api, mut events) = handler(FakeApi::default());
    assert_eq!(handler.run(None).await, ConfirmationOutcome::NoToken);
    assert_eq!(
        handler.run(Some("https://example.org/")).await,
        ConfirmationOutcome::NoToken
    );
    assert!(api.confirmations.lock().expect("lock").is_empty());
    assert!(!handler.has_run());
    assert!(events.try_recv().is_err());
}

#[tokio::test]
async fn second_run_is_a_no_op() {
    let (handler, api, _events) = handler(FakeApi::default());
    handler.run(Some("?token=abc123")).await;
    assert_eq!(
        handler.run(Some("?token=abc123")).await,
        ConfirmationOutcome::AlreadyRan
    );
    assert_eq!(api.confirmations.lock().expect("lock").len(), 1);
}
