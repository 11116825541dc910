use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use illustrator::asset::ImageAsset;
use illustrator::client::GenerationClient;
use illustrator::constants::CONFIGURATION_ERROR_MESSAGE;
use illustrator::orchestrator::RunStatus;
use illustrator::state::AppController;
use illustrator::web::{AppState, create_router};
use serde_json::{Value, json};
use url::Url;

const PNG_SIGNATURE: &[u8] = &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n'];

/// Provider stand-in: rejects prompts containing "reject", draws everything else.
async fn provider_generate(
    State(calls): State<Arc<AtomicUsize>>,
    Json(body): Json<Value>,
) -> axum::response::Response {
    calls.fetch_add(1, Ordering::SeqCst);
    let prompt = body["contents"][0]["parts"][1]["text"]
        .as_str()
        .unwrap_or_default()
        .to_string();

    if prompt.contains("reject") {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": {"code": 400, "message": "Request contains an invalid argument.", "status": "INVALID_ARGUMENT"}})),
        )
            .into_response();
    }
    Json(json!({"candidates": [{"content": {"role": "model", "parts": [
        {"text": format!("Reimagined {prompt}")},
        {"inlineData": {"mimeType": "image/png", "data": "iVBORw0KGgo="}}
    ]}}]}))
    .into_response()
}

async fn serve(app: Router) -> Url {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    Url::parse(&format!("http://{}", addr)).expect("url")
}

/// Starts a fake provider and a real proxy in front of it.
async fn start_stack(api_key: Option<&str>) -> (Url, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = Router::new()
        .route(
            "/v1beta/models/{call}",
            axum::routing::post(provider_generate),
        )
        .with_state(calls.clone());
    let provider_url = serve(provider).await;

    let proxy = create_router(None).with_state(AppState::new(
        api_key.map(str::to_string),
        provider_url,
    ));
    (serve(proxy).await, calls)
}

fn controller_for(server: &Url, prompts: &[&str]) -> AppController<GenerationClient> {
    let client = GenerationClient::new(server).expect("client");
    let mut controller = AppController::new(client);
    let first = controller.prompts()[0].id();
    for (index, prompt) in prompts.iter().enumerate() {
        let id = if index == 0 {
            first
        } else {
            controller.add_prompt()
        };
        controller.update_prompt(id, prompt).expect("update prompt");
    }
    controller.set_base_image(Some(
        ImageAsset::from_upload(PNG_SIGNATURE.to_vec()).expect("base image"),
    ));
    controller
}

#[tokio::test]
async fn unset_credential_fails_the_run_with_a_generic_message() {
    let (server, calls) = start_stack(None).await;
    let mut controller = controller_for(&server, &["in a watercolor style"]);

    let status = controller.generate().await.expect("run");

    assert_eq!(status, RunStatus::CompletedWithError);
    assert!(controller.results().is_empty());
    let error = controller.error().expect("error message");
    assert_eq!(error.lines().count(), 1);
    assert!(error.contains("\"in a watercolor style\""));
    assert!(error.contains(CONFIGURATION_ERROR_MESSAGE));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn variations_flow_through_the_proxy() {
    let (server, calls) = start_stack(Some("test-key")).await;
    let mut controller = controller_for(
        &server,
        &["in a watercolor style", "", "as a pencil sketch"],
    );

    let status = controller.generate().await.expect("run");

    assert_eq!(status, RunStatus::CompletedWithResults);
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    let results = controller.results();
    assert_eq!(results.len(), 2);
    assert_eq!(results[0].source_prompt, "in a watercolor style");
    assert_eq!(results[0].text, "Reimagined in a watercolor style");
    assert_eq!(results[1].source_prompt, "as a pencil sketch");
    assert_eq!(results[1].image_uri, "data:image/png;base64,iVBORw0KGgo=");
    assert!(controller.error().is_none());
}

#[tokio::test]
async fn provider_rejections_are_reported_per_prompt() {
    let (server, _calls) = start_stack(Some("test-key")).await;
    let mut controller = controller_for(&server, &["reject this one", "keep this one"]);

    let status = controller.generate().await.expect("run");

    assert_eq!(status, RunStatus::CompletedWithResults);
    assert_eq!(controller.results().len(), 1);
    assert_eq!(controller.results()[0].source_prompt, "keep this one");
    let error = controller.error().expect("error annotation");
    assert!(error.contains("\"reject this one\""));
    assert!(error.contains("Request contains an invalid argument."));
    assert!(!error.contains("test-key"));
}

#[tokio::test]
async fn base_image_can_be_generated_through_the_proxy() {
    let (server, _calls) = start_stack(Some("test-key")).await;
    let client = GenerationClient::new(&server).expect("client");
    let mut controller = AppController::new(client);

    controller
        .generate_base_image("a lighthouse at dusk")
        .await
        .expect("base image");

    let image = controller.base_image().expect("installed");
    assert_eq!(image.mime_type(), "image/png");
    assert_eq!(image.bytes(), PNG_SIGNATURE);
    assert_eq!(controller.status(), RunStatus::Idle);
}
