use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use reqwest::Url;
use roster_core::screen::CustomerScreen;
use roster_core::{
    CacheSettings, CachedDirectory, DirectoryGateway, FetchErrorKind, ScreenState, UserType,
};
use roster_graphql::GraphqlDirectoryGateway;
use secrecy::SecretString;
use serde_json::{json, Value};

#[derive(Clone, Copy)]
enum StubMode {
    Directory,
    GraphqlErrors,
    ServerError,
    Slow,
}

#[derive(Clone)]
struct StubState {
    mode: StubMode,
    requests: Arc<Mutex<Vec<(Value, Option<String>)>>>,
}

async fn graphql(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let api_key =
        headers.get("x-api-key").and_then(|value| value.to_str().ok()).map(str::to_string);
    state.requests.lock().expect("requests lock").push((body.clone(), api_key));

    match state.mode {
        StubMode::Directory => (StatusCode::OK, Json(directory_for(&body["variables"]["role"]))),
        StubMode::GraphqlErrors => (
            StatusCode::OK,
            Json(json!({ "data": null, "errors": [{ "message": "not authorized" }] })),
        ),
        StubMode::ServerError => {
            (StatusCode::INTERNAL_SERVER_ERROR, Json(json!({ "message": "boom" })))
        }
        StubMode::Slow => {
            tokio::time::sleep(Duration::from_secs(2)).await;
            (StatusCode::OK, Json(directory_for(&body["variables"]["role"])))
        }
    }
}

fn directory_for(role: &Value) -> Value {
    let items = match role.as_str() {
        Some("ADMIN") => json!([
            { "id": 1, "name": "Alice", "email": "alice@example.com", "role": "Admin" }
        ]),
        Some("MANAGER") => json!([
            { "id": 2, "name": "Bob", "email": "bob@example.com", "role": "Manager" },
            { "id": 3, "name": "Thomas", "email": "thomas@example.com", "role": "Manager" }
        ]),
        _ => json!([]),
    };
    json!({ "data": { "listZellerCustomers": { "items": items, "nextToken": null } } })
}

async fn spawn_stub(mode: StubMode) -> (SocketAddr, StubState) {
    let state = StubState { mode, requests: Arc::new(Mutex::new(Vec::new())) };
    let router = Router::new().route("/graphql", post(graphql)).with_state(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind stub");
    let address = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    (address, state)
}

fn gateway(address: SocketAddr, timeout: Duration) -> GraphqlDirectoryGateway {
    let endpoint = Url::parse(&format!("http://{address}/graphql")).expect("endpoint url");
    GraphqlDirectoryGateway::new(endpoint, timeout).expect("gateway should build")
}

#[tokio::test]
async fn lists_customers_with_uppercase_role_and_api_key() {
    let (address, state) = spawn_stub(StubMode::Directory).await;
    let gateway = gateway(address, Duration::from_secs(5))
        .with_api_key("x-api-key", SecretString::from("local-dev-key".to_string()))
        .expect("api key should be accepted");

    let snapshot = gateway.list_customers(UserType::Manager).await.expect("fetch should succeed");

    assert_eq!(snapshot.role, UserType::Manager);
    let names: Vec<&str> = snapshot.customers.iter().map(|c| c.name.as_str()).collect();
    assert_eq!(names, vec!["Bob", "Thomas"]);
    assert_eq!(snapshot.customers[0].id.as_str(), "2");

    let requests = state.requests.lock().expect("requests lock");
    assert_eq!(requests.len(), 1);
    let (body, api_key) = &requests[0];
    assert_eq!(body["operationName"], "ListZellerCustomers");
    assert_eq!(body["variables"]["role"], "MANAGER");
    assert_eq!(api_key.as_deref(), Some("local-dev-key"));
}

#[tokio::test]
async fn omits_api_key_header_when_unset() {
    let (address, state) = spawn_stub(StubMode::Directory).await;

    gateway(address, Duration::from_secs(5))
        .list_customers(UserType::Admin)
        .await
        .expect("fetch should succeed");

    let requests = state.requests.lock().expect("requests lock");
    assert_eq!(requests[0].1, None);
}

#[tokio::test]
async fn graphql_errors_become_fetch_errors() {
    let (address, _state) = spawn_stub(StubMode::GraphqlErrors).await;

    let error = gateway(address, Duration::from_secs(5))
        .list_customers(UserType::Admin)
        .await
        .expect_err("errors array should fail the fetch");

    assert_eq!(error.kind, FetchErrorKind::Graphql);
    assert_eq!(error.message, "not authorized");
}

#[tokio::test]
async fn server_errors_become_status_errors() {
    let (address, _state) = spawn_stub(StubMode::ServerError).await;

    let error = gateway(address, Duration::from_secs(5))
        .list_customers(UserType::Admin)
        .await
        .expect_err("HTTP 500 should fail the fetch");

    assert_eq!(error.kind, FetchErrorKind::Status);
    assert!(error.message.contains("HTTP 500"));
}

#[tokio::test]
async fn slow_endpoints_time_out() {
    let (address, _state) = spawn_stub(StubMode::Slow).await;

    let error = gateway(address, Duration::from_millis(200))
        .list_customers(UserType::Admin)
        .await
        .expect_err("slow response should time out");

    assert_eq!(error.kind, FetchErrorKind::Timeout);
}

#[tokio::test]
async fn unreachable_endpoints_are_transport_errors() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let address = listener.local_addr().expect("address");
    drop(listener);

    let error = gateway(address, Duration::from_secs(2))
        .list_customers(UserType::Admin)
        .await
        .expect_err("closed port should fail");

    assert_eq!(error.kind, FetchErrorKind::Transport);
}

#[tokio::test]
async fn screen_reconciles_against_a_live_endpoint() {
    let (address, state) = spawn_stub(StubMode::Directory).await;
    let directory =
        CachedDirectory::new(gateway(address, Duration::from_secs(5)), CacheSettings::default());
    let mut screen = CustomerScreen::new(directory, UserType::Admin);

    let view = screen.mount().await.expect("mount");
    assert_eq!(view.items.len(), 1);
    assert_eq!(view.items[0].name, "Alice");

    screen.set_search_text("ali");
    let view = screen.select_role(UserType::Manager).await.expect("select manager");
    assert_eq!(view.search_text, "");
    assert_eq!(view.items.len(), 2);

    let view = screen.set_search_text("thom");
    assert_eq!(view.items.len(), 1);

    screen.select_role(UserType::Admin).await.expect("back to admin");
    assert_eq!(state.requests.lock().expect("requests lock").len(), 2, "admin came from cache");

    screen.refresh().await.expect("refresh");
    assert_eq!(state.requests.lock().expect("requests lock").len(), 3);
    assert_eq!(screen.state(), ScreenState::Ready);
}
