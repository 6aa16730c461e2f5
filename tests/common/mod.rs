use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Form, Json, Router};
use reqwest::Client;
use serde_json::{Value, json};

use formrelay::config::{
    AirtableConfig, BypassPair, Config, FormConfig, RedirectConfig, TurnstileConfig,
};
use formrelay::state::AppState;

pub const SUCCESS_URL: &str = "https://form.test/success.html";
pub const INTERMEDIATE_URL: &str = "https://form.test/intermediate.html";
pub const SITE_KEY: &str = "0x-test-site-key";
pub const TURNSTILE_SECRET: &str = "test-turnstile-secret";
pub const AIRTABLE_KEY: &str = "test-airtable-key";

/// Token the mock siteverify accepts.
pub const VALID_TOKEN: &str = "valid-token";
/// Token that makes the mock siteverify answer with garbage.
pub const BROKEN_TOKEN: &str = "broken-token";
/// Token the mock siteverify only answers after `SLOW_VERIFY_DELAY`.
pub const SLOW_TOKEN: &str = "slow-token";
pub const SLOW_VERIFY_DELAY: Duration = Duration::from_secs(3);
/// Message that makes the mock Airtable reject the record.
pub const REJECTED_MESSAGE: &str = "please reject me";

/// One call received by the mock Airtable endpoint.
#[derive(Debug, Clone)]
pub struct RecordCall {
    pub base_id: String,
    pub table: String,
    pub authorization: Option<String>,
    pub fields: Value,
}

#[derive(Debug, Default)]
pub struct UpstreamCalls {
    pub verifications: Vec<HashMap<String, String>>,
    pub records: Vec<RecordCall>,
}

/// Stand-in for both Turnstile siteverify and the Airtable API.
#[derive(Clone)]
pub struct MockUpstream {
    pub addr: SocketAddr,
    calls: Arc<Mutex<UpstreamCalls>>,
}

impl MockUpstream {
    pub fn verify_url(&self) -> String {
        format!("http://{}/siteverify", self.addr)
    }

    pub fn airtable_url(&self) -> String {
        format!("http://{}/v0", self.addr)
    }

    pub fn verifications(&self) -> Vec<HashMap<String, String>> {
        self.calls.lock().unwrap().verifications.clone()
    }

    pub fn records(&self) -> Vec<RecordCall> {
        self.calls.lock().unwrap().records.clone()
    }
}

async fn siteverify(
    State(calls): State<Arc<Mutex<UpstreamCalls>>>,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    let token = form.get("response").cloned().unwrap_or_default();
    calls.lock().unwrap().verifications.push(form);

    match token.as_str() {
        VALID_TOKEN => Json(json!({
            "success": true,
            "error-codes": [],
            "hostname": "form.test",
        }))
        .into_response(),
        BROKEN_TOKEN => (StatusCode::BAD_GATEWAY, "upstream exploded").into_response(),
        SLOW_TOKEN => {
            tokio::time::sleep(SLOW_VERIFY_DELAY).await;
            Json(json!({ "success": true, "error-codes": [] })).into_response()
        }
        _ => Json(json!({
            "success": false,
            "error-codes": ["invalid-input-response"],
        }))
        .into_response(),
    }
}

async fn create_record(
    State(calls): State<Arc<Mutex<UpstreamCalls>>>,
    Path((base_id, table)): Path<(String, String)>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    let fields = body["fields"].clone();
    let rejected = fields["Message"] == REJECTED_MESSAGE;

    calls.lock().unwrap().records.push(RecordCall {
        base_id,
        table,
        authorization: headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string()),
        fields: fields.clone(),
    });

    if rejected {
        return (
            StatusCode::UNPROCESSABLE_ENTITY,
            Json(json!({
                "error": {
                    "type": "INVALID_VALUE_FOR_COLUMN",
                    "message": "Field \"Message\" cannot accept the provided value",
                }
            })),
        )
            .into_response();
    }

    Json(json!({
        "id": "recTEST0001",
        "createdTime": "2024-10-18T00:00:00.000Z",
        "fields": fields,
    }))
    .into_response()
}

pub async fn spawn_upstream() -> MockUpstream {
    let calls = Arc::new(Mutex::new(UpstreamCalls::default()));

    let app = Router::new()
        .route("/siteverify", post(siteverify))
        .route("/v0/{base_id}/{table}", post(create_record))
        .with_state(calls.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind mock upstream");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Mock upstream failed");
    });

    MockUpstream { addr, calls }
}

/// An address nothing listens on.
pub async fn dead_addr() -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running formrelay instance wired to a mock upstream.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub upstream: MockUpstream,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// POST form-urlencoded data, return the raw response.
    pub async fn post_form(&self, path: &str, data: &[(&str, &str)]) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .form(data)
            .send()
            .await
            .expect("form post failed")
    }
}

pub fn test_config(upstream: &MockUpstream) -> Config {
    Config {
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 64 * 1024,
        upstream_timeout: Duration::from_secs(5),
        trusted_proxies: vec![],
        log_level: "warn".to_string(),
        redirects: RedirectConfig {
            success_url: SUCCESS_URL.to_string(),
            intermediate_url: INTERMEDIATE_URL.to_string(),
        },
        form: FormConfig {
            action: "/submit".to_string(),
            failure_url: "https://form.test/failure.html".to_string(),
        },
        bypass: Some(BypassPair {
            first_name: "Ellen".to_string(),
            last_name: "Ripley".to_string(),
        }),
        turnstile: TurnstileConfig {
            secret: TURNSTILE_SECRET.to_string(),
            site_key: SITE_KEY.to_string(),
            verify_url: upstream.verify_url(),
        },
        airtable: AirtableConfig {
            api_key: AIRTABLE_KEY.to_string(),
            base_id: "appTEST".to_string(),
            table_name: "Contact Form".to_string(),
            api_url: upstream.airtable_url(),
        },
    }
}

pub async fn spawn_app() -> TestApp {
    spawn_app_with(|_| {}).await
}

/// Spawn the app after letting the caller adjust the default test config.
pub async fn spawn_app_with<F>(customize: F) -> TestApp
where
    F: FnOnce(&mut Config),
{
    let upstream = spawn_upstream().await;
    let mut config = test_config(&upstream);
    customize(&mut config);

    let state = Arc::new(AppState::from_config(config).expect("Failed to build app state"));
    let app = formrelay::build_app(state);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(
            listener,
            app.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .expect("Server failed");
    });

    let client = Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap();

    TestApp {
        addr,
        client,
        upstream,
    }
}

/// `Location` header of a redirect, split into base URL and query pairs.
pub fn redirect_target(resp: &reqwest::Response) -> (String, Vec<(String, String)>) {
    assert_eq!(resp.status(), reqwest::StatusCode::FOUND, "expected a 302");
    let location = resp
        .headers()
        .get("location")
        .and_then(|v| v.to_str().ok())
        .expect("redirect without Location");

    let url = reqwest::Url::parse(location).expect("Location is not a URL");
    let pairs = url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut base = url.clone();
    base.set_query(None);
    (base.to_string(), pairs)
}

pub fn assert_cors(resp: &reqwest::Response) {
    let headers = resp.headers();
    assert_eq!(headers["access-control-allow-origin"], "*");
    assert_eq!(headers["access-control-allow-methods"], "GET, POST, OPTIONS");
    assert_eq!(headers["access-control-allow-headers"], "Content-Type");
}
