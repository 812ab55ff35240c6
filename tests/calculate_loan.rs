use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use loan_calculator::app::App;
use loan_calculator::client::{ClientError, LoanClient};
use loan_calculator::form::{Field, LoanRequest, PropertyType};
use pretty_assertions::assert_eq;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Runtime;

#[derive(Clone, Default)]
struct Stub {
    payloads: Arc<Mutex<Vec<Value>>>,
    calls: Arc<AtomicUsize>,
}

impl Stub {
    fn payloads(&self) -> Vec<Value> {
        self.payloads.lock().expect("payload mutex poisoned").clone()
    }
}

/// Answers 220500 on the first call and 503 afterwards.
async fn flaky_calculate(
    State(stub): State<Stub>,
    Json(body): Json<Value>,
) -> (StatusCode, Json<Value>) {
    stub.payloads.lock().expect("payload mutex poisoned").push(body);
    if stub.calls.fetch_add(1, Ordering::SeqCst) == 0 {
        (StatusCode::OK, Json(json!({ "loanAmount": 220500.0 })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "error": "down" })))
    }
}

async fn spawn_stub(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind stub listener");
    let addr = listener.local_addr().expect("stub address");
    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("stub server");
    });
    format!("http://{addr}")
}

fn flaky_router(stub: Stub) -> Router {
    Router::new()
        .route("/calculate-loan", post(flaky_calculate))
        .with_state(stub)
}

fn wait_for_completion(app: &mut App) {
    for _ in 0..250 {
        if app.poll_completed() > 0 {
            return;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("calculation did not complete in time");
}

#[tokio::test]
async fn client_posts_payload_and_reads_loan_amount() {
    let stub = Stub::default();
    let base_url = spawn_stub(flaky_router(stub.clone())).await;
    let client = LoanClient::new(&format!("{base_url}/"));

    let request = LoanRequest {
        arv: 350_000,
        fico_score: Some(705),
        property_type: PropertyType::FixAndFlip,
        ..LoanRequest::default()
    };
    let result = client.calculate(&request).await.expect("calculation succeeds");

    assert_eq!(result.loan_amount, 220_500.0);
    assert_eq!(
        stub.payloads(),
        vec![json!({
            "propertyValue": 0,
            "ficoScore": 705,
            "constructionCost": 0,
            "purchasePrice": 0,
            "arv": 350000,
            "propertyType": "fixAndFlip",
        })]
    );
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let base_url = spawn_stub(Router::new().route(
        "/calculate-loan",
        post(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
    ))
    .await;

    let err = LoanClient::new(&base_url)
        .calculate(&LoanRequest::default())
        .await
        .expect_err("500 must fail");
    match err {
        ClientError::Status { status, body } => {
            assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
            assert_eq!(body, "boom");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn malformed_bodies_are_errors() {
    let base_url = spawn_stub(
        Router::new()
            .route("/calculate-loan", post(|| async { "not json" }))
            .route(
                "/typed/calculate-loan",
                post(|| async { Json(json!({ "loanAmount": "lots" })) }),
            ),
    )
    .await;

    for base in [base_url.clone(), format!("{base_url}/typed")] {
        let err = LoanClient::new(&base)
            .calculate(&LoanRequest::default())
            .await
            .expect_err("malformed body must fail");
        assert!(
            matches!(err, ClientError::MalformedResponse(_)),
            "{base}: {err}"
        );
    }
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .expect("reserve port")
        .port();

    let err = LoanClient::new(&format!("http://127.0.0.1:{port}"))
        .calculate(&LoanRequest::default())
        .await
        .expect_err("closed port must fail");
    assert!(matches!(err, ClientError::Transport { .. }), "{err}");
}

#[test]
fn empty_form_still_submits_zeroes() {
    let runtime = Runtime::new().expect("runtime");
    let stub = Stub::default();
    let base_url = runtime.block_on(spawn_stub(flaky_router(stub.clone())));
    let mut app = App::new(LoanClient::new(&base_url), runtime.handle().clone());

    app.submit();
    wait_for_completion(&mut app);

    assert_eq!(
        stub.payloads(),
        vec![json!({
            "propertyValue": 0,
            "ficoScore": null,
            "constructionCost": 0,
            "purchasePrice": 0,
            "arv": 0,
            "propertyType": "residential",
        })]
    );
    let result = app.result().expect("result stored");
    assert_eq!(result.display.formula, "(0.8 * min(0, 0)) * 1 = 220500.00");
}

#[test]
fn failed_call_leaves_displayed_result_unchanged() {
    let runtime = Runtime::new().expect("runtime");
    let stub = Stub::default();
    let base_url = runtime.block_on(spawn_stub(flaky_router(stub.clone())));
    let mut app = App::new(LoanClient::new(&base_url), runtime.handle().clone());

    app.form_mut().on_field_change(Field::PropertyType, "fixAndFlip");
    app.form_mut().on_field_change(Field::Arv, "350,000");
    app.form_mut().on_field_change(Field::FicoScore, "705");
    app.submit();
    wait_for_completion(&mut app);
    let first = app.result().cloned().expect("first result stored");
    assert_eq!(first.display.formula, "(0.7 * 350000) * 0.9 = 220500.00");

    // Edits after a result do not change what is displayed until a new one lands.
    app.form_mut().on_field_change(Field::Arv, "1");
    app.submit();
    wait_for_completion(&mut app);

    assert_eq!(stub.payloads().len(), 2);
    assert_eq!(app.result().cloned(), Some(first));
}
