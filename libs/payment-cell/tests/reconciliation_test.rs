// Payment reconciliation: signatures, idempotence, and checkout wiring.
use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use hmac::{Hmac, Mac};
use serde_json::json;
use sha2::Sha512;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use appointment_cell::models::CreateAppointmentRequest;
use appointment_cell::services::booking::AppointmentService;
use appointment_cell::services::store::MemoryStore;
use notification_cell::services::dispatcher::NotificationDispatcher;
use notification_cell::services::transport::QueueTransport;
use payment_cell::models::{InitializePaymentRequest, PaymentError};
use payment_cell::services::paystack::PaystackClient;
use payment_cell::services::reconciliation::PaymentService;
use shared_database::memory::MemoryCache;
use shared_models::appointment::{AppointmentStatus, PaymentStatus};
use shared_utils::test_utils::TestConfig;

const SECRET: &str = "sk_test_secret";

fn harness(provider_uri: &str) -> (PaymentService, Arc<MemoryCache>, Arc<QueueTransport>) {
    let cache = Arc::new(MemoryCache::new());
    let queue = Arc::new(QueueTransport::new());
    let appointments = AppointmentService::with_parts(
        Arc::new(MemoryStore::new(cache.clone())),
        MemoryStore::new(cache.clone()),
        Arc::new(NotificationDispatcher::with_transport(queue.clone())),
    );

    let mut config = TestConfig::default().to_app_config();
    config.paystack_secret_key = SECRET.to_string();
    let paystack = PaystackClient::new(&config).with_base_url(provider_uri);

    (
        PaymentService::with_parts(paystack, appointments, "http://localhost:5500"),
        cache,
        queue,
    )
}

async fn book(service: &PaymentService, amount: Option<f64>) -> String {
    service
        .appointments()
        .create_appointment(CreateAppointmentRequest {
            patient_name: Some("Ada Obi".to_string()),
            email: Some("ada@x.com".to_string()),
            phone: Some("+2348000000000".to_string()),
            service: Some("General Consultation".to_string()),
            date: Some("2025-12-01".to_string()),
            time: Some("10:00".to_string()),
            message: None,
            amount,
        })
        .await
        .unwrap()
        .id
}

fn sign(body: &[u8]) -> String {
    let mut mac = Hmac::<Sha512>::new_from_slice(SECRET.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

fn charge_success_body(appointment_id: &str, reference: &str) -> Vec<u8> {
    json!({
        "event": "charge.success",
        "data": {
            "status": "success",
            "reference": reference,
            "amount": 500000,
            "metadata": { "appointment_id": appointment_id }
        }
    })
    .to_string()
    .into_bytes()
}

async fn settle() {
    tokio::time::sleep(Duration::from_millis(50)).await;
}

#[tokio::test]
async fn forged_webhook_changes_nothing() {
    let (service, cache, queue) = harness("http://127.0.0.1:9");
    let id = book(&service, Some(5000.0)).await;

    let body = charge_success_body(&id, "PAY_1_ref00001");
    let err = service.handle_webhook(&body, "0badc0de").await.unwrap_err();
    assert_matches!(err, PaymentError::InvalidSignature);

    let row = cache.get(&id).await.unwrap();
    assert_eq!(row.status, AppointmentStatus::Pending);
    assert_eq!(row.payment_status, PaymentStatus::Pending);
    assert_eq!(row.payment_reference, None);

    settle().await;
    // only the booking email
    assert_eq!(queue.len(), 1);
}

#[tokio::test]
async fn signed_charge_success_confirms_the_booking() {
    let (service, cache, _) = harness("http://127.0.0.1:9");
    let id = book(&service, Some(5000.0)).await;

    let body = charge_success_body(&id, "PAY_2_ref00002");
    service.handle_webhook(&body, &sign(&body)).await.unwrap();

    let row = cache.get(&id).await.unwrap();
    assert_eq!(row.status, AppointmentStatus::Confirmed);
    assert_eq!(row.payment_status, PaymentStatus::Paid);
    assert_eq!(row.payment_reference.as_deref(), Some("PAY_2_ref00002"));
}

#[tokio::test]
async fn other_events_are_acknowledged_and_ignored() {
    let (service, cache, _) = harness("http://127.0.0.1:9");
    let id = book(&service, Some(5000.0)).await;

    let body = json!({ "event": "transfer.success", "data": {} })
        .to_string()
        .into_bytes();
    service.handle_webhook(&body, &sign(&body)).await.unwrap();

    let row = cache.get(&id).await.unwrap();
    assert_eq!(row.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn verify_then_webhook_applies_the_payment_once() {
    let server = MockServer::start().await;
    let (service, cache, queue) = harness(&server.uri());
    let id = book(&service, Some(5000.0)).await;

    Mock::given(method("GET"))
        .and(path("/transaction/verify/PAY_3_ref00003"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "success",
                "reference": "PAY_3_ref00003",
                "amount": 500000,
                "metadata": { "appointment_id": id }
            }
        })))
        .mount(&server)
        .await;

    let (appointment, applied) = service
        .verify_and_reconcile("PAY_3_ref00003")
        .await
        .unwrap();
    assert!(applied);
    assert_eq!(appointment.status, AppointmentStatus::Confirmed);

    // The provider pushes the same charge; nothing moves twice.
    let body = charge_success_body(&id, "PAY_3_ref00003");
    service.handle_webhook(&body, &sign(&body)).await.unwrap();

    let row = cache.get(&id).await.unwrap();
    assert_eq!(row.payment_status, PaymentStatus::Paid);

    settle().await;
    // booked + exactly one confirmation
    assert_eq!(queue.len(), 2);
}

#[tokio::test]
async fn failed_transaction_is_recorded_as_failed() {
    let server = MockServer::start().await;
    let (service, cache, _) = harness(&server.uri());
    let id = book(&service, Some(5000.0)).await;

    Mock::given(method("GET"))
        .and(path("/transaction/verify/PAY_4_ref00004"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Verification successful",
            "data": {
                "status": "abandoned",
                "reference": "PAY_4_ref00004",
                "amount": 500000,
                "metadata": { "appointment_id": id }
            }
        })))
        .mount(&server)
        .await;

    let err = service
        .verify_and_reconcile("PAY_4_ref00004")
        .await
        .unwrap_err();
    assert_matches!(err, PaymentError::NotSuccessful(_));

    let row = cache.get(&id).await.unwrap();
    assert_eq!(row.status, AppointmentStatus::Pending);
    assert_eq!(row.payment_status, PaymentStatus::Failed);
    assert_eq!(row.payment_reference.as_deref(), Some("PAY_4_ref00004"));
}

#[tokio::test]
async fn checkout_charges_in_kobo_and_records_the_reference() {
    let server = MockServer::start().await;
    let (service, cache, _) = harness(&server.uri());
    let id = book(&service, Some(5000.0)).await;

    Mock::given(method("POST"))
        .and(path("/transaction/initialize"))
        .and(body_partial_json(json!({
            "email": "ada@x.com",
            "amount": 500000,
            "metadata": { "appointment_id": id }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": true,
            "message": "Authorization URL created",
            "data": {
                "authorization_url": "https://checkout.paystack.com/abc123",
                "access_code": "abc123",
                "reference": "PAY_5_ref00005"
            }
        })))
        .mount(&server)
        .await;

    let (appointment, session) = service
        .initialize_checkout(InitializePaymentRequest {
            appointment_id: Some(id.clone()),
            amount: None,
        })
        .await
        .unwrap();

    assert_eq!(session.authorization_url, "https://checkout.paystack.com/abc123");
    assert_eq!(appointment.payment_reference.as_deref(), Some("PAY_5_ref00005"));
    assert_eq!(
        cache.get(&id).await.unwrap().payment_status,
        PaymentStatus::Pending
    );
}

fn unconfigured_harness() -> (PaymentService, Arc<MemoryCache>) {
    let cache = Arc::new(MemoryCache::new());
    let queue = Arc::new(QueueTransport::new());
    let appointments = AppointmentService::with_parts(
        Arc::new(MemoryStore::new(cache.clone())),
        MemoryStore::new(cache.clone()),
        Arc::new(NotificationDispatcher::with_transport(queue)),
    );
    let config = TestConfig::default().to_app_config();
    let paystack = PaystackClient::new(&config);
    (
        PaymentService::with_parts(paystack, appointments, "http://localhost:5500"),
        cache,
    )
}

#[tokio::test]
async fn unconfigured_provider_issues_a_test_mode_session() {
    let (service, _) = unconfigured_harness();

    let id = book(&service, Some(5000.0)).await;
    let (appointment, session) = service
        .initialize_checkout(InitializePaymentRequest {
            appointment_id: Some(id),
            amount: None,
        })
        .await
        .unwrap();

    assert_eq!(session.access_code, "test_mode");
    assert!(session.reference.starts_with("PAY_"));
    assert!(session.authorization_url.contains(&session.reference));
    assert_eq!(appointment.payment_reference, Some(session.reference));
}

#[tokio::test]
async fn test_mode_verify_applies_the_payment_without_a_provider() {
    let (service, cache) = unconfigured_harness();
    let id = book(&service, Some(5000.0)).await;

    let (_, session) = service
        .initialize_checkout(InitializePaymentRequest {
            appointment_id: Some(id.clone()),
            amount: None,
        })
        .await
        .unwrap();
    assert_eq!(session.access_code, "test_mode");

    let (appointment, applied) = service
        .verify_and_reconcile(&session.reference)
        .await
        .unwrap();
    assert!(applied);
    assert_eq!(appointment.status, AppointmentStatus::Confirmed);
    assert_eq!(appointment.payment_status, PaymentStatus::Paid);

    // Verifying again is a no-op, same as the provider-backed path.
    let (_, applied) = service
        .verify_and_reconcile(&session.reference)
        .await
        .unwrap();
    assert!(!applied);

    let row = cache.get(&id).await.unwrap();
    assert_eq!(row.payment_status, PaymentStatus::Paid);
}

#[tokio::test]
async fn test_mode_verify_rejects_a_reference_it_never_issued() {
    let (service, _) = unconfigured_harness();
    book(&service, Some(5000.0)).await;

    let err = service
        .verify_and_reconcile("PAY_0_madeup00")
        .await
        .unwrap_err();
    assert_matches!(
        err,
        PaymentError::Appointment(appointment_cell::models::AppointmentError::NotFound)
    );
}

#[tokio::test]
async fn provider_timeouts_surface_as_transport_errors() {
    let server = MockServer::start().await;
    let cache = Arc::new(MemoryCache::new());
    let queue = Arc::new(QueueTransport::new());
    let appointments = AppointmentService::with_parts(
        Arc::new(MemoryStore::new(cache.clone())),
        MemoryStore::new(cache.clone()),
        Arc::new(NotificationDispatcher::with_transport(queue)),
    );
    let mut config = TestConfig::default().to_app_config();
    config.paystack_secret_key = SECRET.to_string();
    let paystack = PaystackClient::new(&config)
        .with_base_url(&server.uri())
        .with_timeout(Duration::from_millis(100));
    let service = PaymentService::with_parts(paystack, appointments, "http://localhost:5500");
    let id = book(&service, Some(5000.0)).await;

    Mock::given(method("GET"))
        .and(path("/transaction/verify/PAY_6_ref00006"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_delay(Duration::from_millis(500))
                .set_body_json(json!({
                    "status": true,
                    "message": "Verification successful",
                    "data": {
                        "status": "success",
                        "reference": "PAY_6_ref00006",
                        "amount": 500000,
                        "metadata": { "appointment_id": id }
                    }
                })),
        )
        .mount(&server)
        .await;

    let err = service
        .verify_and_reconcile("PAY_6_ref00006")
        .await
        .unwrap_err();
    assert_matches!(err, PaymentError::Transport(_));

    // Nothing moved; the caller may retry.
    let row = cache.get(&id).await.unwrap();
    assert_eq!(row.payment_status, PaymentStatus::Pending);
}

#[tokio::test]
async fn unreachable_provider_surfaces_as_a_transport_error() {
    let (service, _, _) = harness("http://127.0.0.1:9");

    let err = service
        .verify_and_reconcile("PAY_7_ref00007")
        .await
        .unwrap_err();
    assert_matches!(err, PaymentError::Transport(_));
}

#[tokio::test]
async fn provider_rejection_is_definitive_not_transport() {
    let server = MockServer::start().await;
    let (service, _, _) = harness(&server.uri());

    Mock::given(method("GET"))
        .and(path("/transaction/verify/PAY_8_ref00008"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": false,
            "message": "Transaction reference not found"
        })))
        .mount(&server)
        .await;

    let err = service
        .verify_and_reconcile("PAY_8_ref00008")
        .await
        .unwrap_err();
    assert_matches!(err, PaymentError::Provider(msg) => {
        assert!(msg.contains("not found"));
    });
}

#[tokio::test]
async fn checkout_without_an_amount_is_rejected() {
    let (service, _, _) = harness("http://127.0.0.1:9");
    let id = book(&service, None).await;

    let err = service
        .initialize_checkout(InitializePaymentRequest {
            appointment_id: Some(id),
            amount: None,
        })
        .await
        .unwrap_err();
    assert_matches!(err, PaymentError::Validation(fields) => {
        assert_eq!(fields, vec!["amount".to_string()]);
    });
}
