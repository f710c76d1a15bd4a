use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use eventdesk::api::EntityApi;
use eventdesk::models::{Event, EventStatus, Participant, PaymentStatus};
use eventdesk::services::check_in_service::{self, CheckInMode, CheckInOutcome};
use eventdesk::services::error::FlowError;

const APP: &str = "test-app";

fn paid_event() -> Event {
    Event {
        id: "E1".to_string(),
        title: "Workshop".to_string(),
        description: String::new(),
        date: "2026-08-06".to_string(),
        start_time: "19:00".to_string(),
        end_time: "21:00".to_string(),
        location: "Auditório".to_string(),
        event_type: "presencial".to_string(),
        is_paid: true,
        price: 50.0,
        pix_code: String::new(),
        registration_limit: None,
        has_certificate: false,
        certificate_hours: None,
        image_url: String::new(),
        status: EventStatus::Ativo,
        is_periodic: false,
        periodic_dates: vec![],
        total_sessions: 1,
        organizer_id: "U1".to_string(),
        organizer_name: "Ana".to_string(),
        created_date: String::new(),
    }
}

fn pending_participant_json() -> serde_json::Value {
    json!({
        "id": "P1",
        "event_id": "E1",
        "registration_number": "WOR-123456",
        "cpf": "52998224725",
        "full_name": "Maria Silva",
        "email": "maria@example.com",
        "qr_code": "E1-52998224725-1700000000000",
        "payment_status": "pendente",
        "payment_method": "antecipado",
        "payment_proof_url": "",
        "check_in_status": false,
        "attended_sessions": [],
        "sessions_attended_count": 0,
        "attendance_percentage": 0,
        "certificate_issued": false
    })
}

async fn mock_cpf_lookup(server: &MockServer, rows: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/apps/{}/entities/Participant", APP)))
        .and(query_param("event_id", "E1"))
        .and(query_param("cpf", "52998224725"))
        .respond_with(ResponseTemplate::new(200).set_body_json(rows))
        .mount(server)
        .await;
}

#[tokio::test]
async fn pending_payment_returns_gate_without_updating() {
    let server = MockServer::start().await;
    let api = EntityApi::new(server.uri(), APP);
    mock_cpf_lookup(&server, json!([pending_participant_json()])).await;
    // No PATCH mock mounted: an update attempt would fail the test loudly.

    let outcome = check_in_service::check_in(
        &api,
        None,
        &paid_event(),
        CheckInMode::Cpf,
        "529.982.247-25",
    )
    .await
    .unwrap();

    match outcome {
        CheckInOutcome::PaymentPending(p) => {
            assert_eq!(p.id, "P1");
            assert_eq!(p.payment_status, PaymentStatus::Pendente);
            assert!(p.attended_sessions.is_empty());
        }
        other => panic!("expected payment gate, got {:?}", other),
    }
}

#[tokio::test]
async fn confirmation_flips_payment_and_records_attendance_in_one_update() {
    let server = MockServer::start().await;
    let api = EntityApi::new(server.uri(), APP);

    let today = check_in_service::today_iso();
    let updated = {
        let mut p = pending_participant_json();
        p["payment_status"] = json!("pago");
        p["check_in_status"] = json!(true);
        p["attended_sessions"] = json!([today.clone()]);
        p["sessions_attended_count"] = json!(1);
        p["attendance_percentage"] = json!(100);
        p
    };

    // The single conditional update must carry the payment transition and
    // the recomputed attendance fields together.
    Mock::given(method("PATCH"))
        .and(path(format!("/api/v1/apps/{}/entities/Participant/P1", APP)))
        .and(body_partial_json(json!({
            "payment_status": "pago",
            "check_in_status": true,
            "attended_sessions": [today.clone()],
            "sessions_attended_count": 1,
            "attendance_percentage": 100,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&server)
        .await;

    let participant: Participant = serde_json::from_value(pending_participant_json()).unwrap();
    let result = check_in_service::confirm_payment_and_check_in(
        &api,
        None,
        &paid_event(),
        &participant,
        true,
    )
    .await
    .unwrap();

    assert_eq!(result.payment_status, PaymentStatus::Pago);
    assert!(result.check_in_status);
    assert_eq!(result.attended_sessions, vec![today]);
    assert_eq!(result.attendance_percentage, 100);
}

#[tokio::test]
async fn confirmation_without_acknowledgment_is_rejected_before_any_call() {
    let server = MockServer::start().await;
    let api = EntityApi::new(server.uri(), APP);

    let participant: Participant = serde_json::from_value(pending_participant_json()).unwrap();
    let result =
        check_in_service::confirm_payment_and_check_in(&api, None, &paid_event(), &participant, false)
            .await;

    assert!(matches!(result, Err(FlowError::Validation(_))));
}

#[tokio::test]
async fn unknown_cpf_is_not_found() {
    let server = MockServer::start().await;
    let api = EntityApi::new(server.uri(), APP);
    mock_cpf_lookup(&server, json!([])).await;

    let result = check_in_service::check_in(
        &api,
        None,
        &paid_event(),
        CheckInMode::Cpf,
        "52998224725",
    )
    .await;

    assert!(matches!(result, Err(FlowError::NotFound(_))));
}

#[tokio::test]
async fn same_day_duplicate_is_rejected_without_update() {
    let server = MockServer::start().await;
    let api = EntityApi::new(server.uri(), APP);

    let mut row = pending_participant_json();
    row["payment_status"] = json!("pago");
    row["check_in_status"] = json!(true);
    row["attended_sessions"] = json!([check_in_service::today_iso()]);
    row["sessions_attended_count"] = json!(1);
    mock_cpf_lookup(&server, json!([row])).await;

    let result = check_in_service::check_in(
        &api,
        None,
        &paid_event(),
        CheckInMode::Cpf,
        "52998224725",
    )
    .await;

    assert!(matches!(result, Err(FlowError::DuplicateCheckIn)));
}

#[tokio::test]
async fn qr_lookup_uses_the_payload_as_key() {
    let server = MockServer::start().await;
    let api = EntityApi::new(server.uri(), APP);

    let mut row = pending_participant_json();
    row["payment_status"] = json!("isento");
    Mock::given(method("GET"))
        .and(path(format!("/api/v1/apps/{}/entities/Participant", APP)))
        .and(query_param("event_id", "E1"))
        .and(query_param("qr_code", "E1-52998224725-1700000000000"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([row])))
        .mount(&server)
        .await;

    let today = check_in_service::today_iso();
    let mut updated = pending_participant_json();
    updated["payment_status"] = json!("isento");
    updated["check_in_status"] = json!(true);
    updated["attended_sessions"] = json!([today]);
    updated["sessions_attended_count"] = json!(1);
    updated["attendance_percentage"] = json!(100);
    Mock::given(method("PATCH"))
        .and(path(format!("/api/v1/apps/{}/entities/Participant/P1", APP)))
        .respond_with(ResponseTemplate::new(200).set_body_json(updated))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = check_in_service::check_in(
        &api,
        None,
        &paid_event(),
        CheckInMode::Qr,
        "E1-52998224725-1700000000000",
    )
    .await
    .unwrap();

    match outcome {
        CheckInOutcome::Recorded(p) => {
            assert!(p.check_in_status);
            assert_eq!(p.sessions_attended_count, 1);
        }
        other => panic!("expected recorded attendance, got {:?}", other),
    }
}
