use serde_json::{json, Value};
use tracing::warn;

use crate::api::{participants, EntityApi};
use crate::models::{Event, Participant, PaymentStatus};
use crate::services::cpf::validate_cpf;
use crate::services::error::FlowError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckInMode {
    Qr,
    Cpf,
}

impl CheckInMode {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "qr" => Some(CheckInMode::Qr),
            "cpf" => Some(CheckInMode::Cpf),
            _ => None,
        }
    }
}

#[derive(Debug)]
pub enum CheckInOutcome {
    /// Attendance recorded and persisted.
    Recorded(Participant),
    /// Paid event and the participant has not paid; nothing was persisted.
    /// The caller must present the payment-confirmation step.
    PaymentPending(Participant),
}

/// Resolve a participant by QR payload or CPF and run the admission gate.
pub async fn check_in(
    api: &EntityApi,
    token: Option<&str>,
    event: &Event,
    mode: CheckInMode,
    value: &str,
) -> Result<CheckInOutcome, FlowError> {
    let participant = resolve_participant(api, token, &event.id, mode, value).await?;
    let today = today_iso();

    match evaluate_admission(event, &participant, &today)? {
        Admission::NeedsPayment => Ok(CheckInOutcome::PaymentPending(participant)),
        Admission::Admit => {
            let patch = attendance_patch(&participant, event.total_sessions, &today, &now_iso());
            let updated =
                participants::update_participant(api, token, &participant.id, &patch).await?;
            Ok(CheckInOutcome::Recorded(updated))
        }
    }
}

/// On-site payment override: one conditional update carrying the payment
/// transition together with the attendance fields, so a failure leaves the
/// participant untouched instead of half-updated.
pub async fn confirm_payment_and_check_in(
    api: &EntityApi,
    token: Option<&str>,
    event: &Event,
    participant: &Participant,
    acknowledged: bool,
) -> Result<Participant, FlowError> {
    if !acknowledged {
        return Err(FlowError::validation(
            "Confirme o recebimento do pagamento para continuar.",
        ));
    }

    let today = today_iso();
    let mut patch = attendance_patch(participant, event.total_sessions, &today, &now_iso());
    patch["payment_status"] = json!(PaymentStatus::Pago.as_str());
    let updated = participants::update_participant(api, token, &participant.id, &patch).await?;
    Ok(updated)
}

async fn resolve_participant(
    api: &EntityApi,
    token: Option<&str>,
    event_id: &str,
    mode: CheckInMode,
    value: &str,
) -> Result<Participant, FlowError> {
    let matches = match mode {
        CheckInMode::Cpf => {
            let digits = validate_cpf(value)?;
            participants::find_by_cpf(api, token, event_id, &digits).await?
        }
        CheckInMode::Qr => participants::find_by_qr_code(api, token, event_id, value).await?,
    };

    if matches.len() > 1 {
        // Uniqueness is enforced at registration; if the store still holds
        // duplicates the first match wins so staff are not blocked at the door.
        warn!(
            "ambiguous check-in lookup for event {}: {} matches",
            event_id,
            matches.len()
        );
    }

    matches
        .into_iter()
        .next()
        .ok_or(FlowError::NotFound("Participante não encontrado"))
}

enum Admission {
    Admit,
    NeedsPayment,
}

/// Same-day dedup first, then the payment gate. Day granularity: one
/// attendance per calendar date, regardless of session timestamps.
fn evaluate_admission(
    event: &Event,
    participant: &Participant,
    today: &str,
) -> Result<Admission, FlowError> {
    if participant.attended_sessions.iter().any(|d| d == today) {
        return Err(FlowError::DuplicateCheckIn);
    }

    if event.is_paid
        && participant.payment_status != PaymentStatus::Pago
        && participant.payment_status != PaymentStatus::Isento
    {
        return Ok(Admission::NeedsPayment);
    }

    Ok(Admission::Admit)
}

/// Attendance fields after appending `today`: the counters are always
/// derived from the session list, never adjusted independently.
fn attendance_patch(
    participant: &Participant,
    total_sessions: i64,
    today: &str,
    now: &str,
) -> Value {
    let mut sessions = participant.attended_sessions.clone();
    if !sessions.iter().any(|d| d == today) {
        sessions.push(today.to_string());
    }

    let total = total_sessions.max(1);
    let count = sessions.len() as i64;
    let percentage = ((count as f64 / total as f64) * 100.0).round() as i64;

    json!({
        "check_in_status": true,
        "check_in_date": now,
        "attended_sessions": sessions,
        "sessions_attended_count": count,
        "attendance_percentage": percentage,
    })
}

pub fn today_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%d").to_string()
}

fn now_iso() -> String {
    chrono::Utc::now().to_rfc3339()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(is_paid: bool, total_sessions: i64) -> Event {
        Event {
            id: "E1".to_string(),
            title: "Workshop".to_string(),
            description: String::new(),
            date: "2026-08-06".to_string(),
            start_time: String::new(),
            end_time: String::new(),
            location: String::new(),
            event_type: "presencial".to_string(),
            is_paid,
            price: if is_paid { 50.0 } else { 0.0 },
            pix_code: String::new(),
            registration_limit: None,
            has_certificate: false,
            certificate_hours: None,
            image_url: String::new(),
            status: crate::models::EventStatus::Ativo,
            is_periodic: total_sessions > 1,
            periodic_dates: vec![],
            total_sessions,
            organizer_id: String::new(),
            organizer_name: String::new(),
            created_date: String::new(),
        }
    }

    fn participant(payment_status: PaymentStatus, attended: &[&str]) -> Participant {
        Participant {
            id: "P1".to_string(),
            event_id: "E1".to_string(),
            registration_number: "WOR-123456".to_string(),
            cpf: "52998224725".to_string(),
            full_name: "Maria Silva".to_string(),
            email: "maria@example.com".to_string(),
            qr_code: "E1-52998224725-1700000000000".to_string(),
            payment_status,
            payment_method: None,
            payment_proof_url: String::new(),
            check_in_status: !attended.is_empty(),
            check_in_date: None,
            attended_sessions: attended.iter().map(|d| d.to_string()).collect(),
            sessions_attended_count: attended.len() as i64,
            attendance_percentage: 0,
            certificate_issued: false,
            created_date: String::new(),
        }
    }

    #[test]
    fn second_check_in_on_same_day_is_rejected() {
        let e = event(false, 1);
        let p = participant(PaymentStatus::Isento, &["2026-08-06"]);
        let result = evaluate_admission(&e, &p, "2026-08-06");
        assert!(matches!(result, Err(FlowError::DuplicateCheckIn)));
    }

    #[test]
    fn pending_payment_on_paid_event_gates_without_mutation() {
        let e = event(true, 1);
        let p = participant(PaymentStatus::Pendente, &[]);
        assert!(matches!(
            evaluate_admission(&e, &p, "2026-08-06"),
            Ok(Admission::NeedsPayment)
        ));
        // The gate alone must not touch the session list.
        assert!(p.attended_sessions.is_empty());
    }

    #[test]
    fn exempt_participant_is_admitted_on_paid_event() {
        let e = event(true, 1);
        let p = participant(PaymentStatus::Isento, &[]);
        assert!(matches!(
            evaluate_admission(&e, &p, "2026-08-06"),
            Ok(Admission::Admit)
        ));
    }

    #[test]
    fn pending_payment_on_free_event_is_admitted() {
        let e = event(false, 1);
        let p = participant(PaymentStatus::Pendente, &[]);
        assert!(matches!(
            evaluate_admission(&e, &p, "2026-08-06"),
            Ok(Admission::Admit)
        ));
    }

    #[test]
    fn attendance_patch_recomputes_counters() {
        let p = participant(PaymentStatus::Pago, &["2026-08-01", "2026-08-03"]);
        let patch = attendance_patch(&p, 4, "2026-08-06", "2026-08-06T14:00:00Z");

        assert_eq!(patch["sessions_attended_count"], 3);
        assert_eq!(patch["attendance_percentage"], 75);
        assert_eq!(patch["check_in_status"], true);
        let sessions = patch["attended_sessions"].as_array().unwrap();
        assert_eq!(sessions.len(), 3);
        assert_eq!(sessions[2], "2026-08-06");
    }

    #[test]
    fn attendance_patch_hits_100_on_single_session_event() {
        let p = participant(PaymentStatus::Pago, &[]);
        let patch = attendance_patch(&p, 1, "2026-08-06", "2026-08-06T14:00:00Z");
        assert_eq!(patch["attendance_percentage"], 100);
        assert_eq!(patch["sessions_attended_count"], 1);
    }

    #[test]
    fn attendance_patch_does_not_duplicate_today() {
        // The payment-confirmation path reuses the patch after the gate; a
        // date already present must not be appended twice.
        let p = participant(PaymentStatus::Pago, &["2026-08-06"]);
        let patch = attendance_patch(&p, 2, "2026-08-06", "2026-08-06T14:00:00Z");
        assert_eq!(patch["sessions_attended_count"], 1);
        assert_eq!(patch["attendance_percentage"], 50);
    }

    #[test]
    fn zero_total_sessions_is_treated_as_one() {
        let p = participant(PaymentStatus::Pago, &[]);
        let patch = attendance_patch(&p, 0, "2026-08-06", "2026-08-06T14:00:00Z");
        assert_eq!(patch["attendance_percentage"], 100);
    }
}
