use serde_json::{json, Value};

use crate::api::{participants, EntityApi};
use crate::models::{Event, Participant, PaymentMethod, PaymentStatus};
use crate::services::cpf::validate_cpf;
use crate::services::error::FlowError;

/// Fields collected by the public self-registration form.
#[derive(Debug, Clone)]
pub struct RegistrationInput {
    pub full_name: String,
    pub cpf: String,
    pub email: String,
    pub payment_method: PaymentMethod,
    pub payment_proof_url: String,
    pub accept_responsibility: bool,
}

#[derive(Debug)]
pub struct RegistrationOutcome {
    pub participant: Participant,
    pub qr_image_url: String,
}

/// Public self-registration. All validation happens before any persist call.
pub async fn register_participant(
    api: &EntityApi,
    token: Option<&str>,
    event: &Event,
    input: &RegistrationInput,
) -> Result<RegistrationOutcome, FlowError> {
    let existing = participants::list_for_event(api, token, &event.id).await?;
    let cpf = validate_public_registration(event, &existing, input)?;

    let fields = new_participant_fields(NewParticipant {
        event,
        cpf: &cpf,
        full_name: &input.full_name,
        email: &input.email,
        payment_status: public_payment_status(event),
        payment_method: input.payment_method,
        payment_proof_url: &input.payment_proof_url,
        now_ms: chrono::Utc::now().timestamp_millis(),
    });
    let participant = participants::create_participant(api, token, &fields).await?;

    Ok(RegistrationOutcome {
        qr_image_url: qr_image_url(&participant.qr_code),
        participant,
    })
}

/// Staff-entered registration: no proof upload, and the acknowledgment
/// checkbox drives the payment status for paid events.
pub async fn register_manual(
    api: &EntityApi,
    token: Option<&str>,
    event: &Event,
    full_name: &str,
    cpf: &str,
    email: &str,
    payment_confirmed: bool,
) -> Result<Participant, FlowError> {
    let existing = participants::list_for_event(api, token, &event.id).await?;
    let cpf = validate_cpf(cpf)?;
    reject_duplicate_cpf(&existing, &cpf)?;

    let payment_status = if event.is_paid && payment_confirmed {
        PaymentStatus::Pago
    } else if event.is_paid {
        PaymentStatus::Pendente
    } else {
        PaymentStatus::Isento
    };

    let fields = new_participant_fields(NewParticipant {
        event,
        cpf: &cpf,
        full_name,
        email,
        payment_status,
        payment_method: PaymentMethod::NoLocal,
        payment_proof_url: "",
        now_ms: chrono::Utc::now().timestamp_millis(),
    });
    let participant = participants::create_participant(api, token, &fields).await?;
    Ok(participant)
}

fn validate_public_registration(
    event: &Event,
    existing: &[Participant],
    input: &RegistrationInput,
) -> Result<String, FlowError> {
    if event_is_full(event, existing.len()) {
        return Err(FlowError::validation(
            "Evento já atingiu o limite de inscrições.",
        ));
    }

    let cpf = validate_cpf(&input.cpf)?;
    reject_duplicate_cpf(existing, &cpf)?;

    if event.is_paid {
        if !input.accept_responsibility {
            return Err(FlowError::validation(
                "Você deve aceitar a responsabilidade pelo pagamento",
            ));
        }
        if input.payment_method == PaymentMethod::Antecipado && input.payment_proof_url.is_empty() {
            return Err(FlowError::validation(
                "É necessário enviar o comprovante de pagamento",
            ));
        }
    }

    Ok(cpf)
}

pub fn event_is_full(event: &Event, registered_count: usize) -> bool {
    match event.registration_limit {
        Some(limit) => registered_count as i64 >= limit,
        None => false,
    }
}

fn reject_duplicate_cpf(existing: &[Participant], cpf: &str) -> Result<(), FlowError> {
    if existing.iter().any(|p| p.cpf == cpf) {
        return Err(FlowError::validation(
            "Este CPF já está cadastrado neste evento.",
        ));
    }
    Ok(())
}

fn public_payment_status(event: &Event) -> PaymentStatus {
    if event.is_paid {
        PaymentStatus::Pendente
    } else {
        PaymentStatus::Isento
    }
}

struct NewParticipant<'a> {
    event: &'a Event,
    cpf: &'a str,
    full_name: &'a str,
    email: &'a str,
    payment_status: PaymentStatus,
    payment_method: PaymentMethod,
    payment_proof_url: &'a str,
    now_ms: i64,
}

fn new_participant_fields(new: NewParticipant<'_>) -> Value {
    json!({
        "event_id": new.event.id,
        "registration_number": registration_number(&new.event.title, new.now_ms),
        "cpf": new.cpf,
        "full_name": new.full_name,
        "email": new.email,
        "qr_code": qr_payload(&new.event.id, new.cpf, new.now_ms),
        "payment_status": new.payment_status.as_str(),
        "payment_method": new.payment_method,
        "payment_proof_url": new.payment_proof_url,
        "check_in_status": false,
        "attendance_percentage": 0,
        "certificate_issued": false,
    })
}

/// Secondary lookup key printed into the participant's QR code.
pub fn qr_payload(event_id: &str, cpf: &str, epoch_millis: i64) -> String {
    format!("{}-{}-{}", event_id, cpf, epoch_millis)
}

/// Human-readable ticket number: three leading title characters uppercased
/// plus the trailing six digits of the timestamp. Not guaranteed unique.
pub fn registration_number(title: &str, epoch_millis: i64) -> String {
    let prefix: String = title.chars().take(3).collect::<String>().to_uppercase();
    let ts = epoch_millis.to_string();
    let suffix = &ts[ts.len().saturating_sub(6)..];
    format!("{}-{}", prefix, suffix)
}

/// External QR render service URL for a payload.
pub fn qr_image_url(payload: &str) -> String {
    let base = std::env::var("QR_RENDER_URL")
        .unwrap_or_else(|_| "https://api.qrserver.com/v1/create-qr-code/".to_string());
    format!(
        "{}?size=400x400&data={}",
        base.trim_end_matches('?'),
        urlencoding::encode(payload)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::EventStatus;

    fn event(is_paid: bool, registration_limit: Option<i64>) -> Event {
        Event {
            id: "E1".to_string(),
            title: "Workshop de React Avançado".to_string(),
            description: String::new(),
            date: "2026-08-06".to_string(),
            start_time: String::new(),
            end_time: String::new(),
            location: String::new(),
            event_type: "presencial".to_string(),
            is_paid,
            price: if is_paid { 50.0 } else { 0.0 },
            pix_code: String::new(),
            registration_limit,
            has_certificate: false,
            certificate_hours: None,
            image_url: String::new(),
            status: EventStatus::Ativo,
            is_periodic: false,
            periodic_dates: vec![],
            total_sessions: 1,
            organizer_id: String::new(),
            organizer_name: String::new(),
            created_date: String::new(),
        }
    }

    fn registered(cpf: &str) -> Participant {
        Participant {
            id: "P1".to_string(),
            event_id: "E1".to_string(),
            registration_number: String::new(),
            cpf: cpf.to_string(),
            full_name: String::new(),
            email: String::new(),
            qr_code: String::new(),
            payment_status: PaymentStatus::Isento,
            payment_method: None,
            payment_proof_url: String::new(),
            check_in_status: false,
            check_in_date: None,
            attended_sessions: vec![],
            sessions_attended_count: 0,
            attendance_percentage: 0,
            certificate_issued: false,
            created_date: String::new(),
        }
    }

    fn input(cpf: &str) -> RegistrationInput {
        RegistrationInput {
            full_name: "Maria Silva".to_string(),
            cpf: cpf.to_string(),
            email: "maria@example.com".to_string(),
            payment_method: PaymentMethod::Antecipado,
            payment_proof_url: String::new(),
            accept_responsibility: false,
        }
    }

    #[test]
    fn duplicate_cpf_is_rejected_before_persisting() {
        let e = event(false, None);
        let existing = vec![registered("52998224725")];
        let result = validate_public_registration(&e, &existing, &input("529.982.247-25"));
        assert!(matches!(result, Err(FlowError::Validation(_))));
    }

    #[test]
    fn full_event_rejects_registration() {
        let e = event(false, Some(1));
        let existing = vec![registered("11144477735")];
        let result = validate_public_registration(&e, &existing, &input("52998224725"));
        assert!(matches!(result, Err(FlowError::Validation(_))));
    }

    #[test]
    fn paid_event_requires_responsibility_and_proof() {
        let e = event(true, None);

        let no_ack = input("52998224725");
        assert!(matches!(
            validate_public_registration(&e, &[], &no_ack),
            Err(FlowError::Validation(_))
        ));

        let mut no_proof = input("52998224725");
        no_proof.accept_responsibility = true;
        assert!(matches!(
            validate_public_registration(&e, &[], &no_proof),
            Err(FlowError::Validation(_))
        ));

        let mut on_site = input("52998224725");
        on_site.accept_responsibility = true;
        on_site.payment_method = PaymentMethod::NoLocal;
        assert_eq!(
            validate_public_registration(&e, &[], &on_site).unwrap(),
            "52998224725"
        );
    }

    #[test]
    fn free_event_accepts_clean_cpf() {
        let e = event(false, Some(10));
        let result = validate_public_registration(&e, &[], &input("529.982.247-25"));
        assert_eq!(result.unwrap(), "52998224725");
    }

    #[test]
    fn qr_payload_concatenates_keys() {
        assert_eq!(
            qr_payload("E1", "52998224725", 1700000123456),
            "E1-52998224725-1700000123456"
        );
    }

    #[test]
    fn registration_number_uses_title_prefix_and_timestamp_suffix() {
        assert_eq!(
            registration_number("Workshop de React Avançado", 1700000123456),
            "WOR-123456"
        );
        // Short titles keep whatever characters exist.
        assert_eq!(registration_number("Ié", 1700000123456), "IÉ-123456");
    }
}
