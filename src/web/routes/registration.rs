use askama::Template;
use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use serde::Deserialize;
use tracing::warn;

use crate::api::{events as events_api, files, participants as participants_api, EntityApi};
use crate::models::{Event, PaymentMethod};
use crate::services::error::FlowError;
use crate::services::event_service::{event_date_label, format_date_br, price_label};
use crate::services::registration_service::{self, RegistrationInput};

/// Public self-registration page: event info beside the form. No session
/// required, so every remote call goes out without a token.
#[derive(Template)]
#[template(path = "registration.html")]
pub struct RegistrationTemplate {
    pub event: RegistrationEventView,
    pub error_message: String,
    pub full_name: String,
    pub cpf: String,
    pub email: String,
}

#[derive(Template)]
#[template(path = "registration_closed.html")]
pub struct RegistrationClosedTemplate {
    pub event_title: String,
    pub limit: i64,
}

#[derive(Template)]
#[template(path = "registration_success.html")]
pub struct RegistrationSuccessTemplate {
    pub event_title: String,
    pub participant_name: String,
    pub registration_number: String,
    pub qr_image_url: String,
    pub is_periodic: bool,
    pub is_paid: bool,
}

pub struct RegistrationEventView {
    pub id: String,
    pub title: String,
    pub description: String,
    pub organizer_name: String,
    pub date_label: String,
    pub session_date_labels: Vec<String>,
    pub is_periodic: bool,
    pub time_label: String,
    pub location: String,
    pub is_paid: bool,
    pub price_label: String,
    pub pix_code: String,
    pub has_pix_code: bool,
    pub has_image: bool,
    pub image_url: String,
}

impl RegistrationEventView {
    fn from_event(event: &Event) -> Self {
        Self {
            id: event.id.clone(),
            title: event.title.clone(),
            description: event.description.clone(),
            organizer_name: event.organizer_name.clone(),
            date_label: event_date_label(event),
            session_date_labels: event
                .periodic_dates
                .iter()
                .map(|d| format_date_br(d))
                .collect(),
            is_periodic: event.is_periodic,
            time_label: format!("{} - {}", event.start_time, event.end_time),
            location: event.location.clone(),
            is_paid: event.is_paid,
            price_label: price_label(event),
            has_pix_code: !event.pix_code.is_empty(),
            pix_code: event.pix_code.clone(),
            has_image: !event.image_url.is_empty(),
            image_url: event.image_url.clone(),
        }
    }
}

#[derive(Debug, Deserialize, Default)]
pub struct RegistrationQuery {
    #[serde(rename = "eventId")]
    pub event_id: String,
}

pub async fn registration_page(
    Query(query): Query<RegistrationQuery>,
    State(api): State<EntityApi>,
) -> Response {
    let event = match load_event(&api, &query.event_id).await {
        Ok(event) => event,
        Err(resp) => return resp,
    };

    if let Some(closed) = closed_response(&api, &event).await {
        return closed;
    }

    let template = RegistrationTemplate {
        event: RegistrationEventView::from_event(&event),
        error_message: String::new(),
        full_name: String::new(),
        cpf: String::new(),
        email: String::new(),
    };
    Html(template.render().unwrap()).into_response()
}

/// One multipart form: participant fields plus the optional payment proof.
/// The proof is pushed to the remote file store before the participant is
/// created, so a failed upload aborts the whole registration.
pub async fn registration_handler(
    State(api): State<EntityApi>,
    mut multipart: Multipart,
) -> Response {
    let mut event_id = String::new();
    let mut input = RegistrationInput {
        full_name: String::new(),
        cpf: String::new(),
        email: String::new(),
        payment_method: PaymentMethod::Antecipado,
        payment_proof_url: String::new(),
        accept_responsibility: false,
    };
    let mut proof: Option<(String, String, Vec<u8>)> = None;

    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("event_id") => event_id = field.text().await.unwrap_or_default(),
            Some("full_name") => input.full_name = field.text().await.unwrap_or_default(),
            Some("cpf") => input.cpf = field.text().await.unwrap_or_default(),
            Some("email") => input.email = field.text().await.unwrap_or_default(),
            Some("payment_method") => {
                if field.text().await.unwrap_or_default() == "no_local" {
                    input.payment_method = PaymentMethod::NoLocal;
                }
            }
            Some("accept_responsibility") => {
                input.accept_responsibility = true;
                let _ = field.text().await;
            }
            Some("payment_proof") => {
                let filename = field.file_name().unwrap_or("comprovante").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await.map(|b| b.to_vec()).unwrap_or_default();
                if !bytes.is_empty() {
                    proof = Some((filename, content_type, bytes));
                }
            }
            _ => {}
        }
    }

    let event = match load_event(&api, &event_id).await {
        Ok(event) => event,
        Err(resp) => return resp,
    };

    if let Some((filename, content_type, bytes)) = proof {
        match files::upload(&api, None, &filename, &content_type, bytes).await {
            Ok(file_url) => input.payment_proof_url = file_url,
            Err(e) => {
                warn!("payment proof upload failed: {}", e);
                return render_form_error(&event, &input, "Erro ao fazer upload do comprovante");
            }
        }
    }

    match registration_service::register_participant(&api, None, &event, &input).await {
        Ok(outcome) => {
            let template = RegistrationSuccessTemplate {
                event_title: event.title.clone(),
                participant_name: outcome.participant.full_name.clone(),
                registration_number: outcome.participant.registration_number.clone(),
                qr_image_url: outcome.qr_image_url,
                is_periodic: event.is_periodic,
                is_paid: event.is_paid,
            };
            Html(template.render().unwrap()).into_response()
        }
        Err(e) => {
            if matches!(e, FlowError::Remote(_)) {
                warn!("registration failed: {}", e);
            }
            render_form_error(&event, &input, &e.user_message())
        }
    }
}

async fn load_event(api: &EntityApi, event_id: &str) -> Result<Event, Response> {
    if event_id.is_empty() {
        return Err(StatusCode::BAD_REQUEST.into_response());
    }
    match events_api::get_event(api, None, event_id).await {
        Ok(Some(event)) => Ok(event),
        Ok(None) => Err(StatusCode::NOT_FOUND.into_response()),
        Err(e) => {
            warn!("event load failed for {}: {}", event_id, e);
            Err(StatusCode::INTERNAL_SERVER_ERROR.into_response())
        }
    }
}

async fn closed_response(api: &EntityApi, event: &Event) -> Option<Response> {
    let limit = event.registration_limit?;
    match participants_api::list_for_event(api, None, &event.id).await {
        Ok(existing) if registration_service::event_is_full(event, existing.len()) => {
            let template = RegistrationClosedTemplate {
                event_title: event.title.clone(),
                limit,
            };
            Some(Html(template.render().unwrap()).into_response())
        }
        Ok(_) => None,
        Err(e) => {
            warn!("participant count failed for {}: {}", event.id, e);
            None
        }
    }
}

fn render_form_error(event: &Event, input: &RegistrationInput, message: &str) -> Response {
    let template = RegistrationTemplate {
        event: RegistrationEventView::from_event(event),
        error_message: message.to_string(),
        full_name: input.full_name.clone(),
        cpf: input.cpf.clone(),
        email: input.email.clone(),
    };
    Html(template.render().unwrap()).into_response()
}
